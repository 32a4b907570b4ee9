//! `class` and `id` value completions from the component's own styles.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::attributes::{AttributeContext, get_attribute_context_at_position};
use crate::config::Settings;
use crate::document::AstroDocument;
use crate::fragments::{TagInformation, extract_style_tags};
use crate::types::{CompletionItem, CompletionItemKind, Position};

static SIMPLE_SELECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([.#])(-?[_a-zA-Z\x{80}-\x{10FFFF}][_a-zA-Z0-9\-\x{80}-\x{10FFFF}]*)").unwrap()
});

/// The kind of simple selector an attribute value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    Class,
    Id,
}

impl SelectorKind {
    pub fn sigil(self) -> char {
        match self {
            SelectorKind::Class => '.',
            SelectorKind::Id => '#',
        }
    }

    /// Which selectors complete the attribute under the cursor.
    ///
    /// `class` and `id` values complete class and id names. A `class:name`
    /// directive completes its name with class names.
    pub fn for_attribute(context: &AttributeContext) -> Option<Self> {
        if context.in_value {
            match context.name.as_str() {
                "class" => Some(SelectorKind::Class),
                "id" => Some(SelectorKind::Id),
                _ => None,
            }
        } else if context.name.starts_with("class:") {
            Some(SelectorKind::Class)
        } else {
            None
        }
    }
}

/// Collect every `kind` selector name from `stylesheets`, in order of first
/// appearance.
pub fn collect_selectors<'a>(
    stylesheets: impl IntoIterator<Item = &'a str>,
    kind: SelectorKind,
) -> Vec<CompletionItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for stylesheet in stylesheets {
        for prelude in rule_preludes(&blank_comments_and_strings(stylesheet)) {
            for captures in SIMPLE_SELECTOR.captures_iter(&prelude) {
                if !captures[1].starts_with(kind.sigil()) {
                    continue;
                }
                let name = &captures[2];
                if seen.insert(name.to_string()) {
                    items.push(CompletionItem::new(name).with_kind(CompletionItemKind::Keyword));
                }
            }
        }
    }

    items
}

/// Completions for an attribute context, or `None` when the attribute does not
/// take class or id names.
pub fn get_id_class_completions(
    styles: &[TagInformation],
    context: &AttributeContext,
) -> Option<Vec<CompletionItem>> {
    let kind = SelectorKind::for_attribute(context)?;
    Some(collect_selectors(
        styles.iter().map(|style| style.content.as_str()),
        kind,
    ))
}

/// Class and id completions at `position` in `document`.
pub fn id_class_completions(
    document: &AstroDocument,
    position: Position,
    settings: &Settings,
) -> Option<Vec<CompletionItem>> {
    if !settings.completions.id_class {
        return None;
    }
    let context = get_attribute_context_at_position(document, position)?;
    let styles = extract_style_tags(document.text(), document.html());
    get_id_class_completions(&styles, &context)
}

/// Replace comments and quoted strings with spaces.
fn blank_comments_and_strings(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str("  ");
                let mut prev = '\0';
                for c in chars.by_ref() {
                    out.push(' ');
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '"' | '\'' => {
                out.push(' ');
                let mut escaped = false;
                for next in chars.by_ref() {
                    out.push(' ');
                    if escaped {
                        escaped = false;
                    } else if next == '\\' {
                        escaped = true;
                    } else if next == c || next == '\n' {
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Selector text in front of each `{`, skipping at-rule preludes.
fn rule_preludes(css: &str) -> Vec<String> {
    let mut preludes = Vec::new();
    let mut current = String::new();

    for c in css.chars() {
        match c {
            '{' => {
                let prelude = current.trim();
                if !prelude.is_empty() && !prelude.starts_with('@') {
                    preludes.push(prelude.to_string());
                }
                current.clear();
            }
            '}' | ';' => current.clear(),
            _ => current.push(c),
        }
    }

    preludes
}
