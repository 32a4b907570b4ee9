//! Frontmatter detection for `.astro` files.
//!
//! A component may start with a script block fenced by `---` lines. Everything
//! inside the fences is script; everything after is the markup template.

use serde::Serialize;

const FENCE: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FrontmatterState {
    /// No frontmatter.
    None,
    /// An opening fence without a closing one. The rest of the file is script.
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontmatterStatus {
    pub state: FrontmatterState,
    /// Offset of the opening fence.
    pub start_offset: Option<usize>,
    /// Offset of the closing fence.
    pub end_offset: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    /// Offset of the first non-whitespace character of the template, after the
    /// frontmatter. `None` when the template is blank.
    pub first_non_whitespace_offset: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AstroMetadata {
    pub frontmatter: FrontmatterStatus,
    pub content: ContentMetadata,
}

/// Locate the frontmatter and the start of the template in `text`.
pub fn parse_astro(text: &str) -> AstroMetadata {
    let frontmatter = frontmatter_status(text);
    let first_non_whitespace_offset = match frontmatter.state {
        FrontmatterState::Closed => frontmatter
            .end_offset
            .and_then(|end| first_non_whitespace(text, end + FENCE.len())),
        // The whole file is still script
        FrontmatterState::Open => Some(text.len()),
        FrontmatterState::None => first_non_whitespace(text, 0),
    };

    AstroMetadata {
        frontmatter,
        content: ContentMetadata {
            first_non_whitespace_offset,
        },
    }
}

fn frontmatter_status(text: &str) -> FrontmatterStatus {
    let none = FrontmatterStatus {
        state: FrontmatterState::None,
        start_offset: None,
        end_offset: None,
    };

    let Some(start) = text.find(FENCE) else {
        return none;
    };
    if !text[..start].trim().is_empty() {
        return none;
    }

    match text[start + FENCE.len()..].find(FENCE) {
        Some(rel) => FrontmatterStatus {
            state: FrontmatterState::Closed,
            start_offset: Some(start),
            end_offset: Some(start + FENCE.len() + rel),
        },
        None => FrontmatterStatus {
            state: FrontmatterState::Open,
            start_offset: Some(start),
            end_offset: None,
        },
    }
}

fn first_non_whitespace(text: &str, from: usize) -> Option<usize> {
    text.get(from..)?
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(idx, _)| from + idx)
}
