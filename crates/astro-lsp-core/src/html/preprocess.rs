//! Offset-preserving cleanup of component markup before parsing.
//!
//! Expression attributes such as `checked={a < 1}` or `onClick={() => a > b}`
//! contain characters a markup tokenizer reads as tag delimiters. The
//! preprocessor replaces those characters with spaces so that the tag is
//! parsed whole. The output always has the same length as the input, and every
//! character that was not blanked keeps its offset, so nodes parsed from the
//! output can be reported against the original text unchanged.

use super::scanner::{Scanner, ScannerState, TokenType};
use crate::utils::ExpressionIndex;

/// Blank `<` and `>` characters that would end a start tag inside an
/// expression attribute.
///
/// When `first_non_whitespace_offset` is given, every lone `<` or `>` token
/// before it belongs to the frontmatter script and is blanked as well.
///
/// Runs in time linear in the length of `text`. Preprocessing its own output
/// changes nothing as long as every blanked delimiter sat in a start tag with
/// a name or in frontmatter content. Tags with no name can lose more
/// delimiters on a second pass.
pub fn preprocess(text: &str, first_non_whitespace_offset: Option<usize>) -> String {
    let braces = ExpressionIndex::new(text);
    let mut text = text.to_string();
    let prologue_end = first_non_whitespace_offset.unwrap_or(0);

    let mut open_tag: Option<usize> = None;
    let mut resume = Some((0, ScannerState::WithinContent));

    while let Some((start, state)) = resume.take() {
        let mut scanner = Scanner::new(&text, start, state);
        let mut token = scanner.scan();

        while token != TokenType::Eos {
            let offset = scanner.token_offset();
            let token_text = scanner.token_text();

            if offset < prologue_end && (token_text == "<" || token_text == ">") {
                resume = Some((offset, ScannerState::WithinContent));
                break;
            }

            match token {
                TokenType::StartTagOpen => open_tag = Some(offset),
                TokenType::StartTagClose => {
                    if closes_inside_expression(&braces, open_tag, offset) {
                        resume = Some((offset, ScannerState::WithinTag));
                        break;
                    }
                    open_tag = None;
                }
                TokenType::StartTagSelfClose => open_tag = None,
                // `<Foo checked={a < 1}>`
                TokenType::Unknown
                    if scanner.state() == ScannerState::WithinTag
                        && token_text == "<"
                        && closes_inside_expression(&braces, open_tag, offset) =>
                {
                    resume = Some((offset, ScannerState::WithinTag));
                    break;
                }
                _ => {}
            }

            token = scanner.scan();
        }

        if let Some((offset, state)) = resume {
            tracing::debug!(offset, ?state, "Blanking tag delimiter");
            text.replace_range(offset..offset + 1, " ");
        }
    }

    text
}

fn closes_inside_expression(braces: &ExpressionIndex, open_tag: Option<usize>, offset: usize) -> bool {
    open_tag.is_some_and(|open| braces.is_inside(open, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn blanks_less_than_inside_expression() {
        let output = preprocess("<Foo checked={a < 1}>", None);
        assert_snapshot!(output, @"<Foo checked={a   1}>");
    }

    #[test]
    fn blanks_arrow_and_comparison() {
        let output = preprocess("<div onClick={() => a > b}>text</div>", None);
        assert_snapshot!(output, @"<div onClick={() =  a   b}>text</div>");
    }

    #[test]
    fn leaves_plain_markup_alone() {
        let input = r#"<div class="a"><span>x &lt; y</span><br/></div>"#;
        assert_eq!(preprocess(input, None), input);
    }

    #[test]
    fn blanks_frontmatter_delimiters() {
        let input = "---\nconst a = 1 < 2;\n---\n<div>{a > 0}</div>";
        let output = preprocess(input, Some(25));
        assert_snapshot!(output, @r"
        ---
        const a = 1   2;
        ---
        <div>{a > 0}</div>
        ");
    }

    #[test]
    fn frontmatter_offset_without_frontmatter_is_a_no_op() {
        let input = "<div>{a}</div>";
        assert_eq!(preprocess(input, Some(0)), input);
    }

    #[test]
    fn tag_after_expression_tag_is_tracked() {
        let output = preprocess("<A b={x > 1} /><C d={y < 2}>", None);
        assert_snapshot!(output, @"<A b={x   1} /><C d={y   2}>");
    }

    #[test]
    fn many_delimiters_in_one_expression() {
        let input = format!("<A b={{{}}}>", "> ".repeat(1000));
        let output = preprocess(&input, None);
        assert_eq!(output.len(), input.len());
        assert_eq!(output.matches('>').count(), 1);
        assert!(output.ends_with("}>"));
    }

    // A second pass scans from a fresh start where the first pass resumed
    // after a blank, so malformed tags can lose further delimiters.
    #[test]
    fn second_pass_on_tag_without_name() {
        let once = preprocess("<}{>/>", None);
        assert_snapshot!(once, @"<}{ />");
        assert_eq!(preprocess(&once, None), "<}{ / ");
    }

    #[test]
    fn second_pass_on_end_tag_in_frontmatter() {
        let once = preprocess("</}>>", Some(5));
        assert_snapshot!(once, @"</} >");
        assert_eq!(preprocess(&once, Some(5)), "</}  ");
    }

    #[test]
    fn preserves_multibyte_text() {
        let input = "<p title={\"é\" > 1}>ü</p>";
        let output = preprocess(input, None);
        assert_eq!(output.len(), input.len());
        assert_snapshot!(output, @r#"<p title={"é"   1}>ü</p>"#);
    }
}
