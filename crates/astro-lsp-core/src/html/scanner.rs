//! Markup tokenizer.
//!
//! A resumable, state-driven scanner over HTML-like text. It can start at any
//! offset in any [`ScannerState`], which is what lets the preprocessor blank a
//! character and pick up scanning exactly where it left off.
//!
//! Token offsets are byte offsets into the full text, including when the
//! scanner starts mid-text.

use once_cell::sync::Lazy;
use regex::Regex;

static ELEMENT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_:A-Za-z0-9][_:A-Za-z0-9.\-]*").unwrap());
static ATTRIBUTE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[^\s"'></=\x00-\x0F\x7F\x80-\x9F]*"#).unwrap());
static UNQUOTED_ATTRIBUTE_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[^\s"'`=<>]+"#).unwrap());
static DOCTYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^!doctype").unwrap());
static SCRIPT_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!--|-->|</?script\s*/?>?").unwrap());
static STYLE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</style").unwrap());

/// `<script type="...">` values whose content is markup rather than script.
const MARKUP_SCRIPT_TYPES: &[&str] = &["text/x-handlebars-template", "text/html"];

/// The scanner's position in the markup grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScannerState {
    WithinContent,
    AfterOpeningStartTag,
    AfterOpeningEndTag,
    WithinDoctype,
    WithinTag,
    WithinEndTag,
    WithinComment,
    WithinScriptContent,
    WithinStyleContent,
    AfterAttributeName,
    BeforeAttributeValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    StartCommentTag,
    Comment,
    EndCommentTag,
    StartTagOpen,
    StartTagClose,
    StartTagSelfClose,
    StartTag,
    EndTagOpen,
    EndTagClose,
    EndTag,
    DelimiterAssign,
    AttributeName,
    AttributeValue,
    StartDoctypeTag,
    Doctype,
    EndDoctypeTag,
    Content,
    Whitespace,
    Unknown,
    Script,
    Styles,
    Eos,
}

/// A markup scanner over `text`.
///
/// Every call to [`Scanner::scan`] either consumes at least one character or
/// returns [`TokenType::Eos`] (pseudo close tags excepted, which are always
/// followed by a consuming token), so a full scan is linear in the input.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    state: ScannerState,
    emit_pseudo_close_tags: bool,

    token_offset: usize,
    token_type: TokenType,
    token_error: Option<&'static str>,

    has_space_after_tag: bool,
    last_tag: String,
    last_attribute_name: Option<String>,
    last_type_value: Option<String>,
}

impl<'a> Scanner<'a> {
    /// Create a scanner positioned at `initial_offset` in `initial_state`.
    pub fn new(text: &'a str, initial_offset: usize, initial_state: ScannerState) -> Self {
        let mut pos = initial_offset.min(text.len());
        while !text.is_char_boundary(pos) {
            pos -= 1;
        }
        Scanner {
            text,
            pos,
            state: initial_state,
            emit_pseudo_close_tags: false,
            token_offset: 0,
            token_type: TokenType::Unknown,
            token_error: None,
            has_space_after_tag: false,
            last_tag: String::new(),
            last_attribute_name: None,
            last_type_value: None,
        }
    }

    /// Emit a zero-length close token when a `<` interrupts an open tag.
    pub fn with_pseudo_close_tags(mut self, emit: bool) -> Self {
        self.emit_pseudo_close_tags = emit;
        self
    }

    /// Scan the next token.
    pub fn scan(&mut self) -> TokenType {
        let offset = self.pos;
        let old_state = self.state;
        let token = self.internal_scan();
        if token != TokenType::Eos
            && offset == self.pos
            && !(self.emit_pseudo_close_tags
                && matches!(token, TokenType::StartTagClose | TokenType::EndTagClose))
        {
            tracing::trace!(offset, ?old_state, state = ?self.state, "Scanner did not advance");
            self.advance_char();
            return self.finish_token(offset, TokenType::Unknown, None);
        }
        token
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn token_offset(&self) -> usize {
        self.token_offset
    }

    pub fn token_end(&self) -> usize {
        self.pos
    }

    pub fn token_length(&self) -> usize {
        self.pos - self.token_offset
    }

    pub fn token_text(&self) -> &'a str {
        &self.text[self.token_offset..self.pos]
    }

    pub fn token_error(&self) -> Option<&'static str> {
        self.token_error
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    fn finish_token(
        &mut self,
        offset: usize,
        token_type: TokenType,
        error: Option<&'static str>,
    ) -> TokenType {
        self.token_type = token_type;
        self.token_offset = offset;
        self.token_error = error;
        token_type
    }

    fn internal_scan(&mut self) -> TokenType {
        let offset = self.pos;
        if self.eos() {
            return self.finish_token(offset, TokenType::Eos, None);
        }

        let error;
        match self.state {
            ScannerState::WithinComment => {
                if self.advance_if_str("-->") {
                    self.state = ScannerState::WithinContent;
                    return self.finish_token(offset, TokenType::EndCommentTag, None);
                }
                self.advance_until_str("-->");
                return self.finish_token(offset, TokenType::Comment, None);
            }
            ScannerState::WithinDoctype => {
                if self.advance_if_byte(b'>') {
                    self.state = ScannerState::WithinContent;
                    return self.finish_token(offset, TokenType::EndDoctypeTag, None);
                }
                self.advance_until_byte(b'>');
                return self.finish_token(offset, TokenType::Doctype, None);
            }
            ScannerState::WithinContent => {
                if self.advance_if_byte(b'<') {
                    if !self.eos() && self.peek_byte(0) == Some(b'!') {
                        if self.advance_if_str("!--") {
                            self.state = ScannerState::WithinComment;
                            return self.finish_token(offset, TokenType::StartCommentTag, None);
                        }
                        if !self.advance_if_regex(&DOCTYPE).is_empty() {
                            self.state = ScannerState::WithinDoctype;
                            return self.finish_token(offset, TokenType::StartDoctypeTag, None);
                        }
                    }
                    if self.advance_if_byte(b'/') {
                        self.state = ScannerState::AfterOpeningEndTag;
                        return self.finish_token(offset, TokenType::EndTagOpen, None);
                    }
                    self.state = ScannerState::AfterOpeningStartTag;
                    return self.finish_token(offset, TokenType::StartTagOpen, None);
                }
                self.advance_until_byte(b'<');
                return self.finish_token(offset, TokenType::Content, None);
            }
            ScannerState::AfterOpeningEndTag => {
                if !self.advance_if_regex(&ELEMENT_NAME).is_empty() {
                    self.state = ScannerState::WithinEndTag;
                    return self.finish_token(offset, TokenType::EndTag, None);
                }
                if self.skip_whitespace() {
                    return self.finish_token(
                        offset,
                        TokenType::Whitespace,
                        Some("Tag name must directly follow the open bracket."),
                    );
                }
                self.state = ScannerState::WithinEndTag;
                self.advance_until_byte(b'>');
                if offset < self.pos {
                    return self.finish_token(
                        offset,
                        TokenType::Unknown,
                        Some("End tag name expected."),
                    );
                }
                return self.internal_scan();
            }
            ScannerState::WithinEndTag => {
                if self.skip_whitespace() {
                    return self.finish_token(offset, TokenType::Whitespace, None);
                }
                if self.advance_if_byte(b'>') {
                    self.state = ScannerState::WithinContent;
                    return self.finish_token(offset, TokenType::EndTagClose, None);
                }
                if self.emit_pseudo_close_tags && self.peek_byte(0) == Some(b'<') {
                    self.state = ScannerState::WithinContent;
                    return self.finish_token(
                        offset,
                        TokenType::EndTagClose,
                        Some("Closing bracket missing."),
                    );
                }
                error = Some("Closing bracket expected.");
            }
            ScannerState::AfterOpeningStartTag => {
                self.last_tag = self.advance_if_regex(&ELEMENT_NAME).to_ascii_lowercase();
                self.last_type_value = None;
                self.last_attribute_name = None;
                if !self.last_tag.is_empty() {
                    self.has_space_after_tag = false;
                    self.state = ScannerState::WithinTag;
                    return self.finish_token(offset, TokenType::StartTag, None);
                }
                if self.skip_whitespace() {
                    return self.finish_token(
                        offset,
                        TokenType::Whitespace,
                        Some("Tag name must directly follow the open bracket."),
                    );
                }
                self.state = ScannerState::WithinTag;
                self.advance_until_byte(b'>');
                if offset < self.pos {
                    return self.finish_token(
                        offset,
                        TokenType::Unknown,
                        Some("Start tag name expected."),
                    );
                }
                return self.internal_scan();
            }
            ScannerState::WithinTag => {
                if self.skip_whitespace() {
                    self.has_space_after_tag = true;
                    return self.finish_token(offset, TokenType::Whitespace, None);
                }
                if self.has_space_after_tag {
                    let name = self.advance_if_regex(&ATTRIBUTE_NAME).to_ascii_lowercase();
                    if !name.is_empty() {
                        self.last_attribute_name = Some(name);
                        self.state = ScannerState::AfterAttributeName;
                        self.has_space_after_tag = false;
                        return self.finish_token(offset, TokenType::AttributeName, None);
                    }
                }
                if self.advance_if_str("/>") {
                    self.state = ScannerState::WithinContent;
                    return self.finish_token(offset, TokenType::StartTagSelfClose, None);
                }
                if self.advance_if_byte(b'>') {
                    self.state = self.state_after_start_tag();
                    return self.finish_token(offset, TokenType::StartTagClose, None);
                }
                if self.emit_pseudo_close_tags && self.peek_byte(0) == Some(b'<') {
                    self.state = ScannerState::WithinContent;
                    return self.finish_token(
                        offset,
                        TokenType::StartTagClose,
                        Some("Closing bracket missing."),
                    );
                }
                self.advance_char();
                return self.finish_token(
                    offset,
                    TokenType::Unknown,
                    Some("Unexpected character in tag."),
                );
            }
            ScannerState::AfterAttributeName => {
                if self.skip_whitespace() {
                    self.has_space_after_tag = true;
                    return self.finish_token(offset, TokenType::Whitespace, None);
                }
                if self.advance_if_byte(b'=') {
                    self.state = ScannerState::BeforeAttributeValue;
                    return self.finish_token(offset, TokenType::DelimiterAssign, None);
                }
                self.state = ScannerState::WithinTag;
                // No advance yet, rescan as WithinTag
                return self.internal_scan();
            }
            ScannerState::BeforeAttributeValue => {
                if self.skip_whitespace() {
                    return self.finish_token(offset, TokenType::Whitespace, None);
                }
                let mut value = self.advance_if_regex(&UNQUOTED_ATTRIBUTE_VALUE);
                if !value.is_empty() {
                    // <foo bar=http://foo/>
                    if self.peek_byte(0) == Some(b'>') && value.ends_with('/') {
                        self.pos -= 1;
                        value = &value[..value.len() - 1];
                    }
                    if self.last_attribute_name.as_deref() == Some("type") {
                        self.last_type_value = Some(value.to_string());
                    }
                    if !value.is_empty() {
                        self.state = ScannerState::WithinTag;
                        self.has_space_after_tag = false;
                        return self.finish_token(offset, TokenType::AttributeValue, None);
                    }
                }
                if let Some(quote @ (b'"' | b'\'')) = self.peek_byte(0) {
                    self.pos += 1;
                    let terminated = self.advance_until_byte(quote);
                    let inner_end = self.pos;
                    if terminated {
                        self.pos += 1;
                    }
                    if self.last_attribute_name.as_deref() == Some("type") {
                        self.last_type_value = Some(self.text[offset + 1..inner_end].to_string());
                    }
                    self.state = ScannerState::WithinTag;
                    self.has_space_after_tag = false;
                    return self.finish_token(offset, TokenType::AttributeValue, None);
                }
                self.state = ScannerState::WithinTag;
                self.has_space_after_tag = false;
                // No advance yet, rescan as WithinTag
                return self.internal_scan();
            }
            ScannerState::WithinScriptContent => {
                // Nested `<script>` inside `<!-- -->` does not end the element
                let mut script_state = 1;
                while !self.eos() {
                    let Some(found) = SCRIPT_BOUNDARY.find(&self.text[self.pos..]) else {
                        self.pos = self.text.len();
                        return self.finish_token(offset, TokenType::Script, None);
                    };
                    let matched = found.as_str();
                    self.pos += found.end();
                    if matched == "<!--" {
                        if script_state == 1 {
                            script_state = 2;
                        }
                    } else if matched == "-->" {
                        script_state = 1;
                    } else if matched.as_bytes()[1] != b'/' {
                        if script_state == 2 {
                            script_state = 3;
                        }
                    } else if script_state == 3 {
                        script_state = 2;
                    } else {
                        self.pos -= matched.len();
                        break;
                    }
                }
                self.state = ScannerState::WithinContent;
                if offset < self.pos {
                    return self.finish_token(offset, TokenType::Script, None);
                }
                return self.internal_scan();
            }
            ScannerState::WithinStyleContent => {
                match STYLE_END.find(&self.text[self.pos..]) {
                    Some(found) => self.pos += found.start(),
                    None => self.pos = self.text.len(),
                }
                self.state = ScannerState::WithinContent;
                if offset < self.pos {
                    return self.finish_token(offset, TokenType::Styles, None);
                }
                return self.internal_scan();
            }
        }

        self.advance_char();
        self.state = ScannerState::WithinContent;
        self.finish_token(offset, TokenType::Unknown, error)
    }

    fn state_after_start_tag(&self) -> ScannerState {
        match self.last_tag.as_str() {
            "script" => match &self.last_type_value {
                Some(value) if MARKUP_SCRIPT_TYPES.contains(&value.as_str()) => {
                    ScannerState::WithinContent
                }
                _ => ScannerState::WithinScriptContent,
            },
            "style" => ScannerState::WithinStyleContent,
            _ => ScannerState::WithinContent,
        }
    }

    // ------------------------------------------------------------------------
    // Stream primitives
    // ------------------------------------------------------------------------

    fn eos(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek_byte(&self, n: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + n).copied()
    }

    fn advance_char(&mut self) {
        if let Some(ch) = self.text[self.pos..].chars().next() {
            self.pos += ch.len_utf8();
        }
    }

    fn advance_if_byte(&mut self, byte: u8) -> bool {
        if self.peek_byte(0) == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn advance_if_str(&mut self, s: &str) -> bool {
        if self.text[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn advance_if_regex(&mut self, regex: &Regex) -> &'a str {
        let text = self.text;
        match regex.find(&text[self.pos..]) {
            Some(found) if found.start() == 0 => {
                let matched = &text[self.pos..self.pos + found.end()];
                self.pos += found.end();
                matched
            }
            _ => "",
        }
    }

    /// Advance to the next `byte`; returns false (at end of text) if absent.
    fn advance_until_byte(&mut self, byte: u8) -> bool {
        match self.text.as_bytes()[self.pos..].iter().position(|&b| b == byte) {
            Some(idx) => {
                self.pos += idx;
                true
            }
            None => {
                self.pos = self.text.len();
                false
            }
        }
    }

    fn advance_until_str(&mut self, s: &str) -> bool {
        match self.text[self.pos..].find(s) {
            Some(idx) => {
                self.pos += idx;
                true
            }
            None => {
                self.pos = self.text.len();
                false
            }
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b' ' | b'\t' | b'\n' | b'\x0c' | b'\r') = self.peek_byte(0) {
            self.pos += 1;
        }
        self.pos > start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<(TokenType, &str)> {
        let mut scanner = Scanner::new(text, 0, ScannerState::WithinContent);
        let mut result = Vec::new();
        loop {
            let token = scanner.scan();
            if token == TokenType::Eos {
                break;
            }
            result.push((token, scanner.token_text()));
        }
        result
    }

    #[test]
    fn scans_element_with_attributes() {
        use TokenType::*;
        assert_eq!(
            tokens(r#"<div class="a" hidden>x</div>"#),
            vec![
                (StartTagOpen, "<"),
                (StartTag, "div"),
                (Whitespace, " "),
                (AttributeName, "class"),
                (DelimiterAssign, "="),
                (AttributeValue, "\"a\""),
                (Whitespace, " "),
                (AttributeName, "hidden"),
                (StartTagClose, ">"),
                (Content, "x"),
                (EndTagOpen, "</"),
                (EndTag, "div"),
                (EndTagClose, ">"),
            ]
        );
    }

    #[test]
    fn less_than_inside_tag_is_unknown() {
        let text = "<Foo checked={a < 1}>";
        let mut scanner = Scanner::new(text, 0, ScannerState::WithinContent);
        let mut unknown = None;
        while scanner.scan() != TokenType::Eos {
            if scanner.token_type() == TokenType::Unknown && scanner.token_text() == "<" {
                unknown = Some((scanner.token_offset(), scanner.state()));
            }
        }
        assert_eq!(unknown, Some((16, ScannerState::WithinTag)));
    }

    #[test]
    fn self_closing_and_comments() {
        use TokenType::*;
        assert_eq!(
            tokens("<!-- c --><br/>"),
            vec![
                (StartCommentTag, "<!--"),
                (Comment, " c "),
                (EndCommentTag, "-->"),
                (StartTagOpen, "<"),
                (StartTag, "br"),
                (StartTagSelfClose, "/>"),
            ]
        );
    }

    #[test]
    fn script_and_style_content_are_opaque() {
        use TokenType::*;
        let scanned = tokens("<script>if (a < b) {}</script><style>a > b {}</style>");
        assert!(scanned.contains(&(Script, "if (a < b) {}")));
        assert!(scanned.contains(&(Styles, "a > b {}")));
        assert!(!scanned.iter().any(|(token, _)| *token == Unknown));
    }

    #[test]
    fn resumes_from_offset_and_state() {
        let text = "<a b=1   c>";
        let mut scanner = Scanner::new(text, 6, ScannerState::WithinTag);
        assert_eq!(scanner.scan(), TokenType::Whitespace);
        assert_eq!(scanner.token_offset(), 6);
        assert_eq!(scanner.scan(), TokenType::AttributeName);
        assert_eq!(scanner.token_text(), "c");
        assert_eq!(scanner.scan(), TokenType::StartTagClose);
        assert_eq!(scanner.token_offset(), 10);
    }

    #[test]
    fn pseudo_close_tags() {
        let text = "<div <span>";
        let mut scanner =
            Scanner::new(text, 0, ScannerState::WithinContent).with_pseudo_close_tags(true);
        let mut closes = Vec::new();
        while scanner.scan() != TokenType::Eos {
            if scanner.token_type() == TokenType::StartTagClose {
                closes.push((scanner.token_offset(), scanner.token_length()));
            }
        }
        assert_eq!(closes, vec![(5, 0), (10, 1)]);
    }

    #[test]
    fn non_ascii_in_tag_advances_whole_character() {
        let scanned = tokens("<p“>é</p>");
        assert!(scanned.contains(&(TokenType::Unknown, "“")));
        assert!(scanned.contains(&(TokenType::Content, "é")));
    }
}
