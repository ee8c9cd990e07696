//! Regex-based SQL colorizer.
//!
//! Only the lines currently visible in the editor are colorized, which is why scrolling to a new
//! first visible line triggers another run.

use regex::Regex;
use sqlcheck_core::{StyleId, StyleSpan};

/// Default `StyleId` constants for the SQL grammar.
///
/// These are only identifiers. The host theme is expected to map them to actual colors.
pub const SQL_STYLE_COMMENT: StyleId = 0x0300_0001;
pub const SQL_STYLE_STRING: StyleId = 0x0300_0002;
pub const SQL_STYLE_NUMBER: StyleId = 0x0300_0003;
pub const SQL_STYLE_KEYWORD: StyleId = 0x0300_0004;
pub const SQL_STYLE_QUOTED_IDENTIFIER: StyleId = 0x0300_0005;

/// A single regex highlighting rule.
#[derive(Debug, Clone)]
pub struct HighlightRule {
    regex: Regex,
    style_id: StyleId,
}

impl HighlightRule {
    pub fn new(pattern: &str, style_id: StyleId) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            style_id,
        })
    }

    pub fn style_id(&self) -> StyleId {
        self.style_id
    }
}

/// Line-oriented SQL highlighter.
///
/// Rules are tried in order and a later rule never styles text an earlier rule already claimed,
/// so keywords inside strings and comments stay uncolored.
#[derive(Debug, Clone)]
pub struct SqlHighlighter {
    rules: Vec<HighlightRule>,
}

impl SqlHighlighter {
    pub fn new(rules: Vec<HighlightRule>) -> Self {
        Self { rules }
    }

    /// Comments, strings, quoted identifiers, numbers and reserved keywords.
    pub fn sql_default() -> Result<Self, regex::Error> {
        let keywords = crate::keywords::RESERVED.join("|");
        Ok(Self::new(vec![
            // `-- ...` to end of line, and `/* ... */` (or to end of line if unterminated)
            HighlightRule::new(r"--.*$|/\*.*?(?:\*/|$)", SQL_STYLE_COMMENT)?,
            // '...' with '' escapes
            HighlightRule::new(r"'(?:''|[^'])*'?", SQL_STYLE_STRING)?,
            HighlightRule::new(r#""(?:""|[^"])*"?|`[^`]*`?"#, SQL_STYLE_QUOTED_IDENTIFIER)?,
            HighlightRule::new(r"\b\d+(?:\.\d+)?(?:[eE][+-]?\d+)?\b", SQL_STYLE_NUMBER)?,
            HighlightRule::new(&format!(r"(?i)\b(?:{keywords})\b"), SQL_STYLE_KEYWORD)?,
        ]))
    }

    pub fn rules(&self) -> &[HighlightRule] {
        &self.rules
    }

    /// Highlight lines `first_line .. first_line + line_count` of `text`.
    ///
    /// Returned spans use char offsets into the whole text and are sorted by start.
    pub fn highlight_lines(&self, text: &str, first_line: usize, line_count: usize) -> Vec<StyleSpan> {
        let mut spans = Vec::new();
        let mut line_start = 0;

        for (line, line_text) in text.split('\n').enumerate() {
            let line_chars = line_text.chars().count();
            if line >= first_line + line_count {
                break;
            }
            if line >= first_line {
                self.highlight_line(line_start, line_text, &mut spans);
            }
            line_start += line_chars + 1;
        }

        spans
    }

    fn highlight_line(&self, line_start: usize, line_text: &str, spans: &mut Vec<StyleSpan>) {
        let line_text = line_text.strip_suffix('\r').unwrap_or(line_text);
        let first_new = spans.len();

        for rule in &self.rules {
            for m in rule.regex.find_iter(line_text) {
                let Some(span) = span_from_match(
                    line_start,
                    line_text,
                    m.start(),
                    m.end(),
                    rule.style_id,
                ) else {
                    continue;
                };
                let claimed = spans[first_new..]
                    .iter()
                    .any(|other| span.start < other.end && other.start < span.end);
                if !claimed {
                    spans.push(span);
                }
            }
        }

        spans[first_new..].sort_by_key(|span| span.start);
    }
}

fn span_from_match(
    line_start_offset: usize,
    line_text: &str,
    match_start_byte: usize,
    match_end_byte: usize,
    style_id: StyleId,
) -> Option<StyleSpan> {
    if match_start_byte >= match_end_byte || match_end_byte > line_text.len() {
        return None;
    }

    let start_col = line_text[..match_start_byte].chars().count();
    let end_col = start_col + line_text[match_start_byte..match_end_byte].chars().count();

    Some(StyleSpan::new(
        line_start_offset + start_col,
        line_start_offset + end_col,
        style_id,
    ))
}
