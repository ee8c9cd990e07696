//! Conformance rules.
//!
//! Token-level rules (`select-star`, `keyword-case`) run over a masked copy of the source in
//! which string literals, quoted identifiers and comments are blanked out. The mask keeps every
//! newline and the char count, so offsets found in it are offsets into the source. Layout rules
//! (`trailing-whitespace`, `line-length`) run over the source lines themselves.

use crate::keywords;
use regex::Regex;
use sqlcheck_core::{ConformanceConfig, Diagnostic, DiagnosticRange, DiagnosticSeverity};

pub const SELECT_STAR: &str = "select-star";
pub const KEYWORD_CASE: &str = "keyword-case";
pub const TRAILING_WHITESPACE: &str = "trailing-whitespace";
pub const LINE_LENGTH: &str = "line-length";

/// Value of [`Diagnostic::source`] for every rule diagnostic.
pub const RULE_SOURCE: &str = "sql-conformance";

/// Compiled conformance rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    select_star: Regex,
    word: Regex,
}

impl RuleSet {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            select_star: Regex::new(r"(?i)\bselect\s+(?:(?:distinct|all)\s+)?(\*)")?,
            word: Regex::new(r"[A-Za-z_][A-Za-z0-9_]*")?,
        })
    }

    /// Run every enabled rule over `source`.
    ///
    /// Diagnostics are sorted by range start; findings at the same offset keep rule order.
    pub fn check(
        &self,
        source: &str,
        uppercase_keywords: bool,
        config: &ConformanceConfig,
    ) -> Vec<Diagnostic> {
        let masked = mask_literals_and_comments(source);
        let mut diagnostics = Vec::new();

        if config.select_star {
            self.check_select_star(&masked, &mut diagnostics);
        }
        if config.keyword_case {
            self.check_keyword_case(&masked, uppercase_keywords, &mut diagnostics);
        }
        if config.trailing_whitespace {
            check_trailing_whitespace(source, &mut diagnostics);
        }
        if let Some(max) = config.max_line_length {
            check_line_length(source, max, &mut diagnostics);
        }

        diagnostics.sort_by_key(|diag| diag.range.start);
        diagnostics
    }

    fn check_select_star(&self, masked: &str, out: &mut Vec<Diagnostic>) {
        for caps in self.select_star.captures_iter(masked) {
            let Some(star) = caps.get(1) else {
                continue;
            };
            let start = masked[..star.start()].chars().count();
            out.push(rule_diagnostic(
                DiagnosticRange::from_start_len(start, 1),
                SELECT_STAR,
                DiagnosticSeverity::Warning,
                "avoid * in SELECT",
            ));
        }
    }

    fn check_keyword_case(&self, masked: &str, uppercase: bool, out: &mut Vec<Diagnostic>) {
        let mut char_pos = 0;
        let mut byte_pos = 0;

        for m in self.word.find_iter(masked) {
            let word = m.as_str();
            if !keywords::is_reserved(word) {
                continue;
            }
            let expected = if uppercase {
                word.to_ascii_uppercase()
            } else {
                word.to_ascii_lowercase()
            };
            if word == expected {
                continue;
            }

            char_pos += masked[byte_pos..m.start()].chars().count();
            byte_pos = m.start();
            out.push(rule_diagnostic(
                DiagnosticRange::from_start_len(char_pos, word.len()),
                KEYWORD_CASE,
                DiagnosticSeverity::Information,
                format!("keyword `{word}` should be written `{expected}`"),
            ));
        }
    }
}

fn check_trailing_whitespace(source: &str, out: &mut Vec<Diagnostic>) {
    for (line_start, line) in lines_with_offsets(source) {
        let trimmed = line.trim_end_matches([' ', '\t']);
        let blanks = line.len() - trimmed.len();
        if blanks == 0 {
            continue;
        }
        out.push(rule_diagnostic(
            DiagnosticRange::from_start_len(line_start + trimmed.chars().count(), blanks),
            TRAILING_WHITESPACE,
            DiagnosticSeverity::Hint,
            "trailing whitespace",
        ));
    }
}

fn check_line_length(source: &str, max: usize, out: &mut Vec<Diagnostic>) {
    for (line_start, line) in lines_with_offsets(source) {
        let len = line.chars().count();
        if len <= max {
            continue;
        }
        out.push(rule_diagnostic(
            DiagnosticRange::new(line_start + max, line_start + len),
            LINE_LENGTH,
            DiagnosticSeverity::Warning,
            format!("line is {len} characters long (max {max})"),
        ));
    }
}

fn rule_diagnostic(
    range: DiagnosticRange,
    code: &str,
    severity: DiagnosticSeverity,
    message: impl Into<String>,
) -> Diagnostic {
    Diagnostic::new(range, message)
        .with_severity(severity)
        .with_code(code)
        .with_source(RULE_SOURCE)
}

/// Lines without their terminator (`\n` or `\r\n`), with the char offset each line starts at.
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut line_start = 0;
    text.split('\n').map(move |line| {
        let start = line_start;
        line_start += line.chars().count() + 1;
        (start, line.strip_suffix('\r').unwrap_or(line))
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum MaskState {
    Code,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
    LineComment,
    BlockComment,
}

/// Blank out string literals, quoted identifiers and comments.
///
/// Every masked char becomes a space except newlines, which are kept, so the result has the same
/// char count and the same lines as `source`. Delimiters are masked along with the content.
pub fn mask_literals_and_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut state = MaskState::Code;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        let next = chars.peek().copied();
        let (next_state, masked) = match state {
            MaskState::Code => match (c, next) {
                ('\'', _) => (MaskState::SingleQuoted, true),
                ('"', _) => (MaskState::DoubleQuoted, true),
                ('`', _) => (MaskState::Backticked, true),
                ('-', Some('-')) => (MaskState::LineComment, true),
                ('/', Some('*')) => {
                    chars.next();
                    out.push(' ');
                    (MaskState::BlockComment, true)
                }
                _ => (MaskState::Code, false),
            },
            MaskState::SingleQuoted | MaskState::DoubleQuoted => {
                let quote = if state == MaskState::SingleQuoted { '\'' } else { '"' };
                if c == quote {
                    if next == Some(quote) {
                        // Doubled quote is an escape.
                        chars.next();
                        out.push(' ');
                        (state, true)
                    } else {
                        (MaskState::Code, true)
                    }
                } else {
                    (state, true)
                }
            }
            MaskState::Backticked => {
                if c == '`' {
                    (MaskState::Code, true)
                } else {
                    (state, true)
                }
            }
            MaskState::LineComment => {
                if c == '\n' {
                    (MaskState::Code, false)
                } else {
                    (state, true)
                }
            }
            MaskState::BlockComment => {
                if c == '*' && next == Some('/') {
                    chars.next();
                    out.push(' ');
                    (MaskState::Code, true)
                } else {
                    (state, true)
                }
            }
        };

        out.push(if masked && c != '\n' { ' ' } else { c });
        state = next_state;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn codes(diagnostics: &[Diagnostic]) -> Vec<(&str, usize, usize)> {
        diagnostics
            .iter()
            .map(|d| (d.code.as_deref().unwrap_or(""), d.range.start, d.range.len()))
            .collect()
    }

    fn only(rule: &str) -> ConformanceConfig {
        ConformanceConfig {
            select_star: rule == SELECT_STAR,
            keyword_case: rule == KEYWORD_CASE,
            trailing_whitespace: rule == TRAILING_WHITESPACE,
            max_line_length: None,
        }
    }

    #[test]
    fn test_mask_keeps_length_and_lines() {
        let source = "SELECT 'it''s' -- note\nFROM \"t\" /* a\nb */ WHERE x";
        let masked = mask_literals_and_comments(source);
        assert_eq!(masked.chars().count(), source.chars().count());
        assert_eq!(
            masked,
            format!(
                "SELECT{}\nFROM{}\n{}WHERE x",
                " ".repeat(16),
                " ".repeat(9),
                " ".repeat(5)
            )
        );
    }

    #[test]
    fn test_mask_handles_multibyte_content() {
        let source = "SELECT 'héllo', x";
        let masked = mask_literals_and_comments(source);
        assert_eq!(masked, format!("SELECT{}, x", " ".repeat(8)));
    }

    #[test]
    fn test_select_star() {
        let rules = RuleSet::new().unwrap();
        let diagnostics = rules.check("SELECT * FROM t", true, &ConformanceConfig::default());
        assert_eq!(codes(&diagnostics), vec![(SELECT_STAR, 7, 1)]);
        assert_eq!(diagnostics[0].message, "avoid * in SELECT");
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::Warning));
        assert_eq!(diagnostics[0].source.as_deref(), Some(RULE_SOURCE));
    }

    #[test]
    fn test_select_star_ignores_count_and_strings() {
        let rules = RuleSet::new().unwrap();
        let config = only(SELECT_STAR);
        assert!(rules.check("SELECT count(*) FROM t", true, &config).is_empty());
        assert!(rules.check("SELECT 'select *' FROM t", true, &config).is_empty());
        assert_eq!(
            codes(&rules.check("select distinct\n  * from t", true, &config)),
            vec![(SELECT_STAR, 18, 1)]
        );
    }

    #[test]
    fn test_keyword_case() {
        let rules = RuleSet::new().unwrap();
        let config = only(KEYWORD_CASE);

        let diagnostics = rules.check("select name From t -- from", true, &config);
        assert_eq!(
            codes(&diagnostics),
            vec![(KEYWORD_CASE, 0, 6), (KEYWORD_CASE, 12, 4)]
        );
        assert_eq!(
            diagnostics[1].message,
            "keyword `From` should be written `FROM`"
        );

        let lower = rules.check("SELECT name from t", false, &config);
        assert_eq!(codes(&lower), vec![(KEYWORD_CASE, 0, 6)]);
    }

    #[test]
    fn test_keyword_offsets_after_multibyte_literal() {
        let rules = RuleSet::new().unwrap();
        let diagnostics = rules.check("SELECT 'é' from t", true, &only(KEYWORD_CASE));
        assert_eq!(codes(&diagnostics), vec![(KEYWORD_CASE, 11, 4)]);
    }

    #[test]
    fn test_trailing_whitespace() {
        let rules = RuleSet::new().unwrap();
        let diagnostics = rules.check("SELECT 1  \r\nFROM t\t", true, &only(TRAILING_WHITESPACE));
        assert_eq!(
            codes(&diagnostics),
            vec![(TRAILING_WHITESPACE, 8, 2), (TRAILING_WHITESPACE, 18, 1)]
        );
    }

    #[test]
    fn test_line_length() {
        let rules = RuleSet::new().unwrap();
        let config = ConformanceConfig {
            max_line_length: Some(10),
            ..only(LINE_LENGTH)
        };
        let diagnostics = rules.check("SELECT 1\nSELECT abcdef", true, &config);
        assert_eq!(codes(&diagnostics), vec![(LINE_LENGTH, 19, 3)]);
        assert_eq!(diagnostics[0].message, "line is 13 characters long (max 10)");
    }

    #[test]
    fn test_output_sorted_by_start() {
        let rules = RuleSet::new().unwrap();
        let diagnostics = rules.check("select * from t ", true, &ConformanceConfig::default());
        assert_eq!(
            codes(&diagnostics),
            vec![
                (KEYWORD_CASE, 0, 6),
                (SELECT_STAR, 7, 1),
                (KEYWORD_CASE, 9, 4),
                (TRAILING_WHITESPACE, 15, 1),
            ]
        );
    }
}
