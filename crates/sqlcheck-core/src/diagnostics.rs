//! Conformance diagnostics data model.
//!
//! A [`Diagnostic`] is one finding produced by an analysis run (a parse failure position, a
//! conformance rule violation, ...). Diagnostics are immutable once produced: every run yields a
//! fresh list which replaces the previous one wholesale.
//!
//! Renderers use diagnostics for:
//! - the problems list next to the editor
//! - highlighting the range of the currently picked diagnostic

use std::fmt;

/// A half-open character-offset range (`start..end`) in the buffer.
///
/// Offsets are measured in Unicode scalar values (`char`), the same unit the editor surface uses
/// for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DiagnosticRange {
    /// Range start offset (inclusive).
    pub start: usize,
    /// Range end offset (exclusive).
    pub end: usize,
}

impl DiagnosticRange {
    /// Create a new range from `start..end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a range from a start offset and a length, the shape editor selection commands use.
    pub fn from_start_len(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// Number of chars covered by the range.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` for a caret-like range.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the range contains a char offset.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    /// Error diagnostics.
    Error,
    /// Warning diagnostics.
    Warning,
    /// Informational diagnostics.
    Information,
    /// Hint diagnostics.
    Hint,
}

/// A single diagnostic item for the current buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Diagnostic range in character offsets.
    pub range: DiagnosticRange,
    /// Optional diagnostic severity.
    pub severity: Option<DiagnosticSeverity>,
    /// Optional rule identifier (e.g. `"select-star"`).
    pub code: Option<String>,
    /// Optional producing stage (e.g. `"sql-conformance"`).
    pub source: Option<String>,
    /// File identity of the analysed document, if the document has one.
    pub file: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic with only a range and a message.
    pub fn new(range: DiagnosticRange, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: None,
            code: None,
            source: None,
            file: None,
            message: message.into(),
        }
    }

    /// Attach a severity.
    pub fn with_severity(mut self, severity: DiagnosticSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Attach a rule identifier.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach the producing stage name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach a file identity.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}
