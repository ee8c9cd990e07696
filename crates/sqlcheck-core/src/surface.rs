//! Editor surface seam.
//!
//! The synchronization loop never owns a widget. It talks to the editor through
//! [`EditorSurface`], the handful of operations a text control exposes (text, selection,
//! scrolling, repaint, the modification lock, styled spans).
//!
//! [`HeadlessSurface`] is a rope-backed implementation used by the harness binary and by tests.
//! Like a rich-text control, it reports every content change, including the restyling done by
//! colorization. Changes are queued and drained by the host with
//! [`HeadlessSurface::take_changes`], so the host decides which of them become analysis
//! triggers. A caller that never drains the queue still sees it bounded for repeated
//! colorization, since consecutive restyles are coalesced.

use crate::diagnostics::DiagnosticRange;
use ropey::Rope;
use std::collections::VecDeque;

/// Style ID type. The host theme maps ids to colors.
pub type StyleId = u32;

/// A styled char range produced by colorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleSpan {
    /// Start offset (chars, inclusive).
    pub start: usize,
    /// End offset (chars, exclusive).
    pub end: usize,
    /// Style ID
    pub style_id: StyleId,
}

impl StyleSpan {
    /// Create a new span with `[start, end)` offsets and a style id.
    pub fn new(start: usize, end: usize, style_id: StyleId) -> Self {
        Self {
            start,
            end,
            style_id,
        }
    }
}

/// Operations the synchronization loop and analysis engines need from the editor.
///
/// All offsets are char offsets. Lines are zero-based.
pub trait EditorSurface {
    /// Full buffer text.
    fn text(&self) -> String;

    /// Buffer length in chars.
    fn len_chars(&self) -> usize;

    /// Whether content changes are currently excluded from modification tracking.
    fn is_modification_locked(&self) -> bool;

    /// Set or clear the modification lock.
    fn set_modification_locked(&mut self, locked: bool);

    /// Current selection (`start == end` for a bare caret).
    fn selection(&self) -> DiagnosticRange;

    /// Select a range. The caret moves to the end of the range.
    fn select(&mut self, range: DiagnosticRange);

    /// Index of the first visible line.
    fn first_visible_line(&self) -> usize;

    /// Number of lines the viewport shows.
    fn visible_line_count(&self) -> usize;

    /// Scroll so that the caret line is visible.
    fn scroll_to_caret(&mut self);

    /// Ask the host to repaint.
    fn request_repaint(&mut self);

    /// Replace every style span.
    fn replace_styles(&mut self, spans: Vec<StyleSpan>);

    /// Replace the whole buffer (document load, engine rewrite).
    fn replace_text(&mut self, text: &str);
}

/// A change reported by [`HeadlessSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceChange {
    /// Buffer content changed. `locked` is the modification lock at the time of the change.
    TextChanged {
        /// Whether the modification lock was set.
        locked: bool,
    },
    /// Style spans were replaced.
    StylesChanged,
    /// The selection changed.
    SelectionChanged,
    /// The first visible line changed.
    Scrolled {
        /// New first visible line.
        first_visible_line: usize,
    },
}

/// Rope-backed in-memory editor surface.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    rope: Rope,
    selection: DiagnosticRange,
    scroll_top: usize,
    viewport_height: usize,
    modification_locked: bool,
    is_modified: bool,
    styles: Vec<StyleSpan>,
    repaint_requests: u64,
    changes: VecDeque<SurfaceChange>,
}

impl HeadlessSurface {
    /// Create a surface holding `text`, showing `viewport_height` lines.
    pub fn new(text: &str, viewport_height: usize) -> Self {
        Self {
            rope: Rope::from_str(text),
            selection: DiagnosticRange::default(),
            scroll_top: 0,
            viewport_height: viewport_height.max(1),
            modification_locked: false,
            is_modified: false,
            styles: Vec::new(),
            repaint_requests: 0,
            changes: VecDeque::new(),
        }
    }

    /// Create an empty surface.
    pub fn empty(viewport_height: usize) -> Self {
        Self::new("", viewport_height)
    }

    /// Number of lines (a trailing newline opens an empty last line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Zero-based line containing a char offset (clamped to the buffer).
    pub fn line_of_char(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    /// `(line, column)` of a char offset, both zero-based.
    pub fn position_of_char(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        (line, offset - self.rope.line_to_char(line))
    }

    /// Caret offset (end of the selection).
    pub fn caret(&self) -> usize {
        self.selection.end
    }

    /// Insert text at a char offset, as a user edit would. The caret lands after the insert.
    pub fn insert(&mut self, offset: usize, text: &str) {
        let offset = offset.min(self.rope.len_chars());
        self.rope.insert(offset, text);
        let caret = offset + text.chars().count();
        self.selection = DiagnosticRange::new(caret, caret);
        self.text_changed();
    }

    /// Delete a char range, as a user edit would. The caret lands at the range start.
    pub fn delete(&mut self, range: DiagnosticRange) {
        let len = self.rope.len_chars();
        let start = range.start.min(len);
        let end = range.end.min(len).max(start);
        if start == end {
            return;
        }
        self.rope.remove(start..end);
        self.selection = DiagnosticRange::new(start, start);
        self.clamp_scroll();
        self.text_changed();
    }

    /// Scroll so that `line` is the first visible line (clamped to the last line).
    pub fn scroll_to_line(&mut self, line: usize) {
        let line = line.min(self.line_count().saturating_sub(1));
        if line != self.scroll_top {
            self.scroll_top = line;
            self.changes.push_back(SurfaceChange::Scrolled {
                first_visible_line: line,
            });
        }
    }

    /// Change how many lines the viewport shows.
    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
    }

    /// Whether a user edit happened since the last [`mark_clean`](Self::mark_clean).
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Forget the modified mark (e.g. after saving).
    pub fn mark_clean(&mut self) {
        self.is_modified = false;
    }

    /// Current style spans.
    pub fn styles(&self) -> &[StyleSpan] {
        &self.styles
    }

    /// Number of repaints requested so far.
    pub fn repaint_requests(&self) -> u64 {
        self.repaint_requests
    }

    /// Drain the queued change notifications, oldest first.
    pub fn take_changes(&mut self) -> Vec<SurfaceChange> {
        self.changes.drain(..).collect()
    }

    fn text_changed(&mut self) {
        if !self.modification_locked {
            self.is_modified = true;
        }
        self.changes.push_back(SurfaceChange::TextChanged {
            locked: self.modification_locked,
        });
    }

    fn clamp_scroll(&mut self) {
        let last_line = self.line_count().saturating_sub(1);
        if self.scroll_top > last_line {
            self.scroll_to_line(last_line);
        }
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::empty(25)
    }
}

impl EditorSurface for HeadlessSurface {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn is_modification_locked(&self) -> bool {
        self.modification_locked
    }

    fn set_modification_locked(&mut self, locked: bool) {
        self.modification_locked = locked;
    }

    fn selection(&self) -> DiagnosticRange {
        self.selection
    }

    fn select(&mut self, range: DiagnosticRange) {
        let len = self.rope.len_chars();
        let start = range.start.min(len);
        let range = DiagnosticRange::new(start, range.end.min(len).max(start));
        if range != self.selection {
            self.selection = range;
            self.changes.push_back(SurfaceChange::SelectionChanged);
        }
    }

    fn first_visible_line(&self) -> usize {
        self.scroll_top
    }

    fn visible_line_count(&self) -> usize {
        self.viewport_height
    }

    fn scroll_to_caret(&mut self) {
        let caret_line = self.line_of_char(self.caret());
        if caret_line < self.scroll_top {
            self.scroll_to_line(caret_line);
        } else if caret_line >= self.scroll_top + self.viewport_height {
            self.scroll_to_line(caret_line + 1 - self.viewport_height);
        }
    }

    fn request_repaint(&mut self) {
        self.repaint_requests += 1;
    }

    fn replace_styles(&mut self, spans: Vec<StyleSpan>) {
        self.styles = spans;
        // Back-to-back restyles collapse into one notification.
        if self.changes.back() != Some(&SurfaceChange::StylesChanged) {
            self.changes.push_back(SurfaceChange::StylesChanged);
        }
    }

    fn replace_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.selection = DiagnosticRange::default();
        self.styles.clear();
        self.scroll_to_line(0);
        self.text_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbered_lines(count: usize) -> String {
        (0..count)
            .map(|i| format!("SELECT {i};"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_user_edit_marks_modified_and_queues_change() {
        let mut surface = HeadlessSurface::new("SELECT 1", 10);
        surface.insert(8, ";");
        assert_eq!(surface.text(), "SELECT 1;");
        assert!(surface.is_modified());
        assert_eq!(surface.caret(), 9);
        assert_eq!(
            surface.take_changes(),
            vec![SurfaceChange::TextChanged { locked: false }]
        );
        assert!(surface.take_changes().is_empty());
    }

    #[test]
    fn test_locked_changes_do_not_mark_modified() {
        let mut surface = HeadlessSurface::empty(10);
        surface.set_modification_locked(true);
        surface.replace_text("SELECT 1;");
        surface.set_modification_locked(false);
        assert!(!surface.is_modified());
        assert_eq!(
            surface.take_changes(),
            vec![SurfaceChange::TextChanged { locked: true }]
        );
    }

    #[test]
    fn test_select_clamps_and_reports_once() {
        let mut surface = HeadlessSurface::new("SELECT 1", 10);
        surface.select(DiagnosticRange::new(7, 100));
        assert_eq!(surface.selection(), DiagnosticRange::new(7, 8));
        surface.select(DiagnosticRange::new(7, 8));
        assert_eq!(surface.take_changes(), vec![SurfaceChange::SelectionChanged]);
    }

    #[test]
    fn test_consecutive_restyles_coalesce() {
        let mut surface = HeadlessSurface::new("SELECT 1", 10);
        for _ in 0..100 {
            surface.replace_styles(vec![StyleSpan::new(0, 6, 1)]);
        }
        surface.insert(8, ";");
        surface.replace_styles(Vec::new());
        assert_eq!(
            surface.take_changes(),
            vec![
                SurfaceChange::StylesChanged,
                SurfaceChange::TextChanged { locked: false },
                SurfaceChange::StylesChanged,
            ]
        );
        assert!(surface.styles().is_empty());
    }

    #[test]
    fn test_scroll_to_caret_moves_viewport() {
        let text = numbered_lines(100);
        let mut surface = HeadlessSurface::new(&text, 10);
        let offset = text.find("SELECT 50;").unwrap();
        surface.select(DiagnosticRange::from_start_len(offset, 6));
        surface.scroll_to_caret();
        assert_eq!(surface.first_visible_line(), 41);

        surface.select(DiagnosticRange::new(0, 0));
        surface.scroll_to_caret();
        assert_eq!(surface.first_visible_line(), 0);
    }

    #[test]
    fn test_delete_clamps_scroll() {
        let text = numbered_lines(30);
        let mut surface = HeadlessSurface::new(&text, 5);
        surface.scroll_to_line(25);
        surface.delete(DiagnosticRange::new(9, surface.len_chars()));
        assert_eq!(surface.line_count(), 1);
        assert_eq!(surface.first_visible_line(), 0);
    }

    #[test]
    fn test_position_of_char() {
        let surface = HeadlessSurface::new("SELECT *\nFROM t", 5);
        assert_eq!(surface.position_of_char(9), (1, 0));
        assert_eq!(surface.position_of_char(14), (1, 5));
    }
}
