//! Edit/analysis synchronization loop.
//!
//! [`AnalysisLoop`] is the single place where edit, scroll/selection and command triggers meet.
//! It decides whether the engine runs, owns the [`NotificationState`] and the selection marker,
//! and keeps analysis from re-triggering itself through the change events it causes.
//!
//! # Guard
//!
//! Every trigger first tries to acquire the [`LoopGuard`]. A trigger that finds the guard busy is
//! dropped: it is not queued and not retried, and the caller gets
//! [`LoopOutcome::Skipped`]`(`[`SkipReason::Busy`]`)`. Edits made while a run is in flight are
//! picked up by the next trigger that arrives after the guard is released.
//!
//! All operations take `&self` so that a host notification raised from inside an engine call can
//! re-enter the loop. No loop state is borrowed across an engine call; the nested trigger sees
//! the busy guard and returns.
//!
//! # Example
//!
//! ```
//! use sqlcheck_core::{AnalysisLoop, AnalysisConfig, HeadlessSurface, LoopOutcome, SkipReason};
//! # use sqlcheck_core::{AnalysisEngine, AnalysisError, ConformanceConfig, Diagnostic,
//! #     EditorSurface, FormattedBuffer};
//! # struct Plain(String);
//! # impl FormattedBuffer for Plain {
//! #     fn source(&self) -> &str { &self.0 }
//! #     fn formatted(&self) -> &str { &self.0 }
//! # }
//! # struct NullEngine;
//! # impl AnalysisEngine for NullEngine {
//! #     type Formatted = Plain;
//! #     fn colorize(&mut self, _: &str, _: &mut dyn EditorSurface, _: &AnalysisConfig)
//! #         -> Result<(), AnalysisError> { Ok(()) }
//! #     fn format(&mut self, text: &str, _: &mut dyn EditorSurface, _: &AnalysisConfig)
//! #         -> Result<Plain, AnalysisError> { Ok(Plain(text.to_string())) }
//! #     fn colorize_formatted(&mut self, _: &Plain, _: &mut dyn EditorSurface, _: &AnalysisConfig)
//! #         -> Result<(), AnalysisError> { Ok(()) }
//! #     fn check_conformance(&mut self, _: &Plain, _: &ConformanceConfig)
//! #         -> Result<Vec<Diagnostic>, AnalysisError> { Ok(Vec::new()) }
//! # }
//!
//! let analysis = AnalysisLoop::new(HeadlessSurface::empty(20), NullEngine, AnalysisConfig::default());
//!
//! // Nothing to colorize yet.
//! assert_eq!(analysis.on_buffer_changed(), LoopOutcome::Skipped(SkipReason::EmptyBuffer));
//!
//! analysis.with_surface_mut(|surface| surface.insert(0, "SELECT 1"));
//! assert_eq!(analysis.on_buffer_changed(), LoopOutcome::Ran);
//! assert_eq!(analysis.on_check(), LoopOutcome::Ran);
//! assert!(analysis.notification().entries().is_empty());
//! ```

use crate::config::AnalysisConfig;
use crate::diagnostics::{Diagnostic, DiagnosticRange};
use crate::engine::{self, AnalysisEngine};
use crate::guard::{GuardToken, LoopGuard};
use crate::notification::NotificationState;
use crate::surface::EditorSurface;
use std::cell::RefCell;
use tracing::{debug, trace, warn};

/// Which document transition reset the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    /// A fresh, untitled document.
    New,
    /// A document opened from a file.
    Open,
    /// The current document reloaded from its file.
    Reload,
}

impl ResetKind {
    /// Whether loading for this transition holds the editor modification lock.
    pub fn locks_modification(self) -> bool {
        matches!(self, Self::Open | Self::Reload)
    }
}

/// Why a trigger did not run analysis. Never an error and never shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another run (or a document load) holds the guard.
    Busy,
    /// The buffer is empty.
    EmptyBuffer,
    /// The view still starts at the line that was last analysed.
    SameFirstVisibleLine,
}

/// What a trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The trigger ran to completion (the engine itself may have failed).
    Ran,
    /// The trigger was dropped.
    Skipped(SkipReason),
}

#[derive(Debug, Default)]
struct LoopState {
    notification: NotificationState,
    selection_marker: Option<DiagnosticRange>,
    last_analyzed_first_visible_line: usize,
    file_identity: Option<String>,
}

/// The synchronization loop between an editor surface and an analysis engine.
pub struct AnalysisLoop<S, E> {
    guard: LoopGuard,
    state: RefCell<LoopState>,
    surface: RefCell<S>,
    engine: RefCell<E>,
    config: AnalysisConfig,
}

impl<S, E> AnalysisLoop<S, E>
where
    S: EditorSurface,
    E: AnalysisEngine,
{
    /// Create a loop in the `Idle` state.
    pub fn new(surface: S, engine: E, config: AnalysisConfig) -> Self {
        let state = LoopState {
            last_analyzed_first_visible_line: surface.first_visible_line(),
            ..LoopState::default()
        };
        Self {
            guard: LoopGuard::new(),
            state: RefCell::new(state),
            surface: RefCell::new(surface),
            engine: RefCell::new(engine),
            config,
        }
    }

    /// The buffer content changed (typing, paste, or an engine rewrite).
    ///
    /// Re-colorizes unless the guard is busy or the buffer is empty. An error shown from a
    /// previous run is cleared first; a diagnostics list is kept unless colorization fails.
    pub fn on_buffer_changed(&self) -> LoopOutcome {
        let Some(token) = self.guard.try_acquire() else {
            trace!("buffer change dropped: analysis in flight");
            return LoopOutcome::Skipped(SkipReason::Busy);
        };
        self.colorize_run(&token, true)
    }

    /// User-initiated full analysis: format, colorize and conformance-check.
    ///
    /// The notification state is replaced wholesale with the diagnostics (possibly none) or
    /// with the failure.
    pub fn on_check(&self) -> LoopOutcome {
        let Some(_token) = self.guard.try_acquire() else {
            trace!("check dropped: analysis in flight");
            return LoopOutcome::Skipped(SkipReason::Busy);
        };
        let (Ok(mut surface), Ok(mut engine)) =
            (self.surface.try_borrow_mut(), self.engine.try_borrow_mut())
        else {
            return LoopOutcome::Skipped(SkipReason::Busy);
        };

        self.replace_notification(NotificationState::Idle);
        let file_identity = self.state.borrow().file_identity.clone();

        let was_locked = surface.is_modification_locked();
        surface.set_modification_locked(true);
        let result = engine::check_conformance(
            &mut *engine,
            &mut *surface,
            &self.config,
            file_identity.as_deref(),
        );
        surface.set_modification_locked(was_locked);

        match &result {
            Ok(diagnostics) => debug!(count = diagnostics.len(), "conformance check finished"),
            Err(err) => warn!(error = %err, "conformance check failed"),
        }
        self.replace_notification(result.into());
        surface.request_repaint();
        LoopOutcome::Ran
    }

    /// The view scrolled or the selection moved.
    ///
    /// Re-colorizes only when the first visible line differs from the one recorded at the last
    /// scroll-triggered run. A repaint is requested either way.
    pub fn on_scroll_or_selection_changed(&self, current_first_visible_line: usize) -> LoopOutcome {
        let Some(token) = self.guard.try_acquire() else {
            trace!("scroll/selection change dropped: analysis in flight");
            return LoopOutcome::Skipped(SkipReason::Busy);
        };

        let last_line = self.state.borrow().last_analyzed_first_visible_line;
        let outcome = if current_first_visible_line == last_line {
            LoopOutcome::Skipped(SkipReason::SameFirstVisibleLine)
        } else {
            let outcome = self.colorize_run(&token, false);
            if outcome != LoopOutcome::Skipped(SkipReason::Busy) {
                self.state.borrow_mut().last_analyzed_first_visible_line =
                    current_first_visible_line;
                debug!(
                    line = current_first_visible_line,
                    "first visible line analysed"
                );
            }
            outcome
        };

        drop(token);
        self.repaint();
        outcome
    }

    /// A diagnostic was picked from the problems list.
    ///
    /// Sets the selection marker, selects the diagnostic's range in the editor, scrolls it into
    /// view and then runs the scroll check, since the first visible line may have moved.
    pub fn on_diagnostic_picked(&self, diagnostic: &Diagnostic) -> LoopOutcome {
        let range = diagnostic.range;
        let first_visible_line = {
            let Ok(mut surface) = self.surface.try_borrow_mut() else {
                return LoopOutcome::Skipped(SkipReason::Busy);
            };
            self.state.borrow_mut().selection_marker = Some(range);
            surface.select(range);
            surface.scroll_to_caret();
            surface.request_repaint();
            surface.first_visible_line()
        };
        debug!(start = range.start, len = range.len(), "diagnostic picked");
        self.on_scroll_or_selection_changed(first_visible_line)
    }

    /// Pick the `index`-th entry of the current problems list.
    ///
    /// Returns `None` when there is no such entry.
    pub fn on_diagnostic_index_picked(&self, index: usize) -> Option<LoopOutcome> {
        let diagnostic = self.state.borrow().notification.entries().get(index).cloned()?;
        Some(self.on_diagnostic_picked(&diagnostic))
    }

    /// New/Open/Reload is about to replace the buffer: clear everything shown.
    pub fn on_view_reset(&self, kind: ResetKind) {
        debug!(?kind, "view reset");
        self.replace_notification(NotificationState::Idle);
        self.repaint();
    }

    /// Reset the view and load `text` into the editor.
    ///
    /// The guard is held for the whole load, and for Open/Reload the editor modification lock as
    /// well, so the load is never observed as a user edit. `file` becomes the document's identity
    /// (`New` clears it; `Reload` keeps the current one when `file` is `None`). Loading does not
    /// run analysis.
    pub fn load_document(&self, kind: ResetKind, file: Option<String>, text: &str) -> LoopOutcome {
        self.on_view_reset(kind);

        let Some(_token) = self.guard.try_acquire() else {
            trace!("load dropped: analysis in flight");
            return LoopOutcome::Skipped(SkipReason::Busy);
        };
        let Ok(mut surface) = self.surface.try_borrow_mut() else {
            return LoopOutcome::Skipped(SkipReason::Busy);
        };

        let was_locked = surface.is_modification_locked();
        if kind.locks_modification() {
            surface.set_modification_locked(true);
        }
        surface.replace_text(text);
        surface.set_modification_locked(was_locked);

        let mut state = self.state.borrow_mut();
        let previous = state.file_identity.take();
        state.file_identity = match kind {
            ResetKind::New => None,
            ResetKind::Open => file,
            ResetKind::Reload => file.or(previous),
        };
        debug!(?kind, file = ?state.file_identity, "document loaded");
        LoopOutcome::Ran
    }

    /// Check whether the buffer is already formatted and say so.
    pub fn on_is_formatted(&self) -> LoopOutcome {
        let Some(_token) = self.guard.try_acquire() else {
            trace!("is-formatted dropped: analysis in flight");
            return LoopOutcome::Skipped(SkipReason::Busy);
        };
        let (Ok(mut surface), Ok(mut engine)) =
            (self.surface.try_borrow_mut(), self.engine.try_borrow_mut())
        else {
            return LoopOutcome::Skipped(SkipReason::Busy);
        };

        let next = match engine::check_formatted(&mut *engine, &mut *surface, &self.config) {
            Ok(true) => NotificationState::Message("Formatted".to_string()),
            Ok(false) => NotificationState::Message("Not formatted".to_string()),
            Err(err) => {
                warn!(error = %err, "format check failed");
                NotificationState::Error(err)
            }
        };
        self.replace_notification(next);
        surface.request_repaint();
        LoopOutcome::Ran
    }

    /// The viewport was resized: re-colorize and record the first visible line.
    pub fn on_resize(&self) -> LoopOutcome {
        let Some(token) = self.guard.try_acquire() else {
            trace!("resize dropped: analysis in flight");
            return LoopOutcome::Skipped(SkipReason::Busy);
        };
        let outcome = self.colorize_run(&token, true);
        if let Ok(surface) = self.surface.try_borrow() {
            self.state.borrow_mut().last_analyzed_first_visible_line =
                surface.first_visible_line();
        }
        outcome
    }

    /// Snapshot of the current notification state.
    pub fn notification(&self) -> NotificationState {
        self.state.borrow().notification.clone()
    }

    /// Read the current notification state without cloning it.
    pub fn with_notification<R>(&self, f: impl FnOnce(&NotificationState) -> R) -> R {
        f(&self.state.borrow().notification)
    }

    /// Range of the picked diagnostic, if one is highlighted.
    pub fn selection_marker(&self) -> Option<DiagnosticRange> {
        self.state.borrow().selection_marker
    }

    /// First visible line recorded at the last scroll-triggered run.
    pub fn last_analyzed_first_visible_line(&self) -> usize {
        self.state.borrow().last_analyzed_first_visible_line
    }

    /// File identity of the loaded document.
    pub fn file_identity(&self) -> Option<String> {
        self.state.borrow().file_identity.clone()
    }

    /// Returns `true` while a run or a load is in flight.
    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// The configuration handed to the engine.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Read the editor surface.
    ///
    /// # Panics
    ///
    /// Panics if called from inside an engine call.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.surface.borrow())
    }

    /// Mutate the editor surface (user edits, scrolling).
    ///
    /// Triggers are not raised from here; the host reports the resulting changes afterwards.
    ///
    /// # Panics
    ///
    /// Panics if called from inside an engine call.
    pub fn with_surface_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.surface.borrow_mut())
    }

    fn colorize_run(&self, _token: &GuardToken<'_>, repaint: bool) -> LoopOutcome {
        let (Ok(mut surface), Ok(mut engine)) =
            (self.surface.try_borrow_mut(), self.engine.try_borrow_mut())
        else {
            return LoopOutcome::Skipped(SkipReason::Busy);
        };
        if surface.len_chars() == 0 {
            return LoopOutcome::Skipped(SkipReason::EmptyBuffer);
        }

        let shows_error = self.state.borrow().notification.error().is_some();
        if shows_error {
            let cleared = self.state.borrow().notification.clone().without_error();
            self.replace_notification(cleared);
        }

        let was_locked = surface.is_modification_locked();
        surface.set_modification_locked(true);
        let result = engine::colorize(&mut *engine, &mut *surface, &self.config);
        surface.set_modification_locked(was_locked);

        if let Err(err) = result {
            warn!(error = %err, "colorize failed");
            self.replace_notification(NotificationState::Error(err));
        }
        if repaint {
            surface.request_repaint();
        }
        LoopOutcome::Ran
    }

    fn replace_notification(&self, next: NotificationState) {
        let mut state = self.state.borrow_mut();
        state.notification = next;
        state.selection_marker = None;
    }

    fn repaint(&self) {
        if let Ok(mut surface) = self.surface.try_borrow_mut() {
            surface.request_repaint();
        }
    }
}
