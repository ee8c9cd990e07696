#![warn(missing_docs)]
//! sqlcheck-core - Headless Edit/Analysis Synchronization Core
//!
//! # Overview
//!
//! `sqlcheck-core` drives an external SQL formatting / conformance engine from a text editor.
//! It does not paint anything and does not own a widget: the editor is reached through the
//! [`EditorSurface`] trait and the engine through the [`AnalysisEngine`] trait.
//!
//! The heart of the crate is [`AnalysisLoop`], which decides *when* analysis runs in response to
//! edits, scrolling, selection changes and explicit commands, and keeps one current
//! [`NotificationState`] plus the highlighted diagnostic (the selection marker).
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  AnalysisLoop (triggers, guard, marker)     │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  NotificationState / Diagnostic             │  ← Rendering Data
//! ├─────────────────────────────────────────────┤
//! │  Invoker (format → colorize → conformance)  │  ← Engine Seam
//! ├─────────────────────────────────────────────┤
//! │  EditorSurface (HeadlessSurface)            │  ← Editor Seam
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Module Description
//!
//! - [`diagnostics`] - Diagnostic data model
//! - [`notification`] - The one current notification state
//! - [`guard`] - Drop-on-contention loop guard
//! - [`surface`] - Editor surface trait and a rope-backed headless surface
//! - [`engine`] - Analysis engine trait and the invoker pipeline
//! - [`sync`] - The synchronization loop
//! - [`config`] - JSON configuration
//! - [`error`] - Error types
//!
//! # Threading
//!
//! Everything runs on one cooperative event thread. [`AnalysisLoop`] is `!Sync`; its guard is a
//! re-entrancy barrier for synchronous nested triggers raised while an engine call is in flight.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod guard;
pub mod notification;
pub mod surface;
pub mod sync;

pub use config::{AnalysisConfig, ConformanceConfig, FormatConfig, HostConfig, Requirement};
pub use diagnostics::{Diagnostic, DiagnosticRange, DiagnosticSeverity};
pub use engine::{AnalysisEngine, FormattedBuffer};
pub use error::{AnalysisError, ConfigError};
pub use guard::{GuardToken, LoopGuard};
pub use notification::{NotificationState, Overlay, OverlayKind};
pub use surface::{EditorSurface, HeadlessSurface, StyleId, StyleSpan, SurfaceChange};
pub use sync::{AnalysisLoop, LoopOutcome, ResetKind, SkipReason};
