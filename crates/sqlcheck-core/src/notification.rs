//! Notification state: what the harness currently shows next to the buffer.
//!
//! Exactly one [`NotificationState`] is current at any instant. It is always replaced wholesale
//! by the synchronization loop and consumed by the next paint; nothing patches a previous state
//! in place.

use crate::diagnostics::Diagnostic;
use crate::error::AnalysisError;

/// The current analysis outcome shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NotificationState {
    /// No results shown.
    #[default]
    Idle,
    /// Result of a conformance check, in the order the engine produced them (possibly empty).
    Diagnostics(Vec<Diagnostic>),
    /// The last analysis invocation failed.
    Error(AnalysisError),
    /// A one-shot informational message not derived from diagnostics (e.g. `"Formatted"`).
    Message(String),
}

/// Coarse kind of the overlay indicator painted over the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// A check ran and found nothing.
    Conformant,
    /// A check ran and produced diagnostics.
    NonConformant,
    /// The last invocation failed.
    Error,
    /// An informational message.
    Message,
}

/// Overlay indicator for every non-idle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    /// Indicator kind (theme hook).
    pub kind: OverlayKind,
    /// Indicator text.
    pub text: String,
}

impl NotificationState {
    /// Returns `true` when nothing is shown.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Entries of the problems list. Empty unless this is [`NotificationState::Diagnostics`].
    pub fn entries(&self) -> &[Diagnostic] {
        match self {
            Self::Diagnostics(diagnostics) => diagnostics,
            Self::Idle | Self::Error(_) | Self::Message(_) => &[],
        }
    }

    /// The failure being shown, if any.
    pub fn error(&self) -> Option<&AnalysisError> {
        match self {
            Self::Error(err) => Some(err),
            Self::Idle | Self::Diagnostics(_) | Self::Message(_) => None,
        }
    }

    /// The informational message being shown, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Message(text) => Some(text),
            Self::Idle | Self::Diagnostics(_) | Self::Error(_) => None,
        }
    }

    /// Overlay indicator to paint, `None` for [`NotificationState::Idle`].
    pub fn overlay(&self) -> Option<Overlay> {
        let (kind, text) = match self {
            Self::Idle => return None,
            Self::Diagnostics(diagnostics) if diagnostics.is_empty() => {
                (OverlayKind::Conformant, "Conformant".to_string())
            }
            Self::Diagnostics(diagnostics) => {
                let noun = if diagnostics.len() == 1 {
                    "non-conformance"
                } else {
                    "non-conformances"
                };
                (
                    OverlayKind::NonConformant,
                    format!("{} {noun}", diagnostics.len()),
                )
            }
            Self::Error(err) => (OverlayKind::Error, err.to_string()),
            Self::Message(text) => (OverlayKind::Message, text.clone()),
        };
        Some(Overlay { kind, text })
    }

    /// Replacement with the exception indicator cleared.
    ///
    /// `Error(_)` becomes `Idle`; every other state is returned unchanged.
    pub fn without_error(self) -> Self {
        match self {
            Self::Error(_) => Self::Idle,
            other @ (Self::Idle | Self::Diagnostics(_) | Self::Message(_)) => other,
        }
    }
}

impl From<Result<Vec<Diagnostic>, AnalysisError>> for NotificationState {
    fn from(result: Result<Vec<Diagnostic>, AnalysisError>) -> Self {
        match result {
            Ok(diagnostics) => Self::Diagnostics(diagnostics),
            Err(err) => Self::Error(err),
        }
    }
}
