//! Shared UI-facing state types.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Visual class of a status line.
///
/// `Processing` is the neutral in-flight indicator and must render
/// distinctly from both outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    Idle,
    Processing,
    Success,
    Error,
}

/// A user-visible status line.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn processing(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Processing,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    /// True once the action that produced this status has finished.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.kind, StatusKind::Success | StatusKind::Error)
    }
}

/// Client views a navigation can land on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    SignIn,
    SignUp,
    Dashboard,
}

/// A navigation scheduled by a completed action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub view: View,
    /// Delay before navigating, so the success message stays readable.
    pub after: Duration,
}

/// Re-entry guard for a single user action.
#[derive(Debug, Default)]
pub struct InFlight {
    active: AtomicBool,
}

impl InFlight {
    /// Claims the action. Returns `None` while a previous claim is alive.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                active: &self.active,
            })
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Releases the owning [`InFlight`] on drop.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    active: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}
