//! Error types shared by the override engine, hook modules and emulation layer.

use thiserror::Error;
use veneer_events::EmitError;

use crate::address::AddressError;

/// Errors surfaced through intercepted host calls.
#[derive(Debug, Error)]
pub enum HookError {
    /// The native entry does not exist in this realm.
    #[error("surface not present in this realm: {0}")]
    MissingSurface(&'static str),

    /// An emission failed: an unhandled `error` event or a failing listener.
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// A listener swapped the in-flight event for one of a different kind.
    #[error("listener replaced the '{0}' event with a different kind")]
    EventReplaced(&'static str),

    /// An address could not be parsed or resolved.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// The receiver does not carry the host type the operation expects.
    #[error("receiver is not a {expected} (got {found})")]
    IncompatibleReceiver {
        expected: &'static str,
        found: &'static str,
    },

    /// A host native reported a failure.
    #[error(transparent)]
    Native(#[from] anyhow::Error),
}

impl HookError {
    /// The emission error, when this failure came out of a listener or an
    /// unhandled `error` event.
    pub fn as_emit(&self) -> Option<&EmitError> {
        match self {
            HookError::Emit(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T, E = HookError> = std::result::Result<T, E>;
