//! Veneer Events
//!
//! A small, synchronous publish/subscribe core. Every emitter is bound to one
//! closed event enum; each variant carries its own strongly typed payload and
//! maps to a stable [`EventKind`] used for registration.
//!
//! # Example
//!
//! ```
//! use veneer_events::{events, Emitter};
//!
//! events! {
//!     pub enum Chime: ChimeKind {
//!         Ring(u32) => "ring",
//!     }
//! }
//!
//! let emitter = Emitter::<Chime>::new();
//! emitter.on(ChimeKind::Ring, |event| {
//!     if let Chime::Ring(count) = event {
//!         *count += 1;
//!     }
//!     Ok(())
//! });
//!
//! let mut event = Chime::Ring(1);
//! assert!(emitter.emit(&mut event).unwrap());
//! assert!(matches!(event, Chime::Ring(2)));
//! ```

mod emitter;

pub use emitter::{EmitError, Emitter, ListenerId, DEFAULT_MAX_LISTENERS};

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Error value carried by the reserved `error` event.
pub type ErrorValue = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// What a listener returns. A failure propagates out of `emit` untouched.
pub type ListenerResult = anyhow::Result<()>;

/// Discriminant of an [`Event`], used as the registration key.
pub trait EventKind: Copy + Eq + Hash + fmt::Debug + 'static {
    /// Stable, human readable event name (e.g. `"pushState"`).
    fn name(self) -> &'static str;

    /// Whether this kind is the reserved error kind.
    fn is_error(self) -> bool {
        false
    }
}

/// A closed set of events that one [`Emitter`] can publish.
pub trait Event: 'static {
    type Kind: EventKind;

    fn kind(&self) -> Self::Kind;

    /// Payload of the reserved error variant, if this is one.
    fn error(&self) -> Option<&ErrorValue> {
        None
    }
}

/// Declare an event enum together with its kind enum.
///
/// Each variant is written as `Variant(Payload) => "name"`. A reserved
/// `Error(ErrorValue)` variant named `"error"` is always appended; emitting it
/// with no error listener registered fails with [`EmitError::Unhandled`].
#[macro_export]
macro_rules! events {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $kind:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident ( $payload:ty ) => $label:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant($payload),
            )*
            /// Reserved failure notification.
            Error($crate::ErrorValue),
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $kind {
            $( $variant, )*
            Error,
        }

        impl $crate::EventKind for $kind {
            fn name(self) -> &'static str {
                match self {
                    $( $kind::$variant => $label, )*
                    $kind::Error => "error",
                }
            }

            fn is_error(self) -> bool {
                matches!(self, $kind::Error)
            }
        }

        impl $crate::Event for $name {
            type Kind = $kind;

            fn kind(&self) -> $kind {
                match self {
                    $( $name::$variant(_) => $kind::$variant, )*
                    $name::Error(_) => $kind::Error,
                }
            }

            fn error(&self) -> Option<&$crate::ErrorValue> {
                match self {
                    $name::Error(err) => Some(err),
                    _ => None,
                }
            }
        }

        impl $name {
            /// Wrap an error into the reserved error variant.
            #[allow(dead_code)]
            pub fn from_error<E>(err: E) -> Self
            where
                E: std::error::Error + Send + Sync + 'static,
            {
                $name::Error(std::sync::Arc::new(err))
            }
        }
    };
}
