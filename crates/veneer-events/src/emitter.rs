//! Listener registry and synchronous dispatch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use thiserror::Error;
use tracing::{trace, warn};

use crate::{ErrorValue, Event, EventKind, ListenerResult};

/// Listener count per event kind above which a leak warning is logged.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Handle returned on registration, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Errors raised while emitting.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The reserved error event was emitted with nobody listening for it.
    #[error("unhandled error event: {0}")]
    Unhandled(ErrorValue),

    /// A listener failed; the failure is passed through unchanged.
    #[error("listener for '{event}' failed: {cause}")]
    Listener {
        event: &'static str,
        cause: anyhow::Error,
    },
}

impl EmitError {
    /// The error value of an unhandled error emission.
    pub fn unhandled(&self) -> Option<&ErrorValue> {
        match self {
            EmitError::Unhandled(value) => Some(value),
            EmitError::Listener { .. } => None,
        }
    }

    /// The failure returned by a listener.
    pub fn listener_error(&self) -> Option<&anyhow::Error> {
        match self {
            EmitError::Listener { cause, .. } => Some(cause),
            EmitError::Unhandled(_) => None,
        }
    }
}

type Callback<E> = Rc<dyn Fn(&mut E) -> ListenerResult>;

struct Registered<E> {
    id: ListenerId,
    callback: Callback<E>,
    /// Present for one-shot listeners; flips on first delivery.
    fired: Option<Rc<Cell<bool>>>,
}

impl<E> Clone for Registered<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Rc::clone(&self.callback),
            fired: self.fired.clone(),
        }
    }
}

struct Bucket<E: Event> {
    kind: E::Kind,
    listeners: Vec<Registered<E>>,
    warned: bool,
}

struct Registry<E: Event> {
    buckets: Vec<Bucket<E>>,
    next_id: u64,
    max_listeners: usize,
}

impl<E: Event> Registry<E> {
    fn bucket(&self, kind: E::Kind) -> Option<&Bucket<E>> {
        self.buckets.iter().find(|bucket| bucket.kind == kind)
    }

    fn bucket_mut(&mut self, kind: E::Kind) -> &mut Bucket<E> {
        let index = match self.buckets.iter().position(|bucket| bucket.kind == kind) {
            Some(index) => index,
            None => {
                self.buckets.push(Bucket {
                    kind,
                    listeners: Vec::new(),
                    warned: false,
                });
                self.buckets.len() - 1
            }
        };
        &mut self.buckets[index]
    }

    fn remove(&mut self, kind: E::Kind, id: ListenerId) -> bool {
        let Some(index) = self.buckets.iter().position(|bucket| bucket.kind == kind) else {
            return false;
        };
        let bucket = &mut self.buckets[index];
        let Some(position) = bucket.listeners.iter().rposition(|entry| entry.id == id) else {
            return false;
        };
        bucket.listeners.remove(position);
        if bucket.listeners.is_empty() {
            self.buckets.remove(index);
        }
        true
    }
}

/// Synchronous, ordered event emitter bound to one event enum.
///
/// The emitter is single-threaded: listeners run on the calling thread, in
/// registration order, and may freely register, remove or emit while being
/// dispatched.
pub struct Emitter<E: Event> {
    registry: RefCell<Registry<E>>,
}

impl<E: Event> Emitter<E> {
    pub fn new() -> Self {
        Self::with_max_listeners(DEFAULT_MAX_LISTENERS)
    }

    pub fn with_max_listeners(max_listeners: usize) -> Self {
        Self {
            registry: RefCell::new(Registry {
                buckets: Vec::new(),
                next_id: 0,
                max_listeners,
            }),
        }
    }

    /// Register a listener at the end of the list for `kind`.
    pub fn on<F>(&self, kind: E::Kind, listener: F) -> ListenerId
    where
        F: Fn(&mut E) -> ListenerResult + 'static,
    {
        self.register(kind, Rc::new(listener), false, false)
    }

    /// Register a listener at the front of the list for `kind`.
    pub fn prepend_listener<F>(&self, kind: E::Kind, listener: F) -> ListenerId
    where
        F: Fn(&mut E) -> ListenerResult + 'static,
    {
        self.register(kind, Rc::new(listener), false, true)
    }

    /// Register a listener that is removed before its first invocation.
    pub fn once<F>(&self, kind: E::Kind, listener: F) -> ListenerId
    where
        F: Fn(&mut E) -> ListenerResult + 'static,
    {
        self.register(kind, Rc::new(listener), true, false)
    }

    pub fn prepend_once_listener<F>(&self, kind: E::Kind, listener: F) -> ListenerId
    where
        F: Fn(&mut E) -> ListenerResult + 'static,
    {
        self.register(kind, Rc::new(listener), true, true)
    }

    /// Remove one listener. Returns whether it was still registered.
    pub fn remove_listener(&self, kind: E::Kind, id: ListenerId) -> bool {
        self.registry.borrow_mut().remove(kind, id)
    }

    /// Alias for [`Emitter::remove_listener`].
    pub fn off(&self, kind: E::Kind, id: ListenerId) -> bool {
        self.remove_listener(kind, id)
    }

    /// Remove every listener for `kind`, or every listener at all.
    pub fn remove_all_listeners(&self, kind: Option<E::Kind>) {
        let mut registry = self.registry.borrow_mut();
        match kind {
            Some(kind) => registry.buckets.retain(|bucket| bucket.kind != kind),
            None => registry.buckets.clear(),
        }
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.registry
            .borrow()
            .bucket(kind)
            .map_or(0, |bucket| bucket.listeners.len())
    }

    /// Kinds that currently have listeners, in first-registration order.
    pub fn event_names(&self) -> Vec<E::Kind> {
        self.registry
            .borrow()
            .buckets
            .iter()
            .map(|bucket| bucket.kind)
            .collect()
    }

    pub fn max_listeners(&self) -> usize {
        self.registry.borrow().max_listeners
    }

    /// Change the leak-warning threshold. Zero disables the warning.
    pub fn set_max_listeners(&self, max_listeners: usize) -> &Self {
        self.registry.borrow_mut().max_listeners = max_listeners;
        self
    }

    /// Deliver `event` to every listener registered for its kind.
    ///
    /// Returns `Ok(false)` when nobody listens. Emitting the reserved error
    /// kind with no listener fails with [`EmitError::Unhandled`]. The first
    /// failing listener aborts dispatch and its error is returned.
    pub fn emit(&self, event: &mut E) -> Result<bool, EmitError> {
        let kind = event.kind();
        let snapshot: Vec<Registered<E>> = self
            .registry
            .borrow()
            .bucket(kind)
            .map(|bucket| bucket.listeners.clone())
            .unwrap_or_default();

        if snapshot.is_empty() {
            if kind.is_error() {
                if let Some(value) = event.error() {
                    return Err(EmitError::Unhandled(Arc::clone(value)));
                }
            }
            return Ok(false);
        }

        trace!(event = kind.name(), listeners = snapshot.len(), "emit");
        for entry in snapshot {
            if let Some(fired) = &entry.fired {
                if fired.replace(true) {
                    continue;
                }
                self.remove_listener(kind, entry.id);
            }
            (entry.callback)(event).map_err(|cause| EmitError::Listener {
                event: kind.name(),
                cause,
            })?;
        }
        Ok(true)
    }

    fn register(
        &self,
        kind: E::Kind,
        callback: Callback<E>,
        once: bool,
        prepend: bool,
    ) -> ListenerId {
        let mut registry = self.registry.borrow_mut();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        let max_listeners = registry.max_listeners;

        let entry = Registered {
            id,
            callback,
            fired: once.then(|| Rc::new(Cell::new(false))),
        };
        let bucket = registry.bucket_mut(kind);
        if prepend {
            bucket.listeners.insert(0, entry);
        } else {
            bucket.listeners.push(entry);
        }

        let count = bucket.listeners.len();
        if max_listeners > 0 && count > max_listeners && !bucket.warned {
            bucket.warned = true;
            warn!(
                event = kind.name(),
                count,
                limit = max_listeners,
                "possible listener leak: raise the limit with set_max_listeners"
            );
        }
        id
    }
}

impl<E: Event> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}
