//! Interception Event Protocol
//!
//! Every intercepted call builds one [`HookEvent`] and hands it to policy
//! listeners. A listener can:
//!
//! - observe: read [`HookEvent::data`] and leave it alone;
//! - rewrite: mutate `data`; the real operation then runs with the new data;
//! - replace: call [`HookEvent::respond_with`]; the real operation is skipped
//!   and the response becomes the call's result.

use std::fmt;
use std::rc::Rc;

use crate::engine::{Getter, NativeFn, Setter};
use crate::error::{HookError, Result};
use crate::host::Receiver;

/// One occurrence of an intercepted operation.
pub struct HookEvent<D, R> {
    /// Arguments (or, for reads, the observed result) of the operation.
    pub data: D,
    that: Option<Receiver>,
    target: Option<NativeFn<D, R>>,
    response: Option<R>,
}

impl<D, R> HookEvent<D, R> {
    /// An event with no receiver and no original operation.
    pub fn new(data: D) -> Self {
        Self {
            data,
            that: None,
            target: None,
            response: None,
        }
    }

    /// An event raised on `that` with no native operation behind it.
    pub fn on_receiver(data: D, that: Receiver) -> Self {
        Self {
            data,
            that: Some(that),
            target: None,
            response: None,
        }
    }

    /// An event whose default path runs `target` against `that`.
    pub fn targeted(data: D, that: Receiver, target: NativeFn<D, R>) -> Self {
        Self {
            data,
            that: Some(that),
            target: Some(target),
            response: None,
        }
    }

    /// The receiver the original operation would run against.
    pub fn that(&self) -> Option<&Receiver> {
        self.that.as_ref()
    }

    pub fn intercepted(&self) -> bool {
        self.response.is_some()
    }

    pub fn return_value(&self) -> Option<&R> {
        self.response.as_ref()
    }

    /// Replace the operation's result with `value`.
    ///
    /// The first response is final: later calls leave it unchanged and
    /// return `false`.
    pub fn respond_with(&mut self, value: R) -> bool {
        if self.response.is_some() {
            return false;
        }
        self.response = Some(value);
        true
    }

    pub fn into_outcome(self) -> Outcome<D, R> {
        match self.response {
            Some(value) => Outcome::Responded(value),
            None => Outcome::Proceed(self.data),
        }
    }

    /// Resolve the event: the response when intercepted, `proceed(data)`
    /// otherwise.
    pub(crate) fn finish(self, proceed: impl FnOnce(D) -> Result<R>) -> Result<R> {
        match self.into_outcome() {
            Outcome::Responded(value) => Ok(value),
            Outcome::Proceed(data) => proceed(data),
        }
    }
}

impl<D: Clone, R> HookEvent<D, R> {
    /// Run the original operation against `that` with the current data.
    ///
    /// The original never re-enters its own wrapper, so listeners may use
    /// this to inspect what the real operation would produce.
    pub fn call_target(&self) -> Result<R> {
        match (&self.target, &self.that) {
            (Some(target), Some(that)) => target(that, self.data.clone()),
            _ => Err(HookError::MissingSurface("event target")),
        }
    }
}

impl<D: fmt::Debug, R: fmt::Debug> fmt::Debug for HookEvent<D, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookEvent")
            .field("data", &self.data)
            .field("that", &self.that)
            .field("has_target", &self.target.is_some())
            .field("response", &self.response)
            .finish()
    }
}

/// How an event was resolved by its listeners.
#[derive(Debug)]
pub enum Outcome<D, R> {
    Responded(R),
    Proceed(D),
}

/// Data of an intercepted read: the value the native accessor produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Observed<T> {
    pub value: T,
}

impl<T> Observed<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

/// Wrap a getter so it can serve as the target of an [`Observed`] read event.
pub(crate) fn read_target<T: 'static>(get: &Getter<T>) -> NativeFn<Observed<T>, T> {
    let get = Rc::clone(get);
    Rc::new(move |that: &Receiver, _: Observed<T>| get(that))
}

/// Wrap a setter so it can serve as the target of an [`Observed`] write event.
pub(crate) fn write_target<T: 'static>(set: &Setter<T>) -> NativeFn<Observed<T>, ()> {
    let set = Rc::clone(set);
    Rc::new(move |that: &Receiver, data: Observed<T>| set(that, data.value))
}
