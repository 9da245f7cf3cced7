//! Host binding
//!
//! The realm's global object, expressed as an explicit record of optional
//! API surfaces. Each surface is a struct of replaceable slots (see
//! [`engine`](crate::engine)); a `None` surface means the realm does not
//! provide that API at all.
//!
//! The embedder builds the binding once, at realm start-up, by defining the
//! native entry of every slot it supports:
//!
//! ```ignore
//! let history = HistorySurface::new();
//! history.go.define(|_that, delta| {
//!     navigate_by(delta.delta);
//!     Ok(())
//! });
//!
//! let host = HostBinding {
//!     history: Some(Rc::new(history)),
//!     ..HostBinding::window()
//! };
//! ```

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::emulation::Location;
use crate::error::{HookError, Result};
use crate::hooks::{
    AttributeSurface, DocumentSurface, ElementSurface, EventSourceSurface, FetchSurface,
    HistorySurface, IdbSurface, MessageSurface, NavigatorSurface, NodeSurface, ObjectUrlSurface,
    ReflectSurface, StorageSurface, StyleSurface, WebSocketSurface, WorkerLocationSurface,
    WorkerSurface, XhrSurface,
};

/// Opaque host value: history state, message payloads, request options.
pub type HostValue = serde_json::Value;

/// The `this` of a host call.
///
/// A receiver is an identity-compared handle to a host object. Its brand is
/// the host type name (`"Request"`, `"Storage"`, ...) and is what
/// [`Receiver::instance_of`] checks.
#[derive(Clone)]
pub struct Receiver {
    brand: &'static str,
    inner: Rc<dyn Any>,
}

impl Receiver {
    pub fn new<T: 'static>(brand: &'static str, value: T) -> Self {
        Self {
            brand,
            inner: Rc::new(value),
        }
    }

    pub fn brand(&self) -> &'static str {
        self.brand
    }

    pub fn instance_of(&self, brand: &str) -> bool {
        self.brand == brand
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Borrow the host payload, failing when the receiver has another brand
    /// or payload type.
    pub fn expect_ref<T: 'static>(&self, brand: &'static str) -> Result<&T> {
        if !self.instance_of(brand) {
            return Err(HookError::IncompatibleReceiver {
                expected: brand,
                found: self.brand,
            });
        }
        self.downcast_ref::<T>()
            .ok_or(HookError::IncompatibleReceiver {
                expected: brand,
                found: self.brand,
            })
    }

    /// Whether both handles point at the same host object.
    pub fn same(&self, other: &Receiver) -> bool {
        Rc::as_ptr(&self.inner) as *const () == Rc::as_ptr(&other.inner) as *const ()
    }
}

impl PartialEq for Receiver {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Receiver {}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Receiver({} @ {:p})", self.brand, Rc::as_ptr(&self.inner) as *const ())
    }
}

/// The global object of one realm.
pub struct HostBinding {
    /// Receiver for calls made on the global object itself (`fetch`, `postMessage`).
    pub global: Receiver,
    pub document: Option<Rc<DocumentSurface>>,
    pub element: Option<Rc<ElementSurface>>,
    pub node: Option<Rc<NodeSurface>>,
    pub attribute: Option<Rc<AttributeSurface>>,
    pub reflect: Option<Rc<ReflectSurface>>,
    pub fetch: Option<Rc<FetchSurface>>,
    pub xhr: Option<Rc<XhrSurface>>,
    pub event_source: Option<Rc<EventSourceSurface>>,
    pub websocket: Option<Rc<WebSocketSurface>>,
    pub navigator: Option<Rc<NavigatorSurface>>,
    pub history: Option<Rc<HistorySurface>>,
    pub location: Option<Rc<dyn Location>>,
    pub worker_location: Option<Rc<WorkerLocationSurface>>,
    pub message: Option<Rc<MessageSurface>>,
    pub worker: Option<Rc<WorkerSurface>>,
    pub object_url: Option<Rc<ObjectUrlSurface>>,
    pub storage: Option<Rc<StorageSurface>>,
    pub style: Option<Rc<StyleSurface>>,
    pub idb: Option<Rc<IdbSurface>>,
}

impl HostBinding {
    /// A binding with no surfaces at all.
    pub fn new(global: Receiver) -> Self {
        Self {
            global,
            document: None,
            element: None,
            node: None,
            attribute: None,
            reflect: None,
            fetch: None,
            xhr: None,
            event_source: None,
            websocket: None,
            navigator: None,
            history: None,
            location: None,
            worker_location: None,
            message: None,
            worker: None,
            object_url: None,
            storage: None,
            style: None,
            idb: None,
        }
    }

    pub fn window() -> Self {
        Self::new(Receiver::new("Window", ()))
    }

    pub fn worker() -> Self {
        Self::new(Receiver::new("WorkerGlobalScope", ()))
    }
}
