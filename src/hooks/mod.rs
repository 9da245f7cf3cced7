//! Capability Hook Modules
//!
//! One module per host API surface. Each module captures its surface from the
//! [`HostBinding`](crate::host::HostBinding) when it is built, owns one
//! [`Emitter`] for its closed event enum and exposes one `arm_*` operation per
//! intercepted entry point. `arm()` arms everything the module knows about.
//!
//! Arming is best effort: a surface the realm lacks is skipped and the arm
//! call returns `false`. Each `arm_*` runs at most once.

use std::rc::Rc;

use tracing::{debug, warn};
use veneer_events::{Emitter, Event, EventKind, ListenerId, ListenerResult};

use crate::config::RealmMode;
use crate::engine::{
    override_accessor, override_method, record_installs, AccessorHooks, AccessorSlot, ArmLedger,
    MethodSlot, Wrapped,
};
use crate::error::{HookError, Result};
use crate::event::{read_target, write_target, HookEvent, Observed};
use crate::realm::{ContextEvent, Realm, SlotWrapped};

mod attribute;
mod document;
mod element;
pub mod event_source;
mod fetch;
mod history;
mod idb;
mod location;
mod message;
mod navigator;
mod node;
mod object_url;
mod reflect;
mod storage;
mod style;
pub mod websocket;
mod worker;
mod xhr;

pub use attribute::{
    AttributeEvent, AttributeEventKind, AttributeHook, AttributeSurface, AttributeValue,
    ItemIndex, NamedItem, QualifiedName,
};
pub use document::{
    DocumentEvent, DocumentEventKind, DocumentHook, DocumentSurface, Markup, ParseSource,
    Selectors, TreeWalkerInit,
};
pub use element::{
    AdjacentHtml, AdjacentText, AttributeName, AttributeWrite, AudioSource, ElementEvent,
    ElementEventKind, ElementHook, ElementSurface, PropertyValue, UrlProperty,
};
pub use event_source::{
    EventSourceEvent, EventSourceEventKind, EventSourceHook, EventSourceInit, EventSourceSurface,
};
pub use fetch::{
    FetchEvent, FetchEventKind, FetchHook, FetchRequest, FetchSurface, HeaderName, HeaderRead,
    HeaderWrite, RequestInput,
};
pub use history::{
    HistoryDelta, HistoryEntry, HistoryEvent, HistoryEventKind, HistoryHook, HistorySurface,
};
pub use idb::{IdbEvent, IdbEventKind, IdbHook, IdbOpen, IdbSurface};
pub use location::{
    FragmentChange, LocationEvent, LocationEventKind, LocationHook, LocationRead, LocationWrite,
    WorkerLocationSurface,
};
pub use message::{MessageEvent, MessageEventKind, MessageHook, MessageSurface, PostedMessage};
pub use navigator::{Beacon, NavigatorEvent, NavigatorEventKind, NavigatorHook, NavigatorSurface};
pub use node::{
    ChildNode, NodeEvent, NodeEventKind, NodeHook, NodeList, NodeOrText, NodeSurface,
};
pub use object_url::{
    ObjectUrlEvent, ObjectUrlEventKind, ObjectUrlHook, ObjectUrlSurface, RevokedUrl, UrlSource,
};
pub use reflect::{
    FunctionSource, OwnDescriptors, OwnNames, ReflectEvent, ReflectEventKind, ReflectHook,
    ReflectSurface, Stringified,
};
pub(crate) use storage::store_variant;
pub use storage::{
    StorageEvent, StorageEventKind, StorageHook, StorageOp, StorageRequest, StorageSurface,
};
pub use style::{
    url_property, StyleEvent, StyleEventKind, StyleHook, StyleProperty, StyleSurface, StyleWrite,
    URL_PROPERTIES,
};
pub use websocket::{
    SocketFrame, SocketOpen, WebSocketEvent, WebSocketEventKind, WebSocketHook, WebSocketSurface,
};
pub use worker::{
    ModuleImport, ScriptImports, WorkerEvent, WorkerEventKind, WorkerHook, WorkerMessage,
    WorkerSpawn, WorkerSurface,
};
pub use xhr::{XhrBody, XhrEvent, XhrEventKind, XhrHeader, XhrHook, XhrOpen, XhrSurface};

/// The subscription and arming interface shared by every hook module.
pub trait HookModule {
    type Event: Event;

    /// Module name used in diagnostics.
    fn name(&self) -> &'static str;

    fn emitter(&self) -> &Emitter<Self::Event>;

    /// Arm every surface this module intercepts. Returns whether anything
    /// was installed.
    fn arm(&self) -> bool;

    fn on<F>(&self, kind: <Self::Event as Event>::Kind, listener: F) -> ListenerId
    where
        F: Fn(&mut Self::Event) -> ListenerResult + 'static,
    {
        self.emitter().on(kind, listener)
    }

    fn once<F>(&self, kind: <Self::Event as Event>::Kind, listener: F) -> ListenerId
    where
        F: Fn(&mut Self::Event) -> ListenerResult + 'static,
    {
        self.emitter().once(kind, listener)
    }

    fn off(&self, kind: <Self::Event as Event>::Kind, id: ListenerId) -> bool {
        self.emitter().off(kind, id)
    }
}

/// State shared by all hook modules: the captured surface, the emitter, the
/// arm tokens and the realm handle.
pub(crate) struct HookCore<S: ?Sized, E: Event> {
    name: &'static str,
    surface: Option<Rc<S>>,
    events: Rc<Emitter<E>>,
    ledger: ArmLedger,
    realm: Realm,
}

impl<S: ?Sized, E: Event> HookCore<S, E> {
    pub(crate) fn new(name: &'static str, surface: Option<Rc<S>>, realm: &Realm) -> Self {
        Self {
            name,
            surface,
            events: Rc::new(Emitter::with_max_listeners(realm.config().max_listeners)),
            ledger: ArmLedger::new(),
            realm: realm.clone(),
        }
    }

    pub(crate) fn events(&self) -> &Rc<Emitter<E>> {
        &self.events
    }

    pub(crate) fn surface(&self) -> Option<&Rc<S>> {
        self.surface.as_ref()
    }

    pub(crate) fn realm(&self) -> &Realm {
        &self.realm
    }

    /// The realm mode as of now.
    pub(crate) fn mode(&self) -> RealmMode {
        self.realm.mode()
    }

    pub(crate) fn is_armed(&self, key: &str) -> bool {
        self.ledger.is_armed(key)
    }

    /// Spend the arm token for `key`, running `install` against the surface.
    /// Each wrapper installed is announced as a context `wrap` event.
    pub(crate) fn arm(
        &self,
        key: &'static str,
        install: impl FnOnce(&Rc<S>, &Rc<Emitter<E>>) -> bool,
    ) -> bool {
        self.ledger.arm(key, || match &self.surface {
            Some(surface) => {
                let (installed, wrapped) = record_installs(|| install(surface, &self.events));
                debug!(module = self.name, surface = key, installed, "arm");
                for wrapped in wrapped {
                    self.announce(key, wrapped);
                }
                installed
            }
            None => {
                debug!(module = self.name, surface = key, "arm skipped: surface absent");
                false
            }
        })
    }

    fn announce(&self, key: &'static str, wrapped: Wrapped) {
        let mut event = ContextEvent::Wrap(SlotWrapped::new(self.name, key, wrapped));
        if let Err(err) = self.realm.events().emit(&mut event) {
            warn!(module = self.name, slot = wrapped.slot, error = %err, "wrap listener failed");
        }
    }
}

/// Constructor and projection of one event variant.
pub(crate) struct Variant<E, P> {
    pub(crate) wrap: fn(P) -> E,
    pub(crate) unwrap: fn(E) -> std::result::Result<P, E>,
}

impl<E, P> Clone for Variant<E, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, P> Copy for Variant<E, P> {}

/// `variant!(HistoryEvent::PushState)` builds the [`Variant`] for one arm of
/// an event enum.
macro_rules! variant {
    ($event:ident :: $arm:ident) => {
        $crate::hooks::Variant {
            wrap: $event::$arm,
            unwrap: |event| match event {
                $event::$arm(payload) => Ok(payload),
                other => Err(other),
            },
        }
    };
}
pub(crate) use variant;

/// Emit `payload` as `variant` and hand back the payload listeners left.
pub(crate) fn dispatch<E: Event, P>(
    events: &Emitter<E>,
    variant: Variant<E, P>,
    payload: P,
) -> Result<P> {
    let mut event = (variant.wrap)(payload);
    let name = event.kind().name();
    events.emit(&mut event)?;
    (variant.unwrap)(event).map_err(|_| HookError::EventReplaced(name))
}

/// Route every call through `slot` as one `HookEvent<A, O>`; the default
/// path calls the original with the event's data.
pub(crate) fn intercept_method<A, O, E>(
    slot: &MethodSlot<A, O>,
    events: &Rc<Emitter<E>>,
    variant: Variant<E, HookEvent<A, O>>,
) -> bool
where
    A: 'static,
    O: 'static,
    E: Event,
{
    let events = Rc::clone(events);
    override_method(slot, move |original, that, args| {
        let event = HookEvent::targeted(args, that.clone(), Rc::clone(original));
        let event = dispatch(&events, variant, event)?;
        event.finish(|data| original(that, data))
    })
}

/// Offer every read of `slot` as an `Observed` event; the default result is
/// the (possibly rewritten) observed value.
pub(crate) fn intercept_getter<T, E>(
    slot: &AccessorSlot<T>,
    events: &Rc<Emitter<E>>,
    variant: Variant<E, HookEvent<Observed<T>, T>>,
) -> bool
where
    T: 'static,
    E: Event,
{
    let events = Rc::clone(events);
    override_accessor(
        slot,
        AccessorHooks::new().get(move |original, that| {
            let value = original(that)?;
            let target = read_target(original);
            let event = HookEvent::targeted(Observed::new(value), that.clone(), target);
            let event = dispatch(&events, variant, event)?;
            event.finish(|data| Ok(data.value))
        }),
    )
}

/// Offer every write to `slot` as an `Observed` event before the native
/// setter runs with the (possibly rewritten) value.
pub(crate) fn intercept_setter<T, E>(
    slot: &AccessorSlot<T>,
    events: &Rc<Emitter<E>>,
    variant: Variant<E, HookEvent<Observed<T>, ()>>,
) -> bool
where
    T: 'static,
    E: Event,
{
    let events = Rc::clone(events);
    override_accessor(
        slot,
        AccessorHooks::new().set(move |original, that, value| {
            let target = write_target(original);
            let event = HookEvent::targeted(Observed::new(value), that.clone(), target);
            let event = dispatch(&events, variant, event)?;
            event.finish(|data| original(that, data.value))
        }),
    )
}

/// Both sides of an accessor.
pub(crate) fn intercept_accessor<T, E>(
    slot: &AccessorSlot<T>,
    events: &Rc<Emitter<E>>,
    get: Variant<E, HookEvent<Observed<T>, T>>,
    set: Variant<E, HookEvent<Observed<T>, ()>>,
) -> bool
where
    T: 'static,
    E: Event,
{
    let read = intercept_getter(slot, events, get);
    let write = intercept_setter(slot, events, set);
    read | write
}
