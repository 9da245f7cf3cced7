//! Execution Context
//!
//! One [`Context`] per realm. It owns the host binding, one instance of every
//! hook module and the reflection natives captured before any hook is armed.
//!
//! [`ContextBuilder`] attaches the transport and context listeners before
//! anything is armed, which matters when `arm_on_start` is set:
//!
//! ```ignore
//! let context = Context::builder(host, config)
//!     .transport(Rc::new(client))
//!     .on(ContextEventKind::Wrap, |event| {
//!         if let ContextEvent::Wrap(wrapped) = event {
//!             register_wrapper(wrapped.slot);
//!         }
//!         Ok(())
//!     })
//!     .build();
//! ```

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info};
use veneer_events::{Emitter, ListenerId, ListenerResult};

use crate::config::{ContextConfig, RealmMode};
use crate::engine::NativeFn;
use crate::error::{HookError, Result};
use crate::hooks::{
    AttributeHook, DocumentHook, ElementHook, EventSourceHook, FetchHook, HistoryHook, HookModule,
    IdbHook, LocationHook, MessageHook, NavigatorHook, NodeHook, ObjectUrlHook, ReflectHook,
    StorageHook, StyleHook, WebSocketHook, WorkerHook, XhrHook,
};
use crate::host::{HostBinding, Receiver};
use crate::realm::{ContextEvent, ContextEventKind, Realm, TransportClient};

/// Reflection natives, captured before the reflection hooks are armed.
#[derive(Clone, Default)]
pub struct NativeMethods {
    pub to_string: Option<NativeFn<(), String>>,
    pub get_own_property_names: Option<NativeFn<Receiver, Vec<String>>>,
    pub get_own_property_descriptors: Option<NativeFn<Receiver, Value>>,
}

impl NativeMethods {
    pub fn capture(host: &HostBinding) -> Self {
        match &host.reflect {
            Some(reflect) => Self {
                to_string: reflect.to_string.original(),
                get_own_property_names: reflect.get_own_property_names.original(),
                get_own_property_descriptors: reflect.get_own_property_descriptors.original(),
            },
            None => Self::default(),
        }
    }
}

impl fmt::Debug for NativeMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMethods")
            .field("to_string", &self.to_string.is_some())
            .field("get_own_property_names", &self.get_own_property_names.is_some())
            .field(
                "get_own_property_descriptors",
                &self.get_own_property_descriptors.is_some(),
            )
            .finish()
    }
}

/// Collects what must be in place before the hook modules are built and
/// armed.
pub struct ContextBuilder {
    host: Rc<HostBinding>,
    realm: Realm,
}

impl ContextBuilder {
    /// Attach the transport client; hook modules consult its mode.
    pub fn transport(self, transport: Rc<dyn TransportClient>) -> Self {
        self.realm.attach(transport);
        self
    }

    /// Register a context listener, for example one for `wrap` events raised
    /// by arming on start.
    pub fn on<F>(self, kind: ContextEventKind, listener: F) -> Self
    where
        F: Fn(&mut ContextEvent) -> ListenerResult + 'static,
    {
        self.realm.events().on(kind, listener);
        self
    }

    pub fn build(self) -> Context {
        Context::from_realm(self.host, self.realm)
    }
}

pub struct Context {
    host: Rc<HostBinding>,
    realm: Realm,
    natives: NativeMethods,

    attribute: AttributeHook,
    document: DocumentHook,
    element: ElementHook,
    event_source: EventSourceHook,
    fetch: FetchHook,
    history: HistoryHook,
    idb: IdbHook,
    location: LocationHook,
    message: MessageHook,
    navigator: NavigatorHook,
    node: NodeHook,
    object_url: ObjectUrlHook,
    reflect: ReflectHook,
    storage: StorageHook,
    style: StyleHook,
    websocket: WebSocketHook,
    worker: WorkerHook,
    xhr: XhrHook,
}

impl Context {
    pub fn new(host: impl Into<Rc<HostBinding>>, config: ContextConfig) -> Self {
        Self::builder(host, config).build()
    }

    pub fn builder(host: impl Into<Rc<HostBinding>>, config: ContextConfig) -> ContextBuilder {
        ContextBuilder {
            host: host.into(),
            realm: Realm::new(config),
        }
    }

    fn from_realm(host: Rc<HostBinding>, realm: Realm) -> Self {
        let natives = NativeMethods::capture(&host);

        let context = Self {
            attribute: AttributeHook::new(&host, &realm),
            document: DocumentHook::new(&host, &realm),
            element: ElementHook::new(&host, &realm),
            event_source: EventSourceHook::new(&host, &realm),
            fetch: FetchHook::new(&host, &realm),
            history: HistoryHook::new(&host, &realm),
            idb: IdbHook::new(&host, &realm),
            location: LocationHook::new(&host, &realm),
            message: MessageHook::new(&host, &realm),
            navigator: NavigatorHook::new(&host, &realm),
            node: NodeHook::new(&host, &realm),
            object_url: ObjectUrlHook::new(&host, &realm),
            reflect: ReflectHook::new(&host, &realm),
            storage: StorageHook::new(&host, &realm),
            style: StyleHook::new(&host, &realm),
            websocket: WebSocketHook::new(&host, &realm),
            worker: WorkerHook::new(&host, &realm),
            xhr: XhrHook::new(&host, &realm),
            host,
            realm,
            natives,
        };

        if context.realm.config().arm_on_start {
            context.arm_all();
        }
        info!(mode = ?context.mode(), "context created");
        context
    }

    /// Attach the transport client. Calls made from now on use its mode;
    /// surfaces already armed against the configured mode stay armed.
    pub fn with_transport(self, transport: Rc<dyn TransportClient>) -> Self {
        if transport.mode() != self.realm.config().mode {
            debug!(
                context = ?self.realm.config().mode,
                transport = ?transport.mode(),
                "transport realm mode differs from context"
            );
        }
        self.realm.attach(transport);
        self
    }

    /// Context-level events (`wrap`).
    pub fn events(&self) -> &Emitter<ContextEvent> {
        self.realm.events()
    }

    pub fn on<F>(&self, kind: ContextEventKind, listener: F) -> ListenerId
    where
        F: Fn(&mut ContextEvent) -> ListenerResult + 'static,
    {
        self.realm.events().on(kind, listener)
    }

    pub fn off(&self, kind: ContextEventKind, id: ListenerId) -> bool {
        self.realm.events().off(kind, id)
    }

    /// Arm every hook module. Returns whether anything was installed.
    pub fn arm_all(&self) -> bool {
        let armed = [
            self.attribute.arm(),
            self.document.arm(),
            self.element.arm(),
            self.event_source.arm(),
            self.fetch.arm(),
            self.history.arm(),
            self.idb.arm(),
            self.location.arm(),
            self.message.arm(),
            self.navigator.arm(),
            self.node.arm(),
            self.object_url.arm(),
            self.reflect.arm(),
            self.storage.arm(),
            self.style.arm(),
            self.websocket.arm(),
            self.worker.arm(),
            self.xhr.arm(),
        ];
        let installed = armed.iter().filter(|armed| **armed).count();
        debug!(installed, modules = armed.len(), "arm_all");
        installed > 0
    }

    /// `Function.prototype.toString` as the realm shipped it.
    pub fn native_to_string(&self, function: &Receiver) -> Result<String> {
        let native = self
            .natives
            .to_string
            .as_ref()
            .ok_or(HookError::MissingSurface("Function.prototype.toString"))?;
        native(function, ())
    }

    /// `Object.getOwnPropertyNames` as the realm shipped it.
    pub fn native_own_property_names(&self, object: &Receiver) -> Result<Vec<String>> {
        let native = self
            .natives
            .get_own_property_names
            .as_ref()
            .ok_or(HookError::MissingSurface("Object.getOwnPropertyNames"))?;
        native(&self.host.global, object.clone())
    }

    /// `Object.getOwnPropertyDescriptors` as the realm shipped it.
    pub fn native_own_property_descriptors(&self, object: &Receiver) -> Result<Value> {
        let native = self
            .natives
            .get_own_property_descriptors
            .as_ref()
            .ok_or(HookError::MissingSurface("Object.getOwnPropertyDescriptors"))?;
        native(&self.host.global, object.clone())
    }

    pub fn host(&self) -> &Rc<HostBinding> {
        &self.host
    }

    pub fn config(&self) -> &ContextConfig {
        self.realm.config()
    }

    /// The transport's mode when one is attached, the configured mode
    /// otherwise.
    pub fn mode(&self) -> RealmMode {
        self.realm.mode()
    }

    pub fn natives(&self) -> &NativeMethods {
        &self.natives
    }

    pub fn transport(&self) -> Option<Rc<dyn TransportClient>> {
        self.realm.transport()
    }

    pub fn attribute(&self) -> &AttributeHook {
        &self.attribute
    }

    pub fn document(&self) -> &DocumentHook {
        &self.document
    }

    pub fn element(&self) -> &ElementHook {
        &self.element
    }

    pub fn event_source(&self) -> &EventSourceHook {
        &self.event_source
    }

    pub fn fetch(&self) -> &FetchHook {
        &self.fetch
    }

    pub fn history(&self) -> &HistoryHook {
        &self.history
    }

    pub fn idb(&self) -> &IdbHook {
        &self.idb
    }

    pub fn location(&self) -> &LocationHook {
        &self.location
    }

    pub fn message(&self) -> &MessageHook {
        &self.message
    }

    pub fn navigator(&self) -> &NavigatorHook {
        &self.navigator
    }

    pub fn node(&self) -> &NodeHook {
        &self.node
    }

    pub fn object_url(&self) -> &ObjectUrlHook {
        &self.object_url
    }

    pub fn reflect(&self) -> &ReflectHook {
        &self.reflect
    }

    pub fn storage(&self) -> &StorageHook {
        &self.storage
    }

    pub fn style(&self) -> &StyleHook {
        &self.style
    }

    pub fn websocket(&self) -> &WebSocketHook {
        &self.websocket
    }

    pub fn worker(&self) -> &WorkerHook {
        &self.worker
    }

    pub fn xhr(&self) -> &XhrHook {
        &self.xhr
    }
}
