//! Realm state shared by every hook module of one context: the settings, the
//! attached transport and the context-level event stream.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use veneer_events::{events, Emitter};

use crate::config::{ContextConfig, RealmMode};
use crate::engine::{SlotKind, Wrapped};

/// The external transport collaborator. Only its realm mode is consulted.
pub trait TransportClient {
    fn mode(&self) -> RealmMode;
}

/// Data of a `wrap` event: one wrapper a hook module installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotWrapped {
    pub module: &'static str,
    /// Arm key the install ran under (`"pushState"`, `"MessageEvent"`).
    pub surface: &'static str,
    pub slot: &'static str,
    pub kind: SlotKind,
}

impl SlotWrapped {
    pub(crate) fn new(module: &'static str, surface: &'static str, wrapped: Wrapped) -> Self {
        Self {
            module,
            surface,
            slot: wrapped.slot,
            kind: wrapped.kind,
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == SlotKind::Constructor
    }
}

events! {
    pub enum ContextEvent: ContextEventKind {
        Wrap(SlotWrapped) => "wrap",
    }
}

/// Cheaply clonable handle on the realm state. Every clone sees the same
/// transport and event stream.
#[derive(Clone)]
pub struct Realm {
    config: ContextConfig,
    transport: Rc<RefCell<Option<Rc<dyn TransportClient>>>>,
    events: Rc<Emitter<ContextEvent>>,
}

impl Realm {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            events: Rc::new(Emitter::with_max_listeners(config.max_listeners)),
            config,
            transport: Rc::new(RefCell::new(None)),
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The transport's mode when one is attached, the configured mode
    /// otherwise. Read at call time.
    pub fn mode(&self) -> RealmMode {
        match self.transport.borrow().as_ref() {
            Some(transport) => transport.mode(),
            None => self.config.mode,
        }
    }

    pub fn attach(&self, transport: Rc<dyn TransportClient>) {
        *self.transport.borrow_mut() = Some(transport);
    }

    pub fn transport(&self) -> Option<Rc<dyn TransportClient>> {
        self.transport.borrow().clone()
    }

    pub fn events(&self) -> &Rc<Emitter<ContextEvent>> {
        &self.events
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("config", &self.config)
            .field("mode", &self.mode())
            .field("transport", &self.transport.borrow().is_some())
            .finish()
    }
}
