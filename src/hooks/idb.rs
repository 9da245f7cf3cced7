//! Indexed storage: opening databases and reading their names.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{intercept_getter, intercept_method, variant, HookCore, HookModule};
use crate::engine::{AccessorSlot, MethodSlot};
use crate::event::{HookEvent, Observed};
use crate::host::{HostBinding, Receiver};
use crate::realm::Realm;

/// Arguments of `IDBFactory.open(name, version)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdbOpen {
    pub name: String,
    pub version: Option<u64>,
}

pub struct IdbSurface {
    pub open: MethodSlot<IdbOpen, Receiver>,
    pub name: AccessorSlot<String>,
}

impl IdbSurface {
    pub fn new() -> Self {
        Self {
            open: MethodSlot::new("IDBFactory.open"),
            name: AccessorSlot::new("IDBDatabase.name"),
        }
    }
}

impl Default for IdbSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum IdbEvent: IdbEventKind {
        IdbFactoryOpen(HookEvent<IdbOpen, Receiver>) => "idbFactoryOpen",
        IdbFactoryName(HookEvent<Observed<String>, String>) => "idbFactoryName",
    }
}

pub struct IdbHook {
    core: HookCore<IdbSurface, IdbEvent>,
}

impl IdbHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("idb", host.idb.clone(), realm),
        }
    }

    pub fn arm_open(&self) -> bool {
        self.core.arm("open", |surface, events| {
            intercept_method(&surface.open, events, variant!(IdbEvent::IdbFactoryOpen))
        })
    }

    pub fn arm_name(&self) -> bool {
        self.core.arm("name", |surface, events| {
            intercept_getter(&surface.name, events, variant!(IdbEvent::IdbFactoryName))
        })
    }

    pub fn surface(&self) -> Option<&Rc<IdbSurface>> {
        self.core.surface()
    }
}

impl HookModule for IdbHook {
    type Event = IdbEvent;

    fn name(&self) -> &'static str {
        "idb"
    }

    fn emitter(&self) -> &Emitter<IdbEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_open() | self.arm_name()
    }
}
