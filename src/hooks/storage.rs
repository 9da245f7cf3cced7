//! Key-value stores.
//!
//! Every store method goes through one routine parameterised by the
//! operation, so a single family of events (`getItem`, `setItem`,
//! `removeItem`, `clear`, `key`) covers the whole surface. Calls whose
//! receiver is an emulated store are redirected to its backing store.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;
use veneer_events::{events, Emitter};

use super::{dispatch, variant, HookCore, HookModule, Variant};
use crate::emulation::{EmulatedStorage, Shadow, Storage, StorageArea};
use crate::engine::{override_accessor, override_method, AccessorHooks, AccessorSlot, MethodSlot};
use crate::error::{HookError, Result};
use crate::event::{read_target, HookEvent, Observed};
use crate::host::{HostBinding, Receiver};
use crate::realm::Realm;

/// The store operation an event stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOp {
    GetItem,
    SetItem,
    RemoveItem,
    Clear,
    Key,
    /// Named read on an emulated store.
    Get,
    /// Named write on an emulated store.
    Set,
    /// Named delete on an emulated store.
    Delete,
}

impl StorageOp {
    pub const METHODS: [StorageOp; 5] = [
        StorageOp::GetItem,
        StorageOp::SetItem,
        StorageOp::RemoveItem,
        StorageOp::Clear,
        StorageOp::Key,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StorageOp::GetItem => "getItem",
            StorageOp::SetItem => "setItem",
            StorageOp::RemoveItem => "removeItem",
            StorageOp::Clear => "clear",
            StorageOp::Key => "key",
            StorageOp::Get => "get",
            StorageOp::Set => "set",
            StorageOp::Delete => "delete",
        }
    }
}

/// Arguments of any store operation. Which fields are set depends on the
/// operation: `key` uses `index`, `setItem`/`set` use `name` and `value`,
/// `clear` uses none.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageRequest {
    pub name: Option<String>,
    pub index: Option<u32>,
    pub value: Option<String>,
}

impl StorageRequest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn write(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
            index: None,
        }
    }

    pub fn index(index: u32) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The key, or the empty string when none was given.
    pub fn key_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

pub struct StorageSurface {
    pub get_item: MethodSlot<StorageRequest, Option<String>>,
    pub set_item: MethodSlot<StorageRequest, Option<String>>,
    pub remove_item: MethodSlot<StorageRequest, Option<String>>,
    pub clear: MethodSlot<StorageRequest, Option<String>>,
    pub key: MethodSlot<StorageRequest, Option<String>>,
    pub length: AccessorSlot<u32>,
    /// `localStorage`, when the realm has one.
    pub local: Option<Receiver>,
    /// `sessionStorage`, when the realm has one.
    pub session: Option<Receiver>,
}

impl StorageSurface {
    pub fn new() -> Self {
        Self {
            get_item: MethodSlot::new("Storage.getItem"),
            set_item: MethodSlot::new("Storage.setItem"),
            remove_item: MethodSlot::new("Storage.removeItem"),
            clear: MethodSlot::new("Storage.clear"),
            key: MethodSlot::new("Storage.key"),
            length: AccessorSlot::new("Storage.length"),
            local: None,
            session: None,
        }
    }

    pub fn method(&self, op: StorageOp) -> Option<&MethodSlot<StorageRequest, Option<String>>> {
        match op {
            StorageOp::GetItem => Some(&self.get_item),
            StorageOp::SetItem => Some(&self.set_item),
            StorageOp::RemoveItem => Some(&self.remove_item),
            StorageOp::Clear => Some(&self.clear),
            StorageOp::Key => Some(&self.key),
            StorageOp::Get | StorageOp::Set | StorageOp::Delete => None,
        }
    }
}

impl Default for StorageSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum StorageEvent: StorageEventKind {
        GetItem(HookEvent<StorageRequest, Option<String>>) => "getItem",
        SetItem(HookEvent<StorageRequest, Option<String>>) => "setItem",
        RemoveItem(HookEvent<StorageRequest, Option<String>>) => "removeItem",
        Clear(HookEvent<StorageRequest, Option<String>>) => "clear",
        Key(HookEvent<StorageRequest, Option<String>>) => "key",
        Length(HookEvent<Observed<u32>, u32>) => "length",
        Get(HookEvent<StorageRequest, Option<String>>) => "get",
        Set(HookEvent<StorageRequest, Option<String>>) => "set",
        Delete(HookEvent<StorageRequest, Option<String>>) => "delete",
    }
}

pub(crate) type StoreVariant = Variant<StorageEvent, HookEvent<StorageRequest, Option<String>>>;

pub(crate) fn store_variant(op: StorageOp) -> StoreVariant {
    match op {
        StorageOp::GetItem => variant!(StorageEvent::GetItem),
        StorageOp::SetItem => variant!(StorageEvent::SetItem),
        StorageOp::RemoveItem => variant!(StorageEvent::RemoveItem),
        StorageOp::Clear => variant!(StorageEvent::Clear),
        StorageOp::Key => variant!(StorageEvent::Key),
        StorageOp::Get => variant!(StorageEvent::Get),
        StorageOp::Set => variant!(StorageEvent::Set),
        StorageOp::Delete => variant!(StorageEvent::Delete),
    }
}

/// The emulated store of each backing store, one per backing receiver.
#[derive(Default)]
pub(crate) struct StoreRoutes {
    routes: RefCell<Vec<Rc<EmulatedStorage>>>,
}

impl StoreRoutes {
    fn by_backing(&self, backing: &Receiver) -> Option<Rc<EmulatedStorage>> {
        self.routes
            .borrow()
            .iter()
            .find(|emulated| emulated.backing().receiver().same(backing))
            .cloned()
    }

    fn insert(&self, emulated: Rc<EmulatedStorage>) {
        self.routes.borrow_mut().push(emulated);
    }

    fn len(&self) -> usize {
        self.routes.borrow().len()
    }

    /// The backing receiver when `that` is an emulated store.
    fn resolve(&self, that: &Receiver) -> Receiver {
        self.routes
            .borrow()
            .iter()
            .find(|emulated| emulated.receiver().same(that))
            .map_or_else(|| that.clone(), |emulated| emulated.backing().receiver().clone())
    }
}

fn intercept_store(
    slot: &MethodSlot<StorageRequest, Option<String>>,
    events: &Rc<Emitter<StorageEvent>>,
    routes: &Rc<StoreRoutes>,
    op: StorageOp,
) -> bool {
    let events = Rc::clone(events);
    let routes = Rc::clone(routes);
    let variant = store_variant(op);
    override_method(slot, move |original, that, request| {
        let store = routes.resolve(that);
        let event = HookEvent::targeted(request, store.clone(), Rc::clone(original));
        let event = dispatch(&events, variant, event)?;
        event.finish(|data| original(&store, data))
    })
}

pub struct StorageHook {
    core: HookCore<StorageSurface, StorageEvent>,
    routes: Rc<StoreRoutes>,
}

impl StorageHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("storage", host.storage.clone(), realm),
            routes: Rc::new(StoreRoutes::default()),
        }
    }

    /// `getItem`, `setItem`, `removeItem`, `clear` and `key`.
    pub fn arm_methods(&self) -> bool {
        let routes = Rc::clone(&self.routes);
        self.core.arm("methods", |surface, events| {
            StorageOp::METHODS
                .iter()
                .filter_map(|&op| surface.method(op).map(|slot| (op, slot)))
                .fold(false, |installed, (op, slot)| {
                    intercept_store(slot, events, &routes, op) | installed
                })
        })
    }

    pub fn arm_length(&self) -> bool {
        let routes = Rc::clone(&self.routes);
        self.core.arm("length", |surface, events| {
            let events = Rc::clone(events);
            override_accessor(
                &surface.length,
                AccessorHooks::new().get(move |original, that| {
                    let store = routes.resolve(that);
                    let data = Observed::new(original(&store)?);
                    let event = HookEvent::targeted(data, store, read_target(original));
                    let event = dispatch(&events, variant!(StorageEvent::Length), event)?;
                    event.finish(|data| Ok(data.value))
                }),
            )
        })
    }

    /// Substitute store over `backing`. Named accesses to shadowed keys are
    /// offered as `get`/`set`/`delete` events; everything else passes through.
    ///
    /// One emulated store exists per backing store: emulating the same
    /// backing again returns the first one and ignores `shadow`.
    pub fn emulate(&self, backing: Receiver, shadow: Shadow) -> Result<Rc<EmulatedStorage>> {
        let surface = self
            .core
            .surface()
            .ok_or(HookError::MissingSurface("Storage"))?;
        if let Some(emulated) = self.routes.by_backing(&backing) {
            if emulated.shadow() != &shadow {
                debug!(store = ?backing, "store already emulated; shadow set unchanged");
            }
            return Ok(emulated);
        }
        let area = StorageArea::new(Rc::clone(surface), backing);
        let emulated = Rc::new(EmulatedStorage::new(
            area,
            shadow,
            Rc::clone(self.core.events()),
        ));
        self.routes.insert(Rc::clone(&emulated));
        Ok(emulated)
    }

    /// Number of backing stores that have an emulated store.
    pub fn emulated_count(&self) -> usize {
        self.routes.len()
    }

    pub fn local_storage(&self) -> Option<StorageArea> {
        let surface = self.core.surface()?;
        let receiver = surface.local.clone()?;
        Some(StorageArea::new(Rc::clone(surface), receiver))
    }

    pub fn session_storage(&self) -> Option<StorageArea> {
        let surface = self.core.surface()?;
        let receiver = surface.session.clone()?;
        Some(StorageArea::new(Rc::clone(surface), receiver))
    }

    pub fn surface(&self) -> Option<&Rc<StorageSurface>> {
        self.core.surface()
    }
}

impl HookModule for StorageHook {
    type Event = StorageEvent;

    fn name(&self) -> &'static str {
        "storage"
    }

    fn emitter(&self) -> &Emitter<StorageEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_methods() | self.arm_length()
    }
}
