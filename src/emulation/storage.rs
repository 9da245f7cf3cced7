//! Storage emulation.
//!
//! [`StorageArea`] is a typed view of one host store. [`EmulatedStorage`]
//! stands in for a store: its methods run through the hooked entries (with
//! the emulated receiver redirected to the backing store), while named
//! property access to shadowed keys is offered to listeners first.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::trace;
use veneer_events::Emitter;

use crate::error::Result;
use crate::event::HookEvent;
use crate::hooks::{
    dispatch, store_variant, StorageEvent, StorageOp, StorageRequest, StorageSurface,
};
use crate::host::Receiver;

/// The key-value store interface: methods plus named property access.
pub trait Storage {
    fn receiver(&self) -> &Receiver;

    fn get_item(&self, name: &str) -> Result<Option<String>>;
    fn set_item(&self, name: &str, value: &str) -> Result<()>;
    fn remove_item(&self, name: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
    fn key(&self, index: u32) -> Result<Option<String>>;
    fn length(&self) -> Result<u32>;

    /// `store[name]`
    fn get(&self, name: &str) -> Result<Option<String>>;
    /// `store[name] = value`
    fn set(&self, name: &str, value: &str) -> Result<()>;
    /// `delete store[name]`
    fn delete(&self, name: &str) -> Result<()>;
}

/// One host store seen through its surface.
///
/// Methods go through the live slot entries, so armed hooks apply. Named
/// access is plain data access and reaches the native entries directly.
#[derive(Clone)]
pub struct StorageArea {
    surface: Rc<StorageSurface>,
    receiver: Receiver,
}

impl StorageArea {
    pub fn new(surface: Rc<StorageSurface>, receiver: Receiver) -> Self {
        Self { surface, receiver }
    }
}

impl Storage for StorageArea {
    fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    fn get_item(&self, name: &str) -> Result<Option<String>> {
        self.surface
            .get_item
            .call(&self.receiver, StorageRequest::named(name))
    }

    fn set_item(&self, name: &str, value: &str) -> Result<()> {
        self.surface
            .set_item
            .call(&self.receiver, StorageRequest::write(name, value))
            .map(drop)
    }

    fn remove_item(&self, name: &str) -> Result<()> {
        self.surface
            .remove_item
            .call(&self.receiver, StorageRequest::named(name))
            .map(drop)
    }

    fn clear(&self) -> Result<()> {
        self.surface
            .clear
            .call(&self.receiver, StorageRequest::empty())
            .map(drop)
    }

    fn key(&self, index: u32) -> Result<Option<String>> {
        self.surface
            .key
            .call(&self.receiver, StorageRequest::index(index))
    }

    fn length(&self) -> Result<u32> {
        self.surface.length.get(&self.receiver)
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        self.surface
            .get_item
            .call_native(&self.receiver, StorageRequest::named(name))
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.surface
            .set_item
            .call_native(&self.receiver, StorageRequest::write(name, value))
            .map(drop)
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.surface
            .remove_item
            .call_native(&self.receiver, StorageRequest::named(name))
            .map(drop)
    }
}

/// Which keys an emulated store offers to listeners on named access.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Shadow {
    #[default]
    All,
    Keys(HashSet<String>),
}

impl Shadow {
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Shadow::Keys(keys.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            Shadow::All => true,
            Shadow::Keys(keys) => keys.contains(name),
        }
    }
}

/// Marker payload of an emulated store's receiver.
struct EmulatedStore;

/// A substitute store over a backing [`StorageArea`].
///
/// Its receiver carries the `Storage` brand, so host code cannot tell it from
/// a real store by type.
pub struct EmulatedStorage {
    backing: StorageArea,
    receiver: Receiver,
    shadow: Shadow,
    events: Rc<Emitter<StorageEvent>>,
}

impl EmulatedStorage {
    pub(crate) fn new(
        backing: StorageArea,
        shadow: Shadow,
        events: Rc<Emitter<StorageEvent>>,
    ) -> Self {
        Self {
            backing,
            receiver: Receiver::new("Storage", EmulatedStore),
            shadow,
            events,
        }
    }

    pub fn backing(&self) -> &StorageArea {
        &self.backing
    }

    pub fn shadow(&self) -> &Shadow {
        &self.shadow
    }

    fn through(
        &self,
        op: StorageOp,
        request: StorageRequest,
    ) -> Result<HookEvent<StorageRequest, Option<String>>> {
        trace!(op = op.name(), key = request.key_name(), "named access on emulated store");
        let event = HookEvent::on_receiver(request, self.receiver.clone());
        dispatch(&self.events, store_variant(op), event)
    }
}

impl Storage for EmulatedStorage {
    fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    fn get_item(&self, name: &str) -> Result<Option<String>> {
        self.backing.get_item(name)
    }

    fn set_item(&self, name: &str, value: &str) -> Result<()> {
        self.backing.set_item(name, value)
    }

    fn remove_item(&self, name: &str) -> Result<()> {
        self.backing.remove_item(name)
    }

    fn clear(&self) -> Result<()> {
        self.backing.clear()
    }

    fn key(&self, index: u32) -> Result<Option<String>> {
        self.backing.key(index)
    }

    fn length(&self) -> Result<u32> {
        self.backing.length()
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        if !self.shadow.contains(name) {
            return self.backing.get(name);
        }
        self.through(StorageOp::Get, StorageRequest::named(name))?
            .finish(|data| self.backing.get(data.key_name()))
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        if !self.shadow.contains(name) {
            return self.backing.set(name, value);
        }
        self.through(StorageOp::Set, StorageRequest::write(name, value))?
            .finish(|data| {
                let value = data.value.as_deref().unwrap_or("");
                self.backing.set(data.key_name(), value).map(|()| None)
            })
            .map(drop)
    }

    fn delete(&self, name: &str) -> Result<()> {
        if !self.shadow.contains(name) {
            return self.backing.delete(name);
        }
        self.through(StorageOp::Delete, StorageRequest::named(name))?
            .finish(|data| self.backing.delete(data.key_name()).map(|()| None))
            .map(drop)
    }
}
