//! Navigation: the worker location's field getters and the emulated window
//! location.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;
use veneer_events::{events, Emitter};

use super::{dispatch, variant, HookCore, HookModule};
use crate::emulation::{
    AddressRewrite, EmulatedLocation, Location, LocationField, LocationMap, LocationParts,
};
use crate::engine::{override_accessor, AccessorHooks, AccessorSlot};
use crate::error::{HookError, Result};
use crate::event::HookEvent;
use crate::host::HostBinding;
use crate::realm::Realm;

/// Data of a `read` event: the mapped value of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRead {
    pub field: LocationField,
    pub value: String,
}

/// Data of a `write` event. `href` is the full address the write produces,
/// before rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationWrite {
    pub field: LocationField,
    pub value: String,
    pub href: String,
}

/// Data of a `hashchange` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentChange {
    pub old_href: String,
    pub new_href: String,
}

/// `WorkerLocation`: read-only fields.
pub struct WorkerLocationSurface {
    pub href: AccessorSlot<String>,
    pub scheme: AccessorSlot<String>,
    pub protocol: AccessorSlot<String>,
    pub host: AccessorSlot<String>,
    pub hostname: AccessorSlot<String>,
    pub port: AccessorSlot<String>,
    pub path: AccessorSlot<String>,
    pub query: AccessorSlot<String>,
    pub fragment: AccessorSlot<String>,
    pub origin: AccessorSlot<String>,
}

impl WorkerLocationSurface {
    pub fn new() -> Self {
        Self {
            href: AccessorSlot::new("WorkerLocation.href"),
            scheme: AccessorSlot::new("WorkerLocation.scheme"),
            protocol: AccessorSlot::new("WorkerLocation.protocol"),
            host: AccessorSlot::new("WorkerLocation.host"),
            hostname: AccessorSlot::new("WorkerLocation.hostname"),
            port: AccessorSlot::new("WorkerLocation.port"),
            path: AccessorSlot::new("WorkerLocation.pathname"),
            query: AccessorSlot::new("WorkerLocation.search"),
            fragment: AccessorSlot::new("WorkerLocation.hash"),
            origin: AccessorSlot::new("WorkerLocation.origin"),
        }
    }

    pub fn field(&self, field: LocationField) -> &AccessorSlot<String> {
        match field {
            LocationField::Href => &self.href,
            LocationField::Scheme => &self.scheme,
            LocationField::Protocol => &self.protocol,
            LocationField::Host => &self.host,
            LocationField::Hostname => &self.hostname,
            LocationField::Port => &self.port,
            LocationField::Path => &self.path,
            LocationField::Query => &self.query,
            LocationField::Fragment => &self.fragment,
            LocationField::Origin => &self.origin,
        }
    }
}

impl Default for WorkerLocationSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum LocationEvent: LocationEventKind {
        Read(HookEvent<LocationRead, String>) => "read",
        Write(HookEvent<LocationWrite, ()>) => "write",
        HashChange(HookEvent<FragmentChange, ()>) => "hashchange",
    }
}

pub struct LocationHook {
    core: HookCore<WorkerLocationSurface, LocationEvent>,
    location: Option<Rc<dyn Location>>,
    emulated: RefCell<Option<Rc<EmulatedLocation>>>,
}

impl LocationHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("location", host.worker_location.clone(), realm),
            location: host.location.clone(),
            emulated: RefCell::new(None),
        }
    }

    /// Derive every worker location field from the real href through `map`.
    ///
    /// Worker realms only; in a window realm this returns `false`.
    pub fn arm_worker_location<F>(&self, map: F) -> bool
    where
        F: Fn(&str) -> Result<LocationParts> + 'static,
    {
        let mode = self.core.mode();
        self.core.arm("workerLocation", |surface, events| {
            if !mode.is_worker() {
                debug!("worker location skipped: window realm");
                return false;
            }
            let map: LocationMap = Rc::new(map);
            LocationField::ALL.iter().fold(false, |installed, &field| {
                let location = Rc::clone(surface);
                let events = Rc::clone(events);
                let map = Rc::clone(&map);
                let hooks = AccessorHooks::new().get(move |_original, that| {
                    let href = location.href.get_native(that)?;
                    let value = map(&href)?.field(field).to_string();
                    let event = HookEvent::on_receiver(LocationRead { field, value }, that.clone());
                    dispatch(&events, variant!(LocationEvent::Read), event)?
                        .finish(|data| Ok(data.value))
                });
                override_accessor(surface.field(field), hooks) | installed
            })
        })
    }

    /// The emulated window location over the realm's real one.
    ///
    /// Built on first use; later calls return the same object and ignore
    /// their arguments.
    pub fn emulate<M, W>(&self, map: M, rewrite: W) -> Result<Rc<EmulatedLocation>>
    where
        M: Fn(&str) -> Result<LocationParts> + 'static,
        W: Fn(&str) -> String + 'static,
    {
        if let Some(emulated) = self.emulated.borrow().as_ref() {
            return Ok(Rc::clone(emulated));
        }
        let backing = self
            .location
            .clone()
            .ok_or(HookError::MissingSurface("location"))?;
        let rewrite: AddressRewrite = Rc::new(rewrite);
        let emulated = Rc::new(EmulatedLocation::new(
            backing,
            Rc::new(map),
            rewrite,
            Rc::clone(self.core.events()),
        ));
        *self.emulated.borrow_mut() = Some(Rc::clone(&emulated));
        Ok(emulated)
    }

    pub fn emulated(&self) -> Option<Rc<EmulatedLocation>> {
        self.emulated.borrow().clone()
    }

    /// The realm's real location, when it has one.
    pub fn location(&self) -> Option<&Rc<dyn Location>> {
        self.location.as_ref()
    }

    pub fn surface(&self) -> Option<&Rc<WorkerLocationSurface>> {
        self.core.surface()
    }
}

impl HookModule for LocationHook {
    type Event = LocationEvent;

    fn name(&self) -> &'static str {
        "location"
    }

    fn emitter(&self) -> &Emitter<LocationEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_worker_location(LocationParts::parse)
    }
}
