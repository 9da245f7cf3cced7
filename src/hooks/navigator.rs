use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{intercept_method, variant, HookCore, HookModule};
use crate::engine::MethodSlot;
use crate::event::HookEvent;
use crate::host::{HostBinding, HostValue};
use crate::realm::Realm;

/// Arguments of `navigator.sendBeacon(url, data)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Beacon {
    pub url: String,
    pub data: HostValue,
}

pub struct NavigatorSurface {
    pub send_beacon: MethodSlot<Beacon, bool>,
}

impl NavigatorSurface {
    pub fn new() -> Self {
        Self {
            send_beacon: MethodSlot::new("Navigator.sendBeacon"),
        }
    }
}

impl Default for NavigatorSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum NavigatorEvent: NavigatorEventKind {
        SendBeacon(HookEvent<Beacon, bool>) => "sendBeacon",
    }
}

pub struct NavigatorHook {
    core: HookCore<NavigatorSurface, NavigatorEvent>,
}

impl NavigatorHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("navigator", host.navigator.clone(), realm),
        }
    }

    pub fn arm_send_beacon(&self) -> bool {
        self.core.arm("sendBeacon", |surface, events| {
            intercept_method(
                &surface.send_beacon,
                events,
                variant!(NavigatorEvent::SendBeacon),
            )
        })
    }

    pub fn surface(&self) -> Option<&Rc<NavigatorSurface>> {
        self.core.surface()
    }
}

impl HookModule for NavigatorHook {
    type Event = NavigatorEvent;

    fn name(&self) -> &'static str {
        "navigator"
    }

    fn emitter(&self) -> &Emitter<NavigatorEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_send_beacon()
    }
}
