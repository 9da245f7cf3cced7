//! Server-sent event streams.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{intercept_getter, intercept_method, variant, HookCore, HookModule};
use crate::engine::{AccessorSlot, MethodSlot};
use crate::event::{HookEvent, Observed};
use crate::host::{HostBinding, HostValue, Receiver};
use crate::realm::Realm;

/// Arguments of `new EventSource(url, config)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSourceInit {
    pub url: String,
    pub config: HostValue,
}

pub struct EventSourceSurface {
    pub construct: MethodSlot<EventSourceInit, Receiver>,
    pub url: AccessorSlot<String>,
}

impl EventSourceSurface {
    pub const CONNECTING: u16 = 0;
    pub const OPEN: u16 = 1;
    pub const CLOSED: u16 = 2;

    pub fn new() -> Self {
        Self {
            construct: MethodSlot::new("EventSource"),
            url: AccessorSlot::new("EventSource.url"),
        }
    }
}

impl Default for EventSourceSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum EventSourceEvent: EventSourceEventKind {
        Construct(HookEvent<EventSourceInit, Receiver>) => "construct",
        Url(HookEvent<Observed<String>, String>) => "url",
    }
}

pub struct EventSourceHook {
    core: HookCore<EventSourceSurface, EventSourceEvent>,
}

impl EventSourceHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("eventsource", host.event_source.clone(), realm),
        }
    }

    pub fn arm_construct(&self) -> bool {
        self.core.arm("EventSource", |surface, events| {
            intercept_method(
                &surface.construct,
                events,
                variant!(EventSourceEvent::Construct),
            )
        })
    }

    pub fn arm_url(&self) -> bool {
        self.core.arm("url", |surface, events| {
            intercept_getter(&surface.url, events, variant!(EventSourceEvent::Url))
        })
    }

    pub fn surface(&self) -> Option<&Rc<EventSourceSurface>> {
        self.core.surface()
    }
}

impl HookModule for EventSourceHook {
    type Event = EventSourceEvent;

    fn name(&self) -> &'static str {
        "eventsource"
    }

    fn emitter(&self) -> &Emitter<EventSourceEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_construct() | self.arm_url()
    }
}
