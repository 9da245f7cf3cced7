//! Session history: entry push/replace and relative navigation.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{intercept_method, variant, HookCore, HookModule};
use crate::engine::MethodSlot;
use crate::event::HookEvent;
use crate::host::{HostBinding, HostValue};
use crate::realm::Realm;

/// Arguments of `pushState` / `replaceState`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub state: HostValue,
    pub title: String,
    pub url: Option<String>,
}

impl HistoryEntry {
    pub fn new(state: HostValue, title: impl Into<String>, url: Option<&str>) -> Self {
        Self {
            state,
            title: title.into(),
            url: url.map(str::to_string),
        }
    }
}

/// Argument of `go`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryDelta {
    pub delta: i32,
}

pub struct HistorySurface {
    pub push_state: MethodSlot<HistoryEntry, ()>,
    pub replace_state: MethodSlot<HistoryEntry, ()>,
    pub go: MethodSlot<HistoryDelta, ()>,
    pub forward: MethodSlot<(), ()>,
    pub back: MethodSlot<(), ()>,
}

impl HistorySurface {
    pub fn new() -> Self {
        Self {
            push_state: MethodSlot::new("History.pushState"),
            replace_state: MethodSlot::new("History.replaceState"),
            go: MethodSlot::new("History.go"),
            forward: MethodSlot::new("History.forward"),
            back: MethodSlot::new("History.back"),
        }
    }
}

impl Default for HistorySurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum HistoryEvent: HistoryEventKind {
        PushState(HookEvent<HistoryEntry, ()>) => "pushState",
        ReplaceState(HookEvent<HistoryEntry, ()>) => "replaceState",
        Go(HookEvent<HistoryDelta, ()>) => "go",
        Forward(HookEvent<(), ()>) => "forward",
        Back(HookEvent<(), ()>) => "back",
    }
}

pub struct HistoryHook {
    core: HookCore<HistorySurface, HistoryEvent>,
}

impl HistoryHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("history", host.history.clone(), realm),
        }
    }

    pub fn arm_push_state(&self) -> bool {
        self.core.arm("pushState", |surface, events| {
            intercept_method(&surface.push_state, events, variant!(HistoryEvent::PushState))
        })
    }

    pub fn arm_replace_state(&self) -> bool {
        self.core.arm("replaceState", |surface, events| {
            intercept_method(
                &surface.replace_state,
                events,
                variant!(HistoryEvent::ReplaceState),
            )
        })
    }

    pub fn arm_go(&self) -> bool {
        self.core.arm("go", |surface, events| {
            intercept_method(&surface.go, events, variant!(HistoryEvent::Go))
        })
    }

    pub fn arm_forward(&self) -> bool {
        self.core.arm("forward", |surface, events| {
            intercept_method(&surface.forward, events, variant!(HistoryEvent::Forward))
        })
    }

    pub fn arm_back(&self) -> bool {
        self.core.arm("back", |surface, events| {
            intercept_method(&surface.back, events, variant!(HistoryEvent::Back))
        })
    }

    pub fn is_armed(&self, surface: &str) -> bool {
        self.core.is_armed(surface)
    }

    pub fn surface(&self) -> Option<&Rc<HistorySurface>> {
        self.core.surface()
    }
}

impl HookModule for HistoryHook {
    type Event = HistoryEvent;

    fn name(&self) -> &'static str {
        "history"
    }

    fn emitter(&self) -> &Emitter<HistoryEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_push_state()
            | self.arm_replace_state()
            | self.arm_go()
            | self.arm_forward()
            | self.arm_back()
    }
}
