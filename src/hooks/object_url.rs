use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{intercept_method, variant, HookCore, HookModule};
use crate::engine::MethodSlot;
use crate::event::HookEvent;
use crate::host::{HostBinding, Receiver};
use crate::realm::Realm;

/// Argument of `URL.createObjectURL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSource {
    pub object: Receiver,
}

/// Argument of `URL.revokeObjectURL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokedUrl {
    pub url: String,
}

pub struct ObjectUrlSurface {
    pub create_object_url: MethodSlot<UrlSource, String>,
    pub revoke_object_url: MethodSlot<RevokedUrl, ()>,
}

impl ObjectUrlSurface {
    pub fn new() -> Self {
        Self {
            create_object_url: MethodSlot::new("URL.createObjectURL"),
            revoke_object_url: MethodSlot::new("URL.revokeObjectURL"),
        }
    }
}

impl Default for ObjectUrlSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum ObjectUrlEvent: ObjectUrlEventKind {
        CreateObjectUrl(HookEvent<UrlSource, String>) => "createObjectURL",
        RevokeObjectUrl(HookEvent<RevokedUrl, ()>) => "revokeObjectURL",
    }
}

pub struct ObjectUrlHook {
    core: HookCore<ObjectUrlSurface, ObjectUrlEvent>,
}

impl ObjectUrlHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("objectURL", host.object_url.clone(), realm),
        }
    }

    pub fn arm_object_url(&self) -> bool {
        self.core.arm("objectURL", |surface, events| {
            let create = intercept_method(
                &surface.create_object_url,
                events,
                variant!(ObjectUrlEvent::CreateObjectUrl),
            );
            let revoke = intercept_method(
                &surface.revoke_object_url,
                events,
                variant!(ObjectUrlEvent::RevokeObjectUrl),
            );
            create | revoke
        })
    }

    pub fn surface(&self) -> Option<&Rc<ObjectUrlSurface>> {
        self.core.surface()
    }
}

impl HookModule for ObjectUrlHook {
    type Event = ObjectUrlEvent;

    fn name(&self) -> &'static str {
        "objectURL"
    }

    fn emitter(&self) -> &Emitter<ObjectUrlEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_object_url()
    }
}
