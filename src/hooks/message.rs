//! Cross-context messaging: `postMessage` on the global object and on
//! message ports, plus the `origin` and `data` of received messages.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{dispatch, intercept_getter, variant, HookCore, HookModule};
use crate::config::RealmMode;
use crate::engine::{override_method, AccessorSlot, MethodSlot};
use crate::event::{HookEvent, Observed};
use crate::host::{HostBinding, HostValue, Receiver};
use crate::realm::Realm;

/// Arguments of a `postMessage` call.
///
/// A page posts `(message, origin, transfer)`; a worker or a message port
/// posts `(message, transfer)` and `origin` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
    pub message: HostValue,
    pub origin: Option<String>,
    pub transfer: Vec<Receiver>,
    /// Whether the call used the worker signature.
    pub worker: bool,
}

impl PostedMessage {
    /// Page signature.
    pub fn to_origin(message: HostValue, origin: impl Into<String>) -> Self {
        Self {
            message,
            origin: Some(origin.into()),
            transfer: Vec::new(),
            worker: false,
        }
    }

    /// Worker and port signature.
    pub fn untargeted(message: HostValue) -> Self {
        Self {
            message,
            origin: None,
            transfer: Vec::new(),
            worker: true,
        }
    }

    pub fn with_transfer(mut self, transfer: Vec<Receiver>) -> Self {
        self.transfer = transfer;
        self
    }

    /// Normalise to the signature `worker` selects.
    fn signature(mut self, worker: bool) -> Self {
        self.worker = worker;
        if worker {
            self.origin = None;
        }
        self
    }
}

pub struct MessageSurface {
    /// `postMessage` on the global object.
    pub post_message: MethodSlot<PostedMessage, ()>,
    pub port_post_message: MethodSlot<PostedMessage, ()>,
    pub origin: AccessorSlot<String>,
    pub data: AccessorSlot<HostValue>,
}

impl MessageSurface {
    pub fn new() -> Self {
        Self {
            post_message: MethodSlot::new("postMessage"),
            port_post_message: MethodSlot::new("MessagePort.postMessage"),
            origin: AccessorSlot::new("MessageEvent.origin"),
            data: AccessorSlot::new("MessageEvent.data"),
        }
    }
}

impl Default for MessageSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum MessageEvent: MessageEventKind {
        PostMessage(HookEvent<PostedMessage, ()>) => "postMessage",
        Origin(HookEvent<Observed<String>, String>) => "origin",
        Data(HookEvent<Observed<HostValue>, HostValue>) => "data",
    }
}

pub struct MessageHook {
    core: HookCore<MessageSurface, MessageEvent>,
}

/// Which `postMessage` signature a slot uses.
enum Signature {
    /// Whatever the realm mode is when the call happens.
    Realm(Realm),
    /// Always `(message, transfer)`.
    Worker,
}

impl Signature {
    fn worker(&self) -> bool {
        match self {
            Signature::Realm(realm) => realm.mode().is_worker(),
            Signature::Worker => true,
        }
    }
}

/// Route one `postMessage` slot through the `postMessage` event, fixing the
/// call signature on both sides of the emission.
fn intercept_post(
    slot: &MethodSlot<PostedMessage, ()>,
    events: &Rc<Emitter<MessageEvent>>,
    signature: Signature,
) -> bool {
    let events = Rc::clone(events);
    override_method(slot, move |original, that, message| {
        let worker = signature.worker();
        let message = message.signature(worker);
        let event = HookEvent::targeted(message, that.clone(), Rc::clone(original));
        let event = dispatch(&events, variant!(MessageEvent::PostMessage), event)?;
        event.finish(|data| original(that, data.signature(worker)))
    })
}

impl MessageHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("message", host.message.clone(), realm),
        }
    }

    pub fn mode(&self) -> RealmMode {
        self.core.mode()
    }

    /// `postMessage` on the global object. Each call uses the signature of
    /// the realm mode at that moment, as reported by the transport when one
    /// is attached.
    pub fn arm_post_message(&self) -> bool {
        let realm = self.core.realm().clone();
        self.core.arm("postMessage", |surface, events| {
            intercept_post(&surface.post_message, events, Signature::Realm(realm))
        })
    }

    /// `MessagePort.postMessage`, which always uses the worker signature.
    pub fn arm_port_post_message(&self) -> bool {
        self.core.arm("MessagePort.postMessage", |surface, events| {
            intercept_post(&surface.port_post_message, events, Signature::Worker)
        })
    }

    /// `origin` and `data` of received messages.
    pub fn arm_message_event(&self) -> bool {
        self.core.arm("MessageEvent", |surface, events| {
            let origin = intercept_getter(&surface.origin, events, variant!(MessageEvent::Origin));
            let data = intercept_getter(&surface.data, events, variant!(MessageEvent::Data));
            origin | data
        })
    }

    pub fn surface(&self) -> Option<&Rc<MessageSurface>> {
        self.core.surface()
    }
}

impl HookModule for MessageHook {
    type Event = MessageEvent;

    fn name(&self) -> &'static str {
        "message"
    }

    fn emitter(&self) -> &Emitter<MessageEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_post_message() | self.arm_port_post_message() | self.arm_message_event()
    }
}
