//! WebSockets.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{intercept_getter, intercept_method, variant, HookCore, HookModule};
use crate::engine::{AccessorSlot, MethodSlot};
use crate::event::{HookEvent, Observed};
use crate::host::{HostBinding, HostValue, Receiver};
use crate::realm::Realm;

/// Arguments of `new WebSocket(url, protocols)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SocketOpen {
    pub url: String,
    pub protocols: Vec<String>,
}

/// Argument of `send`.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketFrame {
    pub data: HostValue,
}

pub struct WebSocketSurface {
    pub construct: MethodSlot<SocketOpen, Receiver>,
    pub url: AccessorSlot<String>,
    pub protocol: AccessorSlot<String>,
    pub ready_state: AccessorSlot<u16>,
    pub send: MethodSlot<SocketFrame, ()>,
}

impl WebSocketSurface {
    pub const CONNECTING: u16 = 0;
    pub const OPEN: u16 = 1;
    pub const CLOSING: u16 = 2;
    pub const CLOSED: u16 = 3;

    pub fn new() -> Self {
        Self {
            construct: MethodSlot::new("WebSocket"),
            url: AccessorSlot::new("WebSocket.url"),
            protocol: AccessorSlot::new("WebSocket.protocol"),
            ready_state: AccessorSlot::new("WebSocket.readyState"),
            send: MethodSlot::new("WebSocket.send"),
        }
    }
}

impl Default for WebSocketSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum WebSocketEvent: WebSocketEventKind {
        WebSocket(HookEvent<SocketOpen, Receiver>) => "websocket",
        Url(HookEvent<Observed<String>, String>) => "url",
        Protocol(HookEvent<Observed<String>, String>) => "protocol",
        ReadyState(HookEvent<Observed<u16>, u16>) => "readyState",
        Send(HookEvent<SocketFrame, ()>) => "send",
    }
}

pub struct WebSocketHook {
    core: HookCore<WebSocketSurface, WebSocketEvent>,
}

impl WebSocketHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("websocket", host.websocket.clone(), realm),
        }
    }

    pub fn arm_construct(&self) -> bool {
        self.core.arm("WebSocket", |surface, events| {
            intercept_method(
                &surface.construct,
                events,
                variant!(WebSocketEvent::WebSocket),
            )
        })
    }

    /// `url`, `protocol` and `readyState`.
    pub fn arm_state(&self) -> bool {
        self.core.arm("state", |surface, events| {
            let url = intercept_getter(&surface.url, events, variant!(WebSocketEvent::Url));
            let protocol =
                intercept_getter(&surface.protocol, events, variant!(WebSocketEvent::Protocol));
            let ready_state = intercept_getter(
                &surface.ready_state,
                events,
                variant!(WebSocketEvent::ReadyState),
            );
            url | protocol | ready_state
        })
    }

    pub fn arm_send(&self) -> bool {
        self.core.arm("send", |surface, events| {
            intercept_method(&surface.send, events, variant!(WebSocketEvent::Send))
        })
    }

    pub fn surface(&self) -> Option<&Rc<WebSocketSurface>> {
        self.core.surface()
    }
}

impl HookModule for WebSocketHook {
    type Event = WebSocketEvent;

    fn name(&self) -> &'static str {
        "websocket"
    }

    fn emitter(&self) -> &Emitter<WebSocketEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_construct() | self.arm_state() | self.arm_send()
    }
}
