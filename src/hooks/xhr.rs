//! `XMLHttpRequest`.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::fetch::observe_lookup;
use super::{
    dispatch, intercept_getter, intercept_method, variant, HeaderName, HeaderRead, HookCore,
    HookModule,
};
use crate::engine::{override_method, AccessorSlot, MethodSlot, NativeFn};
use crate::event::{HookEvent, Observed};
use crate::host::{HostBinding, HostValue, Receiver};
use crate::realm::Realm;

/// Arguments of `open(method, url, async, user, password)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XhrOpen {
    pub method: String,
    pub url: String,
    pub is_async: bool,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl XhrOpen {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            is_async: true,
            user: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XhrBody {
    pub body: Option<HostValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XhrHeader {
    pub name: String,
    pub value: String,
}

pub struct XhrSurface {
    pub open: MethodSlot<XhrOpen, ()>,
    pub send: MethodSlot<XhrBody, ()>,
    pub set_request_header: MethodSlot<XhrHeader, ()>,
    pub response_url: AccessorSlot<String>,
    pub get_all_response_headers: MethodSlot<(), String>,
    pub get_response_header: MethodSlot<HeaderName, Option<String>>,
}

impl XhrSurface {
    pub fn new() -> Self {
        Self {
            open: MethodSlot::new("XMLHttpRequest.open"),
            send: MethodSlot::new("XMLHttpRequest.send"),
            set_request_header: MethodSlot::new("XMLHttpRequest.setRequestHeader"),
            response_url: AccessorSlot::new("XMLHttpRequest.responseURL"),
            get_all_response_headers: MethodSlot::new("XMLHttpRequest.getAllResponseHeaders"),
            get_response_header: MethodSlot::new("XMLHttpRequest.getResponseHeader"),
        }
    }
}

impl Default for XhrSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum XhrEvent: XhrEventKind {
        Open(HookEvent<XhrOpen, ()>) => "open",
        Send(HookEvent<XhrBody, ()>) => "send",
        SetReqHeader(HookEvent<XhrHeader, ()>) => "setReqHeader",
        ResponseUrl(HookEvent<Observed<String>, String>) => "responseUrl",
        GetAllResponseHeaders(HookEvent<Observed<String>, String>) => "getAllResponseHeaders",
        GetResponseHeader(HookEvent<HeaderRead<Option<String>>, Option<String>>)
            => "getResponseHeader",
    }
}

pub struct XhrHook {
    core: HookCore<XhrSurface, XhrEvent>,
}

impl XhrHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("xhr", host.xhr.clone(), realm),
        }
    }

    pub fn arm_open(&self) -> bool {
        self.core.arm("open", |surface, events| {
            intercept_method(&surface.open, events, variant!(XhrEvent::Open))
        })
    }

    pub fn arm_send(&self) -> bool {
        self.core.arm("send", |surface, events| {
            intercept_method(&surface.send, events, variant!(XhrEvent::Send))
        })
    }

    pub fn arm_set_request_header(&self) -> bool {
        self.core.arm("setRequestHeader", |surface, events| {
            intercept_method(
                &surface.set_request_header,
                events,
                variant!(XhrEvent::SetReqHeader),
            )
        })
    }

    pub fn arm_response_url(&self) -> bool {
        self.core.arm("responseURL", |surface, events| {
            intercept_getter(&surface.response_url, events, variant!(XhrEvent::ResponseUrl))
        })
    }

    /// `getAllResponseHeaders` and `getResponseHeader`; listeners see the
    /// native result and may rewrite it.
    pub fn arm_response_headers(&self) -> bool {
        self.core.arm("responseHeaders", |surface, events| {
            let all_events = Rc::clone(events);
            let all = override_method(&surface.get_all_response_headers, move |original, that, ()| {
                let list = Rc::clone(original);
                let target: NativeFn<Observed<String>, String> =
                    Rc::new(move |that: &Receiver, _: Observed<String>| list(that, ()));
                let data = Observed::new(original(that, ())?);
                let event = HookEvent::targeted(data, that.clone(), target);
                let variant = variant!(XhrEvent::GetAllResponseHeaders);
                let event = dispatch(&all_events, variant, event)?;
                event.finish(|data| Ok(data.value))
            });
            let one = observe_lookup(
                &surface.get_response_header,
                events,
                variant!(XhrEvent::GetResponseHeader),
            );
            all | one
        })
    }

    pub fn surface(&self) -> Option<&Rc<XhrSurface>> {
        self.core.surface()
    }
}

impl HookModule for XhrHook {
    type Event = XhrEvent;

    fn name(&self) -> &'static str {
        "xhr"
    }

    fn emitter(&self) -> &Emitter<XhrEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_open()
            | self.arm_send()
            | self.arm_set_request_header()
            | self.arm_response_url()
            | self.arm_response_headers()
    }
}
