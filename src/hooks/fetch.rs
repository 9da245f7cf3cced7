//! Fetch: the request entry points, request/response addresses and the
//! header surface.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{dispatch, intercept_getter, intercept_method, variant, HookCore, HookModule, Variant};
use crate::engine::{override_method, AccessorSlot, MethodSlot, NativeFn};
use crate::error::Result;
use crate::event::{HookEvent, Observed};
use crate::host::{HostBinding, HostValue, Receiver};
use crate::realm::Realm;

/// First argument of `fetch` / `new Request`.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestInput {
    Url(String),
    Request(Receiver),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub input: RequestInput,
    pub options: HostValue,
}

impl FetchRequest {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            input: RequestInput::Url(url.into()),
            options: HostValue::Null,
        }
    }

    pub fn request(request: Receiver) -> Self {
        Self {
            input: RequestInput::Request(request),
            options: HostValue::Null,
        }
    }

    pub fn with_options(mut self, options: HostValue) -> Self {
        self.options = options;
        self
    }

    fn is_request_object(&self) -> bool {
        matches!(&self.input, RequestInput::Request(request) if request.instance_of("Request"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderWrite {
    pub name: String,
    pub value: String,
}

/// Data of a header lookup: the name and what the native returned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRead<T> {
    pub name: String,
    pub value: T,
}

pub struct FetchSurface {
    /// `fetch`, called on the global object.
    pub fetch: MethodSlot<FetchRequest, Receiver>,
    /// The `Request` constructor.
    pub request: MethodSlot<FetchRequest, Receiver>,
    pub request_url: AccessorSlot<String>,
    pub response_url: AccessorSlot<String>,
    pub request_headers: AccessorSlot<Receiver>,
    pub response_headers: AccessorSlot<Receiver>,
    pub get_header: MethodSlot<HeaderName, Option<String>>,
    pub set_header: MethodSlot<HeaderWrite, ()>,
    pub has_header: MethodSlot<HeaderName, bool>,
    pub append_header: MethodSlot<HeaderWrite, ()>,
    pub delete_header: MethodSlot<HeaderName, ()>,
}

impl FetchSurface {
    pub fn new() -> Self {
        Self {
            fetch: MethodSlot::new("fetch"),
            request: MethodSlot::new("Request"),
            request_url: AccessorSlot::new("Request.url"),
            response_url: AccessorSlot::new("Response.url"),
            request_headers: AccessorSlot::new("Request.headers"),
            response_headers: AccessorSlot::new("Response.headers"),
            get_header: MethodSlot::new("Headers.get"),
            set_header: MethodSlot::new("Headers.set"),
            has_header: MethodSlot::new("Headers.has"),
            append_header: MethodSlot::new("Headers.append"),
            delete_header: MethodSlot::new("Headers.delete"),
        }
    }
}

impl Default for FetchSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum FetchEvent: FetchEventKind {
        Request(HookEvent<FetchRequest, Receiver>) => "request",
        RequestUrl(HookEvent<Observed<String>, String>) => "requestUrl",
        ResponseUrl(HookEvent<Observed<String>, String>) => "responseUrl",
        RequestHeaders(HookEvent<Observed<Receiver>, Receiver>) => "requestHeaders",
        ResponseHeaders(HookEvent<Observed<Receiver>, Receiver>) => "responseHeaders",
        GetHeader(HookEvent<HeaderRead<Option<String>>, Option<String>>) => "getHeader",
        SetHeader(HookEvent<HeaderWrite, ()>) => "setHeader",
        HasHeader(HookEvent<HeaderRead<bool>, bool>) => "hasHeader",
        AppendHeader(HookEvent<HeaderWrite, ()>) => "appendHeader",
        DeleteHeader(HookEvent<HeaderName, ()>) => "deleteHeader",
    }
}

/// Run the native lookup first and offer its result to listeners.
pub(crate) fn observe_lookup<T, E>(
    slot: &MethodSlot<HeaderName, T>,
    events: &Rc<Emitter<E>>,
    variant: Variant<E, HookEvent<HeaderRead<T>, T>>,
) -> bool
where
    T: 'static,
    E: veneer_events::Event,
{
    let events = Rc::clone(events);
    override_method(slot, move |original, that, header: HeaderName| -> Result<T> {
        let value = original(that, header.clone())?;
        let lookup = Rc::clone(original);
        let target: NativeFn<HeaderRead<T>, T> =
            Rc::new(move |that: &Receiver, data: HeaderRead<T>| {
                lookup(that, HeaderName { name: data.name })
            });
        let data = HeaderRead {
            name: header.name,
            value,
        };
        let event = HookEvent::targeted(data, that.clone(), target);
        let event = dispatch(&events, variant, event)?;
        event.finish(|data| Ok(data.value))
    })
}

pub struct FetchHook {
    core: HookCore<FetchSurface, FetchEvent>,
}

impl FetchHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("fetch", host.fetch.clone(), realm),
        }
    }

    /// `fetch` and the `Request` constructor, both as `request`. A fetch
    /// whose input is already a `Request` passes straight through.
    pub fn arm_request(&self) -> bool {
        self.core.arm("request", |surface, events| {
            let fetch_events = Rc::clone(events);
            let fetch = override_method(&surface.fetch, move |original, that, request| {
                if request.is_request_object() {
                    return original(that, request);
                }
                let event = HookEvent::targeted(request, that.clone(), Rc::clone(original));
                let event = dispatch(&fetch_events, variant!(FetchEvent::Request), event)?;
                event.finish(|data| original(that, data))
            });
            let construct =
                intercept_method(&surface.request, events, variant!(FetchEvent::Request));
            fetch | construct
        })
    }

    /// `url` on requests and responses.
    pub fn arm_url(&self) -> bool {
        self.core.arm("url", |surface, events| {
            let request =
                intercept_getter(&surface.request_url, events, variant!(FetchEvent::RequestUrl));
            let response = intercept_getter(
                &surface.response_url,
                events,
                variant!(FetchEvent::ResponseUrl),
            );
            request | response
        })
    }

    /// `headers` on requests and responses plus every `Headers` method.
    pub fn arm_headers(&self) -> bool {
        self.core.arm("headers", |surface, events| {
            let request = intercept_getter(
                &surface.request_headers,
                events,
                variant!(FetchEvent::RequestHeaders),
            );
            let response = intercept_getter(
                &surface.response_headers,
                events,
                variant!(FetchEvent::ResponseHeaders),
            );
            let get = observe_lookup(&surface.get_header, events, variant!(FetchEvent::GetHeader));
            let has = observe_lookup(&surface.has_header, events, variant!(FetchEvent::HasHeader));
            let set =
                intercept_method(&surface.set_header, events, variant!(FetchEvent::SetHeader));
            let append = intercept_method(
                &surface.append_header,
                events,
                variant!(FetchEvent::AppendHeader),
            );
            let delete = intercept_method(
                &surface.delete_header,
                events,
                variant!(FetchEvent::DeleteHeader),
            );
            request | response | get | has | set | append | delete
        })
    }

    pub fn surface(&self) -> Option<&Rc<FetchSurface>> {
        self.core.surface()
    }
}

impl HookModule for FetchHook {
    type Event = FetchEvent;

    fn name(&self) -> &'static str {
        "fetch"
    }

    fn emitter(&self) -> &Emitter<FetchEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_request() | self.arm_url() | self.arm_headers()
    }
}
