//! In-memory fake host shared by the integration suites.
//!
//! Every native records what reached it in a shared call log, so tests can
//! tell whether an intercepted call ran the real operation and with which
//! arguments.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use veneer::address::Address;
use veneer::emulation::{Location, LocationField, LocationParts};
use veneer::engine::{AccessorSlot, MethodSlot};
use veneer::hooks::{
    AttributeSurface, DocumentSurface, ElementSurface, EventSourceSurface, FetchRequest,
    FetchSurface, HistorySurface, IdbSurface, MessageSurface, NavigatorSurface, NodeOrText,
    NodeSurface, ObjectUrlSurface, ReflectSurface, RequestInput, StorageSurface, StyleSurface,
    UrlProperty, WebSocketSurface, WorkerLocationSurface, WorkerSurface, XhrSurface,
};
use veneer::{HostBinding, HookError, Receiver, Result};

/// Ordered log of native calls.
#[derive(Clone, Default)]
pub struct Calls(Rc<RefCell<Vec<String>>>);

impl Calls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: impl Into<String>) {
        self.0.borrow_mut().push(call.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

/// Payload of a fake `Storage` receiver.
#[derive(Default)]
pub struct StoreData {
    entries: RefCell<Vec<(String, String)>>,
}

impl StoreData {
    pub fn receiver() -> Receiver {
        Receiver::new("Storage", StoreData::default())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.borrow_mut();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove(&self, key: &str) {
        self.entries.borrow_mut().retain(|(k, _)| k != key);
    }
}

fn store(that: &Receiver) -> Result<&StoreData> {
    that.expect_ref::<StoreData>("Storage")
}

pub fn storage_surface(calls: &Calls, local: Receiver) -> StorageSurface {
    let surface = StorageSurface {
        length: AccessorSlot::new("Storage.length")
            .getter(|that| Ok(store(that)?.entries.borrow().len() as u32)),
        local: Some(local),
        session: Some(StoreData::receiver()),
        ..StorageSurface::new()
    };

    let log = calls.clone();
    surface.get_item.define(move |that, request| {
        log.push(format!("getItem {}", request.key_name()));
        Ok(store(that)?.get(request.key_name()))
    });
    let log = calls.clone();
    surface.set_item.define(move |that, request| {
        log.push(format!("setItem {}", request.key_name()));
        store(that)?.set(request.key_name(), request.value.as_deref().unwrap_or(""));
        Ok(None)
    });
    let log = calls.clone();
    surface.remove_item.define(move |that, request| {
        log.push(format!("removeItem {}", request.key_name()));
        store(that)?.remove(request.key_name());
        Ok(None)
    });
    let log = calls.clone();
    surface.clear.define(move |that, _| {
        log.push("clear");
        store(that)?.entries.borrow_mut().clear();
        Ok(None)
    });
    surface.key.define(|that, request| {
        let index = request.index.unwrap_or(0) as usize;
        Ok(store(that)?.entries.borrow().get(index).map(|(k, _)| k.clone()))
    });
    surface
}

pub fn history_surface(calls: &Calls) -> HistorySurface {
    let surface = HistorySurface::new();
    let log = calls.clone();
    surface.push_state.define(move |_, entry| {
        log.push(format!("pushState {}", entry.url.unwrap_or_default()));
        Ok(())
    });
    let log = calls.clone();
    surface.replace_state.define(move |_, entry| {
        log.push(format!("replaceState {}", entry.url.unwrap_or_default()));
        Ok(())
    });
    let log = calls.clone();
    surface.go.define(move |_, delta| {
        log.push(format!("go {}", delta.delta));
        Ok(())
    });
    let log = calls.clone();
    surface.forward.define(move |_, ()| {
        log.push("forward");
        Ok(())
    });
    let log = calls.clone();
    surface.back.define(move |_, ()| {
        log.push("back");
        Ok(())
    });
    surface
}

fn describe(request: &FetchRequest) -> String {
    match &request.input {
        RequestInput::Url(url) => url.clone(),
        RequestInput::Request(request) => request
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default(),
    }
}

pub fn fetch_surface(calls: &Calls) -> FetchSurface {
    let log = calls.clone();
    let surface = FetchSurface {
        request: MethodSlot::constructor("Request", "Request", move |_, request| {
            log.push(format!("Request {}", describe(&request)));
            Ok(Receiver::new("Request", describe(&request)))
        }),
        ..FetchSurface::new()
    };
    let log = calls.clone();
    surface.fetch.define(move |_, request| {
        log.push(format!("fetch {}", describe(&request)));
        Ok(Receiver::new("Response", describe(&request)))
    });
    surface
}

pub fn message_surface(calls: &Calls) -> MessageSurface {
    let surface = MessageSurface {
        origin: AccessorSlot::new("MessageEvent.origin")
            .getter(|_| Ok("https://real.example".to_string())),
        data: AccessorSlot::new("MessageEvent.data").getter(|_| Ok(json!({ "n": 1 }))),
        ..MessageSurface::new()
    };
    let log = calls.clone();
    surface.post_message.define(move |_, posted| {
        log.push(format!(
            "postMessage origin={} worker={}",
            posted.origin.as_deref().unwrap_or("-"),
            posted.worker
        ));
        Ok(())
    });
    let log = calls.clone();
    surface.port_post_message.define(move |_, posted| {
        log.push(format!(
            "port.postMessage origin={} worker={}",
            posted.origin.as_deref().unwrap_or("-"),
            posted.worker
        ));
        Ok(())
    });
    surface
}

/// A function object whose payload is its name.
pub fn function(name: &str) -> Receiver {
    Receiver::new("Function", name.to_string())
}

pub fn reflect_surface() -> ReflectSurface {
    let surface = ReflectSurface::new();
    surface.to_string.define(|that, ()| {
        let name = that.expect_ref::<String>("Function")?;
        Ok(format!("function {name}() {{ [native code] }}"))
    });
    surface.get_own_property_names.define(|_, _object| {
        Ok(vec![
            "title".to_string(),
            "__veneer".to_string(),
            "cookie".to_string(),
        ])
    });
    surface
        .get_own_property_descriptors
        .define(|_, _object| Ok(json!({ "title": {}, "__veneer": {} })));
    surface
}

/// A string property backed by a shared cell; writes are logged as
/// `label=value`.
fn stored(
    name: &'static str,
    label: &'static str,
    init: &str,
    calls: &Calls,
) -> AccessorSlot<String> {
    let cell = Rc::new(RefCell::new(init.to_string()));
    let read = Rc::clone(&cell);
    let log = calls.clone();
    AccessorSlot::new(name)
        .getter(move |_| Ok(read.borrow().clone()))
        .setter(move |_, value: String| {
            log.push(format!("{label}={value}"));
            *cell.borrow_mut() = value;
            Ok(())
        })
}

pub fn element_surface(calls: &Calls) -> ElementSurface {
    let log = calls.clone();
    let surface = ElementSurface {
        audio: MethodSlot::constructor("Audio", "HTMLAudioElement", move |_, source: veneer::hooks::AudioSource| {
            log.push(format!("Audio {}", source.url.clone().unwrap_or_default()));
            Ok(Receiver::new("HTMLAudioElement", source.url))
        }),
        inner_html: stored("Element.innerHTML", "innerHTML", "<b>native</b>", calls),
        url_properties: vec![UrlProperty::new(
            "HTMLScriptElement",
            "src",
            stored("HTMLScriptElement.src", "script.src", "https://a.example/s.js", calls),
        )],
        ..ElementSurface::new()
    };
    surface
        .get_attribute
        .define(|_, attr| Ok(Some(format!("native-{}", attr.name))));
    let log = calls.clone();
    surface.set_attribute.define(move |_, attr| {
        log.push(format!("setAttribute {}={}", attr.name, attr.value));
        Ok(())
    });
    surface
}

pub fn document_surface(calls: &Calls) -> DocumentSurface {
    let surface = DocumentSurface {
        title: stored("Document.title", "title", "Native title", calls),
        cookie: stored("Document.cookie", "cookie", "sid=1", calls),
        ..DocumentSurface::new()
    };
    let log = calls.clone();
    surface.write.define(move |_, markup| {
        log.push(format!("write {}", markup.html.concat()));
        Ok(())
    });
    let log = calls.clone();
    surface.writeln.define(move |_, markup| {
        log.push(format!("writeln {}", markup.html.concat()));
        Ok(())
    });
    let log = calls.clone();
    surface.create_tree_walker.define(move |_, init| {
        log.push(format!(
            "createTreeWalker root={} show={:#x} filter={}",
            init.root.brand(),
            init.show,
            init.filter.is_some()
        ));
        Ok(Receiver::new("TreeWalker", init.root))
    });
    surface
}

pub fn node_surface(calls: &Calls) -> NodeSurface {
    let surface = NodeSurface {
        text_content: stored("Node.textContent", "textContent", "native text", calls),
        base_uri: AccessorSlot::new("Node.baseURI")
            .getter(|_| Ok("https://proxy.example/service/https://a.example/".to_string())),
        ..NodeSurface::new()
    };
    let log = calls.clone();
    surface.append.define(move |_, list| {
        let parts: Vec<String> = list
            .nodes
            .iter()
            .map(|node| match node {
                NodeOrText::Node(node) => node.brand().to_string(),
                NodeOrText::Text(text) => format!("{text:?}"),
            })
            .collect();
        log.push(format!("append {}", parts.join(",")));
        Ok(())
    });
    surface
}

pub fn attribute_surface(calls: &Calls) -> AttributeSurface {
    let surface = AttributeSurface {
        name: AccessorSlot::new("Attr.name").getter(|_| Ok("href".to_string())),
        value: stored("Attr.value", "value", "/service/https://a.example/", calls),
        ..AttributeSurface::new()
    };
    let log = calls.clone();
    surface.get_named_item.define(move |_, name| {
        log.push(format!("getNamedItem {}", name.name));
        Ok(Some(Receiver::new("Attr", name.name)))
    });
    surface
}

pub fn xhr_surface(calls: &Calls) -> XhrSurface {
    let surface = XhrSurface::new();
    let log = calls.clone();
    surface.open.define(move |_, open| {
        log.push(format!("open {} {}", open.method, open.url));
        Ok(())
    });
    let log = calls.clone();
    surface.set_request_header.define(move |_, header| {
        log.push(format!("setRequestHeader {}: {}", header.name, header.value));
        Ok(())
    });
    let log = calls.clone();
    surface.get_all_response_headers.define(move |_, ()| {
        log.push("getAllResponseHeaders");
        Ok("content-type: text/html\r\nx-proxy: 1".to_string())
    });
    let log = calls.clone();
    surface.get_response_header.define(move |_, header| {
        log.push(format!("getResponseHeader {}", header.name));
        Ok(Some(format!("native-{}", header.name)))
    });
    surface
}

pub fn event_source_surface(calls: &Calls) -> EventSourceSurface {
    let log = calls.clone();
    EventSourceSurface {
        construct: MethodSlot::constructor("EventSource", "EventSource", move |_, init: veneer::hooks::EventSourceInit| {
            log.push(format!("EventSource {}", init.url));
            Ok(Receiver::new("EventSource", init.url))
        }),
        url: AccessorSlot::new("EventSource.url")
            .getter(|_| Ok("https://proxy.example/service/https://a.example/stream".to_string())),
    }
}

pub fn websocket_surface(calls: &Calls) -> WebSocketSurface {
    let log = calls.clone();
    let surface = WebSocketSurface {
        construct: MethodSlot::constructor("WebSocket", "WebSocket", move |_, open: veneer::hooks::SocketOpen| {
            log.push(format!("WebSocket {} [{}]", open.url, open.protocols.join(",")));
            Ok(Receiver::new("WebSocket", open.url))
        }),
        ready_state: AccessorSlot::new("WebSocket.readyState")
            .getter(|_| Ok(WebSocketSurface::OPEN)),
        ..WebSocketSurface::new()
    };
    let log = calls.clone();
    surface.send.define(move |_, frame| {
        log.push(format!("send {}", frame.data));
        Ok(())
    });
    surface
}

pub fn navigator_surface(calls: &Calls) -> NavigatorSurface {
    let surface = NavigatorSurface::new();
    let log = calls.clone();
    surface.send_beacon.define(move |_, beacon| {
        log.push(format!("sendBeacon {}", beacon.url));
        Ok(true)
    });
    surface
}

pub fn worker_surface(calls: &Calls) -> WorkerSurface {
    let log = calls.clone();
    let surface = WorkerSurface {
        construct: MethodSlot::constructor("Worker", "Worker", move |_, spawn: veneer::hooks::WorkerSpawn| {
            log.push(format!("Worker {}", spawn.url));
            Ok(Receiver::new("Worker", spawn.url))
        }),
        ..WorkerSurface::new()
    };
    let log = calls.clone();
    surface.import_scripts.define(move |_, imports| {
        log.push(format!("importScripts {}", imports.scripts.join(",")));
        Ok(())
    });
    let log = calls.clone();
    surface.add_module.define(move |_, import| {
        log.push(format!("addModule {}", import.url));
        Ok(())
    });
    surface
}

pub fn object_url_surface(calls: &Calls) -> ObjectUrlSurface {
    let surface = ObjectUrlSurface::new();
    let log = calls.clone();
    surface.create_object_url.define(move |_, source| {
        log.push(format!("createObjectURL {}", source.object.brand()));
        Ok("blob:https://proxy.example/1".to_string())
    });
    let log = calls.clone();
    surface.revoke_object_url.define(move |_, revoked| {
        log.push(format!("revokeObjectURL {}", revoked.url));
        Ok(())
    });
    surface
}

pub fn style_surface(calls: &Calls) -> StyleSurface {
    let surface = StyleSurface {
        css_text: stored("CSSStyleDeclaration.cssText", "cssText", "color: red", calls),
        ..StyleSurface::new()
    };
    surface
        .get_property_value
        .define(|_, property| Ok(format!("native({})", property.property)));
    let log = calls.clone();
    surface.set_property.define(move |_, write| {
        log.push(format!("setProperty {}: {}", write.property, write.value));
        Ok(())
    });
    surface
}

pub fn idb_surface(calls: &Calls) -> IdbSurface {
    let surface = IdbSurface {
        name: AccessorSlot::new("IDBDatabase.name")
            .getter(|_| Ok("a.example@notes".to_string())),
        ..IdbSurface::new()
    };
    let log = calls.clone();
    surface.open.define(move |_, open| {
        log.push(format!("open {} v{}", open.name, open.version.unwrap_or(1)));
        Ok(Receiver::new("IDBOpenDBRequest", open.name))
    });
    surface
}

/// A location that navigates by replacing its href.
pub struct FakeLocation {
    href: RefCell<String>,
    pub calls: Calls,
}

impl FakeLocation {
    pub fn new(href: &str, calls: &Calls) -> Rc<Self> {
        Rc::new(Self {
            href: RefCell::new(href.to_string()),
            calls: calls.clone(),
        })
    }

    pub fn current(&self) -> String {
        self.href.borrow().clone()
    }
}

impl Location for FakeLocation {
    fn get(&self, field: LocationField) -> Result<String> {
        Ok(LocationParts::parse(&self.href.borrow())?
            .field(field)
            .to_string())
    }

    fn set(&self, field: LocationField, value: &str) -> Result<()> {
        if field != LocationField::Href {
            return Err(HookError::MissingSurface("FakeLocation component write"));
        }
        let next = Address::parse(&self.href.borrow())?.resolve(value)?;
        self.calls.push(format!("navigate {next}"));
        *self.href.borrow_mut() = next.href();
        Ok(())
    }

    fn reload(&self) -> Result<()> {
        self.calls.push("reload");
        Ok(())
    }

    fn replace(&self, url: &str) -> Result<()> {
        self.calls.push(format!("replace {url}"));
        *self.href.borrow_mut() = url.to_string();
        Ok(())
    }

    fn assign(&self, url: &str) -> Result<()> {
        self.calls.push(format!("assign {url}"));
        *self.href.borrow_mut() = url.to_string();
        Ok(())
    }
}

/// A worker location whose href is the shared cell; every other native
/// field getter returns a sentinel so derived values are recognisable.
pub fn worker_location_surface(href: Rc<RefCell<String>>) -> WorkerLocationSurface {
    let surface = WorkerLocationSurface {
        href: AccessorSlot::new("WorkerLocation.href")
            .getter(move |_| Ok(href.borrow().clone())),
        ..WorkerLocationSurface::new()
    };
    for field in LocationField::ALL {
        if field != LocationField::Href {
            surface
                .field(field)
                .define_get(|_| Ok("native".to_string()));
        }
    }
    surface
}

/// A page realm with every surface the suites exercise.
pub struct Window {
    pub binding: HostBinding,
    pub calls: Calls,
    pub local: Receiver,
    pub location: Rc<FakeLocation>,
}

pub fn window() -> Window {
    let calls = Calls::new();
    let local = StoreData::receiver();
    let location = FakeLocation::new("https://a.example/p?x=1#f", &calls);
    let binding = HostBinding {
        history: Some(Rc::new(history_surface(&calls))),
        storage: Some(Rc::new(storage_surface(&calls, local.clone()))),
        fetch: Some(Rc::new(fetch_surface(&calls))),
        message: Some(Rc::new(message_surface(&calls))),
        reflect: Some(Rc::new(reflect_surface())),
        element: Some(Rc::new(element_surface(&calls))),
        document: Some(Rc::new(document_surface(&calls))),
        node: Some(Rc::new(node_surface(&calls))),
        attribute: Some(Rc::new(attribute_surface(&calls))),
        xhr: Some(Rc::new(xhr_surface(&calls))),
        event_source: Some(Rc::new(event_source_surface(&calls))),
        websocket: Some(Rc::new(websocket_surface(&calls))),
        navigator: Some(Rc::new(navigator_surface(&calls))),
        worker: Some(Rc::new(worker_surface(&calls))),
        object_url: Some(Rc::new(object_url_surface(&calls))),
        style: Some(Rc::new(style_surface(&calls))),
        idb: Some(Rc::new(idb_surface(&calls))),
        location: Some(location.clone()),
        ..HostBinding::window()
    };
    Window {
        binding,
        calls,
        local,
        location,
    }
}

/// A worker realm: messaging, worker scripts and the worker location.
pub struct Worker {
    pub binding: HostBinding,
    pub calls: Calls,
    pub href: Rc<RefCell<String>>,
}

pub fn worker() -> Worker {
    let calls = Calls::new();
    let href = Rc::new(RefCell::new(
        "https://proxy.example/service/https://a.example/w.js?v=2".to_string(),
    ));
    let binding = HostBinding {
        message: Some(Rc::new(message_surface(&calls))),
        worker: Some(Rc::new(worker_surface(&calls))),
        worker_location: Some(Rc::new(worker_location_surface(Rc::clone(&href)))),
        ..HostBinding::worker()
    };
    Worker {
        binding,
        calls,
        href,
    }
}

/// The identity mapping after stripping a `/service/` proxy prefix.
pub fn unproxy(href: &str) -> Result<LocationParts> {
    match href.split_once("/service/") {
        Some((_, real)) => LocationParts::parse(real),
        None => LocationParts::parse(href),
    }
}
