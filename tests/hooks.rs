//! Capability hook modules against the fake host.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use veneer::hooks::{
    AttributeEvent, AttributeEventKind, AttributeName, AttributeWrite, AudioSource, Beacon,
    DocumentEvent, DocumentEventKind, ElementEvent, ElementEventKind, EventSourceEvent,
    EventSourceEventKind, EventSourceInit, FetchEvent, FetchEventKind, FetchRequest, HeaderName,
    IdbEvent, IdbEventKind, IdbOpen, Markup, MessageEvent, MessageEventKind, NavigatorEvent,
    NavigatorEventKind, NodeEvent, NodeEventKind, NodeList, NodeOrText, ObjectUrlEvent,
    ObjectUrlEventKind, PostedMessage, QualifiedName, ReflectEvent, ReflectEventKind, RequestInput,
    RevokedUrl, ScriptImports, SocketFrame, SocketOpen, StorageEventKind, StyleEvent,
    StyleEventKind, StyleWrite, TreeWalkerInit, UrlSource, WebSocketEvent, WebSocketEventKind,
    WebSocketSurface, WorkerEvent, WorkerEventKind, WorkerSpawn, XhrEvent, XhrEventKind, XhrOpen,
};
use veneer::{Context, ContextConfig, HookModule, Receiver, Storage};
use veneer_events::{Event, EventKind};

#[test]
fn test_fetch_passes_request_objects_through() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.fetch().arm_request());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    context.fetch().on(FetchEventKind::Request, move |event| {
        if let FetchEvent::Request(event) = event {
            if let RequestInput::Url(url) = &mut event.data.input {
                log.borrow_mut().push(url.clone());
                *url = format!("/service/{url}");
            }
        }
        Ok(())
    });

    let surface = context.fetch().surface().expect("fetch surface");
    let global = &context.host().global;

    // Constructing a Request is intercepted and rewritten.
    let request = surface
        .request
        .call(global, FetchRequest::url("https://a.example/data"))
        .expect("new Request");
    assert!(request.instance_of("Request"));
    assert_eq!(surface.request.prototype(), Some("Request"));

    // Fetching that Request does not emit again.
    surface
        .fetch
        .call(global, FetchRequest::request(request))
        .expect("fetch(Request)");

    // Fetching a plain address does.
    let response = surface
        .fetch
        .call(global, FetchRequest::url("https://b.example/"))
        .expect("fetch(url)");
    assert!(response.instance_of("Response"));

    assert_eq!(
        *seen.borrow(),
        vec!["https://a.example/data", "https://b.example/"]
    );
    assert_eq!(
        calls.take(),
        vec![
            "Request /service/https://a.example/data",
            "fetch /service/https://a.example/data",
            "fetch /service/https://b.example/",
        ]
    );
}

#[test]
fn test_constructor_results_keep_host_brand() {
    let window = common::window();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.element().arm_audio());

    context.element().on(ElementEventKind::Audio, |event| {
        if let ElementEvent::Audio(event) = event {
            event.data.url = event.data.url.take().map(|url| format!("/service/{url}"));
        }
        Ok(())
    });

    let surface = context.element().surface().expect("element surface");
    let audio = surface
        .audio
        .call(
            &context.host().global,
            AudioSource {
                url: Some("https://a.example/a.mp3".to_string()),
            },
        )
        .expect("new Audio");

    assert!(audio.instance_of("HTMLAudioElement"));
    assert_eq!(surface.audio.prototype(), Some("HTMLAudioElement"));
    assert_eq!(
        audio.downcast_ref::<Option<String>>(),
        Some(&Some("/service/https://a.example/a.mp3".to_string()))
    );
}

#[test]
fn test_window_post_message_keeps_target_origin() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.message().arm_post_message());

    let origins = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&origins);
    context.message().on(MessageEventKind::PostMessage, move |event| {
        if let MessageEvent::PostMessage(event) = event {
            log.borrow_mut().push(event.data.origin.clone());
            assert!(!event.data.worker);
            event.data.origin = Some("*".to_string());
        }
        Ok(())
    });

    let surface = context.message().surface().expect("message surface");
    surface
        .post_message
        .call(
            &context.host().global,
            PostedMessage::to_origin(json!({ "hello": true }), "https://a.example"),
        )
        .expect("postMessage");

    assert_eq!(*origins.borrow(), vec![Some("https://a.example".to_string())]);
    assert_eq!(calls.take(), vec!["postMessage origin=* worker=false"]);
}

#[test]
fn test_worker_post_message_drops_target_origin() {
    let worker = common::worker();
    let calls = worker.calls.clone();
    let context = Context::new(worker.binding, ContextConfig::worker());
    assert!(context.message().mode().is_worker());
    assert!(context.message().arm_post_message());

    context.message().on(MessageEventKind::PostMessage, |event| {
        if let MessageEvent::PostMessage(event) = event {
            assert!(event.data.worker);
            assert_eq!(event.data.origin, None);
            // An origin set by policy never reaches a worker-signature call.
            event.data.origin = Some("https://a.example".to_string());
        }
        Ok(())
    });

    let surface = context.message().surface().expect("message surface");
    surface
        .post_message
        .call(
            &context.host().global,
            PostedMessage::to_origin(json!(1), "https://stale.example"),
        )
        .expect("postMessage");
    assert_eq!(calls.take(), vec!["postMessage origin=- worker=true"]);
}

#[test]
fn test_port_post_message_uses_worker_signature_in_window() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.message().arm_port_post_message());

    let surface = context.message().surface().expect("message surface");
    let port = Receiver::new("MessagePort", ());
    surface
        .port_post_message
        .call(&port, PostedMessage::untargeted(json!("ping")))
        .expect("port.postMessage");
    assert_eq!(calls.take(), vec!["port.postMessage origin=- worker=true"]);
}

#[test]
fn test_message_event_getters_can_be_rewritten() {
    let window = common::window();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.message().arm_message_event());

    context.message().on(MessageEventKind::Origin, |event| {
        if let MessageEvent::Origin(event) = event {
            assert_eq!(event.data.value, "https://real.example");
            event.data.value = "https://a.example".to_string();
        }
        Ok(())
    });
    context.message().on(MessageEventKind::Data, |event| {
        if let MessageEvent::Data(event) = event {
            event.respond_with(json!({ "n": 2 }));
        }
        Ok(())
    });

    let surface = context.message().surface().expect("message surface");
    let message = Receiver::new("MessageEvent", ());
    assert_eq!(surface.origin.get(&message).expect("origin"), "https://a.example");
    assert_eq!(surface.data.get(&message).expect("data"), json!({ "n": 2 }));
    assert_eq!(
        surface.origin.get_native(&message).expect("native origin"),
        "https://real.example"
    );
}

#[test]
fn test_native_reflection_survives_arming() {
    let window = common::window();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.reflect().arm_to_string());
    assert!(context.reflect().arm_own_properties());

    let replacement = common::function("pushState");
    let swap = replacement.clone();
    context.reflect().on(ReflectEventKind::ToString, move |event| {
        if let ReflectEvent::ToString(event) = event {
            event.data.function = swap.clone();
        }
        Ok(())
    });
    context
        .reflect()
        .on(ReflectEventKind::GetOwnPropertyNames, |event| {
            if let ReflectEvent::GetOwnPropertyNames(event) = event {
                event.data.names.retain(|name| !name.starts_with("__"));
            }
            Ok(())
        });

    let surface = context.reflect().surface().expect("reflect surface");
    let wrapper = common::function("wrapper");
    assert_eq!(
        surface.to_string.call(&wrapper, ()).expect("toString"),
        "function pushState() { [native code] }"
    );
    assert_eq!(
        context.native_to_string(&wrapper).expect("native toString"),
        "function wrapper() { [native code] }"
    );

    let document = Receiver::new("Document", ());
    assert_eq!(
        surface
            .get_own_property_names
            .call(&context.host().global, document.clone())
            .expect("getOwnPropertyNames"),
        vec!["title", "cookie"]
    );
    assert_eq!(
        context
            .native_own_property_names(&document)
            .expect("native getOwnPropertyNames"),
        vec!["title", "__veneer", "cookie"]
    );
}

#[test]
fn test_storage_methods_share_one_routine() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.storage().arm_methods());
    assert!(context.storage().arm_length());

    let ops = Rc::new(RefCell::new(Vec::new()));
    for kind in [
        StorageEventKind::GetItem,
        StorageEventKind::SetItem,
        StorageEventKind::RemoveItem,
        StorageEventKind::Key,
    ] {
        let log = Rc::clone(&ops);
        context.storage().on(kind, move |event| {
            log.borrow_mut().push(event.kind().name());
            Ok(())
        });
    }

    let local = context.storage().local_storage().expect("localStorage");
    local.set_item("theme", "dark").expect("setItem");
    assert_eq!(local.get_item("theme").expect("getItem").as_deref(), Some("dark"));
    assert_eq!(local.key(0).expect("key").as_deref(), Some("theme"));
    assert_eq!(local.length().expect("length"), 1);
    local.remove_item("theme").expect("removeItem");
    assert_eq!(local.length().expect("length"), 0);

    assert_eq!(*ops.borrow(), vec!["setItem", "getItem", "key", "removeItem"]);
    assert_eq!(
        calls.take(),
        vec!["setItem theme", "getItem theme", "removeItem theme"]
    );
}

#[test]
fn test_arm_all_arms_every_present_surface() {
    let window = common::window();
    let config = ContextConfig {
        arm_on_start: true,
        ..ContextConfig::default()
    };
    let context = Context::new(window.binding, config);

    let history = context.history().surface().expect("history surface");
    assert!(history.push_state.is_wrapped());
    assert!(history.back.is_wrapped());
    let storage = context.storage().surface().expect("storage surface");
    assert!(storage.get_item.is_wrapped());
    assert!(storage.length.is_wrapped());

    // Re-arming reports the first outcomes without reinstalling.
    assert!(context.arm_all());
    assert!(!context.location().arm());
}

fn proxied(url: &str) -> String {
    format!("/service/{url}")
}

fn unproxied(url: &str) -> String {
    url.trim_start_matches("https://proxy.example")
        .trim_start_matches("/service/")
        .to_string()
}

#[test]
fn test_document_write_markup_is_rewritten() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.document().arm_write());
    assert!(context.document().arm_title());

    for kind in [DocumentEventKind::Write, DocumentEventKind::Writeln] {
        context.document().on(kind, |event| {
            let markup = match event {
                DocumentEvent::Write(event) | DocumentEvent::Writeln(event) => &mut event.data,
                _ => return Ok(()),
            };
            // The fragments are rewritten as one string.
            let html = markup.html.concat();
            markup.html = vec![html.replace("src=\"https://", "src=\"/service/https://")];
            Ok(())
        });
    }
    context.document().on(DocumentEventKind::GetTitle, |event| {
        if let DocumentEvent::GetTitle(event) = event {
            event.data.value = format!("{} (a.example)", event.data.value);
        }
        Ok(())
    });

    let surface = context.document().surface().expect("document surface");
    let document = Receiver::new("Document", ());
    surface
        .write
        .call(
            &document,
            Markup {
                html: vec![
                    "<script src=\"https://a.".to_string(),
                    "example/s.js\"></script>".to_string(),
                ],
            },
        )
        .expect("write");
    surface
        .writeln
        .call(
            &document,
            Markup {
                html: vec!["<p>plain</p>".to_string()],
            },
        )
        .expect("writeln");
    assert_eq!(
        surface.title.get(&document).expect("title"),
        "Native title (a.example)"
    );
    assert_eq!(
        calls.take(),
        vec![
            "write <script src=\"/service/https://a.example/s.js\"></script>",
            "writeln <p>plain</p>",
        ]
    );
}

#[test]
fn test_tree_walker_root_can_be_replaced() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.document().arm_create_tree_walker());
    assert_eq!(DocumentEventKind::CreateTreeWalker.name(), "createTreeWalker");

    let shadow = Receiver::new("HTMLDivElement", ());
    let swap = shadow.clone();
    let masks = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&masks);
    context
        .document()
        .on(DocumentEventKind::CreateTreeWalker, move |event| {
            if let DocumentEvent::CreateTreeWalker(event) = event {
                log.borrow_mut()
                    .push((event.data.show, event.data.expand_entity_references));
                if event.data.root.instance_of("Document") {
                    event.data.root = swap.clone();
                }
            }
            Ok(())
        });

    let surface = context.document().surface().expect("document surface");
    let document = Receiver::new("Document", ());
    let walker = surface
        .create_tree_walker
        .call(&document, TreeWalkerInit::new(document.clone()))
        .expect("createTreeWalker");
    assert!(walker.instance_of("TreeWalker"));
    assert_eq!(walker.downcast_ref::<Receiver>(), Some(&shadow));

    // Roots other than the document are left alone.
    let filtered = TreeWalkerInit {
        show: 0x1,
        filter: Some(Receiver::new("NodeFilter", ())),
        ..TreeWalkerInit::new(Receiver::new("HTMLBodyElement", ()))
    };
    surface
        .create_tree_walker
        .call(&document, filtered)
        .expect("createTreeWalker(filter)");

    assert_eq!(
        *masks.borrow(),
        vec![(TreeWalkerInit::SHOW_ALL, false), (0x1, false)]
    );
    assert_eq!(
        calls.take(),
        vec![
            "createTreeWalker root=HTMLDivElement show=0xffffffff filter=false",
            "createTreeWalker root=HTMLBodyElement show=0x1 filter=true",
        ]
    );
}

#[test]
fn test_node_text_and_children_are_intercepted() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.node().arm());

    context.node().on(NodeEventKind::SetTextContent, |event| {
        if let NodeEvent::SetTextContent(event) = event {
            event.data.value = event.data.value.to_uppercase();
        }
        Ok(())
    });
    context.node().on(NodeEventKind::Append, |event| {
        if let NodeEvent::Append(event) = event {
            event.data.nodes.push(NodeOrText::Text("tail".to_string()));
        }
        Ok(())
    });
    context.node().on(NodeEventKind::BaseUri, |event| {
        if let NodeEvent::BaseUri(event) = event {
            event.data.value = unproxied(&event.data.value);
        }
        Ok(())
    });

    let surface = context.node().surface().expect("node surface");
    let node = Receiver::new("Text", ());
    surface
        .text_content
        .set(&node, "hello".to_string())
        .expect("textContent=");
    assert_eq!(surface.text_content.get(&node).expect("textContent"), "HELLO");
    surface
        .append
        .call(
            &node,
            NodeList {
                nodes: vec![
                    NodeOrText::Node(Receiver::new("HTMLScriptElement", ())),
                    NodeOrText::Text("hi".to_string()),
                ],
            },
        )
        .expect("append");
    assert_eq!(
        surface.base_uri.get(&node).expect("baseURI"),
        "https://a.example/"
    );
    assert_eq!(
        calls.take(),
        vec![
            "textContent=HELLO",
            "append HTMLScriptElement,\"hi\",\"tail\"",
        ]
    );
}

#[test]
fn test_attribute_value_events_carry_the_name() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.attribute().arm_value());
    assert!(context.attribute().arm_named_map());

    let names = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&names);
    context.attribute().on(AttributeEventKind::GetValue, move |event| {
        if let AttributeEvent::GetValue(event) = event {
            log.borrow_mut().push(event.data.name.clone());
            event.data.value = unproxied(&event.data.value);
        }
        Ok(())
    });
    context.attribute().on(AttributeEventKind::SetValue, |event| {
        if let AttributeEvent::SetValue(event) = event {
            assert_eq!(event.data.name, "href");
            event.data.value = proxied(&event.data.value);
        }
        Ok(())
    });
    context
        .attribute()
        .on(AttributeEventKind::GetNamedItem, |event| {
            if let AttributeEvent::GetNamedItem(event) = event {
                if event.data.name.starts_with("__") {
                    event.respond_with(None);
                }
            }
            Ok(())
        });

    let surface = context.attribute().surface().expect("attribute surface");
    let attr = Receiver::new("Attr", ());
    assert_eq!(
        surface.value.get(&attr).expect("value"),
        "https://a.example/"
    );
    surface
        .value
        .set(&attr, "https://b.example/".to_string())
        .expect("value=");

    let map = Receiver::new("NamedNodeMap", ());
    let hidden = surface
        .get_named_item
        .call(&map, QualifiedName::local("__veneer"))
        .expect("getNamedItem hidden");
    assert!(hidden.is_none());
    let shown = surface
        .get_named_item
        .call(&map, QualifiedName::local("href"))
        .expect("getNamedItem");
    assert!(shown.is_some_and(|attr| attr.instance_of("Attr")));

    assert_eq!(*names.borrow(), vec!["href"]);
    assert_eq!(
        calls.take(),
        vec!["value=/service/https://b.example/", "getNamedItem href"]
    );
}

#[test]
fn test_xhr_response_headers_are_read_before_listeners_run() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.xhr().arm_open());
    assert!(context.xhr().arm_response_headers());

    context.xhr().on(XhrEventKind::Open, |event| {
        if let XhrEvent::Open(event) = event {
            event.data.url = proxied(&event.data.url);
        }
        Ok(())
    });
    let log = calls.clone();
    context
        .xhr()
        .on(XhrEventKind::GetAllResponseHeaders, move |event| {
            if let XhrEvent::GetAllResponseHeaders(event) = event {
                log.push("listener getAllResponseHeaders");
                event.data.value = event
                    .data
                    .value
                    .split("\r\n")
                    .filter(|line| !line.starts_with("x-proxy"))
                    .collect::<Vec<_>>()
                    .join("\r\n");
            }
            Ok(())
        });
    context.xhr().on(XhrEventKind::GetResponseHeader, |event| {
        if let XhrEvent::GetResponseHeader(event) = event {
            assert_eq!(event.data.name, "content-type");
            assert_eq!(event.data.value.as_deref(), Some("native-content-type"));
            event.data.value = Some("text/plain".to_string());
        }
        Ok(())
    });

    let surface = context.xhr().surface().expect("xhr surface");
    let xhr = Receiver::new("XMLHttpRequest", ());
    surface
        .open
        .call(&xhr, XhrOpen::new("GET", "https://a.example/api"))
        .expect("open");
    assert_eq!(
        surface
            .get_all_response_headers
            .call(&xhr, ())
            .expect("getAllResponseHeaders"),
        "content-type: text/html"
    );
    assert_eq!(
        surface
            .get_response_header
            .call(
                &xhr,
                HeaderName {
                    name: "content-type".to_string(),
                },
            )
            .expect("getResponseHeader")
            .as_deref(),
        Some("text/plain")
    );
    assert_eq!(
        calls.take(),
        vec![
            "open GET /service/https://a.example/api",
            "getAllResponseHeaders",
            "listener getAllResponseHeaders",
            "getResponseHeader content-type",
        ]
    );
}

#[test]
fn test_event_source_keeps_brand_and_reports_page_url() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.event_source().arm_construct());
    assert!(context.event_source().arm_url());

    context
        .event_source()
        .on(EventSourceEventKind::Construct, |event| {
            if let EventSourceEvent::Construct(event) = event {
                event.data.url = proxied(&event.data.url);
            }
            Ok(())
        });
    context.event_source().on(EventSourceEventKind::Url, |event| {
        if let EventSourceEvent::Url(event) = event {
            event.data.value = unproxied(&event.data.value);
        }
        Ok(())
    });

    let surface = context.event_source().surface().expect("eventsource surface");
    let source = surface
        .construct
        .call(
            &context.host().global,
            EventSourceInit {
                url: "https://a.example/stream".to_string(),
                config: json!({ "withCredentials": false }),
            },
        )
        .expect("new EventSource");
    assert!(source.instance_of("EventSource"));
    assert_eq!(surface.construct.prototype(), Some("EventSource"));
    assert_eq!(
        surface.url.get(&source).expect("url"),
        "https://a.example/stream"
    );
    assert_eq!(
        calls.take(),
        vec!["EventSource /service/https://a.example/stream"]
    );
}

#[test]
fn test_websocket_frames_can_be_answered_by_listeners() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.websocket().arm());

    context
        .websocket()
        .on(WebSocketEventKind::WebSocket, |event| {
            if let WebSocketEvent::WebSocket(event) = event {
                event.data.url = format!("wss://proxy.example/service/{}", event.data.url);
            }
            Ok(())
        });
    context.websocket().on(WebSocketEventKind::Send, |event| {
        if let WebSocketEvent::Send(event) = event {
            if event.data.data == json!("drop") {
                event.respond_with(());
            }
        }
        Ok(())
    });
    context
        .websocket()
        .on(WebSocketEventKind::ReadyState, |event| {
            if let WebSocketEvent::ReadyState(event) = event {
                assert_eq!(event.data.value, WebSocketSurface::OPEN);
                event.respond_with(WebSocketSurface::CLOSING);
            }
            Ok(())
        });

    let surface = context.websocket().surface().expect("websocket surface");
    let socket = surface
        .construct
        .call(
            &context.host().global,
            SocketOpen {
                url: "wss://a.example/ws".to_string(),
                protocols: vec!["chat".to_string()],
            },
        )
        .expect("new WebSocket");
    assert!(socket.instance_of("WebSocket"));
    for data in ["keep", "drop"] {
        surface
            .send
            .call(&socket, SocketFrame { data: json!(data) })
            .expect("send");
    }
    assert_eq!(
        surface.ready_state.get(&socket).expect("readyState"),
        WebSocketSurface::CLOSING
    );
    assert_eq!(
        calls.take(),
        vec![
            "WebSocket wss://proxy.example/service/wss://a.example/ws [chat]",
            "send \"keep\"",
        ]
    );
}

#[test]
fn test_beacons_can_be_refused() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.navigator().arm_send_beacon());

    context
        .navigator()
        .on(NavigatorEventKind::SendBeacon, |event| {
            if let NavigatorEvent::SendBeacon(event) = event {
                if event.data.url.starts_with("https://tracker.example") {
                    event.respond_with(false);
                } else {
                    event.data.url = proxied(&event.data.url);
                }
            }
            Ok(())
        });

    let surface = context.navigator().surface().expect("navigator surface");
    let navigator = Receiver::new("Navigator", ());
    let beacon = |url: &str| Beacon {
        url: url.to_string(),
        data: json!("payload"),
    };
    assert!(surface
        .send_beacon
        .call(&navigator, beacon("https://a.example/log"))
        .expect("sendBeacon"));
    assert!(!surface
        .send_beacon
        .call(&navigator, beacon("https://tracker.example/t"))
        .expect("sendBeacon refused"));
    assert_eq!(
        calls.take(),
        vec!["sendBeacon /service/https://a.example/log"]
    );
}

#[test]
fn test_worker_scripts_are_rewritten() {
    let worker = common::worker();
    let calls = worker.calls.clone();
    let context = Context::new(worker.binding, ContextConfig::worker());
    assert!(context.worker().arm_import_scripts());
    assert!(context.worker().arm_worker());

    context
        .worker()
        .on(WorkerEventKind::ImportScripts, |event| {
            if let WorkerEvent::ImportScripts(event) = event {
                for script in &mut event.data.scripts {
                    *script = proxied(script);
                }
            }
            Ok(())
        });
    context.worker().on(WorkerEventKind::Worker, |event| {
        if let WorkerEvent::Worker(event) = event {
            event.data.url = proxied(&event.data.url);
        }
        Ok(())
    });

    let surface = context.worker().surface().expect("worker surface");
    let global = &context.host().global;
    surface
        .import_scripts
        .call(
            global,
            ScriptImports {
                scripts: vec!["https://a.example/a.js".to_string(), "b.js".to_string()],
            },
        )
        .expect("importScripts");
    let nested = surface
        .construct
        .call(
            global,
            WorkerSpawn {
                url: "https://a.example/w.js".to_string(),
                options: json!({ "type": "classic" }),
            },
        )
        .expect("new Worker");
    assert!(nested.instance_of("Worker"));
    assert_eq!(
        calls.take(),
        vec![
            "importScripts /service/https://a.example/a.js,/service/b.js",
            "Worker /service/https://a.example/w.js",
        ]
    );
}

#[test]
fn test_object_urls_are_observed() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.object_url().arm_object_url());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    context
        .object_url()
        .on(ObjectUrlEventKind::CreateObjectUrl, move |event| {
            if let ObjectUrlEvent::CreateObjectUrl(event) = event {
                log.borrow_mut().push(event.data.object.brand().to_string());
            }
            Ok(())
        });
    let log = Rc::clone(&seen);
    context
        .object_url()
        .on(ObjectUrlEventKind::RevokeObjectUrl, move |event| {
            if let ObjectUrlEvent::RevokeObjectUrl(event) = event {
                log.borrow_mut().push(event.data.url.clone());
            }
            Ok(())
        });

    let surface = context.object_url().surface().expect("objectURL surface");
    let url_ctor = Receiver::new("URL", ());
    let url = surface
        .create_object_url
        .call(
            &url_ctor,
            UrlSource {
                object: Receiver::new("Blob", ()),
            },
        )
        .expect("createObjectURL");
    assert_eq!(url, "blob:https://proxy.example/1");
    surface
        .revoke_object_url
        .call(&url_ctor, RevokedUrl { url: url.clone() })
        .expect("revokeObjectURL");

    assert_eq!(*seen.borrow(), vec!["Blob", "blob:https://proxy.example/1"]);
    assert_eq!(
        calls.take(),
        vec![
            "createObjectURL Blob",
            "revokeObjectURL blob:https://proxy.example/1",
        ]
    );
}

#[test]
fn test_style_css_text_is_rewritten_both_ways() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.style().arm_css_text());
    assert!(context.style().arm_property());

    context.style().on(StyleEventKind::SetCssText, |event| {
        if let StyleEvent::SetCssText(event) = event {
            event.data.value = event.data.value.replace("url(https://", "url(/service/https://");
        }
        Ok(())
    });
    context.style().on(StyleEventKind::GetCssText, |event| {
        if let StyleEvent::GetCssText(event) = event {
            event.data.value = event.data.value.replace("url(/service/", "url(");
        }
        Ok(())
    });
    context.style().on(StyleEventKind::SetProperty, |event| {
        if let StyleEvent::SetProperty(event) = event {
            event.data.value = event.data.value.replace("url(https://", "url(/service/https://");
        }
        Ok(())
    });

    let surface = context.style().surface().expect("style surface");
    let style = Receiver::new("CSSStyleDeclaration", ());
    surface
        .css_text
        .set(&style, "background: url(https://a.example/bg.png)".to_string())
        .expect("cssText=");
    assert_eq!(
        surface.css_text.get(&style).expect("cssText"),
        "background: url(https://a.example/bg.png)"
    );
    assert_eq!(
        surface.css_text.get_native(&style).expect("native cssText"),
        "background: url(/service/https://a.example/bg.png)"
    );
    surface
        .set_property
        .call(
            &style,
            StyleWrite {
                property: "background-image".to_string(),
                value: "url(https://a.example/x.png)".to_string(),
            },
        )
        .expect("setProperty");
    assert_eq!(
        calls.take(),
        vec![
            "cssText=background: url(/service/https://a.example/bg.png)",
            "setProperty background-image: url(/service/https://a.example/x.png)",
        ]
    );
}

#[test]
fn test_idb_names_are_scoped_to_the_page_origin() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.idb().arm_open());
    assert!(context.idb().arm_name());

    context.idb().on(IdbEventKind::IdbFactoryOpen, |event| {
        if let IdbEvent::IdbFactoryOpen(event) = event {
            event.data.name = format!("a.example@{}", event.data.name);
        }
        Ok(())
    });
    context.idb().on(IdbEventKind::IdbFactoryName, |event| {
        if let IdbEvent::IdbFactoryName(event) = event {
            if let Some(name) = event.data.value.strip_prefix("a.example@") {
                event.data.value = name.to_string();
            }
        }
        Ok(())
    });

    let surface = context.idb().surface().expect("idb surface");
    let request = surface
        .open
        .call(
            &Receiver::new("IDBFactory", ()),
            IdbOpen {
                name: "notes".to_string(),
                version: Some(3),
            },
        )
        .expect("indexedDB.open");
    assert!(request.instance_of("IDBOpenDBRequest"));
    let database = Receiver::new("IDBDatabase", ());
    assert_eq!(surface.name.get(&database).expect("name"), "notes");
    assert_eq!(calls.take(), vec!["open a.example@notes v3"]);
}

#[test]
fn test_element_attributes_and_url_properties_are_rewritten() {
    let window = common::window();
    let calls = window.calls.clone();
    let context = Context::new(window.binding, ContextConfig::default());
    assert!(context.element().arm_attributes());
    assert!(context.element().arm_html());
    assert!(context.element().arm_url_properties());

    context
        .element()
        .on(ElementEventKind::SetAttribute, |event| {
            if let ElementEvent::SetAttribute(event) = event {
                if event.data.name == "src" {
                    event.data.value = proxied(&event.data.value);
                }
            }
            Ok(())
        });
    context
        .element()
        .on(ElementEventKind::GetAttribute, |event| {
            if let ElementEvent::GetAttribute(event) = event {
                if event.data.name == "integrity" {
                    event.respond_with(None);
                }
            }
            Ok(())
        });
    context
        .element()
        .on(ElementEventKind::SetInnerHtml, |event| {
            if let ElementEvent::SetInnerHtml(event) = event {
                event.data.value = event
                    .data
                    .value
                    .replace("href=\"https://", "href=\"/service/https://");
            }
            Ok(())
        });
    context.element().on(ElementEventKind::SetProperty, |event| {
        if let ElementEvent::SetProperty(event) = event {
            assert_eq!(
                (event.data.element, event.data.property),
                ("HTMLScriptElement", "src")
            );
            event.data.value = proxied(&event.data.value);
        }
        Ok(())
    });
    context.element().on(ElementEventKind::GetProperty, |event| {
        if let ElementEvent::GetProperty(event) = event {
            event.data.value = unproxied(&event.data.value);
        }
        Ok(())
    });

    let surface = context.element().surface().expect("element surface");
    let script = Receiver::new("HTMLScriptElement", ());
    surface
        .set_attribute
        .call(
            &script,
            AttributeWrite {
                name: "src".to_string(),
                value: "https://a.example/s.js".to_string(),
            },
        )
        .expect("setAttribute");
    let integrity = surface
        .get_attribute
        .call(
            &script,
            AttributeName {
                name: "integrity".to_string(),
            },
        )
        .expect("getAttribute");
    assert_eq!(integrity, None);
    surface
        .inner_html
        .set(&script, "<a href=\"https://a.example/\">a</a>".to_string())
        .expect("innerHTML=");

    let src = &surface.url_properties[0].slot;
    src.set(&script, "https://b.example/x.js".to_string())
        .expect("src=");
    assert_eq!(src.get(&script).expect("src"), "https://b.example/x.js");
    assert_eq!(
        src.get_native(&script).expect("native src"),
        "/service/https://b.example/x.js"
    );
    assert_eq!(
        calls.take(),
        vec![
            "setAttribute src=/service/https://a.example/s.js",
            "innerHTML=<a href=\"/service/https://a.example/\">a</a>",
            "script.src=/service/https://b.example/x.js",
        ]
    );
}
