//! Document content: title, cookie, referrer, domain, document addresses,
//! markup writes, selector queries, tree walkers and markup parsing.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{intercept_accessor, intercept_getter, intercept_method, variant, HookCore, HookModule};
use crate::engine::{AccessorSlot, MethodSlot};
use crate::event::{HookEvent, Observed};
use crate::host::{HostBinding, Receiver};
use crate::realm::Realm;

/// Arguments of `document.write` / `document.writeln`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Markup {
    pub html: Vec<String>,
}

/// Arguments of a selector query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub selectors: String,
}

/// Arguments of `document.createTreeWalker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeWalkerInit {
    pub root: Receiver,
    /// Node filter bitmask.
    pub show: u32,
    pub filter: Option<Receiver>,
    pub expand_entity_references: bool,
}

impl TreeWalkerInit {
    /// Every node type.
    pub const SHOW_ALL: u32 = 0xFFFF_FFFF;

    /// `createTreeWalker(root)`: every node type, no filter.
    pub fn new(root: Receiver) -> Self {
        Self {
            root,
            show: Self::SHOW_ALL,
            filter: None,
            expand_entity_references: false,
        }
    }
}

/// Arguments of `DOMParser.parseFromString`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSource {
    pub string: String,
    pub mime_type: String,
}

pub struct DocumentSurface {
    pub title: AccessorSlot<String>,
    pub cookie: AccessorSlot<String>,
    pub referrer: AccessorSlot<String>,
    pub domain: AccessorSlot<String>,
    pub document_uri: AccessorSlot<String>,
    pub url: AccessorSlot<String>,
    pub write: MethodSlot<Markup, ()>,
    pub writeln: MethodSlot<Markup, ()>,
    pub query_selector: MethodSlot<Selectors, Option<Receiver>>,
    pub create_tree_walker: MethodSlot<TreeWalkerInit, Receiver>,
    pub parse_from_string: MethodSlot<ParseSource, Receiver>,
}

impl DocumentSurface {
    pub fn new() -> Self {
        Self {
            title: AccessorSlot::new("Document.title"),
            cookie: AccessorSlot::new("Document.cookie"),
            referrer: AccessorSlot::new("Document.referrer"),
            domain: AccessorSlot::new("Document.domain"),
            document_uri: AccessorSlot::new("Document.documentURI"),
            url: AccessorSlot::new("Document.URL"),
            write: MethodSlot::new("Document.write"),
            writeln: MethodSlot::new("Document.writeln"),
            query_selector: MethodSlot::new("Document.querySelector"),
            create_tree_walker: MethodSlot::new("Document.createTreeWalker"),
            parse_from_string: MethodSlot::new("DOMParser.parseFromString"),
        }
    }
}

impl Default for DocumentSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum DocumentEvent: DocumentEventKind {
        GetTitle(HookEvent<Observed<String>, String>) => "getTitle",
        SetTitle(HookEvent<Observed<String>, ()>) => "setTitle",
        GetCookie(HookEvent<Observed<String>, String>) => "getCookie",
        SetCookie(HookEvent<Observed<String>, ()>) => "setCookie",
        Referrer(HookEvent<Observed<String>, String>) => "referrer",
        GetDomain(HookEvent<Observed<String>, String>) => "getDomain",
        SetDomain(HookEvent<Observed<String>, ()>) => "setDomain",
        DocumentUri(HookEvent<Observed<String>, String>) => "documentURI",
        Url(HookEvent<Observed<String>, String>) => "url",
        Write(HookEvent<Markup, ()>) => "write",
        Writeln(HookEvent<Markup, ()>) => "writeln",
        QuerySelector(HookEvent<Selectors, Option<Receiver>>) => "querySelector",
        CreateTreeWalker(HookEvent<TreeWalkerInit, Receiver>) => "createTreeWalker",
        ParseFromString(HookEvent<ParseSource, Receiver>) => "parseFromString",
    }
}

pub struct DocumentHook {
    core: HookCore<DocumentSurface, DocumentEvent>,
}

impl DocumentHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("document", host.document.clone(), realm),
        }
    }

    pub fn arm_title(&self) -> bool {
        self.core.arm("title", |surface, events| {
            intercept_accessor(
                &surface.title,
                events,
                variant!(DocumentEvent::GetTitle),
                variant!(DocumentEvent::SetTitle),
            )
        })
    }

    pub fn arm_cookie(&self) -> bool {
        self.core.arm("cookie", |surface, events| {
            intercept_accessor(
                &surface.cookie,
                events,
                variant!(DocumentEvent::GetCookie),
                variant!(DocumentEvent::SetCookie),
            )
        })
    }

    pub fn arm_referrer(&self) -> bool {
        self.core.arm("referrer", |surface, events| {
            intercept_getter(&surface.referrer, events, variant!(DocumentEvent::Referrer))
        })
    }

    pub fn arm_domain(&self) -> bool {
        self.core.arm("domain", |surface, events| {
            intercept_accessor(
                &surface.domain,
                events,
                variant!(DocumentEvent::GetDomain),
                variant!(DocumentEvent::SetDomain),
            )
        })
    }

    pub fn arm_document_uri(&self) -> bool {
        self.core.arm("documentURI", |surface, events| {
            intercept_getter(
                &surface.document_uri,
                events,
                variant!(DocumentEvent::DocumentUri),
            )
        })
    }

    pub fn arm_url(&self) -> bool {
        self.core.arm("URL", |surface, events| {
            intercept_getter(&surface.url, events, variant!(DocumentEvent::Url))
        })
    }

    /// `write` and `writeln`; listeners can rewrite the markup before it is
    /// inserted.
    pub fn arm_write(&self) -> bool {
        self.core.arm("write", |surface, events| {
            let write = intercept_method(&surface.write, events, variant!(DocumentEvent::Write));
            let writeln =
                intercept_method(&surface.writeln, events, variant!(DocumentEvent::Writeln));
            write | writeln
        })
    }

    pub fn arm_query_selector(&self) -> bool {
        self.core.arm("querySelector", |surface, events| {
            intercept_method(
                &surface.query_selector,
                events,
                variant!(DocumentEvent::QuerySelector),
            )
        })
    }

    /// `createTreeWalker`; listeners can swap the root or the filter.
    pub fn arm_create_tree_walker(&self) -> bool {
        self.core.arm("createTreeWalker", |surface, events| {
            intercept_method(
                &surface.create_tree_walker,
                events,
                variant!(DocumentEvent::CreateTreeWalker),
            )
        })
    }

    pub fn arm_parse_from_string(&self) -> bool {
        self.core.arm("parseFromString", |surface, events| {
            intercept_method(
                &surface.parse_from_string,
                events,
                variant!(DocumentEvent::ParseFromString),
            )
        })
    }

    pub fn surface(&self) -> Option<&Rc<DocumentSurface>> {
        self.core.surface()
    }
}

impl HookModule for DocumentHook {
    type Event = DocumentEvent;

    fn name(&self) -> &'static str {
        "document"
    }

    fn emitter(&self) -> &Emitter<DocumentEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_title()
            | self.arm_cookie()
            | self.arm_referrer()
            | self.arm_domain()
            | self.arm_document_uri()
            | self.arm_url()
            | self.arm_write()
            | self.arm_query_selector()
            | self.arm_create_tree_walker()
            | self.arm_parse_from_string()
    }
}
