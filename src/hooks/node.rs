//! Tree nodes: text content, insertion and tree navigation.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{intercept_accessor, intercept_getter, intercept_method, variant, HookCore, HookModule};
use crate::engine::{AccessorSlot, MethodSlot};
use crate::event::{HookEvent, Observed};
use crate::host::{HostBinding, Receiver};
use crate::realm::Realm;

/// One argument of `append`: a node or a string turned into a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOrText {
    Node(Receiver),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeList {
    pub nodes: Vec<NodeOrText>,
}

/// Argument of `appendChild`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildNode {
    pub node: Receiver,
}

pub struct NodeSurface {
    pub text_content: AccessorSlot<String>,
    pub append: MethodSlot<NodeList, ()>,
    pub append_child: MethodSlot<ChildNode, Receiver>,
    pub base_uri: AccessorSlot<String>,
    pub parent_node: AccessorSlot<Option<Receiver>>,
    pub parent_element: AccessorSlot<Option<Receiver>>,
    pub owner_document: AccessorSlot<Option<Receiver>>,
}

impl NodeSurface {
    pub fn new() -> Self {
        Self {
            text_content: AccessorSlot::new("Node.textContent"),
            append: MethodSlot::new("Node.append"),
            append_child: MethodSlot::new("Node.appendChild"),
            base_uri: AccessorSlot::new("Node.baseURI"),
            parent_node: AccessorSlot::new("Node.parentNode"),
            parent_element: AccessorSlot::new("Node.parentElement"),
            owner_document: AccessorSlot::new("Node.ownerDocument"),
        }
    }
}

impl Default for NodeSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum NodeEvent: NodeEventKind {
        GetTextContent(HookEvent<Observed<String>, String>) => "getTextContent",
        SetTextContent(HookEvent<Observed<String>, ()>) => "setTextContent",
        Append(HookEvent<NodeList, ()>) => "append",
        AppendChild(HookEvent<ChildNode, Receiver>) => "appendChild",
        BaseUri(HookEvent<Observed<String>, String>) => "baseURI",
        ParentNode(HookEvent<Observed<Option<Receiver>>, Option<Receiver>>) => "parentNode",
        ParentElement(HookEvent<Observed<Option<Receiver>>, Option<Receiver>>) => "parentElement",
        OwnerDocument(HookEvent<Observed<Option<Receiver>>, Option<Receiver>>) => "ownerDocument",
    }
}

pub struct NodeHook {
    core: HookCore<NodeSurface, NodeEvent>,
}

impl NodeHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("node", host.node.clone(), realm),
        }
    }

    pub fn arm_text_content(&self) -> bool {
        self.core.arm("textContent", |surface, events| {
            intercept_accessor(
                &surface.text_content,
                events,
                variant!(NodeEvent::GetTextContent),
                variant!(NodeEvent::SetTextContent),
            )
        })
    }

    pub fn arm_append(&self) -> bool {
        self.core.arm("append", |surface, events| {
            let append = intercept_method(&surface.append, events, variant!(NodeEvent::Append));
            let child = intercept_method(
                &surface.append_child,
                events,
                variant!(NodeEvent::AppendChild),
            );
            append | child
        })
    }

    pub fn arm_base_uri(&self) -> bool {
        self.core.arm("baseURI", |surface, events| {
            intercept_getter(&surface.base_uri, events, variant!(NodeEvent::BaseUri))
        })
    }

    /// `parentNode`, `parentElement` and `ownerDocument`.
    pub fn arm_relations(&self) -> bool {
        self.core.arm("relations", |surface, events| {
            let node =
                intercept_getter(&surface.parent_node, events, variant!(NodeEvent::ParentNode));
            let element = intercept_getter(
                &surface.parent_element,
                events,
                variant!(NodeEvent::ParentElement),
            );
            let document = intercept_getter(
                &surface.owner_document,
                events,
                variant!(NodeEvent::OwnerDocument),
            );
            node | element | document
        })
    }

    pub fn surface(&self) -> Option<&Rc<NodeSurface>> {
        self.core.surface()
    }
}

impl HookModule for NodeHook {
    type Event = NodeEvent;

    fn name(&self) -> &'static str {
        "node"
    }

    fn emitter(&self) -> &Emitter<NodeEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_text_content() | self.arm_append() | self.arm_base_uri() | self.arm_relations()
    }
}
