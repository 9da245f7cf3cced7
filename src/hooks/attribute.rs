//! Attribute nodes and the named attribute map.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{dispatch, intercept_getter, intercept_method, variant, HookCore, HookModule};
use crate::engine::{override_accessor, AccessorHooks, AccessorSlot, MethodSlot, NativeFn};
use crate::event::{HookEvent, Observed};
use crate::host::{HostBinding, Receiver};
use crate::realm::Realm;

/// Data of an attribute value access: the attribute's name and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    pub name: String,
    pub value: String,
}

/// A possibly namespaced attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub name: String,
    pub namespace: Option<String>,
}

impl QualifiedName {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }
}

/// Argument of `setNamedItem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedItem {
    pub attr: Receiver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemIndex {
    pub index: u32,
}

pub struct AttributeSurface {
    pub name: AccessorSlot<String>,
    pub value: AccessorSlot<String>,
    pub get_named_item: MethodSlot<QualifiedName, Option<Receiver>>,
    pub set_named_item: MethodSlot<NamedItem, Option<Receiver>>,
    pub remove_named_item: MethodSlot<QualifiedName, Receiver>,
    pub item: MethodSlot<ItemIndex, Option<Receiver>>,
}

impl AttributeSurface {
    pub fn new() -> Self {
        Self {
            name: AccessorSlot::new("Attr.name"),
            value: AccessorSlot::new("Attr.value"),
            get_named_item: MethodSlot::new("NamedNodeMap.getNamedItem"),
            set_named_item: MethodSlot::new("NamedNodeMap.setNamedItem"),
            remove_named_item: MethodSlot::new("NamedNodeMap.removeNamedItem"),
            item: MethodSlot::new("NamedNodeMap.item"),
        }
    }
}

impl Default for AttributeSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum AttributeEvent: AttributeEventKind {
        Name(HookEvent<Observed<String>, String>) => "name",
        GetValue(HookEvent<AttributeValue, String>) => "getValue",
        SetValue(HookEvent<AttributeValue, ()>) => "setValue",
        GetNamedItem(HookEvent<QualifiedName, Option<Receiver>>) => "getNamedItem",
        SetNamedItem(HookEvent<NamedItem, Option<Receiver>>) => "setNamedItem",
        RemoveNamedItem(HookEvent<QualifiedName, Receiver>) => "removeNamedItem",
        Item(HookEvent<ItemIndex, Option<Receiver>>) => "item",
    }
}

pub struct AttributeHook {
    core: HookCore<AttributeSurface, AttributeEvent>,
}

impl AttributeHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("attribute", host.attribute.clone(), realm),
        }
    }

    pub fn arm_name(&self) -> bool {
        self.core.arm("name", |surface, events| {
            intercept_getter(&surface.name, events, variant!(AttributeEvent::Name))
        })
    }

    /// `value` in both directions. The event carries the attribute's name,
    /// read through the native `name` getter.
    pub fn arm_value(&self) -> bool {
        self.core.arm("value", |surface, events| {
            let read_surface = Rc::clone(surface);
            let write_surface = Rc::clone(surface);
            let read_events = Rc::clone(events);
            let write_events = Rc::clone(events);
            let hooks = AccessorHooks::new()
                .get(move |original, that| {
                    let get = Rc::clone(original);
                    let target: NativeFn<AttributeValue, String> =
                        Rc::new(move |that: &Receiver, _: AttributeValue| get(that));
                    let data = AttributeValue {
                        name: read_surface.name.get_native(that)?,
                        value: original(that)?,
                    };
                    let event = HookEvent::targeted(data, that.clone(), target);
                    let event = dispatch(&read_events, variant!(AttributeEvent::GetValue), event)?;
                    event.finish(|data| Ok(data.value))
                })
                .set(move |original, that, value| {
                    let set = Rc::clone(original);
                    let target: NativeFn<AttributeValue, ()> =
                        Rc::new(move |that: &Receiver, data: AttributeValue| set(that, data.value));
                    let data = AttributeValue {
                        name: write_surface.name.get_native(that)?,
                        value,
                    };
                    let event = HookEvent::targeted(data, that.clone(), target);
                    let event = dispatch(&write_events, variant!(AttributeEvent::SetValue), event)?;
                    event.finish(|data| original(that, data.value))
                });
            override_accessor(&surface.value, hooks)
        })
    }

    /// The named map: `getNamedItem`, `setNamedItem`, `removeNamedItem` and
    /// `item`.
    pub fn arm_named_map(&self) -> bool {
        self.core.arm("namedMap", |surface, events| {
            let get = intercept_method(
                &surface.get_named_item,
                events,
                variant!(AttributeEvent::GetNamedItem),
            );
            let set = intercept_method(
                &surface.set_named_item,
                events,
                variant!(AttributeEvent::SetNamedItem),
            );
            let remove = intercept_method(
                &surface.remove_named_item,
                events,
                variant!(AttributeEvent::RemoveNamedItem),
            );
            let item = intercept_method(&surface.item, events, variant!(AttributeEvent::Item));
            get | set | remove | item
        })
    }

    pub fn surface(&self) -> Option<&Rc<AttributeSurface>> {
        self.core.surface()
    }
}

impl HookModule for AttributeHook {
    type Event = AttributeEvent;

    fn name(&self) -> &'static str {
        "attribute"
    }

    fn emitter(&self) -> &Emitter<AttributeEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_name() | self.arm_value() | self.arm_named_map()
    }
}
