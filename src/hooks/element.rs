//! Element attributes, markup, adjacent insertion, per-type URL properties
//! and the `Audio` constructor.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{
    dispatch, intercept_accessor, intercept_method, variant, HookCore, HookModule, Selectors,
};
use crate::engine::{override_accessor, AccessorHooks, AccessorSlot, MethodSlot, NativeFn};
use crate::event::{HookEvent, Observed};
use crate::host::{HostBinding, Receiver};
use crate::realm::Realm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeWrite {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacentHtml {
    pub position: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacentText {
    pub position: String,
    pub text: String,
}

/// Arguments of `new Audio(url)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioSource {
    pub url: Option<String>,
}

/// A URL-carrying property of one element type, e.g. `HTMLScriptElement.src`.
pub struct UrlProperty {
    pub element: &'static str,
    pub property: &'static str,
    pub slot: AccessorSlot<String>,
}

impl UrlProperty {
    pub fn new(element: &'static str, property: &'static str, slot: AccessorSlot<String>) -> Self {
        Self {
            element,
            property,
            slot,
        }
    }
}

/// Data of a URL property access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue {
    pub element: &'static str,
    pub property: &'static str,
    pub value: String,
}

pub struct ElementSurface {
    pub get_attribute: MethodSlot<AttributeName, Option<String>>,
    pub set_attribute: MethodSlot<AttributeWrite, ()>,
    pub has_attribute: MethodSlot<AttributeName, bool>,
    pub remove_attribute: MethodSlot<AttributeName, ()>,
    pub query_selector: MethodSlot<Selectors, Option<Receiver>>,
    pub inner_html: AccessorSlot<String>,
    pub outer_html: AccessorSlot<String>,
    pub insert_adjacent_html: MethodSlot<AdjacentHtml, ()>,
    pub insert_adjacent_text: MethodSlot<AdjacentText, ()>,
    pub url_properties: Vec<UrlProperty>,
    pub audio: MethodSlot<AudioSource, Receiver>,
}

impl ElementSurface {
    pub fn new() -> Self {
        Self {
            get_attribute: MethodSlot::new("Element.getAttribute"),
            set_attribute: MethodSlot::new("Element.setAttribute"),
            has_attribute: MethodSlot::new("Element.hasAttribute"),
            remove_attribute: MethodSlot::new("Element.removeAttribute"),
            query_selector: MethodSlot::new("Element.querySelector"),
            inner_html: AccessorSlot::new("Element.innerHTML"),
            outer_html: AccessorSlot::new("Element.outerHTML"),
            insert_adjacent_html: MethodSlot::new("Element.insertAdjacentHTML"),
            insert_adjacent_text: MethodSlot::new("Element.insertAdjacentText"),
            url_properties: Vec::new(),
            audio: MethodSlot::new("Audio"),
        }
    }

    pub fn url_property(&self, element: &str, property: &str) -> Option<&AccessorSlot<String>> {
        self.url_properties
            .iter()
            .find(|entry| entry.element == element && entry.property == property)
            .map(|entry| &entry.slot)
    }
}

impl Default for ElementSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum ElementEvent: ElementEventKind {
        GetAttribute(HookEvent<AttributeName, Option<String>>) => "getAttribute",
        SetAttribute(HookEvent<AttributeWrite, ()>) => "setAttribute",
        HasAttribute(HookEvent<AttributeName, bool>) => "hasAttribute",
        RemoveAttribute(HookEvent<AttributeName, ()>) => "removeAttribute",
        QuerySelector(HookEvent<Selectors, Option<Receiver>>) => "querySelector",
        GetInnerHtml(HookEvent<Observed<String>, String>) => "getInnerHTML",
        SetInnerHtml(HookEvent<Observed<String>, ()>) => "setInnerHTML",
        GetOuterHtml(HookEvent<Observed<String>, String>) => "getOuterHTML",
        SetOuterHtml(HookEvent<Observed<String>, ()>) => "setOuterHTML",
        InsertAdjacentHtml(HookEvent<AdjacentHtml, ()>) => "insertAdjacentHTML",
        InsertAdjacentText(HookEvent<AdjacentText, ()>) => "insertAdjacentText",
        GetProperty(HookEvent<PropertyValue, String>) => "getProperty",
        SetProperty(HookEvent<PropertyValue, ()>) => "setProperty",
        Audio(HookEvent<AudioSource, Receiver>) => "audio",
    }
}

pub struct ElementHook {
    core: HookCore<ElementSurface, ElementEvent>,
}

impl ElementHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("element", host.element.clone(), realm),
        }
    }

    /// `getAttribute`, `setAttribute`, `hasAttribute` and `removeAttribute`.
    pub fn arm_attributes(&self) -> bool {
        self.core.arm("attributes", |surface, events| {
            let get = intercept_method(
                &surface.get_attribute,
                events,
                variant!(ElementEvent::GetAttribute),
            );
            let set = intercept_method(
                &surface.set_attribute,
                events,
                variant!(ElementEvent::SetAttribute),
            );
            let has = intercept_method(
                &surface.has_attribute,
                events,
                variant!(ElementEvent::HasAttribute),
            );
            let remove = intercept_method(
                &surface.remove_attribute,
                events,
                variant!(ElementEvent::RemoveAttribute),
            );
            get | set | has | remove
        })
    }

    pub fn arm_query_selector(&self) -> bool {
        self.core.arm("querySelector", |surface, events| {
            intercept_method(
                &surface.query_selector,
                events,
                variant!(ElementEvent::QuerySelector),
            )
        })
    }

    /// Inner and outer markup, both directions.
    pub fn arm_html(&self) -> bool {
        self.core.arm("html", |surface, events| {
            let inner = intercept_accessor(
                &surface.inner_html,
                events,
                variant!(ElementEvent::GetInnerHtml),
                variant!(ElementEvent::SetInnerHtml),
            );
            let outer = intercept_accessor(
                &surface.outer_html,
                events,
                variant!(ElementEvent::GetOuterHtml),
                variant!(ElementEvent::SetOuterHtml),
            );
            inner | outer
        })
    }

    pub fn arm_insert_adjacent(&self) -> bool {
        self.core.arm("insertAdjacent", |surface, events| {
            let html = intercept_method(
                &surface.insert_adjacent_html,
                events,
                variant!(ElementEvent::InsertAdjacentHtml),
            );
            let text = intercept_method(
                &surface.insert_adjacent_text,
                events,
                variant!(ElementEvent::InsertAdjacentText),
            );
            html | text
        })
    }

    /// Every registered URL property; reads emit `getProperty` and writes
    /// emit `setProperty`, tagged with the element type and property name.
    pub fn arm_url_properties(&self) -> bool {
        self.core.arm("urlProperties", |surface, events| {
            let mut installed = false;
            for entry in &surface.url_properties {
                let (element, property) = (entry.element, entry.property);
                let read_events = Rc::clone(events);
                let write_events = Rc::clone(events);
                let hooks = AccessorHooks::new()
                    .get(move |original, that| {
                        let get = Rc::clone(original);
                        let target: NativeFn<PropertyValue, String> =
                            Rc::new(move |that: &Receiver, _: PropertyValue| get(that));
                        let data = PropertyValue {
                            element,
                            property,
                            value: original(that)?,
                        };
                        let event = HookEvent::targeted(data, that.clone(), target);
                        let event =
                            dispatch(&read_events, variant!(ElementEvent::GetProperty), event)?;
                        event.finish(|data| Ok(data.value))
                    })
                    .set(move |original, that, value| {
                        let set = Rc::clone(original);
                        let target: NativeFn<PropertyValue, ()> =
                            Rc::new(move |that: &Receiver, data: PropertyValue| {
                                set(that, data.value)
                            });
                        let data = PropertyValue {
                            element,
                            property,
                            value,
                        };
                        let event = HookEvent::targeted(data, that.clone(), target);
                        let event =
                            dispatch(&write_events, variant!(ElementEvent::SetProperty), event)?;
                        event.finish(|data| original(that, data.value))
                    });
                installed |= override_accessor(&entry.slot, hooks);
            }
            installed
        })
    }

    /// The `Audio` constructor; the built element keeps its host brand.
    pub fn arm_audio(&self) -> bool {
        self.core.arm("Audio", |surface, events| {
            intercept_method(&surface.audio, events, variant!(ElementEvent::Audio))
        })
    }

    pub fn surface(&self) -> Option<&Rc<ElementSurface>> {
        self.core.surface()
    }
}

impl HookModule for ElementHook {
    type Event = ElementEvent;

    fn name(&self) -> &'static str {
        "element"
    }

    fn emitter(&self) -> &Emitter<ElementEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_attributes()
            | self.arm_query_selector()
            | self.arm_html()
            | self.arm_insert_adjacent()
            | self.arm_url_properties()
            | self.arm_audio()
    }
}
