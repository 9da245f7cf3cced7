//! Inline style declarations.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{intercept_accessor, intercept_method, variant, HookCore, HookModule};
use crate::engine::{AccessorSlot, MethodSlot};
use crate::event::{HookEvent, Observed};
use crate::host::HostBinding;
use crate::realm::Realm;

/// Style properties that can carry a URL, as `(camelCase, dashed)` pairs.
pub const URL_PROPERTIES: [(&str, &str); 7] = [
    ("background", "background"),
    ("backgroundImage", "background-image"),
    ("borderImage", "border-image"),
    ("borderImageSource", "border-image-source"),
    ("listStyle", "list-style"),
    ("listStyleImage", "list-style-image"),
    ("cursor", "cursor"),
];

/// The dashed name of a URL-carrying property given in either spelling.
pub fn url_property(name: &str) -> Option<&'static str> {
    URL_PROPERTIES
        .iter()
        .find(|(camel, dashed)| *camel == name || *dashed == name)
        .map(|(_, dashed)| *dashed)
}

/// Argument of `getPropertyValue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleProperty {
    pub property: String,
}

/// Arguments of `setProperty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleWrite {
    pub property: String,
    pub value: String,
}

pub struct StyleSurface {
    pub get_property_value: MethodSlot<StyleProperty, String>,
    pub set_property: MethodSlot<StyleWrite, ()>,
    pub css_text: AccessorSlot<String>,
}

impl StyleSurface {
    pub fn new() -> Self {
        Self {
            get_property_value: MethodSlot::new("CSSStyleDeclaration.getPropertyValue"),
            set_property: MethodSlot::new("CSSStyleDeclaration.setProperty"),
            css_text: AccessorSlot::new("CSSStyleDeclaration.cssText"),
        }
    }
}

impl Default for StyleSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum StyleEvent: StyleEventKind {
        GetPropertyValue(HookEvent<StyleProperty, String>) => "getPropertyValue",
        SetProperty(HookEvent<StyleWrite, ()>) => "setProperty",
        GetCssText(HookEvent<Observed<String>, String>) => "getCssText",
        SetCssText(HookEvent<Observed<String>, ()>) => "setCssText",
    }
}

pub struct StyleHook {
    core: HookCore<StyleSurface, StyleEvent>,
}

impl StyleHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("style", host.style.clone(), realm),
        }
    }

    /// `getPropertyValue` and `setProperty`.
    pub fn arm_property(&self) -> bool {
        self.core.arm("property", |surface, events| {
            let get = intercept_method(
                &surface.get_property_value,
                events,
                variant!(StyleEvent::GetPropertyValue),
            );
            let set = intercept_method(
                &surface.set_property,
                events,
                variant!(StyleEvent::SetProperty),
            );
            get | set
        })
    }

    pub fn arm_css_text(&self) -> bool {
        self.core.arm("cssText", |surface, events| {
            intercept_accessor(
                &surface.css_text,
                events,
                variant!(StyleEvent::GetCssText),
                variant!(StyleEvent::SetCssText),
            )
        })
    }

    pub fn surface(&self) -> Option<&Rc<StyleSurface>> {
        self.core.surface()
    }
}

impl HookModule for StyleHook {
    type Event = StyleEvent;

    fn name(&self) -> &'static str {
        "style"
    }

    fn emitter(&self) -> &Emitter<StyleEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_property() | self.arm_css_text()
    }
}
