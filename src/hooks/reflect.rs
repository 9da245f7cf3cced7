//! Function construction and reflection.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{dispatch, intercept_method, variant, HookCore, HookModule};
use crate::engine::{override_method, MethodSlot, NativeFn};
use crate::event::HookEvent;
use crate::host::{HostBinding, HostValue, Receiver};
use crate::realm::Realm;

/// Arguments of `new Function(...args, script)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionSource {
    pub args: Vec<String>,
    pub script: String,
}

/// Data of `Function.prototype.toString`: the function being printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stringified {
    pub function: Receiver,
}

/// Data of `Object.getOwnPropertyNames`: the names the native produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OwnNames {
    pub names: Vec<String>,
}

/// Data of `Object.getOwnPropertyDescriptors`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OwnDescriptors {
    pub descriptors: HostValue,
}

pub struct ReflectSurface {
    pub function: MethodSlot<FunctionSource, Receiver>,
    /// Called with the function itself as the receiver.
    pub to_string: MethodSlot<(), String>,
    /// Called on the `Object` constructor with the inspected object.
    pub get_own_property_names: MethodSlot<Receiver, Vec<String>>,
    pub get_own_property_descriptors: MethodSlot<Receiver, HostValue>,
}

impl ReflectSurface {
    pub fn new() -> Self {
        Self {
            function: MethodSlot::new("Function"),
            to_string: MethodSlot::new("Function.prototype.toString"),
            get_own_property_names: MethodSlot::new("Object.getOwnPropertyNames"),
            get_own_property_descriptors: MethodSlot::new("Object.getOwnPropertyDescriptors"),
        }
    }
}

impl Default for ReflectSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum ReflectEvent: ReflectEventKind {
        Function(HookEvent<FunctionSource, Receiver>) => "function",
        ToString(HookEvent<Stringified, String>) => "toString",
        GetOwnPropertyNames(HookEvent<OwnNames, Vec<String>>) => "getOwnPropertyNames",
        GetOwnPropertyDescriptors(HookEvent<OwnDescriptors, HostValue>)
            => "getOwnPropertyDescriptors",
    }
}

pub struct ReflectHook {
    core: HookCore<ReflectSurface, ReflectEvent>,
}

impl ReflectHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("reflect", host.reflect.clone(), realm),
        }
    }

    pub fn arm_function(&self) -> bool {
        self.core.arm("Function", |surface, events| {
            intercept_method(&surface.function, events, variant!(ReflectEvent::Function))
        })
    }

    /// `toString`; listeners may swap the function whose source is printed.
    pub fn arm_to_string(&self) -> bool {
        self.core.arm("toString", |surface, events| {
            let events = Rc::clone(events);
            override_method(&surface.to_string, move |original, that, ()| {
                let print = Rc::clone(original);
                let target: NativeFn<Stringified, String> =
                    Rc::new(move |_: &Receiver, data: Stringified| print(&data.function, ()));
                let data = Stringified {
                    function: that.clone(),
                };
                let event = HookEvent::targeted(data, that.clone(), target);
                let event = dispatch(&events, variant!(ReflectEvent::ToString), event)?;
                event.finish(|data| original(&data.function, ()))
            })
        })
    }

    /// Property enumeration; the native runs first and listeners see (and
    /// may filter) its result.
    pub fn arm_own_properties(&self) -> bool {
        self.core.arm("ownProperties", |surface, events| {
            let names_events = Rc::clone(events);
            let names = override_method(
                &surface.get_own_property_names,
                move |original, that, object| {
                    let data = OwnNames {
                        names: original(that, object.clone())?,
                    };
                    let list = Rc::clone(original);
                    let target: NativeFn<OwnNames, Vec<String>> =
                        Rc::new(move |that: &Receiver, _: OwnNames| list(that, object.clone()));
                    let event = HookEvent::targeted(data, that.clone(), target);
                    let event = dispatch(
                        &names_events,
                        variant!(ReflectEvent::GetOwnPropertyNames),
                        event,
                    )?;
                    event.finish(|data| Ok(data.names))
                },
            );

            let descriptor_events = Rc::clone(events);
            let descriptors = override_method(
                &surface.get_own_property_descriptors,
                move |original, that, object| {
                    let data = OwnDescriptors {
                        descriptors: original(that, object.clone())?,
                    };
                    let describe = Rc::clone(original);
                    let target: NativeFn<OwnDescriptors, HostValue> =
                        Rc::new(move |that: &Receiver, _: OwnDescriptors| {
                            describe(that, object.clone())
                        });
                    let event = HookEvent::targeted(data, that.clone(), target);
                    let event = dispatch(
                        &descriptor_events,
                        variant!(ReflectEvent::GetOwnPropertyDescriptors),
                        event,
                    )?;
                    event.finish(|data| Ok(data.descriptors))
                },
            );
            names | descriptors
        })
    }

    pub fn surface(&self) -> Option<&Rc<ReflectSurface>> {
        self.core.surface()
    }
}

impl HookModule for ReflectHook {
    type Event = ReflectEvent;

    fn name(&self) -> &'static str {
        "reflect"
    }

    fn emitter(&self) -> &Emitter<ReflectEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_function() | self.arm_to_string() | self.arm_own_properties()
    }
}
