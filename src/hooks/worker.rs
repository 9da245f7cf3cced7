//! Workers and worklets: construction, module loading, messaging and script
//! imports.

use std::rc::Rc;

use veneer_events::{events, Emitter};

use super::{intercept_method, variant, HookCore, HookModule};
use crate::engine::MethodSlot;
use crate::event::HookEvent;
use crate::host::{HostBinding, HostValue, Receiver};
use crate::realm::Realm;

/// Arguments of `new Worker(url, options)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSpawn {
    pub url: String,
    pub options: HostValue,
}

/// Arguments of `Worklet.addModule(url, options)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleImport {
    pub url: String,
    pub options: HostValue,
}

/// Arguments of `Worker.postMessage(message, transfer)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerMessage {
    pub message: HostValue,
    pub transfer: Vec<Receiver>,
}

/// Arguments of `importScripts(...scripts)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptImports {
    pub scripts: Vec<String>,
}

pub struct WorkerSurface {
    pub construct: MethodSlot<WorkerSpawn, Receiver>,
    pub add_module: MethodSlot<ModuleImport, ()>,
    pub post_message: MethodSlot<WorkerMessage, ()>,
    /// `importScripts` on a worker's global object.
    pub import_scripts: MethodSlot<ScriptImports, ()>,
}

impl WorkerSurface {
    pub fn new() -> Self {
        Self {
            construct: MethodSlot::new("Worker"),
            add_module: MethodSlot::new("Worklet.addModule"),
            post_message: MethodSlot::new("Worker.postMessage"),
            import_scripts: MethodSlot::new("importScripts"),
        }
    }
}

impl Default for WorkerSurface {
    fn default() -> Self {
        Self::new()
    }
}

events! {
    pub enum WorkerEvent: WorkerEventKind {
        Worker(HookEvent<WorkerSpawn, Receiver>) => "worker",
        AddModule(HookEvent<ModuleImport, ()>) => "addModule",
        PostMessage(HookEvent<WorkerMessage, ()>) => "postMessage",
        ImportScripts(HookEvent<ScriptImports, ()>) => "importScripts",
    }
}

pub struct WorkerHook {
    core: HookCore<WorkerSurface, WorkerEvent>,
}

impl WorkerHook {
    pub fn new(host: &HostBinding, realm: &Realm) -> Self {
        Self {
            core: HookCore::new("worker", host.worker.clone(), realm),
        }
    }

    pub fn arm_worker(&self) -> bool {
        self.core.arm("Worker", |surface, events| {
            intercept_method(&surface.construct, events, variant!(WorkerEvent::Worker))
        })
    }

    pub fn arm_add_module(&self) -> bool {
        self.core.arm("addModule", |surface, events| {
            intercept_method(&surface.add_module, events, variant!(WorkerEvent::AddModule))
        })
    }

    pub fn arm_post_message(&self) -> bool {
        self.core.arm("postMessage", |surface, events| {
            intercept_method(
                &surface.post_message,
                events,
                variant!(WorkerEvent::PostMessage),
            )
        })
    }

    pub fn arm_import_scripts(&self) -> bool {
        self.core.arm("importScripts", |surface, events| {
            intercept_method(
                &surface.import_scripts,
                events,
                variant!(WorkerEvent::ImportScripts),
            )
        })
    }

    pub fn surface(&self) -> Option<&Rc<WorkerSurface>> {
        self.core.surface()
    }
}

impl HookModule for WorkerHook {
    type Event = WorkerEvent;

    fn name(&self) -> &'static str {
        "worker"
    }

    fn emitter(&self) -> &Emitter<WorkerEvent> {
        self.core.events()
    }

    fn arm(&self) -> bool {
        self.arm_worker()
            | self.arm_add_module()
            | self.arm_post_message()
            | self.arm_import_scripts()
    }
}
