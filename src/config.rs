//! Realm configuration.

use serde::{Deserialize, Serialize};
use veneer_events::DEFAULT_MAX_LISTENERS;

/// Which kind of realm a context instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealmMode {
    /// A page realm: `postMessage` takes an explicit target origin.
    #[default]
    Window,
    /// A worker realm: `postMessage` omits the target origin.
    Worker,
}

impl RealmMode {
    pub fn is_worker(self) -> bool {
        matches!(self, RealmMode::Worker)
    }
}

/// Settings applied when a [`Context`](crate::Context) is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub mode: RealmMode,
    /// Leak-warning threshold for every hook module's emitter (0 disables it).
    pub max_listeners: usize,
    /// Arm every hook module as soon as the context is built.
    pub arm_on_start: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            mode: RealmMode::Window,
            max_listeners: DEFAULT_MAX_LISTENERS,
            arm_on_start: false,
        }
    }
}

impl ContextConfig {
    pub fn worker() -> Self {
        Self {
            mode: RealmMode::Worker,
            ..Self::default()
        }
    }

    /// Parse a configuration document; absent fields keep their defaults.
    pub fn from_json(src: &str) -> serde_json::Result<Self> {
        serde_json::from_str(src)
    }
}
