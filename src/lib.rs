//! Veneer: interception and virtualization of a realm's native surfaces
//!
//! Veneer wraps the entry points a host realm exposes (navigation, storage,
//! network requests, messaging, document and element APIs, reflection) so
//! that every call is first offered to policy listeners as an interception
//! event. Listeners may observe a call, rewrite its arguments or replace its
//! result. Compound objects such as the location and key-value stores can be
//! replaced outright by emulated objects that look native to host code.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               Context                   │
//! │                                         │
//! │  hooks     - one module per API surface │
//! │  emulation - location, storage          │
//! │  event     - interception events        │
//! │  engine    - slot overrides             │
//! │  realm     - mode, transport, wrap      │
//! │                                         │
//! ├─────────────────────────────────────────┤
//! │     veneer-events (typed emitter)       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let context = Context::new(host, ContextConfig::default());
//! context.history().on(HistoryEventKind::PushState, |event| {
//!     if let HistoryEvent::PushState(event) = event {
//!         event.data.url = event.data.url.take().map(|url| rewrite(&url));
//!     }
//!     Ok(())
//! });
//! context.history().arm();
//! ```

pub mod address;
pub mod config;
pub mod context;
pub mod emulation;
pub mod engine;
pub mod error;
pub mod event;
pub mod hooks;
pub mod host;
pub mod realm;

pub use address::{Address, AddressError};
pub use config::{ContextConfig, RealmMode};
pub use context::{Context, ContextBuilder, NativeMethods};
pub use emulation::{EmulatedLocation, EmulatedStorage, Location, LocationField, Storage};
pub use engine::{
    override_accessor, override_method, AccessorSlot, ArmLedger, MethodSlot, SlotKind, Wrapped,
};
pub use error::{HookError, Result};
pub use event::{HookEvent, Observed, Outcome};
pub use hooks::HookModule;
pub use host::{HostBinding, HostValue, Receiver};
pub use realm::{ContextEvent, ContextEventKind, Realm, SlotWrapped, TransportClient};
pub use veneer_events::{EmitError, Emitter, ListenerId, ListenerResult};
