//! Emulation Layer
//!
//! Substitute implementations of compound host objects. An emulated object
//! presents the same contract as the real one (the [`Location`] and
//! [`Storage`] traits) and carries the real brand on its receiver, but its
//! state is a virtualised view over a backing object.

mod location;
mod storage;

pub use location::{
    AddressRewrite, EmulatedLocation, Location, LocationField, LocationMap, LocationParts,
};
pub use storage::{EmulatedStorage, Shadow, Storage, StorageArea};
