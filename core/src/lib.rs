//! Spyglass Core - In-process runtime object inspector
//!
//! This crate provides the host-agnostic core of the Spyglass inspector:
//! object graph discovery, metadata reading, value marshaling, selection
//! tracking, and the member read/write/invoke engine.
//!
//! # Architecture
//!
//! - [`Host`] - Trait implemented by each attached runtime; every method is
//!   a fault-isolation boundary
//! - [`Inspector`] - Facade owning the graph cache, selection, drafts, and
//!   the activity log
//! - [`GraphCache`] - Periodic snapshot of the host's instance graph
//! - [`Value`] - Tagged primitive union with type-driven parse/format rules

pub mod access;
pub mod cache;
pub mod config;
pub mod fake_host;
pub mod host;
pub mod inspector;
#[cfg(test)]
mod integration;
pub mod logbuf;
pub mod meta;
pub mod select;
pub mod value;

// Re-export the host boundary types
pub use host::{
    ArgSlot, ClassName, ClassRef, ComponentRef, FieldRef, Host, HostError, HostResult,
    InstanceRef, InvokeError, LoadMode, MethodRef, NodeRef, RawPtr, TypeRef, WellKnown,
};

// Re-export the inspector surface
pub use access::{AccessError, AccessState, FieldDisplay, FieldRow, MemberKey};
pub use cache::{GraphCache, InstanceEntry};
pub use config::Config;
pub use inspector::{Inspector, TransformEdit, MAX_LAYER};
pub use logbuf::{LogBuffer, LogLine, Severity};
pub use meta::{FieldDesc, MethodDesc, MethodFlags};
pub use select::Selection;
pub use value::{EditKind, ParseError, TypeCode, Value};
