//! # mirage-core
//!
//! Mirror model over the values of a suspended debuggee.
//!
//! This crate turns raw values living inside an execution engine into stable,
//! introspectable snapshots ("mirrors") that the protocol layer can serialize:
//! - Primitive and object mirrors (objects, arrays, dates, functions, regexps, errors)
//! - Property and accessor mirrors with the engine's raw descriptor bits
//! - Stack frame mirrors scoped to one break episode
//! - Script descriptors with position to line/column resolution
//!
//! ## Engine boundary
//!
//! Nothing in here talks to a real VM directly. Every fact about the
//! debuggee comes through the [`Debuggee`] trait, and frame queries carry the
//! [`BreakId`] they were created under so the engine can reject them after
//! execution has moved on. [`HeapSnapshot`] is an in-memory engine used by
//! the tests and the CLI demo.

pub mod debuggee;
pub mod details;
pub mod error;
pub mod mirror;
pub mod prelude;
pub mod script;
pub mod snapshot;
pub mod text;
pub mod value;

pub use debuggee::Debuggee;
// Re-export commonly used types
pub use error::{MirrorError, MirrorResult};
pub use mirror::{mirror_for, ExecutionState, FrameMirror, Mirror, MirrorType};
pub use script::Script;
pub use snapshot::HeapSnapshot;
pub use value::{BreakId, HostValue, ObjectRef};
