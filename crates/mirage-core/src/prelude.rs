//! Common module for library exports

pub use crate::debuggee::{AccessorPair, Debuggee, Interceptors, ObjectShape, RawProperty, RegExpInfo};
pub use crate::details::{PropertyAttributes, PropertyDetails, PropertyKind, PropertyType, RawFrame};
pub use crate::error::{MirrorError, MirrorResult};
pub use crate::mirror::{
    mirror_for, AccessorMirror, ExecutionState, FrameMirror, FunctionMirror, Mirror, MirrorType, ObjectMirror,
    PropertyMirror,
};
pub use crate::script::{Script, ScriptType, SourceLocation, SourceSlice};
pub use crate::snapshot::HeapSnapshot;
pub use crate::value::{BreakId, HostValue, ObjectRef};
