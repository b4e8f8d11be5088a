//! # Debuggee Trait
//!
//! The boundary to the execution engine.
//!
//! The mirror layer never suspends, steps, evaluates or stores breakpoints by
//! itself. Everything it knows about the debuggee comes through the primitive
//! queries on this trait: "class of object O", "descriptor of property K on
//! O", "details of frame I in break B", and so on.
//!
//! ## Why use a trait?
//!
//! - Mirrors can be built over any engine (a live VM, a recorded heap
//!   snapshot, a test fixture)
//! - The engine keeps ownership of break-episode validation; mirrors simply
//!   surface its rejection
//!
//! ## Contract
//!
//! Queries on objects never fail: an engine asked about a handle it does not
//! know answers with empty/`undefined` results. Queries anchored to a break id
//! return [`MirrorResult`] and must fail with
//! [`MirrorError::StaleBreak`](crate::error::MirrorError::StaleBreak) once that
//! break episode is over.

use std::sync::Arc;

use bitflags::bitflags;

use crate::details::PropertyDetails;
use crate::error::MirrorResult;
use crate::script::Script;
use crate::value::{BreakId, HostValue, ObjectRef};

bitflags! {
    /// Shape predicates an engine reports for an object.
    ///
    /// Several predicates may hold at once (a function is also object-like);
    /// mirror construction picks the first match in a fixed precedence order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectShape: u8 {
        const ARRAY = 1;
        const DATE = 1 << 1;
        const FUNCTION = 1 << 2;
        const REGEXP = 1 << 3;
        const ERROR = 1 << 4;
    }
}

bitflags! {
    /// Interceptors installed on an object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Interceptors: u8 {
        const INDEXED = 1;
        const NAMED = 2;
    }
}

/// Pattern and flags of a regular expression object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegExpInfo
{
    pub source: String,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
}

/// Getter/setter pair behind an accessor property.
///
/// Both absent means the accessor is native (engine or API provided).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessorPair
{
    pub getter: Option<HostValue>,
    pub setter: Option<HostValue>,
}

/// Property descriptor as reported by the engine
///
/// For accessor properties (`PropertyType::Callbacks`) `value` is meaningless
/// and `accessors` carries the getter/setter functions instead, so building a
/// mirror for the property never has to call into the debuggee.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProperty
{
    pub value: HostValue,
    pub details: PropertyDetails,
    pub accessors: Option<AccessorPair>,
}

impl RawProperty
{
    #[must_use]
    pub fn new(value: HostValue, details: PropertyDetails) -> Self
    {
        Self {
            value,
            details,
            accessors: None,
        }
    }
}

/// Primitive queries the mirror layer issues against the execution engine
///
/// Only [`Debuggee::class_name`] and [`Debuggee::property_details`] are
/// strictly required to describe plain objects; the defaults describe an
/// engine with no interceptors, no heap walking and no frames.
pub trait Debuggee
{
    /// Shape predicates that hold for `object`.
    fn shape(&self, object: ObjectRef) -> ObjectShape;

    /// Internal class name (`Object`, `Array`, `Function`, `global`, ...).
    fn class_name(&self, object: ObjectRef) -> String;

    /// Read a property without running accessors (used for `constructor` and
    /// `prototype`). Missing properties read as `undefined`.
    fn get_property(&self, object: ObjectRef, name: &str) -> HostValue;

    /// The `[[Prototype]]` link of `object` (`null` at the end of the chain).
    fn prototype_of(&self, object: ObjectRef) -> HostValue;

    /// Own named property names, in the engine's order.
    fn local_property_names(&self, object: ObjectRef) -> Vec<String>;

    /// Own element indices, in the engine's order.
    fn local_element_names(&self, object: ObjectRef) -> Vec<u32>;

    /// Descriptor of own property `name`; `None` if there is no such property.
    fn property_details(&self, object: ObjectRef, name: &str) -> Option<RawProperty>;

    fn interceptors(&self, _object: ObjectRef) -> Interceptors
    {
        Interceptors::empty()
    }

    fn named_interceptor_names(&self, _object: ObjectRef) -> Vec<String>
    {
        Vec::new()
    }

    /// Element names reported by the indexed interceptor. Names that are not
    /// numeric are reported but have no value.
    fn indexed_interceptor_names(&self, _object: ObjectRef) -> Vec<String>
    {
        Vec::new()
    }

    fn named_interceptor_value(&self, _object: ObjectRef, _name: &str) -> HostValue
    {
        HostValue::Undefined
    }

    fn indexed_interceptor_value(&self, _object: ObjectRef, _index: u32) -> HostValue
    {
        HostValue::Undefined
    }

    /// `length` of an array object.
    fn array_length(&self, object: ObjectRef) -> u32
    {
        self.get_property(object, "length").as_number().map_or(0, |n| n as u32)
    }

    /// Time value of a date object in milliseconds since the epoch.
    fn date_value(&self, _object: ObjectRef) -> f64
    {
        f64::NAN
    }

    fn regexp(&self, object: ObjectRef) -> RegExpInfo
    {
        RegExpInfo {
            source: self.get_property(object, "source").as_str().unwrap_or_default().to_string(),
            global: self.get_property(object, "global").is_true(),
            ignore_case: self.get_property(object, "ignoreCase").is_true(),
            multiline: self.get_property(object, "multiline").is_true(),
        }
    }

    /// `message` of an error object, if it has one.
    fn error_message(&self, object: ObjectRef) -> Option<String>
    {
        self.get_property(object, "message").as_str().map(str::to_string)
    }

    /// Human-readable detail string of an error, as the engine prints it in
    /// its own diagnostics. `None` if the engine cannot produce one.
    fn error_detail_string(&self, _object: ObjectRef) -> Option<String>
    {
        None
    }

    fn function_name(&self, function: ObjectRef) -> String;

    fn function_source(&self, function: ObjectRef) -> String;

    fn function_script(&self, _function: ObjectRef) -> Option<Arc<Script>>
    {
        None
    }

    /// Objects holding a direct reference to `object` (0 = no limit).
    fn referenced_by(&self, _object: ObjectRef, _max_instances: usize) -> Vec<HostValue>
    {
        Vec::new()
    }

    /// Objects constructed by `function` (0 = no limit).
    fn constructed_by(&self, _function: ObjectRef, _max_instances: usize) -> Vec<HostValue>
    {
        Vec::new()
    }

    /// Fail unless `break_id` identifies the current break episode.
    fn check_break(&self, break_id: BreakId) -> MirrorResult<()>;

    fn frame_count(&self, break_id: BreakId) -> MirrorResult<usize>;

    /// Raw frame details tuple (see [`FrameDetails`](crate::details::FrameDetails)).
    fn frame_details(&self, break_id: BreakId, index: usize) -> MirrorResult<Vec<HostValue>>;

    /// Evaluate `source` in the frame with engine-side id `frame_id`.
    fn evaluate(&self, break_id: BreakId, frame_id: u64, source: &str, disable_break: bool) -> MirrorResult<HostValue>;
}
