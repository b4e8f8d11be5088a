//! # Mirrors
//!
//! Uniform, introspectable handles over debuggee values.
//!
//! A [`Mirror`] is a closed sum type: one variant per kind of thing the
//! debugger can look at. Value variants wrap a single debuggee value; the
//! remaining variants describe properties, accessor pairs, stack frames and
//! scripts. Shared capabilities (class name, property enumeration, text
//! rendering) are dispatched on the variant, so every consumer can match the
//! type domain exhaustively.
//!
//! ## Construction
//!
//! [`mirror_for`] inspects a raw [`HostValue`] and picks the most specific
//! variant. Object shapes are tested in a fixed precedence order (array,
//! date, function, regexp, error) because an engine may report several
//! shapes for one object. Construction never fails.
//!
//! ## Example
//!
//! ```rust
//! use mirage_core::mirror::{mirror_for, MirrorType};
//! use mirage_core::snapshot::HeapSnapshot;
//! use mirage_core::value::HostValue;
//!
//! let heap = HeapSnapshot::new();
//! let mirror = mirror_for(&heap, HostValue::from("hello"));
//! assert_eq!(mirror.mirror_type(), MirrorType::String);
//! assert_eq!(mirror.to_text().unwrap(), "hello");
//! ```

mod frame;
mod object;
mod property;

use std::fmt;
use std::sync::Arc;

pub use frame::{ExecutionState, FrameMirror};
pub use object::{FunctionMirror, ObjectMirror};
pub use property::{AccessorMirror, PropertyMirror};

use crate::debuggee::{Debuggee, ObjectShape};
use crate::details::PropertyKind;
use crate::error::MirrorResult;
use crate::script::Script;
use crate::text::{char_length, instance_name, number_to_string, truncate_chars, MAX_PROTOCOL_STRING_LENGTH};
use crate::value::HostValue;

/// Type tag of a mirror, as sent in the protocol's `type` field
///
/// Arrays and dates are reported as `object`; use [`Mirror::is_array`] and
/// [`Mirror::is_date`] to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MirrorType
{
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Object,
    Function,
    Regexp,
    Error,
    Property,
    Accessor,
    Frame,
    Script,
}

impl MirrorType
{
    #[must_use]
    pub const fn as_str(self) -> &'static str
    {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Object => "object",
            Self::Function => "function",
            Self::Regexp => "regexp",
            Self::Error => "error",
            Self::Property => "property",
            Self::Accessor => "accessor",
            Self::Frame => "frame",
            Self::Script => "script",
        }
    }
}

impl fmt::Display for MirrorType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Snapshot handle over anything the debugger can inspect.
#[derive(Clone)]
pub enum Mirror<'h>
{
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// Plain object (anything not matching a more specific shape)
    Object(ObjectMirror<'h>),
    Array(ObjectMirror<'h>),
    Date(ObjectMirror<'h>),
    Function(FunctionMirror<'h>),
    RegExp(ObjectMirror<'h>),
    Error(ObjectMirror<'h>),
    Property(PropertyMirror<'h>),
    Accessor(AccessorMirror<'h>),
    Frame(FrameMirror<'h>),
    Script(Arc<Script>),
}

/// Build the most specific mirror for a raw debuggee value.
#[must_use]
pub fn mirror_for(debuggee: &dyn Debuggee, value: HostValue) -> Mirror<'_>
{
    match value {
        HostValue::Undefined => Mirror::Undefined,
        HostValue::Null => Mirror::Null,
        HostValue::Boolean(b) => Mirror::Boolean(b),
        HostValue::Number(n) => Mirror::Number(n),
        HostValue::String(s) => Mirror::String(s),
        HostValue::Object(object) => {
            let shape = debuggee.shape(object);
            let base = ObjectMirror::new(debuggee, object);
            if shape.contains(ObjectShape::ARRAY) {
                Mirror::Array(base)
            } else if shape.contains(ObjectShape::DATE) {
                Mirror::Date(base)
            } else if shape.contains(ObjectShape::FUNCTION) {
                Mirror::Function(FunctionMirror::Resolved(base))
            } else if shape.contains(ObjectShape::REGEXP) {
                Mirror::RegExp(base)
            } else if shape.contains(ObjectShape::ERROR) {
                Mirror::Error(base)
            } else {
                Mirror::Object(base)
            }
        }
    }
}

impl<'h> Mirror<'h>
{
    #[must_use]
    pub const fn mirror_type(&self) -> MirrorType
    {
        match self {
            Self::Undefined => MirrorType::Undefined,
            Self::Null => MirrorType::Null,
            Self::Boolean(_) => MirrorType::Boolean,
            Self::Number(_) => MirrorType::Number,
            Self::String(_) => MirrorType::String,
            Self::Object(_) | Self::Array(_) | Self::Date(_) => MirrorType::Object,
            Self::Function(_) => MirrorType::Function,
            Self::RegExp(_) => MirrorType::Regexp,
            Self::Error(_) => MirrorType::Error,
            Self::Property(_) => MirrorType::Property,
            Self::Accessor(_) => MirrorType::Accessor,
            Self::Frame(_) => MirrorType::Frame,
            Self::Script(_) => MirrorType::Script,
        }
    }

    #[must_use]
    pub const fn is_undefined(&self) -> bool
    {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool
    {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_boolean(&self) -> bool
    {
        matches!(self, Self::Boolean(_))
    }

    #[must_use]
    pub const fn is_number(&self) -> bool
    {
        matches!(self, Self::Number(_))
    }

    #[must_use]
    pub const fn is_string(&self) -> bool
    {
        matches!(self, Self::String(_))
    }

    /// True for every object-like variant: plain objects, arrays, dates,
    /// functions, regexps and errors.
    #[must_use]
    pub const fn is_object(&self) -> bool
    {
        matches!(
            self,
            Self::Object(_) | Self::Array(_) | Self::Date(_) | Self::Function(_) | Self::RegExp(_) | Self::Error(_)
        )
    }

    #[must_use]
    pub const fn is_function(&self) -> bool
    {
        matches!(self, Self::Function(_))
    }

    #[must_use]
    pub const fn is_unresolved_function(&self) -> bool
    {
        matches!(self, Self::Function(FunctionMirror::Unresolved { .. }))
    }

    #[must_use]
    pub const fn is_array(&self) -> bool
    {
        matches!(self, Self::Array(_))
    }

    #[must_use]
    pub const fn is_date(&self) -> bool
    {
        matches!(self, Self::Date(_))
    }

    #[must_use]
    pub const fn is_regexp(&self) -> bool
    {
        matches!(self, Self::RegExp(_))
    }

    #[must_use]
    pub const fn is_error(&self) -> bool
    {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub const fn is_property(&self) -> bool
    {
        matches!(self, Self::Property(_))
    }

    #[must_use]
    pub fn is_interceptor_property(&self) -> bool
    {
        matches!(self, Self::Property(p) if p.is_interceptor())
    }

    #[must_use]
    pub const fn is_accessor(&self) -> bool
    {
        matches!(self, Self::Accessor(_))
    }

    #[must_use]
    pub const fn is_frame(&self) -> bool
    {
        matches!(self, Self::Frame(_))
    }

    #[must_use]
    pub const fn is_script(&self) -> bool
    {
        matches!(self, Self::Script(_))
    }

    /// True for `undefined`, `null`, booleans, numbers and strings.
    #[must_use]
    pub const fn is_primitive(&self) -> bool
    {
        matches!(
            self,
            Self::Undefined | Self::Null | Self::Boolean(_) | Self::Number(_) | Self::String(_)
        )
    }

    /// The raw debuggee value behind a value mirror.
    ///
    /// `None` for properties, accessors, frames, scripts and unresolved
    /// functions, none of which wrap a single debuggee value.
    #[must_use]
    pub fn host_value(&self) -> Option<HostValue>
    {
        match self {
            Self::Undefined => Some(HostValue::Undefined),
            Self::Null => Some(HostValue::Null),
            Self::Boolean(b) => Some(HostValue::Boolean(*b)),
            Self::Number(n) => Some(HostValue::Number(*n)),
            Self::String(s) => Some(HostValue::String(s.clone())),
            Self::Object(o) | Self::Array(o) | Self::Date(o) | Self::RegExp(o) | Self::Error(o) => {
                Some(HostValue::Object(o.object()))
            }
            Self::Function(FunctionMirror::Resolved(o)) => Some(HostValue::Object(o.object())),
            Self::Function(FunctionMirror::Unresolved { .. })
            | Self::Property(_)
            | Self::Accessor(_)
            | Self::Frame(_)
            | Self::Script(_) => None,
        }
    }

    /// The object view of a resolved object-like mirror.
    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectMirror<'h>>
    {
        match self {
            Self::Object(o) | Self::Array(o) | Self::Date(o) | Self::RegExp(o) | Self::Error(o) => Some(o),
            Self::Function(FunctionMirror::Resolved(o)) => Some(o),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_function(&self) -> Option<&FunctionMirror<'h>>
    {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_property(&self) -> Option<&PropertyMirror<'h>>
    {
        match self {
            Self::Property(p) => Some(p),
            _ => None,
        }
    }

    /// Character length of a string mirror.
    #[must_use]
    pub fn string_length(&self) -> Option<usize>
    {
        match self {
            Self::String(s) => Some(char_length(s)),
            _ => None,
        }
    }

    /// Class name of an object-like mirror.
    #[must_use]
    pub fn class_name(&self) -> Option<String>
    {
        match self {
            Self::Function(f) => Some(f.class_name()),
            _ => self.as_object().map(ObjectMirror::class_name),
        }
    }

    /// The `constructor` property, `undefined` when absent or not an object.
    #[must_use]
    pub fn constructor_function(&self) -> Mirror<'h>
    {
        match self {
            Self::Function(f) => f.constructor_function(),
            _ => self.as_object().map_or(Self::Undefined, ObjectMirror::constructor_function),
        }
    }

    /// The `prototype` property, `undefined` when absent or not an object.
    #[must_use]
    pub fn prototype_object(&self) -> Mirror<'h>
    {
        match self {
            Self::Function(f) => f.prototype_object(),
            _ => self.as_object().map_or(Self::Undefined, ObjectMirror::prototype_object),
        }
    }

    /// The `[[Prototype]]` link, `undefined` when not an object.
    #[must_use]
    pub fn proto_object(&self) -> Mirror<'h>
    {
        match self {
            Self::Function(f) => f.proto_object(),
            _ => self.as_object().map_or(Self::Undefined, ObjectMirror::proto_object),
        }
    }

    /// Property names of an object-like mirror (empty for anything else).
    #[must_use]
    pub fn property_names(&self, kind: PropertyKind, limit: Option<usize>) -> Vec<String>
    {
        match self {
            Self::Function(f) => f.property_names(kind, limit),
            _ => self
                .as_object()
                .map(|o| o.property_names(kind, limit))
                .unwrap_or_default(),
        }
    }

    /// Property mirrors of an object-like mirror (empty for anything else).
    #[must_use]
    pub fn properties(&self, kind: PropertyKind, limit: Option<usize>) -> Vec<Mirror<'h>>
    {
        match self {
            Self::Function(f) => f.properties(kind, limit),
            _ => self.as_object().map(|o| o.properties(kind, limit)).unwrap_or_default(),
        }
    }

    /// Property `name`, or an `undefined` mirror when there is none.
    #[must_use]
    pub fn property(&self, name: &str) -> Mirror<'h>
    {
        match self {
            Self::Function(FunctionMirror::Unresolved { .. }) => Self::Undefined,
            _ => self.as_object().map_or(Self::Undefined, |o| o.property(name)),
        }
    }

    /// First property holding `value`, or an `undefined` mirror.
    #[must_use]
    pub fn lookup_property(&self, value: &Mirror<'_>) -> Mirror<'h>
    {
        match self {
            Self::Function(FunctionMirror::Unresolved { .. }) => Self::Undefined,
            _ => self.as_object().map_or(Self::Undefined, |o| o.lookup_property(value)),
        }
    }

    /// Human-readable rendering.
    ///
    /// ## Errors
    ///
    /// Only frame mirrors can fail, when their break episode is over.
    pub fn to_text(&self) -> MirrorResult<String>
    {
        Ok(match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => number_to_string(*n),
            Self::String(s) => string_text(s),
            Self::Object(o) | Self::Array(o) => o.to_text(),
            Self::Date(o) => o.date_text(),
            Self::Function(f) => f.to_text(),
            Self::RegExp(o) => format!("/{}/", o.regexp().source),
            Self::Error(o) => o.error_text(),
            Self::Property(_) => format!("#<{}>", instance_name("Property")),
            Self::Accessor(_) => format!("#<{}>", instance_name("Accessor")),
            Self::Frame(frame) => frame.to_text(false)?,
            Self::Script(script) => script.to_text(),
        })
    }
}

fn string_text(value: &str) -> String
{
    let length = char_length(value);
    if length > MAX_PROTOCOL_STRING_LENGTH {
        format!(
            "{}... (length: {length})",
            truncate_chars(value, MAX_PROTOCOL_STRING_LENGTH)
        )
    } else {
        value.to_string()
    }
}

impl fmt::Debug for Mirror<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Object(o) => f.debug_tuple("Object").field(o).finish(),
            Self::Array(o) => f.debug_tuple("Array").field(o).finish(),
            Self::Date(o) => f.debug_tuple("Date").field(o).finish(),
            Self::Function(func) => f.debug_tuple("Function").field(func).finish(),
            Self::RegExp(o) => f.debug_tuple("RegExp").field(o).finish(),
            Self::Error(o) => f.debug_tuple("Error").field(o).finish(),
            Self::Property(p) => f.debug_tuple("Property").field(p).finish(),
            Self::Accessor(a) => f.debug_tuple("Accessor").field(a).finish(),
            Self::Frame(frame) => f.debug_tuple("Frame").field(frame).finish(),
            Self::Script(script) => f.debug_tuple("Script").field(&script.id()).finish(),
        }
    }
}
