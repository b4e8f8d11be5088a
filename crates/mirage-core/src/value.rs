//! Raw debuggee values and handles.
//!
//! These are the values the execution engine hands across the boundary. They
//! carry no behaviour of their own: a [`HostValue::Object`] is only a handle
//! that has to be resolved through a [`Debuggee`](crate::debuggee::Debuggee).

use std::fmt;

/// Handle to an object living inside the debuggee heap
///
/// Two handles are equal exactly when they refer to the same object, which is
/// the identity comparison used by property lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef(u64);

impl ObjectRef
{
    /// Create a handle from the engine's raw object id.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self
    {
        Self(value)
    }

    /// Get the raw numeric representation (useful for logging / errors).
    #[must_use]
    pub const fn raw(self) -> u64
    {
        self.0
    }
}

impl fmt::Display for ObjectRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "@{}", self.0)
    }
}

/// Identifier of one suspended-execution episode
///
/// The engine hands out a new id every time the debuggee stops. Frame queries
/// carry the id they were created under so that the engine can reject them
/// once that episode is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BreakId(pub u32);

impl From<u32> for BreakId
{
    fn from(id: u32) -> Self
    {
        BreakId(id)
    }
}

impl From<BreakId> for u32
{
    fn from(id: BreakId) -> Self
    {
        id.0
    }
}

impl fmt::Display for BreakId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// A value as reported by the execution engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum HostValue
{
    /// The `undefined` value (also used for "absent")
    #[default]
    Undefined,
    /// The `null` value
    Null,
    /// A boolean primitive
    Boolean(bool),
    /// A number primitive
    Number(f64),
    /// A string primitive
    String(String),
    /// Any heap object (plain objects, arrays, functions, dates, ...)
    Object(ObjectRef),
}

impl HostValue
{
    /// Returns `true` for [`HostValue::Undefined`].
    #[must_use]
    pub const fn is_undefined(&self) -> bool
    {
        matches!(self, Self::Undefined)
    }

    /// The object handle, if this value is an object.
    #[must_use]
    pub const fn as_object(&self) -> Option<ObjectRef>
    {
        match self {
            Self::Object(object) => Some(*object),
            _ => None,
        }
    }

    /// The number, if this value is a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64>
    {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string, if this value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str>
    {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness of boolean slots (anything but `true` counts as `false`).
    #[must_use]
    pub const fn is_true(&self) -> bool
    {
        matches!(self, Self::Boolean(true))
    }
}

impl From<bool> for HostValue
{
    fn from(value: bool) -> Self
    {
        Self::Boolean(value)
    }
}

impl From<f64> for HostValue
{
    fn from(value: f64) -> Self
    {
        Self::Number(value)
    }
}

impl From<i32> for HostValue
{
    fn from(value: i32) -> Self
    {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for HostValue
{
    fn from(value: &str) -> Self
    {
        Self::String(value.to_string())
    }
}

impl From<String> for HostValue
{
    fn from(value: String) -> Self
    {
        Self::String(value)
    }
}

impl From<ObjectRef> for HostValue
{
    fn from(value: ObjectRef) -> Self
    {
        Self::Object(value)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_object_identity()
    {
        let a = HostValue::from(ObjectRef::from_raw(1));
        let b = HostValue::from(ObjectRef::from_raw(1));
        let c = HostValue::from(ObjectRef::from_raw(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_object(), Some(ObjectRef::from_raw(1)));
    }

    #[test]
    fn test_primitive_accessors()
    {
        assert!(HostValue::default().is_undefined());
        assert_eq!(HostValue::from(3).as_number(), Some(3.0));
        assert_eq!(HostValue::from("x").as_str(), Some("x"));
        assert!(HostValue::from(true).is_true());
        assert!(!HostValue::Null.is_true());
    }
}
