//! Property and accessor mirrors.

use std::fmt;

use super::{mirror_for, Mirror, ObjectMirror};
use crate::debuggee::{AccessorPair, Debuggee, RawProperty};
use crate::details::{PropertyAttributes, PropertyDetails, PropertyType};
use crate::value::HostValue;

/// One property of one object
///
/// Holds the descriptor exactly as the engine reported it when the mirror was
/// created. The value is wrapped lazily; for accessor properties it becomes an
/// [`AccessorMirror`] so no getter ever runs.
#[derive(Clone)]
pub struct PropertyMirror<'h>
{
    owner: ObjectMirror<'h>,
    name: String,
    raw: RawProperty,
    interceptor: bool,
}

impl fmt::Debug for PropertyMirror<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("PropertyMirror")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("details", &self.raw.details)
            .field("interceptor", &self.interceptor)
            .finish()
    }
}

impl<'h> PropertyMirror<'h>
{
    #[must_use]
    pub fn new(owner: ObjectMirror<'h>, name: String, raw: RawProperty) -> Self
    {
        Self {
            owner,
            name,
            raw,
            interceptor: false,
        }
    }

    /// Property synthesised from an interceptor trap.
    #[must_use]
    pub fn interceptor(owner: ObjectMirror<'h>, name: String, value: HostValue) -> Self
    {
        Self {
            owner,
            name,
            raw: RawProperty::new(value, PropertyDetails::interceptor()),
            interceptor: true,
        }
    }

    #[must_use]
    pub const fn owner(&self) -> &ObjectMirror<'h>
    {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// True when the name is an array index (all decimal digits).
    #[must_use]
    pub fn is_indexed(&self) -> bool
    {
        !self.name.is_empty() && self.name.bytes().all(|b| b.is_ascii_digit())
    }

    #[must_use]
    pub const fn is_interceptor(&self) -> bool
    {
        self.interceptor
    }

    #[must_use]
    pub const fn details(&self) -> PropertyDetails
    {
        self.raw.details
    }

    #[must_use]
    pub const fn attributes(&self) -> PropertyAttributes
    {
        self.raw.details.attributes()
    }

    #[must_use]
    pub const fn property_type(&self) -> PropertyType
    {
        self.raw.details.property_type()
    }

    #[must_use]
    pub const fn insertion_index(&self) -> u32
    {
        self.raw.details.insertion_index()
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool
    {
        self.attributes().contains(PropertyAttributes::READ_ONLY)
    }

    #[must_use]
    pub const fn is_enum(&self) -> bool
    {
        !self.attributes().contains(PropertyAttributes::DONT_ENUM)
    }

    /// Interceptor properties have no storage to delete.
    #[must_use]
    pub const fn can_delete(&self) -> bool
    {
        !self.interceptor && !self.attributes().contains(PropertyAttributes::DONT_DELETE)
    }

    /// The property value; an [`AccessorMirror`] for accessor properties.
    #[must_use]
    pub fn value(&self) -> Mirror<'h>
    {
        let debuggee = self.owner.debuggee();
        if self.property_type() == PropertyType::Callbacks {
            let pair = self.raw.accessors.clone().unwrap_or_default();
            return Mirror::Accessor(AccessorMirror::new(debuggee, pair));
        }
        mirror_for(debuggee, self.raw.value.clone())
    }
}

/// Getter/setter pair of an accessor property.
#[derive(Clone)]
pub struct AccessorMirror<'h>
{
    debuggee: &'h dyn Debuggee,
    pair: AccessorPair,
}

impl fmt::Debug for AccessorMirror<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_tuple("AccessorMirror").field(&self.pair).finish()
    }
}

impl<'h> AccessorMirror<'h>
{
    #[must_use]
    pub const fn new(debuggee: &'h dyn Debuggee, pair: AccessorPair) -> Self
    {
        Self { debuggee, pair }
    }

    /// Native accessors are provided by the engine and have neither getter
    /// nor setter function.
    #[must_use]
    pub const fn is_native(&self) -> bool
    {
        self.pair.getter.is_none() && self.pair.setter.is_none()
    }

    #[must_use]
    pub fn getter(&self) -> Mirror<'h>
    {
        mirror_for(self.debuggee, self.pair.getter.clone().unwrap_or_default())
    }

    #[must_use]
    pub fn setter(&self) -> Mirror<'h>
    {
        mirror_for(self.debuggee, self.pair.setter.clone().unwrap_or_default())
    }
}
