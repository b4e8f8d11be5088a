//! Object-like mirrors: plain objects, arrays, dates, regexps, errors and
//! functions.

use std::fmt;
use std::sync::Arc;

use super::{mirror_for, Mirror, PropertyMirror};
use crate::debuggee::{Debuggee, Interceptors, RegExpInfo};
use crate::details::{PropertyKind, PropertyType};
use crate::script::Script;
use crate::text::{date_to_iso8601, instance_name};
use crate::value::ObjectRef;

/// Mirror over a single debuggee object
///
/// Shared by every object-like [`Mirror`] variant; the variant decides which
/// of the specialised accessors (`length`, `date_value`, `regexp`, ...) are
/// meaningful.
#[derive(Clone, Copy)]
pub struct ObjectMirror<'h>
{
    debuggee: &'h dyn Debuggee,
    object: ObjectRef,
}

impl fmt::Debug for ObjectMirror<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_tuple("ObjectMirror").field(&self.object).finish()
    }
}

impl<'h> ObjectMirror<'h>
{
    #[must_use]
    pub const fn new(debuggee: &'h dyn Debuggee, object: ObjectRef) -> Self
    {
        Self { debuggee, object }
    }

    #[must_use]
    pub const fn object(&self) -> ObjectRef
    {
        self.object
    }

    #[must_use]
    pub const fn debuggee(&self) -> &'h dyn Debuggee
    {
        self.debuggee
    }

    #[must_use]
    pub fn class_name(&self) -> String
    {
        self.debuggee.class_name(self.object)
    }

    #[must_use]
    pub fn constructor_function(&self) -> Mirror<'h>
    {
        mirror_for(self.debuggee, self.debuggee.get_property(self.object, "constructor"))
    }

    #[must_use]
    pub fn prototype_object(&self) -> Mirror<'h>
    {
        mirror_for(self.debuggee, self.debuggee.get_property(self.object, "prototype"))
    }

    #[must_use]
    pub fn proto_object(&self) -> Mirror<'h>
    {
        mirror_for(self.debuggee, self.debuggee.prototype_of(self.object))
    }

    #[must_use]
    pub fn has_named_interceptor(&self) -> bool
    {
        self.debuggee.interceptors(self.object).contains(Interceptors::NAMED)
    }

    #[must_use]
    pub fn has_indexed_interceptor(&self) -> bool
    {
        self.debuggee.interceptors(self.object).contains(Interceptors::INDEXED)
    }

    /// Own property names: named first, then indexed, each in host order.
    ///
    /// `limit` caps the result; `None` returns every name.
    #[must_use]
    pub fn property_names(&self, kind: PropertyKind, limit: Option<usize>) -> Vec<String>
    {
        let named = if kind.contains(PropertyKind::NAMED) {
            self.debuggee.local_property_names(self.object)
        } else {
            Vec::new()
        };
        let indexed = if kind.contains(PropertyKind::INDEXED) {
            self.debuggee.local_element_names(self.object)
        } else {
            Vec::new()
        };

        let total = named.len() + indexed.len();
        let limit = limit.map_or(total, |l| l.min(total));
        let mut names = Vec::with_capacity(limit);
        names.extend(named.into_iter().take(limit));
        let remaining = limit - names.len();
        names.extend(indexed.into_iter().take(remaining).map(|index| index.to_string()));
        names
    }

    /// Property mirrors in [`ObjectMirror::property_names`] order.
    #[must_use]
    pub fn properties(&self, kind: PropertyKind, limit: Option<usize>) -> Vec<Mirror<'h>>
    {
        self.property_names(kind, limit)
            .iter()
            .map(|name| self.property(name))
            .collect()
    }

    /// Names reported by the interceptors installed on the object.
    #[must_use]
    pub fn interceptor_property_names(&self, kind: PropertyKind) -> Vec<String>
    {
        let mut names = Vec::new();
        if kind.contains(PropertyKind::NAMED) && self.has_named_interceptor() {
            names.extend(self.debuggee.named_interceptor_names(self.object));
        }
        if kind.contains(PropertyKind::INDEXED) && self.has_indexed_interceptor() {
            names.extend(self.debuggee.indexed_interceptor_names(self.object));
        }
        names
    }

    /// Interceptor-provided properties
    ///
    /// With `names` given, only those names are looked up. Indexed values are
    /// fetched for numeric names only; other names are skipped.
    #[must_use]
    pub fn interceptor_properties(&self, kind: PropertyKind, names: Option<&[String]>) -> Vec<Mirror<'h>>
    {
        let mut properties = Vec::new();

        if kind.contains(PropertyKind::NAMED) && self.has_named_interceptor() {
            let named = names.map_or_else(|| self.debuggee.named_interceptor_names(self.object), <[String]>::to_vec);
            for name in named {
                let value = self.debuggee.named_interceptor_value(self.object, &name);
                properties.push(Mirror::Property(PropertyMirror::interceptor(*self, name, value)));
            }
        }

        if kind.contains(PropertyKind::INDEXED) && self.has_indexed_interceptor() {
            let indexed = names.map_or_else(|| self.debuggee.indexed_interceptor_names(self.object), <[String]>::to_vec);
            for name in indexed {
                let Ok(index) = name.parse::<u32>() else {
                    continue;
                };
                let value = self.debuggee.indexed_interceptor_value(self.object, index);
                properties.push(Mirror::Property(PropertyMirror::interceptor(*self, name, value)));
            }
        }

        properties
    }

    /// Own property `name`, or an `undefined` mirror.
    #[must_use]
    pub fn property(&self, name: &str) -> Mirror<'h>
    {
        match self.debuggee.property_details(self.object, name) {
            Some(raw) => Mirror::Property(PropertyMirror::new(*self, name.to_string(), raw)),
            None => Mirror::Undefined,
        }
    }

    /// First own property whose value is `value`
    ///
    /// Accessor properties are skipped: comparing them would mean running a
    /// getter inside the debuggee.
    #[must_use]
    pub fn lookup_property(&self, value: &Mirror<'_>) -> Mirror<'h>
    {
        let Some(target) = value.host_value() else {
            return Mirror::Undefined;
        };

        for name in self.property_names(PropertyKind::default(), None) {
            let Some(raw) = self.debuggee.property_details(self.object, &name) else {
                continue;
            };
            if raw.details.property_type() != PropertyType::Callbacks && raw.value == target {
                return Mirror::Property(PropertyMirror::new(*self, name, raw));
            }
        }
        Mirror::Undefined
    }

    /// Objects referencing this one (`max_instances == 0` means no limit).
    #[must_use]
    pub fn referenced_by(&self, max_instances: usize) -> Vec<Mirror<'h>>
    {
        self.debuggee
            .referenced_by(self.object, max_instances)
            .into_iter()
            .map(|value| mirror_for(self.debuggee, value))
            .collect()
    }

    /// `length` of an array.
    #[must_use]
    pub fn length(&self) -> u32
    {
        self.debuggee.array_length(self.object)
    }

    /// Element properties `from..=to` of an array
    ///
    /// Defaults to the whole array. Missing elements yield `undefined`
    /// mirrors so the result always has one slot per index.
    #[must_use]
    pub fn indexed_properties_from_range(&self, from: Option<u32>, to: Option<u32>) -> Vec<Mirror<'h>>
    {
        let from = from.unwrap_or(0);
        let to = match to {
            Some(to) => to,
            None => match self.length().checked_sub(1) {
                Some(last) => last,
                None => return Vec::new(),
            },
        };
        if from > to {
            return Vec::new();
        }
        (from..=to).map(|index| self.property(&index.to_string())).collect()
    }

    /// Time value of a date in milliseconds since the epoch.
    #[must_use]
    pub fn date_value(&self) -> f64
    {
        self.debuggee.date_value(self.object)
    }

    #[must_use]
    pub fn date_text(&self) -> String
    {
        date_to_iso8601(self.date_value())
    }

    #[must_use]
    pub fn regexp(&self) -> RegExpInfo
    {
        self.debuggee.regexp(self.object)
    }

    #[must_use]
    pub fn error_message(&self) -> Option<String>
    {
        self.debuggee.error_message(self.object)
    }

    /// Engine detail string, falling back to the generic object text.
    #[must_use]
    pub fn error_text(&self) -> String
    {
        self.debuggee
            .error_detail_string(self.object)
            .unwrap_or_else(|| self.to_text())
    }

    /// `#<a Point>` style rendering built from the constructor name.
    #[must_use]
    pub fn to_text(&self) -> String
    {
        let constructor_name = match self.constructor_function() {
            Mirror::Function(FunctionMirror::Resolved(ctor)) => {
                Some(self.debuggee.function_name(ctor.object())).filter(|name| !name.is_empty())
            }
            _ => None,
        };
        let name = constructor_name.unwrap_or_else(|| self.class_name());
        format!("#<{}>", instance_name(&name))
    }
}

/// Function mirror, resolved to a live function object or only known by name
///
/// Unresolved functions come from stack frames whose function could not be
/// materialised; they answer every object query with an empty result.
#[derive(Clone, Debug)]
pub enum FunctionMirror<'h>
{
    Resolved(ObjectMirror<'h>),
    Unresolved { name: String },
}

impl<'h> FunctionMirror<'h>
{
    #[must_use]
    pub const fn resolved(&self) -> bool
    {
        matches!(self, Self::Resolved(_))
    }

    #[must_use]
    pub const fn object(&self) -> Option<&ObjectMirror<'h>>
    {
        match self {
            Self::Resolved(object) => Some(object),
            Self::Unresolved { .. } => None,
        }
    }

    /// Function name; empty for anonymous functions.
    #[must_use]
    pub fn name(&self) -> String
    {
        match self {
            Self::Resolved(object) => object.debuggee().function_name(object.object()),
            Self::Unresolved { name } => name.clone(),
        }
    }

    /// Source text of a resolved function.
    #[must_use]
    pub fn source(&self) -> Option<String>
    {
        match self {
            Self::Resolved(object) => Some(object.debuggee().function_source(object.object())),
            Self::Unresolved { .. } => None,
        }
    }

    #[must_use]
    pub fn script(&self) -> Option<Arc<Script>>
    {
        match self {
            Self::Resolved(object) => object.debuggee().function_script(object.object()),
            Self::Unresolved { .. } => None,
        }
    }

    /// Objects constructed by this function (`max_instances == 0` means no
    /// limit).
    #[must_use]
    pub fn constructed_by(&self, max_instances: usize) -> Vec<Mirror<'h>>
    {
        match self {
            Self::Resolved(object) => object
                .debuggee()
                .constructed_by(object.object(), max_instances)
                .into_iter()
                .map(|value| mirror_for(object.debuggee(), value))
                .collect(),
            Self::Unresolved { .. } => Vec::new(),
        }
    }

    #[must_use]
    pub fn class_name(&self) -> String
    {
        match self {
            Self::Resolved(object) => object.class_name(),
            Self::Unresolved { .. } => "Function".to_string(),
        }
    }

    #[must_use]
    pub fn constructor_function(&self) -> Mirror<'h>
    {
        self.object().map_or(Mirror::Undefined, ObjectMirror::constructor_function)
    }

    #[must_use]
    pub fn prototype_object(&self) -> Mirror<'h>
    {
        self.object().map_or(Mirror::Undefined, ObjectMirror::prototype_object)
    }

    #[must_use]
    pub fn proto_object(&self) -> Mirror<'h>
    {
        self.object().map_or(Mirror::Undefined, ObjectMirror::proto_object)
    }

    #[must_use]
    pub fn property_names(&self, kind: PropertyKind, limit: Option<usize>) -> Vec<String>
    {
        self.object()
            .map(|object| object.property_names(kind, limit))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn properties(&self, kind: PropertyKind, limit: Option<usize>) -> Vec<Mirror<'h>>
    {
        self.object()
            .map(|object| object.properties(kind, limit))
            .unwrap_or_default()
    }

    /// Source text for resolved functions, the bare name otherwise.
    #[must_use]
    pub fn to_text(&self) -> String
    {
        match self {
            Self::Resolved(_) => self.source().unwrap_or_default(),
            Self::Unresolved { name } => name.clone(),
        }
    }
}
