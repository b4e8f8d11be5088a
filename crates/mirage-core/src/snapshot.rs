//! # Heap Snapshot
//!
//! An in-memory execution engine.
//!
//! [`HeapSnapshot`] implements [`Debuggee`] over a heap that is built up
//! explicitly: objects, functions, arrays, scripts and a suspended stack. It
//! backs the test suites and the CLI demo, and doubles as the reference for
//! what a live engine has to answer.
//!
//! ## Example
//!
//! ```rust
//! use mirage_core::details::RawFrame;
//! use mirage_core::mirror::{mirror_for, ExecutionState};
//! use mirage_core::snapshot::HeapSnapshot;
//! use mirage_core::value::HostValue;
//!
//! let mut heap = HeapSnapshot::new();
//! let point = heap.add_function("Point", "function Point(x, y) { this.x = x; this.y = y; }");
//! let p = heap.add_instance(point);
//! heap.set_property(p, "x", HostValue::from(1));
//!
//! assert_eq!(mirror_for(&heap, p.into()).to_text().unwrap(), "#<a Point>");
//!
//! let break_id = heap.suspend(vec![RawFrame {
//!     function: point.into(),
//!     ..RawFrame::default()
//! }]);
//! let state = ExecutionState::new(&heap, break_id);
//! assert_eq!(state.frame_count().unwrap(), 1);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::debuggee::{AccessorPair, Debuggee, Interceptors, ObjectShape, RawProperty};
use crate::details::{encode_frame_details, PropertyAttributes, PropertyDetails, PropertyType, RawFrame};
use crate::error::{MirrorError, MirrorResult};
use crate::script::Script;
use crate::value::{BreakId, HostValue, ObjectRef};

#[derive(Debug, Clone)]
struct FunctionData
{
    name: String,
    source: String,
    script: Option<Arc<Script>>,
}

#[derive(Debug, Clone, Default)]
struct HeapObject
{
    class_name: String,
    shape: ObjectShape,
    prototype: HostValue,
    properties: Vec<(String, RawProperty)>,
    elements: BTreeMap<u32, HostValue>,
    interceptors: Interceptors,
    named_interceptor: Vec<(String, HostValue)>,
    indexed_interceptor: Vec<(String, HostValue)>,
    function: Option<FunctionData>,
    date_value: Option<f64>,
    error_detail: Option<String>,
}

impl HeapObject
{
    fn new(class_name: &str, shape: ObjectShape) -> Self
    {
        Self {
            class_name: class_name.to_string(),
            shape,
            prototype: HostValue::Null,
            ..Self::default()
        }
    }

    fn own_property(&self, name: &str) -> Option<RawProperty>
    {
        if let Ok(index) = name.parse::<u32>() {
            if let Some(value) = self.elements.get(&index) {
                return Some(RawProperty::new(value.clone(), PropertyDetails::default()));
            }
        }
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, raw)| raw.clone())
    }

    /// Every value this object holds a direct reference to.
    fn referenced_values(&self) -> impl Iterator<Item = &HostValue>
    {
        let accessors = self
            .properties
            .iter()
            .filter_map(|(_, raw)| raw.accessors.as_ref())
            .flat_map(|pair| pair.getter.iter().chain(pair.setter.iter()));
        self.properties
            .iter()
            .map(|(_, raw)| &raw.value)
            .chain(self.elements.values())
            .chain(accessors)
            .chain(std::iter::once(&self.prototype))
    }
}

/// Suspended stack of the current break episode.
#[derive(Debug, Clone)]
struct Suspension
{
    break_id: BreakId,
    frames: Vec<RawFrame>,
}

/// In-memory [`Debuggee`] built from explicit heap contents
#[derive(Debug, Clone, Default)]
pub struct HeapSnapshot
{
    objects: BTreeMap<ObjectRef, HeapObject>,
    next_object: u64,
    last_break: u32,
    suspension: Option<Suspension>,
    evaluations: HashMap<String, HostValue>,
}

impl HeapSnapshot
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    fn allocate(&mut self, object: HeapObject) -> ObjectRef
    {
        self.next_object += 1;
        let handle = ObjectRef::from_raw(self.next_object);
        self.objects.insert(handle, object);
        handle
    }

    fn object(&self, handle: ObjectRef) -> Option<&HeapObject>
    {
        self.objects.get(&handle)
    }

    fn object_mut(&mut self, handle: ObjectRef) -> Option<&mut HeapObject>
    {
        self.objects.get_mut(&handle)
    }

    /// Allocate a plain object of the given internal class.
    pub fn add_object(&mut self, class_name: &str) -> ObjectRef
    {
        self.allocate(HeapObject::new(class_name, ObjectShape::empty()))
    }

    /// Allocate a function together with its `prototype` object, whose
    /// `constructor` points back at the function.
    pub fn add_function(&mut self, name: &str, source: &str) -> ObjectRef
    {
        let mut function = HeapObject::new("Function", ObjectShape::FUNCTION);
        function.function = Some(FunctionData {
            name: name.to_string(),
            source: source.to_string(),
            script: None,
        });
        let function = self.allocate(function);

        let prototype = self.add_object("Object");
        self.define_property(
            prototype,
            "constructor",
            function.into(),
            PropertyAttributes::DONT_ENUM,
            PropertyType::Field,
        );
        self.define_property(
            function,
            "prototype",
            prototype.into(),
            PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE,
            PropertyType::Field,
        );
        function
    }

    /// Attach the script a function was compiled from.
    pub fn set_function_script(&mut self, function: ObjectRef, script: Arc<Script>)
    {
        if let Some(data) = self.object_mut(function).and_then(|o| o.function.as_mut()) {
            data.script = Some(script);
        }
    }

    /// Allocate an object whose prototype is `constructor.prototype`.
    pub fn add_instance(&mut self, constructor: ObjectRef) -> ObjectRef
    {
        let prototype = self.get_property(constructor, "prototype");
        let instance = self.add_object("Object");
        self.set_prototype(instance, prototype);
        instance
    }

    pub fn add_array(&mut self, elements: Vec<HostValue>) -> ObjectRef
    {
        let array = self.allocate(HeapObject::new("Array", ObjectShape::ARRAY));
        for (index, value) in (0u32..).zip(elements) {
            self.set_element(array, index, value);
        }
        self.update_length(array);
        array
    }

    /// Allocate a date holding `time_value` milliseconds since the epoch.
    pub fn add_date(&mut self, time_value: f64) -> ObjectRef
    {
        let mut date = HeapObject::new("Date", ObjectShape::DATE);
        date.date_value = Some(time_value);
        self.allocate(date)
    }

    pub fn add_regexp(&mut self, source: &str, global: bool, ignore_case: bool, multiline: bool) -> ObjectRef
    {
        let regexp = self.allocate(HeapObject::new("RegExp", ObjectShape::REGEXP));
        let fixed = PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE;
        self.define_property(regexp, "source", source.into(), fixed, PropertyType::Field);
        self.define_property(regexp, "global", global.into(), fixed, PropertyType::Field);
        self.define_property(regexp, "ignoreCase", ignore_case.into(), fixed, PropertyType::Field);
        self.define_property(regexp, "multiline", multiline.into(), fixed, PropertyType::Field);
        regexp
    }

    /// Allocate an error; `detail` is the engine's own rendering of it.
    pub fn add_error(&mut self, message: &str, detail: Option<&str>) -> ObjectRef
    {
        let mut error = HeapObject::new("Error", ObjectShape::ERROR);
        error.error_detail = detail.map(str::to_string);
        let error = self.allocate(error);
        self.define_property(
            error,
            "message",
            message.into(),
            PropertyAttributes::DONT_ENUM,
            PropertyType::Field,
        );
        error
    }

    /// Set a plain, writable, enumerable, deletable property.
    ///
    /// Numeric names are stored as elements.
    pub fn set_property(&mut self, object: ObjectRef, name: &str, value: HostValue)
    {
        if let Ok(index) = name.parse::<u32>() {
            self.set_element(object, index, value);
            return;
        }
        self.define_property(object, name, value, PropertyAttributes::NONE, PropertyType::Normal);
    }

    /// Define (or redefine) a named property with explicit details.
    pub fn define_property(
        &mut self,
        object: ObjectRef,
        name: &str,
        value: HostValue,
        attributes: PropertyAttributes,
        property_type: PropertyType,
    )
    {
        let Some(target) = self.object_mut(object) else {
            return;
        };
        if let Some((_, raw)) = target.properties.iter_mut().find(|(key, _)| key == name) {
            let index = raw.details.insertion_index();
            *raw = RawProperty::new(value, PropertyDetails::new(property_type, attributes, index));
            return;
        }
        let index = u32::try_from(target.properties.len()).unwrap_or(u32::MAX);
        target.properties.push((
            name.to_string(),
            RawProperty::new(value, PropertyDetails::new(property_type, attributes, index)),
        ));
    }

    /// Define an accessor property. Both halves absent makes it native.
    pub fn define_accessor(
        &mut self,
        object: ObjectRef,
        name: &str,
        getter: Option<ObjectRef>,
        setter: Option<ObjectRef>,
    )
    {
        self.define_property(
            object,
            name,
            HostValue::Undefined,
            PropertyAttributes::NONE,
            PropertyType::Callbacks,
        );
        let pair = AccessorPair {
            getter: getter.map(HostValue::from),
            setter: setter.map(HostValue::from),
        };
        if let Some((_, raw)) = self
            .object_mut(object)
            .and_then(|o| o.properties.iter_mut().find(|(key, _)| key == name))
        {
            raw.accessors = Some(pair);
        }
    }

    pub fn set_element(&mut self, object: ObjectRef, index: u32, value: HostValue)
    {
        let Some(target) = self.object_mut(object) else {
            return;
        };
        target.elements.insert(index, value);
        if target.shape.contains(ObjectShape::ARRAY) {
            self.update_length(object);
        }
    }

    fn update_length(&mut self, array: ObjectRef)
    {
        let length = self
            .object(array)
            .and_then(|o| o.elements.keys().next_back())
            .map_or(0, |last| last + 1);
        self.define_property(
            array,
            "length",
            HostValue::Number(f64::from(length)),
            PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE,
            PropertyType::Callbacks,
        );
    }

    pub fn set_prototype(&mut self, object: ObjectRef, prototype: HostValue)
    {
        if let Some(target) = self.object_mut(object) {
            target.prototype = prototype;
        }
    }

    /// Install a named interceptor answering with `entries`.
    pub fn set_named_interceptor(&mut self, object: ObjectRef, entries: Vec<(String, HostValue)>)
    {
        if let Some(target) = self.object_mut(object) {
            target.interceptors |= Interceptors::NAMED;
            target.named_interceptor = entries;
        }
    }

    /// Install an indexed interceptor answering with `entries`.
    pub fn set_indexed_interceptor(&mut self, object: ObjectRef, entries: Vec<(String, HostValue)>)
    {
        if let Some(target) = self.object_mut(object) {
            target.interceptors |= Interceptors::INDEXED;
            target.indexed_interceptor = entries;
        }
    }

    /// Register the result of evaluating `source` in any frame.
    pub fn set_evaluation(&mut self, source: &str, value: HostValue)
    {
        self.evaluations.insert(source.to_string(), value);
    }

    /// Stop the debuggee with `frames` on the stack (innermost first).
    ///
    /// Starts a new break episode; ids from earlier episodes become stale.
    pub fn suspend(&mut self, frames: Vec<RawFrame>) -> BreakId
    {
        self.last_break += 1;
        let break_id = BreakId(self.last_break);
        debug!(%break_id, frames = frames.len(), "debuggee suspended");
        self.suspension = Some(Suspension { break_id, frames });
        break_id
    }

    /// Let the debuggee run again; no break id is valid until the next stop.
    pub fn resume(&mut self)
    {
        if let Some(suspension) = self.suspension.take() {
            debug!(break_id = %suspension.break_id, "debuggee resumed");
        }
    }

    #[must_use]
    pub fn current_break(&self) -> Option<BreakId>
    {
        self.suspension.as_ref().map(|s| s.break_id)
    }

    fn frames(&self, break_id: BreakId) -> MirrorResult<&[RawFrame]>
    {
        self.check_break(break_id)?;
        Ok(self.suspension.as_ref().map_or(&[][..], |s| s.frames.as_slice()))
    }
}

impl Debuggee for HeapSnapshot
{
    fn shape(&self, object: ObjectRef) -> ObjectShape
    {
        self.object(object).map_or(ObjectShape::empty(), |o| o.shape)
    }

    fn class_name(&self, object: ObjectRef) -> String
    {
        self.object(object).map(|o| o.class_name.clone()).unwrap_or_default()
    }

    /// Looks along the prototype chain, like a property read would.
    fn get_property(&self, object: ObjectRef, name: &str) -> HostValue
    {
        let mut seen = HashSet::new();
        let mut current = Some(object);
        while let Some(handle) = current {
            if !seen.insert(handle) {
                break;
            }
            let Some(target) = self.object(handle) else {
                break;
            };
            if let Some(raw) = target.own_property(name) {
                return raw.value;
            }
            current = target.prototype.as_object();
        }
        HostValue::Undefined
    }

    fn prototype_of(&self, object: ObjectRef) -> HostValue
    {
        self.object(object).map_or(HostValue::Null, |o| o.prototype.clone())
    }

    fn local_property_names(&self, object: ObjectRef) -> Vec<String>
    {
        self.object(object)
            .map(|o| o.properties.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    fn local_element_names(&self, object: ObjectRef) -> Vec<u32>
    {
        self.object(object)
            .map(|o| o.elements.keys().copied().collect())
            .unwrap_or_default()
    }

    fn property_details(&self, object: ObjectRef, name: &str) -> Option<RawProperty>
    {
        self.object(object)?.own_property(name)
    }

    fn interceptors(&self, object: ObjectRef) -> Interceptors
    {
        self.object(object).map_or(Interceptors::empty(), |o| o.interceptors)
    }

    fn named_interceptor_names(&self, object: ObjectRef) -> Vec<String>
    {
        self.object(object)
            .map(|o| o.named_interceptor.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    fn indexed_interceptor_names(&self, object: ObjectRef) -> Vec<String>
    {
        self.object(object)
            .map(|o| o.indexed_interceptor.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    fn named_interceptor_value(&self, object: ObjectRef, name: &str) -> HostValue
    {
        self.object(object)
            .and_then(|o| o.named_interceptor.iter().find(|(key, _)| key == name))
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }

    fn indexed_interceptor_value(&self, object: ObjectRef, index: u32) -> HostValue
    {
        let name = index.to_string();
        self.object(object)
            .and_then(|o| o.indexed_interceptor.iter().find(|(key, _)| *key == name))
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }

    fn date_value(&self, object: ObjectRef) -> f64
    {
        self.object(object).and_then(|o| o.date_value).unwrap_or(f64::NAN)
    }

    fn error_detail_string(&self, object: ObjectRef) -> Option<String>
    {
        self.object(object)?.error_detail.clone()
    }

    fn function_name(&self, function: ObjectRef) -> String
    {
        self.object(function)
            .and_then(|o| o.function.as_ref())
            .map(|f| f.name.clone())
            .unwrap_or_default()
    }

    fn function_source(&self, function: ObjectRef) -> String
    {
        self.object(function)
            .and_then(|o| o.function.as_ref())
            .map(|f| f.source.clone())
            .unwrap_or_default()
    }

    fn function_script(&self, function: ObjectRef) -> Option<Arc<Script>>
    {
        self.object(function)?.function.as_ref()?.script.clone()
    }

    fn referenced_by(&self, object: ObjectRef, max_instances: usize) -> Vec<HostValue>
    {
        let target = HostValue::Object(object);
        let limit = if max_instances == 0 { usize::MAX } else { max_instances };
        self.objects
            .iter()
            .filter(|(handle, _)| **handle != object)
            .filter(|(_, o)| o.referenced_values().any(|value| *value == target))
            .map(|(handle, _)| HostValue::Object(*handle))
            .take(limit)
            .collect()
    }

    fn constructed_by(&self, function: ObjectRef, max_instances: usize) -> Vec<HostValue>
    {
        let prototype = self.get_property(function, "prototype");
        if prototype.as_object().is_none() {
            return Vec::new();
        }
        let limit = if max_instances == 0 { usize::MAX } else { max_instances };
        self.objects
            .iter()
            .filter(|(_, o)| o.prototype == prototype)
            .map(|(handle, _)| HostValue::Object(*handle))
            .take(limit)
            .collect()
    }

    fn check_break(&self, break_id: BreakId) -> MirrorResult<()>
    {
        match &self.suspension {
            None => Err(MirrorError::NotSuspended),
            Some(s) if s.break_id != break_id => Err(MirrorError::StaleBreak {
                requested: break_id,
                current: s.break_id,
            }),
            Some(_) => Ok(()),
        }
    }

    fn frame_count(&self, break_id: BreakId) -> MirrorResult<usize>
    {
        Ok(self.frames(break_id)?.len())
    }

    fn frame_details(&self, break_id: BreakId, index: usize) -> MirrorResult<Vec<HostValue>>
    {
        let frames = self.frames(break_id)?;
        frames
            .get(index)
            .map(encode_frame_details)
            .ok_or(MirrorError::FrameOutOfRange {
                index,
                count: frames.len(),
            })
    }

    /// Resolves registered expressions first, then argument and local names
    /// of the addressed frame.
    fn evaluate(&self, break_id: BreakId, frame_id: u64, source: &str, _disable_break: bool) -> MirrorResult<HostValue>
    {
        let frames = self.frames(break_id)?;
        let source = source.trim();
        if let Some(value) = self.evaluations.get(source) {
            return Ok(value.clone());
        }

        let frame = frames.iter().find(|f| f.frame_id == frame_id);
        let from_frame = frame.and_then(|f| {
            f.locals
                .iter()
                .find(|(name, _)| name == source)
                .map(|(_, value)| value.clone())
                .or_else(|| {
                    f.arguments
                        .iter()
                        .find(|(name, _)| name.as_deref() == Some(source))
                        .map(|(_, value)| value.clone())
                })
        });
        from_frame.ok_or_else(|| MirrorError::EvaluationFailed(format!("{source} is not defined")))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_function_prototype_links_back()
    {
        let mut heap = HeapSnapshot::new();
        let f = heap.add_function("Point", "function Point() {}");
        let prototype = heap.get_property(f, "prototype");
        let prototype = prototype.as_object().unwrap();
        assert_eq!(heap.get_property(prototype, "constructor"), HostValue::Object(f));
    }

    #[test]
    fn test_instance_inherits_constructor()
    {
        let mut heap = HeapSnapshot::new();
        let f = heap.add_function("Point", "function Point() {}");
        let p = heap.add_instance(f);
        assert_eq!(heap.get_property(p, "constructor"), HostValue::Object(f));
        assert!(heap.property_details(p, "constructor").is_none());
        assert_eq!(heap.constructed_by(f, 0), vec![HostValue::Object(p)]);
    }

    #[test]
    fn test_array_length_tracks_elements()
    {
        let mut heap = HeapSnapshot::new();
        let array = heap.add_array(vec![HostValue::from(1), HostValue::from(2)]);
        assert_eq!(heap.array_length(array), 2);
        heap.set_element(array, 5, HostValue::Null);
        assert_eq!(heap.array_length(array), 6);
        assert_eq!(heap.local_element_names(array), vec![0, 1, 5]);
    }

    #[test]
    fn test_property_insertion_index()
    {
        let mut heap = HeapSnapshot::new();
        let o = heap.add_object("Object");
        heap.set_property(o, "a", HostValue::from(1));
        heap.set_property(o, "b", HostValue::from(2));
        heap.set_property(o, "a", HostValue::from(3));
        let a = heap.property_details(o, "a").unwrap();
        let b = heap.property_details(o, "b").unwrap();
        assert_eq!(a.details.insertion_index(), 0);
        assert_eq!(a.value, HostValue::from(3));
        assert_eq!(b.details.insertion_index(), 1);
    }

    #[test]
    fn test_break_ids_go_stale()
    {
        let mut heap = HeapSnapshot::new();
        assert_eq!(heap.check_break(BreakId(1)), Err(MirrorError::NotSuspended));

        let first = heap.suspend(vec![RawFrame::default()]);
        assert!(heap.check_break(first).is_ok());

        let second = heap.suspend(vec![RawFrame::default()]);
        assert_eq!(
            heap.frame_count(first),
            Err(MirrorError::StaleBreak {
                requested: first,
                current: second
            })
        );

        heap.resume();
        assert_eq!(heap.frame_count(second), Err(MirrorError::NotSuspended));
    }

    #[test]
    fn test_evaluate_reads_frame_locals()
    {
        let mut heap = HeapSnapshot::new();
        let break_id = heap.suspend(vec![RawFrame {
            frame_id: 7,
            locals: vec![("x".to_string(), HostValue::from(42))],
            ..RawFrame::default()
        }]);
        assert_eq!(heap.evaluate(break_id, 7, " x ", false), Ok(HostValue::from(42)));
        assert!(matches!(
            heap.evaluate(break_id, 7, "y", false),
            Err(MirrorError::EvaluationFailed(_))
        ));
    }

    #[test]
    fn test_referenced_by()
    {
        let mut heap = HeapSnapshot::new();
        let target = heap.add_object("Object");
        let holder = heap.add_object("Object");
        heap.set_property(holder, "ref", target.into());
        assert_eq!(heap.referenced_by(target, 0), vec![HostValue::Object(holder)]);
    }
}
