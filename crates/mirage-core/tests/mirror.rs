//! Tests for value, object, property and accessor mirrors

use std::sync::Arc;

use mirage_core::prelude::*;

#[test]
fn test_primitive_mirrors()
{
    let heap = HeapSnapshot::new();

    let cases = [
        (HostValue::Undefined, MirrorType::Undefined, "undefined"),
        (HostValue::Null, MirrorType::Null, "null"),
        (HostValue::from(true), MirrorType::Boolean, "true"),
        (HostValue::from(1.5), MirrorType::Number, "1.5"),
        (HostValue::from(f64::NAN), MirrorType::Number, "NaN"),
        (HostValue::from("abc"), MirrorType::String, "abc"),
    ];
    for (value, mirror_type, text) in cases {
        let mirror = mirror_for(&heap, value);
        assert_eq!(mirror.mirror_type(), mirror_type);
        assert!(mirror.is_primitive());
        assert_eq!(mirror.to_text().unwrap(), text);
    }
}

#[test]
fn test_long_string_text_is_truncated()
{
    let heap = HeapSnapshot::new();
    let value = "a".repeat(81);
    let mirror = mirror_for(&heap, HostValue::from(value.as_str()));
    assert_eq!(mirror.string_length(), Some(81));
    assert_eq!(mirror.to_text().unwrap(), format!("{}... (length: 81)", "a".repeat(80)));
}

#[test]
fn test_shape_precedence()
{
    struct EveryShape(HeapSnapshot);

    impl Debuggee for EveryShape
    {
        fn shape(&self, _object: ObjectRef) -> ObjectShape
        {
            ObjectShape::all()
        }

        fn class_name(&self, object: ObjectRef) -> String
        {
            self.0.class_name(object)
        }

        fn get_property(&self, object: ObjectRef, name: &str) -> HostValue
        {
            self.0.get_property(object, name)
        }

        fn prototype_of(&self, object: ObjectRef) -> HostValue
        {
            self.0.prototype_of(object)
        }

        fn local_property_names(&self, object: ObjectRef) -> Vec<String>
        {
            self.0.local_property_names(object)
        }

        fn local_element_names(&self, object: ObjectRef) -> Vec<u32>
        {
            self.0.local_element_names(object)
        }

        fn property_details(&self, object: ObjectRef, name: &str) -> Option<RawProperty>
        {
            self.0.property_details(object, name)
        }

        fn function_name(&self, function: ObjectRef) -> String
        {
            self.0.function_name(function)
        }

        fn function_source(&self, function: ObjectRef) -> String
        {
            self.0.function_source(function)
        }

        fn check_break(&self, break_id: BreakId) -> MirrorResult<()>
        {
            self.0.check_break(break_id)
        }

        fn frame_count(&self, break_id: BreakId) -> MirrorResult<usize>
        {
            self.0.frame_count(break_id)
        }

        fn frame_details(&self, break_id: BreakId, index: usize) -> MirrorResult<Vec<HostValue>>
        {
            self.0.frame_details(break_id, index)
        }

        fn evaluate(&self, break_id: BreakId, frame_id: u64, source: &str, disable_break: bool) -> MirrorResult<HostValue>
        {
            self.0.evaluate(break_id, frame_id, source, disable_break)
        }
    }

    let mut heap = HeapSnapshot::new();
    let object = heap.add_object("Object");
    let engine = EveryShape(heap);

    // array wins over every weaker predicate
    let mirror = mirror_for(&engine, object.into());
    assert!(mirror.is_array());
    assert_eq!(mirror.mirror_type(), MirrorType::Object);
}

#[test]
fn test_specialised_object_mirrors()
{
    let mut heap = HeapSnapshot::new();
    let array = heap.add_array(vec![HostValue::from(1)]);
    let date = heap.add_date(0.0);
    let function = heap.add_function("f", "function f() {}");
    let regexp = heap.add_regexp("a+b", true, false, true);
    let error = heap.add_error("boom", Some("Error: boom"));
    let plain = heap.add_object("Object");

    assert!(mirror_for(&heap, array.into()).is_array());
    assert!(mirror_for(&heap, date.into()).is_date());
    assert!(mirror_for(&heap, function.into()).is_function());
    assert!(mirror_for(&heap, regexp.into()).is_regexp());
    assert!(mirror_for(&heap, error.into()).is_error());
    assert_eq!(mirror_for(&heap, plain.into()).mirror_type(), MirrorType::Object);

    assert_eq!(mirror_for(&heap, date.into()).to_text().unwrap(), "1970-01-01T00:00:00.000Z");
    assert_eq!(mirror_for(&heap, regexp.into()).to_text().unwrap(), "/a+b/");
    assert_eq!(mirror_for(&heap, error.into()).to_text().unwrap(), "Error: boom");
    assert_eq!(mirror_for(&heap, function.into()).to_text().unwrap(), "function f() {}");
    assert_eq!(mirror_for(&heap, plain.into()).to_text().unwrap(), "#<an Object>");

    let info = mirror_for(&heap, regexp.into()).as_object().unwrap().regexp();
    assert!(info.global);
    assert!(!info.ignore_case);
    assert!(info.multiline);
}

#[test]
fn test_object_text_uses_constructor_name()
{
    let mut heap = HeapSnapshot::new();
    let point = heap.add_function("Point", "function Point() {}");
    let p = heap.add_instance(point);
    let html = heap.add_function("HTMLElement", "function HTMLElement() {}");
    let element = heap.add_instance(html);

    assert_eq!(mirror_for(&heap, p.into()).to_text().unwrap(), "#<a Point>");
    assert_eq!(mirror_for(&heap, element.into()).to_text().unwrap(), "#<an HTMLElement>");
}

#[test]
fn test_properties_named_before_indexed()
{
    let mut heap = HeapSnapshot::new();
    let object = heap.add_object("Object");
    heap.set_property(object, "b", HostValue::from(1));
    heap.set_property(object, "1", HostValue::from(2));
    heap.set_property(object, "a", HostValue::from(3));
    heap.set_property(object, "0", HostValue::from(4));
    let mirror = mirror_for(&heap, object.into());

    assert_eq!(mirror.property_names(PropertyKind::default(), None), vec!["b", "a", "0", "1"]);
    assert_eq!(mirror.property_names(PropertyKind::NAMED, None), vec!["b", "a"]);
    assert_eq!(mirror.property_names(PropertyKind::INDEXED, None), vec!["0", "1"]);
    assert_eq!(mirror.property_names(PropertyKind::default(), Some(3)), vec!["b", "a", "0"]);
    assert_eq!(mirror.properties(PropertyKind::default(), Some(10)).len(), 4);
}

#[test]
fn test_missing_property_is_undefined()
{
    let mut heap = HeapSnapshot::new();
    let object = heap.add_object("Object");
    let mirror = mirror_for(&heap, object.into());
    assert!(mirror.property("nope").is_undefined());
}

#[test]
fn test_property_mirror_attributes()
{
    let mut heap = HeapSnapshot::new();
    let object = heap.add_object("Object");
    heap.define_property(
        object,
        "fixed",
        HostValue::from(1),
        PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE,
        PropertyType::Field,
    );
    heap.set_property(object, "plain", HostValue::from(2));
    let mirror = mirror_for(&heap, object.into());

    let fixed = mirror.property("fixed");
    let fixed = fixed.as_property().unwrap();
    assert!(fixed.is_read_only());
    assert!(!fixed.is_enum());
    assert!(!fixed.can_delete());
    assert_eq!(fixed.property_type(), PropertyType::Field);
    assert_eq!(fixed.insertion_index(), 0);
    assert!(!fixed.is_indexed());

    let plain = mirror.property("plain");
    let plain = plain.as_property().unwrap();
    assert!(!plain.is_read_only());
    assert!(plain.is_enum());
    assert!(plain.can_delete());
    assert_eq!(plain.attributes(), PropertyAttributes::NONE);
    assert_eq!(plain.insertion_index(), 1);
    assert_eq!(plain.value().to_text().unwrap(), "2");
}

#[test]
fn test_accessor_property_value_is_accessor_mirror()
{
    let mut heap = HeapSnapshot::new();
    let object = heap.add_object("Object");
    let getter = heap.add_function("get", "function () { return 1; }");
    heap.define_accessor(object, "computed", Some(getter), None);
    heap.define_accessor(object, "builtin", None, None);
    let mirror = mirror_for(&heap, object.into());

    let computed = mirror.property("computed").as_property().unwrap().value();
    let Mirror::Accessor(accessor) = computed else {
        panic!("expected accessor mirror, got {computed:?}");
    };
    assert!(!accessor.is_native());
    assert!(accessor.getter().is_function());
    assert!(accessor.setter().is_undefined());

    let builtin = mirror.property("builtin").as_property().unwrap().value();
    assert!(matches!(builtin, Mirror::Accessor(ref a) if a.is_native()));
}

#[test]
fn test_lookup_property_skips_accessors()
{
    let mut heap = HeapSnapshot::new();
    let target = heap.add_function("target", "function target() {}");
    let object = heap.add_object("Object");
    heap.define_accessor(object, "getter", Some(target), None);
    heap.set_property(object, "direct", target.into());
    let mirror = mirror_for(&heap, object.into());
    let target_mirror = mirror_for(&heap, target.into());

    let found = mirror.lookup_property(&target_mirror);
    assert_eq!(found.as_property().unwrap().name(), "direct");

    let other = mirror_for(&heap, HostValue::from(99));
    assert!(mirror.lookup_property(&other).is_undefined());
}

#[test]
fn test_interceptor_properties()
{
    let mut heap = HeapSnapshot::new();
    let object = heap.add_object("Object");
    heap.set_named_interceptor(object, vec![("x".to_string(), HostValue::from(1))]);
    heap.set_indexed_interceptor(
        object,
        vec![
            ("0".to_string(), HostValue::from("zero")),
            ("oops".to_string(), HostValue::from("skipped")),
        ],
    );
    let mirror = mirror_for(&heap, object.into());
    let object_mirror = mirror.as_object().unwrap();

    assert!(object_mirror.has_named_interceptor());
    assert!(object_mirror.has_indexed_interceptor());
    assert_eq!(
        object_mirror.interceptor_property_names(PropertyKind::default()),
        vec!["x", "0", "oops"]
    );

    let properties = object_mirror.interceptor_properties(PropertyKind::default(), None);
    assert_eq!(properties.len(), 2);
    assert!(properties.iter().all(Mirror::is_interceptor_property));
    let x = properties[0].as_property().unwrap();
    assert_eq!(x.property_type(), PropertyType::Interceptor);
    assert!(!x.can_delete());
    assert_eq!(x.value().to_text().unwrap(), "1");
    assert_eq!(properties[1].as_property().unwrap().value().to_text().unwrap(), "zero");
}

#[test]
fn test_array_range_access()
{
    let mut heap = HeapSnapshot::new();
    let array = heap.add_array(vec![HostValue::from(10), HostValue::from(20)]);
    heap.set_element(array, 3, HostValue::from(40));
    let mirror = mirror_for(&heap, array.into());
    let object = mirror.as_object().unwrap();

    assert_eq!(object.length(), 4);
    let all = object.indexed_properties_from_range(None, None);
    assert_eq!(all.len(), 4);
    assert!(all[2].is_undefined());
    assert_eq!(all[3].as_property().unwrap().value().to_text().unwrap(), "40");
    assert_eq!(object.indexed_properties_from_range(Some(1), Some(1)).len(), 1);
}

#[test]
fn test_unresolved_function()
{
    let function = Mirror::Function(FunctionMirror::Unresolved {
        name: "lost".to_string(),
    });

    assert!(function.is_function());
    assert!(function.is_unresolved_function());
    assert_eq!(function.class_name().as_deref(), Some("Function"));
    assert!(function.constructor_function().is_undefined());
    assert!(function.prototype_object().is_undefined());
    assert!(function.proto_object().is_undefined());
    assert!(function.property_names(PropertyKind::default(), None).is_empty());
    assert_eq!(function.to_text().unwrap(), "lost");

    let inner = function.as_function().unwrap();
    assert!(!inner.resolved());
    assert!(inner.script().is_none());
    assert!(inner.source().is_none());
    assert!(inner.constructed_by(0).is_empty());
}

#[test]
fn test_function_mirror_details()
{
    let mut heap = HeapSnapshot::new();
    let function = heap.add_function("Point", "function Point() {}");
    let script = Arc::new(Script::new(3, Some("geometry.js"), "function Point() {}\n"));
    heap.set_function_script(function, Arc::clone(&script));
    let instance = heap.add_instance(function);

    let mirror = mirror_for(&heap, function.into());
    let inner = mirror.as_function().unwrap();
    assert!(inner.resolved());
    assert_eq!(inner.name(), "Point");
    assert_eq!(inner.script().unwrap().id(), 3);
    assert_eq!(inner.constructed_by(0).len(), 1);
    assert_eq!(
        inner.constructed_by(0)[0].host_value(),
        Some(HostValue::Object(instance))
    );
    assert!(mirror.prototype_object().is_object());
}

#[test]
fn test_referenced_by_wraps_results()
{
    let mut heap = HeapSnapshot::new();
    let target = heap.add_object("Object");
    let holder = heap.add_array(vec![target.into()]);
    let mirror = mirror_for(&heap, target.into());

    let referrers = mirror.as_object().unwrap().referenced_by(0);
    assert_eq!(referrers.len(), 1);
    assert!(referrers[0].is_array());
    assert_eq!(referrers[0].host_value(), Some(HostValue::Object(holder)));
}
