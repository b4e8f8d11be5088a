//! Tests for mirror serialization

use std::sync::Arc;

use mirage_core::prelude::*;
use mirage_protocol::serializer::to_json_protocol;
use serde_json::Value;

fn parse(json: &str) -> Value
{
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_primitives()
{
    let heap = HeapSnapshot::new();
    let cases = [
        (HostValue::Undefined, r#"{"type":"undefined","text":"undefined"}"#),
        (HostValue::Null, r#"{"type":"null","text":"null"}"#),
        (HostValue::from(true), r#"{"type":"boolean","value":true,"text":"true"}"#),
        (HostValue::from(-1.5), r#"{"type":"number","value":-1.5,"text":"-1.5"}"#),
        (HostValue::from("hi"), r#"{"type":"string","value":"hi","length":2,"text":"hi"}"#),
    ];
    for (value, expected) in cases {
        assert_eq!(to_json_protocol(&mirror_for(&heap, value), true).unwrap(), expected);
    }
}

#[test]
fn test_non_finite_numbers_use_language_spelling()
{
    let heap = HeapSnapshot::new();
    assert_eq!(
        to_json_protocol(&mirror_for(&heap, HostValue::from(f64::NAN)), false).unwrap(),
        r#"{"type":"number","value":NaN,"text":"NaN"}"#
    );
}

#[test]
fn test_short_strings_are_not_cropped()
{
    let heap = HeapSnapshot::new();
    let text = "a".repeat(80);
    let json = parse(&to_json_protocol(&mirror_for(&heap, HostValue::from(text.as_str())), false).unwrap());
    assert!(json.get("fromIndex").is_none());
    assert!(json.get("toIndex").is_none());
    assert_eq!(json["value"], text.as_str());
}

#[test]
fn test_long_strings_are_cropped_to_eighty_characters()
{
    let heap = HeapSnapshot::new();
    let text: String = ('a'..='z').cycle().take(130).collect();
    let json = parse(&to_json_protocol(&mirror_for(&heap, HostValue::from(text.as_str())), false).unwrap());

    let from = json["fromIndex"].as_u64().unwrap();
    let to = json["toIndex"].as_u64().unwrap();
    assert_eq!(to - from, 80);
    assert_eq!(json["value"], &text[..80]);
    assert_eq!(json["length"], 130);
    assert_eq!(json["text"], format!("{}... (length: 130)", &text[..80]));
}

#[test]
fn test_escaping_inside_values()
{
    let heap = HeapSnapshot::new();
    assert_eq!(
        to_json_protocol(&mirror_for(&heap, HostValue::from("a\"b\n")), false).unwrap(),
        r#"{"type":"string","value":"a\"b\n","length":4,"text":"a\"b\n"}"#
    );
}

#[test]
fn test_object_summary()
{
    let mut heap = HeapSnapshot::new();
    let point = heap.add_function("Point", "function Point() {}");
    let p = heap.add_instance(point);
    heap.set_property(p, "x", HostValue::from(1));

    assert_eq!(
        to_json_protocol(&mirror_for(&heap, p.into()), false).unwrap(),
        r##"{"type":"object","className":"Object","text":"#<a Point>"}"##
    );
}

#[test]
fn test_object_details()
{
    let mut heap = HeapSnapshot::new();
    let point = heap.add_function("Point", "function Point() {}");
    let p = heap.add_instance(point);
    heap.set_property(p, "x", HostValue::from(1));
    heap.define_property(
        p,
        "hidden",
        HostValue::Null,
        PropertyAttributes::DONT_ENUM,
        PropertyType::Field,
    );

    let text = to_json_protocol(&mirror_for(&heap, p.into()), true).unwrap();
    assert!(text.starts_with(r#"{"type":"object","className":"Object","constructorFunction":"#));
    assert!(text.ends_with(r##""text":"#<a Point>"}"##));

    let json = parse(&text);
    assert_eq!(json["constructorFunction"]["type"], "function");
    assert_eq!(json["constructorFunction"]["name"], "Point");
    assert!(json["constructorFunction"].get("source").is_none());
    assert_eq!(json["protoObject"]["type"], "object");
    assert_eq!(json["prototypeObject"]["type"], "undefined");
    assert_eq!(json["interceptorProperties"], Value::Array(Vec::new()));

    let properties = json["properties"].as_array().unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(
        properties[0],
        parse(r##"{"type":"property","name":"x","value":{"type":"number","value":1,"text":"1"},"text":"#<a Property>"}"##)
    );
    assert_eq!(properties[1]["name"], "hidden");
    assert_eq!(properties[1]["attributes"], 2);
    assert_eq!(properties[1]["propertyType"], 1);
}

#[test]
fn test_property_values_are_summaries()
{
    let mut heap = HeapSnapshot::new();
    let inner = heap.add_object("Object");
    heap.set_property(inner, "deep", HostValue::from(1));
    let outer = heap.add_object("Object");
    heap.set_property(outer, "inner", inner.into());

    let json = parse(&to_json_protocol(&mirror_for(&heap, outer.into()), true).unwrap());
    let value = &json["properties"][0]["value"];
    assert_eq!(value["type"], "object");
    assert!(value.get("properties").is_none());
}

#[test]
fn test_self_reference_terminates()
{
    let mut heap = HeapSnapshot::new();
    let o = heap.add_object("Object");
    heap.set_property(o, "self", o.into());

    let json = parse(&to_json_protocol(&mirror_for(&heap, o.into()), true).unwrap());
    assert_eq!(
        json["properties"][0]["value"],
        parse(r##"{"type":"object","className":"Object","text":"#<an Object>"}"##)
    );
}

#[test]
fn test_array_details()
{
    let mut heap = HeapSnapshot::new();
    let array = heap.add_array(vec![HostValue::from(1), HostValue::from("a")]);

    let json = parse(&to_json_protocol(&mirror_for(&heap, array.into()), true).unwrap());
    assert_eq!(json["className"], "Array");
    assert_eq!(json["length"], 2);

    let named = json["properties"].as_array().unwrap();
    assert!(named.iter().all(|p| p["name"] != "0" && p["name"] != "1"));

    let indexed = json["indexedProperties"].as_array().unwrap();
    assert_eq!(indexed.len(), 2);
    assert_eq!(indexed[0]["name"], "0");
    assert_eq!(indexed[1]["value"]["value"], "a");
}

#[test]
fn test_function_details_include_source_and_script()
{
    let mut heap = HeapSnapshot::new();
    let script = Arc::new(Script::new(1, Some("app.js"), "function go() {\n  run();\n}\n"));
    let go = heap.add_function("go", "function go() {\n  run();\n}");
    heap.set_function_script(go, script);

    let summary = parse(&to_json_protocol(&mirror_for(&heap, go.into()), false).unwrap());
    assert_eq!(summary["name"], "go");
    assert_eq!(summary["resolved"], true);
    assert!(summary.get("source").is_none());
    assert_eq!(summary["script"]["name"], "app.js");

    let details = parse(&to_json_protocol(&mirror_for(&heap, go.into()), true).unwrap());
    assert_eq!(details["source"], "function go() {\n  run();\n}");
    assert_eq!(details["script"]["scriptType"], 2);
    assert_eq!(details["script"]["lineOffset"], 0);
    assert_eq!(details["script"]["text"], "app.js (lines: 3)");
}

#[test]
fn test_specialised_objects()
{
    let mut heap = HeapSnapshot::new();
    let date = heap.add_date(0.0);
    let regexp = heap.add_regexp("ab+c", true, false, true);
    let error = heap.add_error("boom", Some("Error: boom"));

    let date = parse(&to_json_protocol(&mirror_for(&heap, date.into()), false).unwrap());
    assert_eq!(date["value"], "1970-01-01T00:00:00.000Z");
    assert_eq!(date["text"], "1970-01-01T00:00:00.000Z");

    let regexp = parse(&to_json_protocol(&mirror_for(&heap, regexp.into()), false).unwrap());
    assert_eq!(regexp["type"], "regexp");
    assert_eq!(regexp["source"], "ab+c");
    assert_eq!(regexp["global"], true);
    assert_eq!(regexp["ignoreCase"], false);
    assert_eq!(regexp["multiline"], true);
    assert_eq!(regexp["text"], "/ab+c/");

    let error = parse(&to_json_protocol(&mirror_for(&heap, error.into()), false).unwrap());
    assert_eq!(error["type"], "error");
    assert_eq!(error["message"], "boom");
    assert_eq!(error["text"], "Error: boom");
}

#[test]
fn test_interceptors()
{
    let mut heap = HeapSnapshot::new();
    let o = heap.add_object("Object");
    heap.set_named_interceptor(o, vec![("magic".to_string(), HostValue::from(42))]);

    let json = parse(&to_json_protocol(&mirror_for(&heap, o.into()), true).unwrap());
    assert_eq!(json["namedInterceptor"], true);
    assert!(json.get("indexedInterceptor").is_none());

    let intercepted = &json["interceptorProperties"][0];
    assert_eq!(intercepted["name"], "magic");
    assert_eq!(intercepted["value"]["value"], 42);
    assert_eq!(intercepted["propertyType"], 4);
}

#[test]
fn test_accessor_property()
{
    let mut heap = HeapSnapshot::new();
    let getter = heap.add_function("getX", "function getX() { return 1; }");
    let o = heap.add_object("Object");
    heap.define_accessor(o, "x", Some(getter), None);

    let json = parse(&to_json_protocol(&mirror_for(&heap, o.into()), true).unwrap());
    let value = &json["properties"][0]["value"];
    assert_eq!(value["type"], "accessor");
    assert_eq!(value["getter"]["name"], "getX");
    assert_eq!(value["setter"]["type"], "undefined");
    assert_eq!(json["properties"][0]["propertyType"], 3);
}

#[test]
fn test_script_mirror()
{
    let script = Arc::new(Script::new(4, None, "1 + 1;\n2;").with_offset(10, 4));
    let mirror = Mirror::Script(script);

    assert_eq!(
        to_json_protocol(&mirror, false).unwrap(),
        r#"{"type":"script","lineOffset":10,"columnOffset":4,"lineCount":2,"scriptType":2,"text":"[unnamed] (lines: 10-11)"}"#
    );
}

fn suspended() -> (HeapSnapshot, BreakId)
{
    let mut heap = HeapSnapshot::new();
    let script = Arc::new(Script::new(1, Some("loop.js"), "function tick(n) {\n  n++;\n}\n"));
    let tick = heap.add_function("tick", "function tick(n) {\n  n++;\n}");
    heap.set_function_script(tick, script);
    let global = heap.add_object("global");

    let break_id = heap.suspend(vec![
        RawFrame {
            frame_id: 1,
            receiver: global.into(),
            function: tick.into(),
            arguments: vec![(Some("n".to_string()), HostValue::from(4))],
            locals: vec![("seen".to_string(), HostValue::from(true))],
            source_position: Some(21),
            ..RawFrame::default()
        },
        RawFrame {
            frame_id: 2,
            receiver: global.into(),
            function: tick.into(),
            ..RawFrame::default()
        },
    ]);
    (heap, break_id)
}

#[test]
fn test_frame_serialization()
{
    let (heap, break_id) = suspended();
    let frame = ExecutionState::new(&heap, break_id).frame(0).unwrap();
    let text = to_json_protocol(&Mirror::Frame(frame), false).unwrap();
    assert!(text.starts_with(r#"{"type":"frame","index":0,"receiver":"#));

    let json = parse(&text);
    assert_eq!(json["receiver"]["className"], "global");
    assert_eq!(json["func"]["name"], "tick");
    assert_eq!(json["constructCall"], false);
    assert_eq!(json["debuggerFrame"], false);
    assert_eq!(
        json["arguments"],
        parse(r#"[{"name":"n","value":{"type":"number","value":4,"text":"4"}}]"#)
    );
    assert_eq!(
        json["locals"],
        parse(r#"[{"name":"seen","value":{"type":"boolean","value":true,"text":"true"}}]"#)
    );
    assert_eq!(json["position"], 21);
    assert_eq!(json["line"], 1);
    assert_eq!(json["column"], 2);
    assert_eq!(json["sourceLineText"], "  n++;");
    assert_eq!(json["text"], "#00 tick(n=4) loop.js line 2 column 3 (position 22)");
}

#[test]
fn test_frame_without_position()
{
    let (heap, break_id) = suspended();
    let frame = ExecutionState::new(&heap, break_id).frame(1).unwrap();
    let json = parse(&to_json_protocol(&Mirror::Frame(frame), false).unwrap());
    assert!(json.get("position").is_none());
    assert!(json.get("line").is_none());
    assert!(json.get("sourceLineText").is_none());
}

#[test]
fn test_stale_break_yields_no_frame()
{
    let (mut heap, first) = suspended();
    let second = heap.suspend(vec![RawFrame::default()]);

    let state = ExecutionState::new(&heap, first);
    assert_eq!(
        state.frame(0).unwrap_err(),
        MirrorError::StaleBreak {
            requested: first,
            current: second
        }
    );
}
