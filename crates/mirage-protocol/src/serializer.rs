//! # Mirror Serialization
//!
//! Encodes [`Mirror`]s as protocol JSON objects.
//!
//! Every object carries `type` first and `text` last. With details enabled,
//! object-like mirrors also list their constructor, prototype links and
//! properties; every nested mirror is serialized in summary form, so the
//! output is at most one level deep and reference cycles in the debuggee heap
//! cannot make serialization recurse.
//!
//! ## Example
//!
//! ```rust
//! use mirage_core::prelude::*;
//! use mirage_protocol::serializer::JsonProtocolSerializer;
//!
//! let heap = HeapSnapshot::new();
//! let json = JsonProtocolSerializer::new(false)
//!     .serialize(&mirror_for(&heap, HostValue::from(3)))
//!     .unwrap();
//! assert_eq!(json, r#"{"type":"number","value":3,"text":"3"}"#);
//! ```

use mirage_core::details::{PropertyAttributes, PropertyKind, PropertyType};
use mirage_core::mirror::{FrameMirror, Mirror};
use mirage_core::text::{truncate_chars, MAX_PROTOCOL_STRING_LENGTH};
use mirage_core::{MirrorResult, Script};
use tracing::trace;

use crate::json::{bool_to_json, date_to_json, make_pair, number_to_json, pairs_to_object, string_to_json, values_to_array};

/// Serializer for one top-level mirror
#[derive(Debug, Clone, Copy)]
pub struct JsonProtocolSerializer
{
    details: bool,
}

impl JsonProtocolSerializer
{
    /// `details` selects the full form for the top-level mirror.
    #[must_use]
    pub const fn new(details: bool) -> Self
    {
        Self { details }
    }

    /// Serialize `mirror`.
    ///
    /// ## Errors
    ///
    /// Fails only for frame mirrors whose break episode is over.
    pub fn serialize(&self, mirror: &Mirror<'_>) -> MirrorResult<String>
    {
        trace!(mirror_type = %mirror.mirror_type(), details = self.details, "serializing mirror");
        serialize_mirror(mirror, self.details)
    }
}

/// Serialize `mirror` with the given level of detail.
///
/// ## Errors
///
/// Fails only for frame mirrors whose break episode is over.
pub fn to_json_protocol(mirror: &Mirror<'_>, details: bool) -> MirrorResult<String>
{
    JsonProtocolSerializer::new(details).serialize(mirror)
}

fn summary(mirror: &Mirror<'_>) -> MirrorResult<String>
{
    serialize_mirror(mirror, false)
}

fn serialize_mirror(mirror: &Mirror<'_>, details: bool) -> MirrorResult<String>
{
    let mut content = vec![make_pair("type", &string_to_json(mirror.mirror_type().as_str()))];

    match mirror {
        Mirror::Undefined | Mirror::Null => {}
        Mirror::Boolean(b) => content.push(make_pair("value", &bool_to_json(*b))),
        Mirror::Number(n) => content.push(make_pair("value", &number_to_json(*n))),
        Mirror::String(s) => {
            let length = s.chars().count();
            if length > MAX_PROTOCOL_STRING_LENGTH {
                let cropped = truncate_chars(s, MAX_PROTOCOL_STRING_LENGTH);
                content.push(make_pair("value", &string_to_json(cropped)));
                content.push(make_pair("fromIndex", &number_to_json(0.0)));
                content.push(make_pair("toIndex", &MAX_PROTOCOL_STRING_LENGTH.to_string()));
            } else {
                content.push(make_pair("value", &string_to_json(s)));
            }
            content.push(make_pair("length", &length.to_string()));
        }
        Mirror::Object(_)
        | Mirror::Array(_)
        | Mirror::Date(_)
        | Mirror::Function(_)
        | Mirror::RegExp(_)
        | Mirror::Error(_) => serialize_object(mirror, details, &mut content)?,
        Mirror::Property(property) => {
            content.push(make_pair("name", &string_to_json(property.name())));
            content.push(make_pair("value", &summary(&property.value())?));
            if property.attributes() != PropertyAttributes::NONE {
                content.push(make_pair("attributes", &property.attributes().bits().to_string()));
            }
            if property.property_type() != PropertyType::Normal {
                content.push(make_pair("propertyType", &property.property_type().code().to_string()));
            }
        }
        Mirror::Accessor(accessor) => {
            if accessor.is_native() {
                content.push(make_pair("native", &bool_to_json(true)));
            } else {
                content.push(make_pair("getter", &summary(&accessor.getter())?));
                content.push(make_pair("setter", &summary(&accessor.setter())?));
            }
        }
        Mirror::Frame(frame) => serialize_frame(frame, &mut content)?,
        Mirror::Script(script) => serialize_script(script, &mut content),
    }

    content.push(make_pair("text", &string_to_json(&mirror.to_text()?)));
    Ok(pairs_to_object(&content))
}

fn serialize_object(mirror: &Mirror<'_>, details: bool, content: &mut Vec<String>) -> MirrorResult<()>
{
    let class_name = mirror.class_name().unwrap_or_default();
    content.push(make_pair("className", &string_to_json(&class_name)));

    let object = mirror.as_object();

    if details {
        content.push(make_pair("constructorFunction", &summary(&mirror.constructor_function())?));
        content.push(make_pair("protoObject", &summary(&mirror.proto_object())?));
        content.push(make_pair("prototypeObject", &summary(&mirror.prototype_object())?));

        // arrays list their elements separately below
        let kind = if mirror.is_array() {
            PropertyKind::NAMED
        } else {
            PropertyKind::NAMED | PropertyKind::INDEXED
        };
        let properties = mirror
            .properties(kind, None)
            .iter()
            .map(summary)
            .collect::<MirrorResult<Vec<_>>>()?;
        content.push(make_pair("properties", &values_to_array(&properties)));

        let interceptor_properties = object
            .map(|o| o.interceptor_properties(PropertyKind::default(), None))
            .unwrap_or_default()
            .iter()
            .map(summary)
            .collect::<MirrorResult<Vec<_>>>()?;
        content.push(make_pair("interceptorProperties", &values_to_array(&interceptor_properties)));

        if let (true, Some(array)) = (mirror.is_array(), object) {
            let indexed = mirror
                .properties(PropertyKind::INDEXED, None)
                .iter()
                .map(summary)
                .collect::<MirrorResult<Vec<_>>>()?;
            content.push(make_pair("indexedProperties", &values_to_array(&indexed)));
            content.push(make_pair("length", &array.length().to_string()));
        }
    }

    if object.is_some_and(|o| o.has_named_interceptor()) {
        content.push(make_pair("namedInterceptor", &bool_to_json(true)));
    }
    if object.is_some_and(|o| o.has_indexed_interceptor()) {
        content.push(make_pair("indexedInterceptor", &bool_to_json(true)));
    }

    match mirror {
        Mirror::Function(function) => {
            content.push(make_pair("name", &string_to_json(&function.name())));
            content.push(make_pair("resolved", &bool_to_json(function.resolved())));
            if details {
                if let Some(source) = function.source() {
                    content.push(make_pair("source", &string_to_json(&source)));
                }
            }
            if let Some(script) = function.script() {
                content.push(make_pair("script", &summary(&Mirror::Script(script))?));
            }
        }
        Mirror::Date(date) => content.push(make_pair("value", &date_to_json(date.date_value()))),
        Mirror::RegExp(regexp) => {
            let info = regexp.regexp();
            content.push(make_pair("source", &string_to_json(&info.source)));
            content.push(make_pair("global", &bool_to_json(info.global)));
            content.push(make_pair("ignoreCase", &bool_to_json(info.ignore_case)));
            content.push(make_pair("multiline", &bool_to_json(info.multiline)));
        }
        Mirror::Error(error) => {
            let message = error.error_message().unwrap_or_default();
            content.push(make_pair("message", &string_to_json(&message)));
        }
        _ => {}
    }

    Ok(())
}

fn serialize_frame(frame: &FrameMirror<'_>, content: &mut Vec<String>) -> MirrorResult<()>
{
    content.push(make_pair("index", &frame.index().to_string()));
    content.push(make_pair("receiver", &summary(&frame.receiver()?)?));
    content.push(make_pair("func", &summary(&frame.func()?)?));
    content.push(make_pair("constructCall", &bool_to_json(frame.is_construct_call()?)));
    content.push(make_pair("debuggerFrame", &bool_to_json(frame.is_debugger_frame()?)));

    let mut arguments = Vec::new();
    for i in 0..frame.argument_count()? {
        let mut argument = Vec::new();
        if let Some(name) = frame.argument_name(i)? {
            argument.push(make_pair("name", &string_to_json(&name)));
        }
        argument.push(make_pair("value", &summary(&frame.argument_value(i)?)?));
        arguments.push(pairs_to_object(&argument));
    }
    content.push(make_pair("arguments", &values_to_array(&arguments)));

    let mut locals = Vec::new();
    for i in 0..frame.local_count()? {
        let name = frame.local_name(i)?.unwrap_or_default();
        let local = [
            make_pair("name", &string_to_json(&name)),
            make_pair("value", &summary(&frame.local_value(i)?)?),
        ];
        locals.push(pairs_to_object(&local));
    }
    content.push(make_pair("locals", &values_to_array(&locals)));

    if let Some(position) = frame.source_position()? {
        content.push(make_pair("position", &position.to_string()));
    }
    if let Some(location) = frame.source_location()? {
        content.push(make_pair("line", &location.line.to_string()));
        content.push(make_pair("column", &location.column.to_string()));
        content.push(make_pair("sourceLineText", &string_to_json(&location.source_text)));
    }
    Ok(())
}

fn serialize_script(script: &Script, content: &mut Vec<String>)
{
    if let Some(name) = script.name() {
        content.push(make_pair("name", &string_to_json(name)));
    }
    content.push(make_pair("lineOffset", &script.line_offset().to_string()));
    content.push(make_pair("columnOffset", &script.column_offset().to_string()));
    content.push(make_pair("lineCount", &script.line_count().to_string()));
    content.push(make_pair("scriptType", &script.script_type().code().to_string()));
}
