//! # JSON Encoding
//!
//! Hand-written encoders for protocol output.
//!
//! The wire format is JSON text, but a few details are part of the protocol
//! contract rather than generic JSON: numbers print the way the debuggee's
//! language prints them (`NaN`, `Infinity`, integers without a fraction),
//! control characters use two-digit `\u00XX` escapes, and undefined members
//! are omitted instead of encoded. The helpers here produce exactly that.

use mirage_core::text::{date_to_iso8601, number_to_string};

/// Encode a string, escaping `"`, `\` and control characters.
///
/// Strings that need no escaping are quoted as-is.
#[must_use]
pub fn string_to_json(value: &str) -> String
{
    if !value.chars().any(needs_escape) {
        return format!("\"{value}\"");
    }

    let mut json = String::with_capacity(value.len() + 8);
    json.push('"');
    for c in value.chars() {
        match c {
            '\u{8}' => json.push_str("\\b"),
            '\t' => json.push_str("\\t"),
            '\n' => json.push_str("\\n"),
            '\u{c}' => json.push_str("\\f"),
            '\r' => json.push_str("\\r"),
            '"' => json.push_str("\\\""),
            '\\' => json.push_str("\\\\"),
            c if u32::from(c) < 0x20 => json.push_str(&format!("\\u00{:02x}", u32::from(c))),
            c => json.push(c),
        }
    }
    json.push('"');
    json
}

const fn needs_escape(c: char) -> bool
{
    c == '"' || c == '\\' || (c as u32) < 0x20
}

#[must_use]
pub fn number_to_json(value: f64) -> String
{
    number_to_string(value)
}

#[must_use]
pub fn bool_to_json(value: bool) -> String
{
    value.to_string()
}

/// Quoted ISO-8601 rendering of a time value.
#[must_use]
pub fn date_to_json(time_value: f64) -> String
{
    format!("\"{}\"", date_to_iso8601(time_value))
}

/// `"name":value` where `value` is already encoded.
///
/// `name` is inserted unescaped, so it must be a plain key with no quotes,
/// backslashes or control characters.
#[must_use]
pub fn make_pair(name: &str, value: &str) -> String
{
    format!("\"{name}\":{value}")
}

/// Join encoded pairs into an object.
#[must_use]
pub fn pairs_to_object(content: &[String]) -> String
{
    format!("{{{}}}", content.join(","))
}

/// Join encoded values into an array.
#[must_use]
pub fn values_to_array(content: &[String]) -> String
{
    format!("[{}]", content.join(","))
}

/// Loosely typed value for the generic object/array encoders
///
/// Request arguments are built from these. [`ProtocolValue::Encoded`] carries
/// a value that was already serialized by its owner and is spliced in as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolValue
{
    /// Absent; omitted from objects
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<ProtocolValue>),
    /// Members in insertion order
    Object(Vec<(String, ProtocolValue)>),
    Encoded(String),
}

impl ProtocolValue
{
    /// Empty object, to be filled with [`ProtocolValue::with`].
    #[must_use]
    pub const fn object() -> Self
    {
        Self::Object(Vec::new())
    }

    /// Append a member.
    ///
    /// Only objects have members; calling this on any other value is a bug
    /// and trips a debug assertion (release builds leave the value unchanged).
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<ProtocolValue>) -> Self
    {
        debug_assert!(
            matches!(self, Self::Object(_)),
            "ProtocolValue::with(\"{key}\") called on a non-object"
        );
        if let Self::Object(members) = &mut self {
            members.push((key.to_string(), value.into()));
        }
        self
    }

    #[must_use]
    pub fn to_json(&self) -> String
    {
        match self {
            Self::Undefined => "null".to_string(),
            Self::Bool(b) => bool_to_json(*b),
            Self::Number(n) => number_to_json(*n),
            Self::String(s) => string_to_json(s),
            Self::Array(items) => simple_array_to_json(items),
            Self::Object(members) => simple_object_to_json(members),
            Self::Encoded(json) => json.clone(),
        }
    }
}

impl From<bool> for ProtocolValue
{
    fn from(value: bool) -> Self
    {
        Self::Bool(value)
    }
}

impl From<f64> for ProtocolValue
{
    fn from(value: f64) -> Self
    {
        Self::Number(value)
    }
}

impl From<u32> for ProtocolValue
{
    fn from(value: u32) -> Self
    {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for ProtocolValue
{
    fn from(value: i64) -> Self
    {
        Self::Number(value as f64)
    }
}

impl From<&str> for ProtocolValue
{
    fn from(value: &str) -> Self
    {
        Self::String(value.to_string())
    }
}

impl From<String> for ProtocolValue
{
    fn from(value: String) -> Self
    {
        Self::String(value)
    }
}

impl<T: Into<ProtocolValue>> From<Option<T>> for ProtocolValue
{
    fn from(value: Option<T>) -> Self
    {
        value.map_or(Self::Undefined, Into::into)
    }
}

/// Encode object members in order, skipping undefined ones.
#[must_use]
pub fn simple_object_to_json(members: &[(String, ProtocolValue)]) -> String
{
    let content: Vec<String> = members
        .iter()
        .filter(|(_, value)| *value != ProtocolValue::Undefined)
        .map(|(key, value)| format!("{}:{}", string_to_json(key), value.to_json()))
        .collect();
    pairs_to_object(&content)
}

/// Encode array items in order; undefined items become `null`.
#[must_use]
pub fn simple_array_to_json(items: &[ProtocolValue]) -> String
{
    let content: Vec<String> = items.iter().map(ProtocolValue::to_json).collect();
    values_to_array(&content)
}
