//! Text helpers shared by mirror rendering and the protocol encoders.

use chrono::{DateTime, Utc};

/// Maximum number of characters of a string sent through the protocol.
pub const MAX_PROTOCOL_STRING_LENGTH: usize = 80;

/// Render a number the way the debuggee's language prints it
///
/// Integral values print without a fraction, non-finite values print as
/// `NaN` / `Infinity` / `-Infinity`, and very large or very small magnitudes
/// use exponent notation with an explicit sign (`1e+21`).
#[must_use]
pub fn number_to_string(value: f64) -> String
{
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if !(1e-7..1e21).contains(&magnitude) {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
            _ => formatted,
        };
    }
    if value.fract() == 0.0 && magnitude < 9_007_199_254_740_992.0 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

/// ISO-8601 rendering of a time value (milliseconds since the epoch).
///
/// Always in UTC with millisecond precision, e.g. `2008-01-02T03:04:05.006Z`.
/// Time values outside the representable range render as `Invalid Date`.
#[must_use]
pub fn date_to_iso8601(time_value: f64) -> String
{
    if !time_value.is_finite() {
        return "Invalid Date".to_string();
    }
    match DateTime::<Utc>::from_timestamp_millis(time_value as i64) {
        Some(date) => date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// Prefix a constructor name with the matching indefinite article
///
/// `Object` becomes `an Object`, `Point` becomes `a Point`. Names that start
/// with two capitals are read as acronyms, so `HTMLElement` becomes
/// `an HTMLElement`.
#[must_use]
pub fn instance_name(constructor: &str) -> String
{
    let mut chars = constructor.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let acronym = first.is_uppercase() && chars.next().is_some_and(char::is_uppercase);

    let lower = first.to_ascii_lowercase();
    let vowel_sound = if acronym {
        matches!(
            lower,
            'a' | 'e' | 'i' | 'o' | 'u' | 'h' | 'f' | 'l' | 'm' | 'n' | 'r' | 's' | 'x' | 'y'
        )
    } else {
        matches!(lower, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
    };

    let article = if vowel_sound { "an" } else { "a" };
    format!("{article} {constructor}")
}

/// Number of characters in `value` (not bytes).
#[must_use]
pub fn char_length(value: &str) -> usize
{
    value.chars().count()
}

/// The first `max` characters of `value`.
#[must_use]
pub fn truncate_chars(value: &str, max: usize) -> &str
{
    match value.char_indices().nth(max) {
        Some((byte_index, _)) => &value[..byte_index],
        None => value,
    }
}
