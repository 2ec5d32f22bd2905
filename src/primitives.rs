//! Text forms of the scalar types.
//!
//! Every function here is pure. Numbers use culture-invariant decimal
//! text; date-times are normalized to UTC; durations are tick counts.

use crate::descriptor::PrimitiveKind;
use crate::error::{Result, SerializationError};
use crate::type_name::names;
use crate::value::{TimeSpan, Value};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use rust_decimal::Decimal;
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";
const NAN: &str = "NaN";

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn parse_number<T>(text: &str, type_name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| SerializationError::malformed(text, type_name, e))
}

/// Parses an integer of the target width from invariant decimal text
pub fn decode_integer<T>(text: &str, type_name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    parse_number(text, type_name)
}

/// Parses a `System.Decimal` from invariant decimal text
///
/// # Errors
///
/// Returns `SerializationError::MalformedValue` for text that is not a decimal
/// number or does not fit in 96 bits of mantissa.
pub fn decode_decimal(text: &str) -> Result<Decimal> {
    parse_number(text, names::DECIMAL)
}

/// Shortest text that reads back as the same `f64`
pub fn encode_double(value: f64) -> String {
    if value.is_nan() {
        NAN.to_string()
    } else if value == f64::INFINITY {
        INFINITY.to_string()
    } else if value == f64::NEG_INFINITY {
        NEG_INFINITY.to_string()
    } else {
        value.to_string()
    }
}

/// Parses a `System.Double`, including `Infinity`, `-Infinity` and `NaN`
///
/// # Errors
///
/// Returns `SerializationError::MalformedValue` for text that is not a number.
pub fn decode_double(text: &str) -> Result<f64> {
    parse_number(text, names::DOUBLE)
}

/// Lowercase `true` or `false`
pub fn encode_boolean(value: bool) -> String {
    let text = if value { "true" } else { "false" };
    text.to_string()
}

/// Reads a boolean.
///
/// The words `True` and `False` match in any casing. Anything else goes to
/// the strict literal form, which trims whitespace and accepts only `true`,
/// `false`, `1` and `0`.
pub fn decode_boolean(text: &str) -> Result<bool> {
    if text.eq_ignore_ascii_case("True") {
        return Ok(true);
    }
    if text.eq_ignore_ascii_case("False") {
        return Ok(false);
    }
    match text.trim_matches(is_xml_whitespace) {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(SerializationError::malformed(
            text,
            names::BOOLEAN,
            "not a boolean literal",
        )),
    }
}

/// Decimal code point of the character
pub fn encode_char(value: char) -> String {
    u32::from(value).to_string()
}

/// A single character is taken as-is; longer text is read as a code point.
pub fn decode_char(text: &str) -> Result<char> {
    let mut chars = text.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(c);
    }
    let code: u32 = parse_number(text, names::CHAR)?;
    char::from_u32(code).ok_or_else(|| {
        SerializationError::malformed(text, names::CHAR, "not a unicode scalar value")
    })
}

/// `YYYY-MM-DDTHH:MM:SS[.fraction]Z`, fraction trimmed of trailing zeros
///
/// # Errors
///
/// Returns `SerializationError::MalformedValue` for years outside 1 to 9999,
/// which have no four-digit form.
pub fn encode_date_time(value: &DateTime<Utc>) -> Result<String> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&value.year()) {
        return Err(SerializationError::malformed(
            value.to_rfc3339(),
            names::DATE_TIME,
            format!("year must be between {MIN_YEAR} and {MAX_YEAR}"),
        ));
    }
    let mut text = value.format("%Y-%m-%dT%H:%M:%S").to_string();
    let nanos = value.nanosecond() % 1_000_000_000;
    if nanos > 0 {
        let fraction = format!("{nanos:09}");
        text.push('.');
        text.push_str(fraction.trim_end_matches('0'));
    }
    text.push('Z');
    Ok(text)
}

/// Reads a date-time and normalizes it to UTC.
///
/// Text with an offset is converted; text without one is already UTC. A bare
/// date means midnight.
///
/// # Errors
///
/// Returns `SerializationError::MalformedValue` for text in none of those
/// forms, or whose UTC year is outside 1 to 9999.
pub fn decode_date_time(text: &str) -> Result<DateTime<Utc>> {
    let trimmed = text.trim();
    let value = DateTime::parse_from_rfc3339(trimmed)
        .map(|value| value.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").map(|v| v.and_utc())
        })
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|value| value.and_utc())
        })
        .ok_or_else(|| {
            SerializationError::malformed(text, names::DATE_TIME, "not a date-time literal")
        })?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&value.year()) {
        return Err(SerializationError::malformed(
            text,
            names::DATE_TIME,
            format!("year must be between {MIN_YEAR} and {MAX_YEAR}"),
        ));
    }
    Ok(value)
}

/// Tick count of the span as decimal text
pub fn encode_duration(value: TimeSpan) -> String {
    value.ticks().to_string()
}

/// Reads a tick count
///
/// # Errors
///
/// Returns `SerializationError::MalformedValue` for text that is not a
/// 64-bit integer.
pub fn decode_duration(text: &str) -> Result<TimeSpan> {
    parse_number(text, names::TIME_SPAN).map(TimeSpan::from_ticks)
}

/// Lowercase hyphenated form
pub fn encode_guid(value: &Uuid) -> String {
    value.hyphenated().to_string()
}

/// Accepts the hyphenated, simple, braced and URN forms
pub fn decode_guid(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text.trim()).map_err(|e| SerializationError::malformed(text, names::GUID, e))
}

/// The null marker carries no information, so the text is never read
pub fn decode_null_marker(_text: &str) -> Value {
    Value::DbNull
}

fn mismatch(kind: PrimitiveKind, value: &Value) -> SerializationError {
    SerializationError::TypeMismatch {
        expected: kind.type_name(),
        found: value.kind_name(),
    }
}

fn narrow<T: TryFrom<i64>>(kind: PrimitiveKind, value: &Value) -> Result<T> {
    let wide = value.as_integer().ok_or_else(|| mismatch(kind, value))?;
    T::try_from(wide).map_err(|_| {
        SerializationError::malformed(wide.to_string(), kind.type_name(), "out of range")
    })
}

/// Encodes a scalar value as the text form of `kind`.
///
/// Integer values convert to any integer kind they fit in. `DbNull` has no
/// text of its own and encodes as the empty string.
pub fn encode_primitive(kind: PrimitiveKind, value: &Value) -> Result<String> {
    let text = match (kind, value) {
        (PrimitiveKind::String, Value::String(s)) => s.clone(),
        (PrimitiveKind::Guid, Value::Guid(g)) => encode_guid(g),
        (PrimitiveKind::Int16, _) => narrow::<i16>(kind, value)?.to_string(),
        (PrimitiveKind::Int32, _) => narrow::<i32>(kind, value)?.to_string(),
        (PrimitiveKind::Int64, _) => narrow::<i64>(kind, value)?.to_string(),
        (PrimitiveKind::Byte, _) => narrow::<u8>(kind, value)?.to_string(),
        (PrimitiveKind::Decimal, Value::Decimal(d)) => d.to_string(),
        (PrimitiveKind::Decimal, _) => Decimal::from(narrow::<i64>(kind, value)?).to_string(),
        (PrimitiveKind::Double, Value::Double(d)) => encode_double(*d),
        (PrimitiveKind::Boolean, Value::Boolean(b)) => encode_boolean(*b),
        (PrimitiveKind::Char, Value::Char(c)) => encode_char(*c),
        (PrimitiveKind::DateTime, Value::DateTime(dt)) => encode_date_time(dt)?,
        (PrimitiveKind::TimeSpan, Value::TimeSpan(span)) => encode_duration(*span),
        (PrimitiveKind::DbNull, Value::DbNull) => String::new(),
        _ => return Err(mismatch(kind, value)),
    };
    Ok(text)
}

/// Decodes text in the form of `kind` into a value
pub fn decode_primitive(kind: PrimitiveKind, text: &str) -> Result<Value> {
    let type_name = kind.type_name();
    let value = match kind {
        PrimitiveKind::String => Value::String(text.to_string()),
        PrimitiveKind::Guid => Value::Guid(decode_guid(text)?),
        PrimitiveKind::Int16 => Value::Int16(decode_integer(text, type_name)?),
        PrimitiveKind::Int32 => Value::Int32(decode_integer(text, type_name)?),
        PrimitiveKind::Int64 => Value::Int64(decode_integer(text, type_name)?),
        PrimitiveKind::Byte => Value::Byte(decode_integer(text, type_name)?),
        PrimitiveKind::Decimal => Value::Decimal(decode_decimal(text)?),
        PrimitiveKind::Double => Value::Double(decode_double(text)?),
        PrimitiveKind::Boolean => Value::Boolean(decode_boolean(text)?),
        PrimitiveKind::Char => Value::Char(decode_char(text)?),
        PrimitiveKind::DateTime => Value::DateTime(decode_date_time(text)?),
        PrimitiveKind::TimeSpan => Value::TimeSpan(decode_duration(text)?),
        PrimitiveKind::DbNull => decode_null_marker(text),
    };
    Ok(value)
}
