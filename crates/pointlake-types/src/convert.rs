//! Type-directed conversion of JSON row values into caller buffers.

use serde_json::Value;

use crate::error::{json_type_name, ConvertError};
use crate::target::TargetType;
use crate::writer::write_text;

/// Length-or-null indicator accompanying a retrieved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// The field is absent or JSON null; nothing was written.
    Null,
    /// Logical byte length of the value. For text this is the untruncated
    /// length; for fixed-size types it is the size of the written value.
    Bytes(usize),
}

impl Indicator {
    /// Whether the indicator marks a null value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Render a JSON value in its canonical text form.
///
/// Strings render without quotes, booleans as `1`/`0`, numbers in their
/// canonical decimal form, and structured values as serialized JSON.
#[must_use]
pub fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        other => other.to_string(),
    }
}

/// Convert `value` into the requested representation and write it into
/// `buffer`.
///
/// A `None` buffer with a present value is reported as null rather than an
/// error; callers probing only for nullness get a harmless no-op. Text
/// targets copy up to `capacity - 1` bytes plus a NUL terminator and report
/// the untruncated length; fixed-size targets require the buffer to hold the
/// whole value and report its size.
pub fn write_value(
    value: &Value,
    target: TargetType,
    buffer: Option<&mut [u8]>,
) -> Result<Indicator, ConvertError> {
    if value.is_null() {
        return Ok(Indicator::Null);
    }
    let Some(buffer) = buffer else {
        return Ok(Indicator::Null);
    };

    match target {
        TargetType::Bit => {
            let bit = to_bool(value);
            write_scalar(buffer, &[u8::from(bit)])
        }
        TargetType::Long => {
            let v = to_i32(value)?;
            write_scalar(buffer, &v.to_ne_bytes())
        }
        TargetType::BigInt => {
            let v = to_i64(value)?;
            write_scalar(buffer, &v.to_ne_bytes())
        }
        TargetType::Double => {
            let v = to_f64(value)?;
            write_scalar(buffer, &v.to_ne_bytes())
        }
        // Char, WChar, and everything without a dedicated rule.
        _ => {
            let text = render_text(value);
            let written = write_text(buffer, &text);
            Ok(Indicator::Bytes(written.length))
        }
    }
}

fn write_scalar(buffer: &mut [u8], bytes: &[u8]) -> Result<Indicator, ConvertError> {
    if buffer.len() < bytes.len() {
        return Err(ConvertError::BufferTooSmall {
            needed: bytes.len(),
            available: buffer.len(),
        });
    }
    buffer[..bytes.len()].copy_from_slice(bytes);
    Ok(Indicator::Bytes(bytes.len()))
}

/// Boolean reading of a JSON value: boolean truth, non-zero number, or one
/// of the text literals `true`, `1`, `yes`. Everything else is false.
#[must_use]
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

/// 32-bit integer reading: numbers truncate toward zero, text parses
/// strictly, booleans map to `0`/`1`.
pub fn to_i32(value: &Value) -> Result<i32, ConvertError> {
    to_i64(value).map(|v| v as i32)
}

/// 64-bit integer reading: numbers truncate toward zero, text parses
/// strictly, booleans map to `0`/`1`.
pub fn to_i64(value: &Value) -> Result<i64, ConvertError> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(v)
            } else if let Some(v) = n.as_u64() {
                Ok(v as i64)
            } else {
                // Truncation toward zero from float.
                Ok(n.as_f64().unwrap_or(0.0) as i64)
            }
        }
        Value::String(s) => s.trim().parse().map_err(|_| ConvertError::Unparsable {
            text: s.clone(),
            target: "integer",
        }),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(ConvertError::NotRepresentable {
            source: json_type_name(other),
            target: "integer",
        }),
    }
}

/// Double reading: numbers convert directly, text parses strictly,
/// booleans map to `0.0`/`1.0`.
pub fn to_f64(value: &Value) -> Result<f64, ConvertError> {
    match value {
        Value::Number(n) => Ok(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => s.trim().parse().map_err(|_| ConvertError::Unparsable {
            text: s.clone(),
            target: "double",
        }),
        Value::Bool(b) => Ok(f64::from(u8::from(*b))),
        other => Err(ConvertError::NotRepresentable {
            source: json_type_name(other),
            target: "double",
        }),
    }
}
