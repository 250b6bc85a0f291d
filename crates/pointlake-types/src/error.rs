//! Value conversion error types.

use thiserror::Error;

/// Errors that can occur while converting a row value into a requested
/// target representation.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A text value could not be parsed as the requested numeric type.
    #[error("cannot parse `{text}` as {target}")]
    Unparsable {
        /// The offending text.
        text: String,
        /// Target type name.
        target: &'static str,
    },

    /// The source value has no sensible rendering in the target type.
    #[error("value of type {source} is not representable as {target}")]
    NotRepresentable {
        /// Source JSON type name.
        source: &'static str,
        /// Target type name.
        target: &'static str,
    },

    /// The caller's buffer cannot hold a fixed-size value.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes needed.
        needed: usize,
        /// Bytes available.
        available: usize,
    },
}

/// Name of a JSON value's type, for diagnostics.
#[must_use]
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
