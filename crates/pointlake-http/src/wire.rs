//! Wire-level request/response shapes and payload normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of the authentication request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest<'a> {
    /// Account username.
    pub username: &'a str,
    /// Account password.
    pub password: &'a str,
    /// Ask the service for a long-lived token.
    pub remember_me: bool,
}

/// Body of a successful authentication response.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    /// The bearer token identifying this session.
    pub id_token: String,
}

/// Extract the row list from a query response payload.
///
/// The service answers in one of three shapes:
///
/// - a bare array of row objects,
/// - an object with a `rows` array,
/// - an object whose `rows` field is itself an object carrying a nested
///   `rows` array.
///
/// Anything else yields an empty row list rather than an error; the caller
/// sees a result set with zero rows.
#[must_use]
pub fn normalize_rows(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("rows") {
            Some(Value::Array(rows)) => rows,
            Some(Value::Object(mut inner)) => match inner.remove("rows") {
                Some(Value::Array(rows)) => rows,
                _ => {
                    tracing::debug!("query response `rows.rows` is not an array");
                    Vec::new()
                }
            },
            _ => {
                tracing::debug!("query response object has no usable `rows` field");
                Vec::new()
            }
        },
        _ => {
            tracing::debug!("query response is neither an array nor an object");
            Vec::new()
        }
    }
}
