//! Logical column types and inference from JSON values.

use serde_json::Value;

/// Longest string reported as bounded `VARCHAR`; anything longer becomes
/// `LONGVARCHAR`.
pub const VARCHAR_LIMIT: usize = 4000;

/// Logical SQL type of an inferred result column.
///
/// The backend returns untyped JSON, so column types are inferred from the
/// first rows of each result set. The set of types is deliberately small:
/// it covers exactly what JSON can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// Boolean (BIT).
    Bit,
    /// 32-bit signed integer (INTEGER).
    Integer,
    /// 64-bit signed integer (BIGINT).
    BigInt,
    /// 64-bit floating point (DOUBLE).
    Double,
    /// Bounded text (VARCHAR, display size 4000).
    Varchar,
    /// Unbounded text (LONGVARCHAR); also the rendering of nested
    /// objects and arrays.
    LongVarchar,
}

impl SqlType {
    /// Infer the logical type of a single JSON value.
    ///
    /// `null` yields the default `Varchar`; callers looking at a whole
    /// column should skip nulls and inspect the first present value.
    #[must_use]
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Null => Self::Varchar,
            Value::Bool(_) => Self::Bit,
            Value::Number(n) => {
                if n.is_f64() {
                    Self::Double
                } else if n.as_i64().is_some_and(|v| {
                    v >= i64::from(i32::MIN) && v <= i64::from(i32::MAX)
                }) {
                    Self::Integer
                } else {
                    Self::BigInt
                }
            }
            Value::String(s) => {
                if s.chars().count() > VARCHAR_LIMIT {
                    Self::LongVarchar
                } else {
                    Self::Varchar
                }
            }
            Value::Array(_) | Value::Object(_) => Self::LongVarchar,
        }
    }

    /// Canonical type name string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bit => "BIT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Double => "DOUBLE",
            Self::Varchar => "VARCHAR",
            Self::LongVarchar => "LONGVARCHAR",
        }
    }

    /// Display size derived solely from the logical type.
    ///
    /// `0` means variable / unbounded.
    #[must_use]
    pub fn display_size(&self) -> u32 {
        match self {
            Self::Bit => 1,
            Self::Integer => 10,
            Self::BigInt => 19,
            Self::Double => 15,
            Self::Varchar => VARCHAR_LIMIT as u32,
            Self::LongVarchar => 0,
        }
    }

    /// The ODBC type code for this logical type, as surfaced in catalog
    /// listings and column descriptions.
    #[must_use]
    pub fn code(&self) -> i16 {
        match self {
            Self::Bit => -7,
            Self::Integer => 4,
            Self::BigInt => -5,
            Self::Double => 8,
            Self::Varchar => 12,
            Self::LongVarchar => -1,
        }
    }
}
