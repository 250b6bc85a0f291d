//! # pointlake-types
//!
//! Logical SQL types, schema inference, and value marshalling for the
//! Pointlake driver.
//!
//! The Pointlake query service returns semi-structured JSON rows with no
//! declared schema. This crate provides the pieces that turn those rows into
//! a tabular surface:
//!
//! - [`SqlType`]: the logical column types the driver reports, inferred from
//!   sampled JSON values
//! - [`TargetType`]: the representations a caller may request when reading a
//!   value
//! - [`writer`]: bounded, truncation-aware copying into caller buffers
//! - [`convert`]: type-directed conversion of a JSON value into a requested
//!   representation
//!
//! ## Type Mappings
//!
//! | JSON value | Logical type |
//! |------------|--------------|
//! | `true` / `false` | `BIT` |
//! | integer within `i32` | `INTEGER` |
//! | wider integer | `BIGINT` |
//! | float | `DOUBLE` |
//! | string ≤ 4000 chars | `VARCHAR` |
//! | string > 4000 chars | `LONGVARCHAR` |
//! | object / array | `LONGVARCHAR` (serialized form) |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod convert;
pub mod error;
pub mod sql_type;
pub mod target;
pub mod writer;

pub use convert::{write_value, Indicator};
pub use error::ConvertError;
pub use sql_type::SqlType;
pub use target::TargetType;
pub use writer::{write_text, BoundedWrite};
