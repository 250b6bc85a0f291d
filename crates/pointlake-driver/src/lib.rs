//! # pointlake-driver
//!
//! A stateful, handle-based call-level interface over the stateless
//! Pointlake HTTP query service.
//!
//! Applications speak the classic driver protocol — allocate handles,
//! connect, execute, fetch, read column data into buffers — while the
//! driver translates each call into authenticated HTTP requests, infers a
//! tabular schema from the semi-structured responses, and marshals values
//! into caller-supplied buffers with exact truncation and null-indicator
//! semantics.
//!
//! ## Architecture
//!
//! - [`Driver`] owns a [`HandleRegistry`] of environments, connections,
//!   and statements, each carrying its own diagnostic stack
//! - [`ConnectionSession`] is the per-connection state machine:
//!   authentication, token lifetime, and the single re-authenticate-and-
//!   retry allowed on an unauthorized response
//! - [`ResultSet`] infers column types from sampled rows and drives the
//!   forward-only cursor
//! - the statement [`guard`] rejects non-read statements before anything
//!   reaches the network
//!
//! ## Example
//!
//! ```rust,ignore
//! use pointlake_driver::{Driver, SqlReturn, TargetType};
//!
//! let driver = Driver::new();
//! let (_, env) = driver.allocate_environment();
//! let (_, conn) = driver.allocate_connection(env.unwrap());
//! let conn = conn.unwrap();
//!
//! let rc = driver.driver_connect(
//!     conn,
//!     "EndpointBase=https://api.withleaf.io;UID=alice;PWD=secret;",
//!     None,
//!     None,
//! );
//! assert!(rc.is_success());
//!
//! let (_, stmt) = driver.allocate_statement(conn);
//! let stmt = stmt.unwrap();
//! driver.execute_direct(stmt, "SELECT crop, feature_count FROM points");
//!
//! let mut buf = [0u8; 256];
//! while driver.fetch(stmt) == SqlReturn::Success {
//!     driver.get_data(stmt, 1, TargetType::Char, Some(&mut buf), None);
//! }
//! ```
//!
//! Execution is synchronous: a call that talks to the backend blocks its
//! thread until the response or the configured timeout. Distinct handles
//! may be used from different threads concurrently; operations on one
//! handle serialize through that handle's lock.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod diag;
pub mod driver;
pub mod error;
pub mod guard;
pub mod registry;
pub mod resultset;
pub mod session;

// Re-export commonly used types
pub use config::ConnectionConfig;
pub use diag::{DiagField, DiagnosticRecord, DiagnosticStack};
pub use driver::{Driver, HandleRef, SqlReturn, ATTR_PROTOCOL_VERSION};
pub use error::DriverError;
pub use pointlake_http::{HttpQueryService, QueryService, ServiceError};
pub use pointlake_types::{Indicator, SqlType, TargetType};
pub use registry::{ConnectionId, EnvironmentId, HandleRegistry, StatementId};
pub use resultset::{ColumnDescriptor, ResultSet};
pub use session::{ConnectionSession, HttpServiceFactory, ServiceFactory, SessionState};
