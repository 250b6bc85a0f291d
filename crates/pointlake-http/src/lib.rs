//! # pointlake-http
//!
//! HTTP/JSON backend client for the Pointlake query service.
//!
//! The service is stateless: it authenticates a username/password pair into
//! a bearer token, and executes raw SQL text against a selectable engine,
//! returning rows as semi-structured JSON. This crate owns that wire
//! contract and nothing else; session state, retry policy, and result
//! marshalling live in `pointlake-driver`.
//!
//! The transport is synchronous — a request blocks the calling thread until
//! the response arrives or the configured timeout expires. There is no
//! cancellation primitive.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod http;
pub mod service;
pub mod wire;

pub use error::ServiceError;
pub use http::HttpQueryService;
pub use service::QueryService;
