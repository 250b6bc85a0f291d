//! Driver error types and their diagnostic state codes.

use thiserror::Error;

use pointlake_types::ConvertError;

/// Errors raised by driver operations.
///
/// Every variant carries a stable five-character state code; the CLI layer
/// records the error as a diagnostic on the owning handle and maps it to a
/// non-success return code. Invalid handles are not represented here — there
/// is no live handle to attach a diagnostic to, so they surface directly as
/// [`crate::SqlReturn::InvalidHandle`].
#[derive(Debug, Error)]
pub enum DriverError {
    /// The requested attribute is not recognized.
    #[error("invalid attribute")]
    InvalidAttribute,

    /// Execute was called without a prior prepare.
    #[error("function sequence error")]
    Sequence,

    /// Fetch or data retrieval without a validly positioned cursor.
    #[error("invalid cursor state")]
    CursorState,

    /// Column ordinal outside `[1, column_count]`.
    #[error("column index {0} out of range")]
    InvalidColumn(u16),

    /// The statement is not a read statement.
    #[error("only SELECT statements are allowed")]
    StatementNotAllowed,

    /// The owning connection is missing or not connected.
    #[error("connection not established")]
    NotConnected,

    /// Authentication or re-authentication was rejected.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The backend reported a non-auth failure, or the post-reauth retry
    /// failed.
    #[error("query execution failed: {0}")]
    ExecutionFailed(String),

    /// The value could not be converted to the requested representation.
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConvertError),

    /// The connection configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DriverError {
    /// The stable state code recorded with this error's diagnostic.
    #[must_use]
    pub fn state_code(&self) -> &'static str {
        match self {
            Self::InvalidAttribute => "HY092",
            Self::Sequence => "HY010",
            Self::CursorState => "24000",
            Self::InvalidColumn(_) => "07009",
            Self::StatementNotAllowed => "42000",
            Self::NotConnected => "08003",
            Self::AuthenticationFailed(_) => "28000",
            Self::Conversion(_) => "07006",
            Self::ExecutionFailed(_) | Self::Config(_) => "HY000",
        }
    }

    /// The native error number recorded with this error's diagnostic.
    ///
    /// The backend does not expose numeric error codes, so this is
    /// currently always zero.
    #[must_use]
    pub fn native_code(&self) -> i32 {
        0
    }
}

/// Result type for driver-internal operations.
pub type Result<T> = std::result::Result<T, DriverError>;
