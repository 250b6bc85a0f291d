//! The call-level interface: handle-based entry points over the session and
//! result-set engines.
//!
//! Every entry point returns a [`SqlReturn`] code; failures are recorded as
//! diagnostics on the most specific owning handle and never escape as
//! panics or errors. String outputs follow the bounded-writer contract:
//! the driver copies up to `capacity - 1` bytes plus a NUL terminator and
//! reports the untruncated length, so callers detect truncation by
//! comparing the reported length against their buffer.

use std::sync::Arc;

use pointlake_types::{write_text, Indicator, SqlType, TargetType};

use crate::catalog;
use crate::config::{self, ConnectionConfig};
use crate::diag::{DiagField, DiagnosticStack};
use crate::error::DriverError;
use crate::registry::{
    Connection, ConnectionId, EnvironmentId, HandleRegistry, Statement, StatementId,
    StatementState,
};
use crate::resultset::ResultSet;
use crate::session::{HttpServiceFactory, ServiceFactory};

/// Attribute id of the environment's protocol-version setting.
pub const ATTR_PROTOCOL_VERSION: u32 = 200;

/// Return code of a CLI call. No other signal crosses this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum SqlReturn {
    /// The call completed.
    Success,
    /// The call completed with a warning diagnostic.
    SuccessWithInfo,
    /// The call failed; a diagnostic was recorded on the handle.
    Error,
    /// There is nothing (more) to return.
    NoData,
    /// The handle does not refer to a live object.
    InvalidHandle,
}

impl SqlReturn {
    /// Whether the call completed (with or without info).
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::SuccessWithInfo)
    }
}

/// A handle of any kind, for the diagnostic entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleRef {
    /// An environment handle.
    Environment(EnvironmentId),
    /// A connection handle.
    Connection(ConnectionId),
    /// A statement handle.
    Statement(StatementId),
}

impl From<EnvironmentId> for HandleRef {
    fn from(id: EnvironmentId) -> Self {
        Self::Environment(id)
    }
}

impl From<ConnectionId> for HandleRef {
    fn from(id: ConnectionId) -> Self {
        Self::Connection(id)
    }
}

impl From<StatementId> for HandleRef {
    fn from(id: StatementId) -> Self {
        Self::Statement(id)
    }
}

/// The driver: one registry of live handles plus the service factory used
/// to reach the backend.
///
/// Construct one per process at load time and tear it down explicitly;
/// tests build fresh instances, usually with a fake service factory.
pub struct Driver {
    registry: HandleRegistry,
    factory: Arc<dyn ServiceFactory>,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    /// A driver talking HTTP to the real service.
    #[must_use]
    pub fn new() -> Self {
        Self::with_service_factory(Arc::new(HttpServiceFactory))
    }

    /// A driver with a custom backend factory (fakes, alternate
    /// transports).
    #[must_use]
    pub fn with_service_factory(factory: Arc<dyn ServiceFactory>) -> Self {
        Self {
            registry: HandleRegistry::new(),
            factory,
        }
    }

    // ------------------------------------------------------------------
    // Handle allocation and release
    // ------------------------------------------------------------------

    /// Allocate an environment.
    pub fn allocate_environment(&self) -> (SqlReturn, Option<EnvironmentId>) {
        (SqlReturn::Success, Some(self.registry.allocate_environment()))
    }

    /// Allocate a connection under `environment`.
    pub fn allocate_connection(
        &self,
        environment: EnvironmentId,
    ) -> (SqlReturn, Option<ConnectionId>) {
        match self.registry.allocate_connection(environment) {
            Some(id) => (SqlReturn::Success, Some(id)),
            None => (SqlReturn::InvalidHandle, None),
        }
    }

    /// Allocate a statement under `connection`.
    pub fn allocate_statement(&self, connection: ConnectionId) -> (SqlReturn, Option<StatementId>) {
        match self.registry.allocate_statement(connection) {
            Some(id) => (SqlReturn::Success, Some(id)),
            None => (SqlReturn::InvalidHandle, None),
        }
    }

    /// Free an environment.
    pub fn free_environment(&self, environment: EnvironmentId) -> SqlReturn {
        if self.registry.free_environment(environment) {
            SqlReturn::Success
        } else {
            SqlReturn::InvalidHandle
        }
    }

    /// Free a connection.
    pub fn free_connection(&self, connection: ConnectionId) -> SqlReturn {
        if self.registry.free_connection(connection) {
            SqlReturn::Success
        } else {
            SqlReturn::InvalidHandle
        }
    }

    /// Free a statement.
    pub fn free_statement(&self, statement: StatementId) -> SqlReturn {
        if self.registry.free_statement(statement) {
            SqlReturn::Success
        } else {
            SqlReturn::InvalidHandle
        }
    }

    // ------------------------------------------------------------------
    // Environment attributes
    // ------------------------------------------------------------------

    /// Set an environment attribute.
    ///
    /// Only [`ATTR_PROTOCOL_VERSION`] is recognized; anything else records
    /// an invalid-attribute diagnostic.
    pub fn set_environment_attr(
        &self,
        environment: EnvironmentId,
        attribute: u32,
        value: u32,
    ) -> SqlReturn {
        let Some(env) = self.registry.environment(environment) else {
            return SqlReturn::InvalidHandle;
        };
        if attribute == ATTR_PROTOCOL_VERSION {
            env.set_protocol_version(value);
            SqlReturn::Success
        } else {
            env.diagnostics.push_error(&DriverError::InvalidAttribute);
            SqlReturn::Error
        }
    }

    /// Read an environment attribute into `value`.
    pub fn environment_attr(
        &self,
        environment: EnvironmentId,
        attribute: u32,
        value: Option<&mut u32>,
    ) -> SqlReturn {
        let Some(env) = self.registry.environment(environment) else {
            return SqlReturn::InvalidHandle;
        };
        if attribute == ATTR_PROTOCOL_VERSION {
            if let Some(value) = value {
                *value = env.protocol_version();
            }
            SqlReturn::Success
        } else {
            env.diagnostics.push_error(&DriverError::InvalidAttribute);
            SqlReturn::Error
        }
    }

    // ------------------------------------------------------------------
    // Connecting
    // ------------------------------------------------------------------

    /// Connect using a DSN name with optional credential overrides.
    pub fn connect(
        &self,
        connection: ConnectionId,
        dsn: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> SqlReturn {
        let Some(conn) = self.registry.connection(connection) else {
            return SqlReturn::InvalidHandle;
        };
        conn.diagnostics.clear();

        let mut config = config::resolve_dsn(dsn);
        if let Some(username) = username.filter(|u| !u.is_empty()) {
            config.username = username.to_string();
        }
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            config.password = password.to_string();
        }

        self.establish(&conn, config)
    }

    /// Connect using a full connection string, merging in a DSN entry when
    /// one is named.
    ///
    /// The string actually used is copied back into `completed` (bounded,
    /// NUL-terminated), with its full length in `completed_length`.
    pub fn driver_connect(
        &self,
        connection: ConnectionId,
        connection_string: &str,
        completed: Option<&mut [u8]>,
        completed_length: Option<&mut usize>,
    ) -> SqlReturn {
        let Some(conn) = self.registry.connection(connection) else {
            return SqlReturn::InvalidHandle;
        };
        conn.diagnostics.clear();

        let overrides = ConnectionConfig::from_connection_string(connection_string);
        let config = match config::dsn_name(connection_string) {
            Some(dsn) => ConnectionConfig::merge(config::resolve_dsn(&dsn), overrides),
            None => overrides,
        };

        let outcome = self.establish(&conn, config);
        if outcome.is_success() {
            let mut length = connection_string.len();
            if let Some(completed) = completed {
                length = write_text(completed, connection_string).length;
            }
            if let Some(completed_length) = completed_length {
                *completed_length = length;
            }
        }
        outcome
    }

    fn establish(&self, conn: &Connection, config: ConnectionConfig) -> SqlReturn {
        let service = match self.factory.create(&config) {
            Ok(service) => service,
            Err(err) => {
                conn.diagnostics.push_error(&err);
                return SqlReturn::Error;
            }
        };
        match conn.session.lock().connect(config, service) {
            Ok(()) => SqlReturn::Success,
            Err(err) => {
                conn.diagnostics.push_error(&err);
                SqlReturn::Error
            }
        }
    }

    /// Drop the connection's token and return it to the disconnected
    /// state. Idempotent.
    pub fn disconnect(&self, connection: ConnectionId) -> SqlReturn {
        let Some(conn) = self.registry.connection(connection) else {
            return SqlReturn::InvalidHandle;
        };
        conn.diagnostics.clear();
        conn.session.lock().disconnect();
        SqlReturn::Success
    }

    // ------------------------------------------------------------------
    // Statement execution
    // ------------------------------------------------------------------

    /// Store statement text for later execution.
    pub fn prepare(&self, statement: StatementId, sql: &str) -> SqlReturn {
        let Some(stmt) = self.registry.statement(statement) else {
            return SqlReturn::InvalidHandle;
        };
        stmt.diagnostics.clear();
        let mut state = stmt.state.lock();
        state.sql = sql.to_string();
        state.prepared = true;
        state.executed = false;
        SqlReturn::Success
    }

    /// Execute statement text directly.
    pub fn execute_direct(&self, statement: StatementId, sql: &str) -> SqlReturn {
        let Some(stmt) = self.registry.statement(statement) else {
            return SqlReturn::InvalidHandle;
        };
        stmt.diagnostics.clear();
        let mut state = stmt.state.lock();
        state.sql = sql.to_string();
        state.executed = false;
        state.result = None;
        self.run_statement(&stmt, &mut state, sql)
    }

    /// Execute a previously prepared statement.
    pub fn execute(&self, statement: StatementId) -> SqlReturn {
        let Some(stmt) = self.registry.statement(statement) else {
            return SqlReturn::InvalidHandle;
        };
        stmt.diagnostics.clear();
        let mut state = stmt.state.lock();
        if !state.prepared {
            stmt.diagnostics.push_error(&DriverError::Sequence);
            return SqlReturn::Error;
        }
        let sql = state.sql.clone();
        state.executed = false;
        state.result = None;
        self.run_statement(&stmt, &mut state, &sql)
    }

    /// The execution pipeline shared by direct and prepared execution.
    ///
    /// Catalog interception happens first (no connection needed); then the
    /// owning connection is resolved and the session executes the query,
    /// including statement gating and the bounded retry-on-unauthorized.
    fn run_statement(
        &self,
        stmt: &Statement,
        state: &mut StatementState,
        sql: &str,
    ) -> SqlReturn {
        let upper = sql.to_uppercase();
        if upper.contains("GEOMETRY_COLUMNS") && upper.contains("SELECT") {
            state.result = Some(catalog::geometry_columns());
            state.executed = true;
            return SqlReturn::Success;
        }

        let Some(conn) = self.registry.connection(stmt.connection) else {
            stmt.diagnostics.push_error(&DriverError::NotConnected);
            return SqlReturn::Error;
        };

        match conn.session.lock().execute(sql) {
            Ok(rows) => {
                state.result = Some(ResultSet::from_rows(rows));
                state.executed = true;
                SqlReturn::Success
            }
            Err(err) => {
                stmt.diagnostics.push_error(&err);
                SqlReturn::Error
            }
        }
    }

    // ------------------------------------------------------------------
    // Cursor and data retrieval
    // ------------------------------------------------------------------

    /// Advance the result cursor by one row.
    pub fn fetch(&self, statement: StatementId) -> SqlReturn {
        let Some(stmt) = self.registry.statement(statement) else {
            return SqlReturn::InvalidHandle;
        };
        let mut state = stmt.state.lock();
        let Some(result) = state.result.as_mut() else {
            stmt.diagnostics.push_error(&DriverError::CursorState);
            return SqlReturn::Error;
        };
        if result.fetch() {
            SqlReturn::Success
        } else {
            SqlReturn::NoData
        }
    }

    /// Read one column of the current row in the requested representation.
    ///
    /// `indicator` receives the null marker or the logical length; for text
    /// targets the length is always the untruncated length, which is how
    /// truncation is detected.
    pub fn get_data(
        &self,
        statement: StatementId,
        ordinal: u16,
        target: TargetType,
        buffer: Option<&mut [u8]>,
        indicator: Option<&mut Indicator>,
    ) -> SqlReturn {
        let Some(stmt) = self.registry.statement(statement) else {
            return SqlReturn::InvalidHandle;
        };
        let state = stmt.state.lock();
        let Some(result) = state.result.as_ref() else {
            stmt.diagnostics.push_error(&DriverError::CursorState);
            return SqlReturn::Error;
        };
        match result.get_data(ordinal, target, buffer) {
            Ok(ind) => {
                if let Some(indicator) = indicator {
                    *indicator = ind;
                }
                SqlReturn::Success
            }
            Err(err) => {
                stmt.diagnostics.push_error(&err);
                SqlReturn::Error
            }
        }
    }

    /// Number of columns in the current result, zero when there is none.
    pub fn num_result_cols(&self, statement: StatementId, count: Option<&mut u16>) -> SqlReturn {
        let Some(stmt) = self.registry.statement(statement) else {
            return SqlReturn::InvalidHandle;
        };
        let state = stmt.state.lock();
        if let Some(count) = count {
            *count = state.result.as_ref().map_or(0, ResultSet::column_count);
        }
        SqlReturn::Success
    }

    /// Describe one column of the current result.
    ///
    /// The name is copied into `name` under the bounded-writer contract;
    /// the remaining attributes go to their out-slots when provided.
    #[allow(clippy::too_many_arguments)]
    pub fn describe_column(
        &self,
        statement: StatementId,
        ordinal: u16,
        name: Option<&mut [u8]>,
        name_length: Option<&mut usize>,
        data_type: Option<&mut SqlType>,
        column_size: Option<&mut u32>,
        decimal_digits: Option<&mut i16>,
        nullable: Option<&mut bool>,
    ) -> SqlReturn {
        let Some(stmt) = self.registry.statement(statement) else {
            return SqlReturn::InvalidHandle;
        };
        let state = stmt.state.lock();
        let Some(result) = state.result.as_ref() else {
            stmt.diagnostics.push_error(&DriverError::CursorState);
            return SqlReturn::Error;
        };
        let Some(column) = result.column(ordinal) else {
            stmt.diagnostics
                .push_error(&DriverError::InvalidColumn(ordinal));
            return SqlReturn::Error;
        };

        let mut length = column.name.len();
        if let Some(name) = name {
            length = write_text(name, &column.name).length;
        }
        if let Some(name_length) = name_length {
            *name_length = length;
        }
        if let Some(data_type) = data_type {
            *data_type = column.sql_type;
        }
        if let Some(column_size) = column_size {
            *column_size = column.column_size;
        }
        if let Some(decimal_digits) = decimal_digits {
            *decimal_digits = column.decimal_digits;
        }
        if let Some(nullable) = nullable {
            *nullable = column.nullable;
        }
        SqlReturn::Success
    }

    // ------------------------------------------------------------------
    // Catalog listings
    // ------------------------------------------------------------------

    /// Install the table listing as the statement's result.
    pub fn tables(
        &self,
        statement: StatementId,
        catalog_pattern: Option<&str>,
        schema_pattern: Option<&str>,
        table_pattern: Option<&str>,
        type_pattern: Option<&str>,
    ) -> SqlReturn {
        let Some(stmt) = self.registry.statement(statement) else {
            return SqlReturn::InvalidHandle;
        };
        stmt.diagnostics.clear();
        let mut state = stmt.state.lock();
        state.result = Some(catalog::tables(
            catalog_pattern.unwrap_or("%"),
            schema_pattern.unwrap_or("%"),
            table_pattern.unwrap_or("%"),
            type_pattern.unwrap_or("%"),
        ));
        state.executed = true;
        SqlReturn::Success
    }

    /// Install the column listing as the statement's result.
    pub fn columns(
        &self,
        statement: StatementId,
        catalog_pattern: Option<&str>,
        schema_pattern: Option<&str>,
        table_pattern: Option<&str>,
        column_pattern: Option<&str>,
    ) -> SqlReturn {
        let Some(stmt) = self.registry.statement(statement) else {
            return SqlReturn::InvalidHandle;
        };
        stmt.diagnostics.clear();
        let mut state = stmt.state.lock();
        state.result = Some(catalog::columns(
            catalog_pattern.unwrap_or("%"),
            schema_pattern.unwrap_or("%"),
            table_pattern.unwrap_or("%"),
            column_pattern.unwrap_or("%"),
        ));
        state.executed = true;
        SqlReturn::Success
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    fn lookup_diagnostic(&self, handle: HandleRef, record: i16) -> DiagLookup {
        fn from_stack(stack: &DiagnosticStack, record: i16) -> DiagLookup {
            match stack.get(record) {
                Some(rec) => DiagLookup::Record(rec),
                None => DiagLookup::NoData,
            }
        }
        match handle {
            HandleRef::Environment(id) => match self.registry.environment(id) {
                Some(env) => from_stack(&env.diagnostics, record),
                None => DiagLookup::InvalidHandle,
            },
            HandleRef::Connection(id) => match self.registry.connection(id) {
                Some(conn) => from_stack(&conn.diagnostics, record),
                None => DiagLookup::InvalidHandle,
            },
            HandleRef::Statement(id) => match self.registry.statement(id) {
                Some(stmt) => from_stack(&stmt.diagnostics, record),
                None => DiagLookup::InvalidHandle,
            },
        }
    }

    /// Read one diagnostic record from a handle.
    ///
    /// `record` is 1-based, most recent first; past the end returns
    /// [`SqlReturn::NoData`]. The message is copied under the
    /// bounded-writer contract, with `message_length` receiving the full
    /// length whether or not a buffer was supplied.
    pub fn diagnostic_record(
        &self,
        handle: HandleRef,
        record: i16,
        state_code: Option<&mut [u8]>,
        native: Option<&mut i32>,
        message: Option<&mut [u8]>,
        message_length: Option<&mut usize>,
    ) -> SqlReturn {
        let rec = match self.lookup_diagnostic(handle, record) {
            DiagLookup::Record(rec) => rec,
            DiagLookup::NoData => return SqlReturn::NoData,
            DiagLookup::InvalidHandle => return SqlReturn::InvalidHandle,
        };
        if let Some(state_code) = state_code {
            write_text(state_code, rec.state_code);
        }
        if let Some(native) = native {
            *native = rec.native;
        }
        let mut length = rec.message.len();
        if let Some(message) = message {
            length = write_text(message, &rec.message).length;
        }
        if let Some(message_length) = message_length {
            *message_length = length;
        }
        SqlReturn::Success
    }

    /// Project a single field of one diagnostic record.
    ///
    /// String fields require `buffer` (the state code needs at least six
    /// bytes); the native code requires `native`. A missing or too-small
    /// destination is an error; an out-of-range record number is no-data.
    pub fn diagnostic_field(
        &self,
        handle: HandleRef,
        record: i16,
        field: DiagField,
        buffer: Option<&mut [u8]>,
        native: Option<&mut i32>,
        length: Option<&mut usize>,
    ) -> SqlReturn {
        let rec = match self.lookup_diagnostic(handle, record) {
            DiagLookup::Record(rec) => rec,
            DiagLookup::NoData => return SqlReturn::NoData,
            DiagLookup::InvalidHandle => return SqlReturn::InvalidHandle,
        };
        match field {
            DiagField::StateCode => {
                let Some(buffer) = buffer.filter(|b| b.len() >= 6) else {
                    return SqlReturn::Error;
                };
                let written = write_text(buffer, rec.state_code);
                if let Some(length) = length {
                    *length = written.length;
                }
                SqlReturn::Success
            }
            DiagField::NativeCode => {
                let Some(native) = native else {
                    return SqlReturn::Error;
                };
                *native = rec.native;
                SqlReturn::Success
            }
            DiagField::MessageText => {
                let Some(buffer) = buffer.filter(|b| !b.is_empty()) else {
                    return SqlReturn::Error;
                };
                let written = write_text(buffer, &rec.message);
                if let Some(length) = length {
                    *length = written.length;
                }
                SqlReturn::Success
            }
        }
    }
}

/// Outcome of resolving a diagnostic record through any handle kind.
enum DiagLookup {
    InvalidHandle,
    NoData,
    Record(crate::diag::DiagnosticRecord),
}
