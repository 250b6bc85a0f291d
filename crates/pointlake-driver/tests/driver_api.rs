//! End-to-end tests of the CLI surface against an in-process backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use pointlake_driver::{
    ConnectionConfig, ConnectionId, DiagField, Driver, HandleRef, Indicator, QueryService,
    ServiceError, ServiceFactory, SqlReturn, SqlType, StatementId, TargetType,
    ATTR_PROTOCOL_VERSION,
};

/// In-process stand-in for the query service.
#[derive(Default)]
struct FakeBackend {
    rows: Mutex<Vec<Value>>,
    reject_auth: AtomicBool,
    unauthorized_once: AtomicBool,
    auth_calls: AtomicUsize,
    exec_calls: AtomicUsize,
}

impl FakeBackend {
    fn with_rows(rows: Vec<Value>) -> Arc<Self> {
        let backend = Self::default();
        *backend.rows.lock() = rows;
        Arc::new(backend)
    }

    fn exec_calls(&self) -> usize {
        self.exec_calls.load(Ordering::SeqCst)
    }

    fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }
}

impl QueryService for FakeBackend {
    fn authenticate(
        &self,
        username: &str,
        _password: &str,
        _remember_me: bool,
    ) -> Result<String, ServiceError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_auth.load(Ordering::SeqCst) {
            return Err(ServiceError::AuthRejected("status 403".into()));
        }
        Ok(format!("token-for-{username}"))
    }

    fn execute(&self, _sql: &str, _engine: &str, _token: &str) -> Result<Vec<Value>, ServiceError> {
        self.exec_calls.fetch_add(1, Ordering::SeqCst);
        if self.unauthorized_once.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::Unauthorized);
        }
        Ok(self.rows.lock().clone())
    }
}

struct FakeFactory(Arc<FakeBackend>);

impl ServiceFactory for FakeFactory {
    fn create(
        &self,
        _config: &ConnectionConfig,
    ) -> Result<Arc<dyn QueryService>, pointlake_driver::DriverError> {
        let service: Arc<dyn QueryService> = Arc::clone(&self.0);
        Ok(service)
    }
}

fn driver_with(backend: &Arc<FakeBackend>) -> Driver {
    Driver::with_service_factory(Arc::new(FakeFactory(Arc::clone(backend))))
}

/// Allocate env -> conn and connect with inline credentials.
fn connected(driver: &Driver) -> ConnectionId {
    let (_, env) = driver.allocate_environment();
    let (_, conn) = driver.allocate_connection(env.unwrap());
    let conn = conn.unwrap();
    let rc = driver.driver_connect(conn, "UID=alice;PWD=secret;", None, None);
    assert!(rc.is_success());
    conn
}

fn statement(driver: &Driver, conn: ConnectionId) -> StatementId {
    let (rc, stmt) = driver.allocate_statement(conn);
    assert_eq!(rc, SqlReturn::Success);
    stmt.unwrap()
}

fn first_diagnostic(driver: &Driver, handle: impl Into<HandleRef>) -> (String, String) {
    let mut state = [0u8; 8];
    let mut message = [0u8; 256];
    let mut message_length = 0usize;
    let rc = driver.diagnostic_record(
        handle.into(),
        1,
        Some(&mut state),
        None,
        Some(&mut message),
        Some(&mut message_length),
    );
    assert_eq!(rc, SqlReturn::Success);
    let state = String::from_utf8_lossy(&state[..5]).to_string();
    let message = String::from_utf8_lossy(&message[..message_length]).to_string();
    (state, message)
}

// ============================================================================
// Handle lifecycle
// ============================================================================

#[test]
fn freed_handles_are_invalid_everywhere() {
    let backend = FakeBackend::with_rows(Vec::new());
    let driver = driver_with(&backend);
    let conn = connected(&driver);
    let stmt = statement(&driver, conn);

    assert_eq!(driver.free_statement(stmt), SqlReturn::Success);
    assert_eq!(driver.fetch(stmt), SqlReturn::InvalidHandle);
    assert_eq!(driver.execute_direct(stmt, "SELECT 1"), SqlReturn::InvalidHandle);
    assert_eq!(driver.free_statement(stmt), SqlReturn::InvalidHandle);

    assert_eq!(driver.free_connection(conn), SqlReturn::Success);
    assert_eq!(driver.disconnect(conn), SqlReturn::InvalidHandle);
    let (rc, none) = driver.allocate_statement(conn);
    assert_eq!(rc, SqlReturn::InvalidHandle);
    assert!(none.is_none());
}

#[test]
fn statement_survives_its_connection_but_cannot_execute() {
    let backend = FakeBackend::with_rows(Vec::new());
    let driver = driver_with(&backend);
    let conn = connected(&driver);
    let stmt = statement(&driver, conn);

    assert_eq!(driver.free_connection(conn), SqlReturn::Success);
    let rc = driver.execute_direct(stmt, "SELECT 1");
    assert_eq!(rc, SqlReturn::Error);
    let (state, _) = first_diagnostic(&driver, stmt);
    assert_eq!(state, "08003");
    assert_eq!(backend.exec_calls(), 0);
}

// ============================================================================
// Environment attributes
// ============================================================================

#[test]
fn protocol_version_round_trips_and_unknown_attrs_fail() {
    let backend = FakeBackend::with_rows(Vec::new());
    let driver = driver_with(&backend);
    let (_, env) = driver.allocate_environment();
    let env = env.unwrap();

    let mut version = 0u32;
    assert!(driver
        .environment_attr(env, ATTR_PROTOCOL_VERSION, Some(&mut version))
        .is_success());
    assert_eq!(version, 3);

    assert!(driver
        .set_environment_attr(env, ATTR_PROTOCOL_VERSION, 380)
        .is_success());
    assert_eq!(
        driver.environment_attr(env, ATTR_PROTOCOL_VERSION, Some(&mut version)),
        SqlReturn::Success
    );
    assert_eq!(version, 380);

    assert_eq!(driver.set_environment_attr(env, 999, 1), SqlReturn::Error);
    let (state, _) = first_diagnostic(&driver, env);
    assert_eq!(state, "HY092");
}

// ============================================================================
// Connecting
// ============================================================================

#[test]
fn driver_connect_copies_back_the_connection_string() {
    let backend = FakeBackend::with_rows(Vec::new());
    let driver = driver_with(&backend);
    let (_, env) = driver.allocate_environment();
    let (_, conn) = driver.allocate_connection(env.unwrap());
    let conn = conn.unwrap();

    let input = "UID=alice;PWD=secret;";
    let mut completed = [0u8; 8];
    let mut completed_length = 0usize;
    let rc = driver.driver_connect(conn, input, Some(&mut completed), Some(&mut completed_length));
    assert!(rc.is_success());
    // Bounded copy, full length reported.
    assert_eq!(completed_length, input.len());
    assert_eq!(&completed[..8], b"UID=ali\0");
}

#[test]
fn rejected_credentials_surface_on_the_connection() {
    let backend = FakeBackend::with_rows(Vec::new());
    backend.reject_auth.store(true, Ordering::SeqCst);
    let driver = driver_with(&backend);
    let (_, env) = driver.allocate_environment();
    let (_, conn) = driver.allocate_connection(env.unwrap());
    let conn = conn.unwrap();

    let rc = driver.driver_connect(conn, "UID=alice;PWD=bad;", None, None);
    assert_eq!(rc, SqlReturn::Error);
    let (state, message) = first_diagnostic(&driver, conn);
    assert_eq!(state, "28000");
    assert!(message.contains("authentication failed"));
}

// ============================================================================
// Execution pipeline
// ============================================================================

#[test]
fn execute_fetch_get_data_walks_the_rows() {
    let backend = FakeBackend::with_rows(vec![
        json!({"crop": "corn", "feature_count": 12}),
        json!({"crop": "soy", "feature_count": 7}),
    ]);
    let driver = driver_with(&backend);
    let conn = connected(&driver);
    let stmt = statement(&driver, conn);

    let rc = driver.execute_direct(stmt, "SELECT crop, feature_count FROM points");
    assert_eq!(rc, SqlReturn::Success);

    let mut count = 0u16;
    assert_eq!(driver.num_result_cols(stmt, Some(&mut count)), SqlReturn::Success);
    assert_eq!(count, 2);

    let mut name = [0u8; 32];
    let mut name_length = 0usize;
    let mut data_type = SqlType::Varchar;
    let rc = driver.describe_column(
        stmt,
        2,
        Some(&mut name),
        Some(&mut name_length),
        Some(&mut data_type),
        None,
        None,
        None,
    );
    assert!(rc.is_success());
    assert_eq!(&name[..name_length], b"feature_count");
    assert_eq!(data_type, SqlType::Integer);

    let mut rows = 0;
    let mut buf = [0u8; 32];
    let mut indicator = Indicator::Null;
    while driver.fetch(stmt) == SqlReturn::Success {
        rows += 1;
        let rc = driver.get_data(
            stmt,
            1,
            TargetType::Char,
            Some(&mut buf),
            Some(&mut indicator),
        );
        assert_eq!(rc, SqlReturn::Success);
        assert!(!indicator.is_null());
    }
    assert_eq!(rows, 2);
    assert_eq!(driver.fetch(stmt), SqlReturn::NoData);
}

#[test]
fn write_statements_are_rejected_with_a_statement_diagnostic() {
    let backend = FakeBackend::with_rows(Vec::new());
    let driver = driver_with(&backend);
    let conn = connected(&driver);
    let stmt = statement(&driver, conn);

    let rc = driver.execute_direct(stmt, "DELETE FROM points");
    assert_eq!(rc, SqlReturn::Error);
    let (state, _) = first_diagnostic(&driver, stmt);
    assert_eq!(state, "42000");
    assert_eq!(backend.exec_calls(), 0);
}

#[test]
fn execute_without_prepare_is_a_sequence_error() {
    let backend = FakeBackend::with_rows(Vec::new());
    let driver = driver_with(&backend);
    let conn = connected(&driver);
    let stmt = statement(&driver, conn);

    assert_eq!(driver.execute(stmt), SqlReturn::Error);
    let (state, _) = first_diagnostic(&driver, stmt);
    assert_eq!(state, "HY010");

    assert_eq!(driver.prepare(stmt, "SELECT 1"), SqlReturn::Success);
    assert_eq!(driver.execute(stmt), SqlReturn::Success);
    assert_eq!(backend.exec_calls(), 1);
}

#[test]
fn unauthorized_response_is_retried_once_transparently() {
    let backend = FakeBackend::with_rows(vec![json!({"a": 1})]);
    backend.unauthorized_once.store(true, Ordering::SeqCst);
    let driver = driver_with(&backend);
    let conn = connected(&driver);
    let stmt = statement(&driver, conn);

    let rc = driver.execute_direct(stmt, "SELECT a FROM points");
    assert_eq!(rc, SqlReturn::Success);
    assert_eq!(backend.exec_calls(), 2);
    // Connect plus the one re-authentication.
    assert_eq!(backend.auth_calls(), 2);
}

#[test]
fn each_execution_replaces_the_result_set() {
    let backend = FakeBackend::with_rows(vec![json!({"a": 1}), json!({"a": 2})]);
    let driver = driver_with(&backend);
    let conn = connected(&driver);
    let stmt = statement(&driver, conn);

    assert_eq!(
        driver.execute_direct(stmt, "SELECT a FROM points"),
        SqlReturn::Success
    );
    assert_eq!(driver.fetch(stmt), SqlReturn::Success);

    // Re-execution resets the cursor to before-first.
    assert_eq!(
        driver.execute_direct(stmt, "SELECT a FROM points"),
        SqlReturn::Success
    );
    let mut fetched = 0;
    while driver.fetch(stmt) == SqlReturn::Success {
        fetched += 1;
    }
    assert_eq!(fetched, 2);
}

#[test]
fn diagnostics_are_cleared_by_the_next_mutating_call() {
    let backend = FakeBackend::with_rows(Vec::new());
    let driver = driver_with(&backend);
    let conn = connected(&driver);
    let stmt = statement(&driver, conn);

    assert_eq!(
        driver.execute_direct(stmt, "DELETE FROM points"),
        SqlReturn::Error
    );
    assert_eq!(
        driver.diagnostic_record(stmt.into(), 1, None, None, None, None),
        SqlReturn::Success
    );

    assert_eq!(driver.execute_direct(stmt, "SELECT 1"), SqlReturn::Success);
    assert_eq!(
        driver.diagnostic_record(stmt.into(), 1, None, None, None, None),
        SqlReturn::NoData
    );
}

// ============================================================================
// Cursor state at the CLI boundary
// ============================================================================

#[test]
fn fetch_and_get_data_require_an_executed_statement() {
    let backend = FakeBackend::with_rows(Vec::new());
    let driver = driver_with(&backend);
    let conn = connected(&driver);
    let stmt = statement(&driver, conn);

    assert_eq!(driver.fetch(stmt), SqlReturn::Error);
    let (state, _) = first_diagnostic(&driver, stmt);
    assert_eq!(state, "24000");

    let mut buf = [0u8; 8];
    let rc = driver.get_data(stmt, 1, TargetType::Char, Some(&mut buf), None);
    assert_eq!(rc, SqlReturn::Error);
}

// ============================================================================
// Catalog entry points
// ============================================================================

#[test]
fn tables_and_columns_serve_the_virtual_catalog() {
    let backend = FakeBackend::with_rows(Vec::new());
    let driver = driver_with(&backend);
    let conn = connected(&driver);
    let stmt = statement(&driver, conn);

    assert_eq!(driver.tables(stmt, None, None, None, None), SqlReturn::Success);
    let mut rows = 0;
    while driver.fetch(stmt) == SqlReturn::Success {
        rows += 1;
    }
    assert_eq!(rows, 2);

    assert_eq!(
        driver.columns(stmt, None, Some("pointlake"), Some("points"), None),
        SqlReturn::Success
    );
    let mut count = 0u16;
    assert_eq!(driver.num_result_cols(stmt, Some(&mut count)), SqlReturn::Success);
    assert_eq!(count, 12);
    assert_eq!(backend.exec_calls(), 0);
}

#[test]
fn geometry_catalog_queries_never_touch_the_backend() {
    let backend = FakeBackend::with_rows(Vec::new());
    let driver = driver_with(&backend);
    let (_, env) = driver.allocate_environment();
    let (_, conn) = driver.allocate_connection(env.unwrap());
    // Deliberately not connected.
    let stmt = statement(&driver, conn.unwrap());

    let rc = driver.execute_direct(stmt, "SELECT * FROM GEOMETRY_COLUMNS");
    assert_eq!(rc, SqlReturn::Success);

    assert_eq!(driver.fetch(stmt), SqlReturn::Success);
    let mut buf = [0u8; 64];
    let mut indicator = Indicator::Null;
    // F_GEOMETRY_COLUMN of the single catalog row.
    let rc = driver.get_data(stmt, 4, TargetType::Char, Some(&mut buf), Some(&mut indicator));
    assert_eq!(rc, SqlReturn::Success);
    assert_eq!(indicator, Indicator::Bytes("geometry".len()));
    assert_eq!(driver.fetch(stmt), SqlReturn::NoData);
    assert_eq!(backend.exec_calls(), 0);
    assert_eq!(backend.auth_calls(), 0);
}

// ============================================================================
// Diagnostic projection
// ============================================================================

#[test]
fn diagnostic_fields_project_individually() {
    let backend = FakeBackend::with_rows(Vec::new());
    let driver = driver_with(&backend);
    let conn = connected(&driver);
    let stmt = statement(&driver, conn);
    assert_eq!(
        driver.execute_direct(stmt, "DELETE FROM points"),
        SqlReturn::Error
    );

    let mut state = [0u8; 6];
    let rc = driver.diagnostic_field(
        stmt.into(),
        1,
        DiagField::StateCode,
        Some(&mut state),
        None,
        None,
    );
    assert_eq!(rc, SqlReturn::Success);
    assert_eq!(&state[..5], b"42000");

    // The state code needs at least six bytes.
    let mut small = [0u8; 4];
    let rc = driver.diagnostic_field(
        stmt.into(),
        1,
        DiagField::StateCode,
        Some(&mut small),
        None,
        None,
    );
    assert_eq!(rc, SqlReturn::Error);

    let mut native = -1;
    let rc = driver.diagnostic_field(
        stmt.into(),
        1,
        DiagField::NativeCode,
        None,
        Some(&mut native),
        None,
    );
    assert_eq!(rc, SqlReturn::Success);
    assert_eq!(native, 0);

    let mut message = [0u8; 128];
    let mut length = 0usize;
    let rc = driver.diagnostic_field(
        stmt.into(),
        1,
        DiagField::MessageText,
        Some(&mut message),
        None,
        Some(&mut length),
    );
    assert_eq!(rc, SqlReturn::Success);
    assert!(length > 0);

    // Out-of-range records are no-data, not errors.
    let rc = driver.diagnostic_field(stmt.into(), 9, DiagField::NativeCode, None, Some(&mut native), None);
    assert_eq!(rc, SqlReturn::NoData);
}
