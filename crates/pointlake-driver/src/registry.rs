//! Handle registry: ownership and resolution of live session objects.
//!
//! The registry owns every environment, connection, and statement and hands
//! out opaque ids. Structural mutations (allocate, free, resolve) serialize
//! through one registry-wide lock held only briefly; field mutation on an
//! individual object goes through that object's own lock, so unrelated
//! handles never contend and the structural lock is never held across a
//! network call.
//!
//! Ids are monotonically increasing and never reused within a registry's
//! lifetime: an id freed once stays dead.

use std::collections::HashMap;

use parking_lot::Mutex;
use std::sync::Arc;

use crate::diag::DiagnosticStack;
use crate::resultset::ResultSet;
use crate::session::ConnectionSession;

/// Default protocol-version attribute of a fresh environment.
pub const DEFAULT_PROTOCOL_VERSION: u32 = 3;

/// Opaque id of an environment handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvironmentId(u64);

/// Opaque id of a connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

/// Opaque id of a statement handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementId(u64);

impl std::fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "env-{}", self.0)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

impl std::fmt::Display for StatementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stmt-{}", self.0)
    }
}

/// Top-level driver context.
#[derive(Debug)]
pub struct Environment {
    /// Diagnostics attached to this environment.
    pub diagnostics: DiagnosticStack,
    protocol_version: Mutex<u32>,
}

impl Environment {
    fn new() -> Self {
        Self {
            diagnostics: DiagnosticStack::new(),
            protocol_version: Mutex::new(DEFAULT_PROTOCOL_VERSION),
        }
    }

    /// The protocol-version attribute.
    #[must_use]
    pub fn protocol_version(&self) -> u32 {
        *self.protocol_version.lock()
    }

    /// Set the protocol-version attribute.
    pub fn set_protocol_version(&self, version: u32) {
        *self.protocol_version.lock() = version;
    }
}

/// One authenticated session and its diagnostics.
#[derive(Debug)]
pub struct Connection {
    /// Diagnostics attached to this connection.
    pub diagnostics: DiagnosticStack,
    /// The session state machine; lock order is statement before
    /// connection when both are held.
    pub session: Mutex<ConnectionSession>,
}

impl Connection {
    fn new() -> Self {
        Self {
            diagnostics: DiagnosticStack::new(),
            session: Mutex::new(ConnectionSession::new()),
        }
    }
}

/// Mutable query-lifecycle state of a statement.
#[derive(Debug, Default)]
pub struct StatementState {
    /// Statement text, set by prepare or direct execution.
    pub sql: String,
    /// Whether prepare has been called since the last reset.
    pub prepared: bool,
    /// Whether the last execution succeeded.
    pub executed: bool,
    /// The result of the last successful execution, replaced on every
    /// re-execution.
    pub result: Option<ResultSet>,
}

/// One query lifecycle, owned by a connection.
#[derive(Debug)]
pub struct Statement {
    /// The owning connection. Resolution may fail later if the connection
    /// has been freed; execution then reports a connection error.
    pub connection: ConnectionId,
    /// Diagnostics attached to this statement.
    pub diagnostics: DiagnosticStack,
    /// The statement's mutable state.
    pub state: Mutex<StatementState>,
}

impl Statement {
    fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            diagnostics: DiagnosticStack::new(),
            state: Mutex::new(StatementState::default()),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_environment: u64,
    next_connection: u64,
    next_statement: u64,
    environments: HashMap<u64, Arc<Environment>>,
    connections: HashMap<u64, Arc<Connection>>,
    statements: HashMap<u64, Arc<Statement>>,
}

/// Owner of all live handles.
///
/// Explicitly constructed (one per [`crate::Driver`]); there is no global
/// instance, so tests get a fresh registry each.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    inner: Mutex<Inner>,
}

impl HandleRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new environment.
    pub fn allocate_environment(&self) -> EnvironmentId {
        let mut inner = self.inner.lock();
        inner.next_environment += 1;
        let id = inner.next_environment;
        inner.environments.insert(id, Arc::new(Environment::new()));
        EnvironmentId(id)
    }

    /// Allocate a connection under `environment`.
    ///
    /// Returns `None` when the parent environment no longer exists.
    pub fn allocate_connection(&self, environment: EnvironmentId) -> Option<ConnectionId> {
        let mut inner = self.inner.lock();
        if !inner.environments.contains_key(&environment.0) {
            return None;
        }
        inner.next_connection += 1;
        let id = inner.next_connection;
        inner.connections.insert(id, Arc::new(Connection::new()));
        Some(ConnectionId(id))
    }

    /// Allocate a statement under `connection`.
    ///
    /// Returns `None` when the parent connection no longer exists.
    pub fn allocate_statement(&self, connection: ConnectionId) -> Option<StatementId> {
        let mut inner = self.inner.lock();
        if !inner.connections.contains_key(&connection.0) {
            return None;
        }
        inner.next_statement += 1;
        let id = inner.next_statement;
        inner
            .statements
            .insert(id, Arc::new(Statement::new(connection)));
        Some(StatementId(id))
    }

    /// Free an environment. Returns `false` for an unknown or already-freed
    /// id.
    pub fn free_environment(&self, id: EnvironmentId) -> bool {
        self.inner.lock().environments.remove(&id.0).is_some()
    }

    /// Free a connection. Returns `false` for an unknown or already-freed
    /// id.
    pub fn free_connection(&self, id: ConnectionId) -> bool {
        self.inner.lock().connections.remove(&id.0).is_some()
    }

    /// Free a statement. Returns `false` for an unknown or already-freed
    /// id.
    pub fn free_statement(&self, id: StatementId) -> bool {
        self.inner.lock().statements.remove(&id.0).is_some()
    }

    /// Resolve an environment id to its object.
    #[must_use]
    pub fn environment(&self, id: EnvironmentId) -> Option<Arc<Environment>> {
        self.inner.lock().environments.get(&id.0).cloned()
    }

    /// Resolve a connection id to its object.
    #[must_use]
    pub fn connection(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.inner.lock().connections.get(&id.0).cloned()
    }

    /// Resolve a statement id to its object.
    #[must_use]
    pub fn statement(&self, id: StatementId) -> Option<Arc<Statement>> {
        self.inner.lock().statements.get(&id.0).cloned()
    }
}
