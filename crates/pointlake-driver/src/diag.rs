//! Per-handle diagnostic stacks.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::error::DriverError;

/// Maximum records retained per handle; pushing beyond this drops the
/// oldest.
pub const MAX_RECORDS: usize = 10;

/// One logged error/status event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    /// Five-character state code classifying the event.
    pub state_code: &'static str,
    /// Native error number (zero when the backend supplies none).
    pub native: i32,
    /// Human-readable message text.
    pub message: String,
}

/// Projectable attribute of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagField {
    /// The state code.
    StateCode,
    /// The native error number.
    NativeCode,
    /// The message text.
    MessageText,
}

/// Bounded, most-recent-first log of diagnostics attached to one handle.
///
/// The stack has its own lock so the CLI layer can record an outcome
/// without holding the owning handle's lock.
#[derive(Debug, Default)]
pub struct DiagnosticStack {
    records: Mutex<VecDeque<DiagnosticRecord>>,
}

impl DiagnosticStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record at the front, dropping the oldest past the cap.
    pub fn push(&self, state_code: &'static str, native: i32, message: impl Into<String>) {
        let mut records = self.records.lock();
        records.push_front(DiagnosticRecord {
            state_code,
            native,
            message: message.into(),
        });
        records.truncate(MAX_RECORDS);
    }

    /// Record a driver error with its canonical state code.
    pub fn push_error(&self, error: &DriverError) {
        self.push(error.state_code(), error.native_code(), error.to_string());
    }

    /// Fetch record `number` (1-based, most recent first).
    ///
    /// Out-of-range numbers return `None` — "no data", not an error.
    #[must_use]
    pub fn get(&self, number: i16) -> Option<DiagnosticRecord> {
        if number < 1 {
            return None;
        }
        self.records.lock().get((number - 1) as usize).cloned()
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the stack holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drop all records. Called at the start of each mutating call on the
    /// owning handle.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}
