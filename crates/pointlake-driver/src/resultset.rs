//! Result-set engine: schema inference, row storage, cursor, and value
//! retrieval.

use std::collections::HashSet;

use serde_json::Value;

use pointlake_types::{write_value, Indicator, SqlType, TargetType};

use crate::error::{DriverError, Result};

/// Rows sampled for schema inference. The full row list is always stored;
/// only the schema comes from the sample.
pub const INFERENCE_SAMPLE: usize = 50;

/// Description of one output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name, as it appears in row objects.
    pub name: String,
    /// Logical type.
    pub sql_type: SqlType,
    /// Display size; zero means variable.
    pub column_size: u32,
    /// Digits right of the decimal point (always zero for inferred
    /// columns).
    pub decimal_digits: i16,
    /// Whether the column may hold nulls.
    pub nullable: bool,
}

impl ColumnDescriptor {
    /// A column as produced by schema inference: nullable, display size
    /// derived from the logical type.
    #[must_use]
    pub fn inferred(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            column_size: sql_type.display_size(),
            decimal_digits: 0,
            nullable: true,
        }
    }

    /// A column with an explicit display size, as used by the catalog
    /// provider's fixed shapes.
    #[must_use]
    pub fn sized(name: impl Into<String>, sql_type: SqlType, column_size: u32) -> Self {
        Self {
            name: name.into(),
            sql_type,
            column_size,
            decimal_digits: 0,
            nullable: true,
        }
    }

    /// Mark the column non-nullable.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Canonical type name string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.sql_type.type_name()
    }
}

/// A materialized query result with a forward-only cursor.
///
/// The column set is fixed at construction; rows loaded afterwards cannot
/// alter it. The cursor starts before the first row (position 0) and is
/// 1-based once positioned.
#[derive(Debug)]
pub struct ResultSet {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Value>,
    cursor: usize,
}

impl ResultSet {
    /// Build a result set from backend rows, inferring the schema from the
    /// first [`INFERENCE_SAMPLE`] rows.
    ///
    /// The column set is the union of field names seen in the sample, in
    /// first-seen order; each column's type is the type of its first
    /// present, non-null sampled value, defaulting to bounded text.
    #[must_use]
    pub fn from_rows(rows: Vec<Value>) -> Self {
        let columns = infer_columns(&rows);
        Self {
            columns,
            rows,
            cursor: 0,
        }
    }

    /// Build a result set with a pre-shaped column set, as produced by the
    /// catalog provider.
    #[must_use]
    pub fn with_columns(columns: Vec<ColumnDescriptor>, rows: Vec<Value>) -> Self {
        Self {
            columns,
            rows,
            cursor: 0,
        }
    }

    /// The fixed column set.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> u16 {
        self.columns.len() as u16
    }

    /// Look up a column by 1-based ordinal.
    #[must_use]
    pub fn column(&self, ordinal: u16) -> Option<&ColumnDescriptor> {
        if ordinal == 0 {
            return None;
        }
        self.columns.get(usize::from(ordinal) - 1)
    }

    /// Number of rows held.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Current cursor position: 0 before the first row, then the 1-based
    /// row number.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Advance the cursor by one row.
    ///
    /// Returns `false` (leaving the cursor unchanged) once the rows are
    /// exhausted.
    pub fn fetch(&mut self) -> bool {
        if self.cursor >= self.rows.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Read one column of the current row into `buffer` in the requested
    /// representation.
    ///
    /// An absent field or JSON null reports [`Indicator::Null`] with
    /// nothing written. Errors: [`DriverError::CursorState`] when no row is
    /// positioned, [`DriverError::InvalidColumn`] for a bad ordinal, and
    /// [`DriverError::Conversion`] when the value cannot be represented.
    pub fn get_data(
        &self,
        ordinal: u16,
        target: TargetType,
        buffer: Option<&mut [u8]>,
    ) -> Result<Indicator> {
        if self.cursor == 0 || self.cursor > self.rows.len() {
            return Err(DriverError::CursorState);
        }
        let column = self
            .column(ordinal)
            .ok_or(DriverError::InvalidColumn(ordinal))?;
        let row = &self.rows[self.cursor - 1];

        let Some(value) = row.get(column.name.as_str()) else {
            return Ok(Indicator::Null);
        };
        if value.is_null() {
            return Ok(Indicator::Null);
        }
        write_value(value, target, buffer).map_err(DriverError::from)
    }
}

fn infer_columns(rows: &[Value]) -> Vec<ColumnDescriptor> {
    let sample = &rows[..rows.len().min(INFERENCE_SAMPLE)];

    let mut names: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for row in sample {
        if let Value::Object(fields) = row {
            for name in fields.keys() {
                if seen.insert(name.as_str()) {
                    names.push(name.as_str());
                }
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let sql_type = sample
                .iter()
                .find_map(|row| row.get(name).filter(|value| !value.is_null()))
                .map_or(SqlType::Varchar, SqlType::infer);
            ColumnDescriptor::inferred(name, sql_type)
        })
        .collect()
}
