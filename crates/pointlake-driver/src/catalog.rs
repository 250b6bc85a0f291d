//! Virtual catalog: fixed-shape listings of the tables the service exposes.
//!
//! The backend has no catalog endpoint, so the driver serves a small static
//! one: the `points` table under `leaf.pointlake`, and a PostGIS-style
//! `GEOMETRY_COLUMNS` table that lets geospatial clients discover the
//! geometry column.

use serde_json::json;
use serde_json::Value;

use pointlake_types::SqlType;

use crate::resultset::{ColumnDescriptor, ResultSet};

const CATALOG: &str = "leaf";
const SCHEMA: &str = "pointlake";
const POINTS_TABLE: &str = "points";
const GEOMETRY_TABLE: &str = "GEOMETRY_COLUMNS";

/// Default SRID reported for the geometry column (WGS84).
const DEFAULT_SRID: i32 = 4326;

/// Match a catalog value against a search pattern.
///
/// Empty and `%` match everything; a pattern without wildcard characters
/// must match exactly; otherwise matching approximates wildcards by
/// substring containment.
#[must_use]
pub fn matches_pattern(value: &str, pattern: &str) -> bool {
    if pattern.is_empty() || pattern == "%" {
        return true;
    }
    if !pattern.contains('%') && !pattern.contains('_') {
        return value == pattern;
    }
    value.contains(pattern)
}

/// Whether a table name refers to the geometry catalog table.
#[must_use]
pub fn is_geometry_columns_table(table: &str) -> bool {
    table.eq_ignore_ascii_case(GEOMETRY_TABLE)
}

fn varchar(name: &str, size: u32) -> ColumnDescriptor {
    ColumnDescriptor::sized(name, SqlType::Varchar, size)
}

fn integer(name: &str) -> ColumnDescriptor {
    ColumnDescriptor::sized(name, SqlType::Integer, 0)
}

/// The table listing: `TABLE_CAT`, `TABLE_SCHEM`, `TABLE_NAME`,
/// `TABLE_TYPE`, `REMARKS`.
#[must_use]
pub fn tables(
    catalog_pattern: &str,
    schema_pattern: &str,
    table_pattern: &str,
    type_pattern: &str,
) -> ResultSet {
    let columns = vec![
        varchar("TABLE_CAT", 128),
        varchar("TABLE_SCHEM", 128),
        varchar("TABLE_NAME", 128),
        varchar("TABLE_TYPE", 128),
        varchar("REMARKS", 255),
    ];

    let type_ok = type_pattern.is_empty() || type_pattern == "%" || type_pattern == "TABLE";
    let mut rows = Vec::new();

    if matches_pattern(CATALOG, catalog_pattern)
        && matches_pattern(SCHEMA, schema_pattern)
        && matches_pattern(POINTS_TABLE, table_pattern)
        && type_ok
    {
        rows.push(table_row(SCHEMA, POINTS_TABLE));
    }

    if matches_pattern(CATALOG, catalog_pattern)
        && (schema_pattern.is_empty()
            || schema_pattern == "%"
            || matches_pattern("public", schema_pattern)
            || matches_pattern(CATALOG, schema_pattern))
        && matches_pattern(GEOMETRY_TABLE, table_pattern)
        && type_ok
    {
        rows.push(table_row("public", GEOMETRY_TABLE));
    }

    ResultSet::with_columns(columns, rows)
}

fn table_row(schema: &str, table: &str) -> Value {
    json!({
        "TABLE_CAT": CATALOG,
        "TABLE_SCHEM": schema,
        "TABLE_NAME": table,
        "TABLE_TYPE": "TABLE",
        "REMARKS": "",
    })
}

/// The column listing for the known tables, in the standard twelve-column
/// shape.
#[must_use]
pub fn columns(
    catalog_pattern: &str,
    schema_pattern: &str,
    table_pattern: &str,
    column_pattern: &str,
) -> ResultSet {
    let columns = vec![
        varchar("TABLE_CAT", 128),
        varchar("TABLE_SCHEM", 128),
        varchar("TABLE_NAME", 128),
        varchar("COLUMN_NAME", 128),
        integer("DATA_TYPE").not_null(),
        varchar("TYPE_NAME", 128),
        integer("COLUMN_SIZE"),
        integer("BUFFER_LENGTH"),
        integer("DECIMAL_DIGITS"),
        integer("NUM_PREC_RADIX"),
        integer("NULLABLE").not_null(),
        varchar("REMARKS", 255),
    ];

    let mut rows = Vec::new();

    if matches_pattern(CATALOG, catalog_pattern)
        && matches_pattern(SCHEMA, schema_pattern)
        && matches_pattern(POINTS_TABLE, table_pattern)
    {
        for (name, sql_type, size) in POINTS_COLUMNS {
            if matches_pattern(name, column_pattern) {
                rows.push(column_row(SCHEMA, POINTS_TABLE, name, *sql_type, *size));
            }
        }
    }

    if is_geometry_columns_table(table_pattern) {
        for (name, sql_type, size) in GEOMETRY_TABLE_COLUMNS {
            if matches_pattern(name, column_pattern) {
                rows.push(column_row("public", GEOMETRY_TABLE, name, *sql_type, *size));
            }
        }
    }

    ResultSet::with_columns(columns, rows)
}

/// Known columns of the `points` table.
const POINTS_COLUMNS: &[(&str, SqlType, u32)] = &[
    ("geometry", SqlType::LongVarchar, 0),
    ("timestamp", SqlType::Varchar, 255),
    ("operationType", SqlType::Varchar, 255),
    ("apiOwnerUsername", SqlType::Varchar, 255),
    ("crop", SqlType::Varchar, 255),
    ("feature_count", SqlType::BigInt, 19),
    ("fileId", SqlType::Varchar, 255),
];

/// Columns of the geometry catalog table itself.
const GEOMETRY_TABLE_COLUMNS: &[(&str, SqlType, u32)] = &[
    ("F_TABLE_CATALOG", SqlType::Varchar, 128),
    ("F_TABLE_SCHEMA", SqlType::Varchar, 128),
    ("F_TABLE_NAME", SqlType::Varchar, 128),
    ("F_GEOMETRY_COLUMN", SqlType::Varchar, 128),
    ("GEOMETRY_TYPE", SqlType::Integer, 0),
    ("SRID", SqlType::Integer, 0),
];

fn column_row(schema: &str, table: &str, name: &str, sql_type: SqlType, size: u32) -> Value {
    json!({
        "TABLE_CAT": CATALOG,
        "TABLE_SCHEM": schema,
        "TABLE_NAME": table,
        "COLUMN_NAME": name,
        "DATA_TYPE": sql_type.code(),
        "TYPE_NAME": sql_type.type_name(),
        "COLUMN_SIZE": size,
        "BUFFER_LENGTH": size,
        "DECIMAL_DIGITS": 0,
        "NUM_PREC_RADIX": 10,
        "NULLABLE": 1,
        "REMARKS": "",
    })
}

/// The geometry catalog content: one row describing the geometry column of
/// the `points` table.
#[must_use]
pub fn geometry_columns() -> ResultSet {
    let columns = vec![
        varchar("F_TABLE_CATALOG", 128),
        varchar("F_TABLE_SCHEMA", 128),
        varchar("F_TABLE_NAME", 128),
        varchar("F_GEOMETRY_COLUMN", 128),
        integer("GEOMETRY_TYPE"),
        integer("SRID"),
    ];
    let rows = vec![json!({
        "F_TABLE_CATALOG": CATALOG,
        "F_TABLE_SCHEMA": SCHEMA,
        "F_TABLE_NAME": POINTS_TABLE,
        "F_GEOMETRY_COLUMN": "geometry",
        "GEOMETRY_TYPE": 0,
        "SRID": DEFAULT_SRID,
    })];
    ResultSet::with_columns(columns, rows)
}
