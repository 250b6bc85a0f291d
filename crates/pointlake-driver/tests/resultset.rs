//! Result-set engine tests: inference, cursor discipline, and marshalling.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;

use pointlake_driver::{ColumnDescriptor, DriverError, Indicator, ResultSet, SqlType, TargetType};

// ============================================================================
// Schema inference
// ============================================================================

#[test]
fn sample_row_infers_the_expected_types() {
    let mut rs = ResultSet::from_rows(vec![json!({
        "a": true,
        "b": 42,
        "c": 3_000_000_000_i64,
        "d": 1.5,
        "e": "x",
    })]);

    let types: Vec<(String, SqlType)> = rs
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.sql_type))
        .collect();
    assert_eq!(
        types,
        vec![
            ("a".to_string(), SqlType::Bit),
            ("b".to_string(), SqlType::Integer),
            ("c".to_string(), SqlType::BigInt),
            ("d".to_string(), SqlType::Double),
            ("e".to_string(), SqlType::Varchar),
        ]
    );

    // Display sizes are derived solely from the logical type.
    let sizes: Vec<u32> = rs.columns().iter().map(|c| c.column_size).collect();
    assert_eq!(sizes, vec![1, 10, 19, 15, 4000]);

    assert!(rs.fetch());
}

#[test]
fn column_set_is_the_union_of_sampled_fields() {
    let rs = ResultSet::from_rows(vec![
        json!({"a": 1}),
        json!({"b": "x"}),
        json!({"a": 2, "c": false}),
    ]);
    let names: Vec<&str> = rs.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn inference_is_deterministic_across_identical_inputs() {
    let rows = vec![json!({"z": 1, "m": 2, "a": 3}), json!({"q": 4})];
    let first = ResultSet::from_rows(rows.clone());
    let second = ResultSet::from_rows(rows);
    let names = |rs: &ResultSet| -> Vec<String> {
        rs.columns().iter().map(|c| c.name.clone()).collect()
    };
    assert_eq!(names(&first), names(&second));
}

// ============================================================================
// Cursor discipline
// ============================================================================

#[test]
fn fetch_on_an_empty_result_is_no_data_immediately() {
    let mut rs = ResultSet::from_rows(Vec::new());
    assert!(!rs.fetch());
    assert_eq!(rs.cursor(), 0);
}

#[test]
fn fetch_succeeds_exactly_row_count_times() {
    let mut rs = ResultSet::from_rows(vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3})]);
    let mut fetched = 0;
    while rs.fetch() {
        fetched += 1;
    }
    assert_eq!(fetched, 3);
    // Exhausted fetches leave the cursor where it is.
    assert!(!rs.fetch());
    assert_eq!(rs.cursor(), 3);
}

#[test]
fn get_data_before_any_fetch_is_a_cursor_error() {
    let rs = ResultSet::from_rows(vec![json!({"a": 1})]);
    let mut buf = [0u8; 8];
    let err = rs.get_data(1, TargetType::Char, Some(&mut buf)).unwrap_err();
    assert!(matches!(err, DriverError::CursorState));
}

#[test]
fn get_data_on_an_exhausted_empty_result_is_a_cursor_error() {
    let mut rs = ResultSet::from_rows(Vec::new());
    assert!(!rs.fetch());
    let err = rs.get_data(1, TargetType::Char, None).unwrap_err();
    assert!(matches!(err, DriverError::CursorState));
}

#[test]
fn column_ordinal_out_of_range_is_an_error() {
    let mut rs = ResultSet::from_rows(vec![json!({"a": 1})]);
    rs.fetch();
    let mut buf = [0u8; 8];
    assert!(matches!(
        rs.get_data(0, TargetType::Char, Some(&mut buf)),
        Err(DriverError::InvalidColumn(0))
    ));
    assert!(matches!(
        rs.get_data(2, TargetType::Char, Some(&mut buf)),
        Err(DriverError::InvalidColumn(2))
    ));
}

// ============================================================================
// Null and absence
// ============================================================================

#[test]
fn absent_and_null_fields_both_read_as_null() {
    let mut rs = ResultSet::from_rows(vec![
        json!({"a": 1, "b": 2}),
        json!({"a": null}),
    ]);
    rs.fetch();
    rs.fetch(); // second row: a is null, b is absent

    let mut buf = [0xAAu8; 8];
    let ind = rs.get_data(1, TargetType::Char, Some(&mut buf)).unwrap();
    assert_eq!(ind, Indicator::Null);
    let ind = rs.get_data(2, TargetType::Char, Some(&mut buf)).unwrap();
    assert_eq!(ind, Indicator::Null);
    // Nothing was written for either.
    assert_eq!(buf, [0xAAu8; 8]);
}

// ============================================================================
// Marshalling
// ============================================================================

#[test]
fn text_truncation_reports_the_untruncated_length() {
    let mut rs = ResultSet::from_rows(vec![json!({"s": "sevench"})]);
    rs.fetch();

    let mut buf = [0u8; 4];
    let ind = rs.get_data(1, TargetType::Char, Some(&mut buf)).unwrap();
    assert_eq!(ind, Indicator::Bytes(7));
    assert_eq!(&buf, b"sev\0");
}

#[test]
fn numeric_values_render_as_text_on_demand() {
    let mut rs = ResultSet::from_rows(vec![json!({"n": 42, "f": 1.5, "b": true})]);
    rs.fetch();

    let mut buf = [0u8; 16];
    let ind = rs.get_data(1, TargetType::Char, Some(&mut buf)).unwrap();
    assert_eq!(ind, Indicator::Bytes(2));
    assert_eq!(&buf[..2], b"42");

    rs.get_data(2, TargetType::Char, Some(&mut buf)).unwrap();
    assert_eq!(&buf[..3], b"1.5");

    rs.get_data(3, TargetType::Char, Some(&mut buf)).unwrap();
    assert_eq!(&buf[..1], b"1");
}

#[test]
fn structured_values_render_serialized() {
    let mut rs = ResultSet::from_rows(vec![json!({"g": {"type": "Point"}})]);
    rs.fetch();

    let mut buf = [0u8; 64];
    let ind = rs.get_data(1, TargetType::Char, Some(&mut buf)).unwrap();
    let expected = r#"{"type":"Point"}"#;
    assert_eq!(ind, Indicator::Bytes(expected.len()));
    assert_eq!(&buf[..expected.len()], expected.as_bytes());
}

#[test]
fn numeric_targets_read_native_values() {
    let mut rs = ResultSet::from_rows(vec![json!({"i": 7, "w": 3_000_000_000_i64, "f": 2.5})]);
    rs.fetch();

    let mut buf = [0u8; 4];
    let ind = rs.get_data(1, TargetType::Long, Some(&mut buf)).unwrap();
    assert_eq!(ind, Indicator::Bytes(4));
    assert_eq!(i32::from_ne_bytes(buf), 7);

    let mut buf = [0u8; 8];
    rs.get_data(2, TargetType::BigInt, Some(&mut buf)).unwrap();
    assert_eq!(i64::from_ne_bytes(buf), 3_000_000_000);

    let mut buf = [0u8; 8];
    rs.get_data(3, TargetType::Double, Some(&mut buf)).unwrap();
    assert!((f64::from_ne_bytes(buf) - 2.5).abs() < f64::EPSILON);
}

#[test]
fn unparsable_text_to_number_is_a_conversion_error() {
    let mut rs = ResultSet::from_rows(vec![json!({"s": "not-a-number"})]);
    rs.fetch();
    let mut buf = [0u8; 8];
    let err = rs.get_data(1, TargetType::Long, Some(&mut buf)).unwrap_err();
    assert!(matches!(err, DriverError::Conversion(_)));
    assert_eq!(err.state_code(), "07006");
}

#[test]
fn missing_buffer_with_a_present_value_reads_as_null() {
    let mut rs = ResultSet::from_rows(vec![json!({"a": "present"})]);
    rs.fetch();
    let ind = rs.get_data(1, TargetType::Char, None).unwrap();
    assert_eq!(ind, Indicator::Null);
}

// ============================================================================
// Pre-shaped result sets
// ============================================================================

#[test]
fn with_columns_keeps_the_given_schema() {
    let columns = vec![
        ColumnDescriptor::sized("NAME", SqlType::Varchar, 128),
        ColumnDescriptor::sized("ORDINAL", SqlType::Integer, 0).not_null(),
    ];
    let mut rs = ResultSet::with_columns(columns, vec![json!({"NAME": "x", "ORDINAL": 1})]);
    assert_eq!(rs.column_count(), 2);
    assert_eq!(rs.columns()[0].column_size, 128);
    assert!(!rs.columns()[1].nullable);
    assert!(rs.fetch());

    let mut buf = [0u8; 8];
    let ind = rs.get_data(1, TargetType::Char, Some(&mut buf)).unwrap();
    assert_eq!(ind, Indicator::Bytes(1));
}
