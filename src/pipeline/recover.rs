//! Table structure recovery: repair tables whose first row is not a header.
//!
//! A common extractor failure emits the paragraph *above* a table as an
//! extra first row: one enormous cell holding a wall of text, followed by
//! the real header and data rows. This stage detects that shape and
//! re-derives the header.
//!
//! ## Heuristic
//!
//! Triggered only when some cell of the first row is longer than
//! [`WIDE_CELL_CHARS`] characters:
//!
//! 1. If the second row has at least two cells, all shorter than
//!    [`WIDE_CELL_CHARS`], it becomes the header and rows three onward are
//!    the data. The malformed first row is dropped.
//! 2. Otherwise every later row with at least two cells and a first cell
//!    shorter than [`KEY_CELL_CHARS`] is kept as a key/value pair under a
//!    synthetic `Field | Value` header.
//! 3. If neither produced both a header and at least one data row, the
//!    input is returned unchanged.
//!
//! This is best-effort and never fails: anything it cannot repair passes
//! through untouched.

use crate::output::{Cell, Row};
use std::borrow::Cow;
use tracing::debug;

/// A first-row cell longer than this marks the table as malformed, and a
/// candidate header row must have every cell shorter than this.
pub const WIDE_CELL_CHARS: usize = 100;

/// A key/value row's key cell must be shorter than this.
pub const KEY_CELL_CHARS: usize = 50;

/// Repair the row sequence of one table.
///
/// Returns the input borrowed when no repair was needed or possible, and a
/// new owned sequence (first row = headers) when it was repaired.
pub fn recover_structure(rows: &[Row]) -> Cow<'_, [Row]> {
    let Some(first) = rows.first() else {
        return Cow::Borrowed(rows);
    };

    if !first.iter().any(|cell| cell.text_len() > WIDE_CELL_CHARS) {
        return Cow::Borrowed(rows);
    }

    let (headers, data) = match promote_second_row(rows) {
        Some(recovered) => recovered,
        None => collect_key_values(rows),
    };

    if headers.is_empty() || data.is_empty() {
        debug!("Table repair found no usable structure; keeping original rows");
        return Cow::Borrowed(rows);
    }

    debug!(
        "Repaired malformed table: {} header cells, {} data rows (was {} rows)",
        headers.len(),
        data.len(),
        rows.len()
    );

    let mut repaired = Vec::with_capacity(data.len() + 1);
    repaired.push(headers);
    repaired.extend(data);
    Cow::Owned(repaired)
}

/// Strategy 1: the second row looks like a real header.
fn promote_second_row(rows: &[Row]) -> Option<(Row, Vec<Row>)> {
    let second = rows.get(1)?;
    let plausible =
        second.len() >= 2 && second.iter().all(|cell| cell.text_len() < WIDE_CELL_CHARS);
    if !plausible {
        return None;
    }
    Some((second.clone(), rows.get(2..).unwrap_or_default().to_vec()))
}

/// Strategy 2: salvage key/value-looking rows under a synthetic header.
fn collect_key_values(rows: &[Row]) -> (Row, Vec<Row>) {
    let data: Vec<Row> = rows
        .iter()
        .skip(1)
        .filter(|row| row.len() >= 2 && row[0].text_len() < KEY_CELL_CHARS)
        .cloned()
        .collect();

    let headers = if data.is_empty() {
        Vec::new()
    } else {
        vec![Cell::from("Field"), Cell::from("Value")]
    };
    (headers, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| Cell::from(*c)).collect()
    }

    fn long(n: usize) -> String {
        "x".repeat(n)
    }

    #[test]
    fn empty_is_unchanged() {
        let rows: Vec<Row> = vec![];
        assert!(matches!(recover_structure(&rows), Cow::Borrowed(_)));
    }

    #[test]
    fn well_formed_table_is_unchanged() {
        let rows = vec![row(&["Name", "Age"]), row(&["Alice", "30"])];
        let out = recover_structure(&rows);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(&*out, rows.as_slice());
    }

    #[test]
    fn promotes_second_row() {
        let rows = vec![
            row(&[long(150).as_str(), "x"]),
            row(&["Field", "Value"]),
            row(&["Name", "Alice"]),
        ];
        let out = recover_structure(&rows);
        assert_eq!(
            out.into_owned(),
            vec![row(&["Field", "Value"]), row(&["Name", "Alice"])]
        );
    }

    #[test]
    fn empty_first_row_does_not_trigger_repair() {
        let rows = vec![row(&[]), row(&["k1", "v1"]), row(&["k2", "v2"])];
        let out = recover_structure(&rows);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(&*out, rows.as_slice());
    }

    #[test]
    fn exactly_100_chars_is_not_wide() {
        let rows = vec![row(&[long(100).as_str()]), row(&["a", "b"]), row(&["c", "d"])];
        assert!(matches!(recover_structure(&rows), Cow::Borrowed(_)));
    }

    #[test]
    fn falls_back_to_key_values() {
        // Second row has one cell only, so it cannot be a header.
        let rows = vec![
            row(&[long(120).as_str()]),
            row(&["lonely"]),
            row(&["Invoice", "INV-1"]),
            row(&[long(60).as_str(), "dropped: key too long"]),
            row(&["Total", "42.00", "USD"]),
        ];
        let out = recover_structure(&rows).into_owned();
        assert_eq!(
            out,
            vec![
                row(&["Field", "Value"]),
                row(&["Invoice", "INV-1"]),
                row(&["Total", "42.00", "USD"]),
            ]
        );
    }

    #[test]
    fn key_cell_limit_is_exclusive() {
        let just_under = long(KEY_CELL_CHARS - 1);
        let at_limit = long(KEY_CELL_CHARS);
        let rows = vec![
            row(&[long(120).as_str()]),
            row(&["lonely"]),
            row(&[just_under.as_str(), "kept"]),
            row(&[at_limit.as_str(), "dropped"]),
        ];
        let out = recover_structure(&rows).into_owned();
        assert_eq!(
            out,
            vec![row(&["Field", "Value"]), row(&[just_under.as_str(), "kept"])]
        );
    }

    #[test]
    fn second_row_with_wide_cell_falls_back() {
        let rows = vec![
            row(&[long(200).as_str()]),
            row(&["Key", long(100).as_str()]),
            row(&["Total", "1"]),
        ];
        let out = recover_structure(&rows).into_owned();
        // "Key" row qualifies as a key/value row too.
        assert_eq!(out[0], row(&["Field", "Value"]));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn promoted_header_without_data_keeps_original() {
        let rows = vec![row(&[long(150).as_str()]), row(&["A", "B"])];
        let out = recover_structure(&rows);
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn nothing_salvageable_keeps_original() {
        let rows = vec![row(&[long(150).as_str()]), row(&["only one cell"])];
        let out = recover_structure(&rows);
        assert_eq!(&*out, rows.as_slice());
    }

    #[test]
    fn single_malformed_row_keeps_original() {
        let rows = vec![row(&[long(300).as_str()])];
        assert_eq!(&*recover_structure(&rows), rows.as_slice());
    }

    #[test]
    fn null_cells_count_as_short() {
        let rows = vec![
            vec![Cell::from(long(101).as_str())],
            vec![Cell::Null, Cell::from("b")],
            row(&["1", "2"]),
        ];
        let out = recover_structure(&rows).into_owned();
        assert_eq!(out[0], vec![Cell::Null, Cell::from("b")]);
        assert_eq!(out.len(), 2);
    }
}
