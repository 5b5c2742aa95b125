//! Data types flowing into and out of the conversion pipeline.
//!
//! ## Input: [`ExtractionResult`]
//!
//! The extraction service is an opaque and not entirely consistent data
//! source: fields come and go between API revisions, tables arrive ragged,
//! and a field occasionally has the wrong JSON type altogether. The model
//! below is a typed record with every field optional, and every field is
//! deserialized *leniently*: a value of the wrong shape becomes `None`
//! instead of failing the whole document. Downstream stages can then match
//! on presence exhaustively instead of probing untyped maps.
//!
//! ## Output: [`ConversionOutput`]
//!
//! The rendered Markdown (and optional HTML) together with the raw result
//! and a few statistics, serialisable for `--format json`.

use crate::pipeline::select::ContentSource;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::borrow::Cow;

// ── Lenient field deserializers ──────────────────────────────────────────

/// Deserialize an optional field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Deserialize an optional record. Only a JSON object qualifies; serde would
/// otherwise fill a struct positionally from an array.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(object_from_value(Value::deserialize(deserializer)?))
}

/// Deserialize an optional sequence of records, skipping elements that are
/// not JSON objects.
///
/// A non-array value yields `None`.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items.into_iter().filter_map(object_from_value).collect(),
        )),
        _ => Ok(None),
    }
}

fn object_from_value<T: DeserializeOwned>(value: Value) -> Option<T> {
    match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}

/// Deserialize table rows. Non-array rows are coerced: `null` becomes an
/// empty row, any other scalar a single-cell row.
fn lenient_rows<'de, D>(deserializer: D) -> Result<Option<Vec<Row>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(rows) => Ok(Some(rows.into_iter().map(row_from_value).collect())),
        _ => Ok(None),
    }
}

fn row_from_value(value: Value) -> Row {
    match value {
        Value::Array(cells) => cells.into_iter().map(Cell::from).collect(),
        Value::Null => Vec::new(),
        other => vec![Cell::from(other)],
    }
}

// ── Extraction result ────────────────────────────────────────────────────

/// A document-extraction result as returned by the remote service.
///
/// Constructed once per request and discarded after rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Whole-document Markdown, when the service produced it directly.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,

    /// Alternative chunked representations of the same text.
    #[serde(default, deserialize_with = "lenient_object", skip_serializing_if = "Option::is_none")]
    pub chunking: Option<Chunking>,

    /// Tables detected in the document, in document order.
    #[serde(default, deserialize_with = "lenient_seq", skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<Table>>,

    /// Structured data extracted against a caller-supplied schema.
    #[serde(
        rename = "schema-json",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_json: Option<Value>,

    /// Account usage reported alongside the result.
    #[serde(
        rename = "plan-info",
        default,
        deserialize_with = "lenient_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub plan_info: Option<PlanInfo>,
}

impl ExtractionResult {
    /// Parse a JSON document. Only syntactically invalid JSON is an error;
    /// a well-formed document of any shape yields a (possibly empty) result.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(value))
    }

    /// Build a result from already-decoded JSON. Never fails.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// A result carrying only direct Markdown.
    pub fn from_markdown(markdown: impl Into<String>) -> Self {
        Self {
            markdown: Some(markdown.into()),
            ..Default::default()
        }
    }
}

/// Chunked text, keyed by the chunking method that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunking {
    #[serde(default, deserialize_with = "lenient_seq", skip_serializing_if = "Option::is_none")]
    pub semantic: Option<Vec<Chunk>>,
    #[serde(default, deserialize_with = "lenient_seq", skip_serializing_if = "Option::is_none")]
    pub recursive: Option<Vec<Chunk>>,
    #[serde(default, deserialize_with = "lenient_seq", skip_serializing_if = "Option::is_none")]
    pub page: Option<Vec<Chunk>>,
    #[serde(default, deserialize_with = "lenient_seq", skip_serializing_if = "Option::is_none")]
    pub header: Option<Vec<Chunk>>,
}

/// One unit of extracted text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Source page; any scalar the service sends is kept and printed as-is.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub page_number: Option<Cell>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub chunk_number: Option<u64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl Chunk {
    /// A chunk with content only.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }
}

/// One ordered sequence of cells.
pub type Row = Vec<Cell>;

/// A table detected by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Rows in presentation order; the first row is nominally the header.
    #[serde(default, deserialize_with = "lenient_rows", skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub table_id: Option<Cell>,

    /// Table already rendered to Markdown by the service (older API revision).
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Table {
    /// A table built from rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            data: Some(rows),
            ..Default::default()
        }
    }

    /// Rows, or an empty slice when `data` is absent.
    pub fn rows(&self) -> &[Row] {
        self.data.as_deref().unwrap_or(&[])
    }
}

/// Usage information returned with each extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanInfo {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub pages_used: Option<u64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

// ── Cells ────────────────────────────────────────────────────────────────

/// A scalar JSON value as it appears in a table cell.
///
/// Arrays and objects are not expected but are kept (as [`Cell::Other`])
/// rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Other(Value),
}

impl Cell {
    /// Textual form: empty for null, JSON text for numbers, booleans and
    /// nested values.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Cell::Null => Cow::Borrowed(""),
            Cell::Bool(b) => Cow::Owned(b.to_string()),
            Cell::Number(n) => Cow::Owned(n.to_string()),
            Cell::Text(s) => Cow::Borrowed(s),
            Cell::Other(v) => Cow::Owned(v.to_string()),
        }
    }

    /// Length of the textual form in characters.
    pub fn text_len(&self) -> usize {
        self.text().chars().count()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(b),
            Value::Number(n) => Cell::Number(n),
            Value::String(s) => Cell::Text(s),
            other => Cell::Other(other),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n.into())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Cell::from)
    }
}

// ── Conversion output ────────────────────────────────────────────────────

/// Everything produced for one input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The input as given (path, URL or saved-result path).
    pub input: String,
    /// Rendered Markdown; never empty (falls back to the sentinel message).
    pub markdown: String,
    /// HTML rendering of `markdown`, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// The raw extraction result the Markdown was rendered from.
    pub result: ExtractionResult,
    pub stats: ConversionStats,
}

/// Statistics for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Which text representation the selector used.
    pub source: ContentSource,
    /// Tables present in the result.
    pub tables_total: usize,
    /// Tables that produced a Markdown block.
    pub tables_rendered: usize,
    /// Bytes uploaded to the service (0 for sample mode and saved results).
    pub upload_bytes: u64,
    /// Pages billed by the service, when reported.
    pub pages_used: Option<u64>,
    /// Wall-clock time spent waiting on the service.
    pub api_duration_ms: u64,
    /// Wall-clock time for the whole conversion.
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_is_empty_result() {
        let r = ExtractionResult::from_json("{}").unwrap();
        assert_eq!(r, ExtractionResult::default());
    }

    #[test]
    fn non_object_is_empty_result() {
        assert_eq!(
            ExtractionResult::from_json("[1, 2, 3]").unwrap(),
            ExtractionResult::default()
        );
        assert_eq!(
            ExtractionResult::from_json("null").unwrap(),
            ExtractionResult::default()
        );
    }

    #[test]
    fn invalid_json_is_error() {
        assert!(ExtractionResult::from_json("{not json").is_err());
    }

    #[test]
    fn wrong_typed_fields_become_absent() {
        let r = ExtractionResult::from_value(json!({
            "markdown": 42,
            "chunking": "semantic",
            "tables": {"data": []},
        }));
        assert_eq!(r.markdown, None);
        assert_eq!(r.chunking, None);
        assert_eq!(r.tables, None);
    }

    #[test]
    fn malformed_chunks_are_skipped() {
        let r = ExtractionResult::from_value(json!({
            "chunking": {
                "semantic": ["just a string", {"content": "kept"}, 7],
                "page": "not a list"
            }
        }));
        let chunking = r.chunking.unwrap();
        let semantic = chunking.semantic.unwrap();
        assert_eq!(semantic.len(), 1);
        assert_eq!(semantic[0].content.as_deref(), Some("kept"));
        assert_eq!(chunking.page, None);
    }

    #[test]
    fn arrays_never_stand_in_for_records() {
        let r = ExtractionResult::from_json(
            r#"{"chunking": [[{"content": "from an array"}]], "plan-info": [3, "pro"]}"#,
        )
        .unwrap();
        assert_eq!(r.chunking, None);
        assert_eq!(r.plan_info, None);

        let r = ExtractionResult::from_value(json!({
            "chunking": {"semantic": [["text"], {"content": "kept"}]},
            "tables": [[[["a", "b"]]], {"data": [["x"]]}]
        }));
        let semantic = r.chunking.unwrap().semantic.unwrap();
        assert_eq!(semantic, vec![Chunk::new("kept")]);
        let tables = r.tables.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows(), &[vec![Cell::from("x")]]);
    }

    #[test]
    fn null_header_is_absent() {
        let r = ExtractionResult::from_value(json!({
            "chunking": {"header": [{"content": "x", "header": null}]}
        }));
        let chunk = &r.chunking.unwrap().header.unwrap()[0];
        assert_eq!(chunk.header, None);
    }

    #[test]
    fn rows_are_coerced() {
        let r = ExtractionResult::from_value(json!({
            "tables": [{"data": [["a", 1, null, true], null, "lonely", [[1, 2]]]}]
        }));
        let tables = r.tables.unwrap();
        let rows = tables[0].rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0][0], Cell::from("a"));
        assert_eq!(rows[0][1].text(), "1");
        assert!(rows[0][2].is_null());
        assert_eq!(rows[0][3].text(), "true");
        assert!(rows[1].is_empty());
        assert_eq!(rows[2], vec![Cell::from("lonely")]);
        assert_eq!(rows[3][0].text(), "[1,2]");
    }

    #[test]
    fn table_without_data_has_no_rows() {
        let r = ExtractionResult::from_value(json!({
            "tables": [{"table_id": 1, "content": "| a |\n| --- |"}]
        }));
        let table = &r.tables.unwrap()[0];
        assert!(table.rows().is_empty());
        assert_eq!(table.content.as_deref(), Some("| a |\n| --- |"));
        assert_eq!(table.table_id, Some(Cell::from(1)));
    }

    #[test]
    fn hyphenated_fields_are_read() {
        let r = ExtractionResult::from_value(json!({
            "schema-json": {"company": "Example"},
            "plan-info": {"pages_used": 12, "tier": "foundation"}
        }));
        assert_eq!(r.schema_json, Some(json!({"company": "Example"})));
        let plan = r.plan_info.unwrap();
        assert_eq!(plan.pages_used, Some(12));
        assert_eq!(plan.tier.as_deref(), Some("foundation"));
    }

    #[test]
    fn text_len_counts_chars() {
        assert_eq!(Cell::from("héllo").text_len(), 5);
        assert_eq!(Cell::Null.text_len(), 0);
    }

    #[test]
    fn float_cells_keep_json_text() {
        let cell = Cell::from(json!(1.5));
        assert_eq!(cell.text(), "1.5");
    }

    #[test]
    fn result_serialises_back_with_original_keys() {
        let r = ExtractionResult::from_value(json!({
            "markdown": "# Hi",
            "plan-info": {"tier": "free"}
        }));
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["markdown"], "# Hi");
        assert_eq!(v["plan-info"]["tier"], "free");
        assert!(v.get("tables").is_none());
    }
}
