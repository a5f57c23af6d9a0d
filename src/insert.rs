//! Options for bulk inserts.
//!
//! These are handed to the bindings surface unchanged. Fields left as `None`
//! let the engine pick its own default (e.g. sniffing a CSV dialect).

/// Options for inserting a CSV file into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvInsertOptions {
    /// Target schema.
    ///
    /// Default: `None` (the connection's current schema)
    pub schema: Option<String>,

    /// Target table name.
    pub name: String,

    /// Whether the first line holds column names.
    pub header: Option<bool>,

    /// Field delimiter.
    pub delimiter: Option<String>,

    /// Quote character.
    pub quote: Option<String>,

    /// Escape character.
    pub escape: Option<String>,

    /// Number of leading lines to skip.
    pub skip: Option<u32>,

    /// Let the engine detect the dialect and column types.
    ///
    /// Default: `true`
    pub detect: bool,

    /// Format used to parse DATE columns.
    pub date_format: Option<String>,

    /// Format used to parse TIMESTAMP columns.
    pub timestamp_format: Option<String>,

    /// Explicit `(column name, SQL type)` pairs, overriding detection.
    pub columns: Vec<(String, String)>,
}

impl Default for CsvInsertOptions {
    fn default() -> Self {
        Self {
            schema: None,
            name: String::new(),
            header: None,
            delimiter: None,
            quote: None,
            escape: None,
            skip: None,
            detect: true,
            date_format: None,
            timestamp_format: None,
            columns: Vec::new(),
        }
    }
}

/// Layout of a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonShape {
    /// `[{"a": 1, "b": 2}, {"a": 3, "b": 4}]`
    #[default]
    RowArray,
    /// `{"a": [1, 3], "b": [2, 4]}`
    ColumnObject,
}

/// Options for inserting a JSON file into a table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonInsertOptions {
    /// Target schema.
    pub schema: Option<String>,

    /// Target table name.
    pub name: String,

    /// Document layout.
    ///
    /// Default: `JsonShape::RowArray`
    pub shape: JsonShape,

    /// Explicit `(column name, SQL type)` pairs.
    pub columns: Vec<(String, String)>,
}

/// Options for inserting an Arrow IPC stream into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowInsertOptions {
    /// Target schema.
    pub schema: Option<String>,

    /// Target table name.
    pub name: String,

    /// Create the table when it does not exist yet.
    ///
    /// Default: `true`
    pub create: bool,
}

impl Default for ArrowInsertOptions {
    fn default() -> Self {
        Self {
            schema: None,
            name: String::new(),
            create: true,
        }
    }
}

/// Checks shared by all bulk inserts before the bindings are called.
pub(crate) fn validate_table_name(name: &str) -> crate::error::Result<()> {
    if name.trim().is_empty() {
        return Err(crate::error::Error::InvalidUsage(
            "bulk insert requires a table name".into(),
        ));
    }
    Ok(())
}
