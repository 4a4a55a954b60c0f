//! Core table types for representing loaded tabular data

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// An in-memory table, either read from one file or combined from several
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Row data, one cell per column
    pub rows: Vec<Row>,
    /// Files that contributed rows, in concatenation order
    pub sources: Vec<SourceSegment>,
}

impl Table {
    /// Create a new empty table with the given column names
    pub fn new<I, S>(column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: column_names
                .into_iter()
                .enumerate()
                .map(|(i, name)| Column::new(name.into(), i))
                .collect(),
            rows: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Build a table from a header record and raw data records.
    ///
    /// Blank headers are named `Unnamed: <i>` and repeated headers get a
    /// `.1`, `.2`, ... suffix so column names stay unique. Records shorter than
    /// the header are padded with empty cells; longer ones are rejected.
    pub fn from_records<I>(path: &Path, headers: Vec<String>, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<CellValue>>,
    {
        if headers.is_empty() {
            return Err(Error::Parse {
                path: path.to_path_buf(),
                reason: "no columns found".to_string(),
            });
        }

        let mut table = Table::new(unique_column_names(headers));
        let width = table.column_count();

        for (row_idx, mut cells) in records.into_iter().enumerate() {
            if cells.len() > width {
                return Err(Error::Parse {
                    path: path.to_path_buf(),
                    reason: format!(
                        "row {} has {} fields, expected {}",
                        row_idx + 1,
                        cells.len(),
                        width
                    ),
                });
            }
            cells.resize(width, CellValue::Empty);
            table.rows.push(Row::new(cells));
        }

        table.sources.push(SourceSegment {
            path: path.to_path_buf(),
            rows: table.rows.len(),
        });
        Ok(table)
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get a cell by row index and column name
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.find_column(column)?;
        self.rows.get(row).and_then(|r| r.get(col.index))
    }

    /// Ordered column names
    pub fn column_signature(&self) -> ColumnSignature {
        ColumnSignature(self.columns.iter().map(|c| c.name.clone()).collect())
    }

    /// File that provided the row at `row`
    pub fn row_source(&self, row: usize) -> Option<&Path> {
        let mut end = 0;
        for segment in &self.sources {
            end += segment.rows;
            if row < end {
                return Some(&segment.path);
            }
        }
        None
    }

    /// Append the rows of `other`, which must have an identical signature
    pub fn concat(&mut self, other: Table) -> Result<()> {
        let ours = self.column_signature();
        if let Some(diff) = ours.diff(&other.column_signature()) {
            return Err(Error::ColumnMismatch {
                reference: self.first_source(),
                offending: other.first_source(),
                diff,
            });
        }

        self.rows.extend(other.rows);
        self.sources.extend(other.sources);
        Ok(())
    }

    /// Append the rows of `other`, aligning columns by name.
    ///
    /// The result holds the union of both column sets: existing columns keep
    /// their position, columns only present in `other` are appended in
    /// `other`'s order. Cells a row has no value for are `Empty`.
    pub fn concat_aligned(&mut self, other: Table) {
        if self.column_signature() == other.column_signature() {
            self.rows.extend(other.rows);
            self.sources.extend(other.sources);
            return;
        }

        for col in &other.columns {
            if self.find_column(&col.name).is_none() {
                let index = self.columns.len();
                self.columns.push(Column::new(col.name.clone(), index));
            }
        }

        let width = self.columns.len();
        for row in &mut self.rows {
            row.cells.resize(width, CellValue::Empty);
        }

        let col_index: HashMap<&str, usize> = self
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.index))
            .collect();
        // Position in the combined table for each of other's columns
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|c| col_index[c.name.as_str()])
            .collect();

        for row in other.rows {
            let mut cells = vec![CellValue::Empty; width];
            for (value, &target) in row.cells.into_iter().zip(&mapping) {
                cells[target] = value;
            }
            self.rows.push(Row::new(cells));
        }
        self.sources.extend(other.sources);
    }

    fn first_source(&self) -> PathBuf {
        self.sources
            .first()
            .map(|s| s.path.clone())
            .unwrap_or_default()
    }
}

/// A contiguous run of rows that came from one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSegment {
    /// File the rows were read from
    pub path: PathBuf,
    /// Number of rows
    pub rows: usize,
}

/// A column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within its table
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// The ordered column names of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSignature(Vec<String>);

impl ColumnSignature {
    /// Column names in order
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the signature has no columns
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compare `other` against this signature, which acts as the reference.
    ///
    /// Returns `None` when both have the same names in the same order.
    pub fn diff(&self, other: &ColumnSignature) -> Option<SignatureDiff> {
        if self == other {
            return None;
        }

        let theirs: HashSet<&str> = other.0.iter().map(String::as_str).collect();
        let ours: HashSet<&str> = self.0.iter().map(String::as_str).collect();

        Some(SignatureDiff {
            expected: self.0.clone(),
            found: other.0.clone(),
            missing: self
                .0
                .iter()
                .filter(|n| !theirs.contains(n.as_str()))
                .cloned()
                .collect(),
            extra: other
                .0
                .iter()
                .filter(|n| !ours.contains(n.as_str()))
                .cloned()
                .collect(),
        })
    }
}

impl fmt::Display for ColumnSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// How a signature differs from the reference one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureDiff {
    /// Reference column names
    pub expected: Vec<String>,
    /// Offending column names
    pub found: Vec<String>,
    /// Reference columns absent from the offending table
    pub missing: Vec<String>,
    /// Offending columns absent from the reference
    pub extra: Vec<String>,
}

impl SignatureDiff {
    /// Whether the column counts differ
    pub fn count_differs(&self) -> bool {
        self.expected.len() != self.found.len()
    }

    /// Same column names, different order
    pub fn is_reordering(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && !self.count_differs()
    }
}

impl fmt::Display for SignatureDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count_differs() {
            write!(
                f,
                "column count mismatch: {} vs {}",
                self.found.len(),
                self.expected.len()
            )?;
        } else if self.is_reordering() {
            write!(f, "column order mismatch")?;
        } else {
            write!(f, "column names mismatch")?;
        }

        if !self.missing.is_empty() {
            write!(f, "; missing [{}]", self.missing.join(", "))?;
        }
        if !self.extra.is_empty() {
            write!(f, "; unexpected [{}]", self.extra.join(", "))?;
        }
        write!(
            f,
            "; expected [{}], found [{}]",
            self.expected.join(", "),
            self.found.join(", ")
        )
    }
}

/// A cell value with type detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Date and time, as stored in spreadsheets
    DateTime(NaiveDateTime),
    /// String value
    String(String),
    /// Empty/null cell
    Empty,
}

impl CellValue {
    /// Parse a string into a CellValue, detecting the type
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        // Try parsing as integer first
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }

        CellValue::String(trimmed.to_string())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Empty => Ok(()),
        }
    }
}

fn unique_column_names(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());

    for (i, header) in headers.into_iter().enumerate() {
        let base = match header.trim() {
            "" => format!("Unnamed: {}", i),
            trimmed => trimmed.to_string(),
        };

        let mut name = base.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(path: &str, headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_records(
            Path::new(path),
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| CellValue::parse(c)).collect::<Vec<_>>()),
        )
        .unwrap()
    }

    #[test]
    fn test_cell_value_parse_integer() {
        assert_eq!(CellValue::parse("42"), CellValue::Integer(42));
        assert_eq!(CellValue::parse("-123"), CellValue::Integer(-123));
        assert_eq!(CellValue::parse("0"), CellValue::Integer(0));
    }

    #[test]
    fn test_cell_value_parse_float() {
        assert_eq!(CellValue::parse("3.25"), CellValue::Float(3.25));
        assert_eq!(CellValue::parse("-2.5"), CellValue::Float(-2.5));
    }

    #[test]
    fn test_cell_value_parse_bool_and_string() {
        assert_eq!(CellValue::parse("TRUE"), CellValue::Bool(true));
        assert_eq!(CellValue::parse("false"), CellValue::Bool(false));
        assert_eq!(
            CellValue::parse(" hello "),
            CellValue::String("hello".to_string())
        );
    }

    #[test]
    fn test_cell_value_parse_empty() {
        assert_eq!(CellValue::parse(""), CellValue::Empty);
        assert_eq!(CellValue::parse("   "), CellValue::Empty);
        assert!(CellValue::Empty.is_empty());
        assert!(!CellValue::Integer(0).is_empty());
    }

    #[test]
    fn test_from_records_pads_short_rows() {
        let t = table("a.csv", &["id", "name", "age"], &[&["1", "ann"], &["2", "bob", "40"]]);

        assert_eq!(t.row_count(), 2);
        assert_eq!(t.rows[0].cells.len(), 3);
        assert_eq!(t.value(0, "age"), Some(&CellValue::Empty));
        assert_eq!(t.value(1, "age"), Some(&CellValue::Integer(40)));
    }

    #[test]
    fn test_from_records_rejects_long_rows() {
        let err = Table::from_records(
            Path::new("bad.csv"),
            vec!["a".to_string()],
            vec![vec![CellValue::Integer(1), CellValue::Integer(2)]],
        )
        .unwrap_err();

        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_from_records_requires_columns() {
        let err = Table::from_records(Path::new("empty.csv"), Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_unique_column_names() {
        let names = unique_column_names(vec![
            "id".to_string(),
            "".to_string(),
            "id".to_string(),
            "id".to_string(),
        ]);
        assert_eq!(names, vec!["id", "Unnamed: 1", "id.1", "id.2"]);
    }

    #[test]
    fn test_signature_diff_equal() {
        let a = table("a.csv", &["x", "y"], &[]);
        let b = table("b.csv", &["x", "y"], &[]);
        assert!(a.column_signature().diff(&b.column_signature()).is_none());
    }

    #[test]
    fn test_signature_diff_count_and_names() {
        let a = table("a.csv", &["x", "y", "z"], &[]);
        let b = table("b.csv", &["x", "w"], &[]);

        let diff = a.column_signature().diff(&b.column_signature()).unwrap();
        assert!(diff.count_differs());
        assert_eq!(diff.missing, vec!["y", "z"]);
        assert_eq!(diff.extra, vec!["w"]);
        assert!(diff.to_string().starts_with("column count mismatch: 2 vs 3"));
    }

    #[test]
    fn test_signature_diff_order_only() {
        let a = table("a.csv", &["x", "y"], &[]);
        let b = table("b.csv", &["y", "x"], &[]);

        let diff = a.column_signature().diff(&b.column_signature()).unwrap();
        assert!(diff.is_reordering());
        assert!(diff.to_string().starts_with("column order mismatch"));
    }

    #[test]
    fn test_concat_same_signature() {
        let mut a = table("a.csv", &["x", "y"], &[&["1", "2"]]);
        let b = table("b.csv", &["x", "y"], &[&["3", "4"], &["5", "6"]]);

        a.concat(b).unwrap();

        assert_eq!(a.row_count(), 3);
        assert_eq!(a.value(2, "x"), Some(&CellValue::Integer(5)));
        assert_eq!(a.row_source(0), Some(Path::new("a.csv")));
        assert_eq!(a.row_source(1), Some(Path::new("b.csv")));
        assert_eq!(a.row_source(3), None);
    }

    #[test]
    fn test_concat_rejects_different_signature() {
        let mut a = table("a.csv", &["x", "y"], &[&["1", "2"]]);
        let b = table("b.csv", &["x"], &[&["3"]]);

        match a.concat(b) {
            Err(Error::ColumnMismatch {
                reference,
                offending,
                ..
            }) => {
                assert_eq!(reference, PathBuf::from("a.csv"));
                assert_eq!(offending, PathBuf::from("b.csv"));
            }
            other => panic!("expected column mismatch, got {:?}", other),
        }
        assert_eq!(a.row_count(), 1);
    }

    #[test]
    fn test_concat_aligned_column_union() {
        let mut a = table("a.csv", &["id", "name"], &[&["1", "ann"]]);
        let b = table("b.csv", &["email", "id"], &[&["b@x.org", "2"]]);

        a.concat_aligned(b);

        let names: Vec<&str> = a.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "email"]);
        assert_eq!(a.value(0, "email"), Some(&CellValue::Empty));
        assert_eq!(a.value(1, "id"), Some(&CellValue::Integer(2)));
        assert_eq!(a.value(1, "name"), Some(&CellValue::Empty));
        assert_eq!(
            a.value(1, "email"),
            Some(&CellValue::String("b@x.org".to_string()))
        );
        assert!(a.rows.iter().all(|r| r.cells.len() == 3));
    }
}
