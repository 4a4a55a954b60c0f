//! Readers that turn a single CSV or spreadsheet file into a Table
//!
//! The loader only talks to the [`TableReader`] trait. Formats are looked up
//! by file extension in a [`ReaderRegistry`], so adding one does not touch
//! the aggregation code.

use crate::error::{Error, Result};
use crate::table::{CellValue, Table};
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Extensions handled out of the box
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

/// Reads one file into a Table
pub trait TableReader {
    /// Read `path` into a table, failing on malformed or unreadable content
    fn read_table(&self, path: &Path) -> Result<Table>;

    /// Whether a directory entry should be offered to this reader
    fn supports(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl<F> TableReader for F
where
    F: Fn(&Path) -> Result<Table>,
{
    fn read_table(&self, path: &Path) -> Result<Table> {
        self(path)
    }
}

/// Lower-cased file extension
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// CSV reader; the first record is the header
#[derive(Debug, Clone)]
pub struct CsvReader {
    delimiter: u8,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvReader {
    /// Reader using a field delimiter other than `,`
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Parse CSV from any byte source; `path` is only used for errors and provenance
    pub fn read_from<R: Read>(&self, input: R, path: &Path) -> Result<Table> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true) // Row width is checked when the table is built
            .from_reader(input);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| Error::Csv {
                path: path.to_path_buf(),
                source: e,
            })?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for result in csv_reader.records() {
            let record = result.map_err(|e| Error::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;
            records.push(record.iter().map(CellValue::parse).collect::<Vec<_>>());
        }

        Table::from_records(path, headers, records)
    }
}

impl TableReader for CsvReader {
    fn read_table(&self, path: &Path) -> Result<Table> {
        let file = File::open(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.read_from(BufReader::new(file), path)
    }
}

/// Spreadsheet reader for xlsx and xls workbooks.
///
/// Reads the first worksheet; its first row is the header.
#[derive(Debug, Clone, Default)]
pub struct ExcelReader;

impl TableReader for ExcelReader {
    fn read_table(&self, path: &Path) -> Result<Table> {
        let mut workbook = open_workbook_auto(path).map_err(|e| Error::Excel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range.map_err(|e| Error::Excel {
                path: path.to_path_buf(),
                source: e,
            })?,
            None => {
                return Err(Error::Parse {
                    path: path.to_path_buf(),
                    reason: "workbook has no worksheets".to_string(),
                })
            }
        };

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|header| header.iter().map(header_name).collect())
            .unwrap_or_default();
        let records: Vec<Vec<CellValue>> = rows
            .map(|row| row.iter().map(cell_value).collect())
            .collect();

        Table::from_records(path, headers, records)
    }
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

// Largest float that still converts to i64 exactly
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        // Spreadsheets store every number as a float
        Data::Float(f) if f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT => {
            CellValue::Integer(*f as i64)
        }
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

/// Maps file extensions to readers
pub struct ReaderRegistry {
    readers: BTreeMap<String, Box<dyn TableReader>>,
}

impl ReaderRegistry {
    /// Registry with no formats registered
    pub fn empty() -> Self {
        Self {
            readers: BTreeMap::new(),
        }
    }

    /// Register (or replace) the reader for an extension
    pub fn register<R>(mut self, extension: &str, reader: R) -> Self
    where
        R: TableReader + 'static,
    {
        self.readers
            .insert(extension.to_ascii_lowercase(), Box::new(reader));
        self
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.readers.keys().map(String::as_str)
    }

    fn reader_for(&self, path: &Path) -> Result<&dyn TableReader> {
        let extension = extension_of(path).unwrap_or_default();
        self.readers
            .get(&extension)
            .map(|r| r.as_ref())
            .ok_or_else(|| Error::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            })
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::empty()
            .register("csv", CsvReader::default())
            .register("xlsx", ExcelReader)
            .register("xls", ExcelReader)
    }
}

impl std::fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderRegistry")
            .field("extensions", &self.readers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TableReader for ReaderRegistry {
    fn read_table(&self, path: &Path) -> Result<Table> {
        self.reader_for(path)?.read_table(path)
    }

    fn supports(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.readers.contains_key(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse_csv_str(content: &str) -> Result<Table> {
        CsvReader::default().read_from(content.as_bytes(), Path::new("test.csv"))
    }

    #[test]
    fn test_parse_simple_csv() {
        let table = parse_csv_str("id,name,value\n1,foo,100\n2,bar,200\n").unwrap();

        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.columns[0].name, "id");
        assert_eq!(table.columns[2].name, "value");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.value(1, "name"), Some(&CellValue::String("bar".to_string())));
        assert_eq!(table.row_source(0), Some(Path::new("test.csv")));
    }

    #[test]
    fn test_parse_with_empty_cells() {
        let table = parse_csv_str("id,name,value\n1,,100\n2,bar,\n").unwrap();

        assert_eq!(table.rows[0].cells[1], CellValue::Empty);
        assert_eq!(table.rows[1].cells[2], CellValue::Empty);
    }

    #[test]
    fn test_parse_header_only() {
        let table = parse_csv_str("id,name\n").unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_parse_empty_input_fails() {
        assert!(matches!(parse_csv_str(""), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_parse_too_many_fields_fails() {
        let err = parse_csv_str("a,b\n1,2\n3,4,5\n").unwrap_err();
        assert!(err.to_string().contains("row 2 has 3 fields, expected 2"));
    }

    #[test]
    fn test_custom_delimiter() {
        let table = CsvReader::with_delimiter(b';')
            .read_from("a;b\n1;2\n".as_bytes(), Path::new("semi.csv"))
            .unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.value(0, "b"), Some(&CellValue::Integer(2)));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = CsvReader::default()
            .read_table(Path::new("/does/not/exist.csv"))
            .unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_read_xlsx_first_sheet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "id").unwrap();
        sheet.write_string(0, 1, "price").unwrap();
        sheet.write_string(0, 2, "active").unwrap();
        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_number(1, 1, 9.5).unwrap();
        sheet.write_boolean(1, 2, true).unwrap();
        sheet.write_number(2, 0, 2.0).unwrap();
        sheet.write_number(2, 1, 12.25).unwrap();
        sheet.write_boolean(2, 2, false).unwrap();
        workbook.save(&path).unwrap();

        let table = ExcelReader.read_table(&path).unwrap();

        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "price", "active"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value(0, "id"), Some(&CellValue::Integer(1)));
        assert_eq!(table.value(1, "price"), Some(&CellValue::Float(12.25)));
        assert_eq!(table.value(1, "active"), Some(&CellValue::Bool(false)));
    }

    #[test]
    fn test_read_corrupt_xlsx_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, "definitely not a zip archive").unwrap();

        assert!(matches!(
            ExcelReader.read_table(&path),
            Err(Error::Excel { .. })
        ));
    }

    #[test]
    fn test_registry_dispatch_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("DATA.CSV");
        std::fs::write(&path, "x,y\n1,2\n").unwrap();

        let registry = ReaderRegistry::default();
        assert!(registry.supports(&path));
        assert!(registry.supports(Path::new("a.xls")));
        assert!(!registry.supports(Path::new("notes.txt")));
        assert_eq!(registry.extensions().collect::<Vec<_>>(), vec!["csv", "xls", "xlsx"]);

        let table = registry.read_table(&path).unwrap();
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_registry_unsupported_extension() {
        let err = ReaderRegistry::default()
            .read_table(Path::new("notes.txt"))
            .unwrap_err();
        match err {
            Error::UnsupportedFormat { extension, .. } => assert_eq!(extension, "txt"),
            other => panic!("expected unsupported format, got {:?}", other),
        }
    }
}
