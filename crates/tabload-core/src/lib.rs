//! tabload-core: Core library for loading CSV and spreadsheet files into one table
//!
//! This library provides functionality to:
//! - Resolve a file or directory (optionally recursive) into candidate files
//! - Read CSV, XLSX and XLS files into structured tables
//! - Check that the files share the same columns, per a configurable policy
//! - Combine everything that loaded into a single table, tolerating broken files
//! - Report per-file outcomes and a summary

pub mod config;
pub mod error;
pub mod loader;
pub mod reader;
pub mod report;
pub mod resolver;
pub mod table;

pub use config::{ColumnConsistency, LoaderConfig};
pub use error::{Error, Result};
pub use loader::{load, DataLoader, LoadResult};
pub use reader::{CsvReader, ExcelReader, ReaderRegistry, TableReader};
pub use report::{
    ConsoleSink, LoadOutcome, LoadStatus, LoadSummary, MemorySink, ReportEvent, ReportSink,
};
pub use resolver::{resolve, Source};
pub use table::{CellValue, Column, ColumnSignature, Row, SignatureDiff, SourceSegment, Table};
