//! Aggregating loader: read every candidate file, reconcile their columns and
//! combine them into one table

use crate::config::{ColumnConsistency, LoaderConfig};
use crate::error::{Error, Result};
use crate::reader::{extension_of, ReaderRegistry, TableReader};
use crate::report::{ConsoleSink, LoadOutcome, LoadSummary, ReportEvent, ReportSink};
use crate::resolver::{resolve, Source};
use crate::table::{ColumnSignature, Table};
use std::path::{Path, PathBuf};

/// The combined table plus the totals that describe how it was built
#[derive(Debug, Clone)]
pub struct LoadResult {
    pub table: Table,
    pub summary: LoadSummary,
}

/// Loads a file or a directory of files into a single Table
#[derive(Debug)]
pub struct DataLoader<R = ReaderRegistry> {
    config: LoaderConfig,
    reader: R,
}

impl DataLoader<ReaderRegistry> {
    /// Loader using the default csv/xlsx/xls readers
    pub fn new(config: LoaderConfig) -> Self {
        Self::with_reader(config, ReaderRegistry::default())
    }
}

impl<R: TableReader> DataLoader<R> {
    /// Loader using a custom reader
    pub fn with_reader(config: LoaderConfig, reader: R) -> Self {
        Self { config, reader }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load and combine, printing the report to stdout when verbose
    pub fn load(&self) -> Result<Table> {
        self.load_with(&mut ConsoleSink).map(|result| result.table)
    }

    /// Load and combine, sending the report to `sink` when verbose
    pub fn load_with(&self, sink: &mut dyn ReportSink) -> Result<LoadResult> {
        let mut out = Reporter {
            sink,
            verbose: self.config.verbose,
        };

        let source = resolve(
            &self.config.root_path,
            self.config.include_subfolders,
            |path| self.reader.supports(path),
        )?;

        match source {
            Source::File(path) => self.load_file(&path, &mut out),
            Source::Directory { root, files } => self.load_directory(&root, &files, &mut out),
        }
    }

    fn load_file(&self, path: &Path, out: &mut Reporter<'_>) -> Result<LoadResult> {
        if !self.reader.supports(path) {
            return Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension_of(path).unwrap_or_default(),
            });
        }

        // Nothing to reconcile against, and no other file could succeed
        let table = self.reader.read_table(path)?;

        let mut summary = LoadSummary::default();
        let outcome = LoadOutcome::loaded(path.to_path_buf(), table.row_count(), table.column_count());
        summary.record(&outcome);
        out.emit(ReportEvent::Outcome(outcome));

        Ok(self.finish(table, summary, out))
    }

    fn load_directory(
        &self,
        root: &Path,
        files: &[PathBuf],
        out: &mut Reporter<'_>,
    ) -> Result<LoadResult> {
        let policy = self.config.column_consistency;

        out.emit(ReportEvent::Discovered { count: files.len() });
        if policy == ColumnConsistency::Ignore {
            out.emit(ReportEvent::ConsistencySkipped);
        }

        let mut summary = LoadSummary::default();
        let mut reference: Option<(PathBuf, ColumnSignature)> = None;
        let mut admitted: Vec<Table> = Vec::new();

        for path in files {
            let outcome = if !path.is_file() {
                tracing::debug!(path = %path.display(), "candidate disappeared, skipping");
                LoadOutcome::skipped(path.clone())
            } else {
                match self.reader.read_table(path) {
                    Ok(table) => {
                        if policy != ColumnConsistency::Ignore {
                            self.reconcile(&mut reference, path, &table, out)?;
                        }
                        let outcome =
                            LoadOutcome::loaded(path.clone(), table.row_count(), table.column_count());
                        admitted.push(table);
                        outcome
                    }
                    Err(e) => {
                        tracing::debug!(path = %path.display(), error = %e, "failed to load file");
                        LoadOutcome::failed(path.clone(), e.to_string())
                    }
                }
            };

            summary.record(&outcome);
            out.emit(ReportEvent::Outcome(outcome));
        }

        let table = combine(admitted, policy)?.ok_or_else(|| Error::NoDataLoaded {
            path: root.to_path_buf(),
            failed: summary.failed,
        })?;

        Ok(self.finish(table, summary, out))
    }

    /// Check `table` against the reference signature, establishing it on the
    /// first call
    fn reconcile(
        &self,
        reference: &mut Option<(PathBuf, ColumnSignature)>,
        path: &Path,
        table: &Table,
        out: &mut Reporter<'_>,
    ) -> Result<()> {
        let signature = table.column_signature();

        let (reference_path, reference_signature) = match reference {
            Some(reference) => reference,
            None => {
                *reference = Some((path.to_path_buf(), signature));
                return Ok(());
            }
        };

        let Some(diff) = reference_signature.diff(&signature) else {
            return Ok(());
        };

        if self.config.column_consistency == ColumnConsistency::Error {
            return Err(Error::ColumnMismatch {
                reference: reference_path.clone(),
                offending: path.to_path_buf(),
                diff,
            });
        }

        tracing::warn!(
            reference = %reference_path.display(),
            path = %path.display(),
            %diff,
            "column mismatch tolerated"
        );
        out.emit(ReportEvent::Mismatch {
            reference: reference_path.clone(),
            offending: path.to_path_buf(),
            diff,
        });
        Ok(())
    }

    fn finish(&self, table: Table, mut summary: LoadSummary, out: &mut Reporter<'_>) -> LoadResult {
        summary.rows = table.row_count();
        summary.columns = table.column_count();
        out.emit(ReportEvent::Summary(summary.clone()));
        LoadResult { table, summary }
    }
}

/// Concatenate admitted tables in order.
///
/// Under `Error` every table already shares one signature, so a strict
/// concat is used; otherwise columns are aligned by name.
fn combine(tables: Vec<Table>, policy: ColumnConsistency) -> Result<Option<Table>> {
    let mut tables = tables.into_iter();
    let Some(mut combined) = tables.next() else {
        return Ok(None);
    };

    for table in tables {
        match policy {
            ColumnConsistency::Error => combined.concat(table)?,
            ColumnConsistency::Warning | ColumnConsistency::Ignore => combined.concat_aligned(table),
        }
    }
    Ok(Some(combined))
}

/// Forwards events to the sink only in verbose mode
struct Reporter<'a> {
    sink: &'a mut dyn ReportSink,
    verbose: bool,
}

impl Reporter<'_> {
    fn emit(&mut self, event: ReportEvent) {
        if self.verbose {
            self.sink.report(&event);
        }
    }
}

/// Load `path` (a file or a directory) into one table
pub fn load(
    path: impl Into<PathBuf>,
    include_subfolders: bool,
    verbose: bool,
    column_consistency: ColumnConsistency,
) -> Result<Table> {
    let config = LoaderConfig::new(path)
        .include_subfolders(include_subfolders)
        .verbose(verbose)
        .column_consistency(column_consistency);
    DataLoader::new(config).load()
}
