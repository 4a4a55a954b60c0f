//! Per-file outcomes, load summaries and the sinks they are reported to

use crate::table::SignatureDiff;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// What happened to one candidate file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStatus {
    Loaded,
    /// No longer a regular file when its turn came
    Skipped,
    Failed,
}

/// Outcome for one candidate file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadOutcome {
    pub path: PathBuf,
    pub status: LoadStatus,
    pub row_count: usize,
    pub column_count: usize,
    pub error_detail: Option<String>,
}

impl LoadOutcome {
    pub fn loaded(path: PathBuf, row_count: usize, column_count: usize) -> Self {
        Self {
            path,
            status: LoadStatus::Loaded,
            row_count,
            column_count,
            error_detail: None,
        }
    }

    pub fn failed(path: PathBuf, detail: String) -> Self {
        Self {
            path,
            status: LoadStatus::Failed,
            row_count: 0,
            column_count: 0,
            error_detail: Some(detail),
        }
    }

    pub fn skipped(path: PathBuf) -> Self {
        Self {
            path,
            status: LoadStatus::Skipped,
            row_count: 0,
            column_count: 0,
            error_detail: None,
        }
    }
}

/// Totals for a finished load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Candidate files processed
    pub attempted: usize,
    pub loaded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Rows in the combined table
    pub rows: usize,
    /// Columns in the combined table
    pub columns: usize,
}

impl LoadSummary {
    pub(crate) fn record(&mut self, outcome: &LoadOutcome) {
        self.attempted += 1;
        match outcome.status {
            LoadStatus::Loaded => self.loaded += 1,
            LoadStatus::Skipped => self.skipped += 1,
            LoadStatus::Failed => self.failed += 1,
        }
    }
}

/// Something worth telling the user about while loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportEvent {
    /// Candidate files found in a directory
    Discovered { count: usize },
    /// Columns will not be compared
    ConsistencySkipped,
    Outcome(LoadOutcome),
    /// A file was admitted even though its columns differ
    Mismatch {
        reference: PathBuf,
        offending: PathBuf,
        diff: SignatureDiff,
    },
    Summary(LoadSummary),
}

impl fmt::Display for ReportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportEvent::Discovered { count } => write!(f, "Found {} files to process", count),
            ReportEvent::ConsistencySkipped => write!(f, "Column consistency check is skipped"),
            ReportEvent::Outcome(outcome) => match outcome.status {
                LoadStatus::Loaded => write!(
                    f,
                    "{} is imported with {} rows and {} columns",
                    outcome.path.display(),
                    outcome.row_count,
                    outcome.column_count
                ),
                LoadStatus::Skipped => write!(f, "{} is skipped", outcome.path.display()),
                LoadStatus::Failed => write!(
                    f,
                    "Error loading {}: {}",
                    outcome.path.display(),
                    outcome.error_detail.as_deref().unwrap_or("unknown error")
                ),
            },
            ReportEvent::Mismatch {
                reference,
                offending,
                diff,
            } => write!(
                f,
                "WARNING: {} does not match reference {}: {}",
                offending.display(),
                reference.display(),
                diff
            ),
            ReportEvent::Summary(summary) => {
                writeln!(f)?;
                writeln!(f, "Summary:")?;
                writeln!(f, "Successfully loaded {} files", summary.loaded)?;
                if summary.failed > 0 || summary.skipped > 0 {
                    writeln!(
                        f,
                        "Failed: {}, skipped: {}",
                        summary.failed, summary.skipped
                    )?;
                }
                write!(
                    f,
                    "Combined dataset has {} rows and {} columns",
                    summary.rows, summary.columns
                )
            }
        }
    }
}

/// Receives report events in the order they happen
pub trait ReportSink {
    fn report(&mut self, event: &ReportEvent);
}

/// Prints every event to stdout
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn report(&mut self, event: &ReportEvent) {
        println!("{}", event);
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<ReportEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcomes reported so far
    pub fn outcomes(&self) -> impl Iterator<Item = &LoadOutcome> {
        self.events.iter().filter_map(|e| match e {
            ReportEvent::Outcome(outcome) => Some(outcome),
            _ => None,
        })
    }

    /// Rendered lines, as the console sink would print them
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }
}

impl ReportSink for MemorySink {
    fn report(&mut self, event: &ReportEvent) {
        self.events.push(event.clone());
    }
}
