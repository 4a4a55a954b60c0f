//! tabload CLI
//!
//! Command-line tool for loading CSV and spreadsheet files, alone or a whole
//! folder at a time, into one combined table.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tabload_core::{
    resolve, ColumnConsistency, CsvReader, DataLoader, LoaderConfig, ReaderRegistry, Table,
    TableReader,
};

#[derive(Parser)]
#[command(name = "tabload")]
#[command(about = "Load and combine CSV/XLSX/XLS files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a file or folder and show the combined table
    Load {
        #[command(flatten)]
        load: LoadArgs,

        /// Maximum number of rows to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Columns to display (comma-separated)
        #[arg(short, long)]
        columns: Option<String>,
    },

    /// Load a file or folder and write the combined table to a file
    Export {
        #[command(flatten)]
        load: LoadArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the files a load would read, in load order
    Scan {
        /// File or folder to scan
        path: PathBuf,

        /// Include files in subfolders
        #[arg(short, long)]
        recursive: bool,
    },
}

#[derive(Args)]
struct LoadArgs {
    /// File or folder to load [default: the config file's root, else "."]
    path: Option<PathBuf>,

    /// JSON loader configuration; flags given on the command line win
    #[arg(long)]
    config: Option<PathBuf>,

    /// Include files in subfolders
    #[arg(short, long)]
    recursive: bool,

    /// Do not print per-file outcomes or the summary
    #[arg(short, long)]
    quiet: bool,

    /// What to do when files have different columns
    #[arg(long, value_enum)]
    consistency: Option<ConsistencyArg>,

    /// Field delimiter for CSV files (a single ASCII character)
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConsistencyArg {
    Error,
    Warning,
    Ignore,
}

impl From<ConsistencyArg> for ColumnConsistency {
    fn from(value: ConsistencyArg) -> Self {
        match value {
            ConsistencyArg::Error => ColumnConsistency::Error,
            ConsistencyArg::Warning => ColumnConsistency::Warning,
            ConsistencyArg::Ignore => ColumnConsistency::Ignore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

impl LoadArgs {
    fn to_config(&self) -> tabload_core::Result<LoaderConfig> {
        let mut config = match &self.config {
            Some(file) => LoaderConfig::load(file)?,
            None => LoaderConfig::new("."),
        };

        if let Some(path) = &self.path {
            config.root_path = path.clone();
        }
        if self.recursive {
            config.include_subfolders = true;
        }
        if self.quiet {
            config.verbose = false;
        }
        if let Some(consistency) = self.consistency {
            config.column_consistency = consistency.into();
        }
        Ok(config)
    }

    fn registry(&self) -> ReaderRegistry {
        ReaderRegistry::default().register("csv", CsvReader::with_delimiter(self.delimiter))
    }

    fn load(&self) -> tabload_core::Result<Table> {
        DataLoader::with_reader(self.to_config()?, self.registry()).load()
    }
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("delimiter must be a single ASCII character, got {:?}", s)),
    }
}

fn main() {
    // RUST_LOG=debug shows per-file diagnostics
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> tabload_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Load {
            load,
            limit,
            columns,
        } => cmd_load(&load, limit, columns),
        Commands::Export {
            load,
            format,
            output,
        } => cmd_export(&load, format, &output),
        Commands::Scan { path, recursive } => cmd_scan(&path, recursive),
    }
}

fn cmd_load(args: &LoadArgs, limit: usize, columns: Option<String>) -> tabload_core::Result<()> {
    let table = args.load()?;

    // Filter columns if specified
    let col_filter: Option<Vec<&str>> = columns.as_ref().map(|c| c.split(',').collect());

    let display_cols: Vec<&tabload_core::Column> = if let Some(ref filter) = col_filter {
        table
            .columns
            .iter()
            .filter(|c| filter.contains(&c.name.as_str()))
            .collect()
    } else {
        table.columns.iter().collect()
    };

    println!();
    let header: Vec<&str> = display_cols.iter().map(|c| c.name.as_str()).collect();
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    for row in table.rows.iter().take(limit) {
        let values: Vec<String> = display_cols
            .iter()
            .map(|col| {
                row.get(col.index)
                    .map(|c| c.to_string_value())
                    .unwrap_or_default()
            })
            .collect();
        println!("{}", values.join("\t"));
    }

    if table.row_count() > limit {
        println!("... ({} more rows)", table.row_count() - limit);
    }

    Ok(())
}

fn cmd_export(args: &LoadArgs, format: OutputFormat, output: &Path) -> tabload_core::Result<()> {
    let table = args.load()?;

    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Csv => write_csv(&table, &mut writer)?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&table)?;
            writeln!(writer, "{}", json)?;
        }
    }
    writer.flush()?;

    if !args.quiet {
        println!("Exported {} rows to {}", table.row_count(), output.display());
    }

    Ok(())
}

fn cmd_scan(path: &Path, recursive: bool) -> tabload_core::Result<()> {
    let registry = ReaderRegistry::default();
    let source = resolve(path, recursive, |p| registry.supports(p))?;

    for file in source.files() {
        println!("{}", file.display());
    }
    println!();
    println!("Found {} file(s)", source.files().len());

    Ok(())
}

/// Write a table as CSV with a header row
fn write_csv<W: Write>(table: &Table, out: W) -> tabload_core::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    let csv_err = |e: csv::Error| tabload_core::Error::Csv {
        path: PathBuf::from("<output>"),
        source: e,
    };

    writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .map_err(csv_err)?;
    for row in &table.rows {
        writer
            .write_record(row.cells.iter().map(|c| c.to_string_value()))
            .map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}
