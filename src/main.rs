use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;

use rusty_catalog::{
    read_file, AngleUnit, ColumnType, Delimiter, MalformedRowPolicy, ReadOptions, SkippedRow,
    Table,
};

/// Read a delimited astronomical catalog and summarise it.
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    /// The catalog file to read.
    #[clap(name = "CATALOG", parse(from_os_str))]
    path: PathBuf,

    /// A JSON file of read options. Flags given here override its values.
    #[clap(long, parse(from_os_str))]
    options: Option<PathBuf>,

    /// Which non-comment line holds the column names (0-based).
    #[clap(long)]
    header_row: Option<usize>,

    /// The file has no header line; columns are named col1, col2, ...
    #[clap(long)]
    no_header: bool,

    /// Which non-comment line the data starts on (0-based). Defaults to the
    /// line after the header.
    #[clap(long)]
    data_start: Option<usize>,

    /// comma, tab, whitespace or any single character. Guessed if not given.
    #[clap(long)]
    delimiter: Option<Delimiter>,

    /// Lines starting with this are ignored.
    #[clap(long)]
    comment: Option<String>,

    /// Treat every line as content, even those starting with '#'.
    #[clap(long)]
    no_comments: bool,

    /// Extra cell text that means "missing". May be given several times.
    #[clap(long = "missing")]
    missing: Vec<String>,

    /// Drop data lines with the wrong number of fields instead of failing.
    #[clap(long)]
    skip_malformed: bool,

    /// A column of sexagesimal angles to convert to decimal degrees. Adds
    /// "<name>_deg" and "<name>_wrapped" columns.
    #[clap(long)]
    ra_column: Option<String>,

    /// The unit of --ra-column: hours or degrees.
    #[clap(long, default_value = "hours")]
    ra_unit: AngleUnit,

    /// Wrap converted angles into [wrap-at - 360, wrap-at) degrees.
    #[clap(long, allow_hyphen_values = true, default_value = "180")]
    wrap_at: f64,

    /// How many rows to print.
    #[clap(long, default_value = "10")]
    head: usize,

    /// Print a JSON summary instead of a text table.
    #[clap(long)]
    json: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv).
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = match args.verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let options = build_options(&args)?;
    let table = read_file(&args.path, &options)
        .with_context(|| format!("reading catalog {}", args.path.display()))?;
    info!("Columns: {}", table.column_names().join(", "));

    let table = match &args.ra_column {
        Some(column) => with_converted_angles(&table, column, args.ra_unit, args.wrap_at)
            .with_context(|| format!("converting column '{column}'"))?,
        None => table,
    };

    if args.json {
        let summary = Summary::new(&args.path, &table);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_text(&table, args.head)?;
    }
    Ok(())
}

fn build_options(args: &Args) -> Result<ReadOptions> {
    let mut options = match &args.options {
        Some(path) => ReadOptions::from_json_file(path)
            .with_context(|| format!("loading options from {}", path.display()))?,
        None => ReadOptions::default(),
    };

    if let Some(i) = args.header_row {
        options.header_row_index = i;
    }
    if args.no_header {
        options.has_header = false;
    }
    if let Some(i) = args.data_start {
        options.data_start_index = Some(i);
    }
    if let Some(d) = args.delimiter {
        options.delimiter = Some(d);
    }
    if let Some(prefix) = &args.comment {
        options.comment_prefix = Some(prefix.clone());
    }
    if args.no_comments {
        options.comment_prefix = None;
    }
    options.missing_tokens.extend(args.missing.iter().cloned());
    if args.skip_malformed {
        options.on_malformed_row = MalformedRowPolicy::Skip;
    }
    Ok(options)
}

fn with_converted_angles(
    table: &Table,
    column: &str,
    unit: AngleUnit,
    wrap_at: f64,
) -> Result<Table> {
    let degrees = table.try_column(column)?.sexagesimal_to_degrees(unit)?;
    let wrapped = degrees.wrapped(wrap_at)?;
    let table = table
        .with_column(degrees.renamed(format!("{column}_deg")))?
        .with_column(wrapped.renamed(format!("{column}_wrapped")))?;
    Ok(table)
}

fn print_text(table: &Table, head: usize) -> Result<()> {
    println!("{} rows, {} columns", table.num_rows(), table.num_columns());
    for column in table.columns() {
        println!(
            "  {:<20} {:<8} {} missing",
            column.name(),
            column.column_type().to_string(),
            column.missing_count()
        );
    }
    for skipped in table.skipped_rows() {
        println!(
            "  skipped line {}: {} fields, expected {}",
            skipped.line, skipped.found, skipped.expected
        );
    }

    let batch = table.to_record_batch()?;
    let shown = batch.slice(0, head.min(batch.num_rows()));
    println!("{}", arrow::util::pretty::pretty_format_batches(&[shown])?);
    Ok(())
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    path: String,
    num_rows: usize,
    columns: Vec<ColumnSummary<'a>>,
    skipped_rows: &'a [SkippedRow],
}

#[derive(Debug, Serialize)]
struct ColumnSummary<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    column_type: ColumnType,
    missing: usize,
}

impl<'a> Summary<'a> {
    fn new(path: &std::path::Path, table: &'a Table) -> Self {
        Summary {
            path: path.display().to_string(),
            num_rows: table.num_rows(),
            columns: table
                .columns()
                .iter()
                .map(|c| ColumnSummary {
                    name: c.name(),
                    column_type: c.column_type(),
                    missing: c.missing_count(),
                })
                .collect(),
            skipped_rows: table.skipped_rows(),
        }
    }
}
