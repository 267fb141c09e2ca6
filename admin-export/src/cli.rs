//! Command-line argument definitions.

use admin_export_core::{ExportConfig, FilterMap, SortMap};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level command line
#[derive(Parser, Debug)]
#[command(name = "admin-export")]
#[command(about = "Export, search and import schema-described records")]
#[command(version)]
#[command(long_about = "
admin-export - schema-driven record export

Reads records from a JSON store and renders them the way an admin panel
export does: nested values are flattened to single cells, filter and sort
keys are checked against the schema, and the body is written as CSV, XML
or JSON with a dated filename.

EXAMPLES:
  admin-export export --schema-file profile.json --store profiles.json --format csv
  admin-export export --schema-file profile.json --store profiles.json \\
      --filter profile_type=admin --order profile_created=DESC --output exports/
  admin-export search --schema-file profile.json --store profiles.json --range 10
  admin-export import --schema-file profile.json --store profiles.json --input new.csv
")]
pub struct Cli {
    /// Verbosity flags
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export every matching record
    Export(ExportArgs),
    /// Print one page of matching records as JSON
    Search(SearchArgs),
    /// Import records from a CSV or JSON file
    Import(ImportArgs),
}

/// Flags accepted before the command
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all log output except errors")]
    pub quiet: bool,
}

/// Where schemas and records come from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Schema descriptor file
    #[arg(
        long,
        env = "ADMIN_EXPORT_SCHEMA_FILE",
        help = "JSON file with one schema descriptor or an array of them"
    )]
    pub schema_file: PathBuf,

    /// Record store file
    #[arg(
        long,
        env = "ADMIN_EXPORT_STORE",
        help = "JSON file holding an array of records (created on first import)"
    )]
    pub store: PathBuf,

    /// Schema name
    #[arg(long, help = "Schema to use when the descriptor file defines several")]
    pub schema: Option<String>,
}

/// Settings mapped onto `ExportConfig`
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Default search page size
    #[arg(
        long,
        env = "ADMIN_EXPORT_SEARCH_RANGE",
        default_value_t = 50,
        help = "Default search page size (1-1000)"
    )]
    pub search_range: usize,

    /// Filename date format
    #[arg(
        long,
        env = "ADMIN_EXPORT_DATE_FORMAT",
        default_value = "%Y-%m-%d",
        help = "chrono format for the date in export filenames"
    )]
    pub date_format: String,

    /// Pretty JSON exports
    #[arg(long, env = "ADMIN_EXPORT_JSON_PRETTY", help = "Pretty-print JSON exports")]
    pub json_pretty: bool,

    /// Import row limit
    #[arg(
        long,
        env = "ADMIN_EXPORT_MAX_IMPORT_ROWS",
        default_value_t = 10_000,
        help = "Largest number of rows accepted per import"
    )]
    pub max_import_rows: usize,
}

impl ConfigArgs {
    /// Builds the core configuration; validation happens in the service.
    pub fn to_config(&self) -> ExportConfig {
        ExportConfig::new()
            .with_search_range(self.search_range)
            .with_filename_date_format(self.date_format.clone())
            .with_json_pretty(self.json_pretty)
            .with_max_import_rows(self.max_import_rows)
    }
}

/// Filter and sort parameters shared by export and search
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Filter pairs
    #[arg(
        long = "filter",
        value_name = "FIELD=VALUE",
        value_parser = parse_key_value,
        help = "Equality filter, repeatable"
    )]
    pub filters: Vec<(String, String)>,

    /// Sort pairs
    #[arg(
        long = "order",
        value_name = "FIELD=DIRECTION",
        value_parser = parse_key_value,
        help = "Sort key and ASC/DESC, repeatable; earlier keys take precedence"
    )]
    pub order: Vec<(String, String)>,
}

impl QueryArgs {
    /// Filter pairs in command-line order
    pub fn filter_map(&self) -> FilterMap {
        self.filters.iter().cloned().collect()
    }

    /// Sort pairs in command-line order
    pub fn sort_map(&self) -> SortMap {
        self.order.iter().cloned().collect()
    }
}

/// Arguments of `export`
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Schema and store files
    #[command(flatten)]
    pub source: SourceArgs,

    /// Filters and sort keys
    #[command(flatten)]
    pub query: QueryArgs,

    /// Configuration flags
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Export type
    #[arg(
        short,
        long,
        default_value = "json",
        help = "csv, xml or json; anything else exports JSON"
    )]
    pub format: String,

    /// Relation whose primary key may be filtered on
    #[arg(long, help = "Related schema whose primary key is allowed as a filter")]
    pub relation: Option<String>,

    /// Output path
    #[arg(
        short,
        long,
        help = "Output file, or a directory to write the dated filename into (default: stdout)"
    )]
    pub output: Option<PathBuf>,
}

/// Arguments of `search`
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Schema and store files
    #[command(flatten)]
    pub source: SourceArgs,

    /// Filters and sort keys
    #[command(flatten)]
    pub query: QueryArgs,

    /// Configuration flags
    #[command(flatten)]
    pub config: ConfigArgs,

    /// First row offset
    #[arg(long, default_value_t = 0, help = "Offset of the first row")]
    pub start: usize,

    /// Page size
    #[arg(long, help = "Rows per page (default: --search-range)")]
    pub range: Option<usize>,
}

/// Arguments of `import`
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Schema and store files
    #[command(flatten)]
    pub source: SourceArgs,

    /// Configuration flags
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Upload file
    #[arg(short, long, help = "CSV or JSON file to import")]
    pub input: PathBuf,

    /// Upload format
    #[arg(
        short,
        long,
        value_parser = ["csv", "json"],
        help = "Payload format (default: detected from the file extension)"
    )]
    pub format: Option<String>,
}

/// Parses `key=value`. The value may be empty; the key may not.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}
