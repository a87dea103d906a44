use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Profile and filter delimited data files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sample a file and infer per-column value formats into a column file
    Probe(ProbeArgs),
    /// Enumerate the distinct values of one column as a filter pick list
    Clusters(ClustersArgs),
    /// Apply filter expressions to a file and show the surviving rows
    Filter(FilterArgs),
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input delimited file to inspect ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination column file (.columns.yaml); skipped when omitted
    #[arg(short = 'c', long = "columns")]
    pub columns: Option<PathBuf>,
    /// Number of rows to sample when inferring formats (0 means full scan)
    #[arg(long, default_value_t = 2000)]
    pub sample_rows: usize,
    /// Minimum matching samples before a format guess is accepted
    #[arg(long, default_value_t = 4)]
    pub min_matches: usize,
    /// Maximum distinct values collected per column during sampling
    #[arg(long, default_value_t = 200)]
    pub max_distinct: usize,
    /// Literals treated as null in addition to empty cells
    #[arg(long = "null", action = clap::ArgAction::Append)]
    pub null_literals: Vec<String>,
    /// Decimal separator character of the file's locale
    #[arg(long, default_value_t = '.')]
    pub decimal_separator: char,
    /// Digit group separator character, if the file uses one
    #[arg(long)]
    pub group_separator: Option<char>,
    /// Extra true literals, ';'-separated, merged with the defaults
    #[arg(long, default_value = "")]
    pub true_literals: String,
    /// Extra false literals, ';'-separated, merged with the defaults
    #[arg(long, default_value = "")]
    pub false_literals: String,
    /// Known date format list (';'-separated) used as an inference hint
    #[arg(long = "date-format")]
    pub known_date_formats: Option<String>,
    /// Also recognize serial date-time numbers (days since 1899-12-30)
    #[arg(long)]
    pub serial_dates: bool,
    /// Strip currency symbols when matching numbers
    #[arg(long)]
    pub currency: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ClustersArgs {
    /// Input delimited file to scan
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Column file with value formats from a previous probe
    #[arg(short = 'c', long = "columns")]
    pub columns: Option<PathBuf>,
    /// Column name to cluster
    #[arg(short = 'n', long = "name")]
    pub column: String,
    /// Maximum distinct values before clustering is refused
    #[arg(long, default_value_t = 40)]
    pub max_values: usize,
    /// Filter expression applied before clustering
    #[arg(long = "where")]
    pub filter: Option<String>,
    /// Ranking of the resulting pick list
    #[arg(long, value_enum, default_value = "frequency")]
    pub rank: RankOrder,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum RankOrder {
    Frequency,
    Value,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Input delimited file to filter
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Column file with value formats from a previous probe
    #[arg(short = 'c', long = "columns")]
    pub columns: Option<PathBuf>,
    /// Per-column filter terms of the form `column: expression`
    #[arg(long = "term", action = clap::ArgAction::Append)]
    pub terms: Vec<String>,
    /// Per-column "any of" terms of the form `column: value; value`
    #[arg(long = "any-of", action = clap::ArgAction::Append)]
    pub any_of: Vec<String>,
    /// View settings file; stored filters are loaded before the terms and
    /// the combined result is written back
    #[arg(short = 's', long = "settings")]
    pub settings: Option<PathBuf>,
    /// Render the surviving rows as a table instead of a row count
    #[arg(long)]
    pub table: bool,
    /// Limit rows shown with --table
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
