use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    config::BinRule,
    io_utils::{DEFAULT_MAX_SIZE_MB, InputOptions},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Profile tabular datasets instantly", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Profile every column and emit the full JSON document
    Profile(ProfileArgs),
    /// Show the inferred semantic type of each column
    Types(TypesArgs),
    /// Produce frequency counts for one or more columns
    Frequency(FrequencyArgs),
    /// Build a single chart specification on demand
    Visualize(VisualizeArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum InputFormat {
    /// Delimited text with a header row
    Csv,
    /// An array of records or an object of column arrays
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input file to profile (`-` reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Input format (defaults from the file extension)
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Refuse inputs larger than this many megabytes
    #[arg(long = "max-size-mb", default_value_t = DEFAULT_MAX_SIZE_MB)]
    pub max_size_mb: u64,
}

impl InputArgs {
    pub fn to_options(&self) -> InputOptions {
        InputOptions {
            path: self.input.clone(),
            format: self.format,
            delimiter: self.delimiter,
            encoding: self.input_encoding.clone(),
            max_size_mb: self.max_size_mb,
        }
    }
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// YAML file with profiling options; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Number of top values reported per column
    #[arg(long)]
    pub top: Option<usize>,
    /// Maximum distinct values for a string column to count as categorical
    #[arg(long = "categorical-threshold")]
    pub categorical_threshold: Option<usize>,
    /// Missing percentage above which the summary calls a column out
    #[arg(long = "missing-threshold")]
    pub missing_threshold: Option<f64>,
    /// Histogram buckets: a count or `sturges`
    #[arg(long)]
    pub bins: Option<BinRule>,
    /// Worker threads for per-column profiling (0 uses every CPU)
    #[arg(long)]
    pub workers: Option<usize>,
    /// Pretty-print the JSON document
    #[arg(long)]
    pub pretty: bool,
    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct TypesArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Maximum distinct values for a string column to count as categorical
    #[arg(long = "categorical-threshold")]
    pub categorical_threshold: Option<usize>,
}

#[derive(Debug, Args)]
pub struct FrequencyArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Columns to include (defaults to all)
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Maximum number of distinct values to display per column
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct VisualizeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Chart kind: histogram, box, bar, line or correlation
    #[arg(long)]
    pub kind: String,
    /// Column to chart (not needed for correlation)
    #[arg(short = 'C', long = "column")]
    pub column: Option<String>,
    /// Histogram buckets: a count or `sturges`
    #[arg(long)]
    pub bins: Option<BinRule>,
    /// Pretty-print the JSON document
    #[arg(long)]
    pub pretty: bool,
    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
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
