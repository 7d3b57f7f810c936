//! Input decoding: turns CSV/TSV or JSON bytes into a [`Table`].
//!
//! All file I/O on the input side flows through this module. It provides:
//!
//! - **Format resolution**: `.json` reads as JSON, everything else as
//!   delimited text, unless `--format` says otherwise.
//! - **Delimiter resolution**: `.tsv` → tab, otherwise comma, with manual
//!   override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Size guard**: inputs above the configured limit are refused before
//!   they are parsed.
//! - **stdin**: the `-` path reads standard input.

use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::{Encoding, UTF_8};
use indexmap::IndexMap;
use log::{debug, info};
use serde_json::Value as JsonValue;

use crate::{
    cli::InputFormat,
    data::Value,
    table::{Column, Table},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct InputOptions {
    pub path: PathBuf,
    pub format: Option<InputFormat>,
    pub delimiter: Option<u8>,
    pub encoding: Option<String>,
    pub max_size_mb: u64,
}

impl InputOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
            delimiter: None,
            encoding: None,
            max_size_mb: DEFAULT_MAX_SIZE_MB,
        }
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_format(path: &Path, provided: Option<InputFormat>) -> InputFormat {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
        _ => InputFormat::Csv,
    })
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

/// Reads, decodes and parses the input described by `options`.
pub fn load_table(options: &InputOptions) -> Result<Table> {
    let encoding = resolve_encoding(options.encoding.as_deref())?;
    let bytes = read_input(&options.path, options.max_size_mb)?;
    let text = decode_bytes(&bytes, encoding)
        .with_context(|| format!("Decoding input {:?}", options.path))?;
    if text.trim().is_empty() {
        bail!("Input {:?} is empty", options.path);
    }

    let table = match resolve_format(&options.path, options.format) {
        InputFormat::Csv => {
            let delimiter = resolve_input_delimiter(&options.path, options.delimiter);
            parse_delimited(&text, delimiter)
        }
        InputFormat::Json => parse_json(&text),
    }
    .with_context(|| format!("Parsing input {:?}", options.path))?;

    info!(
        "Loaded {} row(s) x {} column(s) from {:?}",
        table.row_count(),
        table.column_count(),
        options.path
    );
    Ok(table)
}

fn read_input(path: &Path, max_size_mb: u64) -> Result<Vec<u8>> {
    let limit = max_size_mb.saturating_mul(BYTES_PER_MB);
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(path).with_context(|| format!("Opening input file {path:?}"))?)
    };

    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .with_context(|| format!("Reading input {path:?}"))?;
    if bytes.len() as u64 > limit {
        bail!("Input {path:?} exceeds the {max_size_mb} MB size limit");
    }
    debug!("Read {} byte(s) from {path:?}", bytes.len());
    Ok(bytes)
}

/// Parses delimited text with a header row; cells are trimmed and
/// placeholder tokens become missing.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .context("Reading header row")?
        .iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<_>>();
    let mut cells = vec![Vec::new(); headers.len()];
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(Value::from_raw(field));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Table::new(columns)?)
}

/// Parses an array of records or an object of equal-length column arrays.
pub fn parse_json(text: &str) -> Result<Table> {
    let document: JsonValue = serde_json::from_str(text).context("Parsing JSON document")?;
    let columns = match document {
        JsonValue::Array(records) => columns_from_records(records)?,
        JsonValue::Object(fields) => fields
            .into_iter()
            .map(|(name, values)| match values {
                JsonValue::Array(values) => {
                    Ok(Column::new(name, values.into_iter().map(json_cell).collect()))
                }
                other => Err(anyhow!(
                    "Column '{name}' must be an array, found {}",
                    json_kind(&other)
                )),
            })
            .collect::<Result<Vec<_>>>()?,
        other => bail!(
            "Expected an array of records or an object of columns, found {}",
            json_kind(&other)
        ),
    };
    Ok(Table::new(columns)?)
}

fn columns_from_records(records: Vec<JsonValue>) -> Result<Vec<Column>> {
    let mut columns: IndexMap<String, Vec<Value>> = IndexMap::new();
    for (row_idx, record) in records.into_iter().enumerate() {
        let fields = match record {
            JsonValue::Object(fields) => fields,
            other => bail!(
                "Record {} must be an object, found {}",
                row_idx + 1,
                json_kind(&other)
            ),
        };
        for (name, cell) in fields {
            columns
                .entry(name)
                .or_insert_with(|| vec![Value::Missing; row_idx])
                .push(json_cell(cell));
        }
        for values in columns.values_mut() {
            values.resize(row_idx + 1, Value::Missing);
        }
    }
    Ok(columns
        .into_iter()
        .map(|(name, values)| Column::new(name, values))
        .collect())
}

fn json_cell(value: JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Missing,
        JsonValue::Bool(flag) => Value::Boolean(flag),
        JsonValue::Number(number) => number.as_f64().map_or(Value::Missing, Value::Number),
        JsonValue::String(text) => Value::from_raw(&text),
        nested => Value::String(nested.to_string()),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
