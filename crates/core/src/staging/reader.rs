//! Data file decoding
//!
//! The format is chosen from the file extension only. Every cell is returned
//! as text; typing is left to inference.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};
use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::dataset::Dataset;
use super::error::{IngestError, IngestResult};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Accepted input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Comma-separated values
    Csv,
    /// Excel workbook (first worksheet)
    Xlsx,
    /// JSON array of objects or JSON Lines
    Json,
}

impl FileFormat {
    /// Determine the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" => Some(FileFormat::Xlsx),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }
}

/// Configuration for file decoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ReaderConfig {
    /// Text encodings tried in order
    pub encodings: Vec<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            encodings: vec![
                "utf-8-sig".to_string(),
                "utf-8".to_string(),
                "latin-1".to_string(),
            ],
        }
    }
}

/// Reads data files into [`Dataset`]s
#[derive(Debug, Clone, Default)]
pub struct DataFileReader {
    config: ReaderConfig,
}

impl DataFileReader {
    /// Create a reader
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read a data file
    pub fn read(&self, path: &Path) -> IngestResult<Dataset> {
        let format =
            FileFormat::from_path(path).ok_or_else(|| IngestError::UnsupportedFormat(path.to_path_buf()))?;

        let dataset = match format {
            FileFormat::Csv => {
                let text = self.decode(path, &fs::read(path)?)?;
                parse_csv(path, &text)?
            }
            FileFormat::Json => {
                let text = self.decode(path, &fs::read(path)?)?;
                parse_json(path, &text)?
            }
            FileFormat::Xlsx => read_xlsx(path)?,
        };

        if dataset.column_count() == 0 {
            return Err(IngestError::invalid_format(path, "file has no header row"));
        }

        debug!(
            path = %path.display(),
            columns = dataset.column_count(),
            rows = dataset.row_count(),
            "Read data file"
        );
        Ok(dataset)
    }

    /// Decode bytes with the first encoding that accepts them
    pub fn decode(&self, path: &Path, bytes: &[u8]) -> IngestResult<String> {
        for label in &self.config.encodings {
            if let Some(text) = decode_with(label, bytes)? {
                debug!(path = %path.display(), encoding = %label, "Decoded file");
                return Ok(text);
            }
        }
        Err(IngestError::Decode {
            path: path.to_path_buf(),
            attempted: self.config.encodings.clone(),
        })
    }
}

/// Strictly decode with one encoding label, `None` if the bytes are invalid
fn decode_with(label: &str, bytes: &[u8]) -> IngestResult<Option<String>> {
    let normalized = label.trim().to_lowercase().replace('_', "-");
    let (encoding, input): (&'static Encoding, &[u8]) = match normalized.as_str() {
        "utf-8-sig" | "utf8-sig" => (UTF_8, bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)),
        "latin-1" => (encoding_rs::WINDOWS_1252, bytes),
        other => {
            let encoding = Encoding::for_label(other.as_bytes())
                .ok_or_else(|| IngestError::UnknownEncoding(label.to_string()))?;
            (encoding, bytes)
        }
    };

    Ok(encoding
        .decode_without_bom_handling_and_without_replacement(input)
        .map(Cow::into_owned))
}

fn parse_csv(path: &Path, text: &str) -> IngestResult<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::invalid_format(path, e.to_string()))?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::invalid_format(path, e.to_string()))?;
        rows.push(record.iter().map(|v| Some(v.to_string())).collect());
    }

    Ok(Dataset::new(headers, rows))
}

fn parse_json(path: &Path, text: &str) -> IngestResult<Dataset> {
    let trimmed = text.trim_start();
    let records: Vec<Value> = if trimmed.starts_with('[') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(items)) => items,
            Ok(_) => return Err(IngestError::invalid_format(path, "expected a JSON array")),
            Err(e) => return Err(IngestError::invalid_format(path, e.to_string())),
        }
    } else {
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str::<Value>(line).map_err(|e| {
                    IngestError::invalid_format(path, format!("line {}: {}", idx + 1, e))
                })
            })
            .collect::<IngestResult<_>>()?
    };

    let mut headers: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut objects = Vec::with_capacity(records.len());

    for (idx, record) in records.into_iter().enumerate() {
        let Value::Object(object) = record else {
            return Err(IngestError::invalid_format(
                path,
                format!("record {} is not a JSON object", idx + 1),
            ));
        };
        for key in object.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), headers.len());
                headers.push(key.clone());
            }
        }
        objects.push(object);
    }

    let rows = objects
        .into_iter()
        .map(|object| {
            let mut row = vec![None; headers.len()];
            for (key, value) in object {
                if let Some(&position) = positions.get(&key) {
                    row[position] = json_cell(value);
                }
            }
            row
        })
        .collect();

    Ok(Dataset::new(headers, rows))
}

fn json_cell(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}

fn read_xlsx(path: &Path) -> IngestResult<Dataset> {
    let mut workbook: Xlsx<BufReader<File>> =
        open_workbook(path).map_err(|e: calamine::XlsxError| IngestError::invalid_format(path, e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::invalid_format(path, "workbook has no worksheets"))?
        .map_err(|e| IngestError::invalid_format(path, e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| xlsx_cell(cell).unwrap_or_default())
            .collect(),
        None => Vec::new(),
    };

    let body = rows
        .map(|row| row.iter().map(xlsx_cell).collect())
        .collect();

    Ok(Dataset::new(headers, body))
}

fn xlsx_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_float(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Some(format_float(dt.as_f64())),
        },
    }
}

fn format_float(value: f64) -> String {
    // Spreadsheets store every number as a float
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
