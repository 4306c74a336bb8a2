//! Tabular dataset helpers: CSV decoding, column kinds and record export.

use std::io::Cursor;
use bytes::Bytes;
use polars::prelude::*;
use serde_json::{Map, Number, Value};
use crate::error::AppError;

/// Name of the identifier column maintained by the cleaner.
pub const ID_COLUMN: &str = "id";

/// Declared type of a column, fixed by the dtype the CSV reader assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Other,
}

impl ColumnKind {
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::String => ColumnKind::Text,
            d if d.is_integer() => ColumnKind::Integer,
            d if d.is_float() => ColumnKind::Float,
            _ => ColumnKind::Other,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

/// Cell texts read as missing, on top of empty fields.
pub const NULL_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn read_csv(data: Bytes) -> Result<DataFrame, AppError> {
    tracing::debug!("Parsing CSV payload of {} bytes", data.len());
    let null_values = NullValues::AllColumns(NULL_TOKENS.iter().map(|s| s.to_string()).collect());
    let mut df = CsvReader::new(Cursor::new(data))
        .has_header(true)
        .with_null_values(Some(null_values))
        .finish()
        .map_err(|e| {
            tracing::error!("Failed to parse CSV: {}", e);
            AppError::MalformedInput(e.to_string())
        })?;

    widen_all_null_columns(&mut df)?;

    tracing::info!("Parsed CSV: {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

/// Columns with no values at all are typed as floats, not text.
fn widen_all_null_columns(df: &mut DataFrame) -> Result<(), AppError> {
    let empty: Vec<Series> = df
        .get_columns()
        .iter()
        .filter(|s| !s.is_empty() && s.null_count() == s.len() && s.dtype() != &DataType::Float64)
        .cloned()
        .collect();

    for series in empty {
        tracing::debug!("Column '{}' has no values, reading it as float", series.name());
        df.with_column(series.cast(&DataType::Float64)?)?;
    }
    Ok(())
}

/// Lowercased text before the first '.' of the uploaded filename.
///
/// A leading dot yields an empty name.
pub fn table_name_from_filename(filename: &str) -> String {
    filename.split('.').next().unwrap_or_default().to_lowercase()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|&s| s.to_string())
        .collect()
}

/// Row records keyed by column name, in column order.
pub fn to_records(df: &DataFrame) -> Result<Vec<Map<String, Value>>, AppError> {
    let names = column_names(df);
    let columns = df
        .get_columns()
        .iter()
        .map(series_to_json)
        .collect::<Result<Vec<_>, _>>()?;

    let records = (0..df.height())
        .map(|row_idx| {
            names
                .iter()
                .zip(&columns)
                .map(|(name, values)| (name.clone(), values[row_idx].clone()))
                .collect()
        })
        .collect();

    Ok(records)
}

fn series_to_json(series: &Series) -> Result<Vec<Value>, AppError> {
    (0..series.len())
        .map(|idx| -> Result<Value, AppError> { Ok(any_value_to_json(series.get(idx)?)) })
        .collect()
}

fn any_value_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(v) => Value::Bool(v),
        AnyValue::String(v) => Value::String(v.to_string()),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_to_json(v as f64),
        AnyValue::Float64(v) => float_to_json(v),
        other => Value::String(other.to_string()),
    }
}

// JSON has no NaN or infinity.
fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}
