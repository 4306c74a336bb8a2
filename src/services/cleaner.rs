use std::fmt;
use polars::prelude::*;
use tracing::{debug, info, warn};
use crate::error::AppError;
use super::dataset::{ColumnKind, ID_COLUMN};

/// Placeholder written into nulls left over by a full clean.
pub const MISSING_PLACEHOLDER: &str = "Sin valor";
/// Placeholder written into text nulls by a single-column clean.
pub const UNKNOWN_PLACEHOLDER: &str = "Desconocido";

const ACTION_PREFIX: &str = "clean_";
const CLEAN_ALL: &str = "clean_all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanAction {
    CleanAll,
    CleanColumn(String),
}

impl CleanAction {
    pub fn parse(action: &str) -> Result<Self, AppError> {
        if action == CLEAN_ALL {
            return Ok(CleanAction::CleanAll);
        }
        match action.strip_prefix(ACTION_PREFIX) {
            Some(column) => Ok(CleanAction::CleanColumn(column.to_string())),
            None => Err(AppError::UnrecognizedAction(action.to_string())),
        }
    }

    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame, AppError> {
        match self {
            CleanAction::CleanAll => clean_all(df),
            CleanAction::CleanColumn(column) => clean_column(df, column),
        }
    }
}

impl fmt::Display for CleanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanAction::CleanAll => write!(f, "{}", CLEAN_ALL),
            CleanAction::CleanColumn(column) => write!(f, "{}{}", ACTION_PREFIX, column),
        }
    }
}

/// Deduplicates rows, repairs the id column and imputes every null.
pub fn clean_all(df: &DataFrame) -> Result<DataFrame, AppError> {
    let mut cleaned = drop_duplicate_rows(df)?;
    debug!("Dropped {} duplicate rows", df.height() - cleaned.height());

    ensure_id_column(&mut cleaned)?;
    impute_nulls(&mut cleaned)?;

    info!(
        "Full clean done: {} -> {} rows, {} columns",
        df.height(),
        cleaned.height(),
        cleaned.width()
    );
    Ok(cleaned)
}

/// Fills the nulls of a single column according to its kind.
pub fn clean_column(df: &DataFrame, column: &str) -> Result<DataFrame, AppError> {
    let series = df
        .column(column)
        .map_err(|_| AppError::ColumnNotFound(column.to_string()))?;

    if series.null_count() == 0 {
        debug!("Column '{}' has no nulls, nothing to clean", column);
        return Ok(df.clone());
    }

    let filled = match ColumnKind::of(series.dtype()) {
        ColumnKind::Text => Some(fill_text_nulls(series, UNKNOWN_PLACEHOLDER)?),
        ColumnKind::Integer | ColumnKind::Float => series
            .mean()
            .map(|mean| fill_numeric_nulls(series, mean))
            .transpose()?,
        ColumnKind::Other => None,
    };

    let mut cleaned = df.clone();
    match filled {
        Some(series) => {
            cleaned.with_column(series)?;
            info!("Filled nulls of column '{}'", column);
        }
        None => debug!("Column '{}' left unchanged", column),
    }
    Ok(cleaned)
}

/// Keeps the first occurrence of every exact duplicate row, in order.
pub fn drop_duplicate_rows(df: &DataFrame) -> Result<DataFrame, AppError> {
    if df.height() == 0 || df.width() == 0 {
        return Ok(df.clone());
    }
    Ok(df.unique_stable(None, UniqueKeepStrategy::First, None)?)
}

fn ensure_id_column(df: &mut DataFrame) -> Result<(), AppError> {
    let regenerate = match df.column(ID_COLUMN) {
        Ok(ids) => {
            let invalid = ids.null_count() > 0 || ids.n_unique()? < ids.len();
            if invalid {
                warn!("Duplicate or missing ids detected, regenerating unique ids");
            }
            invalid
        }
        Err(_) => true,
    };

    if regenerate {
        df.with_column(sequential_ids(df.height()))?;
    }
    Ok(())
}

fn sequential_ids(len: usize) -> Series {
    Series::new(ID_COLUMN, (1..=len as i64).collect::<Vec<i64>>())
}

fn impute_nulls(df: &mut DataFrame) -> Result<(), AppError> {
    let names: Vec<String> = df.get_column_names().iter().map(|&s| s.to_string()).collect();

    for name in names {
        let mut series = df.column(&name)?.clone();
        if series.null_count() == 0 {
            continue;
        }

        if ColumnKind::of(series.dtype()).is_numeric() {
            if let Some(mean) = series.mean() {
                series = fill_numeric_nulls(&series, mean)?;
            }
        }

        // Anything still null, including all-null numeric columns.
        if series.null_count() > 0 {
            series = fill_text_nulls(&series, MISSING_PLACEHOLDER)?;
        }

        df.with_column(series)?;
    }
    Ok(())
}

fn fill_numeric_nulls(series: &Series, value: f64) -> PolarsResult<Series> {
    let values = series.cast(&DataType::Float64)?;
    let filled: Vec<f64> = values
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(value))
        .collect();
    Ok(Series::new(series.name(), filled))
}

fn fill_text_nulls(series: &Series, placeholder: &str) -> PolarsResult<Series> {
    let text = series.cast(&DataType::String)?;
    let filled: Vec<String> = text
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(placeholder).to_string())
        .collect();
    Ok(Series::new(series.name(), filled))
}
