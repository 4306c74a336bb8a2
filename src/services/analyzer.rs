use polars::prelude::*;
use rayon::prelude::*;
use crate::error::AppError;
use crate::models::{AnalysisReport, ColumnDiagnostic, ColumnStatus, DatasetIssue, Severity};
use super::cleaner::drop_duplicate_rows;
use super::dataset::column_names;
use super::store::CurrentDataset;

const ERROR_THRESHOLD: f64 = 30.0;
const WARNING_THRESHOLD: f64 = 5.0;

pub const NULL_VALUES_ISSUE: &str = "Null values";
pub const DUPLICATES_ISSUE: &str = "Duplicates";

impl ColumnStatus {
    /// Thresholds are strict: exactly 30% is a warning, exactly 5% is clean.
    pub fn classify(null_percentage: f64) -> Self {
        if null_percentage > ERROR_THRESHOLD {
            ColumnStatus::Error
        } else if null_percentage > WARNING_THRESHOLD {
            ColumnStatus::Warning
        } else {
            ColumnStatus::Clean
        }
    }
}

/// Analyzes a snapshot of the store's current dataset.
pub fn analyze_current(current: &CurrentDataset) -> Result<AnalysisReport, AppError> {
    analyze(&current.frame, Some(&current.table_name))
}

pub fn analyze(df: &DataFrame, table_name: Option<&str>) -> Result<AnalysisReport, AppError> {
    let start = std::time::Instant::now();
    let row_count = df.height();

    let columns = df
        .get_columns()
        .par_iter()
        .map(|series| diagnose_column(series, row_count))
        .collect::<Result<Vec<_>, AppError>>()?;

    let total_nulls: usize = columns.iter().map(|c| c.nulls).sum();
    let null_columns = columns
        .iter()
        .filter(|c| c.nulls > 0)
        .map(|c| c.name.clone())
        .collect();
    let duplicates = count_duplicate_rows(df)?;

    let issues = vec![
        DatasetIssue {
            kind: NULL_VALUES_ISSUE.to_string(),
            count: total_nulls,
            severity: if total_nulls > 0 { Severity::High } else { Severity::Low },
            affected_columns: null_columns,
        },
        DatasetIssue {
            kind: DUPLICATES_ISSUE.to_string(),
            count: duplicates,
            severity: if duplicates > 0 { Severity::Medium } else { Severity::Low },
            affected_columns: column_names(df),
        },
    ];

    tracing::info!(
        "Analyzed {} rows x {} columns in {:?}: {} nulls, {} duplicate rows",
        row_count,
        df.width(),
        start.elapsed(),
        total_nulls,
        duplicates
    );

    Ok(AnalysisReport {
        table_name: table_name.map(str::to_string),
        row_count,
        column_count: df.width(),
        columns,
        issues,
    })
}

fn diagnose_column(series: &Series, row_count: usize) -> Result<ColumnDiagnostic, AppError> {
    let nulls = series.null_count();
    let exact_percentage = exact_null_percentage(nulls, row_count);

    // n_unique counts null as a value of its own.
    let distinct = series.n_unique()?;
    let unique = if nulls > 0 { distinct.saturating_sub(1) } else { distinct };

    Ok(ColumnDiagnostic {
        name: series.name().to_string(),
        data_type: series.dtype().to_string(),
        nulls,
        null_percentage: round_two_decimals(exact_percentage),
        unique,
        status: ColumnStatus::classify(exact_percentage),
    })
}

/// Unrounded percentage of nulls, 0 for an empty dataset.
///
/// Multiplying before dividing keeps whole percentages exact.
fn exact_null_percentage(nulls: usize, row_count: usize) -> f64 {
    if row_count == 0 {
        return 0.0;
    }
    nulls as f64 * 100.0 / row_count as f64
}

// Ties go to the even neighbour, so 3.125 reports as 3.12.
fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Rows that repeat an earlier row exactly.
pub fn count_duplicate_rows(df: &DataFrame) -> Result<usize, AppError> {
    Ok(df.height() - drop_duplicate_rows(df)?.height())
}
