use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnStatus {
    Clean,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnDiagnostic {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nulls: usize,
    #[serde(rename = "nullPercentage")]
    pub null_percentage: f64,
    pub unique: usize,
    pub status: ColumnStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: usize,
    pub severity: Severity,
    #[serde(rename = "affectedColumns")]
    pub affected_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub table_name: Option<String>,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnDiagnostic>,
    pub issues: Vec<DatasetIssue>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub table_name: String,
    pub columns: Vec<String>,
    pub rows: usize,
}

#[derive(Debug, Deserialize)]
pub struct CleanRequest {
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct CleanResponse {
    pub message: String,
    pub rows_after: usize,
}
