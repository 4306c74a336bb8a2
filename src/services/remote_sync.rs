use polars::prelude::DataFrame;
use reqwest::{Client, Response};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};
use crate::config::SupabaseConfig;
use crate::error::AppError;
use super::dataset::{column_names, to_records};

/// Mirrors datasets into a Supabase project through its REST API.
///
/// Every failure is logged and swallowed: the in-memory dataset stays the
/// source of truth and callers never see a sync error.
pub struct RemoteSync {
    client: Client,
    target: Option<SupabaseConfig>,
}

impl RemoteSync {
    pub fn new(target: Option<SupabaseConfig>) -> Self {
        match &target {
            Some(cfg) => info!("Remote sync enabled for {}", cfg.url),
            None => warn!("Supabase credentials not configured; remote sync disabled"),
        }
        Self {
            client: Client::new(),
            target,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Creates the table with every column as text, if it does not exist.
    pub async fn ensure_table(&self, table_name: &str, columns: &[String]) -> Result<(), AppError> {
        let Some(target) = &self.target else {
            return Ok(());
        };

        let query = create_table_sql(table_name, columns);
        debug!("Create table SQL: {}", query);

        let response = self
            .client
            .post(format!("{}/rest/v1/rpc/execute_sql", target.url))
            .header("apikey", &target.key)
            .bearer_auth(&target.key)
            .json(&json!({ "query": query }))
            .send()
            .await?;
        ensure_success(response, "create table").await?;

        info!("Table '{}' created or already present", table_name);
        Ok(())
    }

    pub async fn insert_rows(&self, table_name: &str, records: &[Map<String, Value>]) -> Result<(), AppError> {
        let Some(target) = &self.target else {
            return Ok(());
        };
        if records.is_empty() {
            debug!("No rows to insert into '{}'", table_name);
            return Ok(());
        }

        let response = self
            .client
            .post(format!("{}/rest/v1/{}", target.url, table_name))
            .header("apikey", &target.key)
            .header("Prefer", "return=minimal")
            .bearer_auth(&target.key)
            .json(records)
            .send()
            .await?;
        ensure_success(response, "insert").await?;

        info!("{} rows inserted into '{}'", records.len(), table_name);
        Ok(())
    }

    /// Best-effort copy of `frame` into `table_name`.
    pub async fn mirror(&self, table_name: &str, frame: &DataFrame, ensure_schema: bool) {
        if !self.is_enabled() {
            warn!("Remote sync disabled, skipping mirror of '{}'", table_name);
            return;
        }

        if let Err(e) = self.try_mirror(table_name, frame, ensure_schema).await {
            error!("Remote sync of '{}' failed: {}", table_name, e);
        }
    }

    async fn try_mirror(&self, table_name: &str, frame: &DataFrame, ensure_schema: bool) -> Result<(), AppError> {
        // Table creation failures are logged but do not stop the insert.
        if ensure_schema {
            if let Err(e) = self.ensure_table(table_name, &column_names(frame)).await {
                error!("Failed to create table '{}': {}", table_name, e);
            }
        }

        let records = to_records(frame)?;
        self.insert_rows(table_name, &records).await
    }
}

async fn ensure_success(response: Response, operation: &str) -> Result<(), AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::RemoteSync(format!("{} returned {}: {}", operation, status, body)))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn create_table_sql(table_name: &str, columns: &[String]) -> String {
    let columns: Vec<String> = columns
        .iter()
        .map(|name| format!("{} text", quote_ident(name)))
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        quote_ident(table_name),
        columns.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_create_table_sql_declares_text_columns() {
        let sql = create_table_sql("sales", &["id".to_string(), "unit price".to_string()]);
        assert_eq!(
            sql,
            r#"CREATE TABLE IF NOT EXISTS "sales" ("id" text, "unit price" text);"#
        );
    }

    #[test]
    fn test_create_table_sql_escapes_quotes() {
        let sql = create_table_sql("t", &["say \"hi\"".to_string()]);
        assert_eq!(sql, r#"CREATE TABLE IF NOT EXISTS "t" ("say ""hi""" text);"#);
    }

    #[tokio::test]
    async fn test_disabled_sync_is_a_noop() {
        let sync = RemoteSync::new(None);
        assert!(!sync.is_enabled());

        let df = df!["id" => [1i64]].unwrap();
        assert!(sync.ensure_table("t", &column_names(&df)).await.is_ok());
        assert!(sync.insert_rows("t", &to_records(&df).unwrap()).await.is_ok());
        sync.mirror("t", &df, true).await;
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_swallowed() {
        let sync = RemoteSync::new(Some(SupabaseConfig {
            url: "http://127.0.0.1:9".to_string(),
            key: "key".to_string(),
        }));
        let df = df!["id" => [1i64]].unwrap();

        assert!(matches!(
            sync.insert_rows("t", &to_records(&df).unwrap()).await,
            Err(AppError::RemoteSync(_))
        ));
        // Must not panic or propagate.
        sync.mirror("t", &df, true).await;
    }
}
