use polars::prelude::DataFrame;
use tracing::{debug, info};
use crate::error::AppError;

/// The dataset being worked on and the remote table it mirrors to.
#[derive(Debug, Clone)]
pub struct CurrentDataset {
    pub frame: DataFrame,
    pub table_name: String,
}

/// Single-slot holder for the live dataset and the last cleaning result.
///
/// Slots are overwritten, never merged. The store itself is not
/// synchronized; `AppState` keeps it behind an async mutex so a clean can
/// snapshot, compute and commit under one lock acquisition.
#[derive(Debug, Default)]
pub struct DatasetStore {
    current: Option<CurrentDataset>,
    last_cleaned: Option<DataFrame>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current(&mut self, frame: DataFrame, table_name: impl Into<String>) {
        let table_name = table_name.into();
        info!(
            "Storing dataset for table '{}' ({} rows x {} columns)",
            table_name,
            frame.height(),
            frame.width()
        );
        self.current = Some(CurrentDataset { frame, table_name });
    }

    pub fn current(&self) -> Option<&CurrentDataset> {
        self.current.as_ref()
    }

    pub fn set_last_cleaned(&mut self, frame: DataFrame) {
        debug!("Storing last cleaned dataset ({} rows)", frame.height());
        self.last_cleaned = Some(frame);
    }

    pub fn last_cleaned(&self) -> Option<&DataFrame> {
        self.last_cleaned.as_ref()
    }

    /// Cheap copy of the current dataset for work done outside the store.
    pub fn snapshot(&self) -> Result<CurrentDataset, AppError> {
        self.current().cloned().ok_or(AppError::NoDatasetLoaded)
    }

    /// Commits a cleaned dataset to both slots, keeping the table name.
    pub fn commit_cleaned(&mut self, cleaned: DataFrame) -> Result<CurrentDataset, AppError> {
        let table_name = self
            .current
            .as_ref()
            .map(|current| current.table_name.clone())
            .ok_or(AppError::NoDatasetLoaded)?;

        self.set_current(cleaned.clone(), table_name.clone());
        self.set_last_cleaned(cleaned.clone());

        Ok(CurrentDataset {
            frame: cleaned,
            table_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cleaner::clean_column;
    use polars::prelude::*;

    fn sample() -> DataFrame {
        df![
            "id" => [1i64, 2],
            "price" => [Some(4.0), None],
        ]
        .unwrap()
    }

    #[test]
    fn test_empty_store() {
        let store = DatasetStore::new();
        assert!(store.current().is_none());
        assert!(store.last_cleaned().is_none());
    }

    #[test]
    fn test_set_current_overwrites() {
        let mut store = DatasetStore::new();
        store.set_current(sample(), "first");
        store.set_current(df!["x" => [1i64]].unwrap(), "second");

        let current = store.current().unwrap();
        assert_eq!(current.table_name, "second");
        assert_eq!(current.frame.width(), 1);
        assert!(store.last_cleaned().is_none());
    }

    #[test]
    fn test_snapshot_requires_dataset() {
        let store = DatasetStore::new();
        assert!(matches!(store.snapshot(), Err(AppError::NoDatasetLoaded)));
    }

    #[test]
    fn test_snapshot_is_independent_of_later_writes() {
        let mut store = DatasetStore::new();
        store.set_current(sample(), "sales");

        let snapshot = store.snapshot().unwrap();
        store.set_current(df!["x" => [1i64]].unwrap(), "other");

        assert_eq!(snapshot.table_name, "sales");
        assert_eq!(snapshot.frame.width(), 2);
    }

    #[test]
    fn test_commit_cleaned_writes_both_slots() {
        let mut store = DatasetStore::new();
        store.set_current(sample(), "sales");

        let cleaned = clean_column(&store.snapshot().unwrap().frame, "price").unwrap();
        let committed = store.commit_cleaned(cleaned).unwrap();

        assert_eq!(committed.table_name, "sales");
        assert_eq!(committed.frame.column("price").unwrap().null_count(), 0);
        assert!(store.current().unwrap().frame.equals(&committed.frame));
        assert!(store.last_cleaned().unwrap().equals(&committed.frame));
    }

    #[test]
    fn test_commit_cleaned_without_dataset() {
        let mut store = DatasetStore::new();
        assert!(matches!(
            store.commit_cleaned(sample()),
            Err(AppError::NoDatasetLoaded)
        ));
        assert!(store.last_cleaned().is_none());
    }
}
