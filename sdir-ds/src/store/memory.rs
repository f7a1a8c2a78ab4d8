//! In-process store for tests and demo mode

use super::{DirectoryStore, RawRows, StoreError};
use async_trait::async_trait;
use sdir_common::mapper::ColumnMap;
use sdir_common::NewMemberData;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Rows held in memory
///
/// Appended records are recorded verbatim and also written back as a row, so
/// a later `list_records` sees them under the sheet's own header layout.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<RawRows>,
    appended: Mutex<Vec<NewMemberData>>,
    list_failure: Mutex<Option<StoreError>>,
    append_failure: Mutex<Option<StoreError>>,
    list_calls: AtomicUsize,
    append_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(rows: RawRows) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    /// Make every subsequent `list_records` fail with `error` (`None` clears it)
    pub async fn set_list_failure(&self, error: Option<StoreError>) {
        *self.list_failure.lock().await = error;
    }

    /// Make every subsequent `append_record` fail with `error` (`None` clears it)
    pub async fn set_append_failure(&self, error: Option<StoreError>) {
        *self.append_failure.lock().await = error;
    }

    /// Records accepted so far
    pub async fn appended(&self) -> Vec<NewMemberData> {
        self.appended.lock().await.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Append attempts, including failed ones
    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    fn row_for(headers: &[String], record: &NewMemberData) -> Vec<String> {
        let columns = ColumnMap::from_headers(headers);
        let mut row = vec![String::new(); columns.headers().len()];
        let cells = [
            (columns.name, &record.name),
            (columns.village, &record.village),
            (columns.address, &record.current_address),
            (columns.mobile, &record.mobile),
        ];
        for (index, value) in cells {
            if let Some(cell) = index.and_then(|i| row.get_mut(i)) {
                if cell.is_empty() {
                    *cell = value.clone();
                }
            }
        }
        row
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    fn store_id(&self) -> &'static str {
        "memory"
    }

    async fn list_records(&self) -> Result<RawRows, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.list_failure.lock().await.clone() {
            return Err(error);
        }
        Ok(self.rows.lock().await.clone())
    }

    async fn append_record(&self, record: &NewMemberData) -> Result<(), StoreError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.append_failure.lock().await.clone() {
            return Err(error);
        }

        let mut rows = self.rows.lock().await;
        if let Some(headers) = rows.first().cloned() {
            rows.push(Self::row_for(&headers, record));
        }
        self.appended.lock().await.push(record.clone());
        Ok(())
    }
}
