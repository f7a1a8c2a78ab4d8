//! Directory store: the spreadsheet the directory lives in
//!
//! The rest of the service only sees the [`DirectoryStore`] trait: list every
//! raw row, or append one fixed-shape record. Implementations:
//! - [`SheetsStore`]: Sheets values API for reads, Apps Script web app for writes
//! - [`CsvExportStore`]: public CSV export for reads, Apps Script web app for writes
//! - [`MemoryStore`]: in-process rows, for tests and demo mode

use async_trait::async_trait;
use sdir_common::config::{ListSource, SheetsSettings};
use sdir_common::NewMemberData;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

mod csv_export;
mod memory;
mod sheets;
mod web_app;

pub use csv_export::CsvExportStore;
pub use memory::MemoryStore;
pub use sheets::SheetsStore;
pub use web_app::WebAppWriter;

/// Raw spreadsheet rows: header row first, then data rows
pub type RawRows = Vec<Vec<String>>;

const USER_AGENT: &str = concat!("sdir-ds/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Directory store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Record list could not be fetched (unreachable, misconfigured, non-success status)
    #[error("{0}")]
    Fetch(String),

    /// Append was attempted and failed
    #[error("{0}")]
    Append(String),

    /// Append is impossible because no write endpoint is configured
    #[error("{0}")]
    Configuration(String),
}

impl StoreError {
    /// True for errors raised by the append path (including missing write configuration)
    pub fn is_append_failure(&self) -> bool {
        matches!(self, StoreError::Append(_) | StoreError::Configuration(_))
    }
}

/// Remote record source/sink
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Store identifier for logging (e.g. "sheets-api", "memory")
    fn store_id(&self) -> &'static str;

    /// Fetch every row, header row first
    async fn list_records(&self) -> Result<RawRows, StoreError>;

    /// Append one member record
    async fn append_record(&self, record: &NewMemberData) -> Result<(), StoreError>;
}

/// Build the shared HTTP client used by the spreadsheet stores
pub(crate) fn http_client() -> Result<reqwest::Client, StoreError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| StoreError::Configuration(format!("HTTP client setup failed: {}", e)))
}

/// Build the store selected by the resolved settings
pub fn from_settings(settings: &SheetsSettings) -> Result<Arc<dyn DirectoryStore>, StoreError> {
    let store: Arc<dyn DirectoryStore> = match settings.list_source {
        ListSource::Api => Arc::new(SheetsStore::new(settings)?),
        ListSource::Csv => Arc::new(CsvExportStore::new(settings)?),
    };
    tracing::info!(store = store.store_id(), "Directory store configured");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_failure_classification() {
        assert!(StoreError::Append("x".into()).is_append_failure());
        assert!(StoreError::Configuration("x".into()).is_append_failure());
        assert!(!StoreError::Fetch("x".into()).is_append_failure());
    }

    #[test]
    fn test_from_settings_picks_list_source() {
        let mut settings = SheetsSettings::default();
        assert_eq!(from_settings(&settings).unwrap().store_id(), "sheets-api");

        settings.list_source = ListSource::Csv;
        assert_eq!(from_settings(&settings).unwrap().store_id(), "sheets-csv");
    }
}
