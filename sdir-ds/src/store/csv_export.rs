//! Public CSV export store
//!
//! For sheets published to the web without an API key. The export returns
//! the whole sheet as CSV; rows are handed to the same column mapper as the
//! values API path.

use super::{http_client, DirectoryStore, RawRows, StoreError, WebAppWriter};
use async_trait::async_trait;
use reqwest::Url;
use sdir_common::config::SheetsSettings;
use sdir_common::NewMemberData;
use tracing::{error, info};

const DOCS_BASE_URL: &str = "https://docs.google.com";

pub struct CsvExportStore {
    http_client: reqwest::Client,
    docs_base_url: String,
    spreadsheet_id: Option<String>,
    sheet_id: Option<String>,
    writer: WebAppWriter,
}

impl CsvExportStore {
    pub fn new(settings: &SheetsSettings) -> Result<Self, StoreError> {
        let http_client = http_client()?;
        Ok(Self {
            writer: WebAppWriter::new(http_client.clone(), settings),
            http_client,
            docs_base_url: DOCS_BASE_URL.to_string(),
            spreadsheet_id: settings.spreadsheet_id.clone(),
            sheet_id: settings.sheet_id.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.docs_base_url = base_url.into();
        self
    }

    fn export_url(&self) -> Result<Url, StoreError> {
        let (spreadsheet_id, sheet_id) = match (self.spreadsheet_id.as_deref(), self.sheet_id.as_deref()) {
            (Some(spreadsheet_id), Some(sheet_id)) => (spreadsheet_id, sheet_id),
            _ => {
                return Err(StoreError::Fetch(
                    "Missing configuration: SDIR_SPREADSHEET_ID and SDIR_SHEET_ID are required \
                     to read the CSV export."
                        .to_string(),
                ))
            }
        };

        let mut url = Url::parse(&self.docs_base_url).map_err(|e| {
            StoreError::Fetch(format!("Invalid export URL {}: {}", self.docs_base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Fetch(format!("Invalid export URL {}", self.docs_base_url)))?
            .pop_if_empty()
            .extend(["spreadsheets", "d", spreadsheet_id, "export"]);
        url.query_pairs_mut()
            .append_pair("format", "csv")
            .append_pair("gid", sheet_id);
        Ok(url)
    }
}

/// Parse CSV text into raw rows; ragged rows are kept as-is
pub fn parse_csv(text: &str) -> Result<RawRows, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| StoreError::Fetch(format!("Failed to parse CSV export: {}", e)))
        })
        .collect()
}

#[async_trait]
impl DirectoryStore for CsvExportStore {
    fn store_id(&self) -> &'static str {
        "sheets-csv"
    }

    async fn list_records(&self) -> Result<RawRows, StoreError> {
        let url = self.export_url()?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Fetch(format!("Failed to fetch data: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_text, "CSV export fetch failed");
            return Err(StoreError::Fetch(format!(
                "Failed to fetch data: {}. Please ensure the sheet is published to the web.",
                status
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Fetch(format!("Failed to read CSV export: {}", e)))?;

        let rows = parse_csv(&text)?;
        info!(rows = rows.len(), "Fetched CSV export");
        Ok(rows)
    }

    async fn append_record(&self, record: &NewMemberData) -> Result<(), StoreError> {
        self.writer.append(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_quoted_and_ragged() {
        let rows = parse_csv("Name,Village,Address\n\"Shah, Priya\",Kalol,\"Surat, Gujarat\"\nAmit,Mansa\n").unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["Shah, Priya", "Kalol", "Surat, Gujarat"]);
        assert_eq!(rows[2], vec!["Amit", "Mansa"]);
    }

    #[test]
    fn test_export_url() {
        let settings = SheetsSettings {
            spreadsheet_id: Some("abc".to_string()),
            sheet_id: Some("17".to_string()),
            ..Default::default()
        };
        let store = CsvExportStore::new(&settings)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");

        assert_eq!(
            store.export_url().unwrap().as_str(),
            "http://127.0.0.1:9/spreadsheets/d/abc/export?format=csv&gid=17"
        );
    }

    #[tokio::test]
    async fn test_missing_ids_is_fetch_error() {
        let store = CsvExportStore::new(&SheetsSettings::default()).unwrap();
        assert!(matches!(store.list_records().await, Err(StoreError::Fetch(_))));
    }
}
