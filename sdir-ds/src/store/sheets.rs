//! Google Sheets API v4 store
//!
//! Reads resolve the sheet title from its numeric sheet ID via the spreadsheet
//! metadata, then fetch columns A:Z of that sheet. Writes go to the Apps
//! Script web app.

use super::{http_client, DirectoryStore, RawRows, StoreError, WebAppWriter};
use async_trait::async_trait;
use reqwest::Url;
use sdir_common::config::SheetsSettings;
use sdir_common::NewMemberData;
use serde::Deserialize;
use tracing::{debug, error, info};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";
const RANGE_COLUMNS: &str = "A:Z";

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<RawRows>,
}

/// Credentials needed for a read, all present
struct ReadTarget<'a> {
    api_key: &'a str,
    spreadsheet_id: &'a str,
    sheet_id: &'a str,
}

/// Sheets values API store
pub struct SheetsStore {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    spreadsheet_id: Option<String>,
    sheet_id: Option<String>,
    writer: WebAppWriter,
}

impl SheetsStore {
    pub fn new(settings: &SheetsSettings) -> Result<Self, StoreError> {
        let http_client = http_client()?;
        Ok(Self {
            writer: WebAppWriter::new(http_client.clone(), settings),
            http_client,
            base_url: SHEETS_BASE_URL.to_string(),
            api_key: settings.api_key.clone(),
            spreadsheet_id: settings.spreadsheet_id.clone(),
            sheet_id: settings.sheet_id.clone(),
        })
    }

    /// Point the store at a different API root (e.g. a local test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn read_target(&self) -> Result<ReadTarget<'_>, StoreError> {
        match (
            self.api_key.as_deref(),
            self.spreadsheet_id.as_deref(),
            self.sheet_id.as_deref(),
        ) {
            (Some(api_key), Some(spreadsheet_id), Some(sheet_id)) => Ok(ReadTarget {
                api_key,
                spreadsheet_id,
                sheet_id,
            }),
            _ => Err(StoreError::Fetch(
                "Missing configuration: SDIR_SHEETS_API_KEY, SDIR_SPREADSHEET_ID and \
                 SDIR_SHEET_ID are all required to read the directory."
                    .to_string(),
            )),
        }
    }

    fn url(&self, segments: &[&str], api_key: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StoreError::Fetch(format!("Invalid Sheets API URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Fetch(format!("Invalid Sheets API URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    async fn sheet_title(&self, target: &ReadTarget<'_>) -> Result<String, StoreError> {
        let url = self.url(&["spreadsheets", target.spreadsheet_id], target.api_key)?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Fetch(format!("Failed to fetch sheet metadata: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_text, "Metadata fetch failed");
            return Err(StoreError::Fetch(format!(
                "Failed to fetch sheet metadata: {}. The sheet may not be publicly accessible.",
                status
            )));
        }

        let metadata: SpreadsheetMetadata = response
            .json()
            .await
            .map_err(|e| StoreError::Fetch(format!("Failed to parse sheet metadata: {}", e)))?;

        let wanted: Option<i64> = target.sheet_id.trim().parse().ok();
        metadata
            .sheets
            .into_iter()
            .find(|sheet| Some(sheet.properties.sheet_id) == wanted)
            .map(|sheet| sheet.properties.title)
            .ok_or_else(|| StoreError::Fetch(format!("Sheet with ID {} not found", target.sheet_id)))
    }
}

#[async_trait]
impl DirectoryStore for SheetsStore {
    fn store_id(&self) -> &'static str {
        "sheets-api"
    }

    async fn list_records(&self) -> Result<RawRows, StoreError> {
        let target = self.read_target()?;
        let title = self.sheet_title(&target).await?;

        let range = format!("{}!{}", title, RANGE_COLUMNS);
        debug!(range = %range, "Fetching sheet values");

        let url = self.url(
            &["spreadsheets", target.spreadsheet_id, "values", &range],
            target.api_key,
        )?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Fetch(format!("Failed to fetch data: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_text, "Data fetch failed");
            return Err(StoreError::Fetch(format!(
                "Failed to fetch data: {}. Please ensure the sheet is shared publicly.",
                status
            )));
        }

        let values: ValueRange = response
            .json()
            .await
            .map_err(|e| StoreError::Fetch(format!("Failed to parse sheet values: {}", e)))?;

        let rows = values.values.unwrap_or_default();
        info!(sheet = %title, rows = rows.len(), "Fetched sheet values");
        Ok(rows)
    }

    async fn append_record(&self, record: &NewMemberData) -> Result<(), StoreError> {
        self.writer.append(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(api_key: Option<&str>) -> SheetsStore {
        let settings = SheetsSettings {
            api_key: api_key.map(str::to_string),
            spreadsheet_id: Some("sheet 1/abc".to_string()),
            sheet_id: Some("0".to_string()),
            ..Default::default()
        };
        SheetsStore::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_missing_credentials_is_fetch_error() {
        let err = store(None).list_records().await.unwrap_err();
        assert!(matches!(err, StoreError::Fetch(ref m) if m.starts_with("Missing configuration")));
    }

    #[test]
    fn test_url_encodes_each_segment() {
        let store = store(Some("k")).with_base_url("http://127.0.0.1:9/v4/");
        let url = store
            .url(&["spreadsheets", "sheet 1/abc", "values", "Members List!A:Z"], "k")
            .unwrap();

        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9/v4/spreadsheets/sheet%201%2Fabc/values/Members%20List!A:Z?key=k"
        );
    }
}
