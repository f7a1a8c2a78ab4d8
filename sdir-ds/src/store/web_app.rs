//! Append path: Google Apps Script web app
//!
//! The sheet itself is read-only to the API key, so writes go through a
//! deployed Apps Script that accepts `{"action": "addMember", "data": {...}}`
//! and answers `{"status": "success" | "error", "message": ...}`.

use super::StoreError;
use sdir_common::config::SheetsSettings;
use sdir_common::NewMemberData;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

const ADD_MEMBER_ACTION: &str = "addMember";

/// Request body posted to the web app
#[derive(Debug, Serialize)]
struct AppendEnvelope<'a> {
    action: &'static str,
    data: &'a NewMemberData,
}

/// Web app reply
#[derive(Debug, Deserialize)]
struct WebAppReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Writes member records through the Apps Script web app
#[derive(Debug, Clone)]
pub struct WebAppWriter {
    http_client: reqwest::Client,
    web_app_url: Option<String>,
    form_url: Option<String>,
}

impl WebAppWriter {
    pub fn new(http_client: reqwest::Client, settings: &SheetsSettings) -> Self {
        Self {
            http_client,
            web_app_url: settings.web_app_url.clone(),
            form_url: settings.form_url.clone(),
        }
    }

    /// Append one record; exactly one POST per call, never retried
    pub async fn append(&self, record: &NewMemberData) -> Result<(), StoreError> {
        let url = self.web_app_url.as_deref().ok_or_else(|| self.missing_endpoint())?;

        let body = serde_json::to_string(&AppendEnvelope {
            action: ADD_MEMBER_ACTION,
            data: record,
        })
        .map_err(|e| StoreError::Append(format!("Failed to encode member record: {}", e)))?;

        debug!(
            name = %record.name,
            mobile = %record.mobile,
            village = %record.village,
            payload = %body,
            "Sending member record to web app"
        );

        // Apps Script reads the raw body; the envelope is sent as text/plain JSON
        let response = self
            .http_client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Append(format!("Failed to add member: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_text, "Web app rejected member record");
            return Err(StoreError::Append(format!("Failed to add member: {}", status)));
        }

        let reply: WebAppReply = response.json().await.map_err(|e| {
            StoreError::Append(format!("Failed to add member: invalid web app response: {}", e))
        })?;

        if reply.status.as_deref() == Some("error") {
            let message = reply
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Failed to add member".to_string());
            error!(message = %message, "Web app reported an error");
            return Err(StoreError::Append(message));
        }

        info!(name = %record.name, "Member record appended");
        Ok(())
    }

    fn missing_endpoint(&self) -> StoreError {
        if self.form_url.is_some() {
            return StoreError::Configuration(
                "Google Forms submission is not yet implemented. Please configure \
                 SDIR_WEB_APP_URL (or sheets.web_app_url in the config file)."
                    .to_string(),
            );
        }

        StoreError::Configuration(
            "Write permissions not available. To add members:\n\
             1. Deploy a Google Apps Script web app with edit access to the sheet\n\
             2. Set SDIR_WEB_APP_URL (or sheets.web_app_url in the config file) to the web app URL\n\
             3. Restart the directory service"
                .to_string(),
        )
    }
}
