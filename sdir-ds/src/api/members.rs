//! Member search and submission endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use sdir_common::events::RecordSource;
use sdir_common::validation::validate_path;
use sdir_common::{FieldPath, MemberForm, MemberRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::SearchCriteria;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{page_links, PageLink, PAGE_SIZE};
use crate::AppState;

/// Query parameters for member search
#[derive(Debug, Deserialize)]
pub struct MembersQuery {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub village: String,
    #[serde(default)]
    pub address: String,

    /// Page number (1-indexed), parsed by [`MembersQuery::page_number`]
    #[serde(default)]
    pub page: Option<String>,
}

impl MembersQuery {
    /// Requested page; absent or blank means 1, zero and negatives clamp to 1
    pub fn page_number(&self) -> ApiResult<usize> {
        let raw = match self.page.as_deref().map(str::trim) {
            None | Some("") => return Ok(1),
            Some(raw) => raw,
        };
        let page: i64 = raw
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("page must be a whole number, got '{}'", raw)))?;
        Ok(usize::try_from(page.max(1)).unwrap_or(usize::MAX))
    }
}

/// One page of search results
#[derive(Debug, Serialize)]
pub struct MembersResponse {
    pub total_results: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /// 1-based position of the first record shown (0 when empty)
    pub first_record: usize,
    pub last_record: usize,
    pub page_links: Vec<PageLink>,
    pub records: Vec<MemberRecord>,
    pub source: Option<RecordSource>,
}

/// GET /api/members?name=&village=&address=&page=
///
/// Case-insensitive substring search, AND-combined; out-of-range pages are clamped.
pub async fn search_members(
    State(state): State<AppState>,
    Query(query): Query<MembersQuery>,
) -> ApiResult<Json<MembersResponse>> {
    let page = query.page_number()?;
    let criteria = SearchCriteria {
        name: query.name,
        village: query.village,
        address: query.address,
    };
    let (view, source) = state.engine.search(criteria, page).await;
    let pagination = view.pagination();

    debug!(
        filtered = view.filtered_count(),
        page = pagination.page,
        "Member search"
    );

    let first_record = if pagination.end > pagination.offset {
        pagination.offset + 1
    } else {
        0
    };

    Ok(Json(MembersResponse {
        total_results: view.filtered_count(),
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        first_record,
        last_record: pagination.end,
        page_links: page_links(pagination.page, pagination.total_pages),
        records: view.page_records().into_iter().cloned().collect(),
        source,
    }))
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// POST /api/members
///
/// 201 on success; 422 with per-field messages when the form is invalid;
/// 502/503 when the append fails or no write endpoint is configured.
pub async fn submit_member(
    State(state): State<AppState>,
    Json(form): Json<MemberForm>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    state
        .pipeline
        .submit_form(form)
        .await
        .map_err(|(err, _form)| ApiError::from(err))?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            status: "success",
            message: "Member added successfully!",
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub field: String,
    pub error: Option<String>,
}

/// POST /api/members/validate
///
/// Validate a single field value, e.g. `{"field": "member3.age", "value": "40"}`.
pub async fn validate_member_field(
    Json(request): Json<ValidateRequest>,
) -> ApiResult<Json<ValidateResponse>> {
    let path: FieldPath = request.field.parse()?;
    Ok(Json(ValidateResponse {
        field: path.to_string(),
        error: validate_path(&path, &request.value),
    }))
}
