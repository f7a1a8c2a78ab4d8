//! Search/filter engine over the canonical member list
//!
//! The engine fetches every row from the directory store once and keeps the
//! mapped records as the canonical list. Each search request gets its own
//! [`SearchView`]: criteria and page are per-client, the list is shared.
//!
//! Load lifecycle: `Idle → Loading → Ready` on first load, `Ready → Loading →
//! Ready` on reload. A failed fetch never leaves the list empty: the built-in
//! sample records are used instead.
//!
//! Overlapping loads are not coalesced. Each one swaps in its own result when
//! it finishes, so the last response to complete wins; the state stays
//! `Loading` until every outstanding load has finished or been dropped.

use crate::pagination::{calculate_pagination, Pagination, PAGE_SIZE};
use crate::store::{DirectoryStore, RawRows};
use chrono::Utc;
use sdir_common::events::{DirectoryEvent, EventBus, RecordSource};
use sdir_common::mapper::rows_to_records;
use sdir_common::MemberRecord;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Sample records shown when the store cannot be reached
pub fn fallback_records() -> Vec<MemberRecord> {
    SAMPLE_MEMBERS
        .iter()
        .map(|&(name, village, address, mobile, email)| {
            MemberRecord::new(name, village, address)
                .with_mobile(mobile)
                .with_email(email)
        })
        .collect()
}

/// The sample records as raw sheet rows, header first (demo mode)
pub fn sample_rows() -> RawRows {
    let header = ["Name", "Village", "Current Address", "Mobile Number", "Email"];
    std::iter::once(header.iter().map(|h| h.to_string()).collect())
        .chain(SAMPLE_MEMBERS.iter().map(|&(name, village, address, mobile, email)| {
            [name, village, address, mobile, email]
                .iter()
                .map(|c| c.to_string())
                .collect()
        }))
        .collect()
}

const SAMPLE_MEMBERS: [(&str, &str, &str, &str, &str); 5] = [
    ("Rajesh Patel", "Gandhinagar", "Ahmedabad, Gujarat", "9876543210", "rajesh@example.com"),
    ("Priya Shah", "Kalol", "Surat, Gujarat", "9876543211", "priya@example.com"),
    ("Amit Desai", "Mansa", "Mumbai, Maharashtra", "9876543212", "amit@example.com"),
    ("Neha Trivedi", "Gandhinagar", "Gandhinagar, Gujarat", "9876543213", "neha@example.com"),
    ("Kiran Mehta", "Dehgam", "Pune, Maharashtra", "9876543214", "kiran@example.com"),
];

/// Engine load state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
}

/// Outcome of one load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub source: RecordSource,
    pub count: usize,
}

/// Engine status for `/api/status`
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub state: LoadState,
    pub record_count: usize,
    pub source: Option<RecordSource>,
    pub stale: bool,
    pub store: &'static str,
}

struct EngineInner {
    state: LoadState,
    records: Arc<Vec<MemberRecord>>,
    source: Option<RecordSource>,
    in_flight: usize,
}

/// One consistent view of the canonical list and where it came from
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Arc<Vec<MemberRecord>>,
    pub source: Option<RecordSource>,
}

/// Holds the canonical list and answers searches against it
pub struct SearchEngine {
    store: Arc<dyn DirectoryStore>,
    event_bus: EventBus,
    // Never held across an await, so `Drop` of a cancelled load can take it
    inner: Mutex<EngineInner>,
    stale: AtomicBool,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn DirectoryStore>, event_bus: EventBus) -> Self {
        Self {
            store,
            event_bus,
            inner: Mutex::new(EngineInner {
                state: LoadState::Idle,
                records: Arc::new(Vec::new()),
                source: None,
                in_flight: 0,
            }),
            stale: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the record list and replace the canonical list
    ///
    /// Never fails: a fetch error installs the fallback sample records.
    /// Dropping the future before it completes leaves the previous list in
    /// place and re-arms a pending stale mark.
    pub async fn load(&self) -> LoadReport {
        let guard = LoadGuard::begin(self);

        let (records, source) = match self.store.list_records().await {
            Ok(rows) => (rows_to_records(&rows), RecordSource::Store),
            Err(e) => {
                warn!(store = self.store.store_id(), error = %e, "Error fetching data, using sample data as fallback");
                (fallback_records(), RecordSource::Fallback)
            }
        };
        let count = records.len();
        guard.complete(records, source);

        info!(count, source = ?source, "Canonical member list loaded");
        self.event_bus.emit_lossy(DirectoryEvent::RecordsReloaded {
            count,
            source,
            timestamp: Utc::now(),
        });

        LoadReport { source, count }
    }

    /// Explicit reload (`Ready → Loading → Ready`)
    pub async fn reload(&self) -> LoadReport {
        debug!("Reload requested");
        self.load().await
    }

    /// Schedule a reload before the next search is answered
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Load if nothing was loaded yet or the list was marked stale
    pub async fn ensure_fresh(&self) -> Option<LoadReport> {
        let never_loaded = {
            let inner = self.lock();
            inner.state == LoadState::Idle && inner.in_flight == 0
        };
        if never_loaded || self.is_stale() {
            Some(self.load().await)
        } else {
            None
        }
    }

    /// Current canonical list together with its source
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.lock();
        Snapshot {
            records: Arc::clone(&inner.records),
            source: inner.source,
        }
    }

    pub fn status(&self) -> EngineStatus {
        let inner = self.lock();
        EngineStatus {
            state: inner.state,
            record_count: inner.records.len(),
            source: inner.source,
            stale: self.is_stale(),
            store: self.store.store_id(),
        }
    }

    /// Freshen the list if needed, then build a view for `criteria` at `page`
    ///
    /// The returned source belongs to the same snapshot as the view's records.
    pub async fn search(&self, criteria: SearchCriteria, page: usize) -> (SearchView, Option<RecordSource>) {
        self.ensure_fresh().await;
        let Snapshot { records, source } = self.snapshot();
        let mut view = SearchView::new(records, criteria);
        // A view with no pages stays on page 1
        let _ = view.go_to(page);
        (view, source)
    }
}

/// In-flight bookkeeping for one `load()`
///
/// Created before the fetch and consumed by `complete`. If the load future is
/// dropped first, `Drop` releases the in-flight slot and restores the stale
/// flag the load had cleared.
struct LoadGuard<'a> {
    engine: &'a SearchEngine,
    was_stale: bool,
    completed: bool,
}

impl<'a> LoadGuard<'a> {
    fn begin(engine: &'a SearchEngine) -> Self {
        let was_stale = engine.stale.swap(false, Ordering::SeqCst);
        let mut inner = engine.lock();
        inner.in_flight += 1;
        inner.state = LoadState::Loading;
        drop(inner);
        Self {
            engine,
            was_stale,
            completed: false,
        }
    }

    fn complete(mut self, records: Vec<MemberRecord>, source: RecordSource) {
        let mut inner = self.engine.lock();
        inner.records = Arc::new(records);
        inner.source = Some(source);
        Self::release(&mut inner);
        self.completed = true;
    }

    fn release(inner: &mut EngineInner) {
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if inner.in_flight == 0 {
            inner.state = if inner.source.is_some() {
                LoadState::Ready
            } else {
                LoadState::Idle
            };
        }
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        warn!("Member list load cancelled before completion");
        Self::release(&mut self.engine.lock());
        if self.was_stale {
            self.engine.mark_stale();
        }
    }
}

/// Mark the engine stale whenever a member is added
///
/// Stops when the bus closes. A lagged receiver may have missed a
/// `MemberAdded`, so lag also marks the engine stale.
pub fn spawn_member_added_listener(engine: Arc<SearchEngine>, event_bus: &EventBus) -> JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(DirectoryEvent::MemberAdded { name, .. }) => {
                    debug!(name = %name, "Member added, directory list marked stale");
                    engine.mark_stale();
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Member-added listener lagged");
                    engine.mark_stale();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Search criteria: case-insensitive substrings, AND-combined
///
/// An empty criterion matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchCriteria {
    pub name: String,
    pub village: String,
    pub address: String,
}

impl SearchCriteria {
    pub fn matches(&self, record: &MemberRecord) -> bool {
        contains_ignore_case(&record.name, &self.name)
            && contains_ignore_case(&record.village, &self.village)
            && contains_ignore_case(&record.current_address, &self.address)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.village.is_empty() && self.address.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Records matching `criteria`, in canonical order
pub fn filter_records<'a>(records: &'a [MemberRecord], criteria: &SearchCriteria) -> Vec<&'a MemberRecord> {
    records.iter().filter(|r| criteria.matches(r)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("No pages to navigate")]
    NoPages,
}

/// Filtered, paginated view over one snapshot of the canonical list
///
/// Derived state (`filtered`, page bounds) is recomputed on every change to
/// the criteria or the records, and the page always stays within
/// `[1, max(total_pages, 1)]`.
#[derive(Debug, Clone)]
pub struct SearchView {
    records: Arc<Vec<MemberRecord>>,
    criteria: SearchCriteria,
    filtered: Vec<usize>,
    page: usize,
}

impl SearchView {
    pub fn new(records: Arc<Vec<MemberRecord>>, criteria: SearchCriteria) -> Self {
        let mut view = Self {
            records,
            criteria,
            filtered: Vec::new(),
            page: 1,
        };
        view.recompute();
        view
    }

    fn recompute(&mut self) {
        self.filtered = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.criteria.matches(r))
            .map(|(i, _)| i)
            .collect();
        self.page = calculate_pagination(self.filtered.len(), self.page).page;
    }

    fn criteria_changed(&mut self) {
        self.page = 1;
        self.recompute();
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    pub fn set_criteria(&mut self, criteria: SearchCriteria) {
        self.criteria = criteria;
        self.criteria_changed();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.criteria.name = name.into();
        self.criteria_changed();
    }

    pub fn set_village(&mut self, village: impl Into<String>) {
        self.criteria.village = village.into();
        self.criteria_changed();
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.criteria.address = address.into();
        self.criteria_changed();
    }

    /// Reset every criterion and return to page 1
    pub fn clear(&mut self) {
        self.criteria.clear();
        self.criteria_changed();
    }

    /// Swap in a new canonical list, keeping the page if it is still valid
    pub fn replace_records(&mut self, records: Arc<Vec<MemberRecord>>) {
        self.records = records;
        self.recompute();
    }

    /// Jump to page `n`, clamped into range
    pub fn go_to(&mut self, n: usize) -> Result<usize, PageError> {
        let total = self.total_pages();
        if total == 0 {
            return Err(PageError::NoPages);
        }
        self.page = n.clamp(1, total);
        Ok(self.page)
    }

    pub fn next(&mut self) {
        if self.page < self.total_pages() {
            self.page += 1;
        }
    }

    pub fn previous(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }

    pub fn pagination(&self) -> Pagination {
        calculate_pagination(self.filtered.len(), self.page)
    }

    /// Records on the current page
    pub fn page_records(&self) -> Vec<&MemberRecord> {
        let p = self.pagination();
        self.filtered[p.offset..p.end]
            .iter()
            .map(|&i| &self.records[i])
            .collect()
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(PAGE_SIZE)
    }

    pub fn current_page(&self) -> usize {
        self.page
    }
}
