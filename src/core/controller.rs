//! State of the history reconciliation view.
//!
//! `ReconcileView` holds the row cache, filters, counters and per-row
//! confirmation state. It never performs I/O: operations return [`Effect`]s
//! that the application runs and feeds back through the `apply_*` /
//! `finish_*` methods.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::affordance::RowAction;
use crate::core::client::HistoryBackend;
use crate::core::confirm::{ButtonView, ConfirmGate, ConfirmToken, GateAction, RECOVER_LABELS};
use crate::core::history::{
    sort_rows, FilterOptions, GrabHistoryRow, HistoryFilters, HistoryQuery, HistorySummary, RowKey,
    SortKey,
};
use crate::core::notice::Notice;
use crate::core::recovery::{RecoverRequest, RecoveryOutcome};

/// Work requested by the view.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch the list with these parameters.
    Load(HistoryQuery),
    /// Call the recovery endpoint for this row.
    Recover { key: RowKey, request: RecoverRequest },
    /// Call [`ReconcileView::confirm_expired`] after the confirmation window.
    ArmTimer { key: RowKey, token: ConfirmToken },
    Notify(Notice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Instance(Option<String>),
    Tracker(Option<String>),
    Source(Option<String>),
    DownloadId(String),
    Sort(SortKey),
}

#[derive(Debug, Default)]
pub struct ReconcileView {
    rows: Vec<GrabHistoryRow>,
    filters: HistoryFilters,
    sort: SortKey,
    summary: HistorySummary,
    options: FilterOptions,
    gate: ConfirmGate<RowKey>,
    detail: Option<RowKey>,
    /// Loads issued and not yet answered.
    pending_loads: usize,
}

impl ReconcileView {
    /// New view plus its initial load.
    pub fn create() -> (Self, Effect) {
        let view = Self {
            pending_loads: 1,
            ..Default::default()
        };
        let load = view.reload();
        (view, load)
    }

    pub fn query(&self) -> HistoryQuery {
        HistoryQuery {
            filters: self.filters.clone(),
            sort: self.sort,
        }
    }

    pub fn reload(&self) -> Effect {
        Effect::Load(self.query())
    }

    pub fn begin_load(&mut self) -> Effect {
        self.pending_loads += 1;
        self.reload()
    }

    /// Any filter or sort change refetches the whole list.
    pub fn on_filter_change(&mut self, change: FilterChange) -> Effect {
        match change {
            FilterChange::Instance(v) => self.filters.instance = normalize(v),
            FilterChange::Tracker(v) => self.filters.tracker = normalize(v),
            FilterChange::Source(v) => self.filters.source = normalize(v),
            FilterChange::DownloadId(v) => self.filters.download_id = v,
            FilterChange::Sort(sort) => self.sort = sort,
        }
        self.begin_load()
    }

    /// Install a load result. On success the cache is replaced wholesale; on
    /// failure only the counters are reset and the previous rows stay.
    pub fn apply_loaded(&mut self, result: Result<Vec<GrabHistoryRow>, String>) {
        self.pending_loads = self.pending_loads.saturating_sub(1);
        match result {
            Ok(mut rows) => {
                sort_rows(&mut rows, self.sort);
                self.summary = HistorySummary::from_rows(&rows);
                let added = self.options.observe(&rows);
                debug!("Loaded {} history rows ({added} new filter values)", rows.len());
                self.rows = rows;
                self.gate.clear_pending();
                if let Some(key) = &self.detail {
                    if !self.rows.iter().any(|r| &r.key() == key) {
                        self.detail = None;
                    }
                }
            }
            Err(e) => {
                warn!("History reconcile load failed: {e}");
                self.summary = HistorySummary::default();
            }
        }
    }

    // ── Recovery ──

    /// A click on a row's recover button.
    pub fn activate_recover(&mut self, key: RowKey) -> Vec<Effect> {
        match self.gate.activate(&key) {
            GateAction::Arm(token) => vec![Effect::ArmTimer { key, token }],
            GateAction::Execute => match RecoverRequest::from_key(&key) {
                Ok(request) => vec![Effect::Recover { key, request }],
                Err(message) => {
                    self.gate.finish(&key);
                    vec![Effect::Notify(Notice::warning(message))]
                }
            },
            GateAction::Ignored => Vec::new(),
        }
    }

    pub fn confirm_expired(&mut self, key: &RowKey, token: ConfirmToken) {
        if self.gate.expire(key, token) {
            debug!("Confirmation expired for {key}");
        }
    }

    /// Close a recovery attempt: back to idle, notify, and reload once.
    pub fn finish_recovery(&mut self, key: &RowKey, outcome: RecoveryOutcome) -> Vec<Effect> {
        self.gate.finish(key);
        info!("Recovery for {key} finished: {}", outcome_name(&outcome));
        let mut effects: Vec<Effect> = outcome.notices().into_iter().map(Effect::Notify).collect();
        effects.push(self.begin_load());
        effects
    }

    pub fn button_view(&self, key: &RowKey) -> ButtonView {
        ButtonView::for_state(self.gate.state(key), RECOVER_LABELS)
    }

    // ── Detail ──

    /// Open the detail modal if the key is in the current cache.
    pub fn open_detail(&mut self, key: RowKey) -> bool {
        let found = self.rows.iter().any(|r| r.key() == key);
        if found {
            self.detail = Some(key);
        }
        found
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn detail_row(&self) -> Option<&GrabHistoryRow> {
        let key = self.detail.as_ref()?;
        self.rows.iter().find(|r| &r.key() == key)
    }

    /// Drop all state; pending timers become stale.
    pub fn dispose(&mut self) {
        let in_flight = self.gate.executing_count();
        if in_flight > 0 {
            debug!("Disposing view with {in_flight} recoveries in flight");
        }
        self.rows.clear();
        self.summary = HistorySummary::default();
        self.gate.clear();
        self.detail = None;
        self.pending_loads = 0;
    }

    // ── Accessors ──

    pub fn rows(&self) -> &[GrabHistoryRow] {
        &self.rows
    }

    pub fn row_actions(&self) -> impl Iterator<Item = (&GrabHistoryRow, RowAction)> {
        self.rows.iter().map(|r| (r, RowAction::resolve(r)))
    }

    pub fn summary(&self) -> &HistorySummary {
        &self.summary
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn filters(&self) -> &HistoryFilters {
        &self.filters
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn is_loading(&self) -> bool {
        self.pending_loads > 0
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn outcome_name(outcome: &RecoveryOutcome) -> &'static str {
    match outcome {
        RecoveryOutcome::Recovered(_) => "recovered",
        RecoveryOutcome::AlreadyPresent(_) => "exists",
        RecoveryOutcome::Failed(_) => "failed",
        RecoveryOutcome::Error(_) => "error",
    }
}

/// Fetch the list for a query, flattening errors to display text.
pub async fn load_history(
    backend: Arc<dyn HistoryBackend>,
    query: HistoryQuery,
) -> Result<Vec<GrabHistoryRow>, String> {
    backend.fetch_history(&query).await.map_err(|e| e.to_string())
}
