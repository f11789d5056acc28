use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::core::format;

/// Rows requested per load; the server applies dedup before the limit.
pub const HISTORY_LIMIT: usize = 200;

/// Ingestion channels the server reports in `source`.
pub const SOURCE_OPTIONS: &[&str] = &["webhook", "history_sync", "history_manual"];

// ── Rows ──

/// One reconciled grab as returned by `/api/history/reconcile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrabHistoryRow {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub download_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub instance: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub indexer: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub source_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub source_last_seen: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub info_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub grabbed_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub torrent_file: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub in_webhook: Option<bool>,
}

/// Correlation key for row actions. `download_id` alone is not unique
/// across instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub download_id: String,
    pub instance: Option<String>,
}

impl RowKey {
    pub fn new(download_id: impl Into<String>, instance: Option<&str>) -> Self {
        Self {
            download_id: download_id.into(),
            instance: instance
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(instance) => write!(f, "{}@{}", self.download_id, instance),
            None => f.write_str(&self.download_id),
        }
    }
}

impl GrabHistoryRow {
    pub fn key(&self) -> RowKey {
        RowKey::new(
            self.download_id.clone().unwrap_or_default(),
            self.instance.as_deref(),
        )
    }

    /// Title shown in the table, falling back to the download id.
    pub fn display_title(&self) -> &str {
        non_empty(&self.source_title)
            .or(non_empty(&self.download_id))
            .unwrap_or("(sans titre)")
    }

    pub fn torrent_file(&self) -> Option<&str> {
        non_empty(&self.torrent_file)
    }

    pub fn has_torrent(&self) -> bool {
        self.torrent_file().is_some()
    }

    pub fn grabbed_at(&self) -> Option<DateTime<Utc>> {
        self.grabbed_at.as_deref().and_then(parse_timestamp)
    }

    /// Grab time in epoch milliseconds; unknown dates sort as epoch 0.
    pub fn grabbed_at_millis(&self) -> i64 {
        self.grabbed_at().map(|dt| dt.timestamp_millis()).unwrap_or(0)
    }

    pub fn is_webhook(&self) -> bool {
        self.source.as_deref() == Some("webhook")
    }
}

/// Trimmed, non-empty view of an optional string field.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a server timestamp. Naive values are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ── Filters & sort ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    DateDesc,
    DateAsc,
    Instance,
    Tracker,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            Self::DateDesc => "Plus récents",
            Self::DateAsc => "Plus anciens",
            Self::Instance => "Instance",
            Self::Tracker => "Tracker",
        }
    }

    pub const ALL: &[SortKey] = &[Self::DateDesc, Self::DateAsc, Self::Instance, Self::Tracker];
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sort rows in place. The sort is stable so equal keys keep server order.
pub fn sort_rows(rows: &mut [GrabHistoryRow], key: SortKey) {
    match key {
        SortKey::DateDesc => rows.sort_by(|a, b| b.grabbed_at_millis().cmp(&a.grabbed_at_millis())),
        SortKey::DateAsc => rows.sort_by(|a, b| a.grabbed_at_millis().cmp(&b.grabbed_at_millis())),
        SortKey::Instance => rows.sort_by(|a, b| compare_text(&a.instance, &b.instance)),
        SortKey::Tracker => rows.sort_by(|a, b| compare_text(&a.indexer, &b.indexer)),
    }
}

fn compare_text(a: &Option<String>, b: &Option<String>) -> Ordering {
    let a = a.as_deref().unwrap_or("").to_lowercase();
    let b = b.as_deref().unwrap_or("").to_lowercase();
    a.cmp(&b)
}

/// Server-side filters. Empty values are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilters {
    pub instance: Option<String>,
    pub tracker: Option<String>,
    pub source: Option<String>,
    pub download_id: String,
}

/// A fully resolved load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub filters: HistoryFilters,
    pub sort: SortKey,
}

impl HistoryQuery {
    /// Query parameters in wire order: fixed `limit`/`dedup`, then each
    /// non-empty filter.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", HISTORY_LIMIT.to_string()),
            ("dedup", "true".to_string()),
        ];
        let f = &self.filters;
        let optional = [
            ("instance", f.instance.as_deref()),
            ("tracker", f.tracker.as_deref()),
            ("source", f.source.as_deref()),
            ("download_id", Some(f.download_id.as_str())),
        ];
        for (name, value) in optional {
            if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((name, value.to_string()));
            }
        }
        pairs
    }

    pub fn query_string(&self) -> String {
        self.query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(&v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

// ── Summary ──

/// Counters shown above the table, derived from the fetched rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySummary {
    pub total: usize,
    pub webhook: usize,
    pub missing: usize,
    pub last_grab: Option<DateTime<Utc>>,
}

impl HistorySummary {
    pub fn from_rows(rows: &[GrabHistoryRow]) -> Self {
        Self {
            total: rows.len(),
            webhook: rows.iter().filter(|r| r.is_webhook()).count(),
            missing: rows.iter().filter(|r| !r.has_torrent()).count(),
            last_grab: rows.iter().filter_map(GrabHistoryRow::grabbed_at).max(),
        }
    }

    pub fn last_grab_label(&self) -> String {
        self.last_grab.map(format::format_local).unwrap_or_default()
    }
}

/// Dropdown inventory for the instance and tracker filters. Values are only
/// ever appended, so the lists reflect everything seen this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub instances: Vec<String>,
    pub trackers: Vec<String>,
}

impl FilterOptions {
    /// Record newly observed values and return how many were added.
    pub fn observe(&mut self, rows: &[GrabHistoryRow]) -> usize {
        let mut added = 0;
        for row in rows {
            if let Some(instance) = non_empty(&row.instance) {
                added += push_unique(&mut self.instances, instance);
            }
            if let Some(tracker) = non_empty(&row.indexer) {
                added += push_unique(&mut self.trackers, tracker);
            }
        }
        added
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) -> usize {
    if list.iter().any(|v| v == value) {
        0
    } else {
        list.push(value.to_string());
        1
    }
}

// ── Lenient field decoding ──

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_size<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(serde_json::Value::Number(n)) => n.as_i64().map(|n| n != 0),
        _ => None,
    })
}

/// Accept a bare array or the common `{ "items": [...] }` style envelopes.
pub fn decode_rows(value: serde_json::Value) -> Result<Vec<GrabHistoryRow>, String> {
    let list = match value {
        serde_json::Value::Array(list) => serde_json::Value::Array(list),
        serde_json::Value::Object(mut map) => ["items", "records", "data", "results"]
            .iter()
            .find_map(|k| map.remove(*k).filter(|v| v.is_array()))
            .ok_or_else(|| "response has no row list".to_string())?,
        _ => return Err("unexpected response shape".to_string()),
    };
    serde_json::from_value(list).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(download_id: &str, instance: &str, grabbed_at: Option<&str>) -> GrabHistoryRow {
        GrabHistoryRow {
            download_id: Some(download_id.to_string()),
            instance: Some(instance.to_string()),
            grabbed_at: grabbed_at.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_counters() {
        let rows = vec![
            GrabHistoryRow {
                source: Some("webhook".into()),
                torrent_file: Some("a.torrent".into()),
                grabbed_at: Some("2024-01-01T08:00:00Z".into()),
                ..Default::default()
            },
            GrabHistoryRow {
                source: Some("webhook".into()),
                torrent_file: Some("b.torrent".into()),
                grabbed_at: Some("2024-01-05T10:00:00Z".into()),
                ..Default::default()
            },
            GrabHistoryRow {
                source: Some("history_sync".into()),
                grabbed_at: Some("2024-01-03T10:00:00Z".into()),
                ..Default::default()
            },
            GrabHistoryRow {
                source: Some("history_sync".into()),
                torrent_file: Some(String::new()),
                ..Default::default()
            },
            GrabHistoryRow {
                source: None,
                grabbed_at: Some("not a date".into()),
                ..Default::default()
            },
        ];

        let summary = HistorySummary::from_rows(&rows);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.webhook, 2);
        assert_eq!(summary.missing, 3);

        let expected = parse_timestamp("2024-01-05T10:00:00Z").unwrap();
        assert_eq!(summary.last_grab, Some(expected));
        assert_eq!(summary.last_grab_label(), format::format_local(expected));
    }

    #[test]
    fn test_empty_summary_has_blank_label() {
        let summary = HistorySummary::from_rows(&[]);
        assert_eq!(summary, HistorySummary::default());
        assert_eq!(summary.last_grab_label(), "");
    }

    #[test]
    fn test_missing_dates_sort_as_oldest() {
        let mut rows = vec![
            row("a", "radarr", Some("2024-01-02T00:00:00Z")),
            row("b", "radarr", None),
            row("c", "radarr", Some("2024-01-03 12:00:00")),
            row("d", "radarr", Some("garbage")),
        ];

        sort_rows(&mut rows, SortKey::DateAsc);
        let ids: Vec<_> = rows.iter().map(|r| r.download_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);

        sort_rows(&mut rows, SortKey::DateDesc);
        let ids: Vec<_> = rows.iter().map(|r| r.download_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_sort_by_instance_ignores_case() {
        let mut rows = vec![
            row("1", "sonarr", None),
            row("2", "Radarr", None),
            row("3", "radarr-4k", None),
        ];
        sort_rows(&mut rows, SortKey::Instance);
        let instances: Vec<_> = rows.iter().map(|r| r.instance.clone().unwrap()).collect();
        assert_eq!(instances, vec!["Radarr", "radarr-4k", "sonarr"]);
    }

    #[test]
    fn test_query_pairs_skip_empty_filters() {
        let query = HistoryQuery {
            filters: HistoryFilters {
                instance: Some("Radarr 4K".into()),
                tracker: Some("  ".into()),
                source: None,
                download_id: " ABC ".into(),
            },
            sort: SortKey::Tracker,
        };
        assert_eq!(
            query.query_pairs(),
            vec![
                ("limit", "200".to_string()),
                ("dedup", "true".to_string()),
                ("instance", "Radarr 4K".to_string()),
                ("download_id", "ABC".to_string()),
            ]
        );
        assert_eq!(
            query.query_string(),
            "limit=200&dedup=true&instance=Radarr%204K&download_id=ABC"
        );
    }

    #[test]
    fn test_filter_options_grow_additively() {
        let mut options = FilterOptions::default();
        let rows = vec![row("1", "radarr", None), row("2", "radarr", None)];

        assert_eq!(options.observe(&rows), 1);
        assert_eq!(options.instances, vec!["radarr"]);

        assert_eq!(options.observe(&rows), 0);
        assert_eq!(options.instances, vec!["radarr"]);

        assert_eq!(options.observe(&[row("3", "sonarr", None)]), 1);
        assert_eq!(options.observe(&[]), 0);
        assert_eq!(options.instances, vec!["radarr", "sonarr"]);
    }

    #[test]
    fn test_decode_lenient_fields() {
        let rows = decode_rows(json!({
            "items": [{
                "id": 7,
                "download_id": "ABCDEF",
                "instance": "radarr",
                "size": "1048576",
                "in_webhook": 1,
                "torrent_file": null
            }]
        }))
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].size, Some(1_048_576));
        assert_eq!(rows[0].in_webhook, Some(true));
        assert!(!rows[0].has_torrent());
        assert_eq!(rows[0].key(), RowKey::new("ABCDEF", Some("radarr")));
    }

    #[test]
    fn test_decode_rejects_non_list() {
        assert!(decode_rows(json!({"status": "error"})).is_err());
        assert!(decode_rows(json!("nope")).is_err());
    }

    #[test]
    fn test_row_key_drops_blank_instance() {
        assert_eq!(RowKey::new("x", Some("  ")), RowKey::new("x", None));
        assert_eq!(RowKey::new("x", Some("sonarr")).to_string(), "x@sonarr");
    }

    #[test]
    fn test_row_key_keeps_instance_verbatim() {
        let key = RowKey::new("x", Some(" radarr 4k "));
        assert_eq!(key.instance.as_deref(), Some(" radarr 4k "));
    }
}
