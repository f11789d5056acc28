use crate::core::history::{non_empty, GrabHistoryRow, RowKey};

/// Indexers recovery is known not to work for (matched case-insensitively
/// as substrings).
pub const BLOCKED_INDEXERS: &[&str] = &["yggapi"];

/// The single action a history row offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    /// A local torrent exists; the row only offers its download.
    Download { file: String },
    /// No torrent, and the indexer cannot be recovered from.
    Absent,
    /// No torrent; recovery can be attempted.
    Recover(RowKey),
}

impl RowAction {
    /// Resolve from `torrent_file` and `indexer`, first match wins.
    pub fn resolve(row: &GrabHistoryRow) -> Self {
        if let Some(file) = row.torrent_file() {
            return Self::Download {
                file: file.to_string(),
            };
        }
        if is_blocked_indexer(non_empty(&row.indexer)) {
            return Self::Absent;
        }
        Self::Recover(row.key())
    }
}

pub fn is_blocked_indexer(indexer: Option<&str>) -> bool {
    let Some(indexer) = indexer else {
        return false;
    };
    let indexer = indexer.to_lowercase();
    BLOCKED_INDEXERS.iter().any(|blocked| indexer.contains(blocked))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(torrent_file: Option<&str>, indexer: Option<&str>) -> GrabHistoryRow {
        GrabHistoryRow {
            download_id: Some("HASH1".to_string()),
            instance: Some("sonarr".to_string()),
            torrent_file: torrent_file.map(str::to_string),
            indexer: indexer.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_torrent_file_wins_over_blocked_indexer() {
        let row = make_row(Some("show.torrent"), Some("YggAPI"));
        assert_eq!(
            RowAction::resolve(&row),
            RowAction::Download {
                file: "show.torrent".to_string()
            }
        );
    }

    #[test]
    fn test_blocked_indexer_is_absent() {
        for indexer in ["yggapi", "YGGAPI (Prowlarr)", "my-YggApi-mirror"] {
            let row = make_row(None, Some(indexer));
            assert_eq!(RowAction::resolve(&row), RowAction::Absent, "{indexer}");
        }
    }

    #[test]
    fn test_recover_otherwise() {
        let expected = RowAction::Recover(RowKey::new("HASH1", Some("sonarr")));
        assert_eq!(RowAction::resolve(&make_row(None, Some("ygg"))), expected);
        assert_eq!(RowAction::resolve(&make_row(None, None)), expected);
        assert_eq!(RowAction::resolve(&make_row(Some("  "), Some("Torrent9"))), expected);
    }

    #[test]
    fn test_resolution_ignores_other_fields() {
        let mut row = make_row(None, Some("Torrent9"));
        let before = RowAction::resolve(&row);
        row.source = Some("webhook".to_string());
        row.grabbed_at = Some("2024-01-01T00:00:00Z".to_string());
        row.status = Some("missing".to_string());
        assert_eq!(RowAction::resolve(&row), before);
    }
}
