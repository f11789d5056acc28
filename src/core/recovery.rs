use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::client::HistoryBackend;
use crate::core::format::format_score;
use crate::core::history::RowKey;
use crate::core::notice::{Notice, NoticeLevel};

/// Body of `POST /api/history/reconcile/recover`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoverRequest {
    pub download_id: String,
    pub instance: Option<String>,
}

impl RecoverRequest {
    /// Validate a row key before any request is made.
    pub fn from_key(key: &RowKey) -> Result<Self, String> {
        let download_id = key.download_id.trim();
        if download_id.is_empty() {
            return Err("download_id manquant".to_string());
        }
        Ok(Self {
            download_id: download_id.to_string(),
            instance: key.instance.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HashCheck {
    #[serde(rename = "match", default)]
    pub matched: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecoverResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub fallback_used: Option<bool>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub indexer: Option<String>,
    #[serde(default)]
    pub hash_check: Option<HashCheck>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl RecoverResponse {
    /// One-line diagnostics: score, indexer and hash verdict.
    pub fn detail_line(&self) -> String {
        let score = self.score.map(format_score).unwrap_or_else(|| "n/a".to_string());
        let indexer = self
            .indexer
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("n/a");
        let hash = match self.hash_check.as_ref().and_then(|h| h.matched) {
            Some(true) => "ok",
            Some(false) => "KO",
            None => "n/a",
        };
        format!("Score: {score} · Indexer: {indexer} · Hash: {hash}")
    }

    fn failure_reason(&self) -> &str {
        self.reason
            .as_deref()
            .or(self.detail.as_deref())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(if self.status.is_empty() { "erreur inconnue" } else { &self.status })
    }
}

/// Terminal result of one recovery attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryOutcome {
    Recovered(RecoverResponse),
    AlreadyPresent(RecoverResponse),
    Failed(RecoverResponse),
    /// Transport, HTTP or decoding error; the message is shown as-is.
    Error(String),
}

impl RecoveryOutcome {
    pub fn from_result(result: Result<RecoverResponse, String>) -> Self {
        match result {
            Ok(response) => match response.status.as_str() {
                "ok" => Self::Recovered(response),
                "exists" => Self::AlreadyPresent(response),
                _ => Self::Failed(response),
            },
            Err(message) => Self::Error(message),
        }
    }

    pub fn notices(&self) -> Vec<Notice> {
        match self {
            Self::Recovered(response) => {
                let title = if response.fallback_used.unwrap_or(false) {
                    "Torrent récupéré (fallback)"
                } else {
                    "Torrent récupéré"
                };
                vec![
                    Notice::success(title),
                    Notice::info(response.detail_line()),
                ]
            }
            Self::AlreadyPresent(_) => vec![Notice::info("Torrent déjà présent")],
            Self::Failed(response) => vec![
                Notice::error(format!("Récupération impossible: {}", response.failure_reason())),
                Notice::new(NoticeLevel::Error, response.detail_line()),
            ],
            Self::Error(message) => vec![Notice::error(message.clone())],
        }
    }
}

/// Ask the backend to recover one row and classify the answer.
pub async fn run_recovery(
    backend: Arc<dyn HistoryBackend>,
    request: RecoverRequest,
) -> RecoveryOutcome {
    info!(
        "Recovery requested for {} ({})",
        request.download_id,
        request.instance.as_deref().unwrap_or("-")
    );
    let result = backend.recover(&request).await.map_err(|e| e.to_string());
    if let Err(e) = &result {
        warn!("Recovery request failed: {e}");
    }
    RecoveryOutcome::from_result(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: &str) -> RecoverResponse {
        RecoverResponse {
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_download_id_is_rejected_locally() {
        assert_eq!(
            RecoverRequest::from_key(&RowKey::new("  ", Some("radarr"))),
            Err("download_id manquant".to_string())
        );
        let request = RecoverRequest::from_key(&RowKey::new(" ABC ", None)).unwrap();
        assert_eq!(request.download_id, "ABC");
        assert_eq!(request.instance, None);
    }

    #[test]
    fn test_request_sends_instance_as_stored() {
        let request = RecoverRequest::from_key(&RowKey::new("ABC", Some(" sonarr "))).unwrap();
        assert_eq!(request.instance.as_deref(), Some(" sonarr "));
    }

    #[test]
    fn test_request_serializes_null_instance() {
        let request = RecoverRequest {
            download_id: "ABC".into(),
            instance: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"download_id": "ABC", "instance": null})
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(RecoveryOutcome::from_result(Ok(response("ok"))), RecoveryOutcome::Recovered(_)));
        assert!(matches!(
            RecoveryOutcome::from_result(Ok(response("exists"))),
            RecoveryOutcome::AlreadyPresent(_)
        ));
        assert!(matches!(RecoveryOutcome::from_result(Ok(response("error"))), RecoveryOutcome::Failed(_)));
        assert!(matches!(RecoveryOutcome::from_result(Ok(response(""))), RecoveryOutcome::Failed(_)));
        assert!(matches!(
            RecoveryOutcome::from_result(Err("boom".into())),
            RecoveryOutcome::Error(_)
        ));
    }

    #[test]
    fn test_success_mentions_fallback_and_details() {
        let outcome = RecoveryOutcome::Recovered(RecoverResponse {
            status: "ok".into(),
            fallback_used: Some(true),
            score: Some(5.0),
            indexer: Some("Torrent9".into()),
            hash_check: Some(HashCheck { matched: Some(true) }),
            ..Default::default()
        });
        let notices = outcome.notices();
        assert_eq!(notices[0], Notice::success("Torrent récupéré (fallback)"));
        assert_eq!(
            notices[1],
            Notice::info("Score: 5 · Indexer: Torrent9 · Hash: ok")
        );
    }

    #[test]
    fn test_failure_reports_reason_and_details() {
        let outcome = RecoveryOutcome::from_result(
            serde_json::from_value(serde_json::json!({
                "status": "error",
                "reason": "score too low",
                "score": 2,
                "hash_check": {"match": false}
            }))
            .map_err(|e: serde_json::Error| e.to_string()),
        );
        let notices = outcome.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0], Notice::error("Récupération impossible: score too low"));
        assert_eq!(notices[1].level, NoticeLevel::Error);
        assert_eq!(notices[1].message, "Score: 2 · Indexer: n/a · Hash: KO");
    }

    #[test]
    fn test_exists_is_informational() {
        let notices = RecoveryOutcome::AlreadyPresent(response("exists")).notices();
        assert_eq!(notices, vec![Notice::info("Torrent déjà présent")]);
    }

    #[test]
    fn test_transport_error_is_shown_verbatim() {
        let notices = RecoveryOutcome::Error("Aucun record trouvé".into()).notices();
        assert_eq!(notices, vec![Notice::error("Aucun record trouvé")]);
    }
}
