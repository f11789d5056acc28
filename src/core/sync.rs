use serde::Deserialize;

use crate::core::notice::Notice;

/// Answer of `POST /api/history/reconcile/sync`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub inserted: Option<i64>,
    #[serde(default)]
    pub ingested: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Notifications for a finished sync; `Err` carries a transport error.
pub fn sync_notices(result: &Result<SyncResponse, String>) -> Vec<Notice> {
    let response = match result {
        Ok(response) => response,
        Err(e) => return vec![Notice::error(format!("Synchronisation échouée: {e}"))],
    };
    let reason = response
        .reason
        .as_deref()
        .or(response.detail.as_deref())
        .unwrap_or("");

    match response.status.as_str() {
        "ok" | "success" => {
            let mut message = "Synchronisation terminée".to_string();
            if let (Some(inserted), Some(ingested)) = (response.inserted, response.ingested) {
                message.push_str(&format!(" ({inserted} ajoutés, {ingested} ingérés)"));
            } else if let Some(inserted) = response.inserted {
                message.push_str(&format!(" ({inserted} ajoutés)"));
            }
            vec![Notice::success(message)]
        }
        "skipped" => vec![Notice::info(format!("Synchronisation ignorée: {reason}"))],
        other => {
            let reason = if reason.is_empty() { other } else { reason };
            vec![Notice::error(format!("Synchronisation échouée: {reason}"))]
        }
    }
}
