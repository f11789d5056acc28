use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{RequestBuilder, Response};
use tracing::debug;

use crate::core::history::{decode_rows, GrabHistoryRow, HistoryQuery};
use crate::core::recovery::{RecoverRequest, RecoverResponse};
use crate::core::sync::SyncResponse;

const RECONCILE_PATH: &str = "/api/history/reconcile";
const RECOVER_PATH: &str = "/api/history/reconcile/recover";
const SYNC_PATH: &str = "/api/history/reconcile/sync";
const TORRENT_DOWNLOAD_PATH: &str = "/api/torrents/download";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("URL du serveur invalide: {0}")]
    InvalidUrl(String),
    #[error("requête échouée: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx answer. `message` is the body's `detail`/`reason` when present.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("réponse invalide: {0}")]
    Decode(String),
}

/// Everything the reconciliation view needs from the server.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<GrabHistoryRow>, ApiError>;
    async fn recover(&self, request: &RecoverRequest) -> Result<RecoverResponse, ApiError>;
    async fn sync_history(&self) -> Result<SyncResponse, ApiError>;
    async fn download_torrent(&self, file: &str) -> Result<Vec<u8>, ApiError>;
}

/// Grab2RSS REST client.
#[derive(Debug, Clone)]
pub struct GrabClient {
    client: reqwest::Client,
    base_url: String,
    session_token: Option<String>,
}

impl GrabClient {
    pub fn new(base_url: &str, session_token: Option<String>) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidUrl(base_url));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            session_token: session_token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn torrent_url(&self, file: &str) -> String {
        format!(
            "{}{TORRENT_DOWNLOAD_PATH}/{}",
            self.base_url,
            urlencoding::encode(file)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session_token {
            Some(token) => request.header(COOKIE, format!("session_token={token}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let resp = self.authorize(request).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(status.as_u16(), &body),
        })
    }

    async fn json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl HistoryBackend for GrabClient {
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<GrabHistoryRow>, ApiError> {
        let url = format!("{}{RECONCILE_PATH}?{}", self.base_url, query.query_string());
        debug!("GET {url}");
        let resp = self.send(self.client.get(&url)).await?;
        let value: serde_json::Value = Self::json(resp).await?;
        decode_rows(value).map_err(ApiError::Decode)
    }

    async fn recover(&self, request: &RecoverRequest) -> Result<RecoverResponse, ApiError> {
        let url = format!("{}{RECOVER_PATH}", self.base_url);
        debug!("POST {url} download_id={}", request.download_id);
        let resp = self.send(self.client.post(&url).json(request)).await?;
        Self::json(resp).await
    }

    async fn sync_history(&self) -> Result<SyncResponse, ApiError> {
        let url = format!("{}{SYNC_PATH}", self.base_url);
        debug!("POST {url}");
        let resp = self.send(self.client.post(&url)).await?;
        Self::json(resp).await
    }

    async fn download_torrent(&self, file: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.torrent_url(file);
        debug!("GET {url}");
        let resp = self.send(self.client.get(&url)).await?;
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Message for a failed response: the JSON body's `detail` or `reason` if
/// it has one, otherwise a generic status line.
pub fn error_message(status: u16, body: &str) -> String {
    let from_body = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["detail", "reason"].iter().find_map(|key| match value.get(*key)? {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                serde_json::Value::String(_) | serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
        });
    from_body.unwrap_or_else(|| format!("Erreur HTTP {status}"))
}
