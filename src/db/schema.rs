use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const DEFAULT_REFRESH_INTERVAL: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ServerUrl,
    SessionToken,
    DownloadDir,
    RefreshIntervalSecs,
}

impl SettingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServerUrl => "server_url",
            Self::SessionToken => "session_token",
            Self::DownloadDir => "download_dir",
            Self::RefreshIntervalSecs => "refresh_interval_secs",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ServerUrl => "URL du serveur Grab2RSS",
            Self::SessionToken => "Jeton de session",
            Self::DownloadDir => "Dossier de téléchargement",
            Self::RefreshIntervalSecs => "Rafraîchissement auto (secondes, 0 = off)",
        }
    }

    pub const ALL: &[SettingKey] = &[
        Self::ServerUrl,
        Self::SessionToken,
        Self::DownloadDir,
        Self::RefreshIntervalSecs,
    ];
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("grabdesk")
}

/// Typed view over the raw settings map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub server_url: String,
    pub session_token: Option<String>,
    pub download_dir: PathBuf,
    pub refresh_interval_secs: u64,
}

impl AppSettings {
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: SettingKey| {
            map.get(key.as_str())
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };
        Self {
            server_url: get(SettingKey::ServerUrl)
                .unwrap_or(DEFAULT_SERVER_URL)
                .to_string(),
            session_token: get(SettingKey::SessionToken).map(str::to_string),
            download_dir: get(SettingKey::DownloadDir)
                .map(PathBuf::from)
                .unwrap_or_else(default_download_dir),
            refresh_interval_secs: get(SettingKey::RefreshIntervalSecs)
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REFRESH_INTERVAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_map_falls_back_to_defaults() {
        let mut map = HashMap::new();
        map.insert("server_url".to_string(), "  ".to_string());
        map.insert("refresh_interval_secs".to_string(), "abc".to_string());
        let settings = AppSettings::from_map(&map);
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
        assert_eq!(settings.session_token, None);
        assert_eq!(settings.refresh_interval_secs, 0);
        assert_eq!(settings.download_dir, default_download_dir());
    }

    #[test]
    fn test_from_map_reads_values() {
        let map: HashMap<String, String> = [
            ("server_url", "https://grab.example"),
            ("session_token", "tok"),
            ("download_dir", "/tmp/torrents"),
            ("refresh_interval_secs", "30"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let settings = AppSettings::from_map(&map);
        assert_eq!(settings.server_url, "https://grab.example");
        assert_eq!(settings.session_token.as_deref(), Some("tok"));
        assert_eq!(settings.download_dir, PathBuf::from("/tmp/torrents"));
        assert_eq!(settings.refresh_interval_secs, 30);
    }
}
