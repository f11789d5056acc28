use std::path::{Path, PathBuf};
use tracing::info;

/// Reduce a server-supplied file name to a single safe path component.
pub fn safe_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        None
    } else {
        Some(cleaned)
    }
}

async fn write_into(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, String> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| format!("Impossible de créer {}: {e}", dir.display()))?;
    let path = dir.join(name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| format!("Écriture de {} impossible: {e}", path.display()))?;
    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Store a downloaded torrent under `dir`, keeping the server's file name.
pub async fn save_torrent(dir: PathBuf, file: String, bytes: Vec<u8>) -> Result<PathBuf, String> {
    let name = safe_file_name(&file).ok_or_else(|| format!("Nom de fichier invalide: {file}"))?;
    write_into(&dir, &name, &bytes).await
}

/// Write an HTML report named after its generation time.
pub async fn write_report(dir: PathBuf, stamp: String, html: String) -> Result<PathBuf, String> {
    let name = format!("grab-history-{stamp}.html");
    write_into(&dir, &name, html.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("a.torrent").as_deref(), Some("a.torrent"));
        assert_eq!(safe_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(safe_file_name("C:\\x\\show?.torrent").as_deref(), Some("show_.torrent"));
        assert_eq!(safe_file_name("dir/"), None);
        assert_eq!(safe_file_name(".."), None);
    }

    #[tokio::test]
    async fn test_save_torrent_writes_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("torrents");
        let path = save_torrent(dir.clone(), "sub/x.torrent".into(), b"d4:infoe".to_vec())
            .await
            .unwrap();
        assert_eq!(path, dir.join("x.torrent"));
        assert_eq!(std::fs::read(&path).unwrap(), b"d4:infoe");
    }

    #[tokio::test]
    async fn test_write_report_names_file_after_stamp() {
        let temp = TempDir::new().unwrap();
        let path = write_report(temp.path().to_path_buf(), "20240105-100000".into(), "<html></html>".into())
            .await
            .unwrap();
        assert_eq!(path, temp.path().join("grab-history-20240105-100000.html"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    }
}
