use crate::error::{info_err, TvEpgError};
use crate::model::{M3uPlaylistItem, M3U_HEADER};
use crate::utils::debug_if_enabled;
use std::path::Path;
use tokio::fs;

macro_rules! cant_write_result {
    ($path:expr, $err:expr) => {
        info_err!("failed to write m3u playlist: {} - {}", $path.display(), $err)
    }
}

pub fn m3u_to_string(playlist: &[M3uPlaylistItem]) -> String {
    let mut lines = Vec::with_capacity(playlist.len() + 1);
    lines.push(M3U_HEADER.to_string());
    lines.extend(playlist.iter().map(M3uPlaylistItem::to_m3u));
    lines.join("\n")
}

pub async fn persist_m3u_playlist(path: &Path, playlist: &[M3uPlaylistItem]) -> Result<(), TvEpgError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|err| cant_write_result!(path, err))?;
    }
    fs::write(path, m3u_to_string(playlist)).await.map_err(|err| cant_write_result!(path, err))?;
    debug_if_enabled!("m3u playlist written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{m3u_to_string, persist_m3u_playlist};
    use crate::model::M3uPlaylistItem;

    fn item(title: &str, url: &str) -> M3uPlaylistItem {
        M3uPlaylistItem { title: title.to_string(), url: url.to_string(), group: "央视".to_string(), ..M3uPlaylistItem::default() }
    }

    #[test]
    fn test_m3u_to_string() {
        let content = m3u_to_string(&[item("CCTV1", "http://x/1"), item("CCTV2", "http://x/2")]);
        assert_eq!(content, "#EXTM3U\n#EXTINF:-1 group-title=\"央视\",CCTV1\nhttp://x/1\n#EXTINF:-1 group-title=\"央视\",CCTV2\nhttp://x/2");
    }

    #[tokio::test]
    async fn test_persist_m3u_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("a.m3u");
        persist_m3u_playlist(&path, &[item("CCTV1", "http://x/1")]).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("#EXTM3U\n#EXTINF:-1 "));
        assert!(content.ends_with("http://x/1"));
    }
}
