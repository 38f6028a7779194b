use crate::error::{info_err, TvEpgError};
use crate::model::Config;
use crate::utils::{create_client, download_with_retry, get_file_path};
use log::{error, info};
use std::path::Path;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    pub success: usize,
    pub failed: usize,
}

#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

async fn write_epg_file(path: &Path, content: &[u8]) -> Result<(), TvEpgError> {
    tokio::fs::write(path, content).await
        .map_err(|err| info_err!("Can't write {}: {err}", path.display()))
}

/// Downloads every configured epg file into the epg dir.
/// Failures are counted, they never abort the remaining downloads.
pub async fn download_epg_files(cfg: &Config) -> Result<DownloadStats, TvEpgError> {
    let mut stats = DownloadStats::default();
    let downloads = cfg.epg_downloads();
    if downloads.is_empty() {
        info!("No epg downloads configured");
        return Ok(stats);
    }

    let epg_dir = get_file_path(&cfg.working_dir, &cfg.epg_dir);
    tokio::fs::create_dir_all(&epg_dir).await
        .map_err(|err| info_err!("Can't create epg dir {}: {err}", epg_dir.display()))?;

    let client = create_client(cfg.download.timeout_secs, &cfg.download.user_agent).build()
        .map_err(|err| info_err!("Can't create http client: {err}"))?;

    for (file_name, url) in &downloads {
        let content = match download_with_retry(&client, file_name, url, &cfg.download).await {
            Ok(content) => content,
            Err(err) => {
                error!("{err}");
                stats.failed += 1;
                continue;
            }
        };
        let path = epg_dir.join(file_name);
        match write_epg_file(&path, &content).await {
            Ok(()) => {
                info!("Saved {} ({})", path.display(), format_size(content.len()));
                stats.success += 1;
            }
            Err(err) => {
                error!("{err}");
                stats.failed += 1;
            }
        }
    }

    info!("Epg download finished: {} succeeded, {} failed", stats.success, stats.failed);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::{download_epg_files, format_size};
    use crate::model::Config;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[tokio::test]
    async fn test_no_downloads_configured() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config { working_dir: dir.path().to_string_lossy().to_string(), ..Config::default() };
        let stats = download_epg_files(&cfg).await.unwrap();
        assert_eq!((stats.success, stats.failed), (0, 0));
    }
}
