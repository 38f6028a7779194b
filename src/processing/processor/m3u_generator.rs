use crate::error::{fatal_err, fatal_err_res, info_err, TvEpgError};
use crate::model::{ChannelListItem, Config, EpgChannelRef, EpgIndexEntry, LogoIndexEntry, M3uPlaylistItem};
use crate::processing::parser::channel_list::parse_channel_list;
use crate::processing::processor::name_cleaner::clean_channel_name;
use crate::processing::processor::normalize::normalize_channel_name;
use crate::repository::m3u_repository::persist_m3u_playlist;
use crate::utils::{create_client, debug_if_enabled, fetch_text, get_file_path, sanitize_sensitive_info, CONSTANTS};
use log::{error, info, warn};
use std::collections::HashMap;
use url::Url;

/// Enriches channels with the epg id/name and logo of the matching index entries.
#[derive(Debug, Default)]
pub struct ChannelMatcher {
    epg_map: HashMap<String, EpgChannelRef>,
    logo_maps: Vec<HashMap<String, String>>,
    clean_names: bool,
}

impl ChannelMatcher {
    pub fn new(epg_map: HashMap<String, EpgChannelRef>, logo_maps: Vec<HashMap<String, String>>, clean_names: bool) -> Self {
        Self { epg_map, logo_maps, clean_names }
    }

    pub fn find_epg(&self, normalized_name: &str) -> Option<&EpgChannelRef> {
        self.epg_map.get(normalized_name)
    }

    // the logo maps are searched in their configured order
    pub fn find_logo(&self, normalized_name: &str) -> Option<&str> {
        self.logo_maps.iter().find_map(|m| m.get(normalized_name)).map(String::as_str)
    }

    pub fn to_playlist_item(&self, channel: &ChannelListItem) -> M3uPlaylistItem {
        let title = if self.clean_names { clean_channel_name(&channel.name) } else { channel.name.clone() };
        let key = normalize_channel_name(&title);
        let (epg_channel_id, epg_channel_name) = match self.find_epg(&key) {
            Some(epg) => (epg.channel_id.clone(), epg.channel_name.clone()),
            None => (channel.tvg_id.clone(), channel.tvg_name.clone()),
        };
        let logo = self.find_logo(&key).map_or_else(|| channel.tvg_logo.clone(), String::from);
        M3uPlaylistItem {
            title,
            url: channel.url.clone(),
            epg_channel_id,
            epg_channel_name,
            logo,
            group: channel.group.clone(),
        }
    }
}

/// Normalized channel name to epg channel. The last entry of a name wins.
pub fn build_epg_map(entries: Vec<EpgIndexEntry>) -> HashMap<String, EpgChannelRef> {
    let mut result = HashMap::with_capacity(entries.len());
    for entry in entries {
        let key = normalize_channel_name(&entry.channel_name);
        if key.is_empty() {
            continue;
        }
        result.insert(key, EpgChannelRef {
            channel_id: entry.channel_id,
            channel_name: entry.channel_name,
        });
    }
    result
}

/// Normalized logo name to logo url. The last entry of a name wins.
pub fn build_logo_map(entries: Vec<LogoIndexEntry>) -> HashMap<String, String> {
    let mut result = HashMap::with_capacity(entries.len());
    for entry in entries {
        let key = normalize_channel_name(&entry.logo_name);
        if !key.is_empty() && !entry.logo_url.is_empty() {
            result.insert(key, entry.logo_url);
        }
    }
    result
}

pub fn extract_correct_pwd(html: &str) -> Option<String> {
    CONSTANTS.re_correct_pwd.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `<base>/list.txt?pwd=<pwd>`
pub fn protected_list_url(base_url: &str, pwd: &str) -> Result<String, TvEpgError> {
    let mut url = Url::parse(&format!("{}/list.txt", base_url.trim_end_matches('/')))
        .map_err(|err| info_err!("Invalid url {base_url}: {err}"))?;
    url.query_pairs_mut().append_pair("pwd", pwd);
    Ok(url.to_string())
}

pub fn build_playlist(channels: &[ChannelListItem], matcher: &ChannelMatcher) -> Vec<M3uPlaylistItem> {
    channels.iter()
        .filter(|c| !c.name.is_empty() && !c.url.is_empty())
        .map(|c| matcher.to_playlist_item(c))
        .collect()
}

async fn load_epg_map(client: &reqwest::Client, url: &str) -> HashMap<String, EpgChannelRef> {
    let Some(content) = fetch_text(client, url, "epg index").await else {
        warn!("No epg index available, epg matching is skipped");
        return HashMap::new();
    };
    match serde_json::from_str::<Vec<EpgIndexEntry>>(&content) {
        Ok(entries) => {
            let map = build_epg_map(entries);
            info!("Loaded epg index with {} channels", map.len());
            map
        }
        Err(err) => {
            warn!("Failed to parse epg index: {err}");
            HashMap::new()
        }
    }
}

async fn load_logo_maps(client: &reqwest::Client, urls: &[String]) -> Vec<HashMap<String, String>> {
    let mut result = Vec::with_capacity(urls.len());
    for url in urls {
        let map = match fetch_text(client, url, &format!("logo index {url}")).await {
            Some(content) => match serde_json::from_str::<Vec<LogoIndexEntry>>(&content) {
                Ok(entries) => build_logo_map(entries),
                Err(err) => {
                    warn!("Failed to parse logo index {url}: {err}");
                    HashMap::new()
                }
            },
            None => HashMap::new(),
        };
        info!("Loaded logo index {url} with {} logos", map.len());
        result.push(map);
    }
    result
}

/// The channel list url of a protected site page, `None` skips the source.
pub fn resolve_protected_list_url(base_url: &str, html: &str) -> Option<String> {
    let Some(pwd) = extract_correct_pwd(html) else {
        warn!("No password found on {base_url}, skipping");
        return None;
    };
    match protected_list_url(base_url, &pwd) {
        Ok(list_url) => Some(list_url),
        Err(err) => {
            error!("{err}");
            None
        }
    }
}

async fn fetch_protected_list(client: &reqwest::Client, base_url: &str) -> Option<String> {
    let html = fetch_text(client, base_url, "protected site").await?;
    let list_url = resolve_protected_list_url(base_url, &html)?;
    fetch_text(client, &list_url, "channel list").await
}

async fn write_playlist(cfg: &Config, output: &str, content: &str, source: &str, matcher: &ChannelMatcher) -> bool {
    let channels = parse_channel_list(content, &cfg.default_group);
    let playlist = build_playlist(&channels, matcher);
    if playlist.is_empty() {
        warn!("Source {} has no valid channels", sanitize_sensitive_info(source));
        return false;
    }
    let path = get_file_path(&cfg.working_dir, output);
    match persist_m3u_playlist(&path, &playlist).await {
        Ok(()) => {
            info!("Playlist {output} written with {} channels", playlist.len());
            true
        }
        Err(err) => {
            error!("{err}");
            false
        }
    }
}

/// Generates the configured playlists and returns the number of written files.
pub async fn generate_m3u(cfg: &Config) -> Result<usize, TvEpgError> {
    let Some(epg_index_url) = cfg.snow_epg_json.as_deref() else {
        return fatal_err_res!("snow_epg_json is not configured");
    };
    let live_sources = cfg.live_sources();
    let protected_sources = cfg.protected_sources();
    if live_sources.is_empty() && protected_sources.is_empty() {
        return fatal_err_res!("Neither live_url nor protected_url is configured");
    }

    let client = create_client(cfg.timeout_secs, &cfg.user_agent).build()
        .map_err(|err| fatal_err!("Can't create http client: {err}"))?;

    let epg_map = load_epg_map(&client, epg_index_url).await;
    let logo_maps = load_logo_maps(&client, &cfg.logo_json).await;
    let matcher = ChannelMatcher::new(epg_map, logo_maps, cfg.clean_channel_names);

    let total = live_sources.len() + protected_sources.len();
    let mut success = 0usize;

    for (output, url) in &live_sources {
        info!("Processing {output} from {}", sanitize_sensitive_info(url));
        if let Some(content) = fetch_text(&client, url, &format!("channel list ({output})")).await {
            if write_playlist(cfg, output, &content, url, &matcher).await {
                success += 1;
            }
        }
    }

    for (output, base_url) in &protected_sources {
        info!("Processing {output} from {base_url}");
        if let Some(content) = fetch_protected_list(&client, base_url).await {
            if write_playlist(cfg, output, &content, base_url, &matcher).await {
                success += 1;
            }
        }
    }

    debug_if_enabled!("playlist generation finished with {} of {} sources", success, total);
    info!("Generated {success}/{total} playlists");
    Ok(success)
}

#[cfg(test)]
mod tests {
    use super::{build_epg_map, build_logo_map, build_playlist, extract_correct_pwd, generate_m3u, protected_list_url,
                resolve_protected_list_url, write_playlist, ChannelMatcher};
    use crate::model::{Config, EpgIndexEntry, LogoIndexEntry};
    use crate::processing::parser::channel_list::parse_channel_list;

    fn matcher(clean_names: bool) -> ChannelMatcher {
        let epg: Vec<EpgIndexEntry> = serde_json::from_str(r#"[
            {"channel_id": 1, "channel_name": "CCTV1"},
            {"channel_id": "dup", "channel_name": "cctv1"},
            {"channel_id": "5p", "channel_name": "CCTV5+"},
            {"channel_id": "fh", "channel_name": "鳳凰衛視"}
        ]"#).unwrap();
        let logos_a = vec![
            LogoIndexEntry { logo_name: "CCTV1".to_string(), logo_url: "http://a/old.png".to_string() },
            LogoIndexEntry { logo_name: "cctv1".to_string(), logo_url: "http://a/cctv1.png".to_string() },
        ];
        let logos_b = vec![
            LogoIndexEntry { logo_name: "cctv1".to_string(), logo_url: "http://b/cctv1.png".to_string() },
            LogoIndexEntry { logo_name: "凤凰卫视".to_string(), logo_url: "http://b/fh.png".to_string() },
        ];
        ChannelMatcher::new(build_epg_map(epg), vec![build_logo_map(logos_a), build_logo_map(logos_b)], clean_names)
    }

    #[test]
    fn test_last_index_entry_wins() {
        let m = matcher(false);
        let epg = m.find_epg("cctv1").unwrap();
        assert_eq!(epg.channel_id, "dup");
        assert_eq!(epg.channel_name, "cctv1");
        assert_eq!(m.find_logo("cctv1"), Some("http://a/cctv1.png"));
        assert_eq!(m.find_logo("凤凰卫视"), Some("http://b/fh.png"));
    }

    #[test]
    fn test_build_playlist() {
        let content = "央视,#genre#\nCCTV1,http://x/1\nCCTV-5+ 体育赛事,http://x/5\n港澳,#genre#\n鳳凰衛視,http://x/fh\n未知台,http://x/u\n";
        let channels = parse_channel_list(content, "默认分组");

        let playlist = build_playlist(&channels, &matcher(false));
        assert_eq!(playlist.len(), 4);
        assert_eq!(playlist[0].to_m3u(), "#EXTINF:-1 tvg-id=\"dup\" tvg-name=\"cctv1\" tvg-logo=\"http://a/cctv1.png\" group-title=\"央视\",CCTV1\nhttp://x/1");
        assert_eq!(playlist[1].epg_channel_id, "");
        assert_eq!(playlist[2].to_m3u(), "#EXTINF:-1 tvg-id=\"fh\" tvg-name=\"鳳凰衛視\" tvg-logo=\"http://b/fh.png\" group-title=\"港澳\",鳳凰衛視\nhttp://x/fh");
        assert_eq!(playlist[3].to_m3u(), "#EXTINF:-1 group-title=\"港澳\",未知台\nhttp://x/u");

        let cleaned = build_playlist(&channels, &matcher(true));
        assert_eq!(cleaned[1].title, "CCTV5+");
        assert_eq!(cleaned[1].epg_channel_id, "5p");
    }

    #[test]
    fn test_m3u_source_attributes_are_fallback() {
        let content = "#EXTM3U\n#EXTINF:-1 tvg-id=\"own\" tvg-logo=\"http://own/logo.png\" group-title=\"其他\",本地台\nhttp://x/l\n";
        let playlist = build_playlist(&parse_channel_list(content, "默认分组"), &matcher(false));
        assert_eq!(playlist[0].epg_channel_id, "own");
        assert_eq!(playlist[0].logo, "http://own/logo.png");
        assert_eq!(playlist[0].group, "其他");
    }

    #[test]
    fn test_protected_source() {
        let html = r#"<script>const correctPwd = "s3cr3t&x";</script>"#;
        let pwd = extract_correct_pwd(html).unwrap();
        assert_eq!(pwd, "s3cr3t&x");
        assert_eq!(protected_list_url("https://2099.tv12.xyz/", &pwd).unwrap(), "https://2099.tv12.xyz/list.txt?pwd=s3cr3t%26x");
        assert!(extract_correct_pwd("<html></html>").is_none());
        assert!(protected_list_url("not a url", "x").is_err());
    }

    #[test]
    fn test_resolve_protected_list_url() {
        let html = r#"<script>const correctPwd = "abc";</script>"#;
        assert_eq!(resolve_protected_list_url("https://2099.tv12.xyz", html).as_deref(), Some("https://2099.tv12.xyz/list.txt?pwd=abc"));
        assert!(resolve_protected_list_url("https://2099.tv12.xyz", "<html>no password</html>").is_none());
        assert!(resolve_protected_list_url("not a url", html).is_none());
    }

    #[tokio::test]
    async fn test_write_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            working_dir: dir.path().to_string_lossy().to_string(),
            ..Config::default()
        };
        let m = matcher(false);

        assert!(!write_playlist(&cfg, "empty.m3u", "央视,#genre#\n卫视,#genre#\n", "http://x/empty.txt", &m).await);
        assert!(!dir.path().join("empty.m3u").exists());

        assert!(write_playlist(&cfg, "live.m3u", "央视,#genre#\nCCTV1,http://x/1\n", "http://x/live.txt", &m).await);
        let content = std::fs::read_to_string(dir.path().join("live.m3u")).unwrap();
        assert!(content.starts_with("#EXTM3U\n#EXTINF:-1 tvg-id=\"dup\""));
    }

    #[tokio::test]
    async fn test_generate_m3u_without_sources_is_fatal() {
        let cfg = Config { snow_epg_json: Some("http://x/epg.json".to_string()), ..Config::default() };
        assert!(generate_m3u(&cfg).await.is_err_and(|err| err.is_fatal()));
        assert!(generate_m3u(&Config::default()).await.is_err_and(|err| err.is_fatal()));
    }
}
