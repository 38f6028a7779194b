use crate::error::{fatal_err, TvEpgError};
use crate::utils::{get_trimmed_string, read_config_text, DEFAULT_BROWSER_USER_AGENT, DEFAULT_DOWNLOAD_USER_AGENT, DEFAULT_GROUP, DEFAULT_USER_AGENT};
use serde::Deserialize;

// with `preserve_order` the maps keep their declaration order,
// outputs are processed in the order they are configured.
type OrderedMap = serde_json::Map<String, serde_json::Value>;

fn default_working_dir() -> String { String::from(".") }
fn default_epg_dir() -> String { String::from("epg") }
fn default_user_agent() -> String { String::from(DEFAULT_USER_AGENT) }
const fn default_timeout_secs() -> u64 { 10 }
fn default_group() -> String { String::from(DEFAULT_GROUP) }

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogLevelConfig {
    #[serde(default)]
    pub log: Option<LogConfig>,
}

const fn default_max_retries() -> u32 { 3 }
const fn default_retry_delay_ms() -> u64 { 2000 }
const fn default_backoff_multiplier() -> f64 { 1.5 }
const fn default_download_timeout_secs() -> u64 { 60 }
fn default_download_user_agent() -> String { String::from(DEFAULT_DOWNLOAD_USER_AGENT) }

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_download_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_download_user_agent")]
    pub user_agent: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            timeout_secs: default_download_timeout_secs(),
            user_agent: default_download_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TvKingChannel {
    #[serde(deserialize_with = "crate::utils::deserialize_as_string")]
    pub id: String,
    pub name: String,
}

fn default_tvking_output() -> String { String::from("tvgo.xml") }
fn default_tvking_base_url() -> String { String::from("https://tvking.funorange.com.tw/channel") }
fn default_generator_info_name() -> String { String::from(env!("CARGO_PKG_NAME")) }
fn default_browser_user_agent() -> String { String::from(DEFAULT_BROWSER_USER_AGENT) }
fn default_tvking_channels() -> Vec<TvKingChannel> {
    vec![TvKingChannel { id: String::from("325"), name: String::from("DAZN 1") }]
}

#[derive(Debug, Clone, Deserialize)]
pub struct TvKingConfig {
    #[serde(default = "default_tvking_output")]
    pub output: String,
    #[serde(default = "default_tvking_base_url")]
    pub base_url: String,
    #[serde(default = "default_generator_info_name")]
    pub generator_info_name: String,
    #[serde(default)]
    pub generator_info_url: String,
    #[serde(default = "default_browser_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_tvking_channels")]
    pub channels: Vec<TvKingChannel>,
}

impl Default for TvKingConfig {
    fn default() -> Self {
        Self {
            output: default_tvking_output(),
            base_url: default_tvking_base_url(),
            generator_info_name: default_generator_info_name(),
            generator_info_url: String::new(),
            user_agent: default_browser_user_agent(),
            channels: default_tvking_channels(),
        }
    }
}

fn default_lstime_output() -> String { String::from("lstime_ca.xml") }
fn default_lstime_api_url() -> String { String::from("https://lstimes.ca/wp-admin/admin-ajax.php") }
const fn default_days_before() -> u32 { 1 }
const fn default_days_after() -> u32 { 8 }
const fn default_output_days() -> u32 { 7 }
const fn default_request_delay_ms() -> u64 { 1000 }
fn default_lstime_channel_id() -> String { String::from("LS TIME 龙祥频道 (CA)") }
fn default_lstime_channel_name() -> String { String::from("龙祥频道 (CA)") }

#[derive(Debug, Clone, Deserialize)]
pub struct LsTimeConfig {
    #[serde(default = "default_lstime_output")]
    pub output: String,
    #[serde(default = "default_lstime_api_url")]
    pub api_url: String,
    #[serde(default = "default_days_before")]
    pub days_before: u32,
    #[serde(default = "default_days_after")]
    pub days_after: u32,
    #[serde(default = "default_output_days")]
    pub output_days: u32,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_lstime_channel_id")]
    pub channel_id: String,
    #[serde(default = "default_lstime_channel_name")]
    pub channel_name: String,
    #[serde(default)]
    pub channel_icon: String,
}

impl Default for LsTimeConfig {
    fn default() -> Self {
        Self {
            output: default_lstime_output(),
            api_url: default_lstime_api_url(),
            days_before: default_days_before(),
            days_after: default_days_after(),
            output_days: default_output_days(),
            request_delay_ms: default_request_delay_ms(),
            channel_id: default_lstime_channel_id(),
            channel_name: default_lstime_channel_name(),
            channel_icon: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: Option<LogConfig>,
    #[serde(default = "default_working_dir")]
    pub working_dir: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_epg_dir")]
    pub epg_dir: String,
    #[serde(default)]
    pub epg_url: OrderedMap,
    #[serde(default)]
    pub download: RetryConfig,
    #[serde(default)]
    pub snow_epg_json: Option<String>,
    #[serde(default)]
    pub live_url: OrderedMap,
    #[serde(default)]
    pub protected_url: OrderedMap,
    #[serde(default)]
    pub logo_json: Vec<String>,
    #[serde(default)]
    pub clean_channel_names: bool,
    #[serde(default = "default_group")]
    pub default_group: String,
    #[serde(default)]
    pub tvking: TvKingConfig,
    #[serde(default)]
    pub lstime: LsTimeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: None,
            working_dir: default_working_dir(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            epg_dir: default_epg_dir(),
            epg_url: OrderedMap::new(),
            download: RetryConfig::default(),
            snow_epg_json: None,
            live_url: OrderedMap::new(),
            protected_url: OrderedMap::new(),
            logo_json: vec![],
            clean_channel_names: false,
            default_group: default_group(),
            tvking: TvKingConfig::default(),
            lstime: LsTimeConfig::default(),
        }
    }
}

/// Values of a name -> url map, non string values are skipped.
fn string_entries(map: &OrderedMap) -> Vec<(String, String)> {
    map.iter()
        .filter_map(|(k, v)| v.as_str().map(|url| (k.clone(), url.trim().to_string())))
        .filter(|(k, v)| !k.trim().is_empty() && !v.is_empty())
        .collect()
}

impl Config {
    pub fn load(config_file: &str) -> Result<Self, TvEpgError> {
        let content = read_config_text(config_file)
            .map_err(|err| fatal_err!("Can't read the config file: {config_file}: {err}"))?;
        Self::parse(&content)
            .map_err(|err| fatal_err!("Can't read the config file: {config_file}: {}", err.message))
    }

    pub fn parse(content: &str) -> Result<Self, TvEpgError> {
        let mut config: Config = serde_yaml::from_str(content)
            .map_err(|err| fatal_err!("{err}"))?;
        config.prepare()?;
        Ok(config)
    }

    fn prepare(&mut self) -> Result<(), TvEpgError> {
        if self.working_dir.trim().is_empty() {
            self.working_dir = default_working_dir();
        }
        if self.epg_dir.trim().is_empty() {
            self.epg_dir = default_epg_dir();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.download.max_retries == 0 {
            self.download.max_retries = 1;
        }
        if !self.download.backoff_multiplier.is_finite() || self.download.backoff_multiplier < 1.0 {
            self.download.backoff_multiplier = 1.0;
        }
        if self.lstime.output_days == 0 {
            return Err(fatal_err!("lstime.output_days must be at least 1"));
        }
        self.snow_epg_json = get_trimmed_string(self.snow_epg_json.as_deref());
        self.logo_json.retain(|url| !url.trim().is_empty());
        Ok(())
    }

    pub fn epg_downloads(&self) -> Vec<(String, String)> {
        string_entries(&self.epg_url)
    }

    pub fn live_sources(&self) -> Vec<(String, String)> {
        string_entries(&self.live_url)
    }

    pub fn protected_sources(&self) -> Vec<(String, String)> {
        string_entries(&self.protected_url)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::Config;

    #[test]
    fn test_parse_legacy_json_config() {
        let content = r#"{
            "epg_url": {"e.xml.gz": "https://a.b/e.xml.gz", "b.xml": "https://a.b/b.xml"},
            "snow_epg_json": "https://a.b/snow_epg.json",
            "live_url": {"z.m3u": "https://a.b/z.txt", "a.m3u": "https://a.b/a.txt"},
            "logo_json": ["https://a.b/logo.json", ""]
        }"#;
        let cfg = Config::parse(content).unwrap();
        assert_eq!(cfg.epg_downloads(), vec![
            ("e.xml.gz".to_string(), "https://a.b/e.xml.gz".to_string()),
            ("b.xml".to_string(), "https://a.b/b.xml".to_string()),
        ]);
        // declaration order is kept
        assert_eq!(cfg.live_sources()[0].0, "z.m3u");
        assert_eq!(cfg.logo_json.len(), 1);
        assert_eq!(cfg.snow_epg_json.as_deref(), Some("https://a.b/snow_epg.json"));
        assert_eq!(cfg.download.max_retries, 3);
        assert_eq!(cfg.download.retry_delay_ms, 2000);
        assert_eq!(cfg.default_group, "默认分组");
        assert_eq!(cfg.epg_dir, "epg");
        assert_eq!(cfg.tvking.channels[0].id, "325");
        assert_eq!(cfg.lstime.output, "lstime_ca.xml");
    }

    #[test]
    fn test_parse_yaml_config() {
        let content = r"
log:
  log_level: debug
clean_channel_names: true
download:
  max_retries: 0
  backoff_multiplier: 0.5
tvking:
  output: out.xml
  channels:
    - id: 326
      name: DAZN 2
";
        let cfg = Config::parse(content).unwrap();
        assert_eq!(cfg.log.and_then(|l| l.log_level).as_deref(), Some("debug"));
        assert!(cfg.clean_channel_names);
        assert_eq!(cfg.download.max_retries, 1);
        assert!((cfg.download.backoff_multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(cfg.tvking.output, "out.xml");
        assert_eq!(cfg.tvking.channels[0].id, "326");
        assert_eq!(cfg.tvking.channels[0].name, "DAZN 2");
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::parse("lstime:\n  output_days: 0\n").is_err_and(|e| e.is_fatal()));
        assert!(Config::parse("logo_json: 12").is_err());
    }
}
