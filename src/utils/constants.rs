use regex::Regex;
use std::sync::LazyLock;

pub const CONFIG_FILE: &str = "files.json";
pub const LOG_ENV_VAR: &str = "TVEPG_LOG";

pub const DEFAULT_USER_AGENT: &str = "AptvPlayer/2.7.4";
pub const DEFAULT_DOWNLOAD_USER_AGENT: &str = "Mozilla/5.0 (compatible; GitHub-Actions-EPG-Downloader/1.0)";
pub const DEFAULT_BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_GROUP: &str = "默认分组";

pub const ENCODING_GZIP: &str = "gzip";

pub struct Constants {
    pub re_credentials: Regex,
    pub re_env_var: Regex,
    pub re_whitespace: Regex,
    pub re_genre: Regex,
    pub re_correct_pwd: Regex,
    pub re_schedule_list: Regex,
    pub re_vue_data_block: Regex,
    pub re_clock: Regex,
    pub re_date_prefix: Regex,
    pub re_html_entity: Regex,
}

pub static CONSTANTS: LazyLock<Constants> = LazyLock::new(||
    Constants {
        re_credentials: Regex::new(r"((pwd|password|token|username)=)[^&\s]*").unwrap(),
        re_env_var: Regex::new(r"\$\{env:(?P<var>[a-zA-Z_][a-zA-Z0-9_]*)}").unwrap(),
        re_whitespace: Regex::new(r"\s+").unwrap(),
        re_genre: Regex::new(r",#?\w*genre\w*#?$").unwrap(),
        re_correct_pwd: Regex::new(r#"const correctPwd\s*=\s*"([^"]+)""#).unwrap(),
        re_schedule_list: Regex::new(r"scheduleList\s*:\s*\[").unwrap(),
        re_vue_data_block: Regex::new(r"(?s)data\s*\(\)\s*\{\s*return\s*\{").unwrap(),
        re_clock: Regex::new(r"(\d{1,2})\s*[:：]\s*(\d{2})").unwrap(),
        re_date_prefix: Regex::new(r"^\d{4}-").unwrap(),
        re_html_entity: Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap(),
    }
);
