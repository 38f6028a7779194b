use crate::error::{info_err, TvEpgError};
use crate::processing::parser::channel_list::{channel_separator_pos, parse_genre_line};
use crate::processing::parser::m3u::{is_m3u, split_extinf_title};
use crate::utils::{collapse_whitespace, debug_if_enabled};
use log::info;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

struct CleanRule {
    pattern: Regex,
    replacement: &'static str,
}

macro_rules! clean_rules {
    ($(($pattern:expr, $replacement:expr)),* $(,)?) => {
        vec![$(CleanRule { pattern: Regex::new($pattern).unwrap(), replacement: $replacement }),*]
    };
}

const QUALITY_MARKERS: &str = "HD|FHD|UHD|高清|超清|标清|1080P|720P";

// applied in order, every rule sees the output of the previous one
static CLEAN_RULES: LazyLock<Vec<CleanRule>> = LazyLock::new(|| clean_rules![
    (r"(?i)^CCTV[\s-]*([48])[\s-]*K", "CCTV${1}K"),
    (r"(?i)^CCTV[\s-]*5[\s-]*\+.*$", "CCTV5+"),
    (r"(?i)^CCTV[\s-]*4[\s-]*(欧洲|美洲|亚洲)", "CCTV4${1}"),
    (&format!(r"(?i)^CCTV[\s-]*(\d{{1,2}})[\s-]*(?:综合|财经|综艺|中文国际|体育|电影|国防军事|电视剧|纪录|科教|戏曲|社会与法|新闻|少儿|音乐|农业农村|奥林匹克)?(?:[\s-]*(?:{QUALITY_MARKERS}))?$"), "CCTV${1}"),
    (r"^CGTN[\s-]+(\p{Han}+)", "CGTN${1}"),
    (&format!(r"(?i)[\s-]*(?:{QUALITY_MARKERS})$"), ""),
]);

/// Corrects the known variants of a channel name.
/// A name that would become empty is returned unchanged.
pub fn clean_channel_name(name: &str) -> String {
    let normalized = name.replace('＋', "+");
    let mut result = collapse_whitespace(&normalized);
    for rule in CLEAN_RULES.iter() {
        result = rule.pattern.replace(&result, rule.replacement).into_owned();
    }
    let cleaned = result.trim();
    if cleaned.is_empty() {
        name.to_string()
    } else {
        cleaned.to_string()
    }
}

fn clean_plain_text_line(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.is_empty() || parse_genre_line(trimmed).is_some() {
        return line.to_string();
    }
    let Some(sep_pos) = channel_separator_pos(trimmed) else {
        return line.to_string();
    };
    let (name, rest) = trimmed.split_at(sep_pos);
    if name.trim().is_empty() {
        return line.to_string();
    }
    format!("{}{rest}", clean_channel_name(name))
}

fn clean_m3u_line(line: &str) -> String {
    if !line.trim_start().starts_with("#EXTINF") {
        return line.to_string();
    }
    match split_extinf_title(line) {
        Some((header, title)) if !title.trim().is_empty() => format!("{header},{}", clean_channel_name(title)),
        _ => line.to_string(),
    }
}

/// Rewrites the channel names of a plain text list or an m3u playlist.
pub fn clean_channel_list(content: &str) -> String {
    let clean_line = if is_m3u(content) { clean_m3u_line } else { clean_plain_text_line };
    let mut result: Vec<String> = content.lines().map(clean_line).collect();
    if content.ends_with('\n') {
        result.push(String::new());
    }
    result.join("\n")
}

pub async fn clean_channel_names_file(input: &Path, output: Option<&Path>) -> Result<usize, TvEpgError> {
    let content = tokio::fs::read_to_string(input).await
        .map_err(|err| info_err!("Can't read channel list {}: {err}", input.display()))?;
    let cleaned = clean_channel_list(&content);
    let changed = content.lines().zip(cleaned.lines()).filter(|(a, b)| a != b).count();
    let target = output.unwrap_or(input);
    tokio::fs::write(target, cleaned).await
        .map_err(|err| info_err!("Can't write channel list {}: {err}", target.display()))?;
    debug_if_enabled!("cleaned channel list written to {}", target.display());
    info!("Cleaned {changed} channel names in {}", input.display());
    Ok(changed)
}
