use crate::model::ChannelListItem;
use crate::processing::parser::m3u::{is_m3u, parse_m3u, strip_bom};
use crate::utils::CONSTANTS;
use log::{debug, warn};

const SEPARATORS: &[char] = &[',', ' ', '\t'];

/// Returns the group name when the line is a genre line like `央视,#genre#`.
pub fn parse_genre_line(line: &str) -> Option<String> {
    if line.ends_with(",#genre#") || line.ends_with(",genre") || CONSTANTS.re_genre.is_match(line) {
        Some(CONSTANTS.re_genre.replace(line, "").to_string())
    } else {
        None
    }
}

/// Position of the separator between name and url.
/// Separators are tried in order, the first one the line contains is used.
pub fn channel_separator_pos(line: &str) -> Option<usize> {
    SEPARATORS.iter().find_map(|sep| line.find(*sep))
}

pub fn split_channel_line(line: &str) -> Option<(&str, &str)> {
    channel_separator_pos(line)
        .map(|pos| (line[..pos].trim(), line[pos + 1..].trim()))
}

fn parse_plain_text(content: &str, default_group: &str) -> Vec<ChannelListItem> {
    let mut current_group = default_group.to_string();
    let mut result = vec![];

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(group) = parse_genre_line(line) {
            debug!("Group detected: {group} (line {line_no})");
            current_group = group;
            continue;
        }

        let Some((name, url)) = split_channel_line(line) else {
            warn!("Can't parse line {line_no}: {line}");
            continue;
        };
        if name.is_empty() || url.is_empty() {
            warn!("Skipping invalid channel line {line_no}: {line}");
            continue;
        }

        result.push(ChannelListItem {
            name: name.to_string(),
            url: url.to_string(),
            group: current_group.clone(),
            ..ChannelListItem::default()
        });
    }
    result
}

/// Parses a channel list, either plain text with genre lines or an m3u playlist.
pub fn parse_channel_list(content: &str, default_group: &str) -> Vec<ChannelListItem> {
    let content = strip_bom(content);
    if is_m3u(content) {
        parse_m3u(content, default_group)
    } else {
        parse_plain_text(content, default_group)
    }
}
