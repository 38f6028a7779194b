use crate::model::ChannelListItem;

#[inline]
fn token_value(stack: &mut String, it: &mut std::str::Chars) -> String {
    // Use .any() to skip until the first double quote (") character.
    if it.any(|ch| ch == '"') {
        return get_value(stack, it);
    }
    String::new()
}

fn get_value(stack: &mut String, it: &mut std::str::Chars) -> String {
    for c in it.skip_while(|c| c.is_whitespace()) {
        if c == '"' {
            break;
        }
        stack.push(c);
    }

    let result = (*stack).clone();
    stack.clear();
    result
}

fn get_rest(stack: &mut String, it: &mut std::str::Chars) -> String {
    for c in it.skip_while(|c| c.is_whitespace()) {
        stack.push(c);
    }
    let result = stack.trim_end().to_string();
    stack.clear();
    result
}

fn token_till(stack: &mut String, it: &mut std::str::Chars, stop_char: char, start_with_alpha: bool) -> Option<String> {
    let mut skip_non_alpha = start_with_alpha;

    for ch in it.by_ref() {
        if ch == stop_char {
            break;
        }
        if stack.is_empty() && ch.is_whitespace() {
            continue;
        }

        if skip_non_alpha {
            if ch.is_alphabetic() {
                skip_non_alpha = false;
            } else {
                continue;
            }
        }
        stack.push(ch);
    }

    if stack.is_empty() {
        None
    } else {
        let result = (*stack).clone();
        stack.clear();
        Some(result)
    }
}

#[inline]
fn skip_digit(it: &mut std::str::Chars) -> Option<char> {
    loop {
        match it.next() {
            Some(c) => {
                if !(c == '-' || c == '+' || c.is_ascii_digit()) {
                    return Some(c);
                }
            }
            None => return None,
        }
    }
}

macro_rules! process_header_fields {
    ($header:expr, $token:expr, $(($prop:ident, $field:expr)),*; $val:expr) => {
        match $token {
            $(
               $field => $header.$prop = $val,
             )*
            _ => {}
        }
    };
}

/// Parses an `#EXTINF` line into a channel without url.
pub fn process_header(content: &str) -> ChannelListItem {
    let mut item = ChannelListItem::default();
    let mut it = content.chars();
    let mut stack = String::with_capacity(64);
    let line_token = token_till(&mut stack, &mut it, ':', false);
    if line_token.as_deref() == Some("#EXTINF") {
        let mut c = skip_digit(&mut it);
        loop {
            match c {
                None => break,
                Some(chr) => {
                    if chr.is_whitespace() {
                        // skip
                    } else if chr == ',' {
                        item.name = get_rest(&mut stack, &mut it);
                        break;
                    } else {
                        stack.push(chr);
                        let token = token_till(&mut stack, &mut it, '=', true);
                        if let Some(t) = token {
                            let value = token_value(&mut stack, &mut it);
                            process_header_fields!(item, t.to_lowercase().as_str(),
                                (tvg_id, "tvg-id"),
                                (tvg_name, "tvg-name"),
                                (tvg_logo, "tvg-logo"),
                                (group, "group-title"); value);
                        }
                    }
                }
            }
            c = it.next();
        }
    }
    if item.name.is_empty() {
        item.name.clone_from(&item.tvg_name);
    }
    item
}

/// Splits an `#EXTINF` line at the comma that starts the title.
/// Commas inside quoted attribute values are ignored.
pub fn split_extinf_title(line: &str) -> Option<(&str, &str)> {
    let mut in_quotes = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return Some((&line[..idx], &line[idx + 1..])),
            _ => {}
        }
    }
    None
}

const BOM: char = '\u{feff}';

pub fn strip_bom(content: &str) -> &str {
    content.strip_prefix(BOM).unwrap_or(content)
}

/// A playlist starts with `#EXTM3U` or has at least one `#EXTINF` line.
pub fn is_m3u(content: &str) -> bool {
    let mut lines = strip_bom(content).lines().map(str::trim).filter(|l| !l.is_empty());
    if lines.next().is_some_and(|l| l.starts_with("#EXTM3U") || l.starts_with("#EXTINF")) {
        return true;
    }
    lines.any(|l| l.starts_with("#EXTINF"))
}

/// Channels of an m3u playlist. `#EXTGRP` sets the group of the next entry,
/// entries without a group get the `default_group`.
pub fn parse_m3u(content: &str, default_group: &str) -> Vec<ChannelListItem> {
    let mut result = vec![];
    let mut header: Option<String> = None;
    let mut group: Option<String> = None;
    for raw in strip_bom(content).lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("#EXTINF") {
            header = Some(line.to_string());
            continue;
        }
        if let Some(grp) = line.strip_prefix("#EXTGRP:") {
            group = Some(grp.trim().to_string());
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        if let Some(header_value) = header.take() {
            let mut item = process_header(&header_value);
            item.url = line.to_string();
            if item.group.is_empty() {
                item.group = group.take().unwrap_or_else(|| default_group.to_string());
            }
            if !item.name.is_empty() {
                result.push(item);
            }
        }
        group = None;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::{is_m3u, parse_m3u, process_header, split_extinf_title};

    #[test]
    fn test_process_header_1() {
        let line = r#"#EXTINF:-1 channel-id="abc-seven" tvg-id="abc-seven" tvg-logo="https://abc.nz/.images/seven.png" tvg-chno="7" group-title="Sydney" , Seven"#;
        let item = process_header(line);
        assert_eq!(item.name, "Seven");
        assert_eq!(item.tvg_id, "abc-seven");
        assert_eq!(item.tvg_logo, "https://abc.nz/.images/seven.png");
        assert_eq!(item.group, "Sydney");
    }

    #[test]
    fn test_process_header_title_with_comma() {
        let line = r#"#EXTINF:-1 tvg-name="翡翠台" group-title="香港,TVB",翡翠台, HD"#;
        let item = process_header(line);
        assert_eq!(item.group, "香港,TVB");
        assert_eq!(item.tvg_name, "翡翠台");
        assert_eq!(item.name, "翡翠台, HD");
    }

    #[test]
    fn test_process_header_without_title() {
        let item = process_header(r#"#EXTINF:-1 tvg-name="CCTV1""#);
        assert_eq!(item.name, "CCTV1");
    }

    #[test]
    fn test_split_extinf_title() {
        let line = r#"#EXTINF:-1 group-title="a,b",CCTV-1 综合"#;
        assert_eq!(split_extinf_title(line), Some((r#"#EXTINF:-1 group-title="a,b""#, "CCTV-1 综合")));
        assert_eq!(split_extinf_title("#EXTINF:-1"), None);
    }

    #[test]
    fn test_parse_m3u() {
        let content = "#EXTM3U\n#EXTINF:-1 group-title=\"央视\",CCTV1\nhttp://x/1\n#EXTGRP:卫视\n#EXTINF:-1,湖南卫视\nhttp://x/2\n#EXTINF:-1,无分组\nhttp://x/3\nhttp://orphan\n";
        assert!(is_m3u(content));
        let items = parse_m3u(content, "默认分组");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].group, "央视");
        assert_eq!(items[1].group, "卫视");
        assert_eq!(items[1].url, "http://x/2");
        assert_eq!(items[2].group, "默认分组");
    }

    #[test]
    fn test_is_m3u() {
        assert!(!is_m3u("央视,#genre#\nCCTV1,http://x/1"));
        assert!(is_m3u("\n  #EXTM3U x-tvg-url=\"\"\n"));
        assert!(is_m3u("\u{feff}#EXTM3U\n#EXTINF:-1,CCTV1\nhttp://x/1\n"));
        assert!(is_m3u("# generated list\n#EXTINF:-1,CCTV1\nhttp://x/1\n"));
        assert!(!is_m3u("\u{feff}CCTV1,http://x/1\n"));
    }
}
