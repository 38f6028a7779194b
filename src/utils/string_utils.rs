use crate::utils::CONSTANTS;
use quick_xml::escape::resolve_predefined_entity;
use std::borrow::Cow;

pub fn sanitize_sensitive_info(query: &str) -> Cow<'_, str> {
    CONSTANTS.re_credentials.replace_all(query, "$1***")
}

pub fn get_trimmed_string(value: Option<&str>) -> Option<String> {
    if let Some(v) = value {
        let trimmed = v.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}

pub fn collapse_whitespace(text: &str) -> String {
    CONSTANTS.re_whitespace.replace_all(text.trim(), " ").into_owned()
}

fn resolve_html_entity(entity: &str) -> Option<&'static str> {
    resolve_predefined_entity(entity).or(match entity {
        "nbsp" => Some(" "),
        "middot" => Some("·"),
        "hellip" => Some("…"),
        "ndash" => Some("–"),
        "mdash" => Some("—"),
        "ldquo" => Some("“"),
        "rdquo" => Some("”"),
        "lsquo" => Some("‘"),
        "rsquo" => Some("’"),
        "copy" => Some("©"),
        _ => None,
    })
}

fn resolve_char_reference(reference: &str) -> Option<char> {
    let code = match reference.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => reference.parse::<u32>().ok()?,
    };
    char::from_u32(code).filter(|c| *c != '\0')
}

/// Decodes the entities of a raw html text chunk.
/// Unknown entities and a bare `&` are kept verbatim.
pub fn decode_html_text(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    CONSTANTS.re_html_entity.replace_all(raw, |caps: &regex::Captures| {
        let entity = &caps[1];
        let decoded = match entity.strip_prefix('#') {
            Some(reference) => resolve_char_reference(reference).map(String::from),
            None => resolve_html_entity(entity).map(String::from),
        };
        decoded.unwrap_or_else(|| caps[0].to_string())
    })
}

#[cfg(test)]
mod tests {
    use crate::utils::{collapse_whitespace, decode_html_text, get_trimmed_string, sanitize_sensitive_info};

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_sensitive_info("http://a.b/list.txt?pwd=123&x=1"), "http://a.b/list.txt?pwd=***&x=1");
        assert_eq!(sanitize_sensitive_info("http://a.b/e.xml"), "http://a.b/e.xml");
    }

    #[test]
    fn test_trimmed_string() {
        assert_eq!(get_trimmed_string(Some("  a ")), Some("a".to_string()));
        assert_eq!(get_trimmed_string(Some("   ")), None);
        assert_eq!(get_trimmed_string(None), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  CCTV \t 1  "), "CCTV 1");
    }

    #[test]
    fn test_decode_html_text() {
        assert_eq!(decode_html_text("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_html_text("a&nbsp;b"), "a b");
        assert_eq!(decode_html_text("&#20013;"), "中");
        assert_eq!(decode_html_text("no entities"), "no entities");
        assert_eq!(decode_html_text("broken &unknown; entity"), "broken &unknown; entity");
        assert_eq!(decode_html_text("&#x4E2D;&#0;"), "中&#0;");
    }

    #[test]
    fn test_decode_html_text_with_bare_ampersand() {
        assert_eq!(decode_html_text("Tom & Jerry &amp; friends"), "Tom & Jerry & friends");
        assert_eq!(decode_html_text("R&D &lt;新闻&gt; &unknown; &"), "R&D <新闻> &unknown; &");
    }
}
