use zhconv::{zhconv, Variant};

/// Key used to match channel names against the epg and logo indexes:
/// trimmed, lowercase and in simplified chinese script.
pub fn normalize_channel_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    zhconv(&trimmed.to_lowercase(), Variant::ZhCN)
}

#[cfg(test)]
mod tests {
    use super::normalize_channel_name;

    #[test]
    fn test_normalize_channel_name() {
        assert_eq!(normalize_channel_name("  CCTV1 "), "cctv1");
        assert_eq!(normalize_channel_name("翡翠臺"), normalize_channel_name("翡翠台"));
        assert_eq!(normalize_channel_name("鳳凰衛視"), "凤凰卫视");
        assert_eq!(normalize_channel_name(""), "");
        assert_eq!(normalize_channel_name("   "), "");
    }
}
