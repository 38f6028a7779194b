pub const M3U_HEADER: &str = "#EXTM3U";

macro_rules! to_m3u_non_empty_fields {
    ($entry:expr, $line:expr, $(($prop:ident, $field:expr)),*;) => {
        $(
           if !$entry.$prop.is_empty() {
                $line.push(format!("{}=\"{}\"", $field, $entry.$prop));
            }
         )*
    };
}

/// A channel parsed from a channel list source.
/// The tvg fields are only filled when the source itself was an annotated m3u.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelListItem {
    pub name: String,
    pub url: String,
    pub group: String,
    pub tvg_id: String,
    pub tvg_name: String,
    pub tvg_logo: String,
}

/// A playlist entry with the enriched metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct M3uPlaylistItem {
    pub title: String,
    pub url: String,
    pub epg_channel_id: String,
    pub epg_channel_name: String,
    pub logo: String,
    pub group: String,
}

impl M3uPlaylistItem {
    pub fn to_m3u(&self) -> String {
        let mut attributes: Vec<String> = Vec::with_capacity(4);
        to_m3u_non_empty_fields!(self, attributes,
            (epg_channel_id, "tvg-id"),
            (epg_channel_name, "tvg-name"),
            (logo, "tvg-logo"),
            (group, "group-title"););
        format!("#EXTINF:-1 {},{}\n{}", attributes.join(" "), self.title, self.url)
    }
}
