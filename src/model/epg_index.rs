use serde::Deserialize;

/// Entry of the EPG channel index json.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EpgIndexEntry {
    #[serde(deserialize_with = "crate::utils::deserialize_as_string")]
    pub channel_id: String,
    pub channel_name: String,
}

/// Entry of a logo index json.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LogoIndexEntry {
    pub logo_name: String,
    pub logo_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpgChannelRef {
    pub channel_id: String,
    pub channel_name: String,
}
