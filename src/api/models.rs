use serde::Deserialize;

/// Common response wrapper of the JSON API
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,

    #[serde(default)]
    pub message: String,

    pub data: Option<T>,
}

/// One part of a multi-part upload, from `/x/player/pagelist`
#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub cid: u64,
    pub part: String,
}

/// `data` of `/x/player/wbi/v2`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerInfo {
    #[serde(default)]
    pub subtitle: Option<SubtitleInfo>,
}

impl PlayerInfo {
    /// Caption tracks in the order the API lists them
    pub fn tracks(&self) -> &[SubtitleTrack] {
        self.subtitle
            .as_ref()
            .and_then(|info| info.subtitles.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubtitleInfo {
    /// `null` and an absent list both mean the part has no captions
    #[serde(default)]
    pub subtitles: Option<Vec<SubtitleTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubtitleTrack {
    /// Language code, e.g. `ai-zh`
    #[serde(default)]
    pub lan: Option<String>,

    /// Resource location, frequently protocol-relative
    #[serde(default)]
    pub subtitle_url: Option<String>,
}

/// Downloaded caption resource
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptionDocument {
    #[serde(default)]
    pub body: Vec<CaptionEntry>,
}

/// One timed caption line
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptionEntry {
    /// Start offset in seconds
    #[serde(default)]
    pub from: f64,

    /// End offset in seconds
    #[serde(default)]
    pub to: f64,

    pub content: String,
}
