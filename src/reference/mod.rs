use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::num::NonZeroU32;

static BVID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(BV[a-zA-Z0-9]+)").expect("valid bvid pattern"));

static PAGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]p=(\d+)").expect("valid page pattern"));

/// A video part as addressed by the user's URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    /// Platform video identifier (`BV...`)
    pub bvid: String,

    /// 1-based part number, `?p=` in the URL
    pub page: NonZeroU32,
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (p={})", self.bvid, self.page)
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("no video identifier (BV...) found in `{0}`")]
    NoIdentifierFound(String),

    #[error("part number `{0}` is not a positive integer")]
    InvalidSegment(String),
}

/// Parse a video URL into a [`VideoReference`].
///
/// The identifier is searched for in the part of the input before any query
/// or fragment, the part number in the query. No I/O is performed.
pub fn parse(raw_url: &str) -> Result<VideoReference, ParseError> {
    let raw_url = raw_url.trim();
    let (location, query) = split_query(raw_url);

    let bvid = BVID_PATTERN
        .captures(location)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ParseError::NoIdentifierFound(raw_url.to_string()))?;

    let page = match PAGE_PATTERN.captures(query).and_then(|caps| caps.get(1)) {
        Some(digits) => digits
            .as_str()
            .parse::<NonZeroU32>()
            .map_err(|_| ParseError::InvalidSegment(digits.as_str().to_string()))?,
        None => NonZeroU32::MIN,
    };

    Ok(VideoReference { bvid, page })
}

/// Split input into (everything before `?`, the `?query` without fragment)
fn split_query(raw: &str) -> (&str, &str) {
    let without_fragment = raw.split('#').next().unwrap_or(raw);
    match without_fragment.find('?') {
        Some(idx) => without_fragment.split_at(idx),
        None => (without_fragment, ""),
    }
}
