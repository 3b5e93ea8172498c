use url::Url;

pub mod materializer;

pub use materializer::{materialize, MaterializationError, OutputOptions};

use crate::api::{ApiClient, ApiError, TransportError};
use crate::credentials::AuthContext;
use crate::metadata::SegmentMetadata;
use crate::reference::VideoReference;

/// Absolute location of a caption resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionLocation {
    pub url: Url,

    /// Language of the selected track, when the API reports it
    pub language: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum LocationError {
    #[error("request failed: {0}")]
    TransportFailure(#[source] TransportError),

    #[error("player info rejected by the API (code {code}): {message}")]
    UpstreamRejected { code: i64, message: String },

    #[error("player info response is malformed: {0}")]
    MalformedResponse(String),

    #[error("no captions are available for this part")]
    NoCaptionsAvailable,
}

impl From<ApiError> for LocationError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(e) => Self::TransportFailure(e),
            ApiError::Rejected { code, message } => Self::UpstreamRejected { code, message },
            ApiError::Malformed(detail) => Self::MalformedResponse(detail),
        }
    }
}

/// Find the caption resource of a resolved part.
///
/// The first listed track is used; there is no language negotiation.
pub async fn locate(
    client: &ApiClient,
    reference: &VideoReference,
    metadata: &SegmentMetadata,
    auth: Option<&AuthContext>,
) -> Result<CaptionLocation, LocationError> {
    let info = client.player_info(&reference.bvid, metadata.cid, auth).await?;

    let tracks = info.tracks();
    tracing::debug!("cid {} has {} caption track(s)", metadata.cid, tracks.len());

    let track = tracks.first().ok_or(LocationError::NoCaptionsAvailable)?;

    let raw = track
        .subtitle_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .ok_or_else(|| LocationError::MalformedResponse("caption track has no subtitle_url".to_string()))?;

    let normalized = normalize_location(raw);
    let url = Url::parse(&normalized).map_err(|e| {
        LocationError::MalformedResponse(format!("caption location `{}` is not a URL: {}", normalized, e))
    })?;

    Ok(CaptionLocation {
        url,
        language: track.lan.clone(),
    })
}

/// Turn a protocol-relative location (`//host/path`) into an `https:` one.
/// Every other form is returned unchanged.
pub fn normalize_location(raw: &str) -> String {
    if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Endpoints, MockTransport};
    use crate::reference;

    fn client_returning(body: &'static str) -> ApiClient {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|url, _| {
                url.path() == "/x/player/wbi/v2"
                    && url.query() == Some("bvid=BVxyz123&cid=200")
            })
            .times(1)
            .returning(move |_, _| Ok(body.to_string()));
        ApiClient::new(
            Box::new(transport),
            Endpoints::new("https://api.bilibili.com").unwrap(),
        )
    }

    fn part_two() -> (VideoReference, SegmentMetadata) {
        (
            reference::parse("https://example.com/video/BVxyz123?p=2").unwrap(),
            SegmentMetadata {
                cid: 200,
                title: "Part2".to_string(),
            },
        )
    }

    #[test]
    fn test_normalize_location() {
        assert_eq!(
            normalize_location("//aisubtitle.hdslb.com/bfs/a.json"),
            "https://aisubtitle.hdslb.com/bfs/a.json"
        );
        assert_eq!(
            normalize_location("http://i0.hdslb.com/bfs/a.json"),
            "http://i0.hdslb.com/bfs/a.json"
        );
        assert_eq!(normalize_location("/relative/a.json"), "/relative/a.json");
    }

    #[tokio::test]
    async fn test_locate_first_track() {
        let client = client_returning(
            r#"{"code":0,"data":{"subtitle":{"subtitles":[
                {"lan":"ai-zh","subtitle_url":"//aisubtitle.hdslb.com/bfs/zh.json"},
                {"lan":"ai-en","subtitle_url":"//aisubtitle.hdslb.com/bfs/en.json"}
            ]}}}"#,
        );
        let (reference, metadata) = part_two();

        let location = locate(&client, &reference, &metadata, None).await.unwrap();
        assert_eq!(location.url.as_str(), "https://aisubtitle.hdslb.com/bfs/zh.json");
        assert_eq!(location.language.as_deref(), Some("ai-zh"));
    }

    #[tokio::test]
    async fn test_locate_absolute_url_unchanged() {
        let client = client_returning(
            r#"{"code":0,"data":{"subtitle":{"subtitles":[{"subtitle_url":"http://i0.hdslb.com/bfs/a.json"}]}}}"#,
        );
        let (reference, metadata) = part_two();

        let location = locate(&client, &reference, &metadata, None).await.unwrap();
        assert_eq!(location.url.as_str(), "http://i0.hdslb.com/bfs/a.json");
    }

    #[tokio::test]
    async fn test_locate_no_captions() {
        let client = client_returning(r#"{"code":0,"data":{"subtitle":{"subtitles":[]}}}"#);
        let (reference, metadata) = part_two();

        let err = locate(&client, &reference, &metadata, None).await.unwrap_err();
        assert!(matches!(err, LocationError::NoCaptionsAvailable));
    }

    #[tokio::test]
    async fn test_locate_null_track_list_means_no_captions() {
        let client = client_returning(r#"{"code":0,"data":{"subtitle":{"subtitles":null}}}"#);
        let (reference, metadata) = part_two();

        let err = locate(&client, &reference, &metadata, None).await.unwrap_err();
        assert!(matches!(err, LocationError::NoCaptionsAvailable));
    }

    #[tokio::test]
    async fn test_locate_missing_subtitle_section_means_no_captions() {
        let client = client_returning(r#"{"code":0,"data":{"aid":1}}"#);
        let (reference, metadata) = part_two();

        let err = locate(&client, &reference, &metadata, None).await.unwrap_err();
        assert!(matches!(err, LocationError::NoCaptionsAvailable));
    }

    #[tokio::test]
    async fn test_locate_track_without_url_is_malformed() {
        let client = client_returning(
            r#"{"code":0,"data":{"subtitle":{"subtitles":[{"lan":"zh-CN","subtitle_url":""}]}}}"#,
        );
        let (reference, metadata) = part_two();

        let err = locate(&client, &reference, &metadata, None).await.unwrap_err();
        assert!(matches!(err, LocationError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_locate_relative_url_is_malformed() {
        let client = client_returning(
            r#"{"code":0,"data":{"subtitle":{"subtitles":[{"subtitle_url":"/bfs/a.json"}]}}}"#,
        );
        let (reference, metadata) = part_two();

        let err = locate(&client, &reference, &metadata, None).await.unwrap_err();
        assert!(matches!(err, LocationError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_locate_upstream_rejected() {
        let client = client_returning(r#"{"code":-403,"message":"访问权限不足"}"#);
        let (reference, metadata) = part_two();

        let err = locate(&client, &reference, &metadata, None).await.unwrap_err();
        assert!(matches!(err, LocationError::UpstreamRejected { code: -403, .. }));
    }
}
