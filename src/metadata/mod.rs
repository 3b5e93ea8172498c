use crate::api::{ApiClient, ApiError, TransportError};
use crate::credentials::AuthContext;
use crate::reference::VideoReference;

/// The part of a video the captions belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMetadata {
    /// Content identifier (`cid`); only meaningful for the reference it was resolved from
    pub cid: u64,

    /// Part title as shown on the site
    pub title: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ResolutionError {
    #[error("request failed: {0}")]
    TransportFailure(#[source] TransportError),

    #[error("video info rejected by the API (code {code}): {message}")]
    UpstreamRejected { code: i64, message: String },

    #[error("video info response is malformed: {0}")]
    MalformedResponse(String),

    #[error("video has no part p={0}")]
    SegmentNotFound(u32),
}

impl From<ApiError> for ResolutionError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(e) => Self::TransportFailure(e),
            ApiError::Rejected { code, message } => Self::UpstreamRejected { code, message },
            ApiError::Malformed(detail) => Self::MalformedResponse(detail),
        }
    }
}

/// Resolve the content identifier and title of the referenced part.
///
/// Issues exactly one request. If the part list contains the requested
/// number more than once, the first entry wins.
pub async fn resolve(
    client: &ApiClient,
    reference: &VideoReference,
    auth: Option<&AuthContext>,
) -> Result<SegmentMetadata, ResolutionError> {
    let pages = client.page_list(&reference.bvid, auth).await?;
    tracing::debug!("{} lists {} part(s)", reference.bvid, pages.len());

    let wanted = reference.page.get();
    pages
        .into_iter()
        .find(|page| page.page == wanted)
        .map(|page| SegmentMetadata {
            cid: page.cid,
            title: page.part,
        })
        .ok_or(ResolutionError::SegmentNotFound(wanted))
}
