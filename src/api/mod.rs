use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

pub mod models;

use crate::config::ApiConfig;
use crate::credentials::AuthContext;
use models::{CaptionDocument, Envelope, PageInfo, PlayerInfo};

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
}

/// Errors of a single API call, before a stage gives them meaning
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("API returned code {code}: {message}")]
    Rejected { code: i64, message: String },

    #[error("unexpected response shape: {0}")]
    Malformed(String),
}

/// Blocking-in-sequence GET capability; one call per pipeline stage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` and return the response body.
    ///
    /// `cookie` is a ready `Cookie` header value. Non-success HTTP statuses are
    /// reported as [`TransportError::Status`].
    async fn get(&self, url: Url, cookie: Option<String>) -> Result<String, TransportError>;
}

/// [`Transport`] backed by reqwest
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&config.user_agent, "User-Agent")?);
        headers.insert(REFERER, header_value(&config.referer, "Referer")?);
        headers.insert(ORIGIN, header_value(&config.origin, "Origin")?);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { client })
    }
}

fn header_value(value: &str, name: &'static str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value).map_err(|_| TransportError::InvalidHeader(name))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: Url, cookie: Option<String>) -> Result<String, TransportError> {
        let mut request = self.client.get(url.clone());

        if let Some(cookie) = cookie {
            request = request.header(COOKIE, header_value(&cookie, "Cookie")?);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Endpoint layout of the API
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base_url)?,
        })
    }

    /// Part list of a video
    pub fn page_list(&self, bvid: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path("/x/player/pagelist");
        url.query_pairs_mut().clear().append_pair("bvid", bvid);
        url
    }

    /// Player info for one part, carrying its caption tracks
    pub fn player_info(&self, bvid: &str, cid: u64) -> Url {
        let mut url = self.base.clone();
        url.set_path("/x/player/wbi/v2");
        url.query_pairs_mut()
            .clear()
            .append_pair("bvid", bvid)
            .append_pair("cid", &cid.to_string());
        url
    }
}

/// Typed access to the endpoints the pipeline needs
pub struct ApiClient {
    transport: Box<dyn Transport>,
    endpoints: Endpoints,
}

impl ApiClient {
    pub fn new(transport: Box<dyn Transport>, endpoints: Endpoints) -> Self {
        Self { transport, endpoints }
    }

    pub async fn page_list(
        &self,
        bvid: &str,
        auth: Option<&AuthContext>,
    ) -> Result<Vec<PageInfo>, ApiError> {
        let url = self.endpoints.page_list(bvid);
        self.get_envelope(url, auth).await
    }

    pub async fn player_info(
        &self,
        bvid: &str,
        cid: u64,
        auth: Option<&AuthContext>,
    ) -> Result<PlayerInfo, ApiError> {
        let url = self.endpoints.player_info(bvid, cid);
        self.get_envelope(url, auth).await
    }

    /// Caption documents are plain JSON, not wrapped in an envelope
    pub async fn caption_document(
        &self,
        url: &Url,
        auth: Option<&AuthContext>,
    ) -> Result<CaptionDocument, ApiError> {
        let body = self.fetch(url.clone(), auth).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    async fn fetch(&self, url: Url, auth: Option<&AuthContext>) -> Result<String, ApiError> {
        tracing::debug!(
            "GET {} ({})",
            url,
            if auth.is_some() { "with cookies" } else { "anonymous" }
        );

        let cookie = auth.map(AuthContext::cookie_header);
        Ok(self.transport.get(url, cookie).await?)
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        url: Url,
        auth: Option<&AuthContext>,
    ) -> Result<T, ApiError> {
        let body = self.fetch(url, auth).await?;
        decode_envelope(&body)
    }
}

/// Decode a `{code, message, data}` response, checking the embedded code
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;

    if envelope.code != 0 {
        return Err(ApiError::Rejected {
            code: envelope.code,
            message: envelope.message,
        });
    }

    envelope
        .data
        .ok_or_else(|| ApiError::Malformed("response has no `data` field".to_string()))
}
