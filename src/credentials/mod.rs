//! Optional session credentials for the video platform.
//!
//! Credentials are best effort: a provider may hand back cookies, nothing, or
//! an error, and the pipeline treats the last two the same way.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::CredentialsConfig;

/// Cookie domain that credentials are collected for
pub const COOKIE_DOMAIN: &str = "bilibili.com";

/// Session cookies attached to every request of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    cookies: BTreeMap<String, String>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Parse a raw `Cookie` header value (`a=1; b=2`)
    pub fn from_header(header: &str) -> Self {
        let mut context = Self::new();
        for pair in header.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    context.insert(name, value.trim());
                }
            }
        }
        context
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Render as a `Cookie` request header value
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CredentialError {
    #[error("failed to read cookie file: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential source unavailable: {0}")]
    Unavailable(String),
}

/// Capability for obtaining an [`AuthContext`]
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Attempt to obtain credentials; `Ok(None)` means there are none
    async fn credentials(&self) -> Result<Option<AuthContext>, CredentialError>;

    /// Short description for diagnostics
    fn source_name(&self) -> String;
}

/// Always anonymous
pub struct NoCredentials;

#[async_trait]
impl CredentialProvider for NoCredentials {
    async fn credentials(&self) -> Result<Option<AuthContext>, CredentialError> {
        Ok(None)
    }

    fn source_name(&self) -> String {
        "none".to_string()
    }
}

/// Cookies supplied verbatim, e.g. from `--cookie` or the environment
pub struct StaticCookies {
    header: String,
}

impl StaticCookies {
    pub fn new(header: impl Into<String>) -> Self {
        Self { header: header.into() }
    }
}

#[async_trait]
impl CredentialProvider for StaticCookies {
    async fn credentials(&self) -> Result<Option<AuthContext>, CredentialError> {
        let context = AuthContext::from_header(&self.header);
        Ok((!context.is_empty()).then_some(context))
    }

    fn source_name(&self) -> String {
        "cookie header".to_string()
    }
}

/// Netscape `cookies.txt` export, as written by most browser extensions
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Collect the cookies for [`COOKIE_DOMAIN`] from a cookies.txt body
    pub fn parse(content: &str) -> AuthContext {
        let mut context = AuthContext::new();

        for line in content.lines() {
            // `#HttpOnly_` marks a real entry, any other `#` line is a comment
            let line = match line.strip_prefix("#HttpOnly_") {
                Some(rest) => rest,
                None if line.starts_with('#') => continue,
                None => line,
            };

            let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
            if fields.len() != 7 {
                continue;
            }

            let domain = fields[0].trim_start_matches('.');
            if domain == COOKIE_DOMAIN || domain.ends_with(&format!(".{}", COOKIE_DOMAIN)) {
                context.insert(fields[5], fields[6]);
            }
        }

        context
    }
}

#[async_trait]
impl CredentialProvider for CookieFile {
    async fn credentials(&self) -> Result<Option<AuthContext>, CredentialError> {
        let content = fs_err::tokio::read_to_string(&self.path).await?;
        let context = Self::parse(&content);
        Ok((!context.is_empty()).then_some(context))
    }

    fn source_name(&self) -> String {
        format!("cookie file {}", self.path.display())
    }
}

/// Pick the credential provider for this run.
///
/// Precedence: disabled, explicit cookie header, cookie file, anonymous.
pub fn from_config(config: &CredentialsConfig, cookie_header: Option<String>) -> Box<dyn CredentialProvider> {
    if config.disabled {
        return Box::new(NoCredentials);
    }

    if let Some(header) = cookie_header.filter(|h| !h.trim().is_empty()) {
        return Box::new(StaticCookies::new(header));
    }

    match &config.cookie_file {
        Some(path) => Box::new(CookieFile::new(path.clone())),
        None => Box::new(NoCredentials),
    }
}
