use std::fmt;
use std::path::PathBuf;

use crate::api::{ApiClient, Endpoints, Transport};
use crate::captions::{self, LocationError, MaterializationError, OutputOptions};
use crate::config::Config;
use crate::credentials::{AuthContext, CredentialProvider};
use crate::metadata::{self, ResolutionError};
use crate::reference::{self, ParseError};

/// Stages of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Credentials,
    Parse,
    Metadata,
    Locate,
    Materialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Credentials => "credentials",
            Stage::Parse => "parse",
            Stage::Metadata => "metadata",
            Stage::Locate => "locate",
            Stage::Materialize => "materialize",
        };
        f.write_str(name)
    }
}

/// First failure of a run; the run stops there
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Metadata(#[from] ResolutionError),

    #[error(transparent)]
    Locate(#[from] LocationError),

    #[error(transparent)]
    Materialize(#[from] MaterializationError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Parse(_) => Stage::Parse,
            PipelineError::Metadata(_) => Stage::Metadata,
            PipelineError::Locate(_) => Stage::Locate,
            PipelineError::Materialize(_) => Stage::Materialize,
        }
    }
}

/// Main caption pipeline: one URL in, one caption file out
pub struct CaptionPipeline {
    client: ApiClient,
    credentials: Box<dyn CredentialProvider>,
    output: OutputOptions,
}

impl CaptionPipeline {
    /// Create a new pipeline from configuration and injected capabilities
    pub fn new(
        config: &Config,
        transport: Box<dyn Transport>,
        credentials: Box<dyn CredentialProvider>,
    ) -> crate::Result<Self> {
        let endpoints = Endpoints::new(&config.api.base_url)?;

        Ok(Self {
            client: ApiClient::new(transport, endpoints),
            credentials,
            output: OutputOptions::from_config(&config.output),
        })
    }

    /// Run every stage for `raw_url` and return the written file.
    ///
    /// Each stage logs one line on success; the first failing stage logs one
    /// error line and ends the run without touching the output directory.
    pub async fn run(&self, raw_url: &str) -> Result<PathBuf, PipelineError> {
        let result = self.run_stages(raw_url).await;
        if let Err(err) = &result {
            tracing::error!("[{}] {}", err.stage(), err);
        }
        result
    }

    async fn run_stages(&self, raw_url: &str) -> Result<PathBuf, PipelineError> {
        tracing::info!("Processing URL: {}", raw_url);

        let auth = self.acquire_credentials().await;
        let auth = auth.as_ref();

        let reference = reference::parse(raw_url)?;
        tracing::info!("[{}] video {}", Stage::Parse, reference);

        let segment = metadata::resolve(&self.client, &reference, auth).await?;
        tracing::info!(
            "[{}] cid={} title='{}'",
            Stage::Metadata,
            segment.cid,
            segment.title
        );

        let location = captions::locate(&self.client, &reference, &segment, auth).await?;
        tracing::info!(
            "[{}] caption track {} ({})",
            Stage::Locate,
            location.url,
            location.language.as_deref().unwrap_or("unknown language")
        );

        let path =
            captions::materialize(&self.client, &location, &segment.title, auth, &self.output)
                .await?;
        tracing::info!("[{}] saved to {}", Stage::Materialize, path.display());

        Ok(path)
    }

    /// Ask the credential provider; any failure degrades to anonymous requests
    async fn acquire_credentials(&self) -> Option<AuthContext> {
        let source = self.credentials.source_name();

        match self.credentials.credentials().await {
            Ok(Some(context)) if !context.is_empty() => {
                tracing::info!(
                    "[{}] using {} cookie(s) from {}",
                    Stage::Credentials,
                    context.len(),
                    source
                );
                Some(context)
            }
            Ok(_) => {
                tracing::info!(
                    "[{}] no cookies from {}, continuing anonymously",
                    Stage::Credentials,
                    source
                );
                None
            }
            Err(err) => {
                tracing::warn!(
                    "[{}] {} unavailable ({}), continuing anonymously",
                    Stage::Credentials,
                    source,
                    err
                );
                None
            }
        }
    }
}
