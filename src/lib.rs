//! bilisub - extract the captions of a Bilibili video part
//!
//! This library resolves a video URL to one part of the upload, locates the
//! part's first caption track and writes its lines to a text file. Session
//! cookies are an injected, optional capability.

pub mod api;
pub mod captions;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod reference;
pub mod utils;

pub use api::{ApiClient, Endpoints, HttpTransport, Transport, TransportError};
pub use captions::{CaptionLocation, LocationError, MaterializationError, OutputOptions};
pub use cli::{Cli, OutputFormat};
pub use config::Config;
pub use credentials::{AuthContext, CredentialProvider};
pub use metadata::{ResolutionError, SegmentMetadata};
pub use pipeline::{CaptionPipeline, PipelineError, Stage};
pub use reference::{ParseError, VideoReference};

/// Result type used by the binary and setup code
pub type Result<T> = anyhow::Result<T>;
