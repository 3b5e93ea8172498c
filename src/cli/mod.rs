use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "bilisub",
    about = "Extract the captions of a Bilibili video part into a text file",
    version,
    long_about = "Resolves the requested part of a Bilibili video, locates its first caption track and saves the caption lines to <part title>.txt. Session cookies are optional and only widen what the API returns."
)]
pub struct Cli {
    /// Video URL, e.g. https://www.bilibili.com/video/BV1xx411c7mD?p=2
    #[arg(value_name = "URL", required_unless_present = "show_config")]
    pub url: Option<String>,

    /// Directory to write the caption file to (current directory if not specified)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Caption file format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Raw cookie header to authenticate with (`SESSDATA=...; bili_jct=...`)
    #[arg(long, value_name = "COOKIES", env = "BILISUB_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Netscape cookies.txt export to read session cookies from
    #[arg(long, value_name = "FILE")]
    pub cookie_file: Option<PathBuf>,

    /// Send every request anonymously
    #[arg(long)]
    pub no_cookies: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Emit log lines as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.directory = Some(dir.clone());
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(file) = &self.cookie_file {
            config.credentials.cookie_file = Some(file.clone());
        }
        if self.no_cookies {
            config.credentials.disabled = true;
        }
        if let Some(timeout) = self.timeout {
            config.api.timeout_secs = timeout;
        }
    }

    /// Default log filter for the requested verbosity
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "bilisub=debug"
        } else if self.quiet {
            "bilisub=warn"
        } else {
            "bilisub=info"
        }
    }
}

#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One caption per line
    #[default]
    Text,
    /// SRT subtitle format
    Srt,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Srt => "srt",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Srt => write!(f, "srt"),
        }
    }
}
