use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bilisub::{credentials, CaptionPipeline, Cli, Config, HttpTransport};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout only carries the saved path
    let ansi = std::io::stderr().is_terminal();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(cli.log_json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!cli.log_json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_ansi(ansi)
                .with_target(false)
                .with_writer(std::io::stderr)
        }))
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate()?;

    if cli.show_config {
        config.display();
        return Ok(ExitCode::SUCCESS);
    }

    let Some(url) = cli.url.as_deref() else {
        // clap enforces the URL unless --show-config was given
        anyhow::bail!("no video URL given");
    };

    let transport = HttpTransport::new(&config.api).context("Failed to create HTTP client")?;
    let credentials = credentials::from_config(&config.credentials, cli.cookie.clone());
    let pipeline = CaptionPipeline::new(&config, Box::new(transport), credentials)?;

    match pipeline.run(url).await {
        Ok(path) => {
            println!("Captions saved to: {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        // Already reported by the pipeline
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
