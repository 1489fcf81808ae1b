//! # uitest
//!
//! Command-line companion to the uitest library: inspect and crop reference
//! images without writing a test.
//!
//! ## Architecture
//!
//! This is Layer 3 - the binary on top of:
//! - uitest-core: Configuration and regions
//! - uitest-frame: Image loading, cropping and saving

use anyhow::Context;
use uitest::cli::{self, Command};
use uitest::Config;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = cli::parse(&args)?;

    let config = match &invocation.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if invocation.command != Command::Help {
        tracing::debug!("uitest v{} running {:?}", env!("CARGO_PKG_VERSION"), invocation.command);
    }

    let stdout = std::io::stdout();
    cli::run(&invocation.command, &config, &mut stdout.lock())
}
