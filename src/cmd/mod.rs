//! The harness CLI.

pub mod cleanup;
pub mod file_jdbc;

use std::sync::Arc;

use anyhow::{Context, Result};
use structopt::StructOpt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

/// The Hadron integration test harness.
#[derive(StructOpt)]
#[structopt(name = "hadron-itest")]
pub struct Itest {
    #[structopt(subcommand)]
    action: ItestSubcommands,
    /// Enable debug logging.
    #[structopt(short)]
    verbose: bool,
    /// Set the URL of the runtime's admin server.
    #[structopt(long)]
    admin_url: Option<String>,
    /// Set the URL of the database which the runtime writes to.
    #[structopt(long)]
    database_url: Option<String>,
}

impl Itest {
    pub async fn run(self) -> Result<()> {
        let config = self.config()?;

        // Initialize logging based on CLI config.
        let filter_layer = if self.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_new(&config.rust_log).context("invalid RUST_LOG directives")?
        };
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().with_target(true).with_level(true).with_ansi(true))
            .try_init()
            .context("error initializing logging/tracing system")?;

        tracing::info!(admin_url = %config.admin_url, "starting hadron-itest");
        match &self.action {
            ItestSubcommands::FileJdbc(inner) => inner.run(config).await,
            ItestSubcommands::Cleanup(inner) => inner.run(config).await,
        }
    }

    /// Build the runtime config from the environment, overridden by CLI flags.
    fn config(&self) -> Result<Arc<Config>> {
        let mut config = Config::new()?;
        if let Some(url) = &self.admin_url {
            config.admin_url = url.clone();
        }
        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
        Ok(Arc::new(config))
    }
}

#[derive(StructOpt)]
enum ItestSubcommands {
    /// Verify that the filejdbc job loads a file into a table.
    #[structopt(name = "file-jdbc")]
    FileJdbc(file_jdbc::FileJdbc),
    /// Remove leftovers of a previous run from the runtime and database.
    #[structopt(name = "cleanup")]
    Cleanup(cleanup::Cleanup),
}
