//! Remove leftovers of a previous run.

use std::sync::Arc;

use anyhow::Result;
use structopt::StructOpt;

use crate::config::Config;
use crate::fixtures::{Sinks, DEFAULT_TABLE_NAME};
use crate::runtime::admin::AdminClient;
use crate::runtime::RuntimeClient;
use crate::scenario::{CleanupGuard, DEFAULT_STREAM_NAME};

/// Remove leftovers of a previous run from the runtime and database.
#[derive(StructOpt)]
#[structopt(name = "cleanup")]
pub struct Cleanup {
    /// The table to drop.
    #[structopt(long, default_value = DEFAULT_TABLE_NAME)]
    table: String,
    /// The stream to destroy.
    #[structopt(long, default_value = DEFAULT_STREAM_NAME)]
    stream_name: String,
}

impl Cleanup {
    pub async fn run(&self, config: Arc<Config>) -> Result<()> {
        let runtime = RuntimeClient::new(AdminClient::new(&config)?, config.clone());
        let sink = Sinks::new(config.clone()).jdbc().await?.table_name(self.table.as_str());

        let mut guard = CleanupGuard::new();
        guard.track_stream(&self.stream_name);
        guard.track_job(&config.job_name);
        guard.track_table(&sink);
        guard.release(&runtime).await;
        tracing::info!(table = %self.table, stream = %self.stream_name, job = %config.job_name, "cleanup finished");
        Ok(())
    }
}
