//! Run the file to jdbc scenario.

use std::sync::Arc;

use anyhow::Result;
use structopt::StructOpt;

use crate::config::Config;
use crate::fixtures::DEFAULT_TABLE_NAME;
use crate::runtime::admin::AdminClient;
use crate::scenario::{self, FileJdbcParams, Scenario, DEFAULT_STREAM_NAME};

/// Verify that the filejdbc job loads a file into a table.
#[derive(StructOpt)]
#[structopt(name = "file-jdbc")]
pub struct FileJdbc {
    /// The table the job loads the file into.
    #[structopt(long, default_value = DEFAULT_TABLE_NAME)]
    table: String,
    /// The name of the stream which writes the job's input file.
    #[structopt(long, default_value = DEFAULT_STREAM_NAME)]
    stream_name: String,
}

impl FileJdbc {
    pub async fn run(&self, config: Arc<Config>) -> Result<()> {
        let runtime = AdminClient::new(&config)?;
        let mut scenario = Scenario::new(config, runtime);
        let params = FileJdbcParams {
            table: self.table.clone(),
            stream_name: self.stream_name.clone(),
        };
        scenario::file_jdbc(&mut scenario, params).await?;
        tracing::info!(table = %self.table, "file to jdbc scenario passed");
        Ok(())
    }
}
