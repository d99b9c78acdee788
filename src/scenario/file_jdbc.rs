use anyhow::Result;

use super::Scenario;
use crate::dsl::PipelineDefinition;
use crate::fixtures::{FileMode, ToDsl, DEFAULT_FILE_NAME, DEFAULT_TABLE_NAME};
use crate::runtime::Runtime;
use crate::utils::unique_payload;

/// The name of the stream which writes the job's input file.
pub const DEFAULT_STREAM_NAME: &str = "dataSender";

/// Parameters of the file to jdbc scenario.
#[derive(Clone, Debug)]
pub struct FileJdbcParams {
    /// The table the job loads the file into.
    pub table: String,
    /// The name of the stream which writes the job's input file.
    pub stream_name: String,
}

impl Default for FileJdbcParams {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE_NAME.into(),
            stream_name: DEFAULT_STREAM_NAME.into(),
        }
    }
}

/// Verify that the `filejdbc` job reads a file and loads its contents into a table.
///
/// A stream writes a freshly generated payload to the job's input file, the job is submitted
/// and launched, and the table is expected to hold exactly that payload. The table is dropped
/// before the run, to clear leftovers, and after it regardless of outcome.
pub async fn file_jdbc<R: Runtime>(scenario: &mut Scenario<R>, params: FileJdbcParams) -> Result<()> {
    scenario.run(move |s| Box::pin(file_jdbc_body(s, params))).await
}

async fn file_jdbc_body<R: Runtime>(s: &mut Scenario<R>, params: FileJdbcParams) -> Result<()> {
    let sink = s.jdbc_sink(&params.table).await?;
    sink.sql()?.ping().await?;
    let data = unique_payload();
    tracing::info!(table = %params.table, data = %data, "running file to jdbc scenario");

    // Create a stream that writes to a file. This file will be used by the job.
    let job = s.jobs().file_jdbc_job().table_name(&params.table);
    let file = s.sinks().file(job.dir(), DEFAULT_FILE_NAME).mode(FileMode::Replace).binary(true);
    let trigger = s.sources().trigger(data.as_str());
    let definition = PipelineDefinition::builder().source(&trigger).sink(file).build().render(&s.config().delimiter);
    s.stream(&params.stream_name, &definition).await?;

    s.job(&job.to_dsl()).await?;
    s.job_launch().await?;

    let query = format!("SELECT data FROM {}", params.table);
    s.assert_scalar(&sink, &query, &data).await
}
