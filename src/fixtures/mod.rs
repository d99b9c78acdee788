//! Fixture builders.
//!
//! Fixtures are value objects describing a single pipeline stage or job. Each one renders itself
//! as a DSL fragment via `ToDsl`, which the `dsl` module then joins into a full definition.

mod file;
mod jdbc;
mod job;
mod trigger;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::probe::SqlHandle;

pub use file::{FileMode, FileSink, DEFAULT_SUFFIX};
pub use jdbc::{JdbcSink, DEFAULT_COLUMNS, DEFAULT_JDBC_TABLE};
pub use job::{FileJdbcJob, DEFAULT_DIRECTORY_NAME, DEFAULT_FILE_NAME, DEFAULT_NAMES, DEFAULT_TABLE_NAME};
pub use trigger::TriggerSource;

/// A type which can be rendered as a DSL fragment for submission to the runtime.
pub trait ToDsl {
    /// Render this fixture's configuration as a DSL fragment.
    fn to_dsl(&self) -> String;
}

/// Free-form `--key=value` options appended to a fixture's fragment, in insertion order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DslOptions(Vec<(String, String)>);

impl DslOptions {
    /// Set the given option, replacing any previous value for the same key.
    pub fn set(&mut self, key: impl Into<String>, val: impl Into<String>) {
        let (key, val) = (key.into(), val.into());
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = val,
            None => self.0.push((key, val)),
        }
    }

    /// Append the rendered options to the given fragment.
    pub(crate) fn render_into(&self, out: &mut String) {
        for (key, val) in self.0.iter() {
            out.push_str(&format!(" --{}={}", key, val));
        }
    }
}

/// A terminal pipeline stage.
#[derive(Clone, Debug)]
pub enum Sink {
    File(FileSink),
    Jdbc(JdbcSink),
}

impl ToDsl for Sink {
    fn to_dsl(&self) -> String {
        match self {
            Self::File(inner) => inner.to_dsl(),
            Self::Jdbc(inner) => inner.to_dsl(),
        }
    }
}

impl From<FileSink> for Sink {
    fn from(sink: FileSink) -> Self {
        Self::File(sink)
    }
}

impl From<JdbcSink> for Sink {
    fn from(sink: JdbcSink) -> Self {
        Self::Jdbc(sink)
    }
}

/// A factory of sink fixtures.
#[derive(Clone)]
pub struct Sinks {
    config: Arc<Config>,
}

impl Sinks {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// A file sink writing to `{dir}/{name}.out`.
    pub fn file(&self, dir: impl AsRef<Path>, name: impl Into<String>) -> FileSink {
        FileSink::new(dir, name)
    }

    /// A jdbc sink provisioned against the configured database.
    pub async fn jdbc(&self) -> Result<JdbcSink> {
        let sql = SqlHandle::connect(&self.config.database_url, self.config.database_max_connections).await?;
        Ok(JdbcSink::new().with_handle(sql))
    }
}

/// A factory of source fixtures.
#[derive(Clone, Copy, Default)]
pub struct Sources;

impl Sources {
    /// A trigger source emitting the given payload.
    pub fn trigger(&self, payload: impl Into<String>) -> TriggerSource {
        TriggerSource::new(payload)
    }
}

/// A factory of job fixtures.
#[derive(Clone)]
pub struct Jobs {
    config: Arc<Config>,
}

impl Jobs {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// A file to jdbc job reading from the default directory under the configured output dir.
    pub fn file_jdbc_job(&self) -> FileJdbcJob {
        FileJdbcJob::new(Path::new(&self.config.output_dir).join(DEFAULT_DIRECTORY_NAME))
    }
}
