use crate::fixtures::JdbcSink;
use crate::probe::SqlHandle;
use crate::runtime::{Runtime, RuntimeClient};

/// A table created by a scenario, along with the handle used to drop it.
#[derive(Clone, Debug)]
struct TableTarget {
    table: String,
    /// `None` if the owning sink was never provisioned.
    sql: Option<SqlHandle>,
}

/// Teardown of every durable resource a scenario created.
///
/// Release never fails: teardown errors are logged and suppressed so that they cannot mask the
/// scenario's own outcome. Releasing is idempotent, tables are dropped with `IF EXISTS` on every
/// release while streams & jobs are only destroyed once.
#[derive(Debug, Default)]
pub struct CleanupGuard {
    tables: Vec<TableTarget>,
    streams: Vec<String>,
    jobs: Vec<String>,
}

impl CleanupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the table targeted by the given sink.
    pub fn track_table(&mut self, sink: &JdbcSink) {
        if self.tables.iter().any(|target| target.table == sink.table()) {
            return;
        }
        self.tables.push(TableTarget {
            table: sink.table().into(),
            sql: sink.handle().cloned(),
        });
    }

    /// Track a stream submitted to the runtime.
    pub fn track_stream(&mut self, name: &str) {
        if !self.streams.iter().any(|stream| stream == name) {
            self.streams.push(name.into());
        }
    }

    /// Track a job submitted to the runtime.
    pub fn track_job(&mut self, name: &str) {
        if !self.jobs.iter().any(|job| job == name) {
            self.jobs.push(name.into());
        }
    }

    /// The names of all tracked tables.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|target| target.table.as_str())
    }

    /// True if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.streams.is_empty() && self.jobs.is_empty()
    }

    /// Remove every tracked resource.
    ///
    /// Streams are destroyed first so that nothing writes to a table after it is dropped.
    pub async fn release<R: Runtime>(&mut self, runtime: &RuntimeClient<R>) {
        for name in self.streams.drain(..) {
            if let Err(err) = runtime.destroy_stream(&name).await {
                tracing::warn!(error = ?err, stream = %name, "error destroying stream during cleanup");
            }
        }
        for name in self.jobs.drain(..) {
            if let Err(err) = runtime.destroy_job(&name).await {
                tracing::warn!(error = ?err, job = %name, "error destroying job during cleanup");
            }
        }
        for target in self.tables.iter() {
            let sql = match &target.sql {
                Some(sql) => sql,
                None => {
                    tracing::debug!(table = %target.table, "no database handle for table, skipping cleanup");
                    continue;
                }
            };
            if let Err(err) = sql.drop_table(&target.table).await {
                tracing::warn!(error = ?err, table = %target.table, "error dropping table during cleanup");
            }
        }
    }
}
