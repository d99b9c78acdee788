use anyhow::Result;

use super::{DslOptions, ToDsl};
use crate::error::HarnessError;
use crate::probe::SqlHandle;

/// The table written to by a jdbc sink when none is given.
pub const DEFAULT_JDBC_TABLE: &str = "jdbctest";
/// The columns written to by a jdbc sink when none are given.
pub const DEFAULT_COLUMNS: &str = "payload";

/// A sink which writes each message as a row of a database table.
///
/// Once provisioned via `Sinks::jdbc`, the sink also carries a handle to the database so that
/// scenarios may verify and clean up what the runtime wrote.
#[derive(Clone, Debug)]
pub struct JdbcSink {
    table: String,
    columns: String,
    initialize_database: bool,
    options: DslOptions,
    sql: Option<SqlHandle>,
}

impl Default for JdbcSink {
    fn default() -> Self {
        Self::new()
    }
}

impl JdbcSink {
    /// A jdbc sink with no database handle.
    pub fn new() -> Self {
        Self {
            table: DEFAULT_JDBC_TABLE.into(),
            columns: DEFAULT_COLUMNS.into(),
            initialize_database: true,
            options: DslOptions::default(),
            sql: None,
        }
    }

    /// Attach the database handle used for verification & cleanup.
    pub fn with_handle(mut self, sql: SqlHandle) -> Self {
        self.sql = Some(sql);
        self
    }

    /// Fix the target table.
    pub fn table_name(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the comma separated columns written by the sink.
    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Have the runtime create the target table if it does not exist.
    pub fn initialize_database(mut self, initialize: bool) -> Self {
        self.initialize_database = initialize;
        self
    }

    /// Set an additional option.
    pub fn option(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.options.set(key, val);
        self
    }

    /// The target table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The database handle, if this sink has been provisioned.
    pub fn handle(&self) -> Option<&SqlHandle> {
        self.sql.as_ref()
    }

    /// The database handle, failing if this sink was never provisioned.
    pub fn sql(&self) -> Result<&SqlHandle> {
        self.sql.as_ref().ok_or_else(|| HarnessError::Unprovisioned(self.table.clone()).into())
    }

    /// Drop the given table from the backing database.
    ///
    /// This is a no-op when the table does not exist or when the sink was never provisioned.
    pub async fn drop_table(&self, table: &str) -> Result<()> {
        match &self.sql {
            Some(sql) => sql.drop_table(table).await,
            None => {
                tracing::debug!(table, "jdbc sink has no database handle, skipping drop");
                Ok(())
            }
        }
    }
}

impl ToDsl for JdbcSink {
    fn to_dsl(&self) -> String {
        let mut out = format!(
            "jdbc --tableName={} --columns={} --initializeDatabase={}",
            self.table, self.columns, self.initialize_database
        );
        self.options.render_into(&mut out);
        out
    }
}
