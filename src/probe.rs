//! Verification probe.
//!
//! A thin handle over the database which the runtime's jobs & sinks write to. The harness only
//! ever reads single scalar values and drops tables it created.

use std::fmt;

use anyhow::{Context, Result};
use sqlx::any::{AnyPool, AnyPoolOptions};

use crate::error::HarnessError;

#[cfg(test)]
#[path = "probe_test.rs"]
mod probe_test;

/// A handle to the external database.
#[derive(Clone)]
pub struct SqlHandle {
    pool: AnyPool,
}

impl fmt::Debug for SqlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlHandle").field("size", &self.pool.size()).finish()
    }
}

impl SqlHandle {
    /// Connect to the database at the given URL.
    #[tracing::instrument(level = "debug", skip(url), err)]
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await
            .context("error connecting to database")?;
        Ok(Self { pool })
    }

    /// Check that the database is reachable.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("error pinging database")?;
        Ok(())
    }

    /// Execute a single statement, returning the number of affected rows.
    pub async fn execute(&self, stmt: &str) -> Result<u64> {
        let res = sqlx::query(stmt)
            .execute(&self.pool)
            .await
            .with_context(|| format!("error executing statement: {}", stmt))?;
        Ok(res.rows_affected())
    }

    /// Execute a single-row, single-column read query, returning its value.
    ///
    /// Zero rows yields `HarnessError::NotFound`, more than one yields
    /// `HarnessError::AmbiguousResult`.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub async fn query_scalar(&self, query: &str) -> Result<String> {
        let mut rows: Vec<String> = sqlx::query_scalar(query)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("error executing query: {}", query))?;
        match rows.len() {
            0 => Err(HarnessError::NotFound { query: query.into() }.into()),
            1 => Ok(rows.remove(0)),
            count => Err(HarnessError::AmbiguousResult { query: query.into(), rows: count }.into()),
        }
    }

    /// Query a scalar value and compare it for exact equality against the expected value.
    pub async fn verify_scalar(&self, query: &str, expected: &str) -> Result<()> {
        let actual = self.query_scalar(query).await?;
        if actual != expected {
            return Err(HarnessError::AssertionMismatch {
                expected: expected.into(),
                actual,
            }
            .into());
        }
        Ok(())
    }

    /// Drop the given table if it exists.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub async fn drop_table(&self, table: &str) -> Result<()> {
        validate_identifier(table)?;
        self.execute(&format!("DROP TABLE IF EXISTS {}", table)).await?;
        tracing::debug!(table, "dropped table");
        Ok(())
    }
}

/// Ensure the given name is safe to interpolate into SQL as a table identifier.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => (first.is_ascii_alphabetic() || first == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        None => false,
    };
    if !valid {
        return Err(HarnessError::InvalidInput(format!("invalid table name {:?}", name)).into());
    }
    Ok(())
}
