//! Harness error abstractions.

use std::time::Duration;

use thiserror::Error;

/// Harness error variants.
///
/// Operations throughout this crate return `anyhow::Result`, with one of these variants as the
/// root cause where the failure is part of the harness's own contract. Callers which need to
/// branch on the failure kind should `downcast` the error.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The runtime did not report the stream as deployed within the wait budget.
    #[error("stream {name} was not deployed within {waited:?}")]
    SubmissionTimeout { name: String, waited: Duration },
    /// The runtime reported that the stream failed to deploy.
    #[error("stream {name} failed to deploy, status {status}")]
    DeploymentFailed { name: String, status: String },
    /// A verification query returned zero rows.
    #[error("query returned no rows: {query}")]
    NotFound { query: String },
    /// A verification query returned more than one row.
    #[error("query returned {rows} rows, expected exactly 1: {query}")]
    AmbiguousResult { query: String, rows: usize },
    /// A verification query returned a value other than the expected one.
    #[error("assertion mismatch, expected {expected:?} got {actual:?}")]
    AssertionMismatch { expected: String, actual: String },
    /// A job launch was requested before any job was submitted.
    #[error("no job has been submitted, nothing to launch")]
    NoJobSubmitted,
    /// The job's latest execution finished in a non-successful state.
    #[error("job {name} execution finished with status {status}")]
    JobFailed { name: String, status: String },
    /// The job's latest execution did not complete within the wait budget.
    #[error("job {name} did not complete within {waited:?}")]
    LaunchTimeout { name: String, waited: Duration },
    /// A JDBC fixture was used for database access before being provisioned.
    #[error("jdbc sink for table {0} has no database handle, it was never provisioned")]
    Unprovisioned(String),
    /// The given input was invalid.
    #[error("validation error: {0}")]
    InvalidInput(String),
}
