//! Scenario lifecycle.
//!
//! A `Scenario` owns everything one end-to-end run needs: fixture factories, a runtime client
//! and the cleanup guard. `Scenario::run` wraps a scenario body so that teardown happens on
//! every exit path, including errors and panics.

mod file_jdbc;
mod guard;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::prelude::*;

use crate::config::Config;
use crate::error::HarnessError;
use crate::fixtures::{JdbcSink, Jobs, Sinks, Sources};
use crate::probe::validate_identifier;
use crate::runtime::{Runtime, RuntimeClient};

pub use file_jdbc::{file_jdbc, FileJdbcParams, DEFAULT_STREAM_NAME};
pub use guard::CleanupGuard;

/// The lifecycle state of a scenario.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScenarioState {
    /// No external resources have been provisioned.
    Uninitialized,
    /// External resources have been provisioned.
    Initialized,
    /// Pipelines have been submitted or launched.
    Executing,
    /// The scenario's assertions have run.
    Verified,
    /// All external resources have been released. Terminal.
    CleanedUp,
}

/// A single end-to-end scenario against the runtime.
pub struct Scenario<R: Runtime> {
    config: Arc<Config>,
    runtime: RuntimeClient<R>,
    sinks: Sinks,
    sources: Sources,
    jobs: Jobs,
    guard: CleanupGuard,
    state: ScenarioState,
}

impl<R: Runtime> Scenario<R> {
    pub fn new(config: Arc<Config>, runtime: R) -> Self {
        Self {
            runtime: RuntimeClient::new(runtime, config.clone()),
            sinks: Sinks::new(config.clone()),
            sources: Sources,
            jobs: Jobs::new(config.clone()),
            guard: CleanupGuard::new(),
            state: ScenarioState::Uninitialized,
            config,
        }
    }

    pub fn state(&self) -> ScenarioState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runtime(&self) -> &RuntimeClient<R> {
        &self.runtime
    }

    pub fn sinks(&self) -> &Sinks {
        &self.sinks
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    pub fn jobs(&self) -> &Jobs {
        &self.jobs
    }

    pub fn guard(&self) -> &CleanupGuard {
        &self.guard
    }

    /// Run the given scenario body, then tear the scenario down regardless of how the body
    /// exited.
    ///
    /// Returns the body's error if it failed. If the body panicked, the panic is resumed once
    /// teardown has finished.
    pub async fn run<F>(&mut self, body: F) -> Result<()>
    where
        F: for<'a> FnOnce(&'a mut Scenario<R>) -> BoxFuture<'a, Result<()>>,
    {
        let outcome = AssertUnwindSafe(body(&mut *self)).catch_unwind().await;
        self.teardown().await;
        match outcome {
            Ok(res) => {
                if let Err(err) = &res {
                    tracing::error!(error = ?err, "scenario failed");
                }
                res
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Provision a jdbc sink targeting the given table.
    ///
    /// The table is registered for cleanup and any leftover from a previous run is dropped.
    pub async fn jdbc_sink(&mut self, table: &str) -> Result<JdbcSink> {
        self.ensure_active()?;
        validate_identifier(table)?;
        let sink = self.sinks.jdbc().await?.table_name(table);
        self.guard.track_table(&sink);
        sink.drop_table(table).await?;
        tracing::debug!(table, "provisioned jdbc sink");
        self.state = ScenarioState::Initialized;
        Ok(sink)
    }

    /// Submit a named stream, waiting for it to be deployed.
    pub async fn stream(&mut self, name: &str, definition: &str) -> Result<()> {
        self.ensure_active()?;
        self.guard.track_stream(name);
        self.state = ScenarioState::Executing;
        self.runtime.submit_stream(name, definition).await
    }

    /// Submit a job definition, which becomes the target of the next `job_launch`.
    pub async fn job(&mut self, definition: &str) -> Result<String> {
        self.ensure_active()?;
        self.state = ScenarioState::Executing;
        let name = self.runtime.submit_job(definition).await?;
        self.guard.track_job(&name);
        Ok(name)
    }

    /// Launch the most recently submitted job, waiting up to the configured budget for it to
    /// complete.
    pub async fn job_launch(&mut self) -> Result<()> {
        self.ensure_active()?;
        let launch = self.runtime.launch_job().await?;
        self.runtime.await_job(&launch).await
    }

    /// Assert that the given query yields exactly the expected scalar value.
    pub async fn assert_scalar(&mut self, sink: &JdbcSink, query: &str, expected: &str) -> Result<()> {
        self.ensure_active()?;
        sink.sql()?.verify_scalar(query, expected).await?;
        tracing::info!(query, "verified scalar value");
        self.state = ScenarioState::Verified;
        Ok(())
    }

    /// Release every resource this scenario created.
    ///
    /// Safe to call from any state and any number of times.
    pub async fn teardown(&mut self) {
        tracing::debug!(state = ?self.state, "tearing down scenario");
        self.guard.release(&self.runtime).await;
        self.state = ScenarioState::CleanedUp;
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state == ScenarioState::CleanedUp {
            return Err(HarnessError::InvalidInput("scenario has already been cleaned up".into()).into());
        }
        Ok(())
    }
}
