//! Runtime configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::dsl::XD_DELIMITER;

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

/// The default URL of the runtime's admin server.
pub const DEFAULT_ADMIN_URL: &str = "http://localhost:9393";
/// The default URL of the database which jobs write to.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/xdjob";
/// The default root directory used for file based fixtures.
pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/xd/output";

/// Runtime configuration data.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// The harness's logging config, which uses Rust's `env_logger` directives.
    #[serde(default = "Config::default_rust_log")]
    pub rust_log: String,

    /// The base URL of the runtime's admin server.
    #[serde(default = "Config::default_admin_url")]
    pub admin_url: String,
    /// The URL of the database which the runtime's jobs & sinks write to.
    ///
    /// Any URL scheme supported by `sqlx::AnyPool` may be used.
    #[serde(default = "Config::default_database_url")]
    pub database_url: String,
    /// The max number of connections to hold open against the database.
    #[serde(default = "Config::default_database_max_connections")]
    pub database_max_connections: u32,

    /// The max amount of time to wait for a submitted stream to become deployed.
    #[serde(default = "Config::default_stream_wait_millis")]
    pub stream_wait_millis: u64,
    /// The max amount of time to wait for a launched job to complete.
    ///
    /// A value of `0` disables waiting, in which case a launch returns as soon as the runtime
    /// has accepted it.
    #[serde(default = "Config::default_job_wait_millis")]
    pub job_wait_millis: u64,
    /// The interval at which deployment & execution status is polled.
    #[serde(default = "Config::default_poll_interval_millis")]
    pub poll_interval_millis: u64,
    /// The timeout applied to each individual request made to the admin server.
    #[serde(default = "Config::default_request_timeout_millis")]
    pub request_timeout_millis: u64,

    /// The name under which submitted jobs are registered.
    #[serde(default = "Config::default_job_name")]
    pub job_name: String,
    /// The token used to join pipeline stages into a single definition.
    #[serde(default = "Config::default_delimiter")]
    pub delimiter: String,
    /// The root directory used for file based fixtures.
    #[serde(default = "Config::default_output_dir")]
    pub output_dir: String,
}

impl Config {
    /// Create a new config instance.
    ///
    /// Currently this routine just parses the runtime environment and builds the harness config
    /// from that, every field has a default.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Result<Self> {
        let config: Config = envy::from_env().context("error building config from env")?;
        Ok(config)
    }

    /// Create a config instance for use in tests, along with the tmpdir backing its output dir
    /// and database file.
    #[cfg(test)]
    pub fn new_test(admin_url: &str) -> Result<(Arc<Self>, tempfile::TempDir)> {
        let tmpdir = tempfile::tempdir_in("/tmp").context("error creating tmp dir in /tmp")?;
        let db_path = tmpdir.path().join("itest.db");
        Ok((
            Arc::new(Self {
                rust_log: "error".into(),
                admin_url: admin_url.into(),
                database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
                database_max_connections: 1,
                stream_wait_millis: 2_000,
                job_wait_millis: 2_000,
                poll_interval_millis: 10,
                request_timeout_millis: 2_000,
                job_name: "itestjob".into(),
                delimiter: XD_DELIMITER.into(),
                output_dir: tmpdir.path().join("output").to_string_lossy().into_owned(),
            }),
            tmpdir,
        ))
    }

    /// The max amount of time to wait for a submitted stream to become deployed.
    pub fn stream_wait(&self) -> Duration {
        Duration::from_millis(self.stream_wait_millis)
    }

    /// The max amount of time to wait for a launched job to complete.
    pub fn job_wait(&self) -> Duration {
        Duration::from_millis(self.job_wait_millis)
    }

    /// The interval at which deployment & execution status is polled.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }

    /// The timeout applied to each request made to the admin server.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_millis)
    }

    fn default_rust_log() -> String {
        "info".into()
    }

    fn default_admin_url() -> String {
        DEFAULT_ADMIN_URL.into()
    }

    fn default_database_url() -> String {
        DEFAULT_DATABASE_URL.into()
    }

    fn default_database_max_connections() -> u32 {
        5
    }

    fn default_stream_wait_millis() -> u64 {
        10_000
    }

    fn default_job_wait_millis() -> u64 {
        30_000
    }

    fn default_poll_interval_millis() -> u64 {
        250
    }

    fn default_request_timeout_millis() -> u64 {
        10_000
    }

    fn default_job_name() -> String {
        "itestjob".into()
    }

    fn default_delimiter() -> String {
        XD_DELIMITER.into()
    }

    fn default_output_dir() -> String {
        DEFAULT_OUTPUT_DIR.into()
    }
}
