//! Runtime client.
//!
//! The `Runtime` trait is the seam between the harness and the external stream/job runtime.
//! `RuntimeClient` layers the harness's submission semantics on top of it: bounded waits for
//! deployment & completion, and tracking of the most recently submitted job.

pub mod admin;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::error::HarnessError;
use crate::utils::{poll_until, Poll};

/// The deployment status of a stream as reported by the runtime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeploymentStatus {
    Deployed,
    Deploying,
    Undeployed,
    Incomplete,
    Failed,
    /// The runtime has no stream by the given name.
    Absent,
    /// A status not known to this harness.
    Other(String),
}

impl FromStr for DeploymentStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "deployed" => Self::Deployed,
            "deploying" => Self::Deploying,
            "undeployed" => Self::Undeployed,
            "incomplete" => Self::Incomplete,
            "failed" => Self::Failed,
            _ => Self::Other(s.into()),
        })
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployed => write!(f, "deployed"),
            Self::Deploying => write!(f, "deploying"),
            Self::Undeployed => write!(f, "undeployed"),
            Self::Incomplete => write!(f, "incomplete"),
            Self::Failed => write!(f, "failed"),
            Self::Absent => write!(f, "absent"),
            Self::Other(val) => write!(f, "{}", val),
        }
    }
}

/// The status of a job execution as reported by the runtime.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Starting,
    Started,
    Stopping,
    Stopped,
    Completed,
    Failed,
    Abandoned,
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    /// True if the execution has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed | Self::Abandoned)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single execution of a job as reported by the runtime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobExecution {
    /// The runtime's id of this execution, increasing with each launch.
    pub id: i64,
    pub status: ExecutionStatus,
}

/// A launch of a job accepted by the runtime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobLaunch {
    /// The name of the launched job.
    pub name: String,
    /// The id of the job's latest execution before this launch, if any.
    ///
    /// Only executions with a greater id belong to this launch.
    pub after: Option<i64>,
}

/// The submission & query contract of an external stream/job runtime.
#[async_trait]
pub trait Runtime: Send + Sync + 'static {
    /// Register and deploy a named stream with the given definition.
    async fn create_stream(&self, name: &str, definition: &str) -> Result<()>;

    /// Get the deployment status of the named stream.
    async fn stream_status(&self, name: &str) -> Result<DeploymentStatus>;

    /// Undeploy and remove the named stream.
    async fn destroy_stream(&self, name: &str) -> Result<()>;

    /// Register and deploy a named job with the given definition.
    async fn create_job(&self, name: &str, definition: &str) -> Result<()>;

    /// Trigger a new execution of the named job.
    async fn launch_job(&self, name: &str) -> Result<()>;

    /// Get the latest execution of the named job, if any.
    async fn latest_execution(&self, name: &str) -> Result<Option<JobExecution>>;

    /// Undeploy and remove the named job.
    async fn destroy_job(&self, name: &str) -> Result<()>;
}

/// A client of the runtime applying the harness's submission & wait semantics.
pub struct RuntimeClient<R: Runtime> {
    runtime: R,
    config: Arc<Config>,
    /// The name of the most recently submitted job.
    last_job: Option<String>,
}

impl<R: Runtime> RuntimeClient<R> {
    pub fn new(runtime: R, config: Arc<Config>) -> Self {
        Self { runtime, config, last_job: None }
    }

    /// The underlying runtime.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// The name of the most recently submitted job, if any.
    pub fn last_job(&self) -> Option<&str> {
        self.last_job.as_deref()
    }

    /// Submit a named stream, waiting up to the configured budget for it to be deployed.
    #[tracing::instrument(level = "debug", skip(self, definition), err)]
    pub async fn submit_stream(&self, name: &str, definition: &str) -> Result<()> {
        tracing::info!(name, definition, "submitting stream");
        self.runtime.create_stream(name, definition).await?;

        let waited = self.config.stream_wait();
        let runtime = &self.runtime;
        let deployed = poll_until(waited, self.config.poll_interval(), move || poll_stream_deployed(runtime, name)).await?;
        match deployed {
            Some(()) => Ok(()),
            None => Err(HarnessError::SubmissionTimeout { name: name.into(), waited }.into()),
        }
    }

    /// Submit a job definition under the configured job name.
    ///
    /// The job becomes the target of the next `launch_job` call.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub async fn submit_job(&mut self, definition: &str) -> Result<String> {
        let name = self.config.job_name.clone();
        tracing::info!(name = %name, definition, "submitting job");
        self.runtime.create_job(&name, definition).await?;
        self.last_job = Some(name.clone());
        Ok(name)
    }

    /// Launch the most recently submitted job.
    ///
    /// The job's latest execution is recorded before launching, so that `await_job` can tell
    /// this launch apart from earlier ones. This returns once the runtime has accepted the
    /// launch, not once the job has completed.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub async fn launch_job(&self) -> Result<JobLaunch> {
        let name = self.last_job.clone().ok_or(HarnessError::NoJobSubmitted)?;
        let after = self.runtime.latest_execution(&name).await?.map(|exec| exec.id);
        tracing::info!(name = %name, ?after, "launching job");
        self.runtime.launch_job(&name).await?;
        Ok(JobLaunch { name, after })
    }

    /// Wait up to the configured budget for the execution started by the given launch to
    /// complete.
    ///
    /// Executions which predate the launch are ignored. A zero budget returns immediately
    /// without querying the runtime.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub async fn await_job(&self, launch: &JobLaunch) -> Result<()> {
        let waited = self.config.job_wait();
        if waited.is_zero() {
            return Ok(());
        }
        let runtime = &self.runtime;
        let completed = poll_until(waited, self.config.poll_interval(), move || poll_job_completed(runtime, launch)).await?;
        match completed {
            Some(()) => Ok(()),
            None => Err(HarnessError::LaunchTimeout {
                name: launch.name.clone(),
                waited,
            }
            .into()),
        }
    }

    /// Remove the named stream from the runtime.
    pub async fn destroy_stream(&self, name: &str) -> Result<()> {
        self.runtime.destroy_stream(name).await
    }

    /// Remove the named job from the runtime.
    pub async fn destroy_job(&self, name: &str) -> Result<()> {
        self.runtime.destroy_job(name).await
    }
}

/// A single deployment poll of the named stream.
async fn poll_stream_deployed<R: Runtime>(runtime: &R, name: &str) -> Result<Poll<()>> {
    match runtime.stream_status(name).await? {
        DeploymentStatus::Deployed => Ok(Poll::Ready(())),
        DeploymentStatus::Failed => Err(HarnessError::DeploymentFailed {
            name: name.into(),
            status: DeploymentStatus::Failed.to_string(),
        }
        .into()),
        status => {
            tracing::trace!(name, %status, "stream not yet deployed");
            Ok(Poll::Pending)
        }
    }
}

/// A single completion poll of the execution started by the given launch.
async fn poll_job_completed<R: Runtime>(runtime: &R, launch: &JobLaunch) -> Result<Poll<()>> {
    let name = launch.name.as_str();
    let exec = match runtime.latest_execution(name).await? {
        Some(exec) if launch.after.map_or(true, |after| exec.id > after) => exec,
        stale => {
            tracing::trace!(name, ?stale, "launched execution not yet visible");
            return Ok(Poll::Pending);
        }
    };
    match exec.status {
        ExecutionStatus::Completed => Ok(Poll::Ready(())),
        status if status.is_finished() => Err(HarnessError::JobFailed {
            name: name.into(),
            status: status.to_string(),
        }
        .into()),
        status => {
            tracing::trace!(name, id = exec.id, %status, "job not yet complete");
            Ok(Poll::Pending)
        }
    }
}
