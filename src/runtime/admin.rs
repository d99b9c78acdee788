//! A runtime client speaking the admin server's REST protocol.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;

use super::{DeploymentStatus, ExecutionStatus, JobExecution, Runtime};
use crate::config::Config;

const STREAMS: &str = "streams";
const JOBS: &str = "jobs";
const DEFINITIONS: &str = "definitions";
const EXECUTIONS: &str = "executions";

/// A stream or job definition as returned by the admin server.
#[derive(Clone, Debug, Deserialize)]
pub struct DefinitionResource {
    pub name: String,
    pub definition: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// A job execution as returned by the admin server.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResource {
    pub execution_id: i64,
    pub name: String,
    pub status: ExecutionStatus,
}

/// A client of the runtime's admin server.
#[derive(Clone)]
pub struct AdminClient {
    client: Client,
    base: Url,
}

impl AdminClient {
    /// Construct a new client of the admin server at the given base URL.
    pub fn new(config: &Config) -> Result<Self> {
        let base = Url::parse(&config.admin_url).context("invalid admin server URL")?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("admin server URL {} cannot be used as a base URL", base));
        }
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("error building admin server HTTP client")?;
        Ok(Self { client, base })
    }

    /// Build the URL of the given resource path under the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in the constructor.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Create a definition of the given kind, requesting immediate deployment.
    async fn create_definition(&self, kind: &str, name: &str, definition: &str) -> Result<()> {
        let res = self
            .client
            .post(self.endpoint(&[kind, DEFINITIONS]))
            .query(&[("name", name), ("definition", definition), ("deploy", "true")])
            .send()
            .await
            .with_context(|| format!("error sending {} definition {} to admin server", kind, name))?;
        check_status(res).await?;
        Ok(())
    }

    /// Destroy a definition of the given kind, tolerating its absence.
    async fn destroy_definition(&self, kind: &str, name: &str) -> Result<()> {
        let res = self
            .client
            .delete(self.endpoint(&[kind, DEFINITIONS, name]))
            .send()
            .await
            .with_context(|| format!("error destroying {} definition {}", kind, name))?;
        if res.status() == StatusCode::NOT_FOUND {
            tracing::debug!(kind, name, "definition already absent");
            return Ok(());
        }
        check_status(res).await?;
        Ok(())
    }
}

#[async_trait]
impl Runtime for AdminClient {
    #[tracing::instrument(level = "debug", skip(self, definition), err)]
    async fn create_stream(&self, name: &str, definition: &str) -> Result<()> {
        self.create_definition(STREAMS, name, definition).await
    }

    #[tracing::instrument(level = "trace", skip(self), err)]
    async fn stream_status(&self, name: &str) -> Result<DeploymentStatus> {
        let res = self
            .client
            .get(self.endpoint(&[STREAMS, DEFINITIONS, name]))
            .send()
            .await
            .with_context(|| format!("error fetching stream {} from admin server", name))?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(DeploymentStatus::Absent);
        }
        let stream: DefinitionResource = check_status(res)
            .await?
            .json()
            .await
            .context("error decoding stream definition from admin server")?;
        Ok(match stream.status {
            Some(status) => status.parse::<DeploymentStatus>().unwrap_or(DeploymentStatus::Other(status)),
            None => DeploymentStatus::Other("".into()),
        })
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn destroy_stream(&self, name: &str) -> Result<()> {
        self.destroy_definition(STREAMS, name).await
    }

    #[tracing::instrument(level = "debug", skip(self, definition), err)]
    async fn create_job(&self, name: &str, definition: &str) -> Result<()> {
        self.create_definition(JOBS, name, definition).await
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn launch_job(&self, name: &str) -> Result<()> {
        let res = self
            .client
            .post(self.endpoint(&[JOBS, EXECUTIONS]))
            .query(&[("jobname", name), ("jobParameters", "{}")])
            .send()
            .await
            .with_context(|| format!("error launching job {}", name))?;
        check_status(res).await?;
        Ok(())
    }

    #[tracing::instrument(level = "trace", skip(self), err)]
    async fn latest_execution(&self, name: &str) -> Result<Option<JobExecution>> {
        let res = self
            .client
            .get(self.endpoint(&[JOBS, EXECUTIONS]))
            .send()
            .await
            .context("error fetching job executions from admin server")?;
        let executions: Vec<ExecutionResource> = check_status(res)
            .await?
            .json()
            .await
            .context("error decoding job executions from admin server")?;
        Ok(executions
            .into_iter()
            .filter(|exec| exec.name == name)
            .max_by_key(|exec| exec.execution_id)
            .map(|exec| JobExecution {
                id: exec.execution_id,
                status: exec.status,
            }))
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn destroy_job(&self, name: &str) -> Result<()> {
        self.destroy_definition(JOBS, name).await
    }
}

/// Map a non-success response into an error carrying the response body.
async fn check_status(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let url = res.url().clone();
    let body = res.text().await.unwrap_or_default();
    Err(anyhow!("admin server returned {} for {}: {}", status, url, body))
}
