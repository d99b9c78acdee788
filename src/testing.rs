//! An in-process stand-in for the runtime's admin server.
//!
//! The stub speaks the same REST protocol as the real admin server and emulates just enough of
//! the runtime for the harness's own tests: a `trigger | file` stream writes its payload to a
//! file, and a `filejdbc` job loads that file's lines into a table.

use std::collections::BTreeMap;
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, bail, Context, Result};
use axum::extract::{Extension, Path as UrlPath, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{AddExtensionLayer, Json, Router};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::dsl::XD_DELIMITER;
use crate::probe::SqlHandle;

/// A running admin server stub.
pub struct AdminStub {
    pub addr: SocketAddr,
    pub state: StubState,
}

impl AdminStub {
    /// Spawn a new stub on an ephemeral port, loading job output via the given handle.
    pub fn spawn(sql: Option<SqlHandle>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").context("error binding admin stub listener")?;
        let addr = listener.local_addr()?;
        let state = StubState {
            inner: Default::default(),
            sql,
        };
        let app = Router::new()
            .route("/streams/definitions", post(create_stream))
            .route("/streams/definitions/:name", get(get_stream).delete(delete_stream))
            .route("/jobs/definitions", post(create_job))
            .route("/jobs/definitions/:name", get(get_job).delete(delete_job))
            .route("/jobs/executions", get(list_executions).post(launch_job))
            .layer(AddExtensionLayer::new(state.clone()));
        let server = axum::Server::from_tcp(listener)?.serve(app.into_make_service());
        tokio::spawn(async move {
            if let Err(err) = server.await {
                tracing::error!(error = ?err, "error from admin stub server");
            }
        });
        Ok(Self { addr, state })
    }

    /// The base URL of this stub.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Shared state of the admin stub.
#[derive(Clone)]
pub struct StubState {
    inner: Arc<Mutex<StubInner>>,
    sql: Option<SqlHandle>,
}

#[derive(Default)]
pub struct StubInner {
    /// Stream definitions by name, along with their deployment status.
    pub streams: BTreeMap<String, (String, String)>,
    /// Job definitions by name.
    pub jobs: BTreeMap<String, String>,
    /// Job executions as `(id, job name, status)`.
    pub executions: Vec<(i64, String, String)>,
    /// Every request received, formatted as `METHOD path key=value...`.
    pub requests: Vec<String>,
    /// When set, newly created streams report this status instead of being deployed.
    pub deploy_status: Option<String>,
    /// When set, launched jobs report this status instead of running.
    pub launch_status: Option<String>,
}

impl StubState {
    /// Lock the stub's state for inspection or modification.
    pub fn lock(&self) -> MutexGuard<'_, StubInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[derive(Deserialize)]
struct DefinitionParams {
    name: String,
    definition: String,
    #[serde(default)]
    deploy: Option<String>,
}

#[derive(Deserialize)]
struct LaunchParams {
    jobname: String,
}

async fn create_stream(Extension(state): Extension<StubState>, Query(params): Query<DefinitionParams>) -> StatusCode {
    let deploy_status = {
        let mut inner = state.lock();
        inner.requests.push(format!(
            "POST /streams/definitions name={} definition={} deploy={}",
            params.name,
            params.definition,
            params.deploy.as_deref().unwrap_or("")
        ));
        if inner.streams.contains_key(&params.name) {
            return StatusCode::CONFLICT;
        }
        let status = inner.deploy_status.clone().unwrap_or_else(|| "deployed".into());
        inner.streams.insert(params.name.clone(), (params.definition.clone(), status.clone()));
        status
    };
    if deploy_status == "deployed" && params.deploy.as_deref() == Some("true") {
        if let Err(err) = run_stream(&params.definition).await {
            tracing::error!(error = ?err, "error running stub stream");
            state.lock().streams.insert(params.name, (params.definition, "failed".into()));
        }
    }
    StatusCode::CREATED
}

async fn get_stream(Extension(state): Extension<StubState>, UrlPath(name): UrlPath<String>) -> Result<Json<Value>, StatusCode> {
    let inner = state.lock();
    let (definition, status) = inner.streams.get(&name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({"name": name, "definition": definition, "status": status})))
}

async fn delete_stream(Extension(state): Extension<StubState>, UrlPath(name): UrlPath<String>) -> StatusCode {
    let mut inner = state.lock();
    inner.requests.push(format!("DELETE /streams/definitions/{}", name));
    match inner.streams.remove(&name) {
        Some(_) => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    }
}

async fn create_job(Extension(state): Extension<StubState>, Query(params): Query<DefinitionParams>) -> StatusCode {
    let mut inner = state.lock();
    inner.requests.push(format!(
        "POST /jobs/definitions name={} definition={} deploy={}",
        params.name,
        params.definition,
        params.deploy.as_deref().unwrap_or("")
    ));
    if inner.jobs.contains_key(&params.name) {
        return StatusCode::CONFLICT;
    }
    inner.jobs.insert(params.name, params.definition);
    StatusCode::CREATED
}

async fn get_job(Extension(state): Extension<StubState>, UrlPath(name): UrlPath<String>) -> Result<Json<Value>, StatusCode> {
    let inner = state.lock();
    let definition = inner.jobs.get(&name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({"name": name, "definition": definition, "status": "deployed"})))
}

async fn delete_job(Extension(state): Extension<StubState>, UrlPath(name): UrlPath<String>) -> StatusCode {
    let mut inner = state.lock();
    inner.requests.push(format!("DELETE /jobs/definitions/{}", name));
    match inner.jobs.remove(&name) {
        Some(_) => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    }
}

async fn launch_job(Extension(state): Extension<StubState>, Query(params): Query<LaunchParams>) -> StatusCode {
    let (definition, launch_status, id) = {
        let mut inner = state.lock();
        inner.requests.push(format!("POST /jobs/executions jobname={}", params.jobname));
        let definition = match inner.jobs.get(&params.jobname) {
            Some(definition) => definition.clone(),
            None => return StatusCode::NOT_FOUND,
        };
        (definition, inner.launch_status.clone(), inner.executions.len() as i64 + 1)
    };
    let status = match launch_status {
        Some(status) => status,
        None => match run_job(state.sql.as_ref(), &definition).await {
            Ok(()) => "COMPLETED".into(),
            Err(err) => {
                tracing::error!(error = ?err, "error running stub job");
                "FAILED".into()
            }
        },
    };
    state.lock().executions.push((id, params.jobname, status));
    StatusCode::CREATED
}

async fn list_executions(Extension(state): Extension<StubState>) -> Json<Value> {
    let inner = state.lock();
    let executions: Vec<Value> = inner
        .executions
        .iter()
        .map(|(id, name, status)| json!({"executionId": id, "name": name, "status": status}))
        .collect();
    Json(Value::Array(executions))
}

/// Parse the `--key=value` options of a single DSL stage, unquoting quoted values.
pub fn parse_options(stage: &str) -> Result<BTreeMap<String, String>> {
    let re = Regex::new(r"--(\w+)=('(?:[^']|'')*'|\S+)")?;
    Ok(re
        .captures_iter(stage)
        .map(|cap| {
            let val = &cap[2];
            let val = match val.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
                Some(quoted) => quoted.replace("''", "'"),
                None => val.to_string(),
            };
            (cap[1].to_string(), val)
        })
        .collect())
}

/// Emulate a `trigger | file` stream by writing the trigger's payload to the sink's file.
async fn run_stream(definition: &str) -> Result<()> {
    let stages: Vec<&str> = definition.split(XD_DELIMITER).map(str::trim).collect();
    let (source, sink) = match (stages.first(), stages.last()) {
        (Some(source), Some(sink)) if stages.len() > 1 => (*source, *sink),
        _ => bail!("stub only runs streams with a source and a sink, got {}", definition),
    };
    if !source.starts_with("trigger") || !sink.starts_with("file") {
        return Ok(());
    }
    let payload = parse_options(source)?.remove("payload").unwrap_or_default();
    let opts = parse_options(sink)?;
    let dir = opts.get("dir").context("file sink missing dir")?;
    let name = opts.get("name").context("file sink missing name")?;
    let suffix = opts.get("suffix").map(String::as_str).unwrap_or("out");
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(Path::new(dir).join(format!("{}.{}", name, suffix)), payload).await?;
    Ok(())
}

/// Emulate a `filejdbc` job by loading each line of its input file into its table.
async fn run_job(sql: Option<&SqlHandle>, definition: &str) -> Result<()> {
    if !definition.starts_with("filejdbc") {
        return Ok(());
    }
    let sql = sql.ok_or_else(|| anyhow!("stub has no database handle to run jobs against"))?;
    let opts = parse_options(definition)?;
    let resource = opts.get("resources").context("filejdbc job missing resources")?;
    let path = resource.strip_prefix("file://").unwrap_or(resource);
    let table = opts.get("tableName").context("filejdbc job missing tableName")?;
    let names = opts.get("names").map(String::as_str).unwrap_or("data");

    let contents = tokio::fs::read_to_string(path).await.with_context(|| format!("error reading job input {}", path))?;
    let columns: Vec<String> = names.split(',').map(|name| format!("{} VARCHAR(2000)", name)).collect();
    sql.execute(&format!("CREATE TABLE IF NOT EXISTS {} ({})", table, columns.join(", "))).await?;
    for line in contents.lines().filter(|line| !line.is_empty()) {
        sql.execute(&format!("INSERT INTO {} ({}) VALUES ('{}')", table, names, line.replace('\'', "''")))
            .await?;
    }
    Ok(())
}
