//! The simulation collaborator. This crate only marshals arguments to it and
//! hands back whatever it returns.

use crate::config::BackendTarget;
use crate::portfolio::PortfolioSnapshot;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Keyword arguments of `run_hedge_fund`, and nothing else.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub tickers: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    pub portfolio: PortfolioSnapshot,
    pub show_reasoning: bool,
    pub selected_analysts: Vec<String>,
    pub model_name: String,
    pub model_provider: String,
}

#[async_trait]
pub trait HedgeFundBackend: Send + Sync {
    async fn run_hedge_fund(&self, request: RunRequest) -> Result<Value>;

    fn describe(&self) -> String;
}

pub fn build_backend(target: &BackendTarget) -> Arc<dyn HedgeFundBackend> {
    match target {
        BackendTarget::Http { url } => Arc::new(HttpBackend::new(url.clone())),
        BackendTarget::Command { program, args } => {
            Arc::new(CommandBackend::new(program.clone(), args.clone()))
        }
    }
}

/// Non-JSON output is still a result; show it as text.
fn parse_output(body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

pub struct HttpBackend {
    client: reqwest::Client,
    url: String,
}

impl HttpBackend {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl HedgeFundBackend for HttpBackend {
    async fn run_hedge_fund(&self, request: RunRequest) -> Result<Value> {
        debug!("POST {} for {} tickers", self.url, request.tickers.len());
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach backend at {}", self.url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read backend response")?;
        if !status.is_success() {
            bail!("Backend returned {}: {}", status, body.trim());
        }
        Ok(parse_output(&body))
    }

    fn describe(&self) -> String {
        format!("http {}", self.url)
    }
}

pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

#[async_trait]
impl HedgeFundBackend for CommandBackend {
    async fn run_hedge_fund(&self, request: RunRequest) -> Result<Value> {
        let payload = serde_json::to_vec(&request)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start backend command '{}'", self.program))?;

        // Feed stdin while collecting output; a child that dies before reading
        // closes the pipe, and its stderr is the error worth reporting.
        let stdin = child.stdin.take();
        let send = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(&payload).await {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!("Backend command closed stdin early");
                    Ok(())
                }
                other => other,
            }
        };
        let (sent, output) = tokio::join!(send, child.wait_with_output());
        let output = output.context("Backend command did not finish")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Backend command failed ({}):\n{}", output.status, stderr.trim_end());
            // Tracebacks end with the exception line.
            let message = stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("no error output");
            bail!("{} (exit: {})", message, output.status);
        }
        sent.context("Failed to send request to backend command")?;

        Ok(parse_output(&String::from_utf8_lossy(&output.stdout)))
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            format!("command {}", self.program)
        } else {
            format!("command {} {}", self.program, self.args.join(" "))
        }
    }
}
