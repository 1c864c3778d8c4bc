use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::instrument;

use super::{BackendRequest, CompletionBackend, parse_candidates};
use crate::assist::candidate::CandidateSnippet;
use crate::config::CommandBackendConfig;

/// Runs an external generator per request: the request goes to its stdin as
/// JSON, candidates are read back from its stdout.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandBackend {
    pub fn new(config: &CommandBackendConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout(),
        }
    }

    #[instrument(skip(self, req), fields(program = ?self.program, strategy = req.strategy.name()))]
    async fn run(&self, req: &BackendRequest) -> Result<Vec<CandidateSnippet>> {
        let payload = serde_json::to_vec(req)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.program.display()))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("backend stdin was not captured"))?;

        let exchange = async move {
            stdin.write_all(&payload).await?;
            drop(stdin);
            child.wait_with_output().await
        };
        let output = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| anyhow!("backend timed out after {:?}", self.timeout))??;

        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr);
            tracing::error!(status = %output.status, error = %err_msg.trim(), "backend exited with failure");
            return Err(anyhow!("backend error: {}", err_msg.trim()));
        }

        let reply = String::from_utf8(output.stdout)
            .map_err(|e| anyhow!("backend output is not UTF-8: {}", e))?;
        let candidates = parse_candidates(&reply);
        tracing::debug!(count = candidates.len(), "backend reply parsed");
        Ok(candidates)
    }

    async fn run_names(&self, req: &BackendRequest) -> Result<Vec<String>> {
        Ok(self.run(req).await?.into_iter().map(|c| c.text).collect())
    }
}

#[async_trait]
impl CompletionBackend for CommandBackend {
    async fn suggest_next_line_code(&self, req: &BackendRequest) -> Result<Vec<CandidateSnippet>> {
        self.run(req).await
    }

    async fn suggest_annotations(&self, req: &BackendRequest) -> Result<Vec<CandidateSnippet>> {
        self.run(req).await
    }

    async fn suggest_variable_names(&self, req: &BackendRequest) -> Result<Vec<String>> {
        self.run_names(req).await
    }

    async fn suggest_method_names(&self, req: &BackendRequest) -> Result<Vec<String>> {
        self.run_names(req).await
    }

    async fn suggest_method_invocations(
        &self,
        req: &BackendRequest,
    ) -> Result<Vec<CandidateSnippet>> {
        self.run(req).await
    }

    async fn suggest_string_literals(&self, req: &BackendRequest) -> Result<Vec<CandidateSnippet>> {
        self.run(req).await
    }

    async fn suggest_if_conditions(&self, req: &BackendRequest) -> Result<Vec<CandidateSnippet>> {
        self.run(req).await
    }
}
