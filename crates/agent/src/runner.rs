use crate::backend::{AgentBackend, Invocation};
use crate::content::prepare_content;
use crate::parser::{parse_reply, AgentReply};
use crate::prompt::PromptOptions;
use async_trait::async_trait;
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Anything that can turn document text plus catalog options into a
/// categorization suggestion. The engine is generic over this so tests can
/// substitute canned replies for a live subprocess.
#[async_trait]
pub trait Categorizer: Send + Sync {
    async fn categorize(&self, content: &str, options: &PromptOptions) -> AgentReply;
}

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Drives one agent backend through the full invocation protocol: content
/// capping, temp-file staging, subprocess execution with a deadline, and
/// timeout retries with exponential backoff.
pub struct AgentRunner {
    backend: Box<dyn AgentBackend>,
    timeout: Duration,
    max_content_chars: usize,
    max_retries: u32,
    backoff_base: Duration,
}

impl AgentRunner {
    pub fn new(backend: Box<dyn AgentBackend>, timeout: Duration, max_content_chars: usize) -> Self {
        Self {
            backend,
            timeout,
            max_content_chars,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }

    /// Override the timeout retry policy. Intended for tests that want
    /// millisecond backoffs instead of the production one-second base.
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff_base = backoff_base;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    async fn run(&self, content: &str, options: &PromptOptions) -> AgentReply {
        let prepared = prepare_content(content, self.max_content_chars);

        // Scoped resource: the file is deleted when `content_file` drops,
        // including on every early return below.
        let content_file = match stage_content(&prepared) {
            Ok(file) => file,
            Err(err) => {
                return AgentReply::from_error(format!("failed to stage document text: {err}"));
            }
        };

        let session_id = self
            .backend
            .wants_session_id()
            .then(|| uuid::Uuid::new_v4().to_string());

        let prompt = self
            .backend
            .build_prompt(&prepared, content_file.path(), options);
        let invocation =
            self.backend
                .build_invocation(&prompt, content_file.path(), session_id.as_deref());

        for attempt in 0..self.max_retries {
            log::debug!(
                "invoking {} agent (attempt {}/{})",
                self.backend.name(),
                attempt + 1,
                self.max_retries
            );

            match tokio::time::timeout(self.timeout, execute(&invocation)).await {
                Err(_elapsed) => {
                    log::warn!(
                        "{} agent timed out after {:?} (attempt {}/{})",
                        self.backend.name(),
                        self.timeout,
                        attempt + 1,
                        self.max_retries
                    );
                    if attempt + 1 < self.max_retries {
                        tokio::time::sleep(self.backoff_base * 2u32.pow(attempt)).await;
                    }
                }
                Ok(Err(err)) => {
                    return AgentReply::from_error(format!("unexpected agent failure: {err}"));
                }
                Ok(Ok(output)) => {
                    if !output.status.success() {
                        let code = output
                            .status
                            .code()
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "signal".to_string());
                        let stderr = String::from_utf8_lossy(&output.stderr);
                        let stdout = String::from_utf8_lossy(&output.stdout);
                        let detail = if stderr.trim().is_empty() {
                            stdout.trim().to_string()
                        } else {
                            stderr.trim().to_string()
                        };
                        return AgentReply::from_error(format!(
                            "agent exited with code {code}: {detail}"
                        ));
                    }

                    let stdout = String::from_utf8_lossy(&output.stdout);
                    return parse_reply(&stdout);
                }
            }
        }

        AgentReply::from_error(format!(
            "agent request timed out after {} attempts",
            self.max_retries
        ))
    }
}

#[async_trait]
impl Categorizer for AgentRunner {
    async fn categorize(&self, content: &str, options: &PromptOptions) -> AgentReply {
        self.run(content, options).await
    }
}

fn stage_content(prepared: &str) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("docsort_doc_")
        .suffix(".txt")
        .tempfile()?;
    file.write_all(prepared.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Spawn the invocation and collect its output. `kill_on_drop` ensures the
/// child is reaped when the surrounding timeout cancels this future.
async fn execute(invocation: &Invocation) -> std::io::Result<std::process::Output> {
    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn()?;

    if let Some(payload) = &invocation.stdin {
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(payload.as_bytes()).await?;
            stdin.shutdown().await?;
        }
    }

    child.wait_with_output().await
}
