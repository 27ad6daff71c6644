use crate::prompt::{categorization_prompt, PromptOptions};
use std::path::Path;

/// Which agent backend a deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Claude,
    Codex,
    Opencode,
}

impl AgentKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "claude" => Some(Self::Claude),
            "codex" => Some(Self::Codex),
            "opencode" => Some(Self::Opencode),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Opencode => "opencode",
        }
    }
}

/// A fully built subprocess call: program, arguments, and an optional
/// standard-input payload for backends that read the prompt from stdin.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

/// The two backend-specific steps of the invocation protocol. Everything
/// else (content preparation, temp file lifetime, retries, timeouts, reply
/// parsing) is owned by the runner and shared across backends.
pub trait AgentBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether invocations should carry a generated session token.
    fn wants_session_id(&self) -> bool {
        false
    }

    /// Build the categorization prompt. `content_file` points at the scoped
    /// temp file holding the prepared text for backends that read files.
    fn build_prompt(&self, content: &str, content_file: &Path, options: &PromptOptions) -> String;

    fn build_invocation(
        &self,
        prompt: &str,
        content_file: &Path,
        session_id: Option<&str>,
    ) -> Invocation;
}

fn inline_content_reference(content: &str) -> String {
    format!(
        "The extracted text is provided below between <document_text> tags. \
         Use ONLY that text for analysis.\n<document_text>\n{content}\n</document_text>"
    )
}

/// Claude CLI: prompt passed via `-p`, document text referenced as a file,
/// session correlation supported.
pub struct ClaudeBackend {
    pub command: String,
    pub model: Option<String>,
}

impl AgentBackend for ClaudeBackend {
    fn name(&self) -> &'static str {
        "claude"
    }

    fn wants_session_id(&self) -> bool {
        true
    }

    fn build_prompt(&self, _content: &str, content_file: &Path, options: &PromptOptions) -> String {
        let reference = format!(
            "The extracted text of the document is in the file: @{}",
            content_file.display()
        );
        categorization_prompt(&reference, options)
    }

    fn build_invocation(
        &self,
        prompt: &str,
        _content_file: &Path,
        session_id: Option<&str>,
    ) -> Invocation {
        let mut args = Vec::new();
        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args.push("-p".to_string());
        args.push(prompt.to_string());
        if let Some(id) = session_id {
            args.push("--session-id".to_string());
            args.push(id.to_string());
        }

        Invocation {
            program: self.command.clone(),
            args,
            stdin: None,
        }
    }
}

/// Codex CLI: document text embedded in the prompt, prompt fed via stdin to
/// dodge argv length limits, optional reasoning-effort knob.
pub struct CodexBackend {
    pub command: String,
    pub model: Option<String>,
    pub reasoning_effort: Option<String>,
}

impl CodexBackend {
    const DEFAULT_MODEL: &'static str = "gpt-5";
}

impl AgentBackend for CodexBackend {
    fn name(&self) -> &'static str {
        "codex"
    }

    fn build_prompt(&self, content: &str, _content_file: &Path, options: &PromptOptions) -> String {
        categorization_prompt(&inline_content_reference(content), options)
    }

    fn build_invocation(
        &self,
        prompt: &str,
        _content_file: &Path,
        _session_id: Option<&str>,
    ) -> Invocation {
        let mut args = vec!["exec".to_string()];
        args.push("--model".to_string());
        args.push(
            self.model
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
        );
        if let Some(effort) = &self.reasoning_effort {
            args.push("--config".to_string());
            args.push(format!("model_reasoning_effort=\"{effort}\""));
        }
        args.push("-".to_string());

        Invocation {
            program: self.command.clone(),
            args,
            stdin: Some(prompt.to_string()),
        }
    }
}

/// Opencode CLI: document text embedded in the prompt, prompt fed via stdin.
pub struct OpencodeBackend {
    pub command: String,
    pub model: Option<String>,
}

impl AgentBackend for OpencodeBackend {
    fn name(&self) -> &'static str {
        "opencode"
    }

    fn build_prompt(&self, content: &str, _content_file: &Path, options: &PromptOptions) -> String {
        categorization_prompt(&inline_content_reference(content), options)
    }

    fn build_invocation(
        &self,
        prompt: &str,
        _content_file: &Path,
        _session_id: Option<&str>,
    ) -> Invocation {
        let mut args = Vec::new();
        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args.push("run".to_string());
        args.push("-".to_string());

        Invocation {
            program: self.command.clone(),
            args,
            stdin: Some(prompt.to_string()),
        }
    }
}
