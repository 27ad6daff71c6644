use anyhow::{anyhow, bail, Result};
use docsort_agent::{AgentKind, AgentRunner, ClaudeBackend, CodexBackend, OpencodeBackend};
use std::time::Duration;

const DEFAULT_CLAUDE_COMMAND: &str = "claude";
const DEFAULT_CLAUDE_MODEL: &str = "sonnet";
const DEFAULT_CODEX_COMMAND: &str = "codex";
const DEFAULT_OPENCODE_COMMAND: &str = "opencode";
const DEFAULT_REASONING_EFFORT: &str = "minimal";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_CONTENT_CHARS: usize = 2000;
const DEFAULT_PROCESSED_TAG: &str = "docsort-processed";

/// Everything needed to run the configured agent backend.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub kind: AgentKind,
    pub command: String,
    pub model: Option<String>,
    /// Codex only.
    pub reasoning_effort: Option<String>,
    pub timeout: Duration,
    pub max_content_chars: usize,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog_url: String,
    pub catalog_token: String,
    pub agent: AgentSettings,
    pub protected_tags: Vec<String>,
    pub processed_tag: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|name| std::env::var(name).ok())
    }

    /// Parse settings from any variable source. Kept pure so tests never
    /// mutate the process environment.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let catalog_url = required(lookup, "DOCSORT_CATALOG_URL")?
            .trim_end_matches('/')
            .to_string();
        let catalog_token = required(lookup, "DOCSORT_CATALOG_TOKEN")?;

        let agent_name = string_or(lookup, "DOCSORT_AGENT", "claude");
        let kind = AgentKind::from_name(&agent_name).ok_or_else(|| {
            anyhow!(
                "DOCSORT_AGENT must be one of claude, codex, opencode (got {agent_name:?})"
            )
        })?;

        // Claude limits double as the fallback for the other backends.
        let claude_timeout = secs_or(lookup, "DOCSORT_CLAUDE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let claude_max_chars = usize_or(
            lookup,
            "DOCSORT_CLAUDE_MAX_CONTENT_CHARS",
            DEFAULT_MAX_CONTENT_CHARS,
        )?;

        let agent = match kind {
            AgentKind::Claude => AgentSettings {
                kind,
                command: string_or(lookup, "DOCSORT_CLAUDE_COMMAND", DEFAULT_CLAUDE_COMMAND),
                model: Some(string_or(lookup, "DOCSORT_CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL)),
                reasoning_effort: None,
                timeout: claude_timeout,
                max_content_chars: claude_max_chars,
            },
            AgentKind::Codex => AgentSettings {
                kind,
                command: string_or(lookup, "DOCSORT_CODEX_COMMAND", DEFAULT_CODEX_COMMAND),
                model: lookup("DOCSORT_CODEX_MODEL").filter(|v| !v.trim().is_empty()),
                reasoning_effort: Some(string_or(
                    lookup,
                    "DOCSORT_CODEX_REASONING_EFFORT",
                    DEFAULT_REASONING_EFFORT,
                )),
                timeout: secs_opt(lookup, "DOCSORT_CODEX_TIMEOUT_SECS")?.unwrap_or(claude_timeout),
                max_content_chars: usize_opt(lookup, "DOCSORT_CODEX_MAX_CONTENT_CHARS")?
                    .unwrap_or(claude_max_chars),
            },
            AgentKind::Opencode => AgentSettings {
                kind,
                command: string_or(lookup, "DOCSORT_OPENCODE_COMMAND", DEFAULT_OPENCODE_COMMAND),
                model: lookup("DOCSORT_OPENCODE_MODEL").filter(|v| !v.trim().is_empty()),
                reasoning_effort: None,
                timeout: secs_opt(lookup, "DOCSORT_OPENCODE_TIMEOUT_SECS")?
                    .unwrap_or(claude_timeout),
                max_content_chars: usize_opt(lookup, "DOCSORT_OPENCODE_MAX_CONTENT_CHARS")?
                    .unwrap_or(claude_max_chars),
            },
        };

        Ok(Self {
            catalog_url,
            catalog_token,
            agent,
            protected_tags: comma_list(lookup, "DOCSORT_PROTECTED_TAGS"),
            processed_tag: string_or(lookup, "DOCSORT_PROCESSED_TAG", DEFAULT_PROCESSED_TAG),
        })
    }

    pub fn build_runner(&self) -> AgentRunner {
        let agent = &self.agent;
        let backend: Box<dyn docsort_agent::AgentBackend> = match agent.kind {
            AgentKind::Claude => Box::new(ClaudeBackend {
                command: agent.command.clone(),
                model: agent.model.clone(),
            }),
            AgentKind::Codex => Box::new(CodexBackend {
                command: agent.command.clone(),
                model: agent.model.clone(),
                reasoning_effort: agent.reasoning_effort.clone(),
            }),
            AgentKind::Opencode => Box::new(OpencodeBackend {
                command: agent.command.clone(),
                model: agent.model.clone(),
            }),
        };
        AgentRunner::new(backend, agent.timeout, agent.max_content_chars)
    }
}

fn required(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    match lookup(name).map(|v| v.trim().to_string()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!(
            "{name} is not set.\n\n\
             Required environment variables:\n\
             \x20 DOCSORT_CATALOG_URL    base URL of the document catalog\n\
             \x20 DOCSORT_CATALOG_TOKEN  API token for the catalog\n\
             Optional:\n\
             \x20 DOCSORT_AGENT          claude | codex | opencode (default claude)\n\
             \x20 DOCSORT_PROTECTED_TAGS comma-separated tag names to preserve\n\
             \x20 DOCSORT_PROCESSED_TAG  tag added to updated documents"
        ),
    }
}

fn string_or(lookup: &dyn Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn usize_opt(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Result<Option<usize>> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(None);
            }
            raw.parse::<usize>()
                .map(Some)
                .map_err(|_| anyhow!("{name} must be a positive integer (got {raw:?})"))
        }
    }
}

fn usize_or(lookup: &dyn Fn(&str) -> Option<String>, name: &str, default: usize) -> Result<usize> {
    Ok(usize_opt(lookup, name)?.unwrap_or(default))
}

fn secs_opt(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Result<Option<Duration>> {
    Ok(usize_opt(lookup, name)?.map(|secs| Duration::from_secs(secs as u64)))
}

fn secs_or(
    lookup: &dyn Fn(&str) -> Option<String>,
    name: &str,
    default_secs: u64,
) -> Result<Duration> {
    Ok(secs_opt(lookup, name)?.unwrap_or(Duration::from_secs(default_secs)))
}

fn comma_list(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Vec<String> {
    lookup(name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn minimal_config_gets_claude_defaults() {
        let lookup = lookup_from(&[
            ("DOCSORT_CATALOG_URL", "https://docs.example.com/"),
            ("DOCSORT_CATALOG_TOKEN", "secret"),
        ]);
        let settings = Settings::from_lookup(&lookup).unwrap();

        assert_eq!(settings.catalog_url, "https://docs.example.com");
        assert_eq!(settings.agent.kind, AgentKind::Claude);
        assert_eq!(settings.agent.command, "claude");
        assert_eq!(settings.agent.model.as_deref(), Some("sonnet"));
        assert_eq!(settings.agent.timeout, Duration::from_secs(120));
        assert_eq!(settings.agent.max_content_chars, 2000);
        assert_eq!(settings.processed_tag, "docsort-processed");
        assert!(settings.protected_tags.is_empty());
    }

    #[test]
    fn codex_falls_back_to_claude_limits() {
        let lookup = lookup_from(&[
            ("DOCSORT_CATALOG_URL", "http://localhost:8000"),
            ("DOCSORT_CATALOG_TOKEN", "secret"),
            ("DOCSORT_AGENT", "codex"),
            ("DOCSORT_CLAUDE_TIMEOUT_SECS", "30"),
            ("DOCSORT_CLAUDE_MAX_CONTENT_CHARS", "500"),
        ]);
        let settings = Settings::from_lookup(&lookup).unwrap();

        assert_eq!(settings.agent.kind, AgentKind::Codex);
        assert_eq!(settings.agent.command, "codex");
        assert_eq!(settings.agent.model, None);
        assert_eq!(settings.agent.reasoning_effort.as_deref(), Some("minimal"));
        assert_eq!(settings.agent.timeout, Duration::from_secs(30));
        assert_eq!(settings.agent.max_content_chars, 500);
    }

    #[test]
    fn backend_specific_limits_override_fallback() {
        let lookup = lookup_from(&[
            ("DOCSORT_CATALOG_URL", "http://localhost:8000"),
            ("DOCSORT_CATALOG_TOKEN", "secret"),
            ("DOCSORT_AGENT", "opencode"),
            ("DOCSORT_OPENCODE_TIMEOUT_SECS", "45"),
            ("DOCSORT_OPENCODE_MODEL", "big-model"),
        ]);
        let settings = Settings::from_lookup(&lookup).unwrap();

        assert_eq!(settings.agent.timeout, Duration::from_secs(45));
        assert_eq!(settings.agent.max_content_chars, 2000);
        assert_eq!(settings.agent.model.as_deref(), Some("big-model"));
    }

    #[test]
    fn unknown_agent_is_rejected() {
        let lookup = lookup_from(&[
            ("DOCSORT_CATALOG_URL", "http://localhost:8000"),
            ("DOCSORT_CATALOG_TOKEN", "secret"),
            ("DOCSORT_AGENT", "gemini"),
        ]);
        let error = Settings::from_lookup(&lookup).unwrap_err().to_string();

        assert!(error.contains("DOCSORT_AGENT"), "{error}");
        assert!(error.contains("gemini"), "{error}");
    }

    #[test]
    fn missing_token_lists_required_variables() {
        let lookup = lookup_from(&[("DOCSORT_CATALOG_URL", "http://localhost:8000")]);
        let error = Settings::from_lookup(&lookup).unwrap_err().to_string();

        assert!(error.contains("DOCSORT_CATALOG_TOKEN"), "{error}");
        assert!(error.contains("Required environment variables"), "{error}");
    }

    #[test]
    fn protected_tags_parse_as_trimmed_comma_list() {
        let lookup = lookup_from(&[
            ("DOCSORT_CATALOG_URL", "http://localhost:8000"),
            ("DOCSORT_CATALOG_TOKEN", "secret"),
            ("DOCSORT_PROTECTED_TAGS", "Inbox, Important ,,Tax"),
        ]);
        let settings = Settings::from_lookup(&lookup).unwrap();

        assert_eq!(settings.protected_tags, vec!["Inbox", "Important", "Tax"]);
    }

    #[test]
    fn bad_numeric_value_is_reported_by_name() {
        let lookup = lookup_from(&[
            ("DOCSORT_CATALOG_URL", "http://localhost:8000"),
            ("DOCSORT_CATALOG_TOKEN", "secret"),
            ("DOCSORT_CLAUDE_TIMEOUT_SECS", "soon"),
        ]);
        let error = Settings::from_lookup(&lookup).unwrap_err().to_string();

        assert!(error.contains("DOCSORT_CLAUDE_TIMEOUT_SECS"), "{error}");
    }
}
