use serde::Serialize;

const NEW_MARKER: &str = "NEW:";
const NONE_SENTINEL: &str = "none";

/// A categorization suggestion parsed from the agent's structured reply.
///
/// Callers must check [`AgentReply::error`] before trusting the other fields:
/// invocation failures are reported here as data, never as panics or `Err`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentReply {
    pub title: Option<String>,
    pub document_type: Option<String>,
    pub document_type_is_new: bool,
    /// Proposed tags that name existing catalog entries, reply order.
    pub tags_existing: Vec<String>,
    /// Proposed tags explicitly marked `NEW:`, reply order.
    pub tags_new: Vec<String>,
    pub correspondent: Option<String>,
    pub correspondent_is_new: bool,
    pub storage_path: Option<String>,
    pub storage_path_is_new: bool,
    pub raw: String,
    pub error: Option<String>,
}

impl AgentReply {
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// All proposed tag names, existing partition first.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags = self.tags_existing.clone();
        tags.extend(self.tags_new.iter().cloned());
        tags
    }
}

/// Parse the line-oriented agent reply.
///
/// Tolerant by contract: unrecognized lines are skipped, a repeated key wins
/// last, and the literal sentinel `none` (any case) means "absent". This
/// function never fails; a reply with no recognized lines parses to an empty
/// suggestion.
pub fn parse_reply(raw: &str) -> AgentReply {
    let mut reply = AgentReply {
        raw: raw.to_string(),
        ..Default::default()
    };

    for line in raw.lines() {
        let line = line.trim();

        if let Some(value) = line.strip_prefix("TITLE:") {
            reply.title = parse_plain_value(value);
        } else if let Some(value) = line.strip_prefix("TYPE:") {
            (reply.document_type, reply.document_type_is_new) = parse_named_value(value);
        } else if let Some(value) = line.strip_prefix("TAGS:") {
            (reply.tags_existing, reply.tags_new) = parse_tag_list(value);
        } else if let Some(value) = line.strip_prefix("CORRESPONDENT:") {
            (reply.correspondent, reply.correspondent_is_new) = parse_named_value(value);
        } else if let Some(value) = line.strip_prefix("STORAGE_PATH:") {
            (reply.storage_path, reply.storage_path_is_new) = parse_named_value(value);
        }
    }

    reply
}

fn parse_plain_value(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NONE_SENTINEL) {
        return None;
    }
    Some(value.to_string())
}

/// An entity-naming value: either an existing name, `NEW: <name>`, or `none`.
/// The is-new flag is only set alongside a non-empty name.
fn parse_named_value(value: &str) -> (Option<String>, bool) {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NONE_SENTINEL) {
        return (None, false);
    }

    if let Some(rest) = value.strip_prefix(NEW_MARKER) {
        let name = rest.trim();
        if name.is_empty() {
            return (None, false);
        }
        return (Some(name.to_string()), true);
    }

    (Some(value.to_string()), false)
}

fn parse_tag_list(value: &str) -> (Vec<String>, Vec<String>) {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NONE_SENTINEL) {
        return (Vec::new(), Vec::new());
    }

    let mut existing = Vec::new();
    let mut new = Vec::new();

    for token in value.split(',') {
        let token = token.trim();
        if token.is_empty() || token.eq_ignore_ascii_case(NONE_SENTINEL) {
            continue;
        }
        if let Some(rest) = token.strip_prefix(NEW_MARKER) {
            let name = rest.trim();
            if !name.is_empty() {
                new.push(name.to_string());
            }
        } else {
            existing.push(token.to_string());
        }
    }

    (existing, new)
}
