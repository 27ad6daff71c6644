//! Invocation of external CLI text-generation agents for document
//! categorization.
//!
//! The crate owns the full protocol: capping document text, staging it in a
//! scoped temp file, building a backend-specific subprocess call, enforcing a
//! deadline with timeout retries, and parsing the agent's line-oriented reply
//! into an [`AgentReply`]. Invocation failures surface as data on the reply,
//! never as errors, so one bad document cannot abort a batch.

pub mod backend;
pub mod content;
pub mod parser;
pub mod prompt;
pub mod runner;

pub use backend::{AgentBackend, AgentKind, ClaudeBackend, CodexBackend, Invocation, OpencodeBackend};
pub use content::prepare_content;
pub use parser::{parse_reply, AgentReply};
pub use prompt::PromptOptions;
pub use runner::{AgentRunner, Categorizer};
