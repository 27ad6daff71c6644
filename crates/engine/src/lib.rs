//! Batch-scoped reconciliation of agent suggestions against the catalog.
//!
//! The engine turns a freeform [`docsort_agent::AgentReply`] into a
//! [`CategorizationResult`] with catalog ids: exact case-insensitive name
//! matching, run-scoped dedup of newly proposed correspondents, and
//! preservation of protected tags.

mod engine;
mod pending;
mod result;
mod snapshot;

pub use engine::CategorizationEngine;
pub use pending::{PendingSender, PendingSenders};
pub use result::{CategorizationResult, CurrentFields, Status, SuggestedEntity};
pub use snapshot::{CatalogSnapshot, EntityKind};
