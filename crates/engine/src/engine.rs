use crate::pending::{PendingSender, PendingSenders};
use crate::result::{CategorizationResult, CurrentFields, Status, SuggestedEntity};
use crate::snapshot::{find_id_by_name, CatalogSnapshot, EntityKind};
use docsort_agent::{Categorizer, PromptOptions};
use docsort_catalog::{CatalogStore, Document, Result};

/// Reconciles agent suggestions against the catalog, one document at a time.
///
/// Holds run-scoped state: the lazily loaded catalog snapshot and the
/// pending-sender registry. Documents must be resolved sequentially so later
/// documents see correspondents proposed by earlier ones.
pub struct CategorizationEngine<S, A> {
    store: S,
    categorizer: A,
    snapshot: CatalogSnapshot,
    pending: PendingSenders,
    protected_tags: Vec<String>,
}

/// One entity kind's `(id, name)` pairs, cloned out of the snapshot so the
/// borrow does not outlive later snapshot loads.
type NamePairs = Vec<(u64, String)>;

impl<S: CatalogStore, A: Categorizer> CategorizationEngine<S, A> {
    pub fn new(store: S, categorizer: A, protected_tags: Vec<String>) -> Self {
        Self {
            store,
            categorizer,
            snapshot: CatalogSnapshot::new(),
            pending: PendingSenders::new(),
            protected_tags,
        }
    }

    pub fn pending_senders(&self) -> &[PendingSender] {
        self.pending.entries()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Drop a cached entity listing so the next resolve refetches it.
    pub fn invalidate(&mut self, kind: EntityKind) {
        self.snapshot.invalidate(kind);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn tag_pairs(&mut self) -> Result<NamePairs> {
        let tags = self.snapshot.tags(&self.store).await?;
        Ok(tags.iter().map(|t| (t.id, t.name.clone())).collect())
    }

    async fn correspondent_pairs(&mut self) -> Result<NamePairs> {
        let items = self.snapshot.correspondents(&self.store).await?;
        Ok(items.iter().map(|c| (c.id, c.name.clone())).collect())
    }

    async fn document_type_pairs(&mut self) -> Result<NamePairs> {
        let items = self.snapshot.document_types(&self.store).await?;
        Ok(items.iter().map(|d| (d.id, d.name.clone())).collect())
    }

    async fn storage_path_pairs(&mut self) -> Result<NamePairs> {
        let items = self.snapshot.storage_paths(&self.store).await?;
        Ok(items.iter().map(|s| (s.id, s.name.clone())).collect())
    }

    /// Produce a categorization suggestion for one document.
    ///
    /// Catalog failures propagate; agent failures come back as an error-status
    /// result so one bad document cannot abort a batch.
    pub async fn resolve(&mut self, document: &Document) -> Result<CategorizationResult> {
        let tags = self.tag_pairs().await?;
        let correspondents = self.correspondent_pairs().await?;
        let document_types = self.document_type_pairs().await?;
        let storage_paths = self.storage_path_pairs().await?;

        let current = current_fields(document, &tags, &correspondents, &document_types, &storage_paths);

        if document.content.trim().is_empty() {
            return Ok(CategorizationResult::error(
                document.id,
                current,
                "document has no extractable text",
            ));
        }

        let protected_ids = self.protected_tag_ids(&tags);

        let mut correspondent_options: Vec<String> =
            correspondents.iter().map(|(_, name)| name.clone()).collect();
        correspondent_options.extend(self.pending.names());

        let options = PromptOptions {
            document_types: document_types.iter().map(|(_, n)| n.clone()).collect(),
            tags: tags
                .iter()
                .filter(|(id, _)| !protected_ids.contains(id))
                .map(|(_, name)| name.clone())
                .collect(),
            correspondents: correspondent_options,
            storage_paths: storage_paths.iter().map(|(_, n)| n.clone()).collect(),
        };

        let reply = self.categorizer.categorize(&document.content, &options).await;

        if let Some(message) = reply.error {
            log::warn!("agent failed for document {}: {}", document.id, message);
            return Ok(CategorizationResult::error(document.id, current, message));
        }

        let suggested_correspondent = reply.correspondent.as_deref().map(|name| {
            if self.pending.find(name).is_some() || reply.correspondent_is_new {
                let registered = self.pending.record(name, document.id).to_string();
                SuggestedEntity {
                    name: registered,
                    id: None,
                    is_new: true,
                }
            } else {
                SuggestedEntity {
                    name: name.to_string(),
                    id: find_id_by_name_owned(&correspondents, name),
                    is_new: false,
                }
            }
        });

        let mut suggested_tags = Vec::new();
        let mut suggested_tag_ids = Vec::new();
        for name in &reply.tags_existing {
            let id = find_id_by_name_owned(&tags, name);
            if let Some(id) = id {
                suggested_tag_ids.push(id);
            }
            suggested_tags.push(SuggestedEntity {
                name: name.clone(),
                id,
                is_new: false,
            });
        }
        for name in &reply.tags_new {
            suggested_tags.push(SuggestedEntity {
                name: name.clone(),
                id: None,
                is_new: true,
            });
        }

        // Protected tags already on the document always survive.
        for id in &document.tags {
            if protected_ids.contains(id) && !suggested_tag_ids.contains(id) {
                suggested_tag_ids.push(*id);
            }
        }

        let suggested_type = reply.document_type.map(|name| SuggestedEntity {
            id: (!reply.document_type_is_new)
                .then(|| find_id_by_name_owned(&document_types, &name))
                .flatten(),
            is_new: reply.document_type_is_new,
            name,
        });

        let suggested_storage_path = reply.storage_path.map(|name| SuggestedEntity {
            id: (!reply.storage_path_is_new)
                .then(|| find_id_by_name_owned(&storage_paths, &name))
                .flatten(),
            is_new: reply.storage_path_is_new,
            name,
        });

        Ok(CategorizationResult {
            document_id: document.id,
            status: Status::Success,
            current,
            suggested_title: reply.title,
            suggested_type,
            suggested_tags,
            suggested_tag_ids,
            suggested_correspondent,
            suggested_storage_path,
            error_message: None,
        })
    }

    fn protected_tag_ids(&self, tags: &[(u64, String)]) -> Vec<u64> {
        self.protected_tags
            .iter()
            .filter_map(|name| find_id_by_name_owned(tags, name))
            .collect()
    }
}

fn find_id_by_name_owned(pairs: &[(u64, String)], name: &str) -> Option<u64> {
    let borrowed: Vec<(u64, &str)> = pairs.iter().map(|(id, n)| (*id, n.as_str())).collect();
    find_id_by_name(&borrowed, name)
}

fn current_fields(
    document: &Document,
    tags: &[(u64, String)],
    correspondents: &[(u64, String)],
    document_types: &[(u64, String)],
    storage_paths: &[(u64, String)],
) -> CurrentFields {
    let name_of = |pairs: &[(u64, String)], id: u64| {
        pairs
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, name)| name.clone())
    };

    CurrentFields {
        title: document.title.clone(),
        document_type: document.document_type.and_then(|id| name_of(document_types, id)),
        tags: document
            .tags
            .iter()
            .filter_map(|id| name_of(tags, *id))
            .collect(),
        correspondent: document.correspondent.and_then(|id| name_of(correspondents, id)),
        storage_path: document.storage_path.and_then(|id| name_of(storage_paths, id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docsort_agent::{AgentReply, Categorizer, PromptOptions};
    use docsort_catalog::{Correspondent, DocumentType, StoragePath, Tag};
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MemoryStore {
        tags: Vec<Tag>,
        correspondents: Vec<Correspondent>,
        document_types: Vec<DocumentType>,
        storage_paths: Vec<StoragePath>,
    }

    fn tag(id: u64, name: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
            slug: String::new(),
            is_inbox_tag: false,
            document_count: 0,
        }
    }

    fn correspondent(id: u64, name: &str) -> Correspondent {
        Correspondent {
            id,
            name: name.to_string(),
            slug: String::new(),
            document_count: 0,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore {
            tags: vec![tag(1, "Rent"), tag(2, "Utilities"), tag(7, "Inbox")],
            correspondents: vec![correspondent(11, "Amber Electric")],
            document_types: vec![DocumentType {
                id: 21,
                name: "Invoice".to_string(),
                slug: String::new(),
                document_count: 0,
            }],
            storage_paths: vec![StoragePath {
                id: 31,
                name: "Bills".to_string(),
                slug: String::new(),
                path: "bills/{created_year}".to_string(),
                document_count: 0,
            }],
        }
    }

    #[async_trait]
    impl CatalogStore for MemoryStore {
        async fn list_tags(&self) -> Result<Vec<Tag>> {
            Ok(self.tags.clone())
        }
        async fn list_correspondents(&self) -> Result<Vec<Correspondent>> {
            Ok(self.correspondents.clone())
        }
        async fn list_document_types(&self) -> Result<Vec<DocumentType>> {
            Ok(self.document_types.clone())
        }
        async fn list_storage_paths(&self) -> Result<Vec<StoragePath>> {
            Ok(self.storage_paths.clone())
        }
    }

    /// Returns canned replies in order and records the options it was given.
    struct ScriptedCategorizer {
        replies: Mutex<VecDeque<AgentReply>>,
        seen_options: Mutex<Vec<PromptOptions>>,
    }

    impl ScriptedCategorizer {
        fn new(replies: Vec<AgentReply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen_options: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Categorizer for ScriptedCategorizer {
        async fn categorize(&self, _content: &str, options: &PromptOptions) -> AgentReply {
            self.seen_options.lock().unwrap().push(options.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| AgentReply::from_error("no scripted reply"))
        }
    }

    fn document(id: u64, content: &str, tags: Vec<u64>) -> Document {
        Document {
            id,
            title: format!("scan_{id}"),
            content: content.to_string(),
            correspondent: None,
            document_type: None,
            storage_path: None,
            tags,
            created: String::new(),
            created_date: String::new(),
            original_file_name: String::new(),
        }
    }

    fn reply_with_correspondent(name: &str, is_new: bool) -> AgentReply {
        AgentReply {
            title: Some("Some Title".to_string()),
            correspondent: Some(name.to_string()),
            correspondent_is_new: is_new,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_content_short_circuits_without_agent_call() {
        let categorizer = ScriptedCategorizer::new(vec![]);
        let mut engine = CategorizationEngine::new(store(), categorizer, vec![]);

        let result = engine.resolve(&document(1, "   \n", vec![])).await.unwrap();

        assert_eq!(result.status, Status::Error);
        assert_eq!(
            result.error_message.as_deref(),
            Some("document has no extractable text")
        );
        assert!(engine.categorizer.seen_options.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn protected_tags_hidden_from_options_and_preserved_in_result() {
        let reply = AgentReply {
            tags_existing: vec!["Rent".to_string()],
            ..Default::default()
        };
        let categorizer = ScriptedCategorizer::new(vec![reply]);
        let mut engine =
            CategorizationEngine::new(store(), categorizer, vec!["inbox".to_string()]);

        let result = engine
            .resolve(&document(5, "lease agreement text", vec![7]))
            .await
            .unwrap();

        let options = engine.categorizer.seen_options.lock().unwrap();
        assert_eq!(options[0].tags, vec!["Rent", "Utilities"]);
        assert_eq!(result.suggested_tag_ids, vec![1, 7]);
    }

    #[tokio::test]
    async fn pending_sender_dedup_across_documents() {
        let categorizer = ScriptedCategorizer::new(vec![
            reply_with_correspondent("Netflix", true),
            reply_with_correspondent("NETFLIX", false),
        ]);
        let mut engine = CategorizationEngine::new(store(), categorizer, vec![]);

        let first = engine.resolve(&document(10, "streaming receipt", vec![])).await.unwrap();
        let second = engine.resolve(&document(11, "another receipt", vec![])).await.unwrap();

        let first_suggestion = first.suggested_correspondent.unwrap();
        assert_eq!(first_suggestion.name, "Netflix");
        assert!(first_suggestion.is_new);
        assert_eq!(first_suggestion.id, None);

        // The second reply did not flag NEW, but the name matches a pending
        // sender, so it is treated as pending anyway.
        let second_suggestion = second.suggested_correspondent.unwrap();
        assert_eq!(second_suggestion.name, "Netflix");
        assert!(second_suggestion.is_new);

        assert_eq!(engine.pending_senders().len(), 1);
        assert_eq!(engine.pending_senders()[0].document_ids, vec![10, 11]);

        // Later documents see the pending name among correspondent options.
        let options = engine.categorizer.seen_options.lock().unwrap();
        assert_eq!(options[1].correspondents, vec!["Amber Electric", "Netflix"]);
    }

    #[tokio::test]
    async fn existing_names_resolve_to_ids() {
        let reply = AgentReply {
            title: Some("Electricity Bill".to_string()),
            document_type: Some("invoice".to_string()),
            tags_existing: vec!["utilities".to_string()],
            correspondent: Some("amber electric".to_string()),
            storage_path: Some("Bills".to_string()),
            ..Default::default()
        };
        let categorizer = ScriptedCategorizer::new(vec![reply]);
        let mut engine = CategorizationEngine::new(store(), categorizer, vec![]);

        let result = engine
            .resolve(&document(20, "power usage statement", vec![]))
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.suggested_type.as_ref().unwrap().id, Some(21));
        assert_eq!(result.suggested_tag_ids, vec![2]);
        assert_eq!(result.suggested_correspondent.as_ref().unwrap().id, Some(11));
        assert_eq!(result.suggested_storage_path.as_ref().unwrap().id, Some(31));
    }

    #[tokio::test]
    async fn unknown_names_stay_unresolved() {
        let reply = AgentReply {
            document_type: Some("Receipt".to_string()),
            tags_existing: vec!["Groceries".to_string()],
            ..Default::default()
        };
        let categorizer = ScriptedCategorizer::new(vec![reply]);
        let mut engine = CategorizationEngine::new(store(), categorizer, vec![]);

        let result = engine.resolve(&document(30, "till receipt", vec![])).await.unwrap();

        assert_eq!(result.suggested_type.as_ref().unwrap().id, None);
        assert_eq!(result.suggested_tags[0].id, None);
        assert!(result.suggested_tag_ids.is_empty());
    }

    #[tokio::test]
    async fn agent_error_becomes_error_result_with_current_fields() {
        let categorizer =
            ScriptedCategorizer::new(vec![AgentReply::from_error("agent exited with code 7")]);
        let mut engine = CategorizationEngine::new(store(), categorizer, vec![]);

        let mut doc = document(40, "some text", vec![1]);
        doc.correspondent = Some(11);

        let result = engine.resolve(&doc).await.unwrap();

        assert_eq!(result.status, Status::Error);
        assert_eq!(result.error_message.as_deref(), Some("agent exited with code 7"));
        assert_eq!(result.current.correspondent.as_deref(), Some("Amber Electric"));
        assert_eq!(result.current.tags, vec!["Rent"]);
    }
}
