use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

/// A document's metadata as it currently stands in the catalog, with ids
/// reverse-resolved to display names.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CurrentFields {
    pub title: String,
    pub document_type: Option<String>,
    pub tags: Vec<String>,
    pub correspondent: Option<String>,
    pub storage_path: Option<String>,
}

/// A proposed named entity: resolved to a catalog id when it names an
/// existing entry, id-less when newly proposed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuggestedEntity {
    pub name: String,
    pub id: Option<u64>,
    pub is_new: bool,
}

/// The reconciled outcome for one document. Immutable after construction;
/// serializes for `--json` and `--export` output.
#[derive(Debug, Clone, Serialize)]
pub struct CategorizationResult {
    pub document_id: u64,
    pub status: Status,
    pub current: CurrentFields,
    pub suggested_title: Option<String>,
    pub suggested_type: Option<SuggestedEntity>,
    pub suggested_tags: Vec<SuggestedEntity>,
    /// Suggested tag ids, including preserved protected tags.
    pub suggested_tag_ids: Vec<u64>,
    pub suggested_correspondent: Option<SuggestedEntity>,
    pub suggested_storage_path: Option<SuggestedEntity>,
    pub error_message: Option<String>,
}

impl CategorizationResult {
    pub fn error(document_id: u64, current: CurrentFields, message: impl Into<String>) -> Self {
        Self {
            document_id,
            status: Status::Error,
            current,
            suggested_title: None,
            suggested_type: None,
            suggested_tags: Vec::new(),
            suggested_tag_ids: Vec::new(),
            suggested_correspondent: None,
            suggested_storage_path: None,
            error_message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Whether the suggestion changes anything worth writing back.
    pub fn has_suggestions(&self) -> bool {
        self.is_success()
            && (self.suggested_title.is_some()
                || self.suggested_type.is_some()
                || !self.suggested_tags.is_empty()
                || self.suggested_correspondent.is_some()
                || self.suggested_storage_path.is_some())
    }
}
