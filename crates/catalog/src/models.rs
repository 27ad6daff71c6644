use serde::{Deserialize, Serialize};

/// A tag attached to documents for topical grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub is_inbox_tag: bool,
    #[serde(default)]
    pub document_count: u64,
}

/// The party a document came from (sender).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correspondent {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub document_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub document_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoragePath {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub document_count: u64,
}

/// A document record as returned by the catalog, including the extracted
/// body text and its current metadata assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub correspondent: Option<u64>,
    #[serde(default)]
    pub document_type: Option<u64>,
    #[serde(default)]
    pub storage_path: Option<u64>,
    #[serde(default)]
    pub tags: Vec<u64>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub created_date: String,
    #[serde(default)]
    pub original_file_name: String,
}

/// Field-wise document update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correspondent: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<u64>>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.correspondent.is_none()
            && self.document_type.is_none()
            && self.storage_path.is_none()
            && self.tags.is_none()
    }
}

/// Generic paginated API envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}
