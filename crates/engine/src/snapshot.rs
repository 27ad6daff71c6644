use docsort_catalog::{CatalogStore, Correspondent, DocumentType, Result, StoragePath, Tag};

/// The four named-entity kinds the catalog exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Tag,
    Correspondent,
    DocumentType,
    StoragePath,
}

/// Lazily loaded per-kind view of the catalog's named entities.
///
/// Each kind is fetched at most once per run (one paginated list call) and
/// cached until explicitly invalidated, e.g. after the apply flow creates
/// correspondents mid-run.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    tags: Option<Vec<Tag>>,
    correspondents: Option<Vec<Correspondent>>,
    document_types: Option<Vec<DocumentType>>,
    storage_paths: Option<Vec<StoragePath>>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self, kind: EntityKind) {
        match kind {
            EntityKind::Tag => self.tags = None,
            EntityKind::Correspondent => self.correspondents = None,
            EntityKind::DocumentType => self.document_types = None,
            EntityKind::StoragePath => self.storage_paths = None,
        }
    }

    pub async fn tags(&mut self, store: &dyn CatalogStore) -> Result<&[Tag]> {
        if self.tags.is_none() {
            log::debug!("loading tag snapshot");
            self.tags = Some(store.list_tags().await?);
        }
        Ok(self.tags.as_deref().unwrap_or_default())
    }

    pub async fn correspondents(&mut self, store: &dyn CatalogStore) -> Result<&[Correspondent]> {
        if self.correspondents.is_none() {
            log::debug!("loading correspondent snapshot");
            self.correspondents = Some(store.list_correspondents().await?);
        }
        Ok(self.correspondents.as_deref().unwrap_or_default())
    }

    pub async fn document_types(&mut self, store: &dyn CatalogStore) -> Result<&[DocumentType]> {
        if self.document_types.is_none() {
            log::debug!("loading document type snapshot");
            self.document_types = Some(store.list_document_types().await?);
        }
        Ok(self.document_types.as_deref().unwrap_or_default())
    }

    pub async fn storage_paths(&mut self, store: &dyn CatalogStore) -> Result<&[StoragePath]> {
        if self.storage_paths.is_none() {
            log::debug!("loading storage path snapshot");
            self.storage_paths = Some(store.list_storage_paths().await?);
        }
        Ok(self.storage_paths.as_deref().unwrap_or_default())
    }
}

/// Exact match after lowercasing, nothing fuzzier.
pub(crate) fn find_id_by_name(pairs: &[(u64, &str)], name: &str) -> Option<u64> {
    let wanted = name.to_lowercase();
    pairs
        .iter()
        .find(|(_, candidate)| candidate.to_lowercase() == wanted)
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_lookup_ignores_case_only() {
        let pairs = [(1, "Amber Electric"), (2, "Netflix")];

        assert_eq!(find_id_by_name(&pairs, "AMBER ELECTRIC"), Some(1));
        assert_eq!(find_id_by_name(&pairs, "netflix"), Some(2));
        assert_eq!(find_id_by_name(&pairs, "Amber"), None);
    }
}
