use crate::client::CatalogClient;
use crate::error::Result;
use crate::models::{Correspondent, DocumentType, StoragePath, Tag};
use async_trait::async_trait;

/// The slice of the catalog the reconciliation engine reads: the four named
/// entity listings. Kept narrow so tests can substitute an in-memory store.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<Tag>>;
    async fn list_correspondents(&self) -> Result<Vec<Correspondent>>;
    async fn list_document_types(&self) -> Result<Vec<DocumentType>>;
    async fn list_storage_paths(&self) -> Result<Vec<StoragePath>>;
}

#[async_trait]
impl CatalogStore for CatalogClient {
    async fn list_tags(&self) -> Result<Vec<Tag>> {
        CatalogClient::list_tags(self).await
    }

    async fn list_correspondents(&self) -> Result<Vec<Correspondent>> {
        CatalogClient::list_correspondents(self).await
    }

    async fn list_document_types(&self) -> Result<Vec<DocumentType>> {
        CatalogClient::list_document_types(self).await
    }

    async fn list_storage_paths(&self) -> Result<Vec<StoragePath>> {
        CatalogClient::list_storage_paths(self).await
    }
}
