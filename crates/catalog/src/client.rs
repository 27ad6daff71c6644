use crate::error::{CatalogError, Result};
use crate::models::{
    Correspondent, Document, DocumentPatch, DocumentType, Paginated, StoragePath, Tag,
};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Matching algorithm the catalog should use for entities we create
/// (6 = automatic/ML matching in Paperless-style APIs).
const AUTO_MATCHING_ALGORITHM: u8 = 6;

/// Async client for a Paperless-style document catalog.
///
/// All calls are single-shot: failures map onto [`CatalogError`] and are not
/// retried here. Callers that want retry own that policy.
pub struct CatalogClient {
    base_url: String,
    http: Client,
}

impl CatalogClient {
    pub fn new(base_url: &str, api_token: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let token = header::HeaderValue::from_str(&format!("Token {api_token}"))
            .map_err(|_| CatalogError::BadRequest("API token contains invalid characters".into()))?;
        headers.insert(header::AUTHORIZATION, token);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Cheap reachability + auth probe.
    pub async fn test_connection(&self) -> Result<()> {
        let _: Paginated<Document> = self
            .get("/api/documents/", &[("page_size", "1".to_string())])
            .await?;
        Ok(())
    }

    pub async fn list_inbox_documents(&self, exclude_tag: Option<u64>) -> Result<Vec<Document>> {
        let documents: Vec<Document> = self
            .get_all_pages("/api/documents/", &[("is_in_inbox", "true".to_string())])
            .await?;

        Ok(match exclude_tag {
            Some(tag_id) => documents
                .into_iter()
                .filter(|doc| !doc.tags.contains(&tag_id))
                .collect(),
            None => documents,
        })
    }

    pub async fn get_document(&self, document_id: u64) -> Result<Document> {
        self.get(&format!("/api/documents/{document_id}/"), &[]).await
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.get_all_pages("/api/tags/", &[]).await
    }

    pub async fn list_correspondents(&self) -> Result<Vec<Correspondent>> {
        self.get_all_pages("/api/correspondents/", &[]).await
    }

    pub async fn list_document_types(&self) -> Result<Vec<DocumentType>> {
        self.get_all_pages("/api/document_types/", &[]).await
    }

    pub async fn list_storage_paths(&self) -> Result<Vec<StoragePath>> {
        self.get_all_pages("/api/storage_paths/", &[]).await
    }

    pub async fn create_tag(&self, name: &str) -> Result<Tag> {
        self.post("/api/tags/", &serde_json::json!({ "name": name }))
            .await
    }

    pub async fn create_correspondent(&self, name: &str) -> Result<Correspondent> {
        self.post(
            "/api/correspondents/",
            &serde_json::json!({
                "name": name,
                "matching_algorithm": AUTO_MATCHING_ALGORITHM,
            }),
        )
        .await
    }

    pub async fn create_document_type(&self, name: &str) -> Result<DocumentType> {
        self.post("/api/document_types/", &serde_json::json!({ "name": name }))
            .await
    }

    pub async fn create_storage_path(&self, name: &str, path: &str) -> Result<StoragePath> {
        self.post(
            "/api/storage_paths/",
            &serde_json::json!({ "name": name, "path": path }),
        )
        .await
    }

    pub async fn update_document(&self, document_id: u64, patch: &DocumentPatch) -> Result<Document> {
        let url = format!("{}/api/documents/{document_id}/", self.base_url);
        log::debug!("PATCH {url}");
        let response = self
            .http
            .patch(&url)
            .json(patch)
            .send()
            .await
            .map_err(|e| CatalogError::from_request(&url, e))?;
        Self::decode(url, response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        log::debug!("GET {url}");
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| CatalogError::from_request(&url, e))?;
        Self::decode(url, response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        log::debug!("POST {url}");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| CatalogError::from_request(&url, e))?;
        Self::decode(url, response).await
    }

    /// Walk a paginated endpoint until the server reports no next page.
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut results = Vec::new();
        let mut page = 1u32;

        loop {
            let mut query: Vec<(&str, String)> = extra.to_vec();
            query.push(("page", page.to_string()));

            let batch: Paginated<T> = self.get(path, &query).await?;
            results.extend(batch.results);

            if batch.next.is_none() {
                break;
            }
            page += 1;
        }

        Ok(results)
    }

    async fn decode<T: DeserializeOwned>(url: String, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| CatalogError::InvalidResponse(format!("{url}: {e}")));
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CatalogError::Auth),
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(url)),
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                Err(CatalogError::BadRequest(body))
            }
            other => Err(CatalogError::Connection(format!("{url}: HTTP {other}"))),
        }
    }
}
