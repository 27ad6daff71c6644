//! Client and data model for a Paperless-style document catalog.
//!
//! The catalog is treated as an external collaborator: reads return paginated
//! `{id, name}` listings and full document records; writes create named
//! entities or patch a document's metadata. Failures surface as
//! [`CatalogError`] and are never retried here.

mod client;
mod error;
mod models;
mod store;

pub use client::CatalogClient;
pub use error::{CatalogError, Result};
pub use models::{
    Correspondent, Document, DocumentPatch, DocumentType, Paginated, StoragePath, Tag,
};
pub use store::CatalogStore;
