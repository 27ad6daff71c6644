use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("authentication failed; check the API token")]
    Auth,

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("failed to connect to catalog: {0}")]
    Connection(String),

    #[error("invalid catalog response: {0}")]
    InvalidResponse(String),
}

impl CatalogError {
    /// Map a transport-level failure onto the catalog taxonomy.
    pub(crate) fn from_request(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return CatalogError::Timeout(url.to_string());
        }
        if err.is_connect() {
            return CatalogError::Connection(url.to_string());
        }
        CatalogError::Connection(format!("{url}: {err}"))
    }
}
