use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// True for failures of the HTTP exchange itself (bad status or no response).
    pub fn is_transport(&self) -> bool {
        matches!(self, CatalogError::Status { .. } | CatalogError::Network { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            CatalogError::Status { url, .. }
            | CatalogError::Network { url, .. }
            | CatalogError::Decode { url, .. } => url,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
