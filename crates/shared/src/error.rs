use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("sequence list is not a JSON array of names: {0}")]
    Malformed(#[from] serde_json::Error),
}
