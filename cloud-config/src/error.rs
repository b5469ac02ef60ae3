use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(
        "The container '{container}' was not found. Make sure that it exists and that the current credentials have access to it."
    )]
    ContainerNotFound { container: String },

    #[error("At least one key is required to look up a value")]
    EmptyPath,

    #[error("Unknown serialization format: {0}. Must be 'yaml' or 'json'")]
    UnknownFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_yaml::Error> for StoreError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = anyhow::Result<T>;
