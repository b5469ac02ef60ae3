use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use shared_types::DocumentKey;

/// Remote object storage holding configuration documents.
///
/// The existence checks report a missing container or document as
/// `Ok(false)`; every other failure is returned as `Err` so callers can
/// tell "absent" apart from "could not ask".
#[async_trait]
pub trait ObjectClient: Send + Sync {
    async fn container_exists(&self, container: &str) -> Result<bool>;
    async fn document_exists(&self, key: &DocumentKey) -> Result<bool>;
    async fn download(&self, key: &DocumentKey) -> Result<Bytes>;
    /// Write `body` as the whole document, replacing whatever was there.
    async fn upload(&self, key: &DocumentKey, body: Bytes) -> Result<()>;
}
