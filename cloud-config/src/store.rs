//! A configuration document kept in remote object storage.

use anyhow::Result;
use bytes::Bytes;
use serde_json::Value;
use shared_types::{ConfigMap, DocumentKey};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::error::StoreError;
use crate::option::ConfigOption;
use crate::serializer::Serializer;
use crate::traits::ObjectClient;

/// Which document a [`RemoteConfigStore`] manages and how it is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub key: DocumentKey,
    pub serializer: Serializer,
}

impl StoreConfig {
    pub fn new(container: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            key: DocumentKey::new(container, document),
            serializer: Serializer::default(),
        }
    }

    #[must_use]
    pub fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = serializer;
        self
    }
}

/// In-memory copy of one remote configuration document.
///
/// [`RemoteConfigStore::save`] writes the whole document back without any
/// conflict detection: if another process saved in between, its changes are
/// overwritten.
pub struct RemoteConfigStore {
    client: Arc<dyn ObjectClient>,
    key: DocumentKey,
    serializer: Serializer,
    data: ConfigMap,
}

impl RemoteConfigStore {
    /// Validate that the container exists, then load the document.
    ///
    /// A missing document is not an error; the store starts out empty.
    #[instrument(skip(client, config), fields(key = %config.key))]
    pub async fn open(client: Arc<dyn ObjectClient>, config: StoreConfig) -> Result<Self> {
        let mut store = Self {
            client,
            key: config.key,
            serializer: config.serializer,
            data: ConfigMap::new(),
        };

        store.validate_container().await?;
        store.load().await?;

        debug!(
            container = %store.key.container,
            document = %store.key.document,
            serializer = %store.serializer,
            "Created remote config store"
        );
        Ok(store)
    }

    pub async fn validate_container(&self) -> Result<()> {
        let container = &self.key.container;
        match self.client.container_exists(container).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                let err = StoreError::ContainerNotFound {
                    container: container.clone(),
                };
                error!(%container, "Could not find container: {err}");
                Err(err.into())
            }
            Err(e) => {
                error!(%container, error = ?e, "Error trying to validate container");
                Err(e)
            }
        }
    }

    /// Replace the in-memory data with the remote document.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn load(&mut self) -> Result<()> {
        let exists = self
            .client
            .document_exists(&self.key)
            .await
            .inspect_err(|e| error!(error = ?e, "Error checking remote config"))?;

        if !exists {
            info!("Remote config document not found, starting with empty data");
            self.data = ConfigMap::new();
            return Ok(());
        }

        let body = self
            .client
            .download(&self.key)
            .await
            .inspect_err(|e| error!(error = ?e, "Error reading remote config"))?;
        let text = std::str::from_utf8(&body).map_err(|e| {
            StoreError::Serialization(format!("document is not valid UTF-8: {e}"))
        })?;

        self.data = self.serializer.deserialize(Some(text))?;
        debug!(entries = self.data.len(), "Loaded remote config");
        Ok(())
    }

    /// Serialize the current data and overwrite the remote document.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn save(&self) -> Result<()> {
        let text = self.serializer.serialize(&self.data)?;
        self.client
            .upload(&self.key, Bytes::from(text.into_bytes()))
            .await
            .inspect_err(|e| error!(error = ?e, "Error writing remote config"))?;

        info!(entries = self.data.len(), "Saved remote config");
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Walk nested mappings one key at a time.
    ///
    /// Returns `Ok(None)` as soon as a level is missing or is not a mapping.
    /// An empty `keys` slice is rejected with [`StoreError::EmptyPath`].
    pub fn get_path<K: AsRef<str>>(&self, keys: &[K]) -> Result<Option<&Value>> {
        let Some((first, rest)) = keys.split_first() else {
            return Err(StoreError::EmptyPath.into());
        };

        let first: &str = first.as_ref();
        let found = rest.iter().try_fold(self.data.get(first), |current, key| {
            let key: &str = key.as_ref();
            current.and_then(Value::as_object).map(|map| map.get(key))
        });
        Ok(found.flatten())
    }

    /// Set a top-level key, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Set a nested key, creating intermediate mappings as needed.
    ///
    /// An intermediate value that is not a mapping is replaced by one.
    pub fn set_path<K: AsRef<str>>(&mut self, keys: &[K], value: impl Into<Value>) -> Result<()> {
        let Some((first, rest)) = keys.split_first() else {
            return Err(StoreError::EmptyPath.into());
        };
        insert_at(&mut self.data, first.as_ref(), rest, value.into());
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn data(&self) -> &ConfigMap {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ConfigMap {
        &mut self.data
    }

    pub fn replace_data(&mut self, data: ConfigMap) {
        self.data = data;
    }

    /// Wrap the current data into an option tree.
    pub fn options(&self) -> ConfigOption {
        ConfigOption::from_map(&self.data)
    }

    /// Replace the current data with the flattened contents of `tree`.
    pub fn apply_options(&mut self, tree: &ConfigOption) {
        self.data = tree.to_map();
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn serializer(&self) -> Serializer {
        self.serializer
    }
}

fn insert_at<K: AsRef<str>>(map: &mut ConfigMap, key: &str, rest: &[K], value: Value) {
    match rest.split_first() {
        None => {
            map.insert(key.to_string(), value);
        }
        Some((next, rest)) => {
            let slot = map
                .entry(key)
                .or_insert_with(|| Value::Object(ConfigMap::new()));
            if !slot.is_object() {
                *slot = Value::Object(ConfigMap::new());
            }
            if let Value::Object(nested) = slot {
                insert_at(nested, next.as_ref(), rest, value);
            }
        }
    }
}
