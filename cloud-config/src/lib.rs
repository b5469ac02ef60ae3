//! Hierarchical configuration documents persisted in remote object storage.
//!
//! [`RemoteConfigStore`] loads one document through an [`ObjectClient`],
//! exposes it as a flat mapping or as a [`ConfigOption`] tree and writes it
//! back with [`RemoteConfigStore::save`].

pub mod backend;
pub mod config;
pub mod error;
pub mod option;
pub mod serializer;
pub mod store;
pub mod traits;


pub use backend::ObjectStoreClient;
pub use config::StorageConfig;
pub use error::StoreError;
pub use option::{ConfigOption, ParentRef};
pub use serializer::Serializer;
pub use shared_types::{ConfigMap, DocumentKey};
pub use store::{RemoteConfigStore, StoreConfig};
pub use traits::ObjectClient;
