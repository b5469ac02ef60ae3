//! Where containers live: a local directory tree or S3 buckets.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Backend selection. Neither variant names a bucket: every document key
/// carries its own container, and one client serves all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageConfig {
    /// Containers are directories directly below `path`.
    Local { path: PathBuf },
    /// Containers are S3 buckets.
    S3 {
        region: Option<String>,
        endpoint: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        allow_http: bool,
    },
}

impl StorageConfig {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    pub fn s3(
        region: Option<String>,
        endpoint: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        allow_http: bool,
    ) -> Self {
        Self::S3 {
            region,
            endpoint,
            access_key_id,
            secret_access_key,
            allow_http,
        }
    }

    /// Read the backend from `STORAGE_BACKEND` (`s3` unless set) and the
    /// matching `STORAGE_PATH` or `AWS_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`StorageConfig::from_env`], reading variables through `var`.
    ///
    /// `AWS_BUCKET` is rejected for the S3 backend. A bucket fixed in the
    /// environment would silently disagree with the container named by the
    /// document key.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = var("STORAGE_BACKEND").unwrap_or_else(|| "s3".to_string());

        match backend.as_str() {
            "local" => {
                let path = var("STORAGE_PATH").unwrap_or_else(|| "./data".to_string());
                Ok(Self::local(path))
            }
            "s3" => {
                if let Some(bucket) = var("AWS_BUCKET") {
                    bail!(
                        "AWS_BUCKET={bucket} is not supported: the bucket is the container \
                         of each document, pass it with --bucket or the ini file instead"
                    );
                }
                let allow_http = var("AWS_ALLOW_HTTP")
                    .and_then(|v| v.parse::<bool>().ok())
                    .unwrap_or(false);

                Ok(Self::s3(
                    var("AWS_REGION"),
                    var("AWS_ENDPOINT"),
                    var("AWS_ACCESS_KEY_ID"),
                    var("AWS_SECRET_ACCESS_KEY"),
                    allow_http,
                ))
            }
            _ => bail!("Unknown storage backend: {backend}. Must be 'local' or 's3'"),
        }
    }
}
