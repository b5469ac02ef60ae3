//! Resolves which document to open: command line first, then the local ini
//! file, then an interactive prompt.

use anyhow::{bail, Context, Result};
use ini::Ini;
use shared_types::DocumentKey;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::debug;

const SECTION: &str = "cloudconfig";

/// Values read from the local ini file. Either may be missing.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LocalSettings {
    pub bucket_name: Option<String>,
    pub config_name: Option<String>,
}

impl LocalSettings {
    /// Read `bucket_name` and `config_name` from the `[cloudconfig]` section,
    /// falling back to keys outside any section. A missing file is empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No local config file");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let lookup = |key: &str| {
            ini.get_from(Some(SECTION), key)
                .or_else(|| ini.general_section().get(key))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            bucket_name: lookup("bucket_name"),
            config_name: lookup("config_name"),
        })
    }
}

/// Ask for a value on `output` and read one line from `input`.
pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    write!(output, "{label}: ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("No input given for {label}");
    }
    let value = line.trim();
    if value.is_empty() {
        bail!("{label} is required");
    }
    Ok(value.to_string())
}

pub fn resolve_document<R: BufRead, W: Write>(
    bucket: Option<String>,
    document: Option<String>,
    settings: LocalSettings,
    input: &mut R,
    output: &mut W,
) -> Result<DocumentKey> {
    let bucket_name = match bucket.or(settings.bucket_name) {
        Some(name) => name,
        None => prompt(input, output, "Bucket name")?,
    };
    let config_name = match document.or(settings.config_name) {
        Some(name) => name,
        None => prompt(input, output, "Config name")?,
    };
    Ok(DocumentKey::new(bucket_name, config_name))
}
