use anyhow::Result;
use cloud_config::{ObjectStoreClient, RemoteConfigStore, StorageConfig, StoreConfig};
use serde_json::Value;
use std::sync::Arc;

use crate::bootstrap::{resolve_document, LocalSettings};
use crate::cli::{Cli, Command};

pub async fn run_command(cli: Cli) -> Result<()> {
    let settings = LocalSettings::load(&cli.config_file)?;
    let key = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        resolve_document(cli.bucket, cli.document, settings, &mut input, &mut output)?
    };

    let client = Arc::new(ObjectStoreClient::from_config(StorageConfig::from_env()?));
    let config = StoreConfig {
        key,
        serializer: cli.format,
    };
    let mut store = RemoteConfigStore::open(client, config).await?;

    match cli.command {
        Command::Get(args) => {
            for path in &args.paths {
                let value = store.get_path(&split_path(path))?;
                println!("{path}: {}", render(value)?);
            }
        }
        Command::Set(args) => {
            store.set_path(&split_path(&args.path), parse_value(&args.value, args.string))?;
            store.save().await?;
            println!("Saved {} to {}", args.path, store.key());
        }
        Command::Show => {
            print!("{}", store.serializer().serialize(store.data())?);
        }
    }

    Ok(())
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('.').filter(|segment| !segment.is_empty()).collect()
}

/// Parse a command-line value as YAML. Blank input stays an empty string
/// rather than becoming null; `verbatim` skips parsing entirely.
fn parse_value(raw: &str, verbatim: bool) -> Value {
    if verbatim || raw.trim().is_empty() {
        return Value::String(raw.to_string());
    }
    serde_yaml::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn render(value: Option<&Value>) -> Result<String> {
    match value {
        None | Some(Value::Null) => Ok("null".to_string()),
        Some(Value::Object(_) | Value::Array(_)) => {
            let text = serde_yaml::to_string(&value)?;
            Ok(format!("\n{}", text.trim_end()))
        }
        Some(scalar) => Ok(serde_yaml::to_string(scalar)?.trim_end().to_string()),
    }
}
