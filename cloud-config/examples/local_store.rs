use anyhow::Result;
use cloud_config::{ObjectStoreClient, RemoteConfigStore, StorageConfig, StoreConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // Containers are directories below the storage path
    let storage_path = std::env::var("STORAGE_PATH").unwrap_or_else(|_| "./data".to_string());
    println!("Using storage path: {}", storage_path);
    std::fs::create_dir_all(std::path::Path::new(&storage_path).join("demo-bucket"))?;

    let client = Arc::new(ObjectStoreClient::from_config(StorageConfig::local(
        storage_path,
    )));
    let mut store =
        RemoteConfigStore::open(client.clone(), StoreConfig::new("demo-bucket", "app.yml")).await?;
    println!("Loaded {} top-level keys", store.data().len());

    // Build up nested settings through the option tree
    let mut tree = store.options();
    tree["database"].set("host", "db.example.com");
    tree["database"].set("port", 5432);
    tree["features"].set("dark_mode", true);
    store.apply_options(&tree);
    store.save().await?;
    println!("Saved configuration to {}", store.key());

    // Read it back
    let reopened = RemoteConfigStore::open(client, StoreConfig::new("demo-bucket", "app.yml")).await?;
    println!(
        "database.host = {:?}",
        reopened.get_path(&["database", "host"])?
    );
    println!(
        "features.missing = {:?}",
        reopened.get_path(&["features", "missing"])?
    );

    Ok(())
}
