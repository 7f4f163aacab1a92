//! Seed command handlers for the default catalogs

use crate::config::Config;
use crate::db::Store;
use crate::seed;

pub async fn cmd_seed_tasks(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let added = seed::seed_tasks(&store).await?;
    let total = store.list_tasks().await?.len();

    println!("✓ Added {} task cards ({} total)", added, total);

    Ok(())
}

pub async fn cmd_seed_chances(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let added = seed::seed_chances(&store).await?;
    let total = store.list_chances().await?.len();

    println!("✓ Added {} chance cards ({} total)", added, total);

    Ok(())
}
