//! Catalog wipe command handlers

use std::io::Write;

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_wipe_tasks(config: &Config) -> anyhow::Result<()> {
    if !confirm("Delete ALL task cards?")? {
        println!("Cancelled.");
        return Ok(());
    }

    let store = Store::new(&config.general.database_path).await?;
    let removed = store.delete_all_tasks().await?;

    println!("✓ Removed {} task cards", removed);

    Ok(())
}

pub async fn cmd_wipe_chances(config: &Config) -> anyhow::Result<()> {
    if !confirm("Delete ALL chance cards?")? {
        println!("Cancelled.");
        return Ok(());
    }

    let store = Store::new(&config.general.database_path).await?;
    let removed = store.delete_all_chances().await?;

    println!("✓ Removed {} chance cards", removed);

    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} Enter 'y' to confirm: ", prompt);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}
