//! Staff account bootstrap command

use std::io::Write;

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_create_staff(
    config: &Config,
    username: &str,
    email: &str,
    password: Option<&str>,
) -> anyhow::Result<()> {
    if username.trim().is_empty() {
        println!("Username cannot be empty.");
        return Ok(());
    }

    let password = match password {
        Some(p) => p.to_string(),
        None => {
            print!("Password for '{}': ", username);
            std::io::stdout().flush()?;
            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            input.trim().to_string()
        }
    };

    if password.len() < 8 {
        println!("Password must be at least 8 characters.");
        return Ok(());
    }

    let store = Store::new(&config.general.database_path).await?;

    if store.username_exists(username).await? {
        println!("Username '{}' is already taken.", username);
        return Ok(());
    }

    let user = store
        .create_user(username, &password, email, true, &config.security)
        .await?;

    println!("✓ Created staff account '{}' (ID: {})", user.username, user.id);

    Ok(())
}
