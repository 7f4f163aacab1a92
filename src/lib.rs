pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod mailer;
pub mod seed;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,

        Commands::Init => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        Commands::SeedTasks => cli::commands::cmd_seed_tasks(&config).await,

        Commands::SeedChances => cli::commands::cmd_seed_chances(&config).await,

        Commands::WipeTasks => cli::commands::cmd_wipe_tasks(&config).await,

        Commands::WipeChances => cli::commands::cmd_wipe_chances(&config).await,

        Commands::CreateStaff {
            username,
            email,
            password,
        } => cli::commands::cmd_create_staff(&config, &username, &email, password.as_deref()).await,
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!(
        "Greenboard v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    if config.auth.jwt_secret == "change-me" {
        warn!("auth.jwt_secret is still the default; set a real secret before exposing this server");
    }

    let port = config.server.port;
    let state = api::create_app_state_from_config(config).await?;
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => tracing::error!("Error listening for shutdown: {}", e),
    }
}
