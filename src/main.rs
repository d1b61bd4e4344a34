//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tutor_profiles::adapters::persistence::SqliteRepo;
use tutor_profiles::adapters::security::Argon2Hasher;
use tutor_profiles::adapters::ui::tui::TuiInputPort;
use tutor_profiles::ports::{InputPort, PasswordPort, ProfileRepoPort};
use tutor_profiles::shared::config::AppConfig;
use tutor_profiles::usecases::ProfileService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    tutor_profiles::adapters::ui::init_ui();

    let cfg = AppConfig::load()?;
    let data_path = PathBuf::from(cfg.data_dir_or_default());

    // --- Storage + hashing ---
    let sqlite_repo = SqliteRepo::connect(&data_path, cfg.database_file_or_default())
        .await
        .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?;
    let repo: Arc<dyn ProfileRepoPort> = Arc::new(sqlite_repo);
    let hasher: Arc<dyn PasswordPort> = Arc::new(Argon2Hasher::new());

    // --- Services ---
    let profile_service = Arc::new(ProfileService::new(repo, hasher));
    info!(
        accounts = profile_service.count_accounts().await?,
        profiles = profile_service.count_profiles().await?,
        "profile store opened"
    );

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        Arc::clone(&profile_service),
        cfg.image_upload_dir_or_default(),
    ));

    // --- Run (main menu -> create / search / delete) ---
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
