mod api;
mod app;
mod config;
mod models;
mod services;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use api::HttpBackend;
use app::App;
use services::{
    ChatController, Database, IdentityService, KeyringService, Location, SettingsService,
    SettingsUpdate,
};

#[derive(Parser)]
#[command(name = "coachbot")]
#[command(version)]
#[command(about = "Chat with the football coaching assistant from your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the chat API (overrides the saved setting)
    #[arg(long, env = config::API_URL_ENV)]
    api_url: Option<String>,

    /// Open this conversation instead of the last one
    #[arg(long, value_name = "ID")]
    session: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// Save the account email and access token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        token: String,
    },
    /// Forget the saved account
    Logout,
    /// Show the saved settings, or change them
    Settings {
        /// Base URL of the chat API
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Address of the web chat, used for links and the saved location
        #[arg(long, value_name = "URL")]
        app_url: Option<String>,
        /// Request timeout in seconds (0 disables it)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Render answers as formatted text
        #[arg(long, value_name = "BOOL")]
        markdown: Option<bool>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let db = Database::new().await.context("Failed to open local database")?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Login { email, token } => {
            let identity = IdentityService::new(db, KeyringService::new().await?);
            identity.login(&email, &token).await?;
            println!("Signed in as {}", email.trim());
            Ok(())
        }
        Commands::Logout => {
            let identity = IdentityService::new(db, KeyringService::new().await?);
            identity.logout().await?;
            println!("Signed out");
            Ok(())
        }
        Commands::Settings {
            api_base_url,
            app_url,
            timeout,
            markdown,
        } => {
            let update = SettingsUpdate {
                api_base_url,
                app_url,
                request_timeout_secs: timeout,
                render_markdown: markdown,
            };
            let mut settings = SettingsService::load(&db).await;
            if !update.is_empty() {
                settings = update.apply(settings)?;
                SettingsService::save(&db, &settings)
                    .await
                    .context("Failed to save settings")?;
                tracing::info!("Settings updated");
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        Commands::Chat => chat(db, cli.api_url, cli.session).await,
    }
}

async fn chat(db: Database, api_url: Option<String>, session: Option<String>) -> Result<()> {
    let settings = SettingsService::load(&db).await.with_api_url(api_url);
    tracing::info!(api = %settings.api_base_url, "Starting chat");

    let backend = Arc::new(
        HttpBackend::new(
            &settings.api_base_url,
            settings.request_timeout_secs.map(Duration::from_secs),
        )
        .context("Failed to set up API client")?,
    );

    let identity = match KeyringService::new().await {
        Ok(keyring) => {
            IdentityService::new(db.clone(), keyring)
                .resolve(backend.as_ref())
                .await?
        }
        Err(e) => {
            tracing::warn!("Keyring unavailable, continuing signed out: {:#}", e);
            None
        }
    };

    let base = settings.app_location()?;
    let last = match session {
        Some(_) => None,
        None => SettingsService::last_location(&db).await,
    };
    let start = start_location(&base, session.as_deref(), last.as_ref());

    let (tx, rx) = mpsc::unbounded_channel();
    let controller = Arc::new(ChatController::new(backend, identity, base, tx));

    let app = App::new(controller.clone(), db, settings);
    controller.restore(&start).await;
    app.run(rx).await
}

/// Where the chat opens: an explicit session wins, then the session the last
/// run ended on. Only the session is taken from the saved location, the rest
/// comes from the configured app URL.
fn start_location(base: &Location, session: Option<&str>, last: Option<&Location>) -> Location {
    match session {
        Some(id) => base.with_session(Some(id)),
        None => {
            let last_session = last.and_then(Location::session_id);
            base.with_session(last_session.as_deref())
        }
    }
}
