//! Rolegate HTTP server
//!
//! Run with: cargo run --features server --bin rolegate-server -- --db-path ./data/rolegate.mdb
//!
//! Endpoints:
//!   GET       /health                          - Liveness
//!   GET       /dashboard/role/                 - List roles
//!   GET/POST  /dashboard/role/new              - New role form / create
//!   GET       /dashboard/role/{id}             - Show role (+ delete token)
//!   GET/POST  /dashboard/role/{id}/edit        - Edit form / update
//!   POST      /dashboard/role/{id}             - Delete role (_token)
//!   POST      /dashboard/role/{id}/permission  - Set one permission's access

use std::path::PathBuf;

use clap::Parser;
use rolegate::server::{router, AppState};
use rolegate::{bootstrap, init, is_bootstrapped, ControllerRegistry, Settings};

#[derive(Debug, Parser)]
#[command(name = "rolegate-server", version, about = "Role administration server")]
struct Args {
    /// TOML settings file
    #[arg(short, long, env = "ROLEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Database directory (overrides the settings file)
    #[arg(short, long, env = "ROLEGATE_DB")]
    db_path: Option<String>,

    /// Listen port (overrides the settings file)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Secret for delete tokens (overrides the settings file)
    #[arg(long, env = "ROLEGATE_CSRF_SECRET", hide_env_values = true)]
    csrf_secret: Option<String>,

    /// Controller names, comma separated (overrides the settings file)
    #[arg(long, env = "ROLEGATE_CONTROLLERS", value_delimiter = ',')]
    controllers: Option<Vec<String>>,
}

impl Args {
    fn settings(self) -> anyhow::Result<Settings> {
        let mut s = Settings::load(self.config.as_deref())?;
        if let Some(db) = self.db_path {
            s.db_path = db;
        }
        if let Some(port) = self.port {
            s.bind = format!("0.0.0.0:{}", port);
        }
        if self.csrf_secret.is_some() {
            s.csrf_secret = self.csrf_secret;
        }
        if let Some(names) = self.controllers {
            s.controllers = ControllerRegistry::new(names);
        }
        s.validate()?;
        Ok(s)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rolegate=info,tower_http=info".into()),
        )
        .with_target(true)
        .init();

    let settings = Args::parse().settings()?;

    init(&settings.db_path)?;
    if !is_bootstrapped()? {
        let b = bootstrap(&settings.controllers)?;
        tracing::info!(admin = b.admin.id, user = b.user.id, "created admin and default user roles");
    }

    let app = router(AppState::from_settings(&settings)?);

    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    tracing::info!("rolegate-server v{} listening on {}", env!("CARGO_PKG_VERSION"), settings.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
