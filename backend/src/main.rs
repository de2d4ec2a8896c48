//! Backend entry-point: loads settings, prepares storage and runs the server.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use ortho_config::OrthoConfig;
use recipebox::config::AppSettings;
use recipebox::domain::ports::DbInitializer;
use recipebox::domain::security::HashStrength;
use recipebox::inbound::http::health::HealthState;
use recipebox::inbound::http::session::AuthSettings;
use recipebox::outbound::persistence::{DbPool, DieselDbInitializer, PoolConfig};
use server::{FileSettings, ServerConfig, create_server};

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }
}

/// Run migrations and open the pool when a database is configured.
async fn connect_database(settings: &AppSettings) -> Result<Option<DbPool>> {
    let Some(url) = settings.database_url.as_deref() else {
        return Ok(None);
    };
    DieselDbInitializer::new(url)
        .initialize()
        .await
        .wrap_err("failed to prepare the database")?;
    let pool = DbPool::new(PoolConfig::new(url))
        .await
        .wrap_err("failed to open the connection pool")?;
    Ok(Some(pool))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    init_tracing(settings.debug);

    if settings.secret_key.is_none() {
        warn!("no secret key configured; identity cookies will not survive a restart");
    }
    let auth = AuthSettings {
        cookie_name: settings.cookie_name().to_owned(),
        secret_key: settings.secret_key(),
        cookie_secure: settings.cookie_secure,
    };
    let files = FileSettings::new(
        settings.image_dir(),
        settings.export_dir(),
        settings.allowed_image_extensions(),
    );
    let bind_addr = settings.bind_addr().wrap_err("invalid bind address")?;

    let mut config = ServerConfig::new(auth, bind_addr, files).with_swagger(settings.debug);
    if settings.testing {
        config = config.with_hash_strength(HashStrength::Fast);
    }
    if let Some(pool) = connect_database(&settings).await? {
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "recipebox listening");
    server.await?;
    Ok(())
}
