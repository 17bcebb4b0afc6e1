//! RESTGuardian server: connects to the database from `DATABASE_URL` and serves the
//! database/table/record resource tree.

use restguardian::{app, AppState, PgBackend, PgBackendOptions, RecordService, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("restguardian=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.statement_timeout)
        .connect(&settings.database_url)
        .await?;

    let backend = PgBackend::new(
        pool,
        PgBackendOptions {
            include_system_schemas: settings.include_system_schemas,
        },
    );
    let records = RecordService::new(Arc::new(backend), settings.statement_timeout);
    let router = app(AppState::new(records), settings.body_limit_bytes);

    let listener = TcpListener::bind(settings.bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
