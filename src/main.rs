#[macro_use]
extern crate lazy_static;

#[macro_use]
mod macros;

mod api;
mod cli;
mod cookies;
mod db;
mod env;
mod error;
mod period;
mod routes;
mod traits;
mod util;

use clap::Parser;
use eyre::WrapErr;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use crate::cookies::PrincipalProvider;
pub use crate::error::{AppError, AppResult};
pub use crate::traits::RequestBody;

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    principal: PrincipalProvider,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        AppState {
            pool,
            principal: PrincipalProvider::SessionCookie,
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = cli::Args::parse();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(3))
        .connect(&env::DATABASE_URL)
        .await
        .wrap_err("can't connect to database")?;
    let state = AppState::new(pool);

    match args.command.unwrap_or_default() {
        cli::Command::Run => {
            state.migrate().await?;
            serve(state).await?;
        }
        cli::Command::Reset => state.reset().await?,
        cli::Command::Migrate => state.migrate().await?,
    }

    Ok(())
}

async fn serve(state: AppState) -> eyre::Result<()> {
    let app = routes::router()
        .nest_service("/uploads", ServeDir::new(&*env::UPLOAD_DIR))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(env::BIND_ADDR.as_str()).await?;
    info!("listening on {}", env::BIND_ADDR.as_str());
    axum::serve(listener, app).await?;
    Ok(())
}
