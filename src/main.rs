use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use workshop_signup::config::{AppConfig, TableBackend};
use workshop_signup::database::{schema, MemoryTableStore, SqliteTableStore, TableStore};
use workshop_signup::models::WorkshopCatalog;
use workshop_signup::services::registrations_cache::RegistrationsCache;
use workshop_signup::services::sheets_service::SheetsTableStore;
use workshop_signup::web::{self, state::AppState};

#[tokio::main]
async fn main() {
    dotenv().ok();

    // 1. Logging
    tracing_subscriber::fmt::init();

    // 2. Config
    let config = AppConfig::from_env().expect("Invalid configuration");
    info!(build = env!("WORKSHOPS_BUILD_ID"), "starting workshop signup");

    // 3. Table backend
    let store: Arc<dyn TableStore> = match &config.backend {
        TableBackend::Sqlite { database_url } => {
            info!("Connecting to database: {}", database_url);
            let pool = SqlitePoolOptions::new()
                .connect(database_url)
                .await
                .expect("Cannot connect to the database");
            schema::ensure_schema(&pool)
                .await
                .expect("Cannot create the database schema");
            Arc::new(SqliteTableStore::new(pool))
        }
        TableBackend::Sheets(sheets) => {
            info!(
                spreadsheet = %sheets.spreadsheet_id,
                roster = %sheets.roster_sheet,
                registrations = %sheets.registrations_sheet,
                "using Google Sheets backend"
            );
            Arc::new(SheetsTableStore::new(sheets.clone()))
        }
        TableBackend::Memory => {
            warn!("using in-memory tables; registrations are lost on restart");
            Arc::new(MemoryTableStore::default())
        }
    };

    // 4. App
    let cache = Arc::new(RegistrationsCache::with_system_clock(
        store.clone(),
        config.cache_ttl,
    ));
    let state = AppState::new(store, cache, WorkshopCatalog::default(), config.reset_delay);
    let app = web::router(state);

    // 5. Serve (with fallback port)
    let host = config.host.as_str();
    let port = config.port;
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Cannot parse host/port");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            warn!(
                "Could not bind {}: {}. Trying fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("Cannot parse fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("Cannot bind fallback port")
        }
    };

    let bound_addr = listener.local_addr().expect("Listener has no local address");
    println!("🚀 Inscrições abertas em http://{}", bound_addr);

    axum::serve(listener, app).await.expect("Server error");
}
