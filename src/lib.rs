pub mod api;
pub mod config;
pub mod db;
pub mod favorites;
pub mod middleware;
pub mod server;
pub mod tmdb;
pub mod util;

#[cfg(test)]
pub(crate) mod testutil;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use db::KeyValueRepo;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] db::DbError),
    #[error("Metadata API error: {0}")]
    Api(#[from] tmdb::TmdbError),
    #[error("Server error: {0}")]
    Server(String),
}

pub async fn run(config: config::Config) -> Result<(), ServerError> {
    if config.debug_logs {
        info!("Debug logging enabled");
    }

    let token = config.api.resolve_token()?;
    let client = tmdb::TmdbClient::new(
        &config.api.base_url,
        &token,
        &config.api.language,
        config.api.timeout(),
    )?;
    info!("Using metadata API at {}", config.api.base_url);

    let store: Arc<dyn KeyValueRepo> = match config.get_database_path() {
        Some(db_path) => {
            info!("Opening database at {}", db_path);
            Arc::new(db::SqliteRepository::new(&db_path).await?)
        }
        None => {
            warn!("No database configured, favorites are kept in memory only");
            Arc::new(db::MemoryStore::new())
        }
    };

    let client = Arc::new(client);
    let favorites = Arc::new(favorites::FavoriteSetReconciler::new(client.clone(), store).await);

    let address = config.listen.address.as_deref().unwrap_or("[::]");
    let port = &config.listen.port;
    let addr: SocketAddr = format!("{}:{}", address, port)
        .parse()
        .map_err(|e| ServerError::Server(format!("Invalid address: {}", e)))?;

    let tls = match (&config.listen.tlscert, &config.listen.tlskey) {
        (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
        _ => None,
    };

    let state = server::AppState::new(config, client, favorites);
    let app = server::build_router(state);

    if let Some((cert_path, key_path)) = tls {
        info!("Loading TLS certificate from {}", cert_path);
        info!("Loading TLS key from {}", key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert_path, &key_path)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to load TLS config: {}", e)))?;

        info!("Serving HTTPS on {}", addr);

        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    } else {
        info!("Serving HTTP on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    }

    Ok(())
}
