// src/bin/api_server.rs

use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use faceguard::crypto::load_signer;
use faceguard::infra::config::AppConfig;
use faceguard::infra::logging::init_tracing;
use faceguard::infra::sui::{LedgerClient, SuiRpcClient, TransactionSigner};
use faceguard::infra::walrus::BlobReader;
use faceguard::transport;
use faceguard::RegistrationCoordinator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // --- Configuration ---
    let config = AppConfig::from_env()?;
    info!(
        "Contract {}::{} on {}",
        config.contract.package_id, config.contract.module, config.ledger.rpc_url
    );
    info!(
        "{} publishers, {} aggregators, provisional blobs {}",
        config.storage.publishers.len(),
        config.storage.aggregators.len(),
        if config.allow_provisional_blob { "allowed" } else { "disabled" }
    );

    // --- Ledger client (one per process, shared) ---
    let ledger: Arc<dyn LedgerClient> = Arc::new(SuiRpcClient::new(
        config.ledger.rpc_url.clone(),
        config.ledger.request_timeout,
    )?);

    // --- Signing identity (optional) ---
    let signer: Option<Arc<dyn TransactionSigner>> =
        match load_signer(config.private_key.as_deref(), config.keystore_path.as_deref())? {
            Some(s) => {
                info!("Registrations will be signed by {}", s.address());
                Some(Arc::new(s) as Arc<dyn TransactionSigner>)
            }
            None => {
                warn!("No SUI_PRIVATE_KEY or SUI_KEYSTORE; /api/register is disabled");
                None
            }
        };

    let app_state = transport::http::AppState {
        coordinator: Arc::new(RegistrationCoordinator::from_config(&config, ledger.clone())),
        reader: Arc::new(BlobReader::new(&config.storage)),
        ledger,
        signer,
    };

    // --- API Server Initialization ---
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(&config.api_bind_addr).await?;
    info!("API server listening on http://{}", config.api_bind_addr);
    info!("Swagger UI available at http://{}/swagger-ui", config.api_bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received (Ctrl+C)");
        })
        .await?;

    info!("Graceful shutdown complete.");
    Ok(())
}
