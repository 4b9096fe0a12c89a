use tracing::{info, warn};

use faceguard::crypto::load_signer;
use faceguard::infra::cancel::CancelSignal;
use faceguard::infra::config::AppConfig;
use faceguard::infra::logging::init_tracing;
use faceguard::infra::sui::{LedgerClient, SuiRpcClient, TransactionSigner};
use faceguard::infra::walrus::BlobUploader;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--probe-upload]\n\
         \n\
         Reads the same env vars as the service:\n\
           SUI_RPC_URL, FACEGUARD_PACKAGE_ID, WALRUS_PUBLISHERS, WALRUS_EPOCHS\n\
         And optionally a signing key:\n\
           SUI_PRIVATE_KEY or SUI_KEYSTORE\n\
         \n\
         --probe-upload stores a tiny blob to check that a publisher accepts writes.\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let probe_upload = args.iter().any(|a| a == "--probe-upload");

    let config = AppConfig::from_env()?;

    info!("Preflight:");
    info!("  SUI_RPC_URL={}", config.ledger.rpc_url);
    info!("  FACEGUARD_PACKAGE_ID={}", config.contract.package_id);
    info!("  publishers={} aggregators={}", config.storage.publishers.len(), config.storage.aggregators.len());
    info!("  ALLOW_PROVISIONAL_BLOB={}", config.allow_provisional_blob);

    let ledger = SuiRpcClient::new(config.ledger.rpc_url.clone(), config.ledger.request_timeout)?;

    // Basic RPC connectivity
    let chain = ledger.chain_identifier().await?;
    info!("  Chain identifier: {}", chain);

    // Contract package existence
    match ledger.fetch_object(&config.contract.package_id).await? {
        Some(object) if object.object_type == "package" => {
            info!("  Package {} is published.", config.contract.package_id)
        }
        Some(object) => {
            return Err(anyhow::anyhow!(
                "FACEGUARD_PACKAGE_ID points at a {} object, not a package",
                object.object_type
            ))
        }
        None => {
            return Err(anyhow::anyhow!(
                "Package {} not found on this network",
                config.contract.package_id
            ))
        }
    }

    // Event log readable
    let events = ledger
        .query_events(&config.contract.event_type(), config.ledger.event_scan_limit)
        .await?;
    info!("  {} recent registration events visible.", events.len());

    // Signing identity
    match load_signer(config.private_key.as_deref(), config.keystore_path.as_deref())? {
        Some(signer) => info!("  Signer: {}", signer.address()),
        None => warn!("  No signing key configured; registration will be unavailable."),
    }

    if probe_upload {
        let uploader = BlobUploader::new(&config.storage);
        let probe = format!("faceguard preflight {}", chrono::Utc::now().to_rfc3339());
        let blob = uploader
            .upload(
                probe.as_bytes(),
                &config.storage.publishers,
                1,
                &CancelSignal::never(),
            )
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
        info!("  Publisher {} accepted a probe blob ({}).", blob.endpoint, blob.blob_id);
    }

    info!("Preflight OK.");
    Ok(())
}
