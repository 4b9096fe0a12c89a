//! Command line client for the claim registry.
//!
//! Every subcommand builds its collaborators from the environment (see `.env`),
//! runs one flow and prints the result as JSON on stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;

use faceguard::crypto::{load_signer, Ed25519Signer, FaceLandmarks, FingerprintDeriver};
use faceguard::domain::model::Lookup;
use faceguard::infra::cancel::{cancel_pair, CancelSignal};
use faceguard::infra::config::AppConfig;
use faceguard::infra::logging::init_tracing;
use faceguard::infra::sui::{SuiRpcClient, TransactionSigner};
use faceguard::infra::walrus::BlobReader;
use faceguard::RegistrationCoordinator;

#[derive(Parser)]
#[command(name = "faceguard")]
#[command(about = "Register and verify ownership claims on image fingerprints")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the fingerprint of an image (or of a landmark JSON file)
    Fingerprint {
        path: PathBuf,
        /// Treat the file as detector landmarks and fingerprint their canonical form
        #[arg(long)]
        landmarks: bool,
    },
    /// Store a file on the first publisher that accepts it
    Upload { path: PathBuf },
    /// Read a blob back from the aggregators
    FetchBlob {
        blob_id: String,
        /// Write the bytes here instead of reporting their size
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Upload an image and mint a claim on its fingerprint
    Register {
        path: PathBuf,
        /// Claim owner; must be the signer's address
        #[arg(long)]
        requester: Option<String>,
    },
    /// Check whether an image is already claimed
    Verify { path: PathBuf },
    /// Show a claim object by id
    ShowClaim { claim_id: String },
    /// List claims held by an address
    Claims { address: String },
    /// Print the configured signer's address
    Address,
    /// Generate a new key and print it in keystore form
    Keygen,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_file(path: &PathBuf) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn signer_from(config: &AppConfig) -> anyhow::Result<Ed25519Signer> {
    load_signer(config.private_key.as_deref(), config.keystore_path.as_deref())?
        .ok_or_else(|| anyhow!("no signing key: set SUI_PRIVATE_KEY or SUI_KEYSTORE"))
}

fn coordinator_from(config: &AppConfig) -> anyhow::Result<RegistrationCoordinator> {
    let ledger = SuiRpcClient::new(config.ledger.rpc_url.clone(), config.ledger.request_timeout)?;
    Ok(RegistrationCoordinator::from_config(config, Arc::new(ledger)))
}

/// Cancels the returned signal on Ctrl+C.
fn cancel_on_ctrl_c() -> CancelSignal {
    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling");
            handle.cancel();
        }
    });
    signal
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Command::Fingerprint { path, landmarks } => {
            let bytes = read_file(&path)?;
            let deriver = FingerprintDeriver::new();
            let fingerprint = if landmarks {
                let parsed: FaceLandmarks = serde_json::from_slice(&bytes)
                    .with_context(|| format!("{} is not a landmark JSON file", path.display()))?;
                deriver.derive_landmarks(&parsed)?
            } else {
                deriver.derive(&bytes)?
            };
            println!("{}", fingerprint);
        }
        Command::Upload { path } => {
            let bytes = read_file(&path)?;
            let coordinator = coordinator_from(&config)?;
            let blob = coordinator
                .uploader()
                .upload(
                    &bytes,
                    coordinator.endpoints(),
                    coordinator.epochs(),
                    &cancel_on_ctrl_c(),
                )
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            print_json(&blob)?;
        }
        Command::FetchBlob { blob_id, out } => {
            let reader = BlobReader::new(&config.storage);
            let bytes = reader
                .fetch(&blob_id)
                .await
                .map_err(|e| anyhow!(e.user_message()))?
                .ok_or_else(|| anyhow!("blob {} not found", blob_id))?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &bytes)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => println!("{} bytes ({})", bytes.len(), reader.blob_url(&blob_id)?),
            }
        }
        Command::Register { path, requester } => {
            let bytes = read_file(&path)?;
            let signer = signer_from(&config)?;
            let requester = requester.unwrap_or_else(|| signer.address());
            let coordinator = coordinator_from(&config)?;
            let registration = coordinator
                .register(&bytes, &requester, &signer, &cancel_on_ctrl_c())
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            print_json(&registration)?;
        }
        Command::Verify { path } => {
            let bytes = read_file(&path)?;
            let coordinator = coordinator_from(&config)?;
            match coordinator
                .verify(&bytes)
                .await
                .map_err(|e| anyhow!(e.user_message()))?
            {
                Lookup::Found(claim) => print_json(&claim)?,
                Lookup::NotFound(window) => println!(
                    "not claimed (searched the {} most recent registrations, limit {})",
                    window.events_scanned, window.page_limit
                ),
            }
        }
        Command::ShowClaim { claim_id } => {
            let coordinator = coordinator_from(&config)?;
            let claim = coordinator
                .index()
                .fetch_claim(&claim_id)
                .await
                .map_err(|e| anyhow!(e.user_message()))?
                .ok_or_else(|| anyhow!("claim {} not found", claim_id))?;
            print_json(&claim)?;
        }
        Command::Claims { address } => {
            let coordinator = coordinator_from(&config)?;
            let claims = coordinator
                .index()
                .claims_owned_by(&address)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            print_json(&claims)?;
        }
        Command::Address => {
            println!("{}", signer_from(&config)?.address());
        }
        Command::Keygen => {
            let signer = Ed25519Signer::generate();
            print_json(&serde_json::json!({
                "address": signer.address(),
                "keystore_entry": signer.to_keystore_entry(),
            }))?;
        }
    }

    Ok(())
}
