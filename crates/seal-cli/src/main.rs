//! seal: ChainSeal command-line client
//!
//! Commands:
//!   keygen <center-id>            - generate an RSA keypair, register the public half
//!   submit <pdf>                  - seal a paper (chunk, encrypt, store, lock, record)
//!   schedule <paper-id>           - set unlock time and custodians on a record
//!   retrieve <paper-id>           - recover a paper once authorized
//!   inspect <paper-id>            - show record metadata (no key material)
//!
//! The storage gateway and ledger are built from seal.toml; with an empty
//! endpoint both run in-memory, which only makes sense for single-process
//! demos (submit and retrieve in one run).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use seal_core::config::SealConfig;
use seal_core::types::CustodyPolicy;
use seal_crypto::{KeyShare, RecipientKeyPair, UnlockCredentials};
use seal_ledger::{Ledger, MemoryLedger};
use seal_pipeline::{retrieve, submit, RetrieveOptions, SubmitOptions};
use seal_storage::{build_operator, MirroredGateway, OpendalGateway, StorageGateway};

#[derive(Parser, Debug)]
#[command(
    name = "seal",
    version,
    about = "ChainSeal exam paper sealing client",
    long_about = "seal: encrypt, chunk, and lock exam papers for leak-proof distribution"
)]
struct Cli {
    /// Path to seal.toml configuration file
    #[arg(long, short = 'c', env = "SEAL_CONFIG", default_value = "seal.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an RSA-2048 keypair for an exam center and register the
    /// public key on the ledger. The private key stays in the output file.
    Keygen {
        /// Center identity to register under
        center_id: String,
        /// Where to write the private key PEM
        #[arg(long, short = 'o', default_value = "seal-private.pem")]
        out: PathBuf,
    },

    /// Seal a paper: chunk, encrypt, upload, lock the key, record on ledger
    Submit {
        /// The PDF to seal
        file: PathBuf,
        #[arg(long)]
        exam_name: String,
        #[arg(long)]
        subject: String,
        /// Time-lock custody: Unix timestamp at which the key unlocks
        #[arg(long, conflicts_with_all = ["recipient", "threshold"])]
        unlock_at: Option<u64>,
        /// Per-recipient custody: repeatable registered center id
        #[arg(long)]
        recipient: Vec<String>,
        /// Threshold custody (the default): "n,t" as total shares and threshold
        #[arg(long)]
        threshold: Option<String>,
    },

    /// Set the unlock time and custodian set for a recorded paper
    Schedule {
        paper_id: u64,
        #[arg(long)]
        unlock_at: u64,
        /// Repeatable custodian center id
        #[arg(long)]
        custodian: Vec<String>,
    },

    /// Recover a sealed paper once its unlock condition is satisfied
    Retrieve {
        paper_id: u64,
        /// Where to write the recovered PDF
        #[arg(long, short = 'o', default_value = "recovered.pdf")]
        out: PathBuf,
        /// Per-recipient custody: requesting center id
        #[arg(long, requires = "private_key")]
        recipient_id: Option<String>,
        /// Per-recipient custody: path to the center's private key PEM
        #[arg(long)]
        private_key: Option<PathBuf>,
        /// Threshold custody: repeatable base64 custodian share
        #[arg(long)]
        share: Vec<String>,
    },

    /// Show a paper's record metadata (never any key material)
    Inspect { paper_id: u64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        SealConfig::load(&cli.config).context("loading configuration")?
    } else {
        SealConfig::default()
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    let store = build_gateway(&config).context("building storage gateway")?;
    let ledger = MemoryLedger::load_or_default(&config.ledger.path)
        .context("loading ledger file")?;

    match cli.command {
        Commands::Keygen { center_id, out } => {
            let spinner = spinner("Generating RSA-2048 keypair...");
            let pair = RecipientKeyPair::generate()?;
            spinner.finish_and_clear();

            std::fs::write(&out, pair.private_key_pem()?)?;
            ledger
                .register_recipient_key(&center_id, pair.public_key_pem())
                .await?;
            ledger.persist(&config.ledger.path).await?;

            println!("registered {center_id}; private key written to {}", out.display());
            println!("keep the private key on this device only");
        }

        Commands::Submit {
            file,
            exam_name,
            subject,
            unlock_at,
            recipient,
            threshold,
        } => {
            let document = std::fs::read(&file)
                .with_context(|| format!("reading {}", file.display()))?;

            let custody = custody_from_flags(&config, unlock_at, recipient, threshold)?;
            let mut opts = SubmitOptions::new(exam_name, subject, custody);
            opts.max_chunk_size = config.pipeline.max_chunk_size;
            opts.concurrency = config.pipeline.concurrency;

            let spinner = spinner("Sealing paper...");
            let receipt = submit(&document, &opts, store.as_ref(), &ledger).await?;
            spinner.finish_and_clear();
            ledger.persist(&config.ledger.path).await?;

            println!("sealed {} ({} bytes, {} chunks)", receipt.paper_id, receipt.bytes, receipt.chunks);
            for id in &receipt.chunk_ids {
                println!("  chunk {id}");
            }
            if !receipt.share_handouts.is_empty() {
                println!("custodian shares (distribute one per custodian, then delete):");
                for share in &receipt.share_handouts {
                    println!("  {}", BASE64.encode(share.as_bytes()));
                }
            }
        }

        Commands::Schedule {
            paper_id,
            unlock_at,
            custodian,
        } => {
            ledger
                .schedule(seal_core::types::PaperId(paper_id), unlock_at, custodian)
                .await?;
            ledger.persist(&config.ledger.path).await?;
            println!("paper-{paper_id} scheduled for {unlock_at}");
        }

        Commands::Retrieve {
            paper_id,
            out,
            recipient_id,
            private_key,
            share,
        } => {
            let credentials = credentials_from_flags(recipient_id, private_key, share)?;
            let now = unix_now();

            let spinner = spinner("Recovering paper...");
            let document = retrieve(
                seal_core::types::PaperId(paper_id),
                &credentials,
                now,
                &RetrieveOptions {
                    concurrency: config.pipeline.concurrency,
                },
                store.as_ref(),
                &ledger,
            )
            .await?;
            spinner.finish_and_clear();

            std::fs::write(&out, &document)?;
            println!("recovered {} bytes to {}", document.len(), out.display());
        }

        Commands::Inspect { paper_id } => {
            let record = ledger
                .get_paper(seal_core::types::PaperId(paper_id))
                .await?;
            println!("{}", record.paper_id);
            println!("  exam:     {}", record.exam_name);
            println!("  subject:  {}", record.subject);
            println!("  chunks:   {}", record.chunk_ids.len());
            println!(
                "  unlock:   {}",
                record
                    .unlock_timestamp
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "unscheduled".into())
            );
            println!(
                "  centers:  {}",
                if record.custodians.is_empty() {
                    "none".to_string()
                } else {
                    record.custodians.join(", ")
                }
            );
        }
    }

    Ok(())
}

/// Build the (possibly mirrored) storage gateway from config.
fn build_gateway(config: &SealConfig) -> Result<Box<dyn StorageGateway>> {
    let primary = OpendalGateway::new(build_operator(&config.storage)?);
    if config.storage.mirrors.is_empty() {
        return Ok(Box::new(primary));
    }

    let mut mirrors: Vec<Arc<dyn StorageGateway>> = vec![Arc::new(primary)];
    for endpoint in &config.storage.mirrors {
        let mut mirror_cfg = config.storage.clone();
        mirror_cfg.endpoint = endpoint.clone();
        mirrors.push(Arc::new(OpendalGateway::new(build_operator(&mirror_cfg)?)));
    }
    Ok(Box::new(MirroredGateway::new(
        mirrors,
        Duration::from_secs(config.storage.fetch_timeout_secs),
    )?))
}

fn custody_from_flags(
    config: &SealConfig,
    unlock_at: Option<u64>,
    recipients: Vec<String>,
    threshold: Option<String>,
) -> Result<CustodyPolicy> {
    if let Some(unlock_timestamp) = unlock_at {
        return Ok(CustodyPolicy::TimeLock { unlock_timestamp });
    }
    if !recipients.is_empty() {
        return Ok(CustodyPolicy::PerRecipient {
            recipient_ids: recipients,
        });
    }
    let (total_shares, threshold) = match threshold {
        Some(raw) => {
            let (n, t) = raw
                .split_once(',')
                .context("--threshold expects \"n,t\"")?;
            (n.trim().parse()?, t.trim().parse()?)
        }
        None => (config.custody.total_shares, config.custody.threshold),
    };
    Ok(CustodyPolicy::Threshold {
        total_shares,
        threshold,
    })
}

fn credentials_from_flags(
    recipient_id: Option<String>,
    private_key: Option<PathBuf>,
    shares: Vec<String>,
) -> Result<UnlockCredentials> {
    if let (Some(recipient_id), Some(key_path)) = (recipient_id, private_key) {
        let pem = std::fs::read_to_string(&key_path)
            .with_context(|| format!("reading {}", key_path.display()))?;
        let pair = RecipientKeyPair::from_private_key_pem(&pem)?;
        return Ok(UnlockCredentials::RecipientKey {
            recipient_id,
            private_key: Box::new(pair.private_key().clone()),
        });
    }
    if !shares.is_empty() {
        let shares = shares
            .iter()
            .map(|s| Ok(KeyShare::from_bytes(BASE64.decode(s)?)))
            .collect::<Result<Vec<_>>>()?;
        return Ok(UnlockCredentials::Shares(shares));
    }
    // No key material supplied: time-lock custody.
    Ok(UnlockCredentials::Time)
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
