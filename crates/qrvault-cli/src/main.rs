//! QR Vault command-line interface
//!
//! Stores QR payloads encrypted under a device key and shows each one's
//! category and fingerprint input. Fingerprints are printed as the SHA-256 of
//! the fingerprint input in place of an image.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use qrvault_core::{
    canonicalize, classify, fingerprint_input, AccountMap, Category, FingerprintRenderer,
};
use qrvault_storage::{FileKeystore, KeyStatus, SqliteRecordStore, Vault, VaultConfig, VaultEntry};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "qrvault")]
#[command(about = "Encrypted storage for QR code payloads", long_about = None)]
struct Cli {
    /// Vault data directory (overrides QRVAULT_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vault key if it does not exist
    Init,

    /// Encrypt and store a payload
    Add {
        /// Label shown in listings
        #[arg(short, long)]
        label: String,

        /// Payload text
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the payload from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List stored records
    List {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Decrypt and print a record
    Show {
        /// Record id
        id: Uuid,
    },

    /// Delete a record
    Delete {
        /// Record id
        id: Uuid,
    },

    /// Classify a payload read from stdin (no storage access)
    Classify,

    /// Print the canonical form of an output descriptor
    Canonicalize {
        /// Descriptor text
        descriptor: String,
    },

    /// Print the fingerprint digest of a record
    Fingerprint {
        /// Record id
        id: Uuid,
    },

    /// Delete every record and the vault key
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

/// Stand-in for the visual fingerprint generator
struct DigestRenderer;

impl FingerprintRenderer for DigestRenderer {
    type Output = String;

    fn render(&self, input: &[u8]) -> String {
        hex::encode(Sha256::digest(input))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli.command, cli.data_dir)
}

fn open_vault(data_dir: Option<PathBuf>) -> anyhow::Result<Vault> {
    let config = VaultConfig::resolve(data_dir.as_deref());
    tracing::debug!("Using data directory {}", config.data_dir.display());
    config
        .ensure_dirs()
        .with_context(|| format!("creating {}", config.data_dir.display()))?;

    let keystore = FileKeystore::open(&config.keystore_dir).context("opening keystore")?;
    let store = SqliteRecordStore::open(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    Vault::open(Arc::new(keystore), Arc::new(store)).context("opening vault")
}

fn run(command: Commands, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let vault = || open_vault(data_dir.clone());

    match command {
        Commands::Classify => run_classify()?,
        Commands::Canonicalize { descriptor } => run_canonicalize(&descriptor)?,
        Commands::Init => match vault()?.initialize()? {
            KeyStatus::Created => println!("Created new vault key"),
            KeyStatus::Existing => println!("Vault key already exists"),
        },
        Commands::Add { label, text, file } => {
            let payload = match (text, file) {
                (Some(text), _) => text.into_bytes(),
                (None, Some(path)) => std::fs::read(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => read_stdin()?,
            };
            let record = vault()?.add(&label, &payload)?;
            println!(
                "{}\t{}",
                record.id(),
                record.cached_type().unwrap_or(Category::Unknown.label())
            );
        }
        Commands::List { json } => {
            let entries = vault()?.entries()?;
            if json {
                let rows: Vec<_> = entries.iter().map(entry_json).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for entry in &entries {
                    println!(
                        "{}\t{}\t{}\t{}",
                        entry.record.id(),
                        entry.record.display_date(),
                        entry.type_label(),
                        entry.record.display_label()
                    );
                }
            }
        }
        Commands::Show { id } => {
            let vault = vault()?;
            let record = vault.record(id)?;
            let payload = vault.reveal(id)?;
            println!("Label: {}", record.label());
            println!("Type:  {}", record.cached_type().unwrap_or(classify(&payload).label()));
            match std::str::from_utf8(&payload) {
                Ok(text) => println!("{}", text),
                Err(_) => println!("{}", hex::encode(payload.as_slice())),
            }
        }
        Commands::Delete { id } => {
            vault()?.delete(id)?;
            println!("Deleted {}", id);
        }
        Commands::Fingerprint { id } => {
            let vault = vault()?;
            let entry = vault
                .entries()?
                .into_iter()
                .find(|e| e.record.id() == id)
                .with_context(|| format!("record {} not found", id))?;
            match vault.render_fingerprint(&entry, &DigestRenderer) {
                Some(digest) => println!("{}", digest),
                None => bail!("record {} is unreadable", id),
            }
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("refusing to reset without --yes; this permanently deletes every record");
            }
            vault()?.reset()?;
            println!("Vault reset");
        }
    }
    Ok(())
}

fn entry_json(entry: &VaultEntry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.record.id().to_string(),
        "label": entry.record.label(),
        "date_added": entry.record.date_added().to_rfc3339(),
        "type": entry.type_label(),
        "fingerprint": entry.fingerprint_input().map(|input| DigestRenderer.render(input)),
    })
}

fn run_classify() -> anyhow::Result<()> {
    let payload = read_stdin()?;
    let category = classify(&payload);
    println!("{}", category);

    if category == Category::AccountMap {
        let map = AccountMap::parse(&payload)?;
        match map.canonical_descriptor() {
            Ok(canonical) => println!("{}", canonical),
            Err(e) => eprintln!("{}", e.user_message()),
        }
    }
    println!("{}", DigestRenderer.render(&fingerprint_input(&payload, category)));
    Ok(())
}

fn run_canonicalize(descriptor: &str) -> anyhow::Result<()> {
    let canonical = canonicalize(descriptor.trim()).context("invalid descriptor")?;
    println!("{}", canonical);
    Ok(())
}

fn read_stdin() -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .context("reading stdin")?;
    Ok(buf)
}
