//! Simple MultiSig CLI Application
//!
//! A command-line interface for running an M-of-N vault against an
//! in-process ledger.

use clap::{Parser, Subcommand};
use simple_multisig::cli::{self, AppState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisig")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A minimal M-of-N multisig vault in Rust", long_about = None)]
struct Cli {
    /// Data directory for vault storage
    #[arg(short, long, default_value = ".multisig_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new owner key
    Keygen,

    /// Initialize a new vault
    Init {
        /// Owner addresses in ascending order (comma-separated)
        #[arg(short, long)]
        owners: String,

        /// Number of signatures required per transaction
        #[arg(short, long)]
        threshold: usize,

        /// Network identifier bound into every signature
        #[arg(short, long, default_value = "1")]
        network_id: u64,

        /// Vault address (random if omitted)
        #[arg(long)]
        instance: Option<String>,
    },

    /// Send value into the vault
    Deposit {
        /// Sender's address
        #[arg(short, long)]
        from: String,

        /// Amount to deposit
        #[arg(short, long)]
        amount: u128,
    },

    /// Show the digest owners must sign for the next transaction
    Hash {
        #[command(flatten)]
        tx: TxArgs,
    },

    /// Sign the next transaction with an owner key
    Sign {
        /// Owner private key (hex)
        #[arg(short, long)]
        key: String,

        #[command(flatten)]
        tx: TxArgs,
    },

    /// Submit signatures and execute the transaction
    Execute {
        /// Signatures in ascending signer order (comma-separated hex)
        #[arg(short, long)]
        sigs: String,

        #[command(flatten)]
        tx: TxArgs,
    },

    /// Display vault status
    Status,
}

#[derive(clap::Args)]
struct TxArgs {
    /// Destination address
    #[arg(long)]
    to: String,

    /// Value to send
    #[arg(long, default_value = "0")]
    value: u128,

    /// Call data (hex)
    #[arg(long)]
    data: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Handle commands that don't need a loaded vault
    match &cli.command {
        Commands::Keygen => return cli::cmd_keygen(),
        Commands::Init {
            owners,
            threshold,
            network_id,
            instance,
        } => {
            return cli::cmd_init(
                &cli.data_dir,
                owners,
                *threshold,
                *network_id,
                instance.as_deref(),
            );
        }
        _ => {}
    }

    let mut state = AppState::load(&cli.data_dir)?;

    match cli.command {
        Commands::Keygen | Commands::Init { .. } => unreachable!(),

        Commands::Deposit { from, amount } => {
            cli::cmd_deposit(&mut state, &from, amount)?;
        }

        Commands::Hash { tx } => {
            let intent = cli::parse_intent(&tx.to, tx.value, tx.data.as_deref())?;
            cli::cmd_hash(&state, &intent)?;
        }

        Commands::Sign { key, tx } => {
            let intent = cli::parse_intent(&tx.to, tx.value, tx.data.as_deref())?;
            cli::cmd_sign(&state, &key, &intent)?;
        }

        Commands::Execute { sigs, tx } => {
            let intent = cli::parse_intent(&tx.to, tx.value, tx.data.as_deref())?;
            cli::cmd_execute(&mut state, &intent, &sigs)?;
        }

        Commands::Status => {
            cli::cmd_status(&state)?;
        }
    }

    Ok(())
}
