//! command-line wrapper around the synchronizer and the user-state read
//! model.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use unirep_chain::mock::MockChain;
use unirep_prover::mock::MockProver;
use unirep_store::Store;
use unirep_sync::{Ingestor, SyncConfig, TracingObserver};
use unirep_tree::PoseidonStub;
use unirep_types::FieldElement;
use unirep_userstate::UserState;

#[derive(Parser)]
#[command(name = "unirep")]
#[command(about = "Synchronizer and user-state read model for the UniRep protocol")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// create an empty store at `db_path`, seeded with epoch 0
    Init {
        #[arg(long, default_value = "unirep.db")]
        db_path: PathBuf,
    },

    /// print the sync cursor, current epoch, and GST leaf count
    Status {
        #[arg(long, default_value = "unirep.db")]
        db_path: PathBuf,
    },

    /// run the ingestor loop until Ctrl-C.
    ///
    /// no production RPC/prover backend ships in this workspace: this
    /// drives the real ingestor and handler pipeline against the
    /// in-memory chain/prover fixtures, which is useful as a local demo
    /// and as a smoke test of a config file end to end.
    Run {
        /// path to a TOML file deserializing to `SyncConfig`; defaults are
        /// used for any field a partial file omits
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// print one identity's folded reputation against an attester
    Reputation {
        #[arg(long, default_value = "unirep.db")]
        db_path: PathBuf,
        #[arg(long)]
        identity_nullifier: FieldElement,
        #[arg(long)]
        id_commitment: FieldElement,
        #[arg(long)]
        attester_id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("unirep=info".parse().unwrap()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Init { db_path } => init(&db_path),
        Command::Status { db_path } => status(&db_path),
        Command::Run { config } => run(config).await,
        Command::Reputation { db_path, identity_nullifier, id_commitment, attester_id } => {
            reputation(&db_path, identity_nullifier, id_commitment, attester_id)
        }
    }
}

fn init(db_path: &PathBuf) -> Result<()> {
    let store = Store::open(db_path).with_context(|| format!("opening store at {}", db_path.display()))?;
    if store.latest_epoch()?.is_none() {
        store.transaction(|txn| txn.put_epoch(&unirep_store::Epoch::unsealed(0, 0)))?;
    }
    store.flush()?;
    tracing::info!(path = %db_path.display(), "store initialized");
    Ok(())
}

fn status(db_path: &PathBuf) -> Result<()> {
    let store = Store::open(db_path).with_context(|| format!("opening store at {}", db_path.display()))?;
    let epoch = store.latest_epoch()?.context("no epoch row yet; run `init` first")?;
    let cursor = store.get_sync_state()?;
    let leaves = store.gst_leaf_count(epoch.number)?;

    println!("current epoch:   {}", epoch.number);
    println!("epoch sealed:    {}", epoch.sealed);
    println!("gst leaf count:  {}", leaves);
    println!(
        "cursor:          block {} tx {} log {}",
        cursor.latest_processed_block, cursor.latest_processed_transaction_index, cursor.latest_processed_log_index
    );
    Ok(())
}

async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SyncConfig::default(),
    };

    let store = Store::open(&config.db_path).with_context(|| format!("opening store at {}", config.db_path))?;
    let chain = Arc::new(MockChain::new(0));
    let prover = Arc::new(MockProver::new(true));
    let observer = Arc::new(TracingObserver);

    let mut ingestor = Ingestor::new(store, chain, prover, observer, PoseidonStub, config)?;

    let stop = CancellationToken::new();
    let signal_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c, shutting down");
            signal_stop.cancel();
        }
    });

    ingestor.run(stop).await.context("ingestor loop exited with an error")
}

fn reputation(db_path: &PathBuf, identity_nullifier: FieldElement, id_commitment: FieldElement, attester_id: u64) -> Result<()> {
    let store = Store::open(db_path).with_context(|| format!("opening store at {}", db_path.display()))?;
    let hasher = PoseidonStub;
    let params = unirep_sync::ProtocolParams::default();
    let user_state = UserState::new(&store, &hasher, params, identity_nullifier, id_commitment);
    let rep = user_state.reputation(attester_id)?;

    println!("pos_rep:  {}", rep.pos_rep);
    println!("neg_rep:  {}", rep.neg_rep);
    println!("graffiti: {}", rep.graffiti);
    println!("sign_up:  {}", rep.sign_up);
    Ok(())
}
