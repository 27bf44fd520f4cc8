use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use permchain::{AdminSettings, Address, FuncSig, GenesisConfig, Transaction};

#[derive(Parser)]
#[command(name = "permchain_admin")]
#[command(about = "Permchain access-control administration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a standard genesis document
    Genesis {
        /// Account granted every built-in management permission
        #[arg(long)]
        super_admin: Address,

        /// Initial consensus node (repeatable)
        #[arg(long = "node")]
        nodes: Vec<Address>,

        /// Node manager admin (repeatable)
        #[arg(long = "admin")]
        admins: Vec<Address>,
    },

    /// Apply a transaction list to a genesis state and print the receipts
    Replay {
        /// Genesis JSON; falls back to the `genesis` setting
        #[arg(long)]
        genesis: Option<PathBuf>,

        /// JSON array of `{caller, height, call, ...}` transactions
        #[arg(long)]
        txs: PathBuf,
    },

    /// Print the 4-byte selector of a function signature
    Selector { signature: String },
}

fn main() -> Result<()> {
    let settings = AdminSettings::load().context("Failed to load permchain settings")?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Genesis {
            super_admin,
            nodes,
            admins,
        } => {
            let config = GenesisConfig::standard(super_admin, nodes, admins);
            // Reject configurations that would not boot
            config.build().context("Generated genesis is invalid")?;
            println!("{}", config.to_json_pretty()?);
        }
        Commands::Replay { genesis, txs } => {
            let genesis_path = match genesis.or(settings.genesis) {
                Some(path) => path,
                None => bail!("No genesis file given (use --genesis or PERMCHAIN_GENESIS)"),
            };
            let config = GenesisConfig::load(&genesis_path)
                .with_context(|| format!("Loading genesis from {}", genesis_path.display()))?;
            let mut runtime = config.build().context("Building genesis state")?;

            let raw = std::fs::read_to_string(&txs)
                .with_context(|| format!("Reading transactions from {}", txs.display()))?;
            let transactions: Vec<Transaction> =
                serde_json::from_str(&raw).context("Malformed transaction list")?;

            for (index, result) in runtime.replay(&transactions).into_iter().enumerate() {
                match result {
                    Ok(receipt) => println!("{}", serde_json::to_string(&receipt)?),
                    Err(e) => {
                        warn!("Transaction {} rejected ({:?})", index, e.kind());
                        println!("{}", serde_json::json!({ "index": index, "error": e.to_string() }));
                    }
                }
            }

            let root = runtime.state_root_hex().context("Encoding final state")?;
            info!("Applied {} transactions", transactions.len());
            println!("state_root {}", root);
        }
        Commands::Selector { signature } => {
            if !signature.contains('(') || !signature.ends_with(')') {
                bail!("Expected a signature like `transfer(address,uint256)`");
            }
            println!("{}", FuncSig::from_signature(&signature));
        }
    }

    Ok(())
}
