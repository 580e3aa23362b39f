use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use tracing::info;

use hsm_engine::{EngineConfig, Keypair, PublicKey};

#[derive(Parser, Debug)]
#[command(name = "hsm-engine")]
#[command(about = "Load keys from an HSM through an OpenSSL engine", version)]
pub struct Cli {
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Engine id, e.g. pkcs11
    #[arg(long, env = "HSM_ENGINE_ID", global = true)]
    pub engine_id: Option<String>,

    /// Path of the PKCS#11 module the engine should load
    #[arg(long, env = "HSM_MODULE_PATH", global = true)]
    pub module_path: Option<String>,

    /// Token PIN
    #[arg(long, env = "HSM_PIN", hide_env_values = true, global = true)]
    pub pin: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a public key and print its type and size
    PublicKey {
        /// Key identifier understood by the engine, e.g. a PKCS#11 URI
        #[arg(long)]
        key_id: String,
    },

    /// Load a private key and print its type and size
    PrivateKey {
        /// Key identifier understood by the engine, e.g. a PKCS#11 URI
        #[arg(long)]
        key_id: String,
    },
}

impl Cli {
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let engine_id = self
            .engine_id
            .clone()
            .context("missing engine id (--engine-id or HSM_ENGINE_ID)")?;
        let module_path = self
            .module_path
            .clone()
            .context("missing module path (--module-path or HSM_MODULE_PATH)")?;
        let pin = self
            .pin
            .clone()
            .context("missing PIN (--pin or HSM_PIN)")?;
        Ok(EngineConfig::new(engine_id, module_path, pin))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = cli.engine_config()?;
    let engine = hsm_engine::open_engine(&config)
        .with_context(|| format!("failed to open engine {}", config.engine_id))?;

    match &cli.command {
        Commands::PublicKey { key_id } => {
            let key = PublicKey::from_hsm(&engine, key_id)
                .with_context(|| format!("failed to load public key {}", key_id))?;
            let size = key.size().context("failed to query key size")?;
            println!("{} {}", key.key_type(), size);
        }
        Commands::PrivateKey { key_id } => {
            let keypair = Keypair::from_hsm(&engine, key_id)
                .with_context(|| format!("failed to load private key {}", key_id))?;
            let size = keypair.size().context("failed to query key size")?;
            println!("{} {}", keypair.key_type(), size);
        }
    }

    info!("Finished");
    Ok(())
}
