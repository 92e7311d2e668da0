use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;

use crate::pipeline;
use crate::render;
use crate::sources::extraction::ExtractionClient;
use crate::sources::registry::RegistryClient;

#[derive(Parser, Debug)]
#[command(
    name = "trialscout",
    version,
    about = "Match a patient conversation transcript against actively-enrolling clinical trials"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP matching server
    Serve {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Bind port
        #[arg(long, default_value = "5000")]
        port: u16,
    },

    /// Match a transcript against the trial registry
    Match {
        /// Transcript file path, or '-' to read stdin
        transcript: PathBuf,

        /// Emit JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<String> {
    match cli.command {
        Commands::Match { transcript, json } => run_match(transcript, json).await,
        Commands::Serve { .. } => anyhow::bail!("serve is handled by the binary entry point"),
    }
}

async fn run_match(path: PathBuf, json: bool) -> anyhow::Result<String> {
    let transcript = if path.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(&path).await?
    };

    let registry = RegistryClient::new()?;
    let extraction = ExtractionClient::from_env()?;
    let (patient, trials) = pipeline::match_transcript(&extraction, &registry, &transcript).await?;

    if json {
        Ok(render::json::to_pretty(&serde_json::json!({
            "patient": patient,
            "trials": trials,
        }))?)
    } else {
        Ok(render::markdown::match_report(&patient, &trials)?)
    }
}
