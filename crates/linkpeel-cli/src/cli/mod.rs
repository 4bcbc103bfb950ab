//! CLI for the linkpeel link deobfuscator.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use linkpeel_core::config::{self, LinkpeelConfig};
use linkpeel_core::decoder::{Decoder, BUILTIN_RULES};
use std::path::PathBuf;

use commands::{run_decode, run_resolve, run_scan, run_serve, ResolveArgs};

/// Top-level CLI for linkpeel.
#[derive(Debug, Parser)]
#[command(name = "linkpeel")]
#[command(about = "linkpeel: unwrap email link protection and expand short links", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Classify a link and print the original destination if it is wrapped.
    Decode {
        /// Link as it appears in the message.
        url: String,
        /// Print the classification as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Unwrap a link, then follow it over the network if it is a shortener.
    Resolve {
        /// Link as it appears in the message.
        url: String,
        /// Override the configured resolution timeout.
        #[arg(long, value_name = "N")]
        timeout_secs: Option<u64>,
        /// Only trust HTTP redirects; never inspect the page.
        #[arg(long)]
        http_only: bool,
        /// Resolve even if the host is not a known shortener.
        #[arg(long)]
        force: bool,
    },

    /// List wrapped and shortened links in an .eml, .html or .txt file.
    Scan {
        /// Path to the message file.
        path: PathBuf,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Serve the JSON-lines action protocol on stdin/stdout.
    Serve,
}

/// Built-in wrapper rules with the configured shortener registry.
fn decoder_for(cfg: &LinkpeelConfig) -> Decoder {
    Decoder::new(BUILTIN_RULES, cfg.shortener_registry())
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let decoder = decoder_for(&cfg);

        match cli.command {
            CliCommand::Decode { url, json } => run_decode(&decoder, &url, json)?,
            CliCommand::Resolve {
                url,
                timeout_secs,
                http_only,
                force,
            } => {
                let args = ResolveArgs {
                    timeout_secs,
                    http_only,
                    force,
                };
                run_resolve(&cfg, &decoder, &url, args).await?;
            }
            CliCommand::Scan { path, json } => run_scan(&decoder, &path, json)?,
            CliCommand::Serve => run_serve(&cfg, decoder).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
