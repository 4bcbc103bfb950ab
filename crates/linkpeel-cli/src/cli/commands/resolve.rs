//! `linkpeel resolve`: unwrap, then expand shorteners over the network.

use anyhow::{bail, Result};
use linkpeel_core::config::LinkpeelConfig;
use linkpeel_core::decoder::{DecodeResult, Decoder};
use linkpeel_core::resolver::{ResolutionOutcome, ResolveMode, ShortenerResolver};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveArgs {
    pub timeout_secs: Option<u64>,
    pub http_only: bool,
    pub force: bool,
}

pub async fn run_resolve(
    cfg: &LinkpeelConfig,
    decoder: &Decoder,
    url: &str,
    args: ResolveArgs,
) -> Result<()> {
    let target = match decoder.decode(url) {
        DecodeResult::Wrapped {
            service,
            original_url,
        } => {
            eprintln!("unwrapped {service}");
            original_url
        }
        _ => url.trim().to_string(),
    };

    let shortened = matches!(decoder.decode(&target), DecodeResult::Shortened { .. });
    if !shortened && !args.force {
        println!("{target}");
        return Ok(());
    }

    let mut options = cfg.resolver.to_options();
    if let Some(secs) = args.timeout_secs {
        options.timeout = Duration::from_secs(secs.max(1));
    }
    let mode = if args.http_only {
        ResolveMode::Http
    } else {
        ResolveMode::Auto
    };

    let resolver = ShortenerResolver::with_curl(options);
    let outcome = resolver
        .resolve_with_mode(&target, mode, |status| eprintln!("  {status}"))
        .await;
    match outcome {
        ResolutionOutcome::Resolved { final_url, method } => {
            tracing::debug!(%target, %final_url, method = method.as_str(), "cli resolve done");
            println!("{final_url}");
            Ok(())
        }
        ResolutionOutcome::Failed { reason } if reason.is_timeout() => {
            bail!("timed out resolving {target}; try again or raise --timeout-secs")
        }
        ResolutionOutcome::Failed { reason } => bail!("could not resolve {target}: {reason}"),
    }
}
