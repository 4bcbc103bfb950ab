//! `linkpeel serve`: JSON-lines action protocol for a mail-client front end.
//!
//! stdout is reserved for responses; everything human-readable goes to stderr.

use anyhow::{bail, Context, Result};
use linkpeel_core::config::LinkpeelConfig;
use linkpeel_core::decoder::payload::is_httpish;
use linkpeel_core::decoder::Decoder;
use linkpeel_core::protocol::{Dispatcher, Host};
use linkpeel_core::resolver::ShortenerResolver;
use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use tokio::io::BufReader;

/// Desktop host: opens links with `xdg-open`, shows popups and progress on stderr.
struct DesktopHost;

impl Host for DesktopHost {
    fn open_url(&self, url: &str) -> Result<()> {
        if !is_httpish(url) {
            bail!("refusing to open non-web url: {url}");
        }
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        spawn_detached(cmd).context("launching xdg-open")?;
        Ok(())
    }

    fn show_popup(&self, original: &str, clean: &str) -> Result<()> {
        eprintln!("wrapped: {original}");
        eprintln!("clean:   {clean}");
        Ok(())
    }

    fn progress(&self, status: &str) {
        eprintln!("[resolve] {status}");
    }
}

/// Spawns `cmd` with null stdio and reaps it on a background thread so
/// finished launchers never linger as zombies.
fn spawn_detached(mut cmd: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(thread::spawn(move || {
        let status = child.wait();
        if let Ok(status) = &status {
            if !status.success() {
                tracing::warn!(%status, "launcher exited with failure");
            }
        }
        status
    }))
}

pub async fn run_serve(cfg: &LinkpeelConfig, decoder: Decoder) -> Result<()> {
    let resolver = ShortenerResolver::with_curl(cfg.resolver.to_options());
    let dispatcher = Dispatcher::with_decoder(DesktopHost, resolver, decoder);

    tracing::info!("serving action protocol on stdin/stdout");
    let handled = dispatcher
        .serve_lines(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    tracing::info!(handled, "stdin closed, serve loop finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn launched_child_is_reaped() {
        let reaper = spawn_detached(Command::new("true")).unwrap();
        let status = reaper.join().unwrap().unwrap();
        assert!(status.success());
    }

    #[test]
    fn missing_launcher_is_an_error() {
        assert!(spawn_detached(Command::new("linkpeel-no-such-launcher")).is_err());
    }

    #[test]
    fn non_web_urls_are_refused() {
        let err = DesktopHost.open_url("file:///etc/passwd").unwrap_err();
        assert!(err.to_string().contains("non-web url"));
    }
}
