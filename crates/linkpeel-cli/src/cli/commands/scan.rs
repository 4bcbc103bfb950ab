//! `linkpeel scan`: list the obfuscated links in a message file.

use anyhow::{Context, Result};
use linkpeel_core::decoder::{DecodeResult, Decoder};
use linkpeel_core::scan::{scan_text_with, ScanReport};
use std::fs;
use std::path::Path;

pub fn run_scan(decoder: &Decoder, path: &Path, json: bool) -> Result<()> {
    let report = scan_file(decoder, path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} links, {}",
        report.total_links,
        report
            .warning_label()
            .unwrap_or_else(|| "no obfuscated links detected".to_string())
    );
    for finding in &report.findings {
        match &finding.result {
            DecodeResult::Wrapped {
                service,
                original_url,
            } => {
                println!("wrapped   {service}");
                println!("  {}", finding.link);
                println!("  -> {original_url}");
            }
            DecodeResult::Shortened { service, .. } => {
                println!("shortened {service}");
                println!("  {}", finding.link);
            }
            DecodeResult::NotObfuscated => {}
        }
    }
    Ok(())
}

fn scan_file(decoder: &Decoder, path: &Path) -> Result<ScanReport> {
    let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut body = String::from_utf8_lossy(&raw).into_owned();
    if is_eml(path) {
        body = unfold_quoted_printable(&body);
    }
    Ok(scan_text_with(decoder, &body))
}

fn is_eml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("eml"))
}

/// Joins quoted-printable soft line breaks and restores `=3D`, enough to keep
/// long links in a .eml body intact.
pub(crate) fn unfold_quoted_printable(body: &str) -> String {
    body.replace("=\r\n", "")
        .replace("=\n", "")
        .replace("=3D", "=")
        .replace("=3d", "=")
}
