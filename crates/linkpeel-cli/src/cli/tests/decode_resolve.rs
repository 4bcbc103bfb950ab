//! Tests for decode and resolve subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_decode() {
    match parse(&["linkpeel", "decode", "https://t.co/abc"]) {
        CliCommand::Decode { url, json } => {
            assert_eq!(url, "https://t.co/abc");
            assert!(!json);
        }
        _ => panic!("expected Decode"),
    }
}

#[test]
fn cli_parse_decode_json() {
    match parse(&["linkpeel", "decode", "--json", "https://t.co/abc"]) {
        CliCommand::Decode { json, .. } => assert!(json),
        _ => panic!("expected Decode with --json"),
    }
}

#[test]
fn cli_parse_resolve_defaults() {
    match parse(&["linkpeel", "resolve", "https://bit.ly/x"]) {
        CliCommand::Resolve {
            url,
            timeout_secs,
            http_only,
            force,
        } => {
            assert_eq!(url, "https://bit.ly/x");
            assert!(timeout_secs.is_none());
            assert!(!http_only);
            assert!(!force);
        }
        _ => panic!("expected Resolve"),
    }
}

#[test]
fn cli_parse_resolve_flags() {
    match parse(&[
        "linkpeel",
        "resolve",
        "https://go.example/x",
        "--timeout-secs",
        "5",
        "--http-only",
        "--force",
    ]) {
        CliCommand::Resolve {
            timeout_secs,
            http_only,
            force,
            ..
        } => {
            assert_eq!(timeout_secs, Some(5));
            assert!(http_only);
            assert!(force);
        }
        _ => panic!("expected Resolve with flags"),
    }
}

#[test]
fn cli_parse_resolve_rejects_bad_timeout() {
    assert!(Cli::try_parse_from(["linkpeel", "resolve", "https://bit.ly/x", "--timeout-secs", "soon"]).is_err());
}

#[test]
fn cli_parse_decode_requires_url() {
    assert!(Cli::try_parse_from(["linkpeel", "decode"]).is_err());
}
