//! `linkpeel decode`: classify one link offline.

use anyhow::Result;
use linkpeel_core::decoder::{DecodeResult, Decoder};

pub fn run_decode(decoder: &Decoder, url: &str, json: bool) -> Result<()> {
    let result = decoder.decode(url);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    match result {
        DecodeResult::Wrapped {
            service,
            original_url,
        } => {
            println!("wrapped by {service}");
            println!("{original_url}");
        }
        DecodeResult::Shortened { service, hostname } => {
            println!("shortened ({service}, host {hostname})");
            println!("run `linkpeel resolve` to expand it");
        }
        DecodeResult::NotObfuscated => match decoder.identify_service(url) {
            Some(service) => println!("protected by {service}, but no destination could be extracted"),
            None => println!("not obfuscated"),
        },
    }
    Ok(())
}
