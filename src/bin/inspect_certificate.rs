//! Inspect an X.509 Certificate
//!
//! Decodes a PEM or DER certificate file and prints its subject, issuer,
//! validity, fingerprint, key and extensions as JSON.
//!
//! Usage:
//!   cargo run --release --bin inspect_certificate -- signer.pem

use chrono::Utc;
use pdfsig_oxide::inspect_certificate;
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("Usage: inspect_certificate <certificate.pem|certificate.der>");
        return ExitCode::from(2);
    };

    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error reading {}: {}", path, e);
            return ExitCode::FAILURE;
        },
    };

    let inspection = match inspect_certificate(&data, Utc::now()) {
        Ok(inspection) => inspection,
        Err(e) => {
            eprintln!("Error: {}: {}", path, e);
            return ExitCode::FAILURE;
        },
    };

    match serde_json::to_string_pretty(&inspection) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error serializing inspection: {}", e);
            ExitCode::FAILURE
        },
    }
}
