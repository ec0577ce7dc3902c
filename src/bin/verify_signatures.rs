//! Verify PDF Signatures
//!
//! Verifies every signature of one or more PDFs and prints a summary or the
//! JSON report. Several files are verified concurrently.
//!
//! Usage:
//!   cargo run --release --bin verify_signatures -- signed.pdf
//!   cargo run --release --bin verify_signatures -- a.pdf b.pdf --json
//!   cargo run --release --bin verify_signatures -- signed.pdf --positional --at 2026-01-01T00:00:00Z
//!
//! Exit status is 0 when every document is valid, 1 otherwise, 2 on usage
//! errors. Set RUST_LOG=debug for engine logs.

use chrono::{DateTime, Utc};
use pdfsig_oxide::{LocatorStrategy, OverallStatus, Report, SignatureVerifier, VerifyConfig};
use std::fs;
use std::process::ExitCode;

struct CliConfig {
    files: Vec<String>,
    json: bool,
    verify: VerifyConfig,
}

impl CliConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut files = Vec::new();
        let mut json = false;
        let mut verify = VerifyConfig::new();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--json" => {
                    json = true;
                },
                "--positional" => {
                    verify = verify.with_locator(LocatorStrategy::Positional);
                },
                "--strict" => {
                    verify = verify.with_full_coverage(true);
                },
                "--at" => {
                    i += 1;
                    let value = args.get(i).ok_or("--at needs an RFC 3339 timestamp")?;
                    let at = DateTime::parse_from_rfc3339(value)
                        .map_err(|e| format!("invalid --at value {}: {}", value, e))?;
                    verify = verify.with_reference_time(at.with_timezone(&Utc));
                },
                flag if flag.starts_with("--") => {
                    return Err(format!("unknown option {}", flag));
                },
                file => files.push(file.to_string()),
            }
            i += 1;
        }

        if files.is_empty() {
            return Err("no input files".to_string());
        }
        Ok(Self { files, json, verify })
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match CliConfig::from_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Usage: verify_signatures <file.pdf>... [--json] [--positional] [--strict] [--at <RFC3339>]");
            return ExitCode::from(2);
        },
    };

    let mut documents = Vec::with_capacity(config.files.len());
    for file in &config.files {
        match fs::read(file) {
            Ok(data) => documents.push((file.clone(), data)),
            Err(e) => {
                eprintln!("Error reading {}: {}", file, e);
                return ExitCode::FAILURE;
            },
        }
    }

    let verifier = SignatureVerifier::new(config.verify);
    let generated_at = Utc::now();
    let mut all_valid = true;

    for (name, verification) in verifier.verify_batch(&documents) {
        let report = Report::new(name, &verification, generated_at);
        all_valid &= report.overall_status() == OverallStatus::Valid;
        if config.json {
            match report.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing report for {}: {}", report.file, e);
                    return ExitCode::FAILURE;
                },
            }
        } else {
            println!("{}", report.to_text());
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
