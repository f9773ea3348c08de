// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Inkwall CLI - Script Content Monitor
//!
//! Example usage and demonstration of the inkwall library.

use std::env;
use std::process::ExitCode;

use inkwall::{fingerprint_inline, fingerprint_url, MonitorConfig, ScriptMonitor};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("inkwall=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "scan" => {
            if args.len() < 3 {
                eprintln!("Usage: inkwall scan <file>");
                return ExitCode::from(1);
            }
            scan_file(&args[2]).await
        }
        "enforce" => {
            if args.len() < 4 {
                eprintln!("Usage: inkwall enforce <file> <hash>...");
                return ExitCode::from(1);
            }
            enforce_file(&args[2], &args[3..]).await
        }
        "fingerprint" => {
            if args.len() < 3 {
                eprintln!("Usage: inkwall fingerprint <url-or-file>");
                return ExitCode::from(1);
            }
            fingerprint_target(&args[2])
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("inkwall {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"Inkwall - Script Content Monitor

USAGE:
    inkwall <COMMAND> [OPTIONS]

COMMANDS:
    scan <file>                 Scan an HTML file and list detected scripts
    enforce <file> <hash>...    Decline the given hashes, then print the
                                filtered document
    fingerprint <url-or-file>   Print the fingerprint of a script URL or a
                                local script file
    help                        Show this help message
    version                     Show version information

EXAMPLES:
    inkwall scan rendered.html
    inkwall enforce rendered.html 3f2a...c9
    inkwall fingerprint "https://cdn.example.com/lib.js?v=3"
    inkwall fingerprint payload.js
"#
    );
}

async fn scan_file(path: &str) -> ExitCode {
    let body = match std::fs::read_to_string(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            return ExitCode::from(1);
        }
    };

    let monitor = ScriptMonitor::new(MonitorConfig::default());
    if let Err(e) = monitor.process_output(&body).await {
        eprintln!("Scan failed: {}", e);
        return ExitCode::from(1);
    }

    let pending = match monitor.pending().await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to read registry: {}", e);
            return ExitCode::from(1);
        }
    };

    if pending.is_empty() {
        println!("No scripts detected");
        return ExitCode::SUCCESS;
    }

    println!("=== Detected scripts ({}) ===", pending.len());
    for record in &pending {
        println!(
            "{}  size={}  origin={}  {}",
            record.hash,
            record.size,
            record.origin,
            record.source.display(72)
        );
    }
    ExitCode::SUCCESS
}

async fn enforce_file(path: &str, hashes: &[String]) -> ExitCode {
    let body = match std::fs::read_to_string(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            return ExitCode::from(1);
        }
    };

    let monitor = ScriptMonitor::new(MonitorConfig::default());
    if let Err(e) = monitor.process_output(&body).await {
        eprintln!("Scan failed: {}", e);
        return ExitCode::from(1);
    }

    for hash in hashes {
        match monitor.decline(hash).await {
            Ok(0) => eprintln!("No records matched hash {}", hash),
            Ok(n) => eprintln!("Declined {} record(s) for {}", n, hash),
            Err(e) => {
                eprintln!("Failed to decline {}: {}", hash, e);
                return ExitCode::from(1);
            }
        }
    }

    match monitor.process_output(&body).await {
        Ok(output) => {
            eprintln!("Removed {} script(s)", output.removed);
            println!("{}", output.html);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Enforcement failed: {}", e);
            ExitCode::from(1)
        }
    }
}

fn fingerprint_target(target: &str) -> ExitCode {
    let looks_remote = target.starts_with("http://") || target.starts_with("https://");

    let fingerprint = if looks_remote {
        match fingerprint_url(target) {
            Ok(fp) => fp,
            Err(e) => {
                eprintln!("Failed to fingerprint {}: {}", target, e);
                return ExitCode::from(1);
            }
        }
    } else {
        match std::fs::read_to_string(target) {
            Ok(body) => fingerprint_inline(&body),
            Err(e) => {
                eprintln!("Failed to read {}: {}", target, e);
                return ExitCode::from(1);
            }
        }
    };

    println!("hash: {}", fingerprint.hash);
    println!("size: {}", fingerprint.size);
    ExitCode::SUCCESS
}
