//! Print the embedded invoice XML of a hybrid PDF and any archival findings.
//!
//! ```text
//! cargo run --example inspect_invoice --features inspect -- RG-2024-R-2024-0001-E-Rechnung.pdf
//! ```

use std::env;
use std::fs;

use hybridbeleg::zugferd::{check_hybrid, extract_xml};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: inspect_invoice <invoice.pdf>");
        std::process::exit(2);
    };
    let pdf = fs::read(&path).expect("PDF should be readable");

    match extract_xml(&pdf) {
        Ok(xml) => println!("{}", String::from_utf8_lossy(&xml)),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }

    let findings = check_hybrid(&pdf).expect("PDF was already loaded once");
    if findings.is_empty() {
        println!("\n{path}: no findings");
        return;
    }
    println!("\n{path}: {} finding(s)", findings.len());
    for finding in &findings {
        println!("  {finding}");
    }
    std::process::exit(3);
}
