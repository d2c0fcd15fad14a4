//! formula-compare: list original vs optimized formulas from a scored batch
//!
//! Usage:
//!   formula-compare <batch.json>      # print every comparison entry
//!   formula-compare <batch.json> -q   # quiet: exit 0 if nothing to apply, 1 otherwise
//!
//! The batch file uses the engine's input contract:
//! `{"objectName": "...", "rows": [...]}`. Use in review scripts to see which
//! fields have an optimized formula waiting.

use std::env;
use std::fs;
use std::process;

use formula_risk_engine::types::ComparisonEntry;
use formula_risk_engine::{BatchInput, ComparisonList};

fn load_batch(path: &str) -> BatchInput {
    let contents = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("formula-compare: cannot read {}: {}", path, e);
        process::exit(2);
    });
    serde_json::from_str(&contents).unwrap_or_else(|e| {
        eprintln!("formula-compare: invalid JSON in {}: {}", path, e);
        process::exit(2);
    })
}

/// Signed change in formula length, optimized minus original.
fn length_delta(entry: &ComparisonEntry) -> i64 {
    entry.optimized_formula.chars().count() as i64 - entry.original_formula.chars().count() as i64
}

fn print_entry(entry: &ComparisonEntry) {
    println!(
        "[{}] {} ({}, {}) {:+} chars",
        entry.index,
        entry.devname,
        entry.label,
        entry.field_type,
        length_delta(entry)
    );
    for line in entry.original_formula.lines() {
        println!("  - {}", line);
    }
    for line in entry.optimized_formula.lines() {
        println!("  + {}", line);
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let quiet = args.iter().any(|a| a == "-q" || a == "--quiet");
    let files: Vec<_> = args.iter().filter(|a| !a.starts_with('-')).skip(1).collect();

    if files.len() != 1 {
        eprintln!("Usage: formula-compare <batch.json> [-q|--quiet]");
        eprintln!("  -q  Quiet: only exit code (0=nothing to apply, 1=optimizations pending)");
        process::exit(2);
    }

    let batch = load_batch(files[0]);
    let list = ComparisonList::from_rows(&batch.rows);

    if quiet {
        process::exit(if list.is_empty() { 0 } else { 1 });
    }

    if list.is_empty() {
        println!("No optimized formulas.");
        process::exit(0);
    }

    for entry in list.entries() {
        print_entry(entry);
    }

    process::exit(1);
}
