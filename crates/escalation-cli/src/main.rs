//! `escalation-check` — CLI front end for the policy privilege-escalation
//! checker.
//!
//! A thin client over `escalation-core`: reads two policy JSON files
//! (current and proposed), asks the core whether the proposed policy
//! admits anything the current one does not, and reports the verdict.
//! This binary is not the policy-source-text parser — it only accepts
//! the already-structured `Policy` JSON shape the core defines.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use escalation_core::{check_with_options, CheckOptions, CheckRequest, EscalationResult, Policy};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";

/// Compare two secrets-policy snapshots and prove or refute privilege
/// escalation between them.
#[derive(Parser)]
#[command(
    name = "escalation-check",
    version,
    about = "Prove or refute privilege escalation between two secrets-management policies",
    long_about = None,
    after_help = format!(
        "{DIM}Exit codes:{RESET}\n  \
         0   no escalation — proven safe\n  \
         1   escalation found — a witness is printed\n  \
         2   the check could not be completed (invalid input or solver error)\n\n\
         {DIM}Example:{RESET}\n  \
         escalation-check current.json new.json --diagnostics"
    )
)]
struct Cli {
    /// Path to the current policy (JSON map of pattern to capability list).
    current: PathBuf,
    /// Path to the proposed new policy, in the same shape.
    new: PathBuf,
    /// Print the rendered `φ_current` / `φ_new` formula text.
    #[arg(long, default_value = "false")]
    diagnostics: bool,
    /// Bound the solver's resource usage; a timeout surfaces as an error
    /// rather than blocking indefinitely.
    #[arg(long)]
    timeout_ms: Option<u32>,
    /// Disable colored output.
    #[arg(long, default_value = "false")]
    no_color: bool,
}

fn load_policy(path: &PathBuf) -> Result<Policy> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read policy file {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("invalid policy document in {}", path.display()))
}

fn run(cli: &Cli) -> Result<EscalationResult> {
    let current = load_policy(&cli.current)?;
    let new = load_policy(&cli.new)?;

    let response = check_with_options(
        &CheckRequest { current, new },
        CheckOptions {
            timeout_ms: cli.timeout_ms,
            include_diagnostics: cli.diagnostics,
        },
    )
    .context("escalation check failed")?;

    if let Some(diagnostics) = &response.diagnostics {
        println!("{DIM}current formula:{RESET} {}", diagnostics.current_formula_text);
        println!("{DIM}new formula:{RESET}     {}", diagnostics.new_formula_text);
        println!();
    }

    Ok(response.result)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let color = !cli.no_color;

    match run(&cli) {
        Ok(EscalationResult::NoEscalation) => {
            if color {
                println!("{GREEN}{BOLD}✓ no escalation{RESET} — the new policy grants nothing the current one does not");
            } else {
                println!("no escalation");
            }
            ExitCode::SUCCESS
        }
        Ok(EscalationResult::Escalation { path, capability }) => {
            if color {
                println!("{RED}{BOLD}✗ escalation found{RESET}");
                println!("  {CYAN}path{RESET}:       {path}");
                println!("  {CYAN}capability{RESET}: {capability}");
            } else {
                println!("escalation found: path={path} capability={capability}");
            }
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("{RED}{BOLD}✗ error:{RESET} {e:#}");
            ExitCode::from(2)
        }
    }
}
