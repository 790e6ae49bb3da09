//! Workspace automation for the `ClearHold` client.
//!
//! Run with: `cargo xtask <task> [args]`
//!
//! Output goes to the terminal with `println!`/`eprintln!`; this binary is
//! never embedded, so it carries no logging stack.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::{Command, ExitCode};

use anyhow::{bail, Context, Result};

mod features;
mod scenarios;

/// A named step `ci` runs in order
type Step = (&'static str, fn() -> Result<()>);

const CI_STEPS: &[Step] = &[
    ("Checking formatting", run_fmt),
    ("Running Clippy", run_clippy),
    ("Checking clearhold-common feature tiers", features::check_tiers),
    ("Running workspace tests", run_test),
    ("Checking dependency policy", run_deny),
    ("Auditing dependencies", run_audit),
];

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let task = args.next();

    let result = match task.as_deref() {
        Some("ci") => run_ci(),
        Some("fmt") => run_fmt(),
        Some("clippy") => run_clippy(),
        Some("test") => run_test(),
        Some("scenarios") => scenarios::run(args.next().as_deref()),
        Some("test-features") => features::check_tiers(),
        Some("deny") => run_deny(),
        Some("audit") => run_audit(),
        Some("help") | None => {
            print_help();
            Ok(())
        }
        Some(unknown) => {
            eprintln!("Unknown task: {unknown}\n");
            print_help();
            Err(anyhow::anyhow!("unknown task '{unknown}'"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Task failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("ClearHold workspace tasks");
    println!();
    println!("USAGE:");
    println!("    cargo xtask <TASK> [ARGS]");
    println!();
    println!("TASKS:");
    println!("    ci                 fmt, clippy, feature tiers, tests, deny and audit");
    println!("    fmt                Check formatting");
    println!("    clippy             Clippy with warnings denied");
    println!("    test               Every workspace test");
    println!("    scenarios [NAME]   Integration suites for one area, or all of them");
    println!("    test-features      Build each clearhold-common feature tier alone");
    println!("    deny               cargo-deny policy check");
    println!("    audit              cargo-audit advisory check");
    println!("    help               This message");
    println!();
    println!("SCENARIOS:");
    for suite in scenarios::SUITES {
        println!("    {:<18} {}", suite.name, suite.about);
    }
}

fn run_ci() -> Result<()> {
    let total = CI_STEPS.len();
    for (index, (label, step)) in CI_STEPS.iter().enumerate() {
        println!("\n==> [{}/{total}] {label}...", index + 1);
        step().with_context(|| format!("ci step '{label}'"))?;
    }
    println!("\nAll CI checks passed");
    Ok(())
}

/// Run `cargo <args>`; `failure` becomes the error when it exits non-zero
pub(crate) fn cargo(args: &[&str], failure: &str) -> Result<()> {
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("failed to spawn cargo {}", args.join(" ")))?;
    if !status.success() {
        bail!("{failure}");
    }
    Ok(())
}

/// Fail with an install hint when a cargo subcommand is missing
fn require_subcommand(name: &str) -> Result<()> {
    let installed = Command::new("cargo")
        .args([name, "--version"])
        .output()
        .is_ok_and(|output| output.status.success());
    if !installed {
        eprintln!("cargo-{name} is not installed.");
        eprintln!("Install it with: cargo install cargo-{name}");
        bail!("cargo-{name} not found");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo(&["fmt", "--all", "--", "--check"], "formatting differs; run 'cargo fmt --all'")
}

fn run_clippy() -> Result<()> {
    cargo(
        &["clippy", "--workspace", "--all-targets", "--all-features", "--", "-D", "warnings"],
        "clippy reported warnings",
    )
}

fn run_test() -> Result<()> {
    cargo(&["test", "--workspace", "--all-features"], "tests failed")
}

fn run_deny() -> Result<()> {
    require_subcommand("deny")?;
    cargo(&["deny", "check"], "cargo-deny found issues")
}

fn run_audit() -> Result<()> {
    require_subcommand("audit")?;
    cargo(&["audit"], "cargo-audit found vulnerabilities")
}
