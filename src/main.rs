//! Compatibility-test harness CLI
//!
//! Thin runner around the harness library: loads a config file, runs the
//! registered suites against an already-running server and reports one
//! verdict per case. Exit code 1 means at least one case failed; exit
//! code 2 means the run never started (setup error).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

use compat_harness::common::logging;
use compat_harness::harness::{failed_count, CaseReport};
use compat_harness::suite::SuiteRegistry;
use compat_harness::{fault_channel, Config, Harness, Result};

#[derive(Parser)]
#[command(name = "compat-harness", about = "Script-suite compatibility harness")]
#[command(version, long_about = None)]
struct Cli {
    /// Path to the harness TOML config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit a machine-readable JSON report instead of the human one
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every registered suite, or a single one
    Run {
        /// Suite tag to run (all suites when omitted)
        suite: Option<String>,
    },
    /// List registered suites and their script resources
    List,
}

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { ref suite } => run(&cli, suite.as_deref()).await,
        Commands::List => list(&cli),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

async fn run(cli: &Cli, suite: Option<&str>) -> Result<bool> {
    let config = Config::load(cli.config.as_deref())?;
    let registry = SuiteRegistry::builtin();

    // The server-under-test is external to this binary, so nothing holds
    // the writer side; embedding frameworks hand it to their server.
    let (_writer, drain) = fault_channel();
    let harness = Harness::new(config, registry, drain);

    let reports = match suite {
        Some(tag) => harness.run_suite(tag).await?,
        None => harness.run().await?,
    };

    let failed = failed_count(&reports);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_reports(&reports, failed);
    }

    Ok(failed == 0)
}

fn print_reports(reports: &[CaseReport], failed: usize) {
    for report in reports {
        let elapsed = format!("{:.1}s", report.elapsed.as_secs_f64());
        if report.verdict.passed {
            println!(
                "  {} {} {}",
                "✓".green(),
                report.descriptor,
                elapsed.dimmed()
            );
        } else {
            println!(
                "  {} {} {}",
                "✗".red(),
                report.descriptor,
                elapsed.dimmed()
            );
            for line in report.verdict.message.lines() {
                println!("    {}", line.dimmed());
            }
        }
    }

    let total = reports.len();
    if failed == 0 {
        println!(
            "\n{} {} case(s) passed",
            "✓".green().bold(),
            total
        );
    } else {
        println!(
            "\n{} {failed} of {total} case(s) failed",
            "✗".red().bold()
        );
    }
}

fn list(cli: &Cli) -> Result<bool> {
    let _ = Config::load(cli.config.as_deref())?;
    let registry = SuiteRegistry::builtin();

    for suite in registry.iter() {
        println!("{}", suite.tag.bold());
        for resource in &suite.resources {
            if suite.skipped.contains(resource) {
                println!("  {} {}", resource, "(skipped)".yellow());
            } else {
                println!("  {resource}");
            }
        }
    }
    Ok(true)
}
