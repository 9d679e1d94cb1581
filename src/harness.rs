//! Run orchestration
//!
//! Executes enumerated cases strictly sequentially against one live server
//! instance. Setup errors abort the run before any case spawns; per-case
//! failures are recorded and the remaining cases still execute.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::common::{Config, Result};
use crate::runner;
use crate::sink::FaultDrain;
use crate::suite::{self, CaseDescriptor, SuiteRegistry};
use crate::verdict::{self, Verdict};

/// Outcome of one executed case
#[derive(Debug, Serialize)]
pub struct CaseReport {
    pub descriptor: CaseDescriptor,
    pub verdict: Verdict,
    pub elapsed: Duration,
}

/// The harness: config, suite registry, and the sole fault drainer
pub struct Harness {
    config: Config,
    registry: SuiteRegistry,
    drain: FaultDrain,
}

impl Harness {
    pub fn new(config: Config, registry: SuiteRegistry, drain: FaultDrain) -> Self {
        Self {
            config,
            registry,
            drain,
        }
    }

    /// Run every registered suite
    pub async fn run(&self) -> Result<Vec<CaseReport>> {
        let cases = suite::enumerate(&self.registry)?;
        self.run_cases(cases).await
    }

    /// Run a single suite by tag
    pub async fn run_suite(&self, tag: &str) -> Result<Vec<CaseReport>> {
        let cases = suite::enumerate_suite(&self.registry, tag)?;
        self.run_cases(cases).await
    }

    async fn run_cases(&self, cases: Vec<CaseDescriptor>) -> Result<Vec<CaseReport>> {
        self.preflight(&cases)?;

        let timeout = self.config.case_timeout();
        let mut reports = Vec::with_capacity(cases.len());

        for descriptor in cases {
            // Cross-case isolation: anything still in the sink belongs to
            // an earlier case (or to server startup) and must not fail
            // this one.
            let strays = self.drain.drain();
            if !strays.is_empty() {
                tracing::warn!(
                    case = %descriptor,
                    count = strays.len(),
                    "discarding faults recorded outside any case"
                );
            }

            tracing::info!(case = %descriptor, "running case");
            let started = Instant::now();

            let verdict = match runner::run_case(&self.config, &descriptor, timeout).await {
                Ok(outcome) => {
                    let faults = self.drain.drain();
                    verdict::evaluate(&descriptor, &outcome, &faults)
                }
                Err(e) if e.is_setup() => return Err(e),
                Err(e) => {
                    // Timeout, kill-by-signal and the like fail the case
                    // with their own message; the suite keeps going. Faults
                    // recorded while the case ran are still evidence.
                    let faults = self.drain.drain();
                    let mut message = format!("Test {descriptor} failed:\n{e}");
                    if !faults.is_empty() {
                        verdict::append_fault_evidence(&mut message, &faults);
                    }
                    Verdict {
                        passed: false,
                        message,
                    }
                }
            };

            if verdict.passed {
                tracing::info!(case = %descriptor, "case passed");
            } else {
                tracing::warn!(case = %descriptor, "case failed");
            }

            reports.push(CaseReport {
                descriptor,
                verdict,
                elapsed: started.elapsed(),
            });
        }

        Ok(reports)
    }

    /// Resolve the client binary and every script before anything spawns
    ///
    /// A missing resource aborts the whole run rather than failing the one
    /// case that would have used it.
    fn preflight(&self, cases: &[CaseDescriptor]) -> Result<()> {
        self.config.resolve_client()?;
        runner::resolve_script(&self.config.scripts.root, &self.config.client.setup_script)?;
        for descriptor in cases {
            runner::resolve_script(&self.config.scripts.root, &descriptor.relative_path())?;
        }
        Ok(())
    }
}

/// Count failed cases in a report set
pub fn failed_count(reports: &[CaseReport]) -> usize {
    reports.iter().filter(|r| !r.verdict.passed).count()
}
