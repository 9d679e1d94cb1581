//! Compatibility-test harness
//!
//! Drives externally-authored script suites against a live server instance
//! by launching one external client process per script, and judges each
//! case from two independent signals: the client's exit code and the
//! faults the server-under-test recorded while the script ran.

pub mod common;
pub mod harness;
pub mod runner;
pub mod sink;
pub mod suite;
pub mod verdict;

// Re-export commonly used types for embedders and tests
pub use common::{Config, Error, Result};
pub use harness::{CaseReport, Harness};
pub use sink::{fault_channel, FaultDrain, FaultWriter, ServerFault};
pub use suite::{CaseDescriptor, SuiteRegistry, SuiteSpec};
pub use verdict::Verdict;
