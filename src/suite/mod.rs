//! Suite declarations and case enumeration
//!
//! Expands registered suites into a flat ordered list of runnable cases:
//! suite registration order first, resource declaration order within each
//! suite.

pub mod registry;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::common::{Error, Result};

pub use registry::{builtin_suite, builtin_suites, SuiteInfo, SuiteRegistry, SuiteSpec};

/// Opaque suite identifier shared by every case of a suite
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SuiteTag(String);

impl SuiteTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SuiteTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One runnable case: a (suite, resource) pair
///
/// Constructed only by enumeration and consumed by a single runner
/// invocation.
#[derive(Debug, Clone, Serialize)]
pub struct CaseDescriptor {
    /// Script resource name (e.g., "basic1.js")
    pub resource: String,
    /// Resource prefix the script resolves under
    pub prefix: String,
    /// Tag of the suite this case belongs to
    pub suite: SuiteTag,
}

impl CaseDescriptor {
    /// Relative path of the script under the resource root
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(&self.prefix).join(&self.resource)
    }
}

impl fmt::Display for CaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.resource)
    }
}

/// Expand every registered suite into case descriptors
///
/// Skipped resources are excluded here; callers that want to report them
/// read the suite declarations directly.
pub fn enumerate(registry: &SuiteRegistry) -> Result<Vec<CaseDescriptor>> {
    let mut cases = Vec::new();
    for suite in registry.iter() {
        expand_suite(suite, &mut cases);
    }
    Ok(cases)
}

/// Expand a single suite by tag
pub fn enumerate_suite(registry: &SuiteRegistry, tag: &str) -> Result<Vec<CaseDescriptor>> {
    let suite = registry
        .get(tag)
        .ok_or_else(|| Error::SuiteNotFound(tag.to_string()))?;
    let mut cases = Vec::new();
    expand_suite(suite, &mut cases);
    Ok(cases)
}

fn expand_suite(suite: &SuiteSpec, cases: &mut Vec<CaseDescriptor>) {
    for resource in &suite.resources {
        if suite.skipped.contains(resource) {
            tracing::info!(suite = %suite.tag, resource = %resource, "skipping resource");
            continue;
        }
        cases.push(CaseDescriptor {
            resource: resource.clone(),
            prefix: suite.prefix.clone(),
            suite: SuiteTag(suite.tag.clone()),
        });
    }
}
