//! Suite registry
//!
//! An explicit data table mapping suite tags to their ordered script
//! resource lists. Lookup is direct; nothing is discovered at runtime.

use crate::common::{Error, Result};

/// Static description of a built-in suite
#[derive(Debug, Clone)]
pub struct SuiteInfo {
    /// Unique suite tag (e.g., "core")
    pub tag: &'static str,
    /// Resource prefix the scripts resolve under
    pub prefix: &'static str,
    /// Brief description
    pub description: &'static str,
    /// Ordered script resources
    pub resources: &'static [&'static str],
    /// Resources declared but known-broken against the server-under-test
    pub skipped: &'static [&'static str],
}

/// Suites shipped with the harness
static BUILTIN: &[SuiteInfo] = &[
    SuiteInfo {
        tag: "core",
        prefix: "core",
        description: "Basic CRUD and query compatibility checks",
        resources: &[
            "basic1.js",
            "basic2.js",
            "insert1.js",
            "find1.js",
            "count.js",
            "remove.js",
        ],
        skipped: &[],
    },
    SuiteInfo {
        tag: "update",
        prefix: "core",
        description: "Update operator compatibility checks",
        resources: &["update1.js", "update_arraymatch.js", "upsert.js"],
        skipped: &["update_multi.js"],
    },
    SuiteInfo {
        tag: "aggregation",
        prefix: "aggregation",
        description: "Aggregation pipeline compatibility checks",
        resources: &["aggregate_simple.js", "group.js", "sort_limit.js"],
        skipped: &[],
    },
];

/// Get all built-in suites
pub fn builtin_suites() -> &'static [SuiteInfo] {
    BUILTIN
}

/// Get a built-in suite by tag
pub fn builtin_suite(tag: &str) -> Option<&'static SuiteInfo> {
    BUILTIN.iter().find(|s| s.tag == tag)
}

/// An owned suite declaration
#[derive(Debug, Clone)]
pub struct SuiteSpec {
    pub tag: String,
    pub prefix: String,
    pub resources: Vec<String>,
    pub skipped: Vec<String>,
}

impl SuiteSpec {
    pub fn new(tag: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            prefix: prefix.into(),
            resources: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn resource(mut self, name: impl Into<String>) -> Self {
        self.resources.push(name.into());
        self
    }

    pub fn skip(mut self, name: impl Into<String>) -> Self {
        self.skipped.push(name.into());
        self
    }
}

impl From<&SuiteInfo> for SuiteSpec {
    fn from(info: &SuiteInfo) -> Self {
        Self {
            tag: info.tag.to_string(),
            prefix: info.prefix.to_string(),
            resources: info.resources.iter().map(|r| r.to_string()).collect(),
            skipped: info.skipped.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Ordered collection of suite declarations
///
/// Insertion order is the execution order.
#[derive(Debug, Default)]
pub struct SuiteRegistry {
    suites: Vec<SuiteSpec>,
}

impl SuiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in suite table
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for info in BUILTIN {
            // Built-in table is statically well-formed
            registry
                .register(info.into())
                .unwrap_or_else(|e| unreachable!("builtin suite table invalid: {e}"));
        }
        registry
    }

    /// Register a suite, validating the declaration
    ///
    /// A malformed declaration (empty resource list, duplicate resources,
    /// duplicate tag) is a fatal setup error.
    pub fn register(&mut self, spec: SuiteSpec) -> Result<()> {
        if spec.resources.is_empty() {
            return Err(Error::EmptySuite { suite: spec.tag });
        }
        for (i, resource) in spec.resources.iter().enumerate() {
            if spec.resources[..i].contains(resource) {
                return Err(Error::DuplicateResource {
                    suite: spec.tag,
                    resource: resource.clone(),
                });
            }
        }
        if self.get(&spec.tag).is_some() {
            return Err(Error::Config(format!(
                "Suite '{}' registered twice",
                spec.tag
            )));
        }
        self.suites.push(spec);
        Ok(())
    }

    /// Get a suite by tag
    pub fn get(&self, tag: &str) -> Option<&SuiteSpec> {
        self.suites.iter().find(|s| s.tag == tag)
    }

    /// Iterate suites in registration order
    pub fn iter(&self) -> impl Iterator<Item = &SuiteSpec> {
        self.suites.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }
}
