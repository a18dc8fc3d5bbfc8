//! Parsed analysis results.
//!
//! One `Results` value holds everything a single report contains. It is built
//! once (by the report parser or the binary store) and only read afterwards.

use serde::{Deserialize, Serialize};

/// A position in the analysed program's source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

/// A function that is historically associated with a security flaw and runs
/// inside (or outside) a sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub function: String,
    /// Compartment the warning was raised in; empty when unsandboxed.
    #[serde(default)]
    pub sandbox: String,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    /// CVE identifiers or free-form descriptions.
    #[serde(default)]
    pub cve: Vec<String>,
    /// Index into `Results::traces` of the path leading here.
    #[serde(default)]
    pub trace_ref: Option<usize>,
}

impl Vulnerability {
    /// Short description used when annotating graph nodes.
    pub fn summary(&self) -> Vec<String> {
        if !self.cve.is_empty() {
            return self.cve.clone();
        }
        if self.sandbox.is_empty() {
            vec!["unsandboxed".to_string()]
        } else {
            vec![format!("sandbox: {}", self.sandbox)]
        }
    }
}

/// Code in one compartment reading data that is private to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateAccess {
    pub function: String,
    /// Name of the private variable or data being read.
    #[serde(alias = "name")]
    pub variable: String,
    /// Compartment performing the access; empty when unsandboxed.
    #[serde(default)]
    pub sandbox: String,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    #[serde(default)]
    pub trace_ref: Option<usize>,
}

/// One frame of a call trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub function: String,
    #[serde(default)]
    pub sandbox: String,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

/// An ordered call path, entry point first, finding last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "callsites", alias = "trace")]
    pub frames: Vec<CallSite>,
}

impl Trace {
    pub fn new(frames: Vec<CallSite>) -> Self {
        Self { frames }
    }

    /// The frame where the finding occurs.
    pub fn terminal(&self) -> Option<&CallSite> {
        self.frames.last()
    }
}

/// Everything one analysis run reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Results {
    pub vulnerabilities: Vec<Vulnerability>,
    pub private_accesses: Vec<PrivateAccess>,
    pub traces: Vec<Trace>,
}

impl Results {
    pub fn is_empty(&self) -> bool {
        self.vulnerabilities.is_empty() && self.private_accesses.is_empty() && self.traces.is_empty()
    }
}

/// Behaviour shared by every finding family a call graph can be extracted for.
pub trait Finding {
    fn function(&self) -> &str;
    fn trace_ref(&self) -> Option<usize>;
}

impl Finding for Vulnerability {
    fn function(&self) -> &str {
        &self.function
    }

    fn trace_ref(&self) -> Option<usize> {
        self.trace_ref
    }
}

impl Finding for PrivateAccess {
    fn function(&self) -> &str {
        &self.function
    }

    fn trace_ref(&self) -> Option<usize> {
        self.trace_ref
    }
}
