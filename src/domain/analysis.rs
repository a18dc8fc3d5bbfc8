//! Graph extraction.
//!
//! Each [`Analysis`] names one findings family. Extracting it walks every
//! trace that ends in (or is referenced by) such a finding and turns the
//! trace's frames into a chain of calls.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use tracing::debug;

use crate::domain::callgraph::{CallGraph, Marker};
use crate::domain::results::{Finding, Results};
use crate::error::{Error, Result};

/// A findings family a call graph can be extracted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Analysis {
    Vulnerabilities,
    PrivateAccess,
}

impl Analysis {
    /// Every registered analysis, in help-text order.
    pub const ALL: [Analysis; 2] = [Analysis::Vulnerabilities, Analysis::PrivateAccess];

    pub fn name(&self) -> &'static str {
        match self {
            Analysis::Vulnerabilities => "vuln",
            Analysis::PrivateAccess => "privaccess",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Analysis::Vulnerabilities => "call paths reaching previously-vulnerable code",
            Analysis::PrivateAccess => "call paths reaching accesses of another sandbox's private data",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Analysis::Vulnerabilities => &["vuln", "vulnerability", "vulnerabilities"],
            Analysis::PrivateAccess => &["privaccess", "private_access", "private"],
        }
    }

    /// Canonical names of all analyses.
    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::ALL.into_iter().map(|a| a.name())
    }

    /// Build the call graph for this findings family.
    pub fn extract(&self, results: &Results) -> CallGraph {
        let graph = match self {
            Analysis::Vulnerabilities => trace_graph(results, &results.vulnerabilities),
            Analysis::PrivateAccess => trace_graph(results, &results.private_accesses),
        };
        debug!(
            "[Extract] {}: {} nodes, {} calls",
            self.name(),
            graph.node_count(),
            graph.call_count()
        );
        graph
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Analysis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.aliases().contains(&wanted.as_str()))
            .ok_or_else(|| Error::UnsupportedAnalysis {
                name: s.to_string(),
                known: Self::names().collect::<Vec<_>>().join(", "),
            })
    }
}

/// Extract an analysis given by name.
pub fn extract(results: &Results, name: &str) -> Result<CallGraph> {
    let analysis: Analysis = name.parse()?;
    Ok(analysis.extract(results))
}

/// Extract several analyses and fold them into one graph.
///
/// Extractions only read `results` and run in parallel; the fold happens
/// afterwards, sequentially and in the order given.
pub fn extract_all(results: &Results, analyses: &[Analysis]) -> Result<CallGraph> {
    if analyses.is_empty() {
        return Err(Error::UnsupportedAnalysis {
            name: String::new(),
            known: Analysis::names().collect::<Vec<_>>().join(", "),
        });
    }

    let graphs: Vec<CallGraph> = analyses.par_iter().map(|a| a.extract(results)).collect();

    let mut merged = CallGraph::new();
    for graph in &graphs {
        merged.union(graph)?;
    }
    Ok(merged)
}

fn trace_graph<F: Finding>(results: &Results, findings: &[F]) -> CallGraph {
    let functions: HashSet<&str> = findings.iter().map(Finding::function).collect();
    let referenced: HashSet<usize> = findings.iter().filter_map(Finding::trace_ref).collect();

    let mut graph = CallGraph::new();
    for (index, trace) in results.traces.iter().enumerate() {
        let relevant = referenced.contains(&index)
            || trace
                .terminal()
                .is_some_and(|frame| functions.contains(frame.function.as_str()));
        if !relevant {
            continue;
        }

        for frame in &trace.frames {
            graph.ensure_node(&frame.function);
        }
        for pair in trace.frames.windows(2) {
            graph.add_call_by_name(&pair[0].function, &pair[1].function);
        }
    }

    annotate(&mut graph, results);
    graph
}

/// Mark nodes that are themselves finding sites, whatever was extracted.
fn annotate(graph: &mut CallGraph, results: &Results) {
    for vuln in &results.vulnerabilities {
        if let Some(id) = graph.find(&vuln.function) {
            if let Some(node) = graph.node_mut(id) {
                node.mark(Marker::Vulnerability, vuln.summary());
            }
        }
    }
    for access in &results.private_accesses {
        if let Some(id) = graph.find(&access.function) {
            if let Some(node) = graph.node_mut(id) {
                node.mark(Marker::PrivateAccess, [access.variable.as_str()]);
            }
        }
    }
}
