//! GraphViz DOT Exporter
//!
//! Node declarations come from each node's own [`Node::dot`] fragment; the
//! exporter only adds the header, the call lines and the closing brace.
//!
//! [`Node::dot`]: crate::domain::callgraph::Node::dot

use std::io::Write;

use crate::domain::callgraph::{escape, CallGraph};
use crate::error::Result;
use crate::ports::OutputExporter;

pub struct DotExporter;

impl DotExporter {
    /// Convert a CallGraph to a DOT string.
    pub fn to_dot(cg: &CallGraph) -> Result<String> {
        let mut buf = Vec::new();
        DotExporter.export(cg, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl OutputExporter for DotExporter {
    fn export(&self, cg: &CallGraph, out: &mut dyn Write) -> Result<()> {
        cg.validate()?;

        writeln!(out, "digraph {{")?;
        writeln!(out, "\trankdir = \"BT\";")?;
        writeln!(out)?;

        for (_, node) in cg.nodes() {
            writeln!(out, "\t{}", node.dot())?;
        }

        writeln!(out)?;

        for call in cg.calls() {
            let (caller, callee) = cg.call_names(call)?;
            writeln!(out, "\t\"{}\" -> \"{}\";", escape(caller), escape(callee))?;
        }

        writeln!(out, "}}")?;
        out.flush()?;
        Ok(())
    }
}
