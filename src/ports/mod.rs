use std::io::Write;

use crate::domain::callgraph::CallGraph;
use crate::error::Result;

pub mod dot_exporter;
pub mod json_exporter;

pub use dot_exporter::DotExporter;
pub use json_exporter::JsonExporter;

/// Writes a finished call graph somewhere. Implementations must check the
/// graph's integrity before writing anything.
pub trait OutputExporter {
    fn export(&self, cg: &CallGraph, out: &mut dyn Write) -> Result<()>;
}
