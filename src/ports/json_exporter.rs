//! JSON Exporter
//!
//! Writes the graph as `{nodes, edges}` with edges given by display name.

use std::io::Write;

use crate::api::dto::GraphDto;
use crate::domain::callgraph::CallGraph;
use crate::error::{Error, Result};
use crate::ports::OutputExporter;

pub struct JsonExporter;

impl OutputExporter for JsonExporter {
    fn export(&self, cg: &CallGraph, out: &mut dyn Write) -> Result<()> {
        let dto = GraphDto::from_graph(cg)?;
        serde_json::to_writer_pretty(&mut *out, &dto).map_err(Error::encode_json)?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_export() {
        let mut cg = CallGraph::new();
        cg.add_call_by_name("f", "g");

        let mut buf = Vec::new();
        JsonExporter.export(&cg, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["edges"][0]["from"], "f");
        assert_eq!(value["edges"][0]["to"], "g");
    }

    #[test]
    fn test_write_failure_is_io() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut cg = CallGraph::new();
        cg.add_call_by_name("f", "g");
        assert!(matches!(JsonExporter.export(&cg, &mut Full), Err(Error::Io(_))));
    }
}
