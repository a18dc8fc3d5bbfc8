use serde::{Deserialize, Serialize};

use crate::domain::callgraph::CallGraph;
use crate::error::Result;

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphDto {
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeDto {
    pub id: usize,
    pub name: String,
    pub markers: Vec<String>,
    pub notes: Vec<String>,
}

/// A call, by display name.
#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeDto {
    pub from: String,
    pub to: String,
}

impl GraphDto {
    pub fn from_graph(cg: &CallGraph) -> Result<Self> {
        cg.validate()?;

        let nodes = cg
            .nodes()
            .map(|(id, n)| NodeDto {
                id,
                name: n.name.clone(),
                markers: n.markers().map(|m| m.name().to_string()).collect(),
                notes: n.notes().map(str::to_string).collect(),
            })
            .collect();

        let edges = cg
            .calls()
            .map(|c| {
                cg.call_names(c).map(|(from, to)| EdgeDto {
                    from: from.to_string(),
                    to: to.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GraphDto { nodes, edges })
    }
}
