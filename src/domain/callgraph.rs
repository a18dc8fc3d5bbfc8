// Call graph structures for soaap-graph.
// Nodes are functions, calls are caller -> callee pairs of node ids.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Index into one graph's node table. Never meaningful in another graph.
pub type NodeId = usize;

/// Findings attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Marker {
    Vulnerability,
    PrivateAccess,
}

impl Marker {
    pub fn name(&self) -> &'static str {
        match self {
            Marker::Vulnerability => "vulnerability",
            Marker::PrivateAccess => "private_access",
        }
    }
}

/// Rendering variant, derived from which markers a node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Plain,
    Vulnerable,
    PrivateAccess,
    VulnerablePrivateAccess,
}

impl NodeKind {
    fn style(&self) -> Option<(&'static str, &'static str)> {
        match self {
            NodeKind::Plain => None,
            NodeKind::Vulnerable => Some(("box", "#f38ba8")),
            NodeKind::PrivateAccess => Some(("ellipse", "#f9e2af")),
            NodeKind::VulnerablePrivateAccess => Some(("octagon", "#fab387")),
        }
    }
}

/// A function in the call graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    markers: BTreeSet<Marker>,
    /// CVE ids, accessed variables and similar annotation text.
    notes: BTreeSet<String>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markers: BTreeSet::new(),
            notes: BTreeSet::new(),
        }
    }

    pub fn mark<I, S>(&mut self, marker: Marker, notes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers.insert(marker);
        self.notes.extend(notes.into_iter().map(Into::into));
    }

    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }

    pub fn markers(&self) -> impl Iterator<Item = Marker> + '_ {
        self.markers.iter().copied()
    }

    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.notes.iter().map(String::as_str)
    }

    pub fn kind(&self) -> NodeKind {
        match (
            self.has_marker(Marker::Vulnerability),
            self.has_marker(Marker::PrivateAccess),
        ) {
            (false, false) => NodeKind::Plain,
            (true, false) => NodeKind::Vulnerable,
            (false, true) => NodeKind::PrivateAccess,
            (true, true) => NodeKind::VulnerablePrivateAccess,
        }
    }

    /// Union of both sides' markers and notes; nothing already present is lost.
    fn absorb(&mut self, other: &Node) {
        self.markers.extend(other.markers.iter().copied());
        self.notes.extend(other.notes.iter().cloned());
    }

    /// This node's GraphViz declaration.
    pub fn dot(&self) -> String {
        let name = escape(&self.name);
        match self.kind().style() {
            None => format!("\"{}\";", name),
            Some((shape, fill)) => {
                let mut label = name.clone();
                for note in &self.notes {
                    label.push_str("\\n");
                    label.push_str(&escape(note));
                }
                format!(
                    "\"{}\" [ label = \"{}\", shape = \"{}\", style = \"filled\", fillcolor = \"{}\" ];",
                    name, label, shape, fill
                )
            }
        }
    }
}

/// Escape a string for use inside a quoted GraphViz id.
pub fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A caller -> callee relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Call {
    pub caller: NodeId,
    pub callee: NodeId,
}

/// The call graph itself.
///
/// Nodes live in insertion order and a node's id is its index. Calls are
/// deduplicated and also kept in insertion order, so rendering is stable.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: Vec<Node>,
    calls: IndexSet<Call>,
    by_name: HashMap<String, NodeId>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the node called `name`, creating it on first sight.
    pub fn ensure_node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        self.push_node(Node::new(name))
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.by_name.insert(node.name.clone(), id);
        self.nodes.push(node);
        id
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.find(name).and_then(|id| self.node(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate()
    }

    pub fn calls(&self) -> impl Iterator<Item = &Call> {
        self.calls.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a call between two existing nodes. Returns `false` if the same
    /// call was already present.
    pub fn add_call(&mut self, caller: NodeId, callee: NodeId) -> Result<bool> {
        if caller >= self.nodes.len() || callee >= self.nodes.len() {
            return Err(Error::GraphIntegrity {
                caller,
                callee,
                nodes: self.nodes.len(),
            });
        }
        Ok(self.calls.insert(Call { caller, callee }))
    }

    /// Add a call between two functions by name, creating nodes as needed.
    pub fn add_call_by_name(&mut self, caller: &str, callee: &str) -> bool {
        let caller = self.ensure_node(caller);
        let callee = self.ensure_node(callee);
        self.calls.insert(Call { caller, callee })
    }

    /// Check that every call references an existing node.
    pub fn validate(&self) -> Result<()> {
        let nodes = self.nodes.len();
        match self
            .calls
            .iter()
            .find(|c| c.caller >= nodes || c.callee >= nodes)
        {
            Some(c) => Err(Error::GraphIntegrity {
                caller: c.caller,
                callee: c.callee,
                nodes,
            }),
            None => Ok(()),
        }
    }

    /// Display-name pair of a call.
    pub fn call_names(&self, call: &Call) -> Result<(&str, &str)> {
        match (self.node(call.caller), self.node(call.callee)) {
            (Some(caller), Some(callee)) => Ok((&caller.name, &callee.name)),
            _ => Err(Error::GraphIntegrity {
                caller: call.caller,
                callee: call.callee,
                nodes: self.nodes.len(),
            }),
        }
    }

    /// All calls as (caller name, callee name), for id-independent comparison.
    pub fn named_calls(&self) -> BTreeSet<(String, String)> {
        self.calls
            .iter()
            .filter_map(|c| self.call_names(c).ok())
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    /// Fold `other` into this graph.
    ///
    /// Nodes are matched by name, never by id. `other` is checked before
    /// anything is touched, so a failed union leaves `self` unchanged.
    pub fn union(&mut self, other: &CallGraph) -> Result<()> {
        other.validate()?;

        let mut remap: Vec<NodeId> = Vec::with_capacity(other.nodes.len());
        for node in &other.nodes {
            let id = match self.by_name.get(&node.name) {
                Some(&id) => {
                    self.nodes[id].absorb(node);
                    id
                }
                None => self.push_node(node.clone()),
            };
            remap.push(id);
        }

        for call in &other.calls {
            self.calls.insert(Call {
                caller: remap[call.caller],
                callee: remap[call.callee],
            });
        }
        Ok(())
    }
}
