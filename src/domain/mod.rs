pub mod analysis;
pub mod callgraph;
pub mod results;
