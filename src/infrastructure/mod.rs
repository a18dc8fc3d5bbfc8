// Infrastructure implementations for soaap-graph.

pub mod report_parser;
pub mod results_cache;
pub mod results_store;
