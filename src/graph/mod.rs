//! Module dependency graph
//!
//! Built from loader descriptors + petgraph. Only project modules are nodes;
//! references to anything outside the project never become edges.

pub mod dependency_graph;

pub use dependency_graph::DependencyGraph;
