//! Module dependency graph built from descriptors + petgraph
//!
//! ## Graph Structure
//!
//! - **Directed Graph**: `A → B` means "A depends on B" (or "B is A's parent")
//! - **Nodes**: project modules only; references to anything else are external
//! - **Index**: identity → node index
//! - **Order**: one depth-first pass yields both cycle detection and the
//!   topological (build) order, dependencies before dependents
//!
//! Traversal order is fully determined by input order: roots are visited in
//! descriptor order and each node's dependencies in declaration order.

use crate::core::error::{GraphError, ReleaseResult};
use crate::project::{ModuleDescriptor, ModuleId};
use crate::utils::is_nested_under;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Three-color DFS marking
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  Unvisited,
  InProgress,
  Done,
}

/// Directed, acyclic graph of project modules.
pub struct DependencyGraph {
  graph: DiGraph<ModuleDescriptor, ()>,
  index: HashMap<ModuleId, NodeIndex>,
  /// Topological order (dependencies first)
  order: Vec<NodeIndex>,
}

impl DependencyGraph {
  /// Build the graph, rejecting duplicates, unresolved internal references and cycles.
  pub fn build(descriptors: Vec<ModuleDescriptor>) -> ReleaseResult<Self> {
    let mut graph = DiGraph::with_capacity(descriptors.len(), descriptors.len() * 2);
    let mut index = HashMap::with_capacity(descriptors.len());

    for descriptor in descriptors {
      let id = descriptor.id.clone();
      if index.contains_key(&id) {
        return Err(GraphError::DuplicateModule { id: id.to_string() }.into());
      }
      let node = graph.add_node(descriptor);
      index.insert(id, node);
    }

    let nodes: Vec<NodeIndex> = graph.node_indices().collect();
    for from in nodes {
      let mut edges = Vec::new();
      let module = &graph[from];

      for reference in module.references() {
        match index.get(&reference.id) {
          Some(&to) => edges.push(to),
          None if reference.path.is_some() => {
            return Err(
              GraphError::UnresolvedReference {
                module: module.id.to_string(),
                reference: reference.id.to_string(),
              }
              .into(),
            );
          }
          None => {}
        }
      }

      for to in edges {
        if graph.find_edge(from, to).is_none() {
          graph.add_edge(from, to, ());
        }
      }
    }

    let order = topological_order(&graph)?;
    debug!(modules = graph.node_count(), edges = graph.edge_count(), "built module graph");

    Ok(Self { graph, index, order })
  }

  /// Whether a module with this identity is part of the project
  pub fn contains(&self, id: &ModuleId) -> bool {
    self.index.contains_key(id)
  }

  /// Descriptor for a module
  pub fn module(&self, id: &ModuleId) -> Option<&ModuleDescriptor> {
    self.index.get(id).map(|&idx| &self.graph[idx])
  }

  /// All modules in input order
  pub fn modules(&self) -> impl Iterator<Item = &ModuleDescriptor> {
    self.graph.node_indices().map(move |idx| &self.graph[idx])
  }

  /// All modules in build order: if A depends on B, B comes first
  pub fn in_build_order(&self) -> impl Iterator<Item = &ModuleDescriptor> {
    self.order.iter().map(move |&idx| &self.graph[idx])
  }

  /// Direct project dependencies of a module (parent included), in declaration order
  pub fn dependencies(&self, id: &ModuleId) -> Vec<&ModuleId> {
    let Some(&node) = self.index.get(id) else {
      return Vec::new();
    };
    sorted_neighbors(&self.graph, node, Direction::Outgoing)
      .into_iter()
      .map(|idx| &self.graph[idx].id)
      .collect()
  }

  /// Paths of modules located strictly below this module's directory
  pub fn nested_module_paths(&self, id: &ModuleId) -> Vec<PathBuf> {
    let Some(module) = self.module(id) else {
      return Vec::new();
    };
    self
      .modules()
      .filter(|other| is_nested_under(&other.path, &module.path))
      .map(|other| other.path.clone())
      .collect()
  }
}

/// Neighbors sorted by node index (petgraph yields them newest-edge first)
fn sorted_neighbors(
  graph: &DiGraph<ModuleDescriptor, ()>,
  node: NodeIndex,
  direction: Direction,
) -> Vec<NodeIndex> {
  let mut neighbors: Vec<NodeIndex> = graph.neighbors_directed(node, direction).collect();
  neighbors.sort();
  neighbors.dedup();
  neighbors
}

/// Depth-first post-order with three-color marking.
///
/// Reaching an in-progress node closes a cycle; the reported path runs from
/// that node along the current DFS stack and back to it.
fn topological_order(graph: &DiGraph<ModuleDescriptor, ()>) -> ReleaseResult<Vec<NodeIndex>> {
  let mut marks = vec![Mark::Unvisited; graph.node_count()];
  let mut order = Vec::with_capacity(graph.node_count());

  for root in graph.node_indices() {
    if marks[root.index()] != Mark::Unvisited {
      continue;
    }

    // (node, remaining dependencies to visit)
    let mut stack: Vec<(NodeIndex, std::vec::IntoIter<NodeIndex>)> = Vec::new();
    marks[root.index()] = Mark::InProgress;
    stack.push((root, sorted_neighbors(graph, root, Direction::Outgoing).into_iter()));

    while let Some((node, pending)) = stack.last_mut() {
      let node = *node;
      match pending.next() {
        Some(next) => match marks[next.index()] {
          Mark::Unvisited => {
            marks[next.index()] = Mark::InProgress;
            stack.push((next, sorted_neighbors(graph, next, Direction::Outgoing).into_iter()));
          }
          Mark::InProgress => {
            let start = stack.iter().position(|(n, _)| *n == next).unwrap_or(0);
            let mut path: Vec<String> = stack[start..]
              .iter()
              .map(|(n, _)| graph[*n].id.artifact.clone())
              .collect();
            path.push(graph[next].id.artifact.clone());
            return Err(GraphError::Cycle { path }.into());
          }
          Mark::Done => {}
        },
        None => {
          marks[node.index()] = Mark::Done;
          order.push(node);
          stack.pop();
        }
      }
    }
  }

  Ok(order)
}
