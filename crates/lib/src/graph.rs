//! Dependency graph over parts.
//!
//! Edges run from a prerequisite to the part that declares it in `after`.
//! Forward resolution (staging prerequisites) is done by recursion in the
//! lifecycle executor; this module answers the direct and reverse queries.

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
  #[error("part '{part}' is listed in 'after' of '{dependent}' but is not defined")]
  UnknownPrerequisite { part: String, dependent: String },

  #[error("dependency cycle detected involving part '{0}'")]
  CycleDetected(String),

  #[error("unknown part '{0}'")]
  UnknownPart(String),
}

/// Prerequisite graph of a project's parts.
#[derive(Debug, Clone)]
pub struct PartGraph {
  graph: DiGraph<String, ()>,
  nodes: HashMap<String, NodeIndex>,
}

impl PartGraph {
  /// Build the graph from `(part, after)` pairs.
  ///
  /// Fails if an `after` entry names a part that is not in the list. Cycles
  /// are not rejected here; see [`PartGraph::verify_acyclic`].
  pub fn new<'a, I>(parts: I) -> Result<Self, GraphError>
  where
    I: IntoIterator<Item = (&'a str, &'a [String])>,
  {
    let parts: Vec<_> = parts.into_iter().collect();
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for (name, _) in &parts {
      let idx = graph.add_node(name.to_string());
      nodes.insert(name.to_string(), idx);
    }

    for (name, after) in &parts {
      let dependent_idx = nodes[*name];
      for prereq in after.iter() {
        let Some(&prereq_idx) = nodes.get(prereq) else {
          return Err(GraphError::UnknownPrerequisite {
            part: prereq.clone(),
            dependent: name.to_string(),
          });
        };
        graph.update_edge(prereq_idx, dependent_idx, ());
      }
    }

    Ok(Self { graph, nodes })
  }

  pub fn verify_acyclic(&self) -> Result<(), GraphError> {
    toposort(&self.graph, None).map_err(|cycle| GraphError::CycleDetected(self.graph[cycle.node_id()].clone()))?;
    Ok(())
  }

  pub fn contains(&self, part: &str) -> bool {
    self.nodes.contains_key(part)
  }

  fn index(&self, part: &str) -> Result<NodeIndex, GraphError> {
    self
      .nodes
      .get(part)
      .copied()
      .ok_or_else(|| GraphError::UnknownPart(part.to_string()))
  }

  fn neighbors(&self, part: &str, direction: Direction) -> Result<BTreeSet<String>, GraphError> {
    let idx = self.index(part)?;
    Ok(
      self
        .graph
        .neighbors_directed(idx, direction)
        .map(|n| self.graph[n].clone())
        .collect(),
    )
  }

  /// Parts that `part` lists in `after` (not transitive).
  pub fn prerequisites(&self, part: &str) -> Result<BTreeSet<String>, GraphError> {
    self.neighbors(part, Direction::Incoming)
  }

  /// Parts that list `part` in `after` (not transitive).
  pub fn dependents(&self, part: &str) -> Result<BTreeSet<String>, GraphError> {
    self.neighbors(part, Direction::Outgoing)
  }

  /// Every part that directly or indirectly depends on `part`.
  ///
  /// Walks dependents with an explicit visited set. Reaching `part` again
  /// means the graph is cyclic and yields `CycleDetected`.
  pub fn reverse_dependents(&self, part: &str) -> Result<BTreeSet<String>, GraphError> {
    let start = self.index(part)?;
    let mut visited = BTreeSet::new();
    let mut pending = vec![start];

    while let Some(idx) = pending.pop() {
      for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
        if dependent == start {
          return Err(GraphError::CycleDetected(part.to_string()));
        }
        if visited.insert(self.graph[dependent].clone()) {
          pending.push(dependent);
        }
      }
    }

    Ok(visited)
  }
}
