//! Inheritance graph.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: registered [`ClassId`]s
//! - Edges: supertype → subtype
//!
//! A topological sort of the graph is the order in which class models can be
//! built so that every supertype is ready before its subtypes.

use petgraph::Direction;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use crate::ClassId;

/// Directed graph of direct inheritance relations.
#[derive(Debug, Default)]
pub struct InheritanceGraph {
    graph: DiGraph<ClassId, ()>,
    nodes: FxHashMap<ClassId, NodeIndex>,
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure `class` has a node.
    pub fn add_class(&mut self, class: ClassId) -> NodeIndex {
        if let Some(&node) = self.nodes.get(&class) {
            return node;
        }
        let node = self.graph.add_node(class);
        self.nodes.insert(class, node);
        node
    }

    /// Record that `subtype` directly extends or implements `supertype`.
    pub fn add_edge(&mut self, supertype: ClassId, subtype: ClassId) {
        let from = self.add_class(supertype);
        let to = self.add_class(subtype);
        self.graph.update_edge(from, to, ());
    }

    /// Direct supertypes of `class`.
    pub fn direct_supertypes(&self, class: ClassId) -> Vec<ClassId> {
        self.neighbors(class, Direction::Incoming)
    }

    /// Direct subtypes of `class`.
    pub fn direct_subtypes(&self, class: ClassId) -> Vec<ClassId> {
        self.neighbors(class, Direction::Outgoing)
    }

    fn neighbors(&self, class: ClassId, direction: Direction) -> Vec<ClassId> {
        let Some(&node) = self.nodes.get(&class) else {
            return Vec::new();
        };
        let mut found: Vec<ClassId> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n])
            .collect();
        found.sort();
        found
    }

    /// Whether `ancestor` is `class` or one of its transitive supertypes.
    pub fn is_ancestor(&self, ancestor: ClassId, class: ClassId) -> bool {
        match (self.nodes.get(&ancestor), self.nodes.get(&class)) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.graph, from, to, None),
            _ => ancestor == class,
        }
    }

    /// Supertypes-first ordering of every class in the graph.
    ///
    /// On a cycle, returns the class at which the cycle was detected.
    pub fn build_order(&self) -> Result<Vec<ClassId>, ClassId> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n]).collect())
            .map_err(|cycle| self.graph[cycle.node_id()])
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
