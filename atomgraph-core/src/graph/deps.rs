//! Dependency Index
//!
//! Holds every node the store has seen and the edges between them. Edges are
//! kept in both directions: a node's `dependencies` are what it read during
//! its last evaluation, its `dependents` are the reverse index used by the
//! invalidation walk.
//!
//! # Invalidation
//!
//! When an atom is written we walk forward from it, breadth first, through
//! every dependent and every dependent of a dependent, and mark each settled
//! entry stale. Nothing is recomputed here; recomputation happens on the
//! next read. The walk does not stop at entries that are already stale,
//! because their dependents may have been re-read since.

use std::collections::{HashMap, HashSet, VecDeque};

use smallvec::SmallVec;

use super::node::{Node, NodeKey};

/// Nodes plus their edges.
#[derive(Default)]
pub(crate) struct DependencyGraph {
    nodes: HashMap<NodeKey, Node>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node, creating it with `make` on first use.
    pub fn declare(&mut self, key: &NodeKey, make: impl FnOnce() -> Node) -> &mut Node {
        self.nodes.entry(key.clone()).or_insert_with(make)
    }

    pub fn get(&self, key: &NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: &NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Add a dependency edge: `dependent` read `dependency`.
    pub fn add_edge(&mut self, dependency: &NodeKey, dependent: &NodeKey) {
        if let Some(node) = self.nodes.get_mut(dependency) {
            node.add_dependent(dependent.clone());
        }
        if let Some(node) = self.nodes.get_mut(dependent) {
            node.add_dependency(dependency.clone());
        }
    }

    /// Forget every edge recorded by the last evaluation of `dependent`.
    ///
    /// Called right before it evaluates again, so the new evaluation
    /// rediscovers its inputs from scratch.
    pub fn clear_dependencies(&mut self, dependent: &NodeKey) {
        let Some(node) = self.nodes.get_mut(dependent) else {
            return;
        };
        for dependency in node.take_dependencies() {
            if let Some(dep) = self.nodes.get_mut(&dependency) {
                dep.remove_dependent(dependent);
            }
        }
    }

    /// Whether `from` (transitively) depends on `to`.
    pub fn reaches(&self, from: &NodeKey, to: &NodeKey) -> bool {
        let mut visited = HashSet::new();
        let mut stack: SmallVec<[&NodeKey; 8]> = SmallVec::new();
        stack.push(from);

        while let Some(key) = stack.pop() {
            if key == to {
                return true;
            }
            if !visited.insert(key) {
                continue;
            }
            if let Some(node) = self.nodes.get(key) {
                stack.extend(node.dependencies().iter());
            }
        }
        false
    }

    /// Invalidate every node that depends on `source`, directly or not.
    ///
    /// Returns the nodes whose state changed, in walk order.
    pub fn invalidate_dependents(&mut self, source: &NodeKey) -> Vec<NodeKey> {
        let seeds = self
            .nodes
            .get(source)
            .map(|node| node.dependents().iter().cloned().collect())
            .unwrap_or_default();
        self.invalidate(seeds)
    }

    /// Invalidate `seeds` themselves and everything downstream of them.
    pub fn invalidate(&mut self, seeds: Vec<NodeKey>) -> Vec<NodeKey> {
        let mut changed = Vec::new();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<NodeKey> = seeds.into();

        while let Some(key) = queue.pop_front() {
            if !visited.insert(key.clone()) {
                continue;
            }
            let Some(node) = self.nodes.get_mut(&key) else {
                continue;
            };
            if node.invalidate() {
                changed.push(key.clone());
            }
            queue.extend(node.dependents().iter().cloned());
        }

        tracing::trace!(stale = changed.len(), "invalidation walk finished");
        changed
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
