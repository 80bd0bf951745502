use std::collections::{HashMap, HashSet, VecDeque};

use crate::ir::CanonicalEdge;

/// Parent/child adjacency built from canonical edges. Neighbour lists keep
/// first-seen order and drop repeats, so duplicate relationship rows
/// collapse to one link.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    parents_of: HashMap<String, Vec<String>>,
    children_of: HashMap<String, Vec<String>>,
}

impl Adjacency {
    pub fn from_edges(edges: &[CanonicalEdge]) -> Self {
        let mut adj = Self::default();
        for edge in edges {
            push_unique(
                adj.parents_of.entry(edge.child_id.clone()).or_default(),
                &edge.parent_id,
            );
            push_unique(
                adj.children_of.entry(edge.parent_id.clone()).or_default(),
                &edge.child_id,
            );
        }
        adj
    }

    pub fn parents(&self, id: &str) -> &[String] {
        self.parents_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.children_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}

/// Connected component around the root, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Reachable {
    order: Vec<String>,
    members: HashSet<String>,
}

impl Reachable {
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, id: &str) -> bool {
        if self.members.insert(id.to_string()) {
            self.order.push(id.to_string());
            true
        } else {
            false
        }
    }
}

/// Breadth-first walk over parents and children alike. Edge direction is
/// ignored here; it only matters for levels.
pub fn reachable(root: &str, adj: &Adjacency) -> Reachable {
    let mut seen = Reachable::default();
    let mut queue = VecDeque::new();
    seen.insert(root);
    queue.push_back(root.to_string());

    while let Some(cur) = queue.pop_front() {
        for next in adj.parents(&cur).iter().chain(adj.children(&cur)) {
            if seen.insert(next) {
                queue.push_back(next.clone());
            }
        }
    }

    seen
}
