use std::collections::{HashMap, HashSet};

use crate::config::LayoutConfig;
use crate::ir::{CanonicalEdge, Person};

use super::ordering::LevelOrder;
use super::types::{PlacedNode, VisibleEdge};

/// Grid placement: rank `i` of `n` on level `L` lands at
/// `x = (i - (n - 1) / 2) * node_spacing`, `y = L * rank_spacing`.
pub fn place_nodes(
    order: &LevelOrder,
    persons: &HashMap<String, Person>,
    config: &LayoutConfig,
) -> Vec<PlacedNode> {
    let mut nodes = Vec::new();
    for (level, ids) in order.levels() {
        let half = (ids.len() as f32 - 1.0) / 2.0;
        for (idx, id) in ids.iter().enumerate() {
            let person = persons.get(id).cloned();
            if person.is_none() {
                tracing::warn!(id = %id, "no person record for reachable id");
            }
            nodes.push(PlacedNode {
                id: id.clone(),
                level,
                order: idx,
                x: (idx as f32 - half) * config.node_spacing,
                y: level as f32 * config.rank_spacing,
                person,
            });
        }
    }
    nodes
}

/// Keeps the edges whose both ends made it into the layout.
pub fn visible_edges(edges: &[CanonicalEdge], placed: &HashSet<&str>) -> Vec<VisibleEdge> {
    edges
        .iter()
        .filter(|edge| {
            placed.contains(edge.parent_id.as_str()) && placed.contains(edge.child_id.as_str())
        })
        .map(|edge| VisibleEdge {
            id: edge.id.clone(),
            parent_id: edge.parent_id.clone(),
            child_id: edge.child_id.clone(),
        })
        .collect()
}
