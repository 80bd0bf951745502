mod coords;
mod levels;
mod normalize;
mod ordering;
mod reach;
pub(crate) mod types;
pub use types::*;

pub use coords::{place_nodes, visible_edges};
pub use levels::assign_levels;
pub use normalize::{ParentChild, canonical_edges, normalize};
pub use ordering::{LevelOrder, order_levels};
pub use reach::{Adjacency, Reachable, reachable};

use crate::config::LayoutConfig;
use crate::ir::{GraphSnapshot, Person, Relationship};
use std::collections::{HashMap, HashSet};

/// Lays out the family component around `root`.
///
/// Pure and deterministic: the same inputs always give the same nodes in
/// the same order. A missing root gives an empty layout. People and
/// relationships not connected to the root are left out.
pub fn compute_layout(
    root: Option<&Person>,
    relationships: &[Relationship],
    persons: &HashMap<String, Person>,
    config: &LayoutConfig,
) -> FamilyLayout {
    let mut layout = FamilyLayout {
        node_width: config.node_width,
        node_height: config.node_height,
        ..Default::default()
    };
    let Some(root) = root else {
        tracing::debug!("no root person, empty layout");
        return layout;
    };

    let edges = canonical_edges(relationships);
    let adj = Adjacency::from_edges(&edges);
    let found = reachable(&root.id, &adj);
    let levels = assign_levels(&root.id, &found, &adj);
    let order = order_levels(&root.id, &levels, &adj);

    let mut persons_with_root;
    let persons = if persons.contains_key(&root.id) {
        persons
    } else {
        persons_with_root = persons.clone();
        persons_with_root.insert(root.id.clone(), root.clone());
        &persons_with_root
    };

    layout.nodes = place_nodes(&order, persons, config);
    let placed: HashSet<&str> = layout.nodes.iter().map(|node| node.id.as_str()).collect();
    layout.edges = visible_edges(&edges, &placed);
    layout.levels = order
        .levels()
        .map(|(level, ids)| (level, ids.to_vec()))
        .collect();
    layout.root_id = Some(root.id.clone());

    tracing::debug!(
        relationships = relationships.len(),
        reachable = found.len(),
        levels = layout.levels.len(),
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        "family layout computed"
    );
    layout
}

/// Convenience wrapper over [`compute_layout`] for a fetched snapshot.
pub fn layout_snapshot(snapshot: &GraphSnapshot, config: &LayoutConfig) -> FamilyLayout {
    let persons = snapshot.person_map();
    compute_layout(
        snapshot.root.as_ref(),
        &snapshot.relationships,
        &persons,
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::RelationKind;

    fn person(id: &str) -> Person {
        Person::new(id, id, "Test")
    }

    fn persons(ids: &[&str]) -> HashMap<String, Person> {
        ids.iter().map(|id| (id.to_string(), person(id))).collect()
    }

    #[test]
    fn missing_root_is_empty() {
        let rels = vec![Relationship::new("1", "A", "B", RelationKind::Child)];
        let layout = compute_layout(None, &rels, &persons(&["A", "B"]), &LayoutConfig::default());
        assert!(layout.is_empty());
        assert!(layout.edges.is_empty());
        assert!(layout.bounds().is_none());
    }

    #[test]
    fn levels_are_centered() {
        let config = LayoutConfig::default();
        let root = person("R");
        let rels: Vec<Relationship> = ["C1", "C2", "C3", "C4"]
            .iter()
            .enumerate()
            .map(|(idx, child)| Relationship::new(&idx.to_string(), "R", child, RelationKind::Child))
            .collect();
        let layout = compute_layout(
            Some(&root),
            &rels,
            &persons(&["R", "C1", "C2", "C3", "C4"]),
            &config,
        );
        let xs: Vec<f32> = layout
            .nodes
            .iter()
            .filter(|node| node.level == 1)
            .map(|node| node.x)
            .collect();
        assert_eq!(xs.len(), 4);
        let mean = xs.iter().sum::<f32>() / xs.len() as f32;
        assert!(mean.abs() < 1e-4);
        assert_eq!(xs[0], -1.5 * config.node_spacing);
        assert!(layout.nodes.iter().all(|node| node.level != 1 || node.y == config.rank_spacing));
    }

    #[test]
    fn unknown_person_still_placed() {
        let root = person("R");
        let rels = vec![Relationship::new("1", "R", "ghost", RelationKind::Father)];
        let layout = compute_layout(Some(&root), &rels, &HashMap::new(), &LayoutConfig::default());
        assert_eq!(layout.nodes.len(), 2);
        let ghost = layout.node("ghost").unwrap();
        assert!(ghost.person.is_none());
        assert_eq!(ghost.level, -1);
        assert!(layout.node("R").unwrap().person.is_some());
        assert_eq!(layout.edges.len(), 1);
    }

    #[test]
    fn deterministic_across_runs() {
        let root = person("R");
        let rels = vec![
            Relationship::new("1", "R", "F", RelationKind::Father),
            Relationship::new("2", "R", "M", RelationKind::Mother),
            Relationship::new("3", "R", "K", RelationKind::Child),
            Relationship::new("4", "S", "F", RelationKind::Father),
        ];
        let map = persons(&["R", "F", "M", "K", "S"]);
        let first = compute_layout(Some(&root), &rels, &map, &LayoutConfig::default());
        let second = compute_layout(Some(&root), &rels, &map, &LayoutConfig::default());
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.edges, second.edges);
        assert_eq!(first.levels[&0], vec!["R".to_string(), "S".to_string()]);
    }
}
