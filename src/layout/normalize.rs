use crate::ir::{CanonicalEdge, RelationKind, Relationship};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentChild<'a> {
    pub parent_id: &'a str,
    pub child_id: &'a str,
}

/// Resolves a relationship row to its parent -> child direction.
pub fn normalize(rel: &Relationship) -> ParentChild<'_> {
    match rel.relation_type {
        RelationKind::Child => ParentChild {
            parent_id: &rel.from_person_id,
            child_id: &rel.to_person_id,
        },
        RelationKind::Father | RelationKind::Mother => ParentChild {
            parent_id: &rel.to_person_id,
            child_id: &rel.from_person_id,
        },
    }
}

pub fn canonical_edges(relationships: &[Relationship]) -> Vec<CanonicalEdge> {
    relationships
        .iter()
        .map(|rel| {
            let pc = normalize(rel);
            CanonicalEdge {
                id: rel.id.clone(),
                parent_id: pc.parent_id.to_string(),
                child_id: pc.child_id.to_string(),
            }
        })
        .collect()
}
