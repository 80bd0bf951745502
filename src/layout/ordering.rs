use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::reach::Adjacency;

/// Left-to-right order of every level. Each bucket is the visual order;
/// `rank` is the dense index of a person inside its bucket.
#[derive(Debug, Clone, Default)]
pub struct LevelOrder {
    buckets: BTreeMap<i32, Vec<String>>,
    ranks: HashMap<String, usize>,
}

impl LevelOrder {
    pub fn bucket(&self, level: i32) -> &[String] {
        self.buckets.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rank(&self, id: &str) -> Option<usize> {
        self.ranks.get(id).copied()
    }

    pub fn levels(&self) -> impl Iterator<Item = (i32, &[String])> {
        self.buckets
            .iter()
            .map(|(level, ids)| (*level, ids.as_slice()))
    }

    fn set(&mut self, level: i32, ids: Vec<String>) {
        for (idx, id) in ids.iter().enumerate() {
            self.ranks.insert(id.clone(), idx);
        }
        self.buckets.insert(level, ids);
    }
}

/// Single-sweep barycenter ordering, outward from the root level.
///
/// Level 0 keeps the root first, so the root always has rank 0; anyone
/// else who landed on the root's level (siblings, co-parents) follows in
/// id order. Below the root each
/// level is sorted by the mean rank of its parents one level up; above
/// the root by the mean rank of its children one level down. People with
/// no such neighbour sort last, and ties fall back to id order.
pub fn order_levels(root: &str, levels: &HashMap<String, i32>, adj: &Adjacency) -> LevelOrder {
    let mut grouped: BTreeMap<i32, Vec<String>> = BTreeMap::new();
    for (id, level) in levels {
        grouped.entry(*level).or_default().push(id.clone());
    }
    let min_level = grouped.keys().next().copied().unwrap_or(0);
    let max_level = grouped.keys().next_back().copied().unwrap_or(0);

    let mut order = LevelOrder::default();

    let mut peers: Vec<String> = grouped
        .remove(&0)
        .unwrap_or_default()
        .into_iter()
        .filter(|id| id != root)
        .collect();
    peers.sort();
    let mut zero = Vec::with_capacity(peers.len() + 1);
    if levels.contains_key(root) {
        zero.push(root.to_string());
    }
    zero.extend(peers);
    order.set(0, zero);

    for level in 1..=max_level {
        let mut ids = grouped.remove(&level).unwrap_or_default();
        sort_by_anchor(&mut ids, |id| {
            anchor(adj.parents(id), level - 1, levels, &order)
        });
        order.set(level, ids);
    }

    for level in (min_level..=-1).rev() {
        let mut ids = grouped.remove(&level).unwrap_or_default();
        sort_by_anchor(&mut ids, |id| {
            anchor(adj.children(id), level + 1, levels, &order)
        });
        order.set(level, ids);
    }

    order
}

fn sort_by_anchor<F>(ids: &mut [String], anchor_of: F)
where
    F: Fn(&str) -> f64,
{
    let mut keyed: Vec<(f64, String)> = ids
        .iter()
        .map(|id| (anchor_of(id), id.clone()))
        .collect();
    keyed.sort_by(|a, b| match a.0.total_cmp(&b.0) {
        Ordering::Equal => a.1.cmp(&b.1),
        other => other,
    });
    for (slot, (_, id)) in ids.iter_mut().zip(keyed) {
        *slot = id;
    }
}

/// Mean rank of the neighbours that sit on `anchor_level`, or +inf when
/// there are none.
pub(super) fn anchor(
    neighbours: &[String],
    anchor_level: i32,
    levels: &HashMap<String, i32>,
    order: &LevelOrder,
) -> f64 {
    let mut total = 0.0f64;
    let mut count = 0usize;
    for neighbour in neighbours {
        if levels.get(neighbour) != Some(&anchor_level) {
            continue;
        }
        if let Some(rank) = order.rank(neighbour) {
            total += rank as f64;
            count += 1;
        }
    }
    if count == 0 {
        f64::INFINITY
    } else {
        total / count as f64
    }
}
