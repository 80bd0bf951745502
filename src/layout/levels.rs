use std::collections::{HashMap, VecDeque};

use super::reach::{Adjacency, Reachable};

/// Signed generation offset per person: the root is 0, parents sit one
/// level up (-1) and children one level down (+1).
///
/// Levels spread breadth-first and the first assignment sticks, so a
/// person reachable along paths of different length keeps the level of
/// the path the walk finds first. Contradictory data (someone recorded as
/// both child and grandchild of the same person) is not reported.
pub fn assign_levels(root: &str, reachable: &Reachable, adj: &Adjacency) -> HashMap<String, i32> {
    let mut levels: HashMap<String, i32> = HashMap::with_capacity(reachable.len());
    levels.insert(root.to_string(), 0);
    let mut queue = VecDeque::from([root.to_string()]);

    while let Some(cur) = queue.pop_front() {
        let level = levels[&cur];
        for parent in adj.parents(&cur) {
            if !reachable.contains(parent) || levels.contains_key(parent) {
                continue;
            }
            levels.insert(parent.clone(), level - 1);
            queue.push_back(parent.clone());
        }
        for child in adj.children(&cur) {
            if !reachable.contains(child) || levels.contains_key(child) {
                continue;
            }
            levels.insert(child.clone(), level + 1);
            queue.push_back(child.clone());
        }
    }

    levels
}
