use std::collections::BTreeMap;

use serde::Serialize;

use crate::ir::Person;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedNode {
    pub id: String,
    pub level: i32,
    pub order: usize,
    /// Top-left corner of the person card in layout units.
    pub x: f32,
    pub y: f32,
    /// `None` when the relationship data names someone with no record.
    pub person: Option<Person>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleEdge {
    pub id: String,
    pub parent_id: String,
    pub child_id: String,
}

/// Axis-aligned rectangle in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        Rect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FamilyLayout {
    pub root_id: Option<String>,
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<VisibleEdge>,
    /// Visual order per level, top level first.
    pub levels: BTreeMap<i32, Vec<String>>,
    pub node_width: f32,
    pub node_height: f32,
}

impl FamilyLayout {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&PlacedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Card rectangle of one node.
    pub fn node_rect(&self, node: &PlacedNode) -> Rect {
        Rect {
            x: node.x,
            y: node.y,
            width: self.node_width,
            height: self.node_height,
        }
    }

    /// Union of every card rectangle; `None` for an empty layout.
    pub fn bounds(&self) -> Option<Rect> {
        let mut iter = self.nodes.iter().map(|node| self.node_rect(node));
        let first = iter.next()?;
        Some(iter.fold(first, |acc, rect| acc.union(&rect)))
    }
}
