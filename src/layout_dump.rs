use crate::layout::FamilyLayout;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub root_id: Option<String>,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub levels: BTreeMap<i32, Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub name: String,
    pub level: i32,
    pub order: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub missing_record: bool,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub parent: String,
    pub child: String,
}

impl LayoutDump {
    pub fn from_layout(layout: &FamilyLayout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                name: node
                    .person
                    .as_ref()
                    .map(|person| person.display_name())
                    .unwrap_or_else(|| node.id.clone()),
                level: node.level,
                order: node.order,
                x: node.x,
                y: node.y,
                width: layout.node_width,
                height: layout.node_height,
                missing_record: node.person.is_none(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                parent: edge.parent_id.clone(),
                child: edge.child_id.clone(),
            })
            .collect();

        let (width, height) = layout
            .bounds()
            .map(|rect| (rect.width, rect.height))
            .unwrap_or((0.0, 0.0));

        LayoutDump {
            root_id: layout.root_id.clone(),
            width,
            height,
            nodes,
            edges,
            levels: layout.levels.clone(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &FamilyLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
