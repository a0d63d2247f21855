//! Graph model - memory nodes, relationship edges, and the id index.
//!
//! The node and edge records mirror what the data-fetch layer delivers:
//! display metadata is passed through untouched, while position, velocity,
//! and the pin flag are owned by this engine. The full set is replaced
//! wholesale whenever upstream data reloads; nothing here is persisted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::{GraphError, GraphResult};

// =============================================================================
// NODES AND EDGES
// =============================================================================

/// A memory node with 2D position and simulation velocity.
///
/// `x`/`y`/`vx`/`vy`/`fixed` are engine state; everything else is read-only
/// display metadata from the memory store.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryNode {
    /// Unique identifier (uniqueness guaranteed upstream)
    pub id: String,

    /// Display label
    #[serde(default)]
    pub label: String,

    /// Memory kind (fact, decision, episode, ...) - opaque to the engine
    /// except for timeline banding and hierarchy grouping
    #[serde(default, rename = "type")]
    pub node_type: String,

    /// Optional scope (project, session, ...)
    #[serde(default)]
    pub scope: Option<String>,

    /// Display color, passed through to the renderer
    #[serde(default)]
    pub color: Option<String>,

    /// Id of the memory this one was derived from, if any
    #[serde(default)]
    pub source_id: Option<String>,

    /// Creation timestamp, consulted by the timeline layout
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Position in canvas coordinates
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,

    /// Velocity, used only by the force simulation
    #[serde(default)]
    pub vx: f32,
    #[serde(default)]
    pub vy: f32,

    /// True while the node is under direct user control via drag.
    /// A pinned node is excluded from simulation displacement but still
    /// contributes to the forces acting on other nodes.
    #[serde(default)]
    pub fixed: bool,
}

impl MemoryNode {
    /// Create a node with engine state zeroed
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type: String::new(),
            scope: None,
            color: None,
            source_id: None,
            created_at: None,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            fixed: false,
        }
    }

    /// Builder: set position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Builder: set memory kind
    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    /// Builder: set creation timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// A relationship between two memory ids.
///
/// Both ids should exist in the accompanying node set; edges that do not
/// resolve are ignored by every consumer.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryEdge {
    pub source_id: String,
    pub target_id: String,
    /// Relationship label (relates_to, derived_from, ...)
    #[serde(default)]
    pub relationship: String,
}

impl MemoryEdge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship: String::new(),
        }
    }
}

/// The full graph payload as delivered by the data-fetch layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryGraphData {
    #[serde(default)]
    pub nodes: Vec<MemoryNode>,
    #[serde(default)]
    pub edges: Vec<MemoryEdge>,
}

impl MemoryGraphData {
    /// Decode a payload as delivered by the memory-store fetch layer
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

// =============================================================================
// ID INDEX
// =============================================================================

/// Quick id -> slot lookup into a node slice
pub type NodeIndex = HashMap<String, usize>;

/// Build the id index for a node slice.
///
/// Duplicate ids keep the first occurrence so lookups stay deterministic.
pub fn build_index(nodes: &[MemoryNode]) -> NodeIndex {
    let mut index = NodeIndex::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        index.entry(node.id.clone()).or_insert(i);
    }
    index
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// Validated canvas dimensions.
///
/// Non-positive or non-finite dimensions are the one precondition failure
/// in this engine; every downstream computation may assume a usable canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    width: f32,
    height: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32) -> GraphResult<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(GraphError::InvalidCanvas { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Canvas center point
    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Smaller of the two dimensions
    pub fn min_dimension(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Is the point inside `[0,width] x [0,height]`?
    pub fn contains(&self, x: f32, y: f32) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }
}

/// Axis-aligned bounding box over node positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Bounding box over current node positions, `None` for an empty set
pub fn bounds(nodes: &[MemoryNode]) -> Option<Bounds> {
    let first = nodes.first()?;
    let mut b = Bounds {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x,
        max_y: first.y,
    };
    for node in &nodes[1..] {
        b.min_x = b.min_x.min(node.x);
        b.min_y = b.min_y.min(node.y);
        b.max_x = b.max_x.max(node.x);
        b.max_y = b.max_y.max(node.y);
    }
    Some(b)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_index_first_occurrence_wins() {
        let nodes = vec![
            MemoryNode::new("a", "first"),
            MemoryNode::new("b", "other"),
            MemoryNode::new("a", "duplicate"),
        ];
        let index = build_index(&nodes);

        assert_eq!(index.len(), 2);
        assert_eq!(index["a"], 0);
        assert_eq!(index["b"], 1);
    }

    #[test]
    fn test_canvas_size_rejects_degenerate_dimensions() {
        assert!(CanvasSize::new(800.0, 600.0).is_ok());
        assert!(CanvasSize::new(0.0, 600.0).is_err());
        assert!(CanvasSize::new(800.0, -1.0).is_err());
        assert!(CanvasSize::new(f32::NAN, 600.0).is_err());
        assert!(CanvasSize::new(f32::INFINITY, 600.0).is_err());
    }

    #[test]
    fn test_bounds_over_positions() {
        assert!(bounds(&[]).is_none());

        let nodes = vec![
            MemoryNode::new("a", "a").with_position(10.0, 50.0),
            MemoryNode::new("b", "b").with_position(-5.0, 20.0),
            MemoryNode::new("c", "c").with_position(30.0, 0.0),
        ];
        let b = bounds(&nodes).unwrap();
        assert_eq!(b.min_x, -5.0);
        assert_eq!(b.max_x, 30.0);
        assert_eq!(b.min_y, 0.0);
        assert_eq!(b.max_y, 50.0);
        assert_eq!(b.center(), (12.5, 25.0));
    }

    #[test]
    fn test_graph_payload_decodes_from_json() {
        let payload = r##"{
            "nodes": [
                {
                    "id": "mem-1",
                    "label": "architecture decision",
                    "type": "decision",
                    "scope": "project",
                    "color": "#7b1fa2",
                    "created_at": "2026-03-01T10:00:00Z"
                },
                {"id": "mem-2", "label": "follow-up fact", "type": "fact", "source_id": "mem-1"}
            ],
            "edges": [
                {"source_id": "mem-1", "target_id": "mem-2", "relationship": "derived_from"}
            ]
        }"##;

        let data = MemoryGraphData::from_json(payload).unwrap();
        assert_eq!(data.nodes.len(), 2);
        assert_eq!(data.edges.len(), 1);

        let first = &data.nodes[0];
        assert_eq!(first.node_type, "decision");
        assert!(first.created_at.is_some());
        assert!(!first.fixed);
        assert_eq!(first.x, 0.0);
        assert_eq!(data.edges[0].relationship, "derived_from");
    }
}
