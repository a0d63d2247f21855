//! Memory graph layout engine.
//!
//! Maps a memory graph onto 2D canvas coordinates for interactive display.
//!
//! # Architecture
//!
//! ```text
//! MemoryGraphData (from the data-fetch layer)
//!        |
//!        v
//! GraphScene (nodes, edges, id index, canvas, active layout)
//!        |
//!        +--> ForceSimulation (tick: repulsion, springs, centering)
//!        |         ^
//!        |         | driven at ~60 steps/s
//!        |    SimulationScheduler (tokio task, watch-channel cancel)
//!        |
//!        +--> layouts (timeline / hierarchy / circular, deterministic)
//!        |
//!        +--> InteractionController (drag = pin + direct move)
//!                   |
//!                   v
//!             Viewport (pan/zoom transform, render-time only)
//! ```
//!
//! The renderer reads positions in place each frame; this crate never draws.

pub mod error;
pub mod force;
pub mod interaction;
pub mod layouts;
pub mod model;
pub mod scheduler;

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

pub use error::{GraphError, GraphResult};
pub use force::{ForceConfig, ForceSimulation};
pub use interaction::{InteractionController, Viewport};
pub use layouts::{apply_circular_layout, apply_hierarchy_layout, apply_timeline_layout};
pub use model::{Bounds, CanvasSize, MemoryEdge, MemoryGraphData, MemoryNode, NodeIndex};
pub use scheduler::{SimulationScheduler, DEFAULT_TICK_INTERVAL};

// =============================================================================
// LAYOUT MODE
// =============================================================================

/// Active layout strategy for the graph view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// Physics-based force-directed layout, stepped by the scheduler
    #[default]
    Force,
    /// Chronological placement banded by memory kind
    Timeline,
    /// Layered placement by relationship depth
    Hierarchy,
    /// All nodes evenly spaced on a circle
    Circular,
}

impl LayoutMode {
    /// Stable string form, used in logs and by the UI layer
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Force => "force",
            LayoutMode::Timeline => "timeline",
            LayoutMode::Hierarchy => "hierarchy",
            LayoutMode::Circular => "circular",
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            LayoutMode::Force => "Force",
            LayoutMode::Timeline => "Timeline",
            LayoutMode::Hierarchy => "Hierarchy",
            LayoutMode::Circular => "Circular",
        }
    }

    /// All selectable modes
    pub fn all() -> &'static [LayoutMode] {
        &[
            LayoutMode::Force,
            LayoutMode::Timeline,
            LayoutMode::Hierarchy,
            LayoutMode::Circular,
        ]
    }
}

// =============================================================================
// GRAPH SCENE
// =============================================================================

/// The scene shared between the UI thread and the scheduler task.
///
/// One coarse lock guards a full tick or a full drag mutation; contention
/// is inherently low (one user, one loop).
pub type SharedScene = Arc<Mutex<GraphScene>>;

/// Owns the graph model, the force simulation, and the active layout.
///
/// The node/edge set is replaced wholesale whenever upstream data reloads;
/// no state survives a teardown.
#[derive(Debug)]
pub struct GraphScene {
    nodes: Vec<MemoryNode>,
    edges: Vec<MemoryEdge>,
    index: NodeIndex,
    sim: ForceSimulation,
    layout: LayoutMode,
    canvas: CanvasSize,
}

impl GraphScene {
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            index: NodeIndex::new(),
            sim: ForceSimulation::new(canvas),
            layout: LayoutMode::default(),
            canvas,
        }
    }

    /// Wrap the scene for sharing with the scheduler
    pub fn into_shared(self) -> SharedScene {
        Arc::new(Mutex::new(self))
    }

    // =========================================================================
    // DATA LIFECYCLE
    // =========================================================================

    /// Replace the graph wholesale and position it for the active layout.
    ///
    /// Under the force layout, a payload arriving with every node at the
    /// origin gets seeded onto the ring; pre-positioned payloads keep their
    /// coordinates and the simulation just restarts around them.
    pub fn set_data(&mut self, data: MemoryGraphData) {
        info!(
            nodes = data.nodes.len(),
            edges = data.edges.len(),
            layout = self.layout.as_str(),
            "graph data replaced"
        );
        self.nodes = data.nodes;
        self.edges = data.edges;
        self.index = model::build_index(&self.nodes);
        self.position_for_layout();
    }

    /// Drop all nodes and edges
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.index.clear();
        self.sim.stop();
    }

    // =========================================================================
    // CONFIGURATION
    // =========================================================================

    /// Resize the canvas and re-position for the active layout.
    ///
    /// Non-positive or non-finite dimensions are rejected.
    pub fn set_canvas_size(&mut self, width: f32, height: f32) -> GraphResult<()> {
        let canvas = CanvasSize::new(width, height)?;
        self.canvas = canvas;
        self.sim.set_canvas(canvas);
        match self.layout {
            // Let the graph re-relax toward the new center
            LayoutMode::Force => self.sim.reheat(),
            _ => self.position_for_layout(),
        }
        Ok(())
    }

    /// Switch the active layout.
    ///
    /// Deterministic layouts apply immediately and halt the simulation; a
    /// running scheduler loop observes the switch within one tick. Switching
    /// to force restarts the simulation over the current arrangement.
    pub fn set_layout(&mut self, layout: LayoutMode) {
        if self.layout == layout {
            return;
        }
        debug!(from = self.layout.as_str(), to = layout.as_str(), "layout switched");
        self.layout = layout;
        match layout {
            LayoutMode::Force => self.sim.restart(),
            _ => {
                self.sim.stop();
                self.position_for_layout();
            }
        }
    }

    fn position_for_layout(&mut self) {
        match self.layout {
            LayoutMode::Force => {
                let unpositioned = !self.nodes.is_empty()
                    && self.nodes.iter().all(|n| n.x == 0.0 && n.y == 0.0);
                if unpositioned {
                    self.sim.initialize_positions(&mut self.nodes);
                } else {
                    self.sim.restart();
                }
            }
            LayoutMode::Timeline => apply_timeline_layout(&mut self.nodes, &self.canvas),
            LayoutMode::Hierarchy => {
                apply_hierarchy_layout(&mut self.nodes, &self.edges, &self.canvas)
            }
            LayoutMode::Circular => apply_circular_layout(&mut self.nodes, &self.canvas),
        }
    }

    /// Seed every node position afresh and restart the simulation
    pub fn initialize_positions(&mut self) {
        self.sim.initialize_positions(&mut self.nodes);
    }

    // =========================================================================
    // STEPPING
    // =========================================================================

    /// One simulation tick over the owned model.
    ///
    /// This is what the scheduler calls under the scene lock; returns
    /// `false` once stabilized.
    pub fn step(&mut self) -> bool {
        self.sim.tick(&mut self.nodes, &self.edges, &self.index)
    }

    // =========================================================================
    // ACCESS
    // =========================================================================

    pub fn nodes(&self) -> &[MemoryNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[MemoryEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&MemoryNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut MemoryNode> {
        self.index.get(id).copied().map(|i| &mut self.nodes[i])
    }

    /// Bounding box over current node positions
    pub fn bounds(&self) -> Option<Bounds> {
        model::bounds(&self.nodes)
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn simulation(&self) -> &ForceSimulation {
        &self.sim
    }

    pub fn simulation_mut(&mut self) -> &mut ForceSimulation {
        &mut self.sim
    }
}

// =============================================================================
// TESTS
// =============================================================================
