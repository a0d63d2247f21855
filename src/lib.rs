//! Memory Graph Layout Engine
//!
//! This crate contains ONLY the layout engine - no rendering, no data fetch,
//! no app shell. It maps a memory graph (nodes + relationship edges) onto 2D
//! canvas coordinates and keeps them updated while the user interacts.
//!
//! The renderer and the data-fetch layer are owned by the UI host; this crate
//! computes and mutates positions in place and publishes frame generations
//! through a watch channel.

pub mod graph;

pub use graph::{
    apply_circular_layout,
    apply_hierarchy_layout,
    apply_timeline_layout,
    // Graph model
    Bounds,
    CanvasSize,
    // Physics
    ForceConfig,
    ForceSimulation,
    // Errors
    GraphError,
    GraphResult,
    // Scene facade
    GraphScene,
    // Interaction
    InteractionController,
    LayoutMode,
    MemoryEdge,
    MemoryGraphData,
    MemoryNode,
    SharedScene,
    // Scheduler
    SimulationScheduler,
    Viewport,
    DEFAULT_TICK_INTERVAL,
};
