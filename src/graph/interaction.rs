//! Drag/pin interaction and the pure viewport transform.
//!
//! Dragging pins a node: the simulation keeps treating it as a force
//! source but stops displacing it, so the net movement of a dragged node
//! is exactly the sum of the drag deltas regardless of interleaved ticks.
//! The viewport is presentation-only - pan and zoom never touch the
//! logical node coordinates the simulation and layouts operate on.

use tracing::debug;

use super::model::{Bounds, CanvasSize};
use super::{GraphScene, LayoutMode};

// =============================================================================
// INTERACTION CONTROLLER
// =============================================================================

/// Per-node drag state machine: FREE -> startDrag -> PINNED -> endDrag -> FREE.
///
/// Holds only the id of the node currently under drag; a wholesale data
/// reload simply invalidates it.
#[derive(Debug, Default)]
pub struct InteractionController {
    dragging: Option<String>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the node currently being dragged, if any
    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    /// Pin a node for dragging.
    ///
    /// While the force layout is active the simulation is reheated so the
    /// rest of the graph relaxes around the new anchor.
    pub fn start_drag(&mut self, scene: &mut GraphScene, node_id: &str) {
        let Some(node) = scene.node_mut(node_id) else {
            debug!(node_id, "start_drag ignored: unknown node");
            return;
        };
        node.fixed = true;
        node.vx = 0.0;
        node.vy = 0.0;
        self.dragging = Some(node_id.to_string());

        if scene.layout() == LayoutMode::Force {
            scene.simulation_mut().reheat();
        }
    }

    /// Move a dragged node by a delta in canvas coordinates.
    ///
    /// Bypasses the simulation entirely and affects only the targeted node.
    pub fn drag(&mut self, scene: &mut GraphScene, node_id: &str, dx: f32, dy: f32) {
        let Some(node) = scene.node_mut(node_id) else {
            debug!(node_id, "drag ignored: unknown node");
            return;
        };
        node.x += dx;
        node.y += dy;
    }

    /// Release a node back to simulation control.
    pub fn end_drag(&mut self, scene: &mut GraphScene, node_id: &str) {
        if let Some(node) = scene.node_mut(node_id) {
            node.fixed = false;
        }
        if self.dragging.as_deref() == Some(node_id) {
            self.dragging = None;
        }
    }
}

// =============================================================================
// VIEWPORT
// =============================================================================

/// Zoom limits
const MIN_SCALE: f32 = 0.1;
const MAX_SCALE: f32 = 5.0;

/// Pure pan/zoom transform between world (node) and screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub pan_x: f32,
    pub pan_y: f32,
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pan by a delta in screen coordinates
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Zoom by a factor, keeping the given screen point fixed in view
    pub fn zoom_at(&mut self, factor: f32, focus_x: f32, focus_y: f32) {
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if (new_scale - self.scale).abs() < f32::EPSILON {
            return;
        }
        // World point under the focus stays under the focus
        let world_x = (focus_x - self.pan_x) / self.scale;
        let world_y = (focus_y - self.pan_y) / self.scale;
        self.pan_x = focus_x - world_x * new_scale;
        self.pan_y = focus_y - world_y * new_scale;
        self.scale = new_scale;
    }

    pub fn world_to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.pan_x, y * self.scale + self.pan_y)
    }

    pub fn screen_to_world(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pan_x) / self.scale, (y - self.pan_y) / self.scale)
    }

    /// Derive pan and scale so a world-space bounding box fits the canvas
    /// with the given margin.
    pub fn fit_to_bounds(&mut self, bounds: &Bounds, canvas: &CanvasSize, margin: f32) {
        let usable_w = (canvas.width() - 2.0 * margin).max(1.0);
        let usable_h = (canvas.height() - 2.0 * margin).max(1.0);
        // A degenerate box (single node) just centers at scale 1
        let scale = if bounds.width() < 1.0 || bounds.height() < 1.0 {
            1.0
        } else {
            (usable_w / bounds.width())
                .min(usable_h / bounds.height())
                .clamp(MIN_SCALE, MAX_SCALE)
        };

        let (bcx, bcy) = bounds.center();
        let (ccx, ccy) = canvas.center();
        self.scale = scale;
        self.pan_x = ccx - bcx * scale;
        self.pan_y = ccy - bcy * scale;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::{MemoryEdge, MemoryGraphData, MemoryNode};

    fn scene_with_pair() -> GraphScene {
        let mut scene = GraphScene::new(CanvasSize::new(800.0, 600.0).unwrap());
        scene.set_data(MemoryGraphData {
            nodes: vec![
                MemoryNode::new("a", "a").with_position(300.0, 300.0),
                MemoryNode::new("b", "b").with_position(500.0, 300.0),
            ],
            edges: vec![MemoryEdge::new("a", "b")],
        });
        scene
    }

    #[test]
    fn test_drag_displacement_is_exact_across_ticks() {
        let mut scene = scene_with_pair();
        let mut controller = InteractionController::new();

        let (x0, y0) = {
            let node = scene.node("a").unwrap();
            (node.x, node.y)
        };

        controller.start_drag(&mut scene, "a");
        controller.drag(&mut scene, "a", 15.0, -10.0);
        for _ in 0..20 {
            scene.step();
        }
        controller.drag(&mut scene, "a", -5.0, 25.0);
        for _ in 0..20 {
            scene.step();
        }
        controller.end_drag(&mut scene, "a");

        let node = scene.node("a").unwrap();
        assert_eq!(node.x, x0 + 10.0);
        assert_eq!(node.y, y0 + 15.0);
        assert!(!node.fixed);
        assert!(controller.dragging().is_none());
    }

    #[test]
    fn test_start_drag_reheats_force_simulation() {
        let mut scene = scene_with_pair();
        // Cool the simulation down first
        for _ in 0..60 {
            scene.step();
        }
        let cooled = scene.simulation().alpha();
        assert!(cooled < scene.simulation().config.reheat_alpha);

        let mut controller = InteractionController::new();
        controller.start_drag(&mut scene, "b");

        assert!(scene.simulation().alpha() >= scene.simulation().config.reheat_alpha);
        assert!(scene.simulation().is_active());
        assert_eq!(controller.dragging(), Some("b"));
    }

    #[test]
    fn test_unknown_node_is_ignored() {
        let mut scene = scene_with_pair();
        let mut controller = InteractionController::new();

        controller.start_drag(&mut scene, "ghost");
        controller.drag(&mut scene, "ghost", 10.0, 10.0);
        controller.end_drag(&mut scene, "ghost");

        assert!(controller.dragging().is_none());
        assert_eq!(scene.node("a").unwrap().x, 300.0);
    }

    #[test]
    fn test_zoom_at_keeps_focus_point_fixed() {
        let mut viewport = Viewport::new();
        viewport.pan(40.0, -20.0);

        let (wx, wy) = viewport.screen_to_world(200.0, 150.0);
        viewport.zoom_at(1.5, 200.0, 150.0);

        let (sx, sy) = viewport.world_to_screen(wx, wy);
        assert!((sx - 200.0).abs() < 1e-3);
        assert!((sy - 150.0).abs() < 1e-3);
        assert!((viewport.scale - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::new();
        viewport.zoom_at(100.0, 0.0, 0.0);
        assert_eq!(viewport.scale, 5.0);
        viewport.zoom_at(1.0e-6, 0.0, 0.0);
        assert_eq!(viewport.scale, 0.1);
    }

    #[test]
    fn test_fit_to_bounds_centers_content() {
        let mut viewport = Viewport::new();
        let bounds = Bounds {
            min_x: 100.0,
            min_y: 100.0,
            max_x: 300.0,
            max_y: 200.0,
        };
        let canvas = CanvasSize::new(800.0, 600.0).unwrap();
        viewport.fit_to_bounds(&bounds, &canvas, 50.0);

        // Bounds center maps to canvas center
        let (sx, sy) = viewport.world_to_screen(200.0, 150.0);
        assert!((sx - 400.0).abs() < 1e-3);
        assert!((sy - 300.0).abs() < 1e-3);

        // Content fits inside the margin
        let (left, top) = viewport.world_to_screen(100.0, 100.0);
        let (right, bottom) = viewport.world_to_screen(300.0, 200.0);
        assert!(left >= 49.0 && top >= 49.0);
        assert!(right <= 751.0 && bottom <= 551.0);
    }

    #[test]
    fn test_viewport_never_mutates_node_positions() {
        let mut scene = scene_with_pair();
        let before: Vec<(f32, f32)> = scene.nodes().iter().map(|n| (n.x, n.y)).collect();

        let mut viewport = Viewport::new();
        viewport.pan(100.0, 100.0);
        viewport.zoom_at(2.0, 400.0, 300.0);
        if let Some(bounds) = scene.bounds() {
            viewport.fit_to_bounds(&bounds, &CanvasSize::new(800.0, 600.0).unwrap(), 40.0);
        }

        let after: Vec<(f32, f32)> = scene.nodes().iter().map(|n| (n.x, n.y)).collect();
        assert_eq!(before, after);
    }
}
