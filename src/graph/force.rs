//! Force simulation for the memory graph.
//!
//! Implements a force-directed layout stepped at a fixed cadence by the
//! scheduler. Designed for the upstream query's typical page size
//! (up to ~150 nodes); the O(n^2) repulsion pass is fine at that scale.
//!
//! Forces per tick:
//! - Repulsion between all node pairs (inverse square, distance floored)
//! - Spring attraction along each edge toward a rest length
//! - Weak centering toward the canvas center
//!
//! Velocity integration is damped, scaled by the decaying temperature
//! `alpha`, and displacement-capped, so degenerate inputs (coincident
//! nodes, self-loops, isolated nodes) never produce NaN or infinite
//! coordinates.

use rand::Rng;
use tracing::debug;

use super::model::{CanvasSize, MemoryEdge, MemoryNode, NodeIndex};

// =============================================================================
// SIMULATION CONFIG
// =============================================================================

/// Tunable physics constants for the force simulation
#[derive(Debug, Clone)]
pub struct ForceConfig {
    /// Repulsion strength between node pairs
    pub repulsion: f32,

    /// Spring stiffness along edges
    pub spring_strength: f32,

    /// Rest length a spring relaxes toward
    pub spring_rest_length: f32,

    /// Pull toward canvas center (keeps disconnected nodes from drifting off)
    pub center_strength: f32,

    /// Velocity damping per tick (0.0 = instant stop, 1.0 = no damping)
    pub damping: f32,

    /// Distance floor for force calculation (coincident-point guard)
    pub min_distance: f32,

    /// Maximum displacement per tick (overshoot guard)
    pub max_displacement: f32,

    /// Multiplicative temperature decay per tick
    pub alpha_decay: f32,

    /// Temperature below which the simulation reports stabilized
    pub alpha_min: f32,

    /// Temperature a reheat bumps alpha up to
    pub reheat_alpha: f32,

    /// Kinetic-energy floor below which the simulation reports stabilized
    pub energy_epsilon: f32,

    /// Hard cap on ticks per run; reaching it force-stops the simulation
    pub max_iterations: u32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            repulsion: 6000.0,
            spring_strength: 0.08,
            spring_rest_length: 120.0,
            center_strength: 0.01,
            damping: 0.85,
            min_distance: 1.0,
            max_displacement: 12.0,
            alpha_decay: 0.98,
            alpha_min: 0.02,
            reheat_alpha: 0.5,
            energy_epsilon: 0.005,
            max_iterations: 300,
        }
    }
}

// =============================================================================
// FORCE SIMULATION
// =============================================================================

/// Seed ring radius as a fraction of the smaller canvas dimension
const SEED_RADIUS_FRACTION: f32 = 0.25;

/// Golden angle keeps seeded nodes from stacking on a few spokes
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Owns the simulation temperature and steps node positions.
///
/// Positions live on the nodes themselves; the simulation holds only
/// `alpha`, the running flag, the iteration count, and the canvas.
#[derive(Debug, Clone)]
pub struct ForceSimulation {
    pub config: ForceConfig,
    canvas: CanvasSize,
    alpha: f32,
    running: bool,
    iterations: u32,
    energy: f32,
}

impl ForceSimulation {
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            config: ForceConfig::default(),
            canvas,
            alpha: 1.0,
            running: false,
            iterations: 0,
            energy: f32::MAX,
        }
    }

    /// Create with specific physics constants
    pub fn with_config(canvas: CanvasSize, config: ForceConfig) -> Self {
        Self {
            config,
            ..Self::new(canvas)
        }
    }

    /// Current temperature
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Kinetic energy of the last tick
    pub fn energy(&self) -> f32 {
        self.energy
    }

    /// Ticks since the last restart
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn set_canvas(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Seed every node on a jittered ring around the canvas center.
    ///
    /// Output always lies within `[0,width] x [0,height]`; velocities are
    /// zeroed and the temperature reset to 1.0. Seeding is not deterministic.
    pub fn initialize_positions(&mut self, nodes: &mut [MemoryNode]) {
        let (cx, cy) = self.canvas.center();
        let ring = self.canvas.min_dimension() * SEED_RADIUS_FRACTION;
        let inset = self.canvas.min_dimension() * 0.02;
        let mut rng = rand::thread_rng();

        for (i, node) in nodes.iter_mut().enumerate() {
            let angle = i as f32 * GOLDEN_ANGLE + rng.gen_range(-0.3..0.3);
            let radius = ring * rng.gen_range(0.6..1.0);
            node.x = (cx + radius * angle.cos()).clamp(inset, self.canvas.width() - inset);
            node.y = (cy + radius * angle.sin()).clamp(inset, self.canvas.height() - inset);
            node.vx = 0.0;
            node.vy = 0.0;
        }

        self.alpha = 1.0;
        self.iterations = 0;
        self.energy = f32::MAX;
        self.running = true;
    }

    /// Reset the temperature, keeping current positions.
    ///
    /// Used when (re)starting a force layout without discarding the prior
    /// arrangement.
    pub fn restart(&mut self) {
        self.alpha = 1.0;
        self.iterations = 0;
        self.energy = f32::MAX;
        self.running = true;
    }

    /// Bump the temperature without repositioning, so the graph re-relaxes
    /// around a user-moved node.
    pub fn reheat(&mut self) {
        self.alpha = self.alpha.max(self.config.reheat_alpha);
        self.iterations = 0;
        self.running = true;
    }

    /// Halt the simulation; positions are untouched.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_active(&self) -> bool {
        self.running
    }

    // =========================================================================
    // STEPPING
    // =========================================================================

    /// One discrete simulation step.
    ///
    /// Returns `true` while the simulation should keep running, `false`
    /// once it has stabilized: temperature under `alpha_min`, the iteration
    /// cap reached, or kinetic energy under `energy_epsilon`.
    ///
    /// Pinned nodes skip the position update but still act as force
    /// sources. Edges whose ids do not resolve, and self-loops, are
    /// skipped.
    pub fn tick(
        &mut self,
        nodes: &mut [MemoryNode],
        edges: &[MemoryEdge],
        index: &NodeIndex,
    ) -> bool {
        let n = nodes.len();
        if n == 0 {
            self.running = false;
            return false;
        }

        let cfg = &self.config;
        let mut fx = vec![0.0f32; n];
        let mut fy = vec![0.0f32; n];

        // Pairwise repulsion
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = nodes[i].x - nodes[j].x;
                let dy = nodes[i].y - nodes[j].y;
                let len = (dx * dx + dy * dy).sqrt();
                let dist = len.max(cfg.min_distance);
                // Coincident points get a deterministic separating direction
                let (ux, uy) = if len > 1e-6 { (dx / len, dy / len) } else { (1.0, 0.0) };

                let force = cfg.repulsion / (dist * dist);
                fx[i] += ux * force;
                fy[i] += uy * force;
                fx[j] -= ux * force;
                fy[j] -= uy * force;
            }
        }

        // Spring attraction along edges
        for edge in edges {
            let (Some(&si), Some(&ti)) = (index.get(&edge.source_id), index.get(&edge.target_id))
            else {
                continue;
            };
            if si == ti || si >= n || ti >= n {
                continue;
            }

            let dx = nodes[ti].x - nodes[si].x;
            let dy = nodes[ti].y - nodes[si].y;
            let len = (dx * dx + dy * dy).sqrt();
            let dist = len.max(cfg.min_distance);
            let (ux, uy) = if len > 1e-6 { (dx / len, dy / len) } else { (1.0, 0.0) };

            let force = cfg.spring_strength * (dist - cfg.spring_rest_length);
            fx[si] += ux * force;
            fy[si] += uy * force;
            fx[ti] -= ux * force;
            fy[ti] -= uy * force;
        }

        // Weak centering
        let (cx, cy) = self.canvas.center();
        for (i, node) in nodes.iter().enumerate() {
            fx[i] += (cx - node.x) * cfg.center_strength;
            fy[i] += (cy - node.y) * cfg.center_strength;
        }

        // Integrate: cooled force -> damped velocity -> capped displacement
        let mut total_energy = 0.0f32;
        for (i, node) in nodes.iter_mut().enumerate() {
            if node.fixed {
                node.vx = 0.0;
                node.vy = 0.0;
                continue;
            }

            node.vx = (node.vx + self.alpha * fx[i]) * cfg.damping;
            node.vy = (node.vy + self.alpha * fy[i]) * cfg.damping;

            let mut step_x = node.vx;
            let mut step_y = node.vy;
            let step_len = (step_x * step_x + step_y * step_y).sqrt();
            if step_len > cfg.max_displacement {
                let scale = cfg.max_displacement / step_len;
                step_x *= scale;
                step_y *= scale;
            }
            node.x += step_x;
            node.y += step_y;

            total_energy += node.vx * node.vx + node.vy * node.vy;
        }

        self.energy = total_energy;
        self.alpha *= cfg.alpha_decay;
        self.iterations += 1;

        let stabilized = self.alpha < cfg.alpha_min
            || self.iterations >= cfg.max_iterations
            || total_energy < cfg.energy_epsilon;

        if stabilized {
            debug!(
                iterations = self.iterations,
                alpha = self.alpha,
                energy = total_energy,
                "force simulation stabilized"
            );
            self.running = false;
            return false;
        }
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================
