//! Deterministic layout algorithms - timeline, hierarchy, circular.
//!
//! Each function is a pure mapping from the node set and canvas size to
//! positions: same identities, ordering, and canvas in, bit-identical
//! positions out. The UI toggles layouts back and forth and expects stable
//! results, so nothing here consults randomness or prior positions.
//! Velocities are zeroed - these layouts do not cooperate with the
//! simulation, they replace it.

use std::collections::VecDeque;

use super::model::{build_index, CanvasSize, MemoryEdge, MemoryNode};

/// Fraction of each canvas dimension kept clear at the edges
const MARGIN_FRACTION: f32 = 0.08;

/// Circle radius as a fraction of the smaller canvas dimension
const CIRCLE_RADIUS_FRACTION: f32 = 0.4;

/// Within-band vertical offset cycle for the timeline, as a band fraction
const BAND_OFFSET_FRACTION: f32 = 0.2;

// =============================================================================
// TIMELINE
// =============================================================================

/// Place nodes chronologically: x from the normalized creation timestamp,
/// y banded by memory kind to reduce vertical collisions.
///
/// Nodes without a timestamp (or a single-instant range) fall back to list
/// order along x. Bands appear in first-appearance order of `node_type`.
pub fn apply_timeline_layout(nodes: &mut [MemoryNode], canvas: &CanvasSize) {
    let n = nodes.len();
    if n == 0 {
        return;
    }

    let x_margin = canvas.width() * MARGIN_FRACTION;
    let y_margin = canvas.height() * MARGIN_FRACTION;
    let usable_w = canvas.width() - 2.0 * x_margin;
    let usable_h = canvas.height() - 2.0 * y_margin;

    // Chronological range over the nodes that carry timestamps
    let stamps: Vec<Option<i64>> = nodes
        .iter()
        .map(|node| node.created_at.map(|t| t.timestamp_millis()))
        .collect();
    let min_ts = stamps.iter().flatten().min().copied();
    let max_ts = stamps.iter().flatten().max().copied();
    let span = match (min_ts, max_ts) {
        (Some(lo), Some(hi)) if hi > lo => Some((lo, (hi - lo) as f32)),
        _ => None,
    };

    // Bands by memory kind, in first-appearance order
    let (band_of, band_count) = {
        let mut band_types: Vec<&str> = Vec::new();
        let band_of: Vec<usize> = nodes
            .iter()
            .map(|node| {
                match band_types.iter().position(|t| *t == node.node_type) {
                    Some(pos) => pos,
                    None => {
                        band_types.push(node.node_type.as_str());
                        band_types.len() - 1
                    }
                }
            })
            .collect();
        (band_of, band_types.len().max(1))
    };
    let band_h = usable_h / band_count as f32;

    let index_denom = (n - 1).max(1) as f32;
    let mut band_counters = vec![0usize; band_count];

    for (i, node) in nodes.iter_mut().enumerate() {
        let t = match (span, stamps[i]) {
            (Some((lo, span)), Some(ts)) => (ts - lo) as f32 / span,
            _ => i as f32 / index_denom,
        };
        node.x = x_margin + usable_w * t;

        let band = band_of[i];
        let k = band_counters[band];
        band_counters[band] += 1;
        let offset = ((k % 3) as f32 - 1.0) * band_h * BAND_OFFSET_FRACTION;
        node.y = y_margin + band_h * (band as f32 + 0.5) + offset;

        node.vx = 0.0;
        node.vy = 0.0;
    }
}

// =============================================================================
// HIERARCHY
// =============================================================================

/// Layered placement: depth per node via breadth-first search, layers
/// stacked top to bottom, nodes evenly spaced within each layer.
///
/// Depth rule: BFS from indegree-zero roots taken in ascending id order;
/// if cycles leave nodes unvisited, the smallest unvisited id seeds a new
/// depth-zero root. Visited marks guarantee termination on any edge set.
/// Edges that do not resolve, and self-loops, are skipped.
pub fn apply_hierarchy_layout(
    nodes: &mut [MemoryNode],
    edges: &[MemoryEdge],
    canvas: &CanvasSize,
) {
    let n = nodes.len();
    if n == 0 {
        return;
    }

    let index = build_index(nodes);
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];
    for edge in edges {
        let (Some(&si), Some(&ti)) = (index.get(&edge.source_id), index.get(&edge.target_id))
        else {
            continue;
        };
        if si == ti {
            continue;
        }
        outgoing[si].push(ti);
        indegree[ti] += 1;
    }
    // Deterministic neighbor order regardless of edge-list order
    for targets in &mut outgoing {
        targets.sort_by(|a, b| nodes[*a].id.cmp(&nodes[*b].id));
        targets.dedup();
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| nodes[*a].id.cmp(&nodes[*b].id));

    let mut depth = vec![usize::MAX; n];
    let mut queue = VecDeque::new();
    for &i in &order {
        if indegree[i] == 0 {
            depth[i] = 0;
            queue.push_back(i);
        }
    }

    loop {
        while let Some(i) = queue.pop_front() {
            for &j in &outgoing[i] {
                if depth[j] == usize::MAX {
                    depth[j] = depth[i] + 1;
                    queue.push_back(j);
                }
            }
        }
        // Cycles (or duplicate-id shadows) leave nodes unvisited; re-root
        // at the smallest unvisited id so the pass always terminates.
        match order.iter().find(|&&i| depth[i] == usize::MAX) {
            Some(&i) => {
                depth[i] = 0;
                queue.push_back(i);
            }
            None => break,
        }
    }

    let max_depth = depth.iter().max().copied().unwrap_or(0);

    // Layer membership in ascending id order
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); max_depth + 1];
    for &i in &order {
        layers[depth[i]].push(i);
    }

    let x_margin = canvas.width() * MARGIN_FRACTION;
    let y_margin = canvas.height() * MARGIN_FRACTION;
    let usable_w = canvas.width() - 2.0 * x_margin;
    let usable_h = canvas.height() - 2.0 * y_margin;

    for (d, layer) in layers.iter().enumerate() {
        let y = if max_depth == 0 {
            canvas.height() / 2.0
        } else {
            y_margin + usable_h * d as f32 / max_depth as f32
        };
        let count = layer.len() as f32;
        for (k, &i) in layer.iter().enumerate() {
            nodes[i].x = x_margin + usable_w * (k as f32 + 0.5) / count;
            nodes[i].y = y;
            nodes[i].vx = 0.0;
            nodes[i].vy = 0.0;
        }
    }
}

// =============================================================================
// CIRCULAR
// =============================================================================

/// Evenly space all nodes on a circle centered on the canvas.
///
/// The i-th of N nodes sits at angle `2*pi*i/N`, with angle 0 along +x and
/// angles growing toward +y (canvas convention).
pub fn apply_circular_layout(nodes: &mut [MemoryNode], canvas: &CanvasSize) {
    let n = nodes.len();
    if n == 0 {
        return;
    }

    let (cx, cy) = canvas.center();
    let radius = canvas.min_dimension() * CIRCLE_RADIUS_FRACTION;

    for (i, node) in nodes.iter_mut().enumerate() {
        let angle = 2.0 * std::f32::consts::PI * i as f32 / n as f32;
        node.x = cx + radius * angle.cos();
        node.y = cy + radius * angle.sin();
        node.vx = 0.0;
        node.vy = 0.0;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn canvas() -> CanvasSize {
        CanvasSize::new(1000.0, 800.0).unwrap()
    }

    fn positions(nodes: &[MemoryNode]) -> Vec<(f32, f32)> {
        nodes.iter().map(|n| (n.x, n.y)).collect()
    }

    #[test]
    fn test_circular_four_nodes_hit_cardinal_points() {
        let mut nodes: Vec<MemoryNode> = (0..4)
            .map(|i| MemoryNode::new(format!("n{i}"), format!("n{i}")))
            .collect();
        let canvas = canvas();
        apply_circular_layout(&mut nodes, &canvas);

        let (cx, cy) = canvas.center();
        let r = canvas.min_dimension() * CIRCLE_RADIUS_FRACTION;
        let expected = [(cx + r, cy), (cx, cy + r), (cx - r, cy), (cx, cy - r)];
        for (node, (ex, ey)) in nodes.iter().zip(expected) {
            assert!(
                (node.x - ex).abs() < 1e-3 && (node.y - ey).abs() < 1e-3,
                "{} at ({}, {}), expected ({ex}, {ey})",
                node.id,
                node.x,
                node.y
            );
        }

        // Bit-for-bit reproducible on repeated calls
        let first = positions(&nodes);
        apply_circular_layout(&mut nodes, &canvas);
        assert_eq!(first, positions(&nodes));
    }

    #[test]
    fn test_timeline_is_idempotent_and_chronological() {
        let t = |day| Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap();
        let mut nodes = vec![
            MemoryNode::new("late", "late").with_type("fact").with_created_at(t(20)),
            MemoryNode::new("early", "early").with_type("fact").with_created_at(t(1)),
            MemoryNode::new("mid", "mid").with_type("decision").with_created_at(t(10)),
        ];
        let canvas = canvas();

        apply_timeline_layout(&mut nodes, &canvas);
        let first = positions(&nodes);

        // Chronological along x
        assert!(nodes[1].x < nodes[2].x && nodes[2].x < nodes[0].x);
        // Different kinds land in different bands
        assert!((nodes[0].y - nodes[2].y).abs() > 1.0);
        // Same kind shares a band region
        assert!((nodes[0].y - nodes[1].y).abs() < canvas.height() * 0.25);

        apply_timeline_layout(&mut nodes, &canvas);
        assert_eq!(first, positions(&nodes));
    }

    #[test]
    fn test_timeline_without_timestamps_uses_list_order() {
        let mut nodes = vec![
            MemoryNode::new("a", "a"),
            MemoryNode::new("b", "b"),
            MemoryNode::new("c", "c"),
        ];
        apply_timeline_layout(&mut nodes, &canvas());
        assert!(nodes[0].x < nodes[1].x && nodes[1].x < nodes[2].x);
    }

    #[test]
    fn test_hierarchy_chain_layers_top_down() {
        let mut nodes = vec![
            MemoryNode::new("root", "root"),
            MemoryNode::new("mid", "mid"),
            MemoryNode::new("leaf", "leaf"),
        ];
        let edges = vec![
            MemoryEdge::new("root", "mid"),
            MemoryEdge::new("mid", "leaf"),
        ];
        apply_hierarchy_layout(&mut nodes, &edges, &canvas());

        assert!(nodes[0].y < nodes[1].y, "root above mid");
        assert!(nodes[1].y < nodes[2].y, "mid above leaf");
    }

    #[test]
    fn test_hierarchy_cycle_terminates_deterministically() {
        let mut nodes = vec![
            MemoryNode::new("a", "a"),
            MemoryNode::new("b", "b"),
            MemoryNode::new("c", "c"),
        ];
        // a <-> b cycle with no indegree-zero root; c dangles via a ghost edge
        let edges = vec![
            MemoryEdge::new("a", "b"),
            MemoryEdge::new("b", "a"),
            MemoryEdge::new("ghost", "c"),
            MemoryEdge::new("c", "c"),
        ];
        let canvas = canvas();

        apply_hierarchy_layout(&mut nodes, &edges, &canvas);
        let first = positions(&nodes);
        for node in &nodes {
            assert!(node.x.is_finite() && node.y.is_finite());
        }
        // Cycle re-roots at "a", so "b" sits one layer below
        assert!(nodes[0].y < nodes[1].y);

        apply_hierarchy_layout(&mut nodes, &edges, &canvas);
        assert_eq!(first, positions(&nodes));
    }

    #[test]
    fn test_layouts_zero_velocities() {
        let mut nodes = vec![MemoryNode::new("a", "a"), MemoryNode::new("b", "b")];
        for node in &mut nodes {
            node.vx = 3.0;
            node.vy = -2.0;
        }
        apply_circular_layout(&mut nodes, &canvas());
        for node in &nodes {
            assert_eq!((node.vx, node.vy), (0.0, 0.0));
        }
    }
}
