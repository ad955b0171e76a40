//! Headless rendering surface with a 2-D force-directed layout.
//!
//! A reference implementation of [`RenderingSurface`] with no window: it
//! mirrors elements into a plain 2-D simulation and runs each layout pass
//! as a tokio task. Useful for driving the controller end to end from the
//! CLI and from tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::LayoutOptions;
use crate::model::ElementRef;
use crate::surface::{ElementBatch, LayoutRun, RenderingSurface, SurfaceEvent};

/// Physics constants for the force-directed layout.
const REPULSION_STRENGTH: f32 = 200.0;
const DAMPING: f32 = 0.6; // Velocity friction per step
const MIN_DISTANCE: f32 = 0.5;
const MAX_VELOCITY: f32 = 200.0;
const SPRING_STIFFNESS: f32 = 15.0;
const SPRING_REST_LENGTH: f32 = 8.0;
const TICK_DT: f32 = 0.016; // ~60fps timestep

/// A simulated node: position, velocity, and the user-drag lock flag.
#[derive(Debug, Clone)]
struct SimNode {
    id: String,
    position: (f32, f32),
    velocity: (f32, f32),
    locked: bool,
}

/// A simulated edge between node indices.
#[derive(Debug, Clone)]
struct SimEdge {
    from_idx: usize,
    to_idx: usize,
}

#[derive(Default)]
struct Inner {
    nodes: Vec<SimNode>,
    id_to_idx: HashMap<String, usize>,
    edges: Vec<SimEdge>,
    subscribers: Vec<mpsc::UnboundedSender<SurfaceEvent>>,
    next_run_id: u64,
    /// Active run id and its cancel flag.
    active: Option<(u64, Arc<AtomicBool>)>,
    highlighted: HashSet<ElementRef>,
    viewport_center: (f32, f32),
}

impl Inner {
    fn emit(&mut self, event: SurfaceEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// One physics step: inverse-square repulsion between all pairs,
    /// logarithmic springs along edges, centroid recentering, damping.
    fn tick(&mut self, dt: f32) -> f32 {
        let n = self.nodes.len();
        if n == 0 {
            return 0.0;
        }

        // --- Repulsion: F_r = K / d² between all pairs ---
        for i in 0..n {
            for j in (i + 1)..n {
                let (dx, dy) = delta(self.nodes[i].position, self.nodes[j].position);
                let dist = length(dx, dy).max(MIN_DISTANCE);
                let force = REPULSION_STRENGTH / (dist * dist);
                let (ux, uy) = (dx / dist, dy / dist);
                self.nodes[i].velocity.0 += ux * force * dt;
                self.nodes[i].velocity.1 += uy * force * dt;
                self.nodes[j].velocity.0 -= ux * force * dt;
                self.nodes[j].velocity.1 -= uy * force * dt;
            }
        }

        // --- Attraction: logarithmic springs, F_a = k * ln(d / rest) ---
        // Zero force at rest length, gentle pull beyond, push below.
        for edge in &self.edges {
            let (from, to) = (edge.from_idx, edge.to_idx);
            let (dx, dy) = delta(self.nodes[to].position, self.nodes[from].position);
            let dist = length(dx, dy).max(MIN_DISTANCE);
            let force = SPRING_STIFFNESS * (dist / SPRING_REST_LENGTH).ln();
            let (ux, uy) = (dx / dist, dy / dist);
            self.nodes[from].velocity.0 += ux * force * dt;
            self.nodes[from].velocity.1 += uy * force * dt;
            self.nodes[to].velocity.0 -= ux * force * dt;
            self.nodes[to].velocity.1 -= uy * force * dt;
        }

        // --- Centering: pure translation so the centroid stays at origin ---
        let cx = self.nodes.iter().map(|n| n.position.0).sum::<f32>() / n as f32;
        let cy = self.nodes.iter().map(|n| n.position.1).sum::<f32>() / n as f32;
        for node in &mut self.nodes {
            node.position.0 -= cx;
            node.position.1 -= cy;
        }

        // --- Damping and integration ---
        let mut peak_speed = 0.0_f32;
        for node in &mut self.nodes {
            node.velocity.0 *= DAMPING;
            node.velocity.1 *= DAMPING;
            let speed = length(node.velocity.0, node.velocity.1);
            if speed > MAX_VELOCITY {
                node.velocity.0 *= MAX_VELOCITY / speed;
                node.velocity.1 *= MAX_VELOCITY / speed;
            } else if speed < 0.001 {
                node.velocity = (0.0, 0.0);
            }
            node.position.0 += node.velocity.0 * dt;
            node.position.1 += node.velocity.1 * dt;
            peak_speed = peak_speed.max(length(node.velocity.0, node.velocity.1));
        }
        peak_speed
    }
}

/// Rendering surface without a window.
pub struct HeadlessSurface {
    inner: Arc<Mutex<Inner>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Number of materialized nodes.
    pub fn node_count(&self) -> usize {
        self.inner.lock().unwrap().nodes.len()
    }

    /// Number of materialized edges.
    pub fn edge_count(&self) -> usize {
        self.inner.lock().unwrap().edges.len()
    }

    /// Position of a node, if present.
    pub fn node_position(&self, id: &str) -> Option<(f32, f32)> {
        let inner = self.inner.lock().unwrap();
        inner
            .id_to_idx
            .get(id)
            .map(|&idx| inner.nodes[idx].position)
    }

    /// Current viewport center.
    pub fn viewport_center(&self) -> (f32, f32) {
        self.inner.lock().unwrap().viewport_center
    }

    /// Currently highlighted elements.
    pub fn highlighted(&self) -> Vec<ElementRef> {
        self.inner
            .lock()
            .unwrap()
            .highlighted
            .iter()
            .cloned()
            .collect()
    }

    /// User-driven reposition of a node. Suppressed while the node is
    /// locked; returns whether the position changed.
    pub fn drag_node(&self, id: &str, x: f32, y: f32) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let Some(&idx) = inner.id_to_idx.get(id) else {
            return false;
        };
        if inner.nodes[idx].locked {
            return false;
        }
        inner.nodes[idx].position = (x, y);
        inner.nodes[idx].velocity = (0.0, 0.0);
        true
    }

    /// Injects a raw interaction event, as a windowed surface's hit-testing
    /// would. Used by the CLI session and by tests.
    pub fn inject(&self, event: SurfaceEvent) {
        self.inner.lock().unwrap().emit(event);
    }

    /// Initial placement on a circle whose radius grows with the node count.
    fn seed_position(index: usize, total: usize) -> (f32, f32) {
        let n = total.max(1) as f32;
        let angle = 2.0 * std::f32::consts::PI * (index as f32 + 0.5) / n;
        let radius = 3.0 + (n / 10.0).sqrt() * 2.0;
        (radius * angle.cos(), radius * angle.sin())
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderingSurface for HeadlessSurface {
    fn subscribe(&self, events: mpsc::UnboundedSender<SurfaceEvent>) {
        self.inner.lock().unwrap().subscribers.push(events);
    }

    fn add_elements(&self, batch: ElementBatch) {
        let mut inner = self.inner.lock().unwrap();
        let total = inner.nodes.len() + batch.nodes.len();
        for node in batch.nodes {
            if inner.id_to_idx.contains_key(&node.id) {
                continue;
            }
            let idx = inner.nodes.len();
            let position = Self::seed_position(idx, total);
            inner.id_to_idx.insert(node.id.clone(), idx);
            inner.nodes.push(SimNode {
                id: node.id,
                position,
                velocity: (0.0, 0.0),
                locked: false,
            });
        }
        for edge in batch.edges {
            if let (Some(&from_idx), Some(&to_idx)) = (
                inner.id_to_idx.get(&edge.source),
                inner.id_to_idx.get(&edge.target),
            ) {
                inner.edges.push(SimEdge { from_idx, to_idx });
            } else {
                tracing::warn!(edge = %edge.id, "edge endpoint missing on surface, skipping");
            }
        }
    }

    fn lock_all_nodes(&self) {
        let mut inner = self.inner.lock().unwrap();
        for node in &mut inner.nodes {
            node.locked = true;
        }
    }

    fn unlock_all_nodes(&self) {
        let mut inner = self.inner.lock().unwrap();
        for node in &mut inner.nodes {
            node.locked = false;
        }
    }

    fn run_layout(&self, options: &LayoutOptions) -> LayoutRun {
        let mut inner = self.inner.lock().unwrap();
        inner.next_run_id += 1;
        let run = LayoutRun {
            id: inner.next_run_id,
        };
        let cancel = Arc::new(AtomicBool::new(false));
        inner.active = Some((run.id, cancel.clone()));
        inner.emit(SurfaceEvent::LayoutStart { run });
        drop(inner);

        let shared = self.inner.clone();
        let options = options.clone();
        tokio::spawn(async move {
            for _ in 0..options.max_ticks {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                let peak_speed = shared.lock().unwrap().tick(TICK_DT);
                if peak_speed < options.stable_speed {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(options.tick_interval_ms)).await;
            }
            let mut inner = shared.lock().unwrap();
            if matches!(inner.active, Some((id, _)) if id == run.id) {
                inner.active = None;
            }
            inner.emit(SurfaceEvent::LayoutStop { run });
        });

        run
    }

    fn stop_layout(&self, run: &LayoutRun) {
        let inner = self.inner.lock().unwrap();
        if let Some((active_id, cancel)) = &inner.active {
            if *active_id == run.id {
                cancel.store(true, Ordering::Relaxed);
            }
        }
    }

    fn center_on(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(&idx) = inner.id_to_idx.get(id) {
            inner.viewport_center = inner.nodes[idx].position;
            tracing::debug!(node = %inner.nodes[idx].id, "viewport centered");
        }
    }

    fn highlight_neighbourhood(&self, elements: &[ElementRef]) {
        let mut inner = self.inner.lock().unwrap();
        inner.highlighted = elements.iter().cloned().collect();
    }

    fn clear_highlight(&self) {
        self.inner.lock().unwrap().highlighted.clear();
    }
}

fn delta(a: (f32, f32), b: (f32, f32)) -> (f32, f32) {
    (a.0 - b.0, a.1 - b.1)
}

fn length(x: f32, y: f32) -> f32 {
    (x * x + y * y).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeRecord;

    fn node(id: &str) -> NodeRecord {
        NodeRecord {
            id: id.into(),
            label: "test".into(),
            properties: Default::default(),
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> crate::model::EdgeRecord {
        crate::model::EdgeRecord {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: "test".into(),
            properties: Default::default(),
        }
    }

    #[test]
    fn add_elements_ignores_duplicate_nodes_and_dangling_edges() {
        let surface = HeadlessSurface::new();
        surface.add_elements(ElementBatch {
            nodes: vec![node("a"), node("a"), node("b")],
            edges: vec![edge("e1", "a", "b"), edge("e2", "a", "ghost")],
        });
        assert_eq!(surface.node_count(), 2);
        assert_eq!(surface.edge_count(), 1);
    }

    #[test]
    fn locked_nodes_ignore_drags() {
        let surface = HeadlessSurface::new();
        surface.add_elements(ElementBatch {
            nodes: vec![node("a")],
            edges: vec![],
        });
        surface.lock_all_nodes();
        assert!(!surface.drag_node("a", 5.0, 5.0));
        surface.unlock_all_nodes();
        assert!(surface.drag_node("a", 5.0, 5.0));
        assert_eq!(surface.node_position("a"), Some((5.0, 5.0)));
    }

    #[tokio::test]
    async fn layout_run_emits_start_and_stop() {
        let surface = HeadlessSurface::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        surface.subscribe(tx);
        surface.add_elements(ElementBatch {
            nodes: vec![node("a"), node("b")],
            edges: vec![edge("e1", "a", "b")],
        });

        let run = surface.run_layout(&LayoutOptions {
            max_ticks: 10,
            tick_interval_ms: 0,
            stable_speed: 0.05,
        });

        assert_eq!(rx.recv().await, Some(SurfaceEvent::LayoutStart { run }));
        assert_eq!(rx.recv().await, Some(SurfaceEvent::LayoutStop { run }));
    }

    #[tokio::test]
    async fn stopped_run_still_emits_stop() {
        let surface = HeadlessSurface::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        surface.subscribe(tx);
        surface.add_elements(ElementBatch {
            nodes: vec![node("a"), node("b")],
            edges: vec![],
        });

        let run = surface.run_layout(&LayoutOptions {
            max_ticks: 100_000,
            tick_interval_ms: 5,
            stable_speed: 0.0,
        });
        surface.stop_layout(&run);

        assert_eq!(rx.recv().await, Some(SurfaceEvent::LayoutStart { run }));
        assert_eq!(rx.recv().await, Some(SurfaceEvent::LayoutStop { run }));
    }

    #[test]
    fn center_on_follows_node_position() {
        let surface = HeadlessSurface::new();
        surface.add_elements(ElementBatch {
            nodes: vec![node("a")],
            edges: vec![],
        });
        surface.drag_node("a", 3.0, 4.0);
        surface.center_on("a");
        assert_eq!(surface.viewport_center(), (3.0, 4.0));
    }
}
