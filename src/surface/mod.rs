//! Rendering surface boundary.
//!
//! The surface owns the visual graph: it draws elements, runs the layout
//! algorithm asynchronously, and reports user interaction. It mirrors the
//! controller's graph state but is not authoritative — on conflict the
//! controller's model wins and the surface is resynchronized by the next
//! merge.

mod headless;

pub use headless::HeadlessSurface;

use tokio::sync::mpsc;

use crate::config::LayoutOptions;
use crate::model::{EdgeRecord, ElementRef, NodeRecord};

/// Handle for one asynchronous layout execution.
///
/// At most one run is active per surface; a new run's id is always greater
/// than any earlier run's, so a handle also identifies which run an event
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutRun {
    pub id: u64,
}

/// Raw events emitted by the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// A completed tap; `None` target means empty background.
    Tap { target: Option<ElementRef> },
    /// Pointer went down, possibly starting a drag.
    TapStart { target: Option<ElementRef> },
    /// Pointer moved while down.
    TapDrag { target: Option<ElementRef> },
    /// Pointer left the element it went down on.
    TapDragOut { target: ElementRef },
    /// Pointer came back up.
    TapEnd { target: Option<ElementRef> },
    /// A layout run started.
    LayoutStart { run: LayoutRun },
    /// A layout run finished or was stopped.
    LayoutStop { run: LayoutRun },
}

/// One batched add operation. Nodes are always materialized before edges so
/// edge endpoint resolution never fails on the surface.
#[derive(Debug, Clone, Default)]
pub struct ElementBatch {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl ElementBatch {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// The mutable visual graph the controller drives.
///
/// Implementations use interior mutability; the controller holds the
/// surface behind an `Arc<dyn RenderingSurface>`.
pub trait RenderingSurface: Send + Sync {
    /// Registers a sink for surface events. Every subscriber receives
    /// every event.
    fn subscribe(&self, events: mpsc::UnboundedSender<SurfaceEvent>);

    /// Adds a batch of elements, nodes before edges.
    fn add_elements(&self, batch: ElementBatch);

    /// Suppresses user-driven repositioning for all present nodes.
    /// Locking does not affect selection or query eligibility.
    fn lock_all_nodes(&self);

    /// Restores user-driven repositioning for all nodes.
    fn unlock_all_nodes(&self);

    /// Starts an asynchronous layout run over the full element set.
    /// Emits `LayoutStart` immediately and `LayoutStop` when the run
    /// converges, exhausts its tick budget, or is stopped.
    fn run_layout(&self, options: &LayoutOptions) -> LayoutRun;

    /// Stops the given run if it is still active. A stopped run still
    /// emits its `LayoutStop` event.
    fn stop_layout(&self, run: &LayoutRun);

    /// Re-centers the viewport on an element.
    fn center_on(&self, id: &str);

    /// Visually highlights the given elements, replacing any earlier
    /// highlight.
    fn highlight_neighbourhood(&self, elements: &[ElementRef]);

    /// Removes any active highlight.
    fn clear_highlight(&self);
}
