//! The graph exploration controller.
//!
//! Owns the authoritative graph state, merges asynchronous query results
//! without duplication, and coordinates interaction events with the
//! surface's asynchronous layout runs. All state transitions happen inside
//! [`GraphExplorer::handle_message`] on a single event loop; gateway calls
//! run in spawned tasks that report back through the same channel, so the
//! controller itself is single-threaded and event-driven.
//!
//! Structural mutations are bracketed: every merge locks all present nodes
//! before touching the surface and registers a one-shot unlock against the
//! layout run it starts. Post-layout actions are keyed by run id, so a
//! stop event from a superseded run cannot unlock or re-center on behalf
//! of a later merge.

mod state;

pub use state::GraphState;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::commands::{CommandSet, ExpandDirection};
use crate::config::LayoutOptions;
use crate::error::AppError;
use crate::events::{InteractionAction, InteractionMapper};
use crate::gateway::QueryGateway;
use crate::model::{EdgeRecord, ElementRef, MergeReport, NodeRecord, NormalizedRecords};
use crate::normalize::ResponseNormalizer;
use crate::surface::{ElementBatch, LayoutRun, RenderingSurface, SurfaceEvent};

/// Completion callback for a submitted query. Invoked once the merge has
/// been applied (not once layout settles), or with the failure value if
/// the gateway or normalizer failed.
pub type QueryCallback =
    Box<dyn FnOnce(Result<(NormalizedRecords, MergeReport), AppError>) + Send>;

/// What triggered a query, determining what happens after its merge.
pub enum QueryOrigin {
    /// Direct submission via [`GraphExplorer::submit_query`].
    Direct { on_complete: Option<QueryCallback> },
    /// A context-menu expansion around a node.
    Expansion {
        node_id: String,
        direction: ExpandDirection,
    },
}

/// Messages driving the controller's event loop.
pub enum ExplorerMsg {
    /// A raw event from the bound rendering surface.
    Surface(SurfaceEvent),
    /// A query finished and normalized successfully.
    QueryCompleted {
        query: String,
        records: NormalizedRecords,
        origin: QueryOrigin,
    },
    /// A query failed in the gateway or the normalizer.
    QueryFailed {
        query: String,
        error: AppError,
        origin: QueryOrigin,
    },
}

/// One-shot action scoped to a specific layout run.
enum PostLayoutAction {
    UnlockNodes,
    CenterOn(String),
}

/// The graph exploration controller.
///
/// Collaborators are injected at construction; the controller reaches
/// into no process-wide instances. It exclusively owns graph and
/// selection state for the lifetime of the bound surface.
pub struct GraphExplorer {
    gateway: Arc<dyn QueryGateway>,
    normalizer: Arc<dyn ResponseNormalizer>,
    commands: CommandSet,
    layout_options: LayoutOptions,
    surface: Option<Arc<dyn RenderingSurface>>,
    forward_task: Option<JoinHandle<()>>,
    state: GraphState,
    mapper: InteractionMapper,
    selection_tx: watch::Sender<Option<ElementRef>>,
    // Held so `selection_tx.send` never fails for lack of receivers,
    // which would leave the watched value un-updated.
    _selection_rx: watch::Receiver<Option<ElementRef>>,
    active_layout: Option<LayoutRun>,
    post_layout: HashMap<u64, Vec<PostLayoutAction>>,
    inflight_queries: usize,
    tx: mpsc::UnboundedSender<ExplorerMsg>,
    rx: mpsc::UnboundedReceiver<ExplorerMsg>,
}

impl GraphExplorer {
    pub fn new(
        gateway: Arc<dyn QueryGateway>,
        normalizer: Arc<dyn ResponseNormalizer>,
        commands: CommandSet,
        layout_options: LayoutOptions,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (selection_tx, selection_rx) = watch::channel(None);
        Self {
            gateway,
            normalizer,
            commands,
            layout_options,
            surface: None,
            forward_task: None,
            state: GraphState::new(),
            mapper: InteractionMapper::new(),
            selection_tx,
            _selection_rx: selection_rx,
            active_layout: None,
            post_layout: HashMap::new(),
            inflight_queries: 0,
            tx,
            rx,
        }
    }

    /// Binds to a rendering surface and subscribes to its events.
    ///
    /// Calling while already bound is an error; call [`teardown`] first.
    ///
    /// [`teardown`]: GraphExplorer::teardown
    pub fn initialize(&mut self, surface: Arc<dyn RenderingSurface>) -> Result<(), AppError> {
        if self.surface.is_some() {
            return Err(AppError::AlreadyBound);
        }

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        surface.subscribe(events_tx);
        let tx = self.tx.clone();
        self.forward_task = Some(tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                if tx.send(ExplorerMsg::Surface(event)).is_err() {
                    break;
                }
            }
        }));
        self.surface = Some(surface);
        tracing::info!("controller bound to rendering surface");
        Ok(())
    }

    /// Unbinds the surface: stops any active layout run, unlocks all
    /// nodes, and clears pending one-shot actions and selection.
    pub fn teardown(&mut self) {
        if let Some(surface) = self.surface.take() {
            if let Some(run) = self.active_layout.take() {
                surface.stop_layout(&run);
            }
            surface.unlock_all_nodes();
            surface.clear_highlight();
        }
        if let Some(task) = self.forward_task.take() {
            task.abort();
        }
        self.post_layout.clear();
        self.mapper = InteractionMapper::new();
        let _ = self.selection_tx.send(None);
        tracing::info!("controller torn down");
    }

    /// Sends a query through the gateway. On success the result is
    /// normalized and merged; `on_complete` fires after the merge is
    /// applied, not after layout settles. A failed query mutates nothing.
    pub fn submit_query(&mut self, query: &str, on_complete: Option<QueryCallback>) {
        self.spawn_query(query.to_string(), QueryOrigin::Direct { on_complete });
    }

    /// Expands a node's neighbourhood in the given direction via the
    /// command set. On non-empty results the view re-centers on the node
    /// once the merge's layout run stops.
    pub fn expand(&mut self, node_id: &str, direction: ExpandDirection) -> Result<(), AppError> {
        if !self.state.contains_node(node_id) {
            return Err(AppError::UnknownNode(node_id.to_string()));
        }
        let command = self
            .commands
            .for_direction(direction)
            .ok_or_else(|| AppError::CommandUnavailable(direction.to_string()))?;
        let query = command.query_for(node_id);
        tracing::debug!(node = node_id, %direction, "expansion requested");
        self.spawn_query(
            query,
            QueryOrigin::Expansion {
                node_id: node_id.to_string(),
                direction,
            },
        );
        Ok(())
    }

    /// Merges records into graph state and the surface, then starts a
    /// fresh layout run over the full element set.
    ///
    /// The merge is idempotent: records whose id already exists are
    /// skipped. Edges whose endpoints resolve in neither the incoming
    /// batch nor existing state are dropped and reported, never inserted.
    /// All present nodes are locked from the start of the merge until the
    /// new run's stop event fires.
    pub fn merge_and_relayout(
        &mut self,
        records: &NormalizedRecords,
    ) -> Result<MergeReport, AppError> {
        let surface = self.surface.clone().ok_or(AppError::NotBound)?;

        surface.lock_all_nodes();

        let mut report = MergeReport::default();

        let mut new_nodes: Vec<NodeRecord> = Vec::new();
        for node in &records.nodes {
            if self.state.contains_node(&node.id) || new_nodes.iter().any(|n| n.id == node.id) {
                report.skipped_nodes += 1;
            } else {
                new_nodes.push(node.clone());
            }
        }

        let mut new_edges: Vec<EdgeRecord> = Vec::new();
        for edge in &records.links {
            if self.state.contains_edge(&edge.id) || new_edges.iter().any(|e| e.id == edge.id) {
                report.skipped_edges += 1;
                continue;
            }
            let resolves = |id: &str| {
                self.state.contains_node(id) || new_nodes.iter().any(|n| n.id == id)
            };
            if resolves(&edge.source) && resolves(&edge.target) {
                new_edges.push(edge.clone());
            } else {
                tracing::warn!(edge = %edge.id, "dropping edge with unresolved endpoint");
                report.dropped_edges.push(edge.id.clone());
            }
        }

        // No overlapping layout runs: a still-active run is stopped before
        // elements are added. Its unlock is subsumed by this merge's
        // bracket; its pending centering actions transfer to the new run.
        let mut carried = Vec::new();
        if let Some(run) = self.active_layout.take() {
            surface.stop_layout(&run);
            if let Some(actions) = self.post_layout.remove(&run.id) {
                carried.extend(
                    actions
                        .into_iter()
                        .filter(|a| matches!(a, PostLayoutAction::CenterOn(_))),
                );
            }
        }

        // Nodes before edges, so endpoint resolution never fails.
        for node in &new_nodes {
            if self.state.insert_node(node.clone()) {
                report.added_nodes += 1;
            }
        }
        for edge in &new_edges {
            if self.state.insert_edge(edge.clone()) {
                report.added_edges += 1;
            }
        }
        surface.add_elements(ElementBatch {
            nodes: new_nodes,
            edges: new_edges,
        });

        let run = surface.run_layout(&self.layout_options);
        let mut actions = vec![PostLayoutAction::UnlockNodes];
        actions.extend(carried);
        self.post_layout.insert(run.id, actions);
        self.active_layout = Some(run);

        tracing::info!(
            added_nodes = report.added_nodes,
            added_edges = report.added_edges,
            skipped = report.skipped_nodes + report.skipped_edges,
            dropped_edges = report.dropped_edges.len(),
            run = run.id,
            "merged query results"
        );
        Ok(report)
    }

    /// Applies one semantic interaction action. Pure interaction never
    /// merges or lays out.
    pub fn on_interaction(&mut self, action: InteractionAction) {
        match action {
            InteractionAction::ElementTapped(Some(element)) => {
                if self.state.contains(&element) {
                    let _ = self.selection_tx.send(Some(element.clone()));
                    if let Some(surface) = &self.surface {
                        let hood = self.state.neighbourhood(&element);
                        surface.highlight_neighbourhood(&hood);
                    }
                } else {
                    // The element vanished between hit-test and delivery.
                    tracing::debug!(id = element.id(), "tap on absent element, clearing selection");
                    let _ = self.selection_tx.send(None);
                    if let Some(surface) = &self.surface {
                        surface.clear_highlight();
                    }
                }
            }
            InteractionAction::ElementTapped(None) => {
                let _ = self.selection_tx.send(None);
                if let Some(surface) = &self.surface {
                    surface.clear_highlight();
                }
            }
            InteractionAction::DragStarted(_) | InteractionAction::DragMoved(_) => {
                // Surface-native drag handling; no controller effect.
            }
            InteractionAction::DragEnded { exited: true, .. } => {
                let _ = self.selection_tx.send(None);
            }
            InteractionAction::DragEnded { exited: false, .. } => {}
        }
    }

    /// Dispatches one message. All controller state transitions go
    /// through here.
    pub fn handle_message(&mut self, msg: ExplorerMsg) {
        match msg {
            ExplorerMsg::Surface(SurfaceEvent::LayoutStart { run }) => {
                tracing::debug!(run = run.id, "layout started");
            }
            ExplorerMsg::Surface(SurfaceEvent::LayoutStop { run }) => {
                self.on_layout_stop(run);
            }
            ExplorerMsg::Surface(event) => {
                if let Some(action) = self.mapper.map(&event) {
                    self.on_interaction(action);
                }
            }
            ExplorerMsg::QueryCompleted {
                query,
                records,
                origin,
            } => {
                self.inflight_queries = self.inflight_queries.saturating_sub(1);
                tracing::debug!(
                    %query,
                    nodes = records.nodes.len(),
                    links = records.links.len(),
                    "query completed"
                );
                self.on_query_completed(records, origin);
            }
            ExplorerMsg::QueryFailed {
                query,
                error,
                origin,
            } => {
                self.inflight_queries = self.inflight_queries.saturating_sub(1);
                tracing::error!(%query, %error, "query failed; graph state unchanged");
                if let QueryOrigin::Direct {
                    on_complete: Some(callback),
                } = origin
                {
                    callback(Err(error));
                }
            }
        }
    }

    /// Receives and dispatches the next message. Returns false once the
    /// channel is closed.
    pub async fn process_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(msg) => {
                self.handle_message(msg);
                true
            }
            None => false,
        }
    }

    /// Processes messages until no query is in flight and no layout run
    /// is active, then drains anything already queued.
    pub async fn run_until_settled(&mut self) {
        while self.inflight_queries > 0 || self.active_layout.is_some() {
            if !self.process_next().await {
                return;
            }
        }
        while let Ok(msg) = self.rx.try_recv() {
            self.handle_message(msg);
        }
    }

    /// The authoritative graph state.
    pub fn graph(&self) -> &GraphState {
        &self.state
    }

    /// The currently selected element, if any.
    pub fn selection(&self) -> Option<ElementRef> {
        self.selection_tx.borrow().clone()
    }

    /// Watch channel for the selection/detail view to observe.
    pub fn watch_selection(&self) -> watch::Receiver<Option<ElementRef>> {
        self.selection_tx.subscribe()
    }

    /// The layout run currently in flight, if any.
    pub fn active_layout(&self) -> Option<LayoutRun> {
        self.active_layout
    }

    /// Number of queries submitted but not yet completed.
    pub fn inflight_queries(&self) -> usize {
        self.inflight_queries
    }

    fn spawn_query(&mut self, query: String, origin: QueryOrigin) {
        self.inflight_queries += 1;
        let gateway = self.gateway.clone();
        let normalizer = self.normalizer.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = match gateway.send(&query).await {
                Ok(raw) => normalizer.normalize(&raw),
                Err(error) => Err(error),
            };
            let msg = match result {
                Ok(records) => ExplorerMsg::QueryCompleted {
                    query,
                    records,
                    origin,
                },
                Err(error) => ExplorerMsg::QueryFailed {
                    query,
                    error,
                    origin,
                },
            };
            let _ = tx.send(msg);
        });
    }

    fn on_query_completed(&mut self, records: NormalizedRecords, origin: QueryOrigin) {
        let report = match self.merge_and_relayout(&records) {
            Ok(report) => report,
            Err(error) => {
                // A stale completion after teardown; tolerated.
                tracing::warn!(%error, "merge skipped");
                if let QueryOrigin::Direct {
                    on_complete: Some(callback),
                } = origin
                {
                    callback(Err(error));
                }
                return;
            }
        };

        match origin {
            QueryOrigin::Direct { on_complete } => {
                if let Some(callback) = on_complete {
                    callback(Ok((records, report)));
                }
            }
            QueryOrigin::Expansion { node_id, direction } => {
                if let Some(command) = self.commands.for_direction(direction) {
                    command.notify_result(&records);
                }
                // Element positions are undefined until layout converges;
                // centering waits for the run's stop event.
                if !records.nodes.is_empty() {
                    if let Some(run) = self.active_layout {
                        self.post_layout
                            .entry(run.id)
                            .or_default()
                            .push(PostLayoutAction::CenterOn(node_id.clone()));
                        tracing::debug!(node = %node_id, run = run.id, "centering scheduled");
                    }
                }
            }
        }
    }

    fn on_layout_stop(&mut self, run: LayoutRun) {
        if self.active_layout == Some(run) {
            self.active_layout = None;
        }
        let Some(actions) = self.post_layout.remove(&run.id) else {
            tracing::debug!(run = run.id, "layout stop for superseded run, ignoring");
            return;
        };
        let Some(surface) = self.surface.clone() else {
            return;
        };
        tracing::debug!(run = run.id, "layout stopped, applying post-layout actions");
        for action in actions {
            match action {
                PostLayoutAction::UnlockNodes => surface.unlock_all_nodes(),
                PostLayoutAction::CenterOn(id) => surface.center_on(&id),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::GremlinNormalizer;
    use crate::surface::HeadlessSurface;

    struct StubGateway;

    #[async_trait::async_trait]
    impl QueryGateway for StubGateway {
        async fn send(&self, _query: &str) -> Result<serde_json::Value, AppError> {
            Ok(serde_json::json!([]))
        }
    }

    fn explorer() -> GraphExplorer {
        GraphExplorer::new(
            Arc::new(StubGateway),
            Arc::new(GremlinNormalizer::new()),
            CommandSet::standard(),
            LayoutOptions::default(),
        )
    }

    #[tokio::test]
    async fn initialize_twice_is_an_error() {
        let mut controller = explorer();
        let surface = Arc::new(HeadlessSurface::new());
        controller.initialize(surface.clone()).unwrap();
        assert!(matches!(
            controller.initialize(surface.clone()),
            Err(AppError::AlreadyBound)
        ));

        // Idempotent only after teardown.
        controller.teardown();
        controller.initialize(surface).unwrap();
    }

    #[tokio::test]
    async fn expand_requires_a_known_node() {
        let mut controller = explorer();
        controller
            .initialize(Arc::new(HeadlessSurface::new()))
            .unwrap();
        assert!(matches!(
            controller.expand("ghost", ExpandDirection::Outgoing),
            Err(AppError::UnknownNode(_))
        ));
    }

    #[tokio::test]
    async fn merge_without_a_surface_is_not_bound() {
        let mut controller = explorer();
        assert!(matches!(
            controller.merge_and_relayout(&NormalizedRecords::default()),
            Err(AppError::NotBound)
        ));
    }
}
