//! Context menu command set for node expansion.
//!
//! The command set is an immutable configuration value built once at
//! controller mount. Commands never mutate the set at runtime; enabling or
//! disabling a command is static configuration, not a state transition.

use std::fmt;
use std::sync::Arc;

use crate::model::NormalizedRecords;

/// Edge direction an expansion follows from the active node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandDirection {
    Outgoing,
    Incoming,
}

impl fmt::Display for ExpandDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandDirection::Outgoing => write!(f, "outgoing"),
            ExpandDirection::Incoming => write!(f, "incoming"),
        }
    }
}

/// Builds the query string for a command, with the active node id
/// substituted.
pub type QueryTemplate = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Hook invoked with the records a command's merge produced.
pub type ResultHook = Arc<dyn Fn(&NormalizedRecords) + Send + Sync>;

/// One declarative context-menu command bound to the tapped node.
#[derive(Clone)]
pub struct Command {
    /// Menu label.
    pub label: String,
    /// Direction this command expands in.
    pub direction: ExpandDirection,
    /// Whether the command is selectable. Static configuration.
    pub enabled: bool,
    query_template: QueryTemplate,
    on_result: Option<ResultHook>,
}

impl Command {
    pub fn new(
        label: impl Into<String>,
        direction: ExpandDirection,
        query_template: QueryTemplate,
    ) -> Self {
        Self {
            label: label.into(),
            direction,
            enabled: true,
            query_template,
            on_result: None,
        }
    }

    /// Returns the same command with `enabled` replaced.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns the same command with a result hook attached.
    pub fn with_result_hook(mut self, hook: ResultHook) -> Self {
        self.on_result = Some(hook);
        self
    }

    /// Builds the query string for the given node.
    pub fn query_for(&self, node_id: &str) -> String {
        (self.query_template)(node_id)
    }

    /// Invokes the result hook, if any.
    pub fn notify_result(&self, records: &NormalizedRecords) {
        if let Some(hook) = &self.on_result {
            hook(records);
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("label", &self.label)
            .field("direction", &self.direction)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// The fixed list of expansion commands installed at controller mount.
#[derive(Debug, Clone)]
pub struct CommandSet {
    commands: Vec<Command>,
}

impl CommandSet {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// The standard set: one neighbourhood expansion per direction.
    ///
    /// Each query fetches the node itself, its edges in the direction, and
    /// the nodes at the far end of those edges, deduplicated server-side.
    pub fn standard() -> Self {
        Self::new(vec![
            Command::new(
                "expand outgoing",
                ExpandDirection::Outgoing,
                Arc::new(|node_id| neighbourhood_query(node_id, "outE")),
            ),
            Command::new(
                "expand incoming",
                ExpandDirection::Incoming,
                Arc::new(|node_id| neighbourhood_query(node_id, "inE")),
            ),
        ])
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The enabled command for a direction, if one is configured.
    pub fn for_direction(&self, direction: ExpandDirection) -> Option<&Command> {
        self.commands
            .iter()
            .find(|c| c.enabled && c.direction == direction)
    }
}

/// Gremlin neighbourhood query: node, directed edges, and far-end nodes,
/// each deduplicated by the service.
fn neighbourhood_query(node_id: &str, edge_step: &str) -> String {
    format!(
        "node = g.V('{node_id}').toList(); \
         edges = g.V('{node_id}').{edge_step}().dedup().toList(); \
         other_nodes = g.V('{node_id}').{edge_step}().otherV().dedup().toList(); \
         [other_nodes, edges, node]"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_set_covers_both_directions() {
        let set = CommandSet::standard();
        assert!(set.for_direction(ExpandDirection::Outgoing).is_some());
        assert!(set.for_direction(ExpandDirection::Incoming).is_some());
    }

    #[test]
    fn query_template_substitutes_node_id() {
        let set = CommandSet::standard();
        let query = set
            .for_direction(ExpandDirection::Outgoing)
            .unwrap()
            .query_for("42");
        assert!(query.contains("g.V('42')"));
        assert!(query.contains("outE"));
        assert!(query.contains("dedup"));

        let query = set
            .for_direction(ExpandDirection::Incoming)
            .unwrap()
            .query_for("42");
        assert!(query.contains("inE"));
    }

    #[test]
    fn disabled_commands_are_not_selectable() {
        let set = CommandSet::new(vec![Command::new(
            "expand outgoing",
            ExpandDirection::Outgoing,
            Arc::new(|id| id.to_string()),
        )
        .with_enabled(false)]);
        assert!(set.for_direction(ExpandDirection::Outgoing).is_none());
    }
}
