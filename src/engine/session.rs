// One open editing session: graph, history and gesture state together
use crate::engine::error::GraphError;
use crate::engine::graph::GraphModel;
use crate::engine::history::History;
use crate::engine::interaction::{Effect, InteractionController, PointerEvent};
use crate::engine::templates;
use crate::engine::types::ArchitectureType;
use crate::schemas::architecture::{Architecture, Dataset, Verdict};
use crate::schemas::graph::{Connection, Edge, Node, NodePatch};

/// Metadata of the architecture the session is editing.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchitectureInfo {
    pub id: String,
    pub name: String,
    pub kind: ArchitectureType,
    pub dataset: Option<Dataset>,
}

impl From<&Architecture> for ArchitectureInfo {
    fn from(architecture: &Architecture) -> Self {
        Self {
            id: architecture.id.clone(),
            name: architecture.name.clone(),
            kind: architecture.kind,
            dataset: architecture.dataset.clone().filter(|_| architecture.has_dataset),
        }
    }
}

/// The editor's single writer.
///
/// Structural edits (nodes added or removed, connections drawn, removed or
/// committed, templates applied) each record one history entry. Drags,
/// renames and parameter edits do not, and neither does a server reload.
#[derive(Debug, Clone)]
pub struct EditorSession {
    architecture: Option<ArchitectureInfo>,
    graph: GraphModel,
    history: History,
    interaction: InteractionController,
    revision: u64,
    saved_revision: Option<u64>,
    verdict: Option<Verdict>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::with_history(History::new())
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_limit(limit: usize) -> Self {
        Self::with_history(History::with_limit(limit))
    }

    fn with_history(mut history: History) -> Self {
        let graph = GraphModel::new();
        history.push(graph.snapshot());
        Self {
            architecture: None,
            graph,
            history,
            interaction: InteractionController::new(),
            revision: 0,
            saved_revision: None,
            verdict: None,
        }
    }

    /// Open a stored architecture. The loaded state is the history baseline
    /// and counts as saved.
    pub fn open(architecture: &Architecture, history_limit: Option<usize>) -> Self {
        let mut session = match history_limit {
            Some(limit) => Self::with_history_limit(limit),
            None => Self::new(),
        };
        session.architecture = Some(ArchitectureInfo::from(architecture));
        session.graph.set_nodes(architecture.nodes.clone());
        session.graph.set_edges(architecture.edges.clone());
        session.graph.set_connections(architecture.connections.clone());
        session.history.clear();
        session.history.push(session.graph.snapshot());
        session.saved_revision = Some(session.revision);
        session
    }

    pub fn architecture(&self) -> Option<&ArchitectureInfo> {
        self.architecture.as_ref()
    }

    pub fn attach(&mut self, info: ArchitectureInfo) {
        self.architecture = Some(info);
    }

    pub fn set_dataset(&mut self, dataset: Dataset) {
        if let Some(info) = &mut self.architecture {
            info.dataset = Some(dataset);
        }
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }

    pub fn edges(&self) -> &[Edge] {
        self.graph.edges()
    }

    pub fn connections(&self) -> &[Connection] {
        self.graph.connections()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.interaction.selected().and_then(|id| self.graph.node(id))
    }

    /// Bumped on every local mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn saved_revision(&self) -> Option<u64> {
        self.saved_revision
    }

    pub fn is_dirty(&self) -> bool {
        self.saved_revision != Some(self.revision)
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        self.graph.add_node(node)?;
        self.record();
        Ok(())
    }

    pub fn remove_node(&mut self, id: &str) -> Result<Node, GraphError> {
        let removed = self.graph.remove_node(id)?;
        self.interaction.reconcile(&self.graph);
        self.record();
        Ok(removed)
    }

    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<(), GraphError> {
        self.graph.update_node(id, patch)?;
        self.amend();
        Ok(())
    }

    /// Server reconciliation; never undoable.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.graph.set_nodes(nodes);
        self.interaction.reconcile(&self.graph);
        self.amend();
    }

    pub fn set_connections(&mut self, connections: Vec<Connection>) {
        self.graph.set_connections(connections);
        self.amend();
    }

    pub fn add_connection(&mut self, source: &str, target: &str) -> Result<Connection, GraphError> {
        let connection = self.graph.add_connection(source, target)?.clone();
        self.record();
        Ok(connection)
    }

    pub fn remove_connection(&mut self, id: &str) -> Result<Connection, GraphError> {
        let removed = self.graph.remove_connection(id)?;
        self.record();
        Ok(removed)
    }

    pub fn commit_connection(&mut self, id: &str) -> Result<Edge, GraphError> {
        let edge = self.graph.commit_connection(id)?;
        self.record();
        Ok(edge)
    }

    pub fn remove_edge(&mut self, id: &str) -> Result<Edge, GraphError> {
        let removed = self.graph.remove_edge(id)?;
        self.record();
        Ok(removed)
    }

    /// Replace the graph with the starter topology for `template`.
    pub fn instantiate_template(&mut self, template: ArchitectureType) -> Result<(), GraphError> {
        let (nodes, edges) = templates::instantiate(template)?;
        log::debug!(
            "Instantiating {} template ({} nodes, {} edges)",
            template,
            nodes.len(),
            edges.len()
        );
        self.graph.replace(nodes, edges);
        self.interaction.reconcile(&self.graph);
        self.record();
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.graph.restore(snapshot);
        self.interaction.reconcile(&self.graph);
        self.touch();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.graph.restore(snapshot);
        self.interaction.reconcile(&self.graph);
        self.touch();
        true
    }

    pub fn select(&mut self, id: &str) -> Result<(), GraphError> {
        self.interaction.select(&self.graph, id)
    }

    pub fn deselect(&mut self) {
        self.interaction.deselect();
    }

    /// Feed a canvas gesture through the interaction state machine.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<Effect, GraphError> {
        let effect = self.interaction.handle(event, &mut self.graph)?;
        match &effect {
            Effect::ConnectionCreated { .. } => self.record(),
            Effect::NodeMoved { .. } => self.amend(),
            Effect::None | Effect::Selected(_) => {}
        }
        Ok(effect)
    }

    pub(crate) fn mark_saved(&mut self, revision: u64) {
        self.saved_revision = Some(revision);
    }

    pub(crate) fn set_verdict(&mut self, verdict: Verdict) {
        self.verdict = Some(verdict);
    }

    /// Apply a full reload; the reloaded state counts as saved.
    pub(crate) fn reload_nodes(&mut self, nodes: Vec<Node>) {
        self.set_nodes(nodes);
        self.saved_revision = Some(self.revision);
    }

    fn record(&mut self) {
        self.history.push(self.graph.snapshot());
        self.touch();
    }

    /// Fold a non-undoable edit into the current history entry.
    fn amend(&mut self) {
        self.history.replace_current(self.graph.snapshot());
        self.touch();
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
