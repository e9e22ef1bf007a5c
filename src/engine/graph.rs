// In-memory graph of the architecture currently open in the editor
use crate::engine::error::GraphError;
use crate::engine::history::Snapshot;
use crate::engine::types::NodeKind;
use crate::schemas::graph::{Connection, Edge, Node, NodePatch};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Nodes, committed edges and tentative connections.
///
/// Every edge and connection references nodes that exist; removing a node
/// removes everything attached to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    connections: Vec<Connection>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.connections.is_empty()
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.contains_node(&node.id) {
            return Err(GraphError::DuplicateId(node.id));
        }
        log::debug!("Adding {} node {}", node.kind(), node.id);
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node together with every edge and connection touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<Node, GraphError> {
        let position = self
            .nodes
            .iter()
            .position(|node| node.id == id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        let removed = self.nodes.remove(position);

        let edges_before = self.edges.len();
        let connections_before = self.connections.len();
        self.edges.retain(|edge| !edge.involves(id));
        self.connections.retain(|conn| !conn.involves(id));

        log::debug!(
            "Removed node {} ({} edges, {} connections cascaded)",
            id,
            edges_before - self.edges.len(),
            connections_before - self.connections.len()
        );
        Ok(removed)
    }

    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<(), GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|node| node.id == id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;

        if let Some(config) = &patch.config {
            if config.kind() != node.kind() {
                return Err(GraphError::KindMismatch {
                    id: id.to_string(),
                    kind: node.kind(),
                    attempted: config.kind(),
                });
            }
        }

        if let Some(label) = patch.label {
            node.label = label;
        }
        if let Some(position) = patch.position {
            node.position = position;
        }
        if let Some(config) = patch.config {
            node.config = config;
        }
        Ok(())
    }

    /// Replace every node with an authoritative list, typically from the server.
    ///
    /// Repeated ids keep their first occurrence. Edges and connections that
    /// lost an endpoint are dropped.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        let mut seen = HashSet::new();
        self.nodes = nodes
            .into_iter()
            .filter(|node| {
                let fresh = seen.insert(node.id.clone());
                if !fresh {
                    log::warn!("Dropping repeated node id {} from bulk replace", node.id);
                }
                fresh
            })
            .collect();
        self.prune_dangling();
        log::debug!("Nodes replaced ({} total)", self.nodes.len());
    }

    /// Replace the committed edges, dropping duplicates, self loops and
    /// dangling references.
    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        let mut seen = HashSet::new();
        let nodes = node_ids(&self.nodes);
        self.edges = edges
            .into_iter()
            .filter(|edge| {
                edge.source != edge.target
                    && nodes.contains(edge.source.as_str())
                    && nodes.contains(edge.target.as_str())
                    && seen.insert((edge.source.clone(), edge.target.clone()))
            })
            .collect();
    }

    pub fn set_connections(&mut self, connections: Vec<Connection>) {
        let nodes = node_ids(&self.nodes);
        self.connections = connections
            .into_iter()
            .filter(|conn| {
                conn.source != conn.target
                    && nodes.contains(conn.source.as_str())
                    && nodes.contains(conn.target.as_str())
            })
            .collect();
    }

    /// Swap in a fresh graph, discarding pending connections.
    pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        self.connections.clear();
        self.set_nodes(nodes);
        self.set_edges(edges);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.connections.clear();
    }

    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<&Edge, GraphError> {
        self.check_endpoints(source, target)?;
        if self.has_edge(source, target) {
            return Err(GraphError::DuplicateEdge {
                from: source.to_string(),
                to: target.to_string(),
            });
        }
        self.edges.push(Edge::between(source, target));
        Ok(&self.edges[self.edges.len() - 1])
    }

    pub fn remove_edge(&mut self, id: &str) -> Result<Edge, GraphError> {
        let position = self
            .edges
            .iter()
            .position(|edge| edge.id == id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.to_string()))?;
        Ok(self.edges.remove(position))
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target)
    }

    /// Start a tentative link. Self loops and unknown endpoints are refused;
    /// links that could never be committed are kept but flagged invalid.
    pub fn add_connection(&mut self, source: &str, target: &str) -> Result<&Connection, GraphError> {
        self.check_endpoints(source, target)?;
        let is_valid = self.connection_is_valid(source, target);
        self.connections.push(Connection {
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            target: target.to_string(),
            is_valid,
        });
        Ok(&self.connections[self.connections.len() - 1])
    }

    pub fn remove_connection(&mut self, id: &str) -> Result<Connection, GraphError> {
        let position = self
            .connections
            .iter()
            .position(|conn| conn.id == id)
            .ok_or_else(|| GraphError::ConnectionNotFound(id.to_string()))?;
        Ok(self.connections.remove(position))
    }

    /// Promote a tentative connection to a committed edge.
    pub fn commit_connection(&mut self, id: &str) -> Result<Edge, GraphError> {
        let conn = self
            .connections
            .iter()
            .find(|conn| conn.id == id)
            .ok_or_else(|| GraphError::ConnectionNotFound(id.to_string()))?;
        if !self.connection_is_valid(&conn.source, &conn.target) {
            return Err(GraphError::InvalidConnection(id.to_string()));
        }

        let conn = self.remove_connection(id)?;
        let edge = self.add_edge(&conn.source, &conn.target)?.clone();
        Ok(edge)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            connections: self.connections.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.nodes = snapshot.nodes.clone();
        self.edges = snapshot.edges.clone();
        self.connections = snapshot.connections.clone();
    }

    /// Node ids in data-flow order.
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        let processor = GraphProcessor::new(&self.nodes, &self.edges);
        Ok(processor
            .validate_and_sort()?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    fn connection_is_valid(&self, source: &str, target: &str) -> bool {
        let into_input = self.node(target).map(Node::kind) == Some(NodeKind::Input);
        let out_of_output = self.node(source).map(Node::kind) == Some(NodeKind::Output);
        !into_input && !out_of_output && !self.has_edge(source, target)
    }

    fn check_endpoints(&self, source: &str, target: &str) -> Result<(), GraphError> {
        if source == target {
            return Err(GraphError::SelfLoop(source.to_string()));
        }
        for id in [source, target] {
            if !self.contains_node(id) {
                return Err(GraphError::NodeNotFound(id.to_string()));
            }
        }
        Ok(())
    }

    fn prune_dangling(&mut self) {
        let nodes: HashSet<String> = self.nodes.iter().map(|node| node.id.clone()).collect();
        self.edges
            .retain(|edge| nodes.contains(&edge.source) && nodes.contains(&edge.target));
        self.connections
            .retain(|conn| nodes.contains(&conn.source) && nodes.contains(&conn.target));
    }
}

fn node_ids(nodes: &[Node]) -> HashSet<&str> {
    nodes.iter().map(|node| node.id.as_str()).collect()
}

/// Directed view of a committed graph for ordering and shape checks.
pub struct GraphProcessor {
    pub graph: DiGraph<String, ()>,
    pub node_map: HashMap<String, NodeIndex>,
    pub original_nodes: HashMap<String, NodeKind>,
}

impl GraphProcessor {
    pub fn new(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let mut original_nodes = HashMap::new();

        for node in nodes {
            let idx = graph.add_node(node.id.clone());
            node_map.insert(node.id.clone(), idx);
            original_nodes.insert(node.id.clone(), node.kind());
        }

        for edge in edges {
            if let (Some(&src), Some(&target)) =
                (node_map.get(&edge.source), node_map.get(&edge.target))
            {
                graph.add_edge(src, target, ());
            }
        }

        Self {
            graph,
            node_map,
            original_nodes,
        }
    }

    pub fn validate_and_sort(&self) -> Result<Vec<(String, NodeKind)>, GraphError> {
        // toposort doubles as the cycle check
        let sorted_indices = toposort(&self.graph, None)
            .map_err(|cycle| GraphError::Cycle(self.graph[cycle.node_id()].clone()))?;

        Ok(sorted_indices
            .into_iter()
            .map(|idx| {
                let id = self.graph[idx].clone();
                let kind = self.original_nodes[&id];
                (id, kind)
            })
            .collect())
    }

    pub fn get_incoming_map(&self) -> HashMap<String, Vec<String>> {
        let mut incoming_map = HashMap::new();

        for (node_id, node_idx) in &self.node_map {
            let parents: Vec<String> = self
                .graph
                .neighbors_directed(*node_idx, petgraph::Direction::Incoming)
                .map(|parent_idx| self.graph[parent_idx].clone())
                .collect();

            incoming_map.insert(node_id.clone(), parents);
        }

        incoming_map
    }

    /// True when the nodes form one acyclic path touching every node.
    pub fn is_linear_chain(&self) -> bool {
        let count = self.graph.node_count();
        if count == 0 || self.graph.edge_count() != count - 1 {
            return false;
        }
        let Ok(order) = toposort(&self.graph, None) else {
            return false;
        };
        order
            .windows(2)
            .all(|pair| self.graph.find_edge(pair[0], pair[1]).is_some())
    }
}
