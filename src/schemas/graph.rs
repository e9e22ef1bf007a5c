// Graph definitions shared with the document store and the editor frontend
use crate::engine::types::{LayerConfig, NodeKind};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Node type the canvas uses for palette drops; the layer lives in `data.type`.
const CANVAS_NODE_TYPE: &str = "layerNode";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A layer in the architecture graph.
///
/// On the wire a node is `{id, type, position, data: {label, config}}`; in
/// memory the `type` is carried by the [`LayerConfig`] variant so it cannot
/// drift from the parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireNode", into = "WireNode")]
pub struct Node {
    pub id: String,
    pub position: Position,
    pub label: String,
    pub(crate) config: LayerConfig,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        config: LayerConfig,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            position,
            label: label.into(),
            config,
        }
    }

    /// A node of `kind` with default parameters.
    pub fn of_kind(
        id: impl Into<String>,
        kind: NodeKind,
        label: impl Into<String>,
        position: Position,
    ) -> Self {
        Self::new(id, label, LayerConfig::default_for(kind), position)
    }

    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub config: Value,
    /// Palette name of a canvas-dropped layer, e.g. `Conv2D`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireNode {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    data: NodeData,
}

impl TryFrom<WireNode> for Node {
    type Error = serde_json::Error;

    fn try_from(wire: WireNode) -> Result<Self, Self::Error> {
        let name = if wire.kind == CANVAS_NODE_TYPE {
            wire.data
                .layer
                .as_deref()
                .ok_or_else(|| serde_json::Error::missing_field("data.type"))?
        } else {
            wire.kind.as_str()
        };
        let kind: NodeKind = name.parse().map_err(serde_json::Error::custom)?;
        let config = LayerConfig::from_wire(kind, wire.data.config)?;
        Ok(Node {
            id: wire.id,
            position: wire.position,
            label: wire.data.label,
            config,
        })
    }
}

impl From<Node> for WireNode {
    fn from(node: Node) -> Self {
        WireNode {
            kind: node.kind().as_str().to_string(),
            data: NodeData {
                label: node.label,
                config: node.config.to_wire(),
                layer: None,
            },
            id: node.id,
            position: node.position,
        }
    }
}

/// Decode a stored node list, skipping entries that name no known layer so
/// one palette-only node does not hide the rest of the graph.
pub fn nodes_from_wire(values: Vec<Value>) -> Vec<Node> {
    values
        .into_iter()
        .filter_map(|value| {
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("<no id>")
                .to_string();
            match serde_json::from_value(value) {
                Ok(node) => Some(node),
                Err(e) => {
                    log::warn!("Skipping node {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

pub(crate) fn deserialize_nodes<'de, D>(deserializer: D) -> Result<Vec<Node>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer).map(nodes_from_wire)
}

/// Partial update applied by `GraphModel::update_node`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub label: Option<String>,
    pub position: Option<Position>,
    pub config: Option<LayerConfig>,
}

impl NodePatch {
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn config(config: LayerConfig) -> Self {
        Self {
            config: Some(config),
            ..Default::default()
        }
    }
}

/// A committed data-flow arc.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn between(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: Self::id_for(&source, &target),
            source,
            target,
        }
    }

    pub fn id_for(source: &str, target: &str) -> String {
        format!("e{}-{}", source, target)
    }

    pub fn involves(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A link the user is still drawing, not yet promoted to an [`Edge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub is_valid: bool,
}

impl Connection {
    pub fn involves(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}
