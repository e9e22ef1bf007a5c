// Types used in the engine module
use crate::engine::error::GraphError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Input,
    Hidden,
    Output,
    Conv2d,
    Maxpool,
    Flatten,
    Embedding,
    Lstm,
    Dense,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Input => "input",
            NodeKind::Hidden => "hidden",
            NodeKind::Output => "output",
            NodeKind::Conv2d => "conv2d",
            NodeKind::Maxpool => "maxpool",
            NodeKind::Flatten => "flatten",
            NodeKind::Embedding => "embedding",
            NodeKind::Lstm => "lstm",
            NodeKind::Dense => "dense",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the stored lowercase names as well as the palette names the
/// canvas writes into `data.type` (`Dense`, `Conv2D`, `MaxPooling2D`).
impl FromStr for NodeKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" => Ok(NodeKind::Input),
            "hidden" => Ok(NodeKind::Hidden),
            "output" => Ok(NodeKind::Output),
            "conv2d" => Ok(NodeKind::Conv2d),
            "maxpool" | "maxpool2d" | "maxpooling2d" => Ok(NodeKind::Maxpool),
            "flatten" => Ok(NodeKind::Flatten),
            "embedding" => Ok(NodeKind::Embedding),
            "lstm" => Ok(NodeKind::Lstm),
            "dense" => Ok(NodeKind::Dense),
            other => Err(GraphError::UnknownNodeKind(other.to_string())),
        }
    }
}

/// Architecture families a saved graph can belong to.
///
/// `Transformer` is accepted from the document store but has no template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArchitectureType {
    Cnn,
    Rnn,
    Transformer,
    Feedforward,
}

impl ArchitectureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchitectureType::Cnn => "cnn",
            ArchitectureType::Rnn => "rnn",
            ArchitectureType::Transformer => "transformer",
            ArchitectureType::Feedforward => "feedforward",
        }
    }
}

impl fmt::Display for ArchitectureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchitectureType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cnn" => Ok(ArchitectureType::Cnn),
            "rnn" => Ok(ArchitectureType::Rnn),
            "transformer" => Ok(ArchitectureType::Transformer),
            "feedforward" => Ok(ArchitectureType::Feedforward),
            other => Err(GraphError::UnknownArchitectureType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainable: Option<bool>,
}

/// Fully connected layers: hidden, dense and output nodes share this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DenseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conv2dConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strides: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strides: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlattenConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_dim: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dim: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LstmConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_sequences: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainable: Option<bool>,
}

/// Layer parameters, one variant per [`NodeKind`].
///
/// The variant *is* the node's kind, so a node can never carry parameters
/// that belong to another layer category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum LayerConfig {
    Input(InputConfig),
    Hidden(DenseConfig),
    Output(DenseConfig),
    Conv2d(Conv2dConfig),
    Maxpool(PoolConfig),
    Flatten(FlattenConfig),
    Embedding(EmbeddingConfig),
    Lstm(LstmConfig),
    Dense(DenseConfig),
}

impl LayerConfig {
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Input => LayerConfig::Input(InputConfig::default()),
            NodeKind::Hidden => LayerConfig::Hidden(DenseConfig::default()),
            NodeKind::Output => LayerConfig::Output(DenseConfig::default()),
            NodeKind::Conv2d => LayerConfig::Conv2d(Conv2dConfig::default()),
            NodeKind::Maxpool => LayerConfig::Maxpool(PoolConfig::default()),
            NodeKind::Flatten => LayerConfig::Flatten(FlattenConfig::default()),
            NodeKind::Embedding => LayerConfig::Embedding(EmbeddingConfig::default()),
            NodeKind::Lstm => LayerConfig::Lstm(LstmConfig::default()),
            NodeKind::Dense => LayerConfig::Dense(DenseConfig::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            LayerConfig::Input(_) => NodeKind::Input,
            LayerConfig::Hidden(_) => NodeKind::Hidden,
            LayerConfig::Output(_) => NodeKind::Output,
            LayerConfig::Conv2d(_) => NodeKind::Conv2d,
            LayerConfig::Maxpool(_) => NodeKind::Maxpool,
            LayerConfig::Flatten(_) => NodeKind::Flatten,
            LayerConfig::Embedding(_) => NodeKind::Embedding,
            LayerConfig::Lstm(_) => NodeKind::Lstm,
            LayerConfig::Dense(_) => NodeKind::Dense,
        }
    }

    pub fn trainable(&self) -> bool {
        let flag = match self {
            LayerConfig::Input(c) => c.trainable,
            LayerConfig::Hidden(c) | LayerConfig::Output(c) | LayerConfig::Dense(c) => c.trainable,
            LayerConfig::Conv2d(c) => c.trainable,
            LayerConfig::Maxpool(c) => c.trainable,
            LayerConfig::Flatten(c) => c.trainable,
            LayerConfig::Embedding(c) => c.trainable,
            LayerConfig::Lstm(c) => c.trainable,
        };
        flag != Some(false)
    }

    /// Rebuild a config from the wire pair `(type, data.config)`.
    ///
    /// A missing or `null` config is read as the kind's defaults; keys the
    /// kind does not recognise are dropped.
    pub fn from_wire(kind: NodeKind, config: Value) -> Result<Self, serde_json::Error> {
        let config = match config {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        serde_json::from_value(json!({ "type": kind, "config": config }))
    }

    /// The `data.config` object as the document store expects it.
    pub fn to_wire(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut tagged)) => tagged
                .remove("config")
                .unwrap_or_else(|| Value::Object(Default::default())),
            _ => Value::Object(Default::default()),
        }
    }
}
