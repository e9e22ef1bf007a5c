// Hand-authored starter graphs per architecture family
use crate::engine::error::GraphError;
use crate::engine::types::{ArchitectureType, NodeKind};
use crate::schemas::graph::{Edge, Node, Position};

const ORIGIN_X: f64 = 100.0;
const SPACING_X: f64 = 150.0;
const ROW_Y: f64 = 100.0;

type Layer = (&'static str, NodeKind, &'static str);

const CNN: &[Layer] = &[
    ("input", NodeKind::Input, "Input"),
    ("conv1", NodeKind::Conv2d, "Conv2D"),
    ("pool1", NodeKind::Maxpool, "MaxPooling2D"),
    ("flatten", NodeKind::Flatten, "Flatten"),
    ("dense", NodeKind::Dense, "Dense"),
    ("output", NodeKind::Output, "Output"),
];

const RNN: &[Layer] = &[
    ("input", NodeKind::Input, "Input"),
    ("embedding", NodeKind::Embedding, "Embedding"),
    ("lstm", NodeKind::Lstm, "LSTM"),
    ("dense", NodeKind::Dense, "Dense"),
    ("output", NodeKind::Output, "Output"),
];

const FEEDFORWARD: &[Layer] = &[
    ("input", NodeKind::Input, "Input"),
    ("dense1", NodeKind::Dense, "Dense"),
    ("dense2", NodeKind::Dense, "Dense"),
    ("output", NodeKind::Output, "Output"),
];

fn layers(template: ArchitectureType) -> Result<&'static [Layer], GraphError> {
    match template {
        ArchitectureType::Cnn => Ok(CNN),
        ArchitectureType::Rnn => Ok(RNN),
        ArchitectureType::Feedforward => Ok(FEEDFORWARD),
        ArchitectureType::Transformer => Err(GraphError::UnsupportedTemplate(template)),
    }
}

/// Build the starter graph for `template`: a left-to-right chain of layers.
///
/// Ids are fixed, so the result is meant to replace a graph, not merge into one.
pub fn instantiate(template: ArchitectureType) -> Result<(Vec<Node>, Vec<Edge>), GraphError> {
    let layers = layers(template)?;

    let nodes = layers
        .iter()
        .enumerate()
        .map(|(i, &(id, kind, label))| {
            let x = ORIGIN_X + SPACING_X * i as f64;
            Node::of_kind(id, kind, label, Position::new(x, ROW_Y))
        })
        .collect();

    let edges = layers
        .windows(2)
        .map(|pair| Edge::between(pair[0].0, pair[1].0))
        .collect();

    Ok((nodes, edges))
}
