// Pointer gestures on the canvas, translated into graph mutations
use crate::engine::error::GraphError;
use crate::engine::graph::GraphModel;
use crate::schemas::graph::{NodePatch, Position};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    DraggingNode(String),
    Connecting(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed on a node's connection handle.
    HandleDown { node: String },
    /// Pointer released over a node's connection handle.
    HandleUp { node: String },
    /// Pointer released over empty canvas.
    CanvasUp,
    /// Click on the canvas background.
    CanvasClick,
    NodeClick { node: String },
    DragStart { node: String },
    DragMove { position: Position },
    DragEnd,
    Cancel,
}

/// What an event did to the graph. Only `ConnectionCreated` is structural.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    ConnectionCreated { id: String },
    NodeMoved { id: String, position: Position },
    Selected(Option<String>),
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    mode: Mode,
    selected: Option<String>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, graph: &GraphModel, id: &str) -> Result<(), GraphError> {
        if !graph.contains_node(id) {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn cancel(&mut self) {
        self.mode = Mode::Idle;
    }

    pub fn handle(&mut self, event: PointerEvent, graph: &mut GraphModel) -> Result<Effect, GraphError> {
        match (std::mem::take(&mut self.mode), event) {
            (Mode::Idle, PointerEvent::HandleDown { node })
            | (Mode::Connecting(_), PointerEvent::HandleDown { node }) => {
                if !graph.contains_node(&node) {
                    return Err(GraphError::NodeNotFound(node));
                }
                log::debug!("Connecting from {}", node);
                self.mode = Mode::Connecting(node);
                Ok(Effect::None)
            }
            (Mode::Connecting(source), PointerEvent::HandleUp { node }) => {
                if source == node {
                    return Ok(Effect::None);
                }
                let id = graph.add_connection(&source, &node)?.id.clone();
                Ok(Effect::ConnectionCreated { id })
            }
            (Mode::Connecting(_), PointerEvent::CanvasUp) => Ok(Effect::None),
            (Mode::Idle, PointerEvent::DragStart { node }) => {
                if !graph.contains_node(&node) {
                    return Err(GraphError::NodeNotFound(node));
                }
                self.mode = Mode::DraggingNode(node);
                Ok(Effect::None)
            }
            (Mode::DraggingNode(id), PointerEvent::DragMove { position }) => {
                let result = graph.update_node(&id, NodePatch::position(position));
                self.mode = Mode::DraggingNode(id.clone());
                result?;
                Ok(Effect::NodeMoved { id, position })
            }
            (Mode::DraggingNode(_), PointerEvent::DragEnd) => Ok(Effect::None),
            (_, PointerEvent::CanvasClick) => {
                self.selected = None;
                Ok(Effect::Selected(None))
            }
            (mode, PointerEvent::NodeClick { node }) => {
                self.mode = mode;
                self.select(graph, &node)?;
                Ok(Effect::Selected(Some(node)))
            }
            (_, PointerEvent::Cancel) => Ok(Effect::None),
            (mode, event) => {
                log::debug!("Ignoring {:?} while {:?}", event, mode);
                self.mode = mode;
                Ok(Effect::None)
            }
        }
    }

    /// Drop any selection or gesture that points at a node no longer in `graph`.
    pub fn reconcile(&mut self, graph: &GraphModel) {
        if let Some(selected) = &self.selected {
            if !graph.contains_node(selected) {
                self.selected = None;
            }
        }
        let stale = match &self.mode {
            Mode::Idle => false,
            Mode::DraggingNode(id) | Mode::Connecting(id) => !graph.contains_node(id),
        };
        if stale {
            self.mode = Mode::Idle;
        }
    }
}
