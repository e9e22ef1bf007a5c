// Linear undo/redo over graph snapshots
use crate::schemas::graph::{Connection, Edge, Node};

/// Immutable copy of the graph at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub connections: Vec<Connection>,
}

/// Entries plus a cursor. When non-empty, the cursor always points at an
/// entry; entries after it are the redo targets.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<Snapshot>,
    index: Option<usize>,
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` entries, dropping the oldest first.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.index.map(|index| &self.entries[index])
    }

    /// Record a post-edit state. Any redo targets are discarded.
    pub fn push(&mut self, snapshot: Snapshot) {
        let keep = self.index.map_or(0, |index| index + 1);
        self.entries.truncate(keep);
        self.entries.push(snapshot);

        if let Some(limit) = self.limit {
            if self.entries.len() > limit {
                let overflow = self.entries.len() - limit;
                self.entries.drain(..overflow);
            }
        }
        self.index = Some(self.entries.len() - 1);
    }

    /// Overwrite the entry under the cursor without touching redo targets.
    /// Used for edits that are not undo steps of their own, so the cursor
    /// entry keeps matching the live graph.
    pub fn replace_current(&mut self, snapshot: Snapshot) {
        match self.index {
            Some(index) => self.entries[index] = snapshot,
            None => self.push(snapshot),
        }
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.index, Some(index) if index > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.index, Some(index) if index + 1 < self.entries.len())
    }

    /// Step back one entry and return the state to restore.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        let index = self.index? - 1;
        self.index = Some(index);
        Some(&self.entries[index])
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        let index = self.index? + 1;
        self.index = Some(index);
        Some(&self.entries[index])
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }
}
