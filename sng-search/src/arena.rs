//! Block-allocated storage for search nodes and canonical states.

use rustc_hash::FxHashMap;
use sng_core::GameState;

use crate::node::{Node, NodeId};

/// Block growth for both arenas.
pub const ALLOCATE_INCREMENT: usize = 2000;

/// Arena-backed node storage. Nodes are never freed until the search
/// ends.
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(ALLOCATE_INCREMENT),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        if self.nodes.len() == self.nodes.capacity() {
            self.nodes.reserve(ALLOCATE_INCREMENT);
        }
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

pub type StateId = u32;

/// Canonical-state storage with dedup: inserting a state that is already
/// present hands back the existing id, so distinct nodes can alias one
/// underlying state. Hash buckets key on the Zobrist hash; membership
/// always compares full states.
pub struct StateArena {
    blocks: Vec<Vec<GameState>>,
    by_hash: FxHashMap<u64, Vec<StateId>>,
    len: usize,
}

impl StateArena {
    pub fn new() -> Self {
        Self {
            blocks: vec![Vec::with_capacity(ALLOCATE_INCREMENT)],
            by_hash: FxHashMap::default(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, id: StateId) -> &GameState {
        let id = id as usize;
        &self.blocks[id / ALLOCATE_INCREMENT][id % ALLOCATE_INCREMENT]
    }

    /// Id of the canonical copy equal to `state`, if present.
    pub fn get_state(&self, state: &GameState) -> Option<StateId> {
        self.by_hash
            .get(&state.hash())?
            .iter()
            .copied()
            .find(|&id| self.get(id) == state)
    }

    /// Insert `state` unless an equal state is already stored; either
    /// way, return the canonical id.
    pub fn add_state(&mut self, state: GameState) -> StateId {
        if let Some(id) = self.get_state(&state) {
            return id;
        }
        if self.blocks.last().unwrap().len() == ALLOCATE_INCREMENT {
            self.blocks.push(Vec::with_capacity(ALLOCATE_INCREMENT));
        }
        let id = self.len as StateId;
        self.by_hash.entry(state.hash()).or_default().push(id);
        self.blocks.last_mut().unwrap().push(state);
        self.len += 1;
        id
    }
}

impl Default for StateArena {
    fn default() -> Self {
        Self::new()
    }
}
