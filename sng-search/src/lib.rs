//! sng-search: PHS* (policy-and-heuristic) best-first search over
//! simulator states, with arena-allocated nodes, canonical-state dedup
//! and batched inference dispatch.

pub mod arena;
pub mod node;
pub mod phs;

pub use arena::{NodeArena, StateArena, StateId, ALLOCATE_INCREMENT};
pub use node::{Node, NodeId};
pub use phs::{
    log_policy_noise, phs_cost, search, SearchError, SearchInput, BUDGET_NODES,
    INFERENCE_BATCH_SIZE,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
