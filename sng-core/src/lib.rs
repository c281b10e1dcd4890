//! sng-core: element catalogue, board parsing, and the deterministic
//! stones-n-gems simulator.
//!
//! The simulator is a scan-based cellular state machine: `apply_action`
//! runs one pass over the board, with gravity, rolling, explosions, magic
//! walls, stochastic blob growth, keyed gates, and incremental Zobrist
//! hashing for search reuse.

pub mod board;
pub mod element;
pub mod observation;
pub mod params;
pub mod rng;
pub mod state;

pub use board::{parse_board_str, Board, ParseError};
pub use element::{
    Direction, HiddenCellType, VisibleCellType, AGENT_POS_DIE, AGENT_POS_EXIT, NUM_ACTIONS,
    NUM_DIRECTIONS, NUM_HIDDEN_CELL_TYPES, NUM_VISIBLE_CELL_TYPES,
};
pub use params::{default_game_params, GameParameter, GameParameters};
pub use state::{GameState, LocalState, SharedStateInfo};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");


#[cfg(test)]
mod sim_tests;
