//! Board storage and the pipe-separated board-text format.

use std::fmt;

use thiserror::Error;

use crate::element::{HiddenCellType, AGENT_POS_EXIT};

/// Board-text parse failures. Positions are token indices into the
/// pipe-separated string.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("board string has {found} header tokens, expected at least 4")]
    MissingHeader { found: usize },
    #[error("token {position} is not an integer: {token:?}")]
    BadToken { position: usize, token: String },
    #[error("board dimensions must be positive, got {rows}x{cols}")]
    BadDimensions { rows: i64, cols: i64 },
    #[error("expected {expected} cells, found {found}")]
    WrongCellCount { expected: usize, found: usize },
    #[error("token {position} holds unknown cell code {code}")]
    UnknownCode { position: usize, code: i64 },
}

/// Flat row-major grid plus agent bookkeeping and the incremental Zobrist
/// hash. The hash is maintained by the simulator; the board only stores it.
#[derive(Debug, Clone)]
pub struct Board {
    pub rows: usize,
    pub cols: usize,
    pub max_steps: i32,
    pub gems_required: u32,
    pub grid: Vec<HiddenCellType>,
    pub has_updated: Vec<bool>,
    /// Agent cell index, or `AGENT_POS_EXIT` / `AGENT_POS_DIE`.
    pub agent_pos: i32,
    /// Last grid index the agent occupied (valid even once in the exit).
    pub agent_idx: i32,
    pub zorb_hash: u64,
}

impl Board {
    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    pub fn item(&self, index: usize) -> HiddenCellType {
        self.grid[index]
    }

    pub fn set(&mut self, index: usize, cell: HiddenCellType) {
        self.grid[index] = cell;
    }

    /// All indices currently holding `cell`.
    pub fn find_all(&self, cell: HiddenCellType) -> Vec<usize> {
        self.grid
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == cell)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn reset_updated(&mut self) {
        self.has_updated.fill(false);
    }

    /// Agent is alive and on the grid.
    pub fn agent_on_grid(&self) -> bool {
        self.agent_pos >= 0
    }

    pub fn agent_in_exit(&self) -> bool {
        self.agent_pos == AGENT_POS_EXIT
    }

    /// Re-serialize into the pipe-separated board-text format.
    pub fn to_board_str(&self) -> String {
        let mut out = format!(
            "{}|{}|{}|{}",
            self.rows, self.cols, self.max_steps, self.gems_required
        );
        for &cell in &self.grid {
            out.push('|');
            out.push_str(&cell.code().to_string());
        }
        out
    }
}

// Dynamic metadata (has_updated, hash) is derived state; two boards are the
// same board iff their dimensions, rules header and grid match.
impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.max_steps == other.max_steps
            && self.gems_required == other.gems_required
            && self.grid == other.grid
    }
}

impl Eq for Board {}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            for c in 0..self.cols {
                write!(f, "{}", self.grid[r * self.cols + c].element().id)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parse the literal board-text format:
/// `rows|cols|max_steps|gems_required|cell0|cell1|...` with cells in
/// row-major order.
pub fn parse_board_str(board_str: &str) -> Result<Board, ParseError> {
    let tokens: Vec<&str> = board_str.split('|').collect();
    if tokens.len() < 4 {
        return Err(ParseError::MissingHeader {
            found: tokens.len(),
        });
    }

    let int_at = |position: usize| -> Result<i64, ParseError> {
        tokens[position]
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::BadToken {
                position,
                token: tokens[position].to_string(),
            })
    };

    let rows = int_at(0)?;
    let cols = int_at(1)?;
    let max_steps = int_at(2)?;
    let gems_required = int_at(3)?;
    if rows <= 0 || cols <= 0 {
        return Err(ParseError::BadDimensions { rows, cols });
    }
    let rows = rows as usize;
    let cols = cols as usize;

    let expected = rows * cols;
    let found = tokens.len() - 4;
    if found != expected {
        return Err(ParseError::WrongCellCount { expected, found });
    }

    let mut grid = Vec::with_capacity(expected);
    let mut agent_idx: i32 = -1;
    for i in 0..expected {
        let position = i + 4;
        let code = int_at(position)?;
        let cell = i8::try_from(code)
            .ok()
            .and_then(HiddenCellType::from_code)
            .ok_or(ParseError::UnknownCode { position, code })?;
        if cell == HiddenCellType::Agent {
            agent_idx = i as i32;
        }
        grid.push(cell);
    }

    Ok(Board {
        rows,
        cols,
        max_steps: max_steps as i32,
        gems_required: gems_required.max(0) as u32,
        grid,
        has_updated: vec![false; expected],
        agent_pos: agent_idx,
        agent_idx,
        zorb_hash: 0,
    })
}
