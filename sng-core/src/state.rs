//! The deterministic simulator: one scan over the board per applied
//! action. This module is the single place that mutates game state.
//!
//! Update rules are order-sensitive: cells are visited in flat index
//! order, a `has_updated` mask guarantees each cell acts at most once per
//! scan, and every board mutation goes through `set_item`/`move_item` so
//! the Zobrist hash stays incremental.

use std::fmt;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;

use crate::board::{parse_board_str, Board, ParseError};
use crate::element::{
    self, properties, reward, Direction, HiddenCellType, AGENT_POS_DIE, AGENT_POS_EXIT,
    DIRECTIONS, NUM_ACTIONS, NUM_HIDDEN_CELL_TYPES,
};
use crate::params::{self, GameParameters};
use crate::rng::{splitmix64, xorshift64};

use crate::element::Direction as D;
use crate::element::HiddenCellType as H;

/// Immutable per-game configuration, shared by every clone of a state.
/// Holds the Zobrist table and the padded in-bounds frame.
#[derive(Debug)]
pub struct SharedStateInfo {
    /// Copy of the construction parameters.
    pub params: GameParameters,
    pub obs_show_ids: bool,
    pub magic_wall_steps: u16,
    pub blob_chance: u8,
    pub blob_max_size: u16,
    pub blob_max_percentage: f32,
    pub rng_seed: u64,
    pub gravity: bool,
    blob_swap: Option<HiddenCellType>,
    init_board: Board,
    /// Zobrist table, `cell_code * rows*cols + index`.
    zrbht: Vec<u64>,
    /// In-bounds mask on the padded `(rows+2)*(cols+2)` frame.
    in_bounds_board: Vec<bool>,
    /// Grid index -> padded frame index.
    board_to_inbounds: Vec<usize>,
}

impl SharedStateInfo {
    pub fn new(game_params: &GameParameters) -> Result<Self, ParseError> {
        let board = parse_board_str(params::str_param(game_params, "game_board_str"))?;
        let size = board.size();

        let magic_wall_steps = params::int_param(game_params, "magic_wall_steps").max(0) as u16;
        let blob_chance = params::int_param(game_params, "blob_chance").clamp(0, 255) as u8;
        let blob_max_percentage = params::float_param(game_params, "blob_max_percentage") as f32;
        let blob_max_size = (size as f32 * blob_max_percentage) as u16;
        let rng_seed = params::int_param(game_params, "rng_seed") as u64;
        let gravity = params::bool_param(game_params, "gravity");
        let obs_show_ids = params::bool_param(game_params, "obs_show_ids");
        let blob_swap = match params::int_param(game_params, "blob_swap") {
            -1 => None,
            code => Some(
                i8::try_from(code)
                    .ok()
                    .and_then(HiddenCellType::from_code)
                    .unwrap_or_else(|| panic!("blob_swap holds unknown cell code {code}")),
            ),
        };

        let mut rng = ChaCha8Rng::seed_from_u64(rng_seed);
        let mut zrbht = Vec::with_capacity(NUM_HIDDEN_CELL_TYPES * size);
        for _channel in 0..NUM_HIDDEN_CELL_TYPES {
            for _ in 0..size {
                zrbht.push(rng.gen::<u64>());
            }
        }

        // Padded frame: a one-cell false border around the grid makes the
        // single-step bounds test a table lookup.
        let padded = (board.rows + 2) * (board.cols + 2);
        let mut in_bounds_board = vec![true; padded];
        for c in 0..board.cols + 2 {
            in_bounds_board[c] = false;
            in_bounds_board[(board.rows + 1) * (board.cols + 2) + c] = false;
        }
        for r in 0..board.rows + 2 {
            in_bounds_board[r * (board.cols + 2)] = false;
            in_bounds_board[r * (board.cols + 2) + board.cols + 1] = false;
        }
        let mut board_to_inbounds = Vec::with_capacity(size);
        for r in 0..board.rows {
            for c in 0..board.cols {
                board_to_inbounds.push((board.cols + 2) * (r + 1) + c + 1);
            }
        }

        Ok(Self {
            params: game_params.clone(),
            obs_show_ids,
            magic_wall_steps,
            blob_chance,
            blob_max_size,
            blob_max_percentage,
            rng_seed,
            gravity,
            blob_swap,
            init_board: board,
            zrbht,
            in_bounds_board,
            board_to_inbounds,
        })
    }
}

/// Mutable per-state bookkeeping alongside the board.
#[derive(Debug, Clone)]
pub struct LocalState {
    pub magic_wall_steps: u16,
    pub blob_size: u16,
    pub blob_swap: Option<HiddenCellType>,
    pub gems_collected: u32,
    pub current_reward: u32,
    pub reward_signal: u64,
    pub magic_active: bool,
    pub blob_enclosed: bool,
    pub steps_remaining: i32,
    pub random_state: u64,
    pub id_state: u16,
    pub index_id_map: FxHashMap<usize, u16>,
    pub id_index_map: FxHashMap<u16, usize>,
}

impl LocalState {
    fn initial(shared: &SharedStateInfo) -> Self {
        Self {
            magic_wall_steps: shared.magic_wall_steps,
            blob_size: 0,
            blob_swap: shared.blob_swap,
            gems_collected: 0,
            current_reward: 0,
            reward_signal: 0,
            magic_active: false,
            blob_enclosed: true,
            steps_remaining: shared.init_board.max_steps,
            random_state: splitmix64(shared.rng_seed),
            id_state: 0,
            index_id_map: FxHashMap::default(),
            id_index_map: FxHashMap::default(),
        }
    }
}

// State identity for search dedup intentionally ignores transient
// bookkeeping (rewards, rng, ids, step counter): two states that place the
// same elements with the same magic/blob progress are the same node.
impl PartialEq for LocalState {
    fn eq(&self, other: &Self) -> bool {
        self.magic_wall_steps == other.magic_wall_steps
            && self.blob_size == other.blob_size
            && self.gems_collected == other.gems_collected
            && self.magic_active == other.magic_active
            && self.blob_enclosed == other.blob_enclosed
    }
}

impl Eq for LocalState {}

/// One game state: board + local bookkeeping, sharing the immutable
/// `SharedStateInfo` with every clone.
#[derive(Debug, Clone)]
pub struct GameState {
    shared: Arc<SharedStateInfo>,
    pub(crate) board: Board,
    pub(crate) local: LocalState,
}

impl PartialEq for GameState {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.board == other.board
    }
}

impl Eq for GameState {}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.board, f)
    }
}

impl GameState {
    pub fn new(game_params: &GameParameters) -> Result<Self, ParseError> {
        let shared = Arc::new(SharedStateInfo::new(game_params)?);
        let mut state = GameState {
            board: shared.init_board.clone(),
            local: LocalState::initial(&shared),
            shared,
        };
        state.reset();
        Ok(state)
    }

    /// Reset to the starting position given by the construction parameters.
    pub fn reset(&mut self) {
        self.board = self.shared.init_board.clone();
        self.local = LocalState::initial(&self.shared);

        for i in 0..self.board.size() {
            self.add_index_id(i);
        }

        let mut hash = 0u64;
        for i in 0..self.board.size() {
            hash ^= self.zobrist(self.board.item(i), i);
        }
        self.board.zorb_hash = hash;
    }

    /// Apply `action` (one scan). Out-of-range actions are a caller bug.
    pub fn apply_action(&mut self, action: usize) {
        let dir = Direction::from_action(action);
        self.start_scan();

        // Agent moves first.
        if self.board.agent_idx >= 0 {
            self.update_agent(self.board.agent_idx as usize, dir);
        }

        for i in 0..self.board.size() {
            if self.board.has_updated[i] {
                continue;
            }
            match self.board.item(i) {
                H::Stone => self.update_stone(i),
                H::StoneFalling => self.update_stone_falling(i),
                H::Diamond => self.update_diamond(i),
                H::DiamondFalling => self.update_diamond_falling(i),
                H::Nut => self.update_nut(i),
                H::NutFalling => self.update_nut_falling(i),
                H::Bomb => self.update_bomb(i),
                H::BombFalling => self.update_bomb_falling(i),
                H::ExitClosed => self.update_exit(i),
                H::Blob => self.update_blob(i),
                cell => {
                    if let Some(d) = element::butterfly_direction(cell) {
                        self.update_butterfly(i, d);
                    } else if let Some(d) = element::firefly_direction(cell) {
                        self.update_firefly(i, d);
                    } else if let Some(d) = element::orange_direction(cell) {
                        self.update_orange(i, d);
                    } else if cell.is_magic_wall() {
                        self.update_magic_wall(i);
                    } else if cell.is_explosion() {
                        self.update_explosions(i);
                    }
                }
            }
        }

        self.end_scan();
    }

    /// Terminal: timed out, dead, or in the exit.
    pub fn is_terminal(&self) -> bool {
        let out_of_time = self.board.max_steps > 0 && self.local.steps_remaining <= 0;
        out_of_time || self.board.agent_pos < 0
    }

    /// Solved: in the exit and not timed out.
    pub fn is_solution(&self) -> bool {
        let out_of_time = self.board.max_steps > 0 && self.local.steps_remaining <= 0;
        !out_of_time && self.board.agent_pos == AGENT_POS_EXIT
    }

    pub fn legal_actions(&self) -> Vec<usize> {
        (0..NUM_ACTIONS).collect()
    }

    /// Incremental Zobrist hash of the board.
    pub fn hash(&self) -> u64 {
        self.board.zorb_hash
    }

    pub fn get_reward_signal(&self) -> u64 {
        self.local.reward_signal
    }

    pub fn current_reward(&self) -> u32 {
        self.local.current_reward
    }

    pub fn gems_collected(&self) -> u32 {
        self.local.gems_collected
    }

    pub fn steps_remaining(&self) -> i32 {
        self.local.steps_remaining
    }

    /// Agent cell index, `AGENT_POS_EXIT` once solved, `AGENT_POS_DIE` when
    /// dead.
    pub fn get_agent_pos(&self) -> i32 {
        self.board.agent_pos
    }

    /// Last grid index the agent occupied, regardless of status.
    pub fn get_agent_index(&self) -> i32 {
        self.board.agent_idx
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn get_hidden_item(&self, index: usize) -> HiddenCellType {
        self.board.item(index)
    }

    pub fn get_index_item(&self, index: usize) -> i8 {
        self.board.item(index).code()
    }

    pub fn get_positions(&self, cell: HiddenCellType) -> Vec<(usize, usize)> {
        self.board
            .find_all(cell)
            .into_iter()
            .map(|i| self.index_to_position(i))
            .collect()
    }

    pub fn get_indices(&self, cell: HiddenCellType) -> Vec<usize> {
        self.board.find_all(cell)
    }

    pub fn position_to_index(&self, position: (usize, usize)) -> usize {
        position.0 * self.board.cols + position.1
    }

    pub fn index_to_position(&self, index: usize) -> (usize, usize) {
        (index / self.board.cols, index % self.board.cols)
    }

    pub fn is_pos_in_bounds(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.board.rows && (col as usize) < self.board.cols
    }

    /// Persistent id of the trackable item at `index`.
    pub fn get_index_id(&self, index: usize) -> Option<u16> {
        self.local.index_id_map.get(&index).copied()
    }

    /// Current index of the trackable item with `id`.
    pub fn get_id_index(&self, id: u16) -> Option<usize> {
        self.local.id_index_map.get(&id).copied()
    }

    /// OR of every reward-signal bit still obtainable on this board.
    pub fn get_valid_rewards(&self) -> u64 {
        self.board
            .grid
            .iter()
            .filter_map(|&cell| element::element_reward(cell))
            .fold(0, |acc, bit| acc | bit)
    }

    // ------------------------------------------------------------------
    // Index and lookup helpers.

    /// Neighbor index one step in `dir`. Callers check bounds first.
    fn index_from_direction(&self, index: usize, dir: Direction) -> usize {
        let cols = self.board.cols as isize;
        let idx = index as isize;
        let next = match dir {
            D::Noop => idx,
            D::Up => idx - cols,
            D::Right => idx + 1,
            D::Down => idx + cols,
            D::Left => idx - 1,
            D::UpRight => idx - cols + 1,
            D::DownRight => idx + cols + 1,
            D::DownLeft => idx + cols - 1,
            D::UpLeft => idx - cols - 1,
        };
        next as usize
    }

    /// O(1) bounds test via the padded frame.
    fn in_bounds(&self, index: usize, dir: Direction) -> bool {
        let w = self.board.cols as isize + 2;
        let b = self.shared.board_to_inbounds[index] as isize;
        let bi = match dir {
            D::Noop => b,
            D::Up => b - w,
            D::Right => b + 1,
            D::Down => b + w,
            D::Left => b - 1,
            D::UpRight => b - w + 1,
            D::DownRight => b + w + 1,
            D::DownLeft => b + w - 1,
            D::UpLeft => b - w - 1,
        };
        self.shared.in_bounds_board[bi as usize]
    }

    fn get_item(&self, index: usize, dir: Direction) -> HiddenCellType {
        self.board.item(self.index_from_direction(index, dir))
    }

    fn is_type(&self, index: usize, cell: HiddenCellType, dir: Direction) -> bool {
        self.in_bounds(index, dir) && self.get_item(index, dir) == cell
    }

    fn has_property(&self, index: usize, property: u32, dir: Direction) -> bool {
        self.in_bounds(index, dir) && self.get_item(index, dir).has_property(property)
    }

    fn is_type_adjacent(&self, index: usize, cell: HiddenCellType) -> bool {
        self.is_type(index, cell, D::Up)
            || self.is_type(index, cell, D::Left)
            || self.is_type(index, cell, D::Down)
            || self.is_type(index, cell, D::Right)
    }

    fn zobrist(&self, cell: HiddenCellType, index: usize) -> u64 {
        self.shared.zrbht[(cell as usize) * self.board.size() + index]
    }

    // ------------------------------------------------------------------
    // Trackable-item ids.

    fn add_index_id(&mut self, index: usize) {
        if self.board.item(index).is_trackable() {
            self.local.id_state += 1;
            let id = self.local.id_state;
            self.local.id_index_map.insert(id, index);
            self.local.index_id_map.insert(index, id);
        }
    }

    fn remove_index_id(&mut self, index: usize) {
        if let Some(id) = self.local.index_id_map.remove(&index) {
            self.local.id_index_map.remove(&id);
        }
    }

    /// Item moved: its id follows it.
    fn update_id_index(&mut self, index_old: usize, index_new: usize) {
        if let Some(id) = self.local.index_id_map.remove(&index_old) {
            self.local.index_id_map.insert(index_new, id);
            self.local.id_index_map.insert(id, index_new);
        }
    }

    /// Item changed identity in place (e.g. a cracked nut): fresh id.
    fn update_index_id(&mut self, index: usize) {
        if let Some(&id_old) = self.local.index_id_map.get(&index) {
            self.local.id_state += 1;
            let id_new = self.local.id_state;
            self.local.id_index_map.remove(&id_old);
            self.local.id_index_map.insert(id_new, index);
            self.local.index_id_map.insert(index, id_new);
        }
    }

    // ------------------------------------------------------------------
    // Board mutation. All grid writes go through these two so the Zobrist
    // hash stays consistent and the scan mask is maintained.

    fn set_item(&mut self, index: usize, cell: HiddenCellType, dir: Direction) {
        let i = self.index_from_direction(index, dir);
        self.board.zorb_hash ^= self.zobrist(self.board.item(i), i);
        self.board.set(i, cell);
        self.board.zorb_hash ^= self.zobrist(cell, i);
        self.board.has_updated[i] = true;
    }

    fn move_item(&mut self, index: usize, dir: Direction) {
        let new_index = self.index_from_direction(index, dir);
        self.board.zorb_hash ^= self.zobrist(self.board.item(new_index), new_index);
        let moved = self.board.item(index);
        self.board.set(new_index, moved);
        self.board.zorb_hash ^= self.zobrist(moved, new_index);

        self.board.zorb_hash ^= self.zobrist(self.board.item(index), index);
        self.board.set(index, H::Empty);
        self.board.zorb_hash ^= self.zobrist(H::Empty, index);
        self.board.has_updated[new_index] = true;

        self.update_id_index(index, new_index);
    }

    // ------------------------------------------------------------------
    // Shared movement mechanics.

    fn can_roll_left(&self, index: usize) -> bool {
        self.has_property(index, properties::ROUNDED, D::Down)
            && self.is_type(index, H::Empty, D::Left)
            && self.is_type(index, H::Empty, D::DownLeft)
    }

    fn can_roll_right(&self, index: usize) -> bool {
        self.has_property(index, properties::ROUNDED, D::Down)
            && self.is_type(index, H::Empty, D::Right)
            && self.is_type(index, H::Empty, D::DownRight)
    }

    fn roll_left(&mut self, index: usize, cell: HiddenCellType) {
        self.set_item(index, cell, D::Noop);
        self.move_item(index, D::Left);
    }

    fn roll_right(&mut self, index: usize, cell: HiddenCellType) {
        self.set_item(index, cell, D::Noop);
        self.move_item(index, D::Right);
    }

    /// Agent pushes the element in front of it one cell forward.
    fn push(
        &mut self,
        index: usize,
        stationary: HiddenCellType,
        falling: HiddenCellType,
        dir: Direction,
    ) {
        let new_index = self.index_from_direction(index, dir);
        // Room to push only if the cell past the target is empty.
        if self.is_type(new_index, H::Empty, dir) {
            let next_index = self.index_from_direction(new_index, dir);
            let is_empty_below = self.is_type(next_index, H::Empty, D::Down);
            self.move_item(new_index, dir);
            self.set_item(next_index, if is_empty_below { falling } else { stationary }, D::Noop);
            self.move_item(index, dir);
            let pos = self.index_from_direction(index, dir) as i32;
            self.board.agent_pos = pos;
            self.board.agent_idx = pos;
        }
    }

    /// Falling item passes through a magic wall, converted, landing two
    /// cells below if that cell is empty.
    fn move_through_magic(&mut self, index: usize, converted: HiddenCellType) {
        if self.local.magic_wall_steps == 0 {
            return;
        }
        self.local.magic_active = true;
        let index_wall = self.index_from_direction(index, D::Down);
        if self.is_type(index_wall, H::Empty, D::Down) {
            let index_under_wall = self.index_from_direction(index_wall, D::Down);
            self.set_item(index, H::Empty, D::Noop);
            self.set_item(index_under_wall, converted, D::Noop);
            self.update_id_index(index, index_under_wall);
        }
    }

    /// Place explosion element `cell` at the neighbor in `dir`, chaining
    /// into explodable neighbors and consuming consumable ones. Terminates
    /// because explosion-stage elements neither chain nor get consumed.
    fn explode(&mut self, index: usize, cell: HiddenCellType, dir: Direction) {
        let new_index = self.index_from_direction(index, dir);
        let occupant = self.board.item(new_index);
        let chained = element::element_to_explosion(occupant);
        if occupant == H::Agent {
            self.board.agent_pos = AGENT_POS_DIE;
        }
        self.set_item(new_index, cell, D::Noop);
        self.remove_index_id(new_index);

        for &d in &DIRECTIONS[1..] {
            if !self.in_bounds(new_index, d) {
                continue;
            }
            if self.has_property(new_index, properties::CAN_EXPLODE, d) {
                self.explode(new_index, chained, d);
            } else if self.has_property(new_index, properties::CONSUMABLE, d) {
                let consumed = self.index_from_direction(new_index, d);
                self.set_item(new_index, chained, d);
                self.remove_index_id(consumed);
            }
        }
    }

    fn open_gate(&mut self, closed_gate: HiddenCellType) {
        for index in self.board.find_all(closed_gate) {
            let open = element::gate_open(self.board.item(index));
            self.set_item(index, open, D::Noop);
        }
    }

    // ------------------------------------------------------------------
    // Per-element update rules.

    fn update_stone(&mut self, index: usize) {
        if !self.shared.gravity {
            return;
        }
        if self.is_type(index, H::Empty, D::Down) {
            self.set_item(index, H::StoneFalling, D::Noop);
            self.update_stone_falling(index);
        } else if self.can_roll_left(index) {
            self.roll_left(index, H::StoneFalling);
        } else if self.can_roll_right(index) {
            self.roll_right(index, H::StoneFalling);
        }
    }

    fn update_stone_falling(&mut self, index: usize) {
        if self.is_type(index, H::Empty, D::Down) {
            self.move_item(index, D::Down);
        } else if self.has_property(index, properties::CAN_EXPLODE, D::Down) {
            // Falling stones set off whatever they land on.
            let below = self.get_item(index, D::Down);
            self.explode(index, element::element_to_explosion(below), D::Down);
        } else if self.is_type(index, H::WallMagicOn, D::Down)
            || self.is_type(index, H::WallMagicDormant, D::Down)
        {
            let converted = element::magic_wall_conversion(self.board.item(index));
            self.move_through_magic(index, converted);
        } else if self.is_type(index, H::Nut, D::Down) {
            // Crack the nut open to reveal a diamond.
            let below = self.index_from_direction(index, D::Down);
            self.set_item(index, H::Diamond, D::Down);
            self.update_index_id(below);
        } else if self.can_roll_left(index) {
            self.roll_left(index, H::StoneFalling);
        } else if self.can_roll_right(index) {
            self.roll_right(index, H::StoneFalling);
        } else {
            self.set_item(index, H::Stone, D::Noop);
        }
    }

    fn update_diamond(&mut self, index: usize) {
        if !self.shared.gravity {
            return;
        }
        if self.is_type(index, H::Empty, D::Down) {
            self.set_item(index, H::DiamondFalling, D::Noop);
            self.update_diamond_falling(index);
        } else if self.can_roll_left(index) {
            self.roll_left(index, H::DiamondFalling);
        } else if self.can_roll_right(index) {
            self.roll_right(index, H::DiamondFalling);
        }
    }

    fn update_diamond_falling(&mut self, index: usize) {
        if self.is_type(index, H::Empty, D::Down) {
            self.move_item(index, D::Down);
        } else if self.has_property(index, properties::CAN_EXPLODE, D::Down)
            && !self.is_type(index, H::Bomb, D::Down)
            && !self.is_type(index, H::BombFalling, D::Down)
        {
            // Falling diamonds set off what they land on, except bombs.
            let below = self.get_item(index, D::Down);
            self.explode(index, element::element_to_explosion(below), D::Down);
        } else if self.is_type(index, H::WallMagicOn, D::Down)
            || self.is_type(index, H::WallMagicDormant, D::Down)
        {
            let converted = element::magic_wall_conversion(self.board.item(index));
            self.move_through_magic(index, converted);
        } else if self.can_roll_left(index) {
            self.roll_left(index, H::DiamondFalling);
        } else if self.can_roll_right(index) {
            self.roll_right(index, H::DiamondFalling);
        } else {
            self.set_item(index, H::Diamond, D::Noop);
        }
    }

    fn update_nut(&mut self, index: usize) {
        if !self.shared.gravity {
            return;
        }
        if self.is_type(index, H::Empty, D::Down) {
            self.set_item(index, H::NutFalling, D::Noop);
            self.update_nut_falling(index);
        } else if self.can_roll_left(index) {
            self.roll_left(index, H::NutFalling);
        } else if self.can_roll_right(index) {
            self.roll_right(index, H::NutFalling);
        }
    }

    fn update_nut_falling(&mut self, index: usize) {
        if self.is_type(index, H::Empty, D::Down) {
            self.move_item(index, D::Down);
        } else if self.can_roll_left(index) {
            self.roll_left(index, H::NutFalling);
        } else if self.can_roll_right(index) {
            self.roll_right(index, H::NutFalling);
        } else {
            self.set_item(index, H::Nut, D::Noop);
        }
    }

    fn update_bomb(&mut self, index: usize) {
        if !self.shared.gravity {
            return;
        }
        if self.is_type(index, H::Empty, D::Down) {
            self.set_item(index, H::BombFalling, D::Noop);
            self.update_bomb_falling(index);
        } else if self.can_roll_left(index) {
            self.roll_left(index, H::Bomb);
        } else if self.can_roll_right(index) {
            self.roll_right(index, H::Bomb);
        }
    }

    fn update_bomb_falling(&mut self, index: usize) {
        if self.is_type(index, H::Empty, D::Down) {
            self.move_item(index, D::Down);
        } else if self.can_roll_left(index) {
            self.roll_left(index, H::BombFalling);
        } else if self.can_roll_right(index) {
            self.roll_right(index, H::BombFalling);
        } else {
            // Bombs detonate when they stop falling.
            let cell = self.board.item(index);
            self.explode(index, element::element_to_explosion(cell), D::Noop);
        }
    }

    fn update_exit(&mut self, index: usize) {
        if self.local.gems_collected >= self.board.gems_required {
            self.set_item(index, H::ExitOpen, D::Noop);
        }
    }

    fn update_agent(&mut self, index: usize, dir: Direction) {
        if self.board.agent_pos < 0 {
            // Dead or already in the exit.
            return;
        }
        if !self.in_bounds(index, dir) {
            return;
        }

        if self.is_type(index, H::Empty, dir) || self.is_type(index, H::Dirt, dir) {
            self.move_item(index, dir);
            let pos = self.index_from_direction(index, dir) as i32;
            self.board.agent_pos = pos;
            self.board.agent_idx = pos;
        } else if self.is_type(index, H::Diamond, dir) || self.is_type(index, H::DiamondFalling, dir)
        {
            self.local.gems_collected += 1;
            self.local.current_reward += element::points(self.get_item(index, dir)) as u32;
            self.local.reward_signal |= reward::COLLECT_DIAMOND;
            self.move_item(index, dir);
            let pos = self.index_from_direction(index, dir);
            self.remove_index_id(pos);
            self.board.agent_pos = pos as i32;
            self.board.agent_idx = pos as i32;
        } else if dir.is_horizontal() && self.has_property(index, properties::PUSHABLE, dir) {
            let target = self.get_item(index, dir);
            self.push(index, target, element::to_falling(target), dir);
        } else if self.get_item(index, dir).is_key() {
            let key = self.get_item(index, dir);
            self.open_gate(element::key_to_gate(key));
            self.move_item(index, dir);
            let pos = self.index_from_direction(index, dir) as i32;
            self.board.agent_pos = pos;
            self.board.agent_idx = pos;
            self.local.reward_signal |= reward::COLLECT_KEY | element::key_signal(key);
        } else if self.get_item(index, dir).is_open_gate() {
            let index_gate = self.index_from_direction(index, dir);
            // Only pass through if the far side can be landed on.
            if self.has_property(index_gate, properties::TRAVERSABLE, dir) {
                let landing = self.index_from_direction(index_gate, dir);
                let landed_on = self.board.item(landing);
                if landed_on == H::Diamond || landed_on == H::DiamondFalling {
                    self.local.gems_collected += 1;
                    self.local.current_reward += element::points(landed_on) as u32;
                    self.local.reward_signal |= reward::COLLECT_DIAMOND;
                    self.remove_index_id(landing);
                } else if landed_on.is_key() {
                    self.open_gate(element::key_to_gate(landed_on));
                    self.local.reward_signal |=
                        reward::COLLECT_KEY | element::key_signal(landed_on);
                }
                self.set_item(index_gate, H::Agent, dir);
                self.set_item(index, H::Empty, D::Noop);
                self.board.agent_pos = landing as i32;
                self.board.agent_idx = landing as i32;
                self.local.reward_signal |=
                    reward::WALK_THROUGH_GATE | element::gate_signal(self.board.item(index_gate));
            }
        } else if self.is_type(index, H::ExitOpen, dir) {
            self.move_item(index, dir);
            self.set_item(index, H::AgentInExit, dir);
            self.board.agent_pos = AGENT_POS_EXIT;
            self.board.agent_idx = self.index_from_direction(index, dir) as i32;
            self.local.reward_signal |= reward::WALK_THROUGH_EXIT;
            if self.board.max_steps != 0 {
                let bonus = self.local.steps_remaining * 100 / self.board.max_steps;
                if bonus > 0 {
                    self.local.current_reward += bonus as u32;
                }
            }
        }
    }

    fn update_firefly(&mut self, index: usize, dir: Direction) {
        let new_dir = element::ROTATE_LEFT[dir as usize];
        if self.is_type_adjacent(index, H::Agent) || self.is_type_adjacent(index, H::Blob) {
            let cell = self.board.item(index);
            self.explode(index, element::element_to_explosion(cell), D::Noop);
        } else if self.is_type(index, H::Empty, new_dir) {
            // Fireflies hug the left wall, else continue forward.
            self.set_item(index, element::direction_to_firefly(new_dir), D::Noop);
            self.move_item(index, new_dir);
        } else if self.is_type(index, H::Empty, dir) {
            self.set_item(index, element::direction_to_firefly(dir), D::Noop);
            self.move_item(index, dir);
        } else {
            self.set_item(
                index,
                element::direction_to_firefly(element::ROTATE_RIGHT[dir as usize]),
                D::Noop,
            );
        }
    }

    fn update_butterfly(&mut self, index: usize, dir: Direction) {
        let new_dir = element::ROTATE_RIGHT[dir as usize];
        if self.is_type_adjacent(index, H::Agent) || self.is_type_adjacent(index, H::Blob) {
            let cell = self.board.item(index);
            self.explode(index, element::element_to_explosion(cell), D::Noop);
        } else if self.is_type(index, H::Empty, new_dir) {
            // Butterflies hug the right wall, else continue forward.
            self.set_item(index, element::direction_to_butterfly(new_dir), D::Noop);
            self.move_item(index, new_dir);
        } else if self.is_type(index, H::Empty, dir) {
            self.set_item(index, element::direction_to_butterfly(dir), D::Noop);
            self.move_item(index, dir);
        } else {
            self.set_item(
                index,
                element::direction_to_butterfly(element::ROTATE_LEFT[dir as usize]),
                D::Noop,
            );
        }
    }

    fn update_orange(&mut self, index: usize, dir: Direction) {
        if self.is_type(index, H::Empty, dir) {
            self.move_item(index, dir);
        } else if self.is_type_adjacent(index, H::Agent) {
            let cell = self.board.item(index);
            self.explode(index, element::element_to_explosion(cell), D::Noop);
        } else {
            // Blocked: pick a new heading among the open orthogonal
            // neighbors, if any.
            let mut open_dirs = [D::Noop; NUM_ACTIONS];
            let mut count = 0usize;
            for &d in &DIRECTIONS[1..NUM_ACTIONS] {
                if self.is_type(index, H::Empty, d) {
                    open_dirs[count] = d;
                    count += 1;
                }
            }
            if count > 0 {
                let pick = (xorshift64(&mut self.local.random_state) % count as u64) as usize;
                self.set_item(index, element::direction_to_orange(open_dirs[pick]), D::Noop);
            }
        }
    }

    fn update_magic_wall(&mut self, index: usize) {
        if self.local.magic_active {
            self.set_item(index, H::WallMagicOn, D::Noop);
        } else if self.local.magic_wall_steps > 0 {
            self.set_item(index, H::WallMagicDormant, D::Noop);
        } else {
            self.set_item(index, H::WallMagicExpired, D::Noop);
        }
    }

    fn update_blob(&mut self, index: usize) {
        if let Some(swap) = self.local.blob_swap {
            self.set_item(index, swap, D::Noop);
            self.add_index_id(index);
            return;
        }

        self.local.blob_size += 1;
        if self.is_type_adjacent(index, H::Empty) || self.is_type_adjacent(index, H::Dirt) {
            self.local.blob_enclosed = false;
        }

        let will_grow =
            xorshift64(&mut self.local.random_state) % 256 < self.shared.blob_chance as u64;
        let grow_dir =
            DIRECTIONS[(xorshift64(&mut self.local.random_state) % NUM_ACTIONS as u64) as usize];
        if will_grow
            && (self.is_type(index, H::Empty, grow_dir) || self.is_type(index, H::Dirt, grow_dir))
        {
            let grown = self.index_from_direction(index, grow_dir);
            self.set_item(index, H::Blob, grow_dir);
            self.remove_index_id(grown);
        }
    }

    fn update_explosions(&mut self, index: usize) {
        let settled = element::explosion_to_element(self.board.item(index));
        self.set_item(index, settled, D::Noop);
        self.add_index_id(index);
    }

    // ------------------------------------------------------------------
    // Scan bookkeeping.

    fn start_scan(&mut self) {
        if self.local.steps_remaining > 0 {
            self.local.steps_remaining -= 1;
        }
        self.local.current_reward = 0;
        self.local.blob_size = 0;
        self.local.blob_enclosed = true;
        self.local.reward_signal = 0;
        self.board.reset_updated();
    }

    fn end_scan(&mut self) {
        if self.local.blob_swap.is_none() {
            if self.local.blob_enclosed {
                self.local.blob_swap = Some(H::Diamond);
            }
            if self.local.blob_size > self.shared.blob_max_size {
                self.local.blob_swap = Some(H::Stone);
            }
        }
        if self.local.magic_active {
            self.local.magic_wall_steps = self.local.magic_wall_steps.saturating_sub(1);
        }
        self.local.magic_active = self.local.magic_active && self.local.magic_wall_steps > 0;
    }
}
