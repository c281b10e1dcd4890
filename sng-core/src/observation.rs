//! One-hot observation export for the neural predictor.

use crate::element::NUM_VISIBLE_CELL_TYPES;
use crate::state::GameState;

impl GameState {
    /// CHW shape of `get_observation`: `(visible channels, rows, cols)`.
    pub fn observation_shape(&self) -> [usize; 3] {
        [NUM_VISIBLE_CELL_TYPES, self.board.rows, self.board.cols]
    }

    /// Flat C-order one-hot tensor over visible cell types:
    /// `obs[visible(cell(i)) * rows*cols + i] = 1.0`.
    pub fn get_observation(&self) -> Vec<f32> {
        let channel_length = self.board.size();
        let mut obs = vec![0.0f32; NUM_VISIBLE_CELL_TYPES * channel_length];
        for i in 0..channel_length {
            let channel = self.board.item(i).visible() as usize;
            obs[channel * channel_length + i] = 1.0;
        }
        obs
    }
}
