//! The two-headed predictor interface.
//!
//! The network itself (architecture, weights, training) lives outside
//! this crate; the evaluator only needs the batched forward-pass
//! contract plus a deterministic baseline for tests and dry runs.

use sng_core::NUM_ACTIONS;

/// Flat C-order `(channels, rows, cols)` observation tensor.
pub type Observation = Vec<f32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationShape {
    pub c: usize,
    pub h: usize,
    pub w: usize,
}

impl ObservationShape {
    pub fn flat_size(&self) -> usize {
        self.c * self.h * self.w
    }
}

/// One prediction: action logits, softmax policy, its log, and the
/// scalar heuristic (predicted remaining cost).
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    pub logits: Vec<f64>,
    pub policy: Vec<f64>,
    pub log_policy: Vec<f64>,
    pub heuristic: f64,
}

/// Batched two-headed forward pass.
///
/// Contract: the output length equals the input length, every `policy`
/// has `num_actions` entries summing to ~1, and
/// `log_policy[a] == ln(policy[a])`.
pub trait TwoHeadedModel: Send {
    fn num_actions(&self) -> usize;
    fn inference(&self, inputs: &[Observation]) -> Vec<InferenceOutput>;
}

/// Uniform policy and zero heuristic. Turns the searcher into a
/// breadth-biased baseline; also the reference model for tests.
pub struct UniformModel {
    num_actions: usize,
}

impl UniformModel {
    pub fn new(num_actions: usize) -> Self {
        Self { num_actions }
    }
}

impl Default for UniformModel {
    fn default() -> Self {
        Self::new(NUM_ACTIONS)
    }
}

impl TwoHeadedModel for UniformModel {
    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn inference(&self, inputs: &[Observation]) -> Vec<InferenceOutput> {
        let p = 1.0 / self.num_actions as f64;
        inputs
            .iter()
            .map(|_| InferenceOutput {
                logits: vec![0.0; self.num_actions],
                policy: vec![p; self.num_actions],
                log_policy: vec![p.ln(); self.num_actions],
                heuristic: 0.0,
            })
            .collect()
    }
}
