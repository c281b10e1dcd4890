//! sng-infer: bounded blocking queue, two-headed model interface, and
//! the batching inference evaluator search workers talk to.

pub mod evaluator;
pub mod model;
pub mod queue;

pub use evaluator::{EvaluatorError, EvaluatorOptions, ModelEvaluator, StopToken};
pub use model::{InferenceOutput, Observation, ObservationShape, TwoHeadedModel, UniformModel};
pub use queue::ThreadedQueue;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");


#[cfg(test)]
mod evaluator_tests;
