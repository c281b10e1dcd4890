//! PHS* best-first search: a priority queue ordered by the
//! policy-and-heuristic cost, closed-set dedup by canonical state, and
//! staged batch inference.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;
use sng_core::GameState;
use sng_infer::{EvaluatorError, ModelEvaluator, Observation};
use thiserror::Error;

use crate::arena::{NodeArena, StateArena, StateId};
use crate::node::{Node, NodeId};

/// Expansion budget per problem.
pub const BUDGET_NODES: usize = 2000;
/// Staged children are flushed to the evaluator at this batch size.
pub const INFERENCE_BATCH_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The evaluator went away mid-search; distinguishable from "not
    /// solved within budget".
    #[error("search aborted: {0}")]
    Aborted(#[from] EvaluatorError),
}

/// One search problem.
pub struct SearchInput<'a> {
    pub index: i32,
    pub state: GameState,
    pub model_evaluator: &'a ModelEvaluator,
}

/// Elementwise `log((1-eps)*p + eps/|A| + 1e-8)`.
pub fn log_policy_noise(policy: &[f64], epsilon: f64) -> Vec<f64> {
    let noise = 1.0 / policy.len() as f64;
    policy
        .iter()
        .map(|&p| ((1.0 - epsilon) * p + epsilon * noise + 1e-8).ln())
        .collect()
}

/// PHS* cost; with `predicted_h = 0` this reduces to Levin tree search.
pub fn phs_cost(node: &Node, predicted_h: f64) -> f64 {
    let h = predicted_h.max(0.0);
    (h + node.g + 1e-8).ln() - node.p * (1.0 + h / node.g)
}

/// Open-queue entry. Ordered so the binary heap pops the smallest
/// `levin_cost` first, ties broken by smaller depth.
struct OpenEntry {
    levin_cost: f64,
    g: f64,
    node: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .levin_cost
            .total_cmp(&self.levin_cost)
            .then_with(|| other.g.total_cmp(&self.g))
    }
}

/// Best-first search for one problem. Returns whether a solution state
/// was reached within the node budget.
pub fn search(input: SearchInput<'_>) -> Result<bool, SearchError> {
    let evaluator = input.model_evaluator;
    let mut expanded = 0usize;

    let mut root_pred = evaluator.inference(vec![input.state.get_observation()])?;
    let root_pred = root_pred.swap_remove(0);

    let mut states = StateArena::new();
    let mut nodes = NodeArena::new();

    let root_state = states.add_state(input.state);
    let root = {
        let mut node = Node::new(None, root_state, 0.0, 0.0, None);
        node.action_log_policy = log_policy_noise(&root_pred.policy, 0.0);
        nodes.push(node)
    };

    let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
    let mut closed: FxHashSet<StateId> = FxHashSet::default();
    open.push(OpenEntry {
        levin_cost: 0.0,
        g: 0.0,
        node: root,
    });

    let mut children_to_predict: Vec<NodeId> = Vec::new();
    let mut child_observations: Vec<Observation> = Vec::new();

    while let Some(entry) = open.pop() {
        let node_id = entry.node;
        let state_id = nodes.get(node_id).state;
        if !closed.insert(state_id) {
            // Same state already expanded via another parent.
            continue;
        }
        expanded += 1;

        if states.get(state_id).is_solution() {
            return Ok(true);
        }
        if expanded >= BUDGET_NODES {
            break;
        }

        let actions = states.get(state_id).legal_actions();
        debug_assert_eq!(actions.len(), nodes.get(node_id).action_log_policy.len());
        for (i, &action) in actions.iter().enumerate() {
            let mut child_state = states.get(state_id).clone();
            child_state.apply_action(action);
            // Dead ends are pruned; solution children stay in play.
            if child_state.is_terminal() && !child_state.is_solution() {
                continue;
            }

            let child_state_id = states.add_state(child_state);
            let (p, g) = {
                let parent = nodes.get(node_id);
                (parent.p + parent.action_log_policy[i], parent.g + 1.0)
            };
            let child = nodes.push(Node::new(
                Some(node_id),
                child_state_id,
                p,
                g,
                Some(action),
            ));

            children_to_predict.push(child);
            child_observations.push(states.get(child_state_id).get_observation());
        }

        // Flush staged children through the evaluator in one batch.
        if (children_to_predict.len() >= INFERENCE_BATCH_SIZE || open.is_empty())
            && !children_to_predict.is_empty()
        {
            let predictions = evaluator.inference(std::mem::take(&mut child_observations))?;
            for (child_id, pred) in children_to_predict.drain(..).zip(predictions) {
                let child_state_id = nodes.get(child_id).state;
                if closed.contains(&child_state_id) {
                    continue;
                }
                let (cost, g) = {
                    let child = nodes.get_mut(child_id);
                    child.action_log_policy = log_policy_noise(&pred.policy, 0.0);
                    child.h = pred.heuristic;
                    child.levin_cost = phs_cost(child, pred.heuristic);
                    (child.levin_cost, child.g)
                };
                open.push(OpenEntry {
                    levin_cost: cost,
                    g,
                    node: child_id,
                });
            }
        }
    }

    Ok(false)
}
