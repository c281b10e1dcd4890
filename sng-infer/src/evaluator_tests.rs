//! Evaluator contract and shutdown tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use sng_core::NUM_ACTIONS;

use crate::evaluator::{EvaluatorError, EvaluatorOptions, ModelEvaluator};
use crate::model::{InferenceOutput, Observation, TwoHeadedModel, UniformModel};

fn obs(fill: f32) -> Observation {
    vec![fill; 16]
}

/// Uniform predictions, plus bookkeeping on the batch sizes seen.
struct CountingModel {
    calls: Arc<AtomicUsize>,
    batch_sizes: Arc<Mutex<Vec<usize>>>,
    delay: Duration,
}

impl TwoHeadedModel for CountingModel {
    fn num_actions(&self) -> usize {
        NUM_ACTIONS
    }

    fn inference(&self, inputs: &[Observation]) -> Vec<InferenceOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(inputs.len());
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        UniformModel::default().inference(inputs)
    }
}

#[test]
fn inference_matches_input_length_and_contract() {
    let evaluator = ModelEvaluator::new(
        Box::new(UniformModel::default()),
        EvaluatorOptions::default(),
    );
    let outputs = evaluator
        .inference(vec![obs(0.0), obs(1.0), obs(2.0)])
        .unwrap();
    assert_eq!(outputs.len(), 3);
    for out in outputs {
        assert_eq!(out.policy.len(), NUM_ACTIONS);
        let sum: f64 = out.policy.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}

#[test]
fn sequential_calls_from_one_caller_are_served_in_order() {
    let calls = Arc::new(AtomicUsize::new(0));
    let batch_sizes = Arc::new(Mutex::new(Vec::new()));
    let evaluator = ModelEvaluator::new(
        Box::new(CountingModel {
            calls: Arc::clone(&calls),
            batch_sizes: Arc::clone(&batch_sizes),
            delay: Duration::ZERO,
        }),
        EvaluatorOptions::default(),
    );

    for n in 1..=4 {
        let outputs = evaluator.inference(vec![obs(0.0); n]).unwrap();
        assert_eq!(outputs.len(), n);
    }
    // One caller, no overlap: one forward pass per call, sized per call.
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(*batch_sizes.lock().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn concurrent_callers_all_get_their_own_results() {
    let evaluator = Arc::new(ModelEvaluator::new(
        Box::new(UniformModel::default()),
        EvaluatorOptions::default(),
    ));

    let mut handles = Vec::new();
    for t in 0..8usize {
        let evaluator = Arc::clone(&evaluator);
        handles.push(thread::spawn(move || {
            for i in 0..20usize {
                let n = 1 + (t + i) % 3;
                let outputs = evaluator.inference(vec![obs(t as f32); n]).unwrap();
                assert_eq!(outputs.len(), n);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn queued_requests_can_coalesce_into_one_forward_pass() {
    let calls = Arc::new(AtomicUsize::new(0));
    let batch_sizes = Arc::new(Mutex::new(Vec::new()));
    // Slow model so concurrent requests pile up behind the first.
    let evaluator = Arc::new(ModelEvaluator::new(
        Box::new(CountingModel {
            calls: Arc::clone(&calls),
            batch_sizes: Arc::clone(&batch_sizes),
            delay: Duration::from_millis(100),
        }),
        EvaluatorOptions {
            queue_size: 32,
            max_batch: 32,
        },
    ));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let evaluator = Arc::clone(&evaluator);
        handles.push(thread::spawn(move || {
            evaluator.inference(vec![obs(0.0); 2]).unwrap().len()
        }));
    }
    for h in handles {
        assert_eq!(h.join().unwrap(), 2);
    }

    // Twelve observations total; the stragglers shared forward passes.
    let sizes = batch_sizes.lock().unwrap().clone();
    assert_eq!(sizes.iter().sum::<usize>(), 12);
    assert!(sizes.len() < 6 || sizes.iter().all(|&s| s == 2));
}

#[test]
fn shutdown_fails_pending_callers_with_closed() {
    let evaluator = Arc::new(ModelEvaluator::new(
        Box::new(CountingModel {
            calls: Arc::new(AtomicUsize::new(0)),
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::from_millis(400),
        }),
        EvaluatorOptions::default(),
    ));

    // First caller occupies the model; the second sits in the queue.
    let first = {
        let evaluator = Arc::clone(&evaluator);
        thread::spawn(move || evaluator.inference(vec![obs(0.0)]))
    };
    let second = {
        let evaluator = Arc::clone(&evaluator);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            evaluator.inference(vec![obs(1.0)])
        })
    };

    thread::sleep(Duration::from_millis(200));
    // Stops the runner and clears the queue, abandoning the second
    // caller's completion handle.
    evaluator.shutdown();

    assert!(first.join().unwrap().is_ok());
    assert!(matches!(
        second.join().unwrap(),
        Err(EvaluatorError::Closed)
    ));
    // And the evaluator refuses anything new.
    assert!(matches!(
        evaluator.inference(vec![obs(2.0)]),
        Err(EvaluatorError::Refused)
    ));
}
