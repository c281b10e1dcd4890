//! The inference evaluator: owns the model, serializes access to it
//! through a bounded request queue, and fans predictions back to
//! callers via per-request completion handles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use thiserror::Error;

use crate::model::{InferenceOutput, Observation, TwoHeadedModel};
use crate::queue::ThreadedQueue;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluatorError {
    /// The evaluator shut down before (or while) serving the request.
    #[error("evaluator closed")]
    Closed,
    /// The request queue is refusing new values.
    #[error("inference queue refused the request")]
    Refused,
}

/// Cooperative stop flag for the inference thread.
#[derive(Debug, Default)]
pub struct StopToken {
    flag: AtomicBool,
}

impl StopToken {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EvaluatorOptions {
    /// Request-queue bound; roughly `4 * search_threads` keeps workers
    /// from outrunning the model.
    pub queue_size: usize,
    /// Coalesce queued requests up to this many observations before one
    /// forward pass.
    pub max_batch: usize,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            queue_size: 32,
            max_batch: 32,
        }
    }
}

struct QueueItem {
    inputs: Vec<Observation>,
    reply: mpsc::Sender<Vec<InferenceOutput>>,
}

/// Handles threaded queries for the model. Safe to share across search
/// workers; the queue is the synchronization point.
pub struct ModelEvaluator {
    queue: Arc<ThreadedQueue<QueueItem>>,
    stop: Arc<StopToken>,
    inference_thread: Option<JoinHandle<()>>,
}

impl ModelEvaluator {
    pub fn new(model: Box<dyn TwoHeadedModel>, options: EvaluatorOptions) -> Self {
        let queue = Arc::new(ThreadedQueue::new(options.queue_size));
        let stop = Arc::new(StopToken::default());
        let runner_queue = Arc::clone(&queue);
        let runner_stop = Arc::clone(&stop);
        let inference_thread = thread::Builder::new()
            .name("sng-inference".into())
            .spawn(move || inference_runner(model, runner_queue, runner_stop, options.max_batch))
            .expect("spawn inference thread");
        Self {
            queue,
            stop,
            inference_thread: Some(inference_thread),
        }
    }

    /// Run the model on a group of observations. Blocks on this
    /// request's completion handle; requests from other callers may be
    /// batched into the same forward pass.
    pub fn inference(
        &self,
        inputs: Vec<Observation>,
    ) -> Result<Vec<InferenceOutput>, EvaluatorError> {
        let (reply, completion) = mpsc::channel();
        if !self.queue.push(QueueItem { inputs, reply }) {
            return Err(EvaluatorError::Refused);
        }
        completion.recv().map_err(|_| EvaluatorError::Closed)
    }

    /// Refuse new work and drop whatever is still queued; pending
    /// callers observe `Closed`, the runner drains and exits.
    /// Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        self.stop.stop();
        self.queue.block_new_values();
        self.queue.clear();
    }
}

impl Drop for ModelEvaluator {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.inference_thread.take() {
            let _ = handle.join();
        }
    }
}

fn inference_runner(
    model: Box<dyn TwoHeadedModel>,
    queue: Arc<ThreadedQueue<QueueItem>>,
    stop: Arc<StopToken>,
    max_batch: usize,
) {
    while !stop.stop_requested() {
        let Some(first) = queue.pop() else {
            continue;
        };

        // Coalesce whatever other callers already queued, bounded by the
        // batch size, so concurrent searches share one forward pass.
        let mut items = vec![first];
        let mut total = items[0].inputs.len();
        while total < max_batch {
            match queue.try_pop() {
                Some(item) => {
                    total += item.inputs.len();
                    items.push(item);
                }
                None => break,
            }
        }

        if items.len() == 1 {
            let item = items.pop().unwrap();
            let outputs = model.inference(&item.inputs);
            let _ = item.reply.send(outputs);
        } else {
            let batch: Vec<Observation> = items
                .iter()
                .flat_map(|item| item.inputs.iter().cloned())
                .collect();
            let mut outputs = model.inference(&batch).into_iter();
            for item in items {
                let n = item.inputs.len();
                let slice: Vec<InferenceOutput> = outputs.by_ref().take(n).collect();
                let _ = item.reply.send(slice);
            }
        }
    }
}
