//! Worker pool that dispatches jobs from an input queue and reassembles
//! results in submission order.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::thread;

use sng_infer::ThreadedQueue;

struct JobInput<I> {
    input: I,
    id: usize,
}

struct JobOutput<O> {
    output: O,
    id: usize,
}

/// Fixed-size pool of OS threads. Each `run` call processes one job set;
/// worker threads live for the duration of the call.
pub struct ThreadPool {
    num_threads: usize,
}

impl ThreadPool {
    pub fn new(num_threads: usize) -> Self {
        assert!(num_threads > 0, "pool needs at least one thread");
        Self { num_threads }
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Run `func` over `inputs` on the pool.
    ///
    /// Ordering guarantee: `result[i]` is `func(inputs[i])` regardless of
    /// how jobs were scheduled across threads.
    pub fn run<I, O, F>(&self, func: F, inputs: Vec<I>) -> Vec<O>
    where
        I: Send,
        O: Send,
        F: Fn(I) -> O + Sync,
    {
        let bound = usize::from(u16::MAX);
        let queue_input: ThreadedQueue<JobInput<I>> = ThreadedQueue::new(bound);
        let queue_output: ThreadedQueue<JobOutput<O>> = ThreadedQueue::new(bound);

        for (id, input) in inputs.into_iter().enumerate() {
            queue_input.push(JobInput { input, id });
        }

        // Guards the is-empty check and the pop as one step, so workers
        // never block on an empty input queue.
        let input_gate = Mutex::new(());

        thread::scope(|scope| {
            for _ in 0..self.num_threads {
                scope.spawn(|| loop {
                    let job = {
                        let _gate = input_gate.lock().unwrap();
                        if queue_input.is_empty() {
                            break;
                        }
                        queue_input.pop()
                    };
                    let Some(job) = job else { break };
                    let output = func(job.input);
                    queue_output.push(JobOutput {
                        output,
                        id: job.id,
                    });
                });
            }
        });

        let mut by_id = BTreeMap::new();
        while let Some(result) = queue_output.try_pop() {
            by_id.insert(result.id, result.output);
        }
        by_id.into_values().collect()
    }
}
