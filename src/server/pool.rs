use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use anyhow::{Context, anyhow};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of worker threads fed from an unbounded queue.
///
/// Each worker runs one job to completion before taking the next, so at most
/// `size` jobs run at once and the rest wait in the queue.
pub struct WorkerPool {
    workers: Vec<Worker>,
    // None once draining has started
    sender: Option<Sender<Job>>,
}

struct Worker {
    id: usize,
    thread: JoinHandle<()>,
}

impl WorkerPool {
    pub fn new(size: usize) -> anyhow::Result<Self> {
        if size == 0 {
            return Err(anyhow!("worker pool needs at least one thread"));
        }

        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| Worker::spawn(id, Arc::clone(&receiver)))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            workers,
            sender: Some(sender),
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job. Fails once the pool is draining.
    pub fn submit<F>(&self, job: F) -> anyhow::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| anyhow!("worker pool is shutting down"))?;

        sender
            .send(Box::new(job))
            .map_err(|_| anyhow!("all workers have exited"))
    }

    /// Stops accepting jobs, lets queued and running jobs finish, then joins
    /// every worker.
    pub fn drain_and_stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Closing the channel makes recv fail once the queue is empty
        drop(self.sender.take());

        for worker in self.workers.drain(..) {
            if worker.thread.join().is_err() {
                tracing::error!(worker = worker.id, "Worker thread panicked");
            } else {
                tracing::debug!(worker = worker.id, "Worker stopped");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Worker {
    fn spawn(id: usize, receiver: Arc<Mutex<Receiver<Job>>>) -> anyhow::Result<Self> {
        let thread = thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || {
                loop {
                    // The guard is a temporary, so the lock is released before the job runs
                    let message = match receiver.lock() {
                        Ok(rx) => rx.recv(),
                        Err(_) => break,
                    };

                    let Ok(job) = message else {
                        break;
                    };

                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!(worker = id, "Job panicked");
                    }
                }
            })
            .with_context(|| format!("Failed to spawn worker thread {}", id))?;

        Ok(Self { id, thread })
    }
}
