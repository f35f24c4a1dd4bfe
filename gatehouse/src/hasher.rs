//! Bounded worker pool for Argon2id hashing and verification.
//!
//! Argon2id at the configured parameters costs tens of milliseconds of pure
//! CPU, so request handlers never run it inline. Instead they submit a job
//! to a fixed pool of OS threads through a bounded queue and suspend on a
//! oneshot reply channel. When the queue is full, `submit` fails immediately
//! with [`SubmitError::QueueFull`] so callers can shed load instead of
//! piling up.
//!
//! Every job that makes it into the queue receives exactly one reply: a
//! worker that dequeues a job always writes the result, even if the caller
//! has since dropped the receiving end.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use std::thread;
use tokio::sync::oneshot;

use crate::crypto::{self, CryptoError};

/// Errors returned by [`Dispatcher::submit`]
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The job queue is at capacity
    #[error("hasher job queue is full")]
    QueueFull,

    /// The dispatcher has been shut down
    #[error("hasher has been shut down")]
    Closed,
}

/// A unit of work for the pool. The job family is closed: workers match on
/// the variant and write to its typed reply sink.
#[derive(Debug)]
pub enum Job {
    /// Hash a plaintext password
    Hash {
        password: String,
        reply: oneshot::Sender<Result<String, CryptoError>>,
    },

    /// Verify a plaintext password against a stored hash
    Verify {
        password: String,
        stored_hash: String,
        reply: oneshot::Sender<Result<bool, CryptoError>>,
    },
}

impl Job {
    fn execute(self) {
        match self {
            Job::Hash { password, reply } => {
                let _ = reply.send(crypto::hash_password(&password));
            }
            Job::Verify {
                password,
                stored_hash,
                reply,
            } => {
                let _ = reply.send(crypto::verify_password(&password, &stored_hash));
            }
        }
    }
}

/// Fixed pool of hashing workers fed by a bounded queue.
///
/// Worker count defaults to the number of available cores and the queue
/// holds at most twice that many pending jobs.
pub struct Dispatcher {
    tx: Sender<Job>,
    rx: Receiver<Job>,
    worker_count: usize,
    workers: Vec<thread::JoinHandle<()>>,
}

impl Dispatcher {
    /// Create a dispatcher sized for this machine: one worker per core,
    /// queue capacity of twice the worker count. Workers are not running
    /// until [`start`](Self::start) is called.
    pub fn new() -> Self {
        let cores = thread::available_parallelism().map_or(1, |n| n.get());
        Self::with_workers(cores, 2 * cores)
    }

    /// Create a dispatcher with an explicit worker count and queue capacity.
    pub fn with_workers(worker_count: usize, queue_capacity: usize) -> Self {
        let (tx, rx) = bounded(queue_capacity);
        Self {
            tx,
            rx,
            worker_count,
            workers: Vec::new(),
        }
    }

    /// Launch the worker threads. Calling `start` on a running dispatcher
    /// is a no-op.
    pub fn start(&mut self) {
        if !self.workers.is_empty() {
            return;
        }
        tracing::debug!(workers = self.worker_count, "starting hash workers");
        for _ in 0..self.worker_count {
            let rx = self.rx.clone();
            self.workers.push(thread::spawn(move || {
                for job in rx.iter() {
                    job.execute();
                }
            }));
        }
    }

    /// Enqueue a job without blocking.
    ///
    /// # Errors
    ///
    /// * `SubmitError::QueueFull` - the queue is at capacity
    /// * `SubmitError::Closed` - the dispatcher has been shut down
    pub fn submit(&self, job: Job) -> Result<(), SubmitError> {
        self.tx.try_send(job).map_err(|err| match err {
            TrySendError::Full(_) => SubmitError::QueueFull,
            TrySendError::Disconnected(_) => SubmitError::Closed,
        })
    }

    /// Submit a hash job and return the receiver for its reply.
    pub fn hash(
        &self,
        password: String,
    ) -> Result<oneshot::Receiver<Result<String, CryptoError>>, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Job::Hash { password, reply })?;
        Ok(rx)
    }

    /// Submit a verify job and return the receiver for its reply.
    pub fn verify(
        &self,
        password: String,
        stored_hash: String,
    ) -> Result<oneshot::Receiver<Result<bool, CryptoError>>, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Job::Verify {
            password,
            stored_hash,
            reply,
        })?;
        Ok(rx)
    }

    /// Close the intake, drain every queued job, and join the workers.
    ///
    /// Returns only after each consumed job's reply sink has been written,
    /// so no successfully submitted job is ever lost.
    pub fn shutdown(self) {
        let Dispatcher {
            tx, rx, workers, ..
        } = self;
        drop(tx);
        drop(rx);
        for handle in workers {
            let _ = handle.join();
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify_through_pool() {
        let mut dispatcher = Dispatcher::with_workers(2, 4);
        dispatcher.start();

        let hash = dispatcher
            .hash("hunter22x".to_string())
            .unwrap()
            .await
            .unwrap()
            .unwrap();

        let matched = dispatcher
            .verify("hunter22x".to_string(), hash.clone())
            .unwrap()
            .await
            .unwrap()
            .unwrap();
        assert!(matched);

        let mismatched = dispatcher
            .verify("hunter22y".to_string(), hash)
            .unwrap()
            .await
            .unwrap()
            .unwrap();
        assert!(!mismatched);

        dispatcher.shutdown();
    }

    #[tokio::test]
    async fn test_queue_back_pressure() {
        // Workers not started: the queue fills to capacity, then rejects.
        let mut dispatcher = Dispatcher::with_workers(2, 4);

        let mut receivers = Vec::new();
        for _ in 0..4 {
            receivers.push(dispatcher.hash("pw".to_string()).unwrap());
        }

        assert_eq!(
            dispatcher.hash("overflow".to_string()).unwrap_err(),
            SubmitError::QueueFull
        );

        // Once workers start, every queued job still gets exactly one reply.
        dispatcher.start();
        for rx in receivers {
            let result = rx.await.expect("reply sink must be written");
            assert!(result.is_ok());
        }

        dispatcher.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_drains_in_flight_jobs() {
        let mut dispatcher = Dispatcher::with_workers(1, 8);
        dispatcher.start();

        let receivers: Vec<_> = (0..6)
            .map(|i| dispatcher.hash(format!("password-{i}")).unwrap())
            .collect();

        dispatcher.shutdown();

        for rx in receivers {
            let result = rx.await.expect("reply sink must be written");
            assert!(result.is_ok());
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_stall_worker() {
        let mut dispatcher = Dispatcher::with_workers(1, 4);
        dispatcher.start();

        // Caller abandons the reply; the worker writes unconditionally and
        // moves on to the next job.
        drop(dispatcher.hash("abandoned".to_string()).unwrap());

        let hash = dispatcher
            .hash("still served".to_string())
            .unwrap()
            .await
            .unwrap()
            .unwrap();
        assert!(hash.starts_with("$argon2id$"));

        dispatcher.shutdown();
    }

    #[test]
    fn test_submit_after_shutdown_not_possible_by_construction() {
        // shutdown consumes the dispatcher, so the closed-intake state is
        // unrepresentable from safe code; this test just pins the sizing.
        let dispatcher = Dispatcher::new();
        assert!(dispatcher.worker_count >= 1);
    }
}
