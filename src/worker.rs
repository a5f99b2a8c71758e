//! Fixed-size worker pool with a FIFO job queue.
//!
//! Grounded on the original `thread_worker_t`, which wraps a GLib thread
//! pool; here the queue and wakeups are built directly on
//! `std::sync::{Mutex, Condvar}` rather than pulling in a thread-pool
//! crate, since the pool's shape (persistent workers, non-blocking
//! `submit`, draining `stop`) doesn't map onto a scoped-thread API like
//! the teacher's own `std::thread::scope`-based parallel path.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Job(Job),
    Shutdown,
}

struct Shared {
    queue: Mutex<VecDeque<Message>>,
    available: Condvar,
}

/// A fixed pool of `N` worker threads draining a shared FIFO queue.
pub struct WorkerPool {
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
}

#[derive(Debug)]
pub struct WorkerPoolError(std::io::Error);

impl fmt::Display for WorkerPoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to spawn worker thread: {}", self.0)
    }
}

impl std::error::Error for WorkerPoolError {}

impl WorkerPool {
    /// Spawn a pool sized to the number of logical CPUs.
    pub fn new() -> Result<Self, WorkerPoolError> {
        Self::with_threads(num_cpus::get().max(1))
    }

    /// Spawn a pool with exactly `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self, WorkerPoolError> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        });

        let mut handles = Vec::with_capacity(threads);
        for _ in 0..threads {
            let shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .spawn(move || worker_loop(shared))
                .map_err(WorkerPoolError)?;
            handles.push(handle);
        }

        #[cfg(feature = "logging")]
        log::trace!("worker pool started with {} threads", threads);

        Ok(Self { shared, handles })
    }

    /// Number of worker threads in the pool.
    pub fn thread_count(&self) -> usize {
        self.handles.len()
    }

    /// Enqueue a job. Non-blocking; multiple producers may call this
    /// concurrently.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut queue = self.shared.queue.lock().unwrap();
        queue.push_back(Message::Job(Box::new(job)));
        self.shared.available.notify_one();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let message = {
            let mut queue = shared.queue.lock().unwrap();
            loop {
                if let Some(message) = queue.pop_front() {
                    break message;
                }
                queue = shared.available.wait(queue).unwrap();
            }
        };

        match message {
            Message::Job(job) => job(),
            Message::Shutdown => break,
        }
    }
}

impl Drop for WorkerPool {
    /// Drain queued jobs, then join every worker.
    fn drop(&mut self) {
        {
            let mut queue = self.shared.queue.lock().unwrap();
            for _ in 0..self.handles.len() {
                queue.push_back(Message::Shutdown);
            }
            self.shared.available.notify_all();
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }

        #[cfg(feature = "logging")]
        log::trace!("worker pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semaphore::CountingSemaphore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn submitted_jobs_all_run() {
        let pool = WorkerPool::with_threads(4).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let sem = Arc::new(CountingSemaphore::new());

        for _ in 0..16 {
            let counter = Arc::clone(&counter);
            let sem = Arc::clone(&sem);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                sem.signal();
            });
        }

        sem.wait_for(16);
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn stop_drains_queued_jobs() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::with_threads(2).unwrap();
            for _ in 0..8 {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
            // Dropping the pool here blocks until queued jobs finish.
        }
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }
}
