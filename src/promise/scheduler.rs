use std::{
    collections::VecDeque,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex},
};

use tokio::runtime::Handle;
use tracing::error;

use crate::subscription::subscribe::lock;

pub(super) type Job = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Queue {
    jobs: VecDeque<Job>,
    draining: bool,
}

/// Runs deferred continuations one after another, on the Tokio runtime that was
/// current when the promise was created, or on a helper OS thread when there
/// was none.
///
/// Every job goes through a single FIFO queue with at most one drain running,
/// so jobs deferred by separate calls still run in the order they were
/// deferred and never in parallel.
pub(super) struct Scheduler {
    runtime: Option<Handle>,
    queue: Arc<Mutex<Queue>>,
}

impl Scheduler {
    pub(super) fn current() -> Self {
        Scheduler {
            runtime: Handle::try_current().ok(),
            queue: Arc::default(),
        }
    }

    /// Appends `jobs` to the queue, never running them inside the calling
    /// stack. On Tokio every job gets its own turn.
    pub(super) fn defer(&self, jobs: impl IntoIterator<Item = Job>) {
        let mut queue = lock(&self.queue);
        queue.jobs.extend(jobs);
        if queue.draining || queue.jobs.is_empty() {
            return;
        }
        queue.draining = true;
        drop(queue);

        let pending = Arc::clone(&self.queue);
        match &self.runtime {
            Some(handle) => {
                handle.spawn(async move {
                    loop {
                        tokio::task::yield_now().await;
                        match next_job(&pending) {
                            Some(job) => run(job),
                            None => break,
                        }
                    }
                });
            }
            None => {
                let spawned = std::thread::Builder::new()
                    .name("lazyrx-deferred".into())
                    .spawn(move || {
                        while let Some(job) = next_job(&pending) {
                            run(job);
                        }
                    });
                if let Err(e) = spawned {
                    lock(&self.queue).draining = false;
                    error!(error = %e, "failed to spawn thread for promise continuations");
                }
            }
        }
    }
}

// Clears `draining` under the same lock that saw the queue empty, so a job
// deferred right after always finds either a running drain or none.
fn next_job(queue: &Mutex<Queue>) -> Option<Job> {
    let mut queue = lock(queue);
    let job = queue.jobs.pop_front();
    if job.is_none() {
        queue.draining = false;
    }
    job
}

fn run(job: Job) {
    if catch_unwind(AssertUnwindSafe(job)).is_err() {
        error!("promise continuation panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_job(log: &Arc<Mutex<Vec<u8>>>, n: u8) -> Job {
        let log = Arc::clone(log);
        Box::new(move || log.lock().unwrap().push(n))
    }

    #[tokio::test]
    async fn jobs_run_later_and_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scheduler = Scheduler::current();
        assert!(scheduler.runtime.is_some());

        scheduler.defer(vec![push_job(&log, 1), push_job(&log, 2), push_job(&log, 3)]);
        assert!(log.lock().unwrap().is_empty());

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn separate_defers_keep_their_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scheduler = Scheduler::current();
        let (tx, rx) = tokio::sync::oneshot::channel();

        scheduler.defer(vec![push_job(&log, 1), push_job(&log, 2)]);
        for n in 3..=20 {
            scheduler.defer([push_job(&log, n)]);
        }
        scheduler.defer([Box::new(move || {
            let _ = tx.send(());
        }) as Job]);
        rx.await.unwrap();

        assert_eq!(*log.lock().unwrap(), (1..=20).collect::<Vec<u8>>());
    }

    #[tokio::test]
    async fn panicking_job_does_not_stop_queue() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scheduler = Scheduler::current();

        scheduler.defer(vec![Box::new(|| panic!("boom")) as Job, push_job(&log, 2)]);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(*log.lock().unwrap(), vec![2]);
    }

    #[test]
    fn falls_back_to_thread_outside_runtime() {
        let scheduler = Scheduler::current();
        assert!(scheduler.runtime.is_none());

        let log = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = std::sync::mpsc::channel();
        scheduler.defer([push_job(&log, 1)]);
        scheduler.defer([push_job(&log, 2)]);
        scheduler.defer([Box::new(move || tx.send(()).unwrap()) as Job]);

        rx.recv().unwrap();
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }
}
