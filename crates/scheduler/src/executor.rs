use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, error, warn};

use crate::RuntimeError;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where provider calls run. The apply context never blocks on a job.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

/// Fixed set of worker threads draining a shared job queue.
///
/// Dropping the pool closes the queue; workers finish the job they hold and exit
/// without being joined, so a slow provider call never stalls shutdown.
pub struct WorkerPool {
    jobs: Option<Sender<Job>>,
    workers: usize,
}

impl WorkerPool {
    pub fn spawn(workers: usize) -> Result<Self, RuntimeError> {
        let workers = workers.max(1);
        let (jobs_tx, jobs_rx) = unbounded::<Job>();
        for index in 0..workers {
            let rx = jobs_rx.clone();
            let name = format!("spritecycle-worker-{index}");
            thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_loop(rx))
                .map_err(|source| RuntimeError::Spawn { name, source })?;
        }
        debug!(workers, "worker pool started");
        Ok(Self {
            jobs: Some(jobs_tx),
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Executor for WorkerPool {
    fn execute(&self, job: Job) {
        match &self.jobs {
            Some(jobs) => {
                if jobs.send(job).is_err() {
                    warn!("worker pool queue closed; dropping job");
                }
            }
            None => warn!("worker pool shut down; dropping job"),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.jobs.take();
    }
}

fn worker_loop(jobs: Receiver<Job>) {
    while let Ok(job) = jobs.recv() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!("worker job panicked; continuing with next job");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn runs_jobs_on_workers() {
        let pool = WorkerPool::spawn(2).unwrap();
        let (tx, rx) = unbounded();
        for value in 0..4 {
            let tx = tx.clone();
            pool.execute(Box::new(move || {
                tx.send(value).unwrap();
            }));
        }
        let mut seen: Vec<i32> = (0..4)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn survives_panicking_job() {
        let pool = WorkerPool::spawn(1).unwrap();
        let (tx, rx) = unbounded();
        pool.execute(Box::new(|| panic!("provider blew up")));
        pool.execute(Box::new(move || {
            tx.send("still alive").unwrap();
        }));
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            "still alive"
        );
    }

    #[test]
    fn zero_workers_is_clamped() {
        let pool = WorkerPool::spawn(0).unwrap();
        assert_eq!(pool.workers(), 1);
    }
}
