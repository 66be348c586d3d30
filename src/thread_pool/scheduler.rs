//! Background task scheduler
//!
//! Runs expensive non-physics work (explosion search, collision mesh
//! computation, deferred reloads) on a rayon pool. Delayed tasks wait on a
//! dedicated timer thread and are handed to the pool once due.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{EngineError, EngineResult};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Lock-free counters for scheduled work
#[derive(Debug, Default)]
pub struct SchedulerCounters {
    pub tasks_submitted: AtomicU64,
    pub tasks_completed: AtomicU64,
    pub tasks_delayed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub tasks_submitted: u64,
    pub tasks_completed: u64,
    pub tasks_delayed: u64,
}

struct DelayedTask {
    due: Instant,
    sequence: u64,
    task: Task,
}

impl PartialEq for DelayedTask {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.sequence == other.sequence
    }
}

impl Eq for DelayedTask {}

impl PartialOrd for DelayedTask {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedTask {
    // Reversed so the max-heap yields the earliest deadline first
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

pub struct Scheduler {
    pool: Arc<ThreadPool>,
    timer: Sender<DelayedTask>,
    timer_thread: Option<JoinHandle<()>>,
    counters: Arc<SchedulerCounters>,
    sequence: AtomicU64,
}

impl Scheduler {
    pub fn new(worker_threads: usize) -> EngineResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_threads.max(1))
            .thread_name(|idx| format!("flatland-worker-{}", idx))
            .panic_handler(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                log::error!("[Scheduler] Worker task panicked: {}", message);
            })
            .build()
            .map_err(|e| EngineError::system("scheduler", e))?;
        let pool = Arc::new(pool);
        let counters = Arc::new(SchedulerCounters::default());

        let (timer, receiver) = unbounded::<DelayedTask>();
        let timer_pool = Arc::clone(&pool);
        let timer_counters = Arc::clone(&counters);
        let timer_thread = std::thread::Builder::new()
            .name("flatland-timer".to_string())
            .spawn(move || {
                let mut pending: BinaryHeap<DelayedTask> = BinaryHeap::new();
                loop {
                    let received = match pending.peek() {
                        Some(next) => {
                            receiver.recv_timeout(next.due.saturating_duration_since(Instant::now()))
                        }
                        None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
                    };
                    match received {
                        Ok(task) => pending.push(task),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let now = Instant::now();
                    while pending.peek().map_or(false, |next| next.due <= now) {
                        if let Some(due) = pending.pop() {
                            spawn_counted(&timer_pool, &timer_counters, due.task);
                        }
                    }
                }
                log::debug!(
                    "[Scheduler] Timer thread stopped with {} delayed tasks dropped",
                    pending.len()
                );
            })
            .map_err(|e| EngineError::system("scheduler timer", e))?;

        log::info!("[Scheduler::new] Started {} worker threads", pool.current_num_threads());

        Ok(Self {
            pool,
            timer,
            timer_thread: Some(timer_thread),
            counters,
            sequence: AtomicU64::new(0),
        })
    }

    /// Run a task on the worker pool
    pub fn execute<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        spawn_counted(&self.pool, &self.counters, Box::new(task));
    }

    /// Run a task on the worker pool once `delay` has elapsed
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.counters.tasks_delayed.fetch_add(1, Ordering::Relaxed);
        let delayed = DelayedTask {
            due: Instant::now() + delay,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            task: Box::new(task),
        };
        if self.timer.send(delayed).is_err() {
            log::warn!("[Scheduler::schedule] Timer thread is gone, dropping delayed task");
        }
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            tasks_submitted: self.counters.tasks_submitted.load(Ordering::Relaxed),
            tasks_completed: self.counters.tasks_completed.load(Ordering::Relaxed),
            tasks_delayed: self.counters.tasks_delayed.load(Ordering::Relaxed),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Replacing the sender disconnects the timer thread's receiver
        let (disconnected, _) = unbounded();
        drop(std::mem::replace(&mut self.timer, disconnected));
        if let Some(handle) = self.timer_thread.take() {
            if handle.thread().id() != std::thread::current().id() && handle.join().is_err() {
                log::error!("[Scheduler] Timer thread panicked");
            }
        }
    }
}

fn spawn_counted(pool: &ThreadPool, counters: &Arc<SchedulerCounters>, task: Task) {
    counters.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    let counters = Arc::clone(counters);
    pool.spawn(move || {
        task();
        counters.tasks_completed.fetch_add(1, Ordering::Relaxed);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_execute_runs_task() {
        let scheduler = Scheduler::new(2).expect("Failed to create scheduler for test");
        let (tx, rx) = bounded(1);
        scheduler.execute(move || {
            tx.send(1 + 1).expect("receiver alive");
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(2));
        assert_eq!(scheduler.stats().tasks_submitted, 1);
    }

    #[test]
    fn test_delayed_tasks_run_in_deadline_order() {
        let scheduler = Scheduler::new(1).expect("Failed to create scheduler for test");
        let (tx, rx) = unbounded();
        let started = Instant::now();

        let late = tx.clone();
        scheduler.schedule(Duration::from_millis(80), move || {
            late.send("late").expect("receiver alive");
        });
        scheduler.schedule(Duration::from_millis(20), move || {
            tx.send("early").expect("receiver alive");
        });

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok("early"));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok("late"));
        assert!(started.elapsed() >= Duration::from_millis(80));
        assert_eq!(scheduler.stats().tasks_delayed, 2);
    }

    #[test]
    fn test_panicking_task_does_not_kill_pool() {
        let scheduler = Scheduler::new(1).expect("Failed to create scheduler for test");
        scheduler.execute(|| panic!("boom"));
        let (tx, rx) = bounded(1);
        scheduler.execute(move || {
            tx.send(()).expect("receiver alive");
        });
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
