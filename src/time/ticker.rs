//! Fixed-rate simulation clock

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::constants::time::MAX_TICK_LAG;
use crate::error::{EngineError, EngineResult};

/// Drives the world at a fixed number of ticks per second on its own thread.
///
/// Ticks run one after another on that thread, so tick `k + 1` never starts
/// before the callback for tick `k` has returned. A ticker that was never
/// started can be driven by hand with [`Ticker::advance`].
pub struct Ticker {
    ticks_per_second: u32,
    tick_id: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    pub fn new(ticks_per_second: u32) -> Self {
        Self {
            ticks_per_second: ticks_per_second.max(1),
            tick_id: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn tick_id(&self) -> u64 {
        self.tick_id.load(Ordering::Acquire)
    }

    pub fn tps(&self) -> u32 {
        self.ticks_per_second
    }

    pub fn seconds_to_ticks(&self, seconds: f32) -> u64 {
        (seconds * self.ticks_per_second as f32).round().max(0.0) as u64
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.ticks_per_second as f64)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Move the clock forward by hand, returning the new tick id
    pub fn advance(&self, ticks: u64) -> u64 {
        self.tick_id.fetch_add(ticks, Ordering::AcqRel) + ticks
    }

    /// Start ticking. `on_tick` runs once per tick after the tick id has been
    /// incremented and stops the ticker by returning false.
    pub fn start<F>(&self, mut on_tick: F) -> EngineResult<()>
    where
        F: FnMut(u64) -> bool + Send + 'static,
    {
        let mut handle = self.handle.lock();
        if self.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let tick_id = Arc::clone(&self.tick_id);
        let running = Arc::clone(&self.running);
        let frame = self.tick_duration();
        let tps = self.ticks_per_second;

        let spawned = std::thread::Builder::new()
            .name("flatland-ticker".to_string())
            .spawn(move || {
                log::info!("[Ticker] Started at {} ticks per second", tps);
                let mut next = Instant::now();
                while running.load(Ordering::Acquire) {
                    next += frame;
                    let tick = tick_id.fetch_add(1, Ordering::AcqRel) + 1;
                    if !on_tick(tick) {
                        running.store(false, Ordering::Release);
                        break;
                    }

                    let now = Instant::now();
                    if next > now {
                        std::thread::sleep(next - now);
                    } else if now - next > frame * MAX_TICK_LAG {
                        log::warn!(
                            "[Ticker] Tick {} is {:?} behind schedule, skipping ahead",
                            tick,
                            now - next
                        );
                        next = now;
                    }
                }
                log::info!("[Ticker] Stopped at tick {}", tick_id.load(Ordering::Acquire));
            });

        match spawned {
            Ok(join_handle) => {
                *handle = Some(join_handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(EngineError::system("ticker", e))
            }
        }
    }

    /// Stop ticking and wait for the current tick to finish. Idempotent.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            // Stopping from inside a tick callback cannot wait for itself
            if handle.thread().id() == std::thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                log::error!("[Ticker::stop] Ticker thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
