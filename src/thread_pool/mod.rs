// Worker pool, delayed tasks and the main-thread callback queue
pub mod main_queue;
pub mod scheduler;

pub use main_queue::MainThreadQueue;
pub use scheduler::{Scheduler, SchedulerStats};
