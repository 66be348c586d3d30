use crossbeam_channel::{unbounded, Receiver, Sender};

/// Callbacks that must run on the main thread.
///
/// Background tasks that want to mutate shared world state post a closure
/// here instead of touching it directly. The owner drains the queue once per
/// frame, passing itself as the context.
pub struct MainThreadQueue<C: ?Sized> {
    sender: Sender<Box<dyn FnOnce(&C) + Send + 'static>>,
    receiver: Receiver<Box<dyn FnOnce(&C) + Send + 'static>>,
}

impl<C: ?Sized> MainThreadQueue<C> {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn post<F>(&self, task: F)
    where
        F: FnOnce(&C) + Send + 'static,
    {
        // The receiver lives as long as self, so sending cannot fail
        let _ = self.sender.send(Box::new(task));
    }

    /// Run every task queued before this call.
    ///
    /// Tasks posted while draining wait for the next drain, so a task that
    /// reposts itself cannot starve the caller.
    pub fn drain(&self, context: &C) -> usize {
        let queued = self.receiver.len();
        let mut executed = 0;
        for _ in 0..queued {
            match self.receiver.try_recv() {
                Ok(task) => {
                    task(context);
                    executed += 1;
                }
                Err(_) => break,
            }
        }
        executed
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<C: ?Sized> Default for MainThreadQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_drain_runs_tasks_in_order() {
        let queue: MainThreadQueue<Vec<u32>> = MainThreadQueue::new();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for i in 0..3 {
            let seen = Arc::clone(&seen);
            queue.post(move |context: &Vec<u32>| seen.lock().push(context[i as usize]));
        }
        assert_eq!(queue.drain(&vec![7, 8, 9]), 3);
        assert_eq!(*seen.lock(), vec![7, 8, 9]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_tasks_posted_while_draining_wait() {
        let queue: Arc<MainThreadQueue<()>> = Arc::new(MainThreadQueue::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let inner_queue = Arc::clone(&queue);
        let inner_counter = Arc::clone(&counter);
        queue.post(move |_| {
            inner_counter.fetch_add(1, Ordering::SeqCst);
            let again = Arc::clone(&inner_counter);
            inner_queue.post(move |_| {
                again.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(queue.drain(&()), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(queue.drain(&()), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
