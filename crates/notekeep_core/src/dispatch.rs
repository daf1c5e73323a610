//! Completion context for repository callbacks.
//!
//! # Responsibility
//! - Define where repository callbacks run ([`Dispatcher`]).
//! - Provide a queue-backed main loop that the owning thread drains.
//! - Provide a one-shot [`Completion`] handle for callers that want to wait.
//!
//! # Invariants
//! - A task handed to a [`MainLoopHandle`] only ever runs on the thread that
//!   drains the matching [`MainLoop`].
//! - Tasks run in the order they were dispatched.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::warn;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Unit of work posted to a completion context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Execution context that repository callbacks are delivered on.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, task: Task);
}

/// Task queue drained by its owning thread, standing in for a UI looper.
pub struct MainLoop {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

/// Cloneable dispatcher that posts into a [`MainLoop`].
#[derive(Clone)]
pub struct MainLoopHandle {
    sender: Sender<Task>,
}

impl MainLoop {
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self { sender, receiver }
    }

    /// Returns a dispatcher that posts onto this loop.
    pub fn handle(&self) -> Arc<dyn Dispatcher> {
        Arc::new(MainLoopHandle {
            sender: self.sender.clone(),
        })
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Runs every task already queued without waiting. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(task) => {
                    task();
                    ran += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return ran,
            }
        }
    }

    /// Waits up to `timeout` for one task and runs it.
    ///
    /// Returns `false` when nothing arrived in time.
    pub fn run_once(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => {
                task();
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Runs tasks until `done` reports true or `timeout` elapses.
    ///
    /// Returns the final value of `done`.
    pub fn run_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while !done() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return done();
            }
            self.run_once(remaining);
        }
        true
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for MainLoopHandle {
    fn dispatch(&self, task: Task) {
        if self.sender.send(task).is_err() {
            warn!("event=dispatch module=dispatch status=dropped reason=main_loop_gone");
        }
    }
}

/// Receiving side of a one-shot callback created by [`completion`].
pub struct Completion<T> {
    receiver: Receiver<T>,
}

/// Creates a callback and the handle that observes its invocation.
///
/// Pass the callback to a repository operation; the handle yields the value
/// once the callback has run on the main loop.
pub fn completion<T: Send + 'static>() -> (impl FnOnce(T) + Send + 'static, Completion<T>) {
    let (sender, receiver) = channel::bounded(1);
    let callback = move |value: T| {
        let _ = sender.send(value);
    };
    (callback, Completion { receiver })
}

impl<T> Completion<T> {
    /// Returns the delivered value, if the callback has already run.
    pub fn try_take(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Drains `main_loop` until the callback has run or `timeout` elapses.
    pub fn wait(&self, main_loop: &MainLoop, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = self.try_take() {
                return Some(value);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            main_loop.run_once(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{completion, MainLoop};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn tasks_run_on_draining_thread_in_dispatch_order() {
        let main_loop = MainLoop::new();
        let dispatcher = main_loop.handle();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let worker = {
            let seen = Arc::clone(&seen);
            thread::spawn(move || {
                for idx in 0..3 {
                    let seen = Arc::clone(&seen);
                    dispatcher.dispatch(Box::new(move || {
                        seen.lock().unwrap().push((idx, thread::current().id()));
                    }));
                }
            })
        };
        worker.join().unwrap();

        assert_eq!(main_loop.pending(), 3);
        assert_eq!(main_loop.run_pending(), 3);
        let seen = seen.lock().unwrap();
        let order: Vec<_> = seen.iter().map(|(idx, _)| *idx).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert!(seen.iter().all(|(_, id)| *id == thread::current().id()));
    }

    #[test]
    fn completion_is_empty_until_main_loop_runs() {
        let main_loop = MainLoop::new();
        let dispatcher = main_loop.handle();
        let (callback, done) = completion::<u32>();

        dispatcher.dispatch(Box::new(move || callback(7)));
        assert_eq!(done.try_take(), None);
        assert_eq!(done.wait(&main_loop, Duration::from_secs(1)), Some(7));
    }

    #[test]
    fn run_until_times_out_when_nothing_arrives() {
        let main_loop = MainLoop::new();
        let counter = AtomicUsize::new(0);
        let finished = main_loop.run_until(Duration::from_millis(20), || {
            counter.load(Ordering::SeqCst) > 0
        });
        assert!(!finished);
    }
}
