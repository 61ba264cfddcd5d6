use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Stop,
}

/// A serial queue backed by one worker thread. Jobs run one at a time in
/// the order they were dispatched.
pub struct DispatchQueue {
    handle: QueueHandle,
    worker: Option<JoinHandle<()>>,
    label: String,
}

/// Cloneable, thread-safe handle for enqueueing onto a [`DispatchQueue`].
#[derive(Clone)]
pub struct QueueHandle {
    sender: Sender<Message>,
}

impl QueueHandle {
    /// Returns false once the queue has shut down; the job is dropped.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender.send(Message::Run(Box::new(job))).is_ok()
    }
}

impl DispatchQueue {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let (tx, rx): (Sender<Message>, Receiver<Message>) = mpsc::channel();

        let worker = thread::Builder::new()
            .name(label.clone())
            .spawn(move || run_worker(rx));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                // The receiver went down with the closure, so every
                // dispatch now reports failure.
                error!("Failed to spawn dispatch queue thread: {e}");
                None
            }
        };

        Self {
            handle: QueueHandle { sender: tx },
            worker,
            label,
        }
    }

    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }

    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.dispatch(job)
    }

    /// Blocks until every job dispatched before this call has run.
    pub fn sync(&self) {
        if self.is_current() {
            return;
        }

        let (done_tx, done_rx) = mpsc::channel();
        if self.dispatch(move || {
            let _ = done_tx.send(());
        }) {
            let _ = done_rx.recv();
        }
    }

    fn is_current(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| w.thread().id() == thread::current().id())
    }
}

impl Drop for DispatchQueue {
    fn drop(&mut self) {
        // Handles may outlive the queue, so stop explicitly instead of
        // waiting for every sender to go away. Earlier jobs still run.
        let _ = self.handle.sender.send(Message::Stop);

        if self.is_current() {
            return;
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Dispatch queue '{}' worker panicked", self.label);
            }
        }
    }
}

fn run_worker(rx: Receiver<Message>) {
    while let Ok(message) = rx.recv() {
        match message {
            Message::Run(job) => job(),
            Message::Stop => break,
        }
    }
    debug!("Dispatch queue stopped");
}
