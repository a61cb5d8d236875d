//! Shutdown signalling for a running engine.
//!
//! # Shape
//!
//! A `watch` channel carrying a single `bool`. Every waiter sees the latest value
//! (including one set before it started waiting), and late subscribers never
//! miss a trigger, which a `Notify` would not guarantee.
//!
//! The loop checks the signal at three points: before each poll, before each
//! message of a batch, and inside backoff sleeps. A processor call already in
//! flight is never cancelled; its outcome is committed or rewound as usual.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::EngineError;
use crate::observability::DeliveryCounts;

/// Sender side. Cloneable; any clone can stop the engine.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. The in-flight message finishes its attempt; polls and
    /// backoff waits return early.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side, held by the loop.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested. Pends forever if every handle is
    /// dropped without triggering.
    pub async fn triggered(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// A loop running on its own task.
pub struct RunningEngine {
    handle: ShutdownHandle,
    join: JoinHandle<Result<DeliveryCounts, EngineError>>,
}

impl RunningEngine {
    pub(crate) fn new(handle: ShutdownHandle, join: JoinHandle<Result<DeliveryCounts, EngineError>>) -> Self {
        Self { handle, join }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the loop to stop on its own (transport failure).
    pub async fn join(self) -> Result<DeliveryCounts, EngineError> {
        flatten(self.join.await)
    }

    pub async fn shutdown_and_join(self) -> Result<DeliveryCounts, EngineError> {
        self.handle.trigger();
        flatten(self.join.await)
    }
}

fn flatten(
    joined: Result<Result<DeliveryCounts, EngineError>, tokio::task::JoinError>,
) -> Result<DeliveryCounts, EngineError> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(EngineError::Aborted(e.to_string())),
    }
}
