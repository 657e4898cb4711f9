//! Cooperative cancellation of blocking transformation calls.
//!
//! Every external call runs on a detached worker thread that reports back
//! over a channel. The caller waits in short slices and gives up as soon as
//! the [`CancelFlag`] is raised; the abandoned worker finishes on its own and
//! its result is dropped.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};

use log::{debug, warn};

use crate::transform::TransformError;

/// How often a waiting caller looks at the cancellation flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Cancellation shared between a run and its owner.
///
/// Cloning shares the same flag. Raising it stops a run before its next
/// external call and abandons the call currently in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The flag was raised before the call produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cancelled;

/// Run `call` on a worker thread, returning early if `cancel` is raised.
pub(crate) fn call_cancellable<F>(
    cancel: &CancelFlag,
    call: F,
) -> Result<Result<String, TransformError>, Cancelled>
where
    F: FnOnce() -> Result<String, TransformError> + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(Cancelled);
    }

    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("sketchscene-call".to_string())
        .spawn(move || {
            // The receiver is gone once the caller has given up.
            let _ = tx.send(call());
        });
    if let Err(err) = spawned {
        return Ok(Err(TransformError::Request(format!(
            "failed to start transformation worker: {err}"
        ))));
    }

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(result) => return Ok(result),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    debug!("Abandoning in-flight transformation call");
                    return Err(Cancelled);
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                warn!("Transformation worker exited without a result");
                return Ok(Err(TransformError::Request(
                    "transformation worker panicked".to_string(),
                )));
            }
        }
    }
}
