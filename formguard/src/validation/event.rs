//! Per-pass validation event.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::join_all;
use log::error;

use super::error::panic_failure;
use super::rule::BoxFuture;

#[derive(Default)]
struct EventInner {
    errors: Vec<String>,
    pending: bool,
    futures: Vec<BoxFuture<'static, ()>>,
}

/// Collects the outcome of one validation pass for one field.
///
/// Rules report into the event: [`fail`](Self::fail) appends a message,
/// [`pending`](Self::pending) registers asynchronous work. The handle is
/// cheap to clone so an async rule can keep a copy and fail later, from
/// inside its future.
#[derive(Clone, Default)]
pub struct ValidationEvent {
    inner: Arc<Mutex<EventInner>>,
}

impl ValidationEvent {
    /// Create an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, EventInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a failure message.
    pub fn fail(&self, message: impl Into<String>) {
        self.lock().errors.push(message.into());
    }

    /// Register asynchronous work.
    ///
    /// The pass does not settle until `future` completes. Returns
    /// immediately.
    pub fn pending<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut inner = self.lock();
        inner.pending = true;
        inner.futures.push(Box::pin(future));
    }

    /// True once any rule has registered asynchronous work.
    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    /// Failure messages recorded so far, in order.
    pub fn errors(&self) -> Vec<String> {
        self.lock().errors.clone()
    }

    /// True when no failure has been recorded so far.
    pub fn is_valid(&self) -> bool {
        self.lock().errors.is_empty()
    }

    fn take_futures(&self) -> Vec<BoxFuture<'static, ()>> {
        std::mem::take(&mut self.lock().futures)
    }

    /// Wait for every registered future and return the final failures.
    ///
    /// Futures registered while settling are awaited too. A future that
    /// panics is recorded as a failure.
    pub async fn settle(&self) -> Vec<String> {
        loop {
            let futures = self.take_futures();
            if futures.is_empty() {
                break;
            }

            let results = join_all(
                futures
                    .into_iter()
                    .map(|future| AssertUnwindSafe(future).catch_unwind()),
            )
            .await;

            for result in results {
                if let Err(panic) = result {
                    let message = panic_failure(panic.as_ref());
                    error!("{}", message);
                    self.fail(message);
                }
            }
        }

        self.errors()
    }
}

impl fmt::Debug for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("ValidationEvent")
            .field("errors", &inner.errors)
            .field("pending", &inner.pending)
            .field("outstanding", &inner.futures.len())
            .finish()
    }
}
