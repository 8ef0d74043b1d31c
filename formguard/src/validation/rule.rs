//! Rule type and rule execution.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;

use log::error;

use super::error::panic_failure;
use super::event::ValidationEvent;

/// Type alias for boxed futures used in async validation.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A validation rule.
///
/// A rule inspects one or more values and reports into the event. Calling
/// nothing means the rule passed.
pub type Rule = Arc<dyn Fn(&ValidationEvent) + Send + Sync>;

/// Build a [`Rule`] from a closure.
///
/// # Example
///
/// ```ignore
/// let agree = Observable::new(false);
/// let terms = rule({
///     let agree = agree.clone();
///     move |event| {
///         let agree = agree.clone();
///         let event_handle = event.clone();
///         event.pending(async move {
///             tokio::time::sleep(Duration::from_millis(100)).await;
///             if !agree.get() {
///                 event_handle.fail("You must agree to the terms of service");
///             }
///         });
///     }
/// });
/// ```
pub fn rule<F>(f: F) -> Rule
where
    F: Fn(&ValidationEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Run a rule against an event, recording a panic as a failure.
pub(crate) fn run_rule(rule: &Rule, event: &ValidationEvent) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| rule(event))) {
        let message = panic_failure(panic.as_ref());
        error!("{}", message);
        event.fail(message);
    }
}
