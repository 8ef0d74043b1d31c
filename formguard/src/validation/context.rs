//! Validation context: per-field passes and the form-wide invalid flag.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::thread;

use futures::future::join_all;
use log::{debug, warn};
use tokio::sync::mpsc;

use super::error::ValidationError;
use super::event::ValidationEvent;
use super::rule::{Rule, run_rule};
use crate::observable::{Observable, Subscription};

/// Identifier of a field registered with a [`ValidationContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(u64);

impl FieldId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field#{}", self.0)
    }
}

/// Committed validation outcome of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    /// Failure messages of the latest committed pass, in report order.
    pub errors: Vec<String>,
}

impl FieldState {
    /// Check if the latest committed pass failed.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

struct FieldEntry {
    rule: Option<Rule>,
    /// Sequence number of the most recently started pass.
    latest_pass: u64,
    errors: Vec<String>,
    state: Observable<FieldState>,
    _watch: Option<Subscription>,
}

/// A state change waiting to be published to listeners.
enum Notice {
    Field(Observable<FieldState>, FieldState),
    Invalid(bool),
}

/// Notices in commit order.
///
/// Listeners run with no context lock held, so they may call back into the
/// context. Only one caller delivers at a time; notices queued meanwhile,
/// including ones queued by listeners, are delivered by that caller in
/// order.
#[derive(Default)]
struct Outbox {
    queue: VecDeque<Notice>,
    /// Invalid flag as of the latest queued notice.
    invalid: bool,
    delivering: bool,
}

enum ChangeQueue {
    /// No driver yet; changes are dropped.
    Idle,
    Driven(mpsc::UnboundedSender<FieldId>),
    /// The driver went away.
    Stopped,
}

struct ContextInner {
    next_field: AtomicU64,
    fields: RwLock<BTreeMap<FieldId, FieldEntry>>,
    invalid: Observable<bool>,
    outbox: Mutex<Outbox>,
    changes: Mutex<ChangeQueue>,
}

impl ContextInner {
    fn lock_outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_changes(&self) -> MutexGuard<'_, ChangeQueue> {
        self.changes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn queue_change(&self, id: FieldId) {
        let mut changes = self.lock_changes();
        let stopped =
            matches!(&*changes, ChangeQueue::Driven(sender) if sender.send(id).is_err());
        if stopped {
            debug!("Validation change driver is gone, ignoring changes");
            *changes = ChangeQueue::Stopped;
        }
    }
}

/// Resets the delivery flag if a listener panics mid-delivery.
struct DeliveryGuard<'a>(&'a ContextInner);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.lock_outbox().delivering = false;
        }
    }
}

/// Queue the form-wide flag if the committed fields changed it.
fn queue_invalid(fields: &BTreeMap<FieldId, FieldEntry>, outbox: &mut Outbox) {
    let invalid = fields.values().any(|entry| !entry.errors.is_empty());
    if outbox.invalid != invalid {
        outbox.invalid = invalid;
        outbox.queue.push_back(Notice::Invalid(invalid));
    }
}

/// Runs validation passes for registered fields and tracks the form-wide
/// invalid flag.
///
/// The context is cheap to clone and is handed explicitly to every component
/// that takes part in validation.
///
/// # Example
///
/// ```ignore
/// let context = ValidationContext::new();
/// let name = Observable::new(String::new());
/// let field = context.register_watching(Some(required(&name)), &name);
///
/// if let Some(driver) = context.take_change_driver() {
///     tokio::spawn(driver.run());
/// }
/// context.validate().await?;
/// assert!(context.is_invalid());
/// ```
#[derive(Clone)]
pub struct ValidationContext {
    inner: Arc<ContextInner>,
}

impl ValidationContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                next_field: AtomicU64::new(1),
                fields: RwLock::new(BTreeMap::new()),
                invalid: Observable::new(false),
                outbox: Mutex::new(Outbox::default()),
                changes: Mutex::new(ChangeQueue::Idle),
            }),
        }
    }

    fn read_fields(&self) -> RwLockReadGuard<'_, BTreeMap<FieldId, FieldEntry>> {
        self.inner
            .fields
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_fields(&self) -> RwLockWriteGuard<'_, BTreeMap<FieldId, FieldEntry>> {
        self.inner
            .fields
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_id(&self) -> FieldId {
        FieldId(self.inner.next_field.fetch_add(1, Ordering::SeqCst))
    }

    fn insert(&self, id: FieldId, rule: Option<Rule>, watch: Option<Subscription>) -> FieldId {
        self.write_fields().insert(
            id,
            FieldEntry {
                rule,
                latest_pass: 0,
                errors: Vec::new(),
                state: Observable::new(FieldState::default()),
                _watch: watch,
            },
        );
        debug!("Registered {}", id);
        id
    }

    /// Register a field validated only by explicit passes.
    pub fn register(&self, rule: Option<Rule>) -> FieldId {
        let id = self.next_id();
        self.insert(id, rule, None)
    }

    /// Register a field that is revalidated whenever `value` changes.
    ///
    /// Changes are handed to the [`ChangeDriver`]. Changes made before a
    /// driver was taken, or after it stopped, are dropped; [`Form::mount`]
    /// starts the driver and then validates everything.
    ///
    /// [`Form::mount`]: crate::form::Form::mount
    pub fn register_watching<T>(&self, rule: Option<Rule>, value: &Observable<T>) -> FieldId
    where
        T: 'static,
    {
        let id = self.next_id();
        let context = Arc::downgrade(&self.inner);
        let subscription = value.subscribe(move |_| {
            if let Some(inner) = context.upgrade() {
                inner.queue_change(id);
            }
        });
        self.insert(id, rule, Some(subscription))
    }

    /// Remove a field. Returns `false` if it was not registered.
    ///
    /// A pass still running for the field is discarded when it settles.
    pub fn unregister(&self, id: FieldId) -> bool {
        let removed = {
            let mut fields = self.write_fields();
            let removed = fields.remove(&id);
            if removed.is_some() {
                queue_invalid(&fields, &mut self.inner.lock_outbox());
            }
            removed
        };

        let Some(_entry) = removed else {
            return false;
        };
        debug!("Unregistered {}", id);
        self.deliver();
        true
    }

    /// IDs of all registered fields, in registration order.
    pub fn field_ids(&self) -> Vec<FieldId> {
        self.read_fields().keys().copied().collect()
    }

    /// Committed state of a field.
    pub fn field(&self, id: FieldId) -> Option<FieldState> {
        self.read_fields()
            .get(&id)
            .map(|entry| FieldState {
                errors: entry.errors.clone(),
            })
    }

    /// Observable committed state of a field, for re-rendering on change.
    pub fn field_state(&self, id: FieldId) -> Option<Observable<FieldState>> {
        self.read_fields().get(&id).map(|entry| entry.state.clone())
    }

    /// Form-wide invalid flag: true when any field's committed state has
    /// errors.
    pub fn invalid(&self) -> Observable<bool> {
        self.inner.invalid.clone()
    }

    /// Current form-wide invalid flag, from the committed field states.
    ///
    /// Unlike [`invalid`](Self::invalid), this never lags behind a commit
    /// whose listeners are still being notified.
    pub fn is_invalid(&self) -> bool {
        self.read_fields()
            .values()
            .any(|entry| !entry.errors.is_empty())
    }

    /// Take the driver that turns watched value changes into passes.
    ///
    /// Returns `None` after the first call. The driver is the only receiver
    /// of changes; once it is dropped, changes are ignored.
    pub fn take_change_driver(&self) -> Option<ChangeDriver> {
        let mut changes = self.inner.lock_changes();
        if !matches!(*changes, ChangeQueue::Idle) {
            warn!("Validation change driver was already taken");
            return None;
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        *changes = ChangeQueue::Driven(sender);
        Some(ChangeDriver {
            context: Arc::downgrade(&self.inner),
            changes: receiver,
        })
    }

    /// Run one validation pass for one field.
    ///
    /// Resolves once every future registered by the field's rule has
    /// settled. Returns whether the field is valid, or
    /// [`ValidationError::Superseded`] if a newer pass for the same field
    /// started in the meantime; a superseded pass commits nothing.
    pub async fn validate_field(&self, id: FieldId) -> Result<bool, ValidationError> {
        let (pass, rule) = self.begin_pass(id)?;
        debug!("Validation pass {} started for {}", pass, id);

        let event = ValidationEvent::new();
        if let Some(rule) = rule {
            run_rule(&rule, &event);
        }
        let errors = event.settle().await;

        self.commit(id, pass, errors)
    }

    /// Run a pass for every registered field.
    ///
    /// Field passes run concurrently. Returns whether all fields are valid,
    /// or the first supersession error if any field pass was interrupted.
    pub async fn validate(&self) -> Result<bool, ValidationError> {
        let ids = self.field_ids();
        let results = join_all(ids.into_iter().map(|id| self.validate_field(id))).await;

        let mut valid = true;
        for result in results {
            match result {
                Ok(field_valid) => valid &= field_valid,
                Err(ValidationError::UnknownField(id)) => {
                    debug!("{} was removed during a form pass", id);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(valid)
    }

    fn begin_pass(&self, id: FieldId) -> Result<(u64, Option<Rule>), ValidationError> {
        let mut fields = self.write_fields();
        let entry = fields
            .get_mut(&id)
            .ok_or(ValidationError::UnknownField(id))?;
        entry.latest_pass += 1;
        Ok((entry.latest_pass, entry.rule.clone()))
    }

    fn commit(&self, id: FieldId, pass: u64, errors: Vec<String>) -> Result<bool, ValidationError> {
        let valid = errors.is_empty();
        let count = errors.len();

        {
            let mut fields = self.write_fields();
            let entry = fields
                .get_mut(&id)
                .ok_or(ValidationError::UnknownField(id))?;

            if entry.latest_pass != pass {
                debug!(
                    "Discarding pass {} for {}, pass {} is newer",
                    pass, id, entry.latest_pass
                );
                return Err(ValidationError::Superseded { field: id });
            }

            entry.errors = errors.clone();
            let state = entry.state.clone();

            // Queued under the fields lock so notices keep commit order.
            let mut outbox = self.inner.lock_outbox();
            outbox.queue.push_back(Notice::Field(state, FieldState { errors }));
            queue_invalid(&fields, &mut outbox);
        }

        debug!("Committed pass {} for {}: {} error(s)", pass, id, count);
        self.deliver();
        Ok(valid)
    }

    /// Publish queued notices, unless another caller is already doing so.
    fn deliver(&self) {
        {
            let mut outbox = self.inner.lock_outbox();
            if outbox.delivering {
                return;
            }
            outbox.delivering = true;
        }

        let _guard = DeliveryGuard(&self.inner);
        loop {
            let notice = {
                let mut outbox = self.inner.lock_outbox();
                match outbox.queue.pop_front() {
                    Some(notice) => notice,
                    None => {
                        outbox.delivering = false;
                        return;
                    }
                }
            };

            match notice {
                Notice::Field(state, value) => state.set(value),
                Notice::Invalid(invalid) => self.inner.invalid.set(invalid),
            }
        }
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.read_fields().len();
        let invalid = self.is_invalid();
        f.debug_struct("ValidationContext")
            .field("fields", &fields)
            .field("invalid", &invalid)
            .finish()
    }
}

/// Turns watched value changes into validation passes.
///
/// Obtained once from [`ValidationContext::take_change_driver`] and spawned
/// onto the runtime, which [`Form::mount`](crate::form::Form::mount) does.
/// Stops when the context is dropped.
pub struct ChangeDriver {
    context: Weak<ContextInner>,
    changes: mpsc::UnboundedReceiver<FieldId>,
}

impl ChangeDriver {
    /// Process changes until the context goes away.
    ///
    /// Changes queued together collapse into one pass per field. Each pass
    /// is spawned so a slow pass never delays newer ones.
    pub async fn run(mut self) {
        while let Some(first) = self.changes.recv().await {
            let mut ids = BTreeSet::from([first]);
            while let Ok(id) = self.changes.try_recv() {
                ids.insert(id);
            }

            let Some(inner) = self.context.upgrade() else {
                break;
            };
            let context = ValidationContext { inner };

            for id in ids {
                let context = context.clone();
                tokio::spawn(async move {
                    if let Err(err) = context.validate_field(id).await {
                        debug!("{}", err);
                    }
                });
            }
        }

        debug!("Validation change driver stopped");
    }
}
