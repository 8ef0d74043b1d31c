//! Observable values with change notification.
//!
//! [`Observable<T>`] is a shared value container. Every clone points at the
//! same value, and every `set` synchronously notifies the registered
//! listeners in registration order. [`ValueSource<T>`] lets callers pass
//! either a plain value or an observable, and [`get_value`] resolves both the
//! same way.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use chrono::NaiveDate;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ListenerEntry<T> {
    id: u64,
    listener: Listener<T>,
}

struct Listeners<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<ListenerEntry<T>>>,
}

impl<T> Listeners<T> {
    fn remove(&self, id: u64) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.retain(|entry| entry.id != id);
    }
}

/// Reactive value container.
///
/// Cheap to clone; clones share the value and the listener list. Uses
/// `Arc<RwLock<T>>` internally so it can be moved into async tasks.
///
/// # Example
///
/// ```ignore
/// let name = Observable::new(String::from("DakotaEmber"));
/// let _subscription = name.subscribe(|value| log::debug!("name = {value}"));
/// name.set("Ember".to_string());
/// ```
pub struct Observable<T> {
    inner: Arc<RwLock<T>>,
    listeners: Arc<Listeners<T>>,
}

impl<T> Observable<T> {
    /// Create a new observable holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
            listeners: Arc::new(Listeners {
                next_id: AtomicU64::new(0),
                entries: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Replace the value and notify listeners.
    pub fn set(&self, value: T)
    where
        T: Clone,
    {
        let snapshot = {
            let mut guard = self
                .inner
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = value;
            guard.clone()
        };
        self.notify(&snapshot);
    }

    /// Mutate the value in place and notify listeners.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
        T: Clone,
    {
        let snapshot = {
            let mut guard = self
                .inner
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&mut guard);
            guard.clone()
        };
        self.notify(&snapshot);
    }

    /// Register a listener called after every change.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
        T: 'static,
    {
        let id = self.listeners.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ListenerEntry {
                id,
                listener: Arc::new(listener),
            });

        let listeners: Weak<Listeners<T>> = Arc::downgrade(&self.listeners);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(listeners) = listeners.upgrade() {
                    listeners.remove(id);
                }
            })),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn notify(&self, snapshot: &T) {
        // Listeners run without any lock held so they may read or set the
        // value again.
        let listeners: Vec<Listener<T>> = self
            .listeners
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|entry| Arc::clone(&entry.listener))
            .collect();

        for listener in &listeners {
            listener(snapshot);
        }
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Observable");
        match self.inner.read() {
            Ok(guard) => out.field("value", &*guard),
            Err(_) => out.field("value", &"<poisoned>"),
        };
        out.finish_non_exhaustive()
    }
}

/// Handle returned by [`Observable::subscribe`].
///
/// Dropping it removes the listener.
#[must_use = "dropping a Subscription immediately removes the listener"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.remove_listener();
    }

    fn remove_listener(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove_listener();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

/// A value that is either supplied directly or read from an [`Observable`].
#[derive(Debug, Clone)]
pub enum ValueSource<T> {
    /// A plain value.
    Value(T),
    /// A value read from an observable at resolution time.
    Observable(Observable<T>),
}

impl<T: Clone> ValueSource<T> {
    /// Resolve to the current value.
    pub fn get(&self) -> T {
        match self {
            Self::Value(value) => value.clone(),
            Self::Observable(observable) => observable.get(),
        }
    }

    /// The backing observable, if any.
    pub fn as_observable(&self) -> Option<&Observable<T>> {
        match self {
            Self::Value(_) => None,
            Self::Observable(observable) => Some(observable),
        }
    }
}

impl<T: Default> Default for ValueSource<T> {
    fn default() -> Self {
        Self::Value(T::default())
    }
}

macro_rules! value_source_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ValueSource<$ty> {
                fn from(value: $ty) -> Self {
                    Self::Value(value)
                }
            }
        )*
    };
}

value_source_from!(
    String,
    bool,
    i32,
    i64,
    u32,
    u64,
    usize,
    f64,
    NaiveDate,
    Option<String>,
    Option<bool>,
);

impl<T> From<Observable<T>> for ValueSource<T> {
    fn from(observable: Observable<T>) -> Self {
        Self::Observable(observable)
    }
}

impl<T> From<&Observable<T>> for ValueSource<T> {
    fn from(observable: &Observable<T>) -> Self {
        Self::Observable(observable.clone())
    }
}

impl From<&str> for ValueSource<String> {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

/// Resolve a plain or observable value to its current snapshot.
pub fn get_value<T: Clone>(source: &ValueSource<T>) -> T {
    source.get()
}
