//! Subscriber callbacks and subscription records
//!
//! A subscription pairs a key path with a [`Callback`]. When a write
//! overlaps the path, the callback receives the current value at its own
//! path together with that path.

use std::fmt;
use std::sync::Arc;

use crate::path;
use crate::value::{addr, Value};

/// A shareable subscriber callback
///
/// Callbacks are compared by identity: clones of one `Callback` are equal,
/// two callbacks built from identical closures are not. Keep a clone of the
/// handle to remove it later with [`Store::unsubscribe`](crate::Store::unsubscribe).
///
/// # Example
///
/// ```rust
/// use observable_store::{Callback, Store};
///
/// let store = Store::new();
/// let on_name = Callback::new(|value, path| println!("{path} = {value:?}"));
///
/// store.subscribe("user.name", on_name.clone());
/// store.unsubscribe("user.name", Some(&on_name));
/// assert_eq!(store.subscription_count(), 0);
/// ```
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn(&Value, &str) + Send + Sync>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &str) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke with the value at `path`
    pub fn call(&self, value: &Value, path: &str) {
        (self.0)(value, path)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        addr(&self.0) == addr(&other.0)
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:#x})", addr(&self.0))
    }
}

/// A registered (path, callback) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// The watched path; empty watches every write
    pub path: String,

    pub callback: Callback,
}

impl Subscription {
    pub fn new(path: impl Into<String>, callback: Callback) -> Self {
        Self {
            path: path.into(),
            callback,
        }
    }

    /// Whether a write at `trigger` notifies this subscription
    pub fn matches(&self, trigger: &str, separator: char) -> bool {
        path::overlaps(&self.path, trigger, separator)
    }

    /// Whether an unsubscribe request for `path` (and optionally `callback`) removes this
    pub(crate) fn is_removed_by(&self, path: &str, callback: Option<&Callback>) -> bool {
        self.path == path && callback.map_or(true, |cb| *cb == self.callback)
    }
}
