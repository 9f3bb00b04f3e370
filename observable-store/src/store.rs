//! Observable store over a structured value
//!
//! A `Store` owns one root [`Value`] and a list of subscriptions. Reads and
//! writes address nested fields by key path; a write that changes the value
//! notifies every subscriber whose path overlaps the written path.
//!
//! # Notification
//!
//! A write at `P` notifies subscribers at `P`, at every ancestor of `P`, at
//! every descendant of `P`, and every subscriber on the empty path. A write at
//! the root notifies everyone. Each callback receives the *current* value at
//! its own path, read after the write, not the written value.
//!
//! # Re-entrancy
//!
//! No lock is held while callbacks run, so a callback may read, write,
//! subscribe or unsubscribe on the same store. `trigger` iterates a snapshot
//! of the subscription list taken when it starts: every subscription
//! registered at that moment is invoked once for that trigger, even if an
//! earlier callback removed it; subscriptions added during the pass are first
//! invoked by the next trigger.
//!
//! # Example
//!
//! ```rust
//! use observable_store::{Store, Value};
//! use serde_json::json;
//!
//! let store = Store::with_value(Value::from(json!({"user": {"name": "ada"}}))).unwrap();
//!
//! store.watch("user", |user, path| {
//!     assert_eq!(path, "user");
//!     assert_eq!(user.field("name"), Value::from("grace"));
//! });
//!
//! assert!(store.set("user.name", "grace").unwrap());
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::equal::equal;
use crate::error::{Result, StoreError};
use crate::path::segments;
use crate::subscription::{Callback, Subscription};
use crate::value::{addr, array_index, Kind, Value};

struct StoreInner {
    root: RwLock<Value>,
    subscriptions: RwLock<Vec<Subscription>>,
    config: StoreConfig,
}

/// Observable wrapper around a structured value
///
/// Cloning a `Store` yields another handle to the same root and
/// subscription list.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a store over an empty object
    pub fn new() -> Self {
        Self::from_root(Value::object(), StoreConfig::default())
    }

    /// Create a store over `initial`
    ///
    /// `Undefined` yields an empty object. Any other value must be a truthy
    /// object-kind value (object, array, date, pattern or store), otherwise
    /// `StoreError::Type` is returned.
    pub fn with_value(initial: Value) -> Result<Self> {
        Self::with_config(initial, StoreConfig::default())
    }

    /// Create a store over `initial` with a validated configuration
    pub fn with_config(initial: Value, config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let root = match initial {
            Value::Undefined => Value::object(),
            value if value.kind() == Kind::Object && value.is_truthy() => value,
            other => {
                return Err(StoreError::Type(format!(
                    "Value must be undefined or object, got {:?}",
                    other.kind()
                )))
            }
        };

        Ok(Self::from_root(root, config))
    }

    /// Wrap any value without validation; `Undefined` becomes an empty object
    fn wrap(value: Value) -> Self {
        let root = if value.is_undefined() {
            Value::object()
        } else {
            value
        };
        Self::from_root(root, StoreConfig::default())
    }

    fn from_root(root: Value, config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                root: RwLock::new(root),
                subscriptions: RwLock::new(Vec::new()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Whether two handles refer to the same store
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn node_id(&self) -> usize {
        addr(&self.inner)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read the value at `path`; the empty path returns the root
    ///
    /// Fails with `StoreError::InvalidPath` if a node before the last
    /// segment is falsy. The last segment itself may be absent, which reads
    /// as `Undefined`.
    pub fn get(&self, path: &str) -> Result<Value> {
        self.lookup(path)
            .ok_or_else(|| StoreError::invalid_path(path))
    }

    /// Read the value at `path`, yielding `Undefined` where `get` would fail
    pub fn get_loose(&self, path: &str) -> Value {
        self.lookup(path).unwrap_or_default()
    }

    fn lookup(&self, path: &str) -> Option<Value> {
        let mut node = self.inner.root.read().clone();

        for segment in segments(path, self.inner.config.separator) {
            if !node.is_truthy() {
                return None;
            }
            node = node.field(segment);
        }

        Some(node)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Write `value` at `path` and notify overlapping subscribers on change
    ///
    /// Returns whether the value changed. Writing the root always counts as
    /// a change. Fails with `StoreError::InvalidPath` if the parent of the
    /// last segment, or any node above it, is falsy, and with
    /// `StoreError::Type` if the parent cannot hold the field. Only objects
    /// and arrays hold fields: primitives, functions, dates, patterns and
    /// nested stores reject every write, arrays reject non-index segments
    /// and indices past `2^32 - 2`.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<bool> {
        self.write(path, value.into(), false)
    }

    /// Like [`Store::set`] but never notifies subscribers
    pub fn set_silent(&self, path: &str, value: impl Into<Value>) -> Result<bool> {
        self.write(path, value.into(), true)
    }

    fn write(&self, path: &str, value: Value, silence: bool) -> Result<bool> {
        let changed = if path.is_empty() {
            *self.inner.root.write() = value;
            true
        } else {
            let segments = segments(path, self.inner.config.separator);
            let (last, parents) = segments
                .split_last()
                .ok_or_else(|| StoreError::invalid_path(path))?;

            let mut node = self.inner.root.read().clone();
            for segment in parents {
                if !node.is_truthy() {
                    return Err(StoreError::invalid_path(path));
                }
                node = node.field(segment);
            }
            if !node.is_truthy() {
                return Err(StoreError::invalid_path(path));
            }

            let previous = assign(&node, last, value.clone())?;
            !equal(&value, &previous)
        };

        trace!(path, changed, silence, "write");

        if changed && !silence {
            self.trigger(path);
        }

        Ok(changed)
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Register `callback` at `path`; duplicates are kept
    pub fn subscribe(&self, path: impl Into<String>, callback: Callback) {
        let path = path.into();
        trace!(path = %path, "subscribe");
        self.inner
            .subscriptions
            .write()
            .push(Subscription::new(path, callback));
    }

    /// Register a closure at `path` and return its handle
    pub fn watch<F>(&self, path: impl Into<String>, f: F) -> Callback
    where
        F: Fn(&Value, &str) + Send + Sync + 'static,
    {
        let callback = Callback::new(f);
        self.subscribe(path, callback.clone());
        callback
    }

    /// Remove subscriptions registered at exactly `path`
    ///
    /// With `Some(callback)` only registrations of that callback are
    /// removed; with `None` every registration at `path` is. Returns the
    /// number removed.
    pub fn unsubscribe(&self, path: &str, callback: Option<&Callback>) -> usize {
        let mut subscriptions = self.inner.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|sub| !sub.is_removed_by(path, callback));
        let removed = before - subscriptions.len();

        trace!(path, removed, "unsubscribe");
        removed
    }

    /// Notify every subscriber whose path overlaps `path`
    pub fn trigger(&self, path: &str) {
        let snapshot = self.inner.subscriptions.read().clone();
        let separator = self.inner.config.separator;
        let mut notified = 0usize;

        for sub in snapshot.iter().filter(|sub| sub.matches(path, separator)) {
            let current = self.get_loose(&sub.path);
            sub.callback.call(&current, &sub.path);
            notified += 1;
        }

        debug!(path, notified, "trigger");
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.read().len()
    }

    /// Paths of all subscriptions, in registration order
    pub fn subscribed_paths(&self) -> Vec<String> {
        self.inner
            .subscriptions
            .read()
            .iter()
            .map(|sub| sub.path.clone())
            .collect()
    }

    // ========================================================================
    // Bulk conversion
    // ========================================================================

    /// Replace every member of an object or array with a store wrapping it
    ///
    /// The container is mutated in place and returned. Members of any
    /// value are wrapped, including primitives; an `Undefined` member wraps
    /// an empty object. Anything other than an object or array fails with
    /// `StoreError::Type`.
    pub fn to_observables(container: &Value) -> Result<Value> {
        match container {
            Value::Object(map) => {
                for slot in map.write().values_mut() {
                    let member = std::mem::take(slot);
                    *slot = Value::Store(Store::wrap(member));
                }
            }
            Value::Array(items) => {
                for slot in items.write().iter_mut() {
                    let member = std::mem::take(slot);
                    *slot = Value::Store(Store::wrap(member));
                }
            }
            other => {
                return Err(StoreError::Type(format!(
                    "Value must be an object, got {:?}",
                    other.kind()
                )))
            }
        }

        Ok(container.clone())
    }
}

/// Largest index an array write accepts (`2^32 - 2`)
const MAX_ARRAY_INDEX: usize = u32::MAX as usize - 1;

/// Assign `value` to `segment` of `target`, returning the previous member
fn assign(target: &Value, segment: &str, value: Value) -> Result<Value> {
    match target {
        Value::Object(map) => Ok(map
            .write()
            .insert(segment.to_string(), value)
            .unwrap_or_default()),
        Value::Array(items) => {
            let index = array_index(segment)
                .filter(|index| *index <= MAX_ARRAY_INDEX)
                .ok_or_else(|| cannot_create(segment, target))?;
            let mut items = items.write();
            if index >= items.len() {
                let len = index
                    .checked_add(1)
                    .ok_or_else(|| out_of_range(segment))?;
                let additional = len - items.len();
                items
                    .try_reserve(additional)
                    .map_err(|_| out_of_range(segment))?;
                items.resize(len, Value::Undefined);
            }
            Ok(std::mem::replace(&mut items[index], value))
        }
        other => Err(cannot_create(segment, other)),
    }
}

fn cannot_create(segment: &str, target: &Value) -> StoreError {
    StoreError::Type(format!(
        "Cannot create property '{}' on {:?}",
        segment,
        target.kind()
    ))
}

fn out_of_range(segment: &str) -> StoreError {
    StoreError::Type(format!("Array index '{}' is out of range", segment))
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("root", &self.get_loose(""))
            .field("subscription_count", &self.subscription_count())
            .finish()
    }
}
