//! Observable Value Store
//!
//! Wraps one structured value, lets callers read and write nested fields by
//! dotted key path, and notifies subscribers when a write changes the value
//! at, above or below a subscribed path.
//!
//! # Features
//!
//! - **Key-path access**: `get("user.address.city")`, with a loose variant
//!   that yields `Undefined` instead of failing on a missing intermediate
//! - **Change detection**: writes are compared structurally against the
//!   previous value; no-op writes notify nobody
//! - **Overlap matching**: a write notifies subscribers at the same path,
//!   at any ancestor, at any descendant, and on the root
//! - **Fresh values**: each callback receives the current value at its own
//!   path, not the value that was written
//!
//! # Quick Start
//!
//! ```rust
//! use observable_store::{Store, Value};
//! use serde_json::json;
//! use std::sync::{Arc, Mutex};
//!
//! let store = Store::with_value(Value::from(json!({"user": {"name": "ada"}}))).unwrap();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! store.watch("user.name", move |value, _| sink.lock().unwrap().push(value.clone()));
//!
//! // Replacing the parent notifies the child subscriber with the nested value
//! store.set("user", Value::from(json!({"name": "grace"}))).unwrap();
//! // Writing the same value again is not a change
//! store.set("user.name", "grace").unwrap();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![Value::from("grace")]);
//! ```
//!
//! # Architecture
//!
//! ```text
//! Store (Arc, cheap to clone)
//!     │
//!     ├── root: RwLock<Value>
//!     │       │
//!     │       └── Value: Undefined | Null | Bool | Number | String
//!     │                 | Array(Arc<RwLock<Vec<Value>>>)
//!     │                 | Object(Arc<RwLock<IndexMap<String, Value>>>)
//!     │                 | Function | Date | Regex | Store
//!     │
//!     ├── subscriptions: RwLock<Vec<Subscription { path, Callback }>>
//!     │
//!     └── config: StoreConfig { separator }
//!
//! set(path) ─► assign ─► equal(old, new)? ─► trigger(path) ─► overlapping callbacks
//! ```

// Modules
pub mod config;
pub mod equal;
pub mod error;
pub mod logging;
pub mod path;
pub mod store;
pub mod subscription;
pub mod value;

// Re-exports - Public API
pub use config::StoreConfig;
pub use equal::{equal, equal_all};
pub use error::{Result, StoreError};
pub use store::Store;
pub use subscription::{Callback, Subscription};
pub use value::{Function, Kind, Map, Pattern, Shared, Value};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::StoreConfig;
    pub use crate::equal::equal;
    pub use crate::error::{Result, StoreError};
    pub use crate::store::Store;
    pub use crate::subscription::Callback;
    pub use crate::value::Value;
}
