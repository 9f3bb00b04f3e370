//! Tagged-union values held by a store
//!
//! A `Value` is the untyped, JSON-like tree a [`Store`] wraps. Containers
//! (`Array`, `Object`) are shared handles: cloning a `Value` clones the
//! handle, not the contents. Reading a container out of a store therefore
//! aliases the stored node, and cyclic graphs can be built by inserting a
//! container into itself.
//!
//! ```rust
//! use observable_store::Value;
//!
//! let user = Value::from_entries([("name", Value::from("ada")), ("age", Value::from(36))]);
//! assert_eq!(user.field("name"), Value::from("ada"));
//! assert!(user.field("missing").is_undefined());
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::store::Store;

/// Shared, interior-mutable container node
pub type Shared<T> = Arc<RwLock<T>>;

/// String-keyed map backing `Value::Object`, in insertion order
pub type Map = IndexMap<String, Value>;

/// Classification of a value, mirroring the `typeof` operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Undefined,
    Boolean,
    Number,
    String,
    Object,
    Function,
}

/// A callable value
///
/// Functions carry a canonical source rendering. Two distinct functions
/// with the same rendering compare equal.
#[derive(Clone)]
pub struct Function {
    source: Arc<str>,
    body: Arc<dyn Fn(&[Value]) -> Value + Send + Sync>,
}

impl Function {
    /// Create a function from its rendering and body
    pub fn new<F>(source: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            body: Arc::new(body),
        }
    }

    /// Canonical rendering used for equality
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Invoke the function
    pub fn call(&self, args: &[Value]) -> Value {
        (self.body)(args)
    }

    pub(crate) fn node_id(&self) -> usize {
        addr(&self.body)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.source)
    }
}

/// A regular-expression literal (source and flags)
///
/// Patterns are compared by their `/source/flags` rendering and are never
/// compiled by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    source: String,
    flags: String,
}

impl Pattern {
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            flags: flags.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// An untyped structured value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Shared<Vec<Value>>),
    Object(Shared<Map>),
    Function(Function),
    Date(DateTime<Utc>),
    Regex(Pattern),
    Store(Store),
}

impl Value {
    /// A new, empty object
    pub fn object() -> Self {
        Value::Object(Arc::new(RwLock::new(Map::new())))
    }

    /// A new, empty array
    pub fn array() -> Self {
        Value::Array(Arc::new(RwLock::new(Vec::new())))
    }

    /// Build an object from key/value pairs
    pub fn from_entries<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Map>();
        Value::Object(Arc::new(RwLock::new(map)))
    }

    /// Build an array from items
    pub fn from_items<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let items = items.into_iter().map(Into::into).collect::<Vec<_>>();
        Value::Array(Arc::new(RwLock::new(items)))
    }

    pub fn function<F>(source: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Value::Function(Function::new(source, body))
    }

    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Value::Regex(Pattern::new(source, flags))
    }

    /// The `typeof` classification of this value
    pub fn kind(&self) -> Kind {
        match self {
            Value::Undefined => Kind::Undefined,
            Value::Bool(_) => Kind::Boolean,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Function(_) => Kind::Function,
            Value::Null
            | Value::Array(_)
            | Value::Object(_)
            | Value::Date(_)
            | Value::Regex(_)
            | Value::Store(_) => Kind::Object,
        }
    }

    /// Loose truthiness: `undefined`, `null`, `false`, `0`, `NaN` and `""` are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// True for containers, functions, dates, patterns and stores
    pub fn is_object_like(&self) -> bool {
        !matches!(
            self,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Shared<Map>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Shared<Vec<Value>>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_store(&self) -> Option<&Store> {
        match self {
            Value::Store(store) => Some(store),
            _ => None,
        }
    }

    /// Read one segment of a path from this value
    ///
    /// Objects are read by key and arrays by canonical index. Every other
    /// value, including a nested store, has no readable fields and yields
    /// `Undefined`.
    pub fn field(&self, segment: &str) -> Value {
        match self {
            Value::Object(map) => map.read().get(segment).cloned().unwrap_or_default(),
            Value::Array(items) => array_index(segment)
                .and_then(|i| items.read().get(i).cloned())
                .unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Export to `serde_json::Value`
    ///
    /// Lossy: undefined and function members are dropped from objects and
    /// become `null` in arrays, dates become RFC 3339 strings, patterns their
    /// `/source/flags` rendering, stores their root value, and cyclic
    /// back-edges `null`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut path = Vec::new();
        self.export(&mut path)
    }

    fn export(&self, path: &mut Vec<usize>) -> serde_json::Value {
        use serde_json::Value as Json;

        if let Some(id) = self.node_id() {
            if path.contains(&id) {
                return Json::Null;
            }
        }

        match self {
            Value::Undefined | Value::Null | Value::Function(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Date(d) => Json::String(render_date(d)),
            Value::Regex(p) => Json::String(p.to_string()),
            Value::Array(items) => {
                path.push(addr(items));
                let out = items
                    .read_recursive()
                    .iter()
                    .map(|item| item.export(path))
                    .collect();
                path.pop();
                Json::Array(out)
            }
            Value::Object(map) => {
                path.push(addr(map));
                let out = map
                    .read_recursive()
                    .iter()
                    .filter(|(_, v)| !matches!(v, Value::Undefined | Value::Function(_)))
                    .map(|(k, v)| (k.clone(), v.export(path)))
                    .collect();
                path.pop();
                Json::Object(out)
            }
            Value::Store(store) => {
                path.push(store.node_id());
                let out = store.get_loose("").export(path);
                path.pop();
                out
            }
        }
    }

    /// Pointer identity of shared nodes; `None` for plain data
    pub(crate) fn node_id(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(addr(items)),
            Value::Object(map) => Some(addr(map)),
            Value::Function(func) => Some(func.node_id()),
            Value::Store(store) => Some(store.node_id()),
            _ => None,
        }
    }

    fn write_debug(&self, f: &mut fmt::Formatter<'_>, path: &mut Vec<usize>) -> fmt::Result {
        if let Some(id) = self.node_id() {
            if path.contains(&id) {
                return f.write_str("[Circular]");
            }
        }

        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Date(d) => write!(f, "Date({})", render_date(d)),
            Value::Regex(p) => write!(f, "{}", p),
            Value::Array(items) => {
                path.push(addr(items));
                f.write_str("[")?;
                for (i, item) in items.read_recursive().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_debug(f, path)?;
                }
                path.pop();
                f.write_str("]")
            }
            Value::Object(map) => {
                path.push(addr(map));
                f.write_str("{")?;
                for (i, (key, item)) in map.read_recursive().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: ", key)?;
                    item.write_debug(f, path)?;
                }
                path.pop();
                f.write_str("}")
            }
            Value::Store(store) => {
                path.push(store.node_id());
                f.write_str("Store(")?;
                store.get_loose("").write_debug(f, path)?;
                path.pop();
                f.write_str(")")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = Vec::new();
        self.write_debug(f, &mut path)
    }
}

impl PartialEq for Value {
    /// Structural equality, see [`crate::equal::equal`]
    fn eq(&self, other: &Self) -> bool {
        crate::equal::equal(self, other)
    }
}

/// Canonical rendering of a date, used for equality and export
pub(crate) fn render_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Integral numbers export as JSON integers so plain data survives a round trip
fn number_to_json(n: f64) -> serde_json::Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Parse a canonical array index ("0", "12"; not "01" or "+1")
pub(crate) fn array_index(segment: &str) -> Option<usize> {
    let index: usize = segment.parse().ok()?;
    (index.to_string() == segment).then_some(index)
}

pub(crate) fn addr<T: ?Sized>(node: &Arc<T>) -> usize {
    Arc::as_ptr(node) as *const () as usize
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_number!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(RwLock::new(items)))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(Arc::new(RwLock::new(map)))
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

impl From<Pattern> for Value {
    fn from(pattern: Pattern) -> Self {
        Value::Regex(pattern)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::Date(date)
    }
}

impl From<Store> for Value {
    fn from(store: Store) -> Self {
        Value::Store(store)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or_default()
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::from_items(items),
            Json::Object(map) => Value::from_entries(map),
        }
    }
}
