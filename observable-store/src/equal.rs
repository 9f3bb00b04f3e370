//! Structural equality for change detection
//!
//! `equal` decides whether a write actually changed anything. It is a deep
//! comparison over [`Value`] trees with a few deliberate departures from
//! numeric semantics:
//!
//! - two NaNs are equal (and `0` equals `-0`)
//! - functions, dates and patterns compare by their canonical rendering
//! - values of different variants are never equal
//! - a pair of nodes met again on the current descent path is unequal, so
//!   two distinct cyclic graphs compare unequal instead of recursing forever
//!
//! ```rust
//! use observable_store::{equal, Value};
//!
//! assert!(equal(&Value::from(f64::NAN), &Value::from(f64::NAN)));
//! assert!(!equal(&Value::from("1"), &Value::from(1)));
//! ```

use crate::value::{render_date, Kind, Value};

/// Deep structural comparison of two values
pub fn equal(a: &Value, b: &Value) -> bool {
    Comparison::default().compare(a, b)
}

/// Compare every value against the first
///
/// Fewer than two values are vacuously equal.
pub fn equal_all(values: &[Value]) -> bool {
    match values.split_first() {
        Some((first, rest)) => rest.iter().all(|other| equal(first, other)),
        None => true,
    }
}

/// One comparison run; the two stacks hold the node pairs on the current
/// descent path, index-aligned
#[derive(Default)]
struct Comparison {
    left: Vec<usize>,
    right: Vec<usize>,
}

impl Comparison {
    fn compare(&mut self, x: &Value, y: &Value) -> bool {
        if both_nan(x, y) || identical(x, y) {
            return true;
        }

        match (x, y) {
            (Value::Function(a), Value::Function(b)) => return a.source() == b.source(),
            (Value::Date(a), Value::Date(b)) => return render_date(a) == render_date(b),
            (Value::Regex(a), Value::Regex(b)) => return a.to_string() == b.to_string(),
            _ => {}
        }

        if !(x.is_object_like() && y.is_object_like()) {
            return false;
        }

        if std::mem::discriminant(x) != std::mem::discriminant(y) {
            return false;
        }

        let (Some(lx), Some(ry)) = (x.node_id(), y.node_id()) else {
            return false;
        };

        if self.on_path(lx, ry) {
            return false;
        }

        match (x, y) {
            (Value::Object(a), Value::Object(b)) => {
                let (a, b) = (a.read_recursive(), b.read_recursive());
                if a.len() != b.len() || !a.keys().all(|key| b.contains_key(key)) {
                    return false;
                }
                let pairs = a.iter().filter_map(|(key, av)| b.get(key).map(|bv| (av, bv)));
                self.members(lx, ry, pairs)
            }
            (Value::Array(a), Value::Array(b)) => {
                let (a, b) = (a.read_recursive(), b.read_recursive());
                if a.len() != b.len() {
                    return false;
                }
                self.members(lx, ry, a.iter().zip(b.iter()))
            }
            (Value::Store(a), Value::Store(b)) => {
                if a.subscribed_paths() != b.subscribed_paths() {
                    return false;
                }
                let (a, b) = (a.get_loose(""), b.get_loose(""));
                self.members(lx, ry, std::iter::once((&a, &b)))
            }
            _ => false,
        }
    }

    /// Compare corresponding members of the containers `lx` and `ry`
    fn members<'v>(
        &mut self,
        lx: usize,
        ry: usize,
        pairs: impl Iterator<Item = (&'v Value, &'v Value)>,
    ) -> bool {
        let pairs = pairs.collect::<Vec<_>>();

        if pairs.iter().any(|(a, b)| a.kind() != b.kind()) {
            return false;
        }

        for (a, b) in pairs {
            let same = match a.kind() {
                Kind::Object | Kind::Function => {
                    self.left.push(lx);
                    self.right.push(ry);
                    let same = self.compare(a, b);
                    self.left.pop();
                    self.right.pop();
                    same
                }
                _ => both_nan(a, b) || identical(a, b),
            };

            if !same {
                return false;
            }
        }

        true
    }

    fn on_path(&self, lx: usize, ry: usize) -> bool {
        self.left
            .iter()
            .zip(&self.right)
            .any(|(l, r)| *l == lx && *r == ry)
    }
}

fn both_nan(x: &Value, y: &Value) -> bool {
    matches!((x, y), (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan())
}

/// Strict identity: primitives by value, shared nodes by pointer
fn identical(x: &Value, y: &Value) -> bool {
    match (x, y) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        _ => matches!((x.node_id(), y.node_id()), (Some(a), Some(b)) if a == b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn self_referencing() -> Value {
        let node = Value::object();
        node.as_object()
            .unwrap()
            .write()
            .insert("self".into(), node.clone());
        node
    }

    #[test]
    fn test_primitives() {
        assert!(equal(&Value::from(1), &Value::from(1.0)));
        assert!(equal(&Value::from("a"), &Value::from("a")));
        assert!(equal(&Value::Undefined, &Value::Undefined));
        assert!(!equal(&Value::Undefined, &Value::Null));
        assert!(!equal(&Value::from("1"), &Value::from(1)));
        assert!(!equal(&Value::from(true), &Value::from(1)));
    }

    #[test]
    fn test_nan_and_signed_zero() {
        assert!(equal(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(equal(&Value::from(0.0), &Value::from(-0.0)));
        assert!(!equal(&Value::from(f64::NAN), &Value::from(0)));
        assert!(equal(&v(json!({"a": 1})), &v(json!({"a": 1}))));

        let a = Value::from_entries([("n", f64::NAN)]);
        let b = Value::from_entries([("n", f64::NAN)]);
        assert!(equal(&a, &b));
    }

    #[test]
    fn test_empty_containers() {
        assert!(equal(&Value::object(), &Value::object()));
        assert!(equal(&Value::array(), &Value::array()));
        assert!(!equal(&Value::object(), &Value::array()));
    }

    #[test]
    fn test_nested_containers() {
        let a = v(json!({"user": {"name": "ada", "tags": ["x", "y"]}, "n": null}));
        let b = v(json!({"user": {"name": "ada", "tags": ["x", "y"]}, "n": null}));
        let c = v(json!({"user": {"name": "ada", "tags": ["x", "z"]}, "n": null}));

        assert!(equal(&a, &b));
        assert!(!equal(&a, &c));
    }

    #[test]
    fn test_key_sets_must_match() {
        let with_undefined = Value::from_entries([("a", Value::Undefined)]);
        assert!(!equal(&with_undefined, &Value::object()));
        assert!(!equal(&Value::object(), &with_undefined));
        assert!(!equal(&v(json!({"a": 1})), &v(json!({"b": 1}))));
        assert!(!equal(&v(json!({"a": 1})), &v(json!({"a": 1, "b": 2}))));
    }

    #[test]
    fn test_member_types_must_match() {
        assert!(!equal(&v(json!({"a": "1"})), &v(json!({"a": 1}))));
        assert!(!equal(&v(json!([0])), &v(json!([false]))));
        assert!(!equal(&v(json!({"a": null})), &v(json!({"a": {}}))));
    }

    #[test]
    fn test_functions_compare_by_source() {
        let a = Value::function("(x) => x + 1", |args| args[0].clone());
        let b = Value::function("(x) => x + 1", |_| Value::Undefined);
        let c = Value::function("(x) => x + 2", |_| Value::Undefined);

        assert!(equal(&a, &b));
        assert!(!equal(&a, &c));
        assert!(!equal(&a, &Value::object()));
    }

    #[test]
    fn test_dates_and_patterns_compare_by_rendering() {
        let t = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let later = Utc.timestamp_millis_opt(1_700_000_000_124).unwrap();

        assert!(equal(&Value::from(t), &Value::from(t)));
        assert!(!equal(&Value::from(t), &Value::from(later)));

        assert!(equal(&Value::regex("a+", "g"), &Value::regex("a+", "g")));
        assert!(!equal(&Value::regex("a+", "g"), &Value::regex("a+", "i")));
        assert!(!equal(&Value::regex("a+", ""), &Value::from("/a+/")));
    }

    #[test]
    fn test_cycles_terminate() {
        let a = self_referencing();
        let b = self_referencing();

        // Same handle: identical
        assert!(equal(&a, &a));
        // Distinct isomorphic cycles: the path guard reports unequal
        assert!(!equal(&a, &b));

        // A container pointing back at `a` reaches identity one level down
        let c = Value::from_entries([("self", a.clone())]);
        assert!(equal(&a, &c));
    }

    fn two_step_cycle() -> Value {
        let inner = Value::object();
        let outer = Value::from_entries([("k", inner.clone())]);
        inner
            .as_object()
            .unwrap()
            .write()
            .insert("back".into(), outer.clone());
        outer
    }

    fn array_cycle() -> Value {
        let inner = Value::from_items(Vec::<Value>::new());
        let outer = Value::from_items([inner.clone()]);
        inner.as_array().unwrap().write().push(outer.clone());
        outer
    }

    #[test]
    fn test_indirect_cycles_terminate() {
        let a = two_step_cycle();
        let b = two_step_cycle();

        assert!(equal(&a, &a));
        assert!(!equal(&a, &b));

        // Entering the cycle one level down still meets `a` by identity
        let k = a.field("k");
        assert!(equal(&k.field("back"), &a));
        assert!(!equal(&k, &b.field("k")));
    }

    #[test]
    fn test_array_cycles_terminate() {
        let a = array_cycle();
        let b = array_cycle();

        assert!(equal(&a, &a));
        assert!(!equal(&a, &b));
        assert!(!equal(&a, &Value::from_items([Value::from_items([Value::from(1)])])));
    }

    #[test]
    fn test_object_key_order_is_ignored() {
        assert!(equal(&v(json!({"a": 1, "b": 2})), &v(json!({"b": 2, "a": 1}))));
    }

    #[test]
    fn test_nested_stores() {
        let a = Store::with_value(v(json!({"x": 1}))).unwrap();
        let b = Store::with_value(v(json!({"x": 1}))).unwrap();
        let c = Store::with_value(v(json!({"x": 2}))).unwrap();

        assert!(equal(&Value::from(a.clone()), &Value::from(b.clone())));
        assert!(!equal(&Value::from(a.clone()), &Value::from(c)));

        a.watch("x", |_, _| {});
        assert!(!equal(&Value::from(a), &Value::from(b)));
    }

    #[test]
    fn test_equal_all() {
        assert!(equal_all(&[]));
        assert!(equal_all(&[Value::from(1)]));
        assert!(equal_all(&[Value::from(1), Value::from(1), Value::from(1.0)]));
        assert!(!equal_all(&[Value::from(1), Value::from(1), Value::from(2)]));
    }
}
