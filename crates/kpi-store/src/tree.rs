//! Path operations over a JSON document tree.
//!
//! Arrays are addressed by decimal index. Writing past the end of an array
//! pads it with `null`, which readers already treat as an absent child.

use serde_json::{Map, Value};

use crate::StorePath;

pub(crate) fn get<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut node = root;
    for seg in path.segments() {
        node = match node {
            Value::Object(map) => map.get(seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!node.is_null()).then_some(node)
}

/// Store `value` at `path`, creating intermediate objects. `null` removes.
pub(crate) fn set(root: &mut Value, path: &StorePath, value: Value) {
    if value.is_null() {
        remove(root, path);
        return;
    }
    let mut node = root;
    for seg in path.segments() {
        node = child_mut(node, seg);
    }
    *node = value;
}

pub(crate) fn remove(root: &mut Value, path: &StorePath) {
    let Some((last, parents)) = path.segments().split_last() else {
        *root = Value::Null;
        return;
    };
    let mut node = root;
    for seg in parents {
        node = match node {
            Value::Object(map) => match map.get_mut(seg) {
                Some(next) => next,
                None => return,
            },
            Value::Array(items) => match seg.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(next) => next,
                None => return,
            },
            _ => return,
        };
    }
    match node {
        Value::Object(map) => {
            map.remove(last);
        }
        Value::Array(items) => {
            if let Some(slot) = last.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                *slot = Value::Null;
            }
        }
        _ => {}
    }
}

/// Descend one level, converting scalars and out-of-shape nodes into containers.
fn child_mut<'a>(node: &'a mut Value, seg: &str) -> &'a mut Value {
    let index = seg.parse::<usize>().ok();
    if node.is_array() && index.is_none() {
        rekey_as_object(node);
    } else if !node.is_array() && !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match (node, index) {
        (Value::Array(items), Some(idx)) => {
            if items.len() <= idx {
                items.resize(idx + 1, Value::Null);
            }
            &mut items[idx]
        }
        (Value::Object(map), _) => map.entry(seg.to_owned()).or_insert(Value::Null),
        _ => unreachable!("node is a container after normalisation"),
    }
}

/// A non-numeric key was addressed on an array: keep its elements under index keys.
fn rekey_as_object(node: &mut Value) {
    if let Value::Array(items) = node {
        let map: Map<String, Value> = std::mem::take(items)
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        *node = Value::Object(map);
    }
}
