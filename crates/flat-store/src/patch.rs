//! Patch application over the JSON document view of a stored object.

use crate::error::StoreError;
use crate::object::PatchOp;
use serde_json::Value;

/// Applies an RFC 7386 merge patch in place.
///
/// `null` members delete, objects recurse, everything else replaces.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(
                    target_map.entry(key.clone()).or_insert(Value::Null),
                    value,
                );
            }
        }
    }
}

/// Applies JSON-patch operations in order. Stops at the first failing op.
pub fn apply_ops(doc: &mut Value, ops: &[PatchOp]) -> Result<(), StoreError> {
    for op in ops {
        match op {
            PatchOp::Add { path, value } => add(doc, path, value.clone())?,
            PatchOp::Replace { path, value } => {
                let slot = doc
                    .pointer_mut(path)
                    .ok_or_else(|| StoreError::Invalid(format!("replace: no value at {path}")))?;
                *slot = value.clone();
            }
            PatchOp::Remove { path } => remove(doc, path)?,
        }
    }
    Ok(())
}

fn split_pointer(path: &str) -> Result<(&str, String), StoreError> {
    let idx = path
        .rfind('/')
        .ok_or_else(|| StoreError::Invalid(format!("malformed pointer {path}")))?;
    let last = path[idx + 1..].replace("~1", "/").replace("~0", "~");
    Ok((&path[..idx], last))
}

fn add(doc: &mut Value, path: &str, value: Value) -> Result<(), StoreError> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent_path, key) = split_pointer(path)?;
    let parent = doc
        .pointer_mut(parent_path)
        .ok_or_else(|| StoreError::Invalid(format!("add: missing parent of {path}")))?;
    match parent {
        Value::Object(map) => {
            map.insert(key, value);
            Ok(())
        }
        Value::Array(items) => {
            if key == "-" {
                items.push(value);
                return Ok(());
            }
            let idx: usize = key
                .parse()
                .map_err(|_| StoreError::Invalid(format!("add: bad array index in {path}")))?;
            if idx > items.len() {
                return Err(StoreError::Invalid(format!("add: index out of range in {path}")));
            }
            items.insert(idx, value);
            Ok(())
        }
        _ => Err(StoreError::Invalid(format!("add: parent of {path} is a scalar"))),
    }
}

fn remove(doc: &mut Value, path: &str) -> Result<(), StoreError> {
    let (parent_path, key) = split_pointer(path)?;
    let missing = || StoreError::Invalid(format!("remove: no value at {path}"));
    match doc.pointer_mut(parent_path).ok_or_else(missing)? {
        Value::Object(map) => map.remove(&key).map(|_| ()).ok_or_else(missing),
        Value::Array(items) => {
            let idx: usize = key.parse().map_err(|_| missing())?;
            if idx >= items.len() {
                return Err(missing());
            }
            items.remove(idx);
            Ok(())
        }
        _ => Err(missing()),
    }
}
