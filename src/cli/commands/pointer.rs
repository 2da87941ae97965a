//! JSON pointer edits (RFC 6901) on an in-memory payload.

use anyhow::{anyhow, bail, Result};
use serde_json::Value;

/// Split a pointer into its parent pointer and unescaped final token.
///
/// Returns `None` for the root pointer `""`.
fn split_last(pointer: &str) -> Result<Option<(&str, String)>> {
    if pointer.is_empty() {
        return Ok(None);
    }
    if !pointer.starts_with('/') {
        bail!("invalid JSON pointer '{}': must start with '/'", pointer);
    }
    let idx = pointer.rfind('/').unwrap_or(0);
    let token = pointer[idx + 1..].replace("~1", "/").replace("~0", "~");
    Ok(Some((&pointer[..idx], token)))
}

fn parse_index(token: &str, len: usize, allow_end: bool) -> Result<usize> {
    let index: usize = token
        .parse()
        .map_err(|_| anyhow!("'{}' is not an array index", token))?;
    let limit = if allow_end { len + 1 } else { len };
    if index >= limit {
        bail!("array index {} out of bounds (length {})", index, len);
    }
    Ok(index)
}

/// Look up the value at `pointer`.
pub fn get<'a>(doc: &'a Value, pointer: &str) -> Result<&'a Value> {
    doc.pointer(pointer)
        .ok_or_else(|| anyhow!("no value at '{}'", pointer))
}

/// Set the value at `pointer`, creating the final object key if needed.
///
/// `-` as the final token appends to an array. Returns whether the
/// document changed.
pub fn set(doc: &mut Value, pointer: &str, value: Value) -> Result<bool> {
    let Some((parent, token)) = split_last(pointer)? else {
        let changed = *doc != value;
        *doc = value;
        return Ok(changed);
    };

    let parent_value = doc
        .pointer_mut(parent)
        .ok_or_else(|| anyhow!("no value at '{}'", parent))?;

    match parent_value {
        Value::Object(map) => {
            if map.get(&token) == Some(&value) {
                return Ok(false);
            }
            map.insert(token, value);
            Ok(true)
        }
        Value::Array(items) => {
            if token == "-" {
                items.push(value);
                return Ok(true);
            }
            let index = parse_index(&token, items.len(), true)?;
            if index == items.len() {
                items.push(value);
                return Ok(true);
            }
            if items[index] == value {
                return Ok(false);
            }
            items[index] = value;
            Ok(true)
        }
        _ => bail!("'{}' is not an object or array", parent),
    }
}

/// Remove the value at `pointer`.
///
/// Returns whether anything was removed; a missing object key is not an error.
pub fn remove(doc: &mut Value, pointer: &str) -> Result<bool> {
    let Some((parent, token)) = split_last(pointer)? else {
        bail!("cannot remove the whole payload; use replace instead");
    };

    let Some(parent_value) = doc.pointer_mut(parent) else {
        return Ok(false);
    };

    match parent_value {
        Value::Object(map) => Ok(map.remove(&token).is_some()),
        Value::Array(items) => {
            let Ok(index) = token.parse::<usize>() else {
                bail!("'{}' is not an array index", token);
            };
            if index < items.len() {
                items.remove(index);
                Ok(true)
            } else {
                Ok(false)
            }
        }
        _ => bail!("'{}' is not an object or array", parent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_creates_object_key() {
        let mut doc = json!({"grades": {}});
        assert!(set(&mut doc, "/grades/hw1", json!(90)).unwrap());
        assert_eq!(doc, json!({"grades": {"hw1": 90}}));
    }

    #[test]
    fn set_same_value_is_unchanged() {
        let mut doc = json!({"name": "cs101"});
        assert!(!set(&mut doc, "/name", json!("cs101")).unwrap());
    }

    #[test]
    fn set_appends_with_dash() {
        let mut doc = json!({"students": ["u1"]});
        assert!(set(&mut doc, "/students/-", json!("u2")).unwrap());
        assert_eq!(doc, json!({"students": ["u1", "u2"]}));
    }

    #[test]
    fn set_replaces_array_element() {
        let mut doc = json!([1, 2, 3]);
        assert!(set(&mut doc, "/1", json!(20)).unwrap());
        assert_eq!(doc, json!([1, 20, 3]));
        assert!(set(&mut doc, "/9", json!(0)).is_err());
    }

    #[test]
    fn set_root_replaces_document() {
        let mut doc = json!({});
        assert!(set(&mut doc, "", json!([1])).unwrap());
        assert_eq!(doc, json!([1]));
    }

    #[test]
    fn set_unescapes_tokens() {
        let mut doc = json!({});
        assert!(set(&mut doc, "/a~1b~0c", json!(true)).unwrap());
        assert_eq!(doc, json!({"a/b~c": true}));
    }

    #[test]
    fn set_missing_parent_fails() {
        let mut doc = json!({});
        assert!(set(&mut doc, "/grades/hw1", json!(1)).is_err());
        assert!(set(&mut doc, "grades", json!(1)).is_err());
    }

    #[test]
    fn remove_key_and_element() {
        let mut doc = json!({"students": ["u1", "u2"], "name": "x"});
        assert!(remove(&mut doc, "/name").unwrap());
        assert!(remove(&mut doc, "/students/0").unwrap());
        assert_eq!(doc, json!({"students": ["u2"]}));
    }

    #[test]
    fn remove_absent_is_unchanged() {
        let mut doc = json!({"students": []});
        assert!(!remove(&mut doc, "/name").unwrap());
        assert!(!remove(&mut doc, "/students/3").unwrap());
        assert!(!remove(&mut doc, "/missing/key").unwrap());
    }

    #[test]
    fn remove_root_fails() {
        let mut doc = json!({});
        assert!(remove(&mut doc, "").is_err());
    }
}
