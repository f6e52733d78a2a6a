//! 键路径寻址：按键序列在嵌套字典中定位与回写选项值

use thiserror::Error;

use crate::model::value::{OptionMap, OptionValue};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("键不存在: {key} (路径: {path})")]
    MissingKey { key: String, path: String },
    #[error("中间值不是字典: {key} (路径: {path})")]
    NotAMapping { key: String, path: String },
}

/// 路径解析结果：空路径得到根字典本身，其余得到具体值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Root(&'a OptionMap),
    Value(&'a OptionValue),
}

impl<'a> Resolved<'a> {
    pub fn value(self) -> Option<&'a OptionValue> {
        match self {
            Resolved::Root(_) => None,
            Resolved::Value(v) => Some(v),
        }
    }
}

/// 按键序列逐层下钻；最后一个键的查找结果即返回值
pub fn resolve<'a, S: AsRef<str>>(dict: &'a OptionMap, key_path: &[S]) -> Result<Resolved<'a>, PathError> {
    let Some((last, parents)) = key_path.split_last() else {
        return Ok(Resolved::Root(dict));
    };
    let map = descend(dict, parents, key_path)?;
    map.get(last.as_ref())
        .map(Resolved::Value)
        .ok_or_else(|| PathError::MissingKey {
            key: last.as_ref().to_string(),
            path: json_path(key_path),
        })
}

fn descend<'a, S: AsRef<str>>(dict: &'a OptionMap, keys: &[S], full: &[S]) -> Result<&'a OptionMap, PathError> {
    let mut current = dict;
    for key in keys {
        let key = key.as_ref();
        let next = current.get(key).ok_or_else(|| PathError::MissingKey {
            key: key.to_string(),
            path: json_path(full),
        })?;
        current = next.as_mapping().ok_or_else(|| PathError::NotAMapping {
            key: key.to_string(),
            path: json_path(full),
        })?;
    }
    Ok(current)
}

/// 将 value 写入 parents 指向的字典中的 key（已存在时原位覆盖，保持键顺序）
///
/// 返回被覆盖的旧值。
pub fn write_value<S: AsRef<str>>(
    dict: &mut OptionMap,
    parents: &[S],
    key: &str,
    value: OptionValue,
) -> Result<Option<OptionValue>, PathError> {
    let mut current = dict;
    for parent in parents {
        let parent = parent.as_ref();
        let path = || {
            let mut full: Vec<&str> = parents.iter().map(AsRef::as_ref).collect();
            full.push(key);
            json_path(&full)
        };
        let next = current.get_mut(parent).ok_or_else(|| PathError::MissingKey {
            key: parent.to_string(),
            path: path(),
        })?;
        current = next.as_mapping_mut().ok_or_else(|| PathError::NotAMapping {
            key: parent.to_string(),
            path: path(),
        })?;
    }
    Ok(current.insert(key.to_string(), value))
}

/// 键序列的 JSONPath 形式（日志与展示用）；含特殊字符的键使用 bracket-notation
pub fn json_path<S: AsRef<str>>(keys: &[S]) -> String {
    let mut path = String::from("$");
    for k in keys {
        let k = k.as_ref();
        if !k.is_empty() && k.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            path.push('.');
            path.push_str(k);
        } else {
            path.push_str(&format!("['{}']", k.replace('\'', "\\'")));
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OptionMap {
        serde_json::from_str(r#"{"aa": {"x1": {"dda": 34}, "y1": "Y", "z": "10um"}, "bb": 5}"#).unwrap()
    }

    #[test]
    fn test_resolve_empty_path_is_root() {
        let dict = sample();
        let empty: [&str; 0] = [];
        assert_eq!(resolve(&dict, &empty).unwrap(), Resolved::Root(&dict));
    }

    #[test]
    fn test_resolve_nested() {
        let dict = sample();
        let v = resolve(&dict, &["aa", "x1", "dda"]).unwrap().value().unwrap();
        assert_eq!(*v, OptionValue::Int(34));

        let top = resolve(&dict, &["bb"]).unwrap().value().unwrap();
        assert_eq!(*top, OptionValue::Int(5));
    }

    #[test]
    fn test_resolve_missing_key() {
        let dict = sample();
        let err = resolve(&dict, &["aa", "nope"]).unwrap_err();
        assert_eq!(
            err,
            PathError::MissingKey { key: "nope".into(), path: "$.aa.nope".into() }
        );
    }

    #[test]
    fn test_resolve_through_scalar() {
        let dict = sample();
        let err = resolve(&dict, &["bb", "deeper"]).unwrap_err();
        assert!(matches!(err, PathError::NotAMapping { ref key, .. } if key == "bb"));
    }

    #[test]
    fn test_write_value_keeps_order() {
        let mut dict = sample();
        let old = write_value(&mut dict, &["aa"], "y1", "Z".into()).unwrap();
        assert_eq!(old, Some(OptionValue::from("Y")));

        let keys: Vec<&str> = dict["aa"].as_mapping().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["x1", "y1", "z"]);
        assert_eq!(resolve(&dict, &["aa", "y1"]).unwrap().value(), Some(&OptionValue::from("Z")));
    }

    #[test]
    fn test_write_value_top_level() {
        let mut dict = sample();
        let empty: [&str; 0] = [];
        write_value(&mut dict, &empty, "bb", 6.into()).unwrap();
        assert_eq!(dict["bb"], OptionValue::Int(6));
    }

    #[test]
    fn test_write_value_stale_parent() {
        let mut dict = sample();
        let err = write_value(&mut dict, &["gone"], "k", 1.into()).unwrap_err();
        assert!(matches!(err, PathError::MissingKey { .. }));
    }

    #[test]
    fn test_json_path_special_characters() {
        assert_eq!(json_path(&["normal_key", "x1"]), "$.normal_key.x1");
        assert_eq!(json_path(&["key with spaces"]), "$['key with spaces']");
        assert_eq!(json_path(&["key'q"]), "$['key\\'q']");
    }
}
