//! 选项值：组件 options 字典中可能出现的全部值类型（封闭和类型）
//!
//! 显示形式与选项作者书写的字面量保持一致（`None`、`True`、`1.0`、`['a', 1]`），
//! 编辑时的"无变化"判断也基于这个字符串形式。

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 有序的字符串键映射（根字典与嵌套子字典共用）
pub type OptionMap = IndexMap<String, OptionValue>;

/// 选项值
///
/// | 字面量 | 变体 |
/// |--------|------|
/// | `None` | `Null` |
/// | `True` / `False` | `Bool` |
/// | `42` | `Int` |
/// | `4.2` | `Float` |
/// | `'10um'` | `String` |
/// | `[..]` / `(..)` / `{a, b}` | `Sequence` |
/// | `{'k': v}` | `Mapping` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<OptionValue>),
    Mapping(OptionMap),
}

impl OptionValue {
    /// 类型名（用于日志）
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Null => "NoneType",
            OptionValue::Bool(_) => "bool",
            OptionValue::Int(_) => "int",
            OptionValue::Float(_) => "float",
            OptionValue::String(_) => "str",
            OptionValue::Sequence(_) => "list",
            OptionValue::Mapping(_) => "dict",
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, OptionValue::String(_))
    }

    pub fn as_mapping(&self) -> Option<&OptionMap> {
        match self {
            OptionValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut OptionMap> {
        match self {
            OptionValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// 字面量形式：字符串带引号，容器内元素递归使用该形式
    pub fn repr(&self) -> String {
        match self {
            OptionValue::String(s) => quote_str(s),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Null => f.write_str("None"),
            OptionValue::Bool(true) => f.write_str("True"),
            OptionValue::Bool(false) => f.write_str("False"),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Float(x) => f.write_str(&format_float(*x)),
            OptionValue::String(s) => f.write_str(s),
            OptionValue::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&item.repr())?;
                }
                f.write_str("]")
            }
            OptionValue::Mapping(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", quote_str(k), v.repr())?;
                }
                f.write_str("}")
            }
        }
    }
}

/// 浮点数的最短往返形式；指数区间外改用 `1e+20` / `1.5e-07` 写法
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0.0".to_string() } else { "0.0".to_string() };
    }
    let abs = x.abs();
    if (1e-4..1e16).contains(&abs) {
        let s = x.to_string();
        if s.contains('.') {
            s
        } else {
            format!("{}.0", s)
        }
    } else {
        let s = format!("{:e}", x);
        match s.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => s,
        }
    }
}

/// 字符串字面量：默认单引号；含单引号且不含双引号时改用双引号
fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Int(i)
    }
}

impl From<i32> for OptionValue {
    fn from(i: i32) -> Self {
        OptionValue::Int(i as i64)
    }
}

impl From<f64> for OptionValue {
    fn from(x: f64) -> Self {
        OptionValue::Float(x)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::String(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::String(s)
    }
}

impl From<Vec<OptionValue>> for OptionValue {
    fn from(items: Vec<OptionValue>) -> Self {
        OptionValue::Sequence(items)
    }
}

impl From<OptionMap> for OptionValue {
    fn from(map: OptionMap) -> Self {
        OptionValue::Mapping(map)
    }
}
