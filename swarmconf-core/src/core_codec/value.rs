/*
    value.rs - The universal value tree

    Every key of a config object stores one of these. Dictionaries are
    BTreeMaps keyed by String, so iteration order is ascending raw-byte
    order, which is exactly the order the canonical encoding requires.
*/

use std::collections::BTreeMap;

/// Dictionary of string key to value, sorted by raw key bytes
pub type Dict = BTreeMap<String, Value>;

/// A node of the config tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Dict(Dict),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_dict(&self) -> bool {
        matches!(self, Value::Dict(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Byte string interpreted as UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// True for values the store treats as "absent": null and empty dicts
    pub fn is_vacant(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Dict(d) => d.is_empty(),
            _ => false,
        }
    }

    /// Drop null entries and empty dictionaries from nested dictionaries.
    ///
    /// Lists are atomic values and are left untouched. The result of pruning
    /// a dictionary can itself be empty; callers decide what that means.
    pub fn pruned(self) -> Value {
        match self {
            Value::Dict(d) => Value::Dict(prune_dict(d)),
            other => other,
        }
    }
}

pub(crate) fn prune_dict(dict: Dict) -> Dict {
    dict.into_iter()
        .filter_map(|(k, v)| {
            let v = v.pruned();
            if v.is_vacant() {
                None
            } else {
                Some((k, v))
            }
        })
        .collect()
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bytes(s.into_bytes())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Value::Dict(d)
    }
}
