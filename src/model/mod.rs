//! Structured document model
//!
//! Audit records, management operations and their results are all
//! self-describing trees of typed leaves. [`ModelNode`] models such a tree and
//! keeps the difference between a node that holds a value and a node that is
//! part of the document but carries none ([`ModelNode::Undefined`]).

pub mod address;
pub mod operation;

pub use address::{PathAddress, PathElement};
pub use operation::OperationResult;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

static UNDEFINED: ModelNode = ModelNode::Undefined;

/// A node of a structured document
///
/// Object children keep insertion order. A key that is missing and a key whose
/// value is `Undefined` are indistinguishable to readers: both report
/// `is_defined() == false`. Two objects are equal when they hold the same keys
/// with equal values, whatever the order.
#[derive(Debug, Clone, Default)]
pub enum ModelNode {
    /// Present in the schema but without a value
    #[default]
    Undefined,
    Boolean(bool),
    Int(i64),
    Double(f64),
    String(String),
    List(Vec<ModelNode>),
    Object(Vec<(String, ModelNode)>),
}

impl ModelNode {
    /// Create an empty object node
    pub fn object() -> Self {
        ModelNode::Object(Vec::new())
    }

    /// Create an empty list node
    pub fn list() -> Self {
        ModelNode::List(Vec::new())
    }

    /// Parse a JSON document; `null` values become `Undefined`
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(ModelNode::from(value))
    }

    /// Whether this node carries a value
    pub fn is_defined(&self) -> bool {
        !matches!(self, ModelNode::Undefined)
    }

    /// Look up a child by key
    ///
    /// Returns a reference to an `Undefined` node when this node is not an
    /// object or the key is absent, so lookups can be chained.
    pub fn get(&self, key: &str) -> &ModelNode {
        match self {
            ModelNode::Object(children) => children
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v)
                .unwrap_or(&UNDEFINED),
            _ => &UNDEFINED,
        }
    }

    /// Whether this object has a child with the given key
    pub fn has(&self, key: &str) -> bool {
        match self {
            ModelNode::Object(children) => children.iter().any(|(k, _)| k == key),
            _ => false,
        }
    }

    /// Mutable access to a child, creating it (and turning an undefined node
    /// into an object) when absent
    ///
    /// A defined non-object node is replaced by an empty object first.
    pub fn get_mut(&mut self, key: &str) -> &mut ModelNode {
        if !matches!(self, ModelNode::Object(_)) {
            *self = ModelNode::object();
        }
        let ModelNode::Object(children) = self else {
            unreachable!("node was just converted to an object");
        };
        let index = match children.iter().position(|(k, _)| k == key) {
            Some(index) => index,
            None => {
                children.push((key.to_string(), ModelNode::Undefined));
                children.len() - 1
            }
        };
        &mut children[index].1
    }

    /// Set a child value, returning `self` for chaining
    pub fn set(&mut self, key: &str, value: impl Into<ModelNode>) -> &mut Self {
        *self.get_mut(key) = value.into();
        self
    }

    /// Builder-style variant of [`ModelNode::set`]
    pub fn with(mut self, key: &str, value: impl Into<ModelNode>) -> Self {
        self.set(key, value);
        self
    }

    /// Remove a child, returning its previous value
    pub fn remove(&mut self, key: &str) -> Option<ModelNode> {
        match self {
            ModelNode::Object(children) => children
                .iter()
                .position(|(k, _)| k == key)
                .map(|index| children.remove(index).1),
            _ => None,
        }
    }

    /// Append an element, turning an undefined node into a list
    pub fn push(&mut self, value: impl Into<ModelNode>) -> &mut Self {
        if !self.is_defined() {
            *self = ModelNode::list();
        }
        if let ModelNode::List(items) = self {
            items.push(value.into());
        }
        self
    }

    /// Object keys in insertion order
    pub fn keys(&self) -> Vec<&str> {
        match self {
            ModelNode::Object(children) => children.iter().map(|(k, _)| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Object entries in insertion order
    pub fn entries(&self) -> &[(String, ModelNode)] {
        match self {
            ModelNode::Object(children) => children,
            _ => &[],
        }
    }

    /// String rendering used for field comparisons
    ///
    /// Booleans render as `true`/`false`, numbers in decimal, strings
    /// verbatim, undefined as `undefined`, lists and objects as compact JSON.
    pub fn as_string(&self) -> String {
        match self {
            ModelNode::Undefined => "undefined".to_string(),
            ModelNode::Boolean(b) => b.to_string(),
            ModelNode::Int(i) => i.to_string(),
            ModelNode::Double(d) => d.to_string(),
            ModelNode::String(s) => s.clone(),
            ModelNode::List(_) | ModelNode::Object(_) => self.to_json_string(),
        }
    }

    /// Borrow a string leaf
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ModelNode::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean value of a boolean leaf or a `"true"`/`"false"` string leaf
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ModelNode::Boolean(b) => Some(*b),
            ModelNode::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            ModelNode::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Elements of a list node
    pub fn as_list(&self) -> Option<&[ModelNode]> {
        match self {
            ModelNode::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the node's type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            ModelNode::Undefined => "UNDEFINED",
            ModelNode::Boolean(_) => "BOOLEAN",
            ModelNode::Int(_) => "LONG",
            ModelNode::Double(_) => "DOUBLE",
            ModelNode::String(_) => "STRING",
            ModelNode::List(_) => "LIST",
            ModelNode::Object(_) => "OBJECT",
        }
    }

    /// Compact JSON rendering
    pub fn to_json_string(&self) -> String {
        Value::from(self).to_string()
    }

    /// Pretty-printed JSON rendering, as written by multi-line sinks
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&Value::from(self)).unwrap_or_else(|_| self.to_json_string())
    }
}

impl From<Value> for ModelNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ModelNode::Undefined,
            Value::Bool(b) => ModelNode::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ModelNode::Int(i),
                None => ModelNode::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ModelNode::String(s),
            Value::Array(items) => ModelNode::List(items.into_iter().map(ModelNode::from).collect()),
            Value::Object(map) => {
                ModelNode::Object(map.into_iter().map(|(k, v)| (k, ModelNode::from(v))).collect())
            }
        }
    }
}

impl From<&ModelNode> for Value {
    fn from(node: &ModelNode) -> Self {
        match node {
            ModelNode::Undefined => Value::Null,
            ModelNode::Boolean(b) => Value::Bool(*b),
            ModelNode::Int(i) => Value::from(*i),
            ModelNode::Double(d) => Value::from(*d),
            ModelNode::String(s) => Value::String(s.clone()),
            ModelNode::List(items) => Value::Array(items.iter().map(Value::from).collect()),
            ModelNode::Object(children) => Value::Object(
                children
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for ModelNode {
    fn from(value: bool) -> Self {
        ModelNode::Boolean(value)
    }
}

impl From<i64> for ModelNode {
    fn from(value: i64) -> Self {
        ModelNode::Int(value)
    }
}

impl From<i32> for ModelNode {
    fn from(value: i32) -> Self {
        ModelNode::Int(i64::from(value))
    }
}

impl From<u16> for ModelNode {
    fn from(value: u16) -> Self {
        ModelNode::Int(i64::from(value))
    }
}

impl From<&str> for ModelNode {
    fn from(value: &str) -> Self {
        ModelNode::String(value.to_string())
    }
}

impl From<String> for ModelNode {
    fn from(value: String) -> Self {
        ModelNode::String(value)
    }
}

impl From<Vec<ModelNode>> for ModelNode {
    fn from(value: Vec<ModelNode>) -> Self {
        ModelNode::List(value)
    }
}

impl PartialEq for ModelNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ModelNode::Undefined, ModelNode::Undefined) => true,
            (ModelNode::Boolean(a), ModelNode::Boolean(b)) => a == b,
            (ModelNode::Int(a), ModelNode::Int(b)) => a == b,
            (ModelNode::Double(a), ModelNode::Double(b)) => a == b,
            (ModelNode::String(a), ModelNode::String(b)) => a == b,
            (ModelNode::List(a), ModelNode::List(b)) => a == b,
            // Keys are unique within an object
            (ModelNode::Object(a), ModelNode::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter().any(|(other_key, other_value)| {
                            other_key == key && other_value == value
                        })
                    })
            }
            _ => false,
        }
    }
}

impl Serialize for ModelNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Value::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ModelNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ModelNode::from)
    }
}

impl fmt::Display for ModelNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}
