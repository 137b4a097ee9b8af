// Configuration tree addresses

use super::ModelNode;
use crate::constants::{
    ACCESS, AUDIT, AUDIT_LOG, AUTHENTICATION, CORE_SERVICE, FILE_HANDLER, HANDLER, LOCAL, LOGGER,
    MANAGEMENT, MANAGEMENT_REALM, SECURITY_REALM, SYSLOG_HANDLER,
};
use std::fmt;

/// One `key=value` step of a configuration path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathElement {
    pub key: String,
    pub value: String,
}

impl PathElement {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Ordered sequence of path elements naming a node in the configuration tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PathAddress {
    elements: Vec<PathElement>,
}

impl PathAddress {
    /// The root address
    pub fn root() -> Self {
        Self::default()
    }

    /// Build an address from `(key, value)` pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            elements: pairs
                .into_iter()
                .map(|(k, v)| PathElement::new(k, v))
                .collect(),
        }
    }

    /// Child address one level below this one
    pub fn append(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut elements = self.elements.clone();
        elements.push(PathElement::new(key, value));
        Self { elements }
    }

    /// Parent address, or `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.elements.is_empty() {
            return None;
        }
        Some(Self {
            elements: self.elements[..self.elements.len() - 1].to_vec(),
        })
    }

    /// Last element of the address
    pub fn last(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn is_root(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether `other` lies at or below this address
    pub fn is_prefix_of(&self, other: &PathAddress) -> bool {
        other.elements.len() >= self.elements.len()
            && self.elements.iter().zip(&other.elements).all(|(a, b)| a == b)
    }

    /// Wire form used in operations: a list of single-key objects
    pub fn to_model_node(&self) -> ModelNode {
        ModelNode::List(
            self.elements
                .iter()
                .map(|e| ModelNode::object().with(&e.key, e.value.as_str()))
                .collect(),
        )
    }

    /// Parse the wire form; `Undefined` is the root address
    pub fn from_model_node(node: &ModelNode) -> Option<Self> {
        match node {
            ModelNode::Undefined => Some(Self::root()),
            ModelNode::List(items) => {
                let mut elements = Vec::with_capacity(items.len());
                for item in items {
                    let [(key, value)] = item.entries() else {
                        return None;
                    };
                    elements.push(PathElement::new(key.clone(), value.as_str()?));
                }
                Some(Self { elements })
            }
            _ => None,
        }
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements.is_empty() {
            return f.write_str("/");
        }
        for element in &self.elements {
            write!(f, "/{}", element)?;
        }
        Ok(())
    }
}

/// `core-service=management`
pub fn management_address() -> PathAddress {
    PathAddress::from_pairs([(CORE_SERVICE, MANAGEMENT)])
}

/// Local authentication of the management realm, holding `default-user`
pub fn local_authentication_address() -> PathAddress {
    management_address()
        .append(SECURITY_REALM, MANAGEMENT_REALM)
        .append(AUTHENTICATION, LOCAL)
}

/// `core-service=management/access=audit`
pub fn audit_access_address() -> PathAddress {
    management_address().append(ACCESS, AUDIT)
}

/// The audit-log logger, holding `enabled`, `log-boot` and `log-read-only`
pub fn audit_logger_address() -> PathAddress {
    audit_access_address().append(LOGGER, AUDIT_LOG)
}

/// Declaration of a file audit handler
pub fn file_handler_address(name: &str) -> PathAddress {
    audit_access_address().append(FILE_HANDLER, name)
}

/// Declaration of a syslog audit handler
pub fn syslog_handler_address(name: &str) -> PathAddress {
    audit_access_address().append(SYSLOG_HANDLER, name)
}

/// Reference from the audit-log logger to a handler
pub fn logger_handler_reference_address(name: &str) -> PathAddress {
    audit_logger_address().append(HANDLER, name)
}
