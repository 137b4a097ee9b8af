//! Management resource tree of the embedded server
//!
//! Resources are keyed by address and hold an object of attribute values.
//! The tree executes the handful of generic operations the harness needs
//! (`add`, `remove`, `read-attribute`, `write-attribute`, `read-resource`).

use std::collections::BTreeMap;

use crate::constants::{
    AUTHENTICATION, DEFAULT_FILE_HANDLER_NAME, DEFAULT_USER, ENABLED, FILE_HANDLER, HANDLER,
    LOGGER, LOG_BOOT, LOG_READ_ONLY, PLATFORM_DEFAULT_USER, PROTOCOL, SYSLOG_HANDLER,
};
use crate::model::address::{
    audit_access_address, audit_logger_address, file_handler_address, local_authentication_address,
    logger_handler_reference_address, management_address, syslog_handler_address,
};
use crate::model::operation::{
    self, operation_address, operation_name, ADD, NAME, OP, OP_ADDR, READ_ATTRIBUTE,
    READ_RESOURCE, REMOVE, VALUE, WRITE_ATTRIBUTE,
};
use crate::model::{ModelNode, OperationResult, PathAddress};

/// Default audit file name, relative to the server data directory
pub const DEFAULT_AUDIT_FILE_NAME: &str = "audit-log.log";

/// Path variable naming the server data directory
pub const SERVER_DATA_DIR: &str = "jboss.server.data.dir";

/// Whether an operation only reads the model
pub fn is_read_only(operation_name: &str) -> bool {
    operation_name.starts_with("read-")
}

/// Attribute defaults of a resource type; `None` for types without a schema
fn attribute_defaults(resource_type: &str) -> Option<ModelNode> {
    let defaults = match resource_type {
        AUTHENTICATION => ModelNode::object().with(DEFAULT_USER, PLATFORM_DEFAULT_USER),
        LOGGER => ModelNode::object()
            .with(ENABLED, true)
            .with(LOG_BOOT, true)
            .with(LOG_READ_ONLY, false),
        FILE_HANDLER => ModelNode::object()
            .with("formatter", "json-formatter")
            .with("path", DEFAULT_AUDIT_FILE_NAME)
            .with("relative-to", SERVER_DATA_DIR)
            .with("max-failure-count", 10),
        SYSLOG_HANDLER => ModelNode::object()
            .with("formatter", "json-formatter")
            .with("syslog-format", "RFC5424")
            .with("app-name", ModelNode::Undefined)
            .with("facility", "USER_LEVEL")
            .with("max-failure-count", 10),
        PROTOCOL => ModelNode::object()
            .with("host", "localhost")
            .with("port", 514),
        HANDLER => ModelNode::object(),
        _ => return None,
    };
    Some(defaults)
}

/// Convert `value` to the type of the attribute's current value
fn coerce(current: &ModelNode, value: &ModelNode) -> Result<ModelNode, String> {
    match current {
        ModelNode::Boolean(_) => value
            .as_bool()
            .map(ModelNode::Boolean)
            .ok_or_else(|| format!("Wrong type for boolean attribute: {}", value)),
        ModelNode::Int(_) => match value {
            ModelNode::Int(i) => Ok(ModelNode::Int(*i)),
            ModelNode::String(s) => s
                .parse::<i64>()
                .map(ModelNode::Int)
                .map_err(|_| format!("Wrong type for integer attribute: {}", value)),
            _ => Err(format!("Wrong type for integer attribute: {}", value)),
        },
        _ => Ok(value.clone()),
    }
}

/// Configuration tree of a standalone server
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceTree {
    resources: BTreeMap<PathAddress, ModelNode>,
}

impl ResourceTree {
    /// Out-of-the-box standalone configuration
    ///
    /// The audit logger exists but is disabled, writes to the `file` handler
    /// and does not log boot operations.
    pub fn standalone_defaults() -> Self {
        let mut resources = BTreeMap::new();
        resources.insert(PathAddress::root(), ModelNode::object());
        resources.insert(management_address(), ModelNode::object());
        if let Some(realm) = local_authentication_address().parent() {
            resources.insert(realm, ModelNode::object());
        }
        resources.insert(
            local_authentication_address(),
            ModelNode::object().with(DEFAULT_USER, PLATFORM_DEFAULT_USER),
        );
        resources.insert(audit_access_address(), ModelNode::object());
        resources.insert(
            file_handler_address(DEFAULT_FILE_HANDLER_NAME),
            attribute_defaults(FILE_HANDLER).unwrap_or_default(),
        );
        resources.insert(
            audit_logger_address(),
            ModelNode::object()
                .with(ENABLED, false)
                .with(LOG_BOOT, false)
                .with(LOG_READ_ONLY, false),
        );
        resources.insert(
            logger_handler_reference_address(DEFAULT_FILE_HANDLER_NAME),
            ModelNode::object(),
        );
        Self { resources }
    }

    pub fn contains(&self, address: &PathAddress) -> bool {
        self.resources.contains_key(address)
    }

    /// Attribute value, `Undefined` when the resource or attribute is absent
    pub fn attribute(&self, address: &PathAddress, name: &str) -> &ModelNode {
        static UNDEFINED: ModelNode = ModelNode::Undefined;
        self.resources
            .get(address)
            .map(|attrs| attrs.get(name))
            .unwrap_or(&UNDEFINED)
    }

    /// Names of the direct children of `address` with the given type
    pub fn children(&self, address: &PathAddress, child_type: &str) -> Vec<String> {
        let depth = address.elements().len() + 1;
        self.resources
            .keys()
            .filter(|a| a.elements().len() == depth && address.is_prefix_of(a))
            .filter_map(|a| a.last())
            .filter(|e| e.key == child_type)
            .map(|e| e.value.clone())
            .collect()
    }

    /// Execute one operation against the tree
    pub fn execute(&mut self, op: &ModelNode) -> OperationResult {
        let Some(address) = operation_address(op) else {
            return OperationResult::failed(format!("Invalid operation address: {}", op.get(OP_ADDR)));
        };
        let name = operation_name(op);
        match name.as_str() {
            ADD => self.add(&address, op),
            REMOVE => self.remove(&address),
            WRITE_ATTRIBUTE => self.write_attribute(&address, &op.get(NAME).as_string(), op.get(VALUE)),
            READ_ATTRIBUTE => self.read_attribute(&address, &op.get(NAME).as_string()),
            READ_RESOURCE => self.read_resource(&address),
            _ => OperationResult::failed(format!(
                "No operation named '{}' exists at address {}",
                name, address
            )),
        }
    }

    fn not_found(address: &PathAddress) -> OperationResult {
        OperationResult::failed(format!("Management resource '{}' not found", address))
    }

    fn add(&mut self, address: &PathAddress, op: &ModelNode) -> OperationResult {
        if self.contains(address) {
            return OperationResult::failed(format!("Duplicate resource {}", address));
        }
        let Some(parent) = address.parent() else {
            return OperationResult::failed("Cannot add the root resource");
        };
        if !self.contains(&parent) {
            return Self::not_found(&parent);
        }

        let resource_type = address.last().map(|e| e.key.as_str()).unwrap_or_default();
        if resource_type == HANDLER {
            let handler = address.last().map(|e| e.value.as_str()).unwrap_or_default();
            if !self.contains(&syslog_handler_address(handler))
                && !self.contains(&file_handler_address(handler))
            {
                return OperationResult::failed(format!("No handler called '{}' exists", handler));
            }
        }

        let defaults = attribute_defaults(resource_type);
        let mut attributes = defaults.clone().unwrap_or_else(ModelNode::object);
        for (key, value) in op.entries() {
            if key == OP || key == OP_ADDR {
                continue;
            }
            match &defaults {
                Some(defaults) if !defaults.has(key) => {
                    return OperationResult::failed(format!(
                        "'{}' is not a valid parameter for {}",
                        key, address
                    ));
                }
                Some(defaults) => match coerce(defaults.get(key), value) {
                    Ok(v) => {
                        attributes.set(key, v);
                    }
                    Err(e) => return OperationResult::failed(e),
                },
                None => {
                    attributes.set(key, value.clone());
                }
            }
        }

        self.resources.insert(address.clone(), attributes);
        OperationResult::success(ModelNode::Undefined)
    }

    fn remove(&mut self, address: &PathAddress) -> OperationResult {
        if address.is_root() {
            return OperationResult::failed("Cannot remove the root resource");
        }
        if !self.contains(address) {
            return Self::not_found(address);
        }

        if let Some(last) = address.last() {
            if last.key == SYSLOG_HANDLER || last.key == FILE_HANDLER {
                let reference = logger_handler_reference_address(&last.value);
                if self.contains(&reference) {
                    return OperationResult::failed(format!(
                        "Handler '{}' is still referenced by {}",
                        last.value, reference
                    ));
                }
            }
        }

        self.resources.retain(|a, _| !address.is_prefix_of(a));
        OperationResult::success(ModelNode::Undefined)
    }

    fn write_attribute(&mut self, address: &PathAddress, name: &str, value: &ModelNode) -> OperationResult {
        let Some(attributes) = self.resources.get_mut(address) else {
            return Self::not_found(address);
        };
        if !attributes.has(name) {
            return OperationResult::failed(format!(
                "Unknown attribute '{}' at {}",
                name, address
            ));
        }
        match coerce(attributes.get(name), value) {
            Ok(v) => {
                attributes.set(name, v);
                OperationResult::success(ModelNode::Undefined)
            }
            Err(e) => OperationResult::failed(e),
        }
    }

    fn read_attribute(&self, address: &PathAddress, name: &str) -> OperationResult {
        match self.resources.get(address) {
            Some(attributes) if attributes.has(name) => {
                OperationResult::success(attributes.get(name).clone())
            }
            Some(_) => OperationResult::failed(format!(
                "Unknown attribute '{}' at {}",
                name, address
            )),
            None => Self::not_found(address),
        }
    }

    fn read_resource(&self, address: &PathAddress) -> OperationResult {
        let Some(attributes) = self.resources.get(address) else {
            return Self::not_found(address);
        };
        let mut result = attributes.clone();
        if !result.is_defined() {
            result = ModelNode::object();
        }
        let depth = address.elements().len() + 1;
        for child in self
            .resources
            .keys()
            .filter(|a| a.elements().len() == depth && address.is_prefix_of(a))
        {
            if let Some(last) = child.last() {
                result.get_mut(&last.key).set(&last.value, ModelNode::Undefined);
            }
        }
        OperationResult::success(result)
    }

    /// Operations that rebuild this tree from scratch, parents first
    pub fn boot_operations(&self) -> Vec<ModelNode> {
        self.resources
            .iter()
            .filter(|(address, _)| !address.is_root())
            .map(|(address, attributes)| {
                operation::add(
                    address,
                    attributes
                        .entries()
                        .iter()
                        .map(|(k, v)| (k.as_str(), v.clone())),
                )
            })
            .collect()
    }
}

impl Default for ResourceTree {
    fn default() -> Self {
        Self::standalone_defaults()
    }
}
