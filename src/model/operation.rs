// Management operation builders and results

use super::{ModelNode, PathAddress};
use crate::constants::{FAILED, FAILURE_DESCRIPTION, OUTCOME, RESULT, SUCCESS};

pub const OP: &str = "operation";
pub const OP_ADDR: &str = "address";
pub const NAME: &str = "name";
pub const VALUE: &str = "value";

pub const ADD: &str = "add";
pub const REMOVE: &str = "remove";
pub const READ_ATTRIBUTE: &str = "read-attribute";
pub const WRITE_ATTRIBUTE: &str = "write-attribute";
pub const READ_RESOURCE: &str = "read-resource";

/// Skeleton of an operation: its name and target address
pub fn empty_operation(name: &str, address: &PathAddress) -> ModelNode {
    ModelNode::object()
        .with(OP, name)
        .with(OP_ADDR, address.to_model_node())
}

/// `write-attribute` of `name` to `value` on `address`
pub fn write_attribute(address: &PathAddress, name: &str, value: impl Into<ModelNode>) -> ModelNode {
    empty_operation(WRITE_ATTRIBUTE, address)
        .with(NAME, name)
        .with(VALUE, value)
}

/// `read-attribute` of `name` on `address`
pub fn read_attribute(address: &PathAddress, name: &str) -> ModelNode {
    empty_operation(READ_ATTRIBUTE, address).with(NAME, name)
}

/// `add` of a resource at `address` with initial attribute values
pub fn add<'a>(
    address: &PathAddress,
    attributes: impl IntoIterator<Item = (&'a str, ModelNode)>,
) -> ModelNode {
    let mut op = empty_operation(ADD, address);
    for (name, value) in attributes {
        op.set(name, value);
    }
    op
}

/// `remove` of the resource at `address`
pub fn remove(address: &PathAddress) -> ModelNode {
    empty_operation(REMOVE, address)
}

/// `read-resource` of the resource at `address`
pub fn read_resource(address: &PathAddress) -> ModelNode {
    empty_operation(READ_RESOURCE, address)
}

/// Name of an operation document
pub fn operation_name(op: &ModelNode) -> String {
    op.get(OP).as_string()
}

/// Target address of an operation document
pub fn operation_address(op: &ModelNode) -> Option<PathAddress> {
    PathAddress::from_model_node(op.get(OP_ADDR))
}

/// Result document of a management request
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    node: ModelNode,
}

impl OperationResult {
    /// Successful outcome carrying `result`
    pub fn success(result: impl Into<ModelNode>) -> Self {
        Self {
            node: ModelNode::object()
                .with(OUTCOME, SUCCESS)
                .with(RESULT, result),
        }
    }

    /// Failed outcome carrying a `failure-description`
    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            node: ModelNode::object()
                .with(OUTCOME, FAILED)
                .with(FAILURE_DESCRIPTION, description.into()),
        }
    }

    pub fn outcome(&self) -> String {
        self.node.get(OUTCOME).as_string()
    }

    pub fn is_success(&self) -> bool {
        self.outcome() == SUCCESS
    }

    pub fn failure_description(&self) -> String {
        self.node.get(FAILURE_DESCRIPTION).as_string()
    }

    pub fn result(&self) -> &ModelNode {
        self.node.get(RESULT)
    }
}
