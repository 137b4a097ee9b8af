// Expected audit record fields

use crate::constants::{AUDIT_RECORD_TYPE, DEFAULT_AUDIT_USER, NATIVE_ACCESS};
use crate::error::{HarnessError, HarnessResult};
use crate::model::ModelNode;

/// Invariant a single record field must satisfy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// String rendering equals the given value
    Equals(String),
    /// Field carries a value
    Defined,
    /// Field is absent or has no value
    Undefined,
    /// Field is a list of the given length
    ListLength(usize),
}

impl FieldRule {
    fn describe(&self) -> String {
        match self {
            FieldRule::Equals(value) => format!("\"{}\"", value),
            FieldRule::Defined => "a defined value".to_string(),
            FieldRule::Undefined => "undefined".to_string(),
            FieldRule::ListLength(len) => format!("a list of length {}", len),
        }
    }

    /// Returns a description of the actual value when the rule is violated
    fn violation(&self, node: &ModelNode) -> Option<String> {
        match self {
            FieldRule::Equals(expected) => {
                let actual = node.as_string();
                (actual != *expected).then(|| format!("\"{}\"", actual))
            }
            FieldRule::Defined => (!node.is_defined()).then(|| "undefined".to_string()),
            FieldRule::Undefined => node.is_defined().then(|| node.to_json_string()),
            FieldRule::ListLength(expected) => match node.as_list() {
                Some(items) if items.len() == *expected => None,
                Some(items) => Some(format!("a list of length {}", items.len())),
                None => Some(format!("{} {}", node.type_name(), node)),
            },
        }
    }
}

/// Field invariants of a management audit record produced by one successful
/// write over the native channel of a standalone server
#[derive(Debug, Clone)]
pub struct ExpectedAuditFields {
    rules: Vec<(&'static str, FieldRule)>,
}

impl ExpectedAuditFields {
    /// Expectations for a record written on behalf of `user`
    pub fn for_user(user: &str) -> Self {
        let rules = vec![
            ("type", FieldRule::Equals(AUDIT_RECORD_TYPE.to_string())),
            ("r/o", FieldRule::Equals("false".to_string())),
            ("booting", FieldRule::Equals("false".to_string())),
            ("version", FieldRule::Defined),
            ("user", FieldRule::Equals(user.to_string())),
            ("domainUUID", FieldRule::Undefined),
            ("access", FieldRule::Equals(NATIVE_ACCESS.to_string())),
            ("remote-address", FieldRule::Defined),
            ("success", FieldRule::Equals("true".to_string())),
            ("ops", FieldRule::ListLength(1)),
        ];
        Self { rules }
    }

    /// Replace the rule of one field
    pub fn with_rule(mut self, field: &'static str, rule: FieldRule) -> Self {
        match self.rules.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = rule,
            None => self.rules.push((field, rule)),
        }
        self
    }

    pub fn rules(&self) -> &[(&'static str, FieldRule)] {
        &self.rules
    }

    /// Check `record`, failing on the first field that violates its rule
    ///
    /// `label` names the sink the record came from and is part of the error.
    pub fn check(&self, label: &str, record: &ModelNode) -> HarnessResult<()> {
        for (field, rule) in &self.rules {
            if let Some(actual) = rule.violation(record.get(field)) {
                return Err(HarnessError::FieldInvariant {
                    label: label.to_string(),
                    field: (*field).to_string(),
                    expected: rule.describe(),
                    actual,
                });
            }
        }
        tracing::debug!(label = %label, fields = self.rules.len(), "Audit record fields verified");
        Ok(())
    }
}

impl Default for ExpectedAuditFields {
    fn default() -> Self {
        Self::for_user(DEFAULT_AUDIT_USER)
    }
}

/// Check `record` against the default expectations
pub fn check(label: &str, record: &ModelNode) -> HarnessResult<()> {
    ExpectedAuditFields::default().check(label, record)
}
