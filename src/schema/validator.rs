//! Fail-fast validation of a parameter document against a [`ParameterSchema`].
//!
//! The schema is walked depth-first in declaration order. For every node the
//! checks run in a fixed order: presence, type, probability range, group
//! accumulation, custom check. The first violation is returned. Once the whole
//! tree has been visited, every group with the `Exact` policy must sum to 1.
//!
//! Paths are dotted key chains from the root; list elements carry their index,
//! e.g. `triage.levels[1].wait_time`.

use std::collections::BTreeMap;

use tracing::debug;

use super::{GroupPolicy, NodeType, Parameter, ParameterSchema};
use crate::error::ValidationError;
use crate::value::Value;

/// Slack allowed when comparing a group sum with 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Validates `document` against `schema`.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered. A document root that is
/// not a record is reported as a `TypeMismatch` on the empty path.
pub fn validate(schema: &ParameterSchema, document: &Value) -> Result<(), ValidationError> {
    let root = document.as_record().ok_or(ValidationError::TypeMismatch {
        path: String::new(),
        expected: "record",
        actual: document.type_name(),
    })?;

    debug!(nodes = schema.nodes().len(), "validating parameter document");

    let mut walker = Walker {
        schema,
        sums: BTreeMap::new(),
    };
    walker.nodes(schema.nodes(), root, "")?;
    walker.finish()?;

    debug!(groups = walker.sums.len(), "parameter document is valid");
    Ok(())
}

struct Walker<'a> {
    schema: &'a ParameterSchema,
    sums: BTreeMap<String, f64>,
}

impl Walker<'_> {
    fn nodes(
        &mut self,
        nodes: &[Parameter],
        level: &BTreeMap<String, Value>,
        prefix: &str,
    ) -> Result<(), ValidationError> {
        for node in nodes {
            let path = join(prefix, node.key());
            let value = level
                .get(node.key())
                .ok_or_else(|| ValidationError::MissingParameter { path: path.clone() })?;
            self.node(node, value, path)?;
        }
        Ok(())
    }

    fn node(&mut self, node: &Parameter, value: &Value, path: String) -> Result<(), ValidationError> {
        match node.node_type() {
            NodeType::Group(children) => {
                let record = value.as_record().ok_or_else(|| ValidationError::TypeMismatch {
                    path: path.clone(),
                    expected: "record",
                    actual: value.type_name(),
                })?;
                self.nodes(children, record, &path)
            }
            NodeType::List(children) => {
                let items = value.as_list().ok_or_else(|| ValidationError::TypeMismatch {
                    path: path.clone(),
                    expected: "list",
                    actual: value.type_name(),
                })?;
                if items.is_empty() {
                    return Err(ValidationError::EmptyList { path });
                }
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    let record = item.as_record().ok_or_else(|| ValidationError::TypeMismatch {
                        path: item_path.clone(),
                        expected: "record",
                        actual: item.type_name(),
                    })?;
                    self.nodes(children, record, &item_path)?;
                }
                Ok(())
            }
            NodeType::Scalar(kind) => {
                if !kind.matches(value) {
                    return Err(ValidationError::TypeMismatch {
                        path,
                        expected: kind.name(),
                        actual: value.type_name(),
                    });
                }
                self.leaf(node, value, path)
            }
        }
    }

    fn leaf(&mut self, node: &Parameter, value: &Value, path: String) -> Result<(), ValidationError> {
        if node.is_probability() {
            // Only float leaves can be probabilities, the builder rejects the rest.
            let p = value.as_float().unwrap_or(f64::NAN);
            if !(0.0..1.0).contains(&p) {
                return Err(ValidationError::ProbabilityOutOfRange { path, value: p });
            }
            if let Some(group) = node.probability_group() {
                let sum = self.sums.entry(group.to_string()).or_insert(0.0);
                *sum += p;
                if *sum > 1.0 + PROBABILITY_TOLERANCE {
                    return Err(ValidationError::ProbabilityGroupOverflow {
                        group: group.to_string(),
                        sum: *sum,
                    });
                }
            }
        }

        if let Some(check) = node.custom_check() {
            check(value).map_err(|message| ValidationError::CustomValidationFailed { path, message })?;
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), ValidationError> {
        for (group, sum) in &self.sums {
            let policy = self.schema.groups().get(group).copied().unwrap_or_default();
            if policy == GroupPolicy::Exact && *sum < 1.0 - PROBABILITY_TOLERANCE {
                return Err(ValidationError::ProbabilityGroupIncomplete {
                    group: group.clone(),
                    sum: *sum,
                });
            }
        }
        Ok(())
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}
