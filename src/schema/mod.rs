//! Declarative parameter schema.
//!
//! A schema is an immutable tree of [`Parameter`] declarations. Leaves carry a
//! concrete [`Kind`] plus optional probability semantics and a custom check;
//! inner nodes are either a nested group of parameters or a list of records
//! sharing one child schema.
//!
//! Schemas are never mutated once built. A consumer that needs extra entries
//! calls [`ParameterSchema::extend`], which seeds a builder with a copy of the
//! declarations, and builds its own instance.

pub mod hospital;
pub mod validator;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::value::Value;

pub use validator::{validate, PROBABILITY_TOLERANCE};

/// Concrete value kind of a leaf parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Float,
    Int,
    String,
    Duration,
    Matrix,
}

impl Kind {
    /// Name used in type mismatch errors; matches [`Value::type_name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::String => "string",
            Self::Duration => "time period",
            Self::Matrix => "int matrix",
        }
    }

    /// Whether `value` has this kind. Numeric kinds are never coerced.
    #[must_use]
    pub const fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Float, Value::Float(_))
                | (Self::Int, Value::Int(_))
                | (Self::String, Value::String(_))
                | (Self::Duration, Value::Duration(_))
                | (Self::Matrix, Value::Matrix(_))
        )
    }
}

/// A custom predicate over a resolved leaf value. `Err` carries the message
/// reported in `ValidationError::CustomValidationFailed`.
pub type Check = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Shape of a parameter declaration.
#[derive(Clone)]
pub enum NodeType {
    Scalar(Kind),
    Group(Vec<Parameter>),
    List(Vec<Parameter>),
}

/// A named parameter declaration.
#[derive(Clone)]
pub struct Parameter {
    key: String,
    node_type: NodeType,
    probability: bool,
    group: Option<String>,
    check: Option<Check>,
    help: Option<String>,
}

impl Parameter {
    fn new(key: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            key: key.into(),
            node_type,
            probability: false,
            group: None,
            check: None,
            help: None,
        }
    }

    /// A leaf of the given kind.
    #[must_use]
    pub fn scalar(key: impl Into<String>, kind: Kind) -> Self {
        Self::new(key, NodeType::Scalar(kind))
    }

    #[must_use]
    pub fn float(key: impl Into<String>) -> Self {
        Self::scalar(key, Kind::Float)
    }

    #[must_use]
    pub fn int(key: impl Into<String>) -> Self {
        Self::scalar(key, Kind::Int)
    }

    #[must_use]
    pub fn string(key: impl Into<String>) -> Self {
        Self::scalar(key, Kind::String)
    }

    #[must_use]
    pub fn duration(key: impl Into<String>) -> Self {
        Self::scalar(key, Kind::Duration)
    }

    #[must_use]
    pub fn matrix(key: impl Into<String>) -> Self {
        Self::scalar(key, Kind::Matrix)
    }

    /// A float leaf that must lie in `[0, 1)`.
    #[must_use]
    pub fn probability(key: impl Into<String>) -> Self {
        Self::float(key).as_probability()
    }

    /// A nested record of parameters.
    #[must_use]
    pub fn group(key: impl Into<String>, children: impl IntoIterator<Item = Parameter>) -> Self {
        Self::new(key, NodeType::Group(children.into_iter().collect()))
    }

    /// A non-empty list of records, each validated against `children`.
    #[must_use]
    pub fn list(key: impl Into<String>, children: impl IntoIterator<Item = Parameter>) -> Self {
        Self::new(key, NodeType::List(children.into_iter().collect()))
    }

    /// Marks the leaf as a probability in `[0, 1)`.
    #[must_use]
    pub fn as_probability(mut self) -> Self {
        self.probability = true;
        self
    }

    /// Adds the leaf to a probability group. Implies [`Self::as_probability`].
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.probability = true;
        self.group = Some(group.into());
        self
    }

    /// Attaches a custom check to the leaf.
    #[must_use]
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }

    #[must_use]
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    #[must_use]
    pub const fn is_probability(&self) -> bool {
        self.probability
    }

    #[must_use]
    pub fn probability_group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[must_use]
    pub fn custom_check(&self) -> Option<&Check> {
        self.check.as_ref()
    }

    #[must_use]
    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Child declarations of a group or list node.
    #[must_use]
    pub fn children(&self) -> &[Parameter] {
        match &self.node_type {
            NodeType::Group(c) | NodeType::List(c) => c,
            NodeType::Scalar(_) => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Parameter>> {
        match &mut self.node_type {
            NodeType::Group(c) | NodeType::List(c) => Some(c),
            NodeType::Scalar(_) => None,
        }
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Parameter");
        s.field("key", &self.key);
        match &self.node_type {
            NodeType::Scalar(kind) => s.field("kind", kind),
            NodeType::Group(children) => s.field("group", children),
            NodeType::List(children) => s.field("list", children),
        };
        s.field("probability", &self.probability)
            .field("group", &self.group)
            .field("check", &self.check.is_some())
            .finish()
    }
}

/// How the sum of a probability group is constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupPolicy {
    /// The members must sum to exactly 1.
    #[default]
    Exact,
    /// The members must not sum to more than 1.
    AtMost,
}

/// An immutable, validated schema.
#[derive(Debug, Clone)]
pub struct ParameterSchema {
    nodes: Vec<Parameter>,
    groups: BTreeMap<String, GroupPolicy>,
}

impl ParameterSchema {
    /// Starts an empty schema.
    #[must_use]
    pub fn builder() -> ParameterSchemaBuilder {
        ParameterSchemaBuilder::default()
    }

    /// Starts a new schema seeded with a copy of this one.
    #[must_use]
    pub fn extend(&self) -> ParameterSchemaBuilder {
        let policies = self.groups.clone();
        ParameterSchemaBuilder {
            nodes: self.nodes.clone(),
            policies,
            error: None,
        }
    }

    /// Top-level declarations in traversal order.
    #[must_use]
    pub fn nodes(&self) -> &[Parameter] {
        &self.nodes
    }

    /// Every probability group used by the schema with its policy.
    #[must_use]
    pub const fn groups(&self) -> &BTreeMap<String, GroupPolicy> {
        &self.groups
    }

    /// Every leaf declaration in traversal order with its dotted path. List
    /// members are written as `key[].child`.
    #[must_use]
    pub fn leaves(&self) -> Vec<(String, &Parameter)> {
        fn walk<'a>(prefix: &str, nodes: &'a [Parameter], out: &mut Vec<(String, &'a Parameter)>) {
            for node in nodes {
                let path = if prefix.is_empty() {
                    node.key().to_string()
                } else {
                    format!("{prefix}.{}", node.key())
                };
                match node.node_type() {
                    NodeType::Scalar(_) => out.push((path, node)),
                    NodeType::Group(children) => walk(&path, children, out),
                    NodeType::List(children) => walk(&format!("{path}[]"), children, out),
                }
            }
        }

        let mut out = Vec::new();
        walk("", &self.nodes, &mut out);
        out
    }

    /// Validates a parameter document against this schema.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, see [`validator::validate`].
    pub fn validate(&self, document: &Value) -> Result<(), ValidationError> {
        validator::validate(self, document)
    }
}

/// Builder for [`ParameterSchema`].
///
/// # Example
/// ```
/// use hospital_scenario::schema::{GroupPolicy, Parameter, ParameterSchema};
///
/// let schema = ParameterSchema::builder()
///     .node(Parameter::list("doctors", [
///         Parameter::string("specialty"),
///         Parameter::float("probability").in_group("doctors"),
///     ]))
///     .group_policy("doctors", GroupPolicy::Exact)
///     .build()
///     .unwrap();
/// assert_eq!(schema.nodes().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParameterSchemaBuilder {
    nodes: Vec<Parameter>,
    policies: BTreeMap<String, GroupPolicy>,
    error: Option<ValidationError>,
}

impl ParameterSchemaBuilder {
    /// Adds a top-level declaration.
    #[must_use]
    pub fn node(mut self, node: Parameter) -> Self {
        if self.error.is_none() {
            if let Err(e) = push_unique(&mut self.nodes, node, "") {
                self.error = Some(e);
            }
        }
        self
    }

    /// Adds several top-level declarations.
    #[must_use]
    pub fn nodes(self, nodes: impl IntoIterator<Item = Parameter>) -> Self {
        nodes.into_iter().fold(self, Self::node)
    }

    /// Adds a declaration inside the group or list found at the dotted
    /// `parent` path, e.g. `"icu.environment"`.
    #[must_use]
    pub fn child(mut self, parent: &str, node: Parameter) -> Self {
        if self.error.is_some() {
            return self;
        }
        let result = match find_mut(&mut self.nodes, parent) {
            Some(children) => push_unique(children, node, parent),
            None => Err(ValidationError::InvalidSchema {
                path: parent.to_string(),
                reason: "no group or list declared at this path".to_string(),
            }),
        };
        if let Err(e) = result {
            self.error = Some(e);
        }
        self
    }

    /// Declares how a probability group's sum is checked. Groups without a
    /// declared policy use [`GroupPolicy::Exact`].
    #[must_use]
    pub fn group_policy(mut self, group: impl Into<String>, policy: GroupPolicy) -> Self {
        self.policies.insert(group.into(), policy);
        self
    }

    /// Builds the schema.
    ///
    /// Returns `ValidationError::InvalidSchema` for duplicate keys, probability
    /// semantics on a non-float leaf, a bad `child` path, or a policy declared
    /// for a group no parameter belongs to.
    pub fn build(self) -> Result<ParameterSchema, ValidationError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let mut used = BTreeSet::new();
        check_nodes(&self.nodes, "", &mut used)?;

        if let Some(unused) = self.policies.keys().find(|g| !used.contains(*g)) {
            return Err(ValidationError::InvalidSchema {
                path: unused.clone(),
                reason: "policy declared for a group no parameter belongs to".to_string(),
            });
        }

        let groups = used
            .into_iter()
            .map(|g| {
                let policy = self.policies.get(&g).copied().unwrap_or_default();
                (g, policy)
            })
            .collect();

        Ok(ParameterSchema {
            nodes: self.nodes,
            groups,
        })
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn push_unique(nodes: &mut Vec<Parameter>, node: Parameter, prefix: &str) -> Result<(), ValidationError> {
    if nodes.iter().any(|n| n.key == node.key) {
        return Err(ValidationError::InvalidSchema {
            path: join(prefix, &node.key),
            reason: "duplicate key".to_string(),
        });
    }
    nodes.push(node);
    Ok(())
}

fn find_mut<'a>(nodes: &'a mut [Parameter], path: &str) -> Option<&'a mut Vec<Parameter>> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let node = nodes.iter_mut().find(|n| n.key == head)?;
    let children = node.children_mut()?;
    match rest {
        Some(rest) => find_mut(children, rest),
        None => Some(children),
    }
}

fn check_nodes(
    nodes: &[Parameter],
    prefix: &str,
    used: &mut BTreeSet<String>,
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for node in nodes {
        let path = join(prefix, &node.key);
        if !seen.insert(node.key.as_str()) {
            return Err(ValidationError::InvalidSchema {
                path,
                reason: "duplicate key".to_string(),
            });
        }
        match &node.node_type {
            NodeType::Scalar(kind) => {
                if node.probability && *kind != Kind::Float {
                    return Err(ValidationError::InvalidSchema {
                        path,
                        reason: format!("a probability must be a float, not {}", kind.name()),
                    });
                }
                if let Some(group) = &node.group {
                    used.insert(group.clone());
                }
            }
            NodeType::Group(children) | NodeType::List(children) => {
                if node.probability || node.group.is_some() || node.check.is_some() {
                    return Err(ValidationError::InvalidSchema {
                        path,
                        reason: "only leaf parameters can carry probabilities or checks".to_string(),
                    });
                }
                check_nodes(children, &path, used)?;
            }
        }
    }
    Ok(())
}

/// Check that a numeric leaf is `>= 0`.
#[must_use]
pub fn non_negative() -> impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static {
    |value| {
        let ok = match value {
            Value::Float(v) => *v >= 0.0,
            Value::Int(v) => *v >= 0,
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err("must be >= 0".to_string())
        }
    }
}

/// Check that a matrix leaf is rectangular.
#[must_use]
pub fn rectangular() -> impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static {
    |value| {
        let Some(rows) = value.as_matrix() else {
            return Ok(());
        };
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().all(|r| r.len() == width) {
            Ok(())
        } else {
            Err("must be a rectangular matrix of ints".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctors_schema() -> ParameterSchema {
        ParameterSchema::builder()
            .node(Parameter::list(
                "doctors",
                [
                    Parameter::string("specialty"),
                    Parameter::float("probability").in_group("doctors"),
                ],
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn test_group_defaults_to_exact() {
        let schema = doctors_schema();
        assert_eq!(schema.groups().get("doctors"), Some(&GroupPolicy::Exact));
    }

    #[test]
    fn test_leaves_carry_paths_and_help() {
        let schema = ParameterSchema::builder()
            .node(Parameter::group(
                "triage",
                [
                    Parameter::duration("attention_time").help("Time spent per patient"),
                    Parameter::list("levels", [Parameter::int("level")]),
                ],
            ))
            .build()
            .unwrap();

        let leaves = schema.leaves();
        let paths: Vec<&str> = leaves.iter().map(|(path, _)| path.as_str()).collect();
        assert_eq!(paths, vec!["triage.attention_time", "triage.levels[].level"]);
        assert_eq!(leaves[0].1.help_text(), Some("Time spent per patient"));
        assert_eq!(leaves[1].1.help_text(), None);
    }

    #[test]
    fn test_in_group_implies_probability() {
        let p = Parameter::float("p").in_group("g");
        assert!(p.is_probability());
        assert_eq!(p.probability_group(), Some("g"));
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let result = ParameterSchema::builder()
            .node(Parameter::float("a"))
            .node(Parameter::int("a"))
            .build();
        assert!(matches!(result, Err(ValidationError::InvalidSchema { .. })));

        let nested = ParameterSchema::builder()
            .node(Parameter::group("g", [Parameter::float("a"), Parameter::float("a")]))
            .build();
        assert!(matches!(
            nested,
            Err(ValidationError::InvalidSchema { path, .. }) if path == "g.a"
        ));
    }

    #[test]
    fn test_rejects_probability_on_int() {
        let result = ParameterSchema::builder()
            .node(Parameter::int("level").as_probability())
            .build();
        assert!(matches!(result, Err(ValidationError::InvalidSchema { .. })));
    }

    #[test]
    fn test_rejects_policy_for_unknown_group() {
        let result = doctors_schema()
            .extend()
            .group_policy("nobody", GroupPolicy::AtMost)
            .build();
        assert!(matches!(
            result,
            Err(ValidationError::InvalidSchema { path, .. }) if path == "nobody"
        ));
    }

    #[test]
    fn test_extend_does_not_touch_original() {
        let base = doctors_schema();
        let extended = base
            .extend()
            .child("doctors", Parameter::duration("attention_duration"))
            .node(Parameter::group("personnel", [Parameter::probability("immunity")]))
            .build()
            .unwrap();

        assert_eq!(base.nodes().len(), 1);
        assert_eq!(base.nodes()[0].children().len(), 2);
        assert_eq!(extended.nodes().len(), 2);
        assert_eq!(extended.nodes()[0].children().len(), 3);
    }

    #[test]
    fn test_child_with_unknown_parent() {
        let result = doctors_schema()
            .extend()
            .child("doctors.specialty", Parameter::float("x"))
            .build();
        assert!(matches!(result, Err(ValidationError::InvalidSchema { .. })));
    }

    #[test]
    fn test_kind_never_coerces() {
        assert!(Kind::Float.matches(&Value::Float(1.0)));
        assert!(!Kind::Float.matches(&Value::Int(1)));
        assert!(!Kind::Int.matches(&Value::Float(1.0)));
    }

    #[test]
    fn test_builtin_checks() {
        let check = non_negative();
        assert!(check(&Value::Float(0.0)).is_ok());
        assert_eq!(check(&Value::Int(-1)), Err("must be >= 0".to_string()));

        let check = rectangular();
        assert!(check(&Value::Matrix(vec![vec![1, 2], vec![3, 4]])).is_ok());
        assert!(check(&Value::Matrix(vec![vec![1, 2], vec![3]])).is_err());
    }
}
