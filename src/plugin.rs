//! `ComputePlugin`: external collaborator for relations flagged `computable`
//! on their [`RelationSlot`](crate::kb::RelationSlot) — arithmetic
//! comparisons, unit conversions, or other host-supplied side computations
//! the vector algebra itself cannot express.

use crate::encoder::Node;
use std::collections::HashMap;

/// Result of evaluating a computable relation against concrete arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeOutcome {
    /// The relation holds, with the given confidence.
    Holds(f32),
    /// The relation does not hold.
    Fails,
    /// The plugin cannot evaluate this call (e.g. missing argument type);
    /// the caller falls back to ordinary fact/rule resolution.
    Unsupported,
}

/// External collaborator: evaluates a single computable relation.
/// Implementors never touch the KB or vector space directly — they see only
/// the grounded triple.
pub trait ComputePlugin: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, subject: &Node, object: &Node) -> ComputeOutcome;
}

/// Flat name -> plugin registry, consulted by the prover before it falls
/// back to rule chaining for a relation marked `computable`.
#[derive(Default)]
pub struct ComputePluginRegistry {
    plugins: HashMap<String, Box<dyn ComputePlugin>>,
}

impl ComputePluginRegistry {
    pub fn new() -> Self {
        ComputePluginRegistry {
            plugins: HashMap::new(),
        }
    }

    pub fn register(&mut self, relation: impl Into<String>, plugin: Box<dyn ComputePlugin>) {
        self.plugins.insert(relation.into(), plugin);
    }

    pub fn evaluate(&self, relation: &str, subject: &Node, object: &Node) -> ComputeOutcome {
        match self.plugins.get(relation) {
            Some(plugin) => plugin.evaluate(subject, object),
            None => ComputeOutcome::Unsupported,
        }
    }

    pub fn is_registered(&self, relation: &str) -> bool {
        self.plugins.contains_key(relation)
    }
}

/// Example numeric-comparison plugin for `greaterThan`/`lessThan`-style
/// relations over `Node::Number` arguments; registered by hosts that want
/// numeric reasoning without encoding comparisons as facts.
pub struct NumericComparisonPlugin {
    relation: String,
    compare: fn(f64, f64) -> bool,
}

impl NumericComparisonPlugin {
    pub fn greater_than() -> Self {
        NumericComparisonPlugin {
            relation: "greaterThan".to_string(),
            compare: |a, b| a > b,
        }
    }

    pub fn less_than() -> Self {
        NumericComparisonPlugin {
            relation: "lessThan".to_string(),
            compare: |a, b| a < b,
        }
    }
}

impl ComputePlugin for NumericComparisonPlugin {
    fn name(&self) -> &str {
        &self.relation
    }

    fn evaluate(&self, subject: &Node, object: &Node) -> ComputeOutcome {
        match (subject, object) {
            (Node::Number(a), Node::Number(b)) => {
                if (self.compare)(*a, *b) {
                    ComputeOutcome::Holds(1.0)
                } else {
                    ComputeOutcome::Fails
                }
            }
            _ => ComputeOutcome::Unsupported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_dispatches_by_relation_name() {
        let mut registry = ComputePluginRegistry::new();
        registry.register("greaterThan", Box::new(NumericComparisonPlugin::greater_than()));
        let outcome = registry.evaluate("greaterThan", &Node::Number(5.0), &Node::Number(2.0));
        assert_eq!(outcome, ComputeOutcome::Holds(1.0));
    }

    #[test]
    fn unregistered_relation_is_unsupported() {
        let registry = ComputePluginRegistry::new();
        let outcome = registry.evaluate("unknown", &Node::Number(1.0), &Node::Number(2.0));
        assert_eq!(outcome, ComputeOutcome::Unsupported);
    }

    #[test]
    fn non_numeric_args_are_unsupported() {
        let plugin = NumericComparisonPlugin::less_than();
        let outcome = plugin.evaluate(&Node::Atom("x".into()), &Node::Number(2.0));
        assert_eq!(outcome, ComputeOutcome::Unsupported);
    }
}
