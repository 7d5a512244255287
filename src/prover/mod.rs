//! Backward-chaining proof engine: turns a goal into a proof tree of facts,
//! transitive chains, and rule applications, or a structured failure.

pub mod condition;
pub mod engine;

pub use engine::{ProofEngine, ProverConfig};

use crate::encoder::Node;
use crate::unify::Binding;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One step of a discovered proof, in the order they were established.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Step {
    Fact { node: Node, confidence: f32 },
    TransitiveChain { relation: String, hops: usize, confidence: f32 },
    RuleApplied { rule_id: u64, conclusion: Node, confidence: f32 },
    NegationAsFailure { node: Node },
}

/// Why a proof attempt failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProveFailure {
    NoPathFound,
    DepthExceeded { limit: usize },
    TimedOut,
    CycleDetected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofTree {
    pub goal: Node,
    pub steps: Vec<Step>,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProveResult {
    pub success: bool,
    pub proof: Option<ProofTree>,
    pub bindings: HashMap<String, String>,
    pub failure: Option<ProveFailure>,
}

impl ProveResult {
    pub(crate) fn failure(failure: ProveFailure) -> Self {
        ProveResult {
            success: false,
            proof: None,
            bindings: HashMap::new(),
            failure: Some(failure),
        }
    }

    pub(crate) fn success(goal: Node, steps: Vec<Step>, confidence: f32, binding: Binding) -> Self {
        ProveResult {
            success: true,
            proof: Some(ProofTree {
                goal,
                steps,
                confidence,
            }),
            bindings: binding.as_map(),
            failure: None,
        }
    }
}
