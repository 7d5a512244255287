//! Proves a rule body / goal [`Condition`] tree: conjunction takes the
//! weakest link, disjunction takes the strongest surviving branch, negation
//! is evaluated as failure under the closed-world assumption.

use super::engine::{ProofEngine, ProofContext, NEGATION_CONFIDENCE};
use super::Step;
use crate::kb::Condition;
use crate::unify::Binding;

/// Proves `condition` under `binding`, returning `(confidence, binding,
/// steps)` for the first successful branch tried, or `None` if every branch
/// fails (a non-propagating result: the prover's own `ProveFailure` is
/// reserved for the top-level goal).
pub(crate) fn prove_condition(
    engine: &ProofEngine,
    condition: &Condition,
    binding: &Binding,
    ctx: &mut ProofContext,
) -> Option<(f32, Binding, Vec<Step>)> {
    match condition {
        Condition::Atom(node) => {
            let before = ctx.steps.len();
            let (confidence, extended) = engine.prove_goal(node, binding, ctx).ok()?;
            let steps = ctx.steps[before..].to_vec();
            Some((confidence, extended, steps))
        }
        Condition::And(parts) => prove_and(engine, parts, binding, ctx),
        Condition::Or(parts) => prove_or(engine, parts, binding, ctx),
        Condition::Not(inner) => prove_not(engine, inner, binding, ctx),
    }
}

/// Every conjunct must succeed; the binding threads left to right so later
/// conjuncts see variables earlier ones resolved. Confidence is the minimum
/// across conjuncts (the chain is only as strong as its weakest link).
fn prove_and(
    engine: &ProofEngine,
    parts: &[Condition],
    binding: &Binding,
    ctx: &mut ProofContext,
) -> Option<(f32, Binding, Vec<Step>)> {
    let mut current = binding.clone();
    let mut min_confidence = 1.0f32;
    let mut steps = Vec::new();
    for part in parts {
        let (confidence, extended, part_steps) = prove_condition(engine, part, &current, ctx)?;
        min_confidence = min_confidence.min(confidence);
        current = extended;
        steps.extend(part_steps);
    }
    Some((min_confidence, current, steps))
}

/// At least one disjunct must succeed; bindings from failed branches are
/// discarded. Confidence is the maximum among branches that succeeded.
fn prove_or(
    engine: &ProofEngine,
    parts: &[Condition],
    binding: &Binding,
    ctx: &mut ProofContext,
) -> Option<(f32, Binding, Vec<Step>)> {
    let mut best: Option<(f32, Binding, Vec<Step>)> = None;
    for part in parts {
        if let Some(candidate) = prove_condition(engine, part, binding, ctx) {
            if best.as_ref().is_none_or(|b| candidate.0 > b.0) {
                best = Some(candidate);
            }
        }
    }
    best
}

/// Negation as failure: succeeds with a fixed confidence iff the inner
/// condition cannot be proven under the current bindings. Only meaningful
/// under the closed-world assumption; otherwise `Not` never succeeds, since
/// this engine has no explicit negative-fact store to consult instead.
fn prove_not(
    engine: &ProofEngine,
    inner: &Condition,
    binding: &Binding,
    ctx: &mut ProofContext,
) -> Option<(f32, Binding, Vec<Step>)> {
    if !engine.config.closed_world {
        return None;
    }
    let mut probe_ctx = ProofContext {
        depth: ctx.depth,
        deadline: ctx.deadline,
        visited: ctx.visited.clone(),
        steps: Vec::new(),
    };
    if prove_condition(engine, inner, binding, &mut probe_ctx).is_some() {
        return None;
    }
    let node = binding.apply(&inner_goal_hint(inner));
    ctx.steps.push(Step::NegationAsFailure { node: node.clone() });
    Some((NEGATION_CONFIDENCE, binding.clone(), vec![Step::NegationAsFailure { node }]))
}

/// Best-effort representative node for a `NegationAsFailure` step's trace
/// entry: the first atom found in the negated condition, depth-first.
fn inner_goal_hint(condition: &Condition) -> crate::encoder::Node {
    match condition {
        Condition::Atom(node) => node.clone(),
        Condition::And(parts) | Condition::Or(parts) => parts
            .first()
            .map(inner_goal_hint)
            .unwrap_or(crate::encoder::Node::Atom("_".into())),
        Condition::Not(inner) => inner_goal_hint(inner),
    }
}
