//! `AuditSink`: external collaborator notified of ingest and
//! reasoning events. The default implementation forwards to `tracing` so a
//! session produces structured logs without a host supplying its own sink.

use crate::encoder::Node;
use crate::prover::ProveFailure;

/// A single notable occurrence during ingest or reasoning.
#[derive(Debug, Clone)]
pub enum AuditEvent<'a> {
    FactIngested { node: &'a Node, confidence: f32, fact_id: u64 },
    RuleIngested { conclusion: &'a Node, rule_id: u64 },
    RelationRegistered { name: &'a str },
    QueryExecuted { confidence: f32, ambiguous: bool },
    ProofSucceeded { goal: &'a Node, confidence: f32, steps: usize },
    ProofFailed { goal: &'a Node, reason: &'a ProveFailure },
}

/// External collaborator: receives [`AuditEvent`]s as they occur. Sessions
/// run with a null sink if the host supplies none; nothing about core
/// reasoning depends on a sink being present.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent<'_>);
}

/// Discards every event; used when a host opts out of auditing entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: &AuditEvent<'_>) {}
}

/// Forwards events to `tracing` at a level matched to severity: ingest
/// events at `debug`, successful proofs/queries at `info`, failures at
/// `warn`. This is the default sink a [`crate::session::Session`] uses when
/// the host does not supply its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent<'_>) {
        match event {
            AuditEvent::FactIngested { node, confidence, fact_id } => {
                tracing::debug!(fact_id, confidence, ?node, "fact_ingested");
            }
            AuditEvent::RuleIngested { conclusion, rule_id } => {
                tracing::debug!(rule_id, ?conclusion, "rule_ingested");
            }
            AuditEvent::RelationRegistered { name } => {
                tracing::debug!(relation = name, "relation_registered");
            }
            AuditEvent::QueryExecuted { confidence, ambiguous } => {
                tracing::info!(confidence, ambiguous, "query_executed");
            }
            AuditEvent::ProofSucceeded { goal, confidence, steps } => {
                tracing::info!(confidence, steps, ?goal, "proof_succeeded");
            }
            AuditEvent::ProofFailed { goal, reason } => {
                tracing::warn!(?reason, ?goal, "proof_failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_never_panics() {
        let sink = NullAuditSink;
        let node = Node::Atom("x".into());
        sink.record(&AuditEvent::RelationRegistered { name: "isA" });
        sink.record(&AuditEvent::FactIngested {
            node: &node,
            confidence: 1.0,
            fact_id: 0,
        });
    }
}
