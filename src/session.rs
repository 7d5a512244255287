//! `Session`: the top-level handle a host holds. Owns one knowledge base,
//! one vector space, the relation permutation cache, the truth-band
//! thresholds, and the counters/audit sink that observe ingest and
//! reasoning. Every public operation (`add_fact`, `add_rule`, `query`,
//! `prove`, `ask`, `snapshot`/`restore`) goes through this struct; no other
//! module is meant to be driven directly by a host.

use crate::audit::{AuditEvent, AuditSink, TracingAuditSink};
use crate::encoder::{DimensionRegistry, Encoder, Node, NullDimensionRegistry};
use crate::error::{ContractViolation, Sys2Error, Sys2Result};
use crate::kb::{Condition, FactId, KnowledgeBase, Provenance, RelationSlot, RuleId};
use crate::matcher::StatsSnapshot;
use crate::permuter::RelationPermuter;
use crate::plugin::{ComputeOutcome, ComputePlugin, ComputePluginRegistry};
use crate::prover::{ProofEngine, ProveResult, ProverConfig};
use crate::snapshot;
use crate::truth::{Truth, TruthBands, TruthValue};
use crate::unify::{QueryEngine, QueryResult};
use crate::vector::{Strategy, VectorSpace};
use crate::vocabulary::Vocabulary;
use std::time::Duration;

/// Per-session construction parameters: the pieces that are fixed for the
/// lifetime of a `Session` rather than tunable per call.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub dimension: usize,
    pub strategy: Strategy,
    pub theory_seed: u64,
    pub recursion_horizon: usize,
    pub max_proof_depth: usize,
    pub proof_timeout: Duration,
    pub closed_world: bool,
    pub transitive_relations: Vec<String>,
    /// Whether a rule with a compound (`And`-shaped) effect asserts each
    /// conjunct as its own derived fact. See `Session::add_rule_with_effects`.
    pub expand_conjunctive_consequents: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            dimension: 4096,
            strategy: Strategy::SignedByte,
            theory_seed: 1,
            recursion_horizon: crate::encoder::DEFAULT_HORIZON,
            max_proof_depth: 16,
            proof_timeout: Duration::from_secs(2),
            closed_world: true,
            transitive_relations: Vec::new(),
            expand_conjunctive_consequents: false,
        }
    }
}

/// A single reasoning session: one knowledge base plus the deterministic
/// vector machinery that encodes facts and rules into it.
pub struct Session {
    config: SessionConfig,
    space: VectorSpace,
    vocabulary: Vocabulary,
    permuter: RelationPermuter,
    kb: KnowledgeBase,
    dimensions: Box<dyn DimensionRegistry>,
    plugins: ComputePluginRegistry,
    audit: Box<dyn AuditSink>,
    thresholds: TruthBands,
    stats: StatsSnapshot,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_collaborators(config, Box::new(NullDimensionRegistry), Box::new(TracingAuditSink))
    }

    pub fn with_collaborators(
        config: SessionConfig,
        dimensions: Box<dyn DimensionRegistry>,
        audit: Box<dyn AuditSink>,
    ) -> Self {
        let space = VectorSpace::new(config.strategy, config.dimension, config.theory_seed);
        let vocabulary = Vocabulary::new(space.clone());
        let permuter = RelationPermuter::new(config.theory_seed, config.dimension);
        let kb = KnowledgeBase::new();
        for relation in &config.transitive_relations {
            let mut slot = kb.ensure_relation(relation);
            slot.transitive = true;
            kb.set_relation_slot(slot);
        }
        Session {
            config,
            space,
            vocabulary,
            permuter,
            kb,
            dimensions,
            plugins: ComputePluginRegistry::new(),
            audit,
            thresholds: TruthBands::default(),
            stats: StatsSnapshot::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: TruthBands) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn register_plugin(&mut self, relation: impl Into<String>, plugin: Box<dyn ComputePlugin>) {
        let relation = relation.into();
        let mut slot = self.kb.ensure_relation(&relation);
        slot.computable = true;
        self.kb.set_relation_slot(slot);
        self.plugins.register(relation, plugin);
    }

    pub fn relation_slot(&self, name: &str) -> Option<RelationSlot> {
        self.kb.relation_slot(name)
    }

    pub fn set_relation_slot(&self, slot: RelationSlot) {
        let newly = self.kb.relation_slot(&slot.name).is_none();
        let name = slot.name.clone();
        self.kb.set_relation_slot(slot);
        if newly {
            self.audit.record(&AuditEvent::RelationRegistered { name: &name });
        }
    }

    fn encoder(&self) -> Encoder<'_> {
        Encoder::new(&self.vocabulary, &self.permuter, self.dimensions.as_ref())
            .with_horizon(self.config.recursion_horizon)
    }

    fn prover_config(&self) -> ProverConfig {
        ProverConfig {
            closed_world: self.config.closed_world,
            expand_conjunctive_consequents: self.config.expand_conjunctive_consequents,
            max_depth: self.config.max_proof_depth,
            timeout: self.config.proof_timeout,
        }
    }

    /// Encodes and stores a fully-ground fact. Fails closed with a
    /// [`ContractViolation`] rather than silently truncating an unground
    /// node, since a partially-bound "fact" would corrupt similarity search.
    pub fn add_fact(&mut self, node: Node, confidence: f32) -> Sys2Result<FactId> {
        if !node.is_ground() {
            return Err(Sys2Error::Contract(ContractViolation::MalformedAst(format!(
                "fact must be fully ground, found holes: {:?}",
                node.holes()
            ))));
        }
        let Node::Triple { relation, .. } = &node else {
            return Err(Sys2Error::Contract(ContractViolation::MalformedAst(
                "fact must be a (subject, relation, object) triple".to_string(),
            )));
        };
        self.ensure_relation_registered(relation);
        let vector = self.encoder().encode(&node, 0);
        let id = self.kb.add_fact(node.clone(), vector, confidence, Provenance::ingested());
        self.audit.record(&AuditEvent::FactIngested {
            node: &node,
            confidence,
            fact_id: id,
        });
        Ok(id)
    }

    /// Adds a rule whose condition establishes its conclusion. Every hole in
    /// the conclusion must also appear in the condition — an unbound head
    /// variable can never be grounded at proof time.
    pub fn add_rule(&mut self, conclusion: Node, condition: Condition) -> Sys2Result<RuleId> {
        let Node::Triple { relation, .. } = &conclusion else {
            return Err(Sys2Error::Contract(ContractViolation::MalformedAst(
                "rule conclusion must be a (subject, relation, object) triple".to_string(),
            )));
        };
        let condition_holes = condition.holes();
        for hole in conclusion.holes() {
            if !condition_holes.contains(&hole) {
                return Err(Sys2Error::Contract(ContractViolation::UnboundHeadVariable(hole)));
            }
        }
        self.ensure_relation_registered(relation);
        let id = self.kb.add_rule(conclusion.clone(), condition);
        self.audit.record(&AuditEvent::RuleIngested {
            conclusion: &conclusion,
            rule_id: id,
        });
        Ok(id)
    }

    /// Registers a rule with multiple simultaneous conclusions. When
    /// `expand_conjunctive_consequents` is off (the default), only the first
    /// conclusion is asserted and the rest are dropped — matching a rule
    /// engine where a head is always a single triple unless a session opts
    /// into the expanded behavior.
    pub fn add_rule_with_effects(
        &mut self,
        conclusions: Vec<Node>,
        condition: Condition,
    ) -> Sys2Result<Vec<RuleId>> {
        if conclusions.is_empty() {
            return Err(Sys2Error::Contract(ContractViolation::MalformedAst(
                "rule must have at least one conclusion".to_string(),
            )));
        }
        if !self.config.expand_conjunctive_consequents {
            let id = self.add_rule(conclusions.into_iter().next().unwrap(), condition)?;
            return Ok(vec![id]);
        }
        conclusions
            .into_iter()
            .map(|conclusion| self.add_rule(conclusion, condition.clone()))
            .collect()
    }

    fn ensure_relation_registered(&self, relation: &str) {
        let newly = self.kb.relation_slot(relation).is_none();
        self.kb.ensure_relation(relation);
        if newly {
            self.audit.record(&AuditEvent::RelationRegistered { name: relation });
        }
    }

    /// Single-step pattern query: up to three holes resolved by similarity
    /// against the knowledge base.
    pub fn query(&mut self, statement: &Node) -> QueryResult {
        let encoder = self.encoder();
        let engine = QueryEngine {
            kb: &self.kb,
            vocabulary: &self.vocabulary,
            permuter: &self.permuter,
            encoder: &encoder,
        };
        let result = engine.execute(statement);
        self.audit.record(&AuditEvent::QueryExecuted {
            confidence: result.confidence,
            ambiguous: result.ambiguous,
        });
        result
    }

    /// Backward-chained proof of `goal`, with rule chaining, transitive
    /// closure, and negation-as-failure.
    pub fn prove(&mut self, goal: &Node) -> ProveResult {
        let engine = ProofEngine::new(&self.kb, self.prover_config());
        let result = engine.prove(goal);
        let snapshot = engine.stats();
        self.stats = StatsSnapshot {
            facts_scanned: self.stats.facts_scanned + snapshot.facts_scanned,
            rules_tried: self.stats.rules_tried + snapshot.rules_tried,
            exact_hits: self.stats.exact_hits + snapshot.exact_hits,
        };
        match &result.proof {
            Some(proof) => self.audit.record(&AuditEvent::ProofSucceeded {
                goal,
                confidence: proof.confidence,
                steps: proof.steps.len(),
            }),
            None => {
                if let Some(reason) = &result.failure {
                    self.audit.record(&AuditEvent::ProofFailed { goal, reason });
                }
            }
        }
        result
    }

    /// Yes/no/unknown question answering: consults a registered compute
    /// plugin first if `statement`'s relation is computable, otherwise
    /// proves the statement and coarsens its confidence through the
    /// session's truth bands.
    pub fn ask(&mut self, statement: &Node) -> Truth {
        if let Node::Triple {
            subject,
            relation,
            object,
        } = statement
        {
            if self.plugins.is_registered(relation) {
                return match self.plugins.evaluate(relation, subject, object) {
                    ComputeOutcome::Holds(confidence) => self.thresholds.coarse(confidence),
                    ComputeOutcome::Fails => Truth::False,
                    ComputeOutcome::Unsupported => self.ask_via_proof(statement),
                };
            }
        }
        self.ask_via_proof(statement)
    }

    fn ask_via_proof(&mut self, statement: &Node) -> Truth {
        let result = self.prove(statement);
        match result.proof {
            Some(proof) => self.thresholds.coarse(proof.confidence),
            None => Truth::Unknown,
        }
    }

    /// Fine-grained truth value for `statement`, for hosts that want the
    /// five-way scale rather than the coarse three-way `ask` result.
    pub fn ask_truth_value(&mut self, statement: &Node) -> TruthValue {
        if let Node::Triple {
            subject,
            relation,
            object,
        } = statement
        {
            if self.plugins.is_registered(relation) {
                if let ComputeOutcome::Holds(confidence) = self.plugins.evaluate(relation, subject, object) {
                    return self.thresholds.classify(confidence);
                }
            }
        }
        let result = self.prove(statement);
        match result.proof {
            Some(proof) => self.thresholds.classify(proof.confidence),
            None => TruthValue::Unknown,
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn fact_count(&self) -> usize {
        self.kb.facts().len()
    }

    pub fn rule_count(&self) -> usize {
        self.kb.rules().len()
    }

    /// Serializes the vocabulary and knowledge base into an opaque blob.
    pub fn snapshot(&self) -> Sys2Result<Vec<u8>> {
        let blob = snapshot::encode(&self.space, &self.vocabulary, self.kb.export())?;
        Ok(blob)
    }

    /// Restores a session from a snapshot blob, reusing `config` for the
    /// proof/query knobs a snapshot does not capture (those are bound to the
    /// vector space it was produced under, which is checked against
    /// `config`'s dimension/strategy).
    pub fn restore(config: SessionConfig, blob: &[u8]) -> Sys2Result<Self> {
        let space = VectorSpace::new(config.strategy, config.dimension, config.theory_seed);
        let (vocabulary, kb_export) = snapshot::decode(&space, blob)?;
        let kb = KnowledgeBase::restore(kb_export);
        let permuter = RelationPermuter::new(config.theory_seed, config.dimension);
        Ok(Session {
            config,
            space,
            vocabulary,
            permuter,
            kb,
            dimensions: Box::new(NullDimensionRegistry),
            plugins: ComputePluginRegistry::new(),
            audit: Box::new(TracingAuditSink),
            thresholds: TruthBands::default(),
            stats: StatsSnapshot::default(),
        })
    }
}
