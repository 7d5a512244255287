//! Finite truth scale and confidence-to-truth-band mapping.
//!
//! Compute plugins surface one of five truth values verbatim. The exact
//! confidence thresholds that map a continuous confidence onto this scale
//! are not fixed a priori, so they are exposed as configuration
//! (`TruthBands`) rather than hardcoded.

use serde::{Deserialize, Serialize};

/// The finite truth scale used by compute plugins and surfaced verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruthValue {
    TrueCertain,
    TrueLikely,
    Unknown,
    FalseLikely,
    False,
}

impl TruthValue {
    /// The canonical i8 encoding.
    pub const fn as_i8(self) -> i8 {
        match self {
            TruthValue::TrueCertain => 127,
            TruthValue::TrueLikely => 64,
            TruthValue::Unknown => 0,
            TruthValue::FalseLikely => -64,
            TruthValue::False => -127,
        }
    }
}

/// Coarse three-way result surfaced by `Session::ask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Truth {
    True,
    False,
    Unknown,
}

/// Configurable thresholds mapping a `[-1, 1]`-ish signed confidence onto
/// [`TruthValue`]. Defaults are chosen so a confidence around 0.86 for a
/// 3-hop transitive chain lands as `TrueLikely`, not `TrueCertain`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruthBands {
    pub true_certain_at: f32,
    pub true_likely_at: f32,
    pub false_likely_at: f32,
    pub false_at: f32,
}

impl Default for TruthBands {
    fn default() -> Self {
        TruthBands {
            true_certain_at: 0.95,
            true_likely_at: 0.5,
            false_likely_at: -0.5,
            false_at: -0.95,
        }
    }
}

impl TruthBands {
    pub fn classify(&self, confidence: f32) -> TruthValue {
        if confidence >= self.true_certain_at {
            TruthValue::TrueCertain
        } else if confidence >= self.true_likely_at {
            TruthValue::TrueLikely
        } else if confidence <= self.false_at {
            TruthValue::False
        } else if confidence <= self.false_likely_at {
            TruthValue::FalseLikely
        } else {
            TruthValue::Unknown
        }
    }

    pub fn coarse(&self, confidence: f32) -> Truth {
        match self.classify(confidence) {
            TruthValue::TrueCertain | TruthValue::TrueLikely => Truth::True,
            TruthValue::False | TruthValue::FalseLikely => Truth::False,
            TruthValue::Unknown => Truth::Unknown,
        }
    }
}
