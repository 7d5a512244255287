//! Opaque KB snapshot codec: bincode-encodes a session's vocabulary and
//! knowledge base into a single versioned byte blob, and decodes it back
//! against a target vector space. See `KnowledgeBase::export`/`restore` and
//! `Vocabulary::all`/`restore` for the pieces being combined.

use crate::error::SnapshotError;
use crate::kb::KbExport;
use crate::vector::{Strategy, Vector, VectorSpace};
use crate::vocabulary::Vocabulary;
use serde::{Deserialize, Serialize};

const MAGIC: [u8; 4] = *b"SYS2";
const FORMAT_VERSION: u16 = 1;

/// Identifies the vector space a snapshot was produced under, so `restore`
/// can reject a blob that doesn't match the target session's encoding
/// before touching any fact data.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotHeader {
    magic: [u8; 4],
    version: u16,
    strategy: Strategy,
    dimension: usize,
    theory_seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotBody {
    header: SnapshotHeader,
    atoms: Vec<(String, Vector)>,
    kb: KbExport,
}

/// Encodes a vocabulary and KB export into an opaque byte blob.
pub fn encode(space: &VectorSpace, vocabulary: &Vocabulary, kb: KbExport) -> Result<Vec<u8>, SnapshotError> {
    let body = SnapshotBody {
        header: SnapshotHeader {
            magic: MAGIC,
            version: FORMAT_VERSION,
            strategy: space.strategy,
            dimension: space.dimension,
            theory_seed: space.theory_seed,
        },
        atoms: vocabulary.all(),
        kb,
    };
    Ok(bincode::serialize(&body)?)
}

/// Decodes a snapshot blob, verifying it matches `space` before returning
/// the reconstructed vocabulary and KB export.
pub fn decode(space: &VectorSpace, blob: &[u8]) -> Result<(Vocabulary, KbExport), SnapshotError> {
    let body: SnapshotBody = bincode::deserialize(blob).map_err(|_| SnapshotError::BadMagic)?;
    let header = body.header;
    if header.magic != MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    if header.version != FORMAT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: FORMAT_VERSION,
            found: header.version,
        });
    }
    if header.strategy != space.strategy || header.dimension != space.dimension {
        return Err(SnapshotError::StrategyMismatch(format!(
            "snapshot was {:?}/{} lanes, target space is {:?}/{}",
            header.strategy, header.dimension, space.strategy, space.dimension
        )));
    }
    let vocabulary = Vocabulary::restore(space.clone(), body.atoms);
    Ok((vocabulary, body.kb))
}
