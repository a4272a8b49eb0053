use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    errors::DecodeError,
    span::{SIG_FINGERPRINT_LENGTH, SigFingerprint},
};

/// Byte length of an encoded [`DetectionResult`] key.
pub const DETECTION_RESULT_ENCODED_LENGTH: usize = 1 + SIG_FINGERPRINT_LENGTH + 8;

/// Offense class of a [`DetectionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DetectionKind {
    /// Two different attestations for the same target epoch.
    DoubleVote = 0,
    /// An attestation surrounding, or surrounded by, an earlier one from the same validator.
    SurroundVote = 1,
}

impl TryFrom<u8> for DetectionKind {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(DetectionKind::DoubleVote),
            1 => Ok(DetectionKind::SurroundVote),
            tag => Err(DecodeError::UnknownDetectionKind(tag)),
        }
    }
}

/// A confirmed offense. Paired with the conflicting attestations by the proof builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetectionResult {
    pub validator_index: u64,
    pub slashable_epoch: u64,
    pub kind: DetectionKind,
    pub sig_fingerprint: SigFingerprint,
}

impl DetectionResult {
    /// Canonical key of the offense: kind tag, fingerprint, then the slashable epoch big endian.
    /// The validator index is not part of the key.
    pub fn encode(&self) -> [u8; DETECTION_RESULT_ENCODED_LENGTH] {
        let mut bytes = [0u8; DETECTION_RESULT_ENCODED_LENGTH];
        bytes[0] = self.kind as u8;
        bytes[1..3].copy_from_slice(self.sig_fingerprint.as_slice());
        bytes[3..].copy_from_slice(&self.slashable_epoch.to_be_bytes());
        bytes
    }

    pub fn decode(validator_index: u64, bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != DETECTION_RESULT_ENCODED_LENGTH {
            return Err(DecodeError::WrongLength {
                kind: "detection result",
                expected: DETECTION_RESULT_ENCODED_LENGTH,
                actual: bytes.len(),
            });
        }

        let mut epoch_bytes = [0u8; 8];
        epoch_bytes.copy_from_slice(&bytes[3..]);

        Ok(Self {
            validator_index,
            slashable_epoch: u64::from_be_bytes(epoch_bytes),
            kind: DetectionKind::try_from(bytes[0])?,
            sig_fingerprint: SigFingerprint::from([bytes[1], bytes[2]]),
        })
    }
}

/// Drops results whose validator and key were already seen, keeping the first occurrence.
pub fn dedup_results(results: Vec<DetectionResult>) -> Vec<DetectionResult> {
    let mut seen = HashSet::with_capacity(results.len());
    results
        .into_iter()
        .filter(|result| seen.insert((result.validator_index, result.encode())))
        .collect()
}
