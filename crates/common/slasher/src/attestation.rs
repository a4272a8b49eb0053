use serde::{Deserialize, Serialize};

use crate::span::SigFingerprint;

/// The part of an attestation the slasher needs. Signatures are verified before this point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttestationRecord {
    pub validator_index: u64,
    pub source_epoch: u64,
    pub target_epoch: u64,
    pub sig_fingerprint: SigFingerprint,
}

impl AttestationRecord {
    pub fn new(
        validator_index: u64,
        source_epoch: u64,
        target_epoch: u64,
        sig_fingerprint: SigFingerprint,
    ) -> Self {
        Self {
            validator_index,
            source_epoch,
            target_epoch,
            sig_fingerprint,
        }
    }

    /// `target_epoch - source_epoch`, saturating at zero for malformed records.
    pub fn distance(&self) -> u64 {
        self.target_epoch.saturating_sub(self.source_epoch)
    }
}
