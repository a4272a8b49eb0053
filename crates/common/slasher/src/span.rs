use alloy_primitives::FixedBytes;
use serde::{Deserialize, Serialize};

use crate::errors::DecodeError;

/// Byte length of an encoded [`Span`].
pub const SPAN_ENCODED_LENGTH: usize = 7;

pub const SIG_FINGERPRINT_LENGTH: usize = 2;

/// Leading bytes of an attestation signature. Only used to tell a repeated vote apart from a
/// conflicting one, never as proof.
pub type SigFingerprint = FixedBytes<SIG_FINGERPRINT_LENGTH>;

/// Takes the first [`SIG_FINGERPRINT_LENGTH`] bytes of `signature`, zero padded if shorter.
pub fn sig_fingerprint(signature: &[u8]) -> SigFingerprint {
    let mut fingerprint = [0u8; SIG_FINGERPRINT_LENGTH];
    let len = signature.len().min(SIG_FINGERPRINT_LENGTH);
    fingerprint[..len].copy_from_slice(&signature[..len]);
    SigFingerprint::from(fingerprint)
}

/// Flag byte of an encoded span. Bits without a named flag are reserved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanFlags(u8);

impl SpanFlags {
    pub const HAS_ATTESTED: Self = Self(1);

    const KNOWN: u8 = Self::HAS_ATTESTED.0;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Drops reserved bits, so bytes from newer writers still decode.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::KNOWN)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

/// Per (validator, epoch) summary of the attestations seen so far.
///
/// `min_span` at epoch `e` is the smallest `target - e` over recorded attestations sourced after
/// `e`, and `max_span` is the largest `target - e` over recorded attestations whose range
/// strictly contains `e`. Zero means nothing has been recorded. The fingerprint and the
/// `HAS_ATTESTED` flag describe the latest attestation targeting `e`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub min_span: u16,
    pub max_span: u16,
    pub sig_fingerprint: SigFingerprint,
    pub flags: SpanFlags,
}

impl Span {
    pub fn has_attested(&self) -> bool {
        self.flags.contains(SpanFlags::HAS_ATTESTED)
    }

    pub fn mark_attested(&mut self, sig_fingerprint: SigFingerprint) {
        self.sig_fingerprint = sig_fingerprint;
        self.flags.insert(SpanFlags::HAS_ATTESTED);
    }

    pub fn encode(&self) -> [u8; SPAN_ENCODED_LENGTH] {
        let mut bytes = [0u8; SPAN_ENCODED_LENGTH];
        bytes[0..2].copy_from_slice(&self.min_span.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.max_span.to_le_bytes());
        bytes[4..6].copy_from_slice(self.sig_fingerprint.as_slice());
        bytes[6] = SpanFlags::from_bits_truncate(self.flags.bits()).bits();
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != SPAN_ENCODED_LENGTH {
            return Err(DecodeError::WrongLength {
                kind: "span",
                expected: SPAN_ENCODED_LENGTH,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            min_span: u16::from_le_bytes([bytes[0], bytes[1]]),
            max_span: u16::from_le_bytes([bytes[2], bytes[3]]),
            sig_fingerprint: SigFingerprint::from([bytes[4], bytes[5]]),
            flags: SpanFlags::from_bits_truncate(bytes[6]),
        })
    }
}
