use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Wrong data length for {kind}: expected {expected} bytes, got {actual}")]
    WrongLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown detection kind tag: {0}")]
    UnknownDetectionKind(u8),
}

/// Failure reported by the backing span store. Aborts the attestation being evaluated.
#[derive(Error, Debug)]
#[error("Span store failure: {0}")]
pub struct StorageError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl StorageError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self(err.into())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionViolation {
    #[error("Source epoch {source_epoch} is not before target epoch {target_epoch}")]
    SourceNotBeforeTarget {
        source_epoch: u64,
        target_epoch: u64,
    },

    #[error("Attestation distance {distance} exceeds the history window of {history_window} epochs")]
    DistanceExceedsWindow { distance: u64, history_window: u16 },
}

#[derive(Error, Debug)]
pub enum SlasherError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Precondition violated: {0}")]
    Precondition(#[from] PreconditionViolation),

    #[error("Invalid slasher config: {0}")]
    InvalidConfig(String),
}
