use std::{collections::BTreeMap, sync::Arc};

use crate::{errors::StorageError, span::Span};

/// Persistent home of span records, keyed by validator index and epoch.
pub trait SpanStore: Send + Sync {
    fn get_span(&self, validator_index: u64, epoch: u64) -> Result<Option<Span>, StorageError>;

    fn put_span(&self, validator_index: u64, epoch: u64, span: Span) -> Result<(), StorageError>;

    /// Writes every entry of `spans` or none of them.
    fn put_spans(
        &self,
        validator_index: u64,
        spans: &BTreeMap<u64, Span>,
    ) -> Result<(), StorageError>;
}

impl<T: SpanStore + ?Sized> SpanStore for Arc<T> {
    fn get_span(&self, validator_index: u64, epoch: u64) -> Result<Option<Span>, StorageError> {
        (**self).get_span(validator_index, epoch)
    }

    fn put_span(&self, validator_index: u64, epoch: u64, span: Span) -> Result<(), StorageError> {
        (**self).put_span(validator_index, epoch, span)
    }

    fn put_spans(
        &self,
        validator_index: u64,
        spans: &BTreeMap<u64, Span>,
    ) -> Result<(), StorageError> {
        (**self).put_spans(validator_index, spans)
    }
}

/// Epoch indexed spans of each validator, where an absent record reads as [`Span::default`].
#[derive(Debug, Clone)]
pub struct EpochSpanTable<S> {
    store: S,
}

impl<S: SpanStore> EpochSpanTable<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn get(&self, validator_index: u64, epoch: u64) -> Result<Span, StorageError> {
        Ok(self
            .store
            .get_span(validator_index, epoch)?
            .unwrap_or_default())
    }

    pub fn put(&self, validator_index: u64, epoch: u64, span: Span) -> Result<(), StorageError> {
        self.store.put_span(validator_index, epoch, span)
    }

    pub fn put_batch(
        &self,
        validator_index: u64,
        spans: &BTreeMap<u64, Span>,
    ) -> Result<(), StorageError> {
        if spans.is_empty() {
            return Ok(());
        }
        self.store.put_spans(validator_index, spans)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
