use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::{errors::StorageError, span::Span, span_table::SpanStore};

/// Process local [`SpanStore`]. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemorySpanStore {
    spans: RwLock<HashMap<(u64, u64), Span>>,
}

impl InMemorySpanStore {
    /// Every span recorded for `validator_index`, ordered by epoch.
    pub fn spans_for(&self, validator_index: u64) -> BTreeMap<u64, Span> {
        self.spans
            .read()
            .iter()
            .filter(|((index, _), _)| *index == validator_index)
            .map(|(&(_, epoch), &span)| (epoch, span))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.spans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.read().is_empty()
    }
}

impl SpanStore for InMemorySpanStore {
    fn get_span(&self, validator_index: u64, epoch: u64) -> Result<Option<Span>, StorageError> {
        Ok(self.spans.read().get(&(validator_index, epoch)).copied())
    }

    fn put_span(&self, validator_index: u64, epoch: u64, span: Span) -> Result<(), StorageError> {
        self.spans.write().insert((validator_index, epoch), span);
        Ok(())
    }

    fn put_spans(
        &self,
        validator_index: u64,
        spans: &BTreeMap<u64, Span>,
    ) -> Result<(), StorageError> {
        let mut guard = self.spans.write();
        for (&epoch, &span) in spans {
            guard.insert((validator_index, epoch), span);
        }
        Ok(())
    }
}
