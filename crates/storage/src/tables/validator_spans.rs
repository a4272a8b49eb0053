use std::{collections::BTreeMap, sync::Arc};

use ream_slasher::{errors::StorageError, span::Span, span_table::SpanStore};
use redb::{Database, Durability, ReadableTable, TableDefinition};

use crate::{errors::StoreError, tables::table::Table};

/// Table definition for the Validator Spans table
///
/// Key: (validator_index, epoch)
/// Value: 7 byte `Span` encoding
pub(crate) const VALIDATOR_SPANS_TABLE: TableDefinition<(u64, u64), &[u8]> =
    TableDefinition::new("slasher_validator_spans");

#[derive(Clone, Debug)]
pub struct ValidatorSpansTable {
    pub db: Arc<Database>,
}

impl Table for ValidatorSpansTable {
    type Key = (u64, u64);

    type Value = Span;

    fn get(&self, key: Self::Key) -> Result<Option<Self::Value>, StoreError> {
        let read_txn = self.db.begin_read()?;

        let table = read_txn.open_table(VALIDATOR_SPANS_TABLE)?;
        let result = table.get(key)?;
        Ok(result.map(|res| Span::decode(res.value())).transpose()?)
    }

    fn insert(&self, key: Self::Key, value: Self::Value) -> Result<(), StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        let mut table = write_txn.open_table(VALIDATOR_SPANS_TABLE)?;
        table.insert(key, value.encode().as_slice())?;
        drop(table);
        write_txn.commit()?;
        Ok(())
    }
}

impl ValidatorSpansTable {
    /// Writes all `spans` of `validator_index` in one transaction.
    pub fn insert_batch(
        &self,
        validator_index: u64,
        spans: &BTreeMap<u64, Span>,
    ) -> Result<(), StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        let mut table = write_txn.open_table(VALIDATOR_SPANS_TABLE)?;
        for (&epoch, span) in spans {
            table.insert((validator_index, epoch), span.encode().as_slice())?;
        }
        drop(table);
        write_txn.commit()?;
        Ok(())
    }

    /// Every span stored for `validator_index`, ordered by epoch.
    pub fn get_for_validator(
        &self,
        validator_index: u64,
    ) -> Result<BTreeMap<u64, Span>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(VALIDATOR_SPANS_TABLE)?;

        let mut spans = BTreeMap::new();
        for entry in table.range((validator_index, 0u64)..=(validator_index, u64::MAX))? {
            let (key, value) = entry?;
            let (_, epoch) = key.value();
            spans.insert(epoch, Span::decode(value.value())?);
        }
        Ok(spans)
    }

    /// Retention policy: drops the spans of every validator for epochs before `lowest_epoch`.
    pub fn prune_before(&self, lowest_epoch: u64) -> Result<(), StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        let mut table = write_txn.open_table(VALIDATOR_SPANS_TABLE)?;
        table.retain(|(_, epoch), _| epoch >= lowest_epoch)?;
        drop(table);
        write_txn.commit()?;
        Ok(())
    }
}

impl SpanStore for ValidatorSpansTable {
    fn get_span(&self, validator_index: u64, epoch: u64) -> Result<Option<Span>, StorageError> {
        Ok(self.get((validator_index, epoch))?)
    }

    fn put_span(&self, validator_index: u64, epoch: u64, span: Span) -> Result<(), StorageError> {
        Ok(self.insert((validator_index, epoch), span)?)
    }

    fn put_spans(
        &self,
        validator_index: u64,
        spans: &BTreeMap<u64, Span>,
    ) -> Result<(), StorageError> {
        Ok(self.insert_batch(validator_index, spans)?)
    }
}
