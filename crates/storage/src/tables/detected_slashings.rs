use std::sync::Arc;

use ream_slasher::detection::{DETECTION_RESULT_ENCODED_LENGTH, DetectionResult};
use redb::{Database, Durability, ReadableTable, TableDefinition};
use tracing::debug;

use crate::errors::StoreError;

type DetectionKey = [u8; DETECTION_RESULT_ENCODED_LENGTH];

/// Table definition for the Detected Slashings table
///
/// Key: (validator_index, encoded `DetectionResult`)
/// Value: ()
pub(crate) const DETECTED_SLASHINGS_TABLE: TableDefinition<(u64, DetectionKey), ()> =
    TableDefinition::new("slasher_detected_slashings");

/// Offenses already handed to reporting, keyed so the same offense is only reported once.
#[derive(Clone, Debug)]
pub struct DetectedSlashingsTable {
    pub db: Arc<Database>,
}

impl DetectedSlashingsTable {
    /// Records `result`, returning `false` if the same offense was already recorded.
    pub fn insert_if_absent(&self, result: &DetectionResult) -> Result<bool, StoreError> {
        let key = (result.validator_index, result.encode());

        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        let mut table = write_txn.open_table(DETECTED_SLASHINGS_TABLE)?;
        let newly_inserted = table.insert(key, ())?.is_none();
        drop(table);
        write_txn.commit()?;

        if !newly_inserted {
            debug!(
                validator_index = result.validator_index,
                slashable_epoch = result.slashable_epoch,
                kind = ?result.kind,
                "Offense already recorded"
            );
        }
        Ok(newly_inserted)
    }

    pub fn contains(&self, result: &DetectionResult) -> Result<bool, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DETECTED_SLASHINGS_TABLE)?;
        Ok(table
            .get((result.validator_index, result.encode()))?
            .is_some())
    }

    /// Every offense recorded for `validator_index`, in key order.
    pub fn get_for_validator(
        &self,
        validator_index: u64,
    ) -> Result<Vec<DetectionResult>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DETECTED_SLASHINGS_TABLE)?;

        let lower = (validator_index, [u8::MIN; DETECTION_RESULT_ENCODED_LENGTH]);
        let upper = (validator_index, [u8::MAX; DETECTION_RESULT_ENCODED_LENGTH]);
        table
            .range(lower..=upper)?
            .map(|entry| -> Result<DetectionResult, StoreError> {
                let (key, _) = entry?;
                let (validator_index, encoded) = key.value();
                Ok(DetectionResult::decode(validator_index, &encoded)?)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::FixedBytes;
    use ream_slasher::detection::DetectionKind;
    use tempdir::TempDir;

    use super::*;
    use crate::db::SlasherDB;

    fn result(validator_index: u64, slashable_epoch: u64, kind: DetectionKind) -> DetectionResult {
        DetectionResult {
            validator_index,
            slashable_epoch,
            kind,
            sig_fingerprint: FixedBytes::from([0xb2, 0x00]),
        }
    }

    #[test]
    fn test_same_offense_recorded_once() -> Result<(), StoreError> {
        let tmp_dir = TempDir::new("test_same_offense_recorded_once")?;
        let db = SlasherDB::new(tmp_dir.path().to_path_buf())?;
        let table = db.detected_slashings_provider();

        let double_vote = result(7, 100, DetectionKind::DoubleVote);
        assert!(table.insert_if_absent(&double_vote)?);
        assert!(!table.insert_if_absent(&double_vote)?);

        // Same key for another validator is a different offense.
        assert!(table.insert_if_absent(&result(8, 100, DetectionKind::DoubleVote))?);
        // Same validator and epoch but a different kind too.
        assert!(table.insert_if_absent(&result(7, 100, DetectionKind::SurroundVote))?);

        assert!(table.contains(&double_vote)?);
        assert!(!table.contains(&result(9, 100, DetectionKind::DoubleVote))?);
        assert_eq!(
            table.get_for_validator(7)?,
            vec![double_vote, result(7, 100, DetectionKind::SurroundVote)]
        );
        Ok(())
    }

    #[test]
    fn test_get_for_validator() -> Result<(), StoreError> {
        let tmp_dir = TempDir::new("test_detected_slashings_get_for_validator")?;
        let db = SlasherDB::new(tmp_dir.path().to_path_buf())?;
        let table = db.detected_slashings_provider();

        let surround = result(3, 25, DetectionKind::SurroundVote);
        let double_vote = result(3, 30, DetectionKind::DoubleVote);
        table.insert_if_absent(&surround)?;
        table.insert_if_absent(&double_vote)?;
        table.insert_if_absent(&result(4, 25, DetectionKind::SurroundVote))?;

        // Kind tag leads the key, so double votes sort first.
        assert_eq!(table.get_for_validator(3)?, vec![double_vote, surround]);
        assert_eq!(table.get_for_validator(4)?.len(), 1);
        assert!(table.get_for_validator(5)?.is_empty());
        Ok(())
    }
}
