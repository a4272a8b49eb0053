use std::{fs, path::PathBuf, sync::Arc};

use redb::{Builder, Database};
use tracing::info;

use crate::{
    errors::StoreError,
    tables::{
        detected_slashings::{DETECTED_SLASHINGS_TABLE, DetectedSlashingsTable},
        validator_spans::{VALIDATOR_SPANS_TABLE, ValidatorSpansTable},
    },
};

pub const REDB_FILE: &str = "slasher.redb";

/// The size of the cache for the database
///
/// 256 MiB
pub const REDB_CACHE_SIZE: usize = 256 * 1_024 * 1_024;

#[derive(Clone, Debug)]
pub struct SlasherDB {
    db: Arc<Database>,
    data_dir: PathBuf,
}

impl SlasherDB {
    /// Opens the database in `data_dir`, creating the directory, file and tables if missing.
    pub fn new(data_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&data_dir)?;
        let db_file = data_dir.join(REDB_FILE);
        let db = Builder::new()
            .set_cache_size(REDB_CACHE_SIZE)
            .create(&db_file)?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(VALIDATOR_SPANS_TABLE)?;
        write_txn.open_table(DETECTED_SLASHINGS_TABLE)?;
        write_txn.commit()?;

        info!("Opened slasher database at {}", db_file.display());

        Ok(SlasherDB {
            db: Arc::new(db),
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn validator_spans_provider(&self) -> ValidatorSpansTable {
        ValidatorSpansTable {
            db: self.db.clone(),
        }
    }

    pub fn detected_slashings_provider(&self) -> DetectedSlashingsTable {
        DetectedSlashingsTable {
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use ream_slasher::span::Span;
    use tempdir::TempDir;

    use super::*;
    use crate::tables::Table;

    #[test]
    fn test_creates_missing_data_dir() -> Result<(), StoreError> {
        let tmp_dir = TempDir::new("test_creates_missing_data_dir")?;
        let data_dir = tmp_dir.path().join("nested").join("slasher");

        let db = SlasherDB::new(data_dir.clone())?;

        assert!(data_dir.join(REDB_FILE).exists());
        assert_eq!(db.data_dir(), &data_dir);
        Ok(())
    }

    #[test]
    fn test_reopen_keeps_records() -> Result<(), StoreError> {
        let tmp_dir = TempDir::new("test_reopen_keeps_records")?;
        let data_dir = tmp_dir.path().to_path_buf();

        let span = Span {
            min_span: 2,
            max_span: 5,
            ..Default::default()
        };
        SlasherDB::new(data_dir.clone())?
            .validator_spans_provider()
            .insert((1, 1), span)?;

        let db = SlasherDB::new(data_dir)?;
        assert_eq!(db.validator_spans_provider().get((1, 1))?, Some(span));
        Ok(())
    }
}
