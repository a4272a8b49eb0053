use crate::errors::StoreError;

/// Typed access to one redb table. Each call runs in its own transaction.
pub trait Table {
    type Key;

    type Value;

    fn get(&self, key: Self::Key) -> Result<Option<Self::Value>, StoreError>;

    fn insert(&self, key: Self::Key, value: Self::Value) -> Result<(), StoreError>;

    fn contains_key(&self, key: Self::Key) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}
