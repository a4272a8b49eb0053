use serde::{Deserialize, Serialize};

use crate::errors::SlasherError;

/// Number of epochs of history kept by default, about 18 days of mainnet epochs.
pub const DEFAULT_HISTORY_WINDOW: u16 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlasherConfig {
    /// Largest accepted `target - source` distance, and how far back min spans are propagated.
    pub history_window: u16,
}

impl SlasherConfig {
    pub fn new(history_window: u16) -> Self {
        Self { history_window }
    }

    pub fn validate(&self) -> Result<(), SlasherError> {
        if self.history_window == 0 {
            return Err(SlasherError::InvalidConfig(
                "history_window must be at least one epoch".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SlasherConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}
