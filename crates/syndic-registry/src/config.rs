use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Submission window applied when a committee is opened without an
    /// explicit deadline.
    pub submission_window_secs: i64,
    /// Largest committee size accepted at opening.
    pub max_committee_size: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            submission_window_secs: 3_600,
            max_committee_size: 128,
        }
    }
}
