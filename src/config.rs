//! Configuration of how redemption contexts are chosen.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

use crate::{Context, common::errors::ContextError};

/// Policy for deriving the redemption context of a request.
///
/// Deserializes from e.g. `{"policy": "time_window", "window_secs": 3600}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ContextPolicy {
    /// A fresh unpredictable epoch per derivation.
    RandomEpoch,
    /// Fixed-length time buckets anchored at the Unix epoch.
    TimeWindow {
        /// Bucket length in seconds.
        window_secs: u64,
    },
}

impl ContextPolicy {
    /// Derives a context for the instant `now`.
    ///
    /// `now` is ignored by [`ContextPolicy::RandomEpoch`].
    ///
    /// # Errors
    /// Returns an error if a time window of zero seconds is configured.
    pub fn derive(&self, now: SystemTime) -> Result<Context, ContextError> {
        match self {
            Self::RandomEpoch => Ok(Context::random_epoch()),
            Self::TimeWindow { window_secs } => {
                Context::time_window(now, Duration::from_secs(*window_secs))
            }
        }
    }
}
