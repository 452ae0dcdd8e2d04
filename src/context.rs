//! Redemption contexts.
//!
//! A context scopes a token to a redemption window or session. Client and
//! issuer must agree on the same bytes out of band; the protocol only ever
//! treats them as opaque input to [`TokenInput`](crate::TokenInput).

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha512};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::common::errors::ContextError;

/// Domain tag of randomly drawn epochs.
pub const EPOCH_TAG: &[u8] = b"epoch:";
/// Domain tag of time-window contexts.
pub const TIME_WINDOW_TAG: &[u8] = b"ppassrc:time-window";
/// Length of derived contexts (SHA-512 output).
pub const CONTEXT_LEN: usize = 64;

/// Opaque redemption context.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Context(Vec<u8>);

impl Context {
    /// Wraps caller-provided context bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Draws a fresh, unpredictable epoch.
    ///
    /// The caller is responsible for presenting the same context again at
    /// redemption time.
    #[must_use]
    pub fn random_epoch() -> Self {
        let mut epoch = [0u8; 32];
        OsRng.fill_bytes(&mut epoch);

        let mut hasher = Sha512::new();
        hasher.update(EPOCH_TAG);
        hasher.update(epoch);
        Self(hasher.finalize().to_vec())
    }

    /// Derives the context of the time bucket `now` falls into.
    ///
    /// Two instants in the same bucket of length `window` yield the same
    /// context. Buckets are anchored at the Unix epoch.
    ///
    /// # Errors
    /// Returns an error if `window` is zero.
    pub fn time_window(now: SystemTime, window: Duration) -> Result<Self, ContextError> {
        let window_nanos = window.as_nanos();
        if window_nanos == 0 {
            return Err(ContextError::NonPositiveWindow);
        }
        let bucket = unix_nanos(now).div_euclid(window_nanos as i128);

        let mut hasher = Sha512::new();
        hasher.update(TIME_WINDOW_TAG);
        hasher.update(bucket.to_be_bytes());
        hasher.update(window_nanos.to_be_bytes());
        Ok(Self(hasher.finalize().to_vec()))
    }

    /// Returns the raw context bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Context {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// Negative before the Unix epoch.
fn unix_nanos(now: SystemTime) -> i128 {
    match now.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_nanos() as i128,
        Err(before) => -(before.duration().as_nanos() as i128),
    }
}
