//! Time source for commit timestamps
//!
//! Commit digests include the creation time, so anything that compares
//! digests across runs needs a reproducible clock. The repository takes an
//! `Arc<dyn Clock>`; production code uses [`SystemClock`] and tests use
//! [`FixedClock`].

use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Source of the current instant
pub trait Clock: Debug + Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Fixed clock at the Unix epoch
    pub fn epoch() -> Self {
        FixedClock(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
