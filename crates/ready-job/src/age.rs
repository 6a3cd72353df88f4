//! Cluster age gate.
//!
//! The job only owns the bring-up window of a new cluster. A cluster older
//! than the configured maximum is never silenced.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// True if the cluster was born strictly before `max_age` ago.
#[must_use]
pub fn is_too_old(cluster_birth: DateTime<Utc>, max_age: Duration) -> bool {
    is_too_old_at(cluster_birth, max_age, Utc::now())
}

/// [`is_too_old`] evaluated at a given instant.
#[must_use]
pub fn is_too_old_at(cluster_birth: DateTime<Utc>, max_age: Duration, now: DateTime<Utc>) -> bool {
    let Ok(max_age) = chrono::Duration::from_std(max_age) else {
        return false;
    };
    now.checked_sub_signed(max_age)
        .is_some_and(|cutoff| cluster_birth < cutoff)
}

/// How long ago the cluster was born, as seen at `now`.
#[must_use]
pub fn cluster_age_at(cluster_birth: DateTime<Utc>, now: DateTime<Utc>) -> chrono::Duration {
    now - cluster_birth
}
