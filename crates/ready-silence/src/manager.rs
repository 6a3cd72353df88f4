//! Silence lifecycle management.
//!
//! This module provides the [`SilenceManager`], which owns the single silence
//! the readiness job keeps in the store: finding it, creating it, and
//! removing it once the cluster is healthy.

use std::time::Duration;

use chrono::{SubsecRound, Utc};
use ready_exec::{FixedRetry, RetryError, retry_fixed};
use tracing::{debug, info, warn};

use crate::client::SilenceClient;
use crate::error::{Result, SilenceError};
use crate::types::{Matcher, Silence, SilenceState};

/// Provenance tag used when none is configured.
pub const DEFAULT_CREATED_BY: &str = "OSD Cluster Readiness Job";

/// Comment used when none is configured.
pub const DEFAULT_COMMENT: &str =
    "Created By the Cluster Readiness Job to silence any alerts during normal provisioning";

/// Retry cadence for each store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Listing silences: bounded, then the store is declared unavailable.
    pub list: FixedRetry,
    /// Creating a silence: the store may not be up yet right after install.
    pub create: FixedRetry,
    /// Removing a silence: bounded, then removal failure is fatal.
    pub remove: FixedRetry,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            list: FixedRetry::bounded(300, Duration::from_secs(1)),
            create: FixedRetry::unbounded(Duration::from_secs(30)),
            remove: FixedRetry::bounded(5, Duration::from_secs(1)),
        }
    }
}

/// Configuration for the silence manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilenceManagerConfig {
    /// Provenance tag marking silences this job owns.
    pub created_by: String,
    /// Comment attached to created silences.
    pub comment: String,
    /// Retry cadence.
    pub retry: RetryPolicy,
}

impl Default for SilenceManagerConfig {
    fn default() -> Self {
        Self {
            created_by: DEFAULT_CREATED_BY.to_string(),
            comment: DEFAULT_COMMENT.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Pick the silence this job considers its own.
///
/// Returns the first silence with a matching provenance tag that the store
/// reports as active. Additional owned silences are ignored, not cleaned up.
#[must_use]
pub fn select_owned(silences: Vec<Silence>, created_by: &str) -> Option<Silence> {
    let mut owned = silences
        .into_iter()
        .filter(|s| s.is_owned_by(created_by))
        .filter(|s| {
            if !s.is_active() {
                debug!(silence_id = %s.id, state = %s.status.state, "skipping inactive silence");
            }
            s.is_active()
        });

    let first = owned.next()?;
    let ignored = owned.count();
    if ignored > 0 {
        warn!(
            silence_id = %first.id,
            ignored,
            "multiple active silences created by job, tracking the first"
        );
    }
    Some(first)
}

/// Manages the readiness job's silence against a [`SilenceClient`].
#[derive(Debug)]
pub struct SilenceManager<C> {
    client: C,
    config: SilenceManagerConfig,
}

impl<C: SilenceClient> SilenceManager<C> {
    /// Creates a manager with default configuration.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self::with_config(client, SilenceManagerConfig::default())
    }

    /// Creates a manager with custom configuration.
    #[must_use]
    pub fn with_config(client: C, config: SilenceManagerConfig) -> Self {
        Self { client, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SilenceManagerConfig {
        &self.config
    }

    /// Returns the underlying store client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    async fn list_all(&self) -> Result<Vec<Silence>> {
        retry_fixed(
            &self.config.retry.list,
            "list silences",
            SilenceError::is_transient,
            || self.client.list(),
        )
        .await
        .map_err(|e| match e {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted { attempts, last } => SilenceError::StoreUnavailable {
                attempts,
                reason: last.to_string(),
            },
        })
    }

    /// Finds the active silence created by this job, if any.
    ///
    /// Not finding one is not an error.
    ///
    /// # Errors
    ///
    /// Returns `SilenceError::StoreUnavailable` once listing has failed for
    /// every allowed attempt, or the first non-transient error (such as a
    /// malformed response) immediately.
    pub async fn find_existing(&self) -> Result<Option<Silence>> {
        let silences = self.list_all().await?;

        if silences.is_empty() {
            info!("no silences present");
            return Ok(None);
        }

        match select_owned(silences, &self.config.created_by) {
            Some(silence) => {
                info!(silence_id = %silence.id, ends_at = %silence.ends_at, "found silence created by job");
                Ok(Some(silence))
            }
            None => {
                info!("no active silences created by job found");
                Ok(None)
            }
        }
    }

    /// Lists every active silence created by this job, in store order.
    ///
    /// # Errors
    ///
    /// Same as [`find_existing`](Self::find_existing).
    pub async fn list_owned(&self) -> Result<Vec<Silence>> {
        let owned: Vec<Silence> = self
            .list_all()
            .await?
            .into_iter()
            .filter(|s| s.is_owned_by(&self.config.created_by) && s.is_active())
            .collect();
        debug!(count = owned.len(), "listed active silences created by job");
        Ok(owned)
    }

    /// Builds an unsubmitted silence covering `window` from now.
    ///
    /// # Errors
    ///
    /// Returns `SilenceError::InvalidSilence` if `window` is zero or too large
    /// to represent.
    pub fn build(&self, window: Duration) -> Result<Silence> {
        let window = chrono::Duration::from_std(window).map_err(|e| {
            SilenceError::InvalidSilence {
                reason: format!("silence window out of range: {e}"),
            }
        })?;
        let now = Utc::now().trunc_subsecs(0);
        Silence::new(
            vec![Matcher::match_all()],
            now,
            now + window,
            self.config.created_by.clone(),
            self.config.comment.clone(),
        )
    }

    /// Creates a silence covering `window` from now.
    ///
    /// Transient submission failures are retried at the configured cadence,
    /// without limit by default; the caller re-checks cluster age between
    /// attempts at a higher level.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient error, such as a malformed response.
    pub async fn create(&self, window: Duration) -> Result<Silence> {
        let mut silence = self.build(window)?;

        let id = retry_fixed(
            &self.config.retry.create,
            "create silence",
            SilenceError::is_transient,
            || self.client.create(&silence),
        )
        .await
        .map_err(|e| match e {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted { attempts, last } => SilenceError::StoreUnavailable {
                attempts,
                reason: last.to_string(),
            },
        })?;

        silence.id = id;
        silence.status.state = SilenceState::Active;
        info!(
            silence_id = %silence.id,
            ends_at = %silence.ends_at,
            window_secs = window.as_secs(),
            "silence created"
        );
        Ok(silence)
    }

    /// Removes a silence.
    ///
    /// A silence the store no longer knows about counts as removed, as does
    /// one that was never submitted.
    ///
    /// # Errors
    ///
    /// Returns `SilenceError::RemovalFailed` once every allowed attempt has
    /// failed. The silence is then still in place.
    pub async fn remove(&self, silence: &Silence) -> Result<()> {
        if !silence.has_id() {
            debug!("silence was never created, nothing to remove");
            return Ok(());
        }
        let id = silence.id.as_str();
        info!(silence_id = %id, "removing silence");

        retry_fixed(&self.config.retry.remove, "remove silence", |_| true, || async move {
            match self.client.delete(id).await {
                Err(SilenceError::NotFound { .. }) => {
                    debug!(silence_id = %id, "silence already gone");
                    Ok(())
                }
                other => other,
            }
        })
        .await
        .map_err(|e| {
            let (attempts, reason) = match e {
                RetryError::Fatal(e) => (1, e.to_string()),
                RetryError::Exhausted { attempts, last } => (attempts, last.to_string()),
            };
            SilenceError::RemovalFailed {
                id: id.to_string(),
                attempts,
                reason,
            }
        })?;

        info!(silence_id = %id, "silence successfully removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeSilenceStore;
    use chrono::Duration as ChronoDuration;

    const TAG: &str = "readiness-test";

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            list: FixedRetry::bounded(3, Duration::from_secs(1)),
            create: FixedRetry::unbounded(Duration::from_secs(30)),
            remove: FixedRetry::bounded(5, Duration::from_secs(1)),
        }
    }

    fn manager(store: &FakeSilenceStore) -> SilenceManager<FakeSilenceStore> {
        SilenceManager::with_config(
            store.clone(),
            SilenceManagerConfig {
                created_by: TAG.to_string(),
                comment: "bring-up".to_string(),
                retry: fast_retry(),
            },
        )
    }

    fn listed(id: &str, created_by: &str, state: SilenceState) -> Silence {
        let now = Utc::now().trunc_subsecs(0);
        let mut s = Silence::new(
            vec![Matcher::match_all()],
            now,
            now + ChronoDuration::hours(1),
            created_by,
            "",
        )
        .unwrap();
        s.id = id.to_string();
        s.status.state = state;
        s
    }

    mod config_tests {
        use super::*;

        #[test]
        fn default_config() {
            let config = SilenceManagerConfig::default();
            assert_eq!(config.created_by, "OSD Cluster Readiness Job");
            assert_eq!(config.retry.list.max_attempts, Some(300));
            assert_eq!(config.retry.list.delay, Duration::from_secs(1));
            assert_eq!(config.retry.create.max_attempts, None);
            assert_eq!(config.retry.create.delay, Duration::from_secs(30));
            assert_eq!(config.retry.remove.max_attempts, Some(5));
        }
    }

    mod select_tests {
        use super::*;

        #[test]
        fn empty_list_selects_nothing() {
            assert!(select_owned(vec![], TAG).is_none());
        }

        #[test]
        fn foreign_and_inactive_are_ignored() {
            let silences = vec![
                listed("foreign", "someone else", SilenceState::Active),
                listed("expired", TAG, SilenceState::Expired),
                listed("pending", TAG, SilenceState::Pending),
            ];
            assert!(select_owned(silences, TAG).is_none());
        }

        #[test]
        fn first_owned_active_wins() {
            let silences = vec![
                listed("foreign", "someone else", SilenceState::Active),
                listed("mine-1", TAG, SilenceState::Active),
                listed("mine-2", TAG, SilenceState::Active),
            ];
            assert_eq!(select_owned(silences, TAG).unwrap().id, "mine-1");
        }
    }

    mod find_existing_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn empty_store_is_not_an_error() {
            let store = FakeSilenceStore::new();
            assert!(manager(&store).find_existing().await.unwrap().is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn returns_owned_active_silence() {
            let store = FakeSilenceStore::new();
            store.insert(listed("abc", TAG, SilenceState::Active));

            let found = manager(&store).find_existing().await.unwrap().unwrap();
            assert_eq!(found.id, "abc");
        }

        #[tokio::test(start_paused = true)]
        async fn ignores_foreign_silence() {
            let store = FakeSilenceStore::new();
            store.insert(listed("abc", "someone else", SilenceState::Active));
            assert!(manager(&store).find_existing().await.unwrap().is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn ignores_inactive_silence() {
            let store = FakeSilenceStore::new();
            store.insert(listed("abc", TAG, SilenceState::Expired));
            assert!(manager(&store).find_existing().await.unwrap().is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn retries_transient_list_failures() {
            let store = FakeSilenceStore::new();
            store.insert(listed("abc", TAG, SilenceState::Active));
            store.fail_next_lists(2);

            let found = manager(&store).find_existing().await.unwrap();
            assert_eq!(found.unwrap().id, "abc");
            assert_eq!(store.list_calls(), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn exhausted_list_retries_are_store_unavailable() {
            let store = FakeSilenceStore::new();
            store.fail_next_lists(10);

            let err = manager(&store).find_existing().await.unwrap_err();
            assert!(matches!(err, SilenceError::StoreUnavailable { attempts: 3, .. }));
            assert_eq!(store.list_calls(), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn malformed_list_is_not_retried() {
            let store = FakeSilenceStore::new();
            store.malformed_lists(true);

            let err = manager(&store).find_existing().await.unwrap_err();
            assert!(matches!(err, SilenceError::MalformedResponse { .. }));
            assert_eq!(store.list_calls(), 1);
        }
    }

    mod list_owned_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn returns_every_owned_active_silence() {
            let store = FakeSilenceStore::new();
            store.insert(listed("mine-1", TAG, SilenceState::Active));
            store.insert(listed("foreign", "someone else", SilenceState::Active));
            store.insert(listed("expired", TAG, SilenceState::Expired));
            store.insert(listed("mine-2", TAG, SilenceState::Active));

            let ids: Vec<String> = manager(&store)
                .list_owned()
                .await
                .unwrap()
                .into_iter()
                .map(|s| s.id)
                .collect();
            assert_eq!(ids.len(), 2);
            assert!(ids.contains(&"mine-1".to_string()));
            assert!(ids.contains(&"mine-2".to_string()));
        }

        #[tokio::test(start_paused = true)]
        async fn empty_store_lists_nothing() {
            let store = FakeSilenceStore::new();
            assert!(manager(&store).list_owned().await.unwrap().is_empty());
        }
    }

    mod create_tests {
        use super::*;

        #[test]
        fn build_sets_window_and_provenance() {
            let store = FakeSilenceStore::new();
            let silence = manager(&store).build(Duration::from_secs(45 * 60)).unwrap();
            assert!(!silence.has_id());
            assert_eq!(silence.created_by, TAG);
            assert_eq!(silence.comment, "bring-up");
            assert!(silence.matches_everything());
            assert_eq!(silence.window(), Duration::from_secs(45 * 60));
        }

        #[test]
        fn build_rejects_zero_window() {
            let store = FakeSilenceStore::new();
            assert!(manager(&store).build(Duration::ZERO).is_err());
        }

        #[tokio::test(start_paused = true)]
        async fn create_returns_store_id() {
            let store = FakeSilenceStore::new();
            let silence = manager(&store).create(Duration::from_secs(600)).await.unwrap();

            assert!(silence.has_id());
            assert!(silence.is_active());
            assert_eq!(store.created_ids(), vec![silence.id.clone()]);
        }

        #[tokio::test(start_paused = true)]
        async fn create_keeps_retrying_until_store_is_ready() {
            let store = FakeSilenceStore::new();
            store.fail_next_creates(20);

            let start = tokio::time::Instant::now();
            let silence = manager(&store).create(Duration::from_secs(600)).await.unwrap();

            assert!(silence.has_id());
            assert_eq!(store.create_calls(), 21);
            assert_eq!(start.elapsed(), Duration::from_secs(20 * 30));
        }

        #[tokio::test(start_paused = true)]
        async fn created_silence_round_trips_through_list() {
            let store = FakeSilenceStore::new();
            let mgr = manager(&store);
            let created = mgr.create(Duration::from_secs(3600)).await.unwrap();

            let found = mgr.find_existing().await.unwrap().unwrap();
            assert_eq!(found.id, created.id);
            assert_eq!(found.created_by, TAG);
            assert_eq!(found.starts_at, created.starts_at);
            assert_eq!(found.ends_at, created.ends_at);
            assert!(found.matches_everything());
        }
    }

    mod remove_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn remove_deletes_from_store() {
            let store = FakeSilenceStore::new();
            let mgr = manager(&store);
            let silence = mgr.create(Duration::from_secs(600)).await.unwrap();

            mgr.remove(&silence).await.unwrap();
            assert!(store.silences().is_empty());
            assert_eq!(store.deleted_ids(), vec![silence.id]);
        }

        #[tokio::test(start_paused = true)]
        async fn remove_missing_silence_is_success() {
            let store = FakeSilenceStore::new();
            let silence = listed("gone", TAG, SilenceState::Active);

            manager(&store).remove(&silence).await.unwrap();
            assert_eq!(store.delete_calls(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn remove_unsubmitted_silence_is_noop() {
            let store = FakeSilenceStore::new();
            let silence = manager(&store).build(Duration::from_secs(60)).unwrap();

            manager(&store).remove(&silence).await.unwrap();
            assert_eq!(store.delete_calls(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn remove_retries_then_succeeds() {
            let store = FakeSilenceStore::new();
            store.insert(listed("abc", TAG, SilenceState::Active));
            store.fail_next_deletes(4);

            let silence = store.silences().remove(0);
            manager(&store).remove(&silence).await.unwrap();
            assert_eq!(store.delete_calls(), 5);
            assert!(store.silences().is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn remove_gives_up_after_bounded_attempts() {
            let store = FakeSilenceStore::new();
            store.insert(listed("abc", TAG, SilenceState::Active));
            store.fail_next_deletes(100);

            let silence = store.silences().remove(0);
            let err = manager(&store).remove(&silence).await.unwrap_err();
            match err {
                SilenceError::RemovalFailed { id, attempts, .. } => {
                    assert_eq!(id, "abc");
                    assert_eq!(attempts, 5);
                }
                other => panic!("expected RemovalFailed, got {other:?}"),
            }
            assert_eq!(store.silences().len(), 1);
        }
    }
}
