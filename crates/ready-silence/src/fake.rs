//! In-memory silence store for testing.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use ready_exec::ExecError;

use crate::client::SilenceClient;
use crate::error::{Result, SilenceError};
use crate::types::{Silence, SilenceState};

#[derive(Debug, Default)]
struct StoreState {
    silences: Vec<Silence>,
    failing_lists: u32,
    failing_creates: u32,
    failing_deletes: u32,
    malformed_lists: bool,
    list_calls: u32,
    create_calls: u32,
    delete_calls: u32,
    created_ids: Vec<String>,
    deleted_ids: Vec<String>,
}

/// A silence store held in memory.
///
/// Clones share the same store, so a test can hand one clone to the code
/// under test and inspect the other. Failures can be scripted per operation;
/// scripted failures look like a pod that is not ready yet and are transient.
#[derive(Debug, Clone, Default)]
pub struct FakeSilenceStore {
    state: Arc<Mutex<StoreState>>,
}

fn not_ready() -> SilenceError {
    SilenceError::Transport(ExecError::non_zero_exit(
        "oc exec alertmanager",
        1,
        "container not ready",
    ))
}

impl FakeSilenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a silence as if someone else had created it.
    pub fn insert(&self, silence: Silence) {
        self.state.lock().silences.push(silence);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_silence(self, silence: Silence) -> Self {
        self.insert(silence);
        self
    }

    /// Makes the next `n` list calls fail.
    pub fn fail_next_lists(&self, n: u32) {
        self.state.lock().failing_lists = n;
    }

    /// Makes the next `n` create calls fail.
    pub fn fail_next_creates(&self, n: u32) {
        self.state.lock().failing_creates = n;
    }

    /// Makes the next `n` delete calls fail.
    pub fn fail_next_deletes(&self, n: u32) {
        self.state.lock().failing_deletes = n;
    }

    /// Makes list calls return an unparseable body.
    pub fn malformed_lists(&self, malformed: bool) {
        self.state.lock().malformed_lists = malformed;
    }

    /// Silences currently in the store.
    #[must_use]
    pub fn silences(&self) -> Vec<Silence> {
        self.state.lock().silences.clone()
    }

    /// Number of list calls received.
    #[must_use]
    pub fn list_calls(&self) -> u32 {
        self.state.lock().list_calls
    }

    /// Number of create calls received.
    #[must_use]
    pub fn create_calls(&self) -> u32 {
        self.state.lock().create_calls
    }

    /// Number of delete calls received.
    #[must_use]
    pub fn delete_calls(&self) -> u32 {
        self.state.lock().delete_calls
    }

    /// IDs of silences created successfully, in order.
    #[must_use]
    pub fn created_ids(&self) -> Vec<String> {
        self.state.lock().created_ids.clone()
    }

    /// IDs of silences deleted successfully, in order.
    #[must_use]
    pub fn deleted_ids(&self) -> Vec<String> {
        self.state.lock().deleted_ids.clone()
    }
}

const fn list_rank(state: SilenceState) -> u8 {
    match state {
        SilenceState::Active => 0,
        SilenceState::Pending => 1,
        SilenceState::Expired => 2,
        SilenceState::Unknown => 3,
    }
}

impl SilenceClient for FakeSilenceStore {
    async fn list(&self) -> Result<Vec<Silence>> {
        let mut state = self.state.lock();
        state.list_calls += 1;
        if state.failing_lists > 0 {
            state.failing_lists -= 1;
            return Err(not_ready());
        }
        if state.malformed_lists {
            return Err(SilenceError::MalformedResponse {
                reason: "expected value at line 1 column 1".to_string(),
            });
        }
        let now = Utc::now();
        for silence in &mut state.silences {
            if silence.is_active() && silence.ends_at <= now {
                silence.status.state = SilenceState::Expired;
            }
        }
        // Alertmanager lists active silences first, soonest-ending first.
        let mut listed = state.silences.clone();
        listed.sort_by_key(|s| (list_rank(s.status.state), s.ends_at));
        Ok(listed)
    }

    async fn create(&self, silence: &Silence) -> Result<String> {
        let mut state = self.state.lock();
        state.create_calls += 1;
        if state.failing_creates > 0 {
            state.failing_creates -= 1;
            return Err(not_ready());
        }

        let id = uuid::Uuid::new_v4().to_string();
        let mut stored = silence.clone();
        stored.id.clone_from(&id);
        stored.status.state = SilenceState::Active;
        state.silences.push(stored);
        state.created_ids.push(id.clone());
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.delete_calls += 1;
        if state.failing_deletes > 0 {
            state.failing_deletes -= 1;
            return Err(not_ready());
        }

        let before = state.silences.len();
        state.silences.retain(|s| s.id != id);
        if state.silences.len() == before {
            return Err(SilenceError::NotFound { id: id.to_string() });
        }
        state.deleted_ids.push(id.to_string());
        Ok(())
    }
}
