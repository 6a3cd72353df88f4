//! Scripted probe for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::outcome::HealthOutcome;
use crate::probe::HealthProbe;

#[derive(Debug)]
struct Script {
    outcomes: VecDeque<HealthOutcome>,
    fallback: HealthOutcome,
    calls: u32,
}

/// A probe that replays a fixed sequence of outcomes.
///
/// Once the script runs out, every further probe reports the fallback
/// outcome ([`HealthOutcome::Success`] unless changed). Clones share the
/// script and the call counter.
#[derive(Debug, Clone)]
pub struct ScriptedProbe {
    script: Arc<Mutex<Script>>,
}

impl ScriptedProbe {
    /// Creates a probe replaying `outcomes` in order.
    #[must_use]
    pub fn new(outcomes: impl IntoIterator<Item = HealthOutcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                outcomes: outcomes.into_iter().collect(),
                fallback: HealthOutcome::Success,
                calls: 0,
            })),
        }
    }

    /// Creates a probe that always reports `outcome`.
    #[must_use]
    pub fn always(outcome: HealthOutcome) -> Self {
        Self::new(Vec::new()).then_always(outcome)
    }

    /// Sets the outcome reported after the script runs out.
    #[must_use]
    pub fn then_always(self, fallback: HealthOutcome) -> Self {
        self.script.lock().fallback = fallback;
        self
    }

    /// Number of probes run so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.script.lock().calls
    }
}

impl HealthProbe for ScriptedProbe {
    async fn probe(&self) -> HealthOutcome {
        let mut script = self.script.lock();
        script.calls += 1;
        match script.outcomes.pop_front() {
            Some(outcome) => outcome,
            None => script.fallback.clone(),
        }
    }
}
