//! Silence record types.
//!
//! This module provides the Alertmanager v2 silence model:
//! - [`Matcher`]: A label matcher selecting which alerts are silenced
//! - [`SilenceState`]: The state the store reports for a silence
//! - [`Silence`]: A time-boxed suppression record

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SilenceError};

/// Label the match-all matcher selects on.
pub const MATCH_ALL_LABEL: &str = "severity";

/// Regex that matches every value of [`MATCH_ALL_LABEL`].
pub const MATCH_ALL_PATTERN: &str = ".*";

/// Timestamps travel as second-precision RFC3339.
mod rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// A label matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    /// Label name.
    pub name: String,
    /// Value or pattern to match.
    pub value: String,
    /// Whether `value` is a regular expression.
    pub is_regex: bool,
}

impl Matcher {
    /// A matcher selecting every alert.
    #[must_use]
    pub fn match_all() -> Self {
        Self {
            name: MATCH_ALL_LABEL.to_string(),
            value: MATCH_ALL_PATTERN.to_string(),
            is_regex: true,
        }
    }

    /// True if this matcher selects every alert.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.is_regex && self.name == MATCH_ALL_LABEL && self.value == MATCH_ALL_PATTERN
    }
}

/// The state of a silence as reported by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SilenceState {
    /// Starts in the future.
    #[default]
    Pending,
    /// Currently suppressing alerts.
    Active,
    /// Past its end time.
    Expired,
    /// A state this job does not know about.
    #[serde(other)]
    Unknown,
}

impl SilenceState {
    /// Returns the state as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SilenceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status block of a listed silence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilenceStatus {
    /// Observed state.
    pub state: SilenceState,
}

/// A time-boxed alert suppression.
///
/// The same type is submitted to and listed from the store; `id` and `status`
/// are only filled in by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Silence {
    /// Store-assigned identifier (empty until created).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Observed state.
    #[serde(default, skip_serializing)]
    pub status: SilenceStatus,
    /// Matchers (alerts matching all of them are silenced).
    pub matchers: Vec<Matcher>,
    /// When the silence starts.
    #[serde(with = "rfc3339")]
    pub starts_at: DateTime<Utc>,
    /// When the silence ends.
    #[serde(with = "rfc3339")]
    pub ends_at: DateTime<Utc>,
    /// Who created the silence.
    pub created_by: String,
    /// Comment explaining the silence.
    #[serde(default)]
    pub comment: String,
}

impl Silence {
    /// Creates a new, not yet submitted silence.
    ///
    /// # Errors
    ///
    /// Returns `SilenceError::InvalidSilence` if `ends_at` is not after
    /// `starts_at`, no matchers are given, or `created_by` is empty.
    pub fn new(
        matchers: Vec<Matcher>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        created_by: impl Into<String>,
        comment: impl Into<String>,
    ) -> Result<Self> {
        if ends_at <= starts_at {
            return Err(SilenceError::InvalidSilence {
                reason: "silence end time must be after start time".to_string(),
            });
        }
        if matchers.is_empty() {
            return Err(SilenceError::InvalidSilence {
                reason: "silence needs at least one matcher".to_string(),
            });
        }
        let created_by = created_by.into();
        if created_by.is_empty() {
            return Err(SilenceError::InvalidSilence {
                reason: "createdBy cannot be empty".to_string(),
            });
        }

        Ok(Self {
            id: String::new(),
            status: SilenceStatus::default(),
            matchers,
            starts_at,
            ends_at,
            created_by,
            comment: comment.into(),
        })
    }

    /// True once the store has assigned an ID.
    #[must_use]
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// True if the store reports this silence as active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.state == SilenceState::Active
    }

    /// True if this silence carries the given provenance tag.
    #[must_use]
    pub fn is_owned_by(&self, created_by: &str) -> bool {
        self.created_by == created_by
    }

    /// True if every matcher selects all alerts.
    #[must_use]
    pub fn matches_everything(&self) -> bool {
        !self.matchers.is_empty() && self.matchers.iter().all(Matcher::is_match_all)
    }

    /// Length of the validity window the silence was created with.
    #[must_use]
    pub fn window(&self) -> Duration {
        (self.ends_at - self.starts_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// True if the silence's window is shorter than `margin`.
    ///
    /// This compares the created window (`ends_at - starts_at`), not the time
    /// left from now, so a silence sized for a shorter health-check pass gets
    /// replaced before a longer pass starts.
    #[must_use]
    pub fn will_expire_by(&self, margin: Duration) -> bool {
        self.window() < margin
    }

    /// Time left until the silence ends.
    #[must_use]
    pub fn remaining(&self) -> chrono::Duration {
        self.remaining_at(Utc::now())
    }

    /// Time left until the silence ends, as seen at `now`.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.ends_at - now
    }
}
