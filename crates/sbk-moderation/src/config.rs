use serde::{Deserialize, Serialize};

/// Gate configuration: the denylist and the escalation schedule.
///
/// The default schedule escalates per strike within an ISO week and caps at
/// the last step: 5, 10, 15, 30, 60, then 180 minutes for every further
/// strike that week.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Base terms to block. Matching is case-insensitive and tolerant of
    /// separator characters between letters; deployments supply the terms.
    pub denylist: Vec<String>,
    /// Suspension duration per strike number, in minutes.
    pub schedule_minutes: Vec<u64>,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            denylist: Vec::new(),
            schedule_minutes: vec![5, 10, 15, 30, 60, 180],
        }
    }
}

impl ModerationConfig {
    /// Default schedule with the given denylist terms.
    pub fn with_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denylist: terms.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}
