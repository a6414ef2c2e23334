use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::ModerationConfig;
use crate::error::{ModerationError, ModerationResult};
use crate::matcher::DenylistMatcher;

/// ISO year + week number. Strike counts reset when this changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct WeekKey {
    year: i32,
    week: u32,
}

impl WeekKey {
    fn of(at: DateTime<Utc>) -> Self {
        let iso = at.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

/// Per-user escalation state.
#[derive(Clone, Copy, Debug)]
struct StrikeState {
    strikes: u32,
    last_violation: DateTime<Utc>,
    week: WeekKey,
}

/// Why a write was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockReason {
    /// The user is inside an active suspension window.
    Suspended,
    /// The text matched this denylisted term.
    DeniedTerm(String),
}

/// Outcome of gating one write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Blocked {
        reason: BlockReason,
        retry_after: Duration,
    },
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// The moderation gate: classifies text against the denylist and tracks a
/// per-user, per-ISO-week escalating suspension window.
///
/// Must be consulted BEFORE any comment or reply is written; a blocked
/// verdict prevents the write entirely. State is owned by the gate object
/// (inject it where it's needed; no module globals), is per-process, and
/// does not survive a restart.
///
/// One quirk is load-bearing: suspensions silently lapse when the ISO week
/// rolls over, even if the duration has not elapsed. The weekly strike
/// reset has always behaved that way and callers rely on it.
pub struct ModerationGate {
    matcher: DenylistMatcher,
    schedule: Vec<Duration>,
    strikes: RwLock<HashMap<String, StrikeState>>,
    clock: Arc<dyn Clock>,
}

impl ModerationGate {
    /// Gate on the wall clock.
    pub fn new(config: ModerationConfig) -> ModerationResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Gate with an injected time source.
    pub fn with_clock(config: ModerationConfig, clock: Arc<dyn Clock>) -> ModerationResult<Self> {
        if config.schedule_minutes.is_empty() {
            return Err(ModerationError::EmptySchedule);
        }
        Ok(Self {
            matcher: DenylistMatcher::build(&config.denylist)?,
            schedule: config
                .schedule_minutes
                .iter()
                .map(|m| Duration::from_secs(m * 60))
                .collect(),
            strikes: RwLock::new(HashMap::new()),
            clock,
        })
    }

    /// Classify one prospective write.
    ///
    /// A currently suspended user is blocked with the remaining window. A
    /// denylist match is blocked with the duration the suspension will run
    /// once the caller records the violation.
    pub fn check(&self, username: &str, text: &str) -> Verdict {
        let now = self.clock.now();

        if let Some(remaining) = self.suspension_remaining(username, now) {
            return Verdict::Blocked {
                reason: BlockReason::Suspended,
                retry_after: remaining,
            };
        }

        if let Some(term) = self.matcher.find_match(text) {
            debug!(%username, term, "denylist match");
            return Verdict::Blocked {
                reason: BlockReason::DeniedTerm(term.to_string()),
                retry_after: self.projected_duration(username, now),
            };
        }

        Verdict::Allowed
    }

    /// Record a violation for `username` and return the suspension duration
    /// now in force. Call only after [`Self::check`] found a match.
    pub fn record_violation(&self, username: &str) -> Duration {
        let now = self.clock.now();
        let week = WeekKey::of(now);

        let mut strikes = self.strikes.write().expect("lock poisoned");
        let state = strikes
            .entry(username.to_string())
            .and_modify(|s| {
                if s.week == week {
                    s.strikes += 1;
                } else {
                    s.strikes = 1;
                }
                s.last_violation = now;
                s.week = week;
            })
            .or_insert(StrikeState {
                strikes: 1,
                last_violation: now,
                week,
            });

        let duration = self.duration_for(state.strikes);
        info!(
            %username,
            strikes = state.strikes,
            minutes = duration.as_secs() / 60,
            "violation recorded"
        );
        duration
    }

    /// [`Self::check`] and, on a denylist match, [`Self::record_violation`]
    /// in one step. The returned verdict carries the authoritative
    /// suspension duration.
    pub fn enforce(&self, username: &str, text: &str) -> Verdict {
        match self.check(username, text) {
            Verdict::Blocked {
                reason: reason @ BlockReason::DeniedTerm(_),
                ..
            } => {
                let retry_after = self.record_violation(username);
                Verdict::Blocked {
                    reason,
                    retry_after,
                }
            }
            other => other,
        }
    }

    /// Remaining suspension for `username` at `now`, if any. A suspension
    /// only holds while the stored week key matches the current ISO week.
    fn suspension_remaining(&self, username: &str, now: DateTime<Utc>) -> Option<Duration> {
        let strikes = self.strikes.read().expect("lock poisoned");
        let state = strikes.get(username)?;
        if state.week != WeekKey::of(now) {
            return None;
        }
        let ends_at =
            state.last_violation + chrono::Duration::from_std(self.duration_for(state.strikes)).ok()?;
        (ends_at > now).then(|| (ends_at - now).to_std().unwrap_or_default())
    }

    /// The duration the next violation would carry, without recording it.
    fn projected_duration(&self, username: &str, now: DateTime<Utc>) -> Duration {
        let strikes = self.strikes.read().expect("lock poisoned");
        let next_strikes = match strikes.get(username) {
            Some(state) if state.week == WeekKey::of(now) => state.strikes + 1,
            _ => 1,
        };
        self.duration_for(next_strikes)
    }

    /// `schedule[min(strikes - 1, len - 1)]`: escalates, then caps.
    fn duration_for(&self, strikes: u32) -> Duration {
        let index = (strikes.saturating_sub(1) as usize).min(self.schedule.len() - 1);
        self.schedule[index]
    }
}

/// Render a retry-after window for humans: "1 hour and 5 minutes".
///
/// Partial minutes round up so the text never promises an earlier retry
/// than the gate will allow.
pub fn format_retry_after(duration: Duration) -> String {
    let total_minutes = duration.as_secs().div_ceil(60);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };

    match (hours, minutes) {
        (0, 0) => "less than a minute".to_string(),
        (0, m) => plural(m, "minute"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} and {}", plural(h, "hour"), plural(m, "minute")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    /// Midweek anchor (a Wednesday) so tests can roll the ISO week forward
    /// deterministically.
    fn wednesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 3, 12, 0, 0).unwrap()
    }

    fn gate_at(start: DateTime<Utc>) -> (ModerationGate, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_at(start));
        let gate = ModerationGate::with_clock(
            ModerationConfig::with_terms(["badword"]),
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .unwrap();
        (gate, clock)
    }

    fn minutes(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    // -----------------------------------------------------------------------
    // 1. Clean text from a clean user passes
    // -----------------------------------------------------------------------
    #[test]
    fn clean_text_is_allowed() {
        let (gate, _) = gate_at(wednesday());
        assert_eq!(gate.check("alice", "what a nice project"), Verdict::Allowed);
    }

    // -----------------------------------------------------------------------
    // 2. First strike carries the first schedule step
    // -----------------------------------------------------------------------
    #[test]
    fn first_violation_suspends_for_five_minutes() {
        let (gate, _) = gate_at(wednesday());
        let verdict = gate.enforce("alice", "you badword");
        assert_eq!(
            verdict,
            Verdict::Blocked {
                reason: BlockReason::DeniedTerm("badword".into()),
                retry_after: minutes(5),
            }
        );
    }

    // -----------------------------------------------------------------------
    // 3. Second strike in the same week escalates
    // -----------------------------------------------------------------------
    #[test]
    fn second_violation_in_week_escalates_to_ten() {
        let (gate, clock) = gate_at(wednesday());
        gate.enforce("alice", "badword");
        clock.advance(chrono::Duration::minutes(6)); // first window over

        let verdict = gate.enforce("alice", "b.a.d.w.o.r.d");
        match verdict {
            Verdict::Blocked { retry_after, .. } => assert_eq!(retry_after, minutes(10)),
            other => panic!("expected a block, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // 4. The schedule caps at the last step
    // -----------------------------------------------------------------------
    #[test]
    fn schedule_caps_at_180_minutes() {
        let (gate, clock) = gate_at(wednesday());
        for _ in 0..8 {
            gate.enforce("alice", "badword");
            clock.advance(chrono::Duration::hours(4)); // clear each window
        }
        // 9th strike, same week: still the cap.
        let verdict = gate.enforce("alice", "badword");
        match verdict {
            Verdict::Blocked { retry_after, .. } => assert_eq!(retry_after, minutes(180)),
            other => panic!("expected a block, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // 5. While suspended, everything is blocked with the remaining time
    // -----------------------------------------------------------------------
    #[test]
    fn suspended_user_is_blocked_even_for_clean_text() {
        let (gate, clock) = gate_at(wednesday());
        gate.enforce("alice", "badword"); // 5 minute window
        clock.advance(chrono::Duration::minutes(2));

        match gate.check("alice", "a perfectly clean comment") {
            Verdict::Blocked {
                reason: BlockReason::Suspended,
                retry_after,
            } => assert_eq!(retry_after, minutes(3)),
            other => panic!("expected suspension, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // 6. Suspension expires with time
    // -----------------------------------------------------------------------
    #[test]
    fn suspension_lapses_after_duration() {
        let (gate, clock) = gate_at(wednesday());
        gate.enforce("alice", "badword");
        clock.advance(chrono::Duration::minutes(5));
        assert!(gate.check("alice", "hello again").is_allowed());
    }

    // -----------------------------------------------------------------------
    // 7. Week rollover resets the strike count
    // -----------------------------------------------------------------------
    #[test]
    fn new_iso_week_resets_strikes_to_one() {
        let (gate, clock) = gate_at(wednesday());
        for _ in 0..4 {
            gate.enforce("alice", "badword");
            clock.advance(chrono::Duration::hours(4));
        }
        // Into the next ISO week.
        clock.advance(chrono::Duration::days(7));
        let verdict = gate.enforce("alice", "badword");
        match verdict {
            Verdict::Blocked { retry_after, .. } => {
                assert_eq!(retry_after, minutes(5), "strike count should reset")
            }
            other => panic!("expected a block, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // 8. Week rollover silently lapses an unexpired suspension
    // -----------------------------------------------------------------------
    #[test]
    fn suspension_lapses_at_week_boundary_even_if_unexpired() {
        // Sunday evening: escalate to the 180-minute step so the window
        // runs well past midnight into the next ISO week.
        let sunday_evening = Utc.with_ymd_and_hms(2024, 7, 7, 20, 0, 0).unwrap();
        let (gate, clock) = gate_at(sunday_evening);
        for gap_minutes in [6, 11, 16, 31, 61] {
            gate.enforce("alice", "badword");
            clock.advance(chrono::Duration::minutes(gap_minutes));
        }
        // Sixth strike at 22:05: suspended until 01:05 Monday.
        match gate.enforce("alice", "badword") {
            Verdict::Blocked { retry_after, .. } => assert_eq!(retry_after, minutes(180)),
            other => panic!("expected a block, got {other:?}"),
        }
        // 00:10 Monday is the next ISO week; the window lapses with it.
        clock.set(Utc.with_ymd_and_hms(2024, 7, 8, 0, 10, 0).unwrap());
        assert!(
            gate.check("alice", "clean text").is_allowed(),
            "weekly reset lapses the window"
        );
    }

    // -----------------------------------------------------------------------
    // 9. Strike state is per-user
    // -----------------------------------------------------------------------
    #[test]
    fn users_do_not_share_strikes() {
        let (gate, _) = gate_at(wednesday());
        gate.enforce("alice", "badword");
        assert!(gate.check("bob", "hello").is_allowed());
        match gate.enforce("bob", "badword") {
            Verdict::Blocked { retry_after, .. } => assert_eq!(retry_after, minutes(5)),
            other => panic!("expected a block, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // 10. check alone never mutates state
    // -----------------------------------------------------------------------
    #[test]
    fn check_does_not_record() {
        let (gate, _) = gate_at(wednesday());
        gate.check("alice", "badword");
        gate.check("alice", "badword");
        // Still the first step: nothing was recorded.
        assert_eq!(gate.record_violation("alice"), minutes(5));
    }

    // -----------------------------------------------------------------------
    // Retry-after formatting
    // -----------------------------------------------------------------------

    #[test]
    fn format_minutes_only() {
        assert_eq!(format_retry_after(minutes(5)), "5 minutes");
        assert_eq!(format_retry_after(minutes(1)), "1 minute");
    }

    #[test]
    fn format_hours_and_minutes() {
        assert_eq!(format_retry_after(minutes(65)), "1 hour and 5 minutes");
        assert_eq!(format_retry_after(minutes(180)), "3 hours");
        assert_eq!(format_retry_after(minutes(121)), "2 hours and 1 minute");
    }

    #[test]
    fn format_rounds_partial_minutes_up() {
        assert_eq!(
            format_retry_after(Duration::from_secs(4 * 60 + 59)),
            "5 minutes"
        );
        assert_eq!(format_retry_after(Duration::from_secs(10)), "1 minute");
    }

    #[test]
    fn format_zero() {
        assert_eq!(format_retry_after(Duration::ZERO), "less than a minute");
    }
}
