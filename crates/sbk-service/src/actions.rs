use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use sbk_moderation::Clock;
use sbk_types::{ProjectId, StatKind};

/// One view per (project, user) per rolling window.
const VIEW_WINDOW_HOURS: i64 = 24;

/// Per-process one-time-action tracking for loves, favorites, and views.
///
/// Loves and favorites are once ever per (project, user); views are once
/// per rolling 24 hours. State is intentionally ephemeral — it does not
/// survive a restart — but within a process a single mutex makes
/// claim-then-write race-free: two concurrent requests for the same
/// (project, user, action) cannot both claim.
pub struct ActionTracker {
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    loves: HashSet<(ProjectId, String)>,
    favorites: HashSet<(ProjectId, String)>,
    views: HashMap<(ProjectId, String), DateTime<Utc>>,
}

impl ActionTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(State::default()),
        }
    }

    /// Claim the action. `false` means it was already spent (or, for views,
    /// the window has not rolled over yet).
    pub fn try_claim(&self, id: ProjectId, kind: StatKind, username: &str) -> bool {
        let key = (id, username.to_string());
        let mut state = self.state.lock().expect("lock poisoned");
        match kind {
            StatKind::Love => state.loves.insert(key),
            StatKind::Favorite => state.favorites.insert(key),
            StatKind::View => {
                let now = self.clock.now();
                match state.views.get(&key) {
                    Some(last) if now - *last < Duration::hours(VIEW_WINDOW_HOURS) => false,
                    _ => {
                        state.views.insert(key, now);
                        true
                    }
                }
            }
        }
    }

    /// Undo a claim whose follow-up write failed, so the user is not locked
    /// out of an action that never landed.
    pub fn release(&self, id: ProjectId, kind: StatKind, username: &str) {
        let key = (id, username.to_string());
        let mut state = self.state.lock().expect("lock poisoned");
        match kind {
            StatKind::Love => {
                state.loves.remove(&key);
            }
            StatKind::Favorite => {
                state.favorites.remove(&key);
            }
            StatKind::View => {
                state.views.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbk_moderation::ManualClock;

    fn tracker() -> (ActionTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        (
            ActionTracker::new(Arc::clone(&clock) as Arc<dyn Clock>),
            clock,
        )
    }

    fn id(n: u64) -> ProjectId {
        ProjectId::new(n)
    }

    #[test]
    fn love_is_once_ever() {
        let (t, _) = tracker();
        assert!(t.try_claim(id(1), StatKind::Love, "alice"));
        assert!(!t.try_claim(id(1), StatKind::Love, "alice"));
    }

    #[test]
    fn love_and_favorite_are_independent() {
        let (t, _) = tracker();
        assert!(t.try_claim(id(1), StatKind::Love, "alice"));
        assert!(t.try_claim(id(1), StatKind::Favorite, "alice"));
    }

    #[test]
    fn actions_are_scoped_per_project_and_user() {
        let (t, _) = tracker();
        assert!(t.try_claim(id(1), StatKind::Love, "alice"));
        assert!(t.try_claim(id(2), StatKind::Love, "alice"));
        assert!(t.try_claim(id(1), StatKind::Love, "bob"));
    }

    #[test]
    fn view_window_rolls_over() {
        let (t, clock) = tracker();
        assert!(t.try_claim(id(1), StatKind::View, "alice"));
        assert!(!t.try_claim(id(1), StatKind::View, "alice"));
        clock.advance(Duration::hours(23));
        assert!(!t.try_claim(id(1), StatKind::View, "alice"));
        clock.advance(Duration::hours(2));
        assert!(t.try_claim(id(1), StatKind::View, "alice"));
    }

    #[test]
    fn release_reopens_the_action() {
        let (t, _) = tracker();
        assert!(t.try_claim(id(1), StatKind::Love, "alice"));
        t.release(id(1), StatKind::Love, "alice");
        assert!(t.try_claim(id(1), StatKind::Love, "alice"));
    }

    #[test]
    fn concurrent_claims_admit_exactly_one() {
        use std::thread;

        let (t, _) = tracker();
        let t = Arc::new(t);
        let successes: Vec<bool> = (0..8)
            .map(|_| {
                let t = Arc::clone(&t);
                thread::spawn(move || t.try_claim(id(1), StatKind::Love, "alice"))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .collect();
        assert_eq!(successes.iter().filter(|s| **s).count(), 1);
    }
}
