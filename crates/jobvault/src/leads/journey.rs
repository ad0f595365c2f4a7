use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// Default window during which a hero-form touch is linked to a later
/// get-started submission.
pub const DEFAULT_JOURNEY_TTL_SECS: i64 = 24 * 60 * 60;

/// Tracks visitors who left their email on the hero banner so the follow-up
/// get-started submission can be attributed to it.
#[derive(Debug)]
pub struct JourneyTracker {
    ttl: Duration,
    touches: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Default for JourneyTracker {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_JOURNEY_TTL_SECS))
    }
}

impl JourneyTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            touches: Mutex::new(HashMap::new()),
        }
    }

    /// `at` must be the server receive time, never the browser timestamp.
    pub fn record_hero(&self, email: &str, at: DateTime<Utc>) {
        let key = journey_key(email);
        if key.is_empty() {
            return;
        }

        let mut touches = self.touches.lock().unwrap_or_else(PoisonError::into_inner);
        touches.retain(|_, touched_at| at - *touched_at <= self.ttl);
        touches.insert(key, at);
    }

    /// Consume the hero touch for `email`, if one is still fresh.
    pub fn take_hero(&self, email: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let key = journey_key(email);
        let mut touches = self.touches.lock().unwrap_or_else(PoisonError::into_inner);
        touches
            .remove(&key)
            .filter(|touched_at| now - *touched_at <= self.ttl)
    }

    pub fn len(&self) -> usize {
        self.touches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn journey_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
