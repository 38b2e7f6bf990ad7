//! Call idle-timeout evaluation.
//!
//! A call is idle when no STT events have arrived for longer than the
//! configured threshold (§4.4). The pipeline calls [`is_idle`] on every tick
//! of its poll loop against the session's `last_activity` timestamp.

use chrono::{DateTime, Utc};

/// Whether `last_activity` is stale enough, as of `now`, to trigger a
/// graceful close of the call.
pub fn is_idle(last_activity: DateTime<Utc>, now: DateTime<Utc>, idle_timeout_secs: u64) -> bool {
    let elapsed = now.signed_duration_since(last_activity).num_seconds();
    elapsed >= idle_timeout_secs as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn not_idle_when_recent() {
        let last = Utc::now() - Duration::seconds(5);
        assert!(!is_idle(last, Utc::now(), 30));
    }

    #[test]
    fn idle_when_elapsed_exceeds_threshold() {
        let last = Utc::now() - Duration::seconds(45);
        assert!(is_idle(last, Utc::now(), 30));
    }

    #[test]
    fn idle_at_exact_boundary() {
        let now = Utc::now();
        let last = now - Duration::seconds(30);
        assert!(is_idle(last, now, 30));
    }
}
