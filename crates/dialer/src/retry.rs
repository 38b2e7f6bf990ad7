//! Pure retry-policy decision (§4.7). Kept free of I/O so the
//! classification table is unit-testable without a queue or pipeline.

use vc_domain::types::{CallOutcome, JobStatus, RetryDisposition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Job is done; persist this terminal status and drop it.
    Terminal(JobStatus),
    /// Reschedule the job `delay_secs` from now with `status = RetryScheduled`.
    Retry { delay_secs: i64 },
}

/// Decide what happens to a job whose call just ended with `outcome`, given
/// it is about to become attempt number `next_attempt`.
pub fn decide(outcome: CallOutcome, next_attempt: u32, max_attempts: u32, retry_delay_secs: i64) -> RetryAction {
    match outcome.disposition() {
        RetryDisposition::Success => RetryAction::Terminal(JobStatus::Completed),
        RetryDisposition::NonRetryable => RetryAction::Terminal(JobStatus::NonRetryable),
        RetryDisposition::Retryable => {
            if next_attempt > max_attempts {
                RetryAction::Terminal(JobStatus::Failed)
            } else {
                RetryAction::Retry { delay_secs: retry_delay_secs }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_domain::types::MAX_ATTEMPTS;

    #[test]
    fn success_outcomes_are_terminal_completed() {
        assert_eq!(decide(CallOutcome::Answered, 1, MAX_ATTEMPTS, 7200), RetryAction::Terminal(JobStatus::Completed));
        assert_eq!(decide(CallOutcome::GoalAchieved, 2, MAX_ATTEMPTS, 7200), RetryAction::Terminal(JobStatus::Completed));
    }

    #[test]
    fn non_retryable_outcomes_are_terminal_non_retryable() {
        assert_eq!(decide(CallOutcome::Spam, 1, MAX_ATTEMPTS, 7200), RetryAction::Terminal(JobStatus::NonRetryable));
        assert_eq!(decide(CallOutcome::Rejected, 1, MAX_ATTEMPTS, 7200), RetryAction::Terminal(JobStatus::NonRetryable));
    }

    #[test]
    fn retry_on_busy_schedules_a_retry_below_the_attempt_cap() {
        // §8 worked example: priority 5, attempt 1, outcome busy -> retry at +7200s.
        assert_eq!(decide(CallOutcome::Busy, 2, MAX_ATTEMPTS, 7200), RetryAction::Retry { delay_secs: 7200 });
    }

    #[test]
    fn third_terminal_non_success_becomes_failed() {
        assert_eq!(decide(CallOutcome::Busy, MAX_ATTEMPTS + 1, MAX_ATTEMPTS, 7200), RetryAction::Terminal(JobStatus::Failed));
    }

    #[test]
    fn retryable_outcome_exactly_at_cap_still_retries() {
        assert_eq!(decide(CallOutcome::NoAnswer, MAX_ATTEMPTS, MAX_ATTEMPTS, 7200), RetryAction::Retry { delay_secs: 7200 });
    }
}
