//! Poll-until-done helper for asynchronous daemon jobs.
//!
//! A probe is called once per interval and classifies the job as done,
//! pending, or stalled. Too many consecutive stalled probes end the poll as
//! timed out; any probe error ends it as failed.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::errors::ScanError;

/// What one probe observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Done,
    Pending,
    Stalled,
}

impl Progress {
    /// Classify a 0-100 percentage. Only exactly `stall_at` counts as stalled.
    pub fn from_percent(percent: u32, stall_at: Option<u32>) -> Self {
        if percent >= 100 {
            Self::Done
        } else if Some(percent) == stall_at {
            Self::Stalled
        } else {
            Self::Pending
        }
    }
}

/// How a poll loop ended.
#[derive(Debug)]
pub enum PollOutcome {
    Completed { polls: u32, elapsed: Duration },
    TimedOut { polls: u32, elapsed: Duration },
    Failed(ScanError),
}

/// Interval and stall tolerance for a poll loop.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Consecutive stalled probes tolerated; `None` waits forever.
    pub stall_limit: Option<u32>,
}

impl PollPolicy {
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            stall_limit: None,
        }
    }

    /// A limit of zero disables stall detection.
    pub fn with_stall_limit(interval: Duration, stall_limit: u32) -> Self {
        Self {
            interval,
            stall_limit: (stall_limit > 0).then_some(stall_limit),
        }
    }
}

/// Probe until done, sleeping `policy.interval` between probes.
pub async fn poll_until<F, Fut>(policy: &PollPolicy, mut probe: F) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Progress, ScanError>>,
{
    let started = Instant::now();
    let mut polls: u32 = 0;
    let mut stalled: u32 = 0;

    loop {
        polls += 1;
        match probe().await {
            Err(e) => return PollOutcome::Failed(e),
            Ok(Progress::Done) => {
                return PollOutcome::Completed {
                    polls,
                    elapsed: started.elapsed(),
                }
            }
            Ok(Progress::Stalled) => stalled += 1,
            Ok(Progress::Pending) => stalled = 0,
        }

        if let Some(limit) = policy.stall_limit {
            if stalled >= limit {
                return PollOutcome::TimedOut {
                    polls,
                    elapsed: started.elapsed(),
                };
            }
        }

        tokio::time::sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    type Script = Mutex<VecDeque<Result<Progress, ScanError>>>;

    fn scripted(steps: Vec<Result<Progress, ScanError>>) -> Script {
        Mutex::new(steps.into_iter().collect())
    }

    #[test]
    fn classifies_percentages() {
        assert_eq!(Progress::from_percent(100, Some(99)), Progress::Done);
        assert_eq!(Progress::from_percent(99, Some(99)), Progress::Stalled);
        assert_eq!(Progress::from_percent(99, None), Progress::Pending);
        assert_eq!(Progress::from_percent(42, Some(99)), Progress::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn completes_on_first_done_probe() {
        let policy = PollPolicy::unbounded(Duration::from_secs(1));
        let outcome = poll_until(&policy, || async { Ok(Progress::Done) }).await;
        match outcome {
            PollOutcome::Completed { polls, elapsed } => {
                assert_eq!(polls, 1);
                assert_eq!(elapsed, Duration::ZERO);
            }
            other => panic!("Expected completion, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_probes() {
        let steps = scripted(vec![
            Ok(Progress::Pending),
            Ok(Progress::Pending),
            Ok(Progress::Done),
        ]);
        let policy = PollPolicy::unbounded(Duration::from_secs(1));
        let outcome = poll_until(&policy, || {
            let next = steps.lock().unwrap().pop_front().unwrap();
            async move { next }
        })
        .await;
        match outcome {
            PollOutcome::Completed { polls, elapsed } => {
                assert_eq!(polls, 3);
                assert!(elapsed >= Duration::from_secs(2));
                assert!(elapsed < Duration::from_secs(3));
            }
            other => panic!("Expected completion, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_consecutive_stalls() {
        let policy = PollPolicy::with_stall_limit(Duration::from_secs(1), 5);
        let outcome = poll_until(&policy, || async { Ok(Progress::Stalled) }).await;
        assert!(matches!(outcome, PollOutcome::TimedOut { polls: 5, .. }));
    }

    #[test]
    fn zero_stall_limit_is_unbounded() {
        let policy = PollPolicy::with_stall_limit(Duration::from_secs(1), 0);
        assert!(policy.stall_limit.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pending_probe_resets_stall_count() {
        let stalls = || (0..4).map(|_| Ok(Progress::Stalled));
        let steps = scripted(
            stalls()
                .chain([Ok(Progress::Pending)])
                .chain(stalls())
                .chain([Ok(Progress::Done)])
                .collect(),
        );

        let policy = PollPolicy::with_stall_limit(Duration::from_secs(1), 5);
        let outcome = poll_until(&policy, || {
            let next = steps.lock().unwrap().pop_front().unwrap();
            async move { next }
        })
        .await;
        assert!(matches!(outcome, PollOutcome::Completed { polls: 10, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_error_fails_immediately() {
        let steps = scripted(vec![
            Ok(Progress::Pending),
            Err(ScanError::UnexpectedResponse("status missing".to_string())),
        ]);
        let policy = PollPolicy::unbounded(Duration::from_secs(1));
        let outcome = poll_until(&policy, || {
            let next = steps.lock().unwrap().pop_front().unwrap();
            async move { next }
        })
        .await;
        assert!(matches!(
            outcome,
            PollOutcome::Failed(ScanError::UnexpectedResponse(_))
        ));
    }
}
