use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::queue::{RendezvousReceiver, RendezvousSender};
use super::types::Target;

/// Delay before a target is polled again.
///
/// Grows linearly with the number of consecutive failures and has no upper
/// bound: a target that keeps failing is polled less and less often, never
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    unit: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, unit: Duration) -> Self {
        Self { base, unit }
    }

    /// `base + unit * consecutive_errors`
    pub fn delay_for(&self, consecutive_errors: u32) -> Duration {
        self.base.saturating_add(self.unit.saturating_mul(consecutive_errors))
    }
}

/// Seeds the intake queue and re-admits completed targets after their backoff.
pub struct Scheduler {
    intake: RendezvousSender<Target>,
    backoff: BackoffPolicy,
}

impl Scheduler {
    pub fn new(intake: RendezvousSender<Target>, backoff: BackoffPolicy) -> Self {
        Self { intake, backoff }
    }

    /// Push every target onto the intake queue from a task of its own.
    ///
    /// Intake is a rendezvous, so each send waits for a free prober; seeding
    /// inline would stall whoever called this.
    pub fn seed(&self, targets: Vec<Target>) -> JoinHandle<()> {
        let intake = self.intake.clone();
        tokio::spawn(async move {
            let count = targets.len();
            for target in targets {
                let url = target.url().to_owned();
                if let Err(e) = intake.send(target).await {
                    error!(%url, "Failed to seed target: {}", e);
                    return;
                }
            }
            debug!(count, "all targets seeded");
        })
    }

    /// Drive the loop: every target leaving `completion` gets its own delay
    /// task, so one slow or failing endpoint never holds up the others.
    pub async fn run(self, completion: RendezvousReceiver<Target>) {
        while let Some(target) = completion.recv().await {
            self.requeue(target);
        }
        warn!("completion queue closed, scheduler stopping");
    }

    fn requeue(&self, target: Target) -> JoinHandle<()> {
        let delay = self.backoff.delay_for(target.consecutive_errors());
        debug!(
            url = %target.url(),
            errors = target.consecutive_errors(),
            delay_secs = delay.as_secs_f64(),
            "target resting before next poll"
        );

        let intake = self.intake.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let url = target.url().to_owned();
            if let Err(e) = intake.send(target).await {
                error!(%url, "Failed to requeue target: {}", e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::queue::rendezvous;
    use tokio::time::Instant;

    fn policy() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_secs(60), Duration::from_secs(10))
    }

    fn failed(url: &str, times: u32) -> Target {
        let mut target = Target::new(url);
        for _ in 0..times {
            target.record_failure();
        }
        target
    }

    #[test]
    fn healthy_targets_wait_the_base_interval() {
        assert_eq!(policy().delay_for(0), Duration::from_secs(60));
    }

    #[test]
    fn each_failure_adds_one_unit() {
        let policy = policy();
        assert_eq!(policy.delay_for(1), Duration::from_secs(70));
        assert_eq!(policy.delay_for(5), Duration::from_secs(110));

        for errors in 0..100 {
            assert!(policy.delay_for(errors + 1) > policy.delay_for(errors));
        }
    }

    #[test]
    fn backoff_has_no_ceiling() {
        let policy = policy();
        assert_eq!(policy.delay_for(10_000), Duration::from_secs(60 + 100_000));
        // Saturates instead of overflowing.
        let huge = BackoffPolicy::new(Duration::MAX, Duration::from_secs(1));
        assert_eq!(huge.delay_for(u32::MAX), Duration::MAX);
    }

    #[tokio::test]
    async fn seed_pushes_targets_in_order() {
        let (intake_tx, intake_rx) = rendezvous();
        let scheduler = Scheduler::new(intake_tx, policy());

        let seeding = scheduler.seed(vec![
            Target::new("http://a.example"),
            Target::new("http://b.example"),
            Target::new("http://c.example"),
        ]);

        for expected in ["http://a.example", "http://b.example", "http://c.example"] {
            assert_eq!(intake_rx.recv().await.unwrap().url(), expected);
        }
        seeding.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn completed_target_returns_after_backoff() {
        let (intake_tx, intake_rx) = rendezvous();
        let (done_tx, done_rx) = rendezvous();
        tokio::spawn(Scheduler::new(intake_tx, policy()).run(done_rx));

        let start = Instant::now();
        done_tx.send(failed("http://c.example", 1)).await.unwrap();

        let target = intake_rx.recv().await.unwrap();
        assert_eq!(target.url(), "http://c.example");
        assert_eq!(start.elapsed(), Duration::from_secs(70));
    }

    #[tokio::test(start_paused = true)]
    async fn delays_run_concurrently() {
        let (intake_tx, intake_rx) = rendezvous();
        let (done_tx, done_rx) = rendezvous();
        tokio::spawn(Scheduler::new(intake_tx, policy()).run(done_rx));

        let start = Instant::now();
        done_tx.send(failed("http://slow.example", 3)).await.unwrap();
        done_tx.send(Target::new("http://fast.example")).await.unwrap();

        let first = intake_rx.recv().await.unwrap();
        assert_eq!(first.url(), "http://fast.example");
        assert_eq!(start.elapsed(), Duration::from_secs(60));

        let second = intake_rx.recv().await.unwrap();
        assert_eq!(second.url(), "http://slow.example");
        assert_eq!(start.elapsed(), Duration::from_secs(90));
    }
}
