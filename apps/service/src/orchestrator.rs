//! Orchestrator - wires the polling pipeline together
//!
//! Creates the queues, starts the aggregator, the prober pool and the
//! scheduler, then seeds every configured URL.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::monitoring::{
    Aggregator, AggregatorHandle, BackoffPolicy, Checker, HttpChecker, Prober, Scheduler, Target,
    rendezvous,
};

/// Main orchestrator for the polling service
pub struct Orchestrator {
    config: Config,
    checker: Arc<dyn Checker>,
}

/// Handles to a running pipeline.
pub struct Pipeline {
    pub aggregator: AggregatorHandle,
    pub probers: Vec<JoinHandle<()>>,
    pub seeding: JoinHandle<()>,
    /// The scheduler loop; it only finishes if the pipeline falls apart.
    pub driver: JoinHandle<()>,
}

impl Orchestrator {
    /// Create and run an orchestrator probing over HTTP.
    /// Only returns if the pipeline stops, which is an error.
    pub async fn start(config: Config) -> Result<()> {
        Self::new(config)?.run().await
    }

    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let checker = HttpChecker::new(config.polling.timeout())?;
        Self::with_checker(config, Arc::new(checker))
    }

    /// Use a custom check transport. The config is validated here, so a
    /// pipeline never starts with zero pollers or a zero interval.
    pub fn with_checker(config: Config, checker: Arc<dyn Checker>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, checker })
    }

    /// Spawn every task of the pipeline and return without waiting.
    pub fn launch(self) -> Result<Pipeline> {
        let polling = &self.config.polling;
        info!(
            urls = self.config.urls.len(),
            pollers = polling.pollers,
            poll_interval_secs = polling.poll_interval_seconds,
            status_interval_secs = polling.status_interval_seconds,
            backoff_secs = polling.backoff_seconds,
            "starting monitor"
        );

        let aggregator = Aggregator::start(polling.status_interval())?;

        let (intake_tx, intake_rx) = rendezvous::<Target>();
        let (done_tx, done_rx) = rendezvous::<Target>();

        let probers = (0..polling.pollers)
            .map(|id| {
                Prober::new(id, Arc::clone(&self.checker)).spawn(
                    intake_rx.clone(),
                    done_tx.clone(),
                    aggregator.updates(),
                )
            })
            .collect();

        let scheduler = Scheduler::new(
            intake_tx,
            BackoffPolicy::new(polling.poll_interval(), polling.backoff_unit()),
        );
        let seeding = scheduler.seed(self.config.urls.iter().map(Target::new).collect());
        let driver = tokio::spawn(scheduler.run(done_rx));

        Ok(Pipeline { aggregator, probers, seeding, driver })
    }

    /// Launch the pipeline and wait on the scheduler loop.
    pub async fn run(self) -> Result<()> {
        let pipeline = self.launch()?;
        pipeline.driver.await?;
        Err(anyhow!("scheduler stopped unexpectedly"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, ProbeError};

    struct AlwaysUp;

    #[async_trait::async_trait]
    impl Checker for AlwaysUp {
        async fn head(&self, _target: &str) -> Result<String, ProbeError> {
            Ok("200 OK".to_string())
        }
    }

    fn rejected(config: Config) -> bool {
        match Orchestrator::with_checker(config, Arc::new(AlwaysUp)) {
            Ok(_) => false,
            Err(e) => matches!(e.downcast_ref::<ConfigError>(), Some(ConfigError::Invalid(_))),
        }
    }

    #[test]
    fn zero_status_interval_is_rejected() {
        let mut config = Config::default();
        config.polling.status_interval_seconds = 0;
        assert!(rejected(config));
    }

    #[test]
    fn zero_pollers_is_rejected() {
        let mut config = Config::default();
        config.polling.pollers = 0;
        assert!(rejected(config));
    }

    #[test]
    fn http_orchestrator_validates_before_building_client() {
        let mut config = Config::default();
        config.urls.clear();
        let err = Orchestrator::new(config).err().expect("empty URL list accepted");
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Invalid(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn valid_config_launches_and_reports() {
        let orchestrator = Orchestrator::with_checker(Config::default(), Arc::new(AlwaysUp)).unwrap();
        let pipeline = orchestrator.launch().unwrap();
        let mut reports = pipeline.aggregator.subscribe();

        let snapshot = reports.recv().await.unwrap();
        assert_eq!(snapshot.len(), Config::default().urls.len());
        assert!(!pipeline.driver.is_finished());
    }
}
