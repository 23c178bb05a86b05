use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::checker::Checker;
use super::queue::{RendezvousReceiver, RendezvousSender};
use super::types::{StatusUpdate, Target};

/// Probe `target` once and return the status text to report.
///
/// Failures never escape: the error description becomes the status and the
/// target's failure counter goes up. Success resets the counter.
pub async fn probe(checker: &dyn Checker, target: &mut Target) -> String {
    match checker.head(target.url()).await {
        Ok(status) => {
            target.record_success();
            status
        }
        Err(e) => {
            target.record_failure();
            warn!(url = %target.url(), errors = target.consecutive_errors(), "probe failed: {e}");
            e.to_string()
        }
    }
}

/// One worker of the probing pool.
pub struct Prober {
    id: usize,
    checker: Arc<dyn Checker>,
}

impl Prober {
    pub fn new(id: usize, checker: Arc<dyn Checker>) -> Self {
        Self { id, checker }
    }

    pub fn spawn(
        self,
        intake: RendezvousReceiver<Target>,
        completion: RendezvousSender<Target>,
        status: RendezvousSender<StatusUpdate>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(intake, completion, status))
    }

    /// Take targets off `intake` until it closes, reporting each result to
    /// `status` and handing the target on to `completion`.
    pub async fn run(
        self,
        intake: RendezvousReceiver<Target>,
        completion: RendezvousSender<Target>,
        status: RendezvousSender<StatusUpdate>,
    ) {
        while let Some(mut target) = intake.recv().await {
            let text = probe(self.checker.as_ref(), &mut target).await;
            debug!(prober = self.id, url = %target.url(), status = %text, "probe finished");

            if let Err(e) = status.send(StatusUpdate::new(target.url(), text)).await {
                error!(prober = self.id, "Failed to send status update: {}", e);
                return;
            }
            if let Err(e) = completion.send(target).await {
                error!(prober = self.id, "Failed to hand back target: {}", e);
                return;
            }
        }
        debug!(prober = self.id, "intake closed, prober stopping");
    }
}
