//! Single owner of the endpoint status table.
//!
//! The table lives inside one task. Probers feed it [`StatusUpdate`]s over a
//! rendezvous queue; every `update_interval` the task logs a [`Snapshot`] and
//! publishes it to subscribers. Nothing else can reach the table, so it needs
//! no lock.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use super::queue::{RendezvousReceiver, RendezvousSender, rendezvous};
use super::types::{Snapshot, StatusUpdate};
use crate::error::{ConfigError, QueueError};

/// Snapshots kept for slow subscribers before they start lagging.
const SNAPSHOT_BACKLOG: usize = 16;

type SnapshotRequest = oneshot::Sender<Snapshot>;

/// Cloneable access to a running aggregator.
#[derive(Clone)]
pub struct AggregatorHandle {
    updates: RendezvousSender<StatusUpdate>,
    requests: mpsc::Sender<SnapshotRequest>,
    published: broadcast::Sender<Snapshot>,
}

impl AggregatorHandle {
    /// Sender probers use to report results.
    pub fn updates(&self) -> RendezvousSender<StatusUpdate> {
        self.updates.clone()
    }

    /// Receive every periodic snapshot from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.published.subscribe()
    }

    /// Ask for a snapshot outside the report schedule.
    pub async fn snapshot(&self) -> Result<Snapshot, QueueError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests.send(reply_tx).await.map_err(|_| QueueError::Closed)?;
        reply_rx.await.map_err(|_| QueueError::Closed)
    }
}

pub struct Aggregator {
    table: HashMap<String, String>,
    updates: RendezvousReceiver<StatusUpdate>,
    requests: mpsc::Receiver<SnapshotRequest>,
    published: broadcast::Sender<Snapshot>,
    update_interval: Duration,
}

impl Aggregator {
    /// Spawn the aggregator task, reporting every `update_interval`.
    ///
    /// Must be called from within a tokio runtime. A zero interval is
    /// rejected before anything is spawned.
    pub fn start(update_interval: Duration) -> Result<AggregatorHandle, ConfigError> {
        if update_interval.is_zero() {
            return Err(ConfigError::Invalid("status interval must be non-zero".to_string()));
        }

        let (updates_tx, updates_rx) = rendezvous();
        let (requests_tx, requests_rx) = mpsc::channel(8);
        let (published, _) = broadcast::channel(SNAPSHOT_BACKLOG);

        let aggregator = Self {
            table: HashMap::new(),
            updates: updates_rx,
            requests: requests_rx,
            published: published.clone(),
            update_interval,
        };
        tokio::spawn(aggregator.run());

        Ok(AggregatorHandle { updates: updates_tx, requests: requests_tx, published })
    }

    async fn run(self) {
        let Self { mut table, updates, mut requests, published, update_interval } = self;

        // Like a ticker: the first report comes one interval after start.
        let mut ticker = interval_at(Instant::now() + update_interval, update_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut updates_open = true;
        let mut requests_open = true;

        while updates_open || requests_open {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = Snapshot::from_table(&table);
                    log_state(&snapshot);
                    // No subscribers is fine.
                    let _ = published.send(snapshot);
                }
                update = updates.recv(), if updates_open => match update {
                    Some(update) => apply(&mut table, update),
                    None => updates_open = false,
                },
                request = requests.recv(), if requests_open => match request {
                    Some(reply) => {
                        let _ = reply.send(Snapshot::from_table(&table));
                    }
                    None => requests_open = false,
                },
            }
        }

        debug!("every aggregator handle dropped, aggregator stopping");
    }
}

/// Last write wins.
fn apply(table: &mut HashMap<String, String>, update: StatusUpdate) {
    table.insert(update.endpoint, update.status);
}

/// Log a snapshot, one line per endpoint
fn log_state(snapshot: &Snapshot) {
    for line in snapshot.lines() {
        info!("{}", line);
    }
}
