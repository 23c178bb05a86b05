/// Polling engine
///
/// Targets circulate through the pipeline below, one owner at a time:
///
/// ```text
/// Scheduler --intake--> Prober xN --completion--> Scheduler --(delay)--> intake
///                          |
///                          +--StatusUpdate--> Aggregator --(tick)--> log / subscribers
/// ```
pub mod aggregator;
pub mod checker;
pub mod prober;
pub mod queue;
pub mod scheduler;
pub mod types;

pub use aggregator::{Aggregator, AggregatorHandle};
pub use checker::{Checker, HttpChecker};
pub use prober::{Prober, probe};
pub use queue::{RendezvousReceiver, RendezvousSender, rendezvous};
pub use scheduler::{BackoffPolicy, Scheduler};
pub use types::{Snapshot, StatusUpdate, Target};
