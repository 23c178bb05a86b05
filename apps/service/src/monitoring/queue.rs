//! Rendezvous hand-off queues.
//!
//! A send completes only after some receiver has taken the value, so the
//! queue never buffers work ahead of the consumers. Receivers can be cloned;
//! every value goes to exactly one of them, whichever asked first.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};

use crate::error::QueueError;

type Slot<T> = (T, oneshot::Sender<()>);

/// Create a connected sender/receiver pair.
pub fn rendezvous<T>() -> (RendezvousSender<T>, RendezvousReceiver<T>) {
    // One slot is the smallest tokio allows; the ack turns it into a hand-off.
    let (tx, rx) = mpsc::channel(1);
    (RendezvousSender { tx }, RendezvousReceiver { rx: Arc::new(Mutex::new(rx)) })
}

pub struct RendezvousSender<T> {
    tx: mpsc::Sender<Slot<T>>,
}

impl<T> Clone for RendezvousSender<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<T> RendezvousSender<T> {
    /// Hand `value` to a receiver, waiting until one has taken it.
    pub async fn send(&self, value: T) -> Result<(), QueueError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx.send((value, ack_tx)).await.map_err(|_| QueueError::Closed)?;
        ack_rx.await.map_err(|_| QueueError::Closed)
    }
}

pub struct RendezvousReceiver<T> {
    rx: Arc<Mutex<mpsc::Receiver<Slot<T>>>>,
}

impl<T> Clone for RendezvousReceiver<T> {
    fn clone(&self) -> Self {
        Self { rx: Arc::clone(&self.rx) }
    }
}

impl<T> RendezvousReceiver<T> {
    /// Wait for the next value. `None` once every sender is gone.
    ///
    /// Cancel safe: a value is either fully taken and acknowledged, or left
    /// in the queue for another receiver.
    pub async fn recv(&self) -> Option<T> {
        let mut rx = self.rx.lock().await;
        let (value, ack) = rx.recv().await?;
        drop(rx);
        // The sender may have given up waiting; the value is still ours.
        let _ = ack.send(());
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn send_waits_for_a_receiver() {
        let (tx, rx) = rendezvous::<u32>();

        let sender = tokio::spawn(async move { tx.send(7).await });
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!sender.is_finished(), "send completed with nobody receiving");

        assert_eq!(rx.recv().await, Some(7));
        assert_eq!(sender.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn recv_returns_none_when_senders_dropped() {
        let (tx, rx) = rendezvous::<u32>();
        drop(tx);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn send_fails_when_receivers_dropped() {
        let (tx, rx) = rendezvous::<u32>();
        drop(rx);
        assert_eq!(tx.send(1).await, Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn every_value_reaches_exactly_one_receiver() {
        let (tx, rx) = rendezvous::<u32>();

        let mut workers = Vec::new();
        for _ in 0..3 {
            let rx = rx.clone();
            workers.push(tokio::spawn(async move {
                let mut got = Vec::new();
                while let Some(v) = rx.recv().await {
                    got.push(v);
                }
                got
            }));
        }
        drop(rx);

        for v in 0..100 {
            tx.send(v).await.unwrap();
        }
        drop(tx);

        let mut all = Vec::new();
        for worker in workers {
            all.extend(worker.await.unwrap());
        }
        assert_eq!(all.len(), 100);
        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(unique.len(), 100);
    }
}
