//! Where updates come from.
//!
//! The runtime pulls batches from an [`UpdateSource`]. Long polling and
//! webhook receivers implement it in the transport layer; [`ChannelSource`]
//! covers tests and bots that receive updates some other way.

use async_trait::async_trait;
use tokio::sync::mpsc;

use switchyard_core::{ApiError, Update};

/// Default number of updates [`ChannelSource`] returns per poll.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// A stream of update batches.
#[async_trait]
pub trait UpdateSource: Send {
    /// Waits for the next batch of updates.
    ///
    /// An empty batch is fine and means nothing arrived in time. Errors for
    /// which [`ApiError::is_transient`] holds are retried by the runtime
    /// after its poll interval; any other error stops it.
    async fn poll(&mut self) -> Result<Vec<Update>, ApiError>;

    /// Returns `true` once no further updates will ever be produced.
    fn is_closed(&self) -> bool {
        false
    }
}

/// An [`UpdateSource`] fed through a tokio mpsc channel.
///
/// Closes when every sender has been dropped and the buffer is drained.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<Update>,
    batch_size: usize,
    closed: bool,
}

impl ChannelSource {
    /// Creates a bounded channel and the source reading from it.
    pub fn channel(capacity: usize) -> (mpsc::Sender<Update>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }

    pub fn new(rx: mpsc::Receiver<Update>) -> Self {
        Self {
            rx,
            batch_size: DEFAULT_BATCH_SIZE,
            closed: false,
        }
    }

    /// Caps the number of updates returned by one poll.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }
}

#[async_trait]
impl UpdateSource for ChannelSource {
    async fn poll(&mut self) -> Result<Vec<Update>, ApiError> {
        if self.closed {
            return Ok(Vec::new());
        }

        let Some(first) = self.rx.recv().await else {
            self.closed = true;
            return Ok(Vec::new());
        };

        let mut batch = vec![first];
        while batch.len() < self.batch_size {
            match self.rx.try_recv() {
                Ok(update) => batch.push(update),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        Ok(batch)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::{BotStarted, User};

    fn started(chat_id: i64) -> Update {
        Update::from(BotStarted {
            chat_id,
            user: User::new(chat_id, "Ann"),
            payload: None,
            user_locale: None,
            timestamp: 0,
        })
    }

    #[tokio::test]
    async fn test_channel_source_batches_buffered_updates() {
        let (tx, mut source) = ChannelSource::channel(8);
        for id in 1..=3 {
            tx.send(started(id)).await.unwrap();
        }

        let batch = source.poll().await.unwrap();
        assert_eq!(batch.len(), 3);
        assert!(!source.is_closed());
    }

    #[tokio::test]
    async fn test_channel_source_respects_batch_size() {
        let (tx, source) = ChannelSource::channel(8);
        let mut source = source.batch_size(2);
        for id in 1..=3 {
            tx.send(started(id)).await.unwrap();
        }

        assert_eq!(source.poll().await.unwrap().len(), 2);
        assert_eq!(source.poll().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_channel_source_closes_after_senders_drop() {
        let (tx, mut source) = ChannelSource::channel(8);
        tx.send(started(1)).await.unwrap();
        drop(tx);

        assert_eq!(source.poll().await.unwrap().len(), 1);
        let last = source.poll().await.unwrap();
        assert!(last.is_empty());
        assert!(source.is_closed());
    }
}
