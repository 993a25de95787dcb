use std::future::Future;
use std::num::NonZeroUsize;
use tokio::sync::mpsc;

use crate::abstractions::{Message, ProcessId};
use crate::error::LinkError;

pub trait LinkSender<I, T: 'static + Send> {
    /// Enqueues `t` on the channel towards `to`, waiting while it is full.
    fn send(&self, to: I, t: T) -> impl Future<Output = Result<(), LinkError>> + Send;
}

pub trait LinkReceiver<I, T>
where
    I: 'static + Send,
    T: 'static + Send,
{
    /// Dequeues the next value sent by `from`, waiting while the channel is empty.
    // https://stackoverflow.com/questions/78134843/future-cannot-be-sent-between-threads-safely-error
    fn recv(&mut self, from: I) -> impl Future<Output = Result<T, LinkError>> + Send;
}

/// One bounded FIFO channel per ordered (sender, receiver) pair.
///
/// `into_links` splits the matrix into the outbound row and inbound column of
/// every process, in process id order.
pub struct ChannelMatrix {
    outbound: Vec<Vec<mpsc::Sender<Message>>>,
    inbound: Vec<Vec<mpsc::Receiver<Message>>>,
}

impl ChannelMatrix {
    pub fn new(process_count: usize, capacity: NonZeroUsize) -> Self {
        let mut outbound: Vec<Vec<_>> = (0..process_count)
            .map(|_| Vec::with_capacity(process_count))
            .collect();
        let mut inbound: Vec<Vec<_>> = (0..process_count)
            .map(|_| Vec::with_capacity(process_count))
            .collect();

        for from in 0..process_count {
            for to in 0..process_count {
                let (sender, receiver) = mpsc::channel(capacity.get());
                outbound[from].push(sender);
                inbound[to].push(receiver);
            }
        }

        Self { outbound, inbound }
    }

    pub fn process_count(&self) -> usize {
        self.outbound.len()
    }

    pub fn into_links(self) -> Vec<(LocalProcessSender, LocalProcessReceiver)> {
        self.outbound
            .into_iter()
            .zip(self.inbound)
            .enumerate()
            .map(|(id, (senders, receivers))| {
                (
                    LocalProcessSender { id, senders },
                    LocalProcessReceiver { id, receivers },
                )
            })
            .collect()
    }
}

/// Outbound channels of one process, indexed by destination id.
pub struct LocalProcessSender {
    id: ProcessId,
    senders: Vec<mpsc::Sender<Message>>,
}

impl LinkSender<ProcessId, Message> for LocalProcessSender {
    async fn send(&self, to: ProcessId, message: Message) -> Result<(), LinkError> {
        let from = self.id;
        let sender = self.senders.get(to).ok_or(LinkError::Missing { from, to })?;
        sender
            .send(message)
            .await
            .map_err(|_| LinkError::Closed { from, to })
    }
}

/// Inbound channels of one process, indexed by source id.
pub struct LocalProcessReceiver {
    id: ProcessId,
    receivers: Vec<mpsc::Receiver<Message>>,
}

impl LinkReceiver<ProcessId, Message> for LocalProcessReceiver {
    async fn recv(&mut self, from: ProcessId) -> Result<Message, LinkError> {
        let to = self.id;
        let receiver = self
            .receivers
            .get_mut(from)
            .ok_or(LinkError::Missing { from, to })?;
        receiver.recv().await.ok_or(LinkError::Closed { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[tokio::test]
    async fn delivers_per_pair_in_fifo_order() {
        let mut links = ChannelMatrix::new(2, capacity(4)).into_links();
        let (_, mut receiver_1) = links.pop().unwrap();
        let (sender_0, _receiver_0) = links.pop().unwrap();

        for timestamp in 1..=3 {
            sender_0.send(1, Message { timestamp }).await.unwrap();
        }
        for timestamp in 1..=3 {
            assert_eq!(receiver_1.recv(0).await.unwrap(), Message { timestamp });
        }
    }

    #[tokio::test]
    async fn pairs_do_not_share_queues() {
        let mut links = ChannelMatrix::new(3, capacity(2)).into_links();
        let (sender_2, _r2) = links.pop().unwrap();
        let (_s1, mut receiver_1) = links.pop().unwrap();
        let (sender_0, _r0) = links.pop().unwrap();

        sender_2.send(1, Message { timestamp: 20 }).await.unwrap();
        sender_0.send(1, Message { timestamp: 10 }).await.unwrap();

        assert_eq!(receiver_1.recv(0).await.unwrap().timestamp, 10);
        assert_eq!(receiver_1.recv(2).await.unwrap().timestamp, 20);
    }

    #[tokio::test]
    async fn send_waits_while_channel_is_full() {
        let mut links = ChannelMatrix::new(2, capacity(1)).into_links();
        let (_s1, mut receiver_1) = links.pop().unwrap();
        let (sender_0, _r0) = links.pop().unwrap();

        sender_0.send(1, Message { timestamp: 1 }).await.unwrap();
        let blocked =
            tokio::time::timeout(Duration::from_millis(20), sender_0.send(1, Message { timestamp: 2 }))
                .await;
        assert!(blocked.is_err());

        assert_eq!(receiver_1.recv(0).await.unwrap().timestamp, 1);
        sender_0.send(1, Message { timestamp: 3 }).await.unwrap();
        assert_eq!(receiver_1.recv(0).await.unwrap().timestamp, 3);
    }

    #[tokio::test]
    async fn unknown_peer_is_reported() {
        let mut links = ChannelMatrix::new(1, capacity(1)).into_links();
        let (sender, mut receiver) = links.pop().unwrap();

        assert_eq!(
            sender.send(3, Message { timestamp: 1 }).await,
            Err(LinkError::Missing { from: 0, to: 3 })
        );
        assert_eq!(
            receiver.recv(5).await,
            Err(LinkError::Missing { from: 5, to: 0 })
        );
    }

    #[tokio::test]
    async fn dropped_receiver_closes_the_channel() {
        let mut links = ChannelMatrix::new(2, capacity(1)).into_links();
        let (_s1, receiver_1) = links.pop().unwrap();
        let (sender_0, _r0) = links.pop().unwrap();
        drop(receiver_1);

        assert_eq!(
            sender_0.send(1, Message { timestamp: 1 }).await,
            Err(LinkError::Closed { from: 0, to: 1 })
        );
    }
}
