//! Buffered receive path between the transport and the simulation tick.
//!
//! Any thread may push through an [`InboxSender`]. The simulation drains everything once per
//! tick, so a tick never sees a partially delivered batch.

use crossbeam::channel::{Receiver, Sender, TrySendError, bounded};

pub const DEFAULT_INBOX_CAPACITY: usize = 1024;

pub struct Inbox<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T> Default for Inbox<T> {
    fn default() -> Self {
        Self::new(DEFAULT_INBOX_CAPACITY)
    }
}

impl<T> Inbox<T> {
    /// When full, further pushes are dropped; producers never block.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    pub fn sender(&self) -> InboxSender<T> {
        InboxSender {
            sender: self.sender.clone(),
        }
    }

    /// Take everything queued so far, in arrival order.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

pub struct InboxSender<T> {
    sender: Sender<T>,
}

impl<T> Clone for InboxSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> InboxSender<T> {
    /// Returns `false` when the message was dropped.
    pub fn push(&self, message: T) -> bool {
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("inbox full, dropping message");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_arrival_order() {
        let inbox = Inbox::new(8);
        let sender = inbox.sender();
        assert!(sender.push(1));
        assert!(sender.clone().push(2));
        assert_eq!(inbox.drain(), vec![1, 2]);
        assert!(inbox.is_empty());
    }

    #[test]
    fn full_inbox_drops_without_blocking() {
        let inbox = Inbox::new(1);
        let sender = inbox.sender();
        assert!(sender.push("a"));
        assert!(!sender.push("b"));
        assert_eq!(inbox.len(), 1);
    }

    #[test]
    fn accepts_pushes_from_other_threads() {
        let inbox = Inbox::new(64);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sender = inbox.sender();
                std::thread::spawn(move || sender.push(i))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().expect("producer thread"));
        }
        let mut received = inbox.drain();
        received.sort();
        assert_eq!(received, vec![0, 1, 2, 3]);
    }
}
