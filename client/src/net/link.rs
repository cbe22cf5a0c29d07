//! One direction of a simulated network link.
//!
//! Messages are held for a configurable latency and then pushed into the receiver's inbox.
//! Every second message is delayed by an extra `jitter`, which overtakes its predecessor when the
//! jitter exceeds the send interval. `duplicate_every` re-sends every n-th message.

use movesync_shared::inbox::InboxSender;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkConditions {
    pub latency: Duration,
    pub jitter: Duration,
    /// 0 never duplicates.
    pub duplicate_every: u32,
}

impl Default for LinkConditions {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(80),
            jitter: Duration::ZERO,
            duplicate_every: 0,
        }
    }
}

impl LinkConditions {
    /// Whether messages may arrive out of order or more than once.
    ///
    /// Delta-suppressed messages are only safe on in-order links, so senders fall back to full
    /// messages when this is true.
    pub fn reorders(&self) -> bool {
        !self.jitter.is_zero() || self.duplicate_every > 0
    }
}

pub struct SimulatedLink {
    conditions: LinkConditions,
    in_flight: Vec<(Duration, Vec<u8>)>,
    sent: u32,
    out: InboxSender<Vec<u8>>,
}

impl SimulatedLink {
    pub fn new(conditions: LinkConditions, out: InboxSender<Vec<u8>>) -> Self {
        Self {
            conditions,
            in_flight: Vec::new(),
            sent: 0,
            out,
        }
    }

    pub fn conditions(&self) -> &LinkConditions {
        &self.conditions
    }

    pub fn send(&mut self, now: Duration, bytes: Vec<u8>) {
        let mut due = now + self.conditions.latency;
        if self.sent % 2 == 1 {
            due += self.conditions.jitter;
        }
        self.sent = self.sent.wrapping_add(1);

        let every = self.conditions.duplicate_every;
        if every > 0 && self.sent % every == 0 {
            self.in_flight.push((due, bytes.clone()));
        }
        self.in_flight.push((due, bytes));
    }

    /// Deliver everything due at `now`, earliest first. Returns the number delivered.
    pub fn pump(&mut self, now: Duration) -> usize {
        // Stable, so equal due times keep send order.
        self.in_flight.sort_by_key(|(due, _)| *due);
        let ready = self.in_flight.partition_point(|(due, _)| *due <= now);

        let mut delivered = 0;
        for (_, bytes) in self.in_flight.drain(..ready) {
            if self.out.push(bytes) {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use movesync_shared::inbox::Inbox;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn holds_messages_for_the_latency() {
        let inbox = Inbox::new(8);
        let mut link = SimulatedLink::new(
            LinkConditions {
                latency: ms(100),
                ..Default::default()
            },
            inbox.sender(),
        );

        link.send(ms(0), vec![1]);
        assert_eq!(link.pump(ms(99)), 0);
        assert_eq!(link.pump(ms(100)), 1);
        assert_eq!(inbox.drain(), vec![vec![1]]);
        assert_eq!(link.in_flight(), 0);
    }

    #[test]
    fn jitter_reorders_and_duplicates_repeat() {
        let inbox = Inbox::new(8);
        let conditions = LinkConditions {
            latency: ms(10),
            jitter: ms(100),
            duplicate_every: 2,
        };
        assert!(conditions.reorders());
        let mut link = SimulatedLink::new(conditions, inbox.sender());

        link.send(ms(0), vec![1]);
        link.send(ms(0), vec![2]);
        link.send(ms(50), vec![3]);
        link.pump(ms(200));

        // 2 is jittered behind 3, and sent twice.
        assert_eq!(inbox.drain(), vec![vec![1], vec![3], vec![2], vec![2]]);
    }
}
