// Reliable-delivery bookkeeping for the router side: one entry per in-flight
// `data` packet, scanned by the sender loop for timeouts. New relative to the
// teacher (the Python original never retransmits); the timeout-scan-and-act
// shape is styled on `src/neighbor.rs::check_neighbor_timeouts`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::packet::Packet;

pub const RETRANSMIT_AFTER: Duration = Duration::from_secs(2);
pub const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct PendingAck {
    pub packet: Packet,
    pub dest: SocketAddr,
    pub last_sent_at: Instant,
    pub retries: u32,
}

/// What the sender loop should do with a pending entry it just examined.
#[derive(Debug)]
pub enum TimeoutAction {
    Resend { packet: Packet, dest: SocketAddr },
    Abandon,
}

#[derive(Debug, Default)]
pub struct PendingAcks {
    entries: HashMap<u32, PendingAck>,
}

impl PendingAcks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, sequence: u32) -> bool {
        self.entries.contains_key(&sequence)
    }

    /// Records a freshly transmitted `data` packet awaiting its ACK.
    pub fn track(&mut self, sequence: u32, packet: Packet, dest: SocketAddr, now: Instant) {
        self.entries.insert(
            sequence,
            PendingAck {
                packet,
                dest,
                last_sent_at: now,
                retries: 0,
            },
        );
    }

    /// An ACK arrived for `sequence`; remove the pending entry if present.
    /// Returns whether there was one to remove (an unmatched ACK is not an
    /// error, just logged by the caller).
    pub fn acknowledge(&mut self, sequence: u32) -> bool {
        self.entries.remove(&sequence).is_some()
    }

    /// Scans all entries older than `RETRANSMIT_AFTER` and decides, for each,
    /// whether to resend (bumping `retries` and `last_sent_at`) or abandon it
    /// (removed from the table). Entries not yet due are left untouched.
    pub fn poll_timeouts(&mut self, now: Instant) -> Vec<TimeoutAction> {
        let mut actions = Vec::new();
        let due: Vec<u32> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_sent_at) >= RETRANSMIT_AFTER)
            .map(|(seq, _)| *seq)
            .collect();

        for seq in due {
            let entry = self.entries.get_mut(&seq).expect("key just observed present");
            if entry.retries < MAX_RETRIES {
                entry.retries += 1;
                entry.last_sent_at = now;
                actions.push(TimeoutAction::Resend {
                    packet: entry.packet.clone(),
                    dest: entry.dest,
                });
            } else {
                self.entries.remove(&seq);
                actions.push(TimeoutAction::Abandon);
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;

    fn addr() -> SocketAddr {
        "127.0.0.1:5000".parse().unwrap()
    }

    #[test]
    fn ack_removes_pending_entry() {
        let mut pending = PendingAcks::new();
        pending.track(1, Packet::data("A", "B", 1, 10, "hi"), addr(), Instant::now());
        assert!(pending.acknowledge(1));
        assert!(pending.is_empty());
    }

    #[test]
    fn unmatched_ack_is_a_no_op() {
        let mut pending = PendingAcks::new();
        assert!(!pending.acknowledge(99));
    }

    #[test]
    fn fresh_entry_is_not_due_for_retransmit() {
        let mut pending = PendingAcks::new();
        let now = Instant::now();
        pending.track(1, Packet::data("A", "B", 1, 10, "hi"), addr(), now);
        let actions = pending.poll_timeouts(now);
        assert!(actions.is_empty());
    }

    #[test]
    fn stale_entry_is_resent_up_to_the_retry_ceiling_then_abandoned() {
        let mut pending = PendingAcks::new();
        let t0 = Instant::now();
        pending.track(1, Packet::data("A", "B", 1, 10, "hi"), addr(), t0);

        for expected_retry in 1..=MAX_RETRIES {
            let due_at = t0 + RETRANSMIT_AFTER * expected_retry;
            let actions = pending.poll_timeouts(due_at);
            assert_eq!(actions.len(), 1);
            assert!(matches!(actions[0], TimeoutAction::Resend { .. }));
            assert_eq!(pending.entries.get(&1).unwrap().retries, expected_retry);
        }

        let final_due = t0 + RETRANSMIT_AFTER * (MAX_RETRIES + 1);
        let actions = pending.poll_timeouts(final_due);
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], TimeoutAction::Abandon));
        assert!(pending.is_empty());
    }
}
