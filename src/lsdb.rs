// Link-State Database: the per-router view of the network graph, plus the
// SeenSet that makes flooding terminate. Grounded on the supersession rule in
// `router.py::_process_lsa`/`_update_lsdb`.

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsdbEntry {
    pub sequence: u32,
    pub links: HashMap<String, u32>,
    pub timestamp: u64,
}

/// Outcome of offering an LSA to the LSDB, telling the caller what to do
/// next (flood it onward and recompute SPF, or nothing at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Supersession {
    /// Strictly newer than anything seen for this originator: installed.
    Accepted,
    /// Already seen this exact (originator, sequence) pair.
    DuplicateSeen,
    /// Sequence number does not exceed the installed one.
    StaleSequence,
}

#[derive(Debug, Clone, Default)]
pub struct Lsdb {
    entries: HashMap<String, LsdbEntry>,
    seen: HashSet<(String, u32)>,
}

impl Lsdb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, router_id: &str) -> Option<&LsdbEntry> {
        self.entries.get(router_id)
    }

    pub fn contains(&self, router_id: &str) -> bool {
        self.entries.contains_key(router_id)
    }

    pub fn router_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten the LSDB into the adjacency shape Dijkstra expects.
    pub fn to_graph(&self) -> HashMap<String, HashMap<String, u32>> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.links.clone()))
            .collect()
    }

    /// Unconditionally (re)writes the originator's own entry and marks it
    /// seen. Used only for a router's self-entry, which is always trusted.
    pub fn install_self(&mut self, router_id: &str, sequence: u32, links: HashMap<String, u32>) {
        self.seen.insert((router_id.to_string(), sequence));
        self.entries.insert(
            router_id.to_string(),
            LsdbEntry {
                sequence,
                links,
                timestamp: now_unix(),
            },
        );
    }

    /// Applies the supersession rule (§4.1) to an LSA received from a peer.
    pub fn offer(&mut self, originator: &str, sequence: u32, links: HashMap<String, u32>) -> Supersession {
        let key = (originator.to_string(), sequence);
        if self.seen.contains(&key) {
            return Supersession::DuplicateSeen;
        }

        let current_seq = self.entries.get(originator).map(|e| e.sequence as i64).unwrap_or(-1);
        if (sequence as i64) <= current_seq {
            return Supersession::StaleSequence;
        }

        self.seen.insert(key);
        self.entries.insert(
            originator.to_string(),
            LsdbEntry {
                sequence,
                links,
                timestamp: now_unix(),
            },
        );
        Supersession::Accepted
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn accepting_a_fresh_lsa_installs_exact_fields() {
        let mut lsdb = Lsdb::new();
        let outcome = lsdb.offer("R2", 1000, links(&[("R1", 1), ("R3", 2)]));
        assert_eq!(outcome, Supersession::Accepted);
        let entry = lsdb.get("R2").unwrap();
        assert_eq!(entry.sequence, 1000);
        assert_eq!(entry.links, links(&[("R1", 1), ("R3", 2)]));
    }

    #[test]
    fn stale_sequence_does_not_mutate_lsdb() {
        let mut lsdb = Lsdb::new();
        lsdb.offer("R2", 2000, links(&[("R1", 1)]));
        let outcome = lsdb.offer("R2", 1500, links(&[("R1", 1), ("R3", 1)]));
        assert_eq!(outcome, Supersession::StaleSequence);
        assert_eq!(lsdb.get("R2").unwrap().sequence, 2000);
        assert_eq!(lsdb.get("R2").unwrap().links, links(&[("R1", 1)]));
    }

    #[test]
    fn duplicate_exact_pair_is_rejected() {
        let mut lsdb = Lsdb::new();
        lsdb.offer("R2", 5, links(&[]));
        let outcome = lsdb.offer("R2", 5, links(&[("X", 1)]));
        assert_eq!(outcome, Supersession::DuplicateSeen);
        assert!(lsdb.get("R2").unwrap().links.is_empty());
    }

    #[test]
    fn strictly_higher_sequence_supersedes() {
        let mut lsdb = Lsdb::new();
        lsdb.offer("R2", 5, links(&[]));
        let outcome = lsdb.offer("R2", 6, links(&[("X", 1)]));
        assert_eq!(outcome, Supersession::Accepted);
        assert_eq!(lsdb.get("R2").unwrap().sequence, 6);
    }
}
