// The Router node: origin and relay of LSAs, forwarder of data packets,
// reliable sender of anything it puts on the wire. Grounded end to end on
// `router.py` (constructor, `_initialize_routing_structures`,
// `_generate_lsa_packets`, `_process_incoming_packets`, `_process_lsa`,
// `_run_dijkstra`) with the thread-per-activity shape translated onto
// `tokio::spawn`, the way `src/tasks.rs`/`src/init.rs` spawn the teacher's
// HELLO/LSA/neighbor-timeout tasks around a shared `AppState`.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::config::RouterConfig;
use crate::dijkstra::{self, Graph};
use crate::error::Result;
use crate::lsdb::{Lsdb, Supersession};
use crate::net_utils;
use crate::neighbor_table::NeighborTable;
use crate::packet::Packet;
use crate::pending_acks::{PendingAcks, TimeoutAction};
use crate::routing_table::RoutingTable;

/// Interval between successive LSA originations, per §4.1.
const LSA_INTERVAL: Duration = Duration::from_secs(30);
/// How often the sender loop wakes to drain the outgoing queue and scan for
/// retransmit timeouts.
const SENDER_TICK: Duration = Duration::from_millis(100);
/// How long the receiver blocks on a single `recv_from` before re-checking
/// whether it should keep running.
const RECEIVER_POLL: Duration = Duration::from_secs(1);

struct RouterInner {
    lsdb: Lsdb,
    routing_table: RoutingTable,
    outgoing: VecDeque<(Packet, SocketAddr)>,
    pending_acks: PendingAcks,
    sequence: u32,
    /// (source, content) pairs handed to the local sink because the packet's
    /// destination was this router's own id.
    received: Vec<(String, String)>,
}

struct RouterState {
    router_id: String,
    neighbors: NeighborTable,
    inner: AsyncMutex<RouterInner>,
}

impl RouterState {
    fn link_costs(&self) -> HashMap<String, u32> {
        self.neighbors.iter().map(|(id, _)| (id.to_string(), 1)).collect()
    }

    /// Recomputes shortest paths from this router's own adjacency (its live
    /// neighbor set, not whatever its last-originated LSA said — the two
    /// normally agree, but the neighbor table is the ground truth) plus
    /// whatever the LSDB knows about everyone else.
    async fn run_spf(&self) {
        let mut inner = self.inner.lock().await;
        let graph: Graph = {
            let mut g = inner.lsdb.to_graph();
            g.insert(self.router_id.clone(), self.link_costs());
            g
        };
        match dijkstra::shortest_paths(&graph, &self.router_id) {
            Ok(paths) => inner.routing_table.merge_shortest_paths(&self.router_id, &paths, &self.neighbors),
            Err(e) => log::error!("[Router {}] failed to recompute shortest paths: {e}", self.router_id),
        }
    }

    async fn handle_lsa(&self, from: SocketAddr, sequence: u32, source: String, links: HashMap<String, u32>) {
        if source == self.router_id {
            return;
        }
        let except = self
            .neighbors
            .iter()
            .find(|(_, ep)| ep.socket_addr() == from)
            .map(|(id, _)| id.to_string());

        let outcome = {
            let mut inner = self.inner.lock().await;
            let outcome = inner.lsdb.offer(&source, sequence, links.clone());
            if outcome == Supersession::Accepted {
                for (nid, ep) in self.neighbors.iter() {
                    if Some(nid) == except.as_deref() {
                        continue;
                    }
                    inner
                        .outgoing
                        .push_back((Packet::lsa(source.clone(), sequence, links.clone()), ep.socket_addr()));
                }
            }
            outcome
        };

        match outcome {
            Supersession::Accepted => {
                log::debug!("[Router {}] accepted LSA from {source} seq={sequence}", self.router_id);
                self.run_spf().await;
            }
            Supersession::DuplicateSeen => {
                log::trace!("[Router {}] dropped duplicate LSA from {source} seq={sequence}", self.router_id);
            }
            Supersession::StaleSequence => {
                log::trace!("[Router {}] dropped stale LSA from {source} seq={sequence}", self.router_id);
            }
        }
    }

    async fn handle_data(&self, source: String, destination: String, sequence: u32, ttl: u8, content: String) {
        let ttl = ttl.saturating_sub(1);
        if ttl == 0 {
            log::warn!("[Router {}] dropped data packet seq={sequence} from {source}: TTL expired", self.router_id);
            return;
        }

        let mut inner = self.inner.lock().await;

        if let Some(ep) = self.neighbors.get(&source) {
            let ack = Packet::ack(self.router_id.clone(), source.clone(), sequence, net_utils::now_unix());
            inner.outgoing.push_back((ack, ep.socket_addr()));
        } else {
            log::debug!(
                "[Router {}] source {source} is not a direct neighbor; no ACK sent for seq={sequence}",
                self.router_id
            );
        }

        if destination == self.router_id {
            log::info!("[Router {}] delivered data packet seq={sequence} from {source}: {content}", self.router_id);
            inner.received.push((source, content));
            return;
        }

        let next_hop = inner
            .routing_table
            .get(&destination)
            .map(|route| route.next_hop.clone())
            .filter(|nh| self.neighbors.contains(nh))
            .or_else(|| self.neighbors.default_gateway().map(|(id, _)| id.to_string()));

        match next_hop {
            Some(nh) => {
                let ep = self
                    .neighbors
                    .get(&nh)
                    .expect("next_hop was resolved from this router's own neighbor table");
                log::debug!(
                    "[Router {}] forwarding data packet seq={sequence} to {destination} via {nh}",
                    self.router_id
                );
                inner
                    .outgoing
                    .push_back((Packet::data(source, destination.clone(), sequence, ttl, content), ep.socket_addr()));
            }
            None => {
                log::warn!(
                    "[Router {}] no route and no default gateway for {destination}; dropping seq={sequence}",
                    self.router_id
                );
            }
        }
    }

    async fn handle_ack(&self, sequence: u32) {
        let mut inner = self.inner.lock().await;
        if inner.pending_acks.acknowledge(sequence) {
            log::debug!("[Router {}] cleared pending entry for seq={sequence}", self.router_id);
        } else {
            log::trace!("[Router {}] ACK for seq={sequence} matched nothing in flight", self.router_id);
        }
    }
}

/// A simulated router: one UDP socket, three concurrent activities (receiver,
/// sender, LSA generator) sharing state behind a `tokio::sync::Mutex`.
pub struct Router {
    state: Arc<RouterState>,
    socket: Arc<UdpSocket>,
    running: Arc<AtomicBool>,
    handles: AsyncMutex<Vec<JoinHandle<()>>>,
}

impl Router {
    /// Binds the router's socket and seeds its routing table with direct
    /// neighbor entries. The LSDB stays empty until `start` spawns the LSA
    /// generator, which originates the first self-LSA immediately.
    pub async fn new(config: RouterConfig) -> Result<Self> {
        let neighbors = config.neighbor_table();
        let socket = net_utils::bind_socket(config.listen_port).await?;

        let mut routing_table = RoutingTable::new();
        routing_table.install_direct_neighbors(&neighbors);

        let inner = RouterInner {
            lsdb: Lsdb::new(),
            routing_table,
            outgoing: VecDeque::new(),
            pending_acks: PendingAcks::new(),
            sequence: 0,
            received: Vec::new(),
        };

        let state = Arc::new(RouterState {
            router_id: config.router_id,
            neighbors,
            inner: AsyncMutex::new(inner),
        });

        Ok(Self {
            state,
            socket,
            running: Arc::new(AtomicBool::new(false)),
            handles: AsyncMutex::new(Vec::new()),
        })
    }

    pub fn router_id(&self) -> &str {
        &self.state.router_id
    }

    /// Spawns the receiver, sender and LSA-generator tasks. Calling this
    /// twice without an intervening `stop` is a logic error the caller is
    /// expected to avoid; it simply spawns a second set of tasks.
    pub fn start(self: &Arc<Self>) {
        self.running.store(true, Ordering::Relaxed);

        let receiver = {
            let socket = Arc::clone(&self.socket);
            let state = Arc::clone(&self.state);
            let running = Arc::clone(&self.running);
            tokio::spawn(receiver_loop(socket, state, running))
        };
        let sender = {
            let socket = Arc::clone(&self.socket);
            let state = Arc::clone(&self.state);
            let running = Arc::clone(&self.running);
            tokio::spawn(sender_loop(socket, state, running))
        };
        let lsa_generator = {
            let state = Arc::clone(&self.state);
            let running = Arc::clone(&self.running);
            tokio::spawn(lsa_generator_loop(state, running))
        };

        let router_id = self.router_id().to_string();
        let mut guard = match self.handles.try_lock() {
            Ok(g) => g,
            Err(_) => {
                log::warn!("[Router {router_id}] start() called while already starting");
                return;
            }
        };
        guard.push(receiver);
        guard.push(sender);
        guard.push(lsa_generator);
    }

    /// Signals the three tasks to stop and waits (briefly) for them to exit.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        let mut handles = self.handles.lock().await;
        for handle in handles.drain(..) {
            if tokio::time::timeout(Duration::from_secs(2), handle).await.is_err() {
                log::warn!("[Router {}] a task did not stop within its grace period", self.router_id());
            }
        }
    }

    pub async fn routing_table(&self) -> RoutingTable {
        self.state.inner.lock().await.routing_table.clone()
    }

    pub async fn lsdb(&self) -> Lsdb {
        self.state.inner.lock().await.lsdb.clone()
    }

    pub async fn received_messages(&self) -> Vec<(String, String)> {
        self.state.inner.lock().await.received.clone()
    }
}

async fn receiver_loop(socket: Arc<UdpSocket>, state: Arc<RouterState>, running: Arc<AtomicBool>) {
    let mut buf = [0u8; crate::packet::MAX_PACKET_BYTES];
    while running.load(Ordering::Relaxed) {
        let received = tokio::time::timeout(RECEIVER_POLL, socket.recv_from(&mut buf)).await;
        let (len, from) = match received {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                log::error!("[Router {}] recv_from failed: {e}", state.router_id);
                continue;
            }
            Err(_) => continue,
        };

        let packet = match Packet::decode(&buf[..len]) {
            Ok(packet) => packet,
            Err(e) => {
                log::warn!("[Router {}] dropping malformed packet from {from}: {e}", state.router_id);
                continue;
            }
        };
        net_utils::log_received(&format!("[Router {}]", state.router_id), from, &packet);

        match packet {
            Packet::Lsa { sequence, source, payload, .. } => {
                state.handle_lsa(from, sequence, source, payload.links).await;
            }
            Packet::Data { sequence, source, destination, ttl, payload } => {
                state.handle_data(source, destination, sequence, ttl, payload.content).await;
            }
            Packet::Ack { sequence, .. } => {
                state.handle_ack(sequence).await;
            }
        }
    }
}

async fn sender_loop(socket: Arc<UdpSocket>, state: Arc<RouterState>, running: Arc<AtomicBool>) {
    let log_prefix = format!("[Router {}]", state.router_id);
    while running.load(Ordering::Relaxed) {
        let batch: Vec<(Packet, SocketAddr)> = {
            let mut inner = state.inner.lock().await;
            inner.outgoing.drain(..).collect()
        };
        for (packet, dest) in batch {
            let is_data = matches!(packet, Packet::Data { .. });
            let sequence = packet.sequence();
            if let Err(e) = net_utils::send_packet(&socket, dest, &packet, &log_prefix).await {
                log::error!("{log_prefix} send to {dest} failed: {e}");
            }
            if is_data {
                let mut inner = state.inner.lock().await;
                inner.pending_acks.track(sequence, packet, dest, Instant::now());
            }
        }

        let actions = {
            let mut inner = state.inner.lock().await;
            inner.pending_acks.poll_timeouts(Instant::now())
        };
        for action in actions {
            match action {
                TimeoutAction::Resend { packet, dest } => {
                    let sequence = packet.sequence();
                    if let Err(e) = net_utils::send_packet(&socket, dest, &packet, &log_prefix).await {
                        log::error!("{log_prefix} retransmit of seq={sequence} to {dest} failed: {e}");
                    } else {
                        log::debug!("{log_prefix} retransmitted seq={sequence} to {dest}");
                    }
                }
                TimeoutAction::Abandon => {
                    log::warn!("{log_prefix} abandoned a data packet after exhausting its retries");
                }
            }
        }

        tokio::time::sleep(SENDER_TICK).await;
    }
}

async fn lsa_generator_loop(state: Arc<RouterState>, running: Arc<AtomicBool>) {
    let router_id = state.router_id.clone();
    while running.load(Ordering::Relaxed) {
        let sequence = {
            let mut inner = state.inner.lock().await;
            inner.sequence += 1;
            let sequence = inner.sequence;
            let links = state.link_costs();
            inner.lsdb.install_self(&router_id, sequence, links.clone());
            for (_, ep) in state.neighbors.iter() {
                inner
                    .outgoing
                    .push_back((Packet::lsa(router_id.clone(), sequence, links.clone()), ep.socket_addr()));
            }
            sequence
        };
        log::debug!("[Router {router_id}] originated LSA seq={sequence}");
        state.run_spf().await;

        net_utils::interruptible_sleep(&running, LSA_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NeighborEntry;

    fn config(id: &str, port: u16, neighbors: &[(&str, u16)]) -> RouterConfig {
        RouterConfig {
            router_id: id.to_string(),
            router_ip: [127, 0, 0, 1].into(),
            listen_port: port,
            neighbors: neighbors
                .iter()
                .map(|(nid, nport)| NeighborEntry {
                    id: nid.to_string(),
                    ip: [127, 0, 0, 1].into(),
                    port: *nport,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn construction_seeds_direct_neighbor_routes() {
        let router = Router::new(config("R1", 17001, &[("R2", 17002), ("R3", 17003)])).await.unwrap();
        let table = router.routing_table().await;
        assert_eq!(table.get("R2").unwrap().next_hop, "R2");
        assert_eq!(table.get(crate::routing_table::DEFAULT_ROUTE_KEY).unwrap().next_hop, "R2");
    }

    #[tokio::test]
    async fn starting_originates_a_self_lsa_promptly() {
        let router = Arc::new(Router::new(config("R1", 17011, &[("R2", 17012)])).await.unwrap());
        router.start();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let lsdb = router.lsdb().await;
        assert!(lsdb.contains("R1"));
        assert_eq!(lsdb.get("R1").unwrap().sequence, 1);
        router.stop().await;
    }

    #[tokio::test]
    async fn two_routers_converge_and_forward_a_data_packet_between_their_hosts() {
        let r1 = Arc::new(
            Router::new(config("R1", 17021, &[("R2", 17022), ("H1", 17023)]))
                .await
                .unwrap(),
        );
        let r2 = Arc::new(
            Router::new(config("R2", 17022, &[("R1", 17021), ("H2", 17024)]))
                .await
                .unwrap(),
        );
        r1.start();
        r2.start();

        tokio::time::sleep(Duration::from_millis(500)).await;

        let r1_table = r1.routing_table().await;
        assert_eq!(r1_table.get("R2").unwrap().next_hop, "R2");

        let h2_socket = UdpSocket::bind("127.0.0.1:17024").await.unwrap();
        let packet = Packet::data("H1", "H2", 1, 10, "hello");
        let bytes = packet.encode().unwrap();
        let r1_addr: SocketAddr = "127.0.0.1:17021".parse().unwrap();

        let sender = UdpSocket::bind("127.0.0.1:17023").await.unwrap();
        sender.send_to(&bytes, r1_addr).await.unwrap();

        let mut buf = [0u8; 1024];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), h2_socket.recv_from(&mut buf))
            .await
            .expect("H2 should receive the forwarded packet")
            .unwrap();
        let forwarded = Packet::decode(&buf[..len]).unwrap();
        assert_eq!(forwarded.source(), "H1");
        assert_eq!(forwarded.destination(), Some("H2"));

        r1.stop().await;
        r2.stop().await;
    }
}
