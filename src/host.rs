// The Host node: spontaneous traffic generator and stop-and-wait reliable
// sender, plus an auto-reply receiver. Grounded on
// `original_source/host/host/host.py` end to end (constructor, the
// `_send_messages`/`_receive_messages` thread bodies, `_create_data_packet`),
// translated onto two `tokio` tasks the way `router.rs` translates the
// router's three. The ACK/retransmission half of the sender has no
// counterpart in the original (it never acknowledges anything); that half is
// new, styled after the router's own pending-ack/timeout handling.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::net::UdpSocket;
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;

use crate::config::HostConfig;
use crate::error::Result;
use crate::net_utils;
use crate::packet::Packet;

/// Default TTL stamped on a host-originated data packet.
const INITIAL_TTL: u8 = 10;
/// How long the sender waits for an ACK before retrying.
const ACK_TIMEOUT: Duration = Duration::from_secs(5);
/// Bounds of the uniform random delay between spontaneous messages.
const SPONTANEOUS_DELAY_MIN_SECS: u64 = 4;
const SPONTANEOUS_DELAY_MAX_SECS: u64 = 7;
const RECEIVER_POLL: Duration = Duration::from_secs(1);

struct HostInner {
    sequence: u32,
    last_confirmed_seq: Option<u32>,
    awaiting_confirmation: bool,
    in_flight: Option<Packet>,
    outgoing: VecDeque<Packet>,
    /// (source, content) pairs delivered to this host, kept for diagnostics
    /// and tests.
    received: Vec<(String, String)>,
}

struct HostState {
    host_id: String,
    router_addr: SocketAddr,
    peers: Vec<String>,
    inner: AsyncMutex<HostInner>,
    release: Notify,
}

impl HostState {
    async fn next_sequence(&self) -> u32 {
        let mut inner = self.inner.lock().await;
        inner.sequence += 1;
        inner.sequence
    }
}

/// A simulated host: one gateway router, a set of known peers, two
/// concurrent activities (receiver, sender) sharing state behind a
/// `tokio::sync::Mutex`.
pub struct Host {
    state: Arc<HostState>,
    socket: Arc<UdpSocket>,
    running: Arc<AtomicBool>,
    handles: AsyncMutex<Vec<JoinHandle<()>>>,
}

impl Host {
    pub async fn new(config: HostConfig) -> Result<Self> {
        let socket = net_utils::bind_socket(config.listen_port).await?;
        let router_addr = SocketAddr::new(config.router_ip.into(), config.router_port);

        let inner = HostInner {
            sequence: 0,
            last_confirmed_seq: None,
            awaiting_confirmation: false,
            in_flight: None,
            outgoing: VecDeque::new(),
            received: Vec::new(),
        };

        let state = Arc::new(HostState {
            host_id: config.host_id,
            router_addr,
            peers: config.peers(),
            inner: AsyncMutex::new(inner),
            release: Notify::new(),
        });

        Ok(Self {
            state,
            socket,
            running: Arc::new(AtomicBool::new(false)),
            handles: AsyncMutex::new(Vec::new()),
        })
    }

    pub fn host_id(&self) -> &str {
        &self.state.host_id
    }

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

        let host_id = self.host_id().to_string();
        let mut guard = match self.handles.try_lock() {
            Ok(g) => g,
            Err(_) => {
                log::warn!("[Host {host_id}] start() called while already starting");
                return;
            }
        };
        guard.push(receiver);
        guard.push(sender);
    }

    pub async fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        // Unblock a sender that's currently waiting on an ACK it will never
        // receive now that the node is shutting down.
        self.state.release.notify_one();
        let mut handles = self.handles.lock().await;
        for handle in handles.drain(..) {
            if tokio::time::timeout(Duration::from_secs(2), handle).await.is_err() {
                log::warn!("[Host {}] a task did not stop within its grace period", self.host_id());
            }
        }
    }

    pub async fn last_confirmed_seq(&self) -> Option<u32> {
        self.state.inner.lock().await.last_confirmed_seq
    }

    pub async fn received_messages(&self) -> Vec<(String, String)> {
        self.state.inner.lock().await.received.clone()
    }
}

async fn sender_loop(socket: Arc<UdpSocket>, state: Arc<HostState>, running: Arc<AtomicBool>) {
    let log_prefix = format!("[Host {}]", state.host_id);
    while running.load(Ordering::Relaxed) {
        // 1. Spontaneous message, if nothing is currently outstanding.
        {
            let mut inner = state.inner.lock().await;
            if !inner.awaiting_confirmation && !state.peers.is_empty() {
                let peer = {
                    let idx = rand::thread_rng().gen_range(0..state.peers.len());
                    state.peers[idx].clone()
                };
                inner.sequence += 1;
                let sequence = inner.sequence;
                let packet = Packet::data(state.host_id.clone(), peer, sequence, INITIAL_TTL, "Legal?");
                inner.outgoing.push_back(packet);
            }
        }

        // 2. Pop-send-wait, one in-flight packet at a time.
        let next = {
            let mut inner = state.inner.lock().await;
            if inner.awaiting_confirmation {
                None
            } else {
                inner.outgoing.pop_front()
            }
        };

        if let Some(packet) = next {
            let sequence = packet.sequence();
            {
                let mut inner = state.inner.lock().await;
                inner.awaiting_confirmation = true;
                inner.in_flight = Some(packet.clone());
            }

            let notified = state.release.notified();
            if let Err(e) = net_utils::send_packet(&socket, state.router_addr, &packet, &log_prefix).await {
                log::error!("{log_prefix} failed to transmit seq={sequence}: {e}");
            }

            match tokio::time::timeout(ACK_TIMEOUT, notified).await {
                Ok(_) => {
                    log::debug!("{log_prefix} seq={sequence} acknowledged");
                }
                Err(_) => {
                    let mut inner = state.inner.lock().await;
                    inner.awaiting_confirmation = false;
                    if let Some(unacked) = inner.in_flight.take() {
                        log::warn!("{log_prefix} seq={sequence} timed out waiting for ACK, retrying");
                        inner.outgoing.push_front(unacked);
                    }
                }
            }
        }

        net_utils::interruptible_sleep(&running, spontaneous_delay()).await;
    }
}

fn spontaneous_delay() -> Duration {
    let secs = rand::thread_rng().gen_range(SPONTANEOUS_DELAY_MIN_SECS..=SPONTANEOUS_DELAY_MAX_SECS);
    Duration::from_secs(secs)
}

async fn receiver_loop(socket: Arc<UdpSocket>, state: Arc<HostState>, running: Arc<AtomicBool>) {
    let log_prefix = format!("[Host {}]", state.host_id);
    let mut buf = [0u8; crate::packet::MAX_PACKET_BYTES];
    while running.load(Ordering::Relaxed) {
        let received = tokio::time::timeout(RECEIVER_POLL, socket.recv_from(&mut buf)).await;
        let (len, from) = match received {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                log::error!("{log_prefix} recv_from failed: {e}");
                continue;
            }
            Err(_) => continue,
        };

        let packet = match Packet::decode(&buf[..len]) {
            Ok(packet) => packet,
            Err(e) => {
                log::warn!("{log_prefix} dropping malformed packet from {from}: {e}");
                continue;
            }
        };
        net_utils::log_received(&log_prefix, from, &packet);

        match packet {
            Packet::Data { sequence, source, destination, payload, .. } => {
                if destination != state.host_id {
                    continue;
                }
                let ack = Packet::ack(state.host_id.clone(), source.clone(), sequence, net_utils::now_unix());
                if let Err(e) = net_utils::send_packet(&socket, state.router_addr, &ack, &log_prefix).await {
                    log::error!("{log_prefix} failed to ACK seq={sequence} from {source}: {e}");
                }

                let reply_seq = state.next_sequence().await;
                let reply = Packet::data(state.host_id.clone(), source.clone(), reply_seq, INITIAL_TTL, "Legal.");
                let mut inner = state.inner.lock().await;
                inner.received.push((source, payload.content));
                inner.outgoing.push_back(reply);
            }
            Packet::Ack { sequence, .. } => {
                let in_flight_sequence = {
                    let inner = state.inner.lock().await;
                    inner.in_flight.as_ref().map(Packet::sequence)
                };
                if in_flight_sequence == Some(sequence) {
                    let mut inner = state.inner.lock().await;
                    inner.last_confirmed_seq = Some(sequence);
                    inner.awaiting_confirmation = false;
                    inner.in_flight = None;
                    drop(inner);
                    state.release.notify_one();
                } else {
                    log::debug!("{log_prefix} ACK seq={sequence} matched no in-flight packet; ignored");
                }
            }
            Packet::Lsa { .. } => {
                log::trace!("{log_prefix} ignoring LSA packet (hosts do not route)");
            }
        }
    }
}
