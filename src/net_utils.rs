// Fonctions utilitaires réseau et helpers
//
// Trimmed from the teacher's version: the interface-discovery helpers that
// depended on `pnet` are gone (this is a simulated network with addresses
// supplied at construction, not a real-interface scanner). What remains —
// binding a socket and sending a serializable message — is grounded on
// `net_utils::send_message`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, info};
use tokio::net::UdpSocket;

use crate::error::Result;
use crate::packet::Packet;

/// The step size used by `interruptible_sleep` below.
const POLL_STEP: Duration = Duration::from_millis(200);

/// Binds a UDP socket on `0.0.0.0:port`, wrapped in an `Arc` so the receiver
/// and sender tasks of a node can share one underlying socket rather than
/// each opening its own.
pub async fn bind_socket(port: u16) -> Result<Arc<UdpSocket>> {
    let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
    Ok(Arc::new(socket))
}

/// Encodes and sends `packet` to `dest`, logging the outcome. Send failures
/// are logged and returned to the caller, who per §7 decides whether a
/// pending-ACK entry should be left in place to cover the retry.
pub async fn send_packet(socket: &UdpSocket, dest: SocketAddr, packet: &Packet, log_prefix: &str) -> Result<()> {
    let bytes = packet.encode()?;
    socket.send_to(&bytes, dest).await?;
    debug!("{log_prefix} sent {} packet to {dest}", packet.kind());
    Ok(())
}

pub fn log_received(log_prefix: &str, from: SocketAddr, packet: &Packet) {
    info!(
        "{log_prefix} received {} packet from {} (source={}, seq={})",
        packet.kind(),
        from,
        packet.source(),
        packet.sequence()
    );
}

/// Sleeps for `duration`, but wakes early (in `POLL_STEP` increments) to
/// check `running` so a long periodic sleep (the LSA generator's 30s, a
/// host's inter-send delay) doesn't stall shutdown.
pub async fn interruptible_sleep(running: &AtomicBool, duration: Duration) {
    let mut remaining = duration;
    while remaining > Duration::ZERO && running.load(Ordering::Relaxed) {
        let step = remaining.min(POLL_STEP);
        tokio::time::sleep(step).await;
        remaining = remaining.saturating_sub(step);
    }
}

/// Seconds since the Unix epoch, used to stamp ACK timestamps. Falls back to
/// 0 on a clock that reports time before the epoch, which a send/ack
/// timestamp field tolerates fine.
pub fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}
