// TTL expiry at the first hop. Grounded on SPEC_FULL §8's TTL property and
// §4.3 step 1 (decrement, then drop at or below zero).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;

use ospfsim::config::{NeighborEntry, RouterConfig};
use ospfsim::packet::Packet;
use ospfsim::router::Router;

#[tokio::test]
async fn ttl_one_is_dropped_at_the_first_hop_without_forwarding() {
    let r1 = Arc::new(
        Router::new(RouterConfig {
            router_id: "R1".to_string(),
            router_ip: [127, 0, 0, 1].into(),
            listen_port: 19201,
            neighbors: vec![NeighborEntry {
                id: "R2".to_string(),
                ip: [127, 0, 0, 1].into(),
                port: 19202,
            }],
        })
        .await
        .unwrap(),
    );
    r1.start();

    // Stand-ins for the originating host and the would-be next hop.
    let origin = UdpSocket::bind("127.0.0.1:19203").await.unwrap();
    let r2_stub = UdpSocket::bind("127.0.0.1:19202").await.unwrap();

    let packet = Packet::data("H1", "R2", 1, 1, "should not survive");
    let r1_addr: SocketAddr = "127.0.0.1:19201".parse().unwrap();
    origin.send_to(&packet.encode().unwrap(), r1_addr).await.unwrap();

    // R2's stub also sees R1's own startup LSA (flooded to every neighbor the
    // instant the router starts); only a forwarded `data` packet would prove
    // the TTL-expired packet leaked through, so keep draining and ignore LSAs.
    let mut buf = [0u8; 1024];
    let deadline = tokio::time::Instant::now() + Duration::from_millis(500);
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, r2_stub.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => {
                let received = Packet::decode(&buf[..len]).unwrap();
                assert!(
                    !matches!(received, Packet::Data { .. }),
                    "R1 must not forward a packet whose TTL reached zero"
                );
            }
            _ => break,
        }
    }

    r1.stop().await;
}
