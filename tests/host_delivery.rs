// Host-to-host reliable delivery through a single router. Grounded on
// SPEC_FULL §8's "Host reliable delivery" property and §4.5's stop-and-wait
// state machine; mirrors the topology in
// `original_source/tests/test_host_router.py` (one router, two attached
// hosts) since that is the only topology in which a host's destination ever
// resolves to a routable id (§9 design notes on Dijkstra's node-set rule).

use std::sync::Arc;
use std::time::Duration;

use ospfsim::config::{HostConfig, NeighborEntry, RouterConfig};
use ospfsim::host::Host;
use ospfsim::router::Router;

fn router_config() -> RouterConfig {
    RouterConfig {
        router_id: "R".to_string(),
        router_ip: [127, 0, 0, 1].into(),
        listen_port: 19301,
        neighbors: vec![
            NeighborEntry {
                id: "H1".to_string(),
                ip: [127, 0, 0, 1].into(),
                port: 19302,
            },
            NeighborEntry {
                id: "H2".to_string(),
                ip: [127, 0, 0, 1].into(),
                port: 19303,
            },
        ],
    }
}

fn host_config(id: &str, port: u16, router_port: u16, peers: &[&str]) -> HostConfig {
    HostConfig {
        host_id: id.to_string(),
        host_ip: [127, 0, 0, 1].into(),
        listen_port: port,
        router_ip: [127, 0, 0, 1].into(),
        router_port,
        known_hosts: peers.iter().map(|p| p.to_string()).collect(),
    }
}

#[tokio::test]
async fn two_hosts_exchange_data_and_advance_last_confirmed_seq() {
    let router = Arc::new(Router::new(router_config()).await.unwrap());
    let h1 = Arc::new(Host::new(host_config("H1", 19302, 19301, &["H2"])).await.unwrap());
    let h2 = Arc::new(Host::new(host_config("H2", 19303, 19301, &["H1"])).await.unwrap());

    router.start();
    h1.start();
    h2.start();

    // H1's sender synthesizes a message within 4-7s, transmits, and the
    // router ACKs it immediately (H1 is a direct neighbor of the router).
    // Give it a comfortable margin under the spec's 30s bound.
    tokio::time::sleep(Duration::from_secs(9)).await;

    assert!(h1.last_confirmed_seq().await.is_some(), "H1 should have an acknowledged send by now");

    // H2 should have received H1's spontaneous "Legal?" and, per its own
    // receiver, replied with "Legal." — which in turn reaches H1.
    let h2_received = h2.received_messages().await;
    assert!(h2_received.iter().any(|(src, _)| src == "H1"), "H2 should have received something from H1");

    router.stop().await;
    h1.stop().await;
    h2.stop().await;
}

#[tokio::test]
async fn a_dropped_first_transmission_is_retransmitted_and_eventually_acked() {
    // No router at all: H1's first send vanishes into the void (nothing is
    // listening on the "gateway" port), forcing the 5s timeout and a
    // retransmit. Then start a real router just before the retry is due, so
    // the second attempt succeeds.
    let h1 = Arc::new(Host::new(host_config("H1", 19312, 19311, &["H2"])).await.unwrap());
    h1.start();

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(h1.last_confirmed_seq().await.is_none(), "nothing should be listening yet");

    let router = Arc::new(
        Router::new(RouterConfig {
            router_id: "R".to_string(),
            router_ip: [127, 0, 0, 1].into(),
            listen_port: 19311,
            neighbors: vec![NeighborEntry {
                id: "H1".to_string(),
                ip: [127, 0, 0, 1].into(),
                port: 19312,
            }],
        })
        .await
        .unwrap(),
    );
    router.start();

    // First attempt times out at the 5s mark (t=5s), then the sender waits
    // a random 4-7s before its next iteration retries the same packet
    // (t=9-12s from the original send, i.e. t=11-14s from here). Wait past
    // the worst case so the retry has a live router to land on.
    tokio::time::sleep(Duration::from_secs(13)).await;
    assert!(h1.last_confirmed_seq().await.is_some(), "H1 should have recovered via retransmission");

    h1.stop().await;
    router.stop().await;
}
