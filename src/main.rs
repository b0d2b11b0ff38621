// Entry point: builds one router or host node from a TOML config file and
// runs it until interrupted. Grounded on `src/init.rs`
// (init_logging_and_env/init_socket/init_state); the rest of the teacher's
// old main.rs (client/server/core/protocol scaffolding) has no counterpart
// here and is gone.

use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::UdpSocket;

use ospfsim::config::{HostConfig, RouterConfig};
use ospfsim::diagnostics;
use ospfsim::error::Result;
use ospfsim::host::Host;
use ospfsim::router::Router;

fn init_logging() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
}

fn usage() -> ! {
    eprintln!("usage: ospfsim <router|host> <config.toml> [control-port]");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let mut args = env::args().skip(1);
    let kind = args.next().unwrap_or_else(|| usage());
    let config_path = args.next().unwrap_or_else(|| usage());
    let control_port: Option<u16> = args.next().map(|p| p.parse().unwrap_or_else(|_| usage()));

    let result = match kind.as_str() {
        "router" => run_router(&config_path, control_port).await,
        "host" => run_host(&config_path, control_port).await,
        _ => usage(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("ospfsim exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_router(config_path: &str, control_port: Option<u16>) -> Result<()> {
    let config = RouterConfig::load(config_path)?;
    let listen_port = config.listen_port;
    let router_id = config.router_id.clone();
    let router = Arc::new(Router::new(config).await?);
    router.start();
    log::info!("router {router_id} listening on 0.0.0.0:{listen_port}");

    if let Some(port) = control_port {
        let router = Arc::clone(&router);
        tokio::spawn(async move {
            if let Err(e) = run_router_control(router, port).await {
                log::error!("control listener on {port} stopped: {e}");
            }
        });
    }

    tokio::signal::ctrl_c().await.ok();
    log::info!("router {} shutting down", router.router_id());
    router.stop().await;
    Ok(())
}

async fn run_host(config_path: &str, control_port: Option<u16>) -> Result<()> {
    let config = HostConfig::load(config_path)?;
    let listen_port = config.listen_port;
    let host_id = config.host_id.clone();
    let host = Arc::new(Host::new(config).await?);
    host.start();
    log::info!("host {host_id} listening on 0.0.0.0:{listen_port}");

    if let Some(port) = control_port {
        let host = Arc::clone(&host);
        tokio::spawn(async move {
            if let Err(e) = run_host_control(host, port).await {
                log::error!("control listener on {port} stopped: {e}");
            }
        });
    }

    tokio::signal::ctrl_c().await.ok();
    log::info!("host {} shutting down", host.host_id());
    host.stop().await;
    Ok(())
}

/// A minimal text control channel, separate from the packet wire format:
/// each datagram is a plain command string, the reply is the rendered
/// diagnostic. Grounded on the teacher's `packet_loop.rs` control-message
/// branch (message_type 3), simplified since this simulation has no
/// enable/disable protocol toggle to expose.
async fn run_router_control(router: Arc<Router>, port: u16) -> Result<()> {
    let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
    let mut buf = [0u8; 256];
    loop {
        let (len, from): (usize, SocketAddr) = socket.recv_from(&mut buf).await?;
        let command = String::from_utf8_lossy(&buf[..len]).trim().to_string();
        let response = match command.as_str() {
            "routing-table" => diagnostics::render_routing_table(&router.routing_table().await),
            "lsdb" => diagnostics::render_lsdb(&router.lsdb().await),
            other => format!("unknown command: {other}"),
        };
        let _ = socket.send_to(response.as_bytes(), from).await;
    }
}

async fn run_host_control(host: Arc<Host>, port: u16) -> Result<()> {
    let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
    let mut buf = [0u8; 256];
    loop {
        let (len, from): (usize, SocketAddr) = socket.recv_from(&mut buf).await?;
        let command = String::from_utf8_lossy(&buf[..len]).trim().to_string();
        let response = match command.as_str() {
            "received" => {
                let messages = host.received_messages().await;
                if messages.is_empty() {
                    "no messages received yet".to_string()
                } else {
                    messages
                        .iter()
                        .map(|(source, content)| format!("{source}: {content}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            "last-ack" => format!("last_confirmed_seq = {:?}", host.last_confirmed_seq().await),
            other => format!("unknown command: {other}"),
        };
        let _ = socket.send_to(response.as_bytes(), from).await;
    }
}
