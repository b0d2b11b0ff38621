// netctl: a thin interactive UDP client for a running node's control
// listener (see `main.rs::run_router_control`/`run_host_control`). Trimmed
// from the teacher's prompt-then-command-loop shape; the enable/disable
// protocol toggle is gone along with the "connexion" handshake, replaced
// with the diagnostics commands this crate exposes.

use std::io::{self, Write};
use std::net::UdpSocket;
use std::time::Duration;

fn help() {
    println!("Available commands:");
    println!("  routing-table  - print the node's routing table (routers)");
    println!("  lsdb           - print the node's link-state database (routers)");
    println!("  received       - print messages delivered to this node (hosts)");
    println!("  last-ack       - print the last confirmed sequence number (hosts)");
    println!("  help           - show this message");
    println!("  exit           - quit netctl");
}

fn main() -> io::Result<()> {
    print!("Node control address [127.0.0.1:6000]: ");
    io::stdout().flush()?;
    let mut addr = String::new();
    io::stdin().read_line(&mut addr)?;
    let addr = addr.trim();
    let addr = if addr.is_empty() { "127.0.0.1:6000" } else { addr };

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_read_timeout(Some(Duration::from_secs(3)))?;

    println!("netctl ready, talking to {addr}");
    help();

    loop {
        print!("\n> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let command = input.trim();

        if command.is_empty() {
            continue;
        }
        if command == "exit" {
            println!("bye");
            break;
        }
        if command == "help" {
            help();
            continue;
        }

        socket.send_to(command.as_bytes(), addr)?;
        let mut buf = [0u8; 4096];
        match socket.recv_from(&mut buf) {
            Ok((len, _)) => println!("{}", String::from_utf8_lossy(&buf[..len])),
            Err(e) => println!("no response from {addr}: {e}"),
        }
    }

    Ok(())
}
