// Library surface of the simulated network: every module a router or host
// node is built from. `main.rs` and `cli.rs` are thin consumers of this
// surface, not part of it.

pub mod config;
pub mod diagnostics;
pub mod dijkstra;
pub mod error;
pub mod host;
pub mod lsdb;
pub mod neighbor_table;
pub mod net_utils;
pub mod packet;
pub mod pending_acks;
pub mod router;
pub mod routing_table;

pub use error::{AppError, Result};
