// Configuration loading for routers and hosts. Grounded on
// `read_config.rs`'s TOML-file convention, generalized from a hostname-keyed
// lookup to an explicit path: this simulation runs many nodes on one
// machine, so "one config file per hostname" does not apply.

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::neighbor_table::{Endpoint, NeighborTable};

/// One neighbor entry as it appears in a TOML config file. TOML arrays
/// preserve the order they were written in, which is what lets
/// `RouterConfig::neighbor_table` reconstruct the insertion-ordered table
/// the spec requires.
#[derive(Debug, Clone, Deserialize)]
pub struct NeighborEntry {
    pub id: String,
    pub ip: Ipv4Addr,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    pub router_id: String,
    pub router_ip: Ipv4Addr,
    pub listen_port: u16,
    pub neighbors: Vec<NeighborEntry>,
}

impl RouterConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_toml(path)
    }

    pub fn neighbor_table(&self) -> NeighborTable {
        NeighborTable::from_ordered(
            self.neighbors
                .iter()
                .map(|n| (n.id.clone(), Endpoint::new(n.ip, n.port))),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    pub host_id: String,
    pub host_ip: Ipv4Addr,
    pub listen_port: u16,
    pub router_ip: Ipv4Addr,
    pub router_port: u16,
    #[serde(default)]
    pub known_hosts: Vec<String>,
}

impl HostConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_toml(path)
    }

    /// Known peers with this host itself filtered out, per §6.
    pub fn peers(&self) -> Vec<String> {
        self.known_hosts
            .iter()
            .filter(|id| *id != &self.host_id)
            .cloned()
            .collect()
    }
}

fn load_toml<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!("failed to read config file {}: {e}", path.display()))
    })?;
    toml::from_str(&content)
        .map_err(|e| AppError::ConfigError(format!("failed to parse config file {}: {e}", path.display())))
}
