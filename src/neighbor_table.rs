// Table de voisinage à ordre préservé : le premier voisin configuré est la
// passerelle par défaut (§3/§9 de la spécification).

use std::net::Ipv4Addr;

use indexmap::IndexMap;

/// Endpoint of a directly connected node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::new(std::net::IpAddr::V4(self.ip), self.port)
    }
}

/// Insertion-ordered map from neighbor-id to endpoint. A plain `HashMap`
/// cannot guarantee the "first configured neighbor is the default gateway"
/// rule the spec relies on, so iteration order here is always the order
/// neighbors were inserted.
#[derive(Debug, Clone, Default)]
pub struct NeighborTable {
    inner: IndexMap<String, Endpoint>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self {
            inner: IndexMap::new(),
        }
    }

    pub fn from_ordered(entries: impl IntoIterator<Item = (String, Endpoint)>) -> Self {
        Self {
            inner: entries.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, endpoint: Endpoint) {
        self.inner.insert(id.into(), endpoint);
    }

    pub fn get(&self, id: &str) -> Option<Endpoint> {
        self.inner.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// The first neighbor in configuration order, i.e. the default gateway.
    pub fn default_gateway(&self) -> Option<(&str, Endpoint)> {
        self.inner.first().map(|(id, ep)| (id.as_str(), *ep))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Endpoint)> {
        self.inner.iter().map(|(id, ep)| (id.as_str(), *ep))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }
}
