// Routing table: destination -> {next_hop, cost}, installed from Dijkstra's
// output. Grounded on `router.py::_initialize_routing_structures`/
// `_update_routing_table`, generalized from the teacher's metric-only
// `core/routing_table.rs` shape to the next-hop + cost pairs the spec wants.

use std::collections::HashMap;

use crate::dijkstra::ShortestPaths;
use crate::neighbor_table::NeighborTable;

/// The reserved key for the default-route entry.
pub const DEFAULT_ROUTE_KEY: &str = "0.0.0.0";

#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<String, RouteEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub next_hop: String,
    pub cost: u32,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, destination: &str) -> Option<&RouteEntry> {
        self.routes.get(destination)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteEntry)> {
        self.routes.iter().map(|(d, r)| (d.as_str(), r))
    }

    /// Seeds the table with one entry per direct neighbor (next_hop = self)
    /// and, if there is at least one neighbor, the default-gateway entry
    /// pointing at the first configured neighbor.
    pub fn install_direct_neighbors(&mut self, neighbors: &NeighborTable) {
        for id in neighbors.ids() {
            self.routes.insert(
                id.to_string(),
                RouteEntry {
                    next_hop: id.to_string(),
                    cost: 1,
                },
            );
        }
        if let Some((gateway, _)) = neighbors.default_gateway() {
            self.routes.insert(
                DEFAULT_ROUTE_KEY.to_string(),
                RouteEntry {
                    next_hop: gateway.to_string(),
                    cost: 1,
                },
            );
        }
    }

    /// Merges in the routes Dijkstra computed from `self_id`'s perspective.
    /// For each finite-distance destination (other than self), the first hop
    /// on the reconstructed path must be a configured neighbor; destinations
    /// that fail that check are left untouched rather than installed with a
    /// bogus next hop. Entries are merged (inserted/overwritten), never
    /// wholesale replaced, so a neighbor discovered only via its bootstrap
    /// direct-route entry is preserved if Dijkstra has nothing better to say
    /// about it.
    pub fn merge_shortest_paths(
        &mut self,
        self_id: &str,
        paths: &ShortestPaths,
        neighbors: &NeighborTable,
    ) {
        for (destination, &cost) in &paths.distances {
            if destination == self_id {
                continue;
            }
            let Some(first_hop) = paths.first_hop(destination) else {
                continue;
            };
            if !neighbors.contains(&first_hop) {
                continue;
            }
            let entry = RouteEntry {
                next_hop: first_hop,
                cost,
            };
            match self.routes.get(destination) {
                Some(existing) if existing.cost <= entry.cost => {
                    // Keep the existing (equal-or-better) route rather than
                    // replace it with an equal-cost alternative.
                }
                _ => {
                    self.routes.insert(destination.to_string(), entry);
                }
            }
        }
    }
}
