// Pure-function renderers for the LSDB and routing table. Grounded on
// `router.py::get_lsdb_table_formatted`/`get_routing_table_formatted` and the
// teacher's box-drawing style in `src/neighbor.rs::display_interface_report`.
//
// These are the "console formatting" sink the spec calls out as an external
// collaborator's concern: the renderer itself is a pure function returning an
// owned `String`; deciding when to call it and where to print it is the
// CLI's job.

use crate::lsdb::Lsdb;
use crate::routing_table::RoutingTable;

pub fn render_lsdb(lsdb: &Lsdb) -> String {
    let mut ids: Vec<&str> = lsdb.router_ids().collect();
    ids.sort_unstable();

    let mut out = String::new();
    out.push_str("┌────────────┬──────────────────────┬──────────────────────────────────────────────────┐\n");
    out.push_str("│ Router     │ Sequence             │ Links (neighbor:cost)                             │\n");
    out.push_str("├────────────┼──────────────────────┼──────────────────────────────────────────────────┤\n");
    for id in ids {
        let entry = lsdb.get(id).expect("id came from lsdb.router_ids()");
        let mut link_ids: Vec<&String> = entry.links.keys().collect();
        link_ids.sort_unstable();
        let links_str = link_ids
            .iter()
            .map(|n| format!("{n}:{}", entry.links[*n]))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("│ {id:<10} │ {:<20} │ {:<50}│\n", entry.sequence, links_str));
    }
    out.push_str("└────────────┴──────────────────────┴──────────────────────────────────────────────────┘");
    out
}

pub fn render_routing_table(table: &RoutingTable) -> String {
    let mut destinations: Vec<&str> = table.iter().map(|(d, _)| d).collect();
    destinations.sort_unstable();

    let mut out = String::new();
    out.push_str("┌────────────┬────────┬────────────────────┐\n");
    out.push_str("│ Destination│ Cost   │ Next hop           │\n");
    out.push_str("├────────────┼────────┼────────────────────┤\n");
    for dest in destinations {
        let route = table.get(dest).expect("destination came from table.iter()");
        out.push_str(&format!(
            "│ {dest:<10} │ {:<6} │ {:<19}│\n",
            route.cost, route.next_hop
        ));
    }
    out.push_str("└────────────┴────────┴────────────────────┘");
    out
}
