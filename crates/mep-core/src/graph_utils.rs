use crate::ids::{BusId, LineId};
use crate::network::Network;
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{HashSet, VecDeque};

/// Summary statistics of the bus/line graph.
#[derive(Debug)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub connected_components: usize,
    pub max_degree: usize,
}

/// One connected group of buses.
#[derive(Debug)]
pub struct IslandSummary {
    pub island_id: usize,
    pub buses: Vec<BusId>,
}

#[derive(Debug)]
pub struct IslandAnalysis {
    pub islands: Vec<IslandSummary>,
    /// Island of each bus, indexed by bus position
    pub assignments: Vec<usize>,
}

/// Undirected graph over buses, one edge per line whose endpoints resolve.
///
/// Node `i` is the bus at position `i`, so `NodeIndex::index()` equals
/// `BusId::index()`.
pub fn bus_graph(network: &Network) -> UnGraph<BusId, LineId> {
    let mut graph = UnGraph::with_capacity(network.buses.len(), network.lines.len());
    for position in 0..network.buses.len() {
        graph.add_node(BusId::new(position));
    }
    for (position, line) in network.lines.iter().enumerate() {
        if let (Some(from), Some(to)) = (
            network.buses.position(&line.from),
            network.buses.position(&line.to),
        ) {
            graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), LineId::new(position));
        }
    }
    graph
}

pub fn graph_stats(network: &Network) -> GraphStats {
    let graph = bus_graph(network);
    let max_degree = graph
        .node_indices()
        .map(|node| graph.neighbors(node).count())
        .max()
        .unwrap_or(0);
    GraphStats {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        connected_components: connected_components(&graph),
        max_degree,
    }
}

/// Labels connected components of the bus graph (breadth-first search).
pub fn find_islands(network: &Network) -> IslandAnalysis {
    let graph = bus_graph(network);
    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    let mut assignments = vec![0; graph.node_count()];
    for start in graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let island_id = islands.len();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(graph[node]);
            assignments[node.index()] = island_id;
            for neighbor in graph.neighbors(node) {
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        members.sort();
        islands.push(IslandSummary {
            island_id,
            buses: members,
        });
    }
    IslandAnalysis {
        islands,
        assignments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Bus, Line};
    use crate::network::NetworkConstants;

    fn network() -> Network {
        let mut network = Network::new(NetworkConstants::new(1, 1));
        for name in ["A", "B", "C"] {
            network.add_bus(Bus::new(name, "heat")).unwrap();
        }
        network.add_line(Line::new("A-B", "heat", "A", "B", 1.0)).unwrap();
        network
    }

    #[test]
    fn islands_split_on_missing_lines() {
        let analysis = find_islands(&network());
        assert_eq!(analysis.islands.len(), 2);
        assert_eq!(analysis.islands[0].buses, vec![BusId::new(0), BusId::new(1)]);
        assert_eq!(analysis.assignments, vec![0, 0, 1]);
    }

    #[test]
    fn stats_count_components() {
        let stats = graph_stats(&network());
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(stats.connected_components, 2);
        assert_eq!(stats.max_degree, 1);
    }
}
