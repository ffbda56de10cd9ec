use std::collections::HashMap;

use super::model::{DebateGraph, NodeKind};

const MS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Assigns a creation timestamp to every node and computes the time domain.
///
/// Seeded nodes take their author's contribution time. Unseeded nodes adopt
/// the earliest timestamp among their neighbors over three passes, so
/// propagation reaches at most three hops; whatever is still unset after the
/// causal-repair passes falls back to the global minimum.
pub fn resolve_timestamps(graph: &mut DebateGraph, author_times: &HashMap<String, i64>) {
    for node in &mut graph.nodes {
        node.timestamp = node
            .author_id
            .as_deref()
            .and_then(|author| author_times.get(author).copied());
    }

    for _ in 0..3 {
        for index in 0..graph.nodes.len() {
            if graph.nodes[index].timestamp.is_some() {
                continue;
            }
            let earliest = graph.neighbors[index]
                .iter()
                .filter_map(|&neighbor| graph.nodes[neighbor].timestamp)
                .min();
            graph.nodes[index].timestamp = earliest;
        }
    }

    // Arguments may not predate their position, and keywords may not predate
    // the nodes that mention them. Clamps only raise, never lower.
    for _ in 0..3 {
        for edge_index in 0..graph.edges.len() {
            let edge = graph.edges[edge_index];
            let Some((earlier, later)) =
                causal_pair(graph.nodes[edge.source].kind, graph.nodes[edge.target].kind)
                    .map(|flipped| {
                        if flipped {
                            (edge.target, edge.source)
                        } else {
                            (edge.source, edge.target)
                        }
                    })
            else {
                continue;
            };
            let Some(floor) = graph.nodes[earlier].timestamp else {
                continue;
            };
            let raised = match graph.nodes[later].timestamp {
                Some(current) => current.max(floor),
                None => floor,
            };
            graph.nodes[later].timestamp = Some(raised);
        }
    }

    let assigned = graph.nodes.iter().filter_map(|node| node.timestamp);
    let min_ts = assigned.clone().min().unwrap_or(0);
    let max_ts = assigned.max().unwrap_or(0);

    for node in &mut graph.nodes {
        if node.timestamp.is_none() {
            node.timestamp = Some(min_ts);
        }
    }

    graph.time_domain = (min_ts, max_ts);
}

/// Returns whether (source, target) is causally ordered, and `true` when the
/// source is the later endpoint of the pair.
fn causal_pair(source: NodeKind, target: NodeKind) -> Option<bool> {
    let is_argument = |kind: NodeKind| matches!(kind, NodeKind::InFavor | NodeKind::Against);

    match (source, target) {
        (NodeKind::Position, t) if is_argument(t) => Some(false),
        (s, NodeKind::Position) if is_argument(s) => Some(true),
        (NodeKind::Entity, NodeKind::Entity) => None,
        (s, NodeKind::Entity) if s != NodeKind::Entity => Some(false),
        (NodeKind::Entity, _) => Some(true),
        _ => None,
    }
}

/// Playback length for scrubbing the full domain: one debate-day per second,
/// clamped to [5 s, 90 s].
pub fn playback_duration_ms(time_domain: (i64, i64)) -> f64 {
    let debate_days = (time_domain.1 - time_domain.0) as f64 / MS_PER_DAY;
    (debate_days * 1000.0).clamp(5_000.0, 90_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::model::{DebateEdge, DebateNode, RelationKind};

    fn node(id: &str, kind: NodeKind, author: Option<&str>) -> DebateNode {
        DebateNode {
            id: id.to_string(),
            kind,
            title: String::new(),
            text: String::new(),
            value: String::new(),
            tagline: String::new(),
            summary: String::new(),
            author_id: author.map(str::to_string),
            degree: 0,
            timestamp: None,
        }
    }

    fn edge(source: usize, target: usize) -> DebateEdge {
        DebateEdge {
            source,
            target,
            relation: RelationKind::Structural,
        }
    }

    fn times(pairs: &[(&str, i64)]) -> HashMap<String, i64> {
        pairs
            .iter()
            .map(|(author, ts)| (author.to_string(), *ts))
            .collect()
    }

    #[test]
    fn propagation_is_bounded_to_three_hops() {
        // The sweeps run in index order, so the chain is laid out against
        // them: each pass can only carry the seed one hop. A disconnected
        // earlier seed keeps the fallback value distinguishable.
        let nodes = vec![
            node("n4", NodeKind::Position, None),
            node("n3", NodeKind::Position, None),
            node("n2", NodeKind::Position, None),
            node("n1", NodeKind::Position, None),
            node("s", NodeKind::Subject, Some("a")),
            node("old", NodeKind::Position, Some("b")),
        ];
        let edges = vec![edge(4, 3), edge(3, 2), edge(2, 1), edge(1, 0)];
        let mut graph = DebateGraph::new(nodes, edges);
        resolve_timestamps(&mut graph, &times(&[("a", 100), ("b", 10)]));

        assert_eq!(graph.nodes[3].timestamp, Some(100));
        assert_eq!(graph.nodes[2].timestamp, Some(100));
        assert_eq!(graph.nodes[1].timestamp, Some(100));
        // Four hops out: propagation never reached it, fallback did.
        assert_eq!(graph.nodes[0].timestamp, Some(10));
        assert_eq!(graph.time_domain, (10, 100));
    }

    #[test]
    fn arguments_never_predate_their_position() {
        let nodes = vec![
            node("p", NodeKind::Position, Some("late")),
            node("early_arg", NodeKind::InFavor, Some("early")),
            node("late_arg", NodeKind::Against, Some("latest")),
        ];
        let edges = vec![edge(0, 1), edge(0, 2)];
        let mut graph = DebateGraph::new(nodes, edges);
        resolve_timestamps(
            &mut graph,
            &times(&[("late", 50), ("early", 20), ("latest", 80)]),
        );

        // Raised to the position's time.
        assert_eq!(graph.nodes[1].timestamp, Some(50));
        // Already later, untouched.
        assert_eq!(graph.nodes[2].timestamp, Some(80));
    }

    #[test]
    fn entities_never_predate_their_mentions() {
        let nodes = vec![
            node("a", NodeKind::InFavor, Some("x")),
            node("e", NodeKind::Entity, Some("y")),
        ];
        let edges = vec![edge(0, 1)];
        let mut graph = DebateGraph::new(nodes, edges);
        resolve_timestamps(&mut graph, &times(&[("x", 30), ("y", 5)]));

        assert_eq!(graph.nodes[1].timestamp, Some(30));
    }

    #[test]
    fn empty_seed_set_collapses_domain_to_zero() {
        let nodes = vec![
            node("s", NodeKind::Subject, None),
            node("p", NodeKind::Position, None),
        ];
        let mut graph = DebateGraph::new(nodes, vec![edge(0, 1)]);
        resolve_timestamps(&mut graph, &HashMap::new());

        assert_eq!(graph.time_domain, (0, 0));
        assert!(graph.nodes.iter().all(|n| n.timestamp == Some(0)));
    }

    #[test]
    fn playback_duration_is_clamped() {
        assert_eq!(playback_duration_ms((0, 0)), 5_000.0);
        let ten_days = 10 * 24 * 60 * 60 * 1000;
        assert_eq!(playback_duration_ms((0, ten_days)), 10_000.0);
        let year = 365 * 24 * 60 * 60 * 1000;
        assert_eq!(playback_duration_ms((0, year)), 90_000.0);
    }
}
