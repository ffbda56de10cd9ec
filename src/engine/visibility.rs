use std::collections::HashSet;

use crate::debate::{DebateGraph, NodeKind};

/// Depth tiers: 0 subject only, 1 adds positions, 2 adds arguments and
/// clusters, 3 everything.
pub const MAX_DEPTH_LEVEL: u8 = 3;

/// Which nodes are disclosed: a depth tier, the timeline cursor, and the
/// manually revealed overrides from drill-down clicks.
#[derive(Clone, Debug)]
pub struct VisibilityState {
    pub depth_level: u8,
    pub current_time: i64,
    pub revealed: HashSet<usize>,
}

impl VisibilityState {
    pub fn new(depth_level: u8, current_time: i64) -> Self {
        Self {
            depth_level: depth_level.min(MAX_DEPTH_LEVEL),
            current_time,
            revealed: HashSet::new(),
        }
    }

    pub fn set_depth_level(&mut self, level: u8) {
        self.depth_level = level.min(MAX_DEPTH_LEVEL);
        self.revealed.clear();
    }

    /// The visibility predicate, in priority order: the subject anchors
    /// the graph and is always shown, future nodes are never shown, the
    /// reveal set overrides the depth tier, then the tier decides.
    pub fn is_visible(&self, graph: &DebateGraph, index: usize) -> bool {
        let node = &graph.nodes[index];
        if node.kind == NodeKind::Subject {
            return true;
        }
        if let Some(timestamp) = node.timestamp
            && timestamp > self.current_time
        {
            return false;
        }
        if self.revealed.contains(&index) {
            return true;
        }
        match self.depth_level {
            0 => false,
            1 => node.kind == NodeKind::Position,
            2 => node.kind != NodeKind::Entity,
            _ => true,
        }
    }

    pub fn visible_nodes(&self, graph: &DebateGraph) -> Vec<usize> {
        (0..graph.node_count())
            .filter(|&index| self.is_visible(graph, index))
            .collect()
    }

    /// Edge indices driving the simulation: both endpoints visible,
    /// cluster edges kept so the clustering pull stays anchored.
    pub fn sim_edges(&self, graph: &DebateGraph, visible: &HashSet<usize>) -> Vec<usize> {
        graph
            .edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| visible.contains(&edge.source) && visible.contains(&edge.target))
            .map(|(index, _)| index)
            .collect()
    }

    /// Edge indices to draw: the simulation set minus anything touching a
    /// cluster anchor, which renders as a hull instead.
    pub fn render_edges(&self, graph: &DebateGraph, visible: &HashSet<usize>) -> Vec<usize> {
        self.sim_edges(graph, visible)
            .into_iter()
            .filter(|&index| {
                let edge = &graph.edges[index];
                graph.kind(edge.source) != NodeKind::Cluster
                    && graph.kind(edge.target) != NodeKind::Cluster
            })
            .collect()
    }

    /// Drill-down toggle for a position or argument node below full
    /// depth. Opening reveals the node's direct children; closing removes
    /// them and, for a position, the entity grandchildren its arguments
    /// pulled in. Returns whether the reveal set changed.
    pub fn toggle_drill_down(&mut self, graph: &DebateGraph, index: usize) -> bool {
        if self.depth_level >= MAX_DEPTH_LEVEL {
            return false;
        }

        let (direct, grandchildren) = match graph.kind(index) {
            NodeKind::Position => {
                let arguments = graph.neighbors[index]
                    .iter()
                    .copied()
                    .filter(|&n| graph.kind(n).is_argument())
                    .collect::<Vec<_>>();
                let entities = arguments
                    .iter()
                    .flat_map(|&argument| graph.neighbors[argument].iter().copied())
                    .filter(|&n| graph.kind(n) == NodeKind::Entity)
                    .collect::<Vec<_>>();
                (arguments, entities)
            }
            kind if kind.is_argument() => {
                let entities = graph.neighbors[index]
                    .iter()
                    .copied()
                    .filter(|&n| graph.kind(n) == NodeKind::Entity)
                    .collect::<Vec<_>>();
                (entities, Vec::new())
            }
            _ => return false,
        };

        if direct.is_empty() {
            return false;
        }

        let branch_open = direct.iter().any(|child| self.revealed.contains(child));
        if branch_open {
            for child in direct.iter().chain(grandchildren.iter()) {
                self.revealed.remove(child);
            }
        } else {
            self.revealed.extend(direct.iter().copied());
        }
        true
    }

    /// A cluster's hull may not appear before its content: every
    /// argument-type member (or every member, for a cluster without
    /// arguments) must be at or before the timeline cursor.
    pub fn hull_visible(&self, graph: &DebateGraph, cluster: usize) -> bool {
        let members = graph.members_of(cluster);
        if members.is_empty() {
            return false;
        }

        let appeared = |&member: &usize| {
            graph.nodes[member]
                .timestamp
                .is_none_or(|ts| ts <= self.current_time)
        };

        let mut arguments = members
            .iter()
            .filter(|&&member| graph.kind(member).is_argument())
            .peekable();
        if arguments.peek().is_some() {
            arguments.all(|member| appeared(member))
        } else {
            members.iter().all(appeared)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::test_fixtures::{edge, node, small_debate};
    use crate::debate::{DebateGraph, RelationKind};

    fn scenario_graph() -> DebateGraph {
        // S - P1 - {A1, A2}, all at the same timestamp.
        let mut nodes = vec![
            node("s", NodeKind::Subject),
            node("p1", NodeKind::Position),
            node("a1", NodeKind::InFavor),
            node("a2", NodeKind::Against),
        ];
        for n in &mut nodes {
            n.timestamp = Some(100);
        }
        let edges = vec![
            edge(0, 1, RelationKind::HasPosition),
            edge(1, 2, RelationKind::Structural),
            edge(1, 3, RelationKind::Structural),
        ];
        DebateGraph::new(nodes, edges)
    }

    fn visible_ids(state: &VisibilityState, graph: &DebateGraph) -> Vec<String> {
        let mut ids = state
            .visible_nodes(graph)
            .into_iter()
            .map(|index| graph.nodes[index].id.clone())
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    #[test]
    fn depth_tiers_disclose_structure() {
        let graph = scenario_graph();
        let mut state = VisibilityState::new(0, 100);
        assert_eq!(visible_ids(&state, &graph), ["s"]);

        state.set_depth_level(1);
        assert_eq!(visible_ids(&state, &graph), ["p1", "s"]);

        state.set_depth_level(2);
        assert_eq!(visible_ids(&state, &graph), ["a1", "a2", "p1", "s"]);
    }

    #[test]
    fn reveal_overrides_depth() {
        let graph = scenario_graph();
        let mut state = VisibilityState::new(1, 100);
        state.revealed.insert(2);
        assert_eq!(visible_ids(&state, &graph), ["a1", "p1", "s"]);
    }

    #[test]
    fn future_nodes_stay_hidden_even_when_revealed() {
        let mut graph = scenario_graph();
        graph.nodes[2].timestamp = Some(500);
        let mut state = VisibilityState::new(3, 100);
        state.revealed.insert(2);
        assert!(!state.is_visible(&graph, 2));
        // The subject ignores the time filter entirely.
        assert!(state.is_visible(&graph, 0));
    }

    #[test]
    fn visibility_is_monotone_in_time() {
        let mut graph = scenario_graph();
        graph.nodes[2].timestamp = Some(50);
        graph.nodes[3].timestamp = Some(150);

        let early = VisibilityState::new(3, 60);
        let late = VisibilityState::new(3, 200);
        let early_set = early.visible_nodes(&graph);
        let late_set: HashSet<usize> = late.visible_nodes(&graph).into_iter().collect();
        assert!(early_set.iter().all(|index| late_set.contains(index)));
        assert!(late_set.len() > early_set.len());
    }

    #[test]
    fn depth_levels_are_nested() {
        let graph = small_debate();
        for level in 0..MAX_DEPTH_LEVEL {
            let narrow = VisibilityState::new(level, i64::MAX);
            let wide = VisibilityState::new(level + 1, i64::MAX);
            let wide_set: HashSet<usize> = wide.visible_nodes(&graph).into_iter().collect();
            assert!(
                narrow
                    .visible_nodes(&graph)
                    .iter()
                    .all(|index| wide_set.contains(index))
            );
        }
    }

    #[test]
    fn sim_edges_keep_clusters_render_edges_drop_them() {
        let graph = small_debate();
        let state = VisibilityState::new(3, i64::MAX);
        let visible: HashSet<usize> = state.visible_nodes(&graph).into_iter().collect();

        let sim = state.sim_edges(&graph, &visible);
        let render = state.render_edges(&graph, &visible);
        assert_eq!(sim.len(), graph.edges.len());
        assert_eq!(render.len(), graph.edges.len() - 2);
    }

    #[test]
    fn drill_down_toggle_is_idempotent() {
        let graph = scenario_graph();
        let mut state = VisibilityState::new(1, 100);
        let p1 = graph.index_by_id["p1"];

        assert!(state.toggle_drill_down(&graph, p1));
        assert_eq!(visible_ids(&state, &graph), ["a1", "a2", "p1", "s"]);

        assert!(state.toggle_drill_down(&graph, p1));
        assert_eq!(visible_ids(&state, &graph), ["p1", "s"]);
    }

    #[test]
    fn closing_a_position_also_closes_revealed_entities() {
        let graph = small_debate();
        let mut state = VisibilityState::new(1, i64::MAX);
        let p1 = graph.index_by_id["p1"];
        let a1 = graph.index_by_id["a1"];
        let e = graph.index_by_id["e"];

        state.toggle_drill_down(&graph, p1);
        // Drilling into the argument reveals its keyword.
        state.toggle_drill_down(&graph, a1);
        assert!(state.revealed.contains(&e));

        state.toggle_drill_down(&graph, p1);
        assert!(!state.revealed.contains(&e));
        assert!(!state.revealed.contains(&a1));
    }

    #[test]
    fn hull_waits_for_all_argument_members() {
        let mut graph = small_debate();
        let cluster = graph.index_by_id["c"];
        let a1 = graph.index_by_id["a1"];
        let a2 = graph.index_by_id["a2"];
        graph.nodes[a1].timestamp = Some(5);
        graph.nodes[a2].timestamp = Some(10);

        let mut state = VisibilityState::new(3, 7);
        assert!(!state.hull_visible(&graph, cluster));
        state.current_time = 10;
        assert!(state.hull_visible(&graph, cluster));
    }
}
