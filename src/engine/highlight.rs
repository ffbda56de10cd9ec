use std::collections::HashSet;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::debate::{DebateGraph, NodeKind};

/// What the user asked to emphasize. Resolved against the graph into a
/// match set, then projected to opacities; never touches positions or
/// the visible set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Highlight {
    Search(String),
    Neighborhood(usize),
    ClusterMembers(usize),
    View(SuggestedView),
    Focus(TutorialFocus),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuggestedView {
    /// The position with the most attached arguments, plus its
    /// neighborhood.
    Contested,
    /// Positions connected to nothing but the subject.
    LoneVoices,
    /// Keywords bridging more than one contribution, plus their
    /// neighbors.
    SharedIdeas,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TutorialFocus {
    All,
    Subject,
    Positions,
    Arguments,
    Clusters,
    Entities,
    DegreeExtremes,
}

impl TutorialFocus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "SUBJECT" => Self::Subject,
            "POSITION" => Self::Positions,
            "INFAVOR_AGAINST" => Self::Arguments,
            "CLUSTER" => Self::Clusters,
            "ENTITY" => Self::Entities,
            "OUTDEGREE" => Self::DegreeExtremes,
            _ => Self::All,
        }
    }
}

/// Resolves a highlight request to the set of matching node indices.
/// `Focus(All)` means "nothing emphasized" and resolves to an empty set;
/// callers treat that as clearing the overlay.
pub fn resolve(graph: &DebateGraph, highlight: &Highlight, matcher: &SkimMatcherV2) -> HashSet<usize> {
    match highlight {
        Highlight::Search(query) => resolve_search(graph, query, matcher),
        Highlight::Neighborhood(index) => {
            let mut matches: HashSet<usize> = graph.neighbors[*index].iter().copied().collect();
            matches.insert(*index);
            matches
        }
        Highlight::ClusterMembers(cluster) => graph.members_of(*cluster).iter().copied().collect(),
        Highlight::View(view) => resolve_view(graph, *view),
        Highlight::Focus(focus) => resolve_focus(graph, *focus),
    }
}

fn resolve_search(graph: &DebateGraph, query: &str, matcher: &SkimMatcherV2) -> HashSet<usize> {
    let query = query.trim();
    if query.is_empty() {
        return HashSet::new();
    }

    (0..graph.node_count())
        .filter(|&index| {
            let node = &graph.nodes[index];
            matcher.fuzzy_match(&node.title, query).is_some()
                || matcher.fuzzy_match(&node.text, query).is_some()
                || matcher.fuzzy_match(&node.value, query).is_some()
                || matcher.fuzzy_match(node.kind.label(), query).is_some()
        })
        .collect()
}

fn resolve_view(graph: &DebateGraph, view: SuggestedView) -> HashSet<usize> {
    let mut matches = HashSet::new();
    match view {
        SuggestedView::Contested => {
            let most_contested = (0..graph.node_count())
                .filter(|&index| graph.kind(index) == NodeKind::Position)
                .max_by_key(|&index| {
                    graph.neighbors[index]
                        .iter()
                        .filter(|&&n| graph.kind(n).is_argument())
                        .count()
                });
            if let Some(position) = most_contested {
                matches.insert(position);
                matches.extend(graph.neighbors[position].iter().copied());
            }
        }
        SuggestedView::LoneVoices => {
            for index in 0..graph.node_count() {
                if graph.kind(index) == NodeKind::Position && graph.nodes[index].degree <= 1 {
                    matches.insert(index);
                }
            }
        }
        SuggestedView::SharedIdeas => {
            for index in 0..graph.node_count() {
                if graph.kind(index) == NodeKind::Entity && graph.nodes[index].degree > 1 {
                    matches.insert(index);
                    matches.extend(graph.neighbors[index].iter().copied());
                }
            }
        }
    }
    matches
}

fn resolve_focus(graph: &DebateGraph, focus: TutorialFocus) -> HashSet<usize> {
    let mut matches = HashSet::new();
    let by_kind = |matches: &mut HashSet<usize>, keep: &dyn Fn(NodeKind) -> bool| {
        for index in 0..graph.node_count() {
            if keep(graph.kind(index)) {
                matches.insert(index);
            }
        }
    };

    match focus {
        TutorialFocus::All => {}
        TutorialFocus::Subject => by_kind(&mut matches, &|k| k == NodeKind::Subject),
        // Structural parents stay lit so the connections read.
        TutorialFocus::Positions => by_kind(&mut matches, &|k| {
            matches!(k, NodeKind::Subject | NodeKind::Position)
        }),
        TutorialFocus::Arguments => by_kind(&mut matches, &|k| {
            matches!(k, NodeKind::Subject | NodeKind::Position) || k.is_argument()
        }),
        TutorialFocus::Clusters => by_kind(&mut matches, &|k| k == NodeKind::Cluster),
        TutorialFocus::Entities => by_kind(&mut matches, &|k| k == NodeKind::Entity),
        TutorialFocus::DegreeExtremes => {
            let mut positions = (0..graph.node_count())
                .filter(|&index| graph.kind(index) == NodeKind::Position)
                .collect::<Vec<_>>();
            positions.sort_by_key(|&index| std::cmp::Reverse(graph.nodes[index].degree));
            if let Some(&largest) = positions.first() {
                matches.insert(largest);
            }
            if positions.len() > 1
                && let Some(&smallest) = positions.last()
            {
                matches.insert(smallest);
            }
        }
    }
    matches
}

/// The resolved overlay: either no emphasis (resting opacities) or a
/// match set dimming everything outside it.
#[derive(Clone, Debug, Default)]
pub struct HighlightProjection {
    matches: Option<HashSet<usize>>,
}

impl HighlightProjection {
    pub fn none() -> Self {
        Self { matches: None }
    }

    pub fn from_matches(matches: HashSet<usize>) -> Self {
        Self {
            matches: Some(matches),
        }
    }

    pub fn is_active(&self) -> bool {
        self.matches.is_some()
    }

    pub fn node_matches(&self, index: usize) -> bool {
        self.matches
            .as_ref()
            .is_none_or(|matches| matches.contains(&index))
    }

    /// (fill, stroke) opacity for a node shape.
    pub fn node_opacity(&self, index: usize) -> (f32, f32) {
        match &self.matches {
            None => (1.0, 1.0),
            Some(matches) if matches.contains(&index) => (1.0, 1.0),
            Some(_) => (0.15, 0.1),
        }
    }

    pub fn label_opacity(&self, index: usize) -> f32 {
        if self.node_matches(index) { 1.0 } else { 0.1 }
    }

    /// An edge reads as active only when both endpoints match; a partial
    /// match nearly vanishes. Keyword edges always render fainter than
    /// structural ones.
    pub fn edge_opacity(&self, graph: &DebateGraph, source: usize, target: usize) -> f32 {
        let entity_edge = graph.kind(source) == NodeKind::Entity
            || graph.kind(target) == NodeKind::Entity;
        match &self.matches {
            None => {
                if entity_edge {
                    0.25
                } else {
                    0.6
                }
            }
            Some(matches) if matches.contains(&source) && matches.contains(&target) => {
                if entity_edge {
                    0.4
                } else {
                    0.8
                }
            }
            Some(_) => 0.02,
        }
    }

    /// (fill, stroke) opacity for a cluster hull, keyed on the cluster
    /// anchor node.
    pub fn hull_opacity(&self, cluster: usize) -> (f32, f32) {
        match &self.matches {
            None => (0.25, 0.75),
            Some(matches) if matches.contains(&cluster) => (0.5, 1.0),
            Some(_) => (0.1, 0.2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::test_fixtures::small_debate;

    #[test]
    fn neighborhood_includes_node_and_neighbors() {
        let graph = small_debate();
        let matcher = SkimMatcherV2::default();
        let p1 = graph.index_by_id["p1"];
        let matches = resolve(&graph, &Highlight::Neighborhood(p1), &matcher);
        for id in ["p1", "s", "a1", "a2"] {
            assert!(matches.contains(&graph.index_by_id[id]));
        }
        assert!(!matches.contains(&graph.index_by_id["e"]));
    }

    #[test]
    fn contested_view_picks_busiest_position() {
        let graph = small_debate();
        let matcher = SkimMatcherV2::default();
        let matches = resolve(
            &graph,
            &Highlight::View(SuggestedView::Contested),
            &matcher,
        );
        let p1 = graph.index_by_id["p1"];
        assert!(matches.contains(&p1));
        assert!(matches.contains(&graph.index_by_id["a1"]));
        assert!(matches.contains(&graph.index_by_id["a2"]));
    }

    #[test]
    fn lone_voices_requires_structural_isolation() {
        let graph = small_debate();
        let matcher = SkimMatcherV2::default();
        // p1 has degree 3, so nothing qualifies.
        let matches = resolve(
            &graph,
            &Highlight::View(SuggestedView::LoneVoices),
            &matcher,
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn shared_ideas_requires_bridging_keywords() {
        let graph = small_debate();
        let matcher = SkimMatcherV2::default();
        // The fixture's keyword touches a single argument.
        let matches = resolve(
            &graph,
            &Highlight::View(SuggestedView::SharedIdeas),
            &matcher,
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn search_matches_titles_and_kind_labels() {
        let graph = small_debate();
        let matcher = SkimMatcherV2::default();
        let matches = resolve(&graph, &Highlight::Search("p1".into()), &matcher);
        assert!(matches.contains(&graph.index_by_id["p1"]));

        let matches = resolve(&graph, &Highlight::Search("KEYWORD".into()), &matcher);
        assert!(matches.contains(&graph.index_by_id["e"]));
    }

    #[test]
    fn partial_edge_match_dims_fully() {
        let graph = small_debate();
        let p1 = graph.index_by_id["p1"];
        let a1 = graph.index_by_id["a1"];
        let a2 = graph.index_by_id["a2"];

        let projection = HighlightProjection::from_matches([p1, a1].into_iter().collect());
        assert_eq!(projection.edge_opacity(&graph, p1, a1), 0.8);
        assert_eq!(projection.edge_opacity(&graph, p1, a2), 0.02);
    }

    #[test]
    fn resting_opacities_without_a_highlight() {
        let graph = small_debate();
        let projection = HighlightProjection::none();
        let a1 = graph.index_by_id["a1"];
        let e = graph.index_by_id["e"];
        let p1 = graph.index_by_id["p1"];

        assert_eq!(projection.node_opacity(a1), (1.0, 1.0));
        assert_eq!(projection.edge_opacity(&graph, p1, a1), 0.6);
        assert_eq!(projection.edge_opacity(&graph, a1, e), 0.25);
        assert_eq!(projection.hull_opacity(graph.index_by_id["c"]), (0.25, 0.75));
    }

    #[test]
    fn focus_parse_maps_known_kinds() {
        assert_eq!(TutorialFocus::parse("SUBJECT"), TutorialFocus::Subject);
        assert_eq!(TutorialFocus::parse("OUTDEGREE"), TutorialFocus::DegreeExtremes);
        assert_eq!(TutorialFocus::parse(""), TutorialFocus::All);
        assert_eq!(TutorialFocus::parse("ALL"), TutorialFocus::All);
    }
}
