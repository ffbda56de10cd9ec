mod forces;
mod geometry;
mod highlight;
mod quadtree;
mod sim;
mod visibility;

use std::collections::{HashMap, HashSet};

use eframe::egui::Vec2;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::debate::{DebateGraph, NodeKind, RelationKind};
use crate::util::{stable_pair, truncate};

use forces::{SimLink, center_strength, charge_strength, link_distance, link_strength};
pub use geometry::{convex_hull, hull_anchor, segment_intersection};
use geometry::{hull_refresh_interval, padded_extremal_points};
pub use highlight::{Highlight, HighlightProjection, SuggestedView, TutorialFocus};
use sim::{SimNodeParams, Simulation};
use visibility::VisibilityState;
pub use visibility::MAX_DEPTH_LEVEL;

const INITIAL_SPREAD: f32 = 300.0;

const DEPTH_ALPHA: f32 = 0.3;
const SCRUB_ALPHA: f32 = 0.1;
const RECENTER_ALPHA: f32 = 0.5;
const DRAG_ALPHA_TARGET: f32 = 0.3;
const ENTITY_OPEN_ALPHA: f32 = 0.1;
const ENTITY_CLOSE_ALPHA: f32 = 0.05;

const CLOSED_COLLISION_BUFFER: f32 = 6.0;
const OPEN_COLLISION_BUFFER: f32 = 12.0;
const EXTRA_COLLISION_CAP: f32 = 30.0;
pub const OPEN_LABEL_MAX_CHARS: usize = 180;

/// An edge ready to draw: endpoint indices plus its relation kind.
#[derive(Clone, Copy, Debug)]
pub struct RenderEdge {
    pub source: usize,
    pub target: usize,
    pub relation: RelationKind,
}

/// The layout-and-visibility core. Owns the graph, the force solver, the
/// disclosure state and the highlight overlay; collaborators drive it
/// through commands and read back positions, edges and hull polygons.
pub struct DebateEngine {
    graph: DebateGraph,
    sim: Simulation,
    visibility: VisibilityState,
    matcher: SkimMatcherV2,
    highlight: Option<Highlight>,
    projection: HighlightProjection,
    selected: Option<usize>,
    open_entities: HashSet<usize>,
    extra_collision: Vec<f32>,
    playing: bool,

    visible: Vec<usize>,
    visible_set: HashSet<usize>,
    render_edges: Vec<RenderEdge>,
    hulls: Vec<(usize, Vec<Vec2>)>,
    hulls_dirty: bool,
}

impl DebateEngine {
    pub fn new(graph: DebateGraph) -> Self {
        // Everything starts disclosed with the timeline at the end, so the
        // first frame shows the whole debate.
        let visibility = VisibilityState::new(MAX_DEPTH_LEVEL, graph.time_domain.1);

        let initial_positions = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                if graph.subject == Some(index) {
                    Vec2::ZERO
                } else {
                    let (x, y) = stable_pair(&node.id);
                    Vec2::new(x, y) * INITIAL_SPREAD
                }
            })
            .collect();

        let extra_collision = vec![0.0; graph.node_count()];
        let mut engine = Self {
            sim: Simulation::new(initial_positions),
            visibility,
            matcher: SkimMatcherV2::default(),
            highlight: None,
            projection: HighlightProjection::none(),
            selected: None,
            open_entities: HashSet::new(),
            extra_collision,
            playing: false,
            visible: Vec::new(),
            visible_set: HashSet::new(),
            render_edges: Vec::new(),
            hulls: Vec::new(),
            hulls_dirty: true,
            graph,
        };
        engine.recompute_visibility(1.0);
        engine
    }

    pub fn graph(&self) -> &DebateGraph {
        &self.graph
    }

    pub fn time_domain(&self) -> (i64, i64) {
        self.graph.time_domain
    }

    pub fn current_time(&self) -> i64 {
        self.visibility.current_time
    }

    pub fn depth_level(&self) -> u8 {
        self.visibility.depth_level
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn projection(&self) -> &HighlightProjection {
        &self.projection
    }

    pub fn active_highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn visible_nodes(&self) -> &[usize] {
        &self.visible
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible_set.contains(&index)
    }

    pub fn render_edges(&self) -> &[RenderEdge] {
        &self.render_edges
    }

    pub fn node_position(&self, index: usize) -> Vec2 {
        self.sim.position(index)
    }

    pub fn node_radius(&self, index: usize) -> f32 {
        self.graph.visual_radius(index)
    }

    pub fn is_entity_open(&self, index: usize) -> bool {
        self.open_entities.contains(&index)
    }

    pub fn is_pinned(&self, index: usize) -> bool {
        self.sim.is_pinned(index)
    }

    /// Current hull polygons, one per visible cluster that has appeared.
    pub fn hulls(&self) -> &[(usize, Vec<Vec2>)] {
        &self.hulls
    }

    /// Boundary point of a cluster's hull on the segment toward `anchor`,
    /// falling back to the cluster center when the hull is degenerate.
    pub fn hull_anchor_point(&self, cluster: usize, anchor: Vec2) -> Vec2 {
        let center = self.sim.position(cluster);
        let hull = self
            .hulls
            .iter()
            .find(|(index, _)| *index == cluster)
            .map(|(_, polygon)| polygon.as_slice())
            .unwrap_or(&[]);
        hull_anchor(hull, anchor, center)
    }

    // --- commands ---

    pub fn set_depth_level(&mut self, level: u8) {
        self.visibility.set_depth_level(level);
        self.selected = None;
        self.close_open_entities();
        self.recompute_visibility(DEPTH_ALPHA);
    }

    /// Adds or removes a single node from the reveal set.
    pub fn toggle_reveal(&mut self, index: usize) {
        if !self.visibility.revealed.remove(&index) {
            self.visibility.revealed.insert(index);
        }
        self.recompute_visibility(DEPTH_ALPHA);
    }

    pub fn set_current_time(&mut self, timestamp: i64) {
        if self.visibility.current_time == timestamp {
            return;
        }
        self.visibility.current_time = timestamp;
        self.recompute_visibility(SCRUB_ALPHA);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_highlight(&mut self, highlight: Option<Highlight>) {
        self.highlight = highlight;
        self.reproject_highlight();
    }

    pub fn select_node(&mut self, index: Option<usize>) {
        self.selected = index;
    }

    /// Full click behavior on a graph node: select it, fold any expanded
    /// keywords, drill into the branch below full depth, expand the
    /// keywords of an opened argument, and light up the neighborhood.
    pub fn click_node(&mut self, index: usize) {
        self.selected = Some(index);
        self.close_open_entities();

        let mut opening = true;
        if self.graph.kind(index).is_argument() {
            let entity_children = self.graph.neighbors[index]
                .iter()
                .any(|&n| self.graph.kind(n) == NodeKind::Entity);
            if entity_children {
                opening = !self.graph.neighbors[index]
                    .iter()
                    .filter(|&&n| self.graph.kind(n) == NodeKind::Entity)
                    .any(|n| self.visibility.revealed.contains(n));
            }
        }

        if self.visibility.toggle_drill_down(&self.graph, index) {
            self.recompute_visibility(DEPTH_ALPHA);
        }

        if self.graph.kind(index).is_argument() && opening {
            self.open_connected_entities(index);
        }

        self.set_highlight(Some(Highlight::Neighborhood(index)));
    }

    /// Clicking a cluster hull selects the anchor and lights its members.
    pub fn click_cluster(&mut self, cluster: usize) {
        self.selected = Some(cluster);
        self.close_open_entities();
        self.set_highlight(Some(Highlight::ClusterMembers(cluster)));
    }

    pub fn click_background(&mut self) {
        self.selected = None;
        self.close_open_entities();
        self.set_highlight(None);
    }

    pub fn begin_drag(&mut self, index: usize) {
        let position = self.sim.position(index);
        self.sim.pin(index, position);
        self.sim.set_alpha_target(DRAG_ALPHA_TARGET);
        self.sim.bump_alpha(DRAG_ALPHA_TARGET);
    }

    pub fn drag_to(&mut self, index: usize, position: Vec2) {
        self.sim.pin(index, position);
    }

    pub fn end_drag(&mut self, index: usize) {
        self.sim.set_alpha_target(0.0);
        self.sim.unpin(index);
    }

    pub fn pin_node(&mut self, index: usize, position: Vec2) {
        self.sim.pin(index, position);
    }

    pub fn unpin_node(&mut self, index: usize) {
        self.sim.unpin(index);
    }

    /// Moves the layout's centering target, re-energizing instead of
    /// snapping positions.
    pub fn set_center(&mut self, center: Vec2) {
        if (self.sim.center() - center).length_sq() < 1.0 {
            return;
        }
        self.sim.set_center(center);
        self.sim.bump_alpha(RECENTER_ALPHA);
    }

    // --- per-frame step ---

    /// One engine step: advance the solver if it still has energy, then
    /// refresh hull polygons at the energy-throttled cadence. Returns
    /// whether another frame is needed.
    pub fn tick(&mut self) -> bool {
        let hot = self.sim.is_hot();
        if hot {
            self.sim.tick();
        }

        let interval = hull_refresh_interval(self.sim.alpha(), self.playing);
        if self.hulls_dirty || (hot && self.sim.tick_count() % interval == 0) {
            self.rebuild_hulls();
            self.hulls_dirty = false;
        }

        hot
    }

    // --- internals ---

    fn close_open_entities(&mut self) {
        if self.open_entities.is_empty() {
            return;
        }
        for &entity in &self.open_entities {
            self.extra_collision[entity] = 0.0;
        }
        self.open_entities.clear();
        self.reseed_simulation();
        self.sim.bump_alpha(ENTITY_CLOSE_ALPHA);
    }

    fn open_connected_entities(&mut self, argument: usize) {
        let entities = self.graph.neighbors[argument]
            .iter()
            .copied()
            .filter(|&n| self.graph.kind(n) == NodeKind::Entity && self.visible_set.contains(&n))
            .collect::<Vec<_>>();
        if entities.is_empty() {
            return;
        }

        for entity in entities {
            self.open_entities.insert(entity);
            self.extra_collision[entity] = estimate_label_reserve(self.graph.display_title(entity));
        }
        self.reseed_simulation();
        self.sim.bump_alpha(ENTITY_OPEN_ALPHA);
    }

    fn reproject_highlight(&mut self) {
        self.projection = match &self.highlight {
            None => HighlightProjection::none(),
            Some(request) => {
                let matches = highlight::resolve(&self.graph, request, &self.matcher);
                if matches.is_empty() && matches!(request, Highlight::Focus(TutorialFocus::All)) {
                    HighlightProjection::none()
                } else {
                    HighlightProjection::from_matches(matches)
                }
            }
        };
    }

    /// Rebuilds the visible sets, reseeds the solver with them, bumps
    /// alpha, and reapplies the highlight so entering nodes inherit it.
    fn recompute_visibility(&mut self, alpha: f32) {
        self.visible = self.visibility.visible_nodes(&self.graph);
        self.visible_set = self.visible.iter().copied().collect();

        self.render_edges = self
            .visibility
            .render_edges(&self.graph, &self.visible_set)
            .into_iter()
            .map(|index| {
                let edge = &self.graph.edges[index];
                RenderEdge {
                    source: edge.source,
                    target: edge.target,
                    relation: edge.relation,
                }
            })
            .collect();

        let visible_set = &self.visible_set;
        let extra_collision = &mut self.extra_collision;
        self.open_entities.retain(|entity| {
            let keep = visible_set.contains(entity);
            if !keep {
                extra_collision[*entity] = 0.0;
            }
            keep
        });

        self.reseed_simulation();
        self.sim.bump_alpha(alpha);
        self.reproject_highlight();
        self.hulls_dirty = true;
    }

    fn reseed_simulation(&mut self) {
        let mut slot_of: HashMap<usize, usize> = HashMap::with_capacity(self.visible.len());
        let mut active = Vec::with_capacity(self.visible.len());
        for (slot, &index) in self.visible.iter().enumerate() {
            slot_of.insert(index, slot);
            let kind = self.graph.kind(index);
            let radius = if kind == NodeKind::Cluster {
                0.0
            } else {
                let buffer = if self.open_entities.contains(&index) {
                    OPEN_COLLISION_BUFFER
                } else {
                    CLOSED_COLLISION_BUFFER
                };
                self.graph.visual_radius(index) + buffer + self.extra_collision[index]
            };
            active.push(SimNodeParams {
                graph_index: index,
                radius,
                charge: charge_strength(kind),
                center_strength: center_strength(kind),
            });
        }

        let links = self
            .visibility
            .sim_edges(&self.graph, &self.visible_set)
            .into_iter()
            .map(|index| {
                let edge = &self.graph.edges[index];
                let entity_open = [edge.source, edge.target]
                    .into_iter()
                    .filter(|&n| self.graph.kind(n) == NodeKind::Entity)
                    .any(|n| self.open_entities.contains(&n));
                SimLink {
                    a: slot_of[&edge.source],
                    b: slot_of[&edge.target],
                    distance: link_distance(&self.graph, edge.source, edge.target, entity_open),
                    strength: link_strength(edge.relation),
                }
            })
            .collect();

        let mut cluster_pulls = Vec::new();
        for (slot, &index) in self.visible.iter().enumerate() {
            if let Some(cluster) = self.graph.cluster_of[index]
                && let Some(&anchor_slot) = slot_of.get(&cluster)
            {
                cluster_pulls.push((slot, anchor_slot));
            }
        }

        self.sim.reseed(active, links, cluster_pulls);
    }

    fn rebuild_hulls(&mut self) {
        let mut hulls = std::mem::take(&mut self.hulls);
        hulls.clear();

        let mut points = Vec::new();
        for (cluster, members) in &self.graph.cluster_members {
            if !self.visible_set.contains(cluster)
                || !self.visibility.hull_visible(&self.graph, *cluster)
            {
                continue;
            }

            points.clear();
            for &member in members {
                if !self.visible_set.contains(&member) {
                    continue;
                }
                padded_extremal_points(
                    self.sim.position(member),
                    self.graph.visual_radius(member),
                    &mut points,
                );
            }

            let polygon = convex_hull(&points);
            if !polygon.is_empty() {
                hulls.push((*cluster, polygon));
            }
        }

        self.hulls = hulls;
    }
}

/// Collision reserve for an expanded keyword label, from its character
/// count rather than measured text.
fn estimate_label_reserve(label: &str) -> f32 {
    let shown = truncate(label, OPEN_LABEL_MAX_CHARS);
    let estimated_width = shown.chars().count() as f32 * 7.0;
    ((estimated_width / 8.0).max(4.0) + 14.0).min(EXTRA_COLLISION_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::test_fixtures::small_debate;

    fn engine() -> DebateEngine {
        DebateEngine::new(small_debate())
    }

    #[test]
    fn starts_fully_disclosed_at_domain_end() {
        let engine = engine();
        assert_eq!(engine.depth_level(), MAX_DEPTH_LEVEL);
        assert_eq!(engine.visible_nodes().len(), engine.graph().node_count());
        assert_eq!(engine.current_time(), engine.time_domain().1);
    }

    #[test]
    fn depth_change_shrinks_visible_set_and_clears_selection() {
        let mut engine = engine();
        let p1 = engine.graph().index_by_id["p1"];
        engine.select_node(Some(p1));

        engine.set_depth_level(1);
        assert_eq!(engine.visible_nodes().len(), 2);
        assert!(engine.selected().is_none());
    }

    #[test]
    fn visibility_reseed_preserves_positions() {
        let mut engine = engine();
        for _ in 0..30 {
            engine.tick();
        }
        let p1 = engine.graph().index_by_id["p1"];
        let before = engine.node_position(p1);

        engine.set_depth_level(1);
        assert_eq!(engine.node_position(p1), before);
    }

    #[test]
    fn clicking_an_argument_opens_its_keywords() {
        let mut engine = engine();
        let a1 = engine.graph().index_by_id["a1"];
        let e = engine.graph().index_by_id["e"];

        engine.click_node(a1);
        assert!(engine.is_entity_open(e));
        assert!(engine.projection().is_active());
        assert!(engine.projection().node_matches(a1));

        engine.click_background();
        assert!(!engine.is_entity_open(e));
        assert!(!engine.projection().is_active());
    }

    #[test]
    fn drill_down_from_level_one_reveals_arguments() {
        let mut engine = engine();
        engine.set_depth_level(1);
        let p1 = engine.graph().index_by_id["p1"];

        engine.click_node(p1);
        let a1 = engine.graph().index_by_id["a1"];
        assert!(engine.is_visible(a1));

        engine.click_node(p1);
        assert!(!engine.is_visible(a1));
    }

    #[test]
    fn hulls_build_for_appeared_clusters() {
        let mut engine = engine();
        // Spread the members so the hull has area.
        let a1 = engine.graph().index_by_id["a1"];
        let a2 = engine.graph().index_by_id["a2"];
        engine.pin_node(a1, Vec2::new(-80.0, 0.0));
        engine.pin_node(a2, Vec2::new(80.0, 40.0));
        engine.tick();

        let cluster = engine.graph().index_by_id["c"];
        assert!(engine.hulls().iter().any(|(index, _)| *index == cluster));

        // The anchor query lands between an outside point and the center.
        let anchor = engine.hull_anchor_point(cluster, Vec2::new(1000.0, 0.0));
        assert!(anchor.x <= 1000.0);
    }

    #[test]
    fn entity_link_distance_reflects_open_state() {
        let mut engine = engine();
        let a1 = engine.graph().index_by_id["a1"];
        let e = engine.graph().index_by_id["e"];

        // Closed, degree 1: the keyword hugs its argument.
        assert_eq!(link_distance(engine.graph(), a1, e, false), 1.0);

        engine.click_node(a1);
        assert!(engine.is_entity_open(e));
        assert_eq!(link_distance(engine.graph(), a1, e, true), 100.0);
    }

    #[test]
    fn search_highlight_survives_visibility_changes() {
        let mut engine = engine();
        engine.set_highlight(Some(Highlight::Search("p1".into())));
        let p1 = engine.graph().index_by_id["p1"];
        assert!(engine.projection().node_matches(p1));

        // Entering and leaving nodes re-inherit the predicate.
        engine.set_depth_level(1);
        assert!(engine.projection().is_active());
        assert!(engine.projection().node_matches(p1));
    }

    #[test]
    fn toggle_reveal_overrides_depth_for_one_node() {
        let mut engine = engine();
        engine.set_depth_level(0);
        let p1 = engine.graph().index_by_id["p1"];
        assert!(!engine.is_visible(p1));

        engine.toggle_reveal(p1);
        assert!(engine.is_visible(p1));
        engine.toggle_reveal(p1);
        assert!(!engine.is_visible(p1));
    }

    #[test]
    fn recentering_reheats_a_settled_layout() {
        let mut engine = engine();
        for _ in 0..2000 {
            engine.tick();
        }
        assert!(!engine.tick());

        engine.set_center(Vec2::new(60.0, 0.0));
        assert!(engine.tick());
    }

    #[test]
    fn drag_holds_energy_until_release() {
        let mut engine = engine();
        let p1 = engine.graph().index_by_id["p1"];
        engine.begin_drag(p1);
        engine.drag_to(p1, Vec2::new(12.0, 34.0));
        engine.tick();
        assert_eq!(engine.node_position(p1), Vec2::new(12.0, 34.0));
        assert!(engine.is_pinned(p1));

        engine.end_drag(p1);
        assert!(!engine.is_pinned(p1));
    }
}
