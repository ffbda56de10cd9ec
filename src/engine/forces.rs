use eframe::egui::{Vec2, vec2};

use crate::debate::{DebateGraph, NodeKind, RelationKind};

use super::quadtree::QuadNode;

pub(super) const CHARGE_DISTANCE_MAX: f32 = 500.0;
pub(super) const COLLISION_STRENGTH: f32 = 0.2;
pub(super) const COLLISION_ITERATIONS: usize = 4;
pub(super) const CLUSTER_PULL_STRENGTH: f32 = 20.0;

/// A spring between two slots of the active node list.
#[derive(Clone, Copy, Debug)]
pub struct SimLink {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
    pub strength: f32,
}

/// Resting length of an edge's spring, from the endpoint kinds.
///
/// Cluster-internal edges are near-zero so members huddle around their
/// anchor. Entity edges depend on whether the keyword is expanded and on
/// how many nodes share it. Subject-position spacing shrinks as the
/// position accrues arguments, pulling contested positions inward.
pub fn link_distance(graph: &DebateGraph, source: usize, target: usize, entity_open: bool) -> f32 {
    let source_kind = graph.kind(source);
    let target_kind = graph.kind(target);

    if source_kind == NodeKind::Cluster || target_kind == NodeKind::Cluster {
        return 15.0;
    }

    if source_kind == NodeKind::Entity || target_kind == NodeKind::Entity {
        let entity = if source_kind == NodeKind::Entity {
            source
        } else {
            target
        };
        if entity_open {
            return 100.0;
        }
        if graph.nodes[entity].degree == 1 {
            return 1.0;
        }
        return 35.0;
    }

    let radius_sum = graph.visual_radius(source) + graph.visual_radius(target);

    let subject_position = matches!(
        (source_kind, target_kind),
        (NodeKind::Subject, NodeKind::Position) | (NodeKind::Position, NodeKind::Subject)
    );
    if subject_position {
        let position = if source_kind == NodeKind::Position {
            source
        } else {
            target
        };
        let degree = graph.nodes[position].degree as f32;
        return (160.0 - degree * 15.0).max(60.0) + radius_sum;
    }

    100.0 + radius_sum
}

pub fn link_strength(relation: RelationKind) -> f32 {
    relation.strength()
}

/// Repulsion by kind. The subject clears space around itself, keywords
/// barely disturb the structure.
pub fn charge_strength(kind: NodeKind) -> f32 {
    match kind {
        NodeKind::Subject => -1000.0,
        NodeKind::Entity => -50.0,
        _ => -300.0,
    }
}

pub fn center_strength(kind: NodeKind) -> f32 {
    if kind == NodeKind::Subject { 0.5 } else { 0.05 }
}

fn jiggle(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Spring relaxation with degree-weighted bias: the busier endpoint moves
/// less, the way d3's link force distributes the correction.
pub(super) fn apply_links(
    links: &[SimLink],
    link_counts: &[u32],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    alpha: f32,
) {
    for link in links {
        let mut delta =
            (positions[link.b] + velocities[link.b]) - (positions[link.a] + velocities[link.a]);
        if delta.length_sq() < 1e-8 {
            delta = jiggle(link.a, link.b) * 1e-3;
        }
        let length = delta.length();
        let scale = (length - link.distance) / length * alpha * link.strength;
        let correction = delta * scale;

        let count_a = link_counts[link.a].max(1) as f32;
        let count_b = link_counts[link.b].max(1) as f32;
        let bias = count_a / (count_a + count_b);

        velocities[link.b] -= correction * bias;
        velocities[link.a] += correction * (1.0 - bias);
    }
}

/// Barnes-Hut accumulation of the many-body force for one slot. Signed
/// charges aggregate per cell; anything past the interaction cap is
/// ignored.
pub(super) fn accumulate_charge(
    node: &QuadNode,
    slot: usize,
    positions: &[Vec2],
    charges: &[f32],
    alpha: f32,
    theta: f32,
    velocity: &mut Vec2,
) {
    let point = positions[slot];
    let max_distance_sq = CHARGE_DISTANCE_MAX * CHARGE_DISTANCE_MAX;

    if node.is_leaf() {
        for &other in &node.indices {
            if other == slot {
                continue;
            }
            let mut delta = positions[other] - point;
            if delta.length_sq() < 1e-8 {
                delta = jiggle(slot, other) * 1e-3;
            }
            let distance_sq = delta.length_sq();
            if distance_sq > max_distance_sq {
                continue;
            }
            *velocity += delta * (charges[other] * alpha / distance_sq);
        }
        return;
    }

    let delta = node.center - point;
    let distance_sq = delta.length_sq().max(1e-4);
    let can_approximate = !node.bounds.contains(point)
        && (node.bounds.side_length() * node.bounds.side_length())
            < theta * theta * distance_sq;

    if can_approximate {
        if distance_sq <= max_distance_sq {
            *velocity += delta * (node.charge * alpha / distance_sq);
        }
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge(child, slot, positions, charges, alpha, theta, velocity);
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) max_distance_sq: f32,
}

/// Pairwise overlap resolution over the quadtree. Positions here are the
/// predicted positions (pos + vel); the push is applied to velocities,
/// split by squared-radius weight so small nodes yield first.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    velocities: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for i in 0..node_a.indices.len() {
                let from = node_a.indices[i];
                for j in (i + 1)..node_a.indices.len() {
                    collide_pair(from, node_a.indices[j], positions, radii, params, velocities);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    collide_pair(from, to, positions, radii, params, velocities);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_collision_pairs(
                child_a, child_a, true, positions, radii, params, velocities,
            );

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, velocities,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, velocities);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, velocities);
        }
    }
}

fn collide_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    velocities: &mut [Vec2],
) {
    let min_distance = radii[from] + radii[to];
    if min_distance <= 0.0 {
        return;
    }

    let mut delta = positions[from] - positions[to];
    if delta.length_sq() < 1e-8 {
        delta = jiggle(from, to) * 1e-3;
    }
    let distance = delta.length();
    if distance >= min_distance {
        return;
    }

    let push = (min_distance - distance) / distance * params.strength;
    let weight_from = radii[from] * radii[from];
    let weight_to = radii[to] * radii[to];
    let share = weight_to / (weight_from + weight_to);

    velocities[from] += delta * (push * share);
    velocities[to] -= delta * (push * (1.0 - share));
}

/// Pulls cluster members toward their anchor, fading quadratically with
/// alpha so settled layouts stop twitching.
pub(super) fn apply_cluster_pull(
    pulls: &[(usize, usize)],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    alpha: f32,
) {
    let force = CLUSTER_PULL_STRENGTH * alpha * alpha;
    for &(member, anchor) in pulls {
        let delta = positions[anchor] - positions[member];
        let distance = delta.length();
        if distance > 1.0 {
            velocities[member] += (delta / distance) * force;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::test_fixtures::small_debate;

    #[test]
    fn link_distance_by_kind() {
        let graph = small_debate();
        let s = graph.index_by_id["s"];
        let p1 = graph.index_by_id["p1"];
        let a1 = graph.index_by_id["a1"];
        let e = graph.index_by_id["e"];
        let c = graph.index_by_id["c"];

        assert_eq!(link_distance(&graph, c, a1, false), 15.0);
        // Singly-connected closed keyword sits right on its argument.
        assert_eq!(link_distance(&graph, a1, e, false), 1.0);
        assert_eq!(link_distance(&graph, a1, e, true), 100.0);

        // Subject-position: degree 3 -> max(60, 160 - 45) + radii.
        let expected = 115.0 + graph.visual_radius(s) + graph.visual_radius(p1);
        assert!((link_distance(&graph, s, p1, false) - expected).abs() < 1e-3);

        // Generic structural edge.
        let expected = 100.0 + graph.visual_radius(p1) + graph.visual_radius(a1);
        assert!((link_distance(&graph, p1, a1, false) - expected).abs() < 1e-3);
    }

    #[test]
    fn charge_and_center_by_kind() {
        assert_eq!(charge_strength(NodeKind::Subject), -1000.0);
        assert_eq!(charge_strength(NodeKind::Entity), -50.0);
        assert_eq!(charge_strength(NodeKind::Position), -300.0);
        assert_eq!(center_strength(NodeKind::Subject), 0.5);
        assert_eq!(center_strength(NodeKind::Against), 0.05);
    }

    #[test]
    fn overlapping_pair_pushes_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(5.0, 0.0)];
        let radii = vec![10.0, 10.0];
        let mut velocities = vec![Vec2::ZERO; 2];
        collide_pair(
            0,
            1,
            &positions,
            &radii,
            CollisionParams {
                strength: COLLISION_STRENGTH,
                max_distance_sq: f32::INFINITY,
            },
            &mut velocities,
        );
        assert!(velocities[0].x < 0.0);
        assert!(velocities[1].x > 0.0);
    }
}
