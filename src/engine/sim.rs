use eframe::egui::Vec2;

use super::forces::{
    COLLISION_ITERATIONS, COLLISION_STRENGTH, CollisionParams, SimLink, accumulate_charge,
    accumulate_collision_pairs, apply_cluster_pull, apply_links,
};
use super::quadtree::QuadNode;

const ALPHA_DECAY: f32 = 0.01;
const ALPHA_MIN: f32 = 0.001;
// d3 velocityDecay 0.4.
const VELOCITY_RETAIN: f32 = 0.6;
const BARNES_HUT_THETA: f32 = 0.72;

/// Per-node force parameters for one seeding of the active set. Slots in
/// `SimLink` and cluster pulls index into this list, not the graph.
#[derive(Clone, Copy, Debug)]
pub struct SimNodeParams {
    pub graph_index: usize,
    pub radius: f32,
    pub charge: f32,
    pub center_strength: f32,
}

/// Position, velocity and pin state for one graph node. Bodies persist
/// across reseeds so nodes re-entering visibility resume where they left.
#[derive(Clone, Copy, Debug)]
struct Body {
    pos: Vec2,
    vel: Vec2,
    pin: Option<Vec2>,
}

#[derive(Default)]
struct SimScratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    predicted: Vec<Vec2>,
    radii: Vec<f32>,
    charges: Vec<f32>,
}

/// The force solver. Owns every node's position and velocity; everything
/// else reads them through queries after a tick completes.
pub struct Simulation {
    bodies: Vec<Body>,
    active: Vec<SimNodeParams>,
    links: Vec<SimLink>,
    link_counts: Vec<u32>,
    cluster_pulls: Vec<(usize, usize)>,
    alpha: f32,
    alpha_target: f32,
    center: Vec2,
    tick_count: u64,
    scratch: SimScratch,
}

impl Simulation {
    pub fn new(initial_positions: Vec<Vec2>) -> Self {
        let bodies = initial_positions
            .into_iter()
            .map(|pos| Body {
                pos,
                vel: Vec2::ZERO,
                pin: None,
            })
            .collect();

        Self {
            bodies,
            active: Vec::new(),
            links: Vec::new(),
            link_counts: Vec::new(),
            cluster_pulls: Vec::new(),
            alpha: 1.0,
            alpha_target: 0.0,
            center: Vec2::ZERO,
            tick_count: 0,
            scratch: SimScratch::default(),
        }
    }

    /// Replaces the active node/link sets. Body state carries over, so
    /// surviving nodes keep their positions and momenta.
    pub fn reseed(
        &mut self,
        active: Vec<SimNodeParams>,
        links: Vec<SimLink>,
        cluster_pulls: Vec<(usize, usize)>,
    ) {
        self.link_counts.clear();
        self.link_counts.resize(active.len(), 0);
        for link in &links {
            self.link_counts[link.a] += 1;
            self.link_counts[link.b] += 1;
        }

        self.active = active;
        self.links = links;
        self.cluster_pulls = cluster_pulls;
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Re-energizes the solver, like d3's `alpha(x).restart()`. Never
    /// cools below the current temperature.
    pub fn bump_alpha(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }

    /// Held energy floor for the duration of a drag.
    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target;
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn position(&self, graph_index: usize) -> Vec2 {
        self.bodies[graph_index].pos
    }

    pub fn pin(&mut self, graph_index: usize, pos: Vec2) {
        let body = &mut self.bodies[graph_index];
        body.pin = Some(pos);
        body.pos = pos;
        body.vel = Vec2::ZERO;
    }

    pub fn unpin(&mut self, graph_index: usize) {
        self.bodies[graph_index].pin = None;
    }

    pub fn is_pinned(&self, graph_index: usize) -> bool {
        self.bodies[graph_index].pin.is_some()
    }

    /// Whether the solver still carries enough energy to keep ticking.
    pub fn is_hot(&self) -> bool {
        self.alpha >= ALPHA_MIN || self.alpha_target >= ALPHA_MIN
    }

    /// One solver step: cool alpha, run the forces in a fixed order
    /// (links, charge, centering, collision, cluster pull), then decay
    /// velocities and integrate. Pinned bodies hold their position.
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
        self.tick_count += 1;

        let count = self.active.len();
        if count == 0 {
            return;
        }

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        scratch.radii.clear();
        scratch.charges.clear();
        let mut max_radius = 0.0_f32;
        for params in &self.active {
            let body = &self.bodies[params.graph_index];
            scratch.positions.push(body.pos);
            scratch.velocities.push(body.vel);
            scratch.radii.push(params.radius);
            scratch.charges.push(params.charge);
            max_radius = max_radius.max(params.radius);
        }

        apply_links(
            &self.links,
            &self.link_counts,
            &scratch.positions,
            &mut scratch.velocities,
            self.alpha,
        );

        if let Some(tree) = QuadNode::build(&scratch.positions, &scratch.charges) {
            for (slot, velocity) in scratch.velocities.iter_mut().enumerate() {
                accumulate_charge(
                    &tree,
                    slot,
                    &scratch.positions,
                    &scratch.charges,
                    self.alpha,
                    BARNES_HUT_THETA,
                    velocity,
                );
            }
        }

        for (slot, params) in self.active.iter().enumerate() {
            let pull = (self.center - scratch.positions[slot]) * params.center_strength * self.alpha;
            scratch.velocities[slot] += pull;
        }

        if max_radius > 0.0 {
            let max_distance = max_radius * 2.0;
            let params = CollisionParams {
                strength: COLLISION_STRENGTH,
                max_distance_sq: max_distance * max_distance,
            };
            for _ in 0..COLLISION_ITERATIONS {
                scratch.predicted.clear();
                for slot in 0..count {
                    scratch
                        .predicted
                        .push(scratch.positions[slot] + scratch.velocities[slot]);
                }
                let Some(tree) = QuadNode::build(&scratch.predicted, &scratch.radii) else {
                    break;
                };
                accumulate_collision_pairs(
                    &tree,
                    &tree,
                    true,
                    &scratch.predicted,
                    &scratch.radii,
                    params,
                    &mut scratch.velocities,
                );
            }
        }

        apply_cluster_pull(
            &self.cluster_pulls,
            &scratch.positions,
            &mut scratch.velocities,
            self.alpha,
        );

        for (slot, params) in self.active.iter().enumerate() {
            let body = &mut self.bodies[params.graph_index];
            if let Some(pin) = body.pin {
                body.pos = pin;
                body.vel = Vec2::ZERO;
                continue;
            }
            body.vel = scratch.velocities[slot] * VELOCITY_RETAIN;
            body.pos += body.vel;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::vec2;

    fn params(graph_index: usize) -> SimNodeParams {
        SimNodeParams {
            graph_index,
            radius: 10.0,
            charge: -300.0,
            center_strength: 0.05,
        }
    }

    #[test]
    fn alpha_cools_toward_target() {
        let mut sim = Simulation::new(vec![vec2(0.0, 0.0)]);
        sim.reseed(vec![params(0)], Vec::new(), Vec::new());
        let before = sim.alpha();
        sim.tick();
        assert!(sim.alpha() < before);

        sim.set_alpha_target(0.3);
        for _ in 0..2000 {
            sim.tick();
        }
        assert!((sim.alpha() - 0.3).abs() < 0.01);
    }

    #[test]
    fn pinned_body_holds_position() {
        let mut sim = Simulation::new(vec![vec2(0.0, 0.0), vec2(5.0, 0.0)]);
        sim.reseed(
            vec![params(0), params(1)],
            vec![SimLink {
                a: 0,
                b: 1,
                distance: 100.0,
                strength: 0.7,
            }],
            Vec::new(),
        );
        sim.pin(0, vec2(42.0, 7.0));
        for _ in 0..50 {
            sim.tick();
        }
        assert_eq!(sim.position(0), vec2(42.0, 7.0));
        assert!(sim.position(1) != vec2(5.0, 0.0));
    }

    #[test]
    fn linked_pair_relaxes_toward_resting_distance() {
        let mut sim = Simulation::new(vec![vec2(-5.0, 0.0), vec2(5.0, 0.0)]);
        sim.reseed(
            vec![params(0), params(1)],
            vec![SimLink {
                a: 0,
                b: 1,
                distance: 120.0,
                strength: 0.7,
            }],
            Vec::new(),
        );
        let initial_gap = (sim.position(1) - sim.position(0)).length();
        for _ in 0..600 {
            sim.tick();
        }
        let settled_gap = (sim.position(1) - sim.position(0)).length();
        assert!((settled_gap - 120.0).abs() < (initial_gap - 120.0).abs());
    }

    #[test]
    fn reseed_preserves_surviving_positions() {
        let mut sim = Simulation::new(vec![vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(0.0, 10.0)]);
        sim.reseed(vec![params(0), params(1), params(2)], Vec::new(), Vec::new());
        sim.pin(1, vec2(77.0, -3.0));
        sim.unpin(1);
        sim.reseed(vec![params(0), params(1)], Vec::new(), Vec::new());
        assert_eq!(sim.position(1), vec2(77.0, -3.0));
    }

    #[test]
    fn cluster_pull_draws_member_inward() {
        let mut sim = Simulation::new(vec![vec2(0.0, 0.0), vec2(200.0, 0.0)]);
        sim.reseed(
            vec![
                SimNodeParams {
                    graph_index: 0,
                    radius: 0.0,
                    charge: 0.0,
                    center_strength: 0.0,
                },
                SimNodeParams {
                    graph_index: 1,
                    radius: 0.0,
                    charge: 0.0,
                    center_strength: 0.0,
                },
            ],
            Vec::new(),
            vec![(1, 0)],
        );
        sim.bump_alpha(1.0);
        for _ in 0..20 {
            sim.tick();
        }
        assert!(sim.position(1).x < 200.0);
    }
}
