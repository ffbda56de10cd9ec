use eframe::egui::{Vec2, vec2};

pub const HULL_PADDING: f32 = 20.0;

/// Four extremal points around a member node, pushed out by its radius
/// plus the hull padding. Sampling the extremes instead of the bare
/// center keeps the hull outside the rendered shape.
pub fn padded_extremal_points(center: Vec2, radius: f32, out: &mut Vec<Vec2>) {
    let offset = radius + HULL_PADDING;
    out.push(center + vec2(-offset, 0.0));
    out.push(center + vec2(offset, 0.0));
    out.push(center + vec2(0.0, -offset));
    out.push(center + vec2(0.0, offset));
}

fn cross(origin: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a.x - origin.x) * (b.y - origin.y) - (a.y - origin.y) * (b.x - origin.x)
}

/// Monotone-chain convex hull, counter-clockwise. Fewer than 3 distinct
/// points yield an empty polygon, which renders as "no hull".
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup_by(|a, b| (*a - *b).length_sq() < 1e-10);

    if sorted.len() < 3 {
        return Vec::new();
    }

    let mut hull: Vec<Vec2> = Vec::with_capacity(sorted.len() * 2);
    for &point in sorted.iter().chain(sorted.iter().rev().skip(1)) {
        while hull.len() >= 2
            && cross(hull[hull.len() - 2], hull[hull.len() - 1], point) <= 0.0
        {
            hull.pop();
        }
        hull.push(point);
    }
    hull.pop();

    if hull.len() < 3 { Vec::new() } else { hull }
}

/// Intersection point of segments [a1, a2] and [b1, b2], if any.
pub fn segment_intersection(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<Vec2> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denominator = r.x * s.y - r.y * s.x;
    if denominator.abs() < 1e-10 {
        return None;
    }

    let delta = b1 - a1;
    let t = (delta.x * s.y - delta.y * s.x) / denominator;
    let u = (delta.x * r.y - delta.y * r.x) / denominator;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a1 + r * t)
    } else {
        None
    }
}

/// Where the segment from `anchor` to the cluster's `center` crosses the
/// hull boundary, taking the crossing closest to the anchor. Degenerate
/// hulls fall back to the center itself.
pub fn hull_anchor(hull: &[Vec2], anchor: Vec2, center: Vec2) -> Vec2 {
    if hull.len() < 3 {
        return center;
    }

    let mut best: Option<(f32, Vec2)> = None;
    for index in 0..hull.len() {
        let edge_start = hull[index];
        let edge_end = hull[(index + 1) % hull.len()];
        if let Some(hit) = segment_intersection(anchor, center, edge_start, edge_end) {
            let distance_sq = (hit - anchor).length_sq();
            if best.is_none_or(|(best_distance, _)| distance_sq < best_distance) {
                best = Some((distance_sq, hit));
            }
        }
    }

    best.map(|(_, hit)| hit).unwrap_or(center)
}

/// How many ticks to wait between hull recomputations: every tick while
/// the layout is hot or playback is scrubbing, sparser as it settles.
pub fn hull_refresh_interval(alpha: f32, playing: bool) -> u64 {
    if playing || alpha > 0.1 {
        1
    } else if alpha > 0.05 {
        2
    } else if alpha > 0.02 {
        4
    } else {
        12
    }
}
