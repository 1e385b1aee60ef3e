//! Obstacle geometry and seeded layout generation

use rand::Rng;

use crate::config::SimConfig;
use crate::game::constants::obstacles::*;
use crate::game::state::Obstacle;
use crate::util::vec2::Vec2;

/// Result of a disc overlapping an obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing out of the obstacle
    pub normal: Vec2,
    /// Nearest position at which the disc no longer overlaps
    pub resolved: Vec2,
}

impl Obstacle {
    /// Distance from a point to the obstacle surface (0 when inside)
    pub fn distance_to(&self, point: Vec2) -> f32 {
        match *self {
            Obstacle::Rectangle { x, y, width, height } => {
                let closest = point.clamp(Vec2::new(x, y), Vec2::new(x + width, y + height));
                point.distance_to(closest)
            }
            Obstacle::Circle { x, y, radius } => {
                (point.distance_to(Vec2::new(x, y)) - radius).max(0.0)
            }
        }
    }

    /// Bounding circle (center, radius)
    pub fn bounds(&self) -> (Vec2, f32) {
        match *self {
            Obstacle::Rectangle { x, y, width, height } => (
                Vec2::new(x + width * 0.5, y + height * 0.5),
                Vec2::new(width, height).length() * 0.5,
            ),
            Obstacle::Circle { x, y, radius } => (Vec2::new(x, y), radius),
        }
    }

    /// True when the bounding circles are at least `gap` apart
    pub fn is_clear_of(&self, other: &Obstacle, gap: f32) -> bool {
        let (a, ra) = self.bounds();
        let (b, rb) = other.bounds();
        a.distance_to(b) >= ra + rb + gap
    }

    /// Test a disc against the obstacle, returning the push-out contact on overlap
    pub fn contact(&self, center: Vec2, radius: f32) -> Option<Contact> {
        match *self {
            Obstacle::Rectangle { x, y, width, height } => {
                rect_contact(x, y, width, height, center, radius)
            }
            Obstacle::Circle { x, y, radius: r } => circle_contact(Vec2::new(x, y), r, center, radius),
        }
    }
}

fn rect_contact(x: f32, y: f32, w: f32, h: f32, center: Vec2, radius: f32) -> Option<Contact> {
    let min = Vec2::new(x, y);
    let max = Vec2::new(x + w, y + h);
    let closest = center.clamp(min, max);
    let delta = center - closest;
    let dist_sq = delta.length_sq();

    if dist_sq > 0.0 {
        if dist_sq >= radius * radius {
            return None;
        }
        let normal = delta.normalize();
        return Some(Contact {
            normal,
            resolved: closest + normal * radius,
        });
    }

    // Center is inside the box: leave through the nearest edge
    let exits = [
        (center.x - min.x, Vec2::LEFT),
        (max.x - center.x, Vec2::RIGHT),
        (center.y - min.y, Vec2::UP),
        (max.y - center.y, Vec2::DOWN),
    ];
    let mut best = exits[0];
    for exit in &exits[1..] {
        if exit.0 < best.0 {
            best = *exit;
        }
    }
    let normal = best.1;
    let resolved = if normal == Vec2::LEFT {
        Vec2::new(min.x - radius, center.y)
    } else if normal == Vec2::RIGHT {
        Vec2::new(max.x + radius, center.y)
    } else if normal == Vec2::UP {
        Vec2::new(center.x, min.y - radius)
    } else {
        Vec2::new(center.x, max.y + radius)
    };
    Some(Contact { normal, resolved })
}

fn circle_contact(origin: Vec2, r: f32, center: Vec2, radius: f32) -> Option<Contact> {
    let min_dist = r + radius;
    let (dir, dist) = (center - origin).normalize_with_length();
    if dist >= min_dist {
        return None;
    }
    // Coincident centers have no direction; push out along +x
    let normal = if dist > 0.0 { dir } else { Vec2::RIGHT };
    Some(Contact {
        normal,
        resolved: origin + normal * min_dist,
    })
}

/// Generate a random obstacle layout that keeps clear of the canvas edge,
/// every spawn anchor and the obstacles already placed
pub fn generate<R: Rng>(config: &SimConfig, anchors: &[Vec2], rng: &mut R) -> Vec<Obstacle> {
    let mut obstacles = Vec::with_capacity(config.obstacle_count);

    for _ in 0..config.obstacle_count {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let candidate = if rng.gen_bool(0.5) {
                let width = rng.gen_range(RECT_MIN_SIDE..RECT_MAX_SIDE);
                let height = rng.gen_range(RECT_MIN_SIDE..RECT_MAX_SIDE);
                let max_x = config.width - EDGE_CLEARANCE - width;
                let max_y = config.height - EDGE_CLEARANCE - height;
                if max_x <= EDGE_CLEARANCE || max_y <= EDGE_CLEARANCE {
                    continue;
                }
                Obstacle::Rectangle {
                    x: rng.gen_range(EDGE_CLEARANCE..max_x),
                    y: rng.gen_range(EDGE_CLEARANCE..max_y),
                    width,
                    height,
                }
            } else {
                let radius = rng.gen_range(CIRCLE_MIN_RADIUS..CIRCLE_MAX_RADIUS);
                let lo = EDGE_CLEARANCE + radius;
                if config.width - lo <= lo || config.height - lo <= lo {
                    continue;
                }
                Obstacle::Circle {
                    x: rng.gen_range(lo..config.width - lo),
                    y: rng.gen_range(lo..config.height - lo),
                    radius,
                }
            };

            if anchors
                .iter()
                .all(|&anchor| candidate.distance_to(anchor) >= SPAWN_CLEARANCE)
                && obstacles.iter().all(|placed| candidate.is_clear_of(placed, MIN_GAP))
            {
                obstacles.push(candidate);
                break;
            }
        }
    }

    if obstacles.len() < config.obstacle_count {
        tracing::debug!(
            placed = obstacles.len(),
            requested = config.obstacle_count,
            "Obstacle layout ran out of placement attempts"
        );
    }

    obstacles
}
