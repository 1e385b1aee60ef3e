use crate::config::CursorConfig;
use crate::util::vec2::Vec2;

/// Per-tick movement command for one cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorCommand {
    /// Human input: direction vector, length clamped to 1
    Direction(Vec2),
    /// AI output: absolute target, normalized to [0, 1] of the canvas
    Target(Vec2),
}

/// Move a cursor one tick and clamp it inside the canvas minus its radius.
///
/// Non-finite commands leave the cursor where it is.
pub fn apply(
    cursor: Vec2,
    command: CursorCommand,
    config: &CursorConfig,
    width: f32,
    height: f32,
    dt: f32,
) -> Vec2 {
    let step = config.speed * dt;

    let moved = match command {
        CursorCommand::Direction(direction) => {
            if !(direction.x.is_finite() && direction.y.is_finite()) {
                return cursor;
            }
            cursor + direction.clamp_length(1.0) * step
        }
        CursorCommand::Target(normalized) => {
            if !(normalized.x.is_finite() && normalized.y.is_finite()) {
                return cursor;
            }
            let target = Vec2::new(
                normalized.x.clamp(0.0, 1.0) * width,
                normalized.y.clamp(0.0, 1.0) * height,
            );
            let (dir, dist) = (target - cursor).normalize_with_length();
            if dist <= step {
                target
            } else {
                cursor + dir * step
            }
        }
    };

    clamp_to_canvas(moved, config.radius, width, height)
}

#[inline]
pub fn clamp_to_canvas(position: Vec2, radius: f32, width: f32, height: f32) -> Vec2 {
    position.clamp(
        Vec2::new(radius, radius),
        Vec2::new(width - radius, height - radius),
    )
}
