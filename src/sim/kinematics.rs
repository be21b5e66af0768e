//! Distance kinematics: everything that turns "how far from the horizon"
//! into a speed, a draw scale or a horizontal position.
//!
//! ```text
//!   horizon_y ───────────── d = 0   far, small, slow
//!            \             /
//!             \           /
//!              \         /
//!   screen_h ─────────────── d = 1   near, big, fast
//! ```
use crate::config::ProjectionMode;

const MIN_OBSTACLE_SCALE: f32 = 0.2;
const MIN_SPEED_MULTIPLIER: f32 = 0.5;
const MIN_PROJECTILE_SCALE: f32 = 0.1;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Horizon {
    y: f32,
    screen_width: f32,
    screen_height: f32,
}

impl Horizon {
    /// TopDown has no horizon to speak of, the road starts at the top edge.
    pub fn new(
        mode: ProjectionMode,
        screen_width: f32,
        screen_height: f32,
        horizon_fraction: f32,
    ) -> Self {
        let y = match mode {
            ProjectionMode::Perspective => screen_height * horizon_fraction,
            ProjectionMode::TopDown => 0.0,
        };
        Horizon {
            y,
            screen_width,
            screen_height,
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn screen_height(&self) -> f32 {
        self.screen_height
    }

    /// Screen centre, where receding objects converge
    pub fn vanishing_x(&self) -> f32 {
        self.screen_width / 2.0
    }

    /// 0 at the horizon, 1 at the bottom of the screen, clamped either side
    pub fn normalized_distance(&self, y: f32) -> f32 {
        self.distance_between(y, self.screen_height)
    }

    /// Same law as `normalized_distance` but with `near_y` standing in for the
    /// viewer's edge. Projectiles measure from their launch point.
    pub fn distance_between(&self, y: f32, near_y: f32) -> f32 {
        let depth = near_y - self.y;
        if depth <= f32::EPSILON {
            return 1.0;
        }
        clamp_unit((y - self.y) / depth)
    }
}

fn clamp_unit(t: f32) -> f32 {
    if t.is_nan() {
        return 0.0;
    }
    t.clamp(0.0, 1.0)
}

/// 0.5x at the horizon up to 2.0x at the viewer
pub fn obstacle_speed_multiplier(distance: f32) -> f32 {
    MIN_SPEED_MULTIPLIER + clamp_unit(distance) * 1.5
}

pub fn obstacle_scale(distance: f32) -> f32 {
    MIN_OBSTACLE_SCALE + clamp_unit(distance) * 0.8
}

/// Shrinks while the projectile travels away from the viewer
pub fn projectile_scale(distance_to_horizon: f32) -> f32 {
    (clamp_unit(distance_to_horizon) * 0.5).max(MIN_PROJECTILE_SCALE)
}

/// `initial_x` when just fired (d = 1), `target_x` on reaching the horizon (d = 0)
pub fn projectile_x(initial_x: f32, target_x: f32, distance_to_horizon: f32) -> f32 {
    lerp(initial_x, target_x, 1.0 - clamp_unit(distance_to_horizon))
}

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

pub fn cubic_out(t: f32) -> f32 {
    let inverse = 1.0 - clamp_unit(t);
    1.0 - inverse * inverse * inverse
}

/// Mode aware wrappers. TopDown is the degenerate case of every law: unit
/// speed, unit scale, straight flight.
impl ProjectionMode {
    pub fn speed_multiplier(self, distance: f32) -> f32 {
        match self {
            ProjectionMode::Perspective => obstacle_speed_multiplier(distance),
            ProjectionMode::TopDown => 1.0,
        }
    }

    pub fn obstacle_scale(self, distance: f32) -> f32 {
        match self {
            ProjectionMode::Perspective => obstacle_scale(distance),
            ProjectionMode::TopDown => 1.0,
        }
    }

    pub fn projectile_scale(self, distance_to_horizon: f32) -> f32 {
        match self {
            ProjectionMode::Perspective => projectile_scale(distance_to_horizon),
            ProjectionMode::TopDown => 1.0,
        }
    }

    pub fn projectile_x(self, initial_x: f32, target_x: f32, distance_to_horizon: f32) -> f32 {
        match self {
            ProjectionMode::Perspective => projectile_x(initial_x, target_x, distance_to_horizon),
            ProjectionMode::TopDown => initial_x,
        }
    }

    /// Road band width factor: 30% at the horizon, 100% at the bottom
    pub fn road_width_factor(self, distance: f32) -> f32 {
        match self {
            ProjectionMode::Perspective => clamp_unit(distance) * 0.7 + 0.3,
            ProjectionMode::TopDown => 1.0,
        }
    }

    pub fn has_near_miss(self) -> bool {
        matches!(self, ProjectionMode::Perspective)
    }
}
