use crate::sim::entities::{EntityId, Obstacle, Projectile};
use crate::sim::kinematics::Horizon;
use crate::sim::Size;

/// Centre anchored axis aligned box
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub half_width: f32,
    pub half_height: f32,
}

impl Aabb {
    pub fn centered(x: f32, y: f32, size: Size) -> Self {
        Aabb {
            x,
            y,
            half_width: size.width / 2.0,
            half_height: size.height / 2.0,
        }
    }

    /// touching edges count as overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        (self.x - other.x).abs() <= self.half_width + other.half_width
            && (self.y - other.y).abs() <= self.half_height + other.half_height
    }
}

/// What the policy needs to know about the player this frame
#[derive(Debug, Copy, Clone)]
pub struct PlayerProbe {
    pub x: f32,
    pub y: f32,
    /// lane nearest to where the player is drawn, mid lane change included
    pub lane: usize,
    /// lane the player is heading for, equal to `lane` when stable
    pub target_lane: usize,
    pub size: Size,
}

/// First obstacle sharing the player's occupied lane and overlapping
/// vertically.
pub fn player_hit(player: &PlayerProbe, obstacles: &[Obstacle]) -> Option<EntityId> {
    obstacles
        .iter()
        .find(|obstacle| {
            obstacle.lane() == player.lane
                && (obstacle.y - player.y).abs()
                    <= (player.size.height + obstacle.hitbox.height) / 2.0
        })
        .map(Obstacle::id)
}

/// Pairs of (projectile, obstacle) that overlap. A projectile takes out at
/// most one obstacle and an obstacle absorbs at most one projectile.
pub fn projectile_hits(
    projectiles: &[Projectile],
    obstacles: &[Obstacle],
    projectile_size: f32,
) -> Vec<(EntityId, EntityId)> {
    let mut hits: Vec<(EntityId, EntityId)> = Vec::new();
    for projectile in projectiles {
        let shot = Aabb::centered(projectile.x, projectile.y, projectile.size(projectile_size));
        let target = obstacles.iter().find(|obstacle| {
            !hits.iter().any(|(_, taken)| *taken == obstacle.id())
                && shot.overlaps(&Aabb::centered(obstacle.x, obstacle.y, obstacle.hitbox))
        });
        if let Some(obstacle) = target {
            hits.push((projectile.id(), obstacle.id()));
        }
    }
    hits
}

#[derive(Debug, Copy, Clone)]
pub struct NearMissRule {
    /// normalized distance at or beyond which an obstacle counts as close
    pub min_distance: f32,
    /// max vertical separation, as a fraction of character height
    pub window: f32,
}

/// Marks and returns obstacles that just slipped past in an adjacent lane.
/// Once marked an obstacle never triggers again. An obstacle in the lane the
/// player is steering into is a collision in the making, not a near miss.
pub fn near_misses(
    player: &PlayerProbe,
    obstacles: &mut [Obstacle],
    horizon: &Horizon,
    rule: NearMissRule,
) -> Vec<EntityId> {
    let max_separation = player.size.height * rule.window;
    let mut triggered = Vec::new();
    for obstacle in obstacles.iter_mut() {
        if obstacle.near_miss_triggered {
            continue;
        }
        let adjacent = obstacle.lane().abs_diff(player.lane) == 1
            && obstacle.lane() != player.target_lane;
        let close = horizon.normalized_distance(obstacle.y) >= rule.min_distance;
        let level = (obstacle.y - player.y).abs() <= max_separation;
        if adjacent && close && level {
            obstacle.near_miss_triggered = true;
            triggered.push(obstacle.id());
        }
    }
    triggered
}
