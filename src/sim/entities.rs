use crate::config::{GameConfig, ProjectionMode};
use crate::sim::kinematics::Horizon;
use crate::sim::lanes::LaneLocator;
use crate::sim::Size;
use rand::Rng;

pub type EntityId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    id: EntityId,
    lane: usize,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub hitbox: Size,
    pub near_miss_triggered: bool,
}

impl Obstacle {
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// fixed at spawn
    pub fn lane(&self) -> usize {
        self.lane
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    id: EntityId,
    pub x: f32,
    pub y: f32,
    pub initial_x: f32,
    pub target_x: f32,
    pub origin_y: f32,
    pub scale: f32,
}

impl Projectile {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn size(&self, base: f32) -> Size {
        Size::new(base, base).scaled(self.scale)
    }
}

/// Everything `EntityManager` needs from the session, copied out of the
/// config once so the per frame calls stay short.
#[derive(Debug, Copy, Clone)]
pub struct EntityRules {
    pub mode: ProjectionMode,
    pub obstacle_speed: f32,
    pub obstacle_size: f32,
    pub spawn_interval_ms: f32,
    pub despawn_y: f32,
    pub projectile_speed: f32,
    pub fire_rate_ms: f64,
}

impl EntityRules {
    pub fn from_config(config: &GameConfig) -> Self {
        EntityRules {
            mode: config.projection,
            obstacle_speed: config.obstacle_speed,
            obstacle_size: config.obstacle_size,
            spawn_interval_ms: config.obstacle_spawn_interval_ms,
            despawn_y: config.screen_height + config.despawn_margin,
            projectile_speed: config.projectile_speed,
            fire_rate_ms: config.fire_rate_ms,
        }
    }
}

/// Obstacles that scrolled past the viewer this frame, without a collision
#[derive(Debug, Clone, PartialEq)]
pub struct Avoided {
    pub id: EntityId,
    pub lane: usize,
}

/// Owns the transient entities. Spawning, advancing and discarding all go
/// through here so lifecycle rules live in one place.
pub struct EntityManager {
    rules: EntityRules,
    obstacles: Vec<Obstacle>,
    projectiles: Vec<Projectile>,
    spawn_timer_ms: f32,
    last_fire_ms: Option<f64>,
    next_id: EntityId,
}

impl EntityManager {
    pub fn new(rules: EntityRules) -> Self {
        EntityManager {
            rules,
            obstacles: Vec::new(),
            projectiles: Vec::new(),
            spawn_timer_ms: 0.0,
            last_fire_ms: None,
            next_id: 0,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut [Obstacle] {
        &mut self.obstacles
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn last_fire_ms(&self) -> Option<f64> {
        self.last_fire_ms
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
        self.projectiles.clear();
        self.spawn_timer_ms = 0.0;
        self.last_fire_ms = None;
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Accumulates `delta_ms`, spawning one obstacle in a random lane each
    /// time the interval is exceeded.
    pub fn tick_spawner<R: Rng>(
        &mut self,
        delta_ms: f32,
        lanes: &LaneLocator,
        horizon: &Horizon,
        rng: &mut R,
    ) -> Option<EntityId> {
        self.spawn_timer_ms += delta_ms;
        if self.spawn_timer_ms <= self.rules.spawn_interval_ms {
            return None;
        }
        self.spawn_timer_ms = 0.0;
        let lane = rng.gen_range(0..lanes.lane_count());
        Some(self.spawn_obstacle(lane, lanes, horizon))
    }

    /// Places an obstacle on the horizon at its smallest size
    pub fn spawn_obstacle(&mut self, lane: usize, lanes: &LaneLocator, horizon: &Horizon) -> EntityId {
        let id = self.allocate_id();
        let scale = self.rules.mode.obstacle_scale(0.0);
        self.obstacles.push(Obstacle {
            id,
            lane,
            x: lanes.lane_position(lane),
            y: horizon.y(),
            scale,
            hitbox: Size::new(self.rules.obstacle_size, self.rules.obstacle_size).scaled(scale),
            near_miss_triggered: false,
        });
        id
    }

    /// Moves obstacles toward the viewer, faster the closer they are, and
    /// resizes sprite and hitbox together. Returns the ones that left the
    /// screen.
    pub fn advance_obstacles(&mut self, horizon: &Horizon) -> Vec<Avoided> {
        let rules = self.rules;
        for obstacle in self.obstacles.iter_mut() {
            let distance = horizon.normalized_distance(obstacle.y);
            obstacle.y += rules.obstacle_speed * rules.mode.speed_multiplier(distance);

            let distance = horizon.normalized_distance(obstacle.y);
            obstacle.scale = rules.mode.obstacle_scale(distance);
            obstacle.hitbox =
                Size::new(rules.obstacle_size, rules.obstacle_size).scaled(obstacle.scale);
        }

        let mut avoided = Vec::new();
        self.obstacles.retain(|obstacle| {
            if obstacle.y > rules.despawn_y {
                avoided.push(Avoided {
                    id: obstacle.id,
                    lane: obstacle.lane,
                });
                false
            } else {
                true
            }
        });
        avoided
    }

    /// Rate limited. A shot inside the cool down is a no-op, not an error.
    pub fn try_fire(&mut self, now_ms: f64, x: f32, y: f32, horizon: &Horizon) -> Option<EntityId> {
        if let Some(last) = self.last_fire_ms {
            if now_ms - last < self.rules.fire_rate_ms {
                return None;
            }
        }
        self.last_fire_ms = Some(now_ms);

        let id = self.allocate_id();
        let target_x = match self.rules.mode {
            ProjectionMode::Perspective => horizon.vanishing_x(),
            ProjectionMode::TopDown => x,
        };
        self.projectiles.push(Projectile {
            id,
            x,
            y,
            initial_x: x,
            target_x,
            origin_y: y,
            scale: self.rules.mode.projectile_scale(1.0),
        });
        Some(id)
    }

    /// Flies projectiles toward the horizon. Ones that reach it are dropped
    /// silently, returns how many.
    pub fn advance_projectiles(&mut self, horizon: &Horizon) -> usize {
        let mode = self.rules.mode;
        let speed = self.rules.projectile_speed;
        for projectile in self.projectiles.iter_mut() {
            projectile.y -= speed;
            let distance = horizon.distance_between(projectile.y, projectile.origin_y);
            projectile.x = mode.projectile_x(projectile.initial_x, projectile.target_x, distance);
            projectile.scale = mode.projectile_scale(distance);
        }

        let before = self.projectiles.len();
        let horizon_y = horizon.y();
        self.projectiles.retain(|projectile| projectile.y > horizon_y);
        before - self.projectiles.len()
    }

    pub fn remove_obstacle(&mut self, id: EntityId) -> Option<Obstacle> {
        let index = self.obstacles.iter().position(|o| o.id == id)?;
        Some(self.obstacles.remove(index))
    }

    pub fn remove_projectile(&mut self, id: EntityId) -> Option<Projectile> {
        let index = self.projectiles.iter().position(|p| p.id == id)?;
        Some(self.projectiles.remove(index))
    }
}
