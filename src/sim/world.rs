use crate::config::GameConfig;
use crate::sim::collision::{self, NearMissRule, PlayerProbe};
use crate::sim::entities::{EntityId, EntityManager, EntityRules};
use crate::sim::input::{Controls, InputSnapshot, Intents};
use crate::sim::kinematics::Horizon;
use crate::sim::lanes::{Direction, LaneLocator};
use crate::sim::player::{Handling, Player};
use crate::sim::road::RoadSegmenter;
use crate::sim::state::{
    Damage, GameState, AVOID_PROGRESS, AVOID_SCORE, HIT_PROGRESS, HIT_SCORE, NEAR_MISS_SCORE,
};
use crate::sim::Size;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Something that happened during a step. The host turns these into
/// effects and log lines; the core never draws or logs.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    MenuToggled { open: bool },
    Restarted,
    LaneChangeStarted { from_x: f32, y: f32, direction: Direction },
    Fired { id: EntityId, x: f32, y: f32 },
    ObstacleSpawned { id: EntityId, lane: usize },
    ObstacleAvoided { id: EntityId },
    ProjectilesExpired { count: usize },
    ObstacleDestroyed { x: f32, y: f32, scale: f32 },
    PlayerHit { x: f32, y: f32, health: u32 },
    NearMiss { x: f32, y: f32 },
    GameOver { score: u32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub events: Vec<FrameEvent>,
}

impl FrameReport {
    fn push(&mut self, event: FrameEvent) {
        self.events.push(event);
    }

    pub fn contains(&self, matches: impl Fn(&FrameEvent) -> bool) -> bool {
        self.events.iter().any(matches)
    }
}

/// The whole game, owned in one place. `step` is the only per frame entry
/// point and always runs the same sequence:
///
/// ```text
///  restart/menu -> (paused? stop) -> input -> timers -> road -> steer/fire
///        -> player -> spawn -> advance -> projectile hits -> player hit
///        -> near miss
/// ```
pub struct World {
    config: GameConfig,
    horizon: Horizon,
    lanes: LaneLocator,
    road: RoadSegmenter,
    entities: EntityManager,
    player: Player,
    state: GameState,
    controls: Controls,
    rng: StdRng,
    clock_ms: f64,
}

impl World {
    /// `config` is expected to have passed `GameConfig::validate`
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let horizon = Horizon::new(
            config.projection,
            config.screen_width,
            config.screen_height,
            config.horizon_fraction,
        );
        let lanes = LaneLocator::from_config(&config);
        World {
            road: RoadSegmenter::new(&config, horizon),
            entities: EntityManager::new(EntityRules::from_config(&config)),
            player: Player::new(&lanes, config.player_y(), Self::handling(&config)),
            state: GameState::new(&config),
            controls: Controls::new(&config),
            rng: StdRng::seed_from_u64(seed),
            clock_ms: 0.0,
            config,
            horizon,
            lanes,
        }
    }

    fn handling(config: &GameConfig) -> Handling {
        Handling {
            step: config.lane_change_step,
            max_bank: config.max_bank_angle,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn lanes(&self) -> &LaneLocator {
        &self.lanes
    }

    pub fn road(&self) -> &RoadSegmenter {
        &self.road
    }

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// simulated milliseconds since start, frozen while paused
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.state.set_paused(paused);
    }

    /// Fresh session on the same config. The RNG keeps its stream.
    pub fn restart(&mut self) {
        self.road = RoadSegmenter::new(&self.config, self.horizon);
        self.entities.clear();
        self.player = Player::new(
            &self.lanes,
            self.config.player_y(),
            Self::handling(&self.config),
        );
        self.state = GameState::new(&self.config);
        self.controls.reset();
        self.clock_ms = 0.0;
    }

    pub fn spawn_obstacle(&mut self, lane: usize) -> EntityId {
        self.entities.spawn_obstacle(lane, &self.lanes, &self.horizon)
    }

    fn probe(&self) -> PlayerProbe {
        PlayerProbe {
            x: self.player.x(),
            y: self.player.y(),
            lane: self.lanes.nearest_lane(self.player.x()),
            target_lane: self.player.target_lane(),
            size: Size::new(self.config.character_width, self.config.character_height),
        }
    }

    pub fn step(&mut self, input: &InputSnapshot, delta_ms: f32) -> FrameReport {
        let mut report = FrameReport::default();
        // only the menu and restart keys are read while paused
        if input.restart_pressed {
            self.restart();
            report.push(FrameEvent::Restarted);
            return report;
        }
        if input.menu_pressed {
            self.state.toggle_menu();
            report.push(FrameEvent::MenuToggled {
                open: self.state.is_menu_open(),
            });
        }
        if self.state.is_paused() {
            return report;
        }

        let intents = self.controls.interpret(
            input,
            self.player.current_lane(),
            self.player.is_stable(),
            &self.lanes,
        );

        self.clock_ms += f64::from(delta_ms);
        self.state.tick_invulnerability(delta_ms);
        self.road.advance(1.0);

        self.apply_intents(&intents, &mut report);
        self.player.update(&self.lanes);

        if let Some(id) = self
            .entities
            .tick_spawner(delta_ms, &self.lanes, &self.horizon, &mut self.rng)
        {
            let lane = self.entities.obstacles().last().map_or(0, |o| o.lane());
            report.push(FrameEvent::ObstacleSpawned { id, lane });
        }

        for avoided in self.entities.advance_obstacles(&self.horizon) {
            self.state.award(AVOID_SCORE, AVOID_PROGRESS);
            report.push(FrameEvent::ObstacleAvoided { id: avoided.id });
        }
        let expired = self.entities.advance_projectiles(&self.horizon);
        if expired > 0 {
            report.push(FrameEvent::ProjectilesExpired { count: expired });
        }

        self.resolve_projectile_hits(&mut report);
        self.resolve_player_hit(&mut report);
        if self.config.projection.has_near_miss() {
            self.resolve_near_misses(&mut report);
        }
        report
    }

    fn apply_intents(&mut self, intents: &Intents, report: &mut FrameReport) {
        if let Some(direction) = intents.steer {
            let from_x = self.player.x();
            if self.player.steer(direction, &self.lanes) {
                report.push(FrameEvent::LaneChangeStarted {
                    from_x,
                    y: self.player.y(),
                    direction,
                });
            }
        }
        if intents.fire {
            let x = self.player.x();
            let y = self.player.y() - self.config.character_height / 2.0;
            if let Some(id) = self.entities.try_fire(self.clock_ms, x, y, &self.horizon) {
                report.push(FrameEvent::Fired { id, x, y });
            }
        }
    }

    fn resolve_projectile_hits(&mut self, report: &mut FrameReport) {
        let hits = collision::projectile_hits(
            self.entities.projectiles(),
            self.entities.obstacles(),
            self.config.projectile_size,
        );
        for (projectile, obstacle) in hits {
            self.entities.remove_projectile(projectile);
            if let Some(obstacle) = self.entities.remove_obstacle(obstacle) {
                self.state.award(HIT_SCORE, HIT_PROGRESS);
                report.push(FrameEvent::ObstacleDestroyed {
                    x: obstacle.x,
                    y: obstacle.y,
                    scale: obstacle.scale,
                });
            }
        }
    }

    fn resolve_player_hit(&mut self, report: &mut FrameReport) {
        if self.state.is_invulnerable() {
            return;
        }
        let probe = self.probe();
        let Some(id) = collision::player_hit(&probe, self.entities.obstacles()) else {
            return;
        };
        let damage = self.state.take_hit(self.config.collision_damage);
        if damage == Damage::Ignored {
            return;
        }
        if let Some(obstacle) = self.entities.remove_obstacle(id) {
            report.push(FrameEvent::PlayerHit {
                x: obstacle.x,
                y: obstacle.y,
                health: self.state.health(),
            });
        }
        if damage == Damage::Depleted {
            report.push(FrameEvent::GameOver {
                score: self.state.score(),
            });
        }
    }

    fn resolve_near_misses(&mut self, report: &mut FrameReport) {
        let probe = self.probe();
        let rule = NearMissRule {
            min_distance: self.config.near_miss_distance,
            window: self.config.near_miss_window,
        };
        let triggered = collision::near_misses(
            &probe,
            self.entities.obstacles_mut(),
            &self.horizon,
            rule,
        );
        for id in triggered {
            self.state.award(NEAR_MISS_SCORE, 0);
            if let Some(obstacle) = self.entities.obstacles().iter().find(|o| o.id() == id) {
                report.push(FrameEvent::NearMiss {
                    x: obstacle.x,
                    y: obstacle.y,
                });
            }
        }
    }
}
