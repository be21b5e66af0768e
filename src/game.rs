use crate::browser;
use crate::config::GameConfig;
use crate::effects::Effects;
use crate::engine::input::KeyState;
use crate::engine::{Game, Point, Rect, Renderer};
use crate::sim::input::InputSnapshot;
use crate::sim::road::STRIPE_COUNT;
use crate::sim::{FrameEvent, FrameReport, World};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// ┌──────────────────────── Frame Flow ──────────────────────────┐
/// │                                                              │
/// │  GameLoop ──► KeyState ──► InputSnapshot ──► World::step     │
/// │                                                   │          │
/// │                                              FrameReport     │
/// │                                             ┌─────┴─────┐    │
/// │                                           log!       Effects │
/// │                                                              │
/// │  GameLoop ──► draw: road, obstacles, shots, player, effects  │
/// └──────────────────────────────────────────────────────────────┘
pub enum RailShooter {
    /// waiting on config.json
    Loading,
    Loaded(Run),
}

pub struct Run {
    world: World,
    effects: Effects,
    // cosmetic randomness, kept apart from the world's stream
    rng: StdRng,
    frame: u64,
}

mod keys {
    pub const LEFT: &str = "ArrowLeft";
    pub const RIGHT: &str = "ArrowRight";
    pub const FIRE: &str = "Space";
    pub const MENU: &str = "Escape";
    pub const RESTART: &str = "KeyR";
}

// road band colours, muted toward the horizon
const SHADE_STEPS: usize = 16;
static ROAD_SHADES: Lazy<Vec<[String; STRIPE_COUNT]>> = Lazy::new(|| {
    (0..SHADE_STEPS)
        .map(|step| {
            let near = step as f32 / (SHADE_STEPS - 1) as f32;
            let channel = |far: f32, close: f32| (far + (close - far) * near) as u8;
            [
                format!(
                    "rgb({},{},{})",
                    channel(70.0, 96.0),
                    channel(74.0, 96.0),
                    channel(90.0, 104.0)
                ),
                format!(
                    "rgb({},{},{})",
                    channel(60.0, 76.0),
                    channel(62.0, 76.0),
                    channel(78.0, 84.0)
                ),
            ]
        })
        .collect()
});

fn road_shade(distance: f32, color_index: usize) -> &'static str {
    let step = ((distance.clamp(0.0, 1.0) * (SHADE_STEPS - 1) as f32).round()) as usize;
    &ROAD_SHADES[step][color_index % STRIPE_COUNT]
}

impl RailShooter {
    const CONFIG_PATH: &'static str = "config.json";

    pub fn new() -> Self {
        RailShooter::Loading
    }

    /// A missing or broken config is not fatal, the defaults are playable
    async fn load_config() -> GameConfig {
        let loaded = browser::fetch_json::<GameConfig>(Self::CONFIG_PATH)
            .await
            .with_context(|| format!("Failed to load game config from : {}", Self::CONFIG_PATH))
            .and_then(|config| config.validate().map(|_| config));
        match loaded {
            Ok(config) => config,
            Err(err) => {
                log!("Using default config : {:#}", err);
                GameConfig::default()
            }
        }
    }
}

#[async_trait(?Send)]
impl Game for RailShooter {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            RailShooter::Loading => {
                let (width, height) = browser::canvas_size()?;
                let config = Self::load_config().await.with_screen_size(width, height);
                config
                    .validate()
                    .context("Canvas size does not fit the game")?;
                log!(
                    "Starting {:?} run : {} lanes on {}x{}",
                    config.projection,
                    config.lane_count,
                    width,
                    height
                );
                let world = World::new(config, rand::random());
                let effects = Effects::new(width, height, world.horizon().y());
                Ok(Box::new(RailShooter::Loaded(Run {
                    world,
                    effects,
                    rng: StdRng::from_entropy(),
                    frame: 0,
                })))
            }
            RailShooter::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, keystate: &KeyState, delta_ms: f32) {
        if let RailShooter::Loaded(run) = self {
            let input = snapshot(keystate);
            let report = run.world.step(&input, delta_ms);
            run.handle(&report);
            if !run.world.state().is_paused() {
                run.effects.update(delta_ms, &mut run.rng);
                run.frame += 1;
            }
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let RailShooter::Loaded(run) = self {
            run.draw(renderer);
        }
    }
}

fn snapshot(keystate: &KeyState) -> InputSnapshot {
    InputSnapshot {
        left_pressed: keystate.was_pressed(keys::LEFT),
        right_pressed: keystate.was_pressed(keys::RIGHT),
        left_held: keystate.is_pressed(keys::LEFT),
        right_held: keystate.is_pressed(keys::RIGHT),
        fire_held: keystate.is_pressed(keys::FIRE),
        menu_pressed: keystate.was_pressed(keys::MENU),
        restart_pressed: keystate.was_pressed(keys::RESTART),
        pointer: keystate.pointer_events().to_vec(),
    }
}

impl Run {
    fn handle(&mut self, report: &FrameReport) {
        for event in &report.events {
            match event {
                FrameEvent::PlayerHit { health, .. } => log!("Hit! health {}", health),
                FrameEvent::GameOver { score } => log!("Game Over, score {}", score),
                FrameEvent::MenuToggled { open } => {
                    log!("Menu {}", if *open { "opened" } else { "closed" })
                }
                FrameEvent::Restarted => {
                    log!("Restarted");
                    self.effects.clear();
                }
                _ => {}
            }
            self.effects.spawn_for(event, &mut self.rng);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let config = self.world.config();
        let screen = Rect::new(0.0, 0.0, config.screen_width, config.screen_height);
        renderer.clear(&screen);
        renderer.fill_rect(&screen, "#14162a");

        let shake = self.effects.shake_offset(self.frame);
        renderer.with_transform(shake, 0.0, |renderer| {
            // draw order matters : road -> obstacles -> shots -> player
            self.draw_road(renderer);
            self.effects.draw_background(renderer);
            self.draw_obstacles(renderer);
            self.draw_projectiles(renderer);
            self.draw_player(renderer);
            self.effects
                .draw(renderer, (config.character_width, config.character_height));
        });
        self.draw_hud(renderer);
    }

    fn draw_road(&self, renderer: &Renderer) {
        let road = self.world.road();
        let center_x = self.world.config().screen_width / 2.0;
        let horizon_y = self.world.horizon().y();
        for segment in road.segments() {
            let top = segment.y.max(horizon_y);
            let bottom = segment.y + segment.height;
            if bottom <= top {
                continue;
            }
            let distance = road.normalized_distance(segment);
            renderer.fill_trapezoid(
                center_x,
                top,
                road.width_at(top),
                bottom,
                road.width_at(bottom),
                road_shade(distance, segment.color_index),
            );
            for marking in &segment.lane_markings {
                if marking.y >= horizon_y {
                    renderer.fill_rect(
                        &Rect::new(marking.x, marking.y, marking.width, marking.height),
                        "#d8d8e0",
                    );
                }
            }
        }
    }

    fn draw_obstacles(&self, renderer: &Renderer) {
        for obstacle in self.world.entities().obstacles() {
            let size = self.world.config().obstacle_size * obstacle.scale;
            renderer.fill_rect(
                &Rect::centered(obstacle.x, obstacle.y, size, size),
                "#e0443e",
            );
        }
    }

    fn draw_projectiles(&self, renderer: &Renderer) {
        let base = self.world.config().projectile_size;
        for projectile in self.world.entities().projectiles() {
            renderer.fill_circle(
                Point {
                    x: projectile.x,
                    y: projectile.y,
                },
                base * projectile.scale / 2.0,
                "#7fffd4",
            );
        }
    }

    fn draw_player(&self, renderer: &Renderer) {
        if !self.world.state().blink_visible() {
            return;
        }
        let config = self.world.config();
        let player = self.world.player();
        renderer.with_transform(
            Point {
                x: player.x(),
                y: player.y(),
            },
            player.tilt(),
            |renderer| {
                renderer.fill_rect(
                    &Rect::centered(0.0, 0.0, config.character_width, config.character_height),
                    "#3fa7ff",
                );
            },
        );
    }

    fn draw_hud(&self, renderer: &Renderer) {
        let state = self.world.state();
        let config = self.world.config();
        let font = "16px sans-serif";
        renderer.fill_text(
            &format!("Score {}", state.score()),
            Point { x: 70.0, y: 28.0 },
            font,
            "#ffffff",
        );
        renderer.fill_text(
            &format!("Health {}/{}", state.health(), state.max_health()),
            Point {
                x: config.screen_width / 2.0,
                y: 28.0,
            },
            font,
            "#ffffff",
        );
        renderer.fill_text(
            &format!("Progress {}%", state.progress()),
            Point {
                x: config.screen_width - 80.0,
                y: 28.0,
            },
            font,
            "#ffffff",
        );
        if state.is_menu_open() {
            renderer.fill_text(
                "PAUSED - Esc to resume, R to restart",
                Point {
                    x: config.screen_width / 2.0,
                    y: config.screen_height / 2.0,
                },
                "bold 24px sans-serif",
                "#ffffff",
            );
        }
    }
}
