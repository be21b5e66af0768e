use crate::engine::{Point, Rect, Renderer};
use crate::sim::FrameEvent;
use rand::Rng;
use std::f32::consts::TAU;

// TABLE:
// ┌──────────────┬────────────────────────┬──────────┬───────────┐
// │ Event        │ Effect                 │ Lifetime │ Particles │
// ├──────────────┼────────────────────────┼──────────┼───────────┤
// │ PlayerHit    │ small burst            │ 400ms    │ 12        │
// │ Destroyed    │ explosion              │ 600ms    │ 28        │
// │ NearMiss     │ text + flash + shake   │ 800ms    │ -         │
// │              │ + speed line burst     │          │           │
// │ LaneChange   │ ghost afterimage       │ 200ms    │ -         │
// └──────────────┴────────────────────────┴──────────┴───────────┘
const HIT_BURST: (usize, f32) = (12, 400.0);
const EXPLOSION: (usize, f32) = (28, 600.0);
const NEAR_MISS_TEXT_MS: f32 = 800.0;
const GHOST_MS: f32 = 200.0;
const FLASH_MS: f32 = 120.0;
const SHAKE_MS: f32 = 250.0;
const SHAKE_AMPLITUDE: f32 = 6.0;
const SPEED_LINE_POOL: usize = 24;
const SPEED_LINE_IDLE: usize = 6;

#[derive(Debug, Clone)]
struct Particle {
    position: Point,
    velocity: Point,
    radius: f32,
    color: &'static str,
}

#[derive(Debug, Clone)]
enum EffectKind {
    Burst(Vec<Particle>),
    FloatingText(String),
    Ghost(f32),
}

#[derive(Debug, Clone)]
struct Effect {
    kind: EffectKind,
    position: Point,
    age_ms: f32,
    ttl_ms: f32,
}

impl Effect {
    fn remaining(&self) -> f32 {
        1.0 - (self.age_ms / self.ttl_ms).min(1.0)
    }
}

/// Decorative streak at the road edge. Lives in a fixed pool
#[derive(Debug, Clone, Copy, Default)]
struct SpeedLine {
    active: bool,
    x: f32,
    y: f32,
    length: f32,
    speed: f32,
}

/// Fixed pool: lines are switched on and off, never allocated per frame
struct SpeedLines {
    lines: [SpeedLine; SPEED_LINE_POOL],
}

impl SpeedLines {
    fn new() -> Self {
        SpeedLines {
            lines: [SpeedLine::default(); SPEED_LINE_POOL],
        }
    }

    fn active(&self) -> usize {
        self.lines.iter().filter(|line| line.active).count()
    }

    fn launch<R: Rng>(&mut self, rng: &mut R, width: f32, top: f32) {
        if let Some(line) = self.lines.iter_mut().find(|line| !line.active) {
            // hug one of the screen edges
            let edge = if rng.gen_bool(0.5) {
                rng.gen_range(0.0..width * 0.1)
            } else {
                rng.gen_range(width * 0.9..width)
            };
            *line = SpeedLine {
                active: true,
                x: edge,
                y: top,
                length: rng.gen_range(20.0..60.0),
                speed: rng.gen_range(8.0..16.0),
            };
        }
    }

    fn update(&mut self, bottom: f32) {
        for line in self.lines.iter_mut().filter(|line| line.active) {
            line.y += line.speed;
            if line.y - line.length > bottom {
                line.active = false;
            }
        }
    }
}

/// Cosmetic, fire and forget. Nothing here feeds back into the game.
pub struct Effects {
    effects: Vec<Effect>,
    speed_lines: SpeedLines,
    flash_ms: f32,
    shake_ms: f32,
    screen_width: f32,
    screen_height: f32,
    horizon_y: f32,
}

impl Effects {
    pub fn new(screen_width: f32, screen_height: f32, horizon_y: f32) -> Self {
        Effects {
            effects: Vec::new(),
            speed_lines: SpeedLines::new(),
            flash_ms: 0.0,
            shake_ms: 0.0,
            screen_width,
            screen_height,
            horizon_y,
        }
    }

    pub fn clear(&mut self) {
        self.effects.clear();
        self.speed_lines = SpeedLines::new();
        self.flash_ms = 0.0;
        self.shake_ms = 0.0;
    }

    pub fn spawn_for<R: Rng>(&mut self, event: &FrameEvent, rng: &mut R) {
        match event {
            FrameEvent::PlayerHit { x, y, .. } => {
                self.burst(rng, Point { x: *x, y: *y }, HIT_BURST, 3.0, "#ff5555");
            }
            FrameEvent::ObstacleDestroyed { x, y, scale } => {
                self.burst(rng, Point { x: *x, y: *y }, EXPLOSION, 4.0 * scale.max(0.4), "#ffaa33");
            }
            FrameEvent::NearMiss { x, y } => {
                self.effects.push(Effect {
                    kind: EffectKind::FloatingText("+5 NEAR MISS".to_string()),
                    position: Point { x: *x, y: *y },
                    age_ms: 0.0,
                    ttl_ms: NEAR_MISS_TEXT_MS,
                });
                self.flash_ms = FLASH_MS;
                self.shake_ms = SHAKE_MS;
                for _ in 0..8 {
                    self.speed_lines
                        .launch(rng, self.screen_width, self.horizon_y);
                }
            }
            FrameEvent::LaneChangeStarted { from_x, y, direction } => {
                self.effects.push(Effect {
                    kind: EffectKind::Ghost(direction.sign()),
                    position: Point { x: *from_x, y: *y },
                    age_ms: 0.0,
                    ttl_ms: GHOST_MS,
                });
            }
            _ => {}
        }
    }

    fn burst<R: Rng>(
        &mut self,
        rng: &mut R,
        origin: Point,
        (count, ttl_ms): (usize, f32),
        speed: f32,
        color: &'static str,
    ) {
        let particles = (0..count)
            .map(|_| {
                let angle = rng.gen_range(0.0..TAU);
                let magnitude = rng.gen_range(0.3..1.0) * speed;
                Particle {
                    position: origin,
                    velocity: Point {
                        x: angle.cos() * magnitude,
                        y: angle.sin() * magnitude,
                    },
                    radius: rng.gen_range(2.0..5.0),
                    color,
                }
            })
            .collect();
        self.effects.push(Effect {
            kind: EffectKind::Burst(particles),
            position: origin,
            age_ms: 0.0,
            ttl_ms,
        });
    }

    pub fn update<R: Rng>(&mut self, delta_ms: f32, rng: &mut R) {
        for effect in self.effects.iter_mut() {
            effect.age_ms += delta_ms;
            match &mut effect.kind {
                EffectKind::Burst(particles) => {
                    for particle in particles.iter_mut() {
                        particle.position.x += particle.velocity.x;
                        particle.position.y += particle.velocity.y;
                    }
                }
                EffectKind::FloatingText(_) => effect.position.y -= 0.8,
                EffectKind::Ghost(_) => {}
            }
        }
        self.effects.retain(|effect| effect.age_ms < effect.ttl_ms);

        self.flash_ms = (self.flash_ms - delta_ms).max(0.0);
        self.shake_ms = (self.shake_ms - delta_ms).max(0.0);

        if self.speed_lines.active() < SPEED_LINE_IDLE && rng.gen_bool(0.1) {
            self.speed_lines
                .launch(rng, self.screen_width, self.horizon_y);
        }
        self.speed_lines.update(self.screen_height);
    }

    /// Camera offset for this frame, zero when not shaking
    pub fn shake_offset(&self, frame: u64) -> Point {
        if self.shake_ms <= 0.0 {
            return Point::default();
        }
        let strength = SHAKE_AMPLITUDE * self.shake_ms / SHAKE_MS;
        // deterministic wobble, no rng needed in draw
        let phase = frame as f32 * 1.7;
        Point {
            x: phase.sin() * strength,
            y: (phase * 1.3).cos() * strength,
        }
    }

    pub fn draw_background(&self, renderer: &Renderer) {
        for line in self.speed_lines.lines.iter().filter(|line| line.active) {
            renderer.stroke_line(
                Point { x: line.x, y: line.y - line.length },
                Point { x: line.x, y: line.y },
                2.0,
                "rgba(255,255,255,0.35)",
            );
        }
    }

    pub fn draw(&self, renderer: &Renderer, character: (f32, f32)) {
        for effect in &self.effects {
            let fade = effect.remaining();
            renderer.set_alpha(fade);
            match &effect.kind {
                EffectKind::Burst(particles) => {
                    for particle in particles {
                        renderer.fill_circle(particle.position, particle.radius, particle.color);
                    }
                }
                EffectKind::FloatingText(text) => {
                    renderer.fill_text(text, effect.position, "bold 20px sans-serif", "#ffee55");
                }
                EffectKind::Ghost(lean) => {
                    renderer.set_alpha(fade * 0.4);
                    renderer.with_transform(effect.position, lean * 0.1, |renderer| {
                        renderer.fill_rect(
                            &Rect::centered(0.0, 0.0, character.0, character.1),
                            "#66ccff",
                        );
                    });
                }
            }
        }
        renderer.set_alpha(1.0);

        if self.flash_ms > 0.0 {
            renderer.set_alpha(0.3 * self.flash_ms / FLASH_MS);
            renderer.fill_rect(
                &Rect::new(0.0, 0.0, self.screen_width, self.screen_height),
                "#ffffff",
            );
            renderer.set_alpha(1.0);
        }
    }
}
