// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                     sim/ : host independent game core                    │
// ├───────────────────┬──────────────────────────────────────────────────────┤
// │ Module            │ Responsibility                                       │
// ├───────────────────┼──────────────────────────────────────────────────────┤
// │ lanes.rs          │ lane index -> screen x                               │
// │ road.rs           │ scrolling road bands, recycled at the horizon        │
// │ kinematics.rs     │ normalized distance -> speed / scale / x             │
// │ entities.rs       │ obstacle + projectile spawn, advance, discard        │
// │ collision.rs      │ hit tests, near miss                                 │
// │ player.rs         │ lane change state machine (Stable / Transitioning)   │
// │ state.rs          │ score, health, progress, pause, invulnerability      │
// │ input.rs          │ per frame input snapshot -> intents                  │
// │ world.rs          │ owns all of the above, one step() per frame          │
// └───────────────────┴──────────────────────────────────────────────────────┘
// Nothing in here touches web_sys, so every module is testable natively.
pub mod collision;
pub mod entities;
pub mod input;
pub mod kinematics;
pub mod lanes;
pub mod player;
pub mod road;
pub mod state;
pub mod world;

pub use world::{FrameEvent, FrameReport, World};

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Size { width, height }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Size {
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}
