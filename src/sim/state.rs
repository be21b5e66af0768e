use crate::config::GameConfig;

pub const AVOID_SCORE: u32 = 10;
pub const AVOID_PROGRESS: u32 = 1;
pub const HIT_SCORE: u32 = 20;
pub const HIT_PROGRESS: u32 = 2;
pub const NEAR_MISS_SCORE: u32 = 5;
pub const MAX_PROGRESS: u32 = 100;

const BLINK_PERIOD_MS: f32 = 100.0;

/// What a collision did to the player
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Damage {
    /// invulnerable, nothing changed
    Ignored,
    Taken { remaining: u32 },
    /// this hit took health to zero
    Depleted,
}

/// Mutable per session flags and counters. Reset wholesale on restart.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    score: u32,
    health: u32,
    max_health: u32,
    progress: u32,
    paused: bool,
    menu_open: bool,
    /// remaining invulnerability, None when vulnerable
    invulnerable_ms: Option<f32>,
    invulnerability_window_ms: f32,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        GameState {
            score: 0,
            health: config.max_health,
            max_health: config.max_health,
            progress: 0,
            paused: false,
            menu_open: false,
            invulnerable_ms: None,
            invulnerability_window_ms: config.invulnerability_ms,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ms.is_some()
    }

    /// award score and progress, progress capped at `MAX_PROGRESS`
    pub fn award(&mut self, score: u32, progress: u32) {
        self.score = self.score.saturating_add(score);
        self.progress = (self.progress + progress).min(MAX_PROGRESS);
    }

    /// Applies `amount` unless invulnerable. A hit that lands opens a new
    /// invulnerability window.
    pub fn take_hit(&mut self, amount: u32) -> Damage {
        if self.is_invulnerable() {
            return Damage::Ignored;
        }
        let was_alive = self.health > 0;
        self.health = self.health.saturating_sub(amount);
        self.invulnerable_ms = Some(self.invulnerability_window_ms);
        if was_alive && self.health == 0 {
            Damage::Depleted
        } else {
            Damage::Taken {
                remaining: self.health,
            }
        }
    }

    pub fn tick_invulnerability(&mut self, delta_ms: f32) {
        if let Some(remaining) = self.invulnerable_ms {
            let remaining = remaining - delta_ms;
            self.invulnerable_ms = if remaining > 0.0 { Some(remaining) } else { None };
        }
    }

    /// Blinks the character while invulnerable
    pub fn blink_visible(&self) -> bool {
        match self.invulnerable_ms {
            Some(remaining) => ((remaining / BLINK_PERIOD_MS) as u32) % 2 == 0,
            None => true,
        }
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
        self.paused = self.menu_open;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused || self.menu_open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(&GameConfig::default())
    }

    #[test]
    fn progress_is_capped() {
        let mut state = state();
        for _ in 0..80 {
            state.award(HIT_SCORE, HIT_PROGRESS);
        }
        assert_eq!(state.progress(), MAX_PROGRESS);
        assert_eq!(state.score(), 1600);
    }

    #[test]
    fn hit_opens_invulnerability_window() {
        let mut state = state();
        assert_eq!(state.take_hit(20), Damage::Taken { remaining: 80 });
        assert!(state.is_invulnerable());
        assert_eq!(state.take_hit(20), Damage::Ignored);
        assert_eq!(state.health(), 80);

        state.tick_invulnerability(1499.0);
        assert!(state.is_invulnerable());
        state.tick_invulnerability(1.0);
        assert!(!state.is_invulnerable());
        assert_eq!(state.take_hit(20), Damage::Taken { remaining: 60 });
    }

    #[test]
    fn health_floors_at_zero_and_depletes_once() {
        let mut state = state();
        assert_eq!(state.take_hit(150), Damage::Depleted);
        assert_eq!(state.health(), 0);
        state.tick_invulnerability(2000.0);
        assert_eq!(state.take_hit(20), Damage::Taken { remaining: 0 });
    }

    #[test]
    fn blink_alternates_while_invulnerable() {
        let mut state = state();
        assert!(state.blink_visible());
        state.take_hit(10);
        let mut seen = [false, false];
        for _ in 0..10 {
            seen[state.blink_visible() as usize] = true;
            state.tick_invulnerability(50.0);
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn menu_pauses() {
        let mut state = state();
        state.toggle_menu();
        assert!(state.is_menu_open());
        assert!(state.is_paused());
        state.set_paused(false);
        assert!(state.is_paused());
        state.toggle_menu();
        assert!(!state.is_paused());
    }
}
