use crate::config::{GameConfig, KeyboardMode, PointerMode};
use crate::sim::lanes::{Direction, LaneLocator};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// Pointer sample in canvas pixels
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f32,
    pub y: f32,
}

/// Raw input for one frame, collected by the host before `World::step`.
/// `*_pressed` are edge triggered: true only on the frame the key went down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub left_pressed: bool,
    pub right_pressed: bool,
    pub left_held: bool,
    pub right_held: bool,
    pub fire_held: bool,
    pub menu_pressed: bool,
    pub restart_pressed: bool,
    pub pointer: Vec<PointerEvent>,
}

/// What the player asked for this frame
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Intents {
    pub steer: Option<Direction>,
    pub fire: bool,
}

/// Turns `InputSnapshot`s into `Intents`. Holds the little bit of state
/// pointer modes need across frames (drag in progress, goal lane).
#[derive(Debug, Clone)]
pub struct Controls {
    keyboard: KeyboardMode,
    pointer: PointerMode,
    screen_width: f32,
    region_top: f32,
    dragging: bool,
    goal_lane: Option<usize>,
}

impl Controls {
    pub fn new(config: &GameConfig) -> Self {
        Controls {
            keyboard: config.keyboard_mode,
            pointer: config.pointer_mode,
            screen_width: config.screen_width,
            region_top: config.control_region_top(),
            dragging: false,
            goal_lane: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn goal_lane(&self) -> Option<usize> {
        self.goal_lane
    }

    pub fn reset(&mut self) {
        self.dragging = false;
        self.goal_lane = None;
    }

    /// `player_lane` is the lane the player currently occupies, `stable`
    /// whether it has finished its last lane change.
    pub fn interpret(
        &mut self,
        input: &InputSnapshot,
        player_lane: usize,
        stable: bool,
        lanes: &LaneLocator,
    ) -> Intents {
        let mut intents = Intents {
            steer: None,
            fire: input.fire_held,
        };

        intents.steer = match self.keyboard {
            KeyboardMode::EdgeTriggered => key_direction(input.left_pressed, input.right_pressed),
            KeyboardMode::Held if stable => key_direction(input.left_held, input.right_held),
            KeyboardMode::Held => None,
        };
        if intents.steer.is_some() {
            // keyboard wins over any pending pointer goal
            self.goal_lane = None;
        }

        for event in &input.pointer {
            self.read_pointer(event, lanes, &mut intents);
        }

        if intents.steer.is_none() && stable {
            intents.steer = self.step_toward_goal(player_lane);
        }
        intents
    }

    fn read_pointer(&mut self, event: &PointerEvent, lanes: &LaneLocator, intents: &mut Intents) {
        let in_region = event.y >= self.region_top;
        match (self.pointer, event.phase) {
            (PointerMode::TapThirds, PointerPhase::Down) if in_region => {
                let third = self.screen_width / 3.0;
                if event.x < third {
                    intents.steer = Some(Direction::Left);
                } else if event.x > third * 2.0 {
                    intents.steer = Some(Direction::Right);
                } else {
                    intents.fire = true;
                }
            }
            (PointerMode::TapToMove, PointerPhase::Down) if in_region => {
                self.goal_lane = Some(lanes.nearest_lane(event.x));
            }
            (PointerMode::DragToMove, PointerPhase::Down) if in_region => {
                self.dragging = true;
                self.goal_lane = Some(lanes.nearest_lane(event.x));
            }
            (PointerMode::DragToMove, PointerPhase::Move) if self.dragging => {
                self.goal_lane = Some(lanes.nearest_lane(event.x));
            }
            (PointerMode::DragToMove, PointerPhase::Up) => {
                self.dragging = false;
            }
            (PointerMode::TapToMove | PointerMode::DragToMove, PointerPhase::Down) => {
                intents.fire = true;
            }
            _ => {}
        }
    }

    fn step_toward_goal(&mut self, player_lane: usize) -> Option<Direction> {
        let goal = self.goal_lane?;
        if goal < player_lane {
            Some(Direction::Left)
        } else if goal > player_lane {
            Some(Direction::Right)
        } else {
            if !self.dragging {
                self.goal_lane = None;
            }
            None
        }
    }
}

fn key_direction(left: bool, right: bool) -> Option<Direction> {
    match (left, right) {
        (true, false) => Some(Direction::Left),
        (false, true) => Some(Direction::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(pointer_mode: PointerMode, keyboard_mode: KeyboardMode) -> (Controls, LaneLocator) {
        let config = GameConfig {
            pointer_mode,
            keyboard_mode,
            ..GameConfig::default()
        };
        (Controls::new(&config), LaneLocator::from_config(&config))
    }

    fn tap(phase: PointerPhase, x: f32, y: f32) -> InputSnapshot {
        InputSnapshot {
            pointer: vec![PointerEvent { phase, x, y }],
            ..InputSnapshot::default()
        }
    }

    #[test]
    fn edge_triggered_keys_steer_even_mid_transition() {
        let (mut controls, lanes) = setup(PointerMode::TapThirds, KeyboardMode::EdgeTriggered);
        let input = InputSnapshot {
            left_pressed: true,
            left_held: true,
            ..InputSnapshot::default()
        };
        let intents = controls.interpret(&input, 3, false, &lanes);
        assert_eq!(intents.steer, Some(Direction::Left));
    }

    #[test]
    fn both_arrows_cancel_out() {
        let (mut controls, lanes) = setup(PointerMode::TapThirds, KeyboardMode::EdgeTriggered);
        let input = InputSnapshot {
            left_pressed: true,
            right_pressed: true,
            ..InputSnapshot::default()
        };
        assert_eq!(controls.interpret(&input, 3, true, &lanes).steer, None);
    }

    #[test]
    fn held_keys_repeat_only_when_stable() {
        let (mut controls, lanes) = setup(PointerMode::TapThirds, KeyboardMode::Held);
        let input = InputSnapshot {
            right_held: true,
            ..InputSnapshot::default()
        };
        assert_eq!(
            controls.interpret(&input, 3, true, &lanes).steer,
            Some(Direction::Right)
        );
        assert_eq!(controls.interpret(&input, 3, false, &lanes).steer, None);
    }

    #[test]
    fn tap_thirds() {
        let (mut controls, lanes) = setup(PointerMode::TapThirds, KeyboardMode::EdgeTriggered);
        let left = controls.interpret(&tap(PointerPhase::Down, 100.0, 550.0), 3, true, &lanes);
        assert_eq!(left.steer, Some(Direction::Left));
        let right = controls.interpret(&tap(PointerPhase::Down, 700.0, 550.0), 3, true, &lanes);
        assert_eq!(right.steer, Some(Direction::Right));
        let middle = controls.interpret(&tap(PointerPhase::Down, 400.0, 550.0), 3, true, &lanes);
        assert_eq!(middle.steer, None);
        assert!(middle.fire);
        // above the control region
        let outside = controls.interpret(&tap(PointerPhase::Down, 100.0, 200.0), 3, true, &lanes);
        assert_eq!(outside, Intents::default());
    }

    #[test]
    fn tap_to_move_walks_one_lane_at_a_time() {
        let (mut controls, lanes) = setup(PointerMode::TapToMove, KeyboardMode::EdgeTriggered);
        let target_x = lanes.lane_position(1);
        let first = controls.interpret(&tap(PointerPhase::Down, target_x, 580.0), 3, true, &lanes);
        assert_eq!(first.steer, Some(Direction::Left));
        let idle = InputSnapshot::default();
        assert_eq!(controls.interpret(&idle, 2, false, &lanes).steer, None);
        assert_eq!(
            controls.interpret(&idle, 2, true, &lanes).steer,
            Some(Direction::Left)
        );
        assert_eq!(controls.interpret(&idle, 1, true, &lanes).steer, None);
        assert_eq!(controls.goal_lane(), None);
    }

    #[test]
    fn tap_above_region_fires_in_move_modes() {
        let (mut controls, lanes) = setup(PointerMode::TapToMove, KeyboardMode::EdgeTriggered);
        let intents = controls.interpret(&tap(PointerPhase::Down, 400.0, 100.0), 3, true, &lanes);
        assert!(intents.fire);
        assert_eq!(intents.steer, None);
    }

    #[test]
    fn drag_tracks_goal_until_release() {
        let (mut controls, lanes) = setup(PointerMode::DragToMove, KeyboardMode::EdgeTriggered);
        controls.interpret(&tap(PointerPhase::Down, lanes.lane_position(3), 560.0), 3, true, &lanes);
        assert!(controls.is_dragging());
        assert_eq!(controls.goal_lane(), Some(3));

        // moves are honoured anywhere on screen while dragging
        let intents =
            controls.interpret(&tap(PointerPhase::Move, lanes.lane_position(5), 300.0), 3, true, &lanes);
        assert_eq!(intents.steer, Some(Direction::Right));
        assert_eq!(controls.goal_lane(), Some(5));

        controls.interpret(&tap(PointerPhase::Up, lanes.lane_position(5), 300.0), 4, false, &lanes);
        assert!(!controls.is_dragging());
        let moved = controls.interpret(
            &tap(PointerPhase::Move, lanes.lane_position(0), 560.0),
            4,
            true,
            &lanes,
        );
        assert_eq!(moved.steer, Some(Direction::Right));
        assert_eq!(controls.goal_lane(), Some(5));
    }
}
