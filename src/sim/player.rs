//! ┌──────────────── Lane Change Flow ───────────────────────┐
//! │  From State     →  Event   →  To State                  │
//! ├─────────────────────────────────────────────────────────┤
//! │  Stable         →  Steer   →  Transitioning             │
//! │  Transitioning  →  Steer   →  Transitioning (retarget)  │
//! │  -------           ------                               │
//! │  Transitioning  →  Update  →  Stable (progress >= 1)    │
//! └─────────────────────────────────────────────────────────┘
//! Steering into a wall (lane 0 going left, last lane going right) leaves
//! the state untouched.
use self::lane_states::{IsTransitioning, LaneState, PlayerContext, Stable, Transitioning};
use crate::sim::lanes::{Direction, LaneLocator};

const TILT_DECAY: f32 = 0.85;

pub enum Event {
    Steer(Direction),
    Update,
}

/// Typestate for the lane change. Transitions are only reachable through
/// the methods below, so a `Stable` player can never carry a half finished
/// progress value.
mod lane_states {
    use crate::sim::kinematics::{cubic_out, lerp};
    use crate::sim::lanes::{Direction, LaneLocator};

    #[derive(Debug, Copy, Clone)]
    pub struct Stable;
    #[derive(Debug, Copy, Clone)]
    pub struct Transitioning;

    pub enum IsTransitioning {
        Done(LaneState<Stable>),
        InProgress(LaneState<Transitioning>),
    }

    #[derive(Debug, Copy, Clone)]
    pub struct PlayerContext {
        pub current_lane: usize,
        pub target_lane: usize,
        pub progress: f32,
        pub x: f32,
        pub y: f32,
        pub tilt: f32,
    }

    #[derive(Debug, Copy, Clone)]
    pub struct LaneState<S> {
        context: PlayerContext,
        _state: S,
    }

    impl<S> LaneState<S> {
        pub fn context(&self) -> &PlayerContext {
            &self.context
        }
    }

    impl LaneState<Stable> {
        pub fn new(lane: usize, lanes: &LaneLocator, y: f32) -> Self {
            LaneState {
                context: PlayerContext {
                    current_lane: lane,
                    target_lane: lane,
                    progress: 1.0,
                    x: lanes.lane_position(lane),
                    y,
                    tilt: 0.0,
                },
                _state: Stable,
            }
        }

        pub fn update(mut self, tilt_decay: f32) -> Self {
            self.context = self.context.settle_tilt(tilt_decay);
            self
        }

        pub fn steer(
            self,
            target_lane: usize,
            direction: Direction,
            bank: f32,
        ) -> LaneState<Transitioning> {
            LaneState {
                context: self.context.retarget(target_lane, direction, bank),
                _state: Transitioning,
            }
        }
    }

    impl LaneState<Transitioning> {
        /// Retargets from the current lane, not from where the player is
        /// drawn, so a mid flight steer snaps back to the lane it left.
        pub fn steer(
            self,
            target_lane: usize,
            direction: Direction,
            bank: f32,
        ) -> LaneState<Transitioning> {
            LaneState {
                context: self.context.retarget(target_lane, direction, bank),
                _state: Transitioning,
            }
        }

        pub fn update(mut self, step: f32, tilt_decay: f32, lanes: &LaneLocator) -> IsTransitioning {
            self.context = self.context.settle_tilt(tilt_decay).advance(step, lanes);
            if self.context.progress >= 1.0 {
                IsTransitioning::Done(self.land(lanes))
            } else {
                IsTransitioning::InProgress(self)
            }
        }

        fn land(self, lanes: &LaneLocator) -> LaneState<Stable> {
            let mut context = self.context;
            context.progress = 1.0;
            context.current_lane = context.target_lane;
            context.x = lanes.lane_position(context.current_lane);
            LaneState {
                context,
                _state: Stable,
            }
        }
    }

    impl PlayerContext {
        fn retarget(mut self, target_lane: usize, direction: Direction, bank: f32) -> Self {
            self.target_lane = target_lane;
            self.progress = 0.0;
            self.tilt = bank * direction.sign();
            self
        }

        fn advance(mut self, step: f32, lanes: &LaneLocator) -> Self {
            self.progress = (self.progress + step).min(1.0);
            self.x = lerp(
                lanes.lane_position(self.current_lane),
                lanes.lane_position(self.target_lane),
                cubic_out(self.progress),
            );
            self
        }

        fn settle_tilt(mut self, decay: f32) -> Self {
            self.tilt *= decay;
            if self.tilt.abs() < 1e-3 {
                self.tilt = 0.0;
            }
            self
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum LaneStateMachine {
    Stable(LaneState<Stable>),
    Transitioning(LaneState<Transitioning>),
}

impl From<LaneState<Stable>> for LaneStateMachine {
    fn from(state: LaneState<Stable>) -> Self {
        LaneStateMachine::Stable(state)
    }
}

impl From<LaneState<Transitioning>> for LaneStateMachine {
    fn from(state: LaneState<Transitioning>) -> Self {
        LaneStateMachine::Transitioning(state)
    }
}

impl From<IsTransitioning> for LaneStateMachine {
    fn from(is_transitioning: IsTransitioning) -> Self {
        match is_transitioning {
            IsTransitioning::Done(stable) => stable.into(),
            IsTransitioning::InProgress(transitioning) => transitioning.into(),
        }
    }
}

/// Player tuning that does not change within a session
#[derive(Debug, Copy, Clone)]
pub struct Handling {
    pub step: f32,
    pub max_bank: f32,
}

impl LaneStateMachine {
    fn transition(self, event: Event, lanes: &LaneLocator, handling: Handling) -> Self {
        match (self, event) {
            (LaneStateMachine::Stable(state), Event::Steer(direction)) => {
                let current = state.context().current_lane;
                let target = lanes.step_lane(current, direction);
                if target == current {
                    return self;
                }
                state.steer(target, direction, handling.max_bank).into()
            }
            (LaneStateMachine::Transitioning(state), Event::Steer(direction)) => {
                let current = state.context().current_lane;
                let target = lanes.step_lane(current, direction);
                if target == current {
                    return self;
                }
                state.steer(target, direction, handling.max_bank).into()
            }
            (LaneStateMachine::Stable(state), Event::Update) => state.update(TILT_DECAY).into(),
            (LaneStateMachine::Transitioning(state), Event::Update) => {
                state.update(handling.step, TILT_DECAY, lanes).into()
            }
        }
    }

    fn context(&self) -> &PlayerContext {
        match self {
            LaneStateMachine::Stable(state) => state.context(),
            LaneStateMachine::Transitioning(state) => state.context(),
        }
    }
}

/// The player character. Starts Stable in the middle lane.
#[derive(Debug, Clone)]
pub struct Player {
    state: LaneStateMachine,
    handling: Handling,
}

impl Player {
    pub fn new(lanes: &LaneLocator, y: f32, handling: Handling) -> Self {
        Self::in_lane(lanes.middle_lane(), lanes, y, handling)
    }

    pub fn in_lane(lane: usize, lanes: &LaneLocator, y: f32, handling: Handling) -> Self {
        Player {
            state: LaneState::new(lane, lanes, y).into(),
            handling,
        }
    }

    /// Returns true when a new lane change started (or was retargeted)
    pub fn steer(&mut self, direction: Direction, lanes: &LaneLocator) -> bool {
        let before = *self.state.context();
        self.state = self
            .state
            .transition(Event::Steer(direction), lanes, self.handling);
        let after = self.state.context();
        after.target_lane != before.target_lane || after.progress < before.progress
    }

    pub fn update(&mut self, lanes: &LaneLocator) {
        self.state = self.state.transition(Event::Update, lanes, self.handling);
    }

    pub fn is_stable(&self) -> bool {
        matches!(self.state, LaneStateMachine::Stable(_))
    }

    pub fn current_lane(&self) -> usize {
        self.state.context().current_lane
    }

    pub fn target_lane(&self) -> usize {
        self.state.context().target_lane
    }

    pub fn progress(&self) -> f32 {
        self.state.context().progress
    }

    pub fn x(&self) -> f32 {
        self.state.context().x
    }

    pub fn y(&self) -> f32 {
        self.state.context().y
    }

    /// cosmetic bank angle in radians
    pub fn tilt(&self) -> f32 {
        self.state.context().tilt
    }
}
