use crate::config::GameConfig;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> isize {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }

    pub fn sign(self) -> f32 {
        self.delta() as f32
    }
}

/// Maps lane index -> screen x
///
/// ```text
///  |<- left edge ->|<-lane->|<-lane->|<-lane->|
///  |               |   x0   |   x1   |   x2   |
///  0               <-------- road width ------>   screen width
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LaneLocator {
    screen_width: f32,
    road_width_fraction: f32,
    lane_count: usize,
}

impl LaneLocator {
    pub fn new(screen_width: f32, road_width_fraction: f32, lane_count: usize) -> Self {
        LaneLocator {
            screen_width,
            road_width_fraction,
            lane_count,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config.screen_width,
            config.road_width_fraction,
            config.lane_count,
        )
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    pub fn middle_lane(&self) -> usize {
        self.lane_count / 2
    }

    pub fn road_width(&self) -> f32 {
        self.screen_width * self.road_width_fraction
    }

    pub fn lane_width(&self) -> f32 {
        self.road_width() / self.lane_count as f32
    }

    pub fn road_left_edge(&self) -> f32 {
        (self.screen_width - self.road_width()) / 2.0
    }

    /// Centre x of `lane`. Out of range is a caller bug, clamp the target
    /// lane with `step_lane` before asking.
    pub fn lane_position(&self, lane: usize) -> f32 {
        debug_assert!(
            lane < self.lane_count,
            "lane {} out of range 0..{}",
            lane,
            self.lane_count
        );
        let lane_width = self.lane_width();
        self.road_left_edge() + lane as f32 * lane_width + lane_width / 2.0
    }

    /// Lane whose strip contains `x`, clamped to the road
    pub fn nearest_lane(&self, x: f32) -> usize {
        let offset = (x - self.road_left_edge()) / self.lane_width();
        if offset.is_nan() || offset < 0.0 {
            return 0;
        }
        (offset.floor() as usize).min(self.lane_count - 1)
    }

    /// `current + direction`, clamped to `0..lane_count`
    pub fn step_lane(&self, current: usize, direction: Direction) -> usize {
        let last = self.lane_count as isize - 1;
        (current as isize + direction.delta()).clamp(0, last) as usize
    }
}
