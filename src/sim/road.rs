use crate::config::{GameConfig, ProjectionMode};
use crate::sim::kinematics::Horizon;

/// Alternating band colours, 0 = light, 1 = dark
pub const STRIPE_COUNT: usize = 2;

const MARKING_WIDTH: f32 = 4.0;

/// Dashed divider between two lanes, carried by one road band
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LaneMarking {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    /// top edge
    pub y: f32,
    pub height: f32,
    pub width: f32,
    pub color_index: usize,
    pub lane_markings: Vec<LaneMarking>,
}

/// Fixed pool of horizontal bands between the horizon and the screen
/// bottom. Bands only ever move down; one that leaves the screen is put
/// back on top of the band closest to the horizon.
pub struct RoadSegmenter {
    segments: Vec<RoadSegment>,
    horizon: Horizon,
    mode: ProjectionMode,
    full_width: f32,
    screen_width: f32,
    lane_count: usize,
    scroll_speed: f32,
}

impl RoadSegmenter {
    pub fn new(config: &GameConfig, horizon: Horizon) -> Self {
        let height = (config.screen_height - horizon.y()) / config.segment_count as f32;
        let mut road = RoadSegmenter {
            segments: Vec::with_capacity(config.segment_count),
            horizon,
            mode: config.projection,
            full_width: config.screen_width * config.road_width_fraction,
            screen_width: config.screen_width,
            lane_count: config.lane_count,
            scroll_speed: config.road_scroll_speed,
        };
        for index in 0..config.segment_count {
            let mut segment = RoadSegment {
                y: horizon.y() + index as f32 * height,
                height,
                width: 0.0,
                color_index: index % STRIPE_COUNT,
                lane_markings: Vec::with_capacity(config.lane_count.saturating_sub(1)),
            };
            road.reproject(&mut segment);
            road.segments.push(segment);
        }
        road
    }

    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    /// Scroll every band down by `scroll_speed * delta_speed`, recycle the
    /// ones that fell off the bottom, then re-derive widths.
    pub fn advance(&mut self, delta_speed: f32) {
        let shift = self.scroll_speed * delta_speed;
        for segment in self.segments.iter_mut() {
            segment.y += shift;
        }

        let bottom = self.horizon.screen_height();
        // more than one band can leave per frame at high scroll speeds
        while let Some(index) = self.segments.iter().position(|s| s.y > bottom) {
            let top = self
                .segments
                .iter()
                .map(|s| s.y)
                .fold(f32::INFINITY, f32::min);
            let segment = &mut self.segments[index];
            segment.y = top - segment.height;
        }

        let mut segments = std::mem::take(&mut self.segments);
        for segment in segments.iter_mut() {
            self.reproject(segment);
        }
        self.segments = segments;
    }

    pub fn normalized_distance(&self, segment: &RoadSegment) -> f32 {
        self.horizon.normalized_distance(segment.y)
    }

    /// Road width at screen row `y`
    pub fn width_at(&self, y: f32) -> f32 {
        self.full_width * self.mode.road_width_factor(self.horizon.normalized_distance(y))
    }

    fn reproject(&self, segment: &mut RoadSegment) {
        let distance = self.horizon.normalized_distance(segment.y);
        segment.width = self.width_at(segment.y);

        segment.lane_markings.clear();
        // dashes on every other band give the scrolling illusion
        if segment.color_index != 0 {
            return;
        }
        let left = (self.screen_width - segment.width) / 2.0;
        let lane_width = segment.width / self.lane_count as f32;
        let scale = self.mode.road_width_factor(distance);
        for divider in 1..self.lane_count {
            let width = MARKING_WIDTH * scale;
            segment.lane_markings.push(LaneMarking {
                x: left + divider as f32 * lane_width - width / 2.0,
                y: segment.y + segment.height * 0.25,
                width,
                height: segment.height * 0.5,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn road(config: &GameConfig) -> RoadSegmenter {
        let horizon = Horizon::new(
            config.projection,
            config.screen_width,
            config.screen_height,
            config.horizon_fraction,
        );
        RoadSegmenter::new(config, horizon)
    }

    #[test]
    fn bands_cover_horizon_to_bottom() {
        let config = GameConfig::default();
        let road = road(&config);
        assert_eq!(road.segments().len(), 20);
        let first = &road.segments()[0];
        let last = &road.segments()[19];
        assert_relative_eq!(first.y, 180.0);
        assert_relative_eq!(last.y + last.height, 600.0, epsilon = 1e-3);
    }

    #[test]
    fn bands_narrow_toward_horizon() {
        let config = GameConfig::default();
        let road = road(&config);
        let widths: Vec<f32> = road.segments().iter().map(|s| s.width).collect();
        assert_relative_eq!(widths[0], 640.0 * 0.3);
        for pair in widths.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn recycled_band_goes_above_topmost() {
        let config = GameConfig::default();
        let mut road = road(&config);
        let height = road.segments()[0].height;
        // push the bottom band just past the screen edge
        road.advance(height / config.road_scroll_speed + 0.01);
        let top = road
            .segments()
            .iter()
            .map(|s| s.y)
            .fold(f32::INFINITY, f32::min);
        assert!(road.segments().iter().all(|s| s.y <= 600.0));
        let recycled = &road.segments()[19];
        assert_relative_eq!(recycled.y, top);
        assert_relative_eq!(recycled.y, 180.0, epsilon = 0.05);
        assert_relative_eq!(recycled.width, 640.0 * 0.3, epsilon = 0.1);
    }

    #[test]
    fn segment_count_is_conserved() {
        let config = GameConfig::default();
        let mut road = road(&config);
        for _ in 0..10_000 {
            road.advance(1.0);
            assert_eq!(road.segments().len(), config.segment_count);
        }
        assert!(road.segments().iter().all(|s| s.y <= 600.0));
    }

    #[test]
    fn markings_follow_their_band() {
        let config = GameConfig::default();
        let mut road = road(&config);
        road.advance(3.0);
        for segment in road.segments() {
            if segment.color_index == 0 {
                assert_eq!(segment.lane_markings.len(), config.lane_count - 1);
                for marking in &segment.lane_markings {
                    assert!(marking.y > segment.y);
                    assert!(marking.y + marking.height < segment.y + segment.height);
                }
            } else {
                assert!(segment.lane_markings.is_empty());
            }
        }
    }

    #[test]
    fn top_down_bands_are_full_width() {
        let config = GameConfig {
            projection: ProjectionMode::TopDown,
            ..GameConfig::default()
        };
        let road = road(&config);
        assert_relative_eq!(road.segments()[0].y, 0.0);
        assert!(road.segments().iter().all(|s| s.width == 640.0));
    }
}
