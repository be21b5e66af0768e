use approx::assert_relative_eq;
use rail_shooter::config::{GameConfig, PointerMode};
use rail_shooter::sim::entities::{EntityManager, EntityRules};
use rail_shooter::sim::input::{InputSnapshot, PointerEvent, PointerPhase};
use rail_shooter::sim::kinematics::{obstacle_speed_multiplier, Horizon};
use rail_shooter::sim::lanes::{Direction, LaneLocator};
use rail_shooter::sim::player::{Handling, Player};
use rail_shooter::sim::state::{GameState, AVOID_PROGRESS, AVOID_SCORE};
use rail_shooter::sim::{FrameEvent, World};

const FRAME_MS: f32 = 1000.0 / 60.0;

fn horizon(config: &GameConfig) -> Horizon {
    Horizon::new(
        config.projection,
        config.screen_width,
        config.screen_height,
        config.horizon_fraction,
    )
}

fn quiet_config() -> GameConfig {
    GameConfig {
        // keep the spawner out of the way
        obstacle_spawn_interval_ms: 1.0e9,
        ..GameConfig::default()
    }
}

#[test]
fn scenario_a_three_lefts_reach_the_edge() {
    let lanes = LaneLocator::new(800.0, 0.8, 7);
    let handling = Handling {
        step: 0.05,
        max_bank: 0.26,
    };
    let mut player = Player::in_lane(3, &lanes, 500.0, handling);

    for expected in [2, 1, 0] {
        assert!(player.steer(Direction::Left, &lanes));
        while !player.is_stable() {
            player.update(&lanes);
        }
        assert_eq!(player.current_lane(), expected);
    }

    assert!(!player.steer(Direction::Left, &lanes));
    assert!(player.is_stable());
    assert_eq!(player.current_lane(), 0);
    assert_eq!(player.target_lane(), 0);
}

#[test]
fn scenario_a_through_the_world() {
    let mut world = World::new(quiet_config(), 1);
    let left = InputSnapshot {
        left_pressed: true,
        left_held: true,
        ..InputSnapshot::default()
    };
    let idle = InputSnapshot::default();
    for _ in 0..3 {
        let report = world.step(&left, FRAME_MS);
        assert!(report.contains(|e| matches!(e, FrameEvent::LaneChangeStarted { .. })));
        for _ in 0..30 {
            world.step(&idle, FRAME_MS);
        }
    }
    assert_eq!(world.player().current_lane(), 0);
    let report = world.step(&left, FRAME_MS);
    assert!(!report.contains(|e| matches!(e, FrameEvent::LaneChangeStarted { .. })));
    assert!(world.player().is_stable());
}

#[test]
fn scenario_b_obstacle_kinematics_and_avoid_award() {
    let config = GameConfig {
        obstacle_speed: 2.0,
        ..quiet_config()
    };
    let horizon = horizon(&config);
    let lanes = LaneLocator::from_config(&config);
    let mut entities = EntityManager::new(EntityRules::from_config(&config));
    let mut state = GameState::new(&config);

    entities.spawn_obstacle(2, &lanes, &horizon);
    let mut expected_y = horizon.y();
    let despawn_y = config.screen_height + 50.0;
    let mut frames = 0;

    loop {
        let distance = horizon.normalized_distance(expected_y);
        expected_y += 2.0 * obstacle_speed_multiplier(distance);
        frames += 1;

        let avoided = entities.advance_obstacles(&horizon);
        let (score, progress) = (state.score(), state.progress());
        for _ in &avoided {
            state.award(AVOID_SCORE, AVOID_PROGRESS);
        }

        if expected_y > despawn_y {
            assert_eq!(avoided.len(), 1);
            assert_eq!(avoided[0].lane, 2);
            assert_eq!(state.score(), score + 10);
            assert_eq!(state.progress(), progress + 1);
            assert!(entities.obstacles().is_empty());
            break;
        }

        assert!(avoided.is_empty(), "removed early at frame {}", frames);
        let obstacle = &entities.obstacles()[0];
        assert_relative_eq!(obstacle.y, expected_y, epsilon = 1e-3);
        assert_eq!(obstacle.lane(), 2);
        assert!(frames < 10_000);
    }
}

#[test]
fn scenario_b_progress_cap() {
    let config = quiet_config();
    let mut state = GameState::new(&config);
    for _ in 0..150 {
        state.award(AVOID_SCORE, AVOID_PROGRESS);
    }
    assert_eq!(state.progress(), 100);
    assert_eq!(state.score(), 1500);
}

#[test]
fn scenario_c_fire_rate_throttle() {
    let config = quiet_config();
    let horizon = horizon(&config);
    let mut entities = EntityManager::new(EntityRules::from_config(&config));
    let fire_rate = config.fire_rate_ms;

    assert!(entities.try_fire(0.0, 400.0, 460.0, &horizon).is_some());
    assert_eq!(entities.last_fire_ms(), Some(0.0));

    assert!(entities
        .try_fire(fire_rate / 2.0, 400.0, 460.0, &horizon)
        .is_none());
    assert_eq!(entities.projectiles().len(), 1);
    assert_eq!(entities.last_fire_ms(), Some(0.0));

    assert!(entities
        .try_fire(fire_rate + 1.0, 400.0, 460.0, &horizon)
        .is_some());
    assert_eq!(entities.projectiles().len(), 2);
    assert_eq!(entities.last_fire_ms(), Some(fire_rate + 1.0));
}

#[test]
fn road_segment_count_survives_many_cycles() {
    let config = quiet_config();
    let mut world = World::new(config.clone(), 9);
    let idle = InputSnapshot::default();
    for _ in 0..50_000 {
        world.step(&idle, FRAME_MS);
    }
    assert_eq!(world.road().segments().len(), config.segment_count);
}

#[test]
fn repeated_overlap_while_invulnerable_is_ignored() {
    let mut world = World::new(quiet_config(), 3);
    let lane = world.player().current_lane();
    let player_y = world.player().y();

    let place = |world: &mut World| {
        let id = world.spawn_obstacle(lane);
        if let Some(obstacle) = world
            .entities_mut()
            .obstacles_mut()
            .iter_mut()
            .find(|o| o.id() == id)
        {
            obstacle.y = player_y;
        }
        id
    };

    place(&mut world);
    world.step(&InputSnapshot::default(), FRAME_MS);
    assert_eq!(world.state().health(), 80);
    assert!(world.state().is_invulnerable());

    let second = place(&mut world);
    for _ in 0..5 {
        let report = world.step(&InputSnapshot::default(), FRAME_MS);
        assert!(!report.contains(|e| matches!(e, FrameEvent::PlayerHit { .. })));
    }
    assert_eq!(world.state().health(), 80);
    assert!(world.entities().obstacles().iter().any(|o| o.id() == second));
}

#[test]
fn health_reaching_zero_reports_game_over_once() {
    let config = GameConfig {
        invulnerability_ms: 0.0,
        ..quiet_config()
    };
    let mut world = World::new(config, 5);
    let lane = world.player().current_lane();
    let player_y = world.player().y();
    let mut game_overs = 0;

    for _ in 0..8 {
        let id = world.spawn_obstacle(lane);
        if let Some(obstacle) = world
            .entities_mut()
            .obstacles_mut()
            .iter_mut()
            .find(|o| o.id() == id)
        {
            obstacle.y = player_y;
        }
        let report = world.step(&InputSnapshot::default(), FRAME_MS);
        game_overs += report
            .events
            .iter()
            .filter(|e| matches!(e, FrameEvent::GameOver { .. }))
            .count();
    }
    assert_eq!(world.state().health(), 0);
    assert_eq!(game_overs, 1);
}

#[test]
fn pause_freezes_the_world_and_drops_input() {
    let config = GameConfig {
        pointer_mode: PointerMode::DragToMove,
        ..quiet_config()
    };
    let mut world = World::new(config, 11);
    world.spawn_obstacle(1);
    world.step(&InputSnapshot::default(), FRAME_MS);

    let escape = InputSnapshot {
        menu_pressed: true,
        ..InputSnapshot::default()
    };
    world.step(&escape, FRAME_MS);
    assert!(world.state().is_paused());

    let road = world.road().segments().to_vec();
    let obstacles = world.entities().obstacles().to_vec();
    let clock = world.clock_ms();
    let busy = InputSnapshot {
        left_pressed: true,
        left_held: true,
        fire_held: true,
        pointer: vec![
            PointerEvent {
                phase: PointerPhase::Down,
                x: world.lanes().lane_position(6),
                y: 560.0,
            },
            PointerEvent {
                phase: PointerPhase::Move,
                x: world.lanes().lane_position(5),
                y: 560.0,
            },
        ],
        ..InputSnapshot::default()
    };
    for _ in 0..30 {
        let report = world.step(&busy, FRAME_MS);
        assert!(report.events.is_empty());
    }
    assert_eq!(world.road().segments(), road.as_slice());
    assert_eq!(world.entities().obstacles(), obstacles.as_slice());
    assert!(world.entities().projectiles().is_empty());
    assert_eq!(world.clock_ms(), clock);
    assert!(!world.controls().is_dragging());
    assert_eq!(world.controls().goal_lane(), None);

    let report = world.step(&escape, FRAME_MS);
    assert!(!report.contains(|e| matches!(e, FrameEvent::LaneChangeStarted { .. })));
    for _ in 0..30 {
        world.step(&InputSnapshot::default(), FRAME_MS);
    }
    assert_eq!(world.player().current_lane(), 3);
}
