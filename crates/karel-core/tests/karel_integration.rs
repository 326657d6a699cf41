use karel_core::{
    BeeperBag, Direction, Karel, KarelConfig, KarelError, Position, Preset, SnapshotView, Step,
    World, WorldSource,
};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Renderer that records the state it was shown, so tests can check what the
/// renderer observed at each step.
fn recording_renderer() -> impl FnMut(&SnapshotView<'_>) -> (u64, Position, Direction) {
    |view: &SnapshotView<'_>| (view.step.0, view.position, view.direction)
}

#[test]
fn obstacles_preset_collides_exactly_at_walls() {
    let world = World::preset(Preset::Obstacles);
    let mut karel = Karel::headless(KarelConfig::for_preset("obstaculos")).expect("karel");

    let mut moves = 0;
    loop {
        let ahead = karel
            .position()
            .offset(karel.facing_offset())
            .expect("facing east never goes negative");
        let wall_ahead = world.is_blocked(ahead).unwrap_or(false);
        match karel.move_forward() {
            Ok(()) => {
                assert!(!wall_ahead, "moved into a wall at {ahead}");
                moves += 1;
            }
            Err(KarelError::Collision {
                position,
                direction,
            }) => {
                assert!(wall_ahead, "collision reported without a wall at {ahead}");
                assert_eq!(position, Position::new(1, 0));
                assert_eq!(direction, Direction::East);
                break;
            }
            Err(other) => panic!("unexpected error {other}"),
        }
    }
    assert_eq!(moves, 1);
    assert_eq!(karel.history().len(), 1);
}

#[test]
fn empty_grid_walk_ends_out_of_world() {
    let mut karel = Karel::headless(KarelConfig::default()).expect("karel");
    for _ in 0..4 {
        karel.move_forward().expect("open cell ahead");
    }
    assert_eq!(karel.position(), Position::new(4, 0));
    assert!(karel.front_is_clear(), "two-stage sensor does not see the far edge");
    assert_eq!(
        karel.move_forward(),
        Err(KarelError::OutOfWorld {
            position: Position::new(4, 0),
            direction: Direction::East,
        })
    );
    assert_eq!(karel.position(), Position::new(4, 0));
    assert_eq!(karel.step(), Step(4));
}

#[test]
fn moving_off_the_lower_edge_is_a_collision() {
    let mut karel = Karel::headless(KarelConfig {
        facing: Direction::West,
        ..KarelConfig::default()
    })
    .expect("karel");
    assert!(karel.front_is_blocked());
    assert!(matches!(
        karel.move_forward(),
        Err(KarelError::Collision { .. })
    ));
    assert!(karel.history().is_empty());
}

#[test]
fn starting_on_a_wall_fails_before_any_snapshot() {
    let mut rendered = 0usize;
    let config = KarelConfig {
        start: Position::new(2, 0),
        ..KarelConfig::for_preset("obstaculos")
    };
    let result = Karel::new(config, |_: &SnapshotView<'_>| rendered += 1);
    assert_eq!(
        result.err(),
        Some(KarelError::StartOnObstacle {
            position: Position::new(2, 0)
        })
    );
    assert_eq!(rendered, 0);
}

#[test]
fn starting_outside_the_world_is_out_of_bounds() {
    let config = KarelConfig {
        start: Position::new(0, 3),
        ..KarelConfig::for_preset("obstaculos")
    };
    assert_eq!(
        Karel::headless(config).err(),
        Some(KarelError::OutOfBounds {
            position: Position::new(0, 3),
            width: 5,
            height: 3,
        })
    );
}

#[test]
fn unknown_preset_falls_back_to_default_grid() {
    let karel = Karel::headless(KarelConfig::for_preset("atlantis")).expect("karel");
    assert_eq!(karel.world(), &World::default());
}

#[test]
fn turns_compose_to_identity() {
    for facing in Direction::ALL {
        let mut karel = Karel::headless(KarelConfig {
            facing,
            start: Position::new(2, 2),
            ..KarelConfig::default()
        })
        .expect("karel");
        for _ in 0..4 {
            karel.turn_left();
        }
        assert_eq!(karel.direction(), facing);
        karel.turn_right();
        karel.turn_left();
        assert_eq!(karel.direction(), facing);
        karel.turn_left();
        karel.turn_right();
        assert_eq!(karel.direction(), facing);
        assert_eq!(karel.position(), Position::new(2, 2));
    }
}

#[test]
fn put_then_pick_restores_counts() {
    let config = KarelConfig {
        world: WorldSource::Preset("beepers".into()),
        start: Position::new(2, 2),
        bag: BeeperBag::Counted(4),
        ..KarelConfig::default()
    };
    let mut karel = Karel::headless(config).expect("karel");
    let before_here = karel.count_beepers_here();
    let before_bag = karel.carried_beepers();
    assert_eq!(before_here, 3);

    karel.put_beeper().expect("put");
    assert_eq!(karel.count_beepers_here(), before_here + 1);
    karel.pick_beeper().expect("pick");

    assert_eq!(karel.count_beepers_here(), before_here);
    assert_eq!(karel.carried_beepers(), before_bag);
}

#[test]
fn picking_from_an_empty_cell_changes_nothing() {
    let mut karel = Karel::headless(KarelConfig::for_preset("beepers")).expect("karel");
    let before = karel.beepers().clone();
    assert_eq!(
        karel.pick_beeper(),
        Err(KarelError::NoBeeperHere {
            position: Position::new(0, 0)
        })
    );
    assert_eq!(karel.beepers(), &before);
    assert_eq!(karel.step(), Step::zero());
}

#[test]
fn renderer_sees_post_action_state() {
    let mut karel =
        Karel::new(KarelConfig::default(), recording_renderer()).expect("karel");
    karel.move_forward().expect("move");
    karel.turn_left();
    karel.move_forward().expect("move");

    let seen: Vec<_> = karel.history().iter().map(|frame| frame.artifact).collect();
    assert_eq!(
        seen,
        vec![
            (1, Position::new(1, 0), Direction::East),
            (2, Position::new(1, 0), Direction::North),
            (3, Position::new(1, 1), Direction::North),
        ]
    );
    for frame in karel.history() {
        assert_eq!(frame.step.0, frame.artifact.0);
    }
}

#[test]
fn history_cap_evicts_oldest_frames() {
    let config = KarelConfig {
        history_capacity: Some(5),
        ..KarelConfig::default()
    };
    let mut karel = Karel::new(config, recording_renderer()).expect("karel");
    for _ in 0..12 {
        karel.turn_left();
    }
    let history = karel.history();
    assert_eq!(history.len(), 5);
    assert_eq!(history.evicted(), 7);
    let steps: Vec<u64> = history.iter().map(|frame| frame.step.0).collect();
    assert_eq!(steps, vec![8, 9, 10, 11, 12]);
    assert_eq!(karel.step(), Step(12));
}

#[test]
fn default_history_cap_is_one_hundred() {
    let mut karel = Karel::headless(KarelConfig::default()).expect("karel");
    for _ in 0..150 {
        karel.turn_left();
    }
    assert_eq!(karel.history().capacity(), Some(100));
    assert_eq!(karel.history().len(), 100);
    assert_eq!(karel.history().get(0).map(|f| f.step), Some(Step(51)));
}

#[test]
fn seeded_random_programs_preserve_invariants() {
    let mut rng = SmallRng::seed_from_u64(0x5EED_CAFE);
    for preset in Preset::ALL {
        let config = KarelConfig {
            world: WorldSource::Custom(World::preset(preset)),
            bag: BeeperBag::Counted(3),
            history_capacity: Some(32),
            ..KarelConfig::default()
        };
        let mut karel = Karel::headless(config).expect("karel");
        let initial_total: u32 = karel.beepers().values().sum::<u32>() + 3;

        for _ in 0..500 {
            let before_step = karel.step();
            let before_position = karel.position();
            let before_direction = karel.direction();
            let before_beepers = karel.beepers().clone();
            let before_bag = karel.carried_beepers();

            let action = rng.gen_range(0..5);
            let outcome = match action {
                0 | 1 => karel.move_forward(),
                2 => {
                    karel.turn_left();
                    Ok(())
                }
                3 => karel.put_beeper(),
                _ => karel.pick_beeper(),
            };

            let world = karel.world();
            assert!(world.is_inside(karel.position()));
            assert_eq!(world.is_blocked(karel.position()), Ok(false));
            assert!(karel.history().len() <= 32);
            assert!(karel.beepers().values().all(|&count| count > 0));
            let total: u32 =
                karel.beepers().values().sum::<u32>() + karel.carried_beepers().unwrap_or(0);
            assert_eq!(total, initial_total, "beepers are conserved");

            if outcome.is_err() {
                assert_eq!(karel.step(), before_step);
                assert_eq!(karel.position(), before_position);
                assert_eq!(karel.direction(), before_direction);
                assert_eq!(karel.beepers(), &before_beepers);
                assert_eq!(karel.carried_beepers(), before_bag);
            } else {
                assert!(karel.step() > before_step);
                match action {
                    0 | 1 => assert_eq!(karel.direction(), before_direction),
                    2 => {
                        assert_eq!(karel.position(), before_position);
                        assert_eq!(karel.direction(), before_direction.left());
                    }
                    _ => {
                        assert_eq!(karel.position(), before_position);
                        assert_eq!(karel.direction(), before_direction);
                    }
                }
            }
        }
    }
}
