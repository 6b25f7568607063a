use geocache_core::{Command, Direction, Event, GameConfig, Point};
use geocache_system_movement::{Config, Movement, MovementInput, Tracking};
use geocache_world::{self as world, query, World};

fn point(lat: f64, lng: f64) -> Point {
    Point::new(lat, lng).expect("finite")
}

fn world() -> World {
    World::new(GameConfig::default().with_origin(point(0.0, 0.0)))
}

fn pump(world: &mut World, movement: &mut Movement, inputs: &[MovementInput]) -> Vec<Event> {
    let mut commands = Vec::new();
    movement.handle(inputs, query::position(world), &mut commands);
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[test]
fn manual_steps_move_one_tile_per_input() {
    let mut world = world();
    let mut movement = Movement::new(Config::new(1e-4, Tracking::Manual));

    let events = pump(
        &mut world,
        &mut movement,
        &[
            MovementInput::Step(Direction::North),
            MovementInput::Step(Direction::North),
            MovementInput::Step(Direction::East),
        ],
    );

    assert_eq!(events.len(), 3);
    let trail = query::trail(&world);
    assert_eq!(trail.len(), 3);
    assert!((trail[2].lat() - 2e-4).abs() < 1e-12);
    assert!((trail[2].lng() - 1e-4).abs() < 1e-12);
    assert_eq!(query::player_cell(&world).column(), 1);
}

#[test]
fn manual_mode_ignores_sensor_fixes() {
    let mut world = world();
    let mut movement = Movement::default();

    let events = pump(
        &mut world,
        &mut movement,
        &[MovementInput::SensorFix(point(1.0, 1.0))],
    );

    assert!(events.is_empty());
    assert_eq!(query::position(&world), point(0.0, 0.0));
}

#[test]
fn sensor_tracking_follows_fixes_until_stopped() {
    let mut world = world();
    let mut movement = Movement::default();

    let events = pump(
        &mut world,
        &mut movement,
        &[
            MovementInput::ToggleTracking,
            MovementInput::SensorFix(point(0.5, 0.5)),
            MovementInput::Step(Direction::South),
            MovementInput::ToggleTracking,
            MovementInput::SensorFix(point(0.9, 0.9)),
            MovementInput::Step(Direction::South),
        ],
    );

    assert_eq!(events.len(), 2);
    assert_eq!(movement.tracking(), Tracking::Manual);
    let position = query::position(&world);
    assert!((position.lat() - (0.5 - 1e-4)).abs() < 1e-12);
    assert!((position.lng() - 0.5).abs() < 1e-12);
    assert!(matches!(
        events[0],
        Event::PlayerMoved { to, .. } if to == point(0.5, 0.5)
    ));
}

#[test]
fn each_move_is_a_move_player_command() {
    let mut movement = Movement::default();
    let mut commands = Vec::new();
    movement.handle(
        &[MovementInput::Step(Direction::West)],
        point(0.0, 0.0),
        &mut commands,
    );

    match commands.as_slice() {
        [Command::MovePlayer { to }] => assert!((to.lng() + 1e-4).abs() < 1e-12),
        other => panic!("unexpected commands: {other:?}"),
    }
}
