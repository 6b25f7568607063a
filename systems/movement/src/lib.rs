#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement system that turns player input and position fixes into move commands.

use geocache_core::{Command, Direction, Point};

/// Configuration parameters required to construct the movement system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    step_length: f64,
    tracking: Tracking,
}

impl Config {
    /// Creates a configuration stepping `step_length` degrees per direction
    /// input and starting in the provided tracking mode.
    #[must_use]
    pub const fn new(step_length: f64, tracking: Tracking) -> Self {
        Self {
            step_length,
            tracking,
        }
    }
}

/// Source the player's position is currently taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tracking {
    /// Direction inputs move the player; sensor fixes are ignored.
    Manual,
    /// Sensor fixes move the player; direction inputs are ignored.
    Sensor,
}

/// Discrete input delivered to the movement system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovementInput {
    /// A single step in a cardinal direction.
    Step(Direction),
    /// A position reported by the geolocation sensor.
    SensorFix(Point),
    /// Starts or stops following the geolocation sensor.
    ToggleTracking,
}

/// Pure system that converts movement inputs into [`Command::MovePlayer`].
#[derive(Debug)]
pub struct Movement {
    step_length: f64,
    tracking: Tracking,
}

impl Movement {
    /// Creates a new movement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            step_length: config.step_length,
            tracking: config.tracking,
        }
    }

    /// Tracking mode currently in effect.
    #[must_use]
    pub const fn tracking(&self) -> Tracking {
        self.tracking
    }

    /// Consumes inputs in order, starting from `position`, and emits one move
    /// command per accepted input.
    pub fn handle(&mut self, inputs: &[MovementInput], position: Point, out: &mut Vec<Command>) {
        let mut current = position;
        for input in inputs {
            let next = match (*input, self.tracking) {
                (MovementInput::ToggleTracking, _) => {
                    self.tracking = match self.tracking {
                        Tracking::Manual => Tracking::Sensor,
                        Tracking::Sensor => Tracking::Manual,
                    };
                    continue;
                }
                (MovementInput::Step(direction), Tracking::Manual) => {
                    let (d_lat, d_lng) = direction.unit_step();
                    match current.offset(d_lat * self.step_length, d_lng * self.step_length) {
                        Ok(next) => next,
                        Err(_) => continue,
                    }
                }
                (MovementInput::SensorFix(fix), Tracking::Sensor) => fix,
                _ => continue,
            };
            out.push(Command::MovePlayer { to: next });
            current = next;
        }
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(Config::new(1e-4, Tracking::Manual))
    }
}
