// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                          ship/ module layout                             │
// ├────────────────┬─────────────────────────────────────────────────────────┤
// │ mod.rs         │ phases (Playing, GameOver), Direction, InputSnapshot    │
// │ state.rs       │ ShipState<Phase> typestate + ShipContext (pos, speed)   │
// │ spaceship.rs   │ ShipStateMachine, Event, advance() once per frame       │
// └────────────────┴─────────────────────────────────────────────────────────┘
pub mod spaceship;
pub mod state;

use crate::engine::input::KeyState;

/// Marker for the phases a ship can be in, only used at the type level
pub trait FlightPhase {
    fn name() -> &'static str;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Playing;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GameOver;

impl FlightPhase for Playing {
    fn name() -> &'static str {
        "Playing"
    }
}

impl FlightPhase for GameOver {
    fn name() -> &'static str {
        "GameOver"
    }
}

/// Arrow key directions
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    Up,
    Left,
    Right,
}

impl Direction {
    /// When several arrows are held, the first one in this list is the
    /// active one
    pub const PRECEDENCE: [Direction; 4] = [
        Direction::Down,
        Direction::Up,
        Direction::Left,
        Direction::Right,
    ];

    /// `KeyboardEvent.key` of the arrow, also the atlas `pressed` entry name
    pub fn key(self) -> &'static str {
        match self {
            Direction::Down => "ArrowDown",
            Direction::Up => "ArrowUp",
            Direction::Left => "ArrowLeft",
            Direction::Right => "ArrowRight",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Arrow keys held during one frame, other keys never show up here
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct InputSnapshot {
    held: [bool; 4],
}

impl InputSnapshot {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_keystate(keystate: &KeyState) -> Self {
        Direction::PRECEDENCE
            .iter()
            .filter(|direction| keystate.is_pressed(direction.key()))
            .fold(Self::none(), |snapshot, &direction| snapshot.with(direction))
    }

    pub fn with(mut self, direction: Direction) -> Self {
        self.held[direction.index()] = true;
        self
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held[direction.index()]
    }

    /// Highest precedence held direction
    pub fn active(&self) -> Option<Direction> {
        Direction::PRECEDENCE
            .into_iter()
            .find(|&direction| self.is_held(direction))
    }
}

impl From<&KeyState> for InputSnapshot {
    fn from(keystate: &KeyState) -> Self {
        InputSnapshot::from_keystate(keystate)
    }
}
