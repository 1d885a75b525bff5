use crate::config::GameConfig;
use crate::engine::{Point, Rect};
use crate::level::TileGrid;
use crate::ship::state::{IsColliding, ShipContext, ShipState};
use crate::ship::{Direction, FlightPhase, GameOver, InputSnapshot, Playing};

/// ┌──────────────── State Transition Flow ──────────────────┐
/// │  From State  →  Event    →  To State                    │
/// ├─────────────────────────────────────────────────────────┤
/// │  Playing     →  (tile)   →  GameOver  blocked tile      │
/// │  Playing     →  Cruise   →  Playing   x += speed        │
/// │  Playing     →  Descend  →  Playing   x, y += speed     │
/// │  Playing     →  Ascend   →  Playing   x += , y -= speed │
/// │  Playing     →  Brake    →  Playing   speed - 1 (>= 1)  │
/// │  Playing     →  Boost    →  Playing   speed + 1 (<= 5)  │
/// │  -------                                                │
/// │  GameOver    →  any      →  GameOver                    │
/// └─────────────────────────────────────────────────────────┘
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    Cruise,
    Descend,
    Ascend,
    Brake,
    Boost,
}

impl From<Option<Direction>> for Event {
    fn from(direction: Option<Direction>) -> Self {
        match direction {
            None => Event::Cruise,
            Some(Direction::Down) => Event::Descend,
            Some(Direction::Up) => Event::Ascend,
            Some(Direction::Left) => Event::Brake,
            Some(Direction::Right) => Event::Boost,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShipStateMachine {
    Playing(ShipState<Playing>),
    GameOver(ShipState<GameOver>),
}

impl From<ShipState<Playing>> for ShipStateMachine {
    fn from(state: ShipState<Playing>) -> Self {
        ShipStateMachine::Playing(state)
    }
}

impl From<ShipState<GameOver>> for ShipStateMachine {
    fn from(state: ShipState<GameOver>) -> Self {
        ShipStateMachine::GameOver(state)
    }
}

impl From<IsColliding> for ShipStateMachine {
    fn from(is_colliding: IsColliding) -> Self {
        match is_colliding {
            IsColliding::Clear(playing_state) => playing_state.into(),
            IsColliding::Crashed(game_over_state) => game_over_state.into(),
        }
    }
}

impl ShipStateMachine {
    pub fn new(config: &GameConfig) -> Self {
        ShipState::new(config.start_position, config.start_speed).into()
    }

    /// One frame of flight
    /// - crash when the collision box touches a blocked (or missing) tile
    /// - otherwise steer by the highest precedence arrow held
    /// Consumes the old state, the caller keeps the returned one
    pub fn advance(self, input: &InputSnapshot, level: &TileGrid, config: &GameConfig) -> Self {
        match self {
            ShipStateMachine::Playing(state) => {
                // a crashed ship ignores the steering event
                ShipStateMachine::from(state.check_collision(level, config))
                    .transition(input.active().into(), config)
            }
            ShipStateMachine::GameOver(_) => self,
        }
    }

    fn transition(self, event: Event, config: &GameConfig) -> Self {
        use ShipStateMachine::*;
        match (self, event) {
            (Playing(state), Event::Cruise) => state.cruise().into(),
            (Playing(state), Event::Descend) => state.descend().into(),
            (Playing(state), Event::Ascend) => state.ascend().into(),
            (Playing(state), Event::Brake) => state.brake(config).into(),
            (Playing(state), Event::Boost) => state.boost(config).into(),
            (GameOver(_), _) => self,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, ShipStateMachine::Playing(_))
    }

    pub fn phase_name(&self) -> &'static str {
        match self {
            ShipStateMachine::Playing(_) => Playing::name(),
            ShipStateMachine::GameOver(_) => GameOver::name(),
        }
    }

    pub fn context(&self) -> &ShipContext {
        match self {
            ShipStateMachine::Playing(state) => state.context(),
            ShipStateMachine::GameOver(state) => state.context(),
        }
    }

    pub fn position(&self) -> Point {
        self.context().position
    }

    pub fn speed(&self) -> i32 {
        self.context().speed
    }

    /// collision box in level pixels, for debug drawing
    pub fn bounding_box(&self, config: &GameConfig) -> Rect {
        Rect::new(self.position(), config.ship_size)
    }
}
