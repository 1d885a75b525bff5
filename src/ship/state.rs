//! All code relating to individual phases sits behind this module and keeps
//! invalid transitions unrepresentable :
//! - PUBLIC  : ShipState and ShipContext
//! - PRIVATE : context mutators, only reachable through the phase methods
use crate::config::GameConfig;
use crate::engine::{Point, Size};
use crate::level::{self, BoundingBox, TileGrid};
use crate::ship::{GameOver, Playing};

/// Result of the collision check at the top of a frame
pub enum IsColliding {
    Clear(ShipState<Playing>),
    Crashed(ShipState<GameOver>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Shared data of every phase
/// - position : top left of the collision box, in level pixels
/// - speed    : horizontal pixels per frame, also used for climbing and diving
pub struct ShipContext {
    pub position: Point,
    pub speed: i32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShipState<S> {
    context: ShipContext,
    // phase marker, never read, only tells the states apart at compile time
    _state: S,
}

impl<S> ShipState<S> {
    pub fn context(&self) -> &ShipContext {
        &self.context
    }
}

impl ShipState<Playing> {
    pub fn new(position: Point, speed: i32) -> Self {
        ShipState {
            context: ShipContext { position, speed },
            _state: Playing,
        }
    }

    pub fn check_collision(self, level: &TileGrid, config: &GameConfig) -> IsColliding {
        let bounding_box = self.context.bounding_box(config.ship_size);
        if level::can_move(&bounding_box, level, config.tile_size) {
            IsColliding::Clear(self)
        } else {
            IsColliding::Crashed(self.crash())
        }
    }

    /// No key held, keep flying right
    pub fn cruise(mut self) -> Self {
        self.context = self.context.drift();
        self
    }

    pub fn descend(mut self) -> Self {
        let speed = self.context.speed;
        self.context = self.context.drift().climb(-speed);
        self
    }

    pub fn ascend(mut self) -> Self {
        let speed = self.context.speed;
        self.context = self.context.drift().climb(speed);
        self
    }

    /// Moves with the current speed, the lower speed applies from the next frame
    pub fn brake(mut self, config: &GameConfig) -> Self {
        let speed = config.clamp_speed(self.context.speed - 1);
        self.context = self.context.drift().with_speed(speed);
        self
    }

    /// Moves with the current speed, the higher speed applies from the next frame
    pub fn boost(mut self, config: &GameConfig) -> Self {
        let speed = config.clamp_speed(self.context.speed + 1);
        self.context = self.context.drift().with_speed(speed);
        self
    }

    fn crash(self) -> ShipState<GameOver> {
        ShipState {
            context: self.context,
            _state: GameOver,
        }
    }
}

impl ShipContext {
    pub fn bounding_box(&self, size: Size) -> BoundingBox {
        BoundingBox::new(
            self.position.x,
            self.position.y,
            self.position.x + size.width,
            self.position.y + size.height,
        )
    }

    fn drift(mut self) -> Self {
        self.position.x += self.speed;
        self
    }

    /// positive climbs, y grows downwards on the canvas
    fn climb(mut self, dy: i32) -> Self {
        self.position.y -= dy;
        self
    }

    fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }
}
