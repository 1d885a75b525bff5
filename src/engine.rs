use crate::browser;
use anyhow::{anyhow, Error, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - because we control the closure creation and specify the expected type,
    // in principle this should be generally safe (unsafe) code
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use self::input::KeyState;

/// TABLE
/// ┌──────────────────────── Frame Overview ─────────────────────────┐
/// │                                                                 │
/// │  requestAnimationFrame(perf)                                    │
/// │     ├─► input::process_input   drain key channel -> KeyState    │
/// │     ├─► GameLoop::tick         0..n fixed updates (60 Hz)       │
/// │     ├─► Game::draw             one render pass                  │
/// │     └─► LoopStatus             Continue -> request next frame   │
/// │                                Stopped  -> never schedule again │
/// └─────────────────────────────────────────────────────────────────┘
#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, keystate: &KeyState);
    fn draw(&self, renderer: &Renderer);

    /// false once the game reached a terminal state, the loop stops after
    /// drawing that frame
    fn is_running(&self) -> bool {
        true
    }
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopStatus {
    Continue,
    Stopped,
}

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut keyevent_receiver = input::prepare_input()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop::new(browser::now()?);
        let renderer = Renderer::new(browser::context()?);
        let mut keystate = KeyState::new();

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut keystate, &mut keyevent_receiver);
            let status = game_loop.tick(game.as_mut(), &keystate, perf);
            game.draw(&renderer);

            match status {
                LoopStatus::Continue => {
                    if let Some(closure) = f.borrow().as_ref() {
                        if let Err(err) = browser::request_animation_frame(closure) {
                            error!("GameLoop: {:#?}", err);
                        }
                    }
                }
                // the closure stays alive in the cell, it just never gets
                // scheduled again
                LoopStatus::Stopped => {
                    log!("GameLoop: game over, loop stopped");
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }

    fn new(now: f64) -> Self {
        GameLoop {
            last_frame: now,
            accumulated_delta: 0.0,
        }
    }

    /// Runs at most one fixed size update per animation frame
    /// - every update is followed by the draw of the same frame
    /// - time beyond one pending frame is dropped, a stalled or hidden tab
    ///   resumes where it left off instead of fast forwarding
    /// - no update runs once the game stopped
    fn tick(&mut self, game: &mut dyn Game, keystate: &KeyState, perf: f64) -> LoopStatus {
        self.accumulated_delta += (perf - self.last_frame) as f32;
        if game.is_running() && self.accumulated_delta > FRAME_SIZE {
            game.update(keystate);
            self.accumulated_delta -= FRAME_SIZE;
        }
        self.accumulated_delta = self.accumulated_delta.min(FRAME_SIZE);
        self.last_frame = perf;

        if game.is_running() {
            LoopStatus::Continue
        } else {
            LoopStatus::Stopped
        }
    }
}

// ==================== Geometry ====================
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub fn new_from_x_y(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect::new(Point { x, y }, Size { width, height })
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    pub fn width(&self) -> i32 {
        self.size.width
    }

    pub fn height(&self) -> i32 {
        self.size.height
    }
}

// ==================== Rendering ====================
pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn new(context: CanvasRenderingContext2d) -> Self {
        Renderer { context }
    }

    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.x().into(),
            rect.y().into(),
            rect.width().into(),
            rect.height().into(),
        );
    }

    pub fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.fill_rect(
            rect.x().into(),
            rect.y().into(),
            rect.width().into(),
            rect.height().into(),
        );
    }

    /// Copies `frame` out of the atlas `image` onto `destination`
    pub fn draw_image(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect) {
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.x().into(),
                frame.y().into(),
                frame.width().into(),
                frame.height().into(),
                destination.x().into(),
                destination.y().into(),
                destination.width().into(),
                destination.height().into(),
            )
        {
            error!("Renderer: could not draw image : {:#?}", err);
        }
    }

    pub fn draw_text(&self, text: &str, font: &str, color: &str, position: Point) {
        draw_text_on(&self.context, text, font, color, position);
    }

    /// Same as draw_text, but waits for `font` to finish loading first
    /// - the text shows up once the font promise resolves
    pub fn draw_text_when_loaded(&self, text: &str, font: &str, color: &str, position: Point) {
        let context = self.context.clone();
        let (text, font, color) = (text.to_owned(), font.to_owned(), color.to_owned());
        browser::spawn_local(async move {
            if let Err(err) = browser::load_font(&font).await {
                // canvas falls back to a default font, still draw the text
                error!("Renderer: {:#?}", err);
            }
            draw_text_on(&context, &text, &font, &color, position);
        });
    }
}

fn draw_text_on(
    context: &CanvasRenderingContext2d,
    text: &str,
    font: &str,
    color: &str,
    position: Point,
) {
    context.set_font(font);
    context.set_fill_style_str(color);
    context.set_text_align("center");
    if let Err(err) = context.fill_text(text, position.x.into(), position.y.into()) {
        error!("Renderer: could not draw text '{}' : {:#?}", text, err);
    }
}

#[cfg(debug_assertions)]
pub trait DebugDraw {
    fn draw_debug(&self, renderer: &Renderer);
}

#[cfg(debug_assertions)]
impl DebugDraw for Rect {
    fn draw_debug(&self, renderer: &Renderer) {
        renderer.context.set_stroke_style_str("#FF0000");
        renderer.context.stroke_rect(
            self.x().into(),
            self.y().into(),
            self.width().into(),
            self.height().into(),
        );
    }
}

// ==================== Assets ====================
/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::create_html_image_element()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image: {:#?}",
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - Result<Result<(), Error>, oneshot::Canceled>
    // - first ? yields channel result : Result<(), Error>
    // - second ? yields image load result : () or propagating Error
    rx.await??;

    Ok(image)
}

// ==================== Input ====================
pub mod input {
    use crate::browser;
    use anyhow::Result;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
    use std::collections::HashSet;
    use wasm_bindgen::JsCast;
    use web_sys::KeyboardEvent;

    /// Keyboard events as they arrive from the document listeners
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum KeyPress {
        KeyDown(String),
        KeyUp(String),
    }

    /// Keys currently held, keyed by `KeyboardEvent.key`
    #[derive(Debug, Default, Clone)]
    pub struct KeyState {
        pressed_keys: HashSet<String>,
    }

    impl KeyState {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn is_pressed(&self, key: &str) -> bool {
            self.pressed_keys.contains(key)
        }

        fn set_pressed(&mut self, key: String) {
            self.pressed_keys.insert(key);
        }

        fn set_released(&mut self, key: &str) {
            self.pressed_keys.remove(key);
        }
    }

    /// Registers keydown / keyup listeners on the document
    /// - listeners only push events into the channel
    /// - the loop owns the receiver and drains it once per frame
    pub fn prepare_input() -> Result<UnboundedReceiver<KeyPress>> {
        let (keydown_sender, keyevent_receiver) = unbounded();
        let keyup_sender = keydown_sender.clone();

        let onkeydown = key_listener(keydown_sender, KeyPress::KeyDown);
        let onkeyup = key_listener(keyup_sender, KeyPress::KeyUp);

        let document = browser::document()?;
        document.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
        document.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));

        // listeners live as long as the page
        onkeydown.forget();
        onkeyup.forget();

        Ok(keyevent_receiver)
    }

    fn key_listener(
        sender: UnboundedSender<KeyPress>,
        to_press: fn(String) -> KeyPress,
    ) -> wasm_bindgen::closure::Closure<dyn FnMut(KeyboardEvent)> {
        browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
            // receiver only goes away with the loop, nothing left to notify
            let _ = sender.unbounded_send(to_press(event.key()));
        }) as Box<dyn FnMut(KeyboardEvent)>)
    }

    /// Drains every pending event into `keystate`, last write wins
    pub fn process_input(keystate: &mut KeyState, keyevent_receiver: &mut UnboundedReceiver<KeyPress>) {
        // stops on an empty or closed channel alike
        while let Ok(event) = keyevent_receiver.try_recv() {
            match event {
                KeyPress::KeyDown(key) => keystate.set_pressed(key),
                KeyPress::KeyUp(key) => keystate.set_released(&key),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn drains_all_pending_events() {
            let (sender, mut receiver) = unbounded();
            let mut keystate = KeyState::new();

            sender.unbounded_send(KeyPress::KeyDown("ArrowUp".into())).unwrap();
            sender.unbounded_send(KeyPress::KeyDown("ArrowLeft".into())).unwrap();
            process_input(&mut keystate, &mut receiver);

            assert!(keystate.is_pressed("ArrowUp"));
            assert!(keystate.is_pressed("ArrowLeft"));
            assert!(!keystate.is_pressed("ArrowDown"));
        }

        #[test]
        fn last_event_for_a_key_wins() {
            let (sender, mut receiver) = unbounded();
            let mut keystate = KeyState::new();

            sender.unbounded_send(KeyPress::KeyDown("ArrowDown".into())).unwrap();
            sender.unbounded_send(KeyPress::KeyUp("ArrowDown".into())).unwrap();
            process_input(&mut keystate, &mut receiver);
            assert!(!keystate.is_pressed("ArrowDown"));

            sender.unbounded_send(KeyPress::KeyDown("ArrowDown".into())).unwrap();
            process_input(&mut keystate, &mut receiver);
            assert!(keystate.is_pressed("ArrowDown"));
        }

        #[test]
        fn closed_channel_keeps_last_state() {
            let (sender, mut receiver) = unbounded();
            let mut keystate = KeyState::new();

            sender.unbounded_send(KeyPress::KeyDown("ArrowRight".into())).unwrap();
            drop(sender);
            process_input(&mut keystate, &mut receiver);
            process_input(&mut keystate, &mut receiver);

            assert!(keystate.is_pressed("ArrowRight"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs until `crash_after` updates happened, then reports game over
    struct CountingGame {
        updates: u32,
        crash_after: u32,
    }

    #[async_trait(?Send)]
    impl Game for CountingGame {
        async fn initialize(&self) -> Result<Box<dyn Game>> {
            Err(anyhow!("not used by the loop tests"))
        }

        fn update(&mut self, _keystate: &KeyState) {
            self.updates += 1;
        }

        fn draw(&self, _renderer: &Renderer) {}

        fn is_running(&self) -> bool {
            self.updates < self.crash_after
        }
    }

    fn endless_game() -> CountingGame {
        CountingGame {
            updates: 0,
            crash_after: u32::MAX,
        }
    }

    #[test]
    fn one_update_per_elapsed_frame() {
        let mut game = endless_game();
        let mut game_loop = GameLoop::new(0.0);
        let keystate = KeyState::new();

        let mut perf = 0.0;
        for frame in 1..=10 {
            perf += FRAME_SIZE as f64 + 0.5;
            assert_eq!(game_loop.tick(&mut game, &keystate, perf), LoopStatus::Continue);
            assert_eq!(game.updates, frame);
        }
    }

    #[test]
    fn early_frame_waits_for_the_next_one() {
        let mut game = endless_game();
        let mut game_loop = GameLoop::new(0.0);
        let keystate = KeyState::new();

        game_loop.tick(&mut game, &keystate, FRAME_SIZE as f64 / 2.0);
        assert_eq!(game.updates, 0);

        game_loop.tick(&mut game, &keystate, FRAME_SIZE as f64 + 1.0);
        assert_eq!(game.updates, 1);
    }

    #[test]
    fn late_frame_does_not_fast_forward() {
        let mut game = endless_game();
        let mut game_loop = GameLoop::new(0.0);
        let keystate = KeyState::new();

        // a minute in a background tab
        let status = game_loop.tick(&mut game, &keystate, 60_000.0);
        assert_eq!(status, LoopStatus::Continue);
        assert_eq!(game.updates, 1);

        // the backlog is gone, the following frame is a normal one
        game_loop.tick(&mut game, &keystate, 60_000.0 + FRAME_SIZE as f64 + 1.0);
        assert_eq!(game.updates, 2);
    }

    #[test]
    fn stops_scheduling_after_game_over() {
        let mut game = CountingGame {
            updates: 0,
            crash_after: 5,
        };
        let mut game_loop = GameLoop::new(0.0);
        let keystate = KeyState::new();

        let mut perf = 0.0;
        let mut scheduled_frames = 0;
        loop {
            perf += FRAME_SIZE as f64 + 0.5;
            match game_loop.tick(&mut game, &keystate, perf) {
                LoopStatus::Continue => scheduled_frames += 1,
                LoopStatus::Stopped => break,
            }
            assert!(scheduled_frames < 100, "loop never stopped");
        }

        assert_eq!(game.updates, 5);
        assert_eq!(scheduled_frames, 4);
    }

    #[test]
    fn no_updates_once_stopped() {
        let mut game = CountingGame {
            updates: 0,
            crash_after: 1,
        };
        let mut game_loop = GameLoop::new(0.0);
        let keystate = KeyState::new();

        // plenty of time for many frames, only the crashing one runs
        let status = game_loop.tick(&mut game, &keystate, 1000.0);

        assert_eq!(status, LoopStatus::Stopped);
        assert_eq!(game.updates, 1);
    }

    #[test]
    fn rect_accessors() {
        let rect = Rect::new_from_x_y(75, 200, 80, 40);
        assert_eq!(rect.x(), 75);
        assert_eq!(rect.y(), 200);
        assert_eq!(rect.width(), 80);
        assert_eq!(rect.height(), 40);
    }
}
