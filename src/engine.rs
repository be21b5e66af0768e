use crate::browser;
use crate::engine::input::*;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
// wasm is single threaded, so Rc<RefCell> over Mutex
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;
use web_sys::CanvasRenderingContext2d;

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    /// `delta_ms` is always `FRAME_SIZE`, the loop runs a fixed timestep
    fn update(&mut self, keystate: &KeyState, delta_ms: f32);
    fn draw(&self, renderer: &Renderer);
}

// length of a frame in milliseconds
pub const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;
// after a long stall (tab in background) drop the backlog instead of
// fast forwarding through it
const MAX_CATCH_UP_FRAMES: u32 = 10;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut keyevent_receiver = prepare_input()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer {
            context: browser::context()?,
        };
        let mut keystate = KeyState::new();

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
            let mut frames = 0;
            while game_loop.accumulated_delta > FRAME_SIZE {
                // input is drained once per fixed step, so an edge triggered
                // key press is seen by exactly one update
                process_input(&mut keystate, &mut keyevent_receiver);
                game.update(&keystate, FRAME_SIZE);
                keystate.end_frame();
                game_loop.accumulated_delta -= FRAME_SIZE;
                frames += 1;
                if frames >= MAX_CATCH_UP_FRAMES {
                    game_loop.accumulated_delta = 0.0;
                }
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);
            if let Some(callback) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(callback) {
                    error!("GameLoop: {:#?}", err);
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
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rect {
    pub position: Point,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            position: Point { x, y },
            width,
            height,
        }
    }

    /// rect of `width` x `height` centred on (x, y)
    pub fn centered(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x - width / 2.0, y - height / 2.0, width, height)
    }
}

/// Thin wrapper over the 2d context. Canvas exceptions are logged, a bad
/// draw call must not take the loop down with it.
pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.position.x.into(),
            rect.position.y.into(),
            rect.width.into(),
            rect.height.into(),
        );
    }

    pub fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.fill_rect(
            rect.position.x.into(),
            rect.position.y.into(),
            rect.width.into(),
            rect.height.into(),
        );
    }

    /// Road band: `top` and `bottom` are the horizontal edges, both centred
    /// on `center_x`
    pub fn fill_trapezoid(
        &self,
        center_x: f32,
        top_y: f32,
        top_width: f32,
        bottom_y: f32,
        bottom_width: f32,
        color: &str,
    ) {
        let context = &self.context;
        context.set_fill_style_str(color);
        context.begin_path();
        context.move_to((center_x - top_width / 2.0).into(), top_y.into());
        context.line_to((center_x + top_width / 2.0).into(), top_y.into());
        context.line_to((center_x + bottom_width / 2.0).into(), bottom_y.into());
        context.line_to((center_x - bottom_width / 2.0).into(), bottom_y.into());
        context.close_path();
        context.fill();
    }

    pub fn fill_circle(&self, center: Point, radius: f32, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.begin_path();
        if let Err(err) = self
            .context
            .arc(center.x.into(), center.y.into(), radius.max(0.0).into(), 0.0, TAU)
        {
            error!("Renderer::fill_circle {:#?}", err);
            return;
        }
        self.context.fill();
    }

    pub fn stroke_line(&self, from: Point, to: Point, width: f32, color: &str) {
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(width.into());
        self.context.begin_path();
        self.context.move_to(from.x.into(), from.y.into());
        self.context.line_to(to.x.into(), to.y.into());
        self.context.stroke();
    }

    pub fn fill_text(&self, text: &str, position: Point, font: &str, color: &str) {
        self.context.set_font(font);
        self.context.set_text_align("center");
        self.context.set_fill_style_str(color);
        if let Err(err) = self
            .context
            .fill_text(text, position.x.into(), position.y.into())
        {
            error!("Renderer::fill_text {:#?}", err);
        }
    }

    pub fn set_alpha(&self, alpha: f32) {
        self.context.set_global_alpha(alpha.clamp(0.0, 1.0).into());
    }

    /// Runs `draw` with the context translated to `origin` and rotated by
    /// `angle`, then restores the previous transform
    pub fn with_transform(&self, origin: Point, angle: f32, draw: impl FnOnce(&Renderer)) {
        self.context.save();
        let transformed = self
            .context
            .translate(origin.x.into(), origin.y.into())
            .and_then(|_| self.context.rotate(angle.into()));
        match transformed {
            Ok(()) => draw(self),
            Err(err) => error!("Renderer::with_transform {:#?}", err),
        }
        self.context.restore();
    }
}

/// ┌──────────────────── Input Flow ───────────────────────────┐
/// │ DOM event ──► closure ──► mpsc channel ──► process_input  │
/// │                                               │           │
/// │                                          KeyState         │
/// │                                  (held, pressed, pointer) │
/// └───────────────────────────────────────────────────────────┘
/// Event handlers never touch game state, they only queue. The loop drains
/// the queue at the top of each fixed step.
pub mod input {
    use crate::browser;
    use crate::sim::input::{PointerEvent, PointerPhase};
    use anyhow::{anyhow, Result};
    use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
    use std::collections::HashSet;
    use wasm_bindgen::JsCast;

    #[derive(Debug, Clone, PartialEq)]
    pub enum InputEvent {
        KeyDown(String),
        KeyUp(String),
        Pointer(PointerEvent),
    }

    /// Keyboard and pointer state for one fixed step
    #[derive(Debug, Default)]
    pub struct KeyState {
        held: HashSet<String>,
        pressed: HashSet<String>,
        pointer: Vec<PointerEvent>,
    }

    impl KeyState {
        pub fn new() -> Self {
            KeyState::default()
        }

        pub fn is_pressed(&self, code: &str) -> bool {
            self.held.contains(code)
        }

        /// true only on the step the key went down
        pub fn was_pressed(&self, code: &str) -> bool {
            self.pressed.contains(code)
        }

        pub fn pointer_events(&self) -> &[PointerEvent] {
            &self.pointer
        }

        pub fn apply(&mut self, event: InputEvent) {
            match event {
                InputEvent::KeyDown(code) => {
                    // key repeat arrives as more keydowns, only the first counts
                    if self.held.insert(code.clone()) {
                        self.pressed.insert(code);
                    }
                }
                InputEvent::KeyUp(code) => {
                    self.held.remove(&code);
                }
                InputEvent::Pointer(pointer) => self.pointer.push(pointer),
            }
        }

        pub fn end_frame(&mut self) {
            self.pressed.clear();
            self.pointer.clear();
        }
    }

    pub fn process_input(state: &mut KeyState, receiver: &mut UnboundedReceiver<InputEvent>) {
        // Ok(Some) = event, Ok(None) = closed, Err = nothing queued yet
        while let Ok(Some(event)) = receiver.try_next() {
            state.apply(event);
        }
    }

    pub fn prepare_input() -> Result<UnboundedReceiver<InputEvent>> {
        let (sender, receiver) = unbounded();
        attach_keyboard(&sender)?;
        attach_pointer(&sender)?;
        Ok(receiver)
    }

    fn send(sender: &UnboundedSender<InputEvent>, event: InputEvent) {
        // receiver only goes away with the page
        let _ = sender.unbounded_send(event);
    }

    fn attach_keyboard(sender: &UnboundedSender<InputEvent>) -> Result<()> {
        let window = browser::window()?;

        let down_sender = sender.clone();
        let onkeydown = browser::closure_wrap(Box::new(move |event: web_sys::KeyboardEvent| {
            if matches!(event.code().as_str(), "Space" | "ArrowLeft" | "ArrowRight") {
                // keep the page from scrolling
                event.prevent_default();
            }
            send(&down_sender, InputEvent::KeyDown(event.code()));
        }) as Box<dyn FnMut(web_sys::KeyboardEvent)>);

        let up_sender = sender.clone();
        let onkeyup = browser::closure_wrap(Box::new(move |event: web_sys::KeyboardEvent| {
            send(&up_sender, InputEvent::KeyUp(event.code()));
        }) as Box<dyn FnMut(web_sys::KeyboardEvent)>);

        window.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
        window.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));
        // handlers live as long as the page
        onkeydown.forget();
        onkeyup.forget();
        Ok(())
    }

    fn attach_pointer(sender: &UnboundedSender<InputEvent>) -> Result<()> {
        let canvas = browser::canvas()?;
        let handlers = [
            (PointerPhase::Down, "pointerdown"),
            (PointerPhase::Move, "pointermove"),
            (PointerPhase::Up, "pointerup"),
        ];
        for (phase, name) in handlers {
            let sender = sender.clone();
            let target = canvas.clone();
            let handler = browser::closure_wrap(Box::new(move |event: web_sys::PointerEvent| {
                // css size and backing store size can differ
                let scale_x = target.width() as f32 / (target.client_width().max(1) as f32);
                let scale_y = target.height() as f32 / (target.client_height().max(1) as f32);
                send(
                    &sender,
                    InputEvent::Pointer(PointerEvent {
                        phase,
                        x: event.offset_x() as f32 * scale_x,
                        y: event.offset_y() as f32 * scale_y,
                    }),
                );
            }) as Box<dyn FnMut(web_sys::PointerEvent)>);
            canvas
                .add_event_listener_with_callback(name, handler.as_ref().unchecked_ref())
                .map_err(|err| anyhow!("Could not attach {} listener : {:#?}", name, err))?;
            handler.forget();
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn key_press_is_edge_triggered() {
            let mut state = KeyState::new();
            state.apply(InputEvent::KeyDown("ArrowLeft".into()));
            assert!(state.was_pressed("ArrowLeft"));
            assert!(state.is_pressed("ArrowLeft"));
            state.end_frame();

            // auto repeat
            state.apply(InputEvent::KeyDown("ArrowLeft".into()));
            assert!(!state.was_pressed("ArrowLeft"));
            assert!(state.is_pressed("ArrowLeft"));

            state.apply(InputEvent::KeyUp("ArrowLeft".into()));
            assert!(!state.is_pressed("ArrowLeft"));
        }

        #[test]
        fn pointer_events_last_one_step() {
            let mut state = KeyState::new();
            state.apply(InputEvent::Pointer(PointerEvent {
                phase: PointerPhase::Down,
                x: 10.0,
                y: 20.0,
            }));
            assert_eq!(state.pointer_events().len(), 1);
            state.end_frame();
            assert!(state.pointer_events().is_empty());
        }

        #[test]
        fn queued_events_are_drained() {
            let (sender, mut receiver) = unbounded();
            sender
                .unbounded_send(InputEvent::KeyDown("Space".into()))
                .unwrap();
            sender
                .unbounded_send(InputEvent::KeyUp("Space".into()))
                .unwrap();
            let mut state = KeyState::new();
            process_input(&mut state, &mut receiver);
            assert!(state.was_pressed("Space"));
            assert!(!state.is_pressed("Space"));
        }
    }
}
