use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use crate::activity::{feed, HostEvent};
use crate::cat::Companion;
use crate::config::Config;
use crate::error::AppError;
use crate::host::WinitHost;

/// Frame pacing while something is moving (~60 Hz).
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Used when no monitor reports a size.
const FALLBACK_SCREEN_W: f32 = 1920.0;

/// Top-level application state.
struct App {
    config: Config,
    start: Instant,
    window: Option<Arc<Window>>,
    cat: Option<Companion<WinitHost>>,
    /// Host events that arrived before the window existed.
    pending: Vec<HostEvent>,
    screen_w: f32,
    /// Last cursor position in screen coordinates.
    cursor: Vec2,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            start: Instant::now(),
            window: None,
            cat: None,
            pending: Vec::new(),
            screen_w: FALLBACK_SCREEN_W,
            cursor: Vec2::ZERO,
        }
    }

    /// Milliseconds since startup; the clock every timer runs on.
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Refresh the hour and fire due timers.
    fn tick(&mut self) {
        let now = self.now_ms();
        if let Some(cat) = &mut self.cat {
            cat.daynight.update();
            cat.advance_to(now);
        }
    }

    /// Window-local cursor to screen coordinates, so a drag stays stable
    /// while the window moves under the pointer.
    fn to_screen(&self, local: PhysicalPosition<f64>) -> Vec2 {
        let origin = self
            .window
            .as_ref()
            .and_then(|w| w.inner_position().ok())
            .map(|p| Vec2::new(p.x as f32, p.y as f32))
            .unwrap_or(Vec2::ZERO);
        origin + Vec2::new(local.x as f32, local.y as f32)
    }

    fn shutdown(&mut self) {
        if let Some(cat) = &mut self.cat {
            cat.shutdown();
        }
    }
}

impl ApplicationHandler<HostEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());
        if let Some(size) = monitor.as_ref().map(|m| m.size()) {
            self.screen_w = size.width as f32;
        }

        let win = &self.config.window;
        let attrs = WindowAttributes::default()
            .with_title("commit-cat")
            .with_decorations(false)
            .with_resizable(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(LogicalSize::new(win.width, win.height))
            .with_position(PhysicalPosition::new(win.start_x, win.start_y));

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let sprite_w = window.outer_size().width as f32;
        log::info!(
            "Window created: {}px sprite on a {}px screen ({:?})",
            sprite_w,
            self.screen_w,
            monitor.and_then(|m| m.name()).unwrap_or_default()
        );

        let host = WinitHost::new(&window);
        let mut cat = Companion::new(
            self.config.clone(),
            host,
            fastrand::Rng::new(),
            self.screen_w,
            sprite_w,
        );
        for event in self.pending.drain(..) {
            cat.handle_event(event);
        }
        cat.present();

        self.cat = Some(cat);
        self.window = Some(window);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: HostEvent) {
        // Let timers due before this event fire first.
        self.tick();
        match &mut self.cat {
            Some(cat) => {
                cat.handle_event(event);
                cat.present();
            }
            None => self.pending.push(event),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.tick();
        let Some(cat) = &mut self.cat else {
            return;
        };
        if !cat.is_running() {
            return;
        }
        cat.present();

        let now = Instant::now();
        let deadline = cat
            .next_deadline()
            .map(|ms| self.start + Duration::from_millis(ms));

        if cat.wants_frames() {
            if let Some(w) = &self.window {
                w.request_redraw();
            }
            let next_frame = now + FRAME_INTERVAL;
            let wake = deadline.map_or(next_frame, |d| d.min(next_frame));
            event_loop.set_control_flow(ControlFlow::WaitUntil(wake));
        } else {
            match deadline {
                Some(d) => event_loop.set_control_flow(ControlFlow::WaitUntil(d)),
                None => event_loop.set_control_flow(ControlFlow::Wait),
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                let screen_w = self.screen_w;
                if let Some(cat) = &mut self.cat {
                    cat.set_screen(screen_w, size.width as f32);
                }
            }
            WindowEvent::RedrawRequested => {
                self.tick();
                let now = self.now_ms();
                if let Some(cat) = &mut self.cat {
                    cat.on_frame(now);
                    cat.present();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = self.to_screen(position);
                let cursor = self.cursor;
                if let Some(cat) = &mut self.cat {
                    cat.pointer_move(cursor);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.tick();
                let cursor = self.cursor;
                if let Some(cat) = &mut self.cat {
                    match state {
                        ElementState::Pressed => cat.pointer_down(cursor),
                        ElementState::Released => {
                            cat.pointer_up();
                        }
                    }
                    cat.present();
                }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                match event.logical_key.as_ref() {
                    Key::Named(NamedKey::Escape) => {
                        log::info!("Escape pressed, exiting");
                        self.shutdown();
                        event_loop.exit();
                    }
                    Key::Character("p") | Key::Character("P") => {
                        if let Some(cat) = &mut self.cat {
                            let running = cat.toggle_pomodoro();
                            log::info!("Pomodoro {}", if running { "started" } else { "stopped" });
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

/// Entry point: create the event loop, start the host feed, and run.
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::<HostEvent>::with_user_event().build()?;

    if let Err(e) = feed::spawn_stdin(event_loop.create_proxy()) {
        log::warn!("Host event feed unavailable: {e}");
    }

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
