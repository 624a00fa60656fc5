//! Outbound calls from the cat to its window and host process.

use std::io::{self, Write};
use std::sync::{Arc, Weak};

use serde::Serialize;
use winit::dpi::PhysicalPosition;
use winit::window::Window;

use crate::cat::Presentation;
use crate::error::HostError;

/// Everything the companion asks of the outside world. Callers treat every
/// failure as transient: log it and carry on.
pub trait Host {
    fn set_window_position(&mut self, x: i32, y: i32) -> Result<(), HostError>;
    fn window_position(&self) -> Result<(i32, i32), HostError>;
    fn set_visible(&mut self, visible: bool) -> Result<(), HostError>;
    /// Fire-and-forget click notification for the host's own bookkeeping.
    fn notify_clicked(&mut self) -> Result<(), HostError>;
    fn start_pomodoro(&mut self) -> Result<(), HostError>;
    fn stop_pomodoro(&mut self) -> Result<(), HostError>;
    /// Show the current look of the cat. Rendering is up to the host.
    fn present(&mut self, _frame: &Presentation) {}
}

/// Commands written to the host pipe, one JSON object per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    ClickCat,
    StartPomodoro,
    StopPomodoro,
}

/// Real host: the winit window plus a JSON-lines pipe on stdout.
pub struct WinitHost<W: Write = io::Stdout> {
    /// Weak so a late update after teardown fails instead of resurrecting it.
    window: Weak<Window>,
    out: W,
    last_title: String,
}

impl WinitHost<io::Stdout> {
    pub fn new(window: &Arc<Window>) -> Self {
        Self {
            window: Arc::downgrade(window),
            out: io::stdout(),
            last_title: String::new(),
        }
    }
}

impl<W: Write> WinitHost<W> {
    fn window(&self) -> Result<Arc<Window>, HostError> {
        self.window.upgrade().ok_or(HostError::WindowGone)
    }

    fn send(&mut self, command: HostCommand) -> Result<(), HostError> {
        let line = serde_json::to_string(&command)?;
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Host for WinitHost<W> {
    fn set_window_position(&mut self, x: i32, y: i32) -> Result<(), HostError> {
        self.window()?
            .set_outer_position(PhysicalPosition::new(x, y));
        Ok(())
    }

    fn window_position(&self) -> Result<(i32, i32), HostError> {
        let pos = self
            .window()?
            .outer_position()
            .map_err(|e| HostError::Unsupported(e.to_string()))?;
        Ok((pos.x, pos.y))
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), HostError> {
        self.window()?.set_visible(visible);
        Ok(())
    }

    fn notify_clicked(&mut self) -> Result<(), HostError> {
        self.send(HostCommand::ClickCat)
    }

    fn start_pomodoro(&mut self) -> Result<(), HostError> {
        self.send(HostCommand::StartPomodoro)
    }

    fn stop_pomodoro(&mut self) -> Result<(), HostError> {
        self.send(HostCommand::StopPomodoro)
    }

    fn present(&mut self, frame: &Presentation) {
        let title = frame.title();
        if title == self.last_title {
            return;
        }
        if let Ok(window) = self.window() {
            window.set_title(&title);
        }
        self.last_title = title;
    }
}

/// Test double that records every call.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub positions: Vec<(i32, i32)>,
    pub start: Option<(i32, i32)>,
    pub visible: Option<bool>,
    pub clicks: usize,
    pub commands: Vec<HostCommand>,
    pub fail_positions: bool,
    pub fail_notify: bool,
}

#[cfg(test)]
impl Host for RecordingHost {
    fn set_window_position(&mut self, x: i32, y: i32) -> Result<(), HostError> {
        if self.fail_positions {
            return Err(HostError::WindowGone);
        }
        self.positions.push((x, y));
        Ok(())
    }

    fn window_position(&self) -> Result<(i32, i32), HostError> {
        self.start
            .ok_or_else(|| HostError::Unsupported("no position in tests".into()))
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), HostError> {
        self.visible = Some(visible);
        Ok(())
    }

    fn notify_clicked(&mut self) -> Result<(), HostError> {
        if self.fail_notify {
            return Err(HostError::Notify(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "host went away",
            )));
        }
        self.clicks += 1;
        Ok(())
    }

    fn start_pomodoro(&mut self) -> Result<(), HostError> {
        self.commands.push(HostCommand::StartPomodoro);
        Ok(())
    }

    fn stop_pomodoro(&mut self) -> Result<(), HostError> {
        self.commands.push(HostCommand::StopPomodoro);
        Ok(())
    }
}
