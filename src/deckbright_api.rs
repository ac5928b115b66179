use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tracing::{info, warn};

use crate::control_msg::{Brightness, Command, ControlMsg, FadeDefaults, Request, Response, Status};
use crate::fader;
use crate::panel::Panel;

/// Owns the fader thread driving one panel.
pub struct Handle {
    thread: Option<std::thread::JoinHandle<()>>,
    tx: mpsc::Sender<ControlMsg>,
    status: Arc<Mutex<Status>>,
    fade_defaults: FadeDefaults,
}

impl Handle {
    pub fn new<P: Panel + 'static>(mut panel: P, fade_defaults: FadeDefaults) -> Handle {
        let firmware = match panel.firmware_version() {
            Ok(version) => Some(version),
            Err(e) => {
                warn!("could not read firmware version: {}", e);
                None
            }
        };
        let initial = Status {
            panel: panel.describe(),
            firmware,
            ..Status::default()
        };
        info!(panel = %initial.panel, firmware = ?initial.firmware, "panel ready");
        let status = Arc::new(Mutex::new(initial));

        let (tx, rx) = mpsc::channel();
        let thread_status = status.clone();
        let join_handle = std::thread::spawn(move || {
            fader::fader_thread(fader::FaderThreadData {
                rx,
                panel,
                status: thread_status,
            })
        });

        return Handle {
            thread: Some(join_handle),
            tx,
            status,
            fade_defaults,
        };
    }

    pub fn control(&self, command: Command) -> anyhow::Result<()> {
        self.tx
            .send(ControlMsg::External(command))
            .map_err(|_| anyhow!("fader thread is gone"))
    }

    pub fn set_brightness(&self, brightness: Brightness) -> anyhow::Result<()> {
        self.control(Command::Set(brightness))
    }

    /// Fades with the configured default duration and step count.
    pub fn fade_brightness(&self, brightness: Brightness) -> anyhow::Result<()> {
        self.fade_brightness_with(brightness, self.fade_defaults.duration, self.fade_defaults.steps)
    }

    pub fn fade_brightness_with(
        &self,
        brightness: Brightness,
        duration: Duration,
        steps: u32,
    ) -> anyhow::Result<()> {
        self.control(Command::Fade {
            target: brightness,
            duration,
            steps,
        })
    }

    pub fn reset(&self) -> anyhow::Result<()> {
        self.control(Command::Reset)
    }

    pub fn status(&self) -> Status {
        match self.status.lock() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Executes a request from a client. Commands are acknowledged once
    /// queued, not once the device has applied them.
    pub fn handle_request(&self, request: Request) -> Response {
        let result = match request {
            Request::SetBrightness { brightness } => self.set_brightness(brightness),
            Request::FadeBrightness {
                brightness,
                duration_ms,
                steps,
            } => self.fade_brightness_with(
                brightness,
                duration_ms
                    .map(Duration::from_millis)
                    .unwrap_or(self.fade_defaults.duration),
                steps.unwrap_or(self.fade_defaults.steps),
            ),
            Request::Reset => self.reset(),
            Request::Status => return Response::with_status(self.status()),
        };
        return match result {
            Ok(()) => Response::accepted(),
            Err(e) => Response::failed(e.to_string()),
        };
    }
}

impl Drop for Handle {
    /// Stops and joins the fader thread.
    fn drop(&mut self) {
        let _ = self.tx.send(ControlMsg::Shutdown);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("fader thread panicked");
            }
        }
    }
}
