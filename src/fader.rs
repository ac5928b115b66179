use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::control_msg::{Brightness, Command, ControlMsg, Status};
use crate::panel::Panel;

pub const MAX_FADE_STEPS: u32 = 250;

/// The brightness levels of one fade and the pause between them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FadePlan {
    levels: Vec<Brightness>,
    interval: Duration,
}

impl FadePlan {
    /// Linear fade from `start` (not included) to `end` (always the last level).
    /// `steps` is clamped to 1..=MAX_FADE_STEPS.
    pub fn new(start: Brightness, end: Brightness, duration: Duration, steps: u32) -> FadePlan {
        let steps = steps.clamp(1, MAX_FADE_STEPS);
        let from = i32::from(start.percent());
        let delta = i32::from(end.percent()) - from;
        let levels = (1..=steps as i32)
            .map(|i| Brightness::new((from + delta * i / steps as i32) as u8))
            .collect();
        return FadePlan {
            levels,
            interval: duration / steps,
        };
    }

    pub fn levels(&self) -> &[Brightness] {
        &self.levels
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn target(&self) -> Brightness {
        // `new` always produces at least one level.
        self.levels.last().copied().unwrap_or_default()
    }
}

struct ActiveFade {
    levels: std::vec::IntoIter<Brightness>,
    interval: Duration,
    next_tick: Instant,
}

pub(crate) struct FaderThreadData<P: Panel> {
    pub rx: mpsc::Receiver<ControlMsg>,
    pub panel: P,
    pub status: Arc<Mutex<Status>>,
}

impl<P: Panel> FaderThreadData<P> {
    fn update_status(&self, f: impl FnOnce(&mut Status)) {
        let mut status = match self.status.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut status);
    }

    fn apply(&mut self, brightness: Brightness) -> Option<Brightness> {
        match self.panel.set_brightness(brightness) {
            Ok(()) => {
                self.update_status(|s| {
                    s.brightness = Some(brightness.percent());
                    s.last_error = None;
                });
                return Some(brightness);
            }
            Err(e) => {
                warn!(%brightness, "failed to set brightness: {}", e);
                self.update_status(|s| s.last_error = Some(e.to_string()));
                return None;
            }
        }
    }

    fn reset(&mut self) {
        if let Err(e) = self.panel.reset() {
            warn!("failed to reset panel: {}", e);
            self.update_status(|s| s.last_error = Some(e.to_string()));
        }
    }
}

/// Owns the panel. Applies commands until shut down or until every
/// sender is gone.
pub(crate) fn fader_thread<P: Panel>(mut data: FaderThreadData<P>) {
    // Last level the device acknowledged.
    let mut current: Option<Brightness> = None;
    let mut fade: Option<ActiveFade> = None;
    loop {
        let msg = match &fade {
            Some(active) => {
                let wait = active.next_tick.saturating_duration_since(Instant::now());
                data.rx.recv_timeout(wait)
            }
            None => data
                .rx
                .recv()
                .map_err(|_| mpsc::RecvTimeoutError::Disconnected),
        };
        match msg {
            Ok(ControlMsg::Shutdown) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Ok(ControlMsg::External(Command::Set(brightness))) => {
                if fade.take().is_some() {
                    debug!("fade cancelled by set");
                    data.update_status(|s| s.fade_target = None);
                }
                current = data.apply(brightness).or(current);
            }
            Ok(ControlMsg::External(Command::Fade {
                target,
                duration,
                steps,
            })) => {
                let start = match current {
                    Some(level) => level,
                    // Unknown starting point, fade up from dark.
                    None => {
                        let dark = Brightness::new(0);
                        current = data.apply(dark);
                        dark
                    }
                };
                let plan = FadePlan::new(start, target, duration, steps);
                debug!(%start, %target, steps = plan.levels().len(), interval = ?plan.interval(), "starting fade");
                data.update_status(|s| s.fade_target = Some(plan.target().percent()));
                fade = Some(ActiveFade {
                    interval: plan.interval,
                    next_tick: Instant::now() + plan.interval,
                    levels: plan.levels.into_iter(),
                });
            }
            Ok(ControlMsg::External(Command::Reset)) => data.reset(),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let next = fade.as_mut().and_then(|active| {
                    active.next_tick += active.interval;
                    active.levels.next()
                });
                if let Some(level) = next {
                    current = data.apply(level).or(current);
                }
                if fade.as_ref().map_or(true, |active| active.levels.len() == 0) {
                    fade = None;
                    data.update_status(|s| s.fade_target = None);
                }
            }
        }
    }
    debug!("fader thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percents(plan: &FadePlan) -> Vec<u8> {
        plan.levels().iter().map(|b| b.percent()).collect()
    }

    #[test]
    fn fade_up_ends_at_target() {
        let plan = FadePlan::new(Brightness::new(0), Brightness::new(100), Duration::from_secs(10), 4);
        assert_eq!(percents(&plan), vec![25, 50, 75, 100]);
        assert_eq!(plan.interval(), Duration::from_millis(2500));
        assert_eq!(plan.target(), Brightness::new(100));
    }

    #[test]
    fn fade_down_is_monotonic() {
        let plan = FadePlan::new(Brightness::new(90), Brightness::new(10), Duration::from_secs(1), 7);
        let levels = percents(&plan);
        assert_eq!(levels.len(), 7);
        assert!(levels.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(*levels.last().unwrap(), 10);
    }

    #[test]
    fn steps_are_clamped() {
        let none = FadePlan::new(Brightness::new(20), Brightness::new(60), Duration::from_secs(1), 0);
        assert_eq!(percents(&none), vec![60]);
        assert_eq!(none.interval(), Duration::from_secs(1));

        let many = FadePlan::new(Brightness::new(0), Brightness::new(100), Duration::from_secs(5), 10_000);
        assert_eq!(many.levels().len(), MAX_FADE_STEPS as usize);
        assert_eq!(many.target(), Brightness::new(100));
    }

    #[test]
    fn more_steps_than_levels_still_lands() {
        let plan = FadePlan::new(Brightness::new(40), Brightness::new(43), Duration::from_millis(100), 10);
        let levels = percents(&plan);
        assert!(levels.iter().all(|&l| (40..=43).contains(&l)));
        assert_eq!(*levels.last().unwrap(), 43);
    }
}
