//! A device under test that plays back a fixed list of frames.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use uitest_core::{Clock, Error, PressSettings, Result};
use uitest_frame::{Frame, Provenance};

use crate::device::{DeviceUnderTest, KeypressInfo, PressTiming};

#[derive(Debug, Default)]
struct State {
    presses: Vec<KeypressInfo>,
    held: Vec<String>,
    texts: Vec<String>,
    delivered: Option<usize>,
}

/// Plays back `frames` at one frame per `frame_period`, starting when the
/// device is created. The last frame repeats forever.
///
/// Key-presses and drawn text are recorded but don't affect the video, so
/// scripts are written with the expected reaction already in the frame list.
#[derive(Debug)]
pub struct ScriptedDevice {
    frames: Vec<Frame>,
    period: f64,
    start: f64,
    clock: Arc<dyn Clock>,
    settings: PressSettings,
    state: Mutex<State>,
}

impl ScriptedDevice {
    /// Create a new scripted device.
    ///
    /// Fails with [`Error::InvalidArguments`] if `frames` is empty or
    /// `frame_period` is zero.
    pub fn new(frames: Vec<Frame>, frame_period: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        if frames.is_empty() {
            return Err(Error::InvalidArguments(
                "ScriptedDevice needs at least one frame".to_string(),
            ));
        }
        if frame_period.is_zero() {
            return Err(Error::InvalidArguments(
                "frame_period must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            frames,
            period: frame_period.as_secs_f64(),
            start: clock.now(),
            clock,
            settings: PressSettings::default(),
            state: Mutex::new(State::default()),
        })
    }

    /// Use different key-press defaults and limits.
    pub fn with_press_settings(mut self, settings: PressSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Every key-press sent so far, oldest first.
    pub fn presses(&self) -> Vec<KeypressInfo> {
        self.lock().presses.clone()
    }

    /// Keys currently held down.
    pub fn held_keys(&self) -> Vec<String> {
        self.lock().held.clone()
    }

    /// Every string passed to `draw_text` so far.
    pub fn texts(&self) -> Vec<String> {
        self.lock().texts.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn index_at(&self, t: f64) -> usize {
        ((t - self.start) / self.period).floor().max(0.0) as usize
    }

    fn frame_at(&self, index: usize) -> Frame {
        let content = &self.frames[index.min(self.frames.len() - 1)];
        let time = self.start + index as f64 * self.period;
        content
            .clone()
            .with_provenance(Provenance::captured_at(time))
    }

    /// Sleep until `delay` after the previous key-press ended.
    fn wait_for_interpress(&self, delay: Duration) {
        let Some(last) = self.last_keypress() else {
            return;
        };
        let remaining = last.end_time + delay.as_secs_f64() - self.clock.now();
        if remaining > 0.0 {
            self.clock.sleep(Duration::from_secs_f64(remaining));
        }
    }

    fn begin_press(&self, timing: PressTiming) -> Result<(Frame, f64)> {
        self.wait_for_interpress(timing.interpress_delay);
        let frame_before = self.get_frame()?;
        Ok((frame_before, self.clock.now()))
    }
}

impl DeviceUnderTest for ScriptedDevice {
    fn press(
        &self,
        key: &str,
        interpress_delay: Option<Duration>,
        hold: Option<Duration>,
    ) -> Result<KeypressInfo> {
        let timing = PressTiming::resolve(&self.settings, interpress_delay, hold)?;
        let (frame_before, start_time) = self.begin_press(timing)?;
        if let Some(hold) = timing.hold {
            self.clock.sleep(hold);
        }
        let info = KeypressInfo {
            key: key.to_string(),
            start_time,
            end_time: self.clock.now(),
            frame_before,
        };
        info!("Pressed {}", key);
        self.lock().presses.push(info.clone());
        Ok(info)
    }

    fn key_down(&self, key: &str, interpress_delay: Option<Duration>) -> Result<KeypressInfo> {
        if self.lock().held.iter().any(|k| k == key) {
            return Err(Error::InvalidArguments(format!("{key} is already held down")));
        }
        let timing = PressTiming::resolve(&self.settings, interpress_delay, None)?;
        let (frame_before, start_time) = self.begin_press(timing)?;
        let info = KeypressInfo {
            key: key.to_string(),
            start_time,
            end_time: start_time,
            frame_before,
        };
        info!("Holding {}", key);
        let mut state = self.lock();
        state.held.push(key.to_string());
        state.presses.push(info.clone());
        Ok(info)
    }

    fn key_up(&self, key: &str) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.lock();
        let Some(i) = state.held.iter().position(|k| k == key) else {
            return Err(Error::InvalidArguments(format!("{key} isn't held down")));
        };
        state.held.remove(i);
        // The hold counts as one key-press that ends on release.
        if let Some(press) = state.presses.iter_mut().rev().find(|p| p.key == key) {
            press.end_time = now;
        }
        info!("Released {}", key);
        Ok(())
    }

    fn last_keypress(&self) -> Option<KeypressInfo> {
        self.lock().presses.last().cloned()
    }

    fn get_frame(&self) -> Result<Frame> {
        Ok(self.frame_at(self.index_at(self.clock.now())))
    }

    fn next_frame(&self) -> Result<Frame> {
        let now = self.clock.now();
        let current = self.index_at(now);
        let index = {
            let mut state = self.lock();
            let index = state.delivered.map_or(current, |d| current.max(d + 1));
            state.delivered = Some(index);
            index
        };
        let due = self.start + index as f64 * self.period;
        if due > now {
            self.clock.sleep(Duration::from_secs_f64(due - now));
        }
        debug!("Delivering scripted frame {}", index);
        Ok(self.frame_at(index))
    }

    fn draw_text(&self, text: &str, duration: Duration) -> Result<()> {
        debug!("Drawing {:?} for {:?}", text, duration);
        self.lock().texts.push(text.to_string());
        Ok(())
    }

    fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }
}
