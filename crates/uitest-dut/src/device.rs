//! The device-under-test interface: key presses in, video frames out.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use uitest_core::{Clock, Error, PressSettings, Result, SystemClock};
use uitest_frame::Frame;

/// Timings of a key-press sent to the device under test.
#[derive(Debug, Clone)]
pub struct KeypressInfo {
    /// Name of the key that was pressed
    pub key: String,
    /// Time just before the key-press started, in seconds since the epoch
    pub start_time: f64,
    /// Time when transmission of the key-press signal completed
    pub end_time: f64,
    /// Most recent video frame just before the key-press started
    pub frame_before: Frame,
}

/// Resolved timing parameters for a key-press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressTiming {
    /// Minimum time since the previous key-press ended
    pub interpress_delay: Duration,
    /// How long to hold the key down, if at all
    pub hold: Option<Duration>,
}

impl PressTiming {
    /// Apply the configured defaults and limits to caller-supplied timings.
    ///
    /// Fails with [`Error::InvalidArguments`] when `hold` exceeds
    /// `max_hold_secs`, and with [`Error::Config`] when a setting it needs
    /// isn't a valid duration.
    pub fn resolve(
        settings: &PressSettings,
        interpress_delay: Option<Duration>,
        hold: Option<Duration>,
    ) -> Result<Self> {
        if let Some(hold) = hold {
            let max_hold = settings.max_hold()?;
            if hold > max_hold {
                return Err(Error::InvalidArguments(format!(
                    "hold_secs must be <= {}, got {}",
                    max_hold.as_secs_f64(),
                    hold.as_secs_f64()
                )));
            }
        }
        let interpress_delay = match interpress_delay {
            Some(delay) => delay,
            None => settings.interpress_delay()?,
        };
        Ok(Self {
            interpress_delay,
            hold,
        })
    }
}

/// A device under test: something that receives key-presses and produces
/// video.
pub trait DeviceUnderTest: Send + Sync + fmt::Debug {
    /// Send a key-press, optionally holding the key down for `hold`.
    ///
    /// Waits first until `interpress_delay` has passed since the previous
    /// key-press ended.
    fn press(
        &self,
        key: &str,
        interpress_delay: Option<Duration>,
        hold: Option<Duration>,
    ) -> Result<KeypressInfo>;

    /// Start holding `key` down. The returned info's `end_time` is when the
    /// key-down signal was sent.
    fn key_down(&self, key: &str, interpress_delay: Option<Duration>) -> Result<KeypressInfo>;

    /// Release a key previously pressed with [`key_down`](Self::key_down).
    fn key_up(&self, key: &str) -> Result<()>;

    /// The last key-press sent, if any.
    fn last_keypress(&self) -> Option<KeypressInfo>;

    /// The most recent video frame.
    fn get_frame(&self) -> Result<Frame>;

    /// Block until a frame newer than the last one delivered by this method
    /// is available, and return it.
    fn next_frame(&self) -> Result<Frame>;

    /// Overlay `text` on the output video for `duration`.
    fn draw_text(&self, text: &str, duration: Duration) -> Result<()>;

    /// Clock that frame timestamps and key-press timings are measured with.
    fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(SystemClock)
    }
}

/// Placeholder device used until a real one is configured.
///
/// Every operation fails with [`Error::NotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredDevice;

fn not_configured<T>(operation: &str) -> Result<T> {
    Err(Error::NotConfigured(format!("uitest::{operation}")))
}

impl DeviceUnderTest for UnconfiguredDevice {
    fn press(&self, _: &str, _: Option<Duration>, _: Option<Duration>) -> Result<KeypressInfo> {
        not_configured("press")
    }

    fn key_down(&self, _: &str, _: Option<Duration>) -> Result<KeypressInfo> {
        not_configured("pressing")
    }

    fn key_up(&self, _: &str) -> Result<()> {
        not_configured("pressing")
    }

    fn last_keypress(&self) -> Option<KeypressInfo> {
        None
    }

    fn get_frame(&self) -> Result<Frame> {
        not_configured("get_frame")
    }

    fn next_frame(&self) -> Result<Frame> {
        not_configured("frames")
    }

    fn draw_text(&self, _: &str, _: Duration) -> Result<()> {
        not_configured("draw_text")
    }
}

/// Holds a key down until dropped.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use uitest_dut::{DeviceUnderTest, Pressing, UnconfiguredDevice};
/// # let device: Arc<dyn DeviceUnderTest> = Arc::new(UnconfiguredDevice);
/// let held = Pressing::start(device.clone(), "KEY_RIGHT", None)?;
/// // ... wait for the last page to scroll into view ...
/// held.release()?;
/// # Ok::<(), uitest_core::Error>(())
/// ```
#[derive(Debug)]
pub struct Pressing {
    device: Arc<dyn DeviceUnderTest>,
    key: String,
    info: KeypressInfo,
    released: bool,
}

impl Pressing {
    /// Press and hold `key` on `device`.
    pub fn start(
        device: Arc<dyn DeviceUnderTest>,
        key: &str,
        interpress_delay: Option<Duration>,
    ) -> Result<Self> {
        let info = device.key_down(key, interpress_delay)?;
        Ok(Self {
            device,
            key: key.to_string(),
            info,
            released: false,
        })
    }

    /// Timings of the key-down.
    pub fn info(&self) -> &KeypressInfo {
        &self.info
    }

    /// Release the key now, reporting any failure.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.device.key_up(&self.key)
    }
}

impl Drop for Pressing {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.device.key_up(&self.key) {
                warn!("Failed to release {}: {}", self.key, e);
            }
        }
    }
}

/// Iterator over frames from a device, optionally ending after a timeout.
///
/// Device errors are yielded once, after which the iterator is exhausted.
#[derive(Debug)]
pub struct Frames {
    device: Arc<dyn DeviceUnderTest>,
    clock: Arc<dyn Clock>,
    deadline: Option<f64>,
    done: bool,
}

impl Frames {
    /// Iterate over new frames from `device` for `timeout` (forever when
    /// `None`), starting now.
    pub fn new(device: Arc<dyn DeviceUnderTest>, timeout: Option<Duration>) -> Self {
        let clock = device.clock();
        let deadline = timeout.map(|t| clock.now() + t.as_secs_f64());
        Self {
            device,
            clock,
            deadline,
            done: false,
        }
    }
}

impl Iterator for Frames {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.deadline.is_some_and(|d| self.clock.now() >= d) {
            self.done = true;
            return None;
        }
        let frame = self.device.next_frame();
        self.done = frame.is_err();
        Some(frame)
    }
}

impl std::iter::FusedIterator for Frames {}
