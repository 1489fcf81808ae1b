//! The process-wide device under test.
//!
//! Test scripts talk to "the" device through the free functions in this
//! module. Until a device is installed with [`set_device`], every operation
//! fails with [`Error::NotConfigured`](uitest_core::Error::NotConfigured).

use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use tracing::info;

use uitest_core::Result;
use uitest_frame::Frame;

use crate::device::{DeviceUnderTest, Frames, KeypressInfo, Pressing, UnconfiguredDevice};

fn slot() -> &'static RwLock<Arc<dyn DeviceUnderTest>> {
    static SLOT: OnceLock<RwLock<Arc<dyn DeviceUnderTest>>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new(Arc::new(UnconfiguredDevice)))
}

/// The currently installed device.
pub fn current_device() -> Arc<dyn DeviceUnderTest> {
    slot()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Restores the previously installed device when dropped.
#[must_use = "the device is uninstalled as soon as the guard is dropped"]
#[derive(Debug)]
pub struct DeviceGuard {
    previous: Option<Arc<dyn DeviceUnderTest>>,
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *slot().write().unwrap_or_else(PoisonError::into_inner) = previous;
        }
    }
}

/// Install `device` as the process-wide device under test.
pub fn set_device(device: Arc<dyn DeviceUnderTest>) -> DeviceGuard {
    info!("Installing device under test: {:?}", device);
    let mut current = slot().write().unwrap_or_else(PoisonError::into_inner);
    let previous = std::mem::replace(&mut *current, device);
    DeviceGuard {
        previous: Some(previous),
    }
}

/// Send a key-press to the device under test.
///
/// `interpress_delay` defaults to the configured `press.interpress_delay_secs`
/// (0.3 s); `hold` may not exceed `press.max_hold_secs` (60 s).
pub fn press(
    key: &str,
    interpress_delay: Option<Duration>,
    hold: Option<Duration>,
) -> Result<KeypressInfo> {
    current_device().press(key, interpress_delay, hold)
}

/// Hold `key` down until the returned guard is dropped.
pub fn pressing(key: &str, interpress_delay: Option<Duration>) -> Result<Pressing> {
    Pressing::start(current_device(), key, interpress_delay)
}

/// The last key-press sent to the device under test.
pub fn last_keypress() -> Option<KeypressInfo> {
    current_device().last_keypress()
}

/// The most recent video frame from the device under test.
pub fn get_frame() -> Result<Frame> {
    current_device().get_frame()
}

/// Frames from the device under test, for `timeout` or forever.
pub fn frames(timeout: Option<Duration>) -> Frames {
    Frames::new(current_device(), timeout)
}

/// Write `text` on the output video for `duration`.
pub fn draw_text(text: &str, duration: Duration) -> Result<()> {
    info!("{}", text);
    current_device().draw_text(text, duration)
}
