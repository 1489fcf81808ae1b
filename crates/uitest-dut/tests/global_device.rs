//! The process-wide device slot, driven the way a test script would.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use uitest_core::{Clock, Error, Region, SimulatedClock};
use uitest_dut::testing::ScriptedDevice;
use uitest_dut::{self as stb, DeviceUnderTest};
use uitest_frame::{crop, Frame};
use uitest_wait::WaitUntil;

const EPOCH: f64 = 1_497_000_000.0;

/// The device slot is shared by every test in this binary.
fn exclusive() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 8x4 RGB screen with a "button" in the top-left 4x2 corner.
fn screen(button: u8) -> Frame {
    let frame = Frame::filled(8, 4, 3, 20).unwrap();
    frame.slice(..2, ..4, None).unwrap().fill(button);
    frame
}

fn scripted(screens: Vec<Frame>) -> (Arc<SimulatedClock>, Arc<ScriptedDevice>) {
    let clock = Arc::new(SimulatedClock::new(EPOCH));
    let device = ScriptedDevice::new(screens, Duration::from_secs(1), clock.clone()).unwrap();
    (clock, Arc::new(device))
}

#[test]
fn test_unconfigured_device() {
    let _lock = exclusive();

    let err = stb::press("KEY_OK", None, None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "uitest::press isn't configured to run on your hardware"
    );
    assert!(stb::last_keypress().is_none());
    assert!(matches!(stb::get_frame(), Err(Error::NotConfigured(_))));
    assert!(matches!(
        stb::pressing("KEY_OK", None),
        Err(Error::NotConfigured(_))
    ));
    assert!(matches!(
        stb::draw_text("hello", Duration::from_secs(3)),
        Err(Error::NotConfigured(_))
    ));

    let mut frames = stb::frames(Some(Duration::from_secs(1)));
    assert!(matches!(frames.next(), Some(Err(Error::NotConfigured(_)))));
    assert!(frames.next().is_none());
}

#[test]
fn test_set_device_restores_previous_device() {
    let _lock = exclusive();
    let (_, outer) = scripted(vec![screen(100)]);
    let (_, inner) = scripted(vec![screen(200)]);

    {
        let _outer = stb::set_device(outer.clone());
        assert_eq!(stb::get_frame().unwrap().get(0, 0, 0).unwrap(), 100);
        {
            let _inner = stb::set_device(inner.clone());
            assert_eq!(stb::get_frame().unwrap().get(0, 0, 0).unwrap(), 200);
        }
        assert_eq!(stb::get_frame().unwrap().get(0, 0, 0).unwrap(), 100);
    }
    assert!(stb::get_frame().is_err());
}

#[test]
fn test_press_and_wait_for_the_screen_to_react() {
    let _lock = exclusive();
    // The button lights up two frames after the press and flickers once.
    let (clock, device) = scripted(vec![
        screen(50),
        screen(50),
        screen(255),
        screen(50),
        screen(255),
    ]);
    let _guard = stb::set_device(device.clone());
    let button = Region::new(0.0, 0.0, 4.0, 2.0).unwrap();

    let keypress = stb::press("KEY_OK", None, None).unwrap();
    assert_eq!(keypress.start_time, EPOCH);
    let before = crop(&keypress.frame_before, &button).unwrap();

    let frame = WaitUntil::new()
        .with_clock(device.clock())
        .with_timeout(Duration::from_secs(10))
        .with_stable(Duration::from_secs(1))
        .try_run_with(
            || device.next_frame(),
            |frame| {
                let now = crop(frame, &button).unwrap();
                !now.pixels_eq(&before)
            },
        )
        .unwrap()
        .unwrap();

    // The flicker at 2s doesn't count; the change that sticks starts at 4s.
    assert_eq!(frame.time(), Some(EPOCH + 4.0));
    assert_eq!(frame.get(0, 0, 0).unwrap(), 255);
    assert!(clock.now() >= EPOCH + 5.0);

    assert_eq!(stb::last_keypress().unwrap().key, "KEY_OK");
}

#[test]
fn test_pressing_releases_on_drop() {
    let _lock = exclusive();
    let (clock, device) = scripted(vec![screen(0)]);
    let _guard = stb::set_device(device.clone());

    {
        let held = stb::pressing("KEY_RIGHT", None).unwrap();
        assert_eq!(held.info().key, "KEY_RIGHT");
        assert_eq!(device.held_keys(), ["KEY_RIGHT"]);
        clock.advance(Duration::from_secs(2));
    }
    assert!(device.held_keys().is_empty());
    assert_eq!(stb::last_keypress().unwrap().end_time, EPOCH + 2.0);

    // Explicit release reports errors instead of logging them.
    let held = stb::pressing("KEY_LEFT", Some(Duration::ZERO)).unwrap();
    held.release().unwrap();
    assert!(device.held_keys().is_empty());
}

#[test]
fn test_frames_with_timeout() {
    let _lock = exclusive();
    let (clock, device) = scripted(vec![screen(0), screen(1), screen(2)]);
    let _guard = stb::set_device(device.clone());

    let frames: Vec<Frame> = stb::frames(Some(Duration::from_secs(3)))
        .collect::<Result<_, _>>()
        .unwrap();
    let times: Vec<f64> = frames.iter().filter_map(Frame::time).collect();
    assert_eq!(times, vec![EPOCH, EPOCH + 1.0, EPOCH + 2.0, EPOCH + 3.0]);
    assert_eq!(frames[3].get(2, 7, 0).unwrap(), 20);
    assert_eq!(clock.now(), EPOCH + 3.0);

    // Each call starts a fresh deadline.
    assert_eq!(stb::frames(Some(Duration::from_secs(1))).count(), 1);
    assert_eq!(clock.now(), EPOCH + 4.0);
}

#[test]
fn test_draw_text_reaches_the_device() {
    let _lock = exclusive();
    let (_, device) = scripted(vec![screen(0)]);
    let _guard = stb::set_device(device.clone());

    stb::draw_text("Waiting for the menu", Duration::from_secs(3)).unwrap();
    assert_eq!(device.texts(), ["Waiting for the menu"]);
}
