//! Integration tests for image loading, cropping loaded images and saving.
//!
//! Fixture images are generated into a temporary test-pack directory with
//! the `image` crate so every colour layout is covered.

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma, LumaA, Rgb, Rgba};
use tempfile::TempDir;

use uitest_core::{Error, Region};
use uitest_frame::{crop, load_image, save_frame, ColorChannels, Frame, ImageLoader};

const CHANNEL_PREFERENCES: [&[usize]; 7] =
    [&[1], &[3], &[4], &[1, 3], &[1, 4], &[3, 4], &[1, 3, 4]];

/// A test pack with one image per colour layout.
fn test_pack() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    ImageBuffer::from_fn(8, 4, |x, _| {
        if x < 4 {
            Rgb([255u8, 0, 0])
        } else {
            Rgb([0u8, 0, 255])
        }
    })
    .save(root.join("videotestsrc-redblue.png"))
    .unwrap();

    ImageBuffer::from_fn(8, 4, |x, y| Luma([(x * 30 + y) as u8]))
        .save(root.join("videotestsrc-greyscale.png"))
        .unwrap();

    ImageBuffer::from_fn(8, 4, |x, _| LumaA([(x * 30) as u8, 128u8]))
        .save(root.join("videotestsrc-greyscale-alpha.png"))
        .unwrap();

    ImageBuffer::from_pixel(8, 4, Rgba([10u8, 20, 30, 0]))
        .save(root.join("completely-transparent.png"))
        .unwrap();

    ImageBuffer::from_pixel(8, 4, Rgba([10u8, 20, 30, 255]))
        .save(root.join("with-alpha-but-completely-opaque.png"))
        .unwrap();

    ImageBuffer::from_fn(8, 4, |x, _| Luma([(x as u16) * 8000]))
        .save(root.join("uint16.png"))
        .unwrap();

    dir
}

fn channels(prefs: &[usize]) -> ColorChannels {
    ColorChannels::new(prefs).unwrap()
}

#[test]
fn test_load_image_looks_in_root_directory() {
    let pack = test_pack();
    let loader = ImageLoader::with_root(pack.path());

    let f = loader
        .load("videotestsrc-redblue.png", &ColorChannels::default())
        .unwrap();
    assert_eq!((f.width(), f.height(), f.channels()), (8, 4, 3));
    assert_eq!(
        (f.get(0, 0, 0).unwrap(), f.get(0, 0, 2).unwrap()),
        (255, 0)
    );
    assert_eq!(
        (f.get(0, 7, 0).unwrap(), f.get(0, 7, 2).unwrap()),
        (0, 255)
    );

    assert_eq!(f.filename(), Some(Path::new("videotestsrc-redblue.png")));
    assert_eq!(
        f.relative_filename(),
        Some(Path::new("videotestsrc-redblue.png"))
    );
    assert_eq!(
        f.absolute_filename(),
        Some(pack.path().join("videotestsrc-redblue.png").as_path())
    );
    assert_eq!(f.time(), None);

    let missing = loader.load("info2.png", &ColorChannels::default());
    assert!(missing.unwrap_err().is_not_found());
}

#[test]
fn test_load_image_with_absolute_path() {
    let pack = test_pack();
    let absolute = pack.path().join("uint16.png");
    let f = ImageLoader::with_root("/nonexistent-root")
        .load(absolute.as_path(), &ColorChannels::gray())
        .unwrap();
    assert_eq!(f.filename(), Some(absolute.as_path()));
    // Outside the root, so the relative name falls back to the absolute path.
    assert_eq!(f.relative_filename(), Some(absolute.as_path()));
}

#[test]
fn test_load_image_with_unicode_filename() {
    let pack = test_pack();
    std::fs::copy(
        pack.path().join("videotestsrc-redblue.png"),
        pack.path().join("Röthlisberger.png"),
    )
    .unwrap();

    let loader = ImageLoader::with_root(pack.path());
    let f = loader
        .load("Röthlisberger.png", &ColorChannels::default())
        .unwrap();
    assert_eq!(f.filename(), Some(Path::new("Röthlisberger.png")));

    let owned = loader
        .load(String::from("R\u{f6}thlisberger.png"), &ColorChannels::default())
        .unwrap();
    assert_eq!(owned.filename(), f.filename());
    assert!(owned.pixels_eq(&f));
}

#[test]
fn test_load_image_with_raw_frame() {
    let a = Frame::from_raw(vec![0; 720 * 1280 * 3], 1280, 720, 3).unwrap();
    let img = load_image(&a, &ColorChannels::default()).unwrap();
    assert!(img.shares_storage(&a));
    assert_eq!(img.filename(), None);
    assert_eq!(img.relative_filename(), None);
    assert_eq!(img.absolute_filename(), None);
    assert_eq!(img.width(), 1280);
    assert_eq!(img.height(), 720);

    let inputs = [
        Frame::from_raw(vec![0; 72 * 128], 128, 72, 1).unwrap(),
        Frame::from_raw(vec![0; 72 * 128 * 3], 128, 72, 3).unwrap(),
        Frame::from_raw(vec![0; 72 * 128 * 4], 128, 72, 4).unwrap(),
    ];
    for x in &inputs {
        for prefs in CHANNEL_PREFERENCES {
            let img = load_image(x, &channels(prefs)).unwrap();
            assert!(
                prefs.contains(&img.channels()),
                "{} channels -> {prefs:?} gave {}",
                x.channels(),
                img.channels()
            );
            assert_eq!((img.width(), img.height()), (128, 72));
        }
    }
}

#[test]
fn test_load_image_with_loaded_image_returns_it_unchanged() {
    let pack = test_pack();
    let loader = ImageLoader::with_root(pack.path());
    let img1 = loader
        .load("videotestsrc-redblue.png", &ColorChannels::default())
        .unwrap();
    // Provenance-carrying frames are reused even if the channels differ.
    let img2 = loader.load(&img1, &ColorChannels::gray()).unwrap();
    assert!(img2.shares_storage(&img1));
    assert_eq!(img2.provenance(), img1.provenance());
    assert_eq!(img2.channels(), 3);

    let captured = Frame::from_capture(vec![0; 12], 2, 2, 3, 1234.0).unwrap();
    let reused = load_image(&captured, &ColorChannels::gray()).unwrap();
    assert!(reused.shares_storage(&captured));
    assert_eq!(reused.time(), Some(1234.0));
}

#[test]
fn test_load_image_from_filename_with_color_channels() {
    let pack = test_pack();
    let loader = ImageLoader::with_root(pack.path());
    let files = [
        "videotestsrc-greyscale.png",
        "videotestsrc-greyscale-alpha.png",
        "completely-transparent.png",
        "with-alpha-but-completely-opaque.png",
        "uint16.png",
    ];
    for f in files {
        for prefs in CHANNEL_PREFERENCES {
            let img = loader.load(f, &channels(prefs)).unwrap();
            assert!(
                prefs.contains(&img.channels()),
                "{f} with {prefs:?} gave {} channels",
                img.channels()
            );
            assert_eq!(img.filename(), Some(Path::new(f)));
        }
    }
}

#[test]
fn test_load_image_color_conversions() {
    let pack = test_pack();
    let loader = ImageLoader::with_root(pack.path());

    let gray_as_color = loader
        .load("videotestsrc-greyscale.png", &ColorChannels::color())
        .unwrap();
    let v = gray_as_color.get(1, 2, 0).unwrap();
    assert_eq!(v, 61);
    assert_eq!(gray_as_color.get(1, 2, 1).unwrap(), v);
    assert_eq!(gray_as_color.get(1, 2, 2).unwrap(), v);

    let transparent = loader
        .load("completely-transparent.png", &ColorChannels::color())
        .unwrap();
    assert_eq!(transparent.to_vec()[..3], [10, 20, 30]);

    let opaque = loader
        .load("with-alpha-but-completely-opaque.png", &ColorChannels::new(&[4]).unwrap())
        .unwrap();
    assert_eq!(opaque.get(0, 0, 3).unwrap(), 255);

    let sixteen = loader.load("uint16.png", &ColorChannels::gray()).unwrap();
    assert_eq!(sixteen.get(0, 0, 0).unwrap(), 0);
    assert!(sixteen.get(0, 7, 0).unwrap() > sixteen.get(0, 1, 0).unwrap());
}

#[test]
fn test_that_load_image_with_nonexistent_image_is_not_found() {
    let pack = test_pack();
    let err = ImageLoader::with_root(pack.path())
        .load("idontexist.png", &ColorChannels::default())
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(err.to_string(), "No such file: idontexist.png");
}

#[test]
fn test_crop_loaded_image() {
    let dir = tempfile::tempdir().unwrap();
    let panel: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(128, 72, |x, y| Rgb([x as u8 + 1, y as u8 + 1, 200]));
    panel.save(dir.path().join("action-panel.png")).unwrap();
    image::imageops::crop_imm(&panel, 104, 67, 4, 2)
        .to_image()
        .save(dir.path().join("action-panel-blue-button.png"))
        .unwrap();

    let loader = ImageLoader::with_root(dir.path());
    let img = loader
        .load("action-panel.png", &ColorChannels::default())
        .unwrap();
    let cropped = crop(&img, &Region::from_extents(104.0, 67.0, 108.0, 69.0).unwrap()).unwrap();
    let reference = loader
        .load("action-panel-blue-button.png", &ColorChannels::default())
        .unwrap();
    assert!(reference.pixels_eq(&cropped));

    // It's a view onto the same memory:
    assert_eq!(cropped.get(0, 0, 0).unwrap(), img.get(67, 104, 0).unwrap());
    assert_ne!(img.get(67, 104, 0).unwrap(), 0);
    cropped.set(0, 0, 0, 0).unwrap();
    assert_eq!(img.get(67, 104, 0).unwrap(), 0);

    assert_eq!(img.filename(), Some(Path::new("action-panel.png")));
    assert_eq!(cropped.filename(), img.filename());

    // Region is clipped to the frame boundaries:
    let clipped = crop(&img, &Region::from_extents(104.0, 67.0, 128.0, 72.0).unwrap()).unwrap();
    let overhanging =
        crop(&img, &Region::from_extents(104.0, 67.0, 129.0, 73.0).unwrap()).unwrap();
    assert!(clipped.pixels_eq(&overhanging));

    // But a region entirely outside the frame is not allowed:
    let outside = crop(&img, &Region::from_extents(-10.0, -10.0, 0.0, 0.0).unwrap());
    assert!(matches!(outside, Err(Error::InvalidRegion(_))));
}

#[test]
fn test_save_frame_roundtrip_keeps_samples() {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("saved.png");
    let frame = Frame::from_capture((0..48).collect(), 4, 4, 3, 10.0).unwrap();
    let view = frame.slice(1..3, 1..4, None).unwrap();

    save_frame(&view, &path).unwrap();
    let loaded = load_image(path.as_path(), &ColorChannels::default()).unwrap();
    assert!(loaded.pixels_eq(&view));
    assert_eq!(loaded.time(), None);
    assert_eq!(loaded.filename(), Some(path.as_path()));
}
