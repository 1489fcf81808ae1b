//! Loading images from disk or memory, and saving frames.

use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use tracing::debug;

use uitest_core::{Config, Error, Result};

use crate::color::{convert_channels, ColorChannels};
use crate::frame::{Frame, Provenance};

/// Anything [`ImageLoader::load`] accepts.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Path to an image file
    Path(PathBuf),
    /// Frame already in memory
    Frame(Frame),
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}

impl From<String> for ImageSource {
    fn from(path: String) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<Frame> for ImageSource {
    fn from(frame: Frame) -> Self {
        ImageSource::Frame(frame)
    }
}

impl From<&Frame> for ImageSource {
    fn from(frame: &Frame) -> Self {
        ImageSource::Frame(frame.clone())
    }
}

/// Resolves image paths against a root directory and decodes them.
#[derive(Debug, Clone, Default)]
pub struct ImageLoader {
    root: Option<PathBuf>,
}

impl ImageLoader {
    /// Loader that resolves relative paths against the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that resolves relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Loader using `images.root` from the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.images.root.clone(),
        }
    }

    /// Absolute root directory.
    pub fn root(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(match &self.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => cwd.join(root),
            None => cwd,
        })
    }

    /// Resolve `path` to an existing absolute path.
    ///
    /// Fails with [`Error::NotFound`] naming `path` as given.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root()?.join(path)
        };
        if !absolute.is_file() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        Ok(absolute)
    }

    /// Load an image.
    ///
    /// * A frame that carries provenance (a capture or a loaded image) is
    ///   returned unchanged, without any colour conversion.
    /// * A bare in-memory frame is converted to an acceptable channel count,
    ///   reusing its storage when no conversion is needed.
    /// * A path is resolved, decoded and converted; the result records the
    ///   file name as given, relative to the root, and absolute.
    pub fn load(&self, source: impl Into<ImageSource>, channels: &ColorChannels) -> Result<Frame> {
        match source.into() {
            ImageSource::Frame(frame) if !frame.provenance().is_empty() => Ok(frame),
            ImageSource::Frame(frame) => convert_channels(&frame, channels),
            ImageSource::Path(path) => self.load_path(&path, channels),
        }
    }

    fn load_path(&self, path: &Path, channels: &ColorChannels) -> Result<Frame> {
        let absolute = self.resolve(path)?;
        let root = self.root()?;
        let relative = absolute
            .strip_prefix(&root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| absolute.clone());

        let decoded = decode(&absolute)?;
        debug!(
            "Loaded image {} ({}x{}, {} channels)",
            absolute.display(),
            decoded.width(),
            decoded.height(),
            decoded.channels()
        );

        let frame = convert_channels(&decoded, channels)?;
        Ok(frame.with_provenance(Provenance {
            time: None,
            filename: Some(path.to_path_buf()),
            relative_filename: Some(relative),
            absolute_filename: Some(absolute),
        }))
    }
}

/// Load an image, resolving relative paths against the current directory.
///
/// See [`ImageLoader::load`].
pub fn load_image(source: impl Into<ImageSource>, channels: &ColorChannels) -> Result<Frame> {
    ImageLoader::new().load(source, channels)
}

/// Decode an image file into a frame with 1, 2, 3 or 4 channels.
///
/// 16-bit and floating-point images are scaled down to 8 bits per sample.
fn decode(path: &Path) -> Result<Frame> {
    let img = image::open(path)
        .map_err(|e| Error::Image(format!("Failed to decode {}: {e}", path.display())))?;
    let (width, height) = (img.width() as usize, img.height() as usize);

    let (data, channels) = match img.color() {
        ColorType::L8 | ColorType::L16 => (img.into_luma8().into_raw(), 1),
        ColorType::La8 | ColorType::La16 => (img.into_luma_alpha8().into_raw(), 2),
        color if color.has_alpha() => (img.into_rgba8().into_raw(), 4),
        _ => (img.into_rgb8().into_raw(), 3),
    };
    Frame::from_raw(data, width, height, channels)
}

/// Save a frame to `path`; the format comes from the file extension.
pub fn save_frame(frame: &Frame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let too_large = |_| Error::Image(format!("Frame too large to encode: {frame:?}"));
    let width = u32::try_from(frame.width()).map_err(too_large)?;
    let height = u32::try_from(frame.height()).map_err(too_large)?;
    let data = frame.to_vec();

    let img = match frame.channels() {
        1 => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
        2 => GrayAlphaImage::from_raw(width, height, data).map(DynamicImage::ImageLumaA8),
        3 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        _ => RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
    }
    .ok_or_else(|| Error::Image(format!("Sample buffer doesn't match {frame:?}")))?;

    img.save(path)
        .map_err(|e| Error::Image(format!("Failed to save {}: {e}", path.display())))?;
    debug!("Saved frame to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_source_conversions() {
        assert!(matches!(ImageSource::from("a.png"), ImageSource::Path(_)));
        assert!(matches!(
            ImageSource::from(PathBuf::from("a.png")),
            ImageSource::Path(_)
        ));
        let frame = Frame::filled(1, 1, 3, 0).unwrap();
        assert!(matches!(ImageSource::from(&frame), ImageSource::Frame(_)));
    }

    #[test]
    fn test_loader_root() {
        let loader = ImageLoader::with_root("/srv/pack");
        assert_eq!(loader.root().unwrap(), PathBuf::from("/srv/pack"));

        let relative = ImageLoader::with_root("pack");
        assert!(relative.root().unwrap().is_absolute());
        assert!(relative.root().unwrap().ends_with("pack"));

        let mut config = Config::default();
        config.images.root = Some(PathBuf::from("/srv/other"));
        assert_eq!(
            ImageLoader::from_config(&config).root().unwrap(),
            PathBuf::from("/srv/other")
        );
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ImageLoader::with_root(dir.path());
        let err = loader.resolve(Path::new("idontexist.png")).unwrap_err();
        assert_eq!(err.to_string(), "No such file: idontexist.png");
    }

    #[test]
    fn test_save_and_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let frame = Frame::from_raw(vec![0, 64, 128, 255], 2, 2, 1).unwrap();
        save_frame(&frame, &path).unwrap();

        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.channels(), 1);
        assert!(decoded.pixels_eq(&frame));
    }

    #[test]
    fn test_save_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::filled(2, 2, 3, 0).unwrap();
        let result = save_frame(&frame, dir.path().join("frame.unknown"));
        assert!(matches!(result, Err(Error::Image(_))));
    }
}
