//! Command-line interface for inspecting and cropping images.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Serialize;
use tracing::info;

use uitest_core::{Config, Region};
use uitest_frame::{crop, save_frame, ColorChannels, Frame, ImageLoader};

/// Usage text printed for `--help`.
pub const USAGE: &str = "\
Usage: uitest [--config <file>] <command>

Commands:
  info <image>                             Print size, channels and file names
  crop <image> <x,y,right,bottom> <out>    Crop an image and save the result

Options:
  --config <file>    YAML configuration file
  -h, --help         Show this message
";

/// A subcommand and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Describe an image
    Info {
        /// Image to describe
        image: PathBuf,
    },
    /// Crop an image to a region and save it
    Crop {
        /// Source image
        image: PathBuf,
        /// Region to keep
        region: Region,
        /// Destination file; the format follows the extension
        output: PathBuf,
    },
    /// Print usage
    Help,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Path given with `--config`
    pub config: Option<PathBuf>,
    /// What to do
    pub command: Command,
}

/// Parse command-line arguments (without the program name).
pub fn parse(args: &[String]) -> anyhow::Result<Invocation> {
    let mut config = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a file name")?;
                config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                return Ok(Invocation {
                    config,
                    command: Command::Help,
                })
            }
            flag if flag.starts_with("--") => bail!("Unknown option '{flag}'"),
            _ => positional.push(arg.as_str()),
        }
    }

    let command = match positional.as_slice() {
        ["info", image] => Command::Info {
            image: PathBuf::from(image),
        },
        ["crop", image, region, output] => Command::Crop {
            image: PathBuf::from(image),
            region: region.parse()?,
            output: PathBuf::from(output),
        },
        [] => Command::Help,
        [name, ..] if *name == "info" || *name == "crop" => {
            bail!("Wrong number of arguments for '{name}'\n\n{USAGE}")
        }
        [name, ..] => bail!("Unknown command '{name}'\n\n{USAGE}"),
    };

    Ok(Invocation { config, command })
}

/// Description printed by `uitest info`.
#[derive(Debug, Serialize)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Samples per pixel
    pub channels: usize,
    /// File name as given
    pub filename: Option<PathBuf>,
    /// File name relative to the image root
    pub relative_filename: Option<PathBuf>,
    /// Absolute file name
    pub absolute_filename: Option<PathBuf>,
}

impl From<&Frame> for ImageInfo {
    fn from(frame: &Frame) -> Self {
        Self {
            width: frame.width(),
            height: frame.height(),
            channels: frame.channels(),
            filename: frame.filename().map(Path::to_path_buf),
            relative_filename: frame.relative_filename().map(Path::to_path_buf),
            absolute_filename: frame.absolute_filename().map(Path::to_path_buf),
        }
    }
}

/// Run `command`, writing its report to `out`.
pub fn run(command: &Command, config: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    let loader = ImageLoader::from_config(config);
    // Keep whatever the file has.
    let any_channels = ColorChannels::new(&[1, 3, 4])?;

    match command {
        Command::Help => out.write_all(USAGE.as_bytes())?,
        Command::Info { image } => {
            let frame = loader
                .load(image.as_path(), &any_channels)
                .with_context(|| format!("Failed to load {}", image.display()))?;
            let report = serde_json::to_string_pretty(&ImageInfo::from(&frame))?;
            writeln!(out, "{report}")?;
        }
        Command::Crop {
            image,
            region,
            output,
        } => {
            let frame = loader
                .load(image.as_path(), &any_channels)
                .with_context(|| format!("Failed to load {}", image.display()))?;
            let cropped = crop(&frame, region)?;
            save_frame(&cropped, output)
                .with_context(|| format!("Failed to save {}", output.display()))?;
            info!("Cropped {} to {}", image.display(), region);
            writeln!(
                out,
                "Saved {}x{} crop of {} to {}",
                cropped.width(),
                cropped.height(),
                image.display(),
                output.display()
            )?;
        }
    }

    Ok(())
}
