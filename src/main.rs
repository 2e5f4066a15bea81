pub(crate) mod bulb;
pub(crate) mod colors;
pub(crate) mod engine;
pub(crate) mod intervaltimer;
pub(crate) mod pattern;
pub(crate) mod strip;
pub(crate) mod window;

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::bulb::BulbStyle;
use crate::colors::Palette;
use crate::engine::{PatternEngine, RotationMode, BULB_COUNT};
use crate::strip::LightStrip;
use crate::window::{StripWindow, WindowOptions};

/// A string of Christmas lights on top of your desktop. Drag it with the left
/// mouse button, right-click to put it away.
#[derive(Parser)]
struct Cli {
    /// How patterns are laid onto the 20 bulbs
    #[arg(short, long, value_enum, default_value_t = RotationMode::Slice)]
    mode: RotationMode,

    /// Switch to the next pattern every MS milliseconds
    #[arg(short, long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    advance_every: Option<u64>,

    /// TOML or JSON file with [[pattern]] tables to use instead of the built-in set
    #[arg(short, long, value_name = "FILE")]
    patterns: Option<std::path::PathBuf>,

    /// Index of the pattern to start with
    #[arg(long, value_name = "N", default_value_t = 0)]
    start_pattern: usize,

    /// Bulb shape
    #[arg(short, long, value_enum, default_value_t = BulbStyle::Round)]
    style: BulbStyle,

    /// Draw a soft halo around each bulb
    #[arg(short, long)]
    glow: bool,

    /// Window opacity between 0.0 and 1.0, where supported
    #[arg(long, default_value_t = 1.0)]
    opacity: f32,

    /// Window position, defaults to the top center of the screen
    #[arg(long, requires = "y", allow_hyphen_values = true)]
    x: Option<i32>,

    #[arg(long, requires = "x", allow_hyphen_values = true)]
    y: Option<i32>,
}

fn create_strip(args: &Cli) -> Result<LightStrip, pattern::PatternError> {
    let palette = Palette::christmas();
    let patterns = match args.patterns.as_deref() {
        Some(path) => pattern::load_file(path, &palette)?,
        None => pattern::load_embedded(&palette)?,
    };
    let engine = PatternEngine::new(patterns, args.mode, args.start_pattern, BULB_COUNT)?;

    Ok(LightStrip::new(
        engine,
        palette,
        BULB_COUNT,
        args.style,
        args.glow,
    ))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();

    let mut strip = match create_strip(&args) {
        Ok(strip) => strip,
        Err(err) => {
            log::error!("Cannot load patterns: {err}");
            process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let handler_running = Arc::clone(&running);
    if let Err(err) = ctrlc::set_handler(move || handler_running.store(false, Ordering::SeqCst)) {
        log::warn!("Cannot install Ctrl-C handler: {err}");
    }

    let options = WindowOptions {
        opacity: args.opacity,
        position: args.x.zip(args.y),
        advance_every: args.advance_every.map(Duration::from_millis),
    };

    window::prefer_x11_on_wayland();
    let mut window = match StripWindow::new(strip.size(), &options) {
        Ok(window) => window,
        Err(err) => {
            log::error!("Cannot set up window: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = window.run(&mut strip, running) {
        log::error!("{err}");
        process::exit(1);
    }
}
