//! Skystack: stack the swinging block on the tower, in the terminal.

mod app;
mod game;
mod input;
mod leaderboard;
mod scene;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use game::{EngineConfig, GameEngine, Size};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

/// Options derived from CLI that affect presentation only (the engine gets an [`EngineConfig`]).
#[derive(Debug, Clone)]
pub struct UiOptions {
    pub frame_rate: f64,
    pub no_animation: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            no_animation: false,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.verbose)?;

    let config = args.engine_config();
    config.validate().context("invalid game settings")?;
    if !args.frame_rate.is_finite() || args.frame_rate <= 0.0 {
        anyhow::bail!("frame rate must be positive, got {}", args.frame_rate);
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette)
        .with_context(|| format!("loading theme {:?}", args.theme))?;
    let options = UiOptions {
        frame_rate: args.frame_rate,
        no_animation: args.no_animation,
    };

    let mut app = App::new(GameEngine::new(config), options, theme);
    app.run()?;
    Ok(())
}

/// Send `tracing` output to `path`; without a path nothing is logged (the terminal belongs to the game).
fn init_logging(path: Option<&Path>, verbose: u8) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(level)
        .init();
    tracing::info!(level = %level, "logging initialized");
    Ok(())
}

/// Sky Stacker style arcade game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "skystack",
    version,
    about = "Stack the swinging block on the tower. Land it dead centre for 10 points; three sloppy drops in a row or a clean miss ends the run.",
    long_about = "Skystack is a terminal take on the Sky Stacker arcade game.\n\n\
        A block swings across the sky above your tower. Drop it: whatever hangs over the edge \
        is sliced off and falls away. Landing within 10 units of centre is perfect (+10) and \
        resets your fail count; any other overlap scores +1 and counts as a fail. Three fails in \
        a row, or missing the tower entirely, ends the game. The block speeds up at 150 and 500 points.\n\n\
        CONTROLS:\n  Space/Enter/Down  Drop   P  Pause   L  Leaderboard   R  Restart   Q / Esc  Quit"
)]
pub struct Args {
    /// Width of the playing field in world units (blocks wrap around its edges).
    #[arg(long, default_value = "400", value_name = "UNITS")]
    pub field_width: f32,

    /// Width of the base block and of every new block.
    #[arg(long, default_value = "200", value_name = "UNITS")]
    pub block_width: f32,

    /// Height of every block.
    #[arg(long, default_value = "40", value_name = "UNITS")]
    pub block_height: f32,

    /// Always start blocks from the left edge instead of alternating sides.
    #[arg(long)]
    pub no_alternate: bool,

    /// Flash the score every N points (0 disables).
    #[arg(long, default_value = "50", value_name = "N")]
    pub milestone_step: u32,

    /// Path to theme file (btop-style theme[key]="#RRGGBB"). Uses tangerine on blue if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Frames per second; the block advances one 1/RATE step per frame.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Disable camera easing, falling pieces and the milestone flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// More log detail (-v debug, -vv trace). Only used with --log-file.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            field_width: self.field_width,
            block_size: Size::new(self.block_width, self.block_height),
            alternate_spawn_side: !self.no_alternate,
            milestone_step: self.milestone_step,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
