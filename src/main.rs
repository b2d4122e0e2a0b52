mod driver;
mod error;
mod game;
mod input;
mod scheduler;
mod snake;
mod term;

use std::{fs::File, path::{Path, PathBuf}, sync::Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::driver::GameConfig;
use crate::snake::Boundary;

pub type TermInt = u16;
pub type TermCoords = (u16, u16);
/// Grid cell. Signed so a head can sit one step past a wall.
pub type Coords = (i32, i32);

/// Snake on a square grid in the terminal.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Number of cells along each side of the board.
    #[arg(short = 'g', long, default_value_t = 20)]
    grid_size: i32,

    /// Let the snake leave one edge and come back through the opposite one.
    #[arg(short = 'w', long)]
    wrap: bool,

    /// Seed for food placement, for reproducible games.
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (filtered by RUST_LOG, default "info").
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl CliArgs {
    fn game_config(&self) -> GameConfig {
        let boundary = if self.wrap { Boundary::Toroidal } else { Boundary::Bounded };
        GameConfig { grid_size: self.grid_size, boundary, ..GameConfig::default() }
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let mut game = game::SnakeGame::new(args.game_config(), args.seed)
        .context("failed to start the game")?;

    // Dropping the game hands the terminal back before any error is printed
    let res = game.run();
    drop(game);
    res.context("game loop failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_bounded_twenty() {
        let args = CliArgs::parse_from(["gridsnake"]);
        let config = args.game_config();
        assert_eq!(config.grid_size, 20);
        assert_eq!(config.boundary, Boundary::Bounded);
        assert!(args.seed.is_none());
    }

    #[test]
    fn wrap_flag_selects_toroidal() {
        let args = CliArgs::parse_from(["gridsnake", "--wrap", "--grid-size", "12", "--seed", "7"]);
        let config = args.game_config();
        assert_eq!(config.grid_size, 12);
        assert_eq!(config.boundary, Boundary::Toroidal);
        assert_eq!(args.seed, Some(7));
    }
}
