use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("terminal error: {0}")]
    Terminal(#[from] crossterm::ErrorKind),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("grid size {size} is too small, need at least {min}")]
    GridTooSmall { size: i32, min: i32 },
    #[error("grid size {size} is too large, at most {max} is supported")]
    GridTooLarge { size: i32, max: i32 },
    #[error("terminal is {width}x{height}, need at least {needed_width}x{needed_height} for this grid")]
    TerminalTooSmall { width: u16, height: u16, needed_width: u16, needed_height: u16 },
}
