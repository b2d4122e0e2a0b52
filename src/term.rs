use std::convert::TryFrom;
use std::io::{Stdout, Write, stdout};

use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};

use crate::{Coords, TermCoords, TermInt};
use crate::driver::{FrameView, Outcome, Phase, Renderer};
use crate::error::GameError;
use crate::snake::Boundary;

const SNAKE_BODY_CHAR: char = '█';
const APPLE_CELL: [char; 2] = ['(', ')'];
const DEAD_SNAKE_CHAR: char = 'X';

// Each grid cell is two terminal columns wide so the board looks square
const CELL_WIDTH: TermInt = 2;

/// Owns the terminal for the lifetime of the game. Raw mode and the
/// alternate screen are undone on drop.
pub struct TermManager {
    width: TermInt,
    height: TermInt,
    stdout: Stdout,
    // What is currently on screen, row-major
    screen: Vec<char>,
    board_origin: TermCoords,
    board_size: TermCoords,
    score: u32,
    active: bool,
}

impl TermManager {
    pub fn new(grid_size: i32) -> Result<Self, GameError> {
        let (width, height) = terminal::size()?;
        let (board_w, board_h) = fit_board(grid_size, (width, height))?;

        let board_origin = ((width - board_w) / 2, (height - board_h - 1) / 2);
        let screen = vec![' '; width as usize * height as usize];

        Ok(TermManager {
            width,
            height,
            stdout: stdout(),
            screen,
            board_origin,
            board_size: (board_w, board_h),
            score: 0,
            active: false,
        })
    }

    pub fn setup(&mut self) -> Result<(), GameError> {
        execute!(self.stdout, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking, terminal::Clear(ClearType::All))?;
        self.active = true;
        Ok(())
    }

    pub fn restore(&mut self) -> Result<(), GameError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        terminal::disable_raw_mode()?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)?;
        Ok(())
    }

    fn compose(&self, view: &FrameView) -> Canvas {
        let mut canvas = Canvas::new(self.width, self.height);
        let (ox, oy) = self.board_origin;
        let (board_w, board_h) = self.board_size;
        let grid_size = view.grid_size;

        canvas.draw_borders((ox, oy), (board_w, board_h), view.boundary);

        let to_term = |(x, y): Coords| -> Option<TermCoords> {
            if x < 0 || y < 0 || x >= grid_size || y >= grid_size {
                return None;
            }
            let col = TermInt::try_from(x).ok()?.checked_mul(CELL_WIDTH)?.checked_add(ox + 1)?;
            let row = TermInt::try_from(y).ok()?.checked_add(oy + 1)?;
            Some((col, row))
        };

        if let Some(pos) = view.food.and_then(to_term) {
            canvas.put_cell(pos, APPLE_CELL);
        }

        match view.phase {
            Phase::Over(Outcome::Crashed) => {
                for pos in view.body.iter().filter_map(|p| to_term(*p)) {
                    canvas.put_cell(pos, [DEAD_SNAKE_CHAR; 2]);
                }
            }
            _ => {
                // Tail first so the head ends up on top
                let cells: Vec<Coords> = view.interpolated()
                    .map(|(x, y)| (x.round() as i32, y.round() as i32))
                    .collect();
                for (i, cell) in cells.iter().enumerate().rev() {
                    let ch = if i == 0 { view.head_char } else { SNAKE_BODY_CHAR };
                    if let Some(pos) = to_term(*cell) {
                        canvas.put_cell(pos, [ch; 2]);
                    }
                }
            }
        }

        let mode = match view.boundary {
            Boundary::Bounded => "walls",
            Boundary::Toroidal => "wrap",
        };
        let status = format!("Score: {:<6} {:>w$}", self.score, mode, w = (board_w as usize).saturating_sub(14));
        canvas.put_str((ox, oy + board_h), &status);

        let score_line = format!("Score: {}", view.score);
        let lines: &[&str] = match view.phase {
            Phase::Ready => &[
                "Arrow keys or WASD to move",
                "Esc to pause",
                "Q or CTRL+C to quit",
                "",
                "Press Enter to begin",
            ],
            Phase::Paused => &["Paused", "Press Esc to resume", "or CTRL+C to quit"],
            Phase::Over(outcome) => {
                let title = if outcome == Outcome::BoardFull { "You won!" } else { "Game over!" };
                return canvas.with_message(&[
                    title,
                    score_line.as_str(),
                    "",
                    "Press Enter to play again,",
                    "or CTRL+C to quit.",
                ]);
            }
            Phase::Running => &[],
        };

        canvas.with_message(lines)
    }

    // Only cells that differ from what is on screen get written
    fn present(&mut self, canvas: Canvas) -> Result<(), GameError> {
        for (i, (&new, old)) in canvas.cells.iter().zip(self.screen.iter_mut()).enumerate() {
            if new != *old {
                let pos = ((i % self.width as usize) as TermInt, (i / self.width as usize) as TermInt);
                queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(new))?;
                *old = new;
            }
        }

        self.stdout.flush()?;
        Ok(())
    }
}

impl Renderer for TermManager {
    fn render(&mut self, view: &FrameView) -> Result<(), GameError> {
        let canvas = self.compose(view);
        self.present(canvas)
    }

    fn score_changed(&mut self, score: u32) -> Result<(), GameError> {
        self.score = score;
        Ok(())
    }
}

impl Drop for TermManager {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

// Board size in terminal cells including the border, None if it can't be
// addressed at all
fn board_extent(grid_size: i32) -> Option<TermCoords> {
    let cells = TermInt::try_from(grid_size).ok()?;
    Some((cells.checked_mul(CELL_WIDTH)?.checked_add(2)?, cells.checked_add(2)?))
}

// Board plus one status line underneath must fit the terminal
fn fit_board(grid_size: i32, term_size: TermCoords) -> Result<TermCoords, GameError> {
    let (width, height) = term_size;
    let extent = board_extent(grid_size);

    match extent {
        Some((board_w, board_h)) if board_w <= width && board_h < height => Ok((board_w, board_h)),
        _ => {
            let (needed_width, needed_height) = extent
                .and_then(|(w, h)| Some((w, h.checked_add(1)?)))
                .unwrap_or((TermInt::MAX, TermInt::MAX));
            Err(GameError::TerminalTooSmall { width, height, needed_width, needed_height })
        }
    }
}

struct Canvas {
    width: TermInt,
    height: TermInt,
    cells: Vec<char>,
}

impl Canvas {
    fn new(width: TermInt, height: TermInt) -> Self {
        Canvas { width, height, cells: vec![' '; width as usize * height as usize] }
    }

    fn put(&mut self, pos: TermCoords, ch: char) {
        if pos.0 < self.width && pos.1 < self.height {
            self.cells[self.width as usize * pos.1 as usize + pos.0 as usize] = ch;
        }
    }

    fn put_cell(&mut self, pos: TermCoords, chars: [char; 2]) {
        self.put(pos, chars[0]);
        self.put((pos.0 + 1, pos.1), chars[1]);
    }

    fn put_str(&mut self, pos: TermCoords, s: &str) {
        for (x_diff, ch) in s.chars().enumerate() {
            self.put((pos.0 + x_diff as TermInt, pos.1), ch);
        }
    }

    fn draw_borders(&mut self, top_left: TermCoords, size: TermCoords, boundary: Boundary) {
        let (width, height) = size;
        let (x0, y0) = top_left;
        let end_x = x0 + width - 1;
        let end_y = y0 + height - 1;

        // A dotted edge marks a board the snake can pass through
        let (horizontal, vertical) = match boundary {
            Boundary::Bounded => ('-', '|'),
            Boundary::Toroidal => ('.', ':'),
        };

        for x in x0..=end_x {
            let ch = if x == x0 || x == end_x {'+'} else {horizontal};
            self.put((x, y0), ch);
            self.put((x, end_y), ch);
        }

        for y in y0 + 1..end_y {
            self.put((x0, y), vertical);
            self.put((end_x, y), vertical);
        }
    }

    fn with_message(mut self, lines: &[&str]) -> Self {
        if lines.is_empty() {
            return self;
        }

        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 2) as TermInt;
        let center = (self.width / 2, self.height / 2);
        let top_left = (center.0.saturating_sub(msg_width / 2), center.1.saturating_sub(msg_height / 2));

        for y in [top_left.1, top_left.1 + msg_height - 1].iter() {
            for x_diff in 0..msg_width {
                self.put((top_left.0 + x_diff, *y), ' ');
            }
        }

        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as TermInt + 1;
            self.put_str((top_left.0, y), &padded_line);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn row(canvas: &Canvas, y: TermInt) -> String {
        let start = canvas.width as usize * y as usize;
        canvas.cells[start..start + canvas.width as usize].iter().collect()
    }

    #[test]
    fn board_extent_counts_borders() {
        assert_eq!(board_extent(20), Some((42, 22)));
        assert_eq!(board_extent(5), Some((12, 7)));
    }

    #[test]
    fn oversized_grids_never_fit() {
        assert_eq!(board_extent(40000), None);
        assert_eq!(board_extent(65541), None);
        assert_eq!(board_extent(-1), None);

        for &size in &[40000, 65541, 32767] {
            let res = fit_board(size, (TermInt::MAX, TermInt::MAX));
            assert!(matches!(res, Err(GameError::TerminalTooSmall { .. })), "grid {}", size);
        }
    }

    #[test]
    fn board_must_leave_room_for_status() {
        assert_eq!(fit_board(20, (42, 23)).unwrap(), (42, 22));
        assert!(matches!(
            fit_board(20, (42, 22)),
            Err(GameError::TerminalTooSmall { width: 42, height: 22, needed_width: 42, needed_height: 23 })
        ));
        assert!(fit_board(20, (41, 30)).is_err());
    }

    #[test]
    fn borders_follow_boundary() {
        let mut canvas = Canvas::new(12, 7);
        canvas.draw_borders((0, 0), (12, 7), Boundary::Bounded);
        assert_eq!(row(&canvas, 0), "+----------+");
        assert_eq!(row(&canvas, 3), "|          |");

        let mut canvas = Canvas::new(12, 7);
        canvas.draw_borders((0, 0), (12, 7), Boundary::Toroidal);
        assert_eq!(row(&canvas, 6), "+..........+");
        assert_eq!(row(&canvas, 1), ":          :");
    }

    #[test]
    fn message_is_centred_and_padded() {
        let canvas = Canvas::new(10, 5).with_message(&["hi"]);
        assert_eq!(row(&canvas, 1), "          ");
        assert_eq!(row(&canvas, 2), "    hi    ");
    }

    #[test]
    fn writes_outside_the_canvas_are_clipped() {
        let mut canvas = Canvas::new(4, 2);
        canvas.put_cell((3, 1), ['a', 'b']);
        canvas.put_str((2, 0), "xyz");
        assert_eq!(row(&canvas, 0), "  xy");
        assert_eq!(row(&canvas, 1), "   a");
    }

    #[test]
    fn composes_snake_food_and_status() {
        let term = TermManager {
            width: 12,
            height: 8,
            stdout: stdout(),
            screen: vec![' '; 12 * 8],
            board_origin: (0, 0),
            board_size: (12, 7),
            score: 30,
            active: false,
        };
        let body: VecDeque<Coords> = vec![(2, 1), (1, 1), (0, 1)].into_iter().collect();
        let previous = vec![(2, 1), (1, 1), (0, 1)];
        let view = FrameView {
            body: &body,
            previous_body: &previous,
            alpha: 1.0,
            food: Some((4, 3)),
            score: 30,
            head_char: '>',
            grid_size: 5,
            boundary: Boundary::Bounded,
            phase: Phase::Running,
        };

        let canvas = term.compose(&view);
        assert_eq!(row(&canvas, 2), "|████>>    |");
        assert_eq!(row(&canvas, 4), "|        ()|");
        assert!(row(&canvas, 7).starts_with("Score: 30"));
    }
}
