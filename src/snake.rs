use std::collections::VecDeque;

use crate::Coords;
use Direction::*;

pub const INITIAL_SNAKE_LENGTH: i32 = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    fn delta(self) -> Coords {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Boundary {
    Bounded,
    // Leaving one edge re-enters from the opposite one
    Toroidal,
}

pub struct Snake {
    // Head first
    body: VecDeque<Coords>,
    previous_body: Vec<Coords>,
    direction: Direction,
    pending_direction: Direction,
    boundary: Boundary,
    grid_size: i32,
}

impl Snake {
    pub fn new(grid_size: i32, boundary: Boundary) -> Self {
        let center = grid_size / 2;
        let body = (0..INITIAL_SNAKE_LENGTH)
            .map(|i| (center - i, center))
            .collect();
        Snake::from_body(body, Right, boundary, grid_size)
    }

    pub fn from_body(body: VecDeque<Coords>, direction: Direction, boundary: Boundary, grid_size: i32) -> Self {
        let previous_body = body.iter().copied().collect();
        Snake { body, previous_body, direction, pending_direction: direction, boundary, grid_size }
    }

    pub fn body(&self) -> &VecDeque<Coords> {
        &self.body
    }

    pub fn previous_body(&self) -> &[Coords] {
        &self.previous_body
    }

    pub fn head(&self) -> Coords {
        self.body[0]
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Buffers a turn for the next tick. A turn that would reverse either the
    /// committed heading or the one already buffered is dropped.
    pub fn change_direction(&mut self, requested: Direction) {
        if requested != self.direction.opposite() && requested != self.pending_direction.opposite() {
            self.pending_direction = requested;
        }
    }

    pub fn commit_direction(&mut self) {
        self.direction = self.pending_direction;
    }

    pub fn snapshot(&mut self) {
        self.previous_body.clear();
        self.previous_body.extend(self.body.iter().copied());
    }

    /// Returns true if the new head landed on the food; the tail then stays.
    pub fn move_step(&mut self, food: Option<Coords>) -> bool {
        let (x, y) = self.head();
        let (dx, dy) = self.direction.delta();

        let new_head = match self.boundary {
            Boundary::Bounded => (x + dx, y + dy),
            Boundary::Toroidal => (
                (x + dx + self.grid_size) % self.grid_size,
                (y + dy + self.grid_size) % self.grid_size,
            ),
        };

        self.body.push_front(new_head);

        if food == Some(new_head) {
            true
        } else {
            self.body.pop_back();
            false
        }
    }

    pub fn check_collision(&self) -> bool {
        let head = self.head();

        if self.boundary == Boundary::Bounded {
            let out = |c: i32| c < 0 || c >= self.grid_size;
            if out(head.0) || out(head.1) {
                return true;
            }
        }

        self.body.iter().skip(1).any(|pos| *pos == head)
    }

    pub fn head_char(&self) -> char {
        match self.direction {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }
}
