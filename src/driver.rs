use std::{cmp::max, collections::VecDeque, time::Duration};

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::Coords;
use crate::error::GameError;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::snake::{Boundary, Direction, Snake};

pub const MIN_GRID_SIZE: i32 = 5;
pub const MAX_GRID_SIZE: i32 = 500;

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub grid_size: i32,
    pub boundary: Boundary,
    pub base_timestep: Duration,
    pub timestep_decrement: Duration,
    pub min_timestep: Duration,
    pub food_bonus: u32,
    pub food_retries: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            grid_size: 20,
            boundary: Boundary::Bounded,
            base_timestep: Duration::from_millis(150),
            timestep_decrement: Duration::from_millis(2),
            min_timestep: Duration::from_millis(50),
            food_bonus: 10,
            food_retries: 64,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.grid_size < MIN_GRID_SIZE {
            return Err(GameError::GridTooSmall { size: self.grid_size, min: MIN_GRID_SIZE });
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(GameError::GridTooLarge { size: self.grid_size, max: MAX_GRID_SIZE });
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Crashed,
    // Every cell is snake, nowhere left to put food
    BoardFull,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Ready,
    Running,
    Paused,
    Over(Outcome),
}

pub struct GameSession {
    snake: Snake,
    food: Option<Coords>,
    score: u32,
    timestep: Duration,
    leftover: Duration,
    outcome: Option<Outcome>,
}

impl GameSession {
    fn new(config: &GameConfig, rng: &mut StdRng) -> Self {
        let snake = Snake::new(config.grid_size, config.boundary);
        let food = generate_food(snake.body(), config.grid_size, config.food_retries, rng);
        GameSession {
            snake,
            food,
            score: 0,
            timestep: config.base_timestep,
            leftover: Duration::ZERO,
            outcome: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }
}

pub struct FrameView<'a> {
    pub body: &'a VecDeque<Coords>,
    pub previous_body: &'a [Coords],
    pub alpha: f64,
    pub food: Option<Coords>,
    pub score: u32,
    pub head_char: char,
    pub grid_size: i32,
    pub boundary: Boundary,
    pub phase: Phase,
}

impl FrameView<'_> {
    // Segments that jumped more than a cell (a wrap) are not blended
    pub fn interpolated(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let alpha = self.alpha;
        self.body.iter().enumerate().map(move |(i, &(x, y))| {
            let (px, py) = self.previous_body.get(i).copied().unwrap_or((x, y));
            if (x - px).abs() > 1 || (y - py).abs() > 1 {
                (x as f64, y as f64)
            } else {
                (px as f64 + (x - px) as f64 * alpha, py as f64 + (y - py) as f64 * alpha)
            }
        })
    }
}

pub trait Renderer {
    fn render(&mut self, view: &FrameView) -> Result<(), GameError>;

    fn score_changed(&mut self, _score: u32) -> Result<(), GameError> {
        Ok(())
    }
}

/// Picks a random cell not covered by `body`, falling back to a scan of the
/// free cells when the draws keep hitting the snake. None means the board is full.
pub fn generate_food<R: Rng>(body: &VecDeque<Coords>, grid_size: i32, retries: usize, rng: &mut R) -> Option<Coords> {
    for _ in 0..retries {
        let pos = (rng.gen_range(0..grid_size), rng.gen_range(0..grid_size));
        if !body.contains(&pos) {
            return Some(pos);
        }
    }

    let free: Vec<Coords> = (0..grid_size)
        .flat_map(|y| (0..grid_size).map(move |x| (x, y)))
        .filter(|pos| !body.contains(pos))
        .collect();
    free.choose(rng).copied()
}

pub struct Driver<S: FrameScheduler, R: Renderer> {
    config: GameConfig,
    scheduler: S,
    renderer: R,
    rng: StdRng,
    session: GameSession,
    pending: Option<FrameHandle>,
    last_frame_time: Duration,
    started: bool,
    paused: bool,
}

impl<S: FrameScheduler, R: Renderer> Driver<S, R> {
    pub fn new(config: GameConfig, scheduler: S, renderer: R, seed: Option<u64>) -> Result<Self, GameError> {
        config.validate()?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let session = GameSession::new(&config, &mut rng);

        let mut driver = Driver {
            config,
            scheduler,
            renderer,
            rng,
            session,
            pending: None,
            last_frame_time: Duration::ZERO,
            started: false,
            paused: false,
        };
        driver.render(1.0)?;
        Ok(driver)
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn phase(&self) -> Phase {
        match self.session.outcome {
            Some(outcome) => Phase::Over(outcome),
            None if !self.started => Phase::Ready,
            None if self.paused => Phase::Paused,
            None => Phase::Running,
        }
    }

    pub fn change_direction(&mut self, direction: Direction) {
        if self.phase() == Phase::Running {
            self.session.snake.change_direction(direction);
        }
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        self.cancel_pending();

        self.session = GameSession::new(&self.config, &mut self.rng);
        self.last_frame_time = self.scheduler.now();
        self.started = true;
        self.paused = false;

        info!(grid_size = self.config.grid_size, boundary = ?self.config.boundary, "game started");

        self.renderer.score_changed(0)?;
        self.pending = Some(self.scheduler.request_frame());
        Ok(())
    }

    pub fn restart(&mut self) -> Result<(), GameError> {
        self.start()
    }

    pub fn toggle_pause(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase(), Phase::Running | Phase::Paused) {
            return Ok(());
        }

        self.paused = !self.paused;
        info!(paused = self.paused, "pause toggled");
        self.render(self.alpha())
    }

    // Returns the number of ticks run. Only the currently pending handle is honoured.
    pub fn frame(&mut self, handle: FrameHandle, now: Duration) -> Result<u32, GameError> {
        if self.pending != Some(handle) {
            debug!(?handle, "stale frame ignored");
            return Ok(0);
        }
        self.pending = None;

        let elapsed = now.saturating_sub(self.last_frame_time);
        self.last_frame_time = now;

        let mut ticks = 0;
        if !self.paused {
            self.session.leftover += elapsed;

            while self.session.leftover >= self.session.timestep {
                self.session.leftover -= self.session.timestep;
                self.tick()?;
                ticks += 1;

                if self.session.is_over() {
                    return Ok(ticks);
                }
            }
        }

        self.render(self.alpha())?;
        self.pending = Some(self.scheduler.request_frame());
        Ok(ticks)
    }

    fn tick(&mut self) -> Result<(), GameError> {
        let session = &mut self.session;

        session.snake.snapshot();
        session.snake.commit_direction();

        if session.snake.check_collision() {
            return self.end_game(Outcome::Crashed);
        }

        let ate = session.snake.move_step(session.food);
        trace!(head = ?session.snake.head(), direction = ?session.snake.direction(), ate, "tick");

        if ate {
            session.score += self.config.food_bonus;
            session.timestep = max(
                self.config.min_timestep,
                session.timestep.saturating_sub(self.config.timestep_decrement),
            );
            session.food = generate_food(session.snake.body(), self.config.grid_size, self.config.food_retries, &mut self.rng);
            debug!(score = session.score, timestep_ms = session.timestep.as_millis() as u64, "food eaten");

            let score = session.score;
            self.renderer.score_changed(score)?;

            if self.session.food.is_none() {
                return self.end_game(Outcome::BoardFull);
            }
        }

        Ok(())
    }

    pub fn end_game(&mut self, outcome: Outcome) -> Result<(), GameError> {
        self.cancel_pending();
        self.session.outcome = Some(outcome);

        info!(
            score = self.session.score,
            length = self.session.snake.body().len(),
            ?outcome,
            "game over"
        );

        self.render(1.0)
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn alpha(&self) -> f64 {
        if !self.started {
            return 1.0;
        }
        let step = self.session.timestep.as_secs_f64();
        (self.session.leftover.as_secs_f64() / step).min(1.0)
    }

    fn render(&mut self, alpha: f64) -> Result<(), GameError> {
        let phase = self.phase();
        let snake = &self.session.snake;
        let view = FrameView {
            body: snake.body(),
            previous_body: snake.previous_body(),
            alpha,
            food: self.session.food,
            score: self.session.score,
            head_char: snake.head_char(),
            grid_size: self.config.grid_size,
            boundary: snake.boundary(),
            phase,
        };
        self.renderer.render(&view)
    }
}
