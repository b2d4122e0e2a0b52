use std::time::Duration;

use tracing::{debug, info};

use crate::driver::{Driver, GameConfig};
use crate::error::GameError;
use crate::input::{self, Command};
use crate::scheduler::IntervalScheduler;
use crate::term::TermManager;

const FRAME_INTERVAL_MS: u64 = 16;
// How long to wait for input when no frame is pending (intro, game over)
const IDLE_POLL_MS: u64 = 100;

pub struct SnakeGame {
    driver: Driver<IntervalScheduler, TermManager>,
}

impl SnakeGame {
    pub fn new(config: GameConfig, seed: Option<u64>) -> Result<Self, GameError> {
        config.validate()?;

        let mut term = TermManager::new(config.grid_size)?;
        term.setup()?;

        let scheduler = IntervalScheduler::new(Duration::from_millis(FRAME_INTERVAL_MS));
        let driver = Driver::new(config, scheduler, term, seed)?;
        Ok(SnakeGame { driver })
    }

    pub fn run(&mut self) -> Result<(), GameError> {
        loop {
            let scheduler = self.driver.scheduler_mut();
            let timeout = if scheduler.has_pending() {
                scheduler.time_until_due()
            } else {
                Duration::from_millis(IDLE_POLL_MS)
            };

            for key_ev in input::read_key_events(timeout)? {
                match input::map_key(&key_ev) {
                    Some(Command::Quit) => {
                        info!(score = self.driver.session().score(), "player quit");
                        return Ok(());
                    }
                    Some(Command::Turn(dir)) => self.driver.change_direction(dir),
                    Some(Command::Pause) => self.driver.toggle_pause()?,
                    Some(Command::Restart) => self.driver.restart()?,
                    None => debug!(?key_ev, "unmapped key"),
                }
            }

            if let Some((handle, now)) = self.driver.scheduler_mut().next_frame() {
                self.driver.frame(handle, now)?;
            }
        }
    }
}
