use std::time::Duration;

use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::error::GameError;
use crate::snake::Direction::{self, *};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Turn(Direction),
    Pause,
    Restart,
    Quit,
}

pub fn map_key(ev: &KeyEvent) -> Option<Command> {
    if is_ctrl_c(ev) {
        return Some(Command::Quit);
    }

    match ev.code {
        KeyCode::Up => Some(Command::Turn(Up)),
        KeyCode::Down => Some(Command::Turn(Down)),
        KeyCode::Left => Some(Command::Turn(Left)),
        KeyCode::Right => Some(Command::Turn(Right)),
        KeyCode::Esc => Some(Command::Pause),
        KeyCode::Enter => Some(Command::Restart),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Some(Command::Turn(Up)),
            'a' => Some(Command::Turn(Left)),
            's' => Some(Command::Turn(Down)),
            'd' => Some(Command::Turn(Right)),
            ' ' | 'r' => Some(Command::Restart),
            'q' => Some(Command::Quit),
            _ => None,
        },
        _ => None,
    }
}

// Waits up to `timeout` for the first event, then drains whatever is queued
pub fn read_key_events(timeout: Duration) -> Result<Vec<KeyEvent>, GameError> {
    let mut events = vec![];
    let mut wait = timeout;

    while poll(wait)? {
        if let Event::Key(ev) = read()? {
            events.push(ev);
        }
        wait = Duration::ZERO;
    }

    Ok(events)
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers } if modifiers.contains(KeyModifiers::CONTROL))
}
