//! Console keypad and display for the host simulator.
//!
//! Keys arrive as characters: digits, `+` (open), `-` (change), and end
//! of line as Enter.  The display prints each prompt as its two LCD
//! lines through the logger.

use std::collections::VecDeque;
use std::io::BufRead;

use log::info;

use crate::app::ports::{Display, Key, Keypad, Prompt};
use crate::error::Error;

/// Keys from a line-oriented reader (stdin in the simulator).  Every line
/// ends with an Enter key.
pub struct LineKeypad<R> {
    reader: R,
    pending: VecDeque<Key>,
}

impl<R: BufRead> LineKeypad<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }
}

impl<R: BufRead> Keypad for LineKeypad<R> {
    fn read_key(&mut self) -> Result<Key, Error> {
        loop {
            if let Some(key) = self.pending.pop_front() {
                return Ok(key);
            }
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) | Err(_) => return Err(Error::InputClosed),
                Ok(_) => {
                    self.pending.extend(
                        line.trim_end_matches(['\n', '\r'])
                            .chars()
                            .map(Key::from_char),
                    );
                    self.pending.push_back(Key::Enter);
                }
            }
        }
    }
}

/// Fixed key script.  Used by tests and by the simulator's `--keys`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeypad {
    keys: VecDeque<Key>,
}

impl ScriptedKeypad {
    pub fn new(script: &str) -> Self {
        Self {
            keys: script.chars().map(Key::from_char).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl Keypad for ScriptedKeypad {
    fn read_key(&mut self) -> Result<Key, Error> {
        self.keys.pop_front().ok_or(Error::InputClosed)
    }
}

/// Display that logs each prompt.
#[derive(Debug, Default)]
pub struct LogDisplay {
    masked: usize,
}

impl Display for LogDisplay {
    fn show(&mut self, prompt: Prompt) {
        self.masked = 0;
        let (top, bottom) = prompt.lines();
        info!("LCD | {top:<16} | {bottom:<16}");
    }

    fn mask_symbol(&mut self) {
        self.masked += 1;
        info!("LCD | {:<16} |", "*".repeat(self.masked));
    }
}
