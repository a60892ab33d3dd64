// merakictl - CLI for rotating Meraki SSID pre-shared keys
// Copyright (C) 2026 merakictl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::error::RotateError;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Line-oriented question/answer over any reader and writer, so the flow
/// runs the same against a terminal or an in-memory script.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}").context("writing to terminal")
    }

    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}").context("writing prompt")?;
        self.output.flush().context("flushing prompt")?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("reading answer")?;
        if read == 0 {
            return Err(RotateError::InputClosed.into());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Asks for the new PSK until one of at least `min_len` characters is given.
    pub fn new_psk(&mut self, min_len: usize) -> Result<String> {
        loop {
            let psk = self.ask("What is the new SSID password? ")?;
            if psk.chars().count() >= min_len {
                return Ok(psk);
            }
            self.say(&format!(
                "New password is too short! It must be at least {min_len} characters. Try again."
            ))?;
        }
    }

    /// Yes/no question; anything but y, yes, n or no is asked again.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        loop {
            let answer = self.ask(question)?;
            match parse_yes_no(&answer) {
                Some(yes) => return Ok(yes),
                None => self.say("Invalid input. Yes or no, please.")?,
            }
        }
    }
}

pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
