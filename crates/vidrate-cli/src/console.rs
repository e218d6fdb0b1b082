//! Line-oriented terminal input and output.

use std::fmt::Display;
use std::io::{BufRead, Write};

use anyhow::Result;

/// What the tester typed at a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// An ordinary answer, trimmed.
    Line(String),
    /// `restart`. The test restarts after confirmation.
    Restart,
    /// `quit`, `exit` or end of input. Suspends the session.
    Quit,
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "restart" => Input::Restart,
            "quit" | "exit" => Input::Quit,
            _ => Input::Line(line.to_string()),
        }
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, message: impl Display) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    pub fn ask(&mut self, prompt: &str) -> Result<Input> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(Input::Quit);
        }
        Ok(Input::parse(&line))
    }
}
