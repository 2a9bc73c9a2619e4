//! Console I/O behind `read` and `write` statements

use super::error::{InterpResult, RuntimeError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;

/// Largest value produced in mock-input mode
pub const MOCK_INPUT_MAX: i64 = 256;

/// Line-based console; optionally answers reads with seeded random values
pub struct Console {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    mock: Option<StdRng>,
}

impl Console {
    pub fn new(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Console {
            input,
            output,
            mock: None,
        }
    }

    /// Process stdin and stdout
    pub fn stdio() -> Self {
        Self::new(Box::new(BufReader::new(io::stdin())), Box::new(io::stdout()))
    }

    /// Answer reads from a generator seeded with `seed` instead of the input
    pub fn with_mock_input(mut self, seed: u64) -> Self {
        self.mock = Some(StdRng::seed_from_u64(seed));
        self
    }

    /// Prompt for and obtain one integer for variable `name`
    pub fn read_int(&mut self, name: &str) -> InterpResult<i64> {
        write!(self.output, "Input value for {name} > ").map_err(io_err)?;

        if let Some(rng) = self.mock.as_mut() {
            let value = rng.gen_range(0..=MOCK_INPUT_MAX);
            writeln!(self.output, "{value}").map_err(io_err)?;
            return Ok(value);
        }
        self.output.flush().map_err(io_err)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(io_err)?;
        if read == 0 {
            return Err(RuntimeError::io_error("end of input"));
        }
        line.trim().parse::<i64>().map_err(|_| {
            RuntimeError::io_error(&format!("expected an integer for {name}, got {:?}", line.trim()))
        })
    }

    pub fn write_int(&mut self, value: i64) -> InterpResult<()> {
        writeln!(self.output, "{value}").map_err(io_err)?;
        self.output.flush().map_err(io_err)
    }
}

fn io_err(err: io::Error) -> RuntimeError {
    RuntimeError::io_error(&err.to_string())
}

/// Clonable in-memory sink, for capturing program output
#[derive(Debug, Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
