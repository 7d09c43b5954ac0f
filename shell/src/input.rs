//! Sources of input lines for the command loop.

use std::io::{BufRead, BufReader, IsTerminal, Stdin};

use log::debug;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::Error;
use crate::io_adapters::Output;

/// Where the command loop gets its lines from once the input queue is empty.
pub trait LineReader {
    /// Read one line without its terminator. `Ok(None)` means end of input.
    ///
    /// Readers that don't own the terminal show the prompt through `output`.
    fn read_line(&mut self, prompt: &str, output: &Output) -> Result<Option<String>, Error>;

    /// Whether a person is typing at the other end.
    ///
    /// The default end-of-input handling keeps an interactive session alive
    /// and ends a piped one.
    fn is_interactive(&self) -> bool;
}

/// Line editor backed by rustyline, for use on a terminal.
///
/// Non-blank lines are added to the editor's history so the arrow keys work.
/// Ctrl-C throws away the line being typed.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    /// Create a new line editor.
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str, _output: &Output) -> Result<Option<String>, Error> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) => {
                debug!("interrupted, discarding line");
                Ok(Some(String::new()))
            }
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

/// Reads lines from any buffered reader, e.g. piped standard input.
///
/// The prompt is only written (to the shell's normal output channel) when the
/// reader is interactive, so piped sessions produce nothing but command output.
pub struct BufReadReader<R> {
    reader: R,
    interactive: bool,
}

impl<R: BufRead> BufReadReader<R> {
    /// Wrap a non-interactive reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            interactive: false,
        }
    }

    /// Mark the reader as interactive or not.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }
}

impl BufReadReader<BufReader<Stdin>> {
    /// Standard input, interactive when it is a terminal.
    pub fn stdin() -> Self {
        let stdin = std::io::stdin();
        let interactive = stdin.is_terminal();
        Self::new(BufReader::new(stdin)).interactive(interactive)
    }
}

impl<R: BufRead> LineReader for BufReadReader<R> {
    fn read_line(&mut self, prompt: &str, output: &Output) -> Result<Option<String>, Error> {
        if self.interactive {
            output.wout(prompt)?;
        }
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// An input source that is always at its end.
///
/// Useful when a shell is driven entirely through its input queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl LineReader for NoInput {
    fn read_line(&mut self, _prompt: &str, _output: &Output) -> Result<Option<String>, Error> {
        Ok(None)
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemReader;

    #[test]
    fn buf_reader_strips_terminators() {
        let (out, captured) = Output::capture();
        let mut reader = BufReadReader::new(MemReader::new(b"one\r\ntwo\nthree".to_vec()));
        assert_eq!(reader.read_line("> ", &out).unwrap().as_deref(), Some("one"));
        assert_eq!(reader.read_line("> ", &out).unwrap().as_deref(), Some("two"));
        assert_eq!(reader.read_line("> ", &out).unwrap().as_deref(), Some("three"));
        assert_eq!(reader.read_line("> ", &out).unwrap(), None);
        assert!(!reader.is_interactive());
        assert_eq!(captured.stdout(), "");
    }

    #[test]
    fn interactive_buf_reader_prompts_through_output() {
        let (out, captured) = Output::capture();
        let mut reader = BufReadReader::new(MemReader::from_lines(&["x"])).interactive(true);
        assert_eq!(reader.read_line("> ", &out).unwrap().as_deref(), Some("x"));
        assert_eq!(reader.read_line("> ", &out).unwrap(), None);
        assert_eq!(captured.stdout(), "> > ");
    }

    #[test]
    fn buf_reader_keeps_blank_lines() {
        let (out, _) = Output::capture();
        let mut reader = BufReadReader::new(MemReader::from_lines(&["", "x"]));
        assert_eq!(reader.read_line("", &out).unwrap().as_deref(), Some(""));
        assert_eq!(reader.read_line("", &out).unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn no_input_is_always_eof() {
        let (out, _) = Output::capture();
        let mut reader = NoInput;
        assert_eq!(reader.read_line("", &out).unwrap(), None);
        assert!(!reader.is_interactive());
    }
}
