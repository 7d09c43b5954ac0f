//! Turning a raw input line into a [`Statement`].
//!
//! The shell only depends on the [`StatementParser`] trait. Two implementations
//! ship with the crate: [`SimpleParser`] splits on whitespace and leaves quotes
//! in place, [`PosixParser`] follows POSIX shell word splitting.

use crate::error::Error;
use crate::statement::Statement;

/// Converts one line of input into a [`Statement`].
///
/// Implementations must store the input unchanged as the statement's raw text.
/// Any failure is reported as an error; the shell performs no recovery.
pub trait StatementParser {
    /// Parse a single line.
    fn parse(&self, line: &str) -> Result<Statement, Error>;
}

/// Splits input on whitespace.
///
/// A run enclosed in single or double quotes stays in one token, quotes
/// included, so `say "hello world"` yields `["say", "\"hello world\""]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitState {
    Start,
    ReadingWord,
    ReadingQuote(char),
}

impl StatementParser for SimpleParser {
    fn parse(&self, line: &str) -> Result<Statement, Error> {
        let mut argv = Vec::new();
        let mut word = String::new();
        let mut state = SplitState::Start;

        for ch in line.chars() {
            state = match state {
                SplitState::Start | SplitState::ReadingWord if ch.is_whitespace() => {
                    if state == SplitState::ReadingWord {
                        argv.push(std::mem::take(&mut word));
                    }
                    SplitState::Start
                }
                SplitState::Start | SplitState::ReadingWord => {
                    word.push(ch);
                    if ch == '"' || ch == '\'' {
                        SplitState::ReadingQuote(ch)
                    } else {
                        SplitState::ReadingWord
                    }
                }
                SplitState::ReadingQuote(quote) => {
                    word.push(ch);
                    if ch == quote {
                        SplitState::ReadingWord
                    } else {
                        state
                    }
                }
            };
        }

        match state {
            SplitState::ReadingQuote(quote) => Err(Error::Parse(format!(
                "no closing quotation ({quote}) in: {line}"
            ))),
            SplitState::ReadingWord => {
                argv.push(word);
                Ok(Statement::new(line, argv))
            }
            SplitState::Start => Ok(Statement::new(line, argv)),
        }
    }
}

/// Splits input following POSIX shell rules.
///
/// - quotes group words and are removed,
/// - quotes do not separate words (`a"b c"` is one token),
/// - backslash escapes are interpreted,
/// - an unquoted `#` at the start of a word begins a comment.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixParser;

impl StatementParser for PosixParser {
    fn parse(&self, line: &str) -> Result<Statement, Error> {
        let mut lexer = shlex::Shlex::new(line);
        let argv: Vec<String> = lexer.by_ref().collect();
        if lexer.had_error {
            return Err(Error::Parse(format!("unbalanced quoting in: {line}")));
        }
        Ok(Statement::new(line, argv))
    }
}
