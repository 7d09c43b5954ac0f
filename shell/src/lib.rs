//! Building blocks for interactive, line-oriented command shells.
//!
//! A [`Shell`] reads lines, turns each one into a [`Statement`] with a
//! pluggable [`StatementParser`], and dispatches it to the [`Command`] bound
//! to its first word. Behaviour can be extended at four points in that
//! pipeline (before the loop, after parsing, after executing, after the
//! loop) through the [`HookRegistry`], and commands plus hooks can be bundled
//! into [`Module`]s that are loaded at most once per shell.
//!
//! The [`builtin`] module ships a few ready-made modules (`exit`, `echo`,
//! history, default results), and [`ShellConfig`] reads the usual settings
//! from a TOML file.
//!
//! The public modules expose the traits and types needed to implement your
//! own commands, parsers, input sources and modules.

pub mod builtin;
pub mod command;
pub mod config;
pub mod error;
pub mod hooks;
pub mod input;
mod interpreter;
pub mod io_adapters;
pub mod module;
pub mod parser;
mod statement;

/// The command shell itself.
///
/// See [`Shell`] for the high-level API and examples.
pub use interpreter::{DEFAULT_PROMPT, EofHandler, LoopState, PromptRenderer, Shell};

pub use command::{Command, CommandResult, ExitCode};
pub use config::{HistoryConfig, LoggingConfig, ParserKind, ShellConfig};
pub use error::Error;
pub use hooks::{Hook, HookPoint, HookRegistry};
pub use input::{BufReadReader, EditorReader, LineReader, NoInput};
pub use io_adapters::{Captured, MemReader, MemWriter, Output};
pub use module::Module;
pub use parser::{PosixParser, SimpleParser, StatementParser};
pub use statement::Statement;
