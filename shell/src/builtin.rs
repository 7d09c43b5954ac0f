//! Modules shipped with the crate.
//!
//! - [`DefaultResult`] fills in a result for commands that return none.
//! - [`ExitCommand`] binds `exit`.
//! - [`EchoCommand`] binds `echo`.
//! - [`History`] records every statement and binds `hist`.

use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;
use argh::{EarlyExit, FromArgs};
use log::debug;

use crate::command::{Command, CommandResult, ExitCode};
use crate::interpreter::Shell;
use crate::io_adapters::Output;
use crate::module::Module;
use crate::statement::Statement;

/// Exit code for arguments the command could not make sense of.
const USAGE_EXIT_CODE: ExitCode = 2;

/// A command whose arguments are parsed with [`argh`].
///
/// The statement's argument list goes through `FromArgs::from_args`, so
/// `--help` and usage errors are handled before `execute` is reached.
pub trait BuiltinCommand: Sized + FromArgs {
    /// State shared with the module that bound the command.
    type State;

    /// Treat arguments such as `-1` as positional numbers rather than flags.
    const NEGATIVE_NUMBERS: bool = false;

    /// Canonical name of the command, e.g. "echo" or "exit".
    fn name() -> &'static str;

    /// Executes the command.
    fn execute(self, out: &Output, state: &Self::State) -> anyhow::Result<Option<CommandResult>>;
}

/// Adapts a [`BuiltinCommand`] to the shell's [`Command`] table.
pub struct Builtin<T: BuiltinCommand> {
    output: Output,
    state: T::State,
    _phantom: PhantomData<T>,
}

impl<T: BuiltinCommand> Builtin<T> {
    /// Wrap `T`, writing through `output` and handing it `state` on every call.
    pub fn new(output: Output, state: T::State) -> Self {
        Self {
            output,
            state,
            _phantom: PhantomData,
        }
    }

    /// Bind the command to the shell under [`BuiltinCommand::name`].
    pub fn bind(shell: &mut Shell, state: T::State) -> anyhow::Result<()>
    where
        T: 'static,
        T::State: 'static,
    {
        let command = Self::new(shell.output(), state);
        shell.add_command(T::name(), command)?;
        Ok(())
    }
}

impl<T: BuiltinCommand> Command for Builtin<T> {
    fn execute(&mut self, statement: &Statement) -> anyhow::Result<Option<CommandResult>> {
        let mut args: Vec<&str> = statement.arglist().iter().map(String::as_str).collect();
        if T::NEGATIVE_NUMBERS
            && !args.contains(&"--")
            && let Some(pos) = args.iter().position(|a| is_negative_number(a))
        {
            args.insert(pos, "--");
        }
        match T::from_args(&[T::name()], &args) {
            Ok(cmd) => BuiltinCommand::execute(cmd, &self.output, &self.state),
            Err(EarlyExit { output, status }) => {
                let mut text = output;
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                match status {
                    Ok(()) => {
                        self.output.wout(&text)?;
                        Ok(Some(CommandResult::SUCCESS))
                    }
                    Err(()) => {
                        self.output.werr(&text)?;
                        Ok(Some(CommandResult::exit(USAGE_EXIT_CODE)))
                    }
                }
            }
        }
    }
}

fn is_negative_number(arg: &str) -> bool {
    arg.strip_prefix('-')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Creates a default result when a command doesn't return one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResult;

impl Module for DefaultResult {
    fn load(&self, shell: &mut Shell) -> anyhow::Result<()> {
        shell.register_postexecute_hook(default_result_hook);
        Ok(())
    }
}

fn default_result_hook(
    _statement: &Statement,
    result: Option<CommandResult>,
) -> anyhow::Result<Option<CommandResult>> {
    Ok(Some(result.unwrap_or(CommandResult::SUCCESS)))
}

/// Adds an `exit` command to a shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitCommand;

impl Module for ExitCommand {
    fn load(&self, shell: &mut Shell) -> anyhow::Result<()> {
        Builtin::<Exit>::bind(shell, ())
    }
}

#[derive(FromArgs)]
/// Exit the shell.
struct Exit {
    #[argh(positional)]
    /// exit status handed back to the caller, 0 when omitted.
    code: Option<ExitCode>,
}

impl BuiltinCommand for Exit {
    type State = ();
    const NEGATIVE_NUMBERS: bool = true;

    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _out: &Output, _state: &()) -> anyhow::Result<Option<CommandResult>> {
        Ok(Some(CommandResult::stop_with(self.code.unwrap_or(0))))
    }
}

/// Adds an `echo` command to a shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoCommand;

impl Module for EchoCommand {
    fn load(&self, shell: &mut Shell) -> anyhow::Result<()> {
        Builtin::<Echo>::bind(shell, ())
    }
}

#[derive(FromArgs)]
/// Write the arguments to standard output, separated by spaces.
/// By default, a trailing newline is printed.
struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    args: Vec<String>,
}

impl BuiltinCommand for Echo {
    type State = ();

    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, out: &Output, _state: &()) -> anyhow::Result<Option<CommandResult>> {
        let mut s = self.args.join(" ");
        if !self.no_newline {
            s.push('\n');
        }
        out.wout(&s)?;
        Ok(Some(CommandResult::SUCCESS))
    }
}

/// Default cap on the number of remembered statements.
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

/// Keeps a history of entered commands and adds a `hist` command to show it.
///
/// Every statement is recorded by a postparse hook, so the history also holds
/// lines whose command turned out not to exist. With a file configured, the
/// history is read from it before the loop starts and written back after the
/// loop ends, one entry per line.
#[derive(Debug, Clone)]
pub struct History {
    file: Option<PathBuf>,
    max_entries: usize,
}

impl History {
    /// In-memory history holding at most `max_entries` lines (0 for no limit).
    pub fn new(max_entries: usize) -> Self {
        Self {
            file: None,
            max_entries,
        }
    }

    /// Persist the history in a file.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

#[derive(Debug)]
struct HistoryState {
    entries: Vec<String>,
    max_entries: usize,
    // the file is read by the first loop only; later loops would duplicate it
    file_loaded: bool,
}

impl HistoryState {
    fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
            file_loaded: false,
        }
    }

    fn push(&mut self, entry: &str) {
        self.entries.push(entry.to_owned());
        self.truncate();
    }

    /// Put earlier entries in front of the ones recorded so far.
    fn prepend<'a>(&mut self, earlier: impl Iterator<Item = &'a str>) {
        let mut entries: Vec<String> = earlier.map(str::to_owned).collect();
        entries.append(&mut self.entries);
        self.entries = entries;
        self.truncate();
    }

    fn truncate(&mut self) {
        if self.max_entries > 0 && self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
        }
    }

    fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Module for History {
    fn load(&self, shell: &mut Shell) -> anyhow::Result<()> {
        let state = Rc::new(RefCell::new(HistoryState::new(self.max_entries)));

        Builtin::<Hist>::bind(shell, state.clone())?;

        let recorder = state.clone();
        shell.register_postparse_hook(move |statement| {
            recorder.borrow_mut().push(statement.raw());
            Ok(statement)
        });

        if let Some(file) = &self.file {
            let (loader, path) = (state.clone(), file.clone());
            shell.register_preloop_hook(move || load_history(&path, &mut loader.borrow_mut()));
            let (saver, path) = (state, file.clone());
            shell.register_postloop_hook(move || save_history(&path, &saver.borrow()));
        }
        Ok(())
    }
}

fn load_history(path: &Path, state: &mut HistoryState) -> anyhow::Result<()> {
    if state.file_loaded {
        return Ok(());
    }
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("no history file at {}", path.display());
            state.file_loaded = true;
            return Ok(());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("hist: can't read {}", path.display()));
        }
    };
    state.prepend(contents.lines().filter(|l| !l.trim().is_empty()));
    state.file_loaded = true;
    debug!("read {} history entries from {}", state.entries.len(), path.display());
    Ok(())
}

fn save_history(path: &Path, state: &HistoryState) -> anyhow::Result<()> {
    let mut contents = state.entries.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    fs::write(path, contents).with_context(|| format!("hist: can't write {}", path.display()))
}

#[derive(FromArgs)]
/// Show the command history.
struct Hist {
    #[argh(switch, short = 'c')]
    /// clear the history.
    clear: bool,

    #[argh(positional)]
    /// only show this many of the most recent entries.
    count: Option<usize>,
}

impl BuiltinCommand for Hist {
    type State = Rc<RefCell<HistoryState>>;

    fn name() -> &'static str {
        "hist"
    }

    fn execute(self, out: &Output, state: &Self::State) -> anyhow::Result<Option<CommandResult>> {
        if self.clear {
            state.borrow_mut().entries.clear();
            return Ok(Some(CommandResult::SUCCESS));
        }
        let state = state.borrow();
        let entries = state.entries();
        let skip = match self.count {
            Some(count) => entries.len().saturating_sub(count),
            None => 0,
        };
        let mut text = String::new();
        for entry in &entries[skip..] {
            text.push_str(entry);
            text.push('\n');
        }
        out.wout(&text)?;
        Ok(Some(CommandResult::SUCCESS))
    }
}
