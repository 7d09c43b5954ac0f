use crate::hooks::HookPoint;
use crate::statement::Statement;

/// Monolithic error type for the shell.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No command is bound to the statement's command name.
    #[error("{}: command not found", .0.command())]
    CommandNotFound(Statement),

    /// A hook was registered at an extension point whose signature it doesn't have.
    #[error("hook {hook} has signature {found}, but {point} hooks must be {expected}")]
    HookContractViolation {
        /// Name of the offending hook.
        hook: String,
        /// Extension point the hook was registered for.
        point: HookPoint,
        /// Signature of the hook that was supplied.
        found: &'static str,
        /// Signature the extension point requires.
        expected: &'static str,
    },

    /// A command with this name is already bound to the shell.
    #[error("command already bound: {0}")]
    CommandAlreadyBound(String),

    /// The input line could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A module's `load` failed.
    #[error("failed to load module {module}: {source}")]
    ModuleLoad {
        /// Type name of the module.
        module: &'static str,
        /// What went wrong, with its full chain of causes.
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A command handler or hook failed. The original error is kept unmodified.
    #[error(transparent)]
    Command(#[from] anyhow::Error),

    /// The configuration could not be read or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The line editor failed.
    #[error("line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    /// Reading input or writing output failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The failure raised by a command handler or hook, if that is what this is.
    pub fn command_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Command(err) => Some(err),
            _ => None,
        }
    }
}
