use crate::statement::Statement;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// The outcome of running one command.
///
/// The command loop only looks at [`CommandResult::stop`] to decide whether to
/// keep reading input; `exit_code` is what a shell binary hands back to the
/// operating system once the loop finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CommandResult {
    /// Status of the command, 0 on success.
    pub exit_code: ExitCode,
    /// When true the command loop terminates after this command.
    pub stop: bool,
}

impl CommandResult {
    /// A successful result that lets the loop keep going.
    pub const SUCCESS: Self = Self {
        exit_code: 0,
        stop: false,
    };

    /// A successful result that ends the loop.
    pub const STOP: Self = Self {
        exit_code: 0,
        stop: true,
    };

    /// A result with the given exit code that does not stop the loop.
    pub fn exit(exit_code: ExitCode) -> Self {
        Self {
            exit_code,
            stop: false,
        }
    }

    /// A result with the given exit code that stops the loop.
    pub fn stop_with(exit_code: ExitCode) -> Self {
        Self {
            exit_code,
            stop: true,
        }
    }
}

/// Object-safe trait for anything the shell can dispatch a statement to.
///
/// Returning `Ok(None)` is legitimate: it means the command produced no result.
/// Only a postexecute hook (see [`crate::builtin::DefaultResult`]) may fill one in.
/// A blanket implementation covers closures with the matching signature.
pub trait Command {
    /// Run the command for an already parsed statement.
    fn execute(&mut self, statement: &Statement) -> anyhow::Result<Option<CommandResult>>;
}

impl<F> Command for F
where
    F: FnMut(&Statement) -> anyhow::Result<Option<CommandResult>>,
{
    fn execute(&mut self, statement: &Statement) -> anyhow::Result<Option<CommandResult>> {
        self(statement)
    }
}
