use std::any::type_name;
use std::collections::{BTreeMap, VecDeque};

use log::{debug, info, warn};

use crate::command::{Command, CommandResult};
use crate::error::Error;
use crate::hooks::{Hook, HookPoint, HookRegistry};
use crate::input::{BufReadReader, LineReader};
use crate::io_adapters::Output;
use crate::module::{Module, ModuleSet};
use crate::parser::{SimpleParser, StatementParser};
use crate::statement::Statement;

/// Prompt shown when nothing else has been configured.
pub const DEFAULT_PROMPT: &str = "cmdsh: ";

/// Called when the input source runs dry. Receives whether the source is interactive.
pub type EofHandler = Box<dyn FnMut(bool) -> anyhow::Result<CommandResult>>;

/// Builds the prompt from the configured static prompt.
pub type PromptRenderer = Box<dyn Fn(&str) -> String>;

/// Where a shell is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// [`Shell::cmdloop`] has never been called.
    NotStarted,
    /// The command loop is running.
    Running,
    /// The command loop has returned, normally or with an error.
    Stopped,
}

/// An interactive, line-oriented command shell.
///
/// The shell owns a table of commands, a hook registry and a set of loaded
/// modules. [`Shell::execute`] runs a single line through the pipeline;
/// [`Shell::cmdloop`] keeps reading lines until a command asks it to stop.
///
/// Example
/// ```
/// use cmdsh::{CommandResult, NoInput, Output, Shell, Statement};
///
/// let (output, captured) = Output::capture();
/// let mut sh = Shell::new().with_output(output).with_reader(NoInput);
/// let out = sh.output();
/// sh.add_command_fn("say", move |stmt: &Statement| {
///     out.wout(&stmt.arglist().join(" "))?;
///     Ok(Some(CommandResult::SUCCESS))
/// })
/// .unwrap();
/// sh.input_queue.push_back("say hello".into());
/// let last = sh.cmdloop().unwrap();
/// assert_eq!(captured.stdout(), "hello");
/// assert_eq!(last.exit_code, 0);
/// ```
pub struct Shell {
    parser: Box<dyn StatementParser>,
    commands: BTreeMap<String, Box<dyn Command>>,
    hooks: HookRegistry,
    modules: ModuleSet,
    reader: Box<dyn LineReader>,
    output: Output,
    prompt: String,
    prompt_renderer: Option<PromptRenderer>,
    eof_handler: Option<EofHandler>,
    state: LoopState,
    /// Lines waiting to be run, consumed before any live input is read.
    pub input_queue: VecDeque<String>,
}

impl Shell {
    /// Create a shell with the simple parser, reading standard input and
    /// writing to standard output.
    pub fn new() -> Self {
        Self {
            parser: Box::new(SimpleParser),
            commands: BTreeMap::new(),
            hooks: HookRegistry::new(),
            modules: ModuleSet::default(),
            reader: Box::new(BufReadReader::stdin()),
            output: Output::stdio(),
            prompt: DEFAULT_PROMPT.to_owned(),
            prompt_renderer: None,
            eof_handler: None,
            state: LoopState::NotStarted,
            input_queue: VecDeque::new(),
        }
    }

    /// Use a different parser.
    pub fn with_parser(mut self, parser: impl StatementParser + 'static) -> Self {
        self.set_parser(parser);
        self
    }

    /// Read live input from a different source.
    pub fn with_reader(mut self, reader: impl LineReader + 'static) -> Self {
        self.set_reader(reader);
        self
    }

    /// Write through a different output handle.
    ///
    /// Modules keep the handle they got from [`Shell::output`] when they were
    /// loaded, so set the output first. To change where an existing handle
    /// writes, use [`Output::redirect`].
    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    /// Replace the active parser.
    pub fn set_parser(&mut self, parser: impl StatementParser + 'static) {
        self.parser = Box::new(parser);
    }

    /// Replace the live input source.
    pub fn set_reader(&mut self, reader: impl LineReader + 'static) {
        self.reader = Box::new(reader);
    }

    /// A handle to the shell's output channels.
    pub fn output(&self) -> Output {
        self.output.clone()
    }

    /// Write to the normal output channel.
    pub fn wout(&self, data: &str) -> Result<(), Error> {
        Ok(self.output.wout(data)?)
    }

    /// Write to the error output channel.
    pub fn werr(&self, data: &str) -> Result<(), Error> {
        Ok(self.output.werr(data)?)
    }

    /// Where the shell is in its lifecycle.
    pub fn state(&self) -> LoopState {
        self.state
    }

    //
    // prompt
    //

    /// The static prompt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Change the static prompt.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Compute the prompt dynamically. The renderer gets the static prompt.
    pub fn set_prompt_renderer(&mut self, renderer: impl Fn(&str) -> String + 'static) {
        self.prompt_renderer = Some(Box::new(renderer));
    }

    /// The prompt shown before reading a line of live input.
    pub fn render_prompt(&self) -> String {
        match &self.prompt_renderer {
            Some(render) => render(&self.prompt),
            None => self.prompt.clone(),
        }
    }

    /// Decide what happens when live input runs out.
    ///
    /// Without a handler, an interactive session prints a newline and keeps
    /// reading, anything else stops the loop.
    pub fn set_eof_handler(
        &mut self,
        handler: impl FnMut(bool) -> anyhow::Result<CommandResult> + 'static,
    ) {
        self.eof_handler = Some(Box::new(handler));
    }

    //
    // commands
    //

    /// Bind a command to a name.
    ///
    /// Fails if the name is already taken; the existing command stays bound.
    pub fn add_command(
        &mut self,
        name: impl Into<String>,
        command: impl Command + 'static,
    ) -> Result<(), Error> {
        let name = name.into();
        if self.commands.contains_key(&name) {
            return Err(Error::CommandAlreadyBound(name));
        }
        debug!("binding command {name}");
        self.commands.insert(name, Box::new(command));
        Ok(())
    }

    /// Bind a closure as a command.
    pub fn add_command_fn<F>(&mut self, name: impl Into<String>, func: F) -> Result<(), Error>
    where
        F: FnMut(&Statement) -> anyhow::Result<Option<CommandResult>> + 'static,
    {
        self.add_command(name, func)
    }

    /// Unbind a command. Returns whether it was bound.
    pub fn remove_command(&mut self, name: &str) -> bool {
        self.commands.remove(name).is_some()
    }

    /// Names of all bound commands, sorted.
    pub fn command_names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    /// Whether a command with exactly this name is bound.
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Find the command bound to a name. Exact, case-sensitive match only.
    pub fn resolve(&mut self, name: &str) -> Option<&mut (dyn Command + 'static)> {
        self.commands.get_mut(name).map(|c| c.as_mut())
    }

    /// Parse a line and run it, including all postparse and postexecute hooks.
    ///
    /// Fails with [`Error::CommandNotFound`] if nothing is bound to the parsed
    /// command name. Errors from the parser, hooks or the command propagate
    /// unchanged. The returned result is whatever the command and hooks
    /// produced, which may be nothing.
    pub fn execute(&mut self, line: &str) -> Result<Option<CommandResult>, Error> {
        let statement = self.parser.parse(line)?;
        let statement = self.hooks.run_postparse(statement)?;

        let Some(command) = self.commands.get_mut(statement.command()) else {
            return Err(Error::CommandNotFound(statement));
        };
        debug!("dispatching {:?}", statement.argv());
        let result = command.execute(&statement)?;

        Ok(self.hooks.run_postexecute(&statement, result)?)
    }

    //
    // command loop
    //

    /// Read, parse and run lines until a command returns a stopping result.
    ///
    /// Preloop hooks run first, postloop hooks last. Unknown commands are
    /// reported on the error channel and the loop goes on; any other error
    /// ends the loop immediately and is returned, without running the
    /// postloop hooks. The last result is returned, or a stopping result if
    /// no command produced one.
    pub fn cmdloop(&mut self) -> Result<CommandResult, Error> {
        self.state = LoopState::Running;
        let outcome = self.run_loop();
        self.state = LoopState::Stopped;
        outcome
    }

    fn run_loop(&mut self) -> Result<CommandResult, Error> {
        self.hooks.run_preloop()?;

        let mut last = None;
        loop {
            let line = match self.next_line()? {
                Some(line) => line,
                None => {
                    let result = self.end_of_input()?;
                    if result.stop {
                        last = Some(result);
                        break;
                    }
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match self.execute(&line) {
                Ok(Some(result)) => {
                    last = Some(result);
                    if result.stop {
                        break;
                    }
                }
                Ok(None) => {}
                Err(Error::CommandNotFound(statement)) => {
                    warn!("command not found: {:?}", statement.command());
                    self.werr(&format!("{}: command not found\n", statement.command()))?;
                }
                Err(err) => return Err(err),
            }
        }

        self.hooks.run_postloop()?;
        Ok(last.unwrap_or(CommandResult::STOP))
    }

    fn next_line(&mut self) -> Result<Option<String>, Error> {
        if let Some(line) = self.input_queue.pop_front() {
            return Ok(Some(line));
        }
        let prompt = self.render_prompt();
        self.reader.read_line(&prompt, &self.output)
    }

    fn end_of_input(&mut self) -> Result<CommandResult, Error> {
        let interactive = self.reader.is_interactive();
        debug!("end of input (interactive: {interactive})");
        match self.eof_handler.as_mut() {
            Some(handler) => Ok(handler(interactive)?),
            None if interactive => {
                self.wout("\n")?;
                Ok(CommandResult::SUCCESS)
            }
            None => Ok(CommandResult::STOP),
        }
    }

    //
    // modules
    //

    /// Load a module, unless a module of the same type is already loaded.
    ///
    /// The module is only recorded as loaded if its `load` succeeds.
    pub fn load_module<M: Module>(&mut self, module: M) -> Result<(), Error> {
        if self.modules.contains::<M>() {
            debug!("module {} already loaded", type_name::<M>());
            return Ok(());
        }
        module.load(self).map_err(|err| Error::ModuleLoad {
            module: type_name::<M>(),
            source: err.into(),
        })?;
        self.modules.insert::<M>();
        info!("loaded module {}", type_name::<M>());
        Ok(())
    }

    /// Construct a module with its `Default` impl and load it.
    pub fn load_default_module<M: Module + Default>(&mut self) -> Result<(), Error> {
        if self.modules.contains::<M>() {
            debug!("module {} already loaded", type_name::<M>());
            return Ok(());
        }
        self.load_module(M::default())
    }

    /// Whether a module of type `M` has been loaded.
    pub fn is_module_loaded<M: Module>(&self) -> bool {
        self.modules.contains::<M>()
    }

    /// Type names of all loaded modules, sorted.
    pub fn loaded_modules(&self) -> Vec<&'static str> {
        self.modules.names()
    }

    //
    // hooks
    //

    /// Register a hook to run before the command loop starts.
    pub fn register_preloop_hook<F>(&mut self, hook: F)
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        self.hooks.push_preloop(type_name::<F>(), Box::new(hook));
    }

    /// Register a hook to run after the command loop finishes.
    pub fn register_postloop_hook<F>(&mut self, hook: F)
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        self.hooks.push_postloop(type_name::<F>(), Box::new(hook));
    }

    /// Register a hook to run after parsing, before the command is looked up.
    pub fn register_postparse_hook<F>(&mut self, hook: F)
    where
        F: FnMut(Statement) -> anyhow::Result<Statement> + 'static,
    {
        self.hooks.push_postparse(type_name::<F>(), Box::new(hook));
    }

    /// Register a hook to run after the command returned.
    pub fn register_postexecute_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&Statement, Option<CommandResult>) -> anyhow::Result<Option<CommandResult>>
            + 'static,
    {
        self.hooks.push_postexecute(type_name::<F>(), Box::new(hook));
    }

    /// Register a named hook at a given extension point, checking that its
    /// signature fits the point.
    pub fn register_hook(&mut self, point: HookPoint, hook: Hook) -> Result<(), Error> {
        self.hooks.register(point, hook)
    }

    /// The hook registry, for inspection.
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}
