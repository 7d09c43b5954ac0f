use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Context;
use argh::FromArgs;
use log::{LevelFilter, debug};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode, WriteLogger};

use cmdsh::builtin::{DefaultResult, EchoCommand, ExitCommand};
use cmdsh::{EditorReader, ExitCode, LoggingConfig, ParserKind, Shell, ShellConfig};

#[derive(FromArgs)]
/// A small interactive command shell.
struct Args {
    #[argh(option)]
    /// read settings from this TOML file.
    config: Option<PathBuf>,

    #[argh(switch)]
    /// split lines with POSIX shell quoting rules.
    posix: bool,

    #[argh(option)]
    /// log level: off, error, warn, info, debug or trace.
    log_level: Option<String>,

    #[argh(option, short = 'c')]
    /// run this line before reading any input; may be repeated.
    command: Vec<String>,
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level: LevelFilter = config.level_filter()?;
    match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("can't open log file {}", path.display()))?;
            WriteLogger::init(level, Config::default(), file)?;
        }
        None => TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )?,
    }
    Ok(())
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };
    if args.posix {
        config.parser = ParserKind::Posix;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging)?;

    let mut shell = Shell::from_config(&config)?;
    if std::io::stdin().is_terminal() {
        shell.set_reader(EditorReader::new()?);
    }
    shell.load_default_module::<ExitCommand>()?;
    shell.load_default_module::<EchoCommand>()?;
    shell.load_default_module::<DefaultResult>()?;
    debug!("modules: {:?}", shell.loaded_modules());

    shell.input_queue.extend(args.command);
    let result = shell.cmdloop()?;
    Ok(result.exit_code)
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    let code = run(args)?;
    std::process::exit(code);
}
