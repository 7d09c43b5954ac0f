use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::builtin::{DEFAULT_HISTORY_SIZE, History};
use crate::error::Error;
use crate::interpreter::{DEFAULT_PROMPT, Shell};
use crate::parser::{PosixParser, SimpleParser};

/// Settings for a shell, usually read from a TOML file.
///
/// ```toml
/// prompt = "cmdsh: "
/// parser = "posix"
///
/// [history]
/// enabled = true
/// file = "/home/me/.cmdsh_history"
/// max_entries = 500
///
/// [logging]
/// level = "debug"
/// file = "/tmp/cmdsh.log"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Static prompt shown before each line of live input.
    pub prompt: String,
    /// How input lines are split into words.
    pub parser: ParserKind,
    /// History module settings.
    pub history: HistoryConfig,
    /// Log output settings, used by the binary.
    pub logging: LoggingConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_owned(),
            parser: ParserKind::default(),
            history: HistoryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Which [`StatementParser`](crate::StatementParser) a shell uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// [`SimpleParser`]: whitespace splitting, quotes kept.
    #[default]
    Simple,
    /// [`PosixParser`]: POSIX shell word splitting.
    Posix,
}

/// The `[history]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Load the history module.
    pub enabled: bool,
    /// Where to keep the history between sessions.
    pub file: Option<PathBuf>,
    /// Maximum number of remembered lines, 0 for no limit.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: None,
            max_entries: DEFAULT_HISTORY_SIZE,
        }
    }
}

/// The `[logging]` table. Only the `cmdsh` binary acts on it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of off, error, warn, info, debug, trace.
    pub level: String,
    /// Append log records to this file instead of the terminal.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// The configured level as a `log` filter.
    pub fn level_filter(&self) -> Result<LevelFilter, Error> {
        LevelFilter::from_str(&self.level)
            .map_err(|_| Error::Config(format!("unknown log level: {}", self.level)))
    }
}

impl ShellConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("can't read {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }
}

impl Shell {
    /// Build a shell from a configuration: prompt, parser and, when enabled,
    /// the [`History`] module.
    pub fn from_config(config: &ShellConfig) -> Result<Self, Error> {
        let mut shell = Self::new();
        shell.apply_config(config)?;
        Ok(shell)
    }

    /// Apply a configuration to an existing shell.
    pub fn apply_config(&mut self, config: &ShellConfig) -> Result<(), Error> {
        self.set_prompt(config.prompt.clone());
        match config.parser {
            ParserKind::Simple => self.set_parser(SimpleParser),
            ParserKind::Posix => self.set_parser(PosixParser),
        }
        if config.history.enabled {
            let mut history = History::new(config.history.max_entries);
            if let Some(file) = &config.history.file {
                history = history.with_file(file);
            }
            self.load_module(history)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NoInput;
    use crate::io_adapters::Output;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ShellConfig::from_toml("").unwrap();
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.prompt, DEFAULT_PROMPT);
        assert_eq!(config.parser, ParserKind::Simple);
        assert!(config.history.enabled);
        assert_eq!(config.logging.level_filter().unwrap(), LevelFilter::Warn);
    }

    #[test]
    fn full_config() {
        let config = ShellConfig::from_toml(
            r#"
            prompt = "> "
            parser = "posix"

            [history]
            enabled = false
            file = "/tmp/hist"
            max_entries = 5

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.prompt, "> ");
        assert_eq!(config.parser, ParserKind::Posix);
        assert!(!config.history.enabled);
        assert_eq!(config.history.file, Some(PathBuf::from("/tmp/hist")));
        assert_eq!(config.history.max_entries, 5);
        assert_eq!(config.logging.level_filter().unwrap(), LevelFilter::Debug);
    }

    #[test]
    fn bad_values_are_config_errors() {
        assert!(matches!(
            ShellConfig::from_toml("parser = \"fish\""),
            Err(Error::Config(_))
        ));
        let logging = LoggingConfig {
            level: "loud".into(),
            file: None,
        };
        assert!(matches!(logging.level_filter(), Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ShellConfig::load(&dir.path().join("nope.toml")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmdsh.toml");
        std::fs::write(&path, "prompt = \"file> \"\n").unwrap();
        assert_eq!(ShellConfig::load(&path).unwrap().prompt, "file> ");
    }

    #[test]
    fn config_applies_to_shell() {
        let (output, captured) = Output::capture();
        let mut shell = Shell::new().with_output(output).with_reader(NoInput);
        let config = ShellConfig {
            prompt: "$ ".into(),
            parser: ParserKind::Posix,
            ..ShellConfig::default()
        };
        shell.apply_config(&config).unwrap();
        assert_eq!(shell.render_prompt(), "$ ");
        assert!(shell.is_module_loaded::<History>());

        shell.execute("'hello world'").unwrap_err();
        shell.execute("hist").unwrap();
        assert_eq!(captured.stdout(), "'hello world'\nhist\n");
    }

    #[test]
    fn history_can_be_disabled() {
        let mut shell = Shell::new().with_reader(NoInput);
        let mut config = ShellConfig::default();
        config.history.enabled = false;
        shell.apply_config(&config).unwrap();
        assert!(!shell.is_module_loaded::<History>());
        assert!(!shell.has_command("hist"));
    }
}
