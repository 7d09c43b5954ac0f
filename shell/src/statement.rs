use std::fmt;

/// The result of parsing one line of input.
///
/// Statements are produced by a [`StatementParser`](crate::parser::StatementParser)
/// and are never modified afterwards. A postparse hook that wants to rewrite
/// the input builds a new statement instead.
///
/// `argv` is laid out like a process argument vector: the first element is the
/// command name, the rest are its arguments with quoting already resolved by
/// the parser. That makes it a natural fit for `argh::FromArgs::from_args`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Statement {
    raw: String,
    argv: Vec<String>,
}

impl Statement {
    /// Create a statement from the raw input and its tokens.
    pub fn new(raw: impl Into<String>, argv: Vec<String>) -> Self {
        Self {
            raw: raw.into(),
            argv,
        }
    }

    /// Exactly what was typed at the prompt.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// All tokens, command name included.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// The command name, or `""` when the line produced no tokens.
    pub fn command(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    /// The arguments following the command name.
    pub fn arglist(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    /// A copy of this statement with the same raw text but different tokens.
    pub fn with_argv(&self, argv: Vec<String>) -> Self {
        Self {
            raw: self.raw.clone(),
            argv,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn command_and_arglist() {
        let stmt = Statement::new("say hello world", argv(&["say", "hello", "world"]));
        assert_eq!(stmt.command(), "say");
        assert_eq!(stmt.arglist(), &argv(&["hello", "world"])[..]);
        assert_eq!(stmt.raw(), "say hello world");
    }

    #[test]
    fn command_without_arguments() {
        let stmt = Statement::new("exit", argv(&["exit"]));
        assert_eq!(stmt.command(), "exit");
        assert!(stmt.arglist().is_empty());
    }

    #[test]
    fn empty_argv_means_empty_command() {
        let stmt = Statement::new("   ", Vec::new());
        assert_eq!(stmt.command(), "");
        assert!(stmt.arglist().is_empty());
    }

    #[test]
    fn with_argv_keeps_raw() {
        let stmt = Statement::new("ll", argv(&["ll"]));
        let rewritten = stmt.with_argv(argv(&["ls", "-l"]));
        assert_eq!(rewritten.raw(), "ll");
        assert_eq!(rewritten.command(), "ls");
        assert_eq!(stmt.command(), "ll");
    }
}
