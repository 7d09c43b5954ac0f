//! Extension points of the command pipeline.
//!
//! There are four of them:
//!
//! | point       | hook signature                                              |
//! |-------------|-------------------------------------------------------------|
//! | preloop     | `FnMut() -> Result<()>`                                     |
//! | postloop    | `FnMut() -> Result<()>`                                     |
//! | postparse   | `FnMut(Statement) -> Result<Statement>`                     |
//! | postexecute | `FnMut(&Statement, Option<CommandResult>) -> Result<Option<CommandResult>>` |
//!
//! Hooks run in the order they were registered. A hook's signature is checked
//! when it is registered, never when it runs: the typed `register_*` methods on
//! [`Shell`](crate::Shell) leave that to the compiler, and
//! [`HookRegistry::register`] checks a [`Hook`] against the [`HookPoint`] it is
//! being attached to.

use std::fmt;

use log::trace;

use crate::command::CommandResult;
use crate::error::Error;
use crate::statement::Statement;

/// Hook run before the loop starts or after it ends.
pub type LoopHookFn = Box<dyn FnMut() -> anyhow::Result<()>>;
/// Hook run on every statement after parsing.
pub type PostparseHookFn = Box<dyn FnMut(Statement) -> anyhow::Result<Statement>>;
/// Hook run on every result after the command ran.
pub type PostexecuteHookFn =
    Box<dyn FnMut(&Statement, Option<CommandResult>) -> anyhow::Result<Option<CommandResult>>>;

/// The four places in the pipeline where hooks can be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Before the first line is read.
    Preloop,
    /// After the loop has stopped.
    Postloop,
    /// Between parsing a line and dispatching it.
    Postparse,
    /// After the command returned.
    Postexecute,
}

impl HookPoint {
    /// Lowercase name of the extension point.
    pub fn as_str(self) -> &'static str {
        match self {
            HookPoint::Preloop => "preloop",
            HookPoint::Postloop => "postloop",
            HookPoint::Postparse => "postparse",
            HookPoint::Postexecute => "postexecute",
        }
    }

    /// The signature hooks at this point must have.
    pub fn signature(self) -> &'static str {
        match self {
            HookPoint::Preloop | HookPoint::Postloop => LOOP_SIGNATURE,
            HookPoint::Postparse => POSTPARSE_SIGNATURE,
            HookPoint::Postexecute => POSTEXECUTE_SIGNATURE,
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const LOOP_SIGNATURE: &str = "fn()";
const POSTPARSE_SIGNATURE: &str = "fn(Statement) -> Statement";
const POSTEXECUTE_SIGNATURE: &str = "fn(&Statement, Option<CommandResult>) -> Option<CommandResult>";

/// A hook function of one of the supported shapes.
pub enum HookFn {
    /// Takes nothing, returns nothing. Valid for preloop and postloop.
    Loop(LoopHookFn),
    /// Valid for postparse.
    Postparse(PostparseHookFn),
    /// Valid for postexecute.
    Postexecute(PostexecuteHookFn),
}

impl HookFn {
    /// Signature of the wrapped function.
    pub fn signature(&self) -> &'static str {
        match self {
            HookFn::Loop(_) => LOOP_SIGNATURE,
            HookFn::Postparse(_) => POSTPARSE_SIGNATURE,
            HookFn::Postexecute(_) => POSTEXECUTE_SIGNATURE,
        }
    }
}

/// A named hook, ready to be registered at some [`HookPoint`].
pub struct Hook {
    name: String,
    func: HookFn,
}

impl Hook {
    /// A hook taking no arguments, for the preloop or postloop points.
    pub fn on_loop<F>(name: impl Into<String>, func: F) -> Self
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        Self {
            name: name.into(),
            func: HookFn::Loop(Box::new(func)),
        }
    }

    /// A hook that receives and returns a statement.
    pub fn postparse<F>(name: impl Into<String>, func: F) -> Self
    where
        F: FnMut(Statement) -> anyhow::Result<Statement> + 'static,
    {
        Self {
            name: name.into(),
            func: HookFn::Postparse(Box::new(func)),
        }
    }

    /// A hook that receives a statement and a result and returns a result.
    pub fn postexecute<F>(name: impl Into<String>, func: F) -> Self
    where
        F: FnMut(&Statement, Option<CommandResult>) -> anyhow::Result<Option<CommandResult>>
            + 'static,
    {
        Self {
            name: name.into(),
            func: HookFn::Postexecute(Box::new(func)),
        }
    }

    /// The hook's name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signature of the wrapped function.
    pub fn signature(&self) -> &'static str {
        self.func.signature()
    }
}

struct Named<F> {
    name: String,
    func: F,
}

/// Ordered hook lists for every extension point.
#[derive(Default)]
pub struct HookRegistry {
    preloop: Vec<Named<LoopHookFn>>,
    postloop: Vec<Named<LoopHookFn>>,
    postparse: Vec<Named<PostparseHookFn>>,
    postexecute: Vec<Named<PostexecuteHookFn>>,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook to the given extension point.
    ///
    /// Fails with [`Error::HookContractViolation`] if the hook's signature
    /// doesn't match the point; the registry is left untouched in that case.
    pub fn register(&mut self, point: HookPoint, hook: Hook) -> Result<(), Error> {
        let Hook { name, func } = hook;
        match (point, func) {
            (HookPoint::Preloop, HookFn::Loop(func)) => self.preloop.push(Named { name, func }),
            (HookPoint::Postloop, HookFn::Loop(func)) => self.postloop.push(Named { name, func }),
            (HookPoint::Postparse, HookFn::Postparse(func)) => {
                self.postparse.push(Named { name, func })
            }
            (HookPoint::Postexecute, HookFn::Postexecute(func)) => {
                self.postexecute.push(Named { name, func })
            }
            (point, func) => {
                return Err(Error::HookContractViolation {
                    hook: name,
                    point,
                    found: func.signature(),
                    expected: point.signature(),
                });
            }
        }
        Ok(())
    }

    /// Number of hooks registered at a point.
    pub fn len(&self, point: HookPoint) -> usize {
        match point {
            HookPoint::Preloop => self.preloop.len(),
            HookPoint::Postloop => self.postloop.len(),
            HookPoint::Postparse => self.postparse.len(),
            HookPoint::Postexecute => self.postexecute.len(),
        }
    }

    /// True if no hook is registered anywhere.
    pub fn is_empty(&self) -> bool {
        self.preloop.is_empty()
            && self.postloop.is_empty()
            && self.postparse.is_empty()
            && self.postexecute.is_empty()
    }

    /// Names of the hooks at a point, in execution order.
    pub fn names(&self, point: HookPoint) -> Vec<&str> {
        fn names_of<F>(hooks: &[Named<F>]) -> Vec<&str> {
            hooks.iter().map(|h| h.name.as_str()).collect()
        }
        match point {
            HookPoint::Preloop => names_of(&self.preloop),
            HookPoint::Postloop => names_of(&self.postloop),
            HookPoint::Postparse => names_of(&self.postparse),
            HookPoint::Postexecute => names_of(&self.postexecute),
        }
    }

    pub(crate) fn push_preloop(&mut self, name: &str, func: LoopHookFn) {
        self.preloop.push(Named {
            name: name.to_owned(),
            func,
        });
    }

    pub(crate) fn push_postloop(&mut self, name: &str, func: LoopHookFn) {
        self.postloop.push(Named {
            name: name.to_owned(),
            func,
        });
    }

    pub(crate) fn push_postparse(&mut self, name: &str, func: PostparseHookFn) {
        self.postparse.push(Named {
            name: name.to_owned(),
            func,
        });
    }

    pub(crate) fn push_postexecute(&mut self, name: &str, func: PostexecuteHookFn) {
        self.postexecute.push(Named {
            name: name.to_owned(),
            func,
        });
    }

    /// Run every preloop hook, stopping at the first failure.
    pub fn run_preloop(&mut self) -> anyhow::Result<()> {
        for hook in &mut self.preloop {
            trace!("preloop hook {}", hook.name);
            (hook.func)()?;
        }
        Ok(())
    }

    /// Run every postloop hook, stopping at the first failure.
    pub fn run_postloop(&mut self) -> anyhow::Result<()> {
        for hook in &mut self.postloop {
            trace!("postloop hook {}", hook.name);
            (hook.func)()?;
        }
        Ok(())
    }

    /// Thread a statement through every postparse hook.
    pub fn run_postparse(&mut self, mut statement: Statement) -> anyhow::Result<Statement> {
        for hook in &mut self.postparse {
            trace!("postparse hook {} on {:?}", hook.name, statement.raw());
            statement = (hook.func)(statement)?;
        }
        Ok(statement)
    }

    /// Thread a result through every postexecute hook.
    pub fn run_postexecute(
        &mut self,
        statement: &Statement,
        mut result: Option<CommandResult>,
    ) -> anyhow::Result<Option<CommandResult>> {
        for hook in &mut self.postexecute {
            trace!("postexecute hook {} on {:?}", hook.name, statement.raw());
            result = (hook.func)(statement, result)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn stmt(line: &str) -> Statement {
        Statement::new(line, line.split_whitespace().map(String::from).collect())
    }

    #[test]
    fn register_matching_hooks() {
        let mut registry = HookRegistry::new();
        registry
            .register(HookPoint::Preloop, Hook::on_loop("pre", || Ok(())))
            .unwrap();
        registry
            .register(HookPoint::Postloop, Hook::on_loop("post", || Ok(())))
            .unwrap();
        registry
            .register(HookPoint::Postparse, Hook::postparse("parse", Ok))
            .unwrap();
        registry
            .register(
                HookPoint::Postexecute,
                Hook::postexecute("exec", |_, result| Ok(result)),
            )
            .unwrap();
        for point in [
            HookPoint::Preloop,
            HookPoint::Postloop,
            HookPoint::Postparse,
            HookPoint::Postexecute,
        ] {
            assert_eq!(registry.len(point), 1, "{point}");
        }
    }

    #[test]
    fn mismatched_hook_is_rejected() {
        let mut registry = HookRegistry::new();
        let err = registry
            .register(HookPoint::Preloop, Hook::postparse("takes_statement", Ok))
            .unwrap_err();
        match err {
            Error::HookContractViolation {
                hook,
                point,
                found,
                expected,
            } => {
                assert_eq!(hook, "takes_statement");
                assert_eq!(point, HookPoint::Preloop);
                assert_eq!(found, POSTPARSE_SIGNATURE);
                assert_eq!(expected, LOOP_SIGNATURE);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn every_mismatch_leaves_registry_unchanged() {
        let mut registry = HookRegistry::new();
        registry
            .register(HookPoint::Postexecute, Hook::postexecute("ok", |_, r| Ok(r)))
            .unwrap();

        let attempts: Vec<(HookPoint, Hook)> = vec![
            (HookPoint::Postexecute, Hook::on_loop("loop", || Ok(()))),
            (HookPoint::Postexecute, Hook::postparse("parse", Ok)),
            (HookPoint::Postparse, Hook::on_loop("loop", || Ok(()))),
            (HookPoint::Postparse, Hook::postexecute("exec", |_, r| Ok(r))),
            (HookPoint::Postloop, Hook::postexecute("exec", |_, r| Ok(r))),
        ];
        for (point, hook) in attempts {
            let before = registry.len(point);
            assert!(matches!(
                registry.register(point, hook),
                Err(Error::HookContractViolation { .. })
            ));
            assert_eq!(registry.len(point), before);
        }
        assert_eq!(registry.len(HookPoint::Postexecute), 1);
    }

    #[test]
    fn violation_message_names_hook_and_signatures() {
        let mut registry = HookRegistry::new();
        let err = registry
            .register(HookPoint::Postparse, Hook::on_loop("greet", || Ok(())))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("greet"), "{msg}");
        assert!(msg.contains("postparse"), "{msg}");
        assert!(msg.contains(LOOP_SIGNATURE), "{msg}");
        assert!(msg.contains(POSTPARSE_SIGNATURE), "{msg}");
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HookRegistry::new();
        for label in ["one", "two", "three"] {
            let seen = seen.clone();
            registry
                .register(
                    HookPoint::Preloop,
                    Hook::on_loop(label, move || {
                        seen.borrow_mut().push(label);
                        Ok(())
                    }),
                )
                .unwrap();
        }
        registry.run_preloop().unwrap();
        assert_eq!(*seen.borrow(), vec!["one", "two", "three"]);
        assert_eq!(
            registry.names(HookPoint::Preloop),
            vec!["one", "two", "three"]
        );
    }

    #[test]
    fn postparse_hooks_chain() {
        let mut registry = HookRegistry::new();
        registry
            .register(
                HookPoint::Postparse,
                Hook::postparse("alias", |s: Statement| {
                    Ok(if s.command() == "ll" {
                        s.with_argv(vec!["ls".into(), "-l".into()])
                    } else {
                        s
                    })
                }),
            )
            .unwrap();
        registry
            .register(
                HookPoint::Postparse,
                Hook::postparse("upper", |s: Statement| {
                    let argv = s.argv().iter().map(|w| w.to_uppercase()).collect();
                    Ok(s.with_argv(argv))
                }),
            )
            .unwrap();
        let out = registry.run_postparse(stmt("ll")).unwrap();
        assert_eq!(out.argv(), &["LS".to_string(), "-L".to_string()]);
        assert_eq!(out.raw(), "ll");
    }

    #[test]
    fn failing_hook_stops_the_chain() {
        let later_ran = Rc::new(RefCell::new(false));
        let mut registry = HookRegistry::new();
        registry
            .register(
                HookPoint::Postexecute,
                Hook::postexecute("boom", |_, _| anyhow::bail!("boom")),
            )
            .unwrap();
        let flag = later_ran.clone();
        registry
            .register(
                HookPoint::Postexecute,
                Hook::postexecute("later", move |_, r| {
                    *flag.borrow_mut() = true;
                    Ok(r)
                }),
            )
            .unwrap();
        let err = registry
            .run_postexecute(&stmt("x"), Some(CommandResult::SUCCESS))
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(!*later_ran.borrow());
    }
}
