//! Lifecycle hook registry and composition.
//!
//! Each action type declares ordered lists of before, after, and around
//! hooks. The effective execution order is a pure function of the declared
//! lists: the first declared around hook is outermost, before hooks run in
//! declaration order, after hooks in reverse declaration order, and every
//! around hook wraps the whole before → core → after sequence.

use crate::context::Context;
use crate::error::Interrupt;
use std::fmt;
use std::sync::Arc;

/// Result type returned by hooks, core work, and rollback functions.
pub type HookResult = Result<(), Interrupt>;

/// Continuation handed to an around hook.
///
/// Call it exactly once to run the wrapped work; skipping the call skips the
/// work (the action then contributes nothing, neither success nor failure).
/// Behavior on a second call is not defined by the engine.
pub type Proceed<'a, A> = &'a mut dyn FnMut(&mut A, &mut Context) -> HookResult;

type HookFn<A> = Arc<dyn Fn(&mut A, &mut Context) -> HookResult + Send + Sync>;
type AroundFn<A> = Arc<dyn Fn(&mut A, &mut Context, Proceed<'_, A>) -> HookResult + Send + Sync>;

/// Ordered hook declarations for one action type.
///
/// Declarations are cumulative: each builder call appends to the matching
/// list. Hooks receive the action instance and the shared context; method
/// references and inline closures are both accepted.
///
/// # Examples
///
/// ```
/// use tsugite::{Action, Context, HookResult, Hooks};
///
/// #[derive(Default)]
/// struct Audited;
///
/// impl Audited {
///     fn stamp(&mut self, ctx: &mut Context) -> HookResult {
///         ctx.set("audited", true);
///         Ok(())
///     }
/// }
///
/// impl Action for Audited {
///     fn call(&mut self, _ctx: &mut Context) -> HookResult {
///         Ok(())
///     }
///
///     fn hooks(&self) -> Hooks<Self> {
///         Hooks::new()
///             .before(Audited::stamp)
///             .after(|_, ctx| {
///                 ctx.set("finished", true);
///                 Ok(())
///             })
///     }
/// }
/// ```
pub struct Hooks<A> {
    before: Vec<HookFn<A>>,
    after: Vec<HookFn<A>>,
    around: Vec<AroundFn<A>>,
}

impl<A> fmt::Debug for Hooks<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("around", &self.around.len())
            .finish()
    }
}

impl<A> Default for Hooks<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for Hooks<A> {
    fn clone(&self) -> Self {
        Self {
            before: self.before.clone(),
            after: self.after.clone(),
            around: self.around.clone(),
        }
    }
}

impl<A> Hooks<A> {
    /// Creates an empty hook registry.
    pub fn new() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
            around: Vec::new(),
        }
    }

    /// Appends a before hook. Before hooks run in declaration order.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut A, &mut Context) -> HookResult + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    /// Appends an after hook. After hooks run in reverse declaration order:
    /// the most recently declared one runs first, mirroring unwind semantics.
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut A, &mut Context) -> HookResult + Send + Sync + 'static,
    {
        self.after.push(Arc::new(hook));
        self
    }

    /// Appends an around hook. Around hooks nest in declaration order: the
    /// first declared hook is outermost.
    pub fn around<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut A, &mut Context, Proceed<'_, A>) -> HookResult + Send + Sync + 'static,
    {
        self.around.push(Arc::new(hook));
        self
    }

    /// Returns `true` if no hooks are declared.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty() && self.around.is_empty()
    }

    /// Runs `core` wrapped in the composed hook order.
    pub(crate) fn invoke(
        &self,
        action: &mut A,
        ctx: &mut Context,
        core: &mut dyn FnMut(&mut A, &mut Context) -> HookResult,
    ) -> HookResult {
        let mut wrapped = |action: &mut A, ctx: &mut Context| -> HookResult {
            for hook in &self.before {
                hook(action, ctx)?;
            }
            core(action, ctx)?;
            for hook in self.after.iter().rev() {
                hook(action, ctx)?;
            }
            Ok(())
        };
        run_around(&self.around, action, ctx, &mut wrapped)
    }
}

fn run_around<A>(
    around: &[AroundFn<A>],
    action: &mut A,
    ctx: &mut Context,
    tail: &mut dyn FnMut(&mut A, &mut Context) -> HookResult,
) -> HookResult {
    match around.split_first() {
        None => tail(action, ctx),
        Some((outer, rest)) => {
            let mut next =
                |action: &mut A, ctx: &mut Context| run_around(rest, action, ctx, tail);
            outer(action, ctx, &mut next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Value;

    struct Probe;

    fn log(ctx: &mut Context, entry: &str) {
        let mut log = ctx
            .get("log")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        log.push(Value::from(entry));
        ctx.set("log", log);
    }

    fn logged(ctx: &Context) -> Vec<String> {
        ctx.get("log")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_composed_order() {
        let hooks: Hooks<Probe> = Hooks::new()
            .around(|probe, ctx, proceed: Proceed<'_, Probe>| {
                log(ctx, "around1:enter");
                let result = proceed(probe, ctx);
                log(ctx, "around1:exit");
                result
            })
            .around(|probe, ctx, proceed: Proceed<'_, Probe>| {
                log(ctx, "around2:enter");
                let result = proceed(probe, ctx);
                log(ctx, "around2:exit");
                result
            })
            .before(|_, ctx| {
                log(ctx, "before1");
                Ok(())
            })
            .before(|_, ctx| {
                log(ctx, "before2");
                Ok(())
            })
            .after(|_, ctx| {
                log(ctx, "after1");
                Ok(())
            })
            .after(|_, ctx| {
                log(ctx, "after2");
                Ok(())
            });

        let mut ctx = Context::new();
        let result = hooks.invoke(&mut Probe, &mut ctx, &mut |_, ctx| {
            log(ctx, "core");
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(
            logged(&ctx),
            vec![
                "around1:enter",
                "around2:enter",
                "before1",
                "before2",
                "core",
                "after2",
                "after1",
                "around2:exit",
                "around1:exit",
            ]
        );
    }

    #[test]
    fn test_around_can_skip_the_work() {
        let hooks: Hooks<Probe> = Hooks::new().around(|_, ctx, _proceed| {
            log(ctx, "around:skip");
            Ok(())
        });

        let mut ctx = Context::new();
        let result = hooks.invoke(&mut Probe, &mut ctx, &mut |_, ctx| {
            log(ctx, "core");
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(logged(&ctx), vec!["around:skip"]);
    }

    #[test]
    fn test_before_failure_skips_core_and_after() {
        let hooks: Hooks<Probe> = Hooks::new()
            .before(|_, ctx| Err(ctx.fail(crate::fields! { "reason" => "guard" })))
            .after(|_, ctx| {
                log(ctx, "after");
                Ok(())
            });

        let mut ctx = Context::new();
        let result = hooks.invoke(&mut Probe, &mut ctx, &mut |_, ctx| {
            log(ctx, "core");
            Ok(())
        });

        assert!(matches!(result, Err(Interrupt::Failure)));
        assert!(ctx.failure());
        assert!(logged(&ctx).is_empty());
    }

    #[test]
    fn test_hooks_are_cumulative_and_cheap_to_clone() {
        let hooks: Hooks<Probe> = Hooks::new()
            .before(|_, _| Ok(()))
            .before(|_, _| Ok(()));
        let copy = hooks.clone();

        assert!(!copy.is_empty());
        assert_eq!(copy.before.len(), 2);
    }
}
