//! The action trait and its run/rollback state machine.

use crate::context::{Completed, Context};
use crate::error::{Interrupt, Outcome, RunError};
use crate::hooks::{HookResult, Hooks};
use std::fmt;
use tracing::{debug, warn};

/// Type-safe action name wrapper, used for logging and diagnostics.
///
/// # Examples
///
/// ```
/// use tsugite::ActionName;
///
/// let name = ActionName::new("ChargeCard");
/// assert_eq!(name.as_str(), "ChargeCard");
///
/// let name: ActionName = "ReserveStock".into();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionName(String);

impl ActionName {
    /// Creates a new ActionName.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates an ActionName from a type's name (extracts the last segment).
    pub fn from_type_name<T: ?Sized>() -> Self {
        let full_name = std::any::type_name::<T>();
        let short_name = full_name.split("::").last().unwrap_or("UnknownAction");
        Self::new(short_name)
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActionName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ActionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ActionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A unit of business logic run against a shared [`Context`].
///
/// Implementors provide the core work in [`call`](Action::call), optionally a
/// [`rollback`](Action::rollback) that reverses its side effects, and
/// optionally lifecycle [`hooks`](Action::hooks). Invocation goes through one
/// of two tiers: [`run`](Action::run) never propagates a business failure
/// (check the returned [`Outcome`]), while [`try_run`](Action::try_run)
/// converts a failed context into an error.
///
/// # Examples
///
/// ```
/// use tsugite::prelude::*;
///
/// define_action!(ReserveStock);
///
/// impl Action for ReserveStock {
///     fn call(&mut self, ctx: &mut Context) -> HookResult {
///         ctx.set("reserved", true);
///         Ok(())
///     }
///
///     fn rollback(&mut self, ctx: &mut Context) -> HookResult {
///         ctx.set("reserved", false);
///         Ok(())
///     }
/// }
///
/// let outcome = ReserveStock.run(fields! { "sku" => "widget" });
/// assert!(outcome.is_completed());
/// ```
pub trait Action: Send + 'static {
    /// Core work. Signal a business failure by returning the interrupt from
    /// [`Context::fail`]; any other error propagates unchanged after
    /// rollback.
    fn call(&mut self, ctx: &mut Context) -> HookResult;

    /// Reverses the side effects of [`call`](Action::call). No-op by
    /// default. Invoked by the engine only for actions whose core work
    /// completed, most recently completed first.
    fn rollback(&mut self, _ctx: &mut Context) -> HookResult {
        Ok(())
    }

    /// Lifecycle hook declarations for this action. Empty by default.
    fn hooks(&self) -> Hooks<Self>
    where
        Self: Sized,
    {
        Hooks::new()
    }

    /// Returns the action name. Defaults to the type name.
    fn name(&self) -> ActionName {
        ActionName::from_type_name::<Self>()
    }

    /// Non-raising invocation tier.
    ///
    /// Runs the full hook-wrapped work against a context built from `input`.
    /// A business failure is swallowed and reported as [`Outcome::Failed`];
    /// an unexpected error triggers rollback and is reported as
    /// [`Outcome::Errored`].
    fn run(self, input: impl Into<Context>) -> Outcome
    where
        Self: Sized,
    {
        let mut ctx = input.into();
        match execute(self, &mut ctx) {
            Ok(()) if ctx.failure() => Outcome::Failed(ctx),
            Ok(()) => Outcome::Completed(ctx),
            Err(Interrupt::Failure) => Outcome::Failed(ctx),
            Err(Interrupt::Other(error)) => Outcome::Errored(error),
        }
    }

    /// Raising invocation tier.
    ///
    /// Calls [`run`](Action::run) and converts a failed context into
    /// [`RunError::Failed`], carrying the context for inspection.
    fn try_run(self, input: impl Into<Context>) -> Result<Context, RunError>
    where
        Self: Sized,
    {
        self.run(input).into_result()
    }
}

/// Rollback capability stored on the context for one completed action.
struct CompletedAction<A: Action> {
    name: ActionName,
    action: A,
}

impl<A: Action> Completed for CompletedAction<A> {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn rollback(&mut self, ctx: &mut Context) -> HookResult {
        self.action.rollback(ctx)
    }
}

/// Object-safe executor so composers can run heterogeneous children through
/// the raising tier against the shared context.
pub(crate) trait Erased: Send {
    fn execute_boxed(self: Box<Self>, ctx: &mut Context) -> Result<(), Interrupt>;
}

impl<A: Action> Erased for A {
    fn execute_boxed(self: Box<Self>, ctx: &mut Context) -> Result<(), Interrupt> {
        execute(*self, ctx)
    }
}

/// Raising-tier state machine for one action invocation.
///
/// created → hooks-running → core-running → completed | failed.
///
/// On success the action is recorded on the context for a future rollback.
/// On any interrupt the context rollback runs once before the signal
/// propagates; an action whose core work completed before a later after-hook
/// failed is recorded first, so the rollback reaches it too.
pub(crate) fn execute<A: Action>(mut action: A, ctx: &mut Context) -> Result<(), Interrupt> {
    let name = action.name();
    debug!(action = %name, "running action");

    let hooks = action.hooks();
    let mut core_done = false;
    let result = hooks.invoke(&mut action, ctx, &mut |action, ctx| {
        action.call(ctx)?;
        core_done = true;
        Ok(())
    });

    match result {
        Ok(()) => {
            if core_done {
                debug!(action = %name, "action completed");
                ctx.record_completed(Box::new(CompletedAction { name, action }));
            } else {
                debug!(action = %name, "action skipped by around hook");
            }
            Ok(())
        }
        Err(interrupt) => {
            warn!(action = %name, failure = interrupt.is_failure(), "action interrupted, unwinding");
            if core_done {
                ctx.record_completed(Box::new(CompletedAction {
                    name: name.clone(),
                    action,
                }));
            }
            ctx.rollback()?;
            Err(interrupt)
        }
    }
}
