//! Sequential composition of actions with automatic rollback.

use crate::action::{Action, ActionName, Erased};
use crate::context::Context;
use crate::gate::Gate;
use crate::hooks::{HookResult, Hooks, Proceed};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type ActionFactory = Arc<dyn Fn() -> Box<dyn Erased> + Send + Sync>;

#[derive(Clone)]
struct OrganizedStep {
    name: ActionName,
    factory: ActionFactory,
    gate: Gate,
}

/// Runs a declared list of actions in order against one shared context.
///
/// The organizer is itself an [`Action`]: it can declare its own hooks and
/// be organized as a child of an outer organizer. The first child that
/// signals an interrupt stops the sequence; every child that had already
/// completed — across arbitrarily deep nesting — is rolled back in reverse
/// completion order, because all children share the one context and its
/// single completed list.
///
/// # Examples
///
/// ```
/// use tsugite::prelude::*;
///
/// define_action!(ReserveStock);
/// define_action!(ChargeCard);
///
/// impl Action for ReserveStock {
///     fn call(&mut self, ctx: &mut Context) -> HookResult {
///         ctx.set("reserved", true);
///         Ok(())
///     }
/// }
///
/// impl Action for ChargeCard {
///     fn call(&mut self, ctx: &mut Context) -> HookResult {
///         ctx.set("charged", true);
///         Ok(())
///     }
/// }
///
/// let organizer = Organizer::builder("Checkout")
///     .add::<ReserveStock>()
///     .add::<ChargeCard>()
///     .build();
///
/// let outcome = organizer.run(fields! { "sku" => "widget" });
/// assert!(outcome.is_completed());
/// ```
#[derive(Clone)]
pub struct Organizer {
    name: ActionName,
    steps: Vec<OrganizedStep>,
    hooks: Hooks<Organizer>,
}

impl fmt::Debug for Organizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Organizer")
            .field("name", &self.name)
            .field("steps", &self.steps.iter().map(|s| &s.name).collect::<Vec<_>>())
            .finish()
    }
}

impl Organizer {
    /// Starts declaring an organizer with the given name.
    pub fn builder(name: impl Into<ActionName>) -> OrganizerBuilder {
        OrganizerBuilder {
            name: name.into(),
            steps: Vec::new(),
            hooks: Hooks::new(),
        }
    }

    /// Names of the declared children, in declaration order.
    pub fn step_names(&self) -> impl Iterator<Item = &ActionName> {
        self.steps.iter().map(|step| &step.name)
    }
}

impl Action for Organizer {
    fn call(&mut self, ctx: &mut Context) -> HookResult {
        for step in &self.steps {
            if !step.gate.allows(ctx) {
                debug!(organizer = %self.name, action = %step.name, "skipping gated action");
                continue;
            }
            let make = step.factory.as_ref();
            make().execute_boxed(ctx)?;
        }
        Ok(())
    }

    fn hooks(&self) -> Hooks<Self> {
        self.hooks.clone()
    }

    fn name(&self) -> ActionName {
        self.name.clone()
    }
}

/// Declares an [`Organizer`]'s ordered child list and its own hooks.
///
/// The declared list is fixed once [`build`](OrganizerBuilder::build) runs;
/// per-invocation state lives entirely on the shared context. Children are
/// constructed fresh per invocation from their factory (or `Default`).
pub struct OrganizerBuilder {
    name: ActionName,
    steps: Vec<OrganizedStep>,
    hooks: Hooks<Organizer>,
}

impl OrganizerBuilder {
    /// Appends a child action constructed via `Default`.
    pub fn add<A: Action + Default>(self) -> Self {
        self.add_gated_with(A::default, Gate::new())
    }

    /// Appends a child action constructed by `factory` on each invocation.
    ///
    /// Use this for children that carry configuration, including a nested
    /// organizer: `.add_with(move || inner.clone())`.
    pub fn add_with<A, F>(self, factory: F) -> Self
    where
        A: Action,
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.add_gated_with(factory, Gate::new())
    }

    /// Appends a child gated on `predicate` being true.
    pub fn add_if<A, P>(self, predicate: P) -> Self
    where
        A: Action + Default,
        P: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.add_gated_with(A::default, Gate::new().when(predicate))
    }

    /// Appends a child skipped when `predicate` is true.
    pub fn add_unless<A, P>(self, predicate: P) -> Self
    where
        A: Action + Default,
        P: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.add_gated_with(A::default, Gate::new().unless(predicate))
    }

    /// Appends a child behind an explicit [`Gate`].
    pub fn add_gated<A: Action + Default>(self, gate: Gate) -> Self {
        self.add_gated_with(A::default, gate)
    }

    /// Appends a factory-constructed child behind an explicit [`Gate`].
    pub fn add_gated_with<A, F>(mut self, factory: F, gate: Gate) -> Self
    where
        A: Action,
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.steps.push(OrganizedStep {
            name: ActionName::from_type_name::<A>(),
            factory: Arc::new(move || Box::new(factory()) as Box<dyn Erased>),
            gate,
        });
        self
    }

    /// Appends a before hook on the organizer itself.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Organizer, &mut Context) -> HookResult + Send + Sync + 'static,
    {
        self.hooks = self.hooks.before(hook);
        self
    }

    /// Appends an after hook on the organizer itself.
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Organizer, &mut Context) -> HookResult + Send + Sync + 'static,
    {
        self.hooks = self.hooks.after(hook);
        self
    }

    /// Appends an around hook on the organizer itself.
    pub fn around<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Organizer, &mut Context, Proceed<'_, Organizer>) -> HookResult
            + Send
            + Sync
            + 'static,
    {
        self.hooks = self.hooks.around(hook);
        self
    }

    /// Finishes the declaration.
    pub fn build(self) -> Organizer {
        Organizer {
            name: self.name,
            steps: self.steps,
            hooks: self.hooks,
        }
    }
}
