//! Branching composition: run exactly one of several alternative sequences.

use crate::action::{Action, ActionName, Erased};
use crate::context::{Context, Value};
use crate::error::{BuildError, Interrupt, SwitchError};
use crate::hooks::{HookResult, Hooks, Proceed};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Context key read by a [`Switcher`] to select its case.
pub const SWITCHER_CONDITION: &str = "switcher_condition";

type ActionFactory = Arc<dyn Fn() -> Box<dyn Erased> + Send + Sync>;

/// One alternative sequence of actions inside a [`Switcher`] case.
///
/// A branch may hold a single action or a nested sequence; members run in
/// order through the raising tier against the shared context.
#[derive(Clone, Default)]
pub struct Branch {
    actions: Vec<(ActionName, ActionFactory)>,
}

impl fmt::Debug for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Branch")
            .field(
                "actions",
                &self.actions.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Branch {
    /// Creates an empty branch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action constructed via `Default`.
    pub fn add<A: Action + Default>(self) -> Self {
        self.add_with(A::default)
    }

    /// Appends an action constructed by `factory` on each invocation.
    pub fn add_with<A, F>(mut self, factory: F) -> Self
    where
        A: Action,
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.actions.push((
            ActionName::from_type_name::<A>(),
            Arc::new(move || Box::new(factory()) as Box<dyn Erased>),
        ));
        self
    }
}

#[derive(Clone)]
struct Case {
    key: Option<Value>,
    branch: Branch,
}

/// Runs exactly one of several declared alternative sequences.
///
/// The case is selected by the context's [`SWITCHER_CONDITION`] field:
/// positional cases select by integer index, keyed cases by value equality,
/// and an absent condition selects the first declared case. Unselected
/// branches are never touched — no hooks run and the context is not mutated
/// by them.
///
/// # Examples
///
/// ```
/// use tsugite::prelude::*;
///
/// define_action!(ShipParcel);
/// define_action!(SendPickupCode);
///
/// impl Action for ShipParcel {
///     fn call(&mut self, ctx: &mut Context) -> HookResult {
///         ctx.set("shipped", true);
///         Ok(())
///     }
/// }
///
/// impl Action for SendPickupCode {
///     fn call(&mut self, ctx: &mut Context) -> HookResult {
///         ctx.set("pickup_code", "XJ42");
///         Ok(())
///     }
/// }
///
/// let switcher = Switcher::builder("Delivery")
///     .case_for("home", Branch::new().add::<ShipParcel>())
///     .case_for("pickup", Branch::new().add::<SendPickupCode>())
///     .build()
///     .expect("valid switcher");
///
/// let ctx = switcher
///     .try_run(fields! { "switcher_condition" => "pickup" })
///     .expect("pickup branch succeeds");
/// assert_eq!(ctx.get_str("pickup_code"), Some("XJ42"));
/// assert_eq!(ctx.get("shipped"), None);
/// ```
#[derive(Clone)]
pub struct Switcher {
    name: ActionName,
    cases: Vec<Case>,
    keyed: bool,
    hooks: Hooks<Switcher>,
}

impl fmt::Debug for Switcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Switcher")
            .field("name", &self.name)
            .field("cases", &self.cases.len())
            .field("keyed", &self.keyed)
            .finish()
    }
}

impl Switcher {
    /// Starts declaring a switcher with the given name.
    pub fn builder(name: impl Into<ActionName>) -> SwitcherBuilder {
        SwitcherBuilder {
            name: name.into(),
            cases: Vec::new(),
            hooks: Hooks::new(),
        }
    }

    /// Resolves the context's condition to a case index.
    fn select(&self, ctx: &Context) -> Result<usize, Interrupt> {
        let Some(condition) = ctx.get(SWITCHER_CONDITION) else {
            return Ok(0);
        };
        if self.keyed {
            self.cases
                .iter()
                .position(|case| case.key.as_ref() == Some(condition))
                .ok_or_else(|| Interrupt::other(SwitchError::UnknownCase(condition.clone())))
        } else {
            condition
                .as_u64()
                .and_then(|index| usize::try_from(index).ok())
                .filter(|index| *index < self.cases.len())
                .ok_or_else(|| Interrupt::other(SwitchError::InvalidIndex(condition.clone())))
        }
    }
}

impl Action for Switcher {
    fn call(&mut self, ctx: &mut Context) -> HookResult {
        let index = self.select(ctx)?;
        let Some(case) = self.cases.get(index) else {
            return Err(Interrupt::other(SwitchError::InvalidIndex(Value::from(
                index,
            ))));
        };
        debug!(switcher = %self.name, case = index, "selected case");
        for (_, factory) in &case.branch.actions {
            let make = factory.as_ref();
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

/// Declares a [`Switcher`]'s cases and its own hooks.
///
/// Cases are either all positional ([`case`](SwitcherBuilder::case)) or all
/// keyed ([`case_for`](SwitcherBuilder::case_for)); malformed declarations
/// are rejected eagerly by [`build`](SwitcherBuilder::build), never deferred
/// to invocation time.
pub struct SwitcherBuilder {
    name: ActionName,
    cases: Vec<Case>,
    hooks: Hooks<Switcher>,
}

impl SwitcherBuilder {
    /// Appends a positional case.
    pub fn case(mut self, branch: Branch) -> Self {
        self.cases.push(Case { key: None, branch });
        self
    }

    /// Appends a case keyed by a discriminator value.
    pub fn case_for(mut self, key: impl Into<Value>, branch: Branch) -> Self {
        self.cases.push(Case {
            key: Some(key.into()),
            branch,
        });
        self
    }

    /// Appends a before hook on the switcher itself.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Switcher, &mut Context) -> HookResult + Send + Sync + 'static,
    {
        self.hooks = self.hooks.before(hook);
        self
    }

    /// Appends an after hook on the switcher itself.
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Switcher, &mut Context) -> HookResult + Send + Sync + 'static,
    {
        self.hooks = self.hooks.after(hook);
        self
    }

    /// Appends an around hook on the switcher itself.
    pub fn around<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Switcher, &mut Context, Proceed<'_, Switcher>) -> HookResult
            + Send
            + Sync
            + 'static,
    {
        self.hooks = self.hooks.around(hook);
        self
    }

    /// Validates the declaration and builds the switcher.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::EmptySwitcher`] when no case was declared,
    /// [`BuildError::MixedCases`] when keyed and positional cases are mixed,
    /// and [`BuildError::DuplicateCase`] when two cases share a key.
    pub fn build(self) -> Result<Switcher, BuildError> {
        if self.cases.is_empty() {
            return Err(BuildError::EmptySwitcher);
        }
        let keyed_count = self.cases.iter().filter(|case| case.key.is_some()).count();
        if keyed_count != 0 && keyed_count != self.cases.len() {
            return Err(BuildError::MixedCases);
        }
        for (index, case) in self.cases.iter().enumerate() {
            let Some(key) = &case.key else { continue };
            if self.cases[..index].iter().any(|prior| prior.key.as_ref() == Some(key)) {
                return Err(BuildError::DuplicateCase(key.to_string()));
            }
        }
        Ok(Switcher {
            name: self.name,
            cases: self.cases,
            keyed: keyed_count != 0,
            hooks: self.hooks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunError;
    use crate::{define_action, fields};

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

    define_action!(ActionA);
    define_action!(ActionB);
    define_action!(ActionC);

    impl Action for ActionA {
        fn call(&mut self, ctx: &mut Context) -> HookResult {
            log(ctx, "a");
            Ok(())
        }
    }

    impl Action for ActionB {
        fn call(&mut self, ctx: &mut Context) -> HookResult {
            log(ctx, "b");
            Ok(())
        }
    }

    impl Action for ActionC {
        fn call(&mut self, ctx: &mut Context) -> HookResult {
            log(ctx, "c");
            Ok(())
        }
    }

    fn positional() -> Switcher {
        // Cases [[A, B], C].
        Switcher::builder("Positional")
            .case(Branch::new().add::<ActionA>().add::<ActionB>())
            .case(Branch::new().add::<ActionC>())
            .build()
            .unwrap_or_else(|_| unreachable!("valid switcher"))
    }

    fn keyed() -> Switcher {
        // Cases {path1: A, path2: [B, C]}.
        Switcher::builder("Keyed")
            .case_for("path1", Branch::new().add::<ActionA>())
            .case_for("path2", Branch::new().add::<ActionB>().add::<ActionC>())
            .build()
            .unwrap_or_else(|_| unreachable!("valid switcher"))
    }

    #[test]
    fn test_absent_condition_selects_first_case() {
        let ctx = positional().try_run(Context::new()).unwrap_or_default();
        assert_eq!(logged(&ctx), vec!["a", "b"]);
    }

    #[test]
    fn test_positional_selection_by_index() {
        let ctx = positional()
            .try_run(fields! { SWITCHER_CONDITION => 1 })
            .unwrap_or_default();
        assert_eq!(logged(&ctx), vec!["c"]);
    }

    #[test]
    fn test_keyed_selection_runs_branch_in_order() {
        let ctx = keyed()
            .try_run(fields! { SWITCHER_CONDITION => "path2" })
            .unwrap_or_default();
        assert_eq!(logged(&ctx), vec!["b", "c"]);
    }

    #[test]
    fn test_keyed_absent_condition_runs_first_declared() {
        let ctx = keyed().try_run(Context::new()).unwrap_or_default();
        assert_eq!(logged(&ctx), vec!["a"]);
    }

    #[test]
    fn test_unknown_key_is_a_not_found_error() {
        let result = keyed().try_run(fields! { SWITCHER_CONDITION => "path9" });
        match result {
            Err(RunError::Errored(error)) => {
                assert!(error.to_string().contains("no switcher case matches"));
            }
            _ => assert!(false, "expected RunError::Errored"),
        }
    }

    #[test]
    fn test_out_of_range_index_is_an_error() {
        let result = positional().try_run(fields! { SWITCHER_CONDITION => 7 });
        assert!(matches!(result, Err(RunError::Errored(_))));
    }

    #[test]
    fn test_build_rejects_empty_switcher() {
        let result = Switcher::builder("Empty").build();
        assert_eq!(result.err(), Some(BuildError::EmptySwitcher));
    }

    #[test]
    fn test_build_rejects_mixed_cases() {
        let result = Switcher::builder("Mixed")
            .case(Branch::new().add::<ActionA>())
            .case_for("path1", Branch::new().add::<ActionB>())
            .build();
        assert_eq!(result.err(), Some(BuildError::MixedCases));
    }

    #[test]
    fn test_build_rejects_duplicate_keys() {
        let result = Switcher::builder("Duplicate")
            .case_for("path1", Branch::new().add::<ActionA>())
            .case_for("path1", Branch::new().add::<ActionB>())
            .build();
        assert_eq!(
            result.err(),
            Some(BuildError::DuplicateCase("\"path1\"".to_string()))
        );
    }
}
