//! Conditional gates for organized actions.

use crate::context::Context;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Predicate pair deciding whether an organized action runs.
///
/// A gated action runs only when the `when` predicate (if any) is true and
/// the `unless` predicate (if any) is false; both may be combined. A skipped
/// action contributes nothing: no hooks run and it never appears in the
/// completed list.
///
/// # Examples
///
/// ```
/// use tsugite::{fields, Context, Gate};
///
/// let gate = Gate::new()
///     .when(|ctx: &Context| ctx.get_bool("opted_in").unwrap_or(false))
///     .unless(|ctx: &Context| ctx.has("suppress"));
///
/// let ctx = Context::from(fields! { "opted_in" => true });
/// assert!(gate.allows(&ctx));
///
/// let ctx = Context::from(fields! { "opted_in" => true, "suppress" => true });
/// assert!(!gate.allows(&ctx));
/// ```
#[derive(Clone, Default)]
pub struct Gate {
    when: Option<Predicate>,
    unless: Option<Predicate>,
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("when", &self.when.is_some())
            .field("unless", &self.unless.is_some())
            .finish()
    }
}

impl Gate {
    /// Creates a gate that always allows execution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `predicate` to be true for the action to run.
    pub fn when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.when = Some(Arc::new(predicate));
        self
    }

    /// Skips the action when `predicate` is true.
    pub fn unless<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.unless = Some(Arc::new(predicate));
        self
    }

    /// Evaluates the gate against the shared context.
    pub fn allows(&self, ctx: &Context) -> bool {
        let permitted = self.when.as_ref().map_or(true, |predicate| predicate(ctx));
        let blocked = self
            .unless
            .as_ref()
            .map_or(false, |predicate| predicate(ctx));
        permitted && !blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn test_default_gate_allows() {
        assert!(Gate::new().allows(&Context::new()));
    }

    #[test]
    fn test_when_predicate() {
        let gate = Gate::new().when(|ctx: &Context| ctx.has("go"));
        assert!(!gate.allows(&Context::new()));
        assert!(gate.allows(&Context::from(fields! { "go" => true })));
    }

    #[test]
    fn test_unless_negates() {
        let gate = Gate::new().unless(|ctx: &Context| ctx.has("stop"));
        assert!(gate.allows(&Context::new()));
        assert!(!gate.allows(&Context::from(fields! { "stop" => true })));
    }

    #[test]
    fn test_combined_predicates_must_both_permit() {
        let gate = Gate::new()
            .when(|ctx: &Context| ctx.has("go"))
            .unless(|ctx: &Context| ctx.has("stop"));

        assert!(gate.allows(&Context::from(fields! { "go" => true })));
        assert!(!gate.allows(&Context::from(fields! { "go" => true, "stop" => true })));
        assert!(!gate.allows(&Context::new()));
    }
}
