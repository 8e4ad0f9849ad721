//! Commonly used types and traits

pub use crate::action::{Action, ActionName};
pub use crate::context::{Context, Fields, Value};
pub use crate::error::{BuildError, Interrupt, Outcome, RunError};
pub use crate::gate::Gate;
pub use crate::hooks::{HookResult, Hooks, Proceed};
pub use crate::organizer::Organizer;
pub use crate::switcher::{Branch, Switcher, SWITCHER_CONDITION};
pub use crate::{define_action, fields};
