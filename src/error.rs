//! Error and outcome types for action execution.

use crate::context::Context;
use serde_json::Value;
use thiserror::Error;

/// Boxed error type for unexpected failures raised inside hooks, core work,
/// or rollback functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Signal propagated through hooks, core work, and rollback functions.
///
/// A business failure is raised deliberately through [`Context::fail`] and
/// carries its details on the context itself; anything else is an unexpected
/// error carried through unchanged.
///
/// [`Context::fail`]: crate::Context::fail
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Interrupt {
    /// A deliberate business failure signaled by the action. Inspect the
    /// context for the fields merged at failure time.
    #[error("action signaled failure")]
    Failure,

    /// An unexpected error raised by a hook, core work, or rollback function.
    #[error("{0}")]
    Other(BoxError),
}

impl Interrupt {
    /// Wraps an arbitrary error as an unexpected [`Interrupt::Other`].
    ///
    /// # Examples
    ///
    /// ```
    /// use tsugite::Interrupt;
    ///
    /// let err = "config missing".parse::<i32>().unwrap_err();
    /// let interrupt = Interrupt::other(err);
    /// assert!(matches!(interrupt, Interrupt::Other(_)));
    /// ```
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Interrupt::Other(Box::new(error))
    }

    /// Builds an unexpected [`Interrupt::Other`] from a plain message.
    pub fn message(message: impl Into<String>) -> Self {
        Interrupt::Other(message.into().into())
    }

    /// Returns `true` for a business failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Interrupt::Failure)
    }
}

impl From<BoxError> for Interrupt {
    fn from(error: BoxError) -> Self {
        Interrupt::Other(error)
    }
}

/// Result of the non-raising invocation tier, [`Action::run`].
///
/// A business failure is an expected outcome and hands the context back for
/// inspection; an unexpected error propagates after rollback has run.
///
/// [`Action::run`]: crate::Action::run
#[derive(Debug)]
pub enum Outcome {
    /// The action and all of its children completed; the context holds
    /// everything they produced.
    Completed(Context),
    /// The action signaled a business failure; completed children have been
    /// rolled back and the context holds the failure fields.
    Failed(Context),
    /// A hook, core work, or rollback function raised an unexpected error.
    Errored(BoxError),
}

impl Outcome {
    /// Returns `true` if the invocation completed without failing.
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    /// Returns `true` if the invocation ended in a business failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Returns `true` if the invocation raised an unexpected error.
    pub fn is_errored(&self) -> bool {
        matches!(self, Outcome::Errored(_))
    }

    /// Returns the context, if the invocation produced one.
    pub fn context(&self) -> Option<&Context> {
        match self {
            Outcome::Completed(ctx) | Outcome::Failed(ctx) => Some(ctx),
            Outcome::Errored(_) => None,
        }
    }

    /// Consumes the outcome and returns the context, if any.
    pub fn into_context(self) -> Option<Context> {
        match self {
            Outcome::Completed(ctx) | Outcome::Failed(ctx) => Some(ctx),
            Outcome::Errored(_) => None,
        }
    }

    /// Converts into the raising tier's result: a failed context becomes
    /// [`RunError::Failed`], an unexpected error [`RunError::Errored`].
    pub fn into_result(self) -> Result<Context, RunError> {
        match self {
            Outcome::Completed(ctx) => Ok(ctx),
            Outcome::Failed(ctx) => Err(RunError::Failed(ctx)),
            Outcome::Errored(error) => Err(RunError::Errored(error)),
        }
    }
}

/// Error surface of the raising invocation tier, [`Action::try_run`].
///
/// [`Action::try_run`]: crate::Action::try_run
#[derive(Debug, Error)]
pub enum RunError {
    /// The action signaled a business failure; the context carries the
    /// fields that were present at failure time.
    #[error("action signaled failure")]
    Failed(Context),

    /// A hook, core work, or rollback function raised an unexpected error.
    #[error("{0}")]
    Errored(BoxError),
}

impl RunError {
    /// Returns the failed context, if this is a business failure.
    pub fn context(&self) -> Option<&Context> {
        match self {
            RunError::Failed(ctx) => Some(ctx),
            RunError::Errored(_) => None,
        }
    }
}

/// Configuration errors reported eagerly at composition-definition time.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// A switcher was declared without any case.
    #[error("switcher requires at least one case")]
    EmptySwitcher,

    /// Two switcher cases were declared for the same discriminator value.
    #[error("duplicate switcher case key: {0}")]
    DuplicateCase(String),

    /// A switcher mixed keyed and positional case declarations.
    #[error("switcher cannot mix keyed and positional cases")]
    MixedCases,
}

/// "Not found" conditions raised when a switcher cannot resolve its
/// discriminator to a case. Distinguishable from a business failure: they
/// surface as [`Interrupt::Other`].
#[derive(Debug, Error)]
pub enum SwitchError {
    /// The discriminator matched no declared case key.
    #[error("no switcher case matches condition {0}")]
    UnknownCase(Value),

    /// The discriminator is not a valid index into the positional cases.
    #[error("switcher condition {0} is not a valid case index")]
    InvalidIndex(Value),
}
