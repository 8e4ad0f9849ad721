//! # Tsugite (継手)
//!
//! A lightweight interactor engine for Rust.
//!
//! The name "Tsugite" (継手) is the Japanese word for a joinery joint,
//! reflecting how this crate joins small business-logic actions into
//! pipelines that hold together — and come apart cleanly when one fails.
//!
//! ## Features
//!
//! - **Shared context**: one dynamically-keyed [`Context`] record threads
//!   through an entire invocation tree
//! - **Lifecycle hooks**: before/after/around hooks with deterministic
//!   composition order
//! - **Automatic rollback**: every completed action is rolled back in
//!   reverse completion order when a later step fails
//! - **Composable**: sequential [`Organizer`] and branching [`Switcher`]
//!   composers are themselves actions
//! - **Lightweight**: synchronous, single-threaded by design, minimal
//!   dependencies
//!
//! ## Quick Start
//!
//! ```rust
//! use tsugite::prelude::*;
//!
//! define_action!(CreateOrder);
//!
//! impl Action for CreateOrder {
//!     fn call(&mut self, ctx: &mut Context) -> HookResult {
//!         ctx.set("order_id", 42);
//!         Ok(())
//!     }
//! }
//!
//! let outcome = CreateOrder.run(fields! { "customer" => "ada" });
//! assert!(outcome.is_completed());
//!
//! let ctx = outcome.into_context().expect("completed outcome has a context");
//! assert_eq!(ctx.get_i64("order_id"), Some(42));
//! ```
//!
//! ## Failing and rolling back
//!
//! An action signals a business failure by propagating the interrupt
//! returned from [`Context::fail`]. Inside an [`Organizer`], the first
//! failure stops the sequence and rolls back every child that had already
//! completed, most recent first:
//!
//! ```rust
//! use tsugite::prelude::*;
//!
//! define_action!(ReserveStock);
//! define_action!(ChargeCard);
//!
//! impl Action for ReserveStock {
//!     fn call(&mut self, ctx: &mut Context) -> HookResult {
//!         ctx.set("reserved", true);
//!         Ok(())
//!     }
//!
//!     fn rollback(&mut self, ctx: &mut Context) -> HookResult {
//!         ctx.set("reserved", false);
//!         Ok(())
//!     }
//! }
//!
//! impl Action for ChargeCard {
//!     fn call(&mut self, ctx: &mut Context) -> HookResult {
//!         Err(ctx.fail(fields! { "reason" => "card declined" }))
//!     }
//! }
//!
//! let organizer = Organizer::builder("Checkout")
//!     .add::<ReserveStock>()
//!     .add::<ChargeCard>()
//!     .build();
//!
//! let outcome = organizer.run(Context::new());
//! assert!(outcome.is_failed());
//!
//! let ctx = outcome.into_context().expect("failure hands the context back");
//! assert_eq!(ctx.get_str("reason"), Some("card declined"));
//! assert_eq!(ctx.get_bool("reserved"), Some(false));
//! ```
//!
//! ## Branching
//!
//! A [`Switcher`] runs exactly one of several alternative sequences,
//! selected by the context's `switcher_condition` field:
//!
//! ```rust
//! use tsugite::prelude::*;
//!
//! define_action!(EmailInvoice);
//! define_action!(PrintInvoice);
//!
//! impl Action for EmailInvoice {
//!     fn call(&mut self, ctx: &mut Context) -> HookResult {
//!         ctx.set("sent_via", "email");
//!         Ok(())
//!     }
//! }
//!
//! impl Action for PrintInvoice {
//!     fn call(&mut self, ctx: &mut Context) -> HookResult {
//!         ctx.set("sent_via", "paper");
//!         Ok(())
//!     }
//! }
//!
//! let switcher = Switcher::builder("Invoice")
//!     .case_for("email", Branch::new().add::<EmailInvoice>())
//!     .case_for("paper", Branch::new().add::<PrintInvoice>())
//!     .build()
//!     .expect("valid switcher");
//!
//! let ctx = switcher
//!     .try_run(fields! { "switcher_condition" => "paper" })
//!     .expect("paper branch succeeds");
//! assert_eq!(ctx.get_str("sent_via"), Some("paper"));
//! ```

mod action;
mod context;
mod error;
mod gate;
mod hooks;
mod organizer;
mod switcher;

pub mod prelude;

pub use action::{Action, ActionName};
pub use context::{Context, Fields, Value};
pub use error::{BoxError, BuildError, Interrupt, Outcome, RunError, SwitchError};
pub use gate::Gate;
pub use hooks::{HookResult, Hooks, Proceed};
pub use organizer::{Organizer, OrganizerBuilder};
pub use switcher::{Branch, Switcher, SwitcherBuilder, SWITCHER_CONDITION};

/// Macro to define an action with minimal boilerplate
///
/// This macro creates an action struct with:
/// - `const NAME: &'static str` - compile-time action name
/// - `Debug` derive
/// - `Default` implementation
///
/// # Example
///
/// ```rust
/// use tsugite::define_action;
///
/// define_action!(ChargeCard);
/// assert_eq!(ChargeCard::NAME, "ChargeCard");
/// ```
#[macro_export]
macro_rules! define_action {
    ($name:ident) => {
        #[derive(Debug)]
        pub struct $name;

        impl $name {
            /// Action name as a compile-time constant
            #[allow(dead_code)]
            pub const NAME: &'static str = stringify!($name);
        }

        impl Default for $name {
            fn default() -> Self {
                Self
            }
        }
    };
}
