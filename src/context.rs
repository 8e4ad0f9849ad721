//! Shared execution context with dynamically-keyed field storage.

use crate::error::Interrupt;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use tracing::debug;

pub use serde_json::Value;

/// Ordered field mapping shared by every action in one invocation tree.
pub type Fields = IndexMap<String, Value>;

/// Rollback capability recorded for a completed action.
///
/// The context owns the completed list exclusively; entries expose only the
/// rollback operation, not the full action interface.
pub(crate) trait Completed: Send {
    fn name(&self) -> &str;
    fn rollback(&mut self, ctx: &mut Context) -> Result<(), Interrupt>;
}

/// Mutable record threaded through an entire invocation tree.
///
/// The context carries an open-ended field mapping, a monotonic failure flag,
/// and the ordered list of actions that completed successfully (used only for
/// rollback). Every action in one tree mutates the same instance; callers
/// running independent trees use independent contexts.
///
/// # Examples
///
/// ```
/// use tsugite::{fields, Context};
///
/// let mut ctx = Context::from(fields! { "user_id" => 7 });
/// ctx.set("name", "Ada");
///
/// assert_eq!(ctx.get_i64("user_id"), Some(7));
/// assert_eq!(ctx.get_str("name"), Some("Ada"));
/// assert_eq!(ctx.get("missing"), None);
/// assert!(ctx.success());
/// ```
pub struct Context {
    fields: Fields,
    failed: bool,
    completed: Vec<Box<dyn Completed>>,
    rolled_back: bool,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("fields", &self.fields)
            .field("failed", &self.failed)
            .field("completed", &self.completed.len())
            .field("rolled_back", &self.rolled_back)
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self {
            fields: Fields::new(),
            failed: false,
            completed: Vec::new(),
            rolled_back: false,
        }
    }

    /// Returns a reference to the value for the given key.
    ///
    /// Unset keys read as `None`, never an error, so optional fields are
    /// safe to probe.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Returns `true` if the context contains the given key.
    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Typed accessor: the field as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Typed accessor: the field as a signed integer.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Typed accessor: the field as a float.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Typed accessor: the field as a boolean.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Returns the full field mapping in insertion order.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns `true` iff the context has not failed.
    pub fn success(&self) -> bool {
        !self.failed
    }

    /// Returns `true` iff the context has failed.
    pub fn failure(&self) -> bool {
        self.failed
    }

    /// Merges `fields` into the context, marks it failed, and returns the
    /// failure signal to propagate.
    ///
    /// Fields are applied before the flag is raised, so handlers up the call
    /// stack observe the merged data. Failing twice preserves the flag and
    /// still merges the additional fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use tsugite::{fields, Context, HookResult};
    ///
    /// fn charge(ctx: &mut Context) -> HookResult {
    ///     if ctx.get_i64("amount").unwrap_or(0) <= 0 {
    ///         return Err(ctx.fail(fields! { "reason" => "empty charge" }));
    ///     }
    ///     Ok(())
    /// }
    ///
    /// let mut ctx = Context::new();
    /// assert!(charge(&mut ctx).is_err());
    /// assert!(ctx.failure());
    /// assert_eq!(ctx.get_str("reason"), Some("empty charge"));
    /// ```
    #[must_use = "the returned signal must be propagated to stop the pipeline"]
    pub fn fail(&mut self, fields: Fields) -> Interrupt {
        for (key, value) in fields {
            self.fields.insert(key, value);
        }
        self.failed = true;
        Interrupt::Failure
    }

    /// Number of actions recorded as completed for rollback purposes.
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Returns `true` once this context has been rolled back.
    pub fn rolled_back(&self) -> bool {
        self.rolled_back
    }

    /// Rolls back every completed action, most recently completed first.
    ///
    /// Returns `Ok(false)` without doing anything if the context was already
    /// rolled back; the reversal work runs at most once. An error raised by a
    /// child's rollback function propagates to the caller and the remaining
    /// entries are not retried.
    pub fn rollback(&mut self) -> Result<bool, Interrupt> {
        if self.rolled_back {
            return Ok(false);
        }
        self.rolled_back = true;
        let completed = std::mem::take(&mut self.completed);
        for mut entry in completed.into_iter().rev() {
            debug!(action = entry.name(), "rolling back");
            entry.rollback(self)?;
        }
        Ok(true)
    }

    /// Appends an action to the completed list. Called by the run state
    /// machine after the core work returned successfully.
    pub(crate) fn record_completed(&mut self, entry: Box<dyn Completed>) {
        self.completed.push(entry);
    }
}

impl From<Fields> for Context {
    /// Builds a fresh context holding the given entries. The context owns an
    /// independent copy: mutating it never touches the caller's data.
    fn from(fields: Fields) -> Self {
        Self {
            fields,
            ..Self::new()
        }
    }
}

impl From<serde_json::Map<String, Value>> for Context {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self::from(map.into_iter().collect::<Fields>())
    }
}

impl From<Value> for Context {
    /// Builds a context from a JSON object; non-object values produce an
    /// empty context.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from(map),
            _ => Self::new(),
        }
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Context", 2)?;
        state.serialize_field("fields", &self.fields)?;
        state.serialize_field("failed", &self.failed)?;
        state.end()
    }
}

/// Builds a [`Fields`] mapping from literal entries.
///
/// # Examples
///
/// ```
/// use tsugite::fields;
///
/// let fields = fields! { "sku" => "widget", "quantity" => 3 };
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::Fields::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(fields.insert(::std::string::String::from($key), $crate::Value::from($value));)+
        fields
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorded(&'static str);

    impl Completed for Recorded {
        fn name(&self) -> &str {
            self.0
        }

        fn rollback(&mut self, ctx: &mut Context) -> Result<(), Interrupt> {
            let mut log = ctx
                .get("log")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            log.push(Value::from(self.0));
            ctx.set("log", log);
            Ok(())
        }
    }

    #[test]
    fn test_field_operations() {
        let mut ctx = Context::new();
        ctx.set("key1", "value1");
        ctx.set("count", 3);

        assert_eq!(ctx.get_str("key1"), Some("value1"));
        assert_eq!(ctx.get_i64("count"), Some(3));
        assert!(ctx.has("key1"));
        assert_eq!(ctx.get("nonexistent"), None);
    }

    #[test]
    fn test_build_from_fields_is_independent() {
        let source = fields! { "a" => 1 };
        let snapshot = source.clone();
        let mut ctx = Context::from(source);
        ctx.set("a", 2);
        ctx.set("b", 3);

        assert_eq!(snapshot.get("a"), Some(&Value::from(1)));
        assert_eq!(snapshot.get("b"), None);
    }

    #[test]
    fn test_fail_merges_fields_and_is_monotonic() {
        let mut ctx = Context::new();
        let signal = ctx.fail(fields! { "reason" => "bad" });
        assert!(signal.is_failure());
        assert!(ctx.failure());
        assert!(!ctx.success());
        assert_eq!(ctx.get_str("reason"), Some("bad"));

        // Double fail keeps the flag and merges additional fields.
        let signal = ctx.fail(fields! { "code" => 42 });
        assert!(signal.is_failure());
        assert!(ctx.failure());
        assert_eq!(ctx.get_i64("code"), Some(42));
        assert_eq!(ctx.get_str("reason"), Some("bad"));
    }

    #[test]
    fn test_rollback_reverses_completion_order() {
        let mut ctx = Context::new();
        ctx.record_completed(Box::new(Recorded("first")));
        ctx.record_completed(Box::new(Recorded("second")));
        ctx.record_completed(Box::new(Recorded("third")));

        assert_eq!(ctx.completed_count(), 3);
        assert_eq!(ctx.rollback().ok(), Some(true));
        assert!(ctx.rolled_back());

        let log = ctx.get("log").and_then(Value::as_array).cloned();
        assert_eq!(
            log,
            Some(vec![
                Value::from("third"),
                Value::from("second"),
                Value::from("first"),
            ])
        );
    }

    #[test]
    fn test_rollback_is_idempotent() {
        let mut ctx = Context::new();
        ctx.record_completed(Box::new(Recorded("only")));

        assert_eq!(ctx.rollback().ok(), Some(true));
        assert_eq!(ctx.rollback().ok(), Some(false));

        let log = ctx.get("log").and_then(Value::as_array).cloned();
        assert_eq!(log, Some(vec![Value::from("only")]));
    }

    #[test]
    fn test_serialize_snapshot() {
        let mut ctx = Context::from(fields! { "user" => "ada" });
        let _ = ctx.fail(Fields::new());

        let json = serde_json::to_value(&ctx).unwrap_or(Value::Null);
        assert_eq!(json["fields"]["user"], Value::from("ada"));
        assert_eq!(json["failed"], Value::from(true));
    }
}
