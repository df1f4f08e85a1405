//! # Scalar Property
//!
//! One attribute, two values. The control value answers control-side reads
//! immediately; the execution value only moves when a request is applied.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::{SetResult, TypeMismatch};
use crate::memory::{CorrelationId, Operation, RequestObject};

use super::binding::PropertyBinding;
use super::destination::ApplyRequest;
use super::payload::PayloadValue;

/// A double-buffered attribute synchronized through pooled requests.
///
/// Each side locks only its own value, so the locks are uncontended in the
/// intended two-thread layout. They exist to make the type `Sync`.
///
/// # Example
///
/// ```rust,ignore
/// // Control thread
/// node.rotation.set(90.0)?;
/// assert_eq!(node.rotation.get(), 90.0);        // visible at once
///
/// // Execution thread, after the request was applied
/// assert_eq!(node.rotation.execute_get(), 90.0);
/// if node.rotation.changed() {
///     rebuild_transform();
///     node.rotation.clear_changed();
/// }
/// ```
pub struct Property<T: PayloadValue> {
    name: &'static str,
    id: CorrelationId,
    binding: PropertyBinding,
    control: RwLock<T>,
    execute: RwLock<T>,
    changed: AtomicBool,
}

impl<T: PayloadValue> Property<T> {
    /// Creates a property with both sides set to `initial`.
    #[must_use]
    pub fn new(name: &'static str, id: CorrelationId, binding: &PropertyBinding, initial: T) -> Self {
        Self {
            name,
            id,
            binding: binding.clone(),
            control: RwLock::new(initial.clone()),
            execute: RwLock::new(initial),
            changed: AtomicBool::new(false),
        }
    }

    /// Creates a property with both sides set to `T::default()`.
    #[must_use]
    pub fn with_default(name: &'static str, id: CorrelationId, binding: &PropertyBinding) -> Self
    where
        T: Default,
    {
        Self::new(name, id, binding, T::default())
    }

    /// Creates a property seeded from both values of `source`.
    ///
    /// This bypasses the request protocol: it reads `source`'s execution
    /// value directly. Only use it to clone an entity while `source` has no
    /// requests in flight, or from the execution context.
    #[must_use]
    pub fn copied_from(
        name: &'static str,
        id: CorrelationId,
        binding: &PropertyBinding,
        source: &Self,
    ) -> Self {
        Self {
            name,
            id,
            binding: binding.clone(),
            control: RwLock::new(source.control.read().clone()),
            execute: RwLock::new(source.execute.read().clone()),
            changed: AtomicBool::new(false),
        }
    }

    /// Returns the property name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the correlation id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Control side: records `value` and sends it to the execution side.
    ///
    /// The control value changes only after the request is queued.
    ///
    /// # Errors
    ///
    /// [`SetError`](crate::SetError) if the pool is not started or the
    /// execution side has hung up. Neither value changes.
    pub fn set(&self, value: T) -> SetResult<()> {
        self.binding
            .submit(Operation::Update, self.id, value.clone().into_payload())?;
        *self.control.write() = value;
        Ok(())
    }

    /// Control side: returns the last value passed to `set`.
    #[must_use]
    pub fn get(&self) -> T {
        self.control.read().clone()
    }

    /// Execution side: returns the last applied value.
    #[must_use]
    pub fn execute_get(&self) -> T {
        self.execute.read().clone()
    }

    /// Execution side: consumes `request` if it is an update for this
    /// property.
    ///
    /// # Errors
    ///
    /// [`TypeMismatch`] if the id matches but payload slot 0 holds another
    /// kind or a value out of range for `T`. The execution value is left
    /// unchanged.
    pub fn try_apply(&self, request: &RequestObject) -> Result<bool, TypeMismatch> {
        if request.correlation_id() != self.id || request.operation() != Operation::Update {
            return Ok(false);
        }

        let payload = request.payload(0);
        let value = T::from_payload(payload).map_err(|reason| TypeMismatch {
            property: self.name,
            correlation_id: self.id,
            expected: T::KIND,
            found: payload.kind(),
            reason,
        })?;

        *self.execute.write() = value;
        self.changed.store(true, Ordering::Release);
        Ok(true)
    }

    /// Returns whether a request was applied since the last
    /// [`clear_changed`](Self::clear_changed).
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }

    /// Clears the changed flag.
    #[inline]
    pub fn clear_changed(&self) {
        self.changed.store(false, Ordering::Release);
    }

    /// One-line dump of both values, for debug overlays and logs.
    #[must_use]
    pub fn describe(&self) -> String
    where
        T: fmt::Debug,
    {
        format!(
            "{}({}) control={:?} execute={:?}",
            self.name,
            self.id,
            *self.control.read(),
            *self.execute.read()
        )
    }
}

impl<T: PayloadValue> ApplyRequest for Property<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn correlation_id(&self) -> CorrelationId {
        self.id
    }

    fn try_apply(&self, request: &RequestObject) -> Result<bool, TypeMismatch> {
        Property::try_apply(self, request)
    }
}

impl<T: PayloadValue + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("control", &*self.control.read())
            .field("execute", &*self.execute.read())
            .field("changed", &self.changed())
            .finish_non_exhaustive()
    }
}
