//! # Destinations
//!
//! A destination is an entity that owns properties and routes incoming
//! requests to them. Routing is first-match in declaration order.

use crate::error::TypeMismatch;
use crate::memory::{CorrelationId, RequestObject};

/// An entity that can receive requests.
///
/// Implementors offer the request to their properties in a fixed order,
/// normally with [`dispatch_to`]. A derived entity offers it to its own
/// properties first and then falls back to its base with
/// [`DispatchOutcome::or_else`].
///
/// # Example
///
/// ```rust,ignore
/// impl Destination for ImageAttributes {
///     fn dispatch(&self, request: &RequestObject) -> DispatchOutcome {
///         dispatch_to(request, &[&self.res_path, &self.size])
///             .or_else(|| self.base.dispatch_base(request))
///     }
/// }
/// ```
pub trait Destination: Send + Sync {
    /// Offers `request` to the owned properties until one consumes it.
    ///
    /// Only the execution context calls this.
    fn dispatch(&self, request: &RequestObject) -> DispatchOutcome;
}

/// Type-erased view of a property, as seen by dispatch.
pub trait ApplyRequest {
    /// Property name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Correlation id this property answers to.
    fn correlation_id(&self) -> CorrelationId;

    /// Consumes `request` if it targets this property.
    ///
    /// Returns `Ok(false)` when the id differs or the operation is not one
    /// this property handles; the request is then free for the next
    /// property.
    ///
    /// # Errors
    ///
    /// [`TypeMismatch`] when the id matches but the payload kind is wrong.
    /// The request is not consumed.
    fn try_apply(&self, request: &RequestObject) -> Result<bool, TypeMismatch>;
}

/// Result of offering a request to a destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A property consumed the request.
    Consumed {
        /// Name of the consuming property.
        property: &'static str,
    },
    /// No property claimed the request. Normal and silent.
    Inert,
    /// A property matched the id but rejected the payload, and no later
    /// property consumed it.
    Mismatched(TypeMismatch),
}

impl DispatchOutcome {
    /// Returns whether a property consumed the request.
    #[inline]
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        matches!(self, Self::Consumed { .. })
    }

    /// Falls back to another dispatch when this one did not consume.
    ///
    /// A mismatch is kept if neither dispatch consumes, the earlier one
    /// winning.
    #[must_use]
    pub fn or_else(self, fallback: impl FnOnce() -> Self) -> Self {
        if self.is_consumed() {
            return self;
        }
        match (self, fallback()) {
            (_, consumed @ Self::Consumed { .. }) => consumed,
            (mismatch @ Self::Mismatched(_), _) => mismatch,
            (_, other) => other,
        }
    }
}

/// Offers `request` to `properties` in order and stops at the first that
/// consumes it.
///
/// A type mismatch does not stop the walk: a later property may still
/// claim the request.
#[must_use]
pub fn dispatch_to(request: &RequestObject, properties: &[&dyn ApplyRequest]) -> DispatchOutcome {
    let mut mismatch = None;
    for property in properties {
        match property.try_apply(request) {
            Ok(true) => {
                return DispatchOutcome::Consumed {
                    property: property.name(),
                }
            }
            Ok(false) => {}
            Err(err) => {
                mismatch.get_or_insert(err);
            }
        }
    }
    mismatch.map_or(DispatchOutcome::Inert, DispatchOutcome::Mismatched)
}
