//! # Property Binding
//!
//! What a property needs to emit requests: its owning destination and the
//! link to the pool and queue.

use std::sync::Weak;

use crate::error::SetResult;
use crate::memory::{CorrelationId, Operation};
use crate::sync::RequestLink;

use super::destination::Destination;
use super::payload::Payload;

/// Owner and transport shared by every property of one destination.
///
/// Build it inside `Arc::new_cyclic` so the owner reference exists before
/// the destination does:
///
/// ```rust,ignore
/// Arc::new_cyclic(|weak| {
///     let owner: Weak<dyn Destination> = weak.clone();
///     let binding = PropertyBinding::new(owner, link.clone());
///     Self { alpha: Property::new("alpha", ALPHA, &binding, 1.0) }
/// })
/// ```
#[derive(Clone)]
pub struct PropertyBinding {
    owner: Weak<dyn Destination>,
    link: RequestLink,
}

impl PropertyBinding {
    /// Binds properties to `owner`, sending through `link`.
    #[must_use]
    pub fn new(owner: Weak<dyn Destination>, link: RequestLink) -> Self {
        Self { owner, link }
    }

    /// Returns the transport link.
    #[must_use]
    pub fn link(&self) -> &RequestLink {
        &self.link
    }

    /// Issues one request from `property` to the owner.
    pub(crate) fn submit(
        &self,
        operation: Operation,
        property: CorrelationId,
        payload: Payload,
    ) -> SetResult<()> {
        self.link.submit(operation, property, &self.owner, payload)
    }
}
