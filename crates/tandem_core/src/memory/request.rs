//! # Request Object
//!
//! The unit of deferred mutation passed from the control context to the
//! execution context.

use std::fmt;
use std::sync::Weak;
use std::time::{Duration, Instant};

use crate::error::{protocol_violation, ProtocolViolation};
use crate::property::{Destination, DispatchOutcome, Payload};

/// Number of payload slots carried by every request.
pub const PAYLOAD_SLOTS: usize = 6;

/// Owned handle to a request that is out of the pool.
pub type RequestHandle = Box<RequestObject>;

/// Operation a request asks its target property to perform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Cleared state. Pooled requests always carry this.
    #[default]
    Invalid,
    /// Replace the execution-side value with payload slot 0.
    Update,
    /// Append payload slot 0 to a list property.
    ListAppend,
    /// Remove the first element equal to payload slot 0.
    ListRemove,
    /// Remove every element of a list property.
    ListClear,
}

impl Operation {
    /// Short name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "Invalid",
            Self::Update => "Update",
            Self::ListAppend => "ListAppend",
            Self::ListRemove => "ListRemove",
            Self::ListClear => "ListClear",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies which property of a destination a request targets.
///
/// Unique within one destination. Zero is the cleared value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct CorrelationId(u32);

impl CorrelationId {
    /// The cleared id carried by pooled requests.
    pub const NONE: Self = Self(0);

    /// Creates a correlation id.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pooled, reusable carrier of one mutation intent.
///
/// Only [`RequestPool`](crate::RequestPool) creates these. While the
/// in-pool flag is set no other component may touch the object, and every
/// accessor enforces that.
pub struct RequestObject {
    operation: Operation,
    correlation_id: CorrelationId,
    /// Non-owning: a request never keeps its destination alive.
    destination: Option<Weak<dyn Destination>>,
    payload: [Payload; PAYLOAD_SLOTS],
    in_pool: bool,
    issued_at: Option<Instant>,
    /// Id of the issuing pool.
    owner: u64,
}

impl RequestObject {
    pub(crate) fn new(owner: u64) -> Self {
        Self {
            operation: Operation::Invalid,
            correlation_id: CorrelationId::NONE,
            destination: None,
            payload: Default::default(),
            in_pool: true,
            issued_at: None,
            owner,
        }
    }

    /// Id of the pool that allocated this object.
    pub(crate) fn owner(&self) -> u64 {
        self.owner
    }

    /// Returns whether the pool currently owns this object.
    #[inline]
    #[must_use]
    pub fn is_in_pool(&self) -> bool {
        self.in_pool
    }

    /// Returns the requested operation.
    #[inline]
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.ensure_issued();
        self.operation
    }

    /// Overrides the operation chosen at `get` time.
    #[inline]
    pub fn set_operation(&mut self, operation: Operation) {
        self.ensure_issued();
        self.operation = operation;
    }

    /// Returns the correlation id of the target property.
    #[inline]
    #[must_use]
    pub fn correlation_id(&self) -> CorrelationId {
        self.ensure_issued();
        self.correlation_id
    }

    /// Sets the correlation id of the target property.
    #[inline]
    pub fn set_correlation_id(&mut self, id: CorrelationId) {
        self.ensure_issued();
        self.correlation_id = id;
    }

    /// Sets the destination. The reference is weak.
    #[inline]
    pub fn set_destination(&mut self, destination: Weak<dyn Destination>) {
        self.ensure_issued();
        self.destination = Some(destination);
    }

    /// Returns whether a destination was set and is still alive.
    #[must_use]
    pub fn destination_alive(&self) -> bool {
        self.ensure_issued();
        self.destination
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Returns the payload in `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= PAYLOAD_SLOTS`.
    #[inline]
    #[must_use]
    pub fn payload(&self, slot: usize) -> &Payload {
        self.ensure_issued();
        &self.payload[slot]
    }

    /// Stores `value` in `slot`, replacing whatever was there.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= PAYLOAD_SLOTS`.
    #[inline]
    pub fn set_payload(&mut self, slot: usize, value: Payload) {
        self.ensure_issued();
        self.payload[slot] = value;
    }

    /// Offers this request to its destination.
    ///
    /// The destination is upgraded for the duration of the call only.
    ///
    /// # Panics
    ///
    /// Protocol violation if no destination was set or the destination has
    /// already been destroyed.
    pub fn apply(&self) -> DispatchOutcome {
        self.ensure_issued();
        let Some(weak) = self.destination.as_ref() else {
            protocol_violation(ProtocolViolation::MissingDestination(self.correlation_id));
        };
        let Some(destination) = weak.upgrade() else {
            protocol_violation(ProtocolViolation::DestinationDropped(self.correlation_id));
        };
        destination.dispatch(self)
    }

    /// Takes the object out of the pool.
    pub(crate) fn checkout(&mut self, operation: Operation) {
        if !self.in_pool {
            protocol_violation(ProtocolViolation::DoubleGet);
        }
        self.in_pool = false;
        self.operation = operation;
        self.issued_at = Some(Instant::now());
    }

    /// Clears every field and hands the object back to the pool.
    ///
    /// Returns how long the request was out of the pool.
    pub(crate) fn checkin(&mut self) -> Duration {
        if self.in_pool {
            protocol_violation(ProtocolViolation::DoubleReturn);
        }
        let in_flight = self.issued_at.map_or(Duration::ZERO, |at| at.elapsed());
        self.reset();
        self.in_pool = true;
        in_flight
    }

    fn reset(&mut self) {
        self.operation = Operation::Invalid;
        self.correlation_id = CorrelationId::NONE;
        self.destination = None;
        for slot in &mut self.payload {
            *slot = Payload::Empty;
        }
        self.issued_at = None;
    }

    #[inline]
    fn ensure_issued(&self) {
        if self.in_pool {
            protocol_violation(ProtocolViolation::AccessWhilePooled);
        }
    }
}

impl fmt::Display for RequestObject {
    /// Formats as `Update(#7)[ 1:int 3:vec3]`, listing occupied slots only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})[", self.operation, self.correlation_id)?;
        for (index, slot) in self.payload.iter().enumerate() {
            if !slot.is_empty() {
                write!(f, " {}:{}", index + 1, slot.kind())?;
            }
        }
        f.write_str("]")
    }
}

impl fmt::Debug for RequestObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestObject")
            .field("operation", &self.operation)
            .field("correlation_id", &self.correlation_id)
            .field("has_destination", &self.destination.is_some())
            .field("payload", &self.payload)
            .field("in_pool", &self.in_pool)
            .finish()
    }
}

impl Drop for RequestObject {
    fn drop(&mut self) {
        if !self.in_pool {
            tracing::warn!(request = %self, "request dropped outside the pool");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_pooled_and_cleared() {
        let request = RequestObject::new(0);
        assert!(request.is_in_pool());
        assert_eq!(request.operation, Operation::Invalid);
        assert_eq!(request.correlation_id, CorrelationId::NONE);
        assert!(request.destination.is_none());
        assert!(request.payload.iter().all(Payload::is_empty));
    }

    #[test]
    fn test_checkin_resets_every_field() {
        let mut request = RequestObject::new(0);
        request.checkout(Operation::Update);
        request.set_correlation_id(CorrelationId::new(9));
        for slot in 0..PAYLOAD_SLOTS {
            request.set_payload(slot, Payload::Int(slot as i64));
        }

        request.checkin();

        assert!(request.is_in_pool());
        assert_eq!(request.operation, Operation::Invalid);
        assert_eq!(request.correlation_id, CorrelationId::NONE);
        assert!(request.destination.is_none());
        assert!(request.payload.iter().all(Payload::is_empty));
        assert!(request.issued_at.is_none());
    }

    #[test]
    fn test_display_lists_occupied_slots() {
        let mut request = RequestObject::new(0);
        request.checkout(Operation::Update);
        request.set_correlation_id(CorrelationId::new(7));
        request.set_payload(0, Payload::Int(1));
        request.set_payload(2, Payload::Text("x".into()));

        assert_eq!(request.to_string(), "Update(#7)[ 1:int 3:text]");
        request.checkin();
    }

    #[test]
    #[should_panic(expected = "double get")]
    fn test_double_checkout_panics() {
        let mut request = RequestObject::new(0);
        request.checkout(Operation::Update);
        request.checkout(Operation::Update);
    }

    #[test]
    #[should_panic(expected = "double return")]
    fn test_double_checkin_panics() {
        let mut request = RequestObject::new(0);
        request.checkout(Operation::Update);
        request.checkin();
        request.checkin();
    }

    #[test]
    #[should_panic(expected = "owned by the pool")]
    fn test_access_while_pooled_panics() {
        let request = RequestObject::new(0);
        let _ = request.operation();
    }

    #[test]
    #[should_panic(expected = "has no destination")]
    fn test_apply_without_destination_panics() {
        let mut request = RequestObject::new(0);
        request.checkout(Operation::Update);
        let _ = request.apply();
    }
}
