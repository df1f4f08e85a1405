//! # Request Payloads
//!
//! The request queue is type-erased, so payload slots hold one value from a
//! small closed set of kinds. Properties convert to and from that set through
//! [`PayloadValue`]; a wrong kind is detected where the request is consumed.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::error::MismatchReason;

/// Three-component vector payload (positions, sizes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Creates a vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
}

/// Shared, type-erased handle to an execution-side resource
/// (texture, mesh, script object).
///
/// Equality is identity.
#[derive(Clone)]
pub struct OpaqueHandle(Arc<dyn Any + Send + Sync>);

impl OpaqueHandle {
    /// Wraps `value` in a new handle.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns the wrapped value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl PartialEq for OpaqueHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for OpaqueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueHandle({:p})", Arc::as_ptr(&self.0))
    }
}

/// Contents of one request payload slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Payload {
    /// Slot unused.
    #[default]
    Empty,
    /// Integer (also carries `bool` and narrower integers).
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Owned string.
    Text(String),
    /// Opaque shared handle.
    Handle(OpaqueHandle),
    /// Three-component vector.
    Vec3(Vec3),
}

impl Payload {
    /// Returns the kind tag of this payload.
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Self::Empty => PayloadKind::Empty,
            Self::Int(_) => PayloadKind::Int,
            Self::Float(_) => PayloadKind::Float,
            Self::Text(_) => PayloadKind::Text,
            Self::Handle(_) => PayloadKind::Handle,
            Self::Vec3(_) => PayloadKind::Vec3,
        }
    }

    /// Returns whether the slot is unused.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Kind tag of a [`Payload`], used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// [`Payload::Empty`].
    Empty,
    /// [`Payload::Int`].
    Int,
    /// [`Payload::Float`].
    Float,
    /// [`Payload::Text`].
    Text,
    /// [`Payload::Handle`].
    Handle,
    /// [`Payload::Vec3`].
    Vec3,
}

impl PayloadKind {
    /// Lower-case name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Handle => "handle",
            Self::Vec3 => "vec3",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value type a property can carry through a request.
///
/// `from_payload` reports why a payload cannot be read; the caller turns
/// that into a [`TypeMismatch`](crate::TypeMismatch). Narrow integers and
/// `bool` ride on [`Payload::Int`] and are range-checked, never truncated.
pub trait PayloadValue: Clone + Send + Sync + 'static {
    /// Payload kind this type is stored as.
    const KIND: PayloadKind;

    /// Converts the value into a payload.
    fn into_payload(self) -> Payload;

    /// Reads a value of this type back out of a payload.
    ///
    /// # Errors
    ///
    /// [`MismatchReason::WrongKind`] for another payload kind,
    /// [`MismatchReason::OutOfRange`] when the value does not fit.
    fn from_payload(payload: &Payload) -> Result<Self, MismatchReason>;
}

impl PayloadValue for i64 {
    const KIND: PayloadKind = PayloadKind::Int;

    fn into_payload(self) -> Payload {
        Payload::Int(self)
    }

    fn from_payload(payload: &Payload) -> Result<Self, MismatchReason> {
        match payload {
            Payload::Int(v) => Ok(*v),
            _ => Err(MismatchReason::WrongKind),
        }
    }
}

impl PayloadValue for i32 {
    const KIND: PayloadKind = PayloadKind::Int;

    fn into_payload(self) -> Payload {
        Payload::Int(i64::from(self))
    }

    fn from_payload(payload: &Payload) -> Result<Self, MismatchReason> {
        let wide = i64::from_payload(payload)?;
        i32::try_from(wide).map_err(|_| MismatchReason::OutOfRange)
    }
}

impl PayloadValue for u32 {
    const KIND: PayloadKind = PayloadKind::Int;

    fn into_payload(self) -> Payload {
        Payload::Int(i64::from(self))
    }

    fn from_payload(payload: &Payload) -> Result<Self, MismatchReason> {
        let wide = i64::from_payload(payload)?;
        u32::try_from(wide).map_err(|_| MismatchReason::OutOfRange)
    }
}

impl PayloadValue for bool {
    const KIND: PayloadKind = PayloadKind::Int;

    fn into_payload(self) -> Payload {
        Payload::Int(i64::from(self))
    }

    fn from_payload(payload: &Payload) -> Result<Self, MismatchReason> {
        match i64::from_payload(payload)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(MismatchReason::OutOfRange),
        }
    }
}

impl PayloadValue for f64 {
    const KIND: PayloadKind = PayloadKind::Float;

    fn into_payload(self) -> Payload {
        Payload::Float(self)
    }

    fn from_payload(payload: &Payload) -> Result<Self, MismatchReason> {
        match payload {
            Payload::Float(v) => Ok(*v),
            _ => Err(MismatchReason::WrongKind),
        }
    }
}

impl PayloadValue for f32 {
    const KIND: PayloadKind = PayloadKind::Float;

    fn into_payload(self) -> Payload {
        Payload::Float(f64::from(self))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_payload(payload: &Payload) -> Result<Self, MismatchReason> {
        match payload {
            Payload::Float(v) => Ok(*v as f32),
            _ => Err(MismatchReason::WrongKind),
        }
    }
}

impl PayloadValue for String {
    const KIND: PayloadKind = PayloadKind::Text;

    fn into_payload(self) -> Payload {
        Payload::Text(self)
    }

    fn from_payload(payload: &Payload) -> Result<Self, MismatchReason> {
        match payload {
            Payload::Text(v) => Ok(v.clone()),
            _ => Err(MismatchReason::WrongKind),
        }
    }
}

impl PayloadValue for Vec3 {
    const KIND: PayloadKind = PayloadKind::Vec3;

    fn into_payload(self) -> Payload {
        Payload::Vec3(self)
    }

    fn from_payload(payload: &Payload) -> Result<Self, MismatchReason> {
        match payload {
            Payload::Vec3(v) => Ok(*v),
            _ => Err(MismatchReason::WrongKind),
        }
    }
}

impl PayloadValue for OpaqueHandle {
    const KIND: PayloadKind = PayloadKind::Handle;

    fn into_payload(self) -> Payload {
        Payload::Handle(self)
    }

    fn from_payload(payload: &Payload) -> Result<Self, MismatchReason> {
        match payload {
            Payload::Handle(v) => Ok(v.clone()),
            _ => Err(MismatchReason::WrongKind),
        }
    }
}
