//! # List Property
//!
//! A composite attribute that layers element operations (append, remove,
//! clear) under a single correlation id. Each operation travels as its own
//! request, so the execution side replays exactly the edits the control
//! side made, in order.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::{SetResult, TypeMismatch};
use crate::memory::{CorrelationId, Operation, RequestObject};

use super::binding::PropertyBinding;
use super::destination::ApplyRequest;
use super::payload::{Payload, PayloadValue};

/// A list-valued property with control and execution copies.
///
/// With [`ListProperty::new_sorted`] both copies are kept in ascending
/// order, which lets consumers intersect two lists with a linear merge.
///
/// Control edits hold the control lock while their request is queued, so
/// queue order matches the order the control list was edited in.
pub struct ListProperty<T: PayloadValue + PartialEq> {
    name: &'static str,
    id: CorrelationId,
    binding: PropertyBinding,
    order: Option<fn(&T, &T) -> CmpOrdering>,
    control: RwLock<Vec<T>>,
    execute: RwLock<Vec<T>>,
    changed: AtomicBool,
}

impl<T: PayloadValue + PartialEq> ListProperty<T> {
    /// Creates an unordered list property holding `initial` on both sides.
    #[must_use]
    pub fn new(
        name: &'static str,
        id: CorrelationId,
        binding: &PropertyBinding,
        initial: Vec<T>,
    ) -> Self {
        Self::build(name, id, binding, None, initial)
    }

    /// Creates a list property that keeps both sides sorted.
    #[must_use]
    pub fn new_sorted(
        name: &'static str,
        id: CorrelationId,
        binding: &PropertyBinding,
        mut initial: Vec<T>,
    ) -> Self
    where
        T: Ord,
    {
        initial.sort();
        Self::build(name, id, binding, Some(T::cmp), initial)
    }

    fn build(
        name: &'static str,
        id: CorrelationId,
        binding: &PropertyBinding,
        order: Option<fn(&T, &T) -> CmpOrdering>,
        initial: Vec<T>,
    ) -> Self {
        Self {
            name,
            id,
            binding: binding.clone(),
            order,
            control: RwLock::new(initial.clone()),
            execute: RwLock::new(initial),
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

    /// Returns whether the list keeps its elements sorted.
    #[inline]
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.order.is_some()
    }

    /// Control side: appends `value` (or inserts it in order).
    ///
    /// # Errors
    ///
    /// [`SetError`](crate::SetError) if the request could not be issued. The
    /// control list is unchanged.
    pub fn push(&self, value: T) -> SetResult<()> {
        let mut control = self.control.write();
        self.binding
            .submit(Operation::ListAppend, self.id, value.clone().into_payload())?;
        insert(&mut control, value, self.order);
        Ok(())
    }

    /// Control side: removes the first element equal to `value`.
    ///
    /// Returns `false` and sends nothing if the control list has no such
    /// element.
    ///
    /// # Errors
    ///
    /// [`SetError`](crate::SetError) if the request could not be issued.
    pub fn remove(&self, value: &T) -> SetResult<bool> {
        let mut control = self.control.write();
        let Some(index) = control.iter().position(|v| v == value) else {
            return Ok(false);
        };
        self.binding
            .submit(Operation::ListRemove, self.id, value.clone().into_payload())?;
        control.remove(index);
        Ok(true)
    }

    /// Control side: removes every element.
    ///
    /// # Errors
    ///
    /// [`SetError`](crate::SetError) if the request could not be issued.
    pub fn clear(&self) -> SetResult<()> {
        let mut control = self.control.write();
        self.binding
            .submit(Operation::ListClear, self.id, Payload::Empty)?;
        control.clear();
        Ok(())
    }

    /// Control side: returns a copy of the list.
    #[must_use]
    pub fn get(&self) -> Vec<T> {
        self.control.read().clone()
    }

    /// Control side: returns whether the list holds `value`.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.control.read().contains(value)
    }

    /// Execution side: returns a copy of the applied list.
    #[must_use]
    pub fn execute_get(&self) -> Vec<T> {
        self.execute.read().clone()
    }

    /// Execution side: runs `f` over the applied list without copying it.
    pub fn execute_with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.execute.read())
    }

    /// Execution side: applies a list operation targeting this property.
    ///
    /// `Update` and any other operation are left for other handlers. A
    /// remove of a missing element is consumed without raising `changed`.
    ///
    /// # Errors
    ///
    /// [`TypeMismatch`] if an append or remove carries the wrong payload
    /// kind.
    pub fn try_apply(&self, request: &RequestObject) -> Result<bool, TypeMismatch> {
        if request.correlation_id() != self.id {
            return Ok(false);
        }

        match request.operation() {
            Operation::ListAppend => {
                let value = self.decode(request)?;
                insert(&mut self.execute.write(), value, self.order);
            }
            Operation::ListRemove => {
                let value = self.decode(request)?;
                let mut list = self.execute.write();
                let Some(index) = list.iter().position(|v| *v == value) else {
                    // Consumed, but nothing changed
                    return Ok(true);
                };
                list.remove(index);
            }
            Operation::ListClear => self.execute.write().clear(),
            _ => return Ok(false),
        }

        self.changed.store(true, Ordering::Release);
        Ok(true)
    }

    fn decode(&self, request: &RequestObject) -> Result<T, TypeMismatch> {
        let payload = request.payload(0);
        T::from_payload(payload).map_err(|reason| TypeMismatch {
            property: self.name,
            correlation_id: self.id,
            expected: T::KIND,
            found: payload.kind(),
            reason,
        })
    }

    /// Returns whether a request was applied since the last clear.
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
}

fn insert<T>(list: &mut Vec<T>, value: T, order: Option<fn(&T, &T) -> CmpOrdering>) {
    match order {
        Some(cmp) => {
            let index =
                list.partition_point(|existing| cmp(existing, &value) != CmpOrdering::Greater);
            list.insert(index, value);
        }
        None => list.push(value),
    }
}

impl<T: PayloadValue + PartialEq> ApplyRequest for ListProperty<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn correlation_id(&self) -> CorrelationId {
        self.id
    }

    fn try_apply(&self, request: &RequestObject) -> Result<bool, TypeMismatch> {
        ListProperty::try_apply(self, request)
    }
}

impl<T: PayloadValue + PartialEq + fmt::Debug> fmt::Debug for ListProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListProperty")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("control", &*self.control.read())
            .field("execute", &*self.execute.read())
            .field("changed", &self.changed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Weak};

    use super::*;
    use crate::config::PoolConfig;
    use crate::memory::RequestPool;
    use crate::property::{dispatch_to, Destination, DispatchOutcome, PayloadKind};
    use crate::sync::{request_channel, RequestLink, RequestReceiver};

    const TAGS: CorrelationId = CorrelationId::new(7);

    struct Tagged {
        tags: ListProperty<String>,
    }

    impl Destination for Tagged {
        fn dispatch(&self, request: &RequestObject) -> DispatchOutcome {
            dispatch_to(request, &[&self.tags])
        }
    }

    fn fixture(initial: &[&str]) -> (Arc<RequestPool>, Arc<Tagged>, RequestReceiver) {
        let pool = Arc::new(RequestPool::new(PoolConfig { preload: 4 }));
        pool.start();
        let (sender, receiver) = request_channel();
        let link = RequestLink::new(Arc::clone(&pool), sender);
        let initial: Vec<String> = initial.iter().map(|s| (*s).to_owned()).collect();
        let tagged = Arc::new_cyclic(|weak: &Weak<Tagged>| {
            let owner: Weak<dyn Destination> = weak.clone();
            let binding = PropertyBinding::new(owner, link);
            Tagged {
                tags: ListProperty::new_sorted("tags", TAGS, &binding, initial),
            }
        });
        (pool, tagged, receiver)
    }

    fn pump(pool: &RequestPool, receiver: &RequestReceiver) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        while let Some(request) = receiver.try_recv() {
            outcomes.push(request.apply());
            pool.recycle(request).unwrap();
        }
        outcomes
    }

    #[test]
    fn test_initial_list_is_sorted() {
        let (_pool, tagged, _receiver) = fixture(&["world", "hud", "**ALL**"]);
        assert!(tagged.tags.is_sorted());
        assert_eq!(tagged.tags.get(), vec!["**ALL**", "hud", "world"]);
        assert_eq!(tagged.tags.execute_get(), tagged.tags.get());
    }

    #[test]
    fn test_edits_replay_on_execute_side() {
        let (pool, tagged, receiver) = fixture(&["**ALL**"]);

        tagged.tags.push("minimap".to_owned()).unwrap();
        tagged.tags.push("debug".to_owned()).unwrap();
        assert!(tagged.tags.remove(&"**ALL**".to_owned()).unwrap());
        assert_eq!(tagged.tags.get(), vec!["debug", "minimap"]);
        assert_eq!(tagged.tags.execute_get(), vec!["**ALL**"]);

        let outcomes = pump(&pool, &receiver);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(DispatchOutcome::is_consumed));
        assert_eq!(tagged.tags.execute_get(), vec!["debug", "minimap"]);
        assert!(tagged.tags.changed());
    }

    #[test]
    fn test_remove_missing_sends_nothing() {
        let (_pool, tagged, receiver) = fixture(&["a"]);
        assert!(!tagged.tags.remove(&"zzz".to_owned()).unwrap());
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_clear() {
        let (pool, tagged, receiver) = fixture(&["a", "b"]);
        tagged.tags.clear().unwrap();
        assert!(tagged.tags.get().is_empty());
        pump(&pool, &receiver);
        assert!(tagged.tags.execute_with(<[String]>::is_empty));
    }

    #[test]
    fn test_update_is_left_for_other_handlers() {
        let (pool, tagged, _receiver) = fixture(&[]);
        let mut request = pool.get(Operation::Update).unwrap();
        request.set_correlation_id(TAGS);
        request.set_payload(0, Payload::Text("x".into()));
        assert_eq!(tagged.tags.try_apply(&request), Ok(false));
        pool.recycle(request).unwrap();
    }

    #[test]
    fn test_append_wrong_kind_is_mismatch() {
        let (pool, tagged, _receiver) = fixture(&[]);
        let mut request = pool.get(Operation::ListAppend).unwrap();
        request.set_correlation_id(TAGS);
        request.set_payload(0, Payload::Int(3));
        let err = tagged.tags.try_apply(&request).unwrap_err();
        assert_eq!(err.found, PayloadKind::Int);
        assert!(tagged.tags.execute_get().is_empty());
        pool.recycle(request).unwrap();
    }

    #[test]
    fn test_remove_missing_on_execute_side_is_not_a_change() {
        let (pool, tagged, _receiver) = fixture(&["a"]);
        let mut request = pool.get(Operation::ListRemove).unwrap();
        request.set_correlation_id(TAGS);
        request.set_payload(0, Payload::Text("zzz".into()));

        assert_eq!(tagged.tags.try_apply(&request), Ok(true));
        assert_eq!(tagged.tags.execute_get(), vec!["a"]);
        assert!(!tagged.tags.changed());
        pool.recycle(request).unwrap();
    }

    #[test]
    fn test_concurrent_edits_keep_sides_in_step() {
        let (pool, tagged, receiver) = fixture(&[]);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..50 {
                    tagged.tags.push(format!("a{i:02}")).unwrap();
                }
            });
            scope.spawn(|| {
                for _ in 0..50 {
                    tagged.tags.push("b".to_owned()).unwrap();
                    assert!(tagged.tags.remove(&"b".to_owned()).unwrap());
                }
            });
        });
        tagged.tags.push("b".to_owned()).unwrap();

        pump(&pool, &receiver);
        assert_eq!(tagged.tags.get().len(), 51);
        assert_eq!(tagged.tags.execute_get(), tagged.tags.get());
    }
}
