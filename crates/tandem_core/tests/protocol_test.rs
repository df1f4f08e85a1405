//! Integration tests for the control/execution request protocol.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use tandem_core::{
    dispatch_to, request_channel, CorrelationId, Destination, DispatchOutcome, ExecutorConfig,
    ListProperty, Operation, Payload, PayloadKind, PoolConfig, PoolError, Property,
    PropertyBinding, RequestExecutor, RequestLink, RequestObject, RequestPool, Vec3,
    PAYLOAD_SLOTS,
};

const ALPHA: CorrelationId = CorrelationId::new(1);
const POSITION: CorrelationId = CorrelationId::new(2);
const LAYERS: CorrelationId = CorrelationId::new(3);

struct Node {
    alpha: Property<f32>,
    position: Property<Vec3>,
    layers: ListProperty<String>,
}

impl Destination for Node {
    fn dispatch(&self, request: &RequestObject) -> DispatchOutcome {
        dispatch_to(request, &[&self.alpha, &self.position, &self.layers])
    }
}

struct Harness {
    pool: Arc<RequestPool>,
    link: RequestLink,
    executor: RequestExecutor,
}

fn harness(preload: usize) -> Harness {
    let pool = Arc::new(RequestPool::new(PoolConfig { preload }));
    pool.start();
    let (sender, receiver) = request_channel();
    let link = RequestLink::new(Arc::clone(&pool), sender);
    let executor = RequestExecutor::new(Arc::clone(&pool), receiver, ExecutorConfig::default());
    Harness {
        pool,
        link,
        executor,
    }
}

fn node(link: &RequestLink) -> Arc<Node> {
    Arc::new_cyclic(|weak: &Weak<Node>| {
        let owner: Weak<dyn Destination> = weak.clone();
        let binding = PropertyBinding::new(owner, link.clone());
        Node {
            alpha: Property::new("alpha", ALPHA, &binding, 1.0),
            position: Property::with_default("position", POSITION, &binding),
            layers: ListProperty::new_sorted("layers", LAYERS, &binding, vec!["**ALL**".into()]),
        }
    })
}

#[test]
fn test_pool_accounting_over_many_cycles() {
    let h = harness(3);
    let mut held = Vec::new();

    for _ in 0..5 {
        let request = h.pool.get(Operation::Update).unwrap();
        assert!(!request.is_in_pool());
        held.push(request);
    }
    // Three preloaded plus two grown on demand
    assert_eq!(h.pool.size().unwrap(), 5);

    for request in held.drain(..) {
        h.pool.recycle(request).unwrap();
    }
    for _ in 0..50 {
        let request = h.pool.get(Operation::Update).unwrap();
        h.pool.recycle(request).unwrap();
    }

    let stats = h.pool.stats().unwrap();
    assert_eq!(stats.allocated, 5);
    assert_eq!(stats.available, 5);
    assert_eq!(stats.outstanding, 0);
    assert_eq!(stats.peak_outstanding, 5);
    h.pool.stop().unwrap();
}

#[test]
fn test_reused_request_is_fully_reset() {
    let h = harness(0);
    let node = node(&h.link);
    let target: Weak<dyn Destination> = Arc::downgrade(&node) as Weak<dyn Destination>;

    let mut request = h.pool.get(Operation::ListAppend).unwrap();
    request.set_correlation_id(LAYERS);
    request.set_destination(target);
    for slot in 0..PAYLOAD_SLOTS {
        request.set_payload(slot, Payload::Text(format!("slot{slot}")));
    }
    h.pool.recycle(request).unwrap();

    let request = h.pool.get(Operation::Update).unwrap();
    assert_eq!(request.operation(), Operation::Update);
    assert_eq!(request.correlation_id(), CorrelationId::NONE);
    assert!(!request.destination_alive());
    for slot in 0..PAYLOAD_SLOTS {
        assert_eq!(request.payload(slot), &Payload::Empty);
    }
    h.pool.recycle(request).unwrap();
}

#[test]
fn test_last_write_wins() {
    let h = harness(2);
    let node = node(&h.link);

    for step in 0..10_u8 {
        node.alpha.set(f32::from(step) / 10.0).unwrap();
    }
    assert!((node.alpha.get() - 0.9).abs() < f32::EPSILON);
    assert!((node.alpha.execute_get() - 1.0).abs() < f32::EPSILON);

    let report = h.executor.drain().unwrap();
    assert_eq!(report.consumed, 10);
    assert!((node.alpha.execute_get() - 0.9).abs() < f32::EPSILON);
}

#[test]
fn test_requests_only_touch_their_own_property() {
    let h = harness(4);
    let node = node(&h.link);

    node.position.set(Vec3::new(1.0, 2.0, 3.0)).unwrap();
    h.executor.drain().unwrap();

    assert_eq!(node.position.execute_get(), Vec3::new(1.0, 2.0, 3.0));
    assert!(node.position.changed());
    assert!(!node.alpha.changed());
    assert!(!node.layers.changed());
    assert!((node.alpha.execute_get() - 1.0).abs() < f32::EPSILON);
}

#[test]
fn test_type_mismatch_leaves_value_and_request_intact() {
    let h = harness(1);
    let node = node(&h.link);

    let mut request = h.pool.get(Operation::Update).unwrap();
    request.set_correlation_id(ALPHA);
    request.set_destination(Arc::downgrade(&node) as Weak<dyn Destination>);
    request.set_payload(0, Payload::Text("opaque".into()));

    let outcome = request.apply();
    let DispatchOutcome::Mismatched(err) = outcome else {
        panic!("expected a mismatch, got {outcome:?}");
    };
    assert_eq!(err.expected, PayloadKind::Float);
    assert_eq!(err.found, PayloadKind::Text);
    assert!((node.alpha.execute_get() - 1.0).abs() < f32::EPSILON);
    assert!(!node.alpha.changed());

    h.pool.recycle(request).unwrap();
    assert_eq!(h.pool.stats().unwrap().outstanding, 0);
}

#[test]
fn test_round_trip_reuses_the_same_object() {
    let h = harness(0);
    let node = node(&h.link);

    node.alpha.set(0.25).unwrap();
    let first = h.pool.stats().unwrap();
    assert_eq!(first.allocated, 1);
    assert_eq!(first.outstanding, 1);

    h.executor.drain().unwrap();
    assert!((node.alpha.execute_get() - 0.25).abs() < f32::EPSILON);

    node.alpha.set(0.5).unwrap();
    h.executor.drain().unwrap();

    let stats = h.pool.stats().unwrap();
    assert_eq!(stats.allocated, 1);
    assert_eq!(stats.reused, 1);
    assert_eq!(stats.available, 1);
}

#[test]
fn test_stop_refuses_while_requests_queued() {
    let h = harness(2);
    let node = node(&h.link);

    node.alpha.set(0.1).unwrap();
    assert_eq!(
        h.pool.stop(),
        Err(PoolError::RequestsOutstanding { count: 1 })
    );

    h.executor.drain().unwrap();
    h.pool.stop().unwrap();
    assert_eq!(h.pool.get(Operation::Update).unwrap_err(), PoolError::Uninitialized);
}

#[test]
fn test_control_and_execution_threads() {
    const WRITES: u16 = 2_000;

    let h = harness(8);
    let node = node(&h.link);
    let done = AtomicBool::new(false);

    let applied = thread::scope(|scope| {
        let executor = &h.executor;
        let done = &done;
        let worker = scope.spawn(move || {
            let mut consumed = 0;
            loop {
                let finished = done.load(Ordering::Acquire);
                consumed += executor.drain().unwrap().consumed;
                if finished && executor.pending() == 0 {
                    return consumed;
                }
                thread::yield_now();
            }
        });

        for i in 1..=WRITES {
            node.alpha.set(f32::from(i)).unwrap();
            if i % 100 == 0 {
                node.layers.push(format!("layer{i:04}")).unwrap();
            }
        }
        done.store(true, Ordering::Release);
        worker.join().unwrap()
    });

    assert_eq!(applied, usize::from(WRITES) + 20);
    assert!((node.alpha.execute_get() - f32::from(WRITES)).abs() < f32::EPSILON);
    assert_eq!(node.layers.execute_get(), node.layers.get());
    assert!(node
        .layers
        .execute_with(|layers| layers.windows(2).all(|w| w[0] <= w[1])));

    let stats = h.pool.stats().unwrap();
    assert_eq!(stats.outstanding, 0);
    assert!(stats.allocated <= usize::from(WRITES) + 20);
    h.pool.stop().unwrap();
}

#[test]
#[should_panic(expected = "already destroyed")]
fn test_apply_after_destination_dropped_aborts() {
    let h = harness(1);
    let node = node(&h.link);
    node.alpha.set(0.0).unwrap();
    drop(node);

    let _ = h.executor.drain();
}
