// Ref integration tests.
//
// Invariants exercised:
// - Exactly-once free: the payload is dropped once, after the last handle.
// - Nil reads raise NilDereference through the panic channel.
// - Counts stay consistent under concurrent clone/drop.
// - WeakRef does not keep a payload alive and breaks cycles.
use parking_lot::Mutex;
use rt_core::{recover, Ref, RuntimeError, WeakRef};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

// Test: clone/drop sequences free the payload exactly once.
// Assumes: drop_ref on a nil handle is a no-op.
// Verifies: the drop counter moves only when the last handle goes.
#[test]
fn payload_freed_exactly_once() {
    let drops = Arc::new(AtomicUsize::new(0));
    let mut a = Ref::new(DropCounter(drops.clone()));
    let mut b = a.clone();
    let c = b.clone();
    assert_eq!(a.count(), 3);

    a.drop_ref();
    a.drop_ref();
    b.drop_ref();
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    assert_eq!(c.count(), 1);

    drop(c);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

// Test: reading through a released handle.
// Verifies: the error kind and message match the runtime wording.
#[test]
fn read_after_release_is_nil_dereference() {
    let mut r = Ref::new(10);
    r.drop_ref();
    let err = recover(|| *r + 1).unwrap_err();
    assert_eq!(err, RuntimeError::NilDereference);
    assert_eq!(
        err.to_string(),
        "invalid memory address or nil pointer dereference"
    );
}

// Test: handles cloned and dropped on many threads.
// Verifies: only the original handle remains and the payload is intact.
#[test]
fn concurrent_clone_and_drop() {
    let drops = Arc::new(AtomicUsize::new(0));
    let root = Ref::new(DropCounter(drops.clone()));
    std::thread::scope(|s| {
        for _ in 0..8 {
            let local = root.clone();
            s.spawn(move || {
                let mut held = Vec::new();
                for _ in 0..200 {
                    held.push(local.clone());
                }
                held.clear();
            });
        }
    });
    assert_eq!(root.count(), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    drop(root);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

struct Node {
    parent: Mutex<WeakRef<Node>>,
    children: Mutex<Vec<Ref<Node>>>,
    _tag: DropCounter,
}

// Test: parent/child graph with weak back edges.
// Verifies: dropping the root frees every node; the weak edge reads nil.
#[test]
fn weak_back_edges_do_not_leak() {
    let drops = Arc::new(AtomicUsize::new(0));
    let root = Ref::new(Node {
        parent: Mutex::new(WeakRef::nil()),
        children: Mutex::new(Vec::new()),
        _tag: DropCounter(drops.clone()),
    });
    let child = Ref::new(Node {
        parent: Mutex::new(root.downgrade()),
        children: Mutex::new(Vec::new()),
        _tag: DropCounter(drops.clone()),
    });
    root.children.lock().push(child.clone());
    assert!(child.parent.lock().upgrade().ptr_eq(&root));

    drop(root);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert!(child.parent.lock().upgrade().is_nil());
    drop(child);
    assert_eq!(drops.load(Ordering::SeqCst), 2);
}
