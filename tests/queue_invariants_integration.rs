//! Integration tests for queue accounting and backpressure behavior
//!
//! These tests drive queues built from edge descriptors the way the runtime
//! does, and check the accounting identity
//! `pushed == popped + dropped + full + len` over arbitrary operation
//! sequences.

mod common;

use common::builders::EdgeBuilder;
use edgeflow::edge::EdgeKind;
use edgeflow::queue::{BoundedQueue, EdgeQueue, QueueError};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
enum Op {
    Push(u32),
    Pop,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u32>().prop_map(Op::Push),
        1 => Just(Op::Pop),
    ]
}

fn policy_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("block"),
        Just("dropOldest"),
        Just("dropNewest"),
        Just("shuntOldest"),
        Just("shuntNewest"),
        Just("somethingElse"),
    ]
}

proptest! {
    #[test]
    fn prop_counters_balance(
        lifo in any::<bool>(),
        max in 0usize..8,
        policy in policy_strategy(),
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let kind = if lifo { EdgeKind::Lifo } else { EdgeKind::Fifo };
        let edge = EdgeBuilder::new("Prop", 1).kind(kind).capacity(0, max).backpressure(policy).build();
        let queue = EdgeQueue::<u32>::from_descriptor(&edge).unwrap();

        for op in ops {
            match op {
                Op::Push(v) => {
                    let res = queue.push(v);
                    if let Err(e) = res {
                        prop_assert_eq!(policy, "block");
                        prop_assert!(e.is_full());
                    }
                }
                Op::Pop => {
                    queue.pop();
                }
            }
            if max > 0 {
                prop_assert!(queue.len() <= max);
            }
            let snap = queue.snapshot();
            prop_assert!(snap.is_balanced(), "unbalanced: {:?}", snap);
        }
    }

    #[test]
    fn prop_unbounded_never_drops(values in prop::collection::vec(any::<u16>(), 0..300)) {
        let edge = EdgeBuilder::new("Wide", 1).backpressure("dropNewest").build();
        let queue = EdgeQueue::<u16>::from_descriptor(&edge).unwrap();
        for v in &values {
            prop_assert!(queue.push(*v).is_ok());
        }
        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        prop_assert_eq!(drained, values);
        prop_assert_eq!(queue.counters().dropped, 0);
    }
}

#[test]
fn test_block_rejects_and_counts_full() {
    let edge = EdgeBuilder::new("Block", 1).capacity(0, 3).build();
    let queue = EdgeQueue::<u32>::from_descriptor(&edge).unwrap();
    for v in 1..=3 {
        queue.push(v).unwrap();
    }

    let err = queue.push(4).unwrap_err();
    assert_eq!(err, QueueError::Full { capacity: 3 });
    assert_eq!(queue.counters().full, 1);
    assert_eq!(queue.len(), 3);
}

#[test]
fn test_drop_oldest_fifo_and_lifo_order() {
    let fifo = EdgeBuilder::new("F", 1).capacity(0, 3).backpressure("dropOldest").build();
    let lifo = EdgeBuilder::new("L", 1)
        .kind(EdgeKind::Lifo)
        .capacity(0, 3)
        .backpressure("dropOldest")
        .build();
    let fifo = EdgeQueue::<u32>::from_descriptor(&fifo).unwrap();
    let lifo = EdgeQueue::<u32>::from_descriptor(&lifo).unwrap();

    for v in 1..=4 {
        fifo.push(v).unwrap();
        lifo.push(v).unwrap();
    }

    assert_eq!(fifo.counters().dropped, 1);
    assert_eq!(lifo.counters().dropped, 1);
    let fifo_order: Vec<_> = std::iter::from_fn(|| fifo.pop()).collect();
    let lifo_order: Vec<_> = std::iter::from_fn(|| lifo.pop()).collect();
    assert_eq!(fifo_order, vec![2, 3, 4]);
    assert_eq!(lifo_order, vec![4, 3, 2]);
}

#[test]
fn test_drop_newest_keeps_first_values() {
    let edge = EdgeBuilder::new("N", 1).capacity(0, 2).backpressure("shuntNewest").build();
    let queue = EdgeQueue::<u32>::from_descriptor(&edge).unwrap();
    queue.push(1).unwrap();
    queue.push(2).unwrap();
    queue.push(3).unwrap();

    assert_eq!(queue.counters().dropped, 1);
    assert_eq!(queue.pop(), Some(1));
    assert_eq!(queue.pop(), Some(2));
    assert_eq!(queue.pop(), None);
}

#[test]
fn test_contended_lifo_balances() {
    let edge = EdgeBuilder::new("Busy", 1)
        .kind(EdgeKind::Lifo)
        .capacity(0, 8)
        .build();
    let queue = Arc::new(EdgeQueue::<usize>::from_descriptor(&edge).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..1000 {
                    let _ = queue.push(t * 1000 + i);
                    if i % 3 == 0 {
                        queue.pop();
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let snap = queue.snapshot();
    assert!(snap.is_balanced(), "unbalanced: {:?}", snap);
    assert_eq!(snap.counters.pushed, 4000);
    assert!(snap.len <= 8);
}
