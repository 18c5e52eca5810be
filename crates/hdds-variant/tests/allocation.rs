// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Inline/boxed threshold observed through a counting global allocator.
//
// Allocations are counted per thread so the test harness' own threads do not
// disturb the numbers.

use hdds_variant::config::INLINE_CAPACITY;
use hdds_variant::{Value, Variant};
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

struct CountingAlloc;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // try_with: the TLS slot may already be gone during thread teardown.
        let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn allocations_during(f: impl FnOnce()) -> usize {
    let before = ALLOCATIONS.with(Cell::get);
    f();
    ALLOCATIONS.with(Cell::get) - before
}

#[derive(Clone)]
struct AtThreshold([u8; INLINE_CAPACITY]);
impl Value for AtThreshold {}

#[derive(Clone)]
struct OverThreshold([u8; INLINE_CAPACITY + 1]);
impl Value for OverThreshold {}

#[test]
fn threshold_boundary_allocation() {
    // First use builds and interns the dispatch tables; keep that out of the count.
    drop(Variant::new(AtThreshold([0; INLINE_CAPACITY])));
    drop(Variant::new(OverThreshold([0; INLINE_CAPACITY + 1])));
    drop(Variant::new(0u64));

    let at = AtThreshold([7; INLINE_CAPACITY]);
    let inline = allocations_during(|| {
        let v = Variant::new(at);
        let copy = v.clone();
        assert!(copy.is_inline());
    });
    assert_eq!(inline, 0, "payload of {} bytes must stay inline", INLINE_CAPACITY);

    let over = OverThreshold([7; INLINE_CAPACITY + 1]);
    let boxed = allocations_during(|| {
        let v = Variant::new(over.clone());
        assert!(!v.is_inline());
    });
    assert_eq!(boxed, 1, "payload one byte over the threshold must be boxed");

    // Aliases never allocate, whatever the payload size.
    let aliased = allocations_during(|| {
        let a = Variant::alias(&over);
        let b = a.clone();
        assert_eq!(a, b);
    });
    assert_eq!(aliased, 0);

    let small = allocations_during(|| {
        let mut v = Variant::new(1u64);
        v.set(2u64);
        assert_eq!(v.take::<u64>().ok(), Some(2));
    });
    assert_eq!(small, 0);
}
