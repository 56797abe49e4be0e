//! Derivative work of [`core::slice::sort`] licensed under `MIT OR Apache-2.0`.
//!
//! [`core::slice::sort`]: https://doc.rust-lang.org/src/core/slice/sort.rs.html

use ndarray::{ArrayViewMut1, s};

/// Sorts `v` using heapsort, which guarantees *O*(*n* \* log(*n*)) worst-case.
#[cold]
pub fn heap_sort<A>(mut v: ArrayViewMut1<'_, A>)
where
	A: Ord,
{
	// This binary heap respects the invariant `parent >= child`.
	fn sift_down<A: Ord>(mut v: ArrayViewMut1<'_, A>, mut node: usize) {
		loop {
			// Children of `node`.
			let mut child = 2 * node + 1;
			if child >= v.len() {
				break;
			}

			// Choose the greater child.
			if child + 1 < v.len() && v[child] < v[child + 1] {
				child += 1;
			}

			// Stop if the invariant holds at `node`.
			if v[child] <= v[node] {
				break;
			}

			// Swap `node` with the greater child, move one step down, and continue sifting.
			v.swap(node, child);
			node = child;
		}
	}

	// Build the heap in linear time.
	for i in (0..v.len() / 2).rev() {
		sift_down(v.view_mut(), i);
	}

	// Pop maximal elements from the heap.
	for i in (1..v.len()).rev() {
		v.swap(0, i);
		sift_down(v.slice_mut(s![..i]), 0);
	}
}
