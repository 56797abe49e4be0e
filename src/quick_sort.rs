//! Derivative work of [`core::slice::sort`] licensed under `MIT OR Apache-2.0`.
//!
//! [`core::slice::sort`]: https://doc.rust-lang.org/src/core/slice/sort.rs.html

use crate::{heap_sort::heap_sort, insertion_sort::insertion_sort, partition::partition_at_last};
use ndarray::{ArrayViewMut1, Axis};

/// Sorts `v` using introsort, which is *O*(*n* \* log(*n*)) worst-case.
///
/// Quicksort with the same single-pass partition the pool workers use, an
/// insertion sort for very short views, and a heapsort fallback once the
/// partition depth budget is exhausted.
pub fn quick_sort<A>(v: ArrayViewMut1<'_, A>)
where
	A: Ord,
{
	// Limit the number of partitions to `2 * (floor(log2(len)) + 1)`.
	let limit = 2 * (usize::BITS - v.len().leading_zeros());

	recurse(v, limit);
}

/// Sorts `v` recursively.
///
/// `limit` is the number of allowed partitions before switching to `heap_sort`. If zero,
/// this function will immediately switch to heapsort.
fn recurse<A>(mut v: ArrayViewMut1<'_, A>, mut limit: u32)
where
	A: Ord,
{
	// Slices of up to this length get sorted using insertion sort.
	const MAX_INSERTION: usize = 20;

	loop {
		// Very short slices get sorted using insertion sort.
		if v.len() <= MAX_INSERTION {
			if v.len() >= 2 {
				insertion_sort(v);
			}
			return;
		}

		// If too many imbalanced partitions accumulated, simply fall back to heapsort in
		// order to guarantee `O(n * log(n))` worst-case.
		if limit == 0 {
			heap_sort(v);
			return;
		}
		limit -= 1;

		// Partition the slice and split off the pivot, now at its sorted position.
		let mid = partition_at_last(&mut v);
		let (left, rest) = v.split_at(Axis(0), mid);
		let (_pivot, right) = rest.split_at(Axis(0), 1);

		// Recurse into the shorter side only in order to minimize the total number of
		// recursive calls and consume less stack space. Then just continue with the longer
		// side (this is akin to tail recursion).
		if left.len() < right.len() {
			recurse(left, limit);
			v = right;
		} else {
			recurse(right, limit);
			v = left;
		}
	}
}
