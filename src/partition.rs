//! In-place partitioning and sortedness verification shared by the sequential
//! sort and the pool workers.

use core::cmp::Ordering::Greater;
use ndarray::{ArrayView1, ArrayViewMut1};

/// Partitions `v` around its last element, which is *O*(*n*) single-pass.
///
/// Uses the Lomuto scheme: a single left-to-right scan maintains a boundary
/// `i` such that every element left of it compares less than or equal to the
/// pivot. The final swap moves the pivot to `i`, its sorted position, and `i`
/// is returned. Elements equal to the pivot end up on its left side.
///
/// # Panics
///
/// Panics when `v` is empty.
pub fn partition_at_last<A>(v: &mut ArrayViewMut1<'_, A>) -> usize
where
	A: Ord,
{
	let hi = v.len() - 1;
	let mut i = 0;
	for j in 0..hi {
		if v[j] <= v[hi] {
			v.swap(i, j);
			i += 1;
		}
	}
	v.swap(i, hi);
	i
}

/// Checks whether `v` is sorted in non-decreasing order.
///
/// Incomparable adjacent elements make this function return `false`, so a
/// view containing NaN-like elements is never reported as sorted.
#[must_use]
pub fn is_sorted<A>(v: ArrayView1<'_, A>) -> bool
where
	A: PartialOrd,
{
	v.iter()
		.zip(v.iter().skip(1))
		.all(|(a, b)| matches!(a.partial_cmp(b), Some(ordering) if ordering != Greater))
}
