//! Insertion sort over a 1-dimensional view.

use ndarray::ArrayViewMut1;

/// Sorts `v` using insertion sort, which is *O*(*n*^2) worst-case.
///
/// Element movement is swap-based, so a comparison panicking halfway through
/// leaves `v` permuted but with its multiset of elements intact.
pub fn insertion_sort<A>(mut v: ArrayViewMut1<'_, A>)
where
	A: Ord,
{
	for i in 1..v.len() {
		// Shift the tail element left until its predecessor is not greater.
		let mut j = i;
		while j > 0 && v[j] < v[j - 1] {
			v.swap(j, j - 1);
			j -= 1;
		}
	}
}
