//! Cooperative thread-pool quicksort for non-contiguous (sub)views into
//! *n*-dimensional arrays.
//!
//! A fixed pool of worker threads cooperatively processes a dynamically
//! growing and shrinking set of sort subtasks: every partition step hands the
//! resulting subviews back to a shared blocking task queue, an atomic count
//! of outstanding windows detects global completion without a coordinator
//! polling state, and closing the queue shuts every worker down race-free.
//! Windows below a configurable threshold are sorted sequentially, where
//! parallel overhead would dominate.
//!
//! # Example
//!
//! ```
//! use ndarray_pool_sort::{ndarray::arr1, PoolSort1Ext, SortPool};
//!
//! let mut v = arr1(&[-5, 4, 1, -3, 2]);
//!
//! // One worker per available hardware thread.
//! v.pool_sort_unstable();
//! assert!(v == arr1(&[-5, -3, 1, 2, 4]));
//!
//! // Or a pinned configuration, freely reusable across sorts.
//! let pool = SortPool::new(2).with_threshold(500);
//! let mut v = arr1(&[8, 3, 2, 4, 8]);
//! v.pool_sort_unstable_in(&pool);
//! assert!(v == arr1(&[2, 3, 4, 8, 8]));
//! ```
//!
//! Like the slice-algorithm crates it follows, sorting is implemented for
//! mutable 1-dimensional (sub)views of arbitrary memory layout, e.g., a
//! non-contiguous column of a row-major 2-dimensional array:
//!
//! ```
//! use ndarray_pool_sort::{ndarray::arr2, PoolSort1Ext};
//!
//! let mut v = arr2(&[[3, 9], [2, 0], [1, 5]]);
//! let mut column = v.column_mut(0);
//! assert_eq!(column.as_slice_mut(), None);
//!
//! column.pool_sort_unstable();
//! assert!(v == arr2(&[[1, 9], [2, 0], [3, 5]]));
//! ```
//!
//! # Concurrency Model
//!
//! All simultaneously queued or in-flight tasks own non-overlapping subviews
//! carved out of their parent with `split_at`, so workers partition the
//! shared array in place without any per-element locking. The task queue and
//! the outstanding-window count are the only synchronized structures, and
//! all blocking is condition-variable based; idle workers consume no CPU.
//! Workers live for exactly one [`SortPool::sort`] invocation and are joined
//! before it returns.
//!
//! # Diagnostics
//!
//! Worker lifecycle and sort summaries are emitted at debug level and
//! task-grained events at trace level via [`tracing`]; a contained worker
//! fault is reported at error level. This side channel is not part of the
//! sorting contract.

#![deny(
	missing_docs,
	rustdoc::broken_intra_doc_links,
	rustdoc::missing_crate_level_docs
)]

mod heap_sort;
mod insertion_sort;
mod par;
mod partition;
mod quick_sort;

use crate::{partition::is_sorted, quick_sort::quick_sort};
use ndarray::{ArrayBase, Data, DataMut, Ix1};

pub use ndarray;
pub use par::pool::{DEFAULT_THRESHOLD, SortPool};

/// Extension trait for 1-dimensional [`ArrayBase<S, Ix1>`](`ArrayBase`) array
/// or (sub)view with arbitrary memory layout (e.g., non-contiguous) providing
/// pool-based and sequential sorting in the natural order of the element
/// type.
pub trait PoolSort1Ext<A, S>
where
	S: Data<Elem = A>,
{
	/// Sorts the array on a cooperative worker pool, but might not preserve
	/// the order of equal elements.
	///
	/// This sort is unstable (i.e., may reorder equal elements), in-place
	/// (i.e., does not allocate element storage), and blocks the caller until
	/// complete. Equivalent to [`pool_sort_unstable_in`] with a default
	/// [`SortPool`]: one worker per available hardware thread, the
	/// [`DEFAULT_THRESHOLD`] sequential cutoff, and an unbounded task queue.
	///
	/// [`pool_sort_unstable_in`]: PoolSort1Ext::pool_sort_unstable_in
	///
	/// # Examples
	///
	/// ```
	/// use ndarray_pool_sort::{ndarray::arr1, PoolSort1Ext};
	///
	/// let mut v = arr1(&[-5, 4, 1, -3, 2]);
	///
	/// v.pool_sort_unstable();
	/// assert!(v == arr1(&[-5, -3, 1, 2, 4]));
	/// ```
	fn pool_sort_unstable(&mut self)
	where
		A: Ord + Send,
		S: DataMut;
	/// Sorts the array on `pool`, but might not preserve the order of equal
	/// elements.
	///
	/// This sort is unstable (i.e., may reorder equal elements), in-place
	/// (i.e., does not allocate element storage), and blocks the caller until
	/// complete. The pool's workers exist for exactly this invocation and
	/// are joined before this method returns; the pool itself is reusable
	/// configuration.
	///
	/// # Examples
	///
	/// ```
	/// use ndarray_pool_sort::{ndarray::arr1, PoolSort1Ext, SortPool};
	///
	/// let pool = SortPool::new(2);
	/// let mut v = arr1(&[5, 4, 1, 3, 2]);
	///
	/// v.pool_sort_unstable_in(&pool);
	/// assert!(v == arr1(&[1, 2, 3, 4, 5]));
	/// ```
	fn pool_sort_unstable_in(&mut self, pool: &SortPool)
	where
		A: Ord + Send,
		S: DataMut;
	/// Sorts the array sequentially, but might not preserve the order of
	/// equal elements.
	///
	/// This sort is unstable (i.e., may reorder equal elements), in-place
	/// (i.e., does not allocate), and *O*(*n* \* log(*n*)) worst-case. It is
	/// the same introsort the pool workers fall back to for windows at or
	/// below the threshold, exposed for baselines and small inputs.
	///
	/// # Examples
	///
	/// ```
	/// use ndarray_pool_sort::{ndarray::arr1, PoolSort1Ext};
	///
	/// let mut v = arr1(&[-5, 4, 1, -3, 2]);
	///
	/// v.sort_unstable();
	/// assert!(v == arr1(&[-5, -3, 1, 2, 4]));
	/// ```
	fn sort_unstable(&mut self)
	where
		A: Ord,
		S: DataMut;
	/// Checks if the elements of this array are sorted in non-decreasing
	/// order.
	///
	/// Incomparable adjacent elements make this function return `false`, so
	/// arrays with NaN-like elements are never reported as sorted.
	///
	/// # Examples
	///
	/// ```
	/// use ndarray_pool_sort::{ndarray::arr1, PoolSort1Ext};
	///
	/// let empty: [i32; 0] = [];
	///
	/// assert!(arr1(&[1, 2, 2, 9]).is_sorted());
	/// assert!(!arr1(&[1, 3, 2, 4]).is_sorted());
	/// assert!(arr1(&[0]).is_sorted());
	/// assert!(arr1(&empty).is_sorted());
	/// assert!(!arr1(&[0.0, 1.0, f32::NAN]).is_sorted());
	/// ```
	#[must_use]
	fn is_sorted(&self) -> bool
	where
		A: PartialOrd;
}

impl<A, S> PoolSort1Ext<A, S> for ArrayBase<S, Ix1>
where
	S: Data<Elem = A>,
{
	fn pool_sort_unstable(&mut self)
	where
		A: Ord + Send,
		S: DataMut,
	{
		SortPool::default().sort(self.view_mut());
	}

	fn pool_sort_unstable_in(&mut self, pool: &SortPool)
	where
		A: Ord + Send,
		S: DataMut,
	{
		pool.sort(self.view_mut());
	}

	fn sort_unstable(&mut self)
	where
		A: Ord,
		S: DataMut,
	{
		quick_sort(self.view_mut());
	}

	fn is_sorted(&self) -> bool
	where
		A: PartialOrd,
	{
		is_sorted(self.view())
	}
}
