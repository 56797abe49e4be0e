//! Pool configuration and the sorting engine.

use crate::par::queue::TaskQueue;
use crate::par::tracker::CompletionTracker;
use crate::par::worker::{self, Task};
use crate::partition::is_sorted;
use ndarray::ArrayViewMut1;
use std::num::NonZeroUsize;
use std::sync::atomic::AtomicUsize;
use std::thread;
use std::time::Instant;
use tracing::{debug, warn};

/// Window length at and below which workers hand a task to the sequential
/// sort instead of partitioning further.
pub const DEFAULT_THRESHOLD: usize = 1000;

/// A cooperative pool of sort workers.
///
/// Each [`sort`](Self::sort) invocation seeds a task queue with the whole
/// view, runs a fixed number of worker threads that repeatedly pull a window,
/// partition it back into the queue or sort it sequentially, and blocks the
/// caller until an atomic count of outstanding windows returns to zero. The
/// workers of an invocation are joined before `sort` returns, so the pool is
/// plain configuration and freely reusable.
///
/// # Examples
///
/// ```
/// use ndarray_pool_sort::{ndarray::arr1, SortPool};
///
/// let pool = SortPool::new(4);
/// let mut v = arr1(&[-5, 4, 1, -3, 2]);
///
/// pool.sort(v.view_mut());
/// assert!(v == arr1(&[-5, -3, 1, 2, 4]));
/// ```
#[derive(Debug, Clone)]
pub struct SortPool {
	workers: NonZeroUsize,
	threshold: usize,
	queue_capacity: Option<NonZeroUsize>,
}

impl SortPool {
	/// Creates a pool of `workers` worker threads per sort invocation, with
	/// the default sequential threshold and an unbounded task queue.
	///
	/// # Panics
	///
	/// Panics when `workers` is zero.
	#[must_use]
	pub fn new(workers: usize) -> Self {
		let workers = NonZeroUsize::new(workers).expect("worker count must be positive");
		Self {
			workers,
			threshold: DEFAULT_THRESHOLD,
			queue_capacity: None,
		}
	}

	/// Sets the window length at and below which workers stop subdividing
	/// and sort sequentially.
	///
	/// Zero subdivides all the way down to single elements, maximizing
	/// fan-out at maximal queue traffic.
	#[must_use]
	pub fn with_threshold(mut self, threshold: usize) -> Self {
		self.threshold = threshold;
		self
	}

	/// Bounds the task queue to `capacity` windows, applying backpressure to
	/// the workers producing subtasks: a worker whose child window does not
	/// fit absorbs it inline instead of parking on a queue that only the
	/// parked workers themselves could drain.
	///
	/// # Panics
	///
	/// Panics when `capacity` is zero.
	#[must_use]
	pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).expect("queue capacity must be positive");
		self.queue_capacity = Some(capacity);
		self
	}

	/// Sorts `v` in place, blocking until complete.
	///
	/// Views of fewer than two elements, and views already in non-decreasing
	/// order, return immediately without starting any worker. On return all
	/// workers of this invocation have stopped and been joined.
	pub fn sort<A>(&self, v: ArrayViewMut1<'_, A>)
	where
		A: Ord + Send,
	{
		let len = v.len();
		if len < 2 {
			return;
		}
		if is_sorted(v.view()) {
			debug!(len, "input already sorted");
			return;
		}

		let started = Instant::now();
		let queue = TaskQueue::new(self.queue_capacity);
		let tracker = CompletionTracker::new();
		let faults = AtomicUsize::new(0);
		debug!(
			len,
			workers = self.workers.get(),
			threshold = self.threshold,
			"pool sort started"
		);
		thread::scope(|s| {
			// Seed with the whole view; the count precedes visibility.
			tracker.record_spawned(1);
			if queue
				.push(Task {
					view: v,
					offset: 0,
					depth: 0,
				})
				.is_err()
			{
				tracker.record_finished();
			}
			let (queue, tracker, faults) = (&queue, &tracker, &faults);
			let threshold = self.threshold;
			for id in 0..self.workers.get() {
				s.spawn(move || worker::run(id, queue, tracker, threshold, faults));
			}
			// The single suspension point of the calling thread.
			tracker.wait();
			debug!(
				outstanding = tracker.outstanding(),
				drained = queue.is_empty(),
				"completion detected"
			);
			queue.close();
		});
		let faults = faults.into_inner();
		if faults > 0 {
			warn!(
				faults,
				elapsed_ms = started.elapsed().as_millis() as u64,
				"pool sort completed with contained faults"
			);
		} else {
			debug!(
				elapsed_ms = started.elapsed().as_millis() as u64,
				"pool sort complete"
			);
		}
	}
}

impl Default for SortPool {
	/// One worker per available hardware thread, the default threshold, and
	/// an unbounded task queue.
	fn default() -> Self {
		Self {
			workers: thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
			threshold: DEFAULT_THRESHOLD,
			queue_capacity: None,
		}
	}
}

#[cfg(test)]
mod test {
	use super::SortPool;
	use crate::partition::is_sorted;
	use crate::quick_sort::quick_sort;
	use ndarray::{Array1, arr1, s};
	use quickcheck_macros::quickcheck;
	use rand::rngs::StdRng;
	use rand::seq::SliceRandom;
	use rand::{Rng, SeedableRng};
	use std::cmp::Ordering;
	use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

	fn seeded(len: usize, seed: u64) -> Vec<u32> {
		let mut rng = StdRng::seed_from_u64(seed);
		(0..len).map(|_| rng.random()).collect()
	}

	#[quickcheck]
	fn sorts_like_std(xs: Vec<i32>, workers: u8) {
		let workers = usize::from(workers % 4) + 1;
		let mut sorted = xs.clone();
		sorted.sort_unstable();
		let sorted = Array1::from_vec(sorted);
		let mut array = Array1::from_vec(xs);
		// A small threshold forces the partitioning path even on short input.
		SortPool::new(workers).with_threshold(8).sort(array.view_mut());
		assert_eq!(array, sorted);
	}

	#[test]
	fn empty() {
		let mut array = Array1::<i32>::from_vec(Vec::new());
		SortPool::new(2).sort(array.view_mut());
		assert_eq!(array.len(), 0);
	}

	#[test]
	fn single() {
		let mut array = arr1(&[42]);
		SortPool::new(2).sort(array.view_mut());
		assert_eq!(array, arr1(&[42]));
	}

	#[test]
	fn all_equal() {
		let mut array = arr1(&[5, 5, 5, 5, 5]);
		SortPool::new(2).sort(array.view_mut());
		assert_eq!(array, arr1(&[5, 5, 5, 5, 5]));
	}

	#[test]
	fn already_sorted_is_identity() {
		let mut array = arr1(&[1, 2, 3, 4, 5]);
		SortPool::new(2).sort(array.view_mut());
		assert_eq!(array, arr1(&[1, 2, 3, 4, 5]));
		SortPool::new(2).sort(array.view_mut());
		assert_eq!(array, arr1(&[1, 2, 3, 4, 5]));
	}

	#[test]
	fn permutation_identical_across_worker_counts() {
		let mut rng = StdRng::seed_from_u64(42);
		let mut xs: Vec<u32> = (0..100_000).collect();
		xs.shuffle(&mut rng);
		let expected = Array1::from_vec((0..100_000u32).collect());

		let mut one = Array1::from_vec(xs.clone());
		SortPool::new(1).sort(one.view_mut());
		let mut four = Array1::from_vec(xs);
		SortPool::new(4).sort(four.view_mut());

		assert_eq!(one, expected);
		assert_eq!(four, expected);
	}

	#[test]
	fn matches_sequential_collaborator() {
		let xs = seeded(200_000, 7);
		let mut sequential = Array1::from_vec(xs.clone());
		quick_sort(sequential.view_mut());
		let mut pooled = Array1::from_vec(xs);
		SortPool::new(5).sort(pooled.view_mut());
		assert_eq!(pooled, sequential);
	}

	#[test]
	fn worker_matrix_terminates() {
		for workers in [1, 2, 4, 5] {
			let mut array = Array1::from_vec(seeded(1_000_000, 11));
			SortPool::new(workers).sort(array.view_mut());
			assert!(is_sorted(array.view()), "workers = {workers}");
		}
	}

	#[test]
	fn ten_million_terminates() {
		let mut array = Array1::from_vec(seeded(10_000_000, 13));
		SortPool::new(4).sort(array.view_mut());
		assert!(is_sorted(array.view()));
	}

	#[test]
	fn huge_threshold_degenerates_to_sequential() {
		let mut array = Array1::from_vec(seeded(50_000, 17));
		SortPool::new(4).with_threshold(usize::MAX).sort(array.view_mut());
		assert!(is_sorted(array.view()));
	}

	#[test]
	fn zero_threshold_maximizes_fanout() {
		let mut array = Array1::from_vec(seeded(20_000, 19));
		SortPool::new(4).with_threshold(0).sort(array.view_mut());
		assert!(is_sorted(array.view()));
	}

	#[test]
	fn bounded_queue_terminates_under_backpressure() {
		let mut array = Array1::from_vec(seeded(100_000, 23));
		SortPool::new(4)
			.with_threshold(16)
			.with_queue_capacity(2)
			.sort(array.view_mut());
		assert!(is_sorted(array.view()));
	}

	#[test]
	fn duplicate_heavy_input() {
		let mut rng = StdRng::seed_from_u64(29);
		let xs: Vec<u32> = (0..100_000).map(|_| rng.random_range(0..10)).collect();
		let mut sorted = xs.clone();
		sorted.sort_unstable();
		let mut array = Array1::from_vec(xs);
		SortPool::new(4).sort(array.view_mut());
		assert_eq!(array, Array1::from_vec(sorted));
	}

	#[test]
	fn non_contiguous_view() {
		// Even positions hold the payload, odd positions a marker that must
		// survive sorting the stride-2 subview untouched.
		let payload = seeded(20_001, 31);
		let mut xs = Vec::with_capacity(payload.len() * 2 - 1);
		for x in &payload {
			xs.push(*x);
			xs.push(7);
		}
		xs.pop();
		let mut array = Array1::from_vec(xs);
		SortPool::new(4).sort(array.slice_mut(s![..;2]));

		let mut sorted = payload;
		sorted.sort_unstable();
		assert_eq!(array.slice(s![..;2]), Array1::from_vec(sorted));
		assert!(array.slice(s![1..;2]).iter().all(|x| *x == 7));
	}

	/// Wraps `u32` with a comparison that panics once, deep into the sort.
	#[derive(Debug, Clone, PartialEq, Eq)]
	struct FaultyOrd(u32);

	static COMPARISONS: AtomicUsize = AtomicUsize::new(0);
	const PANIC_AT: usize = 100_000;

	impl PartialOrd for FaultyOrd {
		fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
			Some(self.cmp(other))
		}
	}

	impl Ord for FaultyOrd {
		fn cmp(&self, other: &Self) -> Ordering {
			if COMPARISONS.fetch_add(1, AtomicOrdering::Relaxed) + 1 == PANIC_AT {
				panic!("injected comparison fault");
			}
			self.0.cmp(&other.0)
		}
	}

	#[test]
	fn contained_fault_neither_wedges_nor_loses_elements() {
		tracing_subscriber::fmt().with_test_writer().try_init().ok();
		let payload = seeded(50_000, 37);
		let mut array = Array1::from_vec(payload.iter().copied().map(FaultyOrd).collect());

		// Must terminate despite the panicking comparison in some worker.
		SortPool::new(4).sort(array.view_mut());

		// The faulted window may be unsorted, but no element is lost.
		let mut recovered: Vec<u32> = array.iter().map(|x| x.0).collect();
		recovered.sort_unstable();
		let mut expected = payload;
		expected.sort_unstable();
		assert_eq!(recovered, expected);
	}
}
