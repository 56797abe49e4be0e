//! Worker loop: pull a task, sort or partition it, account its completion.

use crate::par::queue::TaskQueue;
use crate::par::tracker::CompletionTracker;
use crate::partition::partition_at_last;
use crate::quick_sort::quick_sort;
use ndarray::{ArrayViewMut1, Axis};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, debug_span, error, trace};

/// One sort subtask: exclusive ownership of a contiguous window into the
/// array being sorted.
///
/// Tasks are carved out of their parent with `split_at`, so the windows of
/// all tasks simultaneously queued or in flight are non-overlapping by
/// construction — concurrent in-place partitioning needs no further locking.
/// `offset` and `depth` locate the window in the original array for
/// diagnostics; they carry no sorting semantics.
#[derive(Debug)]
pub struct Task<'a, A> {
	/// The window to sort.
	pub view: ArrayViewMut1<'a, A>,
	/// Index of the window's first element in the original array.
	pub offset: usize,
	/// Number of partitions between the seed task and this one.
	pub depth: u32,
}

/// A contained failure while processing one task.
///
/// The affected window may be left unsorted, but its elements are only ever
/// moved by swaps, so the array's multiset is intact and sibling tasks are
/// unaffected.
#[derive(Debug, Error)]
#[error("panic while sorting {len} elements at offset {offset}: {message}")]
pub struct TaskFault {
	offset: usize,
	len: usize,
	message: String,
}

/// Runs one worker until the queue is closed and drained.
///
/// Every dequeued task is accounted as finished exactly once, fault or not,
/// so a misbehaving element type cannot wedge the completion count.
pub fn run<A>(
	id: usize,
	queue: &TaskQueue<Task<'_, A>>,
	tracker: &CompletionTracker,
	threshold: usize,
	faults: &AtomicUsize,
) where
	A: Ord,
{
	let span = debug_span!("worker", id);
	let _entered = span.enter();
	debug!("worker started");
	while let Some(task) = queue.pop() {
		trace!(
			offset = task.offset,
			len = task.view.len(),
			depth = task.depth,
			"task dequeued"
		);
		if let Err(fault) = process(task, queue, tracker, threshold) {
			faults.fetch_add(1, Ordering::Relaxed);
			error!(%fault, "task failed, window left unsorted");
		}
		tracker.record_finished();
	}
	debug!("worker stopped");
}

/// Processes one dequeued task, containing any panic as a [`TaskFault`].
fn process<'a, A>(
	task: Task<'a, A>,
	queue: &TaskQueue<Task<'a, A>>,
	tracker: &CompletionTracker,
	threshold: usize,
) -> Result<(), TaskFault>
where
	A: Ord,
{
	let Task { view, offset, depth } = task;
	let len = view.len();
	panic::catch_unwind(AssertUnwindSafe(|| {
		sort_range(view, offset, depth, queue, tracker, threshold)
	}))
	.map_err(|payload| TaskFault {
		offset,
		len,
		message: panic_message(payload),
	})
}

/// Sorts one window: sequentially below the threshold, otherwise by
/// partitioning and spawning the children back into the queue.
///
/// A child the queue cannot accept is absorbed inline: recursion descends
/// only into the shorter half and iteration continues with the longer, so
/// stack depth stays logarithmic even under sustained backpressure.
fn sort_range<'a, A>(
	mut view: ArrayViewMut1<'a, A>,
	mut offset: usize,
	mut depth: u32,
	queue: &TaskQueue<Task<'a, A>>,
	tracker: &CompletionTracker,
	threshold: usize,
) where
	A: Ord,
{
	loop {
		let len = view.len();
		if len < 2 {
			// Degenerate window; nothing to sort. Such tasks are never
			// enqueued, so this only guards the inline path.
			return;
		}
		if len <= threshold {
			trace!(offset, len, depth, "sorting sequentially");
			quick_sort(view);
			return;
		}

		let mid = partition_at_last(&mut view);
		trace!(offset, len, depth, pivot = offset + mid, "partitioned");
		let (left, rest) = view.split_at(Axis(0), mid);
		let (_pivot, right) = rest.split_at(Axis(0), 1);
		let left = Task {
			view: left,
			offset,
			depth: depth + 1,
		};
		let right = Task {
			view: right,
			offset: offset + mid + 1,
			depth: depth + 1,
		};

		let (short, long) = if left.view.len() <= right.view.len() {
			(left, right)
		} else {
			(right, left)
		};
		match (spawn(short, queue, tracker), spawn(long, queue, tracker)) {
			(None, None) => return,
			(Some(task), None) | (None, Some(task)) => {
				view = task.view;
				offset = task.offset;
				depth = task.depth;
			}
			(Some(short), Some(long)) => {
				sort_range(short.view, short.offset, short.depth, queue, tracker, threshold);
				view = long.view;
				offset = long.offset;
				depth = long.depth;
			}
		}
	}
}

/// Accounts for and enqueues `child`.
///
/// The count is incremented before the child becomes visible to any worker.
/// When the queue hands the child back (bounded variant at capacity, or
/// closed), the increment is backed out and the child is returned for inline
/// processing as part of the current task's unit of work. Windows of fewer
/// than two elements are already in place: neither enqueued nor counted.
fn spawn<'a, A>(
	child: Task<'a, A>,
	queue: &TaskQueue<Task<'a, A>>,
	tracker: &CompletionTracker,
) -> Option<Task<'a, A>> {
	if child.view.len() < 2 {
		return None;
	}
	tracker.record_spawned(1);
	match queue.try_push(child) {
		Ok(()) => None,
		Err(child) => {
			tracker.record_finished();
			trace!(
				offset = child.offset,
				len = child.view.len(),
				"queue cannot accept child, absorbing inline"
			);
			Some(child)
		}
	}
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
	match payload.downcast::<String>() {
		Ok(message) => *message,
		Err(payload) => match payload.downcast::<&'static str>() {
			Ok(message) => (*message).to_string(),
			Err(_) => "opaque panic payload".to_string(),
		},
	}
}
