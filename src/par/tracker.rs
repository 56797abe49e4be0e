//! Outstanding-work accounting and completion signaling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

/// Atomic count of spawned-but-unfinished tasks plus a one-shot latch that
/// fires when the count returns to zero.
///
/// The count is incremented *before* the corresponding task becomes visible
/// to any worker and decremented only *after* a dequeued task has been fully
/// processed. Under that ordering the count can only reach zero once no task
/// is queued or in flight, so the zero crossing is the sole completion
/// condition — no thread ever polls queue state.
#[derive(Debug)]
pub struct CompletionTracker {
	outstanding: AtomicUsize,
	done: Mutex<bool>,
	latch: Condvar,
}

impl CompletionTracker {
	/// Creates a tracker with no outstanding work and an unfired latch.
	pub fn new() -> Self {
		Self {
			outstanding: AtomicUsize::new(0),
			done: Mutex::new(false),
			latch: Condvar::new(),
		}
	}

	/// Accounts for `count` tasks about to be enqueued.
	///
	/// Must complete before the tasks become visible to any worker; enqueuing
	/// first would let another worker finish all visible work and observe a
	/// false zero while a sibling is still about to appear.
	pub fn record_spawned(&self, count: usize) {
		self.outstanding.fetch_add(count, Ordering::SeqCst);
	}

	/// Accounts for one dequeued task whose processing has completed, firing
	/// the latch if it was the last outstanding one.
	pub fn record_finished(&self) {
		let previous = self.outstanding.fetch_sub(1, Ordering::SeqCst);
		debug_assert!(previous > 0, "completion tracker underflow");
		if previous == 1 {
			let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
			*done = true;
			drop(done);
			self.latch.notify_all();
		}
	}

	/// Blocks until the latch has fired. A fired latch stays fired.
	pub fn wait(&self) {
		let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
		while !*done {
			done = self
				.latch
				.wait(done)
				.unwrap_or_else(PoisonError::into_inner);
		}
	}

	/// Outstanding task count at some recent instant. Diagnostics only.
	pub fn outstanding(&self) -> usize {
		self.outstanding.load(Ordering::SeqCst)
	}
}
