//! Blocking FIFO queue distributing sort tasks across pool workers.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// A first-in-first-out task queue with blocking producer/consumer semantics
/// and an explicit closed state for graceful drain-and-stop.
///
/// Closing replaces the classic poison-pill shutdown: instead of flooding the
/// queue with one out-of-band sentinel per consumer, [`close`](Self::close)
/// transitions the queue itself, waking every parked thread. Consumers drain
/// whatever is still queued and then observe `None`; producers get their task
/// handed back.
///
/// [`len`](Self::len) and [`is_empty`](Self::is_empty) are momentarily
/// consistent diagnostics. They must never drive control flow, which under
/// concurrent access would race; completion is the tracker's job.
#[derive(Debug)]
pub struct TaskQueue<T> {
	inner: Mutex<Inner<T>>,
	not_empty: Condvar,
	not_full: Condvar,
	capacity: Option<NonZeroUsize>,
}

#[derive(Debug)]
struct Inner<T> {
	tasks: VecDeque<T>,
	closed: bool,
}

impl<T> TaskQueue<T> {
	/// Creates an open queue, bounded to `capacity` tasks if given.
	pub fn new(capacity: Option<NonZeroUsize>) -> Self {
		Self {
			inner: Mutex::new(Inner {
				tasks: VecDeque::new(),
				closed: false,
			}),
			not_empty: Condvar::new(),
			not_full: Condvar::new(),
			capacity,
		}
	}

	/// Appends `task`, blocking while the queue is at capacity.
	///
	/// Wakes one blocked [`pop`](Self::pop). Returns the task back via `Err`
	/// once the queue is closed.
	pub fn push(&self, task: T) -> Result<(), T> {
		let mut inner = self.lock();
		loop {
			if inner.closed {
				return Err(task);
			}
			match self.capacity {
				Some(capacity) if inner.tasks.len() >= capacity.get() => {
					inner = self.wait_not_full(inner);
				}
				_ => break,
			}
		}
		inner.tasks.push_back(task);
		drop(inner);
		self.not_empty.notify_one();
		Ok(())
	}

	/// Appends `task` without blocking.
	///
	/// Returns the task back via `Err` when the queue is at capacity or
	/// closed; the caller decides how to absorb the backpressure.
	pub fn try_push(&self, task: T) -> Result<(), T> {
		let mut inner = self.lock();
		let full = self
			.capacity
			.is_some_and(|capacity| inner.tasks.len() >= capacity.get());
		if inner.closed || full {
			return Err(task);
		}
		inner.tasks.push_back(task);
		drop(inner);
		self.not_empty.notify_one();
		Ok(())
	}

	/// Removes and returns the oldest task, blocking while the queue is empty.
	///
	/// Wakes one blocked [`push`](Self::push) in the bounded variant. Returns
	/// `None` once the queue is closed and drained.
	pub fn pop(&self) -> Option<T> {
		let mut inner = self.lock();
		loop {
			if let Some(task) = inner.tasks.pop_front() {
				drop(inner);
				if self.capacity.is_some() {
					self.not_full.notify_one();
				}
				return Some(task);
			}
			if inner.closed {
				return None;
			}
			inner = self.wait_not_empty(inner);
		}
	}

	/// Closes the queue, waking all parked producers and consumers.
	///
	/// Idempotent. Queued tasks are still handed out to consumers.
	pub fn close(&self) {
		let mut inner = self.lock();
		inner.closed = true;
		let pending = inner.tasks.len();
		drop(inner);
		trace!(pending, "task queue closed");
		self.not_empty.notify_all();
		self.not_full.notify_all();
	}

	/// Whether the queue was empty at some recent instant. Diagnostics only.
	pub fn is_empty(&self) -> bool {
		self.lock().tasks.is_empty()
	}

	// Poisoning is recovered rather than propagated: worker panics are already
	// contained per task, and a queue that stops working would strand every
	// parked thread.
	fn lock(&self) -> MutexGuard<'_, Inner<T>> {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn wait_not_empty<'a>(&self, inner: MutexGuard<'a, Inner<T>>) -> MutexGuard<'a, Inner<T>> {
		self.not_empty
			.wait(inner)
			.unwrap_or_else(PoisonError::into_inner)
	}

	fn wait_not_full<'a>(&self, inner: MutexGuard<'a, Inner<T>>) -> MutexGuard<'a, Inner<T>> {
		self.not_full
			.wait(inner)
			.unwrap_or_else(PoisonError::into_inner)
	}
}

#[cfg(test)]
mod test {
	use super::TaskQueue;
	use std::num::NonZeroUsize;
	use std::thread;

	#[test]
	fn fifo_order() {
		let queue = TaskQueue::new(None);
		for task in 0..3 {
			assert_eq!(queue.push(task), Ok(()));
		}
		assert_eq!(queue.pop(), Some(0));
		assert_eq!(queue.pop(), Some(1));
		assert_eq!(queue.pop(), Some(2));
	}

	#[test]
	fn pop_blocks_until_push() {
		let queue = TaskQueue::new(None);
		thread::scope(|s| {
			let popper = s.spawn(|| queue.pop());
			s.spawn(|| queue.push(7)).join().unwrap().unwrap();
			assert_eq!(popper.join().unwrap(), Some(7));
		});
	}

	#[test]
	fn close_drains_then_stops() {
		let queue = TaskQueue::new(None);
		queue.push(1).unwrap();
		queue.push(2).unwrap();
		queue.close();
		assert_eq!(queue.pop(), Some(1));
		assert_eq!(queue.pop(), Some(2));
		assert_eq!(queue.pop(), None);
		assert_eq!(queue.pop(), None);
	}

	#[test]
	fn close_rejects_producers() {
		let queue = TaskQueue::new(None);
		queue.close();
		assert_eq!(queue.push(9), Err(9));
		assert_eq!(queue.try_push(9), Err(9));
	}

	#[test]
	fn close_wakes_blocked_consumers() {
		let queue = TaskQueue::<u32>::new(None);
		thread::scope(|s| {
			let consumers = [s.spawn(|| queue.pop()), s.spawn(|| queue.pop())];
			queue.close();
			for consumer in consumers {
				assert_eq!(consumer.join().unwrap(), None);
			}
		});
	}

	#[test]
	fn bounded_push_blocks_until_pop() {
		let queue = TaskQueue::new(NonZeroUsize::new(1));
		thread::scope(|s| {
			let producer = s.spawn(|| {
				queue.push(1).unwrap();
				queue.push(2).unwrap();
			});
			assert_eq!(queue.pop(), Some(1));
			assert_eq!(queue.pop(), Some(2));
			producer.join().unwrap();
		});
	}

	#[test]
	fn bounded_try_push_reports_full() {
		let queue = TaskQueue::new(NonZeroUsize::new(2));
		assert_eq!(queue.try_push(1), Ok(()));
		assert_eq!(queue.try_push(2), Ok(()));
		assert_eq!(queue.try_push(3), Err(3));
		assert_eq!(queue.pop(), Some(1));
		assert_eq!(queue.try_push(3), Ok(()));
	}
}
