//! Cooperative thread-pool machinery.
//!
//! A [`pool::SortPool`] invocation wires three parts together: the blocking
//! FIFO [`queue::TaskQueue`] distributing windows to workers, the
//! [`tracker::CompletionTracker`] detecting global completion without any
//! thread polling queue state, and the [`worker`] loop partitioning windows
//! back into the queue until they are small enough to sort sequentially.

pub mod pool;
pub mod queue;
pub mod tracker;
pub mod worker;
