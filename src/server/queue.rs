//! Concurrent ready queues (§4.3 `cq`, §4.9 `Qg`/`Qc`).
//!
//! `Qg` is the single global queue of connections that have become readable;
//! workers pull from it directly, generalising the teacher's
//! `Arc<SegQueue<TcpStream>>` accept hand-off in `server/server_impl.rs` from
//! "newly accepted sockets" to "any connection with pending work". `Qc` is a
//! per-connection slot: because a connection can only be driven by one worker
//! at a time, re-queuing it while a worker already holds it must not produce
//! two workers racing the same socket. That's `ReadyFlag`'s job.

use crossbeam::queue::SegQueue;
use std::sync::atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const QUEUED: u8 = 1;
const RUNNING: u8 = 2;
const RUNNING_AGAIN: u8 = 3;

/// Per-connection "is this connection already queued or running" flag.
///
/// Mirrors the teacher's single-writer-at-a-time invariant around
/// `HttpConnection::run` but makes it explicit and atomic so the dispatcher
/// (§4.9) can decide whether a newly-readable connection needs to be pushed
/// onto `Qg` or is already in flight. `RUNNING_AGAIN` covers the case where a
/// connection becomes readable again while a worker is still draining it —
/// the readiness edge isn't lost, it's deferred to `finish_running`.
pub(crate) struct ReadyFlag(AtomicU8);

impl ReadyFlag {
    pub(crate) const fn new() -> Self {
        ReadyFlag(AtomicU8::new(IDLE))
    }

    /// Called when the connection becomes readable. Returns `true` if the
    /// caller is now responsible for pushing it onto `Qg` (it was idle),
    /// `false` if some other wakeup already claimed that responsibility or a
    /// worker is currently running it (the edge is remembered instead).
    pub(crate) fn mark_ready(&self) -> bool {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let next = match current {
                IDLE => QUEUED,
                RUNNING => RUNNING_AGAIN,
                QUEUED | RUNNING_AGAIN => return false,
                _ => unreachable!("ReadyFlag in an impossible state"),
            };

            match self.0.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return current == IDLE,
                Err(observed) => current = observed,
            }
        }
    }

    /// Called by the worker that pops this connection off `Qg`, just before
    /// running it.
    pub(crate) fn mark_running(&self) {
        self.0.store(RUNNING, Ordering::Release);
    }

    /// Called once the worker finishes a pass over the connection. Returns
    /// `true` if the connection went ready again while it was running (so it
    /// must be re-queued immediately instead of going idle).
    pub(crate) fn finish_running(&self) -> bool {
        match self.0.compare_exchange(
            RUNNING,
            IDLE,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => false,
            Err(_) => {
                self.0.store(QUEUED, Ordering::Release);
                true
            }
        }
    }
}

impl Default for ReadyFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// The global ready queue (`Qg`): any connection identifier with pending work
/// lands here exactly once per readiness edge, per [`ReadyFlag`].
pub(crate) struct GlobalQueue<T> {
    queue: SegQueue<T>,
}

impl<T> GlobalQueue<T> {
    pub(crate) fn new() -> Self {
        GlobalQueue { queue: SegQueue::new() }
    }

    pub(crate) fn push(&self, item: T) {
        self.queue.push(item);
    }

    pub(crate) fn pop(&self) -> Option<T> {
        self.queue.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<T> Default for GlobalQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_flag_single_claim() {
        let flag = ReadyFlag::new();

        assert!(flag.mark_ready());
        assert!(!flag.mark_ready());

        flag.mark_running();
        assert!(!flag.finish_running());
    }

    #[test]
    fn ready_flag_requeue_while_running() {
        let flag = ReadyFlag::new();

        assert!(flag.mark_ready());
        flag.mark_running();
        assert!(flag.mark_ready());

        assert!(flag.finish_running());
    }

    #[test]
    fn global_queue_fifo() {
        let q: GlobalQueue<u32> = GlobalQueue::new();
        q.push(1);
        q.push(2);

        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), None);
    }
}
