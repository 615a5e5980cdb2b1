//! Thread-local object pool (§4.10).
//!
//! Generalises the teacher's `HttpConnection::reset`/`ConnectionData::reset`
//! convention (see `server/connection.rs`) to anything poolable: rather than
//! allocating scratch buffers fresh per use, each worker thread keeps its own
//! free list and hands a reset instance back out. No `Arc`/lock is needed
//! because the list never leaves the thread that owns it.

use std::cell::RefCell;

/// A type whose instances can be reused instead of reallocated.
///
/// `reset` restores the instance to the state `new` would have produced,
/// without freeing its backing allocation — the whole point of pooling.
pub(crate) trait Poolable {
    fn new() -> Self;
    fn reset(&mut self);
}

/// A handle to a pooled value. Returns the value to its thread-local free
/// list on drop instead of deallocating it.
pub(crate) struct Pooled<T: Poolable + 'static> {
    value: Option<T>,
    free_list: &'static std::thread::LocalKey<RefCell<Vec<T>>>,
}

impl<T: Poolable + 'static> Pooled<T> {
    pub(crate) fn get(&self) -> &T {
        self.value.as_ref().expect("Pooled value taken before drop")
    }

    pub(crate) fn get_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("Pooled value taken before drop")
    }
}

impl<T: Poolable + 'static> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(mut value) = self.value.take() {
            value.reset();
            self.free_list.with(|list| list.borrow_mut().push(value));
        }
    }
}

/// Declares a thread-local free list for `$ty` and a `$name()` accessor that
/// pops a reset instance off it (or builds a fresh one when the list is
/// empty). One macro invocation per poolable type, matching the teacher's
/// one-limits-struct-per-resource style of repetition rather than a single
/// type-erased pool.
macro_rules! thread_local_pool {
    ($name:ident, $ty:ty, $list:ident) => {
        thread_local! {
            static $list: std::cell::RefCell<Vec<$ty>> = const { std::cell::RefCell::new(Vec::new()) };
        }

        pub(crate) fn $name() -> Pooled<$ty> {
            let value = $list.with(|list| list.borrow_mut().pop());
            Pooled {
                value: Some(value.unwrap_or_else(<$ty as Poolable>::new)),
                free_list: &$list,
            }
        }
    };
}

pub(crate) use thread_local_pool;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Scratch {
        data: Vec<u8>,
        touched: bool,
    }

    impl Poolable for Scratch {
        fn new() -> Self {
            Scratch { data: Vec::with_capacity(64), touched: false }
        }

        fn reset(&mut self) {
            self.data.clear();
            self.touched = false;
        }
    }

    thread_local_pool!(scratch, Scratch, SCRATCH_POOL);

    #[test]
    fn reused_after_drop_keeps_capacity() {
        {
            let mut pooled = scratch();
            pooled.get_mut().data.extend_from_slice(b"hello world");
            pooled.get_mut().touched = true;
            assert!(pooled.get().data.capacity() >= 11);
        }

        let pooled = scratch();
        assert!(pooled.get().data.is_empty());
        assert!(!pooled.get().touched);
        assert!(pooled.get().data.capacity() >= 11);
    }
}
