//! Shared state for the multi-threaded engines.
//!
//! Each structure here is written by exactly one worker and only read by
//! the others through narrow queries.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::geometry::Position;

/// Cooperative, one-way stop signal.
///
/// Once cancelled it stays cancelled. Reads are relaxed: seeing the flag one
/// step late only costs a wasted step.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns a guard that cancels the token when dropped, including on panic.
    pub fn cancel_on_drop(&self) -> CancelOnDrop<'_> {
        CancelOnDrop(self)
    }
}

pub struct CancelOnDrop<'a>(&'a CancelToken);

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// A counter of free worker slots.
#[derive(Debug)]
pub struct Credits {
    free: AtomicUsize,
}

impl Credits {
    pub fn new(free: usize) -> Self {
        Self {
            free: AtomicUsize::new(free),
        }
    }

    /// Takes one slot if any is free. The slot comes back when the returned
    /// guard drops.
    pub fn try_acquire(&self) -> Option<Credit<'_>> {
        let taken = self
            .free
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |free| {
                free.checked_sub(1)
            });
        taken.ok().map(|_| Credit(self))
    }

    pub fn available(&self) -> usize {
        self.free.load(Ordering::Acquire)
    }
}

/// One reserved worker slot.
pub struct Credit<'a>(&'a Credits);

impl Drop for Credit<'_> {
    fn drop(&mut self) {
        self.0.free.fetch_add(1, Ordering::AcqRel);
    }
}

struct PathInner {
    list: Vec<Position>,
    members: FxHashSet<Position>,
    frozen: bool,
}

/// A search path whose list and membership set change together.
///
/// Only the owning worker pushes and pops. Any thread may ask whether a
/// position is on the path; the query that finds a hit freezes the path in
/// the same critical section, so the shared position stays put until the
/// paths are merged.
pub struct SharedPath {
    inner: Mutex<PathInner>,
}

impl SharedPath {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(PathInner {
                list: Vec::with_capacity(capacity),
                members: FxHashSet::with_capacity_and_hasher(capacity, Default::default()),
                frozen: false,
            }),
        }
    }

    /// Appends a position. Returns false if the path is frozen.
    pub fn push(&self, position: Position) -> bool {
        let mut inner = self.inner.lock();
        if inner.frozen {
            return false;
        }
        inner.list.push(position);
        inner.members.insert(position);
        true
    }

    /// Drops the last position. Returns false if the path is frozen or empty.
    pub fn pop(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.frozen {
            return false;
        }
        match inner.list.pop() {
            Some(position) => {
                inner.members.remove(&position);
                true
            }
            None => false,
        }
    }

    /// Freezes the path if it contains `position`, and reports whether it did.
    pub fn freeze_if_contains(&self, position: Position) -> bool {
        let mut inner = self.inner.lock();
        let hit = inner.members.contains(&position);
        if hit {
            inner.frozen = true;
        }
        hit
    }

    /// Consumes the path once every worker has been joined.
    pub fn into_parts(self) -> (Vec<Position>, FxHashSet<Position>) {
        let inner = self.inner.into_inner();
        (inner.list, inner.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    impl SharedPath {
        fn contains(&self, position: Position) -> bool {
            self.inner.lock().members.contains(&position)
        }

        fn len(&self) -> usize {
            self.inner.lock().list.len()
        }
    }

    #[test]
    fn test_cancel_is_monotonic() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_on_drop() {
        let token = CancelToken::new();
        {
            let _guard = token.cancel_on_drop();
            assert!(!token.is_cancelled());
        }
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_credits_are_bounded() {
        let credits = Credits::new(2);
        let first = credits.try_acquire();
        let second = credits.try_acquire();
        assert!(first.is_some() && second.is_some());
        assert!(credits.try_acquire().is_none());
        drop(first);
        assert_eq!(credits.available(), 1);
        assert!(credits.try_acquire().is_some());
        drop(second);
        assert_eq!(credits.available(), 2);
    }

    #[test]
    fn test_path_list_and_set_stay_in_step() {
        let path = SharedPath::with_capacity(4);
        assert!(path.push(p(0, 0)));
        assert!(path.push(p(1, 0)));
        assert!(path.contains(p(1, 0)));
        assert!(path.pop());
        assert!(!path.contains(p(1, 0)));
        assert_eq!(path.len(), 1);

        let (list, members) = path.into_parts();
        assert_eq!(list, vec![p(0, 0)]);
        assert_eq!(members.len(), 1);
    }

    #[test]
    fn test_hit_freezes_path() {
        let path = SharedPath::with_capacity(4);
        path.push(p(0, 0));
        path.push(p(0, 1));

        assert!(!path.freeze_if_contains(p(5, 5)));
        assert!(path.push(p(0, 2)));

        assert!(path.freeze_if_contains(p(0, 1)));
        assert!(!path.push(p(0, 3)));
        assert!(!path.pop());
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_concurrent_queries_see_consistent_state() {
        let path = SharedPath::with_capacity(1024);
        let done = CancelToken::new();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                let _finish = done.cancel_on_drop();
                for i in 0..1000 {
                    path.push(p(i, 0));
                    if i % 3 == 0 {
                        path.pop();
                    }
                }
            });
            scope.spawn(|| {
                while !done.is_cancelled() {
                    let _ = path.contains(p(0, 0));
                }
            });
        });
        let (list, members) = path.into_parts();
        assert_eq!(list.len(), members.len());
        assert!(list.iter().all(|position| members.contains(position)));
    }
}
