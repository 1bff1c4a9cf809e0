//! A single shared field of the state bus

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, PoisonError, RwLock};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle to one shared value.
///
/// Clones of a field refer to the same value. Reads return a copy of the whole value and writes
/// replace the whole value, so a reader never observes half of a write. A poisoned lock (a writer
/// panicked) is recovered rather than propagated, the value inside is still a complete one.
#[derive(Debug, Default)]
pub struct Field<T>(Arc<RwLock<T>>);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Field(Arc::clone(&self.0))
    }
}

impl<T: Clone> Field<T> {
    pub fn new(value: T) -> Self {
        Field(Arc::new(RwLock::new(value)))
    }

    /// Get a copy of the current value.
    pub fn get(&self) -> T {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    /// Modify the value in place while holding the write lock, returning whatever `f` returns.
    ///
    /// No other reader or writer can interleave with `f`.
    pub fn update<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_default_before_any_write() {
        let f: Field<Option<u8>> = Field::default();
        assert_eq!(f.get(), None);

        let g = f.clone();
        g.set(Some(4));
        assert_eq!(f.get(), Some(4));
    }

    #[test]
    fn test_update_returns_previous() {
        let f = Field::new(Some(7u8));
        let taken = f.update(|v| v.take());
        assert_eq!(taken, Some(7));
        assert_eq!(f.get(), None);
    }

    #[test]
    fn test_no_torn_reads() {
        let f = Field::new([0u64; 8]);
        let writer = f.clone();

        let handle = thread::spawn(move || {
            for i in 0..2000u64 {
                writer.set([i; 8]);
            }
        });

        for _ in 0..2000 {
            let v = f.get();
            assert!(v.iter().all(|&x| x == v[0]), "torn read: {:?}", v);
        }

        handle.join().unwrap();
    }

    #[test]
    fn test_poisoned_field_still_readable() {
        let f = Field::new(3i32);
        let g = f.clone();

        let _ = thread::spawn(move || {
            g.update::<(), _>(|_| panic!("writer died"));
        })
        .join();

        assert_eq!(f.get(), 3);
        f.set(5);
        assert_eq!(f.get(), 5);
    }
}
