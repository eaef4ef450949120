//! A small cached config object safe to read concurrently and cheap to
//! swap wholesale when settings change — readers never block each other
//! or the writer, they just keep whatever snapshot was current at the
//! moment they called `current()`.

use std::sync::{Arc, RwLock};

pub struct RuntimeConfigCache<T> {
    current: RwLock<Arc<T>>,
}

impl<T> RuntimeConfigCache<T> {
    pub fn new(initial: T) -> Self {
        Self { current: RwLock::new(Arc::new(initial)) }
    }

    /// Cheap `Arc` clone of whatever snapshot is current right now.
    pub fn current(&self) -> Arc<T> {
        self.current.read().expect("runtime config cache poisoned").clone()
    }

    /// Install a new snapshot, invalidating the old one for future readers.
    /// Readers already holding the old `Arc` keep it until they drop it.
    pub fn replace(&self, next: T) {
        *self.current.write().expect("runtime config cache poisoned") = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_is_visible_to_the_next_read() {
        let cache = RuntimeConfigCache::new(1_u32);
        assert_eq!(*cache.current(), 1);
        cache.replace(2);
        assert_eq!(*cache.current(), 2);
    }

    #[test]
    fn a_snapshot_taken_before_replace_is_unaffected() {
        let cache = RuntimeConfigCache::new(vec![1, 2, 3]);
        let snapshot = cache.current();
        cache.replace(vec![9]);
        assert_eq!(*snapshot, vec![1, 2, 3]);
        assert_eq!(*cache.current(), vec![9]);
    }
}
