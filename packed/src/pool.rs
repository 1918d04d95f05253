//! Object pooling for recycled message buffers.
//!
//! Messages that carry heap allocations (value lists, strings) are recycled
//! through a [`Pool`] instead of being dropped after every send tick. The
//! pool owns freed items outright; ownership transfers back to the caller on
//! [`Pool::acquire`].

/// A value that can be recycled through a [`Pool`].
pub trait Poolable {
    /// Restores the value to its pristine state before reuse.
    ///
    /// Implementations should clear contents but keep capacity, since
    /// retained capacity is the point of pooling.
    fn reset(&mut self);
}

/// A free list of recycled values.
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
}

impl<T: Poolable + Default> Pool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self { free: Vec::new() }
    }

    /// Takes a recycled value, or constructs a fresh one if none is free.
    pub fn acquire(&mut self) -> T {
        self.free.pop().unwrap_or_default()
    }

    /// Returns a value to the pool after resetting it.
    pub fn release(&mut self, mut item: T) {
        item.reset();
        self.free.push(item);
    }

    /// Number of values currently available for reuse.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

impl<T: Poolable + Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Eq)]
    struct Buf {
        data: Vec<u8>,
    }

    impl Poolable for Buf {
        fn reset(&mut self) {
            self.data.clear();
        }
    }

    #[test]
    fn acquire_from_empty_pool_constructs() {
        let mut pool: Pool<Buf> = Pool::new();
        let item = pool.acquire();
        assert!(item.data.is_empty());
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn release_resets_and_recycles() {
        let mut pool: Pool<Buf> = Pool::new();
        let mut item = pool.acquire();
        item.data.extend_from_slice(&[1, 2, 3]);
        let capacity = item.data.capacity();
        pool.release(item);
        assert_eq!(pool.free_count(), 1);

        let recycled = pool.acquire();
        assert!(recycled.data.is_empty());
        assert!(recycled.data.capacity() >= capacity);
        assert_eq!(pool.free_count(), 0);
    }
}
