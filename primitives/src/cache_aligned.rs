//! Cache-line alignment guard to prevent false sharing.

/// Cache line size targeted by this core; false-sharing avoidance is tuned
/// to this value across every primitive.
pub const CACHE_LINE_SIZE: usize = 64;

/// Wraps `T` so it starts on a cache-line boundary and its footprint is a
/// whole multiple of [`CACHE_LINE_SIZE`] — the Rust compiler always pads a
/// type's size to a multiple of its alignment, so `repr(align(64))` alone
/// is sufficient to keep two adjacent `CacheAligned` fields on separate
/// lines.
#[repr(align(64))]
pub struct CacheAligned<T>(T);

impl<T> CacheAligned<T> {
    /// Wrap a value.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Unwrap, consuming the guard.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> std::ops::DerefMut for CacheAligned<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Default> Default for CacheAligned<T> {
    fn default() -> Self {
        Self(T::default())
    }
}
