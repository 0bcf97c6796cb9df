use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique id, never reused.
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// An injected capability tagged with a unique id.
///
/// Clones share the id. Cache fingerprints use the id, so replacing a
/// capability always changes the fingerprint even if the allocator hands
/// the new one the old address.
pub struct Capability<T: ?Sized> {
    id: u64,
    inner: Arc<T>,
}

impl<T: ?Sized> Capability<T> {
    pub fn new(inner: Arc<T>) -> Self {
        Self { id: next_id(), inner }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn shared(&self) -> Arc<T> {
        Arc::clone(&self.inner)
    }
}

impl<T: ?Sized> Clone for Capability<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> Deref for Capability<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: ?Sized> From<Arc<T>> for Capability<T> {
    fn from(inner: Arc<T>) -> Self {
        Self::new(inner)
    }
}

impl<T: ?Sized> fmt::Debug for Capability<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability").field("id", &self.id).finish_non_exhaustive()
    }
}
