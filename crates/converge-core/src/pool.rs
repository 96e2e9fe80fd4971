//! Shared, reference-counted backend values
//!
//! Backend clients (admin connections, HTTP clients) are expensive to create
//! and shared by name across extensions. A [`SharedPool`] creates each value
//! lazily on first acquisition and disposes of it when the last [`Lease`]
//! is dropped. Acquisition and release happen under a single lock.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Disposer<T> = Box<dyn Fn(&str, &T) + Send + Sync>;

struct Slot<T> {
    value: Arc<T>,
    leases: usize,
}

struct Inner<T> {
    slots: Mutex<HashMap<String, Slot<T>>>,
    disposer: Option<Disposer<T>>,
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Named values shared between leases.
pub struct SharedPool<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SharedPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedPool<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                disposer: None,
            }),
        }
    }

    /// A pool that calls `disposer` when a value's last lease is released.
    pub fn with_disposer(disposer: impl Fn(&str, &T) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                disposer: Some(Box::new(disposer)),
            }),
        }
    }

    /// Lease the value named `name`, creating it with `create` if absent.
    ///
    /// `create` runs under the pool lock; a failure leaves the pool unchanged.
    pub fn acquire<E>(
        &self,
        name: &str,
        create: impl FnOnce() -> Result<T, E>,
    ) -> Result<Lease<T>, E> {
        let mut slots = self.inner.lock();
        let value = match slots.get_mut(name) {
            Some(slot) => {
                slot.leases += 1;
                Arc::clone(&slot.value)
            }
            None => {
                let value = Arc::new(create()?);
                slots.insert(
                    name.to_string(),
                    Slot {
                        value: Arc::clone(&value),
                        leases: 1,
                    },
                );
                tracing::debug!(name, "Created shared value");
                value
            }
        };

        Ok(Lease {
            name: name.to_string(),
            value,
            pool: Arc::clone(&self.inner),
        })
    }

    /// Number of live leases on `name`.
    pub fn lease_count(&self, name: &str) -> usize {
        self.inner.lock().get(name).map_or(0, |slot| slot.leases)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl<T> fmt::Debug for SharedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.inner.lock();
        let mut names: Vec<&String> = slots.keys().collect();
        names.sort();
        f.debug_struct("SharedPool").field("names", &names).finish()
    }
}

/// A live reference to a pooled value. Released on drop.
pub struct Lease<T> {
    name: String,
    value: Arc<T>,
    pool: Arc<Inner<T>>,
}

impl<T> Lease<T> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Deref for Lease<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> Drop for Lease<T> {
    fn drop(&mut self) {
        let released = {
            let mut slots = self.pool.lock();
            let last = match slots.get_mut(&self.name) {
                Some(slot) => {
                    slot.leases = slot.leases.saturating_sub(1);
                    slot.leases == 0
                }
                None => false,
            };
            if last { slots.remove(&self.name) } else { None }
        };

        if let Some(slot) = released {
            tracing::debug!(name = %self.name, "Disposing shared value");
            if let Some(disposer) = &self.pool.disposer {
                disposer(&self.name, &slot.value);
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Lease<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}
