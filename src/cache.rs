//! Bounded LRU for decoded elements, one instance per kind. Entries expire
//! after the kind-level TTL; property bindings on a cached element carry
//! their own deadlines. The cache is a hint only: correctness never
//! depends on a hit.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::model::{Element, PropertyValue};

pub(crate) struct ElementCache<T> {
    inner: Mutex<LruCache<String, Entry<T>>>,
    ttl: Duration,
}

struct Entry<T> {
    element: T,
    expires_at: Instant,
}

impl<T: Element + Clone> ElementCache<T> {
    pub fn new(capacity: usize, ttl: Duration) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        })
    }

    pub fn cache(&self, element: T) {
        let mut guard = self.inner.lock();
        guard.put(
            element.id().to_string(),
            Entry {
                element,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn retrieve(&self, id: &str) -> Option<T> {
        let mut guard = self.inner.lock();
        match guard.get(id) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.element.clone()),
            Some(_) => {
                guard.pop(id);
                None
            }
            None => None,
        }
    }

    pub fn remove(&self, id: &str) {
        self.inner.lock().pop(id);
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Re-cache one property on a held element; peers stay untouched.
    pub fn cache_property(&self, id: &str, key: &str, value: PropertyValue, ttl: Option<Duration>) {
        let mut guard = self.inner.lock();
        if let Some(entry) = guard.get_mut(id) {
            entry.element.bag_mut().insert(key, value, ttl);
        }
    }

    pub fn remove_property(&self, id: &str, key: &str) {
        let mut guard = self.inner.lock();
        if let Some(entry) = guard.get_mut(id) {
            entry.element.bag_mut().remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Vertex;

    #[test]
    fn zero_capacity_disables_the_cache() {
        assert!(ElementCache::<Vertex>::new(0, Duration::from_secs(1)).is_none());
    }

    #[test]
    fn lru_evicts_oldest() {
        let cache = ElementCache::new(2, Duration::from_secs(60)).unwrap();
        cache.cache(Vertex::new("a"));
        cache.cache(Vertex::new("b"));
        cache.retrieve("a");
        cache.cache(Vertex::new("c"));
        assert!(cache.retrieve("a").is_some());
        assert!(cache.retrieve("b").is_none());
        assert!(cache.retrieve("c").is_some());
    }

    #[test]
    fn expired_entries_read_as_absent() {
        let cache = ElementCache::new(4, Duration::from_millis(0)).unwrap();
        cache.cache(Vertex::new("a"));
        assert!(cache.retrieve("a").is_none());
    }

    #[test]
    fn property_recache_updates_held_element() {
        let cache = ElementCache::new(4, Duration::from_secs(60)).unwrap();
        cache.cache(Vertex::new("a"));
        cache.cache_property("a", "name", PropertyValue::String("x".into()), None);
        let held = cache.retrieve("a").unwrap();
        assert_eq!(
            held.property("name"),
            Some(&PropertyValue::String("x".into()))
        );
        cache.remove_property("a", "name");
        assert!(cache.retrieve("a").unwrap().property("name").is_none());
    }

    #[test]
    fn per_property_ttl_expires_binding_only() {
        let cache = ElementCache::new(4, Duration::from_secs(60)).unwrap();
        cache.cache(Vertex::new("a"));
        cache.cache_property(
            "a",
            "name",
            PropertyValue::Int(1),
            Some(Duration::from_millis(0)),
        );
        let held = cache.retrieve("a").unwrap();
        assert!(held.property("name").is_none());
    }
}
