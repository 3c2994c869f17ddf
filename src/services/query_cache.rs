use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// 按请求参数缓存查询结果，过期后在下一次读取时重新加载
#[derive(Debug)]
pub struct QueryCache<K: Eq + Hash, V> {
    ttl: Duration,
    entries: DashMap<K, (Instant, Arc<V>)>,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let entry = self.entries.get(key)?;
        let (stored_at, value) = entry.value();
        if stored_at.elapsed() < self.ttl {
            Some(Arc::clone(value))
        } else {
            None
        }
    }

    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.insert(key, (Instant::now(), Arc::clone(&value)));
        value
    }

    /// 命中则直接返回，否则调用 `load`；`load` 失败时不写入缓存
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        load: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(hit) = self.get(key) {
            tracing::debug!("query cache hit");
            return Ok(hit);
        }
        let value = load()?;
        self.purge_expired();
        Ok(self.insert(key.clone(), value))
    }

    /// 清掉所有过期条目
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn returns_cached_value_within_ttl() {
        let cache: QueryCache<i32, String> = QueryCache::new(Duration::from_secs(60));
        let calls = Cell::new(0);
        let load = || {
            calls.set(calls.get() + 1);
            Ok::<_, ()>("value".to_string())
        };
        assert_eq!(*cache.get_or_try_insert_with(&1, load).unwrap(), "value");
        assert_eq!(*cache.get_or_try_insert_with(&1, load).unwrap(), "value");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn reloads_after_expiry() {
        let cache: QueryCache<&str, i32> = QueryCache::new(Duration::from_millis(0));
        cache.insert("k", 1);
        assert!(cache.get(&"k").is_none());
        let v = cache.get_or_try_insert_with(&"k", || Ok::<_, ()>(2)).unwrap();
        assert_eq!(*v, 2);
        assert_eq!(cache.len(), 1);
        cache.purge_expired();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let cache: QueryCache<i32, i32> = QueryCache::new(Duration::from_secs(60));
        assert!(cache.get_or_try_insert_with(&7, || Err("db down")).is_err());
        assert!(cache.get(&7).is_none());
        assert_eq!(*cache.get_or_try_insert_with(&7, || Ok::<_, &str>(3)).unwrap(), 3);
    }
}
