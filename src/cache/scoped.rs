//! Scoped Cache Module
//!
//! A thin view over `TieredCache` that prefixes every key with
//! `tenant:{scope}:` so callers sharing one cache cannot collide.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cache::TieredCache;

#[derive(Clone)]
pub struct ScopedCache {
    cache: TieredCache,
    prefix: String,
}

impl ScopedCache {
    pub fn new(cache: TieredCache, scope: impl AsRef<str>) -> Self {
        Self {
            cache,
            prefix: format!("tenant:{}:", scope.as_ref()),
        }
    }

    /// Full key as stored in the underlying cache.
    pub fn scoped_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.cache.get(&self.scoped_key(key)).await
    }

    pub async fn get_value(&self, key: &str) -> Option<Value> {
        self.cache.get_value(&self.scoped_key(key)).await
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        self.cache.set(&self.scoped_key(key), value, ttl).await
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.cache.delete(&self.scoped_key(key)).await
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.cache.exists(&self.scoped_key(key)).await
    }

    /// Batch read; result keys are returned without the scope prefix.
    pub async fn get_many<T, K>(&self, keys: &[K]) -> HashMap<String, T>
    where
        T: DeserializeOwned,
        K: AsRef<str>,
    {
        let scoped: Vec<String> = keys.iter().map(|k| self.scoped_key(k.as_ref())).collect();
        self.cache
            .get_many(&scoped)
            .await
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(self.prefix.as_str())
                    .map(|unscoped| (unscoped.to_string(), value))
            })
            .collect()
    }

    pub async fn set_many<K, T, I>(&self, items: I, ttl: Option<Duration>) -> bool
    where
        K: AsRef<str>,
        T: Serialize,
        I: IntoIterator<Item = (K, T)>,
    {
        let scoped = items
            .into_iter()
            .map(|(key, value)| (self.scoped_key(key.as_ref()), value));
        self.cache.set_many(scoped, ttl).await
    }

    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, ttl: Option<Duration>, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.cache.get_or_compute(&self.scoped_key(key), ttl, compute).await
    }
}
