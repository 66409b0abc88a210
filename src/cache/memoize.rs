//! Memoization Module
//!
//! Function-result caching on top of `TieredCache`.
//!
//! A call is identified by a `CallKey`: the function's qualified name, its
//! positional arguments in order and its keyword arguments sorted by name.
//! When the memoizer knows the function's parameter names, positional
//! arguments are bound to them first, so `f(1, b=2)` and `f(b=2, a=1)` are
//! the same call. The canonical string is hashed with SHA-256, so keyword
//! order never changes the key and every key has the same length.
//!
//! Concurrent misses for the same key may both run the function; there is
//! no in-flight de-duplication.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::runtime::Handle;
use tracing::warn;

use crate::cache::TieredCache;

/// Prefix used when a memoizer is not given one.
pub const DEFAULT_KEY_PREFIX: &str = "memo";

// == Call Key ==
/// Deterministic identity of one function call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallKey {
    function: String,
    params: Vec<String>,
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
    uncacheable: bool,
}

impl CallKey {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            params: Vec::new(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
            uncacheable: false,
        }
    }

    /// Declares the function's parameter names in order. Positional
    /// arguments bind to them before hashing.
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a positional argument.
    pub fn arg<A: Serialize + ?Sized>(mut self, value: &A) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.args.push(value),
            Err(e) => self.mark_uncacheable(&e),
        }
        self
    }

    /// Adds a keyword argument; insertion order is irrelevant.
    pub fn kwarg<A: Serialize + ?Sized>(mut self, name: &str, value: &A) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.kwargs.insert(name.to_string(), value);
            }
            Err(e) => self.mark_uncacheable(&e),
        }
        self
    }

    // An argument we cannot render would collide with other calls, so the
    // call bypasses the cache entirely.
    fn mark_uncacheable(&mut self, error: &serde_json::Error) {
        warn!(function = %self.function, error = %error, "Argument not serializable, call will not be cached");
        self.uncacheable = true;
    }

    pub fn is_cacheable(&self) -> bool {
        !self.uncacheable
    }

    /// Stable textual form: `function|[unbound args]|{sorted bound args}`.
    ///
    /// Positional argument `i` is bound to parameter `i`; positional
    /// arguments beyond the declared parameters stay positional.
    pub fn canonical(&self) -> String {
        let mut bound = self.kwargs.clone();
        let mut unbound = Vec::new();

        for (i, value) in self.args.iter().enumerate() {
            match self.params.get(i) {
                Some(name) => {
                    bound.insert(name.clone(), value.clone());
                }
                None => unbound.push(value.clone()),
            }
        }

        format!(
            "{}|{}|{}",
            self.function,
            Value::Array(unbound),
            serde_json::to_string(&bound).unwrap_or_default()
        )
    }

    /// Hex SHA-256 of the canonical form (64 characters).
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.canonical().as_bytes()))
    }

    /// Cache key under `prefix`, defaulting to `memo`.
    pub fn cache_key(&self, prefix: Option<&str>) -> String {
        format!("{}:{}", prefix.unwrap_or(DEFAULT_KEY_PREFIX), self.digest())
    }
}

// == Memoizer ==
/// Caches results of one function in a `TieredCache`.
///
/// `call` always returns a future. `call_blocking` always runs synchronously
/// on the captured runtime handle and must not be used from async code.
#[derive(Clone)]
pub struct Memoizer {
    cache: TieredCache,
    function: String,
    params: Vec<String>,
    ttl: Option<Duration>,
    key_prefix: Option<String>,
    runtime: Option<Handle>,
}

impl Memoizer {
    pub fn new(cache: TieredCache, function: impl Into<String>) -> Self {
        Self {
            cache,
            function: function.into(),
            params: Vec::new(),
            ttl: None,
            key_prefix: None,
            runtime: Handle::try_current().ok(),
        }
    }

    /// TTL for stored results; the cache default applies otherwise.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Parameter names of the memoized function, in declaration order.
    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Runtime used by `call_blocking`.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Starts a key for a call of this memoizer's function.
    pub fn args(&self) -> CallKey {
        CallKey::new(self.function.clone()).with_params(self.params.clone())
    }

    pub fn cache_key(&self, call: &CallKey) -> String {
        call.cache_key(self.key_prefix.as_deref())
    }

    /// Returns the cached result for `call` or awaits `f` and caches it.
    pub async fn call<T, F, Fut>(&self, call: CallKey, f: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !call.is_cacheable() {
            return f().await;
        }
        let key = self.cache_key(&call);
        self.cache.get_or_compute(&key, self.ttl, f).await
    }

    /// Fallible variant of `call`; errors are passed through, not cached.
    pub async fn try_call<T, E, F, Fut>(&self, call: CallKey, f: F) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if !call.is_cacheable() {
            return f().await;
        }
        let key = self.cache_key(&call);
        self.cache.try_get_or_compute(&key, self.ttl, f).await
    }

    /// Synchronous variant of `call`.
    ///
    /// Blocks the current thread on the captured runtime. Without a runtime
    /// handle the function simply runs uncached.
    ///
    /// # Panics
    /// Panics if called from within an asynchronous execution context.
    pub fn call_blocking<T, F>(&self, call: CallKey, f: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        match &self.runtime {
            Some(handle) => handle.block_on(self.call(call, || async move { f() })),
            None => {
                warn!(function = %self.function, "No runtime available, running uncached");
                f()
            }
        }
    }
}
