//! TTL Quote Cache
//!
//! Injected per router instance, never global. Entries expire `ttl` after
//! insertion; when full, the oldest insertion is evicted first.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use router_core::{Amount, CacheConfig, TradeType};
use routing::{Route, SliceQuote};

use crate::provider::QuoteProvider;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Bounded map with per-entry expiry
pub struct TtlCache<K, V> {
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<K, Entry<V>>,
    /// Insertion order; stale positions are skipped on eviction
    order: VecDeque<(K, Instant)>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl(),
            max_entries: config.max_entries,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Fresh value for `key`. An expired entry is removed.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.max_entries == 0 {
            return;
        }

        let now = Instant::now();
        self.purge_expired(now);
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.max_entries {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        self.order.push_back((key.clone(), now));
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn is_current(&self, key: &K, inserted_at: Instant) -> bool {
        self.entries
            .get(key)
            .map_or(false, |e| e.inserted_at == inserted_at)
    }

    fn purge_expired(&mut self, now: Instant) {
        while let Some((key, inserted_at)) = self.order.front() {
            if now.duration_since(*inserted_at) < self.ttl {
                break;
            }
            if self.is_current(key, *inserted_at) {
                self.entries.remove(key);
            }
            self.order.pop_front();
        }
    }

    fn evict_oldest(&mut self) -> bool {
        while let Some((key, inserted_at)) = self.order.pop_front() {
            if self.is_current(&key, inserted_at) {
                self.entries.remove(&key);
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QuoteKey {
    route: String,
    amounts: Vec<Amount>,
    trade_type: TradeType,
}

/// Serves repeated ladders from a [`TtlCache`]. Only successful ladders with
/// at least one quote are stored.
pub struct CachingQuoteProvider<P> {
    inner: P,
    cache: Mutex<TtlCache<QuoteKey, Vec<Option<SliceQuote>>>>,
}

impl<P: QuoteProvider> CachingQuoteProvider<P> {
    pub fn new(inner: P, config: &CacheConfig) -> Self {
        Self {
            inner,
            cache: Mutex::new(TtlCache::new(config)),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.lock().await.len()
    }
}

impl<P: QuoteProvider> QuoteProvider for CachingQuoteProvider<P> {
    async fn quote_route(
        &self,
        route: &Route,
        amounts: &[Amount],
        trade_type: TradeType,
    ) -> anyhow::Result<Vec<Option<SliceQuote>>> {
        let key = QuoteKey {
            route: route.key(),
            amounts: amounts.to_vec(),
            trade_type,
        };

        let hit = self.cache.lock().await.get(&key);
        if let Some(ladder) = hit {
            tracing::trace!("Quote cache hit for {}", key.route);
            return Ok(ladder);
        }

        let ladder = self.inner.quote_route(route, amounts, trade_type).await?;
        if ladder.iter().any(Option::is_some) {
            self.cache.lock().await.insert(key, ladder.clone());
        }
        Ok(ladder)
    }
}
