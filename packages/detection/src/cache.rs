//! In-memory detection cache keyed by normalized URL.
//!
//! Entries expire after a TTL and the cache holds a bounded number of
//! entries, evicting oldest-inserted first. Time comes through a clock
//! trait so expiry is testable without sleeping.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use url::Url;

use crate::types::result::DetectionResult;

const DEFAULT_TTL_HOURS: i64 = 24;
const DEFAULT_MAX_ENTRIES: usize = 100;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually-advanced clock for tests.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap()
    }
}

struct CacheEntry {
    result: DetectionResult,
    inserted_at: DateTime<Utc>,
}

/// Cache statistics snapshot.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub max_entries: usize,
    pub ttl_hours: i64,
}

/// TTL + capacity bounded result cache.
pub struct DetectionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl Default for DetectionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
            max_entries: DEFAULT_MAX_ENTRIES,
            clock: Arc::new(SystemClock),
        }
    }

    /// Override the TTL (seconds granularity for test convenience).
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl = Duration::seconds(seconds);
        self
    }

    /// Override the entry cap.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Inject a clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Fetch a cached result for a URL. Expired entries are removed on
    /// the way out.
    pub fn get(&self, url: &str) -> Option<DetectionResult> {
        let key = normalize_url(url);
        let now = self.clock.now();

        {
            let entries = self.entries.read().unwrap();
            let entry = entries.get(&key)?;
            if now - entry.inserted_at < self.ttl {
                debug!(%key, "Detection cache hit");
                return Some(entry.result.clone());
            }
        }

        // Expired; drop it under the write lock
        self.entries.write().unwrap().remove(&key);
        debug!(%key, "Detection cache entry expired");
        None
    }

    /// Store a result. When the cap is exceeded, oldest-inserted entries
    /// are evicted until the cache fits.
    pub fn set(&self, url: &str, result: DetectionResult) {
        let key = normalize_url(url);
        let now = self.clock.now();

        let mut entries = self.entries.write().unwrap();
        entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: now,
            },
        );

        while entries.len() > self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    entries.remove(&k);
                    debug!(key = %k, "Evicted oldest cache entry");
                }
                None => break,
            }
        }
    }

    /// Drop all expired entries, returning how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, e| now - e.inserted_at < self.ttl);
        before - entries.len()
    }

    /// Remove everything.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.read().unwrap().len(),
            max_entries: self.max_entries,
            ttl_hours: self.ttl.num_hours(),
        }
    }
}

/// Cache key for a URL: scheme and `www.` prefix stripped, trailing
/// slash removed, so `https://www.shop.example/x/` and
/// `http://shop.example/x` share an entry.
pub fn normalize_url(raw: &str) -> String {
    let normalized = match Url::parse(raw) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            let host = host.strip_prefix("www.").unwrap_or(host);
            let mut out = String::from(host);
            if let Some(port) = url.port() {
                out.push(':');
                out.push_str(&port.to_string());
            }
            out.push_str(url.path());
            if let Some(query) = url.query() {
                out.push('?');
                out.push_str(query);
            }
            out
        }
        // Not an absolute URL; normalize textually
        Err(_) => {
            let lowered = raw.trim().to_lowercase();
            let stripped = lowered
                .strip_prefix("https://")
                .or_else(|| lowered.strip_prefix("http://"))
                .unwrap_or(&lowered);
            let stripped = stripped.strip_prefix("www.").unwrap_or(stripped);
            stripped.to_string()
        }
    };

    normalized.trim_end_matches('/').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::product::{DetectedProduct, DetectionMethod};

    fn result_with(name: &str) -> DetectionResult {
        DetectionResult::from_products(vec![DetectedProduct::new(
            name,
            DetectionMethod::Schema,
        )])
    }

    #[test]
    fn test_url_normalization() {
        assert_eq!(
            normalize_url("https://www.shop.example/products/"),
            "shop.example/products"
        );
        assert_eq!(
            normalize_url("http://shop.example/products"),
            "shop.example/products"
        );
        assert_eq!(normalize_url("shop.example/products/"), "shop.example/products");
        assert_eq!(
            normalize_url("https://shop.example/p?page=2"),
            "shop.example/p?page=2"
        );
    }

    #[test]
    fn test_set_then_get() {
        let cache = DetectionCache::new();
        cache.set("https://www.shop.example/tea/", result_with("Tea"));

        let hit = cache.get("http://shop.example/tea").unwrap();
        assert_eq!(hit.products[0].name, "Tea");
        assert!(cache.get("https://shop.example/coffee").is_none());
    }

    #[test]
    fn test_ttl_expiry() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = DetectionCache::new().with_clock(clock.clone());

        cache.set("shop.example/tea", result_with("Tea"));
        assert!(cache.get("shop.example/tea").is_some());

        clock.advance(Duration::hours(25));
        assert!(cache.get("shop.example/tea").is_none());
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = DetectionCache::new()
            .with_max_entries(3)
            .with_clock(clock.clone());

        for i in 0..4 {
            cache.set(&format!("shop.example/p{i}"), result_with("x"));
            clock.advance(Duration::seconds(1));
        }

        assert_eq!(cache.stats().size, 3);
        assert!(cache.get("shop.example/p0").is_none());
        assert!(cache.get("shop.example/p3").is_some());
    }

    proptest::proptest! {
        #[test]
        fn test_normalize_url_idempotent(raw in ".{0,80}") {
            let once = normalize_url(&raw);
            let twice = normalize_url(&once);
            proptest::prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_cleanup_counts_removed() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = DetectionCache::new()
            .with_ttl_seconds(60)
            .with_clock(clock.clone());

        cache.set("shop.example/a", result_with("a"));
        cache.set("shop.example/b", result_with("b"));
        clock.advance(Duration::seconds(61));
        cache.set("shop.example/c", result_with("c"));

        assert_eq!(cache.cleanup(), 2);
        assert_eq!(cache.stats().size, 1);
    }
}
