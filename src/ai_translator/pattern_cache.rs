//! Fingerprint-keyed translation cache with learning.
//!
//! The key is a normalization of the source query: lowercased and
//! whitespace-collapsed outside string literals, literals preserved
//! verbatim. Entries carry hit/success/failure counters and expire by
//! TTL; eviction is LRU with a bias toward dropping low-success-rate
//! entries first. The map is sharded so concurrent translations only
//! contend on the shard they touch.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::classifier::QueryComplexity;

const SHARD_COUNT: usize = 16;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// SHA-256 of the normalized query, hex-encoded.
    pub fingerprint: String,
    pub kql_template: String,
    pub complexity: QueryComplexity,
    pub hit_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl CacheEntry {
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.success_count + self.failure_count;
        if total == 0 {
            1.0
        } else {
            self.success_count as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatternCacheConfig {
    pub capacity: usize,
    pub ttl: Duration,
    pub learning_enabled: bool,
}

impl Default for PatternCacheConfig {
    fn default() -> Self {
        PatternCacheConfig {
            capacity: 1000,
            ttl: Duration::from_secs(24 * 3600),
            learning_enabled: true,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStatistics {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub total_queries: u64,
    pub hit_rate: f64,
    pub entry_count: usize,
}

pub struct PatternCache {
    shards: Vec<Mutex<HashMap<String, CacheEntry>>>,
    patterns: Mutex<HashMap<String, u64>>,
    config: PatternCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl PatternCache {
    pub fn new(config: PatternCacheConfig) -> Self {
        PatternCache {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
            patterns: Mutex::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PatternCacheConfig::default())
    }

    /// Lowercase and collapse whitespace outside string literals; the
    /// literals themselves are preserved byte for byte.
    pub fn normalize(query: &str) -> String {
        let mut out = String::with_capacity(query.len());
        let mut in_string: Option<char> = None;
        let mut escaped = false;
        let mut pending_space = false;

        for ch in query.trim().chars() {
            if let Some(quote) = in_string {
                out.push(ch);
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote {
                    in_string = None;
                }
                continue;
            }

            match ch {
                '\'' | '"' => {
                    if pending_space && !out.is_empty() {
                        out.push(' ');
                    }
                    pending_space = false;
                    in_string = Some(ch);
                    out.push(ch);
                }
                c if c.is_whitespace() => pending_space = true,
                c => {
                    if pending_space && !out.is_empty() {
                        out.push(' ');
                    }
                    pending_space = false;
                    out.extend(c.to_lowercase());
                }
            }
        }
        out
    }

    pub fn fingerprint(normalized: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn shard_for(&self, key: &str) -> &Mutex<HashMap<String, CacheEntry>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    pub fn get(&self, query: &str) -> Option<CacheEntry> {
        let key = Self::normalize(query);
        let mut shard = match self.shard_for(&key).lock() {
            Ok(shard) => shard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let expired = shard
            .get(&key)
            .map(|entry| entry.age().to_std().unwrap_or_default() > self.config.ttl)
            .unwrap_or(false);
        if expired {
            shard.remove(&key);
        }

        match shard.get_mut(&key) {
            Some(entry) => {
                entry.hit_count += 1;
                entry.last_accessed = Utc::now();
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, query: &str, kql_template: &str, complexity: QueryComplexity) {
        let key = Self::normalize(query);

        if self.config.learning_enabled {
            if let Some(pattern) = extract_pattern(&key) {
                let mut patterns = match self.patterns.lock() {
                    Ok(patterns) => patterns,
                    Err(poisoned) => poisoned.into_inner(),
                };
                *patterns.entry(pattern).or_insert(0) += 1;
            }
        }

        let mut shard = match self.shard_for(&key).lock() {
            Ok(shard) => shard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Capacity is divided across shards; eviction only ever holds
        // the shard it evicts from.
        let shard_capacity = (self.config.capacity / SHARD_COUNT).max(1);
        if !shard.contains_key(&key) && shard.len() >= shard_capacity {
            self.evict_one(&mut shard);
        }

        let now = Utc::now();
        match shard.get_mut(&key) {
            Some(entry) => {
                entry.kql_template = kql_template.to_string();
                entry.complexity = complexity;
                entry.created_at = now;
                entry.last_accessed = now;
            }
            None => {
                shard.insert(
                    key.clone(),
                    CacheEntry {
                        fingerprint: Self::fingerprint(&key),
                        kql_template: kql_template.to_string(),
                        complexity,
                        hit_count: 0,
                        success_count: 0,
                        failure_count: 0,
                        created_at: now,
                        last_accessed: now,
                    },
                );
            }
        }
    }

    /// LRU with a success-rate tiebreak: between equally old entries the
    /// one with the lower success rate goes first.
    fn evict_one(&self, shard: &mut HashMap<String, CacheEntry>) {
        let victim = shard
            .iter()
            .min_by(|(_, a), (_, b)| {
                a.last_accessed
                    .cmp(&b.last_accessed)
                    .then_with(|| {
                        a.success_rate()
                            .partial_cmp(&b.success_rate())
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
            })
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            shard.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_success(&self, query: &str) {
        self.bump(query, true);
    }

    pub fn record_failure(&self, query: &str) {
        self.bump(query, false);
    }

    fn bump(&self, query: &str, success: bool) {
        let key = Self::normalize(query);
        let mut shard = match self.shard_for(&key).lock() {
            Ok(shard) => shard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(entry) = shard.get_mut(&key) {
            if success {
                entry.success_count += 1;
            } else {
                entry.failure_count += 1;
            }
        }
    }

    /// Learned MATCH-shape patterns with their observation counts.
    pub fn patterns(&self) -> Vec<(String, u64)> {
        let patterns = match self.patterns.lock() {
            Ok(patterns) => patterns,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut out: Vec<(String, u64)> = patterns
            .iter()
            .map(|(pattern, count)| (pattern.clone(), *count))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    pub fn top_patterns(&self, n: usize) -> Vec<(String, u64)> {
        let mut patterns = self.patterns();
        patterns.truncate(n);
        patterns
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            match shard.lock() {
                Ok(mut shard) => shard.clear(),
                Err(poisoned) => poisoned.into_inner().clear(),
            }
        }
        match self.patterns.lock() {
            Ok(mut patterns) => patterns.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| match shard.lock() {
                Ok(shard) => shard.len(),
                Err(poisoned) => poisoned.into_inner().len(),
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn statistics(&self) -> CacheStatistics {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStatistics {
            cache_hits: hits,
            cache_misses: misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            total_queries: total,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            entry_count: self.len(),
        }
    }
}

/// The MATCH-shape of a normalized query: everything from `match` up to
/// the first `where`/`return`, with property values elided.
fn extract_pattern(normalized: &str) -> Option<String> {
    let start = normalized.find("match")?;
    let rest = &normalized[start..];
    let end = rest
        .find(" where ")
        .or_else(|| rest.find(" return "))
        .unwrap_or(rest.len());
    let shape = rest[..end].trim();
    if shape.is_empty() {
        None
    } else {
        Some(shape.to_string())
    }
}
