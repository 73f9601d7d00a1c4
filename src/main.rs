//! tlcache demo driver
//!
//! Replays the cache behaviours end to end with logging:
//! - `lru` - plain LRU eviction
//! - `lru-ttl` - LRU with entries that expire
//! - `ttl` (default) - TTL eviction with sliding expiration
//!
//! The `ttl` scenario honours `CACHE_*` environment overrides, see
//! [`CacheConfig::from_env`].

use std::thread::sleep;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tlcache::{Cache, CacheConfig, EvictionPolicy};

fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tlcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let scenario = std::env::args().nth(1).unwrap_or_else(|| "ttl".to_string());
    let cache = match scenario.as_str() {
        "lru" => lru_example(),
        "lru-ttl" => lru_ttl_example()?,
        "ttl" => ttl_example()?,
        other => bail!("unknown scenario {other:?}, expected lru, lru-ttl or ttl"),
    };

    let stats = serde_json::to_string_pretty(&cache.stats()).context("serializing stats")?;
    println!("{stats}");
    Ok(())
}

fn fill(cache: &Cache<u32, String>, keys: impl IntoIterator<Item = u32>, pause: Duration) {
    for key in keys {
        cache.insert(key, format!("this is test {key}"));
        sleep(pause);
    }
}

fn report(cache: &Cache<u32, String>, key: u32) {
    match cache.lookup(&key) {
        Some(value) => info!(key, %value, "lookup hit"),
        None => info!(key, "lookup miss"),
    }
}

fn lru_example() -> Cache<u32, String> {
    let cache = Cache::lru(5);
    fill(&cache, 1..=6, Duration::ZERO);
    info!(size = cache.size(), "lru cache filled");

    report(&cache, 2);
    report(&cache, 3);

    // 4 is now least recently used and goes first
    fill(&cache, 7..=8, Duration::ZERO);
    report(&cache, 4);
    cache
}

fn lru_ttl_example() -> anyhow::Result<Cache<u32, String>> {
    let cache = Cache::lru_with_ttl(5, Duration::from_millis(500))?;
    fill(&cache, 1..=6, Duration::ZERO);
    info!(size = cache.size(), "lru ttl cache filled");

    report(&cache, 2);
    sleep(Duration::from_millis(550));
    report(&cache, 2);
    Ok(cache)
}

fn ttl_example() -> anyhow::Result<Cache<u32, String>> {
    let mut config = CacheConfig::from_env();
    if config.policy != EvictionPolicy::Ttl {
        config = CacheConfig::ttl(5, Duration::from_millis(500), true);
    }
    let cache = Cache::new(config).context("building ttl cache")?;

    fill(&cache, 1..=6, Duration::from_millis(3));
    info!(size = cache.size(), "ttl cache filled");

    // Reads of 2 keep sliding its expiry; 3 is never read and lapses
    sleep(Duration::from_millis(300));
    report(&cache, 2);
    sleep(Duration::from_millis(300));
    report(&cache, 2);
    report(&cache, 3);
    Ok(cache)
}
