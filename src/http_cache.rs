use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT};
use serde::{Deserialize, Serialize};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "club_index";
const CACHE_FILE: &str = "http_cache.json";

static CACHE: Mutex<Option<HttpCacheFile>> = Mutex::new(None);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct HttpCacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    /// Served from disk without touching the network.
    Fresh,
    /// Server answered 304 for the cached copy.
    Revalidated,
    Network,
}

#[derive(Debug, Clone)]
pub struct CachedBody {
    pub body: String,
    pub source: BodySource,
    pub fetched_at: i64,
}

pub struct FetchOptions {
    pub ttl: Duration,
    pub timeout: Duration,
}

/// GET `url`, reusing a stored body younger than `ttl` and revalidating older ones.
pub fn fetch_json_cached(client: &Client, url: &str, opts: &FetchOptions) -> Result<CachedBody> {
    let cached_entry = {
        let mut guard = CACHE.lock().expect("http cache lock poisoned");
        let cache = guard.get_or_insert_with(load_cache_file);
        cache.entries.get(url).cloned()
    };

    let now = Utc::now().timestamp();
    if let Some(entry) = cached_entry.as_ref()
        && is_fresh(entry.fetched_at, now, opts.ttl)
    {
        return Ok(CachedBody {
            body: entry.body.clone(),
            source: BodySource::Fresh,
            fetched_at: entry.fetched_at,
        });
    }

    let mut req = client
        .get(url)
        .timeout(opts.timeout)
        .header(USER_AGENT, "Mozilla/5.0");
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().context("request failed")?;
    let status = resp.status();
    let headers = resp.headers().clone();
    if status == StatusCode::NOT_MODIFIED {
        if let Some(mut entry) = cached_entry {
            entry.fetched_at = now;
            refresh_cache_entry(url, entry.clone());
            return Ok(CachedBody {
                body: entry.body,
                source: BodySource::Revalidated,
                fetched_at: now,
            });
        }
        return Err(anyhow::anyhow!("received 304 without cache body"));
    }

    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, truncate(&body, 200)));
    }

    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let last_modified = headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let entry = CacheEntry {
        body: body.clone(),
        etag,
        last_modified,
        fetched_at: now,
    };
    refresh_cache_entry(url, entry);
    Ok(CachedBody {
        body,
        source: BodySource::Network,
        fetched_at: now,
    })
}

/// Drop the stored copy of `url` so the next fetch goes to the network.
pub fn invalidate(url: &str) {
    let mut guard = CACHE.lock().expect("http cache lock poisoned");
    let cache = guard.get_or_insert_with(load_cache_file);
    if cache.entries.remove(url).is_some() {
        let _ = save_cache_file(cache);
    }
}

fn is_fresh(fetched_at: i64, now: i64, ttl: Duration) -> bool {
    if ttl.is_zero() {
        return false;
    }
    let age = now.saturating_sub(fetched_at);
    age >= 0 && (age as u64) < ttl.as_secs()
}

fn truncate(raw: &str, max: usize) -> &str {
    match raw.char_indices().nth(max) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

fn refresh_cache_entry(key: &str, entry: CacheEntry) {
    let mut guard = CACHE.lock().expect("http cache lock poisoned");
    let cache = guard.get_or_insert_with(load_cache_file);
    cache.version = CACHE_VERSION;
    cache.entries.insert(key.to_string(), entry);
    let _ = save_cache_file(cache);
}

fn load_cache_file() -> HttpCacheFile {
    let Some(path) = cache_path() else {
        return HttpCacheFile::default();
    };
    let raw = fs::read_to_string(path).ok();
    let Some(raw) = raw else {
        return HttpCacheFile::default();
    };
    let cache = serde_json::from_str::<HttpCacheFile>(&raw).unwrap_or_default();
    if cache.version != CACHE_VERSION {
        return HttpCacheFile::default();
    }
    cache
}

fn save_cache_file(cache: &HttpCacheFile) -> Result<()> {
    let Some(path) = cache_path() else {
        return Ok(());
    };
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).ok();
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(cache).context("serialize http cache")?;
    fs::write(&tmp, json).context("write http cache")?;
    fs::rename(&tmp, &path).context("swap http cache")?;
    Ok(())
}

fn cache_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR).join(CACHE_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR).join(CACHE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_respects_ttl() {
        let hour = Duration::from_secs(3600);
        assert!(is_fresh(1_000, 1_000, hour));
        assert!(is_fresh(1_000, 4_599, hour));
        assert!(!is_fresh(1_000, 4_600, hour));
        assert!(!is_fresh(1_000, 1_000, Duration::ZERO));
        // Entry stamped in the future (clock moved back) is not trusted.
        assert!(!is_fresh(2_000, 1_000, hour));
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
