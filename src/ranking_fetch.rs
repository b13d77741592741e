use std::fs;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::{ClubIndexError, Result};
use crate::http_cache::{self, BodySource, FetchOptions, fetch_json_cached};
use crate::http_client::http_client;
use crate::ratings::{MalformedRatingPolicy, RatingBuild, parse_ranking_json};

#[derive(Debug, Clone, PartialEq)]
pub enum RankingSource {
    File(PathBuf),
    Http(BodySource),
}

#[derive(Debug, Clone)]
pub struct RankingLoad {
    pub build: RatingBuild,
    pub source: RankingSource,
    pub fetched_at: Option<i64>,
}

/// Load the rating table from the configured local file or the ranking endpoint.
pub fn load_rating_table(cfg: &AppConfig) -> Result<RankingLoad> {
    if let Some(path) = cfg.payload_path.as_deref() {
        return load_from_file(path, cfg.rating_policy);
    }

    let client = http_client().map_err(|err| ClubIndexError::fetch_failed(format!("{err:#}")))?;
    let opts = FetchOptions {
        ttl: cfg.cache_ttl,
        timeout: cfg.request_timeout,
    };
    let cached = fetch_json_cached(client, &cfg.ranking_url, &opts)
        .map_err(|err| ClubIndexError::fetch_failed(format!("{err:#}")))?;
    let build = parse_ranking_json(&cached.body, cfg.rating_policy)?;

    Ok(RankingLoad {
        build,
        source: RankingSource::Http(cached.source),
        fetched_at: Some(cached.fetched_at),
    })
}

/// Like [`load_rating_table`] but ignores any cached copy of the payload.
pub fn reload_rating_table(cfg: &AppConfig) -> Result<RankingLoad> {
    if cfg.payload_path.is_none() {
        http_cache::invalidate(&cfg.ranking_url);
    }
    load_rating_table(cfg)
}

pub fn load_from_file(path: &Path, policy: MalformedRatingPolicy) -> Result<RankingLoad> {
    let raw = fs::read_to_string(path).map_err(|err| {
        ClubIndexError::fetch_failed(format!("cannot read {}: {err}", path.display()))
    })?;
    let build = parse_ranking_json(&raw, policy)?;
    Ok(RankingLoad {
        build,
        source: RankingSource::File(path.to_path_buf()),
        fetched_at: None,
    })
}

pub fn source_label(source: &RankingSource) -> String {
    match source {
        RankingSource::File(path) => format!("file {}", path.display()),
        RankingSource::Http(BodySource::Fresh) => "cache".to_string(),
        RankingSource::Http(BodySource::Revalidated) => "cache (revalidated)".to_string(),
        RankingSource::Http(BodySource::Network) => "network".to_string(),
    }
}
