use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::model::ModelParams;
use crate::ratings::MalformedRatingPolicy;

pub const DEFAULT_RANKING_URL: &str = "https://www.euroclubindex.com/wp-json/happyhorizon/v1/get-module-latest-ranking/?ppp=-1&pagination=1&search=";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub ranking_url: String,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
    pub model: ModelParams,
    pub rating_policy: MalformedRatingPolicy,
    // Local payload file; skips the network entirely when set.
    pub payload_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ranking_url: DEFAULT_RANKING_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            model: ModelParams::default(),
            rating_policy: MalformedRatingPolicy::default(),
            payload_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset, blank or unparsable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key).and_then(|val| {
                let trimmed = val.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };
        let defaults = Self::default();

        let timeout_secs = get("CLUB_INDEX_TIMEOUT_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 120);
        let ttl_secs = get("CLUB_INDEX_TTL_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TTL_SECS);

        let d0 = get("MODEL_D0")
            .and_then(|val| val.parse::<f64>().ok())
            .unwrap_or(defaults.model.d0);
        let dscale = get("MODEL_DSCALE")
            .and_then(|val| val.parse::<f64>().ok())
            .unwrap_or(defaults.model.dscale);

        let rating_policy = get("MALFORMED_RATING")
            .and_then(|val| val.parse::<MalformedRatingPolicy>().ok())
            .unwrap_or(defaults.rating_policy);

        Self {
            ranking_url: get("CLUB_INDEX_URL").unwrap_or(defaults.ranking_url),
            request_timeout: Duration::from_secs(timeout_secs),
            cache_ttl: Duration::from_secs(ttl_secs),
            model: ModelParams::new(d0, dscale),
            rating_policy,
            payload_path: get("CLUB_INDEX_PAYLOAD").map(PathBuf::from),
        }
    }
}
