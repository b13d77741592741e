pub mod config;
pub mod error;
pub mod feed;
pub mod http_cache;
pub mod http_client;
pub mod matchup;
pub mod model;
pub mod ranking_fetch;
pub mod ratings;
pub mod state;

pub use error::ClubIndexError;
pub use model::{ModelParams, OutcomeDistribution, predict};
pub use ratings::{ClubRating, RatingTable, build_rating_table};
