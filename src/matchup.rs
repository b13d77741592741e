use crate::error::{ClubIndexError, Result};
use crate::model::{self, ModelParams, Odds, OutcomeDistribution};
use crate::ratings::{ClubRating, RatingTable};

/// Two distinct clubs resolved from the table.
#[derive(Debug, Clone, Copy)]
pub struct Fixture<'a> {
    pub home: &'a ClubRating,
    pub away: &'a ClubRating,
}

impl Fixture<'_> {
    pub fn delta(&self) -> f64 {
        self.home.rating - self.away.rating
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub home: String,
    pub away: String,
    pub delta: f64,
    pub probs: OutcomeDistribution,
    pub odds: Odds,
}

/// Resolve home and away names against the table.
///
/// Fails with `InvalidSelection` when a name is blank, unknown, or both names resolve
/// to the same club. Lookups take the first matching record.
pub fn select_fixture<'a>(table: &'a RatingTable, home: &str, away: &str) -> Result<Fixture<'a>> {
    let home_key = home.trim();
    let away_key = away.trim();
    if home_key.is_empty() || away_key.is_empty() {
        return Err(ClubIndexError::invalid_selection(
            "pick both a home and an away club",
        ));
    }
    if home_key.to_lowercase() == away_key.to_lowercase() {
        return Err(ClubIndexError::invalid_selection(format!(
            "{home_key} cannot play itself, pick two different clubs"
        )));
    }

    let home_club = table.find(home_key).ok_or_else(|| {
        ClubIndexError::invalid_selection(format!("{home_key} is not in the rating table"))
    })?;
    let away_club = table.find(away_key).ok_or_else(|| {
        ClubIndexError::invalid_selection(format!("{away_key} is not in the rating table"))
    })?;

    if std::ptr::eq(home_club, away_club) {
        return Err(ClubIndexError::invalid_selection(
            "home and away resolve to the same club",
        ));
    }

    Ok(Fixture {
        home: home_club,
        away: away_club,
    })
}

/// Price a fixture with the outcome model.
pub fn quote_fixture(
    table: &RatingTable,
    home: &str,
    away: &str,
    params: &ModelParams,
) -> Result<Quote> {
    params.validate()?;
    quote_fixture_with(table, home, away, |delta| model::predict(delta, params))
}

/// Like [`quote_fixture`] with a caller-supplied pricing function; it only runs for a valid selection.
pub fn quote_fixture_with<F>(table: &RatingTable, home: &str, away: &str, price: F) -> Result<Quote>
where
    F: FnOnce(f64) -> OutcomeDistribution,
{
    let fixture = select_fixture(table, home, away)?;
    let delta = fixture.delta();
    let probs = price(delta);
    let odds = probs.odds()?;
    Ok(Quote {
        home: fixture.home.name.clone(),
        away: fixture.away.name.clone(),
        delta,
        probs,
        odds,
    })
}

pub fn format_pct(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

pub fn format_odds(odds: f64) -> String {
    format!("{odds:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn club(name: &str, rating: f64) -> ClubRating {
        ClubRating {
            name: name.to_string(),
            country: None,
            league: None,
            rank: None,
            rating,
        }
    }

    #[test]
    fn delta_is_home_minus_away() {
        let table = RatingTable::new(vec![club("Home", 900.0), club("Away", 400.0)]);
        let fixture = select_fixture(&table, "home", " AWAY ").unwrap();
        assert_eq!(fixture.delta(), 500.0);
    }

    #[test]
    fn blank_name_is_invalid() {
        let table = RatingTable::new(vec![club("Home", 900.0)]);
        let err = select_fixture(&table, "Home", "  ").unwrap_err();
        assert!(matches!(err, ClubIndexError::InvalidSelection { .. }));
    }

    #[test]
    fn formatting_matches_display_rules() {
        assert_eq!(format_pct(0.66), "66.0%");
        assert_eq!(format_pct(0.1234), "12.3%");
        assert_eq!(format_odds(1.0 / 0.66), "1.52");
    }
}
