use std::cell::Cell;

use club_index::error::ClubIndexError;
use club_index::matchup::{quote_fixture, quote_fixture_with, select_fixture};
use club_index::model::{ModelParams, predict};
use club_index::ratings::{ClubRating, RatingTable};

fn club(name: &str, rating: f64) -> ClubRating {
    ClubRating {
        name: name.to_string(),
        country: None,
        league: None,
        rank: None,
        rating,
    }
}

fn table() -> RatingTable {
    RatingTable::new(vec![
        club("Real Madrid", 900.0),
        club("Celtic", 400.0),
        club("Porto", 650.0),
    ])
}

#[test]
fn identical_clubs_never_reach_the_model() {
    let table = table();
    let calls = Cell::new(0);
    let result = quote_fixture_with(&table, "Celtic", "celtic ", |delta| {
        calls.set(calls.get() + 1);
        predict(delta, &ModelParams::default())
    });
    assert!(matches!(result, Err(ClubIndexError::InvalidSelection { .. })));
    assert_eq!(calls.get(), 0);
}

#[test]
fn unavailable_club_is_invalid_selection() {
    let table = table();
    let calls = Cell::new(0);
    let result = quote_fixture_with(&table, "Celtic", "Rangers", |delta| {
        calls.set(calls.get() + 1);
        predict(delta, &ModelParams::default())
    });
    assert!(matches!(result, Err(ClubIndexError::InvalidSelection { .. })));
    assert_eq!(calls.get(), 0);
}

#[test]
fn single_club_table_cannot_be_priced() {
    let table = RatingTable::new(vec![club("Solo", 500.0)]);
    let err = select_fixture(&table, "Solo", "Other").unwrap_err();
    assert!(matches!(err, ClubIndexError::InvalidSelection { .. }));
}

#[test]
fn duplicate_names_resolve_to_first_record() {
    let table = RatingTable::new(vec![
        club("Twin", 700.0),
        club("Twin", 100.0),
        club("Other", 200.0),
    ]);
    let fixture = select_fixture(&table, "Twin", "Other").unwrap();
    assert_eq!(fixture.home.rating, 700.0);
    assert!(matches!(
        select_fixture(&table, "Twin", "twin"),
        Err(ClubIndexError::InvalidSelection { .. })
    ));
}

#[test]
fn anchor_gap_prices_home_at_sixty_six_percent() {
    let table = table();
    let quote = quote_fixture(&table, "Real Madrid", "Celtic", &ModelParams::default()).unwrap();
    assert_eq!(quote.home, "Real Madrid");
    assert_eq!(quote.away, "Celtic");
    assert_eq!(quote.delta, 500.0);
    assert!((quote.probs.p_home - 0.66).abs() < 1e-3);
    assert!((quote.odds.home - 1.0 / quote.probs.p_home).abs() < 1e-12);
    assert!(quote.probs.p_home > quote.probs.p_away);
}

#[test]
fn reversed_fixture_mirrors_probabilities() {
    let table = table();
    let params = ModelParams::default();
    let a = quote_fixture(&table, "Porto", "Celtic", &params).unwrap();
    let b = quote_fixture(&table, "Celtic", "Porto", &params).unwrap();
    assert_eq!(a.probs.p_home, b.probs.p_away);
    assert_eq!(a.probs.p_draw, b.probs.p_draw);
}

#[test]
fn invalid_parameters_are_degenerate() {
    let table = table();
    let err = quote_fixture(&table, "Porto", "Celtic", &ModelParams::new(1.5, 800.0)).unwrap_err();
    assert!(matches!(err, ClubIndexError::DegenerateModel { .. }));
}
