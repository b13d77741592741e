use club_index::error::ClubIndexError;
use club_index::model::ModelParams;
use club_index::ratings::{ClubRating, RatingTable};
use club_index::state::{AppState, Delta, Side, apply_delta};

fn club(rank: u32, name: &str, country: &str, league: &str, rating: f64) -> ClubRating {
    ClubRating {
        name: name.to_string(),
        country: Some(country.to_string()),
        league: Some(league.to_string()),
        rank: Some(rank),
        rating,
    }
}

fn loaded_state() -> AppState {
    let mut state = AppState::new(ModelParams::default());
    apply_delta(
        &mut state,
        Delta::SetTable {
            table: RatingTable::new(vec![
                club(2, "Arsenal", "England", "Premier League", 820.0),
                club(1, "Real Madrid", "Spain", "LaLiga", 900.0),
                club(3, "Sevilla", "Spain", "LaLiga", 400.0),
            ]),
            source: "test".to_string(),
            fetched_at: None,
        },
    );
    state
}

#[test]
fn rows_follow_rank_and_search_filters_all_columns() {
    let mut state = loaded_state();
    assert!(!state.loading);
    let names: Vec<&str> = state.filtered_rows().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Real Madrid", "Arsenal", "Sevilla"]);

    for ch in "laliga".chars() {
        state.push_search_char(ch);
    }
    let names: Vec<&str> = state.filtered_rows().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Real Madrid", "Sevilla"]);

    state.clear_search();
    state.push_search_char('3');
    let names: Vec<&str> = state.filtered_rows().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Sevilla"]);
}

#[test]
fn picking_both_sides_prices_the_fixture() {
    let mut state = loaded_state();
    state.assign_selected(Side::Home);
    assert!(state.quote.is_none());

    state.select_next();
    state.select_next();
    state.assign_selected(Side::Away);

    let quote = state.quote.as_ref().expect("quote computed").as_ref().expect("valid fixture");
    assert_eq!(quote.home, "Real Madrid");
    assert_eq!(quote.away, "Sevilla");
    assert!((quote.probs.p_home - 0.66).abs() < 1e-3);

    state.swap_sides();
    let quote = state.quote.as_ref().unwrap().as_ref().unwrap();
    assert_eq!(quote.home, "Sevilla");
}

#[test]
fn same_club_on_both_sides_is_rejected_and_logged() {
    let mut state = loaded_state();
    state.assign_selected(Side::Home);
    state.assign_selected(Side::Away);
    assert!(matches!(
        state.quote,
        Some(Err(ClubIndexError::InvalidSelection { .. }))
    ));
    assert!(state.logs.back().is_some_and(|l| l.starts_with("[WARN]")));
}

#[test]
fn failed_refresh_shows_empty_table_and_stays_usable() {
    let mut state = loaded_state();
    state.assign_selected(Side::Home);
    apply_delta(
        &mut state,
        Delta::RefreshFailed(ClubIndexError::fetch_failed("timeout")),
    );
    assert!(state.table.is_empty());
    assert!(state.filtered_rows().is_empty());
    assert!(state.last_error.is_some());
    assert!(state.selected_club().is_none());

    state.select_next();
    state.assign_selected(Side::Away);
    assert_eq!(state.selected, 0);
    assert!(state.logs.iter().any(|l| l.starts_with("[ERR]")));
}

#[test]
fn reload_keeps_selection_in_bounds() {
    let mut state = loaded_state();
    state.select_next();
    state.select_next();
    assert_eq!(state.selected, 2);
    apply_delta(
        &mut state,
        Delta::SetTable {
            table: RatingTable::new(vec![club(1, "Only", "Spain", "LaLiga", 500.0)]),
            source: "test".to_string(),
            fetched_at: Some(0),
        },
    );
    assert_eq!(state.selected, 0);
    assert_eq!(state.selected_club().map(|c| c.name.as_str()), Some("Only"));
}
