use std::collections::VecDeque;

use crate::error::ClubIndexError;
use crate::matchup::{Quote, quote_fixture};
use crate::model::ModelParams;
use crate::ratings::{ClubRating, RatingTable};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    Refresh { force: bool },
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetTable {
        table: RatingTable,
        source: String,
        fetched_at: Option<i64>,
    },
    RefreshFailed(ClubIndexError),
    Log(String),
}

#[derive(Debug)]
pub struct AppState {
    pub table: RatingTable,
    pub model: ModelParams,
    pub search: String,
    pub input_mode: InputMode,
    pub selected: usize,
    pub home: Option<String>,
    pub away: Option<String>,
    pub quote: Option<Result<Quote, ClubIndexError>>,
    pub loading: bool,
    pub source: Option<String>,
    pub fetched_at: Option<i64>,
    pub last_error: Option<ClubIndexError>,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(model: ModelParams) -> Self {
        Self {
            table: RatingTable::default(),
            model,
            search: String::new(),
            input_mode: InputMode::Normal,
            selected: 0,
            home: None,
            away: None,
            quote: None,
            loading: true,
            source: None,
            fetched_at: None,
            last_error: None,
            help_overlay: false,
            logs: VecDeque::with_capacity(MAX_LOGS),
        }
    }

    /// Table rows in display order, narrowed by the search box.
    pub fn filtered_rows(&self) -> Vec<&ClubRating> {
        let query = self.search.trim();
        self.table
            .sorted_for_display()
            .into_iter()
            .filter(|club| row_matches(club, query))
            .collect()
    }

    pub fn selected_club(&self) -> Option<&ClubRating> {
        self.filtered_rows().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.filtered_rows().len();
        if len == 0 {
            self.selected = 0;
        } else {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search.push(ch);
        self.selected = 0;
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
        self.selected = 0;
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.selected = 0;
    }

    /// Put the highlighted club on one side of the fixture.
    pub fn assign_selected(&mut self, side: Side) {
        let Some(name) = self.selected_club().map(|c| c.name.clone()) else {
            self.push_log("[INFO] No club highlighted");
            return;
        };
        match side {
            Side::Home => self.home = Some(name),
            Side::Away => self.away = Some(name),
        }
        self.recompute_quote();
    }

    pub fn swap_sides(&mut self) {
        std::mem::swap(&mut self.home, &mut self.away);
        self.recompute_quote();
    }

    pub fn clear_fixture(&mut self) {
        self.home = None;
        self.away = None;
        self.quote = None;
    }

    /// Re-price the current fixture. Nothing is priced until both sides are picked.
    pub fn recompute_quote(&mut self) {
        let (Some(home), Some(away)) = (self.home.as_deref(), self.away.as_deref()) else {
            self.quote = None;
            return;
        };
        let result = quote_fixture(&self.table, home, away, &self.model);
        if let Err(err) = &result {
            self.push_log(format!("[WARN] {err}"));
        }
        self.quote = Some(result);
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.filtered_rows().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

/// Case-insensitive substring match against the text of every displayed column.
pub fn row_matches(club: &ClubRating, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    row_cells(club)
        .iter()
        .any(|cell| cell.to_lowercase().contains(&needle))
}

pub fn row_cells(club: &ClubRating) -> [String; 5] {
    [
        club.rank.map(|r| r.to_string()).unwrap_or_default(),
        club.name.clone(),
        club.country.clone().unwrap_or_default(),
        club.league.clone().unwrap_or_default(),
        format_rating(club.rating),
    ]
}

pub fn format_rating(rating: f64) -> String {
    format!("{rating:.1}")
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetTable {
            table,
            source,
            fetched_at,
        } => {
            state.push_log(format!("[INFO] Loaded {} clubs from {source}", table.len()));
            state.table = table;
            state.source = Some(source);
            state.fetched_at = fetched_at;
            state.last_error = None;
            state.loading = false;
            state.clamp_selection();
            state.recompute_quote();
        }
        Delta::RefreshFailed(err) => {
            state.push_log(format!("[ERR] {err}"));
            state.table = RatingTable::default();
            state.source = None;
            state.fetched_at = None;
            state.last_error = Some(err);
            state.loading = false;
            state.selected = 0;
            state.quote = None;
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn club(name: &str, country: &str, rating: f64) -> ClubRating {
        ClubRating {
            name: name.to_string(),
            country: Some(country.to_string()),
            league: None,
            rank: None,
            rating,
        }
    }

    #[test]
    fn search_matches_any_column_ignoring_case() {
        let c = club("Real Madrid", "Spain", 850.5);
        assert!(row_matches(&c, "real"));
        assert!(row_matches(&c, "SPA"));
        assert!(row_matches(&c, "850.5"));
        assert!(!row_matches(&c, "italy"));
    }

    #[test]
    fn push_log_is_bounded() {
        let mut state = AppState::new(ModelParams::default());
        for i in 0..(MAX_LOGS + 10) {
            state.push_log(format!("line {i}"));
        }
        assert_eq!(state.logs.len(), MAX_LOGS);
        assert_eq!(state.logs.front().map(String::as_str), Some("line 10"));
    }
}
