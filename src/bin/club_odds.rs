use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use club_index::config::AppConfig;
use club_index::matchup::{format_odds, format_pct, quote_fixture};
use club_index::ranking_fetch::{self, source_label};
use club_index::state::format_rating;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut cfg = AppConfig::from_env();
    if let Some(path) = arg_value(&args, "payload") {
        cfg.payload_path = Some(PathBuf::from(path));
    }

    let load = ranking_fetch::load_rating_table(&cfg).context("unable to load ratings")?;
    for warning in &load.build.warnings {
        eprintln!("warning: {warning}");
    }
    let table = load.build.table;
    eprintln!("{} clubs from {}", table.len(), source_label(&load.source));

    if args.iter().any(|a| a == "--list") {
        for club in table.sorted_for_display() {
            let rank = club.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
            let country = club.country.as_deref().unwrap_or("-");
            println!(
                "{rank:>4}  {:<28} {country:<14} {:>8}",
                club.name,
                format_rating(club.rating)
            );
        }
        return Ok(());
    }

    let (Some(home), Some(away)) = (arg_value(&args, "home"), arg_value(&args, "away")) else {
        bail!("usage: club_odds --home <club> --away <club> [--payload <file>] | --list");
    };

    let quote = quote_fixture(&table, &home, &away, &cfg.model)?;
    println!("{} vs {} (delta {:+.1})", quote.home, quote.away, quote.delta);
    println!(
        "Home {:>6} @ {}",
        format_pct(quote.probs.p_home),
        format_odds(quote.odds.home)
    );
    println!(
        "Draw {:>6} @ {}",
        format_pct(quote.probs.p_draw),
        format_odds(quote.odds.draw)
    );
    println!(
        "Away {:>6} @ {}",
        format_pct(quote.probs.p_away),
        format_odds(quote.odds.away)
    );
    Ok(())
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let flag = format!("--{name}");
    let prefix = format!("--{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
