use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::ranking_fetch::{self, RankingLoad, source_label};
use crate::state::{Delta, ProviderCommand};

// Per-refresh cap on individual ingest warnings sent to the console.
const MAX_WARNINGS_LOGGED: usize = 25;
const MIN_POLL: Duration = Duration::from_secs(60);

/// Background loader: one initial load, then on demand or whenever the TTL lapses.
pub fn spawn_provider(cfg: AppConfig, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        if let Err(err) = cfg.model.validate() {
            let _ = tx.send(Delta::Log(format!("[WARN] Model parameters: {err}")));
        }

        let poll = cfg.cache_ttl.max(MIN_POLL);
        refresh(&cfg, false, &tx);
        let mut last_refresh = Instant::now();

        loop {
            let wait = poll.saturating_sub(last_refresh.elapsed());
            match cmd_rx.recv_timeout(wait) {
                Ok(ProviderCommand::Refresh { force }) => {
                    refresh(&cfg, force, &tx);
                    last_refresh = Instant::now();
                }
                Err(RecvTimeoutError::Timeout) => {
                    refresh(&cfg, false, &tx);
                    last_refresh = Instant::now();
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    });
}

fn refresh(cfg: &AppConfig, force: bool, tx: &Sender<Delta>) {
    let result = if force {
        ranking_fetch::reload_rating_table(cfg)
    } else {
        ranking_fetch::load_rating_table(cfg)
    };
    match result {
        Ok(load) => send_load(load, tx),
        Err(err) => {
            let _ = tx.send(Delta::RefreshFailed(err));
        }
    }
}

fn send_load(load: RankingLoad, tx: &Sender<Delta>) {
    let RankingLoad {
        build,
        source,
        fetched_at,
    } = load;

    let total = build.warnings.len();
    for warning in build.warnings.iter().take(MAX_WARNINGS_LOGGED) {
        let _ = tx.send(Delta::Log(format!("[WARN] Ingest: {warning}")));
    }
    if total > MAX_WARNINGS_LOGGED {
        let _ = tx.send(Delta::Log(format!(
            "[WARN] Ingest: {} more warnings not shown",
            total - MAX_WARNINGS_LOGGED
        )));
    }

    let _ = tx.send(Delta::SetTable {
        table: build.table,
        source: source_label(&source),
        fetched_at,
    });
}
