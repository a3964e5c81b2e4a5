//! Process configuration from `KINETRIS_*` environment variables.

use std::path::PathBuf;

use crate::types::TICK_MS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Seed for the first game; later games use `seed + n`
    pub seed: u32,
    pub tick_ms: u32,
    /// JSONL event log, one object per matrix event
    pub event_log: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to
    /// defaults
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let seed = var("KINETRIS_SEED")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or_else(time_seed);

        let tick_ms = var("KINETRIS_TICK_MS")
            .and_then(|s| s.trim().parse().ok())
            .filter(|&ms: &u32| ms > 0)
            .unwrap_or(TICK_MS);

        let event_log = var("KINETRIS_EVENT_LOG")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self {
            seed,
            tick_ms,
            event_log,
        }
    }

    /// Seed for the `game`-th game of this process, starting at 0
    pub fn seed_for_game(&self, game: u32) -> u32 {
        self.seed.wrapping_add(game)
    }
}

fn time_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(1);
    (nanos as u32) ^ ((nanos >> 32) as u32)
}
