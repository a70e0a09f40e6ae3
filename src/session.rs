use crate::store::{KeyValueStore, StoreError};
use chrono::{DateTime, SecondsFormat, Utc};

pub const LAST_STATS_UPDATE_KEY: &str = "last_stats_update";
pub const TICKER_START_KEY: &str = "tickerStart";
pub const TICKER_CYCLE_MS: i64 = 22_000;

/// When the dashboard statistics were last refreshed.
#[derive(Debug)]
pub struct LastStatsUpdate<'a, S: KeyValueStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: KeyValueStore + ?Sized> LastStatsUpdate<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn get(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let Some(raw) = self.store.get(LAST_STATS_UPDATE_KEY)? else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(dt) => Ok(Some(dt.with_timezone(&Utc))),
            Err(err) => {
                tracing::debug!(%err, raw = %raw, "stored stats update is not RFC 3339");
                Ok(None)
            }
        }
    }

    pub fn set(&mut self, at: DateTime<Utc>) -> Result<(), StoreError> {
        let iso = at.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.store.set(LAST_STATS_UPDATE_KEY, &iso)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.set(now)
    }
}

/// Where a looping ticker animation should resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerPhase {
    pub cycle_ms: i64,
    pub elapsed_ms: i64,
}

impl TickerPhase {
    /// Negative CSS animation delay that resumes the cycle mid-way.
    pub fn animation_delay(&self) -> String {
        format!("-{}ms", self.elapsed_ms)
    }
}

/// Keeps a scrolling ticker continuous across page views by remembering when it
/// first started.
#[derive(Debug)]
pub struct TickerClock<'a, S: KeyValueStore + ?Sized> {
    store: &'a mut S,
    cycle_ms: i64,
}

impl<'a, S: KeyValueStore + ?Sized> TickerClock<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self::with_cycle(store, TICKER_CYCLE_MS)
    }

    pub fn with_cycle(store: &'a mut S, cycle_ms: i64) -> Self {
        Self {
            store,
            cycle_ms: cycle_ms.max(1),
        }
    }

    pub fn phase(&mut self, now: DateTime<Utc>) -> Result<TickerPhase, StoreError> {
        let now_ms = now.timestamp_millis();
        let stored = self
            .store
            .get(TICKER_START_KEY)?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|start| *start != 0);
        let start = match stored {
            Some(start) => start,
            None => {
                self.store.set(TICKER_START_KEY, &now_ms.to_string())?;
                now_ms
            }
        };
        Ok(TickerPhase {
            cycle_ms: self.cycle_ms,
            elapsed_ms: (now_ms - start).rem_euclid(self.cycle_ms),
        })
    }
}
