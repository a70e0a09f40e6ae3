use crate::store::{KeyValueStore, StoreError, read_json, write_json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PENDING_KEY: &str = "alerts_pending_v1";
pub const ACKED_KEY: &str = "alerts_ack_v1";
pub const HISTORY_KEY: &str = "alerts_history_v1";

const HISTORY_LIMIT: usize = 1000;
const ACKED_LIMIT: usize = 500;
const ID_SUFFIX_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        })
    }
}

/// A vehicle that has waited too long at a processing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfig {
    pub vehicle_reg_no: String,
    pub stage: String,
    /// Minutes spent at the stage so far.
    pub wait_time: u32,
    pub standard_time: u32,
    pub exceedance_ratio: f64,
    pub alert_level: AlertLevel,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl AlertConfig {
    pub fn message(&self) -> String {
        format!(
            "Vehicle {} is delayed at {} ({}m)",
            self.vehicle_reg_no, self.stage, self.wait_time
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAlert {
    #[serde(flatten)]
    pub config: AlertConfig,
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub acknowledged: bool,
}

/// Pending, acknowledged and historical alerts kept in a [`KeyValueStore`].
///
/// Only the most recent alert is pending at any time; sending a new one pushes
/// the previous pending alerts onto the history.
#[derive(Debug)]
pub struct AlertManager<S> {
    store: S,
}

impl<S: KeyValueStore> AlertManager<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn send_alert(
        &mut self,
        config: AlertConfig,
        now: DateTime<Utc>,
    ) -> Result<StoredAlert, StoreError> {
        let stored = StoredAlert {
            id: alert_id(&config, now),
            message: config.message(),
            acknowledged: false,
            config,
        };

        let existing_pending = self.list(PENDING_KEY)?;
        if !existing_pending.is_empty() {
            let mut history = existing_pending;
            history.extend(self.list(HISTORY_KEY)?);
            history.truncate(HISTORY_LIMIT);
            write_json(&mut self.store, HISTORY_KEY, &history)?;
        }

        write_json(&mut self.store, PENDING_KEY, std::slice::from_ref(&stored))?;
        tracing::warn!(
            id = %stored.id,
            level = %stored.config.alert_level,
            vehicle = %stored.config.vehicle_reg_no,
            "alert triggered: {}",
            stored.message
        );
        Ok(stored)
    }

    pub fn list_pending(&self) -> Result<Vec<StoredAlert>, StoreError> {
        self.list(PENDING_KEY)
    }

    pub fn list_acknowledged(&self) -> Result<Vec<StoredAlert>, StoreError> {
        self.list(ACKED_KEY)
    }

    pub fn list_history(&self) -> Result<Vec<StoredAlert>, StoreError> {
        self.list(HISTORY_KEY)
    }

    /// Returns `false` when no pending alert has this id.
    pub fn acknowledge(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut pending = self.list(PENDING_KEY)?;
        let Some(idx) = pending.iter().position(|alert| alert.id == id) else {
            return Ok(false);
        };
        let mut item = pending.remove(idx);
        item.acknowledged = true;

        let mut acked = vec![item];
        acked.extend(self.list(ACKED_KEY)?);
        acked.truncate(ACKED_LIMIT);
        write_json(&mut self.store, ACKED_KEY, &acked)?;
        write_json(&mut self.store, PENDING_KEY, &pending)?;
        tracing::info!(id, "alert acknowledged");
        Ok(true)
    }

    fn list(&self, key: &str) -> Result<Vec<StoredAlert>, StoreError> {
        Ok(read_json(&self.store, key)?.unwrap_or_default())
    }
}

// `<epoch millis>-<6 base36 chars>`, the suffix derived from the alert itself.
fn alert_id(config: &AlertConfig, now: DateTime<Utc>) -> String {
    const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    let seed = now.timestamp_subsec_nanos().to_le_bytes();
    for byte in config
        .vehicle_reg_no
        .bytes()
        .chain(config.stage.bytes())
        .chain(seed)
    {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }

    let mut suffix = String::with_capacity(ID_SUFFIX_LEN);
    for _ in 0..ID_SUFFIX_LEN {
        suffix.push(char::from(ALPHABET[(hash % 36) as usize]));
        hash /= 36;
    }
    format!("{}-{suffix}", now.timestamp_millis())
}
