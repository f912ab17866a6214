//! ═══════════════════════════════════════════════════════════════════════════════
//! FEED — Upstream History Fetch
//! ═══════════════════════════════════════════════════════════════════════════════
//! Pulls the newest-first round history from the upstream JSON endpoint. The
//! feed is flaky and loosely typed: numeric fields arrive as numbers or as
//! strings, outcome labels vary, and the endpoint times out under load. A
//! short-TTL cache absorbs the polling rhythm, and any fetch failure falls
//! back to the last good snapshot rather than clearing state downstream.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::{AugurResult, FeedError};
use crate::event::{Event, Outcome};

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const CACHE_TTL: Duration = Duration::from_secs(2);

/// A numeric feed field that may arrive as a number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NumField {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumField {
    fn as_i64(&self) -> Option<i64> {
        match self {
            NumField::Int(v) => Some(*v),
            NumField::Float(v) => Some(*v as i64),
            NumField::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One raw round record as the upstream serves it
#[derive(Debug, Clone, Deserialize)]
pub struct FeedRecord {
    #[serde(alias = "phien", alias = "session")]
    round: NumField,
    #[serde(alias = "ket_qua", alias = "result")]
    outcome: String,
    #[serde(default, alias = "xuc_xac_1", alias = "dice_1")]
    die1: Option<NumField>,
    #[serde(default, alias = "xuc_xac_2", alias = "dice_2")]
    die2: Option<NumField>,
    #[serde(default, alias = "xuc_xac_3", alias = "dice_3")]
    die3: Option<NumField>,
    #[serde(default, alias = "tong")]
    total: Option<NumField>,
}

impl FeedRecord {
    /// Lenient conversion; records with an unusable round id or outcome label
    /// are dropped, missing numerics survive as None.
    fn into_event(self) -> Option<Event> {
        let round = self.round.as_i64().filter(|&r| r > 0)? as u64;
        let outcome = Outcome::parse(&self.outcome)?;

        let die = |f: &Option<NumField>| -> Option<u8> {
            f.as_ref()
                .and_then(NumField::as_i64)
                .filter(|&v| (1..=6).contains(&v))
                .map(|v| v as u8)
        };
        let dice = [die(&self.die1), die(&self.die2), die(&self.die3)];

        let total = self
            .total
            .as_ref()
            .and_then(NumField::as_i64)
            .filter(|&t| (3..=18).contains(&t))
            .map(|t| t as i32)
            .or_else(|| {
                dice.iter()
                    .copied()
                    .map(|d| d.map(|v| v as i32))
                    .sum::<Option<i32>>()
            });

        Some(Event {
            round,
            outcome,
            dice,
            total,
        })
    }
}

/// Convert a raw feed payload into clean events, newest first
pub fn parse_records(records: Vec<FeedRecord>, limit: usize) -> Vec<Event> {
    records
        .into_iter()
        .filter_map(FeedRecord::into_event)
        .take(limit)
        .collect()
}

/// Polling HTTP client over the upstream history endpoint
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
    limit: usize,
    cache: Vec<Event>,
    fetched_at: Option<Instant>,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, limit: usize) -> AugurResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(FeedError::Transport)?;
        Ok(Self {
            client,
            url: url.into(),
            limit,
            cache: Vec::new(),
            fetched_at: None,
        })
    }

    /// Fetch the current history snapshot. Inside the cache TTL the cached
    /// snapshot is returned without a request; on any fetch or decode failure
    /// the stale cache is returned instead of an empty list.
    pub async fn fetch(&mut self) -> Vec<Event> {
        if let Some(at) = self.fetched_at {
            if at.elapsed() < CACHE_TTL && !self.cache.is_empty() {
                return self.cache.clone();
            }
        }

        match self.fetch_fresh().await {
            Ok(events) if !events.is_empty() => {
                self.cache = events.clone();
                self.fetched_at = Some(Instant::now());
                events
            }
            Ok(_) => {
                eprintln!("[feed] upstream returned an empty history, keeping cached snapshot");
                self.cache.clone()
            }
            Err(e) => {
                eprintln!("[feed] fetch failed ({}), keeping cached snapshot", e);
                self.cache.clone()
            }
        }
    }

    async fn fetch_fresh(&self) -> Result<Vec<Event>, FeedError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let records: Vec<FeedRecord> = serde_json::from_str(&body)
            .map_err(|e| FeedError::BadPayload(e.to_string()))?;
        Ok(parse_records(records, self.limit))
    }
}
