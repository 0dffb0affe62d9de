// SPDX-License-Identifier: MIT

//! The Pheromone Entry: a typed, TTL-bearing event/state record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_TTL_SECS: u64 = 300;
pub const BLOCKER_TTL_SECS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Progress,
    Blocker,
    Completion,
    Alert,
    Heartbeat,
    Sync,
    Request,
}

hive_core::simple_display! {
    EntryType {
        Progress => "progress",
        Blocker => "blocker",
        Completion => "completion",
        Alert => "alert",
        Heartbeat => "heartbeat",
        Sync => "sync",
        Request => "request",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PheromoneEntry {
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub data: Value,
    /// Unix seconds at creation.
    pub timestamp: u64,
    pub ttl: u64,
    pub strength: f64,
}

impl PheromoneEntry {
    pub fn new(
        kind: EntryType,
        source: impl Into<String>,
        data: Value,
        target: Option<String>,
        ttl: Option<u64>,
        strength: Option<f64>,
        now: u64,
    ) -> Self {
        let ttl = ttl.unwrap_or(match kind {
            EntryType::Blocker => BLOCKER_TTL_SECS,
            _ => DEFAULT_TTL_SECS,
        });
        Self {
            kind,
            source: source.into(),
            target,
            data,
            timestamp: now,
            ttl,
            strength: strength.unwrap_or(1.0).clamp(0.0, 1.0),
        }
    }

    pub fn age_secs(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }

    /// True once `age >= ttl`; such entries are removed by the next
    /// decay sweep (invariant: an entry with age > ttl is absent from
    /// the live set after the next decay sweep).
    pub fn is_expired(&self, now: u64) -> bool {
        self.age_secs(now) >= self.ttl
    }

    /// `strength * (1 - age/ttl)`, clamped to `[0, 1]`. `ttl == 0` is
    /// treated as already fully decayed.
    pub fn decayed_strength(&self, now: u64) -> f64 {
        if self.ttl == 0 {
            return 0.0;
        }
        let age = self.age_secs(now) as f64;
        let ratio = 1.0 - (age / self.ttl as f64);
        (self.strength * ratio).clamp(0.0, 1.0)
    }

    pub fn targets(&self, id: &str) -> bool {
        match &self.target {
            None => true,
            Some(target) => target == id,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.target.is_none()
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
