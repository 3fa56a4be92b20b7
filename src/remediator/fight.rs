//! Fight detection: recognizing objects that keep flapping between declared
//! and actual state because this reconciler and another controller are both
//! rewriting them.
//!
//! The detector is advisory and runs off the hot path. It does not know
//! which controller is fighting, only that writes to one object keep landing
//! faster than remediation can settle. A fight is a transient status: it is
//! reported while active and retracted automatically once the writes stop.

use std::collections::VecDeque;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;
use tracing::warn;

use crate::config::FightConfig;
use crate::errors::FightError;
use crate::meta::ObjectId;
use crate::metrics;

/// Per-object window of recent observed writes plus the fighting latch.
#[derive(Debug)]
struct FightRecord {
    writes: VecDeque<Instant>,
    last_write: Instant,
    fighting: bool,
}

impl FightRecord {
    fn new(now: Instant) -> Self {
        FightRecord {
            writes: VecDeque::new(),
            last_write: now,
            fighting: false,
        }
    }

    fn settle_if_quiet(
        &mut self,
        now: Instant,
        cooldown: Duration,
    ) -> bool {
        if self.fighting && now.saturating_duration_since(self.last_write) >= cooldown {
            self.fighting = false;
            self.writes.clear();
            return true;
        }
        false
    }
}

pub struct FightDetector {
    records: DashMap<ObjectId, FightRecord>,
    window: Duration,
    threshold: usize,
    cooldown: Duration,
}

impl FightDetector {
    pub fn new(config: &FightConfig) -> Self {
        FightDetector {
            records: DashMap::new(),
            window: config.window(),
            threshold: config.threshold,
            cooldown: config.cooldown(),
        }
    }

    /// Observes one write to the object and returns whether the object is
    /// now classified as fighting.
    pub fn record_update(
        &self,
        id: &ObjectId,
    ) -> bool {
        let now = Instant::now();
        let mut entry = self
            .records
            .entry(id.clone())
            .or_insert_with(|| FightRecord::new(now));
        let record = entry.value_mut();

        // A fight that went quiet for a full cooldown is over; this write
        // starts a fresh window rather than resurrecting the old condition.
        if record.settle_if_quiet(now, self.cooldown) {
            debug!("fight over {} settled before new write", id);
        }

        record.writes.push_back(now);
        record.last_write = now;
        while let Some(oldest) = record.writes.front() {
            if now.saturating_duration_since(*oldest) > self.window {
                record.writes.pop_front();
            } else {
                break;
            }
        }

        if !record.fighting && record.writes.len() > self.threshold {
            record.fighting = true;
            let err = FightError::new(id.clone());
            warn!("remediator detected a fight: {}", err);
            metrics::FIGHTS_DETECTED_METRIC
                .with_label_values(&[&id.kind])
                .inc();
        }
        record.fighting
    }

    /// Whether the object is currently fighting. Retracts the condition if
    /// no write has landed for a full cooldown.
    pub fn is_fighting(
        &self,
        id: &ObjectId,
    ) -> bool {
        let now = Instant::now();
        match self.records.get_mut(id) {
            Some(mut entry) => {
                let record = entry.value_mut();
                if record.settle_if_quiet(now, self.cooldown) {
                    debug!("fight over {} settled", id);
                }
                record.fighting
            }
            None => false,
        }
    }

    /// Stable-order snapshot of every active fight, for status reporting.
    /// Settled fights are retracted as a side effect.
    pub fn fight_errors(&self) -> Vec<FightError> {
        let now = Instant::now();
        let mut errs = Vec::new();
        for mut entry in self.records.iter_mut() {
            let settled = entry.value_mut().settle_if_quiet(now, self.cooldown);
            if settled {
                debug!("fight over {} settled", entry.key());
            }
            if entry.value().fighting {
                errs.push(FightError::new(entry.key().clone()));
            }
        }
        errs.sort_by(|a, b| a.id.cmp(&b.id));
        errs
    }

    pub fn has_fights(&self) -> bool {
        !self.fight_errors().is_empty()
    }
}
