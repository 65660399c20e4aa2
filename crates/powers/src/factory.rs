//! Briefcase scheduling, offers, inventories, and timed power effects.
//!
//! The factory owns everything power-related for one room: the briefcase
//! timetable computed at setup, the pending offer each client may select
//! from, per-client inventories, and the set of running timed powers. The
//! room interprets effects; the factory guarantees each timed power ends
//! exactly once, whether by expiry or by disposal.

use std::collections::HashMap;

use pricing::SeededPrng;
use tracing::debug;
use types::{ParticipantId, Timestamp};

use crate::catalog::{PowerSpec, CATALOGUE};

/// Maximum briefcases per game.
const MAX_BRIEFCASES: usize = 8;
/// Minimum spacing between briefcases, and the buffer before game end (ms).
const BRIEFCASE_SPACING_MS: u64 = 10_000;
/// Powers offered per briefcase.
pub const OFFER_SIZE: usize = 3;

/// A power sitting in a client's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredPower {
    pub uuid: u64,
    pub spec: &'static PowerSpec,
}

/// State a running power must restore when it ends.
#[derive(Debug, Clone, PartialEq)]
pub enum PowerState {
    /// Restore the generator's volatility to this value.
    RestoreVolatility { previous: f64 },
    /// Re-enable trading for these participants.
    ReenableTrading { targets: Vec<ParticipantId> },
}

/// A timed power currently in effect.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePower {
    pub uuid: u64,
    pub spec: &'static PowerSpec,
    pub initiator: ParticipantId,
    pub ticks_elapsed: u32,
    pub state: PowerState,
}

/// Outcome of a briefcase selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selected {
    /// Fire the effect immediately and discard the power.
    Instant(&'static PowerSpec),
    /// The power went into the client's inventory.
    Stored(StoredPower),
}

/// One clock tick's output.
#[derive(Debug, Clone, Default)]
pub struct PowerClockOutput {
    /// A briefcase timestamp elapsed; the room should offer every client.
    pub briefcase_due: bool,
    /// Timed powers that just expired; apply their end state exactly once.
    pub ended: Vec<ActivePower>,
}

/// Per-room power factory.
#[derive(Debug, Clone)]
pub struct PowerFactory {
    rng: SeededPrng,
    briefcase_times: Vec<Timestamp>,
    pending_offers: HashMap<ParticipantId, Vec<&'static PowerSpec>>,
    inventories: HashMap<ParticipantId, Vec<StoredPower>>,
    active: Vec<ActivePower>,
    next_uuid: u64,
}

impl PowerFactory {
    pub fn new(rng: SeededPrng) -> Self {
        Self {
            rng,
            briefcase_times: Vec::new(),
            pending_offers: HashMap::new(),
            inventories: HashMap::new(),
            active: Vec::new(),
            next_uuid: 1,
        }
    }

    /// Compute the briefcase timetable for a game starting at `start` and
    /// running `duration_ms`: up to 8 drops, ≥ 10 s apart, the last one
    /// ≥ 10 s before the end.
    pub fn plan_briefcases(&mut self, start: Timestamp, duration_ms: u64) {
        self.briefcase_times.clear();
        let usable = duration_ms.saturating_sub(BRIEFCASE_SPACING_MS);
        if usable < BRIEFCASE_SPACING_MS {
            return;
        }
        let count = ((usable / BRIEFCASE_SPACING_MS).saturating_sub(1) as usize).min(MAX_BRIEFCASES);
        if count == 0 {
            return;
        }
        let interval = usable / (count as u64 + 1);
        for i in 1..=count as u64 {
            self.briefcase_times.push(start + i * interval);
        }
    }

    /// Scheduled briefcase timestamps still to come.
    pub fn briefcase_times(&self) -> &[Timestamp] {
        &self.briefcase_times
    }

    /// Advance one clock second.
    pub fn on_clock(&mut self, now: Timestamp, paused: bool) -> PowerClockOutput {
        if paused {
            return PowerClockOutput::default();
        }

        let briefcase_due = match self.briefcase_times.first() {
            Some(&at) if now >= at => {
                self.briefcase_times.remove(0);
                true
            }
            _ => false,
        };

        let mut ended = Vec::new();
        let mut still_active = Vec::with_capacity(self.active.len());
        for mut power in self.active.drain(..) {
            power.ticks_elapsed += 1;
            if power.ticks_elapsed >= power.spec.duration_ticks {
                ended.push(power);
            } else {
                still_active.push(power);
            }
        }
        self.active = still_active;

        PowerClockOutput { briefcase_due, ended }
    }

    /// Draw a briefcase offer for one client: [`OFFER_SIZE`] pairwise
    /// distinct specs, weighted by `1 / rarity`, without replacement.
    /// Replaces any previous unanswered offer.
    pub fn offer(&mut self, client: ParticipantId) -> Vec<&'static PowerSpec> {
        let mut pool: Vec<&'static PowerSpec> = CATALOGUE.iter().collect();
        let mut picked = Vec::with_capacity(OFFER_SIZE);
        while picked.len() < OFFER_SIZE && !pool.is_empty() {
            let total: f64 = pool.iter().map(|s| 1.0 / s.rarity as f64).sum();
            let mut mark = self.rng.uniform() * total;
            let mut chosen = pool.len() - 1;
            for (i, spec) in pool.iter().enumerate() {
                mark -= 1.0 / spec.rarity as f64;
                if mark <= 0.0 {
                    chosen = i;
                    break;
                }
            }
            picked.push(pool.remove(chosen));
        }
        self.pending_offers.insert(client, picked.clone());
        picked
    }

    /// Resolve a client's selection from their pending offer.
    pub fn select(&mut self, client: ParticipantId, index: usize) -> Option<Selected> {
        let offer = self.pending_offers.remove(&client)?;
        let spec = *offer.get(index)?;
        if spec.is_instant {
            debug!(client = %client, power = spec.id, "instant power selected");
            return Some(Selected::Instant(spec));
        }
        let stored = StoredPower {
            uuid: self.next_uuid,
            spec,
        };
        self.next_uuid += 1;
        self.inventories.entry(client).or_default().push(stored);
        Some(Selected::Stored(stored))
    }

    /// Take a power out of a client's inventory for consumption.
    pub fn consume(&mut self, client: ParticipantId, uuid: u64) -> Option<StoredPower> {
        let inventory = self.inventories.get_mut(&client)?;
        let pos = inventory.iter().position(|p| p.uuid == uuid)?;
        Some(inventory.remove(pos))
    }

    /// Register a consumed timed power with the state its end must restore.
    pub fn activate(&mut self, power: ActivePower) {
        self.active.push(power);
    }

    /// A client's current inventory.
    pub fn inventory(&self, client: ParticipantId) -> &[StoredPower] {
        self.inventories
            .get(&client)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Timed powers currently in effect.
    pub fn active(&self) -> &[ActivePower] {
        &self.active
    }

    /// Drain every running power so its end state can fire during room
    /// disposal. After this the factory holds no active powers.
    pub fn dispose(&mut self) -> Vec<ActivePower> {
        self.briefcase_times.clear();
        self.pending_offers.clear();
        std::mem::take(&mut self.active)
    }
}
