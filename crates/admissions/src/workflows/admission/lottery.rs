//! Priority-tiered lottery allocation.
//!
//! Two independent draws back every run: the selection draw picks winners
//! inside an oversubscribed tier, and the placement draw re-shuffles each
//! tier's residue before waitlist numbers are assigned. Keeping the draws
//! separate lets a fixed seed pin either one in tests without coupling them.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::domain::{Applicant, ApplicantStatus, PriorityTier};

/// Seeds for the two draws. Unset seeds fall back to OS entropy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawConfig {
    pub selection_seed: Option<u64>,
    pub placement_seed: Option<u64>,
}

impl DrawConfig {
    pub(crate) fn selection_rng(&self) -> StdRng {
        seeded(self.selection_seed)
    }

    pub(crate) fn placement_rng(&self) -> StdRng {
        seeded(self.placement_seed)
    }
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Per-tier acceptance tally reported in the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAcceptance {
    pub tier: PriorityTier,
    pub accepted: u32,
}

/// Transient result of one lottery run. Nothing here is persisted by the
/// engine itself; the committed store batch carries the same transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryOutcome {
    pub success: bool,
    pub message: String,
    pub total_processed: u32,
    pub accepted_by_tier: Vec<TierAcceptance>,
    pub waitlisted_count: u32,
    pub accepted: Vec<Applicant>,
    pub waitlisted: Vec<Applicant>,
}

impl LotteryOutcome {
    pub(crate) fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            total_processed: 0,
            accepted_by_tier: Vec::new(),
            waitlisted_count: 0,
            accepted: Vec::new(),
            waitlisted: Vec::new(),
        }
    }
}

/// Result of walking the tiers: accepted applicants, the waitlist sequence in
/// final (tier-ordered, within-tier shuffled) position order but not yet
/// numbered, and the per-tier tallies.
pub(crate) struct Allocation {
    pub accepted: Vec<Applicant>,
    pub waitlisted: Vec<Applicant>,
    pub accepted_by_tier: Vec<TierAcceptance>,
}

/// Walk the tiers in priority order, accepting until capacity runs out.
///
/// A tier that fits entirely is accepted in base order without touching the
/// selection rng. An oversubscribed tier is shuffled uniformly so its first
/// `open` entries form an unbiased draw; the residue joins the waitlist.
/// Every tier's residue is then re-shuffled with the placement rng so raw
/// list position cannot leak into waitlist order. An empty residue leaves the
/// placement draw untouched.
pub(crate) fn allocate<R: Rng>(
    available: u32,
    pools: BTreeMap<PriorityTier, Vec<Applicant>>,
    selection: &mut R,
    placement: &mut R,
) -> Allocation {
    let mut open = available as usize;
    let mut accepted = Vec::new();
    let mut waitlisted = Vec::new();
    let mut accepted_by_tier = Vec::new();

    for (tier, mut pool) in pools {
        let taken = pool.len().min(open);
        if pool.len() > open {
            pool.shuffle(selection);
        }
        let mut residue = pool.split_off(taken);
        open -= taken;

        accepted_by_tier.push(TierAcceptance {
            tier,
            accepted: taken as u32,
        });

        for applicant in &mut pool {
            applicant.status = ApplicantStatus::Accepted;
            applicant.current_order = None;
        }
        accepted.extend(pool);

        if !residue.is_empty() {
            residue.shuffle(placement);
            waitlisted.extend(residue);
        }
    }

    Allocation {
        accepted,
        waitlisted,
        accepted_by_tier,
    }
}
