//! Priority pool normalization.
//!
//! Tier membership and within-tier base order are supplied by the store; this
//! module only guarantees that iteration over the pools is total in ascending
//! tier order, with empty pools materialized for gaps.

use std::collections::BTreeMap;

use super::domain::{Applicant, PriorityTier};

/// Fill in every tier from 1 through the highest tier the store returned.
pub fn tier_pools(
    raw: BTreeMap<PriorityTier, Vec<Applicant>>,
) -> BTreeMap<PriorityTier, Vec<Applicant>> {
    let highest = raw.keys().map(|tier| tier.0).max().unwrap_or(0);
    let mut pools = raw;
    for tier in 1..=highest {
        pools.entry(PriorityTier(tier)).or_default();
    }
    pools
}

pub fn total_pending(pools: &BTreeMap<PriorityTier, Vec<Applicant>>) -> u32 {
    pools.values().map(|pool| pool.len() as u32).sum()
}
