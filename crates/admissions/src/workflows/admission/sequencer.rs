//! Waitlist order maintenance.
//!
//! The functions here are pure: they take the current waitlist snapshot and
//! return the applicants whose placement changed, leaving the commit (and the
//! per-institution lock around it) to the service. The contiguity invariant
//! they maintain: the order values of an institution's waitlisted applicants
//! are exactly `1..=k`, no gaps, no duplicates.

use super::domain::{Applicant, ApplicantStatus};

/// Next free position at the end of the line: highest existing order plus
/// one, starting from 1 on an empty waitlist.
pub fn next_order(waitlisted: &[Applicant]) -> u32 {
    waitlisted
        .iter()
        .filter_map(|applicant| applicant.current_order)
        .max()
        .unwrap_or(0)
        + 1
}

/// Number a final waitlist sequence contiguously from 1, marking every entry
/// `Waitlisted`. Positions follow the slice order the lottery produced.
pub fn assign_orders(sequence: Vec<Applicant>) -> Vec<Applicant> {
    sequence
        .into_iter()
        .enumerate()
        .map(|(index, mut applicant)| {
            applicant.status = ApplicantStatus::Waitlisted;
            applicant.current_order = Some(index as u32 + 1);
            applicant
        })
        .collect()
}

/// Clear every order value without touching statuses. Administrative step
/// before a fresh run; a no-op on an already-cleared or empty waitlist.
pub fn reset_orders(waitlisted: &[Applicant]) -> Vec<Applicant> {
    waitlisted
        .iter()
        .filter(|applicant| applicant.current_order.is_some())
        .map(|applicant| {
            let mut cleared = applicant.clone();
            cleared.current_order = None;
            cleared
        })
        .collect()
}

/// Close the gap left at `removed_order`: every entry strictly behind it
/// moves up one position, nothing else changes. Returns only the shifted
/// applicants.
pub fn recompact(waitlisted: &[Applicant], removed_order: u32) -> Vec<Applicant> {
    waitlisted
        .iter()
        .filter(|applicant| matches!(applicant.current_order, Some(order) if order > removed_order))
        .map(|applicant| {
            let mut shifted = applicant.clone();
            shifted.current_order = applicant.current_order.map(|order| order - 1);
            shifted
        })
        .collect()
}
