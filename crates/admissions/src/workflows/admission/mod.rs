//! Admission allocation and waitlist ordering engine.
//!
//! Turns a pool of pending applicants into accepted, waitlisted, and
//! cancelled outcomes under hard capacity constraints, priority tiers,
//! randomized tie-breaking, manual override, and order-preserving
//! recomputation on cancellation. Everything the engine needs from the
//! surrounding CRUD application is reached through [`AdmissionStore`]; the
//! engine computes transitions and commits them as atomic batches.

pub(crate) mod capacity;
pub mod domain;
pub(crate) mod lottery;
pub(crate) mod pool;
pub(crate) mod sequencer;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    Applicant, ApplicantId, ApplicantStatus, ApplicantView, ApplicationId, CancellationNote,
    ClassCapacity, ClassId, InstitutionCapacity, InstitutionId, NationalId, PriorityTier,
};
pub use lottery::{DrawConfig, LotteryOutcome, TierAcceptance};
pub use router::admission_router;
pub use service::{
    AdmissionService, AdmissionServiceError, AssignOrderOutcome, ManualAdmitOutcome, ResetOutcome,
    StatisticsView, TierCount,
};
pub use store::{AdmissionStore, ApplicantUpdate, StoreError};
