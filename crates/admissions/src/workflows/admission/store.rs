use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    Applicant, ApplicantId, ApplicantStatus, ApplicationId, CancellationNote, ClassCapacity,
    ClassId, InstitutionCapacity, InstitutionId, NationalId, PriorityTier,
};

/// One record-level transition computed by the engine. The store persists
/// each batch atomically: either every update in the slice lands or none do,
/// which is what keeps a failed write from leaving a half-recompacted
/// waitlist behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantUpdate {
    pub applicant_id: ApplicantId,
    pub status: ApplicantStatus,
    pub current_order: Option<u32>,
    pub class_id: Option<ClassId>,
    pub cancellation: Option<CancellationNote>,
}

impl ApplicantUpdate {
    /// Capture an applicant's mutated placement fields verbatim.
    pub fn from_applicant(applicant: &Applicant) -> Self {
        Self {
            applicant_id: applicant.applicant_id.clone(),
            status: applicant.status,
            current_order: applicant.current_order,
            class_id: applicant.class_id.clone(),
            cancellation: applicant.cancellation.clone(),
        }
    }

    /// Clear a stale order value while leaving everything else in place.
    pub fn order_cleared(applicant: &Applicant) -> Self {
        Self {
            applicant_id: applicant.applicant_id.clone(),
            status: applicant.status,
            current_order: None,
            class_id: applicant.class_id.clone(),
            cancellation: applicant.cancellation.clone(),
        }
    }
}

/// Storage abstraction over the surrounding CRUD application. The engine only
/// ever reads snapshots and commits update batches through this trait, so the
/// whole workflow can be exercised against in-memory doubles.
pub trait AdmissionStore: Send + Sync {
    /// Capacity snapshot for an institution, `None` when it does not exist.
    fn institution_capacity(
        &self,
        institution: &InstitutionId,
    ) -> Result<Option<InstitutionCapacity>, StoreError>;

    /// Capacity snapshot for a class, `None` when it does not exist.
    fn class_capacity(&self, class: &ClassId) -> Result<Option<ClassCapacity>, StoreError>;

    /// Pending applicants of an institution grouped by priority tier.
    /// Within-tier order is the store's stable base order.
    fn pending_by_tier(
        &self,
        institution: &InstitutionId,
    ) -> Result<BTreeMap<PriorityTier, Vec<Applicant>>, StoreError>;

    /// Every waitlisted applicant of an institution, sorted by ascending
    /// `current_order` (entries with a cleared order sort last).
    fn waitlisted(&self, institution: &InstitutionId) -> Result<Vec<Applicant>, StoreError>;

    /// The ordered waitlist of one admission round.
    fn application_waitlist(
        &self,
        application: &ApplicationId,
    ) -> Result<Vec<Applicant>, StoreError>;

    /// Look up one applicant by round and national identity.
    fn find_applicant(
        &self,
        application: &ApplicationId,
        national_id: &NationalId,
    ) -> Result<Option<Applicant>, StoreError>;

    /// Apply a batch of updates atomically.
    fn commit(&self, updates: &[ApplicantUpdate]) -> Result<(), StoreError>;
}

/// Error enumeration for collaborator store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("update batch references an unknown applicant")]
    UnknownApplicant,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
