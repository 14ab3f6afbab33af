use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for institutions offering admission slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstitutionId(pub String);

impl fmt::Display for InstitutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for an admission round (one published recruitment an
/// applicant applied under).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for a single applicant record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

/// Identifier wrapper for a class within an institution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassId(pub String);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// National identity string used by operators to address one child.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NationalId(pub String);

/// Priority class of an applicant; tier 1 outranks every higher number.
/// Tier membership is decided by the surrounding application, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriorityTier(pub u8);

/// Lifecycle of an applicant inside one admission round. `Cancelled` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicantStatus {
    Pending,
    Accepted,
    Waitlisted,
    Cancelled,
}

impl ApplicantStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicantStatus::Pending => "pending",
            ApplicantStatus::Accepted => "accepted",
            ApplicantStatus::Waitlisted => "waitlisted",
            ApplicantStatus::Cancelled => "cancelled",
        }
    }
}

/// Reason and timestamp recorded when a participant leaves the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationNote {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

/// One child's candidacy for one institution under one admission round.
///
/// `current_order` is present exactly while the applicant occupies a waitlist
/// slot; an administrative reset (see the sequencer) clears it transiently
/// between rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub applicant_id: ApplicantId,
    pub application_id: ApplicationId,
    pub institution_id: InstitutionId,
    pub national_id: NationalId,
    pub tier: PriorityTier,
    pub status: ApplicantStatus,
    pub current_order: Option<u32>,
    pub class_id: Option<ClassId>,
    pub cancellation: Option<CancellationNote>,
}

impl Applicant {
    pub fn view(&self) -> ApplicantView {
        ApplicantView {
            applicant_id: self.applicant_id.clone(),
            application_id: self.application_id.clone(),
            national_id: self.national_id.clone(),
            tier: self.tier,
            status: self.status.label(),
            current_order: self.current_order,
            class_id: self.class_id.clone(),
            cancellation: self.cancellation.clone(),
        }
    }
}

/// Sanitized representation of an applicant for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantView {
    pub applicant_id: ApplicantId,
    pub application_id: ApplicationId,
    pub national_id: NationalId,
    pub tier: PriorityTier,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_order: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<ClassId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<CancellationNote>,
}

/// Read-only capacity view of an institution at the start of a lottery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionCapacity {
    pub total_capacity: u32,
    pub enrolled: u32,
}

/// Per-class capacity snapshot consulted before a manual admission commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCapacity {
    pub capacity: u32,
    pub enrolled: u32,
}

impl ClassCapacity {
    pub fn is_full(&self) -> bool {
        self.enrolled >= self.capacity
    }
}
