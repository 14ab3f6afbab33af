use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::capacity::available_slots;
use super::domain::{
    Applicant, ApplicantStatus, ApplicationId, CancellationNote, ClassId, InstitutionId,
    NationalId, PriorityTier,
};
use super::lottery::{self, DrawConfig, LotteryOutcome};
use super::pool;
use super::sequencer;
use super::store::{AdmissionStore, ApplicantUpdate, StoreError};

/// Registry of per-institution mutexes. Every order-mutating operation takes
/// its institution's lock for the full read-compute-commit span, so
/// incremental recompaction, next-order assignment, and full lottery runs
/// serialize against each other while distinct institutions proceed in
/// parallel.
#[derive(Default)]
struct InstitutionLocks {
    registry: Mutex<HashMap<InstitutionId, Arc<Mutex<()>>>>,
}

impl InstitutionLocks {
    fn for_institution(&self, institution: &InstitutionId) -> Arc<Mutex<()>> {
        let mut registry = self.registry.lock().expect("lock registry poisoned");
        registry.entry(institution.clone()).or_default().clone()
    }
}

/// Service facade over the allocation engine: lottery runs, manual admission,
/// next-order assignment, ordering reset, cancellation, and statistics.
pub struct AdmissionService<S> {
    store: Arc<S>,
    draw: DrawConfig,
    locks: InstitutionLocks,
}

impl<S> AdmissionService<S>
where
    S: AdmissionStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_draw_config(store, DrawConfig::default())
    }

    pub fn with_draw_config(store: Arc<S>, draw: DrawConfig) -> Self {
        Self {
            store,
            draw,
            locks: InstitutionLocks::default(),
        }
    }

    /// Run the priority-tiered lottery for an institution and commit every
    /// resulting transition as one batch.
    pub fn run_lottery(
        &self,
        institution_id: &InstitutionId,
    ) -> Result<LotteryOutcome, AdmissionServiceError> {
        require_id(&institution_id.0, "institution id")?;

        let lock = self.locks.for_institution(institution_id);
        let _guard = lock.lock().expect("institution mutex poisoned");

        let capacity = self
            .store
            .institution_capacity(institution_id)?
            .ok_or_else(|| AdmissionServiceError::InstitutionNotFound(institution_id.clone()))?;

        let pools = pool::tier_pools(self.store.pending_by_tier(institution_id)?);
        let total_processed = pool::total_pending(&pools);
        if total_processed == 0 {
            return Ok(LotteryOutcome::failure(
                "no pending applicants for this institution",
            ));
        }

        let open = available_slots(capacity.total_capacity, capacity.enrolled);
        let mut selection = self.draw.selection_rng();
        let mut placement = self.draw.placement_rng();
        let allocation = lottery::allocate(open, pools, &mut selection, &mut placement);
        let waitlisted = sequencer::assign_orders(allocation.waitlisted);

        let mut updates: Vec<ApplicantUpdate> =
            Vec::with_capacity(allocation.accepted.len() + waitlisted.len());
        updates.extend(allocation.accepted.iter().map(ApplicantUpdate::from_applicant));
        updates.extend(waitlisted.iter().map(ApplicantUpdate::from_applicant));

        // Any order value left behind by an earlier sequence is overwritten
        // in the same batch, so the new numbering is the only one that
        // survives the commit.
        let renumbered: HashSet<_> = waitlisted
            .iter()
            .map(|applicant| applicant.applicant_id.clone())
            .collect();
        for stale in self.store.waitlisted(institution_id)? {
            if stale.current_order.is_some() && !renumbered.contains(&stale.applicant_id) {
                updates.push(ApplicantUpdate::order_cleared(&stale));
            }
        }

        self.store.commit(&updates)?;

        info!(
            institution = %institution_id,
            accepted = allocation.accepted.len(),
            waitlisted = waitlisted.len(),
            "lottery run committed"
        );

        Ok(LotteryOutcome {
            success: true,
            message: "lottery completed".to_string(),
            total_processed,
            accepted_by_tier: allocation.accepted_by_tier,
            waitlisted_count: waitlisted.len() as u32,
            accepted: allocation.accepted,
            waitlisted,
        })
    }

    /// Admit one waitlisted applicant into a specific class, bypassing strict
    /// order. Bypassed applicants are reported, never blocking.
    pub fn manual_admit(
        &self,
        application_id: &ApplicationId,
        national_id: &NationalId,
        class_id: &ClassId,
    ) -> Result<ManualAdmitOutcome, AdmissionServiceError> {
        require_id(&application_id.0, "application id")?;
        require_id(&national_id.0, "national id")?;
        require_id(&class_id.0, "class id")?;

        let located = self
            .store
            .find_applicant(application_id, national_id)?
            .ok_or(AdmissionServiceError::ApplicantNotFound)?;

        let lock = self.locks.for_institution(&located.institution_id);
        let _guard = lock.lock().expect("institution mutex poisoned");

        let round_waitlist = self.store.application_waitlist(application_id)?;
        let target = round_waitlist
            .iter()
            .find(|applicant| applicant.national_id == *national_id)
            .cloned()
            .ok_or(AdmissionServiceError::ApplicantNotFound)?;
        let removed_order = target.current_order.ok_or_else(|| {
            AdmissionServiceError::OrderingInconsistent(target.institution_id.clone())
        })?;

        // Everyone ahead of the target should have been admitted first under
        // strict order; the set is advisory only.
        let bypassed = round_waitlist
            .iter()
            .filter(|applicant| {
                matches!(applicant.current_order, Some(order) if order < removed_order)
            })
            .count();

        let class = self
            .store
            .class_capacity(class_id)?
            .ok_or_else(|| AdmissionServiceError::ClassNotFound(class_id.clone()))?;
        if class.is_full() {
            return Err(AdmissionServiceError::ClassFull(class_id.clone()));
        }

        let mut admitted = target.clone();
        admitted.status = ApplicantStatus::Accepted;
        admitted.current_order = None;
        admitted.class_id = Some(class_id.clone());

        let mut updates = vec![ApplicantUpdate::from_applicant(&admitted)];
        let peers: Vec<Applicant> = self
            .store
            .waitlisted(&target.institution_id)?
            .into_iter()
            .filter(|applicant| applicant.applicant_id != target.applicant_id)
            .collect();
        updates.extend(
            sequencer::recompact(&peers, removed_order)
                .iter()
                .map(ApplicantUpdate::from_applicant),
        );

        self.store.commit(&updates)?;

        info!(
            institution = %target.institution_id,
            class = %class_id,
            bypassed,
            "manual admission committed"
        );

        let warning = (bypassed > 0)
            .then(|| format!("{bypassed} waitlisted applicants were not admitted in order"));
        Ok(ManualAdmitOutcome {
            success: true,
            message: format!("applicant admitted into class {class_id}"),
            warning,
        })
    }

    /// Place a pending applicant at the end of the institution's waitlist.
    pub fn assign_next_order(
        &self,
        institution_id: &InstitutionId,
        application_id: &ApplicationId,
        national_id: &NationalId,
    ) -> Result<AssignOrderOutcome, AdmissionServiceError> {
        require_id(&institution_id.0, "institution id")?;
        require_id(&application_id.0, "application id")?;
        require_id(&national_id.0, "national id")?;

        let lock = self.locks.for_institution(institution_id);
        let _guard = lock.lock().expect("institution mutex poisoned");

        let applicant = self
            .store
            .find_applicant(application_id, national_id)?
            .ok_or(AdmissionServiceError::ApplicantNotFound)?;
        if applicant.institution_id != *institution_id {
            return Err(AdmissionServiceError::Validation(
                "applicant does not belong to this institution".to_string(),
            ));
        }
        match applicant.status {
            ApplicantStatus::Pending => {}
            ApplicantStatus::Waitlisted => {
                return Err(AdmissionServiceError::Validation(
                    "applicant already holds a waitlist position".to_string(),
                ))
            }
            ApplicantStatus::Accepted | ApplicantStatus::Cancelled => {
                return Err(AdmissionServiceError::Validation(
                    "applicant is not awaiting placement".to_string(),
                ))
            }
        }

        let order = sequencer::next_order(&self.store.waitlisted(institution_id)?);
        let mut placed = applicant;
        placed.status = ApplicantStatus::Waitlisted;
        placed.current_order = Some(order);
        self.store.commit(&[ApplicantUpdate::from_applicant(&placed)])?;

        info!(institution = %institution_id, order, "applicant appended to waitlist");

        Ok(AssignOrderOutcome {
            success: true,
            current_order: order,
        })
    }

    /// Clear every waitlist order for an institution. Statuses stay as they
    /// are; repeating the reset on an already-cleared waitlist is a no-op.
    pub fn reset_lottery(
        &self,
        institution_id: &InstitutionId,
    ) -> Result<ResetOutcome, AdmissionServiceError> {
        require_id(&institution_id.0, "institution id")?;

        let lock = self.locks.for_institution(institution_id);
        let _guard = lock.lock().expect("institution mutex poisoned");

        self.store
            .institution_capacity(institution_id)?
            .ok_or_else(|| AdmissionServiceError::InstitutionNotFound(institution_id.clone()))?;

        let waitlisted = self.store.waitlisted(institution_id)?;
        let cleared = sequencer::reset_orders(&waitlisted);
        let updates: Vec<ApplicantUpdate> =
            cleared.iter().map(ApplicantUpdate::from_applicant).collect();
        self.store.commit(&updates)?;

        info!(institution = %institution_id, cleared = cleared.len(), "waitlist ordering reset");

        Ok(ResetOutcome {
            success: true,
            message: format!("cleared ordering for {} waitlisted applicants", cleared.len()),
        })
    }

    /// Cancel a participant and close any gap it leaves in the waitlist.
    pub fn cancel_participant(
        &self,
        application_id: &ApplicationId,
        national_id: &NationalId,
        reason: &str,
    ) -> Result<Applicant, AdmissionServiceError> {
        require_id(&application_id.0, "application id")?;
        require_id(&national_id.0, "national id")?;
        if reason.trim().is_empty() {
            return Err(AdmissionServiceError::Validation(
                "cancellation reason must not be blank".to_string(),
            ));
        }

        let located = self
            .store
            .find_applicant(application_id, national_id)?
            .ok_or(AdmissionServiceError::ParticipantNotFound)?;

        let lock = self.locks.for_institution(&located.institution_id);
        let _guard = lock.lock().expect("institution mutex poisoned");

        let participant = self
            .store
            .find_applicant(application_id, national_id)?
            .ok_or(AdmissionServiceError::ParticipantNotFound)?;
        if participant.status == ApplicantStatus::Cancelled {
            return Err(AdmissionServiceError::AlreadyCancelled);
        }

        let mut cancelled = participant.clone();
        cancelled.status = ApplicantStatus::Cancelled;
        cancelled.current_order = None;
        cancelled.cancellation = Some(CancellationNote {
            reason: reason.trim().to_string(),
            cancelled_at: Utc::now(),
        });

        let mut updates = vec![ApplicantUpdate::from_applicant(&cancelled)];
        if participant.status == ApplicantStatus::Waitlisted {
            if let Some(removed_order) = participant.current_order {
                let peers: Vec<Applicant> = self
                    .store
                    .waitlisted(&participant.institution_id)?
                    .into_iter()
                    .filter(|applicant| applicant.applicant_id != participant.applicant_id)
                    .collect();
                updates.extend(
                    sequencer::recompact(&peers, removed_order)
                        .iter()
                        .map(ApplicantUpdate::from_applicant),
                );
            }
        }

        self.store.commit(&updates)?;

        info!(
            institution = %participant.institution_id,
            was = participant.status.label(),
            "participant cancelled"
        );

        Ok(cancelled)
    }

    /// Capacity plus per-tier pending/waitlisted tallies for dashboards.
    pub fn statistics(
        &self,
        institution_id: &InstitutionId,
    ) -> Result<StatisticsView, AdmissionServiceError> {
        require_id(&institution_id.0, "institution id")?;

        let capacity = self
            .store
            .institution_capacity(institution_id)?
            .ok_or_else(|| AdmissionServiceError::InstitutionNotFound(institution_id.clone()))?;

        let mut tiers: BTreeMap<PriorityTier, TierCount> = BTreeMap::new();
        for (tier, pending) in pool::tier_pools(self.store.pending_by_tier(institution_id)?) {
            tiers.insert(
                tier,
                TierCount {
                    tier,
                    pending: pending.len() as u32,
                    waitlisted: 0,
                },
            );
        }
        for applicant in self.store.waitlisted(institution_id)? {
            tiers
                .entry(applicant.tier)
                .or_insert(TierCount {
                    tier: applicant.tier,
                    pending: 0,
                    waitlisted: 0,
                })
                .waitlisted += 1;
        }

        Ok(StatisticsView {
            total_capacity: capacity.total_capacity,
            enrolled: capacity.enrolled,
            available: capacity.available(),
            tier_counts: tiers.into_values().collect(),
        })
    }
}

fn require_id(value: &str, field: &str) -> Result<(), AdmissionServiceError> {
    if value.trim().is_empty() {
        return Err(AdmissionServiceError::Validation(format!(
            "{field} must not be blank"
        )));
    }
    Ok(())
}

/// Outcome of a manual admission; `warning` reports bypassed applicants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualAdmitOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Outcome of appending an applicant to the waitlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssignOrderOutcome {
    pub success: bool,
    pub current_order: u32,
}

/// Outcome of an ordering reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetOutcome {
    pub success: bool,
    pub message: String,
}

/// Per-tier tallies reported by the statistics operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierCount {
    pub tier: PriorityTier,
    pub pending: u32,
    pub waitlisted: u32,
}

/// Institution-level statistics for operator dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsView {
    pub total_capacity: u32,
    pub enrolled: u32,
    pub available: u32,
    pub tier_counts: Vec<TierCount>,
}

/// Error raised by the admission service.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionServiceError {
    #[error("institution {0} not found")]
    InstitutionNotFound(InstitutionId),
    #[error("applicant not found")]
    ApplicantNotFound,
    #[error("participant not found")]
    ParticipantNotFound,
    #[error("class {0} not found")]
    ClassNotFound(ClassId),
    #[error("admission failed: class {0} is full")]
    ClassFull(ClassId),
    #[error("participant has already cancelled")]
    AlreadyCancelled,
    #[error("waitlist ordering is inconsistent for institution {0}")]
    OrderingInconsistent(InstitutionId),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
