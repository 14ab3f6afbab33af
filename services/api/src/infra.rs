use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use admissions::config::DrawSettings;
use admissions::workflows::admission::{
    AdmissionStore, Applicant, ApplicantId, ApplicantStatus, ApplicantUpdate, ApplicationId,
    ClassCapacity, ClassId, DrawConfig, InstitutionCapacity, InstitutionId, NationalId,
    PriorityTier, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn draw_config(settings: DrawSettings) -> DrawConfig {
    DrawConfig {
        selection_seed: settings.selection_seed,
        placement_seed: settings.placement_seed,
    }
}

pub(crate) fn demo_institution() -> InstitutionId {
    InstitutionId("inst-riverside".to_string())
}

pub(crate) fn demo_round() -> ApplicationId {
    ApplicationId("round-2026-autumn".to_string())
}

pub(crate) fn demo_class() -> ClassId {
    ClassId("class-maple".to_string())
}

/// In-memory collaborator store. Stands in for the CRUD application's
/// database in local runs, demos, and tests; `commit` applies each batch
/// all-or-nothing like the real store's transaction would.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAdmissionStore {
    applicants: Arc<Mutex<HashMap<ApplicantId, Applicant>>>,
    institutions: Arc<Mutex<HashMap<InstitutionId, InstitutionCapacity>>>,
    classes: Arc<Mutex<HashMap<ClassId, ClassCapacity>>>,
}

impl InMemoryAdmissionStore {
    /// One institution with two slots already taken, ten pending applicants
    /// across three tiers, one class with room and one at capacity.
    pub(crate) fn seeded() -> Self {
        let store = Self::default();

        store.institutions.lock().expect("store mutex poisoned").insert(
            demo_institution(),
            InstitutionCapacity {
                total_capacity: 6,
                enrolled: 2,
            },
        );

        {
            let mut classes = store.classes.lock().expect("store mutex poisoned");
            classes.insert(
                demo_class(),
                ClassCapacity {
                    capacity: 5,
                    enrolled: 3,
                },
            );
            classes.insert(
                ClassId("class-birch".to_string()),
                ClassCapacity {
                    capacity: 4,
                    enrolled: 4,
                },
            );
        }

        let tiers: [(u8, u32); 3] = [(1, 3), (2, 5), (3, 2)];
        let mut applicants = store.applicants.lock().expect("store mutex poisoned");
        let mut serial = 0;
        for (tier, count) in tiers {
            for _ in 0..count {
                serial += 1;
                let applicant = Applicant {
                    applicant_id: ApplicantId(format!("apl-{serial:04}")),
                    application_id: demo_round(),
                    institution_id: demo_institution(),
                    national_id: NationalId(format!("nid-{serial:04}")),
                    tier: PriorityTier(tier),
                    status: ApplicantStatus::Pending,
                    current_order: None,
                    class_id: None,
                    cancellation: None,
                };
                applicants.insert(applicant.applicant_id.clone(), applicant);
            }
        }
        drop(applicants);

        store
    }
}

impl AdmissionStore for InMemoryAdmissionStore {
    fn institution_capacity(
        &self,
        institution: &InstitutionId,
    ) -> Result<Option<InstitutionCapacity>, StoreError> {
        let guard = self.institutions.lock().expect("store mutex poisoned");
        Ok(guard.get(institution).copied())
    }

    fn class_capacity(&self, class: &ClassId) -> Result<Option<ClassCapacity>, StoreError> {
        let guard = self.classes.lock().expect("store mutex poisoned");
        Ok(guard.get(class).copied())
    }

    fn pending_by_tier(
        &self,
        institution: &InstitutionId,
    ) -> Result<BTreeMap<PriorityTier, Vec<Applicant>>, StoreError> {
        let guard = self.applicants.lock().expect("store mutex poisoned");
        let mut pools: BTreeMap<PriorityTier, Vec<Applicant>> = BTreeMap::new();
        for applicant in guard.values() {
            if applicant.institution_id == *institution
                && applicant.status == ApplicantStatus::Pending
            {
                pools
                    .entry(applicant.tier)
                    .or_default()
                    .push(applicant.clone());
            }
        }
        for pool in pools.values_mut() {
            pool.sort_by(|a, b| a.applicant_id.cmp(&b.applicant_id));
        }
        Ok(pools)
    }

    fn waitlisted(&self, institution: &InstitutionId) -> Result<Vec<Applicant>, StoreError> {
        let guard = self.applicants.lock().expect("store mutex poisoned");
        let mut entries: Vec<Applicant> = guard
            .values()
            .filter(|a| a.institution_id == *institution && a.status == ApplicantStatus::Waitlisted)
            .cloned()
            .collect();
        entries.sort_by_key(|a| (a.current_order.unwrap_or(u32::MAX), a.applicant_id.clone()));
        Ok(entries)
    }

    fn application_waitlist(
        &self,
        application: &ApplicationId,
    ) -> Result<Vec<Applicant>, StoreError> {
        let guard = self.applicants.lock().expect("store mutex poisoned");
        let mut entries: Vec<Applicant> = guard
            .values()
            .filter(|a| a.application_id == *application && a.status == ApplicantStatus::Waitlisted)
            .cloned()
            .collect();
        entries.sort_by_key(|a| (a.current_order.unwrap_or(u32::MAX), a.applicant_id.clone()));
        Ok(entries)
    }

    fn find_applicant(
        &self,
        application: &ApplicationId,
        national_id: &NationalId,
    ) -> Result<Option<Applicant>, StoreError> {
        let guard = self.applicants.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .find(|a| a.application_id == *application && a.national_id == *national_id)
            .cloned())
    }

    fn commit(&self, updates: &[ApplicantUpdate]) -> Result<(), StoreError> {
        let mut guard = self.applicants.lock().expect("store mutex poisoned");
        if updates
            .iter()
            .any(|update| !guard.contains_key(&update.applicant_id))
        {
            return Err(StoreError::UnknownApplicant);
        }
        for update in updates {
            let record = guard
                .get_mut(&update.applicant_id)
                .expect("existence checked above");
            record.status = update.status;
            record.current_order = update.current_order;
            record.class_id = update.class_id.clone();
            record.cancellation = update.cancellation.clone();
        }
        Ok(())
    }
}
