use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::admission::domain::{
    Applicant, ApplicantId, ApplicantStatus, ApplicationId, ClassCapacity, ClassId,
    InstitutionCapacity, InstitutionId, NationalId, PriorityTier,
};
use crate::workflows::admission::store::{AdmissionStore, ApplicantUpdate, StoreError};
use crate::workflows::admission::{AdmissionService, DrawConfig};

pub(super) fn institution() -> InstitutionId {
    InstitutionId("inst-001".to_string())
}

pub(super) fn round() -> ApplicationId {
    ApplicationId("round-2026-spring".to_string())
}

pub(super) fn class() -> ClassId {
    ClassId("class-sunflower".to_string())
}

pub(super) fn national_id(suffix: &str) -> NationalId {
    NationalId(format!("nid-{suffix}"))
}

/// Pending applicant fixture keyed by a short suffix.
pub(super) fn applicant(suffix: &str, tier: u8) -> Applicant {
    Applicant {
        applicant_id: ApplicantId(format!("apl-{suffix}")),
        application_id: round(),
        institution_id: institution(),
        national_id: national_id(suffix),
        tier: PriorityTier(tier),
        status: ApplicantStatus::Pending,
        current_order: None,
        class_id: None,
        cancellation: None,
    }
}

/// Waitlisted applicant fixture with a fixed position.
pub(super) fn waitlisted(suffix: &str, tier: u8, order: u32) -> Applicant {
    let mut applicant = applicant(suffix, tier);
    applicant.status = ApplicantStatus::Waitlisted;
    applicant.current_order = Some(order);
    applicant
}

/// In-memory store double mirroring the collaborator contract, including
/// all-or-nothing commit semantics.
#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    applicants: Arc<Mutex<HashMap<ApplicantId, Applicant>>>,
    institutions: Arc<Mutex<HashMap<InstitutionId, InstitutionCapacity>>>,
    classes: Arc<Mutex<HashMap<ClassId, ClassCapacity>>>,
}

impl MemoryStore {
    pub(super) fn with_institution(capacity: InstitutionCapacity) -> Self {
        let store = Self::default();
        store
            .institutions
            .lock()
            .expect("store mutex poisoned")
            .insert(institution(), capacity);
        store
    }

    pub(super) fn insert_applicants(&self, items: impl IntoIterator<Item = Applicant>) {
        let mut guard = self.applicants.lock().expect("store mutex poisoned");
        for item in items {
            guard.insert(item.applicant_id.clone(), item);
        }
    }

    pub(super) fn insert_class(&self, id: ClassId, capacity: ClassCapacity) {
        self.classes
            .lock()
            .expect("store mutex poisoned")
            .insert(id, capacity);
    }

    pub(super) fn applicant(&self, id: &ApplicantId) -> Applicant {
        self.applicants
            .lock()
            .expect("store mutex poisoned")
            .get(id)
            .cloned()
            .expect("applicant present in store")
    }

    /// Current waitlist orders for the fixture institution, ascending.
    pub(super) fn waitlist_orders(&self) -> Vec<u32> {
        let guard = self.applicants.lock().expect("store mutex poisoned");
        let mut orders: Vec<u32> = guard
            .values()
            .filter(|a| a.institution_id == institution() && a.status == ApplicantStatus::Waitlisted)
            .filter_map(|a| a.current_order)
            .collect();
        orders.sort_unstable();
        orders
    }
}

impl AdmissionStore for MemoryStore {
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
                pools.entry(applicant.tier).or_default().push(applicant.clone());
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
            .filter(|a| {
                a.institution_id == *institution && a.status == ApplicantStatus::Waitlisted
            })
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
            .filter(|a| {
                a.application_id == *application && a.status == ApplicantStatus::Waitlisted
            })
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

/// Store double that fails every call, for data-access error paths.
pub(super) struct UnavailableStore;

impl AdmissionStore for UnavailableStore {
    fn institution_capacity(
        &self,
        _institution: &InstitutionId,
    ) -> Result<Option<InstitutionCapacity>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn class_capacity(&self, _class: &ClassId) -> Result<Option<ClassCapacity>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn pending_by_tier(
        &self,
        _institution: &InstitutionId,
    ) -> Result<BTreeMap<PriorityTier, Vec<Applicant>>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn waitlisted(&self, _institution: &InstitutionId) -> Result<Vec<Applicant>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn application_waitlist(
        &self,
        _application: &ApplicationId,
    ) -> Result<Vec<Applicant>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn find_applicant(
        &self,
        _application: &ApplicationId,
        _national_id: &NationalId,
    ) -> Result<Option<Applicant>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn commit(&self, _updates: &[ApplicantUpdate]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Fixed seeds so draw-sensitive assertions are exact.
pub(super) fn draw_config() -> DrawConfig {
    DrawConfig {
        selection_seed: Some(11),
        placement_seed: Some(23),
    }
}

pub(super) fn seeded_service(store: MemoryStore) -> AdmissionService<MemoryStore> {
    AdmissionService::with_draw_config(Arc::new(store), draw_config())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
