use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Months, NaiveDate, Utc};
use serde_json::Value;

use crate::access::Caller;
use crate::applications::domain::{
    ApplicationForm, ApplicationId, ApplicationPatch, ApplicationSubmission, DocumentReferences,
};
use crate::applications::edit::{ApplicantEdit, AppliedEdit, EditError};
use crate::applications::repository::{ApplicationRecord, ApplicationRepository};
use crate::applications::status::{ApplicationStatus, GlobalStatus, StatusPatch, Transition};
use crate::applications::{AdmissionService, ApplicationView};
use crate::identity::{Applicant, ApplicantId, ApplicantRepository, Role};
use crate::store::{InMemoryAdmissionStore, RepositoryError};

pub(super) fn sixteen_years_ago() -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_sub_months(Months::new(16 * 12))
        .expect("date in range")
}

pub(super) fn form() -> ApplicationForm {
    ApplicationForm {
        first_name: "Yasmine".to_string(),
        last_name: "Haddad".to_string(),
        birth_date: sixteen_years_ago(),
        email: "yasmine.haddad@example.org".to_string(),
        phone: "+33 6 11 22 33 44".to_string(),
        address: "8 avenue Jean Jaures, Grenoble".to_string(),
        school_name: "Lycee Champollion".to_string(),
        class_level: "Premiere".to_string(),
        average_grade: Some(16.25),
        guardian_name: "Nadia Haddad".to_string(),
        guardian_phone: "06 55 44 33 22".to_string(),
        motivation: "Building satellites with friends.".to_string(),
    }
}

pub(super) fn doc_key(owner: &ApplicantId, name: &str) -> String {
    format!("{owner}/0b7e2d4c-{name}")
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        form: form(),
        documents: DocumentReferences::default(),
    }
}

pub(super) fn submission_with_documents(owner: &ApplicantId) -> ApplicationSubmission {
    ApplicationSubmission {
        form: form(),
        documents: DocumentReferences {
            parent_id_key: Some(doc_key(owner, "id.pdf")),
            birth_certificate_key: Some(doc_key(owner, "birth.pdf")),
            ..DocumentReferences::default()
        },
    }
}

pub(super) struct Fixture {
    pub(super) service: Arc<AdmissionService<InMemoryAdmissionStore>>,
    pub(super) store: Arc<InMemoryAdmissionStore>,
    pub(super) staff: ApplicantId,
}

pub(super) fn fixture() -> Fixture {
    let store = Arc::new(InMemoryAdmissionStore::default());
    let service = Arc::new(AdmissionService::new(store.clone()));
    let staff = account(&store, Role::Staff).id;
    Fixture {
        service,
        store,
        staff,
    }
}

pub(super) fn account(store: &InMemoryAdmissionStore, role: Role) -> Applicant {
    let id = ApplicantId::generate();
    store
        .insert(Applicant {
            id,
            email: format!("{id}@example.org"),
            password_hash: "not-a-real-hash".to_string(),
            role,
            application_id: None,
            created_at: Utc::now(),
        })
        .expect("account stored")
}

impl Fixture {
    pub(super) fn applicant(&self) -> ApplicantId {
        account(&self.store, Role::Applicant).id
    }

    /// New applicant with a freshly submitted application.
    pub(super) fn submitted(&self) -> (ApplicantId, ApplicationView) {
        let owner = self.applicant();
        let view = self
            .service
            .submit(&owner, submission_with_documents(&owner))
            .expect("submission succeeds");
        (owner, view)
    }

    pub(super) fn set_status(&self, id: &ApplicationId, status: GlobalStatus) {
        self.service
            .update_status(&self.staff, id, StatusPatch::default().with_status(status))
            .expect("staff update succeeds");
    }

    pub(super) fn caller(&self, account_id: ApplicantId, role: Role) -> Caller {
        let application_id = self
            .store
            .fetch(&account_id)
            .expect("lookup")
            .and_then(|account| account.application_id);
        Caller {
            account_id,
            role,
            application_id,
        }
    }
}

pub(super) fn phone_patch(phone: &str) -> ApplicationPatch {
    ApplicationPatch {
        phone: Some(phone.to_string()),
        ..ApplicationPatch::default()
    }
}

pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl ApplicationRepository for UnavailableStore {
    fn create(
        &self,
        _owner: &ApplicantId,
        _record: ApplicationRecord,
        _status: ApplicationStatus,
    ) -> Result<(ApplicationRecord, ApplicationStatus), RepositoryError> {
        offline()
    }

    fn application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        offline()
    }

    fn status(&self, _id: &ApplicationId) -> Result<Option<ApplicationStatus>, RepositoryError> {
        offline()
    }

    fn application_for(
        &self,
        _owner: &ApplicantId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        offline()
    }

    fn applications(&self) -> Result<Vec<(ApplicationRecord, ApplicationStatus)>, RepositoryError> {
        offline()
    }

    fn apply_applicant_edit(
        &self,
        _id: &ApplicationId,
        _owner: &ApplicantId,
        _edit: &ApplicantEdit,
        _now: DateTime<Utc>,
    ) -> Result<AppliedEdit, EditError> {
        offline().map_err(EditError::from)
    }

    fn patch_status(
        &self,
        _id: &ApplicationId,
        _patch: &StatusPatch,
        _now: DateTime<Utc>,
    ) -> Result<(ApplicationStatus, Vec<Transition>), RepositoryError> {
        offline()
    }

    fn set_report(
        &self,
        _id: &ApplicationId,
        _key: Option<String>,
        _now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        offline()
    }

    fn remove(&self, _id: &ApplicationId) -> Result<ApplicationRecord, RepositoryError> {
        offline()
    }
}

/// Lands a staff status update right before each applicant edit, the way a
/// reviewer acting between the applicant's read and write would.
pub(super) struct StaffRacingStore {
    pub(super) inner: InMemoryAdmissionStore,
    pub(super) staff_patch: StatusPatch,
}

impl ApplicationRepository for StaffRacingStore {
    fn create(
        &self,
        owner: &ApplicantId,
        record: ApplicationRecord,
        status: ApplicationStatus,
    ) -> Result<(ApplicationRecord, ApplicationStatus), RepositoryError> {
        self.inner.create(owner, record, status)
    }

    fn application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.application(id)
    }

    fn status(&self, id: &ApplicationId) -> Result<Option<ApplicationStatus>, RepositoryError> {
        self.inner.status(id)
    }

    fn application_for(
        &self,
        owner: &ApplicantId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.application_for(owner)
    }

    fn applications(&self) -> Result<Vec<(ApplicationRecord, ApplicationStatus)>, RepositoryError> {
        self.inner.applications()
    }

    fn apply_applicant_edit(
        &self,
        id: &ApplicationId,
        owner: &ApplicantId,
        edit: &ApplicantEdit,
        now: DateTime<Utc>,
    ) -> Result<AppliedEdit, EditError> {
        self.inner.patch_status(id, &self.staff_patch, now)?;
        self.inner.apply_applicant_edit(id, owner, edit, now)
    }

    fn patch_status(
        &self,
        id: &ApplicationId,
        patch: &StatusPatch,
        now: DateTime<Utc>,
    ) -> Result<(ApplicationStatus, Vec<Transition>), RepositoryError> {
        self.inner.patch_status(id, patch, now)
    }

    fn set_report(
        &self,
        id: &ApplicationId,
        key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.set_report(id, key, now)
    }

    fn remove(&self, id: &ApplicationId) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.remove(id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
