use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationForm, ApplicationId, ApplicationSubmission, DocumentReferences};
use super::edit::{ApplicantEdit, AppliedEdit, EditError};
use super::progress::ApplicationProgress;
use super::status::{ApplicationStatus, StatusPatch, Transition};
use crate::identity::ApplicantId;
use crate::store::RepositoryError;

/// Stored application: profile form plus document references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    /// `None` once the owner deleted their account.
    pub applicant_id: Option<ApplicantId>,
    #[serde(flatten)]
    pub form: ApplicationForm,
    #[serde(flatten)]
    pub documents: DocumentReferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn new(
        id: ApplicationId,
        owner: ApplicantId,
        submission: ApplicationSubmission,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            applicant_id: Some(owner),
            form: submission.form,
            documents: submission.documents,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn view(self, status: ApplicationStatus) -> ApplicationView {
        let progress = ApplicationProgress::compute(&self.documents, &status.documents);
        ApplicationView {
            application: self,
            status,
            progress,
        }
    }
}

/// Record, status, and derived progress as returned over HTTP.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub application: ApplicationRecord,
    pub status: ApplicationStatus,
    pub progress: ApplicationProgress,
}

/// Storage abstraction for applications and their status rows.
///
/// Edits are merged inside the store so concurrent edits to different fields
/// never overwrite each other, and an applicant edit is always decided on the
/// status it is written against.
pub trait ApplicationRepository: Send + Sync {
    /// Stores the record and its status and links the owner, all or nothing.
    /// Fails with `Conflict` when the owner already has an application.
    fn create(
        &self,
        owner: &ApplicantId,
        record: ApplicationRecord,
        status: ApplicationStatus,
    ) -> Result<(ApplicationRecord, ApplicationStatus), RepositoryError>;
    fn application(&self, id: &ApplicationId)
        -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn status(&self, id: &ApplicationId) -> Result<Option<ApplicationStatus>, RepositoryError>;
    fn application_for(
        &self,
        owner: &ApplicantId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn applications(&self) -> Result<Vec<(ApplicationRecord, ApplicationStatus)>, RepositoryError>;
    /// Plans the edit against the current record and status and commits
    /// both, in one step. See [`super::edit::plan_applicant_edit`].
    fn apply_applicant_edit(
        &self,
        id: &ApplicationId,
        owner: &ApplicantId,
        edit: &ApplicantEdit,
        now: DateTime<Utc>,
    ) -> Result<AppliedEdit, EditError>;
    fn patch_status(
        &self,
        id: &ApplicationId,
        patch: &StatusPatch,
        now: DateTime<Utc>,
    ) -> Result<(ApplicationStatus, Vec<Transition>), RepositoryError>;
    /// Staff override of the report reference; `None` clears it.
    fn set_report(
        &self,
        id: &ApplicationId,
        key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError>;
    /// Removes the record and its status and detaches the owner.
    fn remove(&self, id: &ApplicationId) -> Result<ApplicationRecord, RepositoryError>;
}
