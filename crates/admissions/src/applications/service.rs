use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{ApplicationId, ApplicationPatch, ApplicationSubmission, DocumentReferences};
use super::edit::{check_edit_window, ApplicantEdit, EditError, EditRejection};
use super::repository::{ApplicationRecord, ApplicationRepository, ApplicationView};
use super::status::{ApplicationStatus, GlobalStatus, StatusPatch, Transition};
use super::validation::{validate_document_keys, validate_form, ValidationErrors};
use crate::identity::ApplicantId;
use crate::store::RepositoryError;

/// Who asked for a status change, for the audit trail.
#[derive(Debug, Clone, Copy)]
enum Actor<'a> {
    Applicant(&'a ApplicantId),
    Staff(&'a ApplicantId),
}

impl Actor<'_> {
    fn describe(&self) -> String {
        match self {
            Actor::Applicant(id) => format!("applicant:{id}"),
            Actor::Staff(id) => format!("staff:{id}"),
        }
    }
}

/// Application intake, applicant edits, and staff review.
pub struct AdmissionService<S> {
    store: Arc<S>,
}

impl<S> AdmissionService<S>
where
    S: ApplicationRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates the caller's application, or applies the submission as an
    /// edit when one already exists.
    pub fn submit(
        &self,
        owner: &ApplicantId,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        if let Some(existing) = self.store.application_for(owner)? {
            return self.edit(owner, &existing.id, ApplicantEdit::Resubmit(submission));
        }

        let now = Utc::now();
        validate_form(&submission.form, now.date_naive())?;
        validate_document_keys(owner, &submission.documents)?;
        check_edit_window(
            GlobalStatus::default(),
            false,
            &DocumentReferences::default(),
            &submission.documents,
        )?;

        let record = ApplicationRecord::new(ApplicationId::generate(), *owner, submission, now);
        let status = ApplicationStatus::new(record.id, now);
        let (record, status) = self.store.create(owner, record, status)?;

        info!(
            application_id = %record.id,
            applicant_id = %owner,
            status = status.status.label(),
            "application submitted"
        );
        Ok(record.view(status))
    }

    /// Partial update of an application by its owner.
    pub fn update(
        &self,
        owner: &ApplicantId,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        self.edit(owner, id, ApplicantEdit::Patch(patch))
    }

    pub fn get(&self, id: &ApplicationId) -> Result<ApplicationView, ApplicationServiceError> {
        let record = self
            .store
            .application(id)?
            .ok_or(RepositoryError::NotFound)?;
        self.view_of(record)
    }

    pub fn get_by_applicant(
        &self,
        owner: &ApplicantId,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let record = self
            .store
            .application_for(owner)?
            .ok_or(RepositoryError::NotFound)?;
        self.view_of(record)
    }

    /// All applications, oldest first, optionally narrowed to one status.
    pub fn list(
        &self,
        filter: Option<GlobalStatus>,
    ) -> Result<Vec<ApplicationView>, ApplicationServiceError> {
        Ok(self
            .store
            .applications()?
            .into_iter()
            .filter(|(_, status)| filter.map_or(true, |wanted| status.status == wanted))
            .map(|(record, status)| record.view(status))
            .collect())
    }

    /// Staff batch update. Every value is accepted for every field.
    pub fn update_status(
        &self,
        staff: &ApplicantId,
        id: &ApplicationId,
        patch: StatusPatch,
    ) -> Result<ApplicationStatus, ApplicationServiceError> {
        let (status, transitions) = self.store.patch_status(id, &patch, Utc::now())?;
        log_transitions(id, Actor::Staff(staff), &transitions);
        Ok(status)
    }

    /// Staff replacement of the report reference. Sub-statuses are untouched.
    pub fn override_report(
        &self,
        staff: &ApplicantId,
        id: &ApplicationId,
        key: Option<String>,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let record = self.store.set_report(id, key, Utc::now())?;
        info!(
            application_id = %id,
            staff_id = %staff,
            report_present = record.documents.report_key.is_some(),
            "report reference overridden"
        );
        self.view_of(record)
    }

    pub fn delete(
        &self,
        staff: &ApplicantId,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let removed = self.store.remove(id)?;
        info!(
            application_id = %id,
            staff_id = %staff,
            detached_applicant = ?removed.applicant_id,
            "application deleted"
        );
        Ok(removed)
    }

    fn edit(
        &self,
        owner: &ApplicantId,
        id: &ApplicationId,
        edit: ApplicantEdit,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let applied = self
            .store
            .apply_applicant_edit(id, owner, &edit, Utc::now())?;
        log_transitions(id, Actor::Applicant(owner), &applied.transitions);

        info!(
            application_id = %id,
            applicant_id = %owner,
            replaced_documents = applied.replaced.len(),
            "application updated"
        );
        Ok(applied.record.view(applied.status))
    }

    fn view_of(&self, record: ApplicationRecord) -> Result<ApplicationView, ApplicationServiceError> {
        let status = self
            .store
            .status(&record.id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record.view(status))
    }
}

fn log_transitions(id: &ApplicationId, actor: Actor<'_>, transitions: &[Transition]) {
    let actor = actor.describe();
    for transition in transitions {
        let (from, to) = transition.values();
        info!(
            application_id = %id,
            field = transition.field(),
            from,
            to,
            actor = %actor,
            "status transition"
        );
    }
    if transitions.is_empty() {
        debug!(application_id = %id, actor = %actor, "status update changed nothing");
    }
}

/// Error raised by the admission service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("application belongs to another applicant")]
    Forbidden,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{0} can no longer be edited once the application is accepted")]
    Locked(&'static str),
    #[error("{0} can only be submitted once the application is accepted")]
    RoundClosed(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<EditRejection> for ApplicationServiceError {
    fn from(rejection: EditRejection) -> Self {
        match rejection {
            EditRejection::Forbidden => Self::Forbidden,
            EditRejection::Validation(errors) => Self::Validation(errors),
            EditRejection::Locked(field) => Self::Locked(field),
            EditRejection::RoundClosed(field) => Self::RoundClosed(field),
        }
    }
}

impl From<EditError> for ApplicationServiceError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::Rejected(rejection) => rejection.into(),
            EditError::Repository(err) => Self::Repository(err),
        }
    }
}
