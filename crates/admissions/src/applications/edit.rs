//! Applicant edits against an existing application.
//!
//! [`plan_applicant_edit`] is pure: it is evaluated by the store against the
//! live record and status rows, inside the same critical section that writes
//! the result, so a concurrent staff decision is never overwritten.

use chrono::{DateTime, Utc};

use super::domain::{
    ApplicationForm, ApplicationPatch, ApplicationSubmission, DocumentKind, DocumentReferences,
    DocumentRound,
};
use super::repository::ApplicationRecord;
use super::status::{
    applicant_edit_transition, ApplicationStatus, DocumentStatus, GlobalStatus, StatusPatch,
    Transition,
};
use super::validation::{validate_document_keys, validate_form, ValidationErrors};
use crate::identity::ApplicantId;
use crate::store::RepositoryError;

/// What an applicant sends for an application that already exists.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicantEdit {
    /// Full form from `POST /applications`; replaces the form as sent.
    Resubmit(ApplicationSubmission),
    /// Partial update; absent fields are left untouched.
    Patch(ApplicationPatch),
}

impl ApplicantEdit {
    /// Returns the document kinds whose key changed.
    pub fn apply_to(
        &self,
        form: &mut ApplicationForm,
        documents: &mut DocumentReferences,
    ) -> Vec<DocumentKind> {
        match self {
            ApplicantEdit::Resubmit(submission) => {
                *form = submission.form.clone();
                documents.merge(&submission.documents)
            }
            ApplicantEdit::Patch(patch) => {
                patch.apply_to_form(form);
                patch.apply_to_documents(documents)
            }
        }
    }
}

/// Why an applicant edit was refused.
#[derive(Debug, thiserror::Error)]
pub enum EditRejection {
    #[error("application belongs to another applicant")]
    Forbidden,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{0} can no longer be edited once the application is accepted")]
    Locked(&'static str),
    #[error("{0} can only be submitted once the application is accepted")]
    RoundClosed(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Rejected(#[from] EditRejection),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Merged record and the status changes the edit implies.
#[derive(Debug, Clone, PartialEq)]
pub struct EditPlan {
    pub record: ApplicationRecord,
    pub status_patch: StatusPatch,
    pub replaced: Vec<DocumentKind>,
}

/// Outcome of an edit committed by the store.
#[derive(Debug, Clone)]
pub struct AppliedEdit {
    pub record: ApplicationRecord,
    pub status: ApplicationStatus,
    pub transitions: Vec<Transition>,
    pub replaced: Vec<DocumentKind>,
}

pub fn plan_applicant_edit(
    owner: &ApplicantId,
    current: &ApplicationRecord,
    status: &ApplicationStatus,
    edit: &ApplicantEdit,
    now: DateTime<Utc>,
) -> Result<EditPlan, EditRejection> {
    if current.applicant_id.as_ref() != Some(owner) {
        return Err(EditRejection::Forbidden);
    }

    let mut record = current.clone();
    let replaced = edit.apply_to(&mut record.form, &mut record.documents);
    record.updated_at = now;

    check_edit_window(
        status.status,
        current.form != record.form,
        &current.documents,
        &record.documents,
    )?;
    validate_form(&record.form, now.date_naive())?;
    let mut submitted = DocumentReferences::default();
    for kind in &replaced {
        submitted.set(*kind, record.documents.get(*kind).map(str::to_string));
    }
    validate_document_keys(owner, &submitted)?;

    Ok(EditPlan {
        record,
        status_patch: edit_status_patch(status, &replaced),
        replaced,
    })
}

/// `NOTIFIED` becomes `UPDATED`, and every replaced document goes back to
/// `PENDING`.
fn edit_status_patch(current: &ApplicationStatus, replaced: &[DocumentKind]) -> StatusPatch {
    let mut patch = StatusPatch::default();
    if let Some(next) = applicant_edit_transition(current.status) {
        patch = patch.with_status(next);
    }
    for kind in replaced {
        if current.documents.get(*kind) != DocumentStatus::Pending {
            patch = patch.with_document(*kind, DocumentStatus::Pending);
        }
    }
    patch
}

pub(crate) fn check_edit_window(
    status: GlobalStatus,
    form_changed: bool,
    before: &DocumentReferences,
    after: &DocumentReferences,
) -> Result<(), EditRejection> {
    let changed = |kind: DocumentKind| before.get(kind) != after.get(kind);

    if status.locks_core_fields() {
        if form_changed {
            return Err(EditRejection::Locked("profile fields"));
        }
        if let Some(kind) = DocumentKind::ALL
            .into_iter()
            .find(|kind| kind.round() == DocumentRound::First && changed(*kind))
        {
            return Err(EditRejection::Locked(kind.label()));
        }
    }

    if !status.opens_second_round() {
        if let Some(kind) = DocumentKind::ALL
            .into_iter()
            .find(|kind| kind.round() == DocumentRound::Second && changed(*kind))
        {
            return Err(EditRejection::RoundClosed(kind.label()));
        }
    }

    Ok(())
}
