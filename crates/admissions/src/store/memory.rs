use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::applications::domain::ApplicationId;
use crate::applications::edit::{plan_applicant_edit, ApplicantEdit, AppliedEdit, EditError};
use crate::applications::repository::{ApplicationRecord, ApplicationRepository};
use crate::applications::status::{ApplicationStatus, StatusPatch, Transition};
use crate::identity::domain::normalize_email;
use crate::identity::{Applicant, ApplicantId, ApplicantRepository};

#[derive(Default)]
struct Tables {
    applicants: HashMap<ApplicantId, Applicant>,
    applications: HashMap<ApplicationId, ApplicationRecord>,
    statuses: HashMap<ApplicationId, ApplicationStatus>,
}

/// Process-local store backing both repositories behind one lock, so
/// multi-table operations (create, delete, detach) are atomic.
#[derive(Default, Clone)]
pub struct InMemoryAdmissionStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryAdmissionStore {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    #[cfg(test)]
    pub(crate) fn link_for_test(&self, owner: &ApplicantId, application: ApplicationId) {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        if let Some(applicant) = tables.applicants.get_mut(owner) {
            applicant.application_id = Some(application);
        }
    }
}

impl ApplicantRepository for InMemoryAdmissionStore {
    fn insert(&self, applicant: Applicant) -> Result<Applicant, RepositoryError> {
        let mut tables = self.lock()?;
        let email = normalize_email(&applicant.email);
        let taken = tables.applicants.contains_key(&applicant.id)
            || tables
                .applicants
                .values()
                .any(|existing| normalize_email(&existing.email) == email);
        if taken {
            return Err(RepositoryError::Conflict);
        }
        tables.applicants.insert(applicant.id, applicant.clone());
        Ok(applicant)
    }

    fn fetch(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        Ok(self.lock()?.applicants.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Applicant>, RepositoryError> {
        let email = normalize_email(email);
        Ok(self
            .lock()?
            .applicants
            .values()
            .find(|applicant| normalize_email(&applicant.email) == email)
            .cloned())
    }

    fn delete(&self, id: &ApplicantId) -> Result<Applicant, RepositoryError> {
        let mut tables = self.lock()?;
        let removed = tables
            .applicants
            .remove(id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(application_id) = removed.application_id {
            if let Some(record) = tables.applications.get_mut(&application_id) {
                record.applicant_id = None;
            }
        }
        Ok(removed)
    }
}

impl ApplicationRepository for InMemoryAdmissionStore {
    fn create(
        &self,
        owner: &ApplicantId,
        record: ApplicationRecord,
        status: ApplicationStatus,
    ) -> Result<(ApplicationRecord, ApplicationStatus), RepositoryError> {
        let mut tables = self.lock()?;
        let linked = tables
            .applicants
            .get(owner)
            .ok_or(RepositoryError::NotFound)?
            .application_id
            .is_some();
        if linked
            || tables.applications.contains_key(&record.id)
            || tables.statuses.contains_key(&record.id)
        {
            return Err(RepositoryError::Conflict);
        }

        tables.applications.insert(record.id, record.clone());
        tables.statuses.insert(record.id, status.clone());
        if let Some(applicant) = tables.applicants.get_mut(owner) {
            applicant.application_id = Some(record.id);
        }
        Ok((record, status))
    }

    fn application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    fn status(&self, id: &ApplicationId) -> Result<Option<ApplicationStatus>, RepositoryError> {
        Ok(self.lock()?.statuses.get(id).cloned())
    }

    fn application_for(
        &self,
        owner: &ApplicantId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let tables = self.lock()?;
        let linked = tables
            .applicants
            .get(owner)
            .and_then(|applicant| applicant.application_id);
        Ok(linked.and_then(|id| tables.applications.get(&id).cloned()))
    }

    fn applications(&self) -> Result<Vec<(ApplicationRecord, ApplicationStatus)>, RepositoryError> {
        let tables = self.lock()?;
        let mut rows: Vec<_> = tables
            .applications
            .values()
            .filter_map(|record| {
                tables
                    .statuses
                    .get(&record.id)
                    .map(|status| (record.clone(), status.clone()))
            })
            .collect();
        rows.sort_by_key(|(record, _)| (record.created_at, record.id));
        Ok(rows)
    }

    fn apply_applicant_edit(
        &self,
        id: &ApplicationId,
        owner: &ApplicantId,
        edit: &ApplicantEdit,
        now: DateTime<Utc>,
    ) -> Result<AppliedEdit, EditError> {
        let mut tables = self.lock()?;
        let Tables {
            applications,
            statuses,
            ..
        } = &mut *tables;
        let record = applications.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let status = statuses.get_mut(id).ok_or(RepositoryError::NotFound)?;

        let plan = plan_applicant_edit(owner, record, status, edit, now)?;
        *record = plan.record;
        let transitions = plan.status_patch.apply(status, now);
        Ok(AppliedEdit {
            record: record.clone(),
            status: status.clone(),
            transitions,
            replaced: plan.replaced,
        })
    }

    fn patch_status(
        &self,
        id: &ApplicationId,
        patch: &StatusPatch,
        now: DateTime<Utc>,
    ) -> Result<(ApplicationStatus, Vec<Transition>), RepositoryError> {
        let mut tables = self.lock()?;
        let status = tables
            .statuses
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        let transitions = patch.apply(status, now);
        Ok((status.clone(), transitions))
    }

    fn set_report(
        &self,
        id: &ApplicationId,
        key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.lock()?;
        let record = tables
            .applications
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        record.documents.report_key = key;
        record.updated_at = now;
        Ok(record.clone())
    }

    fn remove(&self, id: &ApplicationId) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.lock()?;
        let removed = tables
            .applications
            .remove(id)
            .ok_or(RepositoryError::NotFound)?;
        tables.statuses.remove(id);
        if let Some(owner) = removed.applicant_id {
            if let Some(applicant) = tables.applicants.get_mut(&owner) {
                applicant.application_id = None;
            }
        }
        Ok(removed)
    }
}
