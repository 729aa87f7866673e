use super::domain::{Applicant, ApplicantId};
use crate::store::RepositoryError;

/// Account storage. Email lookups are case-insensitive.
pub trait ApplicantRepository: Send + Sync {
    fn insert(&self, applicant: Applicant) -> Result<Applicant, RepositoryError>;
    fn fetch(&self, id: &ApplicantId) -> Result<Option<Applicant>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<Applicant>, RepositoryError>;
    /// Removes the account and detaches (never deletes) its application.
    fn delete(&self, id: &ApplicantId) -> Result<Applicant, RepositoryError>;
}
