use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{is_plausible_email, normalize_email, Applicant, ApplicantId, ApplicantView, Role};
use super::password::{hash_password, validate_password_strength, verify_password};
use super::repository::ApplicantRepository;
use super::token::{IssuedToken, TokenError, TokenIssuer};
use crate::store::RepositoryError;

/// Signup and login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Account plus a fresh bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub account: ApplicantView,
    pub token: IssuedToken,
}

/// Account lifecycle: signup, login, profile, deletion.
pub struct IdentityService<S> {
    store: Arc<S>,
    tokens: TokenIssuer,
}

impl<S> IdentityService<S>
where
    S: ApplicantRepository + 'static,
{
    pub fn new(store: Arc<S>, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn signup(&self, credentials: Credentials) -> Result<SessionView, IdentityError> {
        let applicant = self.create_account(credentials, Role::Applicant)?;
        info!(applicant_id = %applicant.id, "applicant account created");
        self.session_for(&applicant)
    }

    /// Ensures a staff account exists for `credentials.email`.
    pub fn register_staff(&self, credentials: Credentials) -> Result<ApplicantView, IdentityError> {
        if let Some(existing) = self.store.find_by_email(&credentials.email)? {
            return match existing.role {
                Role::Staff => Ok(existing.view()),
                Role::Applicant => Err(IdentityError::EmailTaken),
            };
        }
        let staff = self.create_account(credentials, Role::Staff)?;
        info!(account_id = %staff.id, "staff account bootstrapped");
        Ok(staff.view())
    }

    pub fn login(&self, credentials: Credentials) -> Result<SessionView, IdentityError> {
        let account = self
            .store
            .find_by_email(&credentials.email)?
            .ok_or(IdentityError::InvalidCredentials)?;

        let matches = verify_password(&credentials.password, &account.password_hash)
            .map_err(|err| IdentityError::Hashing(err.to_string()))?;
        if !matches {
            return Err(IdentityError::InvalidCredentials);
        }
        self.session_for(&account)
    }

    pub fn profile(&self, id: &ApplicantId) -> Result<ApplicantView, IdentityError> {
        self.store
            .fetch(id)?
            .map(|account| account.view())
            .ok_or(IdentityError::NotFound)
    }

    /// Deletes the account. Its application survives with no owner.
    pub fn delete_account(&self, id: &ApplicantId) -> Result<ApplicantView, IdentityError> {
        let removed = self.store.delete(id).map_err(|err| match err {
            RepositoryError::NotFound => IdentityError::NotFound,
            other => IdentityError::Repository(other),
        })?;
        info!(
            applicant_id = %removed.id,
            detached_application = ?removed.application_id,
            "account deleted"
        );
        Ok(removed.view())
    }

    fn create_account(&self, credentials: Credentials, role: Role) -> Result<Applicant, IdentityError> {
        if !is_plausible_email(&credentials.email) {
            return Err(IdentityError::InvalidEmail);
        }
        validate_password_strength(&credentials.password).map_err(IdentityError::WeakPassword)?;

        let password_hash = hash_password(&credentials.password)
            .map_err(|err| IdentityError::Hashing(err.to_string()))?;
        let applicant = Applicant {
            id: ApplicantId::generate(),
            email: normalize_email(&credentials.email),
            password_hash,
            role,
            application_id: None,
            created_at: Utc::now(),
        };

        self.store.insert(applicant).map_err(|err| match err {
            RepositoryError::Conflict => IdentityError::EmailTaken,
            other => IdentityError::Repository(other),
        })
    }

    fn session_for(&self, account: &Applicant) -> Result<SessionView, IdentityError> {
        let token = self.tokens.issue(account.id, account.role)?;
        Ok(SessionView {
            account: account.view(),
            token,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("{0}")]
    WeakPassword(String),
    #[error("an account already exists for this email")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account not found")]
    NotFound,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::domain::ApplicationId;
    use crate::store::InMemoryAdmissionStore;
    use secrecy::SecretString;

    fn service() -> (IdentityService<InMemoryAdmissionStore>, Arc<InMemoryAdmissionStore>) {
        let store = Arc::new(InMemoryAdmissionStore::default());
        let tokens = TokenIssuer::new(SecretString::from("identity-test-secret".to_string()), 5);
        (IdentityService::new(store.clone(), tokens), store)
    }

    fn credentials(email: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: "a-long-password".to_string(),
        }
    }

    #[test]
    fn signup_issues_applicant_token() {
        let (service, _) = service();
        let session = service
            .signup(credentials("Ada@Example.org"))
            .expect("signup succeeds");

        assert_eq!(session.account.email, "ada@example.org");
        assert_eq!(session.account.role, Role::Applicant);
        assert!(session.account.application_id.is_none());

        let claims = service
            .tokens()
            .verify(&session.token.access_token)
            .expect("token verifies");
        assert_eq!(claims.sub, session.account.id);
        assert_eq!(claims.role, Role::Applicant);
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let (service, _) = service();
        service.signup(credentials("ada@example.org")).expect("first signup");
        assert!(matches!(
            service.signup(credentials("ADA@example.org")),
            Err(IdentityError::EmailTaken)
        ));
    }

    #[test]
    fn signup_validates_inputs() {
        let (service, _) = service();
        assert!(matches!(
            service.signup(credentials("not-an-email")),
            Err(IdentityError::InvalidEmail)
        ));
        let weak = Credentials {
            email: "ada@example.org".to_string(),
            password: "short".to_string(),
        };
        assert!(matches!(service.signup(weak), Err(IdentityError::WeakPassword(_))));
    }

    #[test]
    fn login_checks_password() {
        let (service, _) = service();
        service.signup(credentials("ada@example.org")).expect("signup");

        let session = service
            .login(credentials("ada@example.org"))
            .expect("login succeeds");
        assert_eq!(session.account.email, "ada@example.org");

        let wrong = Credentials {
            email: "ada@example.org".to_string(),
            password: "not-the-password".to_string(),
        };
        assert!(matches!(service.login(wrong), Err(IdentityError::InvalidCredentials)));
        assert!(matches!(
            service.login(credentials("nobody@example.org")),
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[test]
    fn register_staff_is_idempotent() {
        let (service, _) = service();
        let first = service
            .register_staff(credentials("office@example.org"))
            .expect("staff created");
        let second = service
            .register_staff(credentials("office@example.org"))
            .expect("staff reused");
        assert_eq!(first.id, second.id);
        assert_eq!(second.role, Role::Staff);

        service.signup(credentials("ada@example.org")).expect("signup");
        assert!(matches!(
            service.register_staff(credentials("ada@example.org")),
            Err(IdentityError::EmailTaken)
        ));
    }

    #[test]
    fn delete_account_reports_detached_application() {
        let (service, store) = service();
        let session = service.signup(credentials("ada@example.org")).expect("signup");
        let application_id = ApplicationId::generate();
        store.link_for_test(&session.account.id, application_id);

        let removed = service
            .delete_account(&session.account.id)
            .expect("deletion succeeds");
        assert_eq!(removed.application_id, Some(application_id));
        assert!(matches!(
            service.profile(&session.account.id),
            Err(IdentityError::NotFound)
        ));
        assert!(matches!(
            service.delete_account(&session.account.id),
            Err(IdentityError::NotFound)
        ));
    }
}
