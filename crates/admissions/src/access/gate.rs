use std::sync::Arc;

use axum::http::{Method, StatusCode};
use uuid::Uuid;

use super::rules::{Ownership, RoleRequirement, RouteTable};
use crate::applications::domain::ApplicationId;
use crate::identity::{ApplicantId, ApplicantRepository, Role, TokenIssuer};
use crate::store::RepositoryError;

/// Resolved identity attached to the request for handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub account_id: ApplicantId,
    pub role: Role,
    pub application_id: Option<ApplicationId>,
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("account no longer exists")]
    UnknownAccount,
    #[error("{required} role required")]
    RoleRequired { required: &'static str },
    #[error("caller does not own this application")]
    NotOwner,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AccessError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccessError::MissingToken | AccessError::InvalidToken | AccessError::UnknownAccount => {
                StatusCode::UNAUTHORIZED
            }
            AccessError::RoleRequired { .. } | AccessError::NotOwner => StatusCode::FORBIDDEN,
            AccessError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Evaluates the route table against a request's method, path and bearer token.
pub struct AccessGate<S> {
    table: RouteTable,
    tokens: TokenIssuer,
    accounts: Arc<S>,
}

impl<S> AccessGate<S>
where
    S: ApplicantRepository + 'static,
{
    pub fn new(table: RouteTable, tokens: TokenIssuer, accounts: Arc<S>) -> Self {
        Self {
            table,
            tokens,
            accounts,
        }
    }

    /// `Ok(None)` means the route is public and no identity was resolved.
    pub fn authorize(
        &self,
        method: &Method,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<Option<Caller>, AccessError> {
        let matched = self.table.resolve(method, path);
        let requirement = matched
            .as_ref()
            .map_or(self.table.fallback(), |route| route.rule.requirement);
        if requirement == RoleRequirement::Public {
            return Ok(None);
        }

        let token = authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AccessError::MissingToken)?;
        let claims = self
            .tokens
            .verify(token)
            .map_err(|_| AccessError::InvalidToken)?;
        let account = self
            .accounts
            .fetch(&claims.sub)?
            .ok_or(AccessError::UnknownAccount)?;

        let caller = Caller {
            account_id: account.id,
            role: claims.role,
            application_id: account.application_id,
        };

        if !requirement.admits(caller.role) {
            return Err(AccessError::RoleRequired {
                required: requirement.label(),
            });
        }

        if let Some(route) = matched.as_ref() {
            if let Ownership::Application { param } = route.rule.ownership {
                let target = route
                    .param(param)
                    .and_then(|raw| Uuid::parse_str(raw).ok())
                    .map(ApplicationId);
                if target.is_none() || target != caller.application_id {
                    return Err(AccessError::NotOwner);
                }
            }
        }

        Ok(Some(caller))
    }
}
