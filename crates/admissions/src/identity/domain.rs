use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::applications::domain::ApplicationId;

/// Identifier wrapper for applicant and staff accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantId(pub Uuid);

impl ApplicantId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Caller roles. Staff outranks applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Applicant,
    Staff,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Staff => "staff",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "applicant" => Some(Role::Applicant),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

/// Stored account. Holds at most one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    pub id: ApplicantId,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub application_id: Option<ApplicationId>,
    pub created_at: DateTime<Utc>,
}

impl Applicant {
    pub fn view(&self) -> ApplicantView {
        ApplicantView {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            application_id: self.application_id,
            created_at: self.created_at,
        }
    }
}

/// Public projection of an account, never carrying the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantView {
    pub id: ApplicantId,
    pub email: String,
    pub role: Role,
    pub application_id: Option<ApplicationId>,
    pub created_at: DateTime<Utc>,
}

/// Loose shape check: one `@`, non-empty local part, dotted domain.
pub fn is_plausible_email(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.len() > 254 || trimmed.chars().any(char::is_whitespace) {
        return false;
    }
    match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
