use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, DocumentKind};

/// Global lifecycle state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlobalStatus {
    Draft,
    #[default]
    Pending,
    Notified,
    Updated,
    Validated,
    Accepted,
    Refused,
    Waitlist,
}

impl GlobalStatus {
    pub const ALL: [GlobalStatus; 8] = [
        GlobalStatus::Draft,
        GlobalStatus::Pending,
        GlobalStatus::Notified,
        GlobalStatus::Updated,
        GlobalStatus::Validated,
        GlobalStatus::Accepted,
        GlobalStatus::Refused,
        GlobalStatus::Waitlist,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            GlobalStatus::Draft => "DRAFT",
            GlobalStatus::Pending => "PENDING",
            GlobalStatus::Notified => "NOTIFIED",
            GlobalStatus::Updated => "UPDATED",
            GlobalStatus::Validated => "VALIDATED",
            GlobalStatus::Accepted => "ACCEPTED",
            GlobalStatus::Refused => "REFUSED",
            GlobalStatus::Waitlist => "WAITLIST",
        }
    }

    /// Applicants can no longer touch profile fields or first-round documents.
    pub const fn locks_core_fields(self) -> bool {
        matches!(self, GlobalStatus::Accepted)
    }

    /// Second-round documents may be submitted.
    pub const fn opens_second_round(self) -> bool {
        matches!(self, GlobalStatus::Accepted)
    }
}

/// Verification state of a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Draft,
    #[default]
    Pending,
    Valid,
    NotValid,
}

impl DocumentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "DRAFT",
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::Valid => "VALID",
            DocumentStatus::NotValid => "NOT_VALID",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatuses {
    pub parent_id_status: DocumentStatus,
    pub birth_certificate_status: DocumentStatus,
    pub school_certificate_status: DocumentStatus,
    pub regulations_status: DocumentStatus,
    pub grades_status: DocumentStatus,
    pub parental_authorization_status: DocumentStatus,
    pub image_rights_status: DocumentStatus,
    pub report_status: DocumentStatus,
}

impl DocumentStatuses {
    pub fn get(&self, kind: DocumentKind) -> DocumentStatus {
        match kind {
            DocumentKind::ParentId => self.parent_id_status,
            DocumentKind::BirthCertificate => self.birth_certificate_status,
            DocumentKind::SchoolCertificate => self.school_certificate_status,
            DocumentKind::Regulations => self.regulations_status,
            DocumentKind::Grades => self.grades_status,
            DocumentKind::ParentalAuthorization => self.parental_authorization_status,
            DocumentKind::ImageRights => self.image_rights_status,
            DocumentKind::Report => self.report_status,
        }
    }

    pub fn set(&mut self, kind: DocumentKind, value: DocumentStatus) {
        let slot = match kind {
            DocumentKind::ParentId => &mut self.parent_id_status,
            DocumentKind::BirthCertificate => &mut self.birth_certificate_status,
            DocumentKind::SchoolCertificate => &mut self.school_certificate_status,
            DocumentKind::Regulations => &mut self.regulations_status,
            DocumentKind::Grades => &mut self.grades_status,
            DocumentKind::ParentalAuthorization => &mut self.parental_authorization_status,
            DocumentKind::ImageRights => &mut self.image_rights_status,
            DocumentKind::Report => &mut self.report_status,
        };
        *slot = value;
    }
}

/// Review state attached one-to-one to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    pub application_id: ApplicationId,
    pub status: GlobalStatus,
    #[serde(flatten)]
    pub documents: DocumentStatuses,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationStatus {
    pub fn new(application_id: ApplicationId, now: DateTime<Utc>) -> Self {
        Self {
            application_id,
            status: GlobalStatus::default(),
            documents: DocumentStatuses::default(),
            updated_at: now,
        }
    }
}

/// Batched status update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusPatch {
    pub status: Option<GlobalStatus>,
    pub parent_id_status: Option<DocumentStatus>,
    pub birth_certificate_status: Option<DocumentStatus>,
    pub school_certificate_status: Option<DocumentStatus>,
    pub regulations_status: Option<DocumentStatus>,
    pub grades_status: Option<DocumentStatus>,
    pub parental_authorization_status: Option<DocumentStatus>,
    pub image_rights_status: Option<DocumentStatus>,
    pub report_status: Option<DocumentStatus>,
}

impl StatusPatch {
    pub fn document(&self, kind: DocumentKind) -> Option<DocumentStatus> {
        match kind {
            DocumentKind::ParentId => self.parent_id_status,
            DocumentKind::BirthCertificate => self.birth_certificate_status,
            DocumentKind::SchoolCertificate => self.school_certificate_status,
            DocumentKind::Regulations => self.regulations_status,
            DocumentKind::Grades => self.grades_status,
            DocumentKind::ParentalAuthorization => self.parental_authorization_status,
            DocumentKind::ImageRights => self.image_rights_status,
            DocumentKind::Report => self.report_status,
        }
    }

    pub fn with_status(mut self, status: GlobalStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_document(mut self, kind: DocumentKind, value: DocumentStatus) -> Self {
        let slot = match kind {
            DocumentKind::ParentId => &mut self.parent_id_status,
            DocumentKind::BirthCertificate => &mut self.birth_certificate_status,
            DocumentKind::SchoolCertificate => &mut self.school_certificate_status,
            DocumentKind::Regulations => &mut self.regulations_status,
            DocumentKind::Grades => &mut self.grades_status,
            DocumentKind::ParentalAuthorization => &mut self.parental_authorization_status,
            DocumentKind::ImageRights => &mut self.image_rights_status,
            DocumentKind::Report => &mut self.report_status,
        };
        *slot = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && DocumentKind::ALL
                .iter()
                .all(|kind| self.document(*kind).is_none())
    }

    /// Merges the patch into `target` and reports every value that changed.
    /// Any value is accepted for any field; there is no illegal transition.
    pub fn apply(&self, target: &mut ApplicationStatus, now: DateTime<Utc>) -> Vec<Transition> {
        let mut transitions = Vec::new();

        if let Some(next) = self.status {
            if next != target.status {
                transitions.push(Transition::Global {
                    from: target.status,
                    to: next,
                });
                target.status = next;
            }
        }

        for kind in DocumentKind::ALL {
            let Some(next) = self.document(kind) else {
                continue;
            };
            let current = target.documents.get(kind);
            if next != current {
                transitions.push(Transition::Document {
                    kind,
                    from: current,
                    to: next,
                });
                target.documents.set(kind, next);
            }
        }

        if !self.is_empty() {
            target.updated_at = now;
        }
        transitions
    }
}

/// A single value change produced by [`StatusPatch::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Global {
        from: GlobalStatus,
        to: GlobalStatus,
    },
    Document {
        kind: DocumentKind,
        from: DocumentStatus,
        to: DocumentStatus,
    },
}

impl Transition {
    pub fn field(&self) -> &'static str {
        match self {
            Transition::Global { .. } => "status",
            Transition::Document { kind, .. } => kind.label(),
        }
    }

    pub fn values(&self) -> (&'static str, &'static str) {
        match self {
            Transition::Global { from, to } => (from.label(), to.label()),
            Transition::Document { from, to, .. } => (from.label(), to.label()),
        }
    }
}

/// Global status an applicant edit moves the application to, if any.
/// Only `NOTIFIED` reacts: the applicant has answered a notification.
pub fn applicant_edit_transition(current: GlobalStatus) -> Option<GlobalStatus> {
    match current {
        GlobalStatus::Notified => Some(GlobalStatus::Updated),
        _ => None,
    }
}
