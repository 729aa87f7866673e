use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The eight verifiable documents an application can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    ParentId,
    BirthCertificate,
    SchoolCertificate,
    Regulations,
    Grades,
    ParentalAuthorization,
    ImageRights,
    Report,
}

/// Submission phase a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRound {
    First,
    /// Unlocked once the application is accepted.
    Second,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 8] = [
        DocumentKind::ParentId,
        DocumentKind::BirthCertificate,
        DocumentKind::SchoolCertificate,
        DocumentKind::Regulations,
        DocumentKind::Grades,
        DocumentKind::ParentalAuthorization,
        DocumentKind::ImageRights,
        DocumentKind::Report,
    ];

    /// Documents counted by the progress view.
    pub const REQUIRED: [DocumentKind; 4] = [
        DocumentKind::ParentId,
        DocumentKind::BirthCertificate,
        DocumentKind::SchoolCertificate,
        DocumentKind::Grades,
    ];

    pub const fn round(self) -> DocumentRound {
        match self {
            DocumentKind::ParentId
            | DocumentKind::BirthCertificate
            | DocumentKind::SchoolCertificate
            | DocumentKind::Grades => DocumentRound::First,
            DocumentKind::Regulations
            | DocumentKind::ParentalAuthorization
            | DocumentKind::ImageRights
            | DocumentKind::Report => DocumentRound::Second,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::ParentId => "parentId",
            DocumentKind::BirthCertificate => "birthCertificate",
            DocumentKind::SchoolCertificate => "schoolCertificate",
            DocumentKind::Regulations => "regulations",
            DocumentKind::Grades => "grades",
            DocumentKind::ParentalAuthorization => "parentalAuthorization",
            DocumentKind::ImageRights => "imageRights",
            DocumentKind::Report => "report",
        }
    }
}

/// Object-storage keys of uploaded documents; null until uploaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentReferences {
    pub parent_id_key: Option<String>,
    pub birth_certificate_key: Option<String>,
    pub school_certificate_key: Option<String>,
    pub regulations_key: Option<String>,
    pub grades_key: Option<String>,
    pub parental_authorization_key: Option<String>,
    pub image_rights_key: Option<String>,
    pub report_key: Option<String>,
}

impl DocumentReferences {
    pub fn get(&self, kind: DocumentKind) -> Option<&str> {
        self.slot(kind).as_deref()
    }

    pub fn set(&mut self, kind: DocumentKind, key: Option<String>) {
        *self.slot_mut(kind) = key;
    }

    /// Kinds carrying a key, in declaration order.
    pub fn present(&self) -> impl Iterator<Item = (DocumentKind, &str)> + '_ {
        DocumentKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|key| (kind, key)))
    }

    /// Writes the keys present in `incoming` and returns the kinds whose key
    /// changed. Absent keys never clear a stored one.
    pub fn merge(&mut self, incoming: &DocumentReferences) -> Vec<DocumentKind> {
        let mut changed = Vec::new();
        for (kind, key) in incoming.present() {
            if self.get(kind) != Some(key) {
                self.set(kind, Some(key.to_string()));
                changed.push(kind);
            }
        }
        changed
    }

    fn slot(&self, kind: DocumentKind) -> &Option<String> {
        match kind {
            DocumentKind::ParentId => &self.parent_id_key,
            DocumentKind::BirthCertificate => &self.birth_certificate_key,
            DocumentKind::SchoolCertificate => &self.school_certificate_key,
            DocumentKind::Regulations => &self.regulations_key,
            DocumentKind::Grades => &self.grades_key,
            DocumentKind::ParentalAuthorization => &self.parental_authorization_key,
            DocumentKind::ImageRights => &self.image_rights_key,
            DocumentKind::Report => &self.report_key,
        }
    }

    fn slot_mut(&mut self, kind: DocumentKind) -> &mut Option<String> {
        match kind {
            DocumentKind::ParentId => &mut self.parent_id_key,
            DocumentKind::BirthCertificate => &mut self.birth_certificate_key,
            DocumentKind::SchoolCertificate => &mut self.school_certificate_key,
            DocumentKind::Regulations => &mut self.regulations_key,
            DocumentKind::Grades => &mut self.grades_key,
            DocumentKind::ParentalAuthorization => &mut self.parental_authorization_key,
            DocumentKind::ImageRights => &mut self.image_rights_key,
            DocumentKind::Report => &mut self.report_key,
        }
    }
}

/// Personal and academic profile captured by the application form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub school_name: String,
    pub class_level: String,
    /// Grade average on a 0-20 scale.
    #[serde(default)]
    pub average_grade: Option<f32>,
    pub guardian_name: String,
    pub guardian_phone: String,
    #[serde(default)]
    pub motivation: String,
}

/// First submission payload (`POST /applications`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    #[serde(flatten)]
    pub form: ApplicationForm,
    #[serde(flatten)]
    pub documents: DocumentReferences,
}

/// Partial update; absent fields are left untouched. Document keys can be
/// set or replaced but not cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub school_name: Option<String>,
    pub class_level: Option<String>,
    pub average_grade: Option<f32>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub motivation: Option<String>,
    #[serde(flatten)]
    pub documents: DocumentReferences,
}

impl ApplicationPatch {
    pub fn apply_to_form(&self, form: &mut ApplicationForm) {
        fn assign<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        assign(&mut form.first_name, &self.first_name);
        assign(&mut form.last_name, &self.last_name);
        assign(&mut form.birth_date, &self.birth_date);
        assign(&mut form.email, &self.email);
        assign(&mut form.phone, &self.phone);
        assign(&mut form.address, &self.address);
        assign(&mut form.school_name, &self.school_name);
        assign(&mut form.class_level, &self.class_level);
        assign(&mut form.guardian_name, &self.guardian_name);
        assign(&mut form.guardian_phone, &self.guardian_phone);
        assign(&mut form.motivation, &self.motivation);
        if self.average_grade.is_some() {
            form.average_grade = self.average_grade;
        }
    }

    /// Writes the provided keys and returns the kinds whose key changed.
    pub fn apply_to_documents(&self, documents: &mut DocumentReferences) -> Vec<DocumentKind> {
        documents.merge(&self.documents)
    }
}
