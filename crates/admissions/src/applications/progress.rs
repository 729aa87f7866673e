use serde::Serialize;

use super::domain::{DocumentKind, DocumentReferences};
use super::status::{DocumentStatus, DocumentStatuses};

/// What the reviewer sees for one required document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentProgress {
    Missing,
    AwaitingReview,
    Valid,
    Rejected,
}

impl DocumentProgress {
    /// A `PENDING` sub-status means two different things depending on
    /// whether a file was ever uploaded.
    pub fn derive(key: Option<&str>, status: DocumentStatus) -> Self {
        match (key, status) {
            (_, DocumentStatus::Valid) => DocumentProgress::Valid,
            (_, DocumentStatus::NotValid) => DocumentProgress::Rejected,
            (None, _) => DocumentProgress::Missing,
            (Some(_), DocumentStatus::Pending | DocumentStatus::Draft) => {
                DocumentProgress::AwaitingReview
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredDocument {
    pub document: DocumentKind,
    pub state: DocumentProgress,
}

/// Read-only summary over the required documents. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationProgress {
    pub percent_complete: u8,
    pub missing: usize,
    pub awaiting_review: usize,
    pub valid: usize,
    pub rejected: usize,
    pub documents: Vec<RequiredDocument>,
}

impl ApplicationProgress {
    pub fn compute(references: &DocumentReferences, statuses: &DocumentStatuses) -> Self {
        let documents: Vec<RequiredDocument> = DocumentKind::REQUIRED
            .iter()
            .map(|kind| RequiredDocument {
                document: *kind,
                state: DocumentProgress::derive(references.get(*kind), statuses.get(*kind)),
            })
            .collect();

        let count = |state: DocumentProgress| {
            documents
                .iter()
                .filter(|document| document.state == state)
                .count()
        };
        let valid = count(DocumentProgress::Valid);
        let percent_complete = (valid * 100 / DocumentKind::REQUIRED.len()) as u8;

        Self {
            percent_complete,
            missing: count(DocumentProgress::Missing),
            awaiting_review: count(DocumentProgress::AwaitingReview),
            valid,
            rejected: count(DocumentProgress::Rejected),
            documents,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.valid == self.documents.len()
    }
}
