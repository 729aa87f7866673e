use chrono::{Datelike, NaiveDate};

use super::domain::{ApplicationForm, DocumentReferences};
use crate::identity::{domain::is_plausible_email, ApplicantId};

const MAX_TEXT_LENGTH: usize = 120;
const MAX_MOTIVATION_LENGTH: usize = 4000;
const MIN_PHONE_LENGTH: usize = 8;
const MAX_PHONE_LENGTH: usize = 20;
const MIN_AGE: i32 = 10;
const MAX_AGE: i32 = 30;
const MAX_GRADE: f32 = 20.0;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

/// Every field problem found in a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid application: {}", summary(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|error| error.field)
    }
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Default)]
struct Collector(Vec<FieldError>);

impl Collector {
    fn reject(&mut self, field: &'static str, reason: impl Into<String>) {
        self.0.push(FieldError {
            field,
            reason: reason.into(),
        });
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.0))
        }
    }
}

/// Checks the merged form against the admission rules as of `today`.
pub fn validate_form(form: &ApplicationForm, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = Collector::default();

    for (field, value) in [
        ("firstName", &form.first_name),
        ("lastName", &form.last_name),
        ("address", &form.address),
        ("schoolName", &form.school_name),
        ("classLevel", &form.class_level),
        ("guardianName", &form.guardian_name),
    ] {
        check_text(&mut errors, field, value);
    }

    if !is_plausible_email(&form.email) {
        errors.reject("email", "must be a valid e-mail address");
    }

    check_phone(&mut errors, "phone", &form.phone);
    check_phone(&mut errors, "guardianPhone", &form.guardian_phone);

    if form.birth_date >= today {
        errors.reject("birthDate", "must be in the past");
    } else {
        let age = age_on(form.birth_date, today);
        if !(MIN_AGE..=MAX_AGE).contains(&age) {
            errors.reject(
                "birthDate",
                format!("applicant must be between {MIN_AGE} and {MAX_AGE} years old"),
            );
        }
    }

    if let Some(grade) = form.average_grade {
        if !grade.is_finite() || !(0.0..=MAX_GRADE).contains(&grade) {
            errors.reject("averageGrade", "must be between 0 and 20");
        }
    }

    if form.motivation.chars().count() > MAX_MOTIVATION_LENGTH {
        errors.reject(
            "motivation",
            format!("must be at most {MAX_MOTIVATION_LENGTH} characters"),
        );
    }

    errors.finish()
}

/// Applicant-submitted keys must come from that applicant's upload space.
pub fn validate_document_keys(
    owner: &ApplicantId,
    documents: &DocumentReferences,
) -> Result<(), ValidationErrors> {
    let prefix = format!("{owner}/");
    let mut errors = Collector::default();
    for (kind, key) in documents.present() {
        if !key.starts_with(&prefix) || key.len() == prefix.len() {
            errors.reject(kind.label(), "document key was not issued to this applicant");
        }
    }
    errors.finish()
}

fn check_text(errors: &mut Collector, field: &'static str, value: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.reject(field, "must not be empty");
    } else if trimmed.chars().count() > MAX_TEXT_LENGTH {
        errors.reject(field, format!("must be at most {MAX_TEXT_LENGTH} characters"));
    }
}

fn check_phone(errors: &mut Collector, field: &'static str, value: &str) {
    let value = value.trim();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '.'));
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let length = value.chars().count();

    if !allowed
        || !(MIN_PHONE_LENGTH..=MAX_PHONE_LENGTH).contains(&length)
        || digits < MIN_PHONE_LENGTH
    {
        errors.reject(field, "must be a phone number of 8 to 20 characters");
    }
}

fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}
