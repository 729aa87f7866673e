//! Admissions core: applicant identity, the application lifecycle and
//! document-verification state machines, upload authorization, and the
//! access gate guarding the HTTP surface.

pub mod access;
pub mod applications;
pub mod config;
pub mod error;
pub mod identity;
pub mod store;
pub mod telemetry;
pub mod uploads;
