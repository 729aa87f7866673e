//! Applicant identity: accounts, credentials, and bearer tokens.

pub mod domain;
pub mod password;
pub mod repository;
pub mod router;
pub mod service;
pub mod token;

pub use domain::{Applicant, ApplicantId, ApplicantView, Role};
pub use repository::ApplicantRepository;
pub use router::identity_router;
pub use service::{Credentials, IdentityError, IdentityService, SessionView};
pub use token::{Claims, IssuedToken, TokenError, TokenIssuer};
