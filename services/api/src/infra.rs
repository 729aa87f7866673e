use admissions::access::{AccessGate, RouteTable};
use admissions::applications::AdmissionService;
use admissions::config::AppConfig;
use admissions::identity::{Credentials, IdentityError, IdentityService, TokenIssuer};
use admissions::store::InMemoryAdmissionStore;
use admissions::uploads::{UploadAuthorizationService, UploadPolicy, UploadSigner};
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::ExposeSecret;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Services sharing one store and one token issuer.
pub(crate) struct Services<G> {
    pub(crate) identity: Arc<IdentityService<InMemoryAdmissionStore>>,
    pub(crate) admissions: Arc<AdmissionService<InMemoryAdmissionStore>>,
    pub(crate) uploads: Arc<UploadAuthorizationService<G>>,
    pub(crate) gate: Arc<AccessGate<InMemoryAdmissionStore>>,
}

impl<G> Services<G>
where
    G: UploadSigner + 'static,
{
    pub(crate) fn build(config: &AppConfig, store: InMemoryAdmissionStore, signer: Arc<G>) -> Self {
        let store = Arc::new(store);
        let tokens = TokenIssuer::new(config.auth.jwt_secret.clone(), config.auth.token_ttl_mins);
        let policy = UploadPolicy::from_config(&config.uploads, &config.storage);

        Self {
            identity: Arc::new(IdentityService::new(store.clone(), tokens.clone())),
            admissions: Arc::new(AdmissionService::new(store.clone())),
            uploads: Arc::new(UploadAuthorizationService::new(policy, signer)),
            gate: Arc::new(AccessGate::new(RouteTable::admissions(), tokens, store)),
        }
    }

    /// Creates the configured staff account when it does not exist yet.
    pub(crate) fn bootstrap_staff(&self, config: &AppConfig) -> Result<(), IdentityError> {
        let Some(staff) = &config.auth.staff_account else {
            info!("no staff account configured; staff routes stay unreachable");
            return Ok(());
        };
        let account = self.identity.register_staff(Credentials {
            email: staff.email.clone(),
            password: staff.password.expose_secret().to_string(),
        })?;
        info!(account_id = %account.id, "staff account available");
        Ok(())
    }
}
