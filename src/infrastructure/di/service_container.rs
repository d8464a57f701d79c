//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{ReferralNetworkService, RegistrationService};
use crate::config::Settings;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::store::JsonMemberStore;
use crate::infrastructure::traits::{MemberRepository, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Member storage shared by all services
    pub repo: Arc<dyn MemberRepository>,

    pub network: ReferralNetworkService,
    pub registration: RegistrationService,
}

impl ServiceContainer {
    /// Create a new service container backed by the JSON store at
    /// `settings.store_path`.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        debug!("opening member store {}", settings.store_path.display());
        let store = JsonMemberStore::open(Arc::new(RealFileSystem), &settings.store_path)?;
        Self::with_deps(settings, Arc::new(store))
    }

    /// Create a service container with a custom repository (for testing).
    pub fn with_deps(settings: Settings, repo: Arc<dyn MemberRepository>) -> InfraResult<Self> {
        let scheme = settings.id_scheme()?;
        let network = ReferralNetworkService::new(Arc::clone(&repo), settings.reward_schedule());
        let registration = RegistrationService::new(
            Arc::clone(&repo),
            scheme,
            settings.identifiers.max_attempts,
        );

        Ok(Self {
            settings: Arc::new(settings),
            repo,
            network,
            registration,
        })
    }
}
